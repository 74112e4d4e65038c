use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("{0} is not a registered shaping handle")]
    UnknownFont(FontId),
    #[error("run at byte {0} has no font assigned")]
    MissingFont(usize),
    #[error("shaping failed: {0}")]
    Shaping(String),
    #[error("attributed string runs are malformed: {0}")]
    MalformedRuns(String),
    #[error("geometry solver error: {0}")]
    Solver(String),
}

pub mod attributed;
pub mod bidi;
pub mod breaker;
pub mod config;
pub mod engine;
pub mod fonts;
pub mod justify;
pub mod paginate;
pub mod pipeline;
pub mod shape;
pub mod solver;
pub mod tree;
pub mod typeset;

pub use self::attributed::{AttributedString, Attributes, Fragment, Run};
pub use self::config::LayoutConfig;
pub use self::engine::LayoutEngine;
pub use self::fonts::{FontInstance, FontLibrary};
pub use self::shape::{
    FontMetrics, Glyph, GlyphPosition, GlyphRun, ShapedGlyph, ShapedGlyphs, ShapingEngine,
    harf::HarfShaper,
};
pub use self::solver::{FlexSolver, GeometrySolver, MeasureMode, MeasureText};
pub use self::tree::{
    Document, DynamicContent, FlowDirection, Node, NodeKind, NodeStyle, Orientation, PageContext,
    PageSpec,
};
pub use self::typeset::{Container, DecorationKind, DecorationRect, Line, Typesetter};

// Re-export the foundation vocabulary used throughout to prevent type
// mismatches for downstream callers.
pub use quire_style::{Direction, FontStyle, FontWeight, TextAlign, TextDecoration};
pub use quire_types::{BoxConstraints, Color, Edges, FontId, NodeId, Point, Rect, Size};

#[cfg(test)]
mod attributed_test;
#[cfg(test)]
mod justify_test;
#[cfg(test)]
mod paginate_test;
#[cfg(test)]
mod pipeline_test;
#[cfg(test)]
mod test_utils;
