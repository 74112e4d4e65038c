//! quire — a document text layout and pagination engine.
//!
//! Given a tree of styled content nodes and a sequence of page containers,
//! quire produces exact line breaks, glyph positions, justification
//! adjustments, and a final partition of content into discrete pages ready
//! for rendering to a fixed-layout output format.
//!
//! The heavy lifting lives in [`quire_layout`]; this crate re-exports the
//! public surface:
//!
//! - [`AttributedString`]: run-based text with per-character style and
//!   shaping metadata.
//! - [`LayoutEngine`]: preprocessing, glyph resolution, and typesetting
//!   over a pluggable [`ShapingEngine`].
//! - [`Document`] / [`LayoutEngine::paginate`]: box-tree pagination with
//!   orphan/widow control, fixed-node replication, and dynamic
//!   (page-context) content.
//!
//! ```no_run
//! use quire::{
//!     AttributedString, Attributes, Container, Fragment, FontLibrary, HarfShaper,
//!     LayoutEngine, Rect,
//! };
//! use std::sync::Arc;
//!
//! let library = Arc::new(FontLibrary::new());
//! let font = library.register(std::fs::read("font.ttf")?, 0)?;
//! let engine = LayoutEngine::new(Arc::new(HarfShaper::new(library)));
//!
//! let text = AttributedString::from_fragments([Fragment::new(
//!     "Hello, world",
//!     Attributes {
//!         font: Some(font),
//!         font_size: Some(12.0),
//!         ..Default::default()
//!     },
//! )]);
//! let lines = engine.typeset(&text, &Container::new(Rect::new(0.0, 0.0, 200.0, 400.0)))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use quire_layout::{
    AttributedString, Attributes, Container, DecorationKind, DecorationRect, Document,
    DynamicContent, FlexSolver, FlowDirection, FontInstance, FontLibrary, FontMetrics, Fragment,
    GeometrySolver, Glyph, GlyphPosition, GlyphRun, HarfShaper, LayoutConfig, LayoutEngine,
    LayoutError, Line, MeasureMode, MeasureText, Node, NodeKind, NodeStyle, Orientation,
    PageContext, PageSpec, Run, ShapedGlyph, ShapedGlyphs, ShapingEngine, Typesetter,
};

pub use quire_style::{Direction, FontStyle, FontWeight, TextAlign, TextDecoration};
pub use quire_types::{BoxConstraints, Color, Edges, FontId, NodeId, Point, Rect, Size};

pub use quire_layout::{bidi, breaker, justify, paginate, pipeline, shape, solver, tree, typeset};

pub use quire_style as style;
