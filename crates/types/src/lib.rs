pub mod color;
pub mod geometry;
pub mod ids;

pub use color::Color;
pub use geometry::{BoxConstraints, Edges, Point, Rect, Size};
pub use ids::{FontId, NodeId};
