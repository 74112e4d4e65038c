//! Newtype wrappers for semantic identifiers.
//!
//! These provide compile-time safety against mixing up the different kinds of
//! numeric handles that flow between the layout engine and its collaborators.

use std::fmt;

/// An opaque handle to a font face registered with a shaping engine.
///
/// The engine never inspects font data itself; it only routes this handle
/// back to the shaping collaborator that issued it. A `FontId` that was never
/// issued by the collaborator is a hard configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontId(pub u32);

impl fmt::Display for FontId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "font#{}", self.0)
    }
}

/// A stable identity for a box-tree node, used to key side tables
/// (e.g. transient geometry-solver handles) without borrowing the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}
