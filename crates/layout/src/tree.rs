//! The box tree pagination operates on.
//!
//! Nodes are created from source content, mutated in place by geometry
//! resolution and pagination, and consumed by the renderer. Splitting a
//! node always produces two structurally distinct copies; no node is shared
//! between page fragments except by explicit replication of fixed nodes.

use crate::attributed::AttributedString;
use crate::typeset::Line;
use quire_types::{Edges, NodeId, Rect, Size};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

fn fresh_id() -> NodeId {
    NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Page-level sizing, with margins already resolved to absolute units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSpec {
    pub size: Size,
    pub orientation: Orientation,
    pub dpi: f32,
    pub margin: Edges,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            // US Letter at 72 dpi.
            size: Size::new(612.0, 792.0),
            orientation: Orientation::Portrait,
            dpi: 72.0,
            margin: Edges::all(0.0),
        }
    }
}

impl PageSpec {
    /// Page size with orientation applied.
    pub fn oriented_size(&self) -> Size {
        match self.orientation {
            Orientation::Portrait => self.size,
            Orientation::Landscape => Size::new(self.size.height, self.size.width),
        }
    }

    /// The content area: oriented size minus margins.
    pub fn content_rect(&self) -> Rect {
        let size = self.oriented_size();
        Rect::new(
            self.margin.left,
            self.margin.top,
            (size.width - self.margin.horizontal()).max(0.0),
            (size.height - self.margin.vertical()).max(0.0),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Page(PageSpec),
    Container,
    Text,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowDirection {
    #[default]
    Column,
    Row,
}

/// Resolved style constraints handed to the geometry solver, plus the
/// pagination directives the splitter honors. All lengths are absolute.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStyle {
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub margin: Edges,
    pub padding: Edges,
    pub border: Edges,
    pub direction: FlowDirection,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub flex_basis: Option<f32>,
    /// Whether this node may split across pages.
    pub wrap: bool,
    /// Replicated verbatim onto every page fragment (headers/footers).
    pub fixed: bool,
    /// Explicit break directive: start a new page before this node.
    pub break_before: bool,
    /// Minimum content height that must follow this node on the same page
    /// for it to stay.
    pub min_presence_ahead: f32,
    pub orphans: Option<usize>,
    pub widows: Option<usize>,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            margin: Edges::default(),
            padding: Edges::default(),
            border: Edges::default(),
            direction: FlowDirection::default(),
            flex_grow: 0.0,
            flex_shrink: 1.0,
            flex_basis: None,
            wrap: true,
            fixed: false,
            break_before: false,
            min_presence_ahead: 0.0,
            orphans: None,
            widows: None,
        }
    }
}

/// Page context handed to dynamic nodes once page indices are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageContext {
    /// 1-based index of the finalized page.
    pub page_number: usize,
    pub total_pages: usize,
}

/// Deferred content: evaluated exactly once per finalized page, with any
/// stale line layout invalidated first.
#[derive(Clone)]
pub struct DynamicContent(pub Arc<dyn Fn(&PageContext) -> Vec<Node> + Send + Sync>);

impl std::fmt::Debug for DynamicContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DynamicContent(..)")
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub style: NodeStyle,
    /// Resolved geometry in page coordinates; assigned by the solver and
    /// reassigned per page fragment.
    pub frame: Rect,
    pub children: Vec<Node>,
    /// Source text for text nodes.
    pub content: Option<AttributedString>,
    /// Finished lines for text nodes, filled by the typesetter.
    pub lines: Vec<Line>,
    pub dynamic: Option<DynamicContent>,
}

impl Node {
    pub fn page(spec: PageSpec) -> Self {
        Self::with_kind(NodeKind::Page(spec))
    }

    pub fn container(style: NodeStyle) -> Self {
        let mut node = Self::with_kind(NodeKind::Container);
        node.style = style;
        node
    }

    pub fn text(content: AttributedString, style: NodeStyle) -> Self {
        let mut node = Self::with_kind(NodeKind::Text);
        node.style = style;
        node.content = Some(content);
        node
    }

    pub fn image(size: Size, style: NodeStyle) -> Self {
        let mut node = Self::with_kind(NodeKind::Image);
        node.style = style;
        node.style.width = node.style.width.or(Some(size.width));
        node.style.height = node.style.height.or(Some(size.height));
        node
    }

    pub fn dynamic(style: NodeStyle, produce: DynamicContent) -> Self {
        let mut node = Self::with_kind(NodeKind::Container);
        node.style = style;
        node.dynamic = Some(produce);
        node
    }

    fn with_kind(kind: NodeKind) -> Self {
        Self {
            id: fresh_id(),
            kind,
            style: NodeStyle::default(),
            frame: Rect::default(),
            children: Vec::new(),
            content: None,
            lines: Vec::new(),
            dynamic: None,
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text)
    }

    pub fn page_spec(&self) -> Option<&PageSpec> {
        match &self.kind {
            NodeKind::Page(spec) => Some(spec),
            _ => None,
        }
    }

    /// A structurally distinct copy with a fresh identity, the basis of
    /// every split. Children are carried over by the caller.
    pub fn fragment(&self) -> Node {
        let mut copy = self.clone();
        copy.id = fresh_id();
        copy.children = Vec::new();
        copy.lines = Vec::new();
        copy
    }

    /// Total vertical extent including margins, as pagination accounts it.
    pub fn flow_height(&self) -> f32 {
        self.frame.height + self.style.margin.vertical()
    }
}

/// The engine's input: source pages in document order.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub pages: Vec<Node>,
}

impl Document {
    pub fn new(pages: Vec<Node>) -> Self {
        Self { pages }
    }
}
