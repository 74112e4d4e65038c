//! The external geometry collaborator.
//!
//! Pagination talks to a [`GeometrySolver`] trait; the shipped
//! implementation is [`FlexSolver`], backed by taffy. Solver handles are
//! kept in a side table scoped to a single `solve` call, so engine state is
//! released on every exit path.

use crate::LayoutError;
use crate::tree::{FlowDirection, Node};
use quire_types::{NodeId, Point, Rect, Size};
use std::collections::HashMap;
use taffy::{
    AvailableSpace, Display, FlexDirection, NodeId as TaffyNodeId, Style as TaffyStyle, TaffyTree,
    geometry::{Rect as TaffyRect, Size as TaffySize},
    style_helpers::{auto, length},
};

/// Constraint mode for one axis of a measured leaf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasureMode {
    Exact(f32),
    AtMost(f32),
    Undefined,
}

impl MeasureMode {
    pub fn available(self) -> f32 {
        match self {
            MeasureMode::Exact(v) | MeasureMode::AtMost(v) => v,
            MeasureMode::Undefined => f32::INFINITY,
        }
    }
}

/// Measure callback for leaves whose intrinsic size the solver cannot know
/// (text, in practice). Must be idempotent for identical inputs.
pub trait MeasureText {
    fn measure(
        &mut self,
        node: &Node,
        width: MeasureMode,
        height: MeasureMode,
    ) -> Result<Size, LayoutError>;
}

/// Resolves geometry for a subtree: every node gets a `frame` in page
/// coordinates. Invoked again for each continuation fragment pagination
/// produces, so implementations must not retain per-call state.
pub trait GeometrySolver {
    fn solve(
        &mut self,
        root: &mut Node,
        origin: Point,
        available: Size,
        measure: &mut dyn MeasureText,
    ) -> Result<(), LayoutError>;
}

/// Taffy-backed flexbox solver.
#[derive(Debug, Default)]
pub struct FlexSolver;

impl FlexSolver {
    pub fn new() -> Self {
        Self
    }
}

impl GeometrySolver for FlexSolver {
    fn solve(
        &mut self,
        root: &mut Node,
        origin: Point,
        available: Size,
        measure: &mut dyn MeasureText,
    ) -> Result<(), LayoutError> {
        let mut taffy: TaffyTree<NodeId> = TaffyTree::new();
        let mut handles: HashMap<NodeId, TaffyNodeId> = HashMap::new();

        let root_handle = build(&mut taffy, &mut handles, root)?;

        // Side table from node identity to the node itself, alive only for
        // the duration of the compute call.
        let mut node_map: HashMap<NodeId, &Node> = HashMap::new();
        index_nodes(root, &mut node_map);

        let mut failure: Option<LayoutError> = None;
        let result = taffy.compute_layout_with_measure(
            root_handle,
            TaffySize {
                width: AvailableSpace::Definite(available.width),
                height: AvailableSpace::Definite(available.height),
            },
            |known: TaffySize<Option<f32>>,
             avail: TaffySize<AvailableSpace>,
             _id: TaffyNodeId,
             context: Option<&mut NodeId>,
             _style: &TaffyStyle| {
                let zero = TaffySize {
                    width: 0.0,
                    height: 0.0,
                };
                let Some(id) = context else {
                    return zero;
                };
                let Some(node) = node_map.get(id) else {
                    return zero;
                };
                if !node.is_text() {
                    return zero;
                }
                let width_mode = mode_for(known.width, avail.width);
                let height_mode = mode_for(known.height, avail.height);
                match measure.measure(node, width_mode, height_mode) {
                    Ok(size) => TaffySize {
                        width: size.width,
                        height: size.height,
                    },
                    Err(error) => {
                        if failure.is_none() {
                            failure = Some(error);
                        }
                        zero
                    }
                }
            },
        );
        drop(node_map);

        if let Some(error) = failure {
            return Err(error);
        }
        result.map_err(|e| LayoutError::Solver(e.to_string()))?;

        assign_frames(&taffy, &handles, root, origin)
    }
}

fn mode_for(known: Option<f32>, available: AvailableSpace) -> MeasureMode {
    match (known, available) {
        (Some(v), _) => MeasureMode::Exact(v),
        (None, AvailableSpace::Definite(v)) => MeasureMode::AtMost(v),
        (None, _) => MeasureMode::Undefined,
    }
}

fn build(
    taffy: &mut TaffyTree<NodeId>,
    handles: &mut HashMap<NodeId, TaffyNodeId>,
    node: &Node,
) -> Result<TaffyNodeId, LayoutError> {
    let style = to_taffy_style(node);
    let handle = if node.children.is_empty() {
        taffy
            .new_leaf_with_context(style, node.id)
            .map_err(|e| LayoutError::Solver(e.to_string()))?
    } else {
        let mut child_handles = Vec::with_capacity(node.children.len());
        for child in &node.children {
            child_handles.push(build(taffy, handles, child)?);
        }
        taffy
            .new_with_children(style, &child_handles)
            .map_err(|e| LayoutError::Solver(e.to_string()))?
    };
    handles.insert(node.id, handle);
    Ok(handle)
}

fn index_nodes<'a>(node: &'a Node, map: &mut HashMap<NodeId, &'a Node>) {
    map.insert(node.id, node);
    for child in &node.children {
        index_nodes(child, map);
    }
}

fn assign_frames(
    taffy: &TaffyTree<NodeId>,
    handles: &HashMap<NodeId, TaffyNodeId>,
    node: &mut Node,
    origin: Point,
) -> Result<(), LayoutError> {
    let handle = handles
        .get(&node.id)
        .ok_or_else(|| LayoutError::Solver(format!("no solver handle for {}", node.id)))?;
    let layout = taffy
        .layout(*handle)
        .map_err(|e| LayoutError::Solver(e.to_string()))?;

    node.frame = Rect::new(
        origin.x + layout.location.x,
        origin.y + layout.location.y,
        layout.size.width,
        layout.size.height,
    );
    let child_origin = Point::new(node.frame.x, node.frame.y);
    for child in &mut node.children {
        assign_frames(taffy, handles, child, child_origin)?;
    }
    Ok(())
}

fn to_taffy_style(node: &Node) -> TaffyStyle {
    let style = &node.style;
    TaffyStyle {
        display: Display::Flex,
        flex_direction: match style.direction {
            FlowDirection::Column => FlexDirection::Column,
            FlowDirection::Row => FlexDirection::Row,
        },
        size: TaffySize {
            width: style.width.map(|w| length(w)).unwrap_or_else(auto),
            height: style.height.map(|h| length(h)).unwrap_or_else(auto),
        },
        margin: TaffyRect {
            left: length(style.margin.left),
            right: length(style.margin.right),
            top: length(style.margin.top),
            bottom: length(style.margin.bottom),
        },
        padding: TaffyRect {
            left: length(style.padding.left),
            right: length(style.padding.right),
            top: length(style.padding.top),
            bottom: length(style.padding.bottom),
        },
        border: TaffyRect {
            left: length(style.border.left),
            right: length(style.border.right),
            top: length(style.border.top),
            bottom: length(style.border.bottom),
        },
        flex_grow: style.flex_grow,
        flex_shrink: style.flex_shrink,
        flex_basis: style.flex_basis.map(|b| length(b)).unwrap_or_else(auto),
        ..Default::default()
    }
}
