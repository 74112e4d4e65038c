//! Greedy fallback used when the optimal pass finds no legal break set
//! even at the tolerance ceiling.

use super::{Breakpoint, StreamNode, width_for};

/// Walks the stream accumulating width. At the first point where the
/// accumulated width minus total shrinkability exceeds the line length, the
/// enclosed legal candidate with minimal badness becomes the break. When a
/// line holds no candidate at all (a single box wider than the measure) the
/// content is allowed to overflow and the next legal candidate ends the
/// line, so the paragraph always makes progress and never loses content.
pub(super) fn best_fit(nodes: &[StreamNode], widths: &[f32]) -> Vec<Breakpoint> {
    let mut breaks = Vec::new();
    let mut line = 0usize;
    let mut start = 0usize;

    'lines: while start < nodes.len() {
        let line_width = width_for(widths, line);
        let mut width = 0.0f32;
        let mut stretch = 0.0f32;
        let mut shrink = 0.0f32;
        let mut overflowed = false;
        // (node index, badness, byte offset, flagged)
        let mut candidates: Vec<(usize, f32, usize, bool)> = Vec::new();

        let mut i = start;
        while i < nodes.len() {
            let node = &nodes[i];

            let legal = match node {
                StreamNode::Box { .. } => false,
                StreamNode::Glue { .. } => {
                    i > start && matches!(nodes[i - 1], StreamNode::Box { .. })
                }
                StreamNode::Penalty { cost, .. } => *cost < f32::INFINITY,
            };

            if legal {
                let (penalty_width, flagged, at, forced) = match node {
                    StreamNode::Penalty {
                        width,
                        flagged,
                        at,
                        cost,
                    } => (*width, *flagged, *at, *cost == f32::NEG_INFINITY),
                    StreamNode::Glue { range, .. } => (0.0, false, range.start, false),
                    StreamNode::Box { .. } => unreachable!(),
                };

                if forced {
                    breaks.push(Breakpoint {
                        index: i,
                        at,
                        flagged,
                        ratio: 0.0,
                    });
                    break 'lines;
                }

                let natural = width + penalty_width;
                let badness = badness_for(natural, line_width, stretch, shrink);

                if overflowed {
                    // The line already overflows with no usable candidate
                    // behind us; end it at the first opportunity.
                    breaks.push(Breakpoint {
                        index: i,
                        at,
                        flagged,
                        ratio: 0.0,
                    });
                    start = next_line_start(nodes, i);
                    line += 1;
                    continue 'lines;
                }
                candidates.push((i, badness, at, flagged));
            }

            match node {
                StreamNode::Box { width: w, .. } => width += w,
                StreamNode::Glue {
                    width: w,
                    stretch: st,
                    shrink: sh,
                    ..
                } => {
                    width += w;
                    stretch += st;
                    shrink += sh;
                }
                StreamNode::Penalty { .. } => {}
            }

            if width - shrink > line_width {
                if let Some(&(index, _, at, flagged)) = candidates
                    .iter()
                    .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                {
                    breaks.push(Breakpoint {
                        index,
                        at,
                        flagged,
                        ratio: 0.0,
                    });
                    start = next_line_start(nodes, index);
                    line += 1;
                    continue 'lines;
                }
                overflowed = true;
            }

            i += 1;
        }

        if i >= nodes.len() {
            break;
        }
    }

    breaks
}

fn badness_for(natural: f32, line_width: f32, stretch: f32, shrink: f32) -> f32 {
    let ratio = if natural < line_width {
        if stretch > 0.0 {
            let ratio = (line_width - natural) / stretch;
            if ratio.is_nan() { 0.0 } else { ratio }
        } else {
            return f32::INFINITY;
        }
    } else if natural > line_width {
        if shrink > 0.0 {
            (line_width - natural) / shrink
        } else {
            return f32::INFINITY;
        }
    } else {
        0.0
    };
    100.0 * ratio.abs().powi(3)
}

/// First content node after a break: discardable glue and penalties at the
/// line head are skipped.
fn next_line_start(nodes: &[StreamNode], break_index: usize) -> usize {
    let mut i = break_index;
    // The breaking node itself is consumed by the break.
    i += 1;
    while i < nodes.len() {
        match &nodes[i] {
            StreamNode::Box { .. } => return i,
            StreamNode::Penalty { cost, .. } if *cost == f32::NEG_INFINITY => return i,
            _ => i += 1,
        }
    }
    nodes.len()
}
