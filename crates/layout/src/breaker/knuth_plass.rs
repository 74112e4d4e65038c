//! Optimal paragraph breaking.
//!
//! Dynamic-programming search over break candidates keyed by
//! (stream position, line number, fitness class). Candidates live in an
//! integer-indexed arena; the active set holds arena indices, so there is
//! no pointer-linked list to maintain.

use super::{Breakpoint, StreamNode, width_for};
use crate::config::LayoutConfig;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default)]
struct Sums {
    width: f32,
    stretch: f32,
    shrink: f32,
}

#[derive(Debug, Clone)]
struct Candidate {
    position: usize,
    at: usize,
    line: usize,
    fitness: usize,
    totals: Sums,
    demerits: f32,
    ratio: f32,
    flagged: bool,
    prev: Option<usize>,
}

/// Fitness classes bucket the adjustment ratio at −0.5 / 0.5 / 1 so that
/// visually inconsistent adjacent lines can be penalized.
fn fitness_class(ratio: f32) -> usize {
    if ratio < -0.5 {
        0
    } else if ratio <= 0.5 {
        1
    } else if ratio <= 1.0 {
        2
    } else {
        3
    }
}

/// Running totals at the start of the line that would follow a break at
/// node `from`: discardable glue after the break is skipped up to the next
/// box or forced break.
fn totals_after(nodes: &[StreamNode], from: usize, base: Sums) -> Sums {
    let mut totals = base;
    for node in &nodes[from..] {
        match node {
            StreamNode::Glue {
                width,
                stretch,
                shrink,
                ..
            } => {
                totals.width += width;
                totals.stretch += stretch;
                totals.shrink += shrink;
            }
            StreamNode::Box { .. } => break,
            StreamNode::Penalty { cost, .. } if *cost == f32::NEG_INFINITY => break,
            StreamNode::Penalty { .. } => {}
        }
    }
    totals
}

/// Runs the search at one tolerance. Returns `None` when no legal break
/// set exists at this tolerance (the caller escalates, then falls back to
/// best-fit).
pub(super) fn knuth_plass(
    nodes: &[StreamNode],
    widths: &[f32],
    tolerance: f32,
    config: &LayoutConfig,
) -> Option<Vec<Breakpoint>> {
    if nodes.is_empty() {
        return Some(Vec::new());
    }

    let mut arena: Vec<Candidate> = vec![Candidate {
        position: 0,
        at: 0,
        line: 0,
        fitness: 1,
        totals: Sums::default(),
        demerits: 0.0,
        ratio: 0.0,
        flagged: false,
        prev: None,
    }];
    let mut active: Vec<usize> = vec![0];
    let mut sums = Sums::default();

    for (i, node) in nodes.iter().enumerate() {
        let legal_break = match node {
            StreamNode::Box { .. } => false,
            StreamNode::Glue { .. } => i > 0 && matches!(nodes[i - 1], StreamNode::Box { .. }),
            StreamNode::Penalty { cost, .. } => *cost < f32::INFINITY,
        };

        if legal_break {
            attempt_break(node, i, nodes, widths, tolerance, config, &mut arena, &mut active, sums);
            if active.is_empty() {
                return None;
            }
        }

        match node {
            StreamNode::Box { width, .. } => sums.width += width,
            StreamNode::Glue {
                width,
                stretch,
                shrink,
                ..
            } => {
                sums.width += width;
                sums.stretch += stretch;
                sums.shrink += shrink;
            }
            StreamNode::Penalty { .. } => {}
        }
    }

    // The stream's terminal forced break deactivated everything else, so
    // the active set now holds only end-of-paragraph candidates.
    let best = active
        .iter()
        .copied()
        .min_by(|&a, &b| {
            arena[a]
                .demerits
                .partial_cmp(&arena[b].demerits)
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;

    let mut breaks = Vec::new();
    let mut cursor = Some(best);
    while let Some(index) = cursor {
        let candidate = &arena[index];
        if candidate.prev.is_some() {
            breaks.push(Breakpoint {
                index: candidate.position,
                at: candidate.at,
                flagged: candidate.flagged,
                ratio: candidate.ratio,
            });
        }
        cursor = candidate.prev;
    }
    breaks.reverse();
    Some(breaks)
}

#[allow(clippy::too_many_arguments)]
fn attempt_break(
    node: &StreamNode,
    i: usize,
    nodes: &[StreamNode],
    widths: &[f32],
    tolerance: f32,
    config: &LayoutConfig,
    arena: &mut Vec<Candidate>,
    active: &mut Vec<usize>,
    sums: Sums,
) {
    let (penalty_width, penalty_cost, penalty_flagged, break_at) = match node {
        StreamNode::Penalty {
            width,
            cost,
            flagged,
            at,
        } => (*width, *cost, *flagged, *at),
        StreamNode::Glue { range, .. } => (0.0, 0.0, false, range.start),
        StreamNode::Box { range, .. } => (0.0, 0.0, false, range.start),
    };
    let forced = penalty_cost == f32::NEG_INFINITY;

    // Best new candidate per (line, fitness) pair at this position.
    let mut best: HashMap<(usize, usize), (f32, usize, f32)> = HashMap::new();
    let mut survivors = Vec::with_capacity(active.len());

    for &a_idx in active.iter() {
        let a = &arena[a_idx];
        let line_width = width_for(widths, a.line);
        let natural = sums.width - a.totals.width + penalty_width;

        let ratio = if natural < line_width {
            let stretch = sums.stretch - a.totals.stretch;
            if stretch > 0.0 {
                let ratio = (line_width - natural) / stretch;
                // Unbounded measure over unbounded stretch: a free fit.
                if ratio.is_nan() { 0.0 } else { ratio }
            } else {
                f32::INFINITY
            }
        } else if natural > line_width {
            let shrink = sums.shrink - a.totals.shrink;
            if shrink > 0.0 {
                (line_width - natural) / shrink
            } else {
                f32::NEG_INFINITY
            }
        } else {
            0.0
        };

        // A candidate whose content already overflows past shrinkability is
        // not worth continuing; a forced break retires everything.
        if !(ratio < -1.0 || forced) {
            survivors.push(a_idx);
        }

        if ratio >= -1.0 && ratio <= tolerance {
            let badness = 100.0 * ratio.abs().powi(3);
            let base = (config.line_penalty + badness).powi(2);
            let mut demerits = if penalty_cost >= 0.0 {
                base + penalty_cost.powi(2)
            } else if forced {
                base
            } else {
                base - penalty_cost.powi(2)
            };
            if penalty_flagged && a.flagged {
                demerits += config.flagged_demerit;
            }
            let fitness = fitness_class(ratio);
            if fitness.abs_diff(a.fitness) > 1 {
                demerits += config.fitness_demerit;
            }
            demerits += a.demerits;

            let key = (a.line + 1, fitness);
            let better = best
                .get(&key)
                .is_none_or(|(existing, _, _)| demerits < *existing);
            if better {
                best.insert(key, (demerits, a_idx, ratio));
            }
        }
    }

    *active = survivors;
    if best.is_empty() {
        return;
    }

    let next_totals = match node {
        StreamNode::Glue { .. } => totals_after(nodes, i, sums),
        _ => totals_after(nodes, i + 1, sums),
    };

    let mut entries: Vec<_> = best.into_iter().collect();
    entries.sort_by_key(|((line, fitness), _)| (*line, *fitness));
    for ((line, fitness), (demerits, prev, ratio)) in entries {
        arena.push(Candidate {
            position: i,
            at: break_at,
            line,
            fitness,
            totals: next_totals,
            demerits,
            ratio,
            flagged: penalty_flagged,
            prev: Some(prev),
        });
        active.push(arena.len() - 1);
    }
}
