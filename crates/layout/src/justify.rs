//! Glyph-level justification.
//!
//! Distributes the difference between a line's natural advance and its box
//! width across glyphs via a priority-ranked factor model: cursive
//! elongation first, then inter-character space, then inter-word space. A
//! tier whose capacity covers the remaining gap absorbs it (constrained
//! glyphs saturate first, unconstrained glyphs take the leftover);
//! otherwise it spends its full capacity and rolls the remainder onward.
//! The result is an additive advance delta applied in place to the line's
//! position list.

use crate::attributed::AttributedString;
use unicode_script::{Script, UnicodeScript};

/// Fraction of its advance an inter-word space may give up when shrinking.
const WORD_SHRINK_LIMIT: f32 = 1.0 / 3.0;
/// Fraction of its advance a letter may gain when expanding.
const CHAR_EXPAND_LIMIT: f32 = 0.12;
/// Fraction of its advance a letter may give up when shrinking.
const CHAR_SHRINK_LIMIT: f32 = 0.04;

/// Adjustment tiers from highest to lowest priority. `Fixed` glyphs never
/// move: line edges and leading/trailing whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Cursive,
    Character,
    Word,
    Fixed,
}

#[derive(Debug, Clone, Copy)]
struct Factor {
    weight: f32,
    /// Maximum absolute delta this glyph can absorb; `None` = unconstrained.
    cap: Option<f32>,
    tier: Tier,
}

/// Stretches or shrinks the line in place so its advance matches
/// `target_width`, when at least one non-zero-weight factor exists.
/// Trailing whitespace is excluded from the natural width: its advance
/// hangs outside the measure.
pub fn justify(line: &mut AttributedString, target_width: f32) {
    let trailing = trailing_whitespace_advance(line);
    let natural = line.advance_width() - trailing;
    let gap = target_width - natural;
    if gap.abs() < 1e-3 {
        return;
    }

    let factors = build_factors(line, gap > 0.0);
    let deltas = distribute(gap.abs(), &factors);
    let sign = gap.signum();

    let mut index = 0;
    for run in line.runs_mut() {
        if let Some(glyphs) = &mut run.glyphs {
            for position in &mut glyphs.positions {
                position.x_advance += sign * deltas[index];
                index += 1;
            }
        }
    }
}

fn trailing_whitespace_advance(line: &AttributedString) -> f32 {
    let classes = glyph_classes(line);
    classes
        .iter()
        .rev()
        .take_while(|(_, is_ws, _)| *is_ws)
        .map(|(advance, _, _)| advance)
        .sum()
}

/// Per glyph: (advance, is-whitespace, leading char). Order matches the
/// line's position list.
fn glyph_classes(line: &AttributedString) -> Vec<(f32, bool, char)> {
    let text = line.text();
    let mut out = Vec::new();
    for run in line.runs() {
        let Some(glyphs) = &run.glyphs else { continue };
        for (glyph, position) in glyphs.glyphs.iter().zip(&glyphs.positions) {
            let ch = glyph
                .code_points
                .first()
                .copied()
                .or_else(|| text.get(glyph.cluster..).and_then(|s| s.chars().next()))
                .unwrap_or(' ');
            out.push((position.x_advance, ch.is_whitespace(), ch));
        }
    }
    out
}

fn build_factors(line: &AttributedString, expanding: bool) -> Vec<Factor> {
    let classes = glyph_classes(line);
    let count = classes.len();

    let leading_ws = classes.iter().take_while(|(_, ws, _)| *ws).count();
    let trailing_ws = classes.iter().rev().take_while(|(_, ws, _)| *ws).count();

    classes
        .iter()
        .enumerate()
        .map(|(i, &(advance, is_ws, ch))| {
            let at_edge = i < leading_ws || i >= count - trailing_ws || i + 1 == count;
            if at_edge || advance <= 0.0 {
                return Factor {
                    weight: 0.0,
                    cap: Some(0.0),
                    tier: Tier::Fixed,
                };
            }
            if is_ws {
                return Factor {
                    weight: advance,
                    cap: if expanding {
                        None
                    } else {
                        Some(advance * WORD_SHRINK_LIMIT)
                    },
                    tier: Tier::Word,
                };
            }
            if expanding && ch.script() == Script::Arabic {
                // Cursive elongation: the joining stroke can absorb
                // arbitrary expansion.
                return Factor {
                    weight: advance,
                    cap: None,
                    tier: Tier::Cursive,
                };
            }
            Factor {
                weight: advance,
                cap: Some(
                    advance
                        * if expanding {
                            CHAR_EXPAND_LIMIT
                        } else {
                            CHAR_SHRINK_LIMIT
                        },
                ),
                tier: Tier::Character,
            }
        })
        .collect()
}

/// Distributes `gap` (absolute) over the factor list tier by tier.
/// Returns per-glyph absolute deltas.
fn distribute(gap: f32, factors: &[Factor]) -> Vec<f32> {
    let mut deltas = vec![0.0f32; factors.len()];
    let mut remaining = gap;

    for tier in [Tier::Cursive, Tier::Character, Tier::Word] {
        if remaining <= 1e-6 {
            break;
        }
        let members: Vec<usize> = factors
            .iter()
            .enumerate()
            .filter(|(_, f)| f.tier == tier && f.weight > 0.0)
            .map(|(i, _)| i)
            .collect();
        if members.is_empty() {
            continue;
        }

        let capacity: f32 = members
            .iter()
            .map(|&i| factors[i].cap.unwrap_or(f32::INFINITY))
            .sum();

        if capacity <= remaining && capacity.is_finite() {
            // The whole tier saturates and the remainder rolls onward.
            for &i in &members {
                deltas[i] = factors[i].cap.unwrap_or(0.0);
            }
            remaining -= capacity;
            continue;
        }

        // This tier absorbs everything: proportional shares, constrained
        // glyphs clamped, leftovers re-shared among the unsaturated.
        let mut open: Vec<usize> = members;
        while remaining > 1e-6 && !open.is_empty() {
            let total_weight: f32 = open.iter().map(|&i| factors[i].weight).sum();
            if total_weight <= 0.0 {
                break;
            }
            let mut next_open = Vec::with_capacity(open.len());
            let pool = remaining;
            for &i in &open {
                let share = pool * factors[i].weight / total_weight;
                let headroom = factors[i]
                    .cap
                    .map(|cap| cap - deltas[i])
                    .unwrap_or(f32::INFINITY);
                let take = share.min(headroom);
                deltas[i] += take;
                remaining -= take;
                if take < share {
                    // saturated; drop from the next round
                } else {
                    next_open.push(i);
                }
            }
            if next_open.len() == open.len() {
                // Nothing saturated this round: shares were exact.
                break;
            }
            open = next_open;
        }
        break;
    }

    deltas
}
