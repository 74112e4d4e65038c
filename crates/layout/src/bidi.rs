//! Visual reordering of finished lines.
//!
//! Embedding levels are resolved per run during preprocessing; this module
//! only applies the reordering rule to a finished line: reverse every
//! contiguous same-or-higher-level segment, highest level first. Logical
//! order elsewhere in the engine is never disturbed; reordering is the last
//! transformation a line undergoes.

use crate::attributed::AttributedString;
use quire_style::Direction;

/// Computes the visual order of a sequence of runs from their embedding
/// levels. Returns indices into the logical run list.
pub fn visual_order(levels: &[u8]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..levels.len()).collect();
    let Some(&highest) = levels.iter().max() else {
        return order;
    };
    let Some(&lowest_odd) = levels.iter().filter(|&&l| l % 2 == 1).min() else {
        return order;
    };

    // Ranges are found on the logical level sequence; nesting guarantees
    // they stay contiguous in the partially reordered result.
    for level in (lowest_odd..=highest).rev() {
        let mut i = 0;
        while i < levels.len() {
            if levels[i] >= level {
                let start = i;
                while i < levels.len() && levels[i] >= level {
                    i += 1;
                }
                order[start..i].reverse();
            } else {
                i += 1;
            }
        }
    }
    order
}

/// Reorders a finished line into visual order.
///
/// Runs are permuted per their embedding levels; inside each right-to-left
/// run the glyph storage (kept logical throughout the pipeline) flips to
/// visual order, emitting every glyph exactly once — a ligature glyph
/// travels as one unit, never once per constituent code point. Lines with
/// no odd level come back untouched.
pub fn reorder(line: &mut AttributedString) {
    let levels: Vec<u8> = line
        .runs()
        .iter()
        .map(|r| {
            r.attrs.bidi_level.unwrap_or(match r.attrs.direction {
                Some(Direction::RightToLeft) => 1,
                _ => 0,
            })
        })
        .collect();

    if levels.iter().all(|&l| l % 2 == 0) {
        return;
    }

    let order = visual_order(&levels);

    let mut runs: Vec<_> = std::mem::take(line.runs_mut_vec());
    let mut reordered = Vec::with_capacity(runs.len());
    for &i in &order {
        let mut run = std::mem::replace(&mut runs[i], placeholder_run());
        if levels[i] % 2 == 1
            && let Some(glyphs) = &mut run.glyphs
        {
            glyphs.glyphs.reverse();
            glyphs.positions.reverse();
        }
        reordered.push(run);
    }
    *line.runs_mut_vec() = reordered;
}

fn placeholder_run() -> crate::attributed::Run {
    crate::attributed::Run::new(0..0, Default::default())
}

#[cfg(test)]
mod tests {
    use super::visual_order;

    #[test]
    fn all_ltr_is_identity() {
        assert_eq!(visual_order(&[0, 0, 0]), vec![0, 1, 2]);
    }

    #[test]
    fn rtl_segment_reverses() {
        // LTR, RTL, RTL, LTR
        assert_eq!(visual_order(&[0, 1, 1, 0]), vec![0, 2, 1, 3]);
    }

    #[test]
    fn nested_levels_reverse_outside_in() {
        // An LTR span embedded in an RTL span: levels 1,2,1
        assert_eq!(visual_order(&[1, 2, 1]), vec![2, 1, 0]);
    }

    #[test]
    fn fully_rtl_line_reverses_whole() {
        assert_eq!(visual_order(&[1, 1, 1]), vec![2, 1, 0]);
    }
}
