#![cfg(test)]

use crate::justify::justify;
use crate::test_utils::prepared;

#[test]
fn expansion_fills_the_target_width_exactly() {
    // "aa bb cc": 8 glyphs at 5.0 = natural 40.
    let mut line = prepared("aa bb cc");
    justify(&mut line, 50.0);
    assert!(
        (line.advance_width() - 50.0).abs() < 1e-3,
        "got {}",
        line.advance_width()
    );
}

#[test]
fn shrink_meets_the_target_when_capacity_allows() {
    let mut line = prepared("aa bb cc");
    justify(&mut line, 38.0);
    assert!(
        (line.advance_width() - 38.0).abs() < 1e-3,
        "got {}",
        line.advance_width()
    );
}

#[test]
fn spaces_absorb_more_than_letters() {
    let mut line = prepared("aa bb cc");
    let before: Vec<f32> = advances(&line);
    justify(&mut line, 50.0);
    let after: Vec<f32> = advances(&line);

    // Glyph indices 2 and 5 are the spaces.
    let space_gain = (after[2] - before[2]) + (after[5] - before[5]);
    let letter_gain: f32 = (0..8)
        .filter(|i| *i != 2 && *i != 5)
        .map(|i| after[i] - before[i])
        .sum();
    assert!(
        space_gain > letter_gain,
        "spaces {space_gain} letters {letter_gain}"
    );
}

#[test]
fn line_without_adjustable_glyphs_is_left_unchanged() {
    // A single glyph is an edge glyph: zero weight everywhere.
    let mut line = prepared("a");
    let before = line.advance_width();
    justify(&mut line, 50.0);
    assert_eq!(line.advance_width(), before);
}

#[test]
fn insufficient_capacity_stops_at_saturation() {
    // No spaces: only the constrained inter-character tier exists, so a
    // huge target cannot be met; the line grows by exactly the tier
    // capacity and no further.
    let mut line = prepared("abcd");
    let natural = line.advance_width();
    justify(&mut line, 500.0);
    let grown = line.advance_width();
    assert!(grown > natural);
    assert!(grown < 500.0);
    // Edge glyph excluded: only three glyphs carry expansion weight, each
    // capped at 12% of its advance.
    let expected = natural + 3.0 * 5.0 * 0.12;
    assert!((grown - expected).abs() < 1e-3, "got {grown}");
}

#[test]
fn trailing_whitespace_has_no_weight() {
    let mut line = prepared("aa bb ");
    justify(&mut line, 40.0);
    let all = advances(&line);
    // The trailing space keeps its natural advance.
    assert!((all[5] - 5.0).abs() < 1e-3);
    // Visible content (total minus the hanging space) fills the measure.
    let visible: f32 = all[..5].iter().sum();
    assert!((visible - 40.0).abs() < 1e-3, "got {visible}");
}

fn advances(line: &crate::attributed::AttributedString) -> Vec<f32> {
    line.runs()
        .iter()
        .filter_map(|r| r.glyphs.as_ref())
        .flat_map(|g| g.positions.iter().map(|p| p.x_advance))
        .collect()
}
