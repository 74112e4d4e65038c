#![cfg(test)]

use crate::LayoutError;
use crate::attributed::{AttributedString, Attributes, Fragment, Run};
use crate::test_utils::{FixedFont, FixedShaper, attrs, plain, prepared, shaper};
use quire_types::{Color, FontId};
use std::sync::Arc;

#[test]
fn slice_concat_reproduces_the_original() {
    let s = prepared("hello world");
    let shaper = shaper();
    for (i, j) in [(0, 11), (3, 11), (5, 9), (0, 5)] {
        let left = s.slice(0..i, shaper.as_ref()).unwrap();
        let mid = s.slice(i..j, shaper.as_ref()).unwrap();
        let expected = s.slice(0..j, shaper.as_ref()).unwrap();
        assert_eq!(left.concat(&mid), expected, "slice 0..{i} ++ {i}..{j}");
    }
}

#[test]
fn slice_preserves_interior_run_boundaries() {
    let s = AttributedString::from_fragments([
        Fragment::new("abc", attrs()),
        Fragment::new(
            "def",
            Attributes {
                color: Some(Color::gray(128)),
                ..attrs()
            },
        ),
    ]);
    let sliced = s.slice(1..5, shaper().as_ref()).unwrap();
    assert_eq!(sliced.text(), "bcde");
    assert_eq!(sliced.runs().len(), 2);
    assert_eq!(sliced.runs()[0].range, 0..2);
    assert_eq!(sliced.runs()[1].range, 2..4);
}

#[test]
fn slice_inside_ligature_reshapes_constituents() {
    let shaper = Arc::new(FixedShaper::new().with_font(FontId(0), {
        let mut font = FixedFont::default();
        font.ligatures.insert("fi".to_string(), 0xF001);
        font
    }));
    let engine = crate::engine::LayoutEngine::new(shaper.clone());
    let s = engine.prepare(&plain("fin")).unwrap();

    // The ligature collapsed "fi" into one glyph.
    let glyphs = s.runs()[0].glyphs.as_ref().unwrap();
    assert_eq!(glyphs.glyphs.len(), 2);
    assert!(glyphs.glyphs[0].is_ligature);

    // Cutting between 'f' and 'i' re-shapes both sides as standalone
    // glyphs; nothing is lost.
    let left = s.slice(0..1, shaper.as_ref()).unwrap();
    let right = s.slice(1..3, shaper.as_ref()).unwrap();
    let left_glyphs = left.runs()[0].glyphs.as_ref().unwrap();
    let right_glyphs = right.runs()[0].glyphs.as_ref().unwrap();
    assert_eq!(left_glyphs.glyphs.len(), 1);
    assert_eq!(left_glyphs.glyphs[0].id, 'f' as u32);
    assert_eq!(right_glyphs.glyphs.len(), 2);
    assert_eq!(right_glyphs.glyphs[0].id, 'i' as u32);
}

#[test]
fn flatten_is_idempotent() {
    let base = plain("abcdefgh");
    let annotations = vec![
        Run::new(
            0..5,
            Attributes {
                color: Some(Color::gray(10)),
                ..Default::default()
            },
        ),
        Run::new(
            3..8,
            Attributes {
                color: Some(Color::gray(20)),
                ..Default::default()
            },
        ),
    ];
    let annotated = base.annotate(&annotations);
    let once = annotated.flatten();
    let twice = once.flatten();
    assert_eq!(once, twice);
}

#[test]
fn later_annotations_override_earlier_per_key() {
    let base = plain("abcdefgh");
    let annotated = base.annotate(&[
        Run::new(
            0..6,
            Attributes {
                color: Some(Color::gray(10)),
                letter_spacing: Some(1.0),
                ..Default::default()
            },
        ),
        Run::new(
            4..8,
            Attributes {
                color: Some(Color::gray(20)),
                ..Default::default()
            },
        ),
    ]);
    let overlap = annotated
        .runs()
        .iter()
        .find(|r| r.range.start == 4)
        .unwrap();
    assert_eq!(overlap.attrs.color, Some(Color::gray(20)));
    // Keys the later annotation did not touch survive.
    assert_eq!(overlap.attrs.letter_spacing, Some(1.0));
}

#[test]
fn empty_string_operations_are_defined() {
    let empty = AttributedString::new();
    let shaper = shaper();
    assert!(empty.is_empty());
    assert_eq!(empty.runs().len(), 0);
    assert_eq!(empty.slice(0..10, shaper.as_ref()).unwrap(), empty);
    assert_eq!(empty.trim(shaper.as_ref()).unwrap(), empty);
    assert_eq!(empty.concat(&empty), empty);
    assert_eq!(empty.flatten(), empty);
    assert_eq!(
        empty.paragraphs(shaper.as_ref()).unwrap().len(),
        1,
        "the empty string is one empty paragraph"
    );
}

#[test]
fn malformed_runs_are_rejected_at_construction() {
    let gapped = AttributedString::from_parts(
        "abcdef".to_string(),
        vec![Run::new(0..2, attrs()), Run::new(3..6, attrs())],
    );
    assert!(matches!(gapped, Err(LayoutError::MalformedRuns(_))));

    let overlapping = AttributedString::from_parts(
        "abcdef".to_string(),
        vec![Run::new(0..4, attrs()), Run::new(2..6, attrs())],
    );
    assert!(matches!(overlapping, Err(LayoutError::MalformedRuns(_))));

    let short = AttributedString::from_parts("abcdef".to_string(), vec![Run::new(0..4, attrs())]);
    assert!(matches!(short, Err(LayoutError::MalformedRuns(_))));

    let ok = AttributedString::from_parts("abcdef".to_string(), vec![Run::new(0..6, attrs())]);
    assert!(ok.is_ok());
}

#[test]
fn trim_strips_edge_whitespace_only() {
    let s = prepared("  inner text  ");
    let trimmed = s.trim(shaper().as_ref()).unwrap();
    assert_eq!(trimmed.text(), "inner text");

    let all_space = prepared("   ");
    assert!(all_space.trim(shaper().as_ref()).unwrap().is_empty());
}

#[test]
fn insert_glyph_extends_run_and_mapping() {
    let s = prepared("word");
    let with_hyphen = s.insert_glyph(4, '-', shaper().as_ref()).unwrap();
    assert_eq!(with_hyphen.text(), "word-");
    assert_eq!(with_hyphen.runs().len(), 1);
    assert_eq!(with_hyphen.runs()[0].range, 0..5);
    let glyphs = with_hyphen.runs()[0].glyphs.as_ref().unwrap();
    assert_eq!(glyphs.glyphs.len(), 5);
    assert_eq!(glyphs.glyphs[4].id, '-' as u32);
    assert_eq!(glyphs.glyphs[4].cluster, 4);
    // Advance accounting follows: 5 glyphs at 5.0 each.
    assert!((with_hyphen.advance_width() - 25.0).abs() < 1e-4);
}

#[test]
fn append_merges_compatible_fragments() {
    let s = plain("abc").append(&Fragment::new("def", attrs()));
    assert_eq!(s.text(), "abcdef");
    assert_eq!(s.runs().len(), 1);

    let styled = s.append(&Fragment::new(
        "ghi",
        Attributes {
            color: Some(Color::gray(1)),
            ..attrs()
        },
    ));
    assert_eq!(styled.runs().len(), 2);
}

#[test]
fn paragraphs_split_on_newline_and_keep_offsets() {
    let s = prepared("one\ntwo\n\nfour");
    let paragraphs = s.paragraphs(shaper().as_ref()).unwrap();
    let texts: Vec<&str> = paragraphs.iter().map(|(_, p)| p.text()).collect();
    assert_eq!(texts, vec!["one", "two", "", "four"]);
    let offsets: Vec<usize> = paragraphs.iter().map(|(o, _)| *o).collect();
    assert_eq!(offsets, vec![0, 4, 8, 9]);
}
