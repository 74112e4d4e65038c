#![cfg(test)]

use crate::attributed::{Attributes, Fragment};
use crate::engine::LayoutEngine;
use crate::pipeline::{Hyphenator, IdentityHyphenator, MemoHyphenator};
use crate::test_utils::{FixedFont, FixedShaper, attrs, plain};
use quire_style::Direction;
use quire_types::FontId;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use unicode_script::Script;

#[test]
fn script_itemization_splits_at_script_changes() {
    let prepared = crate::test_utils::engine().prepare(&plain("hello мир")).unwrap();
    let scripts: Vec<Script> = prepared
        .runs()
        .iter()
        .filter_map(|r| r.attrs.script)
        .collect();
    assert_eq!(scripts, vec![Script::Latin, Script::Cyrillic]);
    // The space is Common: it never opens a boundary and stays attached to
    // the preceding Latin run.
    assert_eq!(prepared.runs()[0].range, 0..6);
}

#[test]
fn common_only_text_forms_a_single_run() {
    let prepared = crate::test_utils::engine().prepare(&plain("123 456")).unwrap();
    assert_eq!(prepared.runs().len(), 1);
    assert_eq!(prepared.runs()[0].attrs.script, Some(Script::Common));
}

#[test]
fn bidi_levels_annotate_mixed_direction_text() {
    let prepared = crate::test_utils::engine().prepare(&plain("abc אבג")).unwrap();
    let levels: Vec<u8> = prepared
        .runs()
        .iter()
        .filter_map(|r| r.attrs.bidi_level)
        .collect();
    assert!(levels.contains(&0), "latin run must be even level");
    assert!(
        levels.iter().any(|&l| l % 2 == 1),
        "hebrew run must be odd level"
    );
}

#[test]
fn rtl_base_direction_comes_from_the_leading_run() {
    let string = crate::attributed::AttributedString::from_fragments([Fragment::new(
        "אבג abc",
        Attributes {
            direction: Some(Direction::RightToLeft),
            ..attrs()
        },
    )]);
    let prepared = crate::test_utils::engine().prepare(&string).unwrap();
    let first_level = prepared.runs()[0].attrs.bidi_level.unwrap();
    assert_eq!(first_level % 2, 1, "rtl base puts hebrew at an odd level");
}

#[test]
fn font_substitution_walks_the_fallback_stack() {
    let mut primary = FixedFont::default();
    primary.missing.insert('я');
    let shaper = Arc::new(
        FixedShaper::new()
            .with_font(FontId(0), primary)
            .with_font(FontId(1), FixedFont::default()),
    );
    let engine = LayoutEngine::new(shaper).with_fallback_fonts(vec![FontId(1)]);

    let prepared = engine.prepare(&plain("aяa")).unwrap();
    let fonts: Vec<FontId> = prepared
        .runs()
        .iter()
        .map(|r| r.attrs.font.unwrap())
        .collect();
    assert_eq!(fonts, vec![FontId(0), FontId(1), FontId(0)]);
}

#[test]
fn uncovered_code_point_keeps_last_known_good_font() {
    let mut primary = FixedFont::default();
    primary.missing.insert('□');
    let shaper = Arc::new(FixedShaper::new().with_font(FontId(0), primary));
    let engine = LayoutEngine::new(shaper);

    // No fallback covers it either; width accounting must not lose the
    // character, so it stays with the last good font.
    let prepared = engine.prepare(&plain("a□b")).unwrap();
    assert_eq!(prepared.runs().len(), 1);
    assert_eq!(prepared.runs()[0].attrs.font, Some(FontId(0)));
    let glyphs = prepared.runs()[0].glyphs.as_ref().unwrap();
    assert_eq!(glyphs.glyphs.len(), 3);
}

struct CountingHyphenator(AtomicUsize);

impl Hyphenator for CountingHyphenator {
    fn syllable_breaks(&self, word: &str) -> Vec<usize> {
        self.0.fetch_add(1, Ordering::SeqCst);
        if word.len() > 4 { vec![2] } else { Vec::new() }
    }
}

#[test]
fn memo_hyphenator_caches_per_word() {
    let memo = MemoHyphenator::new(CountingHyphenator(AtomicUsize::new(0)));
    assert_eq!(memo.syllable_breaks("layout"), vec![2]);
    assert_eq!(memo.syllable_breaks("layout"), vec![2]);
    assert_eq!(memo.cached_words(), 1);

    memo.clear();
    assert_eq!(memo.cached_words(), 0);
    // A miss after clearing only costs recomputation.
    assert_eq!(memo.syllable_breaks("layout"), vec![2]);
}

#[test]
fn identity_hyphenator_never_splits() {
    assert!(IdentityHyphenator.syllable_breaks("hyphenation").is_empty());
}

#[test]
fn preprocessing_is_stable_across_repeat_runs() {
    let engine = crate::test_utils::engine();
    let once = engine.prepare(&plain("stable text")).unwrap();
    let twice = engine.prepare(&once).unwrap();
    assert_eq!(once, twice);
}
