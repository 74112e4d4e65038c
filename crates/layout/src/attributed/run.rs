use crate::shape::GlyphRun;
use quire_style::{Direction, TextAlign, TextDecoration};
use quire_types::{Color, FontId, Size};
use std::ops::Range;
use unicode_script::Script;

/// Per-run style and shaping metadata.
///
/// Every field is optional so that independent annotation passes can each
/// contribute only the keys they own; [`Attributes::patch`] merges two maps
/// with later-applied keys winning.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attributes {
    pub font: Option<FontId>,
    pub font_size: Option<f32>,
    pub color: Option<Color>,
    pub decoration: Option<TextDecoration>,
    pub direction: Option<Direction>,
    pub align: Option<TextAlign>,
    pub line_height: Option<f32>,
    pub letter_spacing: Option<f32>,
    pub word_spacing: Option<f32>,
    pub hyphenate: Option<bool>,
    /// Resolved bidi embedding level (even = LTR, odd = RTL).
    pub bidi_level: Option<u8>,
    /// Unicode script of the run after itemization.
    pub script: Option<Script>,
    /// Size of an inline attachment (image) replacing this run's text.
    pub attachment: Option<Size>,
}

impl Attributes {
    /// Returns a copy of `self` with every `Some` key of `patch` applied on
    /// top. Keys absent from the patch keep their current value.
    pub fn patched(&self, patch: &Attributes) -> Attributes {
        macro_rules! pick {
            ($field:ident) => {
                patch.$field.clone().or_else(|| self.$field.clone())
            };
        }
        Attributes {
            font: pick!(font),
            font_size: pick!(font_size),
            color: pick!(color),
            decoration: pick!(decoration),
            direction: pick!(direction),
            align: pick!(align),
            line_height: pick!(line_height),
            letter_spacing: pick!(letter_spacing),
            word_spacing: pick!(word_spacing),
            hyphenate: pick!(hyphenate),
            bidi_level: pick!(bidi_level),
            script: pick!(script),
            attachment: pick!(attachment),
        }
    }
}

/// A contiguous byte range of the string with one uniform attribute set,
/// optionally carrying shaped glyph data.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub range: Range<usize>,
    pub attrs: Attributes,
    pub glyphs: Option<GlyphRun>,
}

impl Run {
    pub fn new(range: Range<usize>, attrs: Attributes) -> Self {
        Self {
            range,
            attrs,
            glyphs: None,
        }
    }

    pub fn len(&self) -> usize {
        self.range.end - self.range.start
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Whether this run can merge with an immediately following one without
    /// changing meaning: equal attributes and compatible glyph state.
    pub(crate) fn can_merge(&self, next: &Run) -> bool {
        if self.range.end != next.range.start || self.attrs != next.attrs {
            return false;
        }
        match (&self.glyphs, &next.glyphs) {
            (None, None) => true,
            (Some(a), Some(b)) => a.font == b.font && a.font_size == b.font_size,
            _ => false,
        }
    }

    pub(crate) fn merge(&mut self, next: Run) {
        self.range.end = next.range.end;
        if let (Some(mine), Some(theirs)) = (&mut self.glyphs, next.glyphs) {
            mine.glyphs.extend(theirs.glyphs);
            mine.positions.extend(theirs.positions);
            mine.ascent = mine.ascent.max(theirs.ascent);
            mine.descent = mine.descent.min(theirs.descent);
            mine.line_height = mine.line_height.max(theirs.line_height);
        }
    }
}

/// Merges a set of annotation runs over a base run list.
///
/// The result partitions `[0, len)` (assuming the base does): boundaries are
/// the union of all input boundaries, each interval carries the base
/// attributes patched by every annotation covering it in application order,
/// and adjacent intervals with identical attributes collapse. Empty input
/// runs are dropped. The operation is idempotent.
///
/// Glyph data survives only on intervals whose base run was not cut by an
/// annotation boundary; annotation is a pre-shaping concern, so in practice
/// the base is glyphless here.
pub(crate) fn flatten(base: &[Run], annotations: &[Run], len: usize) -> Vec<Run> {
    if len == 0 {
        return Vec::new();
    }

    let mut cuts: Vec<usize> = Vec::with_capacity(2 + base.len() * 2 + annotations.len() * 2);
    cuts.push(0);
    cuts.push(len);
    for run in base.iter().chain(annotations) {
        cuts.push(run.range.start.min(len));
        cuts.push(run.range.end.min(len));
    }
    cuts.sort_unstable();
    cuts.dedup();

    let mut out: Vec<Run> = Vec::new();
    for window in cuts.windows(2) {
        let (start, end) = (window[0], window[1]);
        if start == end {
            continue;
        }
        let base_run = base
            .iter()
            .find(|r| r.range.start <= start && r.range.end >= end);
        let mut attrs = base_run.map(|r| r.attrs.clone()).unwrap_or_default();
        for annotation in annotations {
            if annotation.range.start <= start && annotation.range.end >= end {
                attrs = attrs.patched(&annotation.attrs);
            }
        }

        let glyphs = base_run.and_then(|r| {
            if r.range.start == start && r.range.end == end {
                r.glyphs.clone()
            } else {
                None
            }
        });

        let run = Run {
            range: start..end,
            attrs,
            glyphs,
        };
        match out.last_mut() {
            Some(prev) if prev.can_merge(&run) => prev.merge(run),
            _ => out.push(run),
        }
    }
    out
}
