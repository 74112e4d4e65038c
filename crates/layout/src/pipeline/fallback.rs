//! Font substitution.
//!
//! Walks each run's code points in order, picking the first font in the
//! configured stack (the run's own font followed by the engine fallbacks)
//! whose shaping engine reports a glyph. Code points no font covers stay
//! with the last-known-good font so width accounting never silently skips
//! them. A new annotation run is emitted whenever the chosen font changes.

use crate::LayoutError;
use crate::attributed::AttributedString;
use crate::attributed::{Attributes, Run};
use crate::shape::ShapingEngine;
use quire_types::FontId;

pub fn annotate(
    string: &AttributedString,
    shaper: &dyn ShapingEngine,
    fallback_fonts: &[FontId],
) -> Result<Vec<Run>, LayoutError> {
    let text = string.text();
    let mut out: Vec<Run> = Vec::new();

    for run in string.runs() {
        if run.attrs.attachment.is_some() {
            continue;
        }
        let preferred = run.attrs.font;
        let mut last_good = preferred.or_else(|| fallback_fonts.first().copied());

        for (i, ch) in text[run.range.clone()].char_indices() {
            let offset = run.range.start + i;
            let chosen = choose(preferred, fallback_fonts, shaper, ch)?.or(last_good);
            let Some(chosen) = chosen else {
                continue;
            };
            last_good = Some(chosen);

            let end = offset + ch.len_utf8();
            match out.last_mut() {
                Some(prev) if prev.range.end == offset && prev.attrs.font == Some(chosen) => {
                    prev.range.end = end;
                }
                _ => out.push(Run::new(
                    offset..end,
                    Attributes {
                        font: Some(chosen),
                        ..Default::default()
                    },
                )),
            }
        }
    }

    Ok(out)
}

fn choose(
    preferred: Option<FontId>,
    fallback_fonts: &[FontId],
    shaper: &dyn ShapingEngine,
    ch: char,
) -> Result<Option<FontId>, LayoutError> {
    for font in preferred.into_iter().chain(fallback_fonts.iter().copied()) {
        if shaper.has_glyph(font, ch)? {
            return Ok(Some(font));
        }
    }
    Ok(None)
}
