//! Bidi embedding-level annotation (UAX #9, via unicode-bidi).

use crate::attributed::{Attributes, Run};
use crate::attributed::AttributedString;
use quire_style::Direction;
use unicode_bidi::{BidiInfo, Level};

/// Resolves embedding levels for the whole string and emits one annotation
/// run per maximal same-level range.
///
/// The paragraph base direction comes from the leading run's declared
/// direction, defaulting to left-to-right.
pub fn annotate(string: &AttributedString) -> Vec<Run> {
    if string.is_empty() {
        return Vec::new();
    }
    let base = match string
        .runs()
        .first()
        .and_then(|r| r.attrs.direction)
        .unwrap_or_default()
    {
        Direction::LeftToRight => Level::ltr(),
        Direction::RightToLeft => Level::rtl(),
    };

    let info = BidiInfo::new(string.text(), Some(base));

    let mut out: Vec<Run> = Vec::new();
    for (i, level) in info.levels.iter().enumerate() {
        let number = level.number();
        match out.last_mut() {
            Some(run)
                if run.attrs.bidi_level == Some(number) && run.range.end == i =>
            {
                run.range.end = i + 1;
            }
            _ => {
                let attrs = Attributes {
                    bidi_level: Some(number),
                    ..Default::default()
                };
                out.push(Run::new(i..i + 1, attrs));
            }
        }
    }
    out
}
