//! Unicode script itemization (UAX #24, via unicode-script).

use crate::attributed::AttributedString;
use crate::attributed::{Attributes, Run};
use unicode_script::{Script, UnicodeScript};

/// Scripts that never open an itemization boundary; they inherit the
/// surrounding script instead.
fn is_ignored(script: Script) -> bool {
    matches!(script, Script::Common | Script::Inherited | Script::Unknown)
}

/// Splits the string into maximal same-script ranges. Ignored scripts
/// (Common/Inherited/Unknown) attach to the preceding concrete script, or
/// to the following one at the very start of the string.
pub fn annotate(string: &AttributedString) -> Vec<Run> {
    let text = string.text();
    if text.is_empty() {
        return Vec::new();
    }

    let mut out: Vec<Run> = Vec::new();
    let mut current: Option<Script> = None;
    let mut start = 0;

    for (i, ch) in text.char_indices() {
        let script = ch.script();
        if is_ignored(script) {
            continue;
        }
        match current {
            None => {
                // Leading ignored characters attach to the first concrete
                // script seen.
                current = Some(script);
            }
            Some(active) if active == script => {}
            Some(active) => {
                out.push(script_run(start..i, active));
                start = i;
                current = Some(script);
            }
        }
    }

    out.push(script_run(
        start..text.len(),
        current.unwrap_or(Script::Common),
    ));
    out
}

fn script_run(range: std::ops::Range<usize>, script: Script) -> Run {
    Run::new(
        range,
        Attributes {
            script: Some(script),
            ..Default::default()
        },
    )
}
