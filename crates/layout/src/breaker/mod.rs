//! Paragraph line breaking.
//!
//! A shaped paragraph is first lowered into a stream of boxes (unbreakable
//! content), glue (stretchable space), and penalties (costed break
//! opportunities). The optimal pass searches that stream for the break set
//! with minimal demerits; when no legal set exists even after tolerance
//! escalation, a greedy best-fit pass takes over. Both passes never drop
//! content.

mod best_fit;
mod knuth_plass;

use crate::LayoutError;
use crate::attributed::AttributedString;
use crate::config::LayoutConfig;
use crate::pipeline::Hyphenator;
use crate::shape::{ShapingEngine, char_advance};
use std::collections::BTreeSet;
use std::ops::Range;
use unicode_linebreak::{BreakOpportunity, linebreaks};

/// One node of the breakpoint stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamNode {
    /// Fixed-width content (a word, a syllable, an inline attachment).
    Box { width: f32, range: Range<usize> },
    /// Breakable, stretchable space.
    Glue {
        width: f32,
        stretch: f32,
        shrink: f32,
        range: Range<usize>,
    },
    /// A candidate break with a cost; `flagged` marks hyphenation points.
    /// `width` is the advance a hyphen would add if the break is taken.
    Penalty {
        width: f32,
        cost: f32,
        flagged: bool,
        at: usize,
    },
}

/// A chosen break: the stream node it occurred at and the byte offset the
/// line ends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub index: usize,
    pub at: usize,
    pub flagged: bool,
    pub ratio: f32,
}

/// Line widths index past the end of the array reuse the last entry, which
/// is how ragged and obstacle-constrained containers express themselves.
pub(crate) fn width_for(widths: &[f32], line: usize) -> f32 {
    match widths {
        [] => f32::INFINITY,
        _ => widths[line.min(widths.len() - 1)],
    }
}

/// Finds the break set for a stream against per-line target widths.
///
/// Tolerance starts at the configured default and escalates in steps up to
/// the ceiling; past that the greedy fallback runs. Non-convergence is
/// never an error: worst case the result is a single unbroken line.
pub fn find_breakpoints(
    nodes: &[StreamNode],
    widths: &[f32],
    config: &LayoutConfig,
) -> Vec<Breakpoint> {
    let mut tolerance = config.tolerance;
    loop {
        if let Some(breaks) = knuth_plass::knuth_plass(nodes, widths, tolerance, config) {
            return breaks;
        }
        if tolerance >= config.max_tolerance {
            break;
        }
        tolerance = (tolerance + config.tolerance_step).min(config.max_tolerance);
    }
    best_fit::best_fit(nodes, widths)
}

/// Converts a break set back into byte ranges over the paragraph, one per
/// line, with a flag for lines that end at a hyphenation break. Content
/// coverage is total: every byte of the paragraph lands in exactly one
/// line (modulo discarded inter-line glue).
pub fn line_ranges(
    nodes: &[StreamNode],
    breaks: &[Breakpoint],
    len: usize,
) -> Vec<(Range<usize>, bool)> {
    let mut out = Vec::with_capacity(breaks.len().max(1));
    let mut start = 0usize;
    for bp in breaks {
        if start >= len && !out.is_empty() {
            break;
        }
        let end = bp.at.clamp(start, len);
        out.push((start..end, bp.flagged));
        start = next_content_offset(nodes, bp.index, len);
    }
    if out.is_empty() || start < len {
        out.push((start..len, false));
    }
    out
}

fn next_content_offset(nodes: &[StreamNode], break_index: usize, len: usize) -> usize {
    for node in &nodes[break_index + 1..] {
        if let StreamNode::Box { range, .. } = node {
            return range.start;
        }
    }
    len
}

// --- Stream construction ---

#[derive(Debug, Clone, Copy, PartialEq)]
enum AtomKind {
    Space,
    Newline,
    Other,
}

#[derive(Debug, Clone)]
struct Atom {
    range: Range<usize>,
    advance: f32,
    kind: AtomKind,
    run_index: usize,
}

/// Lowers a shaped paragraph into a breakpoint stream.
///
/// Words become boxes, split into syllable boxes joined by flagged
/// penalties wherever the hyphenator or an intra-word break opportunity
/// (e.g. after an explicit hyphen) allows. Spaces become glue with classic
/// stretch/shrink proportions. The stream is always terminated by a
/// zero-width infinite-stretch glue and a forced break, so a break set
/// always exists.
pub fn build_stream(
    paragraph: &AttributedString,
    hyphenator: &dyn Hyphenator,
    shaper: &dyn ShapingEngine,
    config: &LayoutConfig,
) -> Result<Vec<StreamNode>, LayoutError> {
    let text = paragraph.text();
    let atoms = collect_atoms(paragraph);

    let soft_breaks: BTreeSet<usize> = linebreaks(text)
        .filter(|(_, op)| *op == BreakOpportunity::Allowed)
        .map(|(i, _)| i)
        .filter(|&i| {
            i > 0
                && i < text.len()
                && !text[..i].ends_with(|c: char| c.is_whitespace())
        })
        .collect();

    let mut nodes: Vec<StreamNode> = Vec::with_capacity(atoms.len() + 2);
    let mut word: Vec<&Atom> = Vec::new();

    for atom in &atoms {
        match atom.kind {
            AtomKind::Other => word.push(atom),
            AtomKind::Space => {
                flush_word(
                    paragraph, &word, &soft_breaks, hyphenator, shaper, config, &mut nodes,
                )?;
                word.clear();
                let word_spacing = paragraph.runs()[atom.run_index]
                    .attrs
                    .word_spacing
                    .unwrap_or(0.0);
                let width = atom.advance + word_spacing;
                nodes.push(StreamNode::Glue {
                    width,
                    stretch: width * config.glue_stretch,
                    shrink: width * config.glue_shrink,
                    range: atom.range.clone(),
                });
            }
            AtomKind::Newline => {
                flush_word(
                    paragraph, &word, &soft_breaks, hyphenator, shaper, config, &mut nodes,
                )?;
                word.clear();
                nodes.push(StreamNode::Penalty {
                    width: 0.0,
                    cost: f32::NEG_INFINITY,
                    flagged: false,
                    at: atom.range.start,
                });
            }
        }
    }
    flush_word(
        paragraph, &word, &soft_breaks, hyphenator, shaper, config, &mut nodes,
    )?;

    nodes.push(StreamNode::Glue {
        width: 0.0,
        stretch: f32::INFINITY,
        shrink: 0.0,
        range: text.len()..text.len(),
    });
    nodes.push(StreamNode::Penalty {
        width: 0.0,
        cost: f32::NEG_INFINITY,
        flagged: false,
        at: text.len(),
    });
    Ok(nodes)
}

fn collect_atoms(paragraph: &AttributedString) -> Vec<Atom> {
    let text = paragraph.text();
    let mut atoms = Vec::new();
    for (run_index, run) in paragraph.runs().iter().enumerate() {
        let Some(glyphs) = &run.glyphs else {
            continue;
        };
        for group in glyphs.cluster_groups(run.range.end) {
            let advance: f32 = glyphs.positions[group.glyph_start..group.glyph_end]
                .iter()
                .map(|p| p.x_advance)
                .sum();
            let first = text[group.start..].chars().next().unwrap_or(' ');
            let kind = match first {
                '\n' => AtomKind::Newline,
                c if c.is_whitespace() => AtomKind::Space,
                _ => AtomKind::Other,
            };
            atoms.push(Atom {
                range: group.start..group.end,
                advance,
                kind,
                run_index,
            });
        }
    }
    atoms
}

#[allow(clippy::too_many_arguments)]
fn flush_word(
    paragraph: &AttributedString,
    word: &[&Atom],
    soft_breaks: &BTreeSet<usize>,
    hyphenator: &dyn Hyphenator,
    shaper: &dyn ShapingEngine,
    config: &LayoutConfig,
    nodes: &mut Vec<StreamNode>,
) -> Result<(), LayoutError> {
    let (Some(first), Some(last)) = (word.first(), word.last()) else {
        return Ok(());
    };
    let word_range = first.range.start..last.range.end;
    let text = paragraph.text();

    let hyphenate = paragraph.runs()[first.run_index]
        .attrs
        .hyphenate
        .unwrap_or(true);

    // Split offsets must land on cluster starts; anything else (a pattern
    // boundary inside a ligature) is dropped.
    let mut splits: BTreeSet<usize> = soft_breaks
        .range((word_range.start + 1)..word_range.end)
        .copied()
        .collect();
    if hyphenate {
        for offset in hyphenator.syllable_breaks(&text[word_range.clone()]) {
            splits.insert(word_range.start + offset);
        }
    }
    splits.retain(|&offset| word.iter().any(|a| a.range.start == offset));

    let mut segment_start = word_range.start;
    let mut segment_width = 0.0f32;
    for atom in word {
        if splits.contains(&atom.range.start) && atom.range.start > segment_start {
            nodes.push(StreamNode::Box {
                width: segment_width,
                range: segment_start..atom.range.start,
            });
            let needs_hyphen = !text[..atom.range.start].ends_with('-');
            let width = match (needs_hyphen, &paragraph.runs()[atom.run_index].glyphs) {
                (true, Some(glyphs)) => {
                    char_advance(shaper, glyphs.font, glyphs.font_size, '-')?
                }
                _ => 0.0,
            };
            nodes.push(StreamNode::Penalty {
                width,
                cost: config.hyphen_penalty,
                flagged: true,
                at: atom.range.start,
            });
            segment_start = atom.range.start;
            segment_width = 0.0;
        }
        segment_width += atom.advance;
    }
    nodes.push(StreamNode::Box {
        width: segment_width,
        range: segment_start..word_range.end,
    });
    Ok(())
}
