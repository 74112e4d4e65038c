//! Line assembly against a container.
//!
//! The typesetter carves candidate line rectangles out of a container
//! (splitting around obstacles), drives the line breaker with the resulting
//! width sequence, and turns the chosen break set into positioned,
//! justified, decorated, visually ordered lines.

use crate::LayoutError;
use crate::attributed::AttributedString;
use crate::bidi;
use crate::breaker::{build_stream, find_breakpoints, line_ranges};
use crate::config::LayoutConfig;
use crate::justify::justify;
use crate::pipeline::Hyphenator;
use crate::shape::ShapingEngine;
use quire_style::{TextAlign, TextDecoration};
use quire_types::{Color, Rect, Size};
use std::ops::Range;

const EPSILON: f32 = 0.01;
const ELLIPSIS: char = '\u{2026}';

/// The target area for a block of text: a rectangle, rectangular carve-outs
/// content must flow around, and an optional line budget.
#[derive(Debug, Clone, Default)]
pub struct Container {
    pub rect: Rect,
    pub obstacles: Vec<Rect>,
    pub max_lines: Option<usize>,
    /// When the line budget is hit, trim the last line and append an
    /// ellipsis instead of clipping silently.
    pub truncate: bool,
}

impl Container {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationKind {
    Underline,
    Strike,
}

/// A rectangle to paint under/through a run of a finished line.
#[derive(Debug, Clone, PartialEq)]
pub struct DecorationRect {
    pub rect: Rect,
    pub color: Color,
    pub kind: DecorationKind,
}

/// A finished line: a slice of the source string with resolved geometry,
/// ready for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub string: AttributedString,
    /// Byte range of this line in the text it was broken from.
    pub range: Range<usize>,
    pub rect: Rect,
    pub decorations: Vec<DecorationRect>,
    /// Advance of leading whitespace, excluded from alignment.
    pub leading_overflow: f32,
    /// Advance of trailing whitespace hanging outside the measure.
    pub trailing_overflow: f32,
}

impl Line {
    pub fn advance_width(&self) -> f32 {
        self.string.advance_width()
    }
}

pub struct Typesetter<'a> {
    pub shaper: &'a dyn ShapingEngine,
    pub hyphenator: &'a dyn Hyphenator,
    pub config: &'a LayoutConfig,
}

impl Typesetter<'_> {
    /// Lays out a whole text block (any number of paragraphs) into the
    /// container. Lines past the container bottom are still emitted, below
    /// it, so content is never dropped; pagination is the layer that takes
    /// overflow away.
    pub fn typeset_block(
        &self,
        text: &AttributedString,
        container: &Container,
    ) -> Result<Vec<Line>, LayoutError> {
        let mut lines: Vec<Line> = Vec::new();
        let mut y = container.rect.y;

        for (offset, paragraph) in text.paragraphs(self.shaper)? {
            let budget_left = match container.max_lines {
                Some(max) => {
                    if lines.len() >= max {
                        break;
                    }
                    Some(max - lines.len())
                }
                None => None,
            };
            let truncated =
                self.typeset_paragraph(&paragraph, offset, container, budget_left, &mut y, &mut lines)?;
            if truncated {
                break;
            }
        }

        if container.truncate
            && let Some(max) = container.max_lines
            && lines.len() >= max
            && let Some(last) = lines.last_mut()
        {
            self.append_ellipsis(last)?;
        }

        Ok(lines)
    }

    /// Measures the natural size of a text block at a width constraint, for
    /// the geometry solver's measure callback. An infinite width yields
    /// max-content size.
    pub fn measure(&self, text: &AttributedString, max_width: f32) -> Result<Size, LayoutError> {
        let mut total_height = 0.0f32;
        let mut widest = 0.0f32;
        for (_, paragraph) in text.paragraphs(self.shaper)? {
            let line_height = self.paragraph_line_height(&paragraph);
            let stream = build_stream(&paragraph, self.hyphenator, self.shaper, self.config)?;
            let breaks = find_breakpoints(&stream, &[max_width], self.config);
            let ranges = line_ranges(&stream, &breaks, paragraph.len());
            for (range, _) in &ranges {
                let slice = paragraph.slice(range.clone(), self.shaper)?;
                widest = widest.max(slice.advance_width());
            }
            total_height += ranges.len() as f32 * line_height;
        }
        if max_width.is_finite() {
            widest = widest.min(max_width);
        }
        Ok(Size::new(widest, total_height))
    }

    fn typeset_paragraph(
        &self,
        paragraph: &AttributedString,
        offset: usize,
        container: &Container,
        budget: Option<usize>,
        y: &mut f32,
        lines: &mut Vec<Line>,
    ) -> Result<bool, LayoutError> {
        let line_height = self.paragraph_line_height(paragraph);
        let rects = carve_rects(container, *y, line_height);
        let widths: Vec<f32> = rects.iter().map(|r| r.width).collect();

        let stream = build_stream(paragraph, self.hyphenator, self.shaper, self.config)?;
        let breaks = find_breakpoints(&stream, &widths, self.config);
        let ranges = line_ranges(&stream, &breaks, paragraph.len());
        let last_index = ranges.len() - 1;

        for (i, (range, hyphenated)) in ranges.into_iter().enumerate() {
            if let Some(budget) = budget
                && i >= budget
            {
                return Ok(true);
            }

            let rect = rects.get(i).copied().unwrap_or_else(|| {
                // Deterministic overflow below the container.
                let extra = (i - rects.len()) as f32;
                Rect::new(
                    container.rect.x,
                    container.rect.bottom() + extra * line_height,
                    container.rect.width,
                    line_height,
                )
            });

            let mut string = paragraph.slice(range.clone(), self.shaper)?;
            if hyphenated && !string.text().ends_with('-') {
                string = string.insert_glyph(string.len(), '-', self.shaper)?;
            }

            let line = self.finish_line(string, range, offset, rect, i == last_index)?;
            *y = rect.bottom();
            lines.push(line);
        }
        Ok(false)
    }

    /// Alignment, justification, decoration, and visual reordering for one
    /// broken-out line.
    fn finish_line(
        &self,
        mut string: AttributedString,
        range: Range<usize>,
        paragraph_offset: usize,
        rect: Rect,
        is_last: bool,
    ) -> Result<Line, LayoutError> {
        let align = string
            .runs()
            .first()
            .and_then(|r| r.attrs.align)
            .unwrap_or_default();

        let leading_overflow = edge_whitespace_advance(&string, false);
        let trailing_overflow = edge_whitespace_advance(&string, true);
        let natural = string.advance_width() - trailing_overflow;

        let needs_shrink = natural > rect.width + EPSILON;
        let justified = needs_shrink || (align == TextAlign::Justify && !is_last);
        if justified {
            justify(&mut string, rect.width);
        }

        let free = (rect.width - (string.advance_width() - trailing_overflow)).max(0.0);
        let x_offset = match align {
            TextAlign::Left | TextAlign::Justify => 0.0,
            TextAlign::Center => free / 2.0,
            TextAlign::Right => free,
        };

        let line_rect = Rect::new(rect.x + x_offset, rect.y, rect.width - x_offset, rect.height);
        let decorations = self.decorate(&string, line_rect);

        bidi::reorder(&mut string);

        Ok(Line {
            string,
            range: range.start + paragraph_offset..range.end + paragraph_offset,
            rect: line_rect,
            decorations,
            leading_overflow,
            trailing_overflow,
        })
    }

    fn decorate(&self, string: &AttributedString, rect: Rect) -> Vec<DecorationRect> {
        let mut out = Vec::new();
        let ascent = string
            .runs()
            .iter()
            .filter_map(|r| r.glyphs.as_ref())
            .map(|g| g.ascent)
            .fold(0.0f32, f32::max);

        let mut x = rect.x;
        for run in string.runs() {
            let Some(glyphs) = &run.glyphs else { continue };
            let width = glyphs.advance_width();
            let decoration = run.attrs.decoration.unwrap_or(TextDecoration::None);
            let color = run.attrs.color.unwrap_or_default();
            let thickness = (glyphs.font_size * 0.07).max(0.5);

            if decoration.has_underline() {
                out.push(DecorationRect {
                    rect: Rect::new(x, rect.y + ascent + thickness, width, thickness),
                    color,
                    kind: DecorationKind::Underline,
                });
            }
            if decoration.has_line_through() {
                out.push(DecorationRect {
                    rect: Rect::new(x, rect.y + ascent * 0.65, width, thickness),
                    color,
                    kind: DecorationKind::Strike,
                });
            }
            x += width;
        }
        out
    }

    fn append_ellipsis(&self, line: &mut Line) -> Result<(), LayoutError> {
        let trimmed = line.string.trim(self.shaper)?;
        let string = if trimmed.is_empty() {
            line.string.clone()
        } else {
            trimmed
        };
        line.string = string.insert_glyph(string.len(), ELLIPSIS, self.shaper)?;
        Ok(())
    }

    fn paragraph_line_height(&self, paragraph: &AttributedString) -> f32 {
        let from_runs = paragraph
            .runs()
            .iter()
            .filter_map(|r| r.glyphs.as_ref())
            .map(|g| g.line_height)
            .fold(0.0f32, f32::max);
        if from_runs > 0.0 {
            from_runs
        } else {
            self.config.default_font_size * self.config.default_line_height_factor
        }
    }
}

/// Advance of whitespace glyphs at one edge of the line.
fn edge_whitespace_advance(string: &AttributedString, trailing: bool) -> f32 {
    let text = string.text();
    let mut entries: Vec<(f32, bool)> = Vec::new();
    for run in string.runs() {
        let Some(glyphs) = &run.glyphs else { continue };
        for (glyph, position) in glyphs.glyphs.iter().zip(&glyphs.positions) {
            let ch = glyph
                .code_points
                .first()
                .copied()
                .or_else(|| text.get(glyph.cluster..).and_then(|s| s.chars().next()))
                .unwrap_or('\u{0}');
            entries.push((position.x_advance, ch.is_whitespace()));
        }
    }
    let iter: Box<dyn Iterator<Item = &(f32, bool)>> = if trailing {
        Box::new(entries.iter().rev())
    } else {
        Box::new(entries.iter())
    };
    iter.take_while(|(_, ws)| *ws).map(|(adv, _)| adv).sum()
}

/// Carves candidate line rectangles: one band per prospective line from
/// `from_y` down, each split around intersecting obstacles. An obstacle
/// crossing a band produces left/right fragments; a fully covered band
/// contributes nothing.
fn carve_rects(container: &Container, from_y: f32, line_height: f32) -> Vec<Rect> {
    let mut rects = Vec::new();
    let bottom = container.rect.bottom();
    let mut y = from_y;

    while y + line_height <= bottom + EPSILON {
        let band = Rect::new(container.rect.x, y, container.rect.width, line_height);
        carve_band(band, &container.obstacles, &mut rects);
        y += line_height;
    }

    if rects.is_empty() {
        // Zero-height (or fully obstructed) containers still lay out: a
        // single full-width band keeps every downstream stage total.
        rects.push(Rect::new(
            container.rect.x,
            from_y,
            container.rect.width,
            line_height,
        ));
    }
    rects
}

fn carve_band(band: Rect, obstacles: &[Rect], out: &mut Vec<Rect>) {
    let mut blockers: Vec<&Rect> = obstacles.iter().filter(|o| o.intersects(&band)).collect();
    if blockers.is_empty() {
        out.push(band);
        return;
    }
    blockers.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

    let mut x = band.x;
    for blocker in blockers {
        if blocker.x > x + EPSILON {
            out.push(Rect::new(x, band.y, blocker.x - x, band.height));
        }
        x = x.max(blocker.right());
    }
    if band.right() > x + EPSILON {
        out.push(Rect::new(x, band.y, band.right() - x, band.height));
    }
}
