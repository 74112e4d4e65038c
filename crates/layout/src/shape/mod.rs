//! Glyph-level data model and the shaping collaborator contract.
//!
//! The engine never reads font tables itself. Everything glyph-shaped goes
//! through [`ShapingEngine`]; the crate ships a rustybuzz-backed
//! implementation in [`harf`], and tests substitute a deterministic
//! fixed-advance engine.

use crate::LayoutError;
use quire_types::FontId;

pub mod harf;
mod resolve;

pub use resolve::resolve_glyphs;

/// Vertical font metrics in font design units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub units_per_em: u16,
    pub ascent: i16,
    pub descent: i16,
    pub line_gap: i16,
}

impl FontMetrics {
    /// Scale factor from design units to a given font size.
    pub fn scale(&self, font_size: f32) -> f32 {
        font_size / self.units_per_em as f32
    }

    pub fn ascent_for(&self, font_size: f32) -> f32 {
        self.ascent as f32 * self.scale(font_size)
    }

    pub fn descent_for(&self, font_size: f32) -> f32 {
        self.descent as f32 * self.scale(font_size)
    }

    /// Natural line height (ascent − descent + line gap) at a font size.
    pub fn line_height_for(&self, font_size: f32) -> f32 {
        (self.ascent as f32 - self.descent as f32 + self.line_gap as f32) * self.scale(font_size)
    }
}

/// One glyph as reported by the shaping collaborator, in design units.
///
/// `cluster` is the byte offset of the first code point this glyph maps to,
/// relative to the start of the shaped text. Several code points collapsing
/// into one glyph (a ligature) share a cluster; one code point expanding to
/// several glyphs repeats it.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedGlyph {
    pub id: u32,
    pub cluster: u32,
    pub code_points: Vec<char>,
    pub is_ligature: bool,
    pub is_mark: bool,
}

/// Advance and offset of one shaped glyph, in design units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawPosition {
    pub x_advance: i32,
    pub y_advance: i32,
    pub x_offset: i32,
    pub y_offset: i32,
}

/// The result of shaping one run of text with one font.
///
/// `glyphs` and `positions` are parallel and in logical (string) order with
/// non-decreasing clusters; implementations shaping right-to-left text must
/// reorder their output accordingly before returning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapedGlyphs {
    pub glyphs: Vec<ShapedGlyph>,
    pub positions: Vec<RawPosition>,
}

impl ShapedGlyphs {
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// The external shaping collaborator.
///
/// Implementations must be idempotent: shaping the same text with the same
/// font twice must be equivalent to caching the first result, because
/// re-layout after pagination re-invokes every call.
pub trait ShapingEngine {
    /// Shape a run of text with the given font. An unregistered `font` is a
    /// configuration error and must fail, never silently substitute.
    fn shape(&self, text: &str, font: FontId) -> Result<ShapedGlyphs, LayoutError>;

    /// Whether the font has a glyph (other than .notdef) for the code point.
    fn has_glyph(&self, font: FontId, code_point: char) -> Result<bool, LayoutError>;

    /// Vertical metrics of the font.
    fn metrics(&self, font: FontId) -> Result<FontMetrics, LayoutError>;
}

/// One glyph scaled to its run's font size, with its cluster rebased to an
/// absolute byte offset in the owning attributed string.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub id: u32,
    pub cluster: usize,
    pub code_points: Vec<char>,
    pub is_ligature: bool,
    pub is_mark: bool,
}

/// Position of one glyph, already scaled to the run's font size.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlyphPosition {
    pub x_advance: f32,
    pub y_advance: f32,
    pub x_offset: f32,
    pub y_offset: f32,
}

/// A maximal group of glyphs sharing one cluster, together with the byte
/// span of the code points it covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterGroup {
    pub start: usize,
    pub end: usize,
    pub glyph_start: usize,
    pub glyph_end: usize,
}

/// Shaped glyph data attached to a run.
///
/// Glyphs are stored in logical order with non-decreasing clusters; visual
/// reordering of right-to-left content happens per finished line, never
/// here.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    pub font: FontId,
    pub font_size: f32,
    pub glyphs: Vec<Glyph>,
    pub positions: Vec<GlyphPosition>,
    pub ascent: f32,
    pub descent: f32,
    pub line_height: f32,
}

impl GlyphRun {
    /// Total horizontal advance of the run.
    pub fn advance_width(&self) -> f32 {
        self.positions.iter().map(|p| p.x_advance).sum()
    }

    /// Groups glyphs by cluster. `run_end` is the absolute byte offset one
    /// past the last code point of the owning run.
    pub fn cluster_groups(&self, run_end: usize) -> Vec<ClusterGroup> {
        let mut groups: Vec<ClusterGroup> = Vec::new();
        for (i, glyph) in self.glyphs.iter().enumerate() {
            match groups.last_mut() {
                Some(group) if group.start == glyph.cluster => {
                    group.glyph_end = i + 1;
                }
                _ => {
                    if let Some(prev) = groups.last_mut() {
                        prev.end = glyph.cluster;
                    }
                    groups.push(ClusterGroup {
                        start: glyph.cluster,
                        end: run_end,
                        glyph_start: i,
                        glyph_end: i + 1,
                    });
                }
            }
        }
        groups
    }

    /// Splits the run at an absolute byte offset.
    ///
    /// A split that lands between clusters just partitions the glyph list.
    /// A split inside a ligature cluster re-shapes the cluster's code points
    /// on both sides through the collaborator so no glyph data is lost.
    pub fn split(
        &self,
        text: &str,
        run_range: std::ops::Range<usize>,
        at: usize,
        shaper: &dyn ShapingEngine,
    ) -> Result<(GlyphRun, GlyphRun), LayoutError> {
        debug_assert!(at >= run_range.start && at <= run_range.end);
        let mut left = self.empty_like();
        let mut right = self.empty_like();

        for group in self.cluster_groups(run_range.end) {
            if group.end <= at {
                left.push_group(self, group, 0);
            } else if group.start >= at {
                right.push_group(self, group, 0);
            } else {
                // The boundary lands inside this cluster. Re-shape each side
                // of the constituent code points as standalone glyphs.
                let (lg, lp) = shape_scaled(
                    shaper,
                    self.font,
                    self.font_size,
                    &text[group.start..at],
                    group.start,
                )?;
                left.glyphs.extend(lg);
                left.positions.extend(lp);
                let (rg, rp) = shape_scaled(
                    shaper,
                    self.font,
                    self.font_size,
                    &text[at..group.end],
                    at,
                )?;
                right.glyphs.extend(rg);
                right.positions.extend(rp);
            }
        }

        Ok((left, right))
    }

    /// Rebases every cluster by `delta` (used when slicing rebases run
    /// ranges to a new origin).
    pub fn shift_clusters(&mut self, delta: isize) {
        for glyph in &mut self.glyphs {
            glyph.cluster = (glyph.cluster as isize + delta) as usize;
        }
    }

    fn empty_like(&self) -> GlyphRun {
        GlyphRun {
            font: self.font,
            font_size: self.font_size,
            glyphs: Vec::new(),
            positions: Vec::new(),
            ascent: self.ascent,
            descent: self.descent,
            line_height: self.line_height,
        }
    }

    fn push_group(&mut self, source: &GlyphRun, group: ClusterGroup, cluster_delta: isize) {
        for i in group.glyph_start..group.glyph_end {
            let mut glyph = source.glyphs[i].clone();
            glyph.cluster = (glyph.cluster as isize + cluster_delta) as usize;
            self.glyphs.push(glyph);
            self.positions.push(source.positions[i]);
        }
    }
}

/// Shapes `text` and scales the result to `font_size`, rebasing clusters by
/// `cluster_base`. Shared by glyph resolution, ligature re-shaping, and
/// hyphen/ellipsis insertion.
pub fn shape_scaled(
    shaper: &dyn ShapingEngine,
    font: FontId,
    font_size: f32,
    text: &str,
    cluster_base: usize,
) -> Result<(Vec<Glyph>, Vec<GlyphPosition>), LayoutError> {
    let metrics = shaper.metrics(font)?;
    let scale = metrics.scale(font_size);
    let shaped = shaper.shape(text, font)?;

    let glyphs = shaped
        .glyphs
        .into_iter()
        .map(|g| Glyph {
            id: g.id,
            cluster: cluster_base + g.cluster as usize,
            code_points: g.code_points,
            is_ligature: g.is_ligature,
            is_mark: g.is_mark,
        })
        .collect();
    let positions = shaped
        .positions
        .into_iter()
        .map(|p| GlyphPosition {
            x_advance: p.x_advance as f32 * scale,
            y_advance: p.y_advance as f32 * scale,
            x_offset: p.x_offset as f32 * scale,
            y_offset: p.y_offset as f32 * scale,
        })
        .collect();

    Ok((glyphs, positions))
}

/// Measures the advance a single character would have in the given font and
/// size, e.g. the hyphen re-inserted at a chosen hyphenation break.
pub fn char_advance(
    shaper: &dyn ShapingEngine,
    font: FontId,
    font_size: f32,
    ch: char,
) -> Result<f32, LayoutError> {
    let mut buf = [0u8; 4];
    let (_, positions) = shape_scaled(shaper, font, font_size, ch.encode_utf8(&mut buf), 0)?;
    Ok(positions.iter().map(|p| p.x_advance).sum())
}
