//! Default shaping engine backed by rustybuzz and ttf-parser.

use super::{FontMetrics, RawPosition, ShapedGlyph, ShapedGlyphs, ShapingEngine};
use crate::LayoutError;
use crate::fonts::FontLibrary;
use quire_types::FontId;
use rustybuzz::{Feature, UnicodeBuffer};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use ttf_parser::Tag;

// Reuse buffer to avoid allocations in the tight loop
thread_local! {
    static SCRATCH_BUFFER: RefCell<Option<UnicodeBuffer>> = RefCell::new(Some(UnicodeBuffer::new()));
}

/// Shaping engine over a [`FontLibrary`].
///
/// Stateless apart from a per-codepoint coverage cache, so repeated calls
/// with identical inputs are equivalent to caching the first result.
pub struct HarfShaper {
    library: Arc<FontLibrary>,
    coverage: RwLock<HashMap<(FontId, char), bool>>,
}

impl HarfShaper {
    pub fn new(library: Arc<FontLibrary>) -> Self {
        Self {
            library,
            coverage: RwLock::new(HashMap::new()),
        }
    }

    pub fn library(&self) -> &Arc<FontLibrary> {
        &self.library
    }

    /// Drops the coverage cache; a miss only costs recomputation.
    pub fn clear_caches(&self) {
        if let Ok(mut cache) = self.coverage.write() {
            cache.clear();
        }
    }

    fn instance(&self, font: FontId) -> Result<Arc<crate::fonts::FontInstance>, LayoutError> {
        self.library.get(font).ok_or(LayoutError::UnknownFont(font))
    }
}

fn features() -> &'static [Feature] {
    static FEATURES: std::sync::OnceLock<Vec<Feature>> = std::sync::OnceLock::new();
    FEATURES.get_or_init(|| {
        vec![
            Feature::new(Tag::from_bytes(b"liga"), 1, ..),
            Feature::new(Tag::from_bytes(b"kern"), 1, ..),
        ]
    })
}

/// Combining-mark ranges that matter for mark flagging in the factor model.
fn is_combining_mark(ch: char) -> bool {
    matches!(u32::from(ch),
        0x0300..=0x036F
            | 0x0591..=0x05C7
            | 0x0610..=0x061A
            | 0x064B..=0x065F
            | 0x0670
            | 0x06D6..=0x06DC
            | 0x08D3..=0x08FF
            | 0x1AB0..=0x1AFF
            | 0x1DC0..=0x1DFF
            | 0x20D0..=0x20FF
            | 0xFE20..=0xFE2F)
}

impl ShapingEngine for HarfShaper {
    fn shape(&self, text: &str, font: FontId) -> Result<ShapedGlyphs, LayoutError> {
        if text.is_empty() {
            return Ok(ShapedGlyphs::default());
        }
        let instance = self.instance(font)?;
        let face = instance
            .as_face()
            .ok_or_else(|| LayoutError::Shaping(format!("{} is not a shapeable face", font)))?;

        let mut buffer =
            SCRATCH_BUFFER.with(|b| b.borrow_mut().take().unwrap_or_else(UnicodeBuffer::new));
        buffer.push_str(text);
        buffer.guess_segment_properties();

        let glyph_buffer = rustybuzz::shape(&face, features(), buffer);
        let infos = glyph_buffer.glyph_infos();
        let positions = glyph_buffer.glyph_positions();

        // Normalize to logical order: shaping right-to-left text yields
        // visually ordered glyphs with descending clusters.
        let reversed = infos.len() > 1 && infos[0].cluster > infos[infos.len() - 1].cluster;
        let order: Vec<usize> = if reversed {
            (0..infos.len()).rev().collect()
        } else {
            (0..infos.len()).collect()
        };

        let mut out = ShapedGlyphs {
            glyphs: Vec::with_capacity(infos.len()),
            positions: Vec::with_capacity(infos.len()),
        };
        for (k, &i) in order.iter().enumerate() {
            let info = &infos[i];
            let pos = &positions[i];
            let cluster = info.cluster as usize;
            // Cluster span ends where the next distinct cluster starts.
            let mut end = text.len();
            for &j in &order[k + 1..] {
                let c = infos[j].cluster as usize;
                if c != cluster {
                    end = c;
                    break;
                }
            }
            let code_points: Vec<char> = text[cluster..end].chars().collect();
            let glyphs_in_cluster = order
                .iter()
                .filter(|&&j| infos[j].cluster as usize == cluster)
                .count();
            let first_cp = code_points.first().copied().unwrap_or('\u{0}');

            out.glyphs.push(ShapedGlyph {
                id: info.glyph_id,
                cluster: info.cluster,
                is_ligature: code_points.len() > 1 && glyphs_in_cluster == 1,
                is_mark: pos.x_advance == 0 && is_combining_mark(first_cp),
                code_points,
            });
            out.positions.push(RawPosition {
                x_advance: pos.x_advance,
                y_advance: pos.y_advance,
                x_offset: pos.x_offset,
                y_offset: pos.y_offset,
            });
        }

        let recycled = glyph_buffer.clear();
        SCRATCH_BUFFER.with(|b| *b.borrow_mut() = Some(recycled));

        Ok(out)
    }

    fn has_glyph(&self, font: FontId, code_point: char) -> Result<bool, LayoutError> {
        if let Ok(cache) = self.coverage.read()
            && let Some(&hit) = cache.get(&(font, code_point))
        {
            return Ok(hit);
        }
        let instance = self.instance(font)?;
        let face = instance
            .as_metrics_face()
            .ok_or_else(|| LayoutError::Shaping(format!("{} is not a parseable face", font)))?;
        let covered = face.glyph_index(code_point).is_some();
        if let Ok(mut cache) = self.coverage.write() {
            cache.insert((font, code_point), covered);
        }
        Ok(covered)
    }

    fn metrics(&self, font: FontId) -> Result<FontMetrics, LayoutError> {
        let instance = self.instance(font)?;
        let face = instance
            .as_metrics_face()
            .ok_or_else(|| LayoutError::Shaping(format!("{} is not a parseable face", font)))?;
        Ok(FontMetrics {
            units_per_em: face.units_per_em(),
            ascent: face.ascender(),
            descent: face.descender(),
            line_gap: face.line_gap(),
        })
    }
}
