//! Attaches shaped glyph data to every run of a preprocessed string.

use super::{Glyph, GlyphPosition, GlyphRun, ShapingEngine, shape_scaled};
use crate::LayoutError;
use crate::attributed::AttributedString;
use crate::config::LayoutConfig;

/// Resolves glyphs for every run, returning a new string.
///
/// Runs must carry a font by now (the substitution pass assigns one); a run
/// without a font, or with a handle the collaborator does not recognize, is
/// a configuration error. Inline attachments get a single synthetic glyph
/// whose advance is the attachment width, so they flow through breaking and
/// justification like ordinary fixed-width content.
pub fn resolve_glyphs(
    string: &AttributedString,
    shaper: &dyn ShapingEngine,
    config: &LayoutConfig,
) -> Result<AttributedString, LayoutError> {
    let mut runs = Vec::with_capacity(string.runs().len());

    for run in string.runs() {
        let mut run = run.clone();
        let font_size = run.attrs.font_size.unwrap_or(config.default_font_size);

        if let Some(attachment) = run.attrs.attachment {
            let code_points: Vec<char> = string.text()[run.range.clone()].chars().collect();
            run.glyphs = Some(GlyphRun {
                font: run.attrs.font.unwrap_or(quire_types::FontId(u32::MAX)),
                font_size,
                glyphs: vec![Glyph {
                    id: 0,
                    cluster: run.range.start,
                    code_points,
                    is_ligature: false,
                    is_mark: false,
                }],
                positions: vec![GlyphPosition {
                    x_advance: attachment.width,
                    ..Default::default()
                }],
                ascent: attachment.height,
                descent: 0.0,
                line_height: attachment.height,
            });
            runs.push(run);
            continue;
        }

        let font = run
            .attrs
            .font
            .ok_or_else(|| LayoutError::MissingFont(run.range.start))?;
        let metrics = shaper.metrics(font)?;
        let (glyphs, mut positions) = shape_scaled(
            shaper,
            font,
            font_size,
            &string.text()[run.range.clone()],
            run.range.start,
        )?;

        // Letter spacing widens every cluster-final advance except the last
        // of the run; line assembly strips it again at line edges.
        if let Some(spacing) = run.attrs.letter_spacing
            && spacing != 0.0
            && !positions.is_empty()
        {
            let last = positions.len() - 1;
            for pos in &mut positions[..last] {
                pos.x_advance += spacing;
            }
        }

        let natural = metrics.line_height_for(font_size);
        let line_height = run.attrs.line_height.unwrap_or(if natural > 0.0 {
            natural
        } else {
            font_size * config.default_line_height_factor
        });

        run.glyphs = Some(GlyphRun {
            font,
            font_size,
            glyphs,
            positions,
            ascent: metrics.ascent_for(font_size),
            descent: metrics.descent_for(font_size),
            line_height,
        });
        runs.push(run);
    }

    Ok(string.with_runs(runs))
}
