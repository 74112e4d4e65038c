use crate::LayoutError;
use crate::attributed::{AttributedString, Attributes, Fragment};
use crate::engine::LayoutEngine;
use crate::shape::{FontMetrics, RawPosition, ShapedGlyph, ShapedGlyphs, ShapingEngine};
use crate::solver::{GeometrySolver, MeasureMode, MeasureText};
use crate::tree::{Node, NodeStyle, PageSpec};
use quire_types::{Edges, FontId, Point, Rect, Size};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Deterministic shaping engine: every code point is one glyph of a fixed
/// design-unit advance, with an optional ligature table and an optional set
/// of uncovered code points for substitution tests.
#[derive(Debug, Clone)]
pub struct FixedFont {
    pub advance: i32,
    pub upem: u16,
    pub ascent: i16,
    pub descent: i16,
    pub line_gap: i16,
    pub ligatures: HashMap<String, u32>,
    pub missing: HashSet<char>,
}

impl Default for FixedFont {
    fn default() -> Self {
        Self {
            advance: 500,
            upem: 1000,
            ascent: 800,
            descent: -200,
            line_gap: 0,
            ligatures: HashMap::new(),
            missing: HashSet::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct FixedShaper {
    fonts: HashMap<FontId, FixedFont>,
}

impl FixedShaper {
    pub fn new() -> Self {
        let mut fonts = HashMap::new();
        fonts.insert(FontId(0), FixedFont::default());
        Self { fonts }
    }

    pub fn with_font(mut self, id: FontId, font: FixedFont) -> Self {
        self.fonts.insert(id, font);
        self
    }

    fn font(&self, id: FontId) -> Result<&FixedFont, LayoutError> {
        self.fonts.get(&id).ok_or(LayoutError::UnknownFont(id))
    }
}

impl ShapingEngine for FixedShaper {
    fn shape(&self, text: &str, font: FontId) -> Result<ShapedGlyphs, LayoutError> {
        let font = self.font(font)?;
        let mut out = ShapedGlyphs::default();
        let mut i = 0;
        while i < text.len() {
            let rest = &text[i..];
            let ligature = font
                .ligatures
                .iter()
                .find(|(seq, _)| rest.starts_with(seq.as_str()));
            if let Some((seq, &id)) = ligature {
                out.glyphs.push(ShapedGlyph {
                    id,
                    cluster: i as u32,
                    code_points: seq.chars().collect(),
                    is_ligature: true,
                    is_mark: false,
                });
                out.positions.push(RawPosition {
                    x_advance: font.advance,
                    ..Default::default()
                });
                i += seq.len();
                continue;
            }
            let ch = rest.chars().next().unwrap();
            out.glyphs.push(ShapedGlyph {
                id: ch as u32,
                cluster: i as u32,
                code_points: vec![ch],
                is_ligature: false,
                is_mark: false,
            });
            out.positions.push(RawPosition {
                x_advance: font.advance,
                ..Default::default()
            });
            i += ch.len_utf8();
        }
        Ok(out)
    }

    fn has_glyph(&self, font: FontId, code_point: char) -> Result<bool, LayoutError> {
        Ok(!self.font(font)?.missing.contains(&code_point))
    }

    fn metrics(&self, font: FontId) -> Result<FontMetrics, LayoutError> {
        let font = self.font(font)?;
        Ok(FontMetrics {
            units_per_em: font.upem,
            ascent: font.ascent,
            descent: font.descent,
            line_gap: font.line_gap,
        })
    }
}

/// Default test attributes: font 0 at size 10, so every glyph advances by
/// 5.0 and the natural line height is 10.0.
pub fn attrs() -> Attributes {
    Attributes {
        font: Some(FontId(0)),
        font_size: Some(10.0),
        ..Default::default()
    }
}

pub fn plain(text: &str) -> AttributedString {
    AttributedString::from_fragments([Fragment::new(text, attrs())])
}

pub fn shaper() -> Arc<FixedShaper> {
    Arc::new(FixedShaper::new())
}

pub fn engine() -> LayoutEngine {
    LayoutEngine::new(shaper())
}

pub fn prepared(text: &str) -> AttributedString {
    engine().prepare(&plain(text)).unwrap()
}

pub fn page(width: f32, height: f32) -> Node {
    Node::page(PageSpec {
        size: Size::new(width, height),
        margin: Edges::all(0.0),
        ..Default::default()
    })
}

pub fn text_node(text: &str) -> Node {
    Node::text(plain(text), NodeStyle::default())
}

/// Minimal stand-in for the geometry collaborator: stacks children
/// vertically, sizes text leaves via the measure callback. Keeps pagination
/// tests independent of any real solver.
#[derive(Debug, Default)]
pub struct ColumnSolver;

impl ColumnSolver {
    fn layout_node(
        &self,
        node: &mut Node,
        origin: Point,
        available_width: f32,
        measure: &mut dyn MeasureText,
    ) -> Result<f32, LayoutError> {
        let margin = node.style.margin;
        let width = node
            .style
            .width
            .unwrap_or(available_width - margin.horizontal());
        let x = origin.x + margin.left;
        let y = origin.y + margin.top;

        let content_height = if node.is_text() {
            measure
                .measure(node, MeasureMode::AtMost(width), MeasureMode::Undefined)?
                .height
        } else {
            let mut cursor = 0.0f32;
            for child in &mut node.children {
                let child_height =
                    self.layout_node(child, Point::new(x, y + cursor), width, measure)?;
                cursor += child_height;
            }
            cursor
        };

        let height = node.style.height.unwrap_or(content_height);
        node.frame = Rect::new(x, y, width, height);
        Ok(height + margin.vertical())
    }
}

impl GeometrySolver for ColumnSolver {
    fn solve(
        &mut self,
        root: &mut Node,
        origin: Point,
        available: Size,
        measure: &mut dyn MeasureText,
    ) -> Result<(), LayoutError> {
        self.layout_node(root, origin, available.width, measure)?;
        Ok(())
    }
}
