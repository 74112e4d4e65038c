use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TextAlign {
    #[default]
    Left,
    Right,
    Center,
    Justify,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    LineThrough,
    UnderlineLineThrough,
}

impl TextDecoration {
    pub fn has_underline(&self) -> bool {
        matches!(
            self,
            TextDecoration::Underline | TextDecoration::UnderlineLineThrough
        )
    }

    pub fn has_line_through(&self) -> bool {
        matches!(
            self,
            TextDecoration::LineThrough | TextDecoration::UnderlineLineThrough
        )
    }
}

/// Base writing direction of a paragraph or run.
///
/// Embedding levels within a paragraph are resolved by the bidi pass; this
/// only declares the base direction the resolution starts from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    #[default]
    LeftToRight,
    RightToLeft,
}
