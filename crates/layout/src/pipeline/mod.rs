//! Preprocessing pipeline.
//!
//! A fixed, order-dependent composition of annotators. Each annotator reads
//! the base string and returns only new runs; outputs are unioned over the
//! base through the flatten operation before glyph resolution. The stages:
//!
//! 1. bidi embedding-level detection
//! 2. unicode-script itemization
//! 3. hyphenation eligibility (the syllable splitter itself is consumed
//!    later, when words are resolved into breakable boxes)
//! 4. font substitution against the configured fallback stack

mod fallback;
pub mod hyphenate;
mod levels;
mod script;

pub use hyphenate::{Hyphenator, IdentityHyphenator, MemoHyphenator};

#[cfg(feature = "hyphenation")]
pub use hyphenate::PatternHyphenator;

use crate::LayoutError;
use crate::attributed::AttributedString;
use crate::shape::ShapingEngine;
use quire_types::FontId;

pub struct Preprocessor<'a> {
    pub shaper: &'a dyn ShapingEngine,
    /// Fonts tried, in order, for code points the run's own font cannot
    /// shape.
    pub fallback_fonts: &'a [FontId],
}

impl Preprocessor<'_> {
    /// Runs every annotator and returns the fully annotated string.
    pub fn preprocess(&self, string: &AttributedString) -> Result<AttributedString, LayoutError> {
        let string = string.flatten();
        let string = string.annotate(&levels::annotate(&string));
        let string = string.annotate(&script::annotate(&string));
        let string = string.annotate(&fallback::annotate(
            &string,
            self.shaper,
            self.fallback_fonts,
        )?);
        Ok(string)
    }
}
