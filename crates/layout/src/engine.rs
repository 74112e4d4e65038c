//! High-level entry points tying the pipeline together.

use crate::LayoutError;
use crate::attributed::AttributedString;
use crate::config::LayoutConfig;
use crate::paginate::Paginator;
use crate::pipeline::{Hyphenator, IdentityHyphenator, Preprocessor};
use crate::shape::{ShapingEngine, resolve_glyphs};
use crate::solver::GeometrySolver;
use crate::tree::{Document, Node};
use crate::typeset::{Container, Line, Typesetter};
use quire_types::FontId;
use std::sync::Arc;

/// The layout engine: a shaping collaborator, a hyphenator, a fallback
/// font stack, and the tuning knobs. Logically single-threaded; every
/// public operation is synchronous and total over well-formed input.
pub struct LayoutEngine {
    shaper: Arc<dyn ShapingEngine>,
    hyphenator: Arc<dyn Hyphenator>,
    fallback_fonts: Vec<FontId>,
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(shaper: Arc<dyn ShapingEngine>) -> Self {
        Self {
            shaper,
            hyphenator: Arc::new(IdentityHyphenator),
            fallback_fonts: Vec::new(),
            config: LayoutConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_hyphenator(mut self, hyphenator: Arc<dyn Hyphenator>) -> Self {
        self.hyphenator = hyphenator;
        self
    }

    pub fn with_fallback_fonts(mut self, fonts: Vec<FontId>) -> Self {
        self.fallback_fonts = fonts;
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn shaper(&self) -> &Arc<dyn ShapingEngine> {
        &self.shaper
    }

    /// Runs preprocessing (bidi levels, script itemization, font
    /// substitution) and glyph resolution over a source string.
    pub fn prepare(&self, string: &AttributedString) -> Result<AttributedString, LayoutError> {
        let preprocessor = Preprocessor {
            shaper: self.shaper.as_ref(),
            fallback_fonts: &self.fallback_fonts,
        };
        let annotated = preprocessor.preprocess(string)?;
        resolve_glyphs(&annotated, self.shaper.as_ref(), &self.config)
    }

    /// Typesets a text block into a container, preparing it first if the
    /// caller passed unshaped content.
    pub fn typeset(
        &self,
        text: &AttributedString,
        container: &Container,
    ) -> Result<Vec<Line>, LayoutError> {
        let prepared;
        let text = if text.runs().iter().any(|r| r.glyphs.is_none()) {
            prepared = self.prepare(text)?;
            &prepared
        } else {
            text
        };
        let typesetter = Typesetter {
            shaper: self.shaper.as_ref(),
            hyphenator: self.hyphenator.as_ref(),
            config: &self.config,
        };
        typesetter.typeset_block(text, container)
    }

    /// Paginates a document against a geometry solver, returning one node
    /// per final page.
    pub fn paginate(
        &self,
        document: Document,
        solver: &mut dyn GeometrySolver,
    ) -> Result<Vec<Node>, LayoutError> {
        let paginator = Paginator {
            shaper: self.shaper.as_ref(),
            hyphenator: self.hyphenator.as_ref(),
            fallback_fonts: &self.fallback_fonts,
            config: &self.config,
        };
        paginator.paginate(document, solver)
    }
}
