//! Pluggable syllable segmentation.
//!
//! The engine itself has no opinion on where words hyphenate; it asks a
//! [`Hyphenator`] when turning words into breakable boxes. The default is
//! the identity (no extra break opportunities); with the `hyphenation`
//! feature a pattern-based splitter backed by hypher is available. Results
//! can be memoized per word with [`MemoHyphenator`]; the cache is safe to
//! clear at any time, a miss only costs recomputation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub trait Hyphenator: Send + Sync {
    /// Byte offsets inside `word` where a hyphenation break may occur,
    /// ascending, exclusive of 0 and `word.len()`.
    fn syllable_breaks(&self, word: &str) -> Vec<usize>;
}

/// The default splitter: words are unbreakable.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityHyphenator;

impl Hyphenator for IdentityHyphenator {
    fn syllable_breaks(&self, _word: &str) -> Vec<usize> {
        Vec::new()
    }
}

/// Best-effort per-word memoization shell around any hyphenator.
pub struct MemoHyphenator<H> {
    inner: H,
    cache: RwLock<HashMap<String, Arc<Vec<usize>>>>,
}

impl<H: Hyphenator> MemoHyphenator<H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Empties the cache without affecting correctness.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    #[cfg(test)]
    pub(crate) fn cached_words(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl<H: Hyphenator> Hyphenator for MemoHyphenator<H> {
    fn syllable_breaks(&self, word: &str) -> Vec<usize> {
        if let Ok(cache) = self.cache.read()
            && let Some(hit) = cache.get(word)
        {
            return hit.as_ref().clone();
        }
        let breaks = self.inner.syllable_breaks(word);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(word.to_string(), Arc::new(breaks.clone()));
        }
        breaks
    }
}

/// Pattern-based hyphenation via hypher's embedded TeX patterns.
#[cfg(feature = "hyphenation")]
pub struct PatternHyphenator {
    lang: hypher::Lang,
}

#[cfg(feature = "hyphenation")]
impl PatternHyphenator {
    pub fn new(lang: hypher::Lang) -> Self {
        Self { lang }
    }
}

#[cfg(feature = "hyphenation")]
impl Hyphenator for PatternHyphenator {
    fn syllable_breaks(&self, word: &str) -> Vec<usize> {
        let mut breaks = Vec::new();
        let mut offset = 0;
        for syllable in hypher::hyphenate(word, self.lang) {
            offset += syllable.len();
            if offset < word.len() {
                breaks.push(offset);
            }
        }
        breaks
    }
}
