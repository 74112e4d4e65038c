//! Run-based attributed text.
//!
//! An [`AttributedString`] owns a text buffer plus an ordered, gap-free run
//! list. All transformations return new values; nothing here aliases state
//! with other pipeline stages. Offsets are byte offsets on `char`
//! boundaries throughout.

mod run;

pub use run::{Attributes, Run};

use crate::LayoutError;
use crate::shape::{ShapingEngine, shape_scaled};
use std::ops::Range;

/// A piece of text plus the attribute map to apply to it, the unit from
/// which attributed strings are assembled.
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    pub text: String,
    pub attrs: Attributes,
}

impl Fragment {
    pub fn new(text: impl Into<String>, attrs: Attributes) -> Self {
        Self {
            text: text.into(),
            attrs,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributedString {
    text: String,
    runs: Vec<Run>,
}

impl AttributedString {
    /// The empty string: zero runs, every operation defined.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a string by concatenating fragments. Adjacent fragments with
    /// identical attributes collapse into one run.
    pub fn from_fragments(fragments: impl IntoIterator<Item = Fragment>) -> Self {
        let mut out = Self::new();
        for fragment in fragments {
            out.push_fragment(&fragment);
        }
        out
    }

    /// Assembles a string from pre-built runs, enforcing the structural
    /// invariants at the boundary: runs ordered by start, gap-free, first at
    /// zero, last ending at `text.len()`, all offsets on `char` boundaries.
    pub fn from_parts(text: String, runs: Vec<Run>) -> Result<Self, LayoutError> {
        if text.is_empty() {
            if !runs.is_empty() {
                return Err(LayoutError::MalformedRuns(
                    "empty string cannot carry runs".into(),
                ));
            }
            return Ok(Self::new());
        }
        let mut cursor = 0;
        for run in &runs {
            if run.range.start != cursor {
                return Err(LayoutError::MalformedRuns(format!(
                    "run starts at {} but previous coverage ends at {}",
                    run.range.start, cursor
                )));
            }
            if run.range.end <= run.range.start {
                return Err(LayoutError::MalformedRuns(format!(
                    "empty or inverted run at {}",
                    run.range.start
                )));
            }
            if !text.is_char_boundary(run.range.start) || !text.is_char_boundary(run.range.end) {
                return Err(LayoutError::MalformedRuns(format!(
                    "run boundary inside a code point at {}..{}",
                    run.range.start, run.range.end
                )));
            }
            cursor = run.range.end;
        }
        if cursor != text.len() {
            return Err(LayoutError::MalformedRuns(format!(
                "runs cover {} of {} bytes",
                cursor,
                text.len()
            )));
        }
        Ok(Self { text, runs })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn runs_mut(&mut self) -> &mut [Run] {
        &mut self.runs
    }

    pub(crate) fn runs_mut_vec(&mut self) -> &mut Vec<Run> {
        &mut self.runs
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Total advance of all shaped runs.
    pub fn advance_width(&self) -> f32 {
        self.runs
            .iter()
            .filter_map(|r| r.glyphs.as_ref())
            .map(|g| g.advance_width())
            .sum()
    }

    /// Font and size of the first shaped run, used when inserting glyphs
    /// (hyphen, ellipsis) that have no run of their own yet.
    pub fn leading_font(&self) -> Option<(quire_types::FontId, f32)> {
        self.runs
            .iter()
            .find_map(|r| r.glyphs.as_ref().map(|g| (g.font, g.font_size)))
    }

    /// Replaces the run list wholesale. The caller vouches for coverage;
    /// used by pipeline stages that rebuild runs via [`flatten`].
    pub(crate) fn with_runs(&self, runs: Vec<Run>) -> Self {
        Self {
            text: self.text.clone(),
            runs,
        }
    }

    fn push_fragment(&mut self, fragment: &Fragment) {
        if fragment.text.is_empty() {
            return;
        }
        let start = self.text.len();
        self.text.push_str(&fragment.text);
        let run = Run::new(start..self.text.len(), fragment.attrs.clone());
        match self.runs.last_mut() {
            Some(last) if last.can_merge(&run) => last.merge(run),
            _ => self.runs.push(run),
        }
    }

    /// Returns a new string holding only content for this fragment appended.
    pub fn append(&self, fragment: &Fragment) -> Self {
        let mut out = self.clone();
        out.push_fragment(fragment);
        out
    }

    /// Concatenates two strings; the seam merges when attributes and glyph
    /// state agree, so `slice` followed by `concat` round-trips.
    pub fn concat(&self, other: &Self) -> Self {
        let mut out = self.clone();
        let offset = out.text.len();
        out.text.push_str(&other.text);
        for run in &other.runs {
            let mut run = run.clone();
            run.range = run.range.start + offset..run.range.end + offset;
            if let Some(glyphs) = &mut run.glyphs {
                glyphs.shift_clusters(offset as isize);
            }
            match out.runs.last_mut() {
                Some(last) if last.can_merge(&run) => last.merge(run),
                _ => out.runs.push(run),
            }
        }
        out
    }

    /// Restricts the string to `[range.start, range.end)`.
    ///
    /// Run boundaries inside the range are preserved; straddling runs split.
    /// A cut inside a ligature re-shapes its constituent code points through
    /// the collaborator so both sides keep valid glyph data.
    pub fn slice(
        &self,
        range: Range<usize>,
        shaper: &dyn ShapingEngine,
    ) -> Result<Self, LayoutError> {
        let start = range.start.min(self.text.len());
        let end = range.end.min(self.text.len()).max(start);
        if start == end {
            return Ok(Self::new());
        }
        if !self.text.is_char_boundary(start) || !self.text.is_char_boundary(end) {
            return Err(LayoutError::MalformedRuns(format!(
                "slice boundary inside a code point at {}..{}",
                start, end
            )));
        }

        let text = self.text[start..end].to_string();
        let mut runs = Vec::new();
        for run in &self.runs {
            if run.range.end <= start || run.range.start >= end {
                continue;
            }
            let s = run.range.start.max(start);
            let e = run.range.end.min(end);

            let glyphs = match &run.glyphs {
                None => None,
                Some(g) => {
                    let mut g = g.clone();
                    if s > run.range.start {
                        let (_, right) = g.split(&self.text, run.range.clone(), s, shaper)?;
                        g = right;
                    }
                    if e < run.range.end {
                        let (left, _) = g.split(&self.text, s..run.range.end, e, shaper)?;
                        g = left;
                    }
                    g.shift_clusters(-(start as isize));
                    Some(g)
                }
            };

            runs.push(Run {
                range: s - start..e - start,
                attrs: run.attrs.clone(),
                glyphs,
            });
        }
        Ok(Self { text, runs })
    }

    /// Strips leading and trailing whitespace by locating the first and last
    /// non-whitespace code points.
    pub fn trim(&self, shaper: &dyn ShapingEngine) -> Result<Self, LayoutError> {
        let Some(first) = self.text.find(|c: char| !c.is_whitespace()) else {
            return Ok(Self::new());
        };
        let last = self
            .text
            .rfind(|c: char| !c.is_whitespace())
            .map(|i| i + self.text[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(self.text.len());
        self.slice(first..last, shaper)
    }

    /// Inserts a single code point at `offset`, shaping it with the font of
    /// the run it lands in. Used to materialize hyphen and ellipsis glyphs.
    pub fn insert_glyph(
        &self,
        offset: usize,
        ch: char,
        shaper: &dyn ShapingEngine,
    ) -> Result<Self, LayoutError> {
        let offset = offset.min(self.text.len());
        if !self.text.is_char_boundary(offset) {
            return Err(LayoutError::MalformedRuns(format!(
                "insertion offset {} inside a code point",
                offset
            )));
        }
        let inserted = ch.len_utf8();
        let mut text = String::with_capacity(self.text.len() + inserted);
        text.push_str(&self.text[..offset]);
        text.push(ch);
        text.push_str(&self.text[offset..]);

        // The receiving run is the one containing the offset, or the last
        // run touching it when inserting at the very end.
        let target = self
            .runs
            .iter()
            .position(|r| r.range.start <= offset && offset < r.range.end)
            .or_else(|| self.runs.iter().rposition(|r| r.range.end == offset));
        let Some(target) = target else {
            // Inserting into an empty string: a bare unshaped run.
            return Self::from_parts(text, vec![Run::new(0..inserted, Attributes::default())]);
        };

        let mut runs = Vec::with_capacity(self.runs.len());
        for (i, run) in self.runs.iter().enumerate() {
            let mut run = run.clone();
            if i == target {
                run.range.end += inserted;
                if let Some(glyphs) = &mut run.glyphs {
                    let (new_glyphs, new_positions) =
                        shape_scaled(shaper, glyphs.font, glyphs.font_size, &text[offset..offset + inserted], offset)?;
                    let insert_at = glyphs
                        .glyphs
                        .iter()
                        .position(|g| g.cluster >= offset)
                        .unwrap_or(glyphs.glyphs.len());
                    for g in &mut glyphs.glyphs[insert_at..] {
                        g.cluster += inserted;
                    }
                    for (j, g) in new_glyphs.into_iter().enumerate() {
                        glyphs.glyphs.insert(insert_at + j, g);
                    }
                    for (j, p) in new_positions.into_iter().enumerate() {
                        glyphs.positions.insert(insert_at + j, p);
                    }
                }
            } else if run.range.start >= offset && i > target {
                run.range.start += inserted;
                run.range.end += inserted;
                if let Some(glyphs) = &mut run.glyphs {
                    glyphs.shift_clusters(inserted as isize);
                }
            }
            runs.push(run);
        }
        Ok(Self { text, runs })
    }

    /// Normalizes the run list: empty runs dropped, overlapping annotation
    /// leftovers resolved (later keys win), equal neighbors merged.
    /// Idempotent.
    pub fn flatten(&self) -> Self {
        let runs = run::flatten(&self.runs, &[], self.text.len());
        self.with_runs(runs)
    }

    /// Applies annotation runs over the base runs and normalizes, as the
    /// preprocessing pipeline does after each annotator.
    pub fn annotate(&self, annotations: &[Run]) -> Self {
        let runs = run::flatten(&self.runs, annotations, self.text.len());
        self.with_runs(runs)
    }

    /// Splits into paragraphs at `\n`, excluding the terminator itself.
    /// Returns each paragraph with its byte offset in `self`.
    pub fn paragraphs(
        &self,
        shaper: &dyn ShapingEngine,
    ) -> Result<Vec<(usize, AttributedString)>, LayoutError> {
        let mut out = Vec::new();
        let mut start = 0;
        for (i, ch) in self.text.char_indices() {
            if ch == '\n' {
                out.push((start, self.slice(start..i, shaper)?));
                start = i + 1;
            }
        }
        if start < self.text.len() || out.is_empty() {
            out.push((start, self.slice(start..self.text.len(), shaper)?));
        }
        Ok(out)
    }
}
