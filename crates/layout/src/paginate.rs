//! Pagination: recursive splitting of the box tree across page boundaries.
//!
//! Each source page is laid out, split at the deepest viable boundary, and
//! the remainder becomes the next page; both fragments re-run geometry
//! resolution and re-typesetting because a split container exposes strictly
//! less height than the original. Fixed nodes replicate onto every
//! fragment; dynamic nodes re-evaluate once per finalized page.

use crate::LayoutError;
use crate::config::LayoutConfig;
use crate::pipeline::{Hyphenator, Preprocessor};
use crate::shape::{ShapingEngine, resolve_glyphs};
use crate::solver::{GeometrySolver, MeasureMode, MeasureText};
use crate::tree::{Document, Node, PageContext};
use crate::typeset::{Container, Typesetter};
use quire_types::{FontId, Point, Size};

const EPSILON: f32 = 0.01;

pub struct Paginator<'a> {
    pub shaper: &'a dyn ShapingEngine,
    pub hyphenator: &'a dyn Hyphenator,
    pub fallback_fonts: &'a [FontId],
    pub config: &'a LayoutConfig,
}

struct TypesetMeasure<'a, 'b> {
    typesetter: &'b Typesetter<'a>,
}

impl MeasureText for TypesetMeasure<'_, '_> {
    fn measure(
        &mut self,
        node: &Node,
        width: MeasureMode,
        _height: MeasureMode,
    ) -> Result<Size, LayoutError> {
        match &node.content {
            Some(content) => self.typesetter.measure(content, width.available()),
            None => Ok(Size::zero()),
        }
    }
}

impl Paginator<'_> {
    /// Splits every source page into as many final pages as its content
    /// needs, then resolves dynamic nodes against the finalized page
    /// numbering.
    pub fn paginate(
        &self,
        document: Document,
        solver: &mut dyn GeometrySolver,
    ) -> Result<Vec<Node>, LayoutError> {
        let mut pages = Vec::new();

        for mut page in document.pages {
            self.prepare_content(&mut page)?;
            loop {
                self.layout_page(&mut page, solver)?;
                match self.split_page(&mut page)? {
                    Some(rest) => {
                        self.layout_page(&mut page, solver)?;
                        pages.push(page);
                        page = rest;
                    }
                    None => {
                        pages.push(page);
                        break;
                    }
                }
            }
        }

        let total_pages = pages.len();
        for (index, page) in pages.iter_mut().enumerate() {
            let context = PageContext {
                page_number: index + 1,
                total_pages,
            };
            if resolve_dynamic(page, &context) {
                self.prepare_content(page)?;
                self.layout_page(page, solver)?;
            }
        }

        Ok(pages)
    }

    fn typesetter(&self) -> Typesetter<'_> {
        Typesetter {
            shaper: self.shaper,
            hyphenator: self.hyphenator,
            config: self.config,
        }
    }

    /// Preprocesses and shapes the text content of every node that has not
    /// been resolved yet. Re-entrant: already-shaped content is left alone.
    fn prepare_content(&self, node: &mut Node) -> Result<(), LayoutError> {
        if let Some(content) = &mut node.content
            && content.runs().iter().any(|r| r.glyphs.is_none())
        {
            let preprocessor = Preprocessor {
                shaper: self.shaper,
                fallback_fonts: self.fallback_fonts,
            };
            let annotated = preprocessor.preprocess(content)?;
            *content = resolve_glyphs(&annotated, self.shaper, self.config)?;
        }
        for child in &mut node.children {
            self.prepare_content(child)?;
        }
        Ok(())
    }

    /// One full layout pass over a page: geometry resolution, then line
    /// filling for every text node.
    fn layout_page(
        &self,
        page: &mut Node,
        solver: &mut dyn GeometrySolver,
    ) -> Result<(), LayoutError> {
        let spec = page.page_spec().copied().unwrap_or_default();
        let content = spec.content_rect();
        page.style.width = Some(content.width);

        let typesetter = self.typesetter();
        let mut measure = TypesetMeasure {
            typesetter: &typesetter,
        };
        solver.solve(
            page,
            Point::new(content.x, content.y),
            content.size(),
            &mut measure,
        )?;
        self.fill_lines(page)
    }

    fn fill_lines(&self, node: &mut Node) -> Result<(), LayoutError> {
        if node.is_text()
            && let Some(content) = &node.content
        {
            let container = Container::new(node.frame);
            node.lines = self.typesetter().typeset_block(content, &container)?;
        }
        for child in &mut node.children {
            self.fill_lines(child)?;
        }
        Ok(())
    }

    /// Splits off everything that does not fit the page's content height.
    /// Returns the continuation page, or `None` when the page is final.
    fn split_page(&self, page: &mut Node) -> Result<Option<Node>, LayoutError> {
        let spec = page.page_spec().copied().unwrap_or_default();
        let content = spec.content_rect();
        if page.children.is_empty() {
            return Ok(None);
        }

        let children = std::mem::take(&mut page.children);
        let (kept, moved) = self.split_children(children, content.y, content.height)?;
        page.children = kept;

        // Replicated fixed nodes alone do not warrant a continuation page;
        // one would spawn another indefinitely.
        if no_flow_content(&moved) {
            return Ok(None);
        }
        let mut rest = page.fragment();
        rest.children = moved;
        Ok(Some(rest))
    }

    /// Walks children in document order against the available flow height
    /// and decides, per child: keep, replicate (fixed), move whole, or
    /// split in place.
    fn split_children(
        &self,
        children: Vec<Node>,
        content_top: f32,
        height: f32,
    ) -> Result<(Vec<Node>, Vec<Node>), LayoutError> {
        if height <= EPSILON {
            log::warn!(
                "flow container with no usable height ({height:.2}); content overflows in place"
            );
            return Ok((children, Vec::new()));
        }

        let limit = content_top + height;
        let mut kept: Vec<Node> = Vec::new();
        let mut moved: Vec<Node> = Vec::new();

        let mut queue = children.into_iter();
        while let Some(mut child) = queue.next() {
            if child.style.fixed {
                moved.push(child.clone());
                kept.push(child);
                continue;
            }

            let top = child.frame.y;
            let bottom = child.frame.y + child.frame.height;
            let overflows = bottom > limit + EPSILON;
            let starts_outside = top >= limit - EPSILON;

            // Explicit break directive, or a child better served by the
            // lookahead rule, takes the rest of the flow with it.
            let rest: Vec<Node> = if child.style.break_before
                || (!overflows && self.wants_presence_break(&child, queue.as_slice(), limit))
            {
                child.style.break_before = false;
                let mut rest = vec![child];
                rest.extend(queue.by_ref());
                rest
            } else if starts_outside {
                moved.push(child);
                continue;
            } else if overflows && child.style.wrap {
                match self.split_node(child, content_top, height)? {
                    (Some(current), Some(next)) => {
                        kept.push(current);
                        let mut rest = vec![next];
                        rest.extend(queue.by_ref());
                        rest
                    }
                    (Some(current), None) => {
                        kept.push(current);
                        continue;
                    }
                    (None, Some(whole)) => {
                        if no_flow_content(&kept) {
                            // Nothing precedes it; moving would recur
                            // forever. Keep it and overflow.
                            log::warn!(
                                "node {} does not fit the page content height of {:.2} and cannot move; overflowing",
                                whole.id,
                                height
                            );
                            kept.push(whole);
                            continue;
                        }
                        let mut rest = vec![whole];
                        rest.extend(queue.by_ref());
                        rest
                    }
                    (None, None) => continue,
                }
            } else if overflows {
                // Cannot wrap.
                if no_flow_content(&kept) {
                    log::warn!(
                        "node {} has a height of {:.2} which exceeds the page content height of {:.2}; overflowing",
                        child.id,
                        child.frame.height,
                        height
                    );
                    kept.push(child);
                    continue;
                }
                let mut rest = vec![child];
                rest.extend(queue.by_ref());
                rest
            } else {
                kept.push(child);
                continue;
            };

            for node in rest {
                if node.style.fixed {
                    kept.push(node.clone());
                }
                moved.push(node);
            }
            break;
        }

        Ok((kept, moved))
    }

    /// Whether the content visible after `child` on this page falls short
    /// of the child's minimum-presence-ahead requirement.
    fn wants_presence_break(&self, child: &Node, following: &[Node], limit: f32) -> bool {
        let min_presence = child.style.min_presence_ahead;
        if min_presence <= 0.0 {
            return false;
        }
        let mut presence = 0.0f32;
        for sibling in following {
            if sibling.style.fixed {
                continue;
            }
            let top = sibling.frame.y;
            if top < limit {
                presence += (limit - top).min(sibling.frame.height);
            }
        }
        presence + EPSILON < min_presence
    }

    /// Splits a single overflowing node. Returns the fragment that stays
    /// and the fragment that moves; `(None, Some(_))` means the node moves
    /// whole.
    fn split_node(
        &self,
        node: Node,
        content_top: f32,
        height: f32,
    ) -> Result<(Option<Node>, Option<Node>), LayoutError> {
        if node.is_text() {
            self.split_text(node, content_top, height)
        } else {
            self.split_container(node, content_top, height)
        }
    }

    fn split_container(
        &self,
        mut node: Node,
        content_top: f32,
        height: f32,
    ) -> Result<(Option<Node>, Option<Node>), LayoutError> {
        let limit = content_top + height;
        let children = std::mem::take(&mut node.children);
        let (kept, moved) = self.split_children(children, content_top, height)?;

        if no_flow_content(&kept) {
            node.children = moved;
            return Ok((None, Some(node)));
        }

        let current_height = (limit - node.frame.y).min(node.frame.height);
        let mut current = node.fragment();
        current.frame.height = current_height;
        current.children = kept;

        if no_flow_content(&moved) {
            return Ok((Some(current), None));
        }

        let mut next = node.fragment();
        next.frame.height = node.frame.height - current_height;
        next.children = moved;
        Ok((Some(current), Some(next)))
    }

    fn split_text(
        &self,
        mut node: Node,
        content_top: f32,
        height: f32,
    ) -> Result<(Option<Node>, Option<Node>), LayoutError> {
        let limit = content_top + height;
        let lines_quantity = node.lines.len();
        let sliced = node
            .lines
            .iter()
            .position(|line| line.rect.y + line.rect.height > limit + EPSILON)
            .unwrap_or(lines_quantity);

        let orphans = node.style.orphans.unwrap_or(self.config.orphans);
        let widows = node.style.widows.unwrap_or(self.config.widows);
        let index = text_split_index(lines_quantity, sliced, orphans, widows);

        if index == 0 {
            return Ok((None, Some(node)));
        }
        if index >= lines_quantity {
            return Ok((Some(node), None));
        }

        let shaper = self.shaper;
        let content = node.content.take().unwrap_or_default();
        let lines = std::mem::take(&mut node.lines);

        let cut = lines[index].range.start;
        let kept_bottom = lines[index - 1].rect.y + lines[index - 1].rect.height;

        let mut current = node.fragment();
        current.content = Some(content.slice(0..cut, shaper)?);
        current.lines = lines[..index].to_vec();
        current.frame.height = kept_bottom - node.frame.y;

        let mut next = node.fragment();
        next.content = Some(content.slice(cut..content.len(), shaper)?);
        next.lines = lines[index..].to_vec();
        next.frame.height = node.frame.height - current.frame.height;

        Ok((Some(current), Some(next)))
    }
}

/// Whether the page has no real flow content yet; replicated fixed nodes
/// do not count, or a node that never fits would bounce between pages
/// forever.
fn no_flow_content(kept: &[Node]) -> bool {
    kept.iter().all(|n| n.style.fixed)
}

/// The orphan/widow pull-back rule for a split text node.
///
/// `sliced` is the first line index that no longer fits. The result is the
/// number of lines kept on the current page: zero means the paragraph moves
/// whole.
pub(crate) fn text_split_index(
    lines: usize,
    sliced: usize,
    orphans: usize,
    widows: usize,
) -> usize {
    if sliced == 0 || lines < orphans {
        0
    } else if sliced < orphans || lines < orphans + widows {
        0
    } else if lines == orphans + widows {
        orphans
    } else if lines - sliced < widows {
        lines - widows
    } else {
        sliced
    }
}

/// Re-evaluates dynamic nodes with final page context, discarding their
/// previous layout state. Returns whether anything changed.
fn resolve_dynamic(node: &mut Node, context: &PageContext) -> bool {
    let mut changed = false;
    if let Some(dynamic) = node.dynamic.clone() {
        node.children = (dynamic.0)(context);
        node.lines.clear();
        changed = true;
    }
    for child in &mut node.children {
        changed |= resolve_dynamic(child, context);
    }
    changed
}
