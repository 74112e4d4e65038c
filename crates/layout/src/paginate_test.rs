#![cfg(test)]

use crate::paginate::text_split_index;
use crate::test_utils::{ColumnSolver, engine, page, plain, text_node};
use crate::tree::{Document, DynamicContent, Node, NodeStyle};
use std::sync::Arc;

fn paginate(pages: Vec<Node>) -> Vec<Node> {
    let mut solver = ColumnSolver;
    engine()
        .paginate(Document::new(pages), &mut solver)
        .unwrap()
}

fn find_text<'a>(node: &'a Node, needle: &str) -> Option<&'a Node> {
    if let Some(content) = &node.content
        && content.text().contains(needle)
    {
        return Some(node);
    }
    node.children.iter().find_map(|c| find_text(c, needle))
}

#[test]
fn split_index_matches_the_worked_example() {
    // Five lines, room for exactly three, orphans 2 / widows 2: the break
    // lands at lines - widows = 3.
    assert_eq!(text_split_index(5, 3, 2, 2), 3);
}

#[test]
fn split_index_honors_widows_and_orphans() {
    // Breaking after line 3 of 4 would leave a lone widow: pull back.
    assert_eq!(text_split_index(4, 3, 2, 2), 2);
    // Fewer fitting lines than orphans: the paragraph moves whole.
    assert_eq!(text_split_index(5, 1, 2, 2), 0);
    // A paragraph shorter than the orphan threshold moves whole.
    assert_eq!(text_split_index(1, 1, 2, 2), 0);
    // No room at all.
    assert_eq!(text_split_index(5, 0, 2, 2), 0);
    // Everything fits.
    assert_eq!(text_split_index(3, 3, 2, 2), 3);
}

#[test]
fn five_line_paragraph_splits_three_two() {
    // Page content height 30 = three lines of 10.
    let source = page(100.0, 30.0).with_children(vec![text_node("L1\nL2\nL3\nL4\nL5")]);
    let pages = paginate(vec![source]);

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].children[0].lines.len(), 3);
    assert_eq!(pages[1].children[0].lines.len(), 2);
    assert!(find_text(&pages[0], "L3").is_some());
    assert!(find_text(&pages[1], "L4").is_some());
}

#[test]
fn widow_control_pulls_the_break_back() {
    // Four lines, room for three: breaking 3/1 would leave a widow, so the
    // split is 2/2.
    let source = page(100.0, 30.0).with_children(vec![text_node("L1\nL2\nL3\nL4")]);
    let pages = paginate(vec![source]);

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].children[0].lines.len(), 2);
    assert_eq!(pages[1].children[0].lines.len(), 2);
}

#[test]
fn orphan_control_pushes_the_paragraph_whole() {
    // After the two-line opener, only one line of the second paragraph
    // fits; one is fewer than the orphan minimum, so it moves whole.
    let source = page(100.0, 30.0).with_children(vec![
        text_node("B1\nB2"),
        text_node("O1\nO2\nO3"),
    ]);
    let pages = paginate(vec![source]);

    assert_eq!(pages.len(), 2);
    assert!(find_text(&pages[0], "B2").is_some());
    assert!(find_text(&pages[0], "O1").is_none());
    assert!(find_text(&pages[1], "O1").is_some());
    assert!(find_text(&pages[1], "O3").is_some());
    // The pushed paragraph starts at the top of the next page.
    let moved = &pages[1].children[0];
    assert!((moved.frame.y - 0.0).abs() < 1e-3);
}

#[test]
fn fixed_nodes_replicate_onto_every_fragment() {
    let mut header = text_node("HEADER");
    header.style.fixed = true;

    let source =
        page(100.0, 30.0).with_children(vec![header, text_node("L1\nL2\nL3\nL4")]);
    let pages = paginate(vec![source]);

    assert_eq!(pages.len(), 2);
    for page in &pages {
        assert!(
            find_text(page, "HEADER").is_some(),
            "header missing from a fragment"
        );
    }
    assert!(find_text(&pages[1], "L4").is_some());
}

#[test]
fn fitting_content_with_a_fixed_header_stays_on_one_page() {
    let mut header = text_node("HEADER");
    header.style.fixed = true;

    let source = page(100.0, 30.0).with_children(vec![header, text_node("L1\nL2")]);
    let pages = paginate(vec![source]);

    // The replicated header alone must not spawn a continuation page.
    assert_eq!(pages.len(), 1);
}

#[test]
fn zero_height_page_overflows_in_place() {
    let source = page(100.0, 0.0).with_children(vec![text_node("L1\nL2")]);
    let pages = paginate(vec![source]);

    assert_eq!(pages.len(), 1);
    assert!(find_text(&pages[0], "L1").is_some());
    assert!(find_text(&pages[0], "L2").is_some());
}

#[test]
fn explicit_break_starts_a_new_page() {
    let mut second = text_node("SECOND");
    second.style.break_before = true;

    let source = page(100.0, 100.0).with_children(vec![text_node("FIRST"), second]);
    let pages = paginate(vec![source]);

    assert_eq!(pages.len(), 2);
    assert!(find_text(&pages[0], "FIRST").is_some());
    assert!(find_text(&pages[0], "SECOND").is_none());
    assert!(find_text(&pages[1], "SECOND").is_some());
}

#[test]
fn split_conserves_total_content_height() {
    let source = page(100.0, 30.0).with_children(vec![text_node("L1\nL2\nL3\nL4\nL5")]);
    let pages = paginate(vec![source]);

    let total: f32 = pages
        .iter()
        .map(|p| p.children.iter().map(|c| c.frame.height).sum::<f32>())
        .sum();
    // Five lines of 10 regardless of how they were partitioned.
    assert!((total - 50.0).abs() < 1e-3, "got {total}");

    let lines: usize = pages
        .iter()
        .map(|p| p.children.iter().map(|c| c.lines.len()).sum::<usize>())
        .sum();
    assert_eq!(lines, 5);
}

#[test]
fn dynamic_nodes_see_final_page_numbers() {
    let make_footer = || {
        let mut footer = Node::dynamic(
            NodeStyle::default(),
            DynamicContent(Arc::new(|ctx| {
                vec![Node::text(
                    plain(&format!("Page {} of {}", ctx.page_number, ctx.total_pages)),
                    NodeStyle::default(),
                )]
            })),
        );
        footer.style.fixed = true;
        footer
    };

    let source = page(100.0, 30.0)
        .with_children(vec![make_footer(), text_node("L1\nL2\nL3\nL4")]);
    let pages = paginate(vec![source]);

    assert_eq!(pages.len(), 2);
    assert!(find_text(&pages[0], "Page 1 of 2").is_some());
    assert!(find_text(&pages[1], "Page 2 of 2").is_some());
    // The dynamic content was typeset against the finalized context.
    let footer_text = find_text(&pages[1], "Page 2 of 2").unwrap();
    assert!(!footer_text.lines.is_empty());
}

#[test]
fn oversized_unbreakable_node_overflows_without_error() {
    let mut tall = Node::container(NodeStyle {
        height: Some(80.0),
        wrap: false,
        ..Default::default()
    });
    tall.children.push(text_node("TALL"));

    let source = page(100.0, 30.0).with_children(vec![tall]);
    let pages = paginate(vec![source]);

    // Content is never dropped: the node overflows its page
    // deterministically.
    assert_eq!(pages.len(), 1);
    assert!(find_text(&pages[0], "TALL").is_some());
}

#[test]
fn whole_node_moves_when_it_starts_past_the_page_edge() {
    let first = Node::container(NodeStyle {
        height: Some(30.0),
        ..Default::default()
    });
    let second = Node::container(NodeStyle {
        height: Some(10.0),
        ..Default::default()
    });
    let source = page(100.0, 30.0).with_children(vec![first, second]);
    let pages = paginate(vec![source]);

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].children.len(), 1);
    assert_eq!(pages[1].children.len(), 1);
    assert!((pages[1].children[0].frame.height - 10.0).abs() < 1e-3);
}

#[test]
fn min_presence_ahead_moves_the_leader_along() {
    // The heading itself fits, but only 5pt of its body would show on this
    // page; the lookahead rule moves heading and body together.
    let filler = Node::container(NodeStyle {
        height: Some(15.0),
        ..Default::default()
    });
    let mut heading = Node::container(NodeStyle {
        height: Some(10.0),
        ..Default::default()
    });
    heading.style.min_presence_ahead = 20.0;
    let body = Node::container(NodeStyle {
        height: Some(20.0),
        wrap: false,
        ..Default::default()
    });

    let source = page(100.0, 30.0).with_children(vec![filler, heading, body]);
    let pages = paginate(vec![source]);

    assert_eq!(pages.len(), 2, "heading must not be stranded");
    assert_eq!(pages[0].children.len(), 1, "only the filler stays");
    assert_eq!(pages[1].children.len(), 2, "heading travels with its body");
}
