//! Navigation from the inspections help link to the out-of-service figure.
//!
//! Everything here is a pure function of the document: parsing the same
//! payload twice always yields the same value.

use std::iter;

use crate::error::AppError;
use crate::models::INSPECTIONS_ANCHOR_HREF;
use crate::traits::{Content, DocumentNode};

/// First `<a>` at or below `root` (in document order) whose `href` equals `href` exactly.
pub fn find_anchor<N: DocumentNode>(root: &N, href: &str) -> Option<N> {
    iter::successors(Some(root.clone()), N::next_in_document)
        .find(|node| node.tag() == "a" && node.attr("href") == Some(href))
}

/// Nearest element after `node` in document order with the given tag.
pub fn find_following<N: DocumentNode>(node: &N, tag: &str) -> Option<N> {
    iter::successors(node.next_in_document(), N::next_in_document).find(|n| n.tag() == tag)
}

/// All `<td>` elements inside `table`, nested tables included, in document order.
pub fn collect_cells<N: DocumentNode>(table: &N) -> Vec<N> {
    let mut cells = Vec::new();
    collect_descendants(table, "td", &mut cells);
    cells
}

fn collect_descendants<N: DocumentNode>(node: &N, tag: &str, out: &mut Vec<N>) {
    for child in node.children() {
        if let Content::Element(element) = child {
            if element.tag() == tag {
                out.push(element.clone());
            }
            collect_descendants(&element, tag, out);
        }
    }
}

/// Concatenated text of every text node below `node`.
pub fn text_content<N: DocumentNode>(node: &N) -> String {
    let mut text = String::new();
    push_text(node, &mut text);
    text
}

fn push_text<N: DocumentNode>(node: &N, out: &mut String) {
    for child in node.children() {
        match child {
            Content::Text(t) => out.push_str(&t),
            Content::Element(element) => push_text(&element, out),
        }
    }
}

/// Last child of `cell`, stripped of surrounding ASCII whitespace.
///
/// Returns `None` when the cell has no children at all, or when it ends in
/// an element carrying no text (e.g. a trailing `<br>`).
pub fn last_content_text<N: DocumentNode>(cell: &N) -> Option<String> {
    let text = match cell.children().pop()? {
        Content::Text(t) => t,
        Content::Element(element) => {
            let text = text_content(&element);
            if text.is_empty() {
                return None;
            }
            text
        }
    };
    Some(strip(&text).to_string())
}

fn strip(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_ascii_whitespace())
}

/// Extract the driver out-of-service percentage from a carrier snapshot page.
pub fn extract_driver_oos_percentage<N: DocumentNode>(root: &N) -> Result<String, AppError> {
    let anchor = find_anchor(root, INSPECTIONS_ANCHOR_HREF).ok_or_else(|| {
        AppError::StructureMismatch(format!(
            "no <a href=\"{INSPECTIONS_ANCHOR_HREF}\"> on the page"
        ))
    })?;

    let table = find_following(&anchor, "table").ok_or_else(|| {
        AppError::StructureMismatch("no <table> follows the inspections anchor".to_string())
    })?;

    let cells = collect_cells(&table);
    tracing::debug!(cells = cells.len(), "Located inspections table");

    let last_cell = cells.last().ok_or_else(|| {
        AppError::EmptyContent("the inspections table has no cells".to_string())
    })?;

    last_content_text(last_cell).ok_or_else(|| {
        AppError::EmptyContent("the last cell of the inspections table is empty".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{TestNode, el, text};

    fn anchor() -> crate::testutil::NodeSpec {
        el("a", &[("href", INSPECTIONS_ANCHOR_HREF)], vec![text("Inspections")])
    }

    fn snapshot_page(table: crate::testutil::NodeSpec) -> TestNode {
        TestNode::build(el(
            "html",
            &[],
            vec![el("body", &[], vec![el("p", &[], vec![anchor()]), table])],
        ))
    }

    #[test]
    fn extracts_last_cell_text() {
        let root = snapshot_page(el(
            "table",
            &[],
            vec![el(
                "tr",
                &[],
                vec![
                    el("td", &[], vec![text("A")]),
                    el("td", &[], vec![text(" 12.5% ")]),
                ],
            )],
        ));

        assert_eq!(extract_driver_oos_percentage(&root).unwrap(), "12.5%");
    }

    #[test]
    fn extraction_is_idempotent() {
        let root = snapshot_page(el(
            "table",
            &[],
            vec![el("tr", &[], vec![el("td", &[], vec![text("\n\t0%\n")])])],
        ));

        let first = extract_driver_oos_percentage(&root).unwrap();
        let second = extract_driver_oos_percentage(&root).unwrap();
        assert_eq!(first, "0%");
        assert_eq!(first, second);
    }

    #[test]
    fn missing_anchor_is_structure_mismatch() {
        let root = TestNode::build(el(
            "html",
            &[],
            vec![
                el("a", &[("href", "saferhelp.aspx#Inspections")], vec![]),
                el("table", &[], vec![el("td", &[], vec![text("1%")])]),
            ],
        ));

        let err = extract_driver_oos_percentage(&root).unwrap_err();
        assert!(matches!(err, AppError::StructureMismatch(_)));
    }

    #[test]
    fn anchor_without_following_table_is_structure_mismatch() {
        let root = TestNode::build(el(
            "html",
            &[],
            vec![
                el("table", &[], vec![el("td", &[], vec![text("before")])]),
                anchor(),
            ],
        ));

        let err = extract_driver_oos_percentage(&root).unwrap_err();
        assert!(matches!(err, AppError::StructureMismatch(_)));
    }

    #[test]
    fn table_without_cells_is_empty_content() {
        let root = snapshot_page(el("table", &[], vec![el("tr", &[], vec![])]));

        let err = extract_driver_oos_percentage(&root).unwrap_err();
        assert!(matches!(err, AppError::EmptyContent(_)));
    }

    #[test]
    fn empty_last_cell_is_empty_content() {
        let root = snapshot_page(el(
            "table",
            &[],
            vec![el(
                "tr",
                &[],
                vec![el("td", &[], vec![text("5%")]), el("td", &[], vec![])],
            )],
        ));

        let err = extract_driver_oos_percentage(&root).unwrap_err();
        assert!(matches!(err, AppError::EmptyContent(_)));
    }

    #[test]
    fn first_matching_anchor_wins() {
        let root = TestNode::build(el(
            "html",
            &[],
            vec![
                anchor(),
                el("table", &[], vec![el("td", &[], vec![text("first")])]),
                anchor(),
                el("table", &[], vec![el("td", &[], vec![text("second")])]),
            ],
        ));

        assert_eq!(extract_driver_oos_percentage(&root).unwrap(), "first");
    }

    #[test]
    fn cells_of_nested_tables_count() {
        let inner = el("table", &[], vec![el("td", &[], vec![text("inner")])]);
        let root = snapshot_page(el(
            "table",
            &[],
            vec![el(
                "tr",
                &[],
                vec![
                    el("td", &[], vec![text("outer")]),
                    el("td", &[], vec![inner]),
                ],
            )],
        ));

        let table = find_following(&find_anchor(&root, INSPECTIONS_ANCHOR_HREF).unwrap(), "table")
            .unwrap();
        assert_eq!(collect_cells(&table).len(), 3);
        assert_eq!(extract_driver_oos_percentage(&root).unwrap(), "inner");
    }

    #[test]
    fn element_last_child_uses_its_text() {
        let root = snapshot_page(el(
            "table",
            &[],
            vec![el(
                "td",
                &[],
                vec![text("rate: "), el("b", &[], vec![text(" 3.1% ")])],
            )],
        ));

        assert_eq!(extract_driver_oos_percentage(&root).unwrap(), "3.1%");
    }

    #[test]
    fn textless_element_last_child_is_empty_content() {
        let root = snapshot_page(el(
            "table",
            &[],
            vec![el("td", &[], vec![text("12.5%"), el("br", &[], vec![])])],
        ));

        let err = extract_driver_oos_percentage(&root).unwrap_err();
        assert!(matches!(err, AppError::EmptyContent(_)));
    }

    #[test]
    fn strip_only_trims_ascii_whitespace() {
        assert_eq!(strip(" \t\r\n7%\n "), "7%");
        assert_eq!(strip("\u{a0}7%\u{a0}"), "\u{a0}7%\u{a0}");
    }
}
