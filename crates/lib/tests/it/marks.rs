//! Rich-text mark tests.

use quilt::{ExpandMark, Mark, ScalarValue};

use crate::helpers::*;

fn bold(start: usize, end: usize) -> Mark {
    Mark {
        name: "bold".to_string(),
        value: ScalarValue::from(true),
        start,
        end,
    }
}

#[test]
fn test_expand_after_grows_at_end() {
    let (mut doc, text) = doc_with_text("aaa", "hello world");
    doc.mark(&text, 2, 5, "bold", true, ExpandMark::After).unwrap();
    doc.splice_text(&text, 5, 0, "X").unwrap();
    assert_eq!(doc.marks(&text), vec![bold(2, 6)]);
}

#[test]
fn test_expand_none_keeps_range() {
    let (mut doc, text) = doc_with_text("aaa", "hello world");
    doc.mark(&text, 2, 5, "bold", true, ExpandMark::None).unwrap();
    doc.splice_text(&text, 5, 0, "X").unwrap();
    assert_eq!(doc.marks(&text), vec![bold(2, 5)]);

    // Inserting at the start shifts the range instead of growing it
    doc.splice_text(&text, 2, 0, "Y").unwrap();
    assert_eq!(doc.marks(&text), vec![bold(3, 6)]);
}

#[test]
fn test_expand_before_grows_at_start() {
    let (mut doc, text) = doc_with_text("aaa", "hello world");
    doc.mark(&text, 2, 5, "bold", true, ExpandMark::Before).unwrap();
    doc.splice_text(&text, 2, 0, "Y").unwrap();
    assert_eq!(doc.marks(&text), vec![bold(2, 6)]);
}

#[test]
fn test_unmark_splits_range() {
    let (mut doc, text) = doc_with_text("aaa", "hello");
    doc.mark(&text, 0, 5, "bold", true, ExpandMark::None).unwrap();
    doc.unmark(&text, 1, 3, "bold", ExpandMark::None).unwrap();
    doc.commit().unwrap();
    assert_eq!(doc.marks(&text), vec![bold(0, 1), bold(3, 5)]);
}

#[test]
fn test_marks_at_position() {
    let (mut doc, text) = doc_with_text("aaa", "hello world");
    doc.mark(&text, 0, 5, "bold", true, ExpandMark::None).unwrap();
    doc.mark(&text, 3, 8, "link", "https://example.com", ExpandMark::None)
        .unwrap();

    let names = |pos| -> Vec<String> {
        doc.marks_at(&text, pos)
            .into_iter()
            .map(|m| m.name)
            .collect()
    };
    assert_eq!(names(1), vec!["bold"]);
    assert_eq!(names(4), vec!["bold", "link"]);
    assert_eq!(names(6), vec!["link"]);
    assert!(names(9).is_empty());
}

#[test]
fn test_later_mark_overrides_value() {
    let (mut doc, text) = doc_with_text("aaa", "abcdef");
    doc.mark(&text, 0, 6, "color", "red", ExpandMark::None).unwrap();
    doc.mark(&text, 2, 4, "color", "blue", ExpandMark::None).unwrap();
    let runs: Vec<(usize, usize, String)> = doc
        .marks(&text)
        .into_iter()
        .map(|m| (m.start, m.end, m.value.as_str().unwrap_or_default().to_string()))
        .collect();
    assert_eq!(
        runs,
        vec![
            (0, 2, "red".to_string()),
            (2, 4, "blue".to_string()),
            (4, 6, "red".to_string()),
        ]
    );
}

#[test]
fn test_marked_text_deleted() {
    let (mut doc, text) = doc_with_text("aaa", "hello world");
    doc.mark(&text, 6, 11, "bold", true, ExpandMark::None).unwrap();
    doc.splice_text(&text, 0, 6, "").unwrap();
    assert_eq!(doc.marks(&text), vec![bold(0, 5)]);

    doc.splice_text(&text, 0, 5, "").unwrap();
    assert!(doc.marks(&text).is_empty());
}

#[test]
fn test_concurrent_marks_merge() {
    let (mut base, text) = doc_with_text("base", "hello world");
    let (mut a, mut b) = forked_pair(&mut base);
    a.mark(&text, 0, 5, "bold", true, ExpandMark::None).unwrap();
    b.splice_text(&text, 0, 0, ">> ").unwrap();

    a.merge(&mut b).unwrap();
    b.merge(&mut a).unwrap();
    assert_converged(&a, &b);
    assert_eq!(a.marks(&text), vec![bold(3, 8)]);
    assert_eq!(b.marks(&text), a.marks(&text));
}

#[test]
fn test_historical_marks() {
    let (mut doc, text) = doc_with_text("aaa", "hello");
    let before = doc.heads();
    doc.mark(&text, 0, 2, "bold", true, ExpandMark::None).unwrap();
    doc.commit().unwrap();

    assert!(doc.at(&before).unwrap().marks(&text).is_empty());
    assert_eq!(doc.at(&doc.heads()).unwrap().marks(&text), vec![bold(0, 2)]);
}
