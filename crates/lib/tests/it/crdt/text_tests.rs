//! Text object tests.

use quilt::{ObjType, ROOT};

use crate::helpers::*;

#[test]
fn test_splice_text() {
    let (mut doc, text) = doc_with_text("aaa", "hello world");
    doc.splice_text(&text, 0, 5, "goodbye").unwrap();
    assert_eq!(doc.text(&text).unwrap(), "goodbye world");
    doc.splice_text(&text, 13, 0, "!").unwrap();
    doc.commit().unwrap();

    assert_eq!(doc.text(&text).unwrap(), "goodbye world!");
    assert_eq!(doc.length(&text), 14);
    assert_eq!(doc.to_json(&ROOT), serde_json::json!({"text": "goodbye world!"}));
}

#[test]
fn test_text_counts_characters() {
    let (mut doc, text) = doc_with_text("aaa", "añb");
    assert_eq!(doc.length(&text), 3);
    doc.splice_text(&text, 1, 1, "é").unwrap();
    assert_eq!(doc.text(&text).unwrap(), "aéb");
}

#[test]
fn test_text_rejects_non_string_content() {
    let (mut doc, text) = doc_with_text("aaa", "ab");
    let err = doc.insert(&text, 0, 5).unwrap_err();
    assert!(err.is_type_mismatch());
    let err = doc.insert_object(&text, 0, ObjType::Map).unwrap_err();
    assert!(err.is_type_mismatch());

    let list = doc.put_object(&ROOT, "list", ObjType::List).unwrap();
    let err = doc.splice_text(&list, 0, 0, "x").unwrap_err();
    assert!(err.is_type_mismatch());
    assert!(doc.text(&list).unwrap_err().is_type_mismatch());
}

#[test]
fn test_splice_text_bounds() {
    let (mut doc, text) = doc_with_text("aaa", "abc");
    let err = doc.splice_text(&text, 4, 0, "x").unwrap_err();
    assert!(err.is_validation_error());
    let err = doc.splice_text(&text, 2, 2, "").unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(doc.text(&text).unwrap(), "abc");
}
