//! Save, load and change encoding tests.

use quilt::{Change, Document, ExpandMark, ObjType, ROOT, ScalarValue};

use crate::helpers::*;

/// A document exercising every object type, a counter and a mark.
fn rich_document() -> Document {
    let (mut doc, text) = doc_with_text("aaa", "hello world");
    doc.mark(&text, 0, 5, "bold", true, ExpandMark::After).unwrap();
    let list = doc.put_object(&ROOT, "list", ObjType::List).unwrap();
    doc.insert(&list, 0, 1.5).unwrap();
    doc.insert(&list, 1, vec![0u8, 255]).unwrap();
    let nested = doc.insert_object(&list, 2, ObjType::Map).unwrap();
    doc.put(&nested, "ok", true).unwrap();
    doc.put(&ROOT, "count", ScalarValue::counter(3)).unwrap();
    doc.commit_with(Some("rich".to_string()), None).unwrap();
    doc.increment(&ROOT, "count", 4).unwrap();
    doc.commit().unwrap();
    doc
}

#[test]
fn test_save_load_round_trip() {
    let mut doc = rich_document();
    let bytes = doc.save().unwrap();

    let loaded = Document::load(&bytes).unwrap();
    assert_converged(&doc, &loaded);
    assert_ne!(loaded.get_actor(), doc.get_actor());
    assert_eq!(loaded.change_count(), doc.change_count());

    let text = loaded.get(&ROOT, "text").unwrap().unwrap().obj_id().cloned().unwrap();
    assert_eq!(loaded.marks(&text), doc.marks(&text));
    assert_eq!(loaded.get(&ROOT, "count").unwrap().unwrap(), 7i64);
    assert_eq!(
        loaded.get_changes(&[])[1].message(),
        Some("rich")
    );
}

#[test]
fn test_save_is_deterministic() {
    let mut doc = rich_document();
    let first = doc.save().unwrap();
    let mut loaded = Document::load(&first).unwrap();
    assert_eq!(loaded.save().unwrap(), first);
}

#[test]
fn test_load_empty_document() {
    let mut doc = Document::new();
    let loaded = Document::load(&doc.save().unwrap()).unwrap();
    assert!(loaded.heads().is_empty());
    assert_eq!(loaded.to_json(&ROOT), serde_json::json!({}));
}

#[test]
fn test_incremental_saves_append() {
    let mut doc = doc_with_actor("aaa");
    doc.put(&ROOT, "a", 1).unwrap();
    let mut file = doc.save().unwrap();

    doc.put(&ROOT, "b", 2).unwrap();
    file.extend(doc.save_incremental().unwrap());
    doc.put(&ROOT, "c", 3).unwrap();
    doc.commit().unwrap();
    doc.put(&ROOT, "d", 4).unwrap();
    file.extend(doc.save_incremental().unwrap());

    let mut loaded = Document::new();
    assert_eq!(loaded.load_incremental(&file).unwrap(), 4);
    assert_converged(&doc, &loaded);

    // A plain load wants exactly one document chunk
    let err = Document::load(&file).unwrap_err();
    assert!(err.is_corrupt_history());
}

#[test]
fn test_save_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.quilt");

    let mut doc = rich_document();
    doc.save_to_file(&path).unwrap();
    let loaded = Document::load_from_file(&path).unwrap();
    assert_converged(&doc, &loaded);

    let err = Document::load_from_file(dir.path().join("missing.quilt")).unwrap_err();
    assert!(err.is_io_error());
}

#[test]
fn test_corrupt_input_rejected() {
    let mut doc = rich_document();
    let bytes = doc.save().unwrap();

    let mut flipped = bytes.clone();
    let last = flipped.len() - 1;
    flipped[last] ^= 0x01;
    assert!(Document::load(&flipped).unwrap_err().is_corrupt_history());

    let truncated = &bytes[..bytes.len() - 3];
    assert!(Document::load(truncated).unwrap_err().is_corrupt_history());

    let mut bad_magic = bytes.clone();
    bad_magic[0] ^= 0xff;
    assert!(Document::load(&bad_magic).unwrap_err().is_corrupt_history());

    assert!(Document::load(&[]).unwrap_err().is_corrupt_history());
    assert!(Document::load(b"not a document").unwrap_err().is_corrupt_history());
}

#[test]
fn test_change_bytes_round_trip() {
    let doc = rich_document();
    let change = doc.get_last_local_change().unwrap().clone();

    let bytes = change.to_bytes().unwrap();
    let decoded = Change::from_bytes(&bytes).unwrap();
    assert_eq!(decoded.hash(), change.hash());
    assert_eq!(decoded.deps(), change.deps());
    assert_eq!(decoded.seq(), change.seq());
    assert_eq!(decoded.start_op(), change.start_op());

    // A change chunk is not a document
    assert!(Document::load(&bytes).unwrap_err().is_corrupt_history());
    // Trailing bytes are rejected
    let mut extended = bytes.clone();
    extended.push(0);
    assert!(Change::from_bytes(&extended).is_err());
}

#[test]
fn test_load_incremental_rejects_corruption_without_changes() {
    let mut doc = doc_with_actor("aaa");
    doc.put(&ROOT, "a", 1).unwrap();
    let mut bytes = doc.save().unwrap();
    bytes[5] ^= 0x01;

    let mut target = doc_with_actor("bbb");
    let err = target.load_incremental(&bytes).unwrap_err();
    assert!(err.is_corrupt_history());
    assert_eq!(target.change_count(), 0);
}
