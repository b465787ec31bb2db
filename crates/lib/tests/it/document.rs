//! Document lifecycle tests: commit, rollback, heads, actors and history queries.

use quilt::{ActorId, Document, ObjType, ROOT, Value};

use crate::helpers::*;

#[test]
fn test_commit_returns_hash_and_moves_heads() {
    let mut doc = doc_with_actor("aaa");
    assert!(doc.heads().is_empty());

    doc.put(&ROOT, "title", "draft").unwrap();
    assert_eq!(doc.pending_ops(), 1);
    // Pending edits are readable before commit
    assert_eq!(doc.get(&ROOT, "title").unwrap().unwrap(), "draft");
    assert!(doc.heads().is_empty());

    let hash = doc.commit().unwrap().expect("a change was committed");
    assert_eq!(doc.heads(), vec![hash]);
    assert_eq!(doc.pending_ops(), 0);
    assert_eq!(doc.get_change_by_hash(&hash).unwrap().hash(), hash);
}

#[test]
fn test_commit_message_and_time() {
    let mut doc = doc_with_actor("aaa");
    doc.put(&ROOT, "k", 1).unwrap();
    doc.commit_with(Some("initial import".to_string()), Some(1_700_000_000_000))
        .unwrap();

    let change = doc.get_last_local_change().unwrap();
    assert_eq!(change.message(), Some("initial import"));
    assert_eq!(change.time(), 1_700_000_000_000);
    assert_eq!(change.actor(), &ActorId::from(&b"aaa"[..]));
}

#[test]
fn test_rollback_discards_everything_pending() {
    let mut doc = doc_with_actor("aaa");
    doc.put(&ROOT, "a", 1).unwrap();
    doc.commit().unwrap();
    let heads = doc.heads();

    doc.put(&ROOT, "a", 2).unwrap();
    doc.put(&ROOT, "b", 3).unwrap();
    doc.delete(&ROOT, "a").unwrap();
    assert_eq!(doc.rollback().unwrap(), 3);

    assert_eq!(doc.heads(), heads);
    assert_eq!(doc.keys(&ROOT), vec!["a".to_string()]);
    assert_eq!(doc.get(&ROOT, "a").unwrap().unwrap(), 1i64);
    assert_eq!(doc.rollback().unwrap(), 0);
}

#[test]
fn test_sequence_numbers_per_actor() {
    let mut doc = doc_with_actor("aaa");
    for i in 0..3 {
        doc.put(&ROOT, "n", i).unwrap();
        doc.commit().unwrap();
    }
    assert_eq!(doc.get_last_local_change().unwrap().seq(), 3);

    doc.set_actor(ActorId::from(&b"bbb"[..])).unwrap();
    assert!(doc.get_last_local_change().is_none());
    doc.put(&ROOT, "n", 10).unwrap();
    doc.commit().unwrap();
    assert_eq!(doc.get_last_local_change().unwrap().seq(), 1);
    assert_eq!(doc.change_count(), 4);
}

#[test]
fn test_get_changes_since_heads() {
    let mut doc = doc_with_actor("aaa");
    doc.put(&ROOT, "a", 1).unwrap();
    doc.commit().unwrap();
    let first = doc.heads();
    doc.put(&ROOT, "b", 2).unwrap();
    doc.commit().unwrap();
    doc.put(&ROOT, "c", 3).unwrap();
    doc.commit().unwrap();

    assert_eq!(doc.get_changes(&[]).len(), 3);
    let since = doc.get_changes(&first);
    assert_eq!(since.len(), 2);
    assert_eq!(since[0].seq(), 2);
    assert_eq!(since[1].seq(), 3);
    assert!(doc.get_changes(&doc.heads()).is_empty());
}

#[test]
fn test_nested_objects_and_json() {
    let mut doc = doc_with_actor("aaa");
    let config = doc.put_object(&ROOT, "config", ObjType::Map).unwrap();
    doc.put(&config, "retries", 3).unwrap();
    doc.put(&config, "verbose", true).unwrap();
    let tags = doc.put_object(&config, "tags", ObjType::List).unwrap();
    doc.insert(&tags, 0, "a").unwrap();
    doc.insert(&tags, 1, "b").unwrap();
    doc.commit().unwrap();

    assert_eq!(doc.object_type(&config), Some(ObjType::Map));
    assert_eq!(doc.keys(&config), vec!["retries", "tags", "verbose"]);
    assert_eq!(
        doc.to_json(&ROOT),
        serde_json::json!({"config": {"retries": 3, "tags": ["a", "b"], "verbose": true}})
    );
    assert_eq!(
        doc.get(&ROOT, "config").unwrap(),
        Some(Value::Object(ObjType::Map, config))
    );
}

#[test]
fn test_historical_view() {
    let (mut doc, list) = doc_with_list("aaa", &["a", "b"]);
    let v1 = doc.heads();
    doc.delete(&list, 0usize).unwrap();
    doc.insert(&list, 1, "c").unwrap();
    doc.commit().unwrap();

    let view = doc.at(&v1).unwrap();
    assert_eq!(view.length(&list), 2);
    assert_eq!(view.to_json(&ROOT), serde_json::json!({"list": ["a", "b"]}));
    assert_eq!(doc.to_json(&ROOT), serde_json::json!({"list": ["b", "c"]}));

    let empty = doc.at(&[]).unwrap();
    assert_eq!(empty.to_json(&ROOT), serde_json::json!({}));
}

#[test]
fn test_default_document_has_random_actor() {
    let a = Document::new();
    let b = Document::default();
    assert_ne!(a.get_actor(), b.get_actor());
    assert_eq!(a.get_actor().as_bytes().len(), 16);
}
