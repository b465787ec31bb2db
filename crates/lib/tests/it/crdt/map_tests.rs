//! Map object tests.

use quilt::{ObjType, ROOT, ScalarValue, Value};

use crate::helpers::*;

#[test]
fn test_map_put_get_delete() {
    let mut doc = doc_with_actor("aaa");
    doc.put(&ROOT, "name", "Alice").unwrap();
    doc.put(&ROOT, "age", 30).unwrap();
    doc.put(&ROOT, "bytes", vec![1u8, 2, 3]).unwrap();
    doc.put(&ROOT, "when", ScalarValue::Timestamp(1_000)).unwrap();
    doc.commit().unwrap();

    assert_eq!(doc.length(&ROOT), 4);
    assert_eq!(doc.get(&ROOT, "name").unwrap().unwrap(), "Alice");
    assert_eq!(doc.get(&ROOT, "age").unwrap().unwrap(), 30i64);
    assert_eq!(
        doc.get(&ROOT, "when").unwrap(),
        Some(Value::Scalar(ScalarValue::Timestamp(1_000)))
    );

    doc.delete(&ROOT, "age").unwrap();
    assert_eq!(doc.get(&ROOT, "age").unwrap(), None);
    assert_eq!(doc.keys(&ROOT), vec!["bytes", "name", "when"]);
    // Deleting an absent key is a no-op
    doc.delete(&ROOT, "age").unwrap();
    doc.delete(&ROOT, "never").unwrap();
    doc.commit().unwrap();

    assert_eq!(
        doc.to_json(&ROOT),
        serde_json::json!({"bytes": [1, 2, 3], "name": "Alice", "when": 1000})
    );
}

#[test]
fn test_reads_are_forgiving() {
    let mut doc = doc_with_actor("aaa");
    let list = doc.put_object(&ROOT, "list", ObjType::List).unwrap();
    let missing: quilt::ObjId = "99@616161".parse().unwrap();

    assert_eq!(doc.get(&ROOT, "absent").unwrap(), None);
    assert_eq!(doc.get(&missing, "k").unwrap(), None);
    assert!(doc.keys(&missing).is_empty());
    assert_eq!(doc.length(&missing), 0);
    assert_eq!(doc.to_json(&missing), serde_json::Value::Null);
    assert_eq!(doc.get(&list, 5usize).unwrap(), None);

    // The wrong kind of property is still an error
    let err = doc.get(&ROOT, 0usize).unwrap_err();
    assert!(err.is_validation_error());
    let err = doc.get(&list, "key").unwrap_err();
    assert!(err.is_validation_error());
}

#[test]
fn test_writes_to_missing_objects_fail() {
    let mut doc = doc_with_actor("aaa");
    let missing: quilt::ObjId = "99@616161".parse().unwrap();
    let err = doc.put(&missing, "k", 1).unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("99@616161"));
    assert_eq!(doc.pending_ops(), 0);
}

#[test]
fn test_overwrite_nested_object_with_scalar() {
    let mut doc = doc_with_actor("aaa");
    let inner = doc.put_object(&ROOT, "inner", ObjType::Map).unwrap();
    doc.put(&inner, "x", 1).unwrap();
    doc.put(&ROOT, "inner", "flat").unwrap();
    doc.commit().unwrap();

    assert_eq!(doc.get(&ROOT, "inner").unwrap().unwrap(), "flat");
    assert_eq!(doc.to_json(&ROOT), serde_json::json!({"inner": "flat"}));
}

#[test]
fn test_rejects_non_finite_floats() {
    let mut doc = doc_with_actor("aaa");
    let err = doc.put(&ROOT, "f", f64::INFINITY).unwrap_err();
    assert!(err.is_validation_error());
    doc.put(&ROOT, "f", 1.5).unwrap();
    assert_eq!(doc.to_json(&ROOT), serde_json::json!({"f": 1.5}));
}
