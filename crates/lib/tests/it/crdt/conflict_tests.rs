//! Concurrent write resolution.

use quilt::{ObjType, ROOT, Value};

use crate::helpers::*;

#[test]
fn test_concurrent_puts_highest_actor_wins() {
    let mut base = doc_with_actor("base");
    base.put(&ROOT, "seed", 0).unwrap();
    base.commit().unwrap();

    let (mut a, mut b) = forked_pair(&mut base);
    a.put(&ROOT, "x", "from aaa").unwrap();
    b.put(&ROOT, "x", "from bbb").unwrap();

    a.merge(&mut b).unwrap();
    b.merge(&mut a).unwrap();

    assert_eq!(a.get(&ROOT, "x").unwrap().unwrap(), "from bbb");
    assert_converged(&a, &b);

    let all = a.get_all(&ROOT, "x").unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0], "from aaa");
    assert_eq!(all[1], "from bbb");
}

#[test]
fn test_overwrite_resolves_conflict() {
    let mut base = doc_with_actor("base");
    base.put(&ROOT, "seed", 0).unwrap();
    base.commit().unwrap();

    let (mut a, mut b) = forked_pair(&mut base);
    a.put(&ROOT, "x", 1).unwrap();
    b.put(&ROOT, "x", 2).unwrap();
    a.merge(&mut b).unwrap();

    a.put(&ROOT, "x", 3).unwrap();
    a.commit().unwrap();
    assert_eq!(a.get_all(&ROOT, "x").unwrap(), vec![Value::from(3)]);
}

#[test]
fn test_put_survives_concurrent_delete() {
    let mut base = doc_with_actor("base");
    base.put(&ROOT, "k", "old").unwrap();
    base.commit().unwrap();

    let (mut a, mut b) = forked_pair(&mut base);
    a.delete(&ROOT, "k").unwrap();
    b.put(&ROOT, "k", "new").unwrap();

    a.merge(&mut b).unwrap();
    b.merge(&mut a).unwrap();
    assert_eq!(a.get(&ROOT, "k").unwrap().unwrap(), "new");
    assert_converged(&a, &b);
}

#[test]
fn test_concurrent_list_inserts_keep_both() {
    let (mut base, list) = doc_with_list("base", &["start", "end"]);
    let (mut a, mut b) = forked_pair(&mut base);
    a.insert(&list, 1, "a1").unwrap();
    a.insert(&list, 2, "a2").unwrap();
    b.insert(&list, 1, "b1").unwrap();

    a.merge(&mut b).unwrap();
    b.merge(&mut a).unwrap();
    assert_converged(&a, &b);

    let json = a.to_json(&list);
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 5);
    assert_eq!(items[0], "start");
    assert_eq!(items[4], "end");
    // Runs typed by one actor stay contiguous
    let a1 = items.iter().position(|v| v == "a1").unwrap();
    assert_eq!(items[a1 + 1], "a2");
}

#[test]
fn test_concurrent_nested_objects_at_same_key() {
    let mut base = doc_with_actor("base");
    base.put(&ROOT, "seed", 0).unwrap();
    base.commit().unwrap();

    let (mut a, mut b) = forked_pair(&mut base);
    let a_map = a.put_object(&ROOT, "cfg", ObjType::Map).unwrap();
    a.put(&a_map, "from", "a").unwrap();
    let b_map = b.put_object(&ROOT, "cfg", ObjType::Map).unwrap();
    b.put(&b_map, "from", "b").unwrap();

    a.merge(&mut b).unwrap();
    b.merge(&mut a).unwrap();
    assert_converged(&a, &b);
    assert_eq!(a.to_json(&ROOT)["cfg"], serde_json::json!({"from": "b"}));
    // The losing object is still reachable through the conflict list
    assert_eq!(a.get_all(&ROOT, "cfg").unwrap().len(), 2);
    assert_eq!(a.get(&a_map, "from").unwrap().unwrap(), "a");
}
