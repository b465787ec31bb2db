//! Merge, fork and out-of-order delivery tests.

use quilt::{
    ActorId, Change, ChangeHash, Document, ObjType, ROOT,
    crdt::op::{Key, ObjId, Op, OpAction},
};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::helpers::*;

/// Two replicas with a shared base and a few concurrent edits on each side.
fn diverged() -> (Document, Document) {
    let (mut base, list) = doc_with_list("base", &["x", "y"]);
    let (mut a, mut b) = forked_pair(&mut base);

    a.put(&ROOT, "title", "from a").unwrap();
    a.insert(&list, 0, "a0").unwrap();
    a.commit().unwrap();
    a.delete(&list, 2usize).unwrap();
    a.commit().unwrap();

    b.put(&ROOT, "title", "from b").unwrap();
    b.insert(&list, 2, "b2").unwrap();
    b.commit().unwrap();
    (a, b)
}

#[test]
fn test_merge_is_commutative() {
    let (mut a, mut b) = diverged();
    let mut a2 = a.fork().unwrap();
    let mut b2 = b.fork().unwrap();

    a.merge(&mut b).unwrap();
    b2.merge(&mut a2).unwrap();
    assert_converged(&a, &b2);
}

#[test]
fn test_merge_is_idempotent() {
    let (mut a, mut b) = diverged();
    let heads = a.merge(&mut b).unwrap();
    assert_eq!(heads, a.heads());
    let json = a.to_json(&ROOT);

    assert!(a.merge(&mut b).unwrap().is_empty());
    assert_eq!(a.heads(), heads);
    assert_eq!(a.to_json(&ROOT), json);

    // Merging an ancestor is a no-op too
    let mut older = b.fork().unwrap();
    assert!(a.merge(&mut older).unwrap().is_empty());
}

#[test]
fn test_merge_is_associative() {
    let (mut a, mut b) = diverged();
    let mut c = a.fork().unwrap();
    c.set_actor(quilt::ActorId::from(&b"ccc"[..])).unwrap();
    c.put(&ROOT, "extra", 1).unwrap();
    c.commit().unwrap();

    let mut left = a.fork().unwrap();
    left.merge(&mut b).unwrap();
    left.merge(&mut c).unwrap();

    let mut right = b.fork().unwrap();
    right.merge(&mut c).unwrap();
    right.merge(&mut a).unwrap();

    assert_converged(&left, &right);
}

#[test]
fn test_merge_commits_pending_edits() {
    let (mut a, mut b) = diverged();
    a.put(&ROOT, "pending_a", true).unwrap();
    b.put(&ROOT, "pending_b", true).unwrap();

    a.merge(&mut b).unwrap();
    assert_eq!(a.pending_ops(), 0);
    assert_eq!(b.pending_ops(), 0);
    assert_eq!(a.get(&ROOT, "pending_b").unwrap().unwrap(), true);
}

#[test]
fn test_merge_unrelated_documents() {
    let mut a = doc_with_actor("aaa");
    a.put(&ROOT, "a", 1).unwrap();
    let mut b = doc_with_actor("bbb");
    b.put(&ROOT, "b", 2).unwrap();

    a.merge(&mut b).unwrap();
    b.merge(&mut a).unwrap();
    assert_converged(&a, &b);
    assert_eq!(a.heads().len(), 2);
    assert_eq!(a.to_json(&ROOT), serde_json::json!({"a": 1, "b": 2}));
}

#[test]
fn test_merge_rejects_reused_sequence_number() {
    let mut a = doc_with_actor("same");
    a.put(&ROOT, "k", 1).unwrap();
    a.commit().unwrap();
    let mut b = doc_with_actor("same");
    b.put(&ROOT, "k", 2).unwrap();
    b.commit().unwrap();

    let heads = a.heads();
    let err = a.merge(&mut b).unwrap_err();
    assert!(err.is_corrupt_history());
    assert_eq!(a.heads(), heads);
    assert_eq!(a.get(&ROOT, "k").unwrap().unwrap(), 1i64);
}

/// A change by `actor` creating a list at root key `key`.
fn make_list_change(
    actor: &str,
    seq: u64,
    start_op: u64,
    deps: Vec<ChangeHash>,
    key: &str,
) -> Change {
    Change::builder(ActorId::from(actor.as_bytes()), seq, start_op)
        .deps(deps)
        .push_op(Op {
            obj: ObjId::Root,
            key: Key::Map(key.to_string()),
            insert: false,
            action: OpAction::MakeObject(ObjType::List),
            pred: Vec::new(),
        })
        .build()
        .unwrap()
}

#[test]
fn test_apply_changes_rejects_reused_op_ids() {
    let mut doc = doc_with_actor("aaa");
    let map = doc.put_object(&ROOT, "m", ObjType::Map).unwrap();
    doc.commit().unwrap();
    let first = doc.get_last_local_change().unwrap().clone();
    assert_eq!(first.start_op(), 1);
    let heads = doc.heads();

    // Reuses counter 1, which already names the map
    let reuse = make_list_change("aaa", 2, 1, vec![first.hash()], "l");
    let err = doc.apply_changes([reuse]).unwrap_err();
    assert!(err.is_corrupt_history());
    assert_eq!(doc.object_type(&map), Some(ObjType::Map));
    assert_eq!(doc.heads(), heads);
    assert_eq!(doc.to_json(&ROOT), serde_json::json!({"m": {}}));

    // Another actor still has to count past what it depends on
    let stale = make_list_change("bbb", 1, 1, vec![first.hash()], "l");
    assert!(doc.apply_changes([stale]).unwrap_err().is_corrupt_history());
    let zero = make_list_change("bbb", 1, 0, vec![], "l");
    assert!(doc.apply_changes([zero]).unwrap_err().is_corrupt_history());

    let valid = make_list_change("bbb", 1, 2, vec![first.hash()], "l");
    doc.apply_changes([valid]).unwrap();
    assert_eq!(doc.object_type(&map), Some(ObjType::Map));
    assert_eq!(doc.to_json(&ROOT), serde_json::json!({"l": [], "m": {}}));
}

#[test]
fn test_apply_changes_in_any_order() {
    let (mut a, mut b) = diverged();
    a.merge(&mut b).unwrap();
    let list = a.get(&ROOT, "list").unwrap().unwrap().obj_id().cloned().unwrap();
    for i in 0..3 {
        a.insert(&list, 0, i).unwrap();
        a.commit().unwrap();
    }
    let all = a.get_changes(&[]);

    for seed in 0..8 {
        let mut shuffled = all.clone();
        shuffled.shuffle(&mut StdRng::seed_from_u64(seed));

        let mut replica = doc_with_actor("ccc");
        replica.apply_changes(shuffled).unwrap();
        assert!(replica.get_missing_deps(&[]).is_empty(), "seed {seed}");
        assert_converged(&a, &replica);
    }
}

#[test]
fn test_missing_dependencies_are_queued() {
    let mut doc = doc_with_actor("aaa");
    doc.put(&ROOT, "n", 1).unwrap();
    doc.commit().unwrap();
    doc.put(&ROOT, "n", 2).unwrap();
    doc.commit().unwrap();
    let changes = doc.get_changes(&[]);
    let (first, second) = (changes[0].clone(), changes[1].clone());

    let mut replica = doc_with_actor("bbb");
    replica.apply_changes([second.clone()]).unwrap();
    assert!(replica.heads().is_empty());
    assert_eq!(replica.change_count(), 0);
    assert_eq!(replica.get_missing_deps(&[]), vec![first.hash()]);
    assert_eq!(replica.get(&ROOT, "n").unwrap(), None);

    // Heads we have never seen are missing too
    assert_eq!(
        replica.get_missing_deps(&[second.hash(), first.hash()]),
        vec![first.hash()]
    );

    replica.apply_changes([first]).unwrap();
    assert!(replica.get_missing_deps(&[]).is_empty());
    assert_eq!(replica.heads(), doc.heads());
    assert_eq!(replica.get(&ROOT, "n").unwrap().unwrap(), 2i64);
}

#[test]
fn test_fork_is_independent() {
    let mut base = doc_with_actor("base");
    let map = base.put_object(&ROOT, "settings", ObjType::Map).unwrap();
    base.put(&map, "theme", "dark").unwrap();

    let mut fork = base.fork().unwrap();
    assert_ne!(fork.get_actor(), base.get_actor());
    assert_eq!(fork.heads(), base.heads());

    fork.put(&map, "theme", "light").unwrap();
    fork.commit().unwrap();
    assert_eq!(base.get(&map, "theme").unwrap().unwrap(), "dark");

    base.merge(&mut fork).unwrap();
    assert_eq!(base.get(&map, "theme").unwrap().unwrap(), "light");
}

#[test]
fn test_fork_at_unknown_heads_fails() {
    let mut doc = doc_with_actor("aaa");
    doc.put(&ROOT, "k", 1).unwrap();
    let err = doc
        .fork_at(&[quilt::ChangeHash::digest(b"missing")])
        .unwrap_err();
    assert!(err.is_not_found());
}
