//! End-to-end sync protocol tests.

use quilt::{ROOT, SyncMessage, SyncState};
use serde::Serialize;
use serde_bytes::ByteBuf;

use crate::helpers::*;

#[test]
fn test_sync_with_empty_peer() {
    let (mut a, _) = doc_with_list("aaa", &["one", "two", "three"]);
    a.put(&ROOT, "title", "list").unwrap();
    a.commit().unwrap();
    let mut b = doc_with_actor("bbb");

    let (mut sa, mut sb) = (SyncState::new(), SyncState::new());
    sync_pair(&mut a, &mut sa, &mut b, &mut sb);
    assert_converged(&a, &b);
    assert_eq!(b.change_count(), 2);
}

#[test]
fn test_sync_diverged_replicas() {
    let (mut base, list) = doc_with_list("base", &["x"]);
    let (mut a, mut b) = forked_pair(&mut base);
    for i in 0..5 {
        a.insert(&list, 0, format!("a{i}")).unwrap();
        a.commit().unwrap();
        b.insert(&list, 1, format!("b{i}")).unwrap();
        b.commit().unwrap();
    }

    let (mut sa, mut sb) = (SyncState::new(), SyncState::new());
    sync_pair(&mut a, &mut sa, &mut b, &mut sb);
    assert_converged(&a, &b);
    assert_eq!(a.length(&list), 11);
}

#[test]
fn test_nothing_to_send_after_sync() {
    let (mut a, _) = doc_with_text("aaa", "hello");
    let mut b = doc_with_actor("bbb");
    let (mut sa, mut sb) = (SyncState::new(), SyncState::new());
    sync_pair(&mut a, &mut sa, &mut b, &mut sb);

    assert!(a.generate_sync_message(&mut sa).is_none());
    assert!(b.generate_sync_message(&mut sb).is_none());
    assert_eq!(sync_pair(&mut a, &mut sa, &mut b, &mut sb), 0);
}

#[test]
fn test_new_change_sent_once() {
    let (mut a, text) = doc_with_text("aaa", "hello");
    let mut b = doc_with_actor("bbb");
    let (mut sa, mut sb) = (SyncState::new(), SyncState::new());
    sync_pair(&mut a, &mut sa, &mut b, &mut sb);

    a.splice_text(&text, 5, 0, "!").unwrap();
    a.commit().unwrap();

    let mut transferred = 0;
    for _ in 0..16 {
        let to_b = a.generate_sync_message(&mut sa);
        if let Some(msg) = &to_b {
            transferred += msg.changes.len();
            b.receive_sync_message(&mut sb, msg.clone()).unwrap();
        }
        let to_a = b.generate_sync_message(&mut sb);
        if let Some(msg) = &to_a {
            transferred += msg.changes.len();
            a.receive_sync_message(&mut sa, msg.clone()).unwrap();
        }
        if to_b.is_none() && to_a.is_none() {
            break;
        }
    }
    assert_eq!(transferred, 1);
    assert_eq!(b.text(&text).unwrap(), "hello!");
}

#[test]
fn test_one_round_delivers_child_change() {
    let mut a = doc_with_actor("aaa");
    a.put(&ROOT, "k", 1).unwrap();
    a.commit().unwrap();
    let mut b = doc_with_actor("bbb");
    let (mut sa, mut sb) = (SyncState::new(), SyncState::new());
    sync_pair(&mut a, &mut sa, &mut b, &mut sb);
    let h1 = a.heads();

    b.put(&ROOT, "k", 2).unwrap();
    let h2 = b.commit().unwrap().unwrap();
    assert_eq!(b.get_change_by_hash(&h2).unwrap().deps(), h1.as_slice());

    let msg = b.generate_sync_message(&mut sb).unwrap();
    a.receive_sync_message(&mut sa, msg).unwrap();
    assert_eq!(a.heads(), vec![h2]);
    assert!(a.generate_sync_message(&mut sa).is_none());
}

#[test]
fn test_pending_edits_are_not_synced() {
    let (mut a, _) = doc_with_text("aaa", "hello");
    a.put(&ROOT, "draft", true).unwrap();
    let mut b = doc_with_actor("bbb");

    let (mut sa, mut sb) = (SyncState::new(), SyncState::new());
    sync_pair(&mut a, &mut sa, &mut b, &mut sb);
    assert_eq!(b.heads(), a.heads());
    assert_eq!(b.get(&ROOT, "draft").unwrap(), None);
    assert_eq!(a.pending_ops(), 1);
}

#[test]
fn test_resume_with_saved_state() {
    let (mut a, list) = doc_with_list("aaa", &["a"]);
    let mut b = doc_with_actor("bbb");
    let (mut sa, mut sb) = (SyncState::new(), SyncState::new());
    sync_pair(&mut a, &mut sa, &mut b, &mut sb);

    let saved_a = sa.encode().unwrap();
    let saved_b = sb.encode().unwrap();

    a.insert(&list, 1, "b").unwrap();
    a.commit().unwrap();
    b.insert(&list, 0, "z").unwrap();
    b.commit().unwrap();

    let mut sa = SyncState::decode(&saved_a).unwrap();
    let mut sb = SyncState::decode(&saved_b).unwrap();
    sync_pair(&mut a, &mut sa, &mut b, &mut sb);
    assert_converged(&a, &b);
    assert_eq!(a.length(&list), 3);
}

#[test]
fn test_peer_that_lost_its_data() {
    let (mut a, _) = doc_with_list("aaa", &["a", "b"]);
    let mut b = doc_with_actor("bbb");
    let (mut sa, mut sb) = (SyncState::new(), SyncState::new());
    sync_pair(&mut a, &mut sa, &mut b, &mut sb);

    // The peer comes back empty but we still remember syncing with it
    let mut fresh = doc_with_actor("bbb");
    let mut fresh_state = SyncState::new();
    sync_pair(&mut a, &mut sa, &mut fresh, &mut fresh_state);
    assert_converged(&a, &fresh);
}

#[test]
fn test_three_replicas_converge_pairwise() {
    let mut a = doc_with_actor("aaa");
    a.put(&ROOT, "a", 1).unwrap();
    a.commit().unwrap();
    let mut b = doc_with_actor("bbb");
    b.put(&ROOT, "b", 2).unwrap();
    b.commit().unwrap();
    let mut c = doc_with_actor("ccc");
    c.put(&ROOT, "c", 3).unwrap();
    c.commit().unwrap();

    let (mut ab, mut ba) = (SyncState::new(), SyncState::new());
    let (mut bc, mut cb) = (SyncState::new(), SyncState::new());
    sync_pair(&mut a, &mut ab, &mut b, &mut ba);
    sync_pair(&mut b, &mut bc, &mut c, &mut cb);
    sync_pair(&mut a, &mut ab, &mut b, &mut ba);

    assert_converged(&a, &b);
    assert_converged(&b, &c);
    assert_eq!(
        c.to_json(&ROOT),
        serde_json::json!({"a": 1, "b": 2, "c": 3})
    );
}

#[test]
fn test_malformed_message_leaves_document_untouched() {
    let (mut a, _) = doc_with_text("aaa", "hello");
    let mut state = SyncState::new();
    let heads = a.heads();

    for bytes in [&[][..], &[0x42][..], &[0x42, 0x00, 0x01][..], &b"junk"[..]] {
        let err = SyncMessage::decode(bytes).unwrap_err();
        assert!(err.is_sync_error());
    }
    assert_eq!(a.heads(), heads);
    assert!(a.generate_sync_message(&mut state).is_some());
}

#[test]
fn test_child_change_waits_for_parent() {
    let mut a = doc_with_actor("aaa");
    a.put(&ROOT, "k", 1).unwrap();
    a.commit().unwrap();
    a.put(&ROOT, "k", 2).unwrap();
    a.commit().unwrap();
    let changes = a.get_changes(&[]);
    let (parent, child) = (changes[0].clone(), changes[1].clone());

    // Only the child arrives
    let mut b = doc_with_actor("bbb");
    let mut sb = SyncState::new();
    let early = SyncMessage {
        heads: a.heads(),
        need: Vec::new(),
        have: Vec::new(),
        changes: vec![child.clone()],
    };
    b.receive_sync_message(&mut sb, early).unwrap();
    assert!(b.heads().is_empty());
    assert_eq!(b.get(&ROOT, "k").unwrap(), None);
    assert_eq!(b.get_missing_deps(&[]), vec![parent.hash()]);

    let request = b.generate_sync_message(&mut sb).unwrap();
    assert_eq!(request.need, vec![parent.hash()]);

    let mut sa = SyncState::new();
    a.receive_sync_message(&mut sa, request).unwrap();
    let reply = a.generate_sync_message(&mut sa).unwrap();
    assert!(reply.changes.iter().any(|c| c.hash() == parent.hash()));
    b.receive_sync_message(&mut sb, reply).unwrap();

    assert!(b.get_missing_deps(&[]).is_empty());
    assert_eq!(b.heads(), vec![child.hash()]);
    assert_converged(&a, &b);
    assert_eq!(b.get(&ROOT, "k").unwrap().unwrap(), 2i64);
}

#[derive(Serialize)]
struct RawBloom {
    num_entries: u32,
    num_bits_per_entry: u32,
    num_probes: u32,
    bits: ByteBuf,
}

#[derive(Serialize)]
struct RawHave {
    last_sync: Vec<ByteBuf>,
    bloom: RawBloom,
}

#[derive(Serialize)]
struct RawMessage {
    heads: Vec<ByteBuf>,
    need: Vec<ByteBuf>,
    have: Vec<RawHave>,
    changes: Vec<ByteBuf>,
}

/// A message whose only summary is a one-entry filter with the given parameters.
fn message_with_bloom(num_bits_per_entry: u32, num_probes: u32) -> Vec<u8> {
    let bytes = (num_bits_per_entry as usize).div_ceil(8);
    let raw = RawMessage {
        heads: Vec::new(),
        need: Vec::new(),
        have: vec![RawHave {
            last_sync: Vec::new(),
            bloom: RawBloom {
                num_entries: 1,
                num_bits_per_entry,
                num_probes,
                bits: ByteBuf::from(vec![0xff; bytes]),
            },
        }],
        changes: Vec::new(),
    };
    let mut out = vec![0x42];
    out.extend(serde_ipld_dagcbor::to_vec(&raw).unwrap());
    out
}

#[test]
fn test_decode_rejects_foreign_bloom_parameters() {
    // Our own parameters decode
    assert!(SyncMessage::decode(&message_with_bloom(10, 7)).is_ok());

    for (bits_per_entry, probes) in [(10, u32::MAX), (10, 0), (64, 7), (0, 7)] {
        let err = SyncMessage::decode(&message_with_bloom(bits_per_entry, probes)).unwrap_err();
        assert!(err.is_sync_error(), "{bits_per_entry} bits, {probes} probes");
    }
}

#[test]
fn test_message_wire_round_trip() {
    let (mut a, _) = doc_with_text("aaa", "hello");
    let mut b = doc_with_actor("bbb");
    let (mut sa, mut sb) = (SyncState::new(), SyncState::new());

    let from_b = b.generate_sync_message(&mut sb).unwrap();
    a.receive_sync_message(&mut sa, from_b).unwrap();
    let msg = a.generate_sync_message(&mut sa).unwrap();
    assert_eq!(msg.changes.len(), 1);

    let decoded = SyncMessage::decode(&msg.encode().unwrap()).unwrap();
    assert_eq!(decoded, msg);
    b.receive_sync_message(&mut sb, decoded).unwrap();
    assert_eq!(b.heads(), a.heads());
}
