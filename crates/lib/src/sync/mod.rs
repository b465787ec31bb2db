//! Two-party sync protocol.
//!
//! Each side keeps a [`SyncState`] per peer and alternates
//! [`Document::generate_sync_message`] and [`Document::receive_sync_message`] until both
//! generate `None`. Neither side needs to be the initiator. Every message carries the sender's
//! heads, the hashes it knows it is missing, a Bloom filter of the changes it added since the
//! last point both sides shared, and whatever changes it has worked out the peer lacks. The
//! number of rounds depends on how far the two histories have diverged, not on their size.
//!
//! Only committed changes are exchanged; pending operations stay local until the next commit.
//!
//! ```
//! use quilt::{Document, ROOT, SyncState};
//!
//! let mut a = Document::new();
//! a.put(&ROOT, "from", "a").unwrap();
//! a.commit().unwrap();
//! let mut b = Document::new();
//!
//! let (mut sa, mut sb) = (SyncState::new(), SyncState::new());
//! loop {
//!     let to_b = a.generate_sync_message(&mut sa);
//!     if let Some(msg) = &to_b {
//!         b.receive_sync_message(&mut sb, msg.clone()).unwrap();
//!     }
//!     let to_a = b.generate_sync_message(&mut sb);
//!     if let Some(msg) = &to_a {
//!         a.receive_sync_message(&mut sa, msg.clone()).unwrap();
//!     }
//!     if to_b.is_none() && to_a.is_none() {
//!         break;
//!     }
//! }
//! assert_eq!(a.heads(), b.heads());
//! ```

pub mod bloom;
pub mod error;
pub mod protocol;
pub mod state;

use std::collections::{BTreeSet, HashMap, HashSet};

pub use bloom::BloomFilter;
pub use error::SyncError;
pub use protocol::{Have, SyncMessage};
pub use state::SyncState;
use tracing::debug;

use crate::{
    Document, Result,
    change::{Change, ChangeHash},
};

impl Document {
    /// Produce the next message for the peer tracked by `state`, or `None` when there is
    /// nothing to say.
    pub fn generate_sync_message(&self, state: &mut SyncState) -> Option<SyncMessage> {
        let our_heads = self.heads();
        let our_need = self.get_missing_deps(state.their_heads.as_deref().unwrap_or_default());

        let their_heads: HashSet<&ChangeHash> =
            state.their_heads.iter().flatten().collect();
        let our_have = if our_need.iter().all(|h| their_heads.contains(h)) {
            vec![self.make_have(&state.shared_heads)]
        } else {
            Vec::new()
        };

        // The peer summarised against heads we have never seen: its view of us is stale, so
        // ask it to start over from nothing.
        let stale_summary = state
            .their_have
            .as_ref()
            .and_then(|have| have.first())
            .is_some_and(|first| !first.last_sync.iter().all(|h| self.history.has(h)));
        if stale_summary {
            debug!(peer_heads = ?state.their_heads, "Sending sync reset");
            return Some(SyncMessage {
                heads: our_heads,
                need: Vec::new(),
                have: vec![Have::default()],
                changes: Vec::new(),
            });
        }

        let changes_to_send = match (&state.their_have, &state.their_need) {
            (Some(have), Some(need)) => self.changes_to_send(have, need),
            _ => Vec::new(),
        };

        let heads_unchanged = state.last_sent_heads == our_heads;
        let heads_equal = state.their_heads.as_ref() == Some(&our_heads);

        if heads_equal && changes_to_send.is_empty() {
            return None;
        }
        if heads_unchanged && state.have_responded && state.in_flight {
            return None;
        }

        let changes: Vec<Change> = changes_to_send
            .into_iter()
            .filter(|c| !state.sent_hashes.contains(&c.hash()))
            .cloned()
            .collect();

        state.last_sent_heads = our_heads.clone();
        state.have_responded = true;
        state.sent_hashes.extend(changes.iter().map(Change::hash));
        state.in_flight = true;

        debug!(
            heads = our_heads.len(),
            need = our_need.len(),
            changes = changes.len(),
            "Generated sync message"
        );
        Some(SyncMessage {
            heads: our_heads,
            need: our_need,
            have: our_have,
            changes,
        })
    }

    /// Apply a message from the peer tracked by `state`.
    ///
    /// Changes whose parents have not arrived yet are held back and applied once they do.
    pub fn receive_sync_message(&mut self, state: &mut SyncState, message: SyncMessage) -> Result<()> {
        let before_heads = self.heads();
        let SyncMessage {
            heads: message_heads,
            need: message_need,
            have: message_have,
            changes: message_changes,
        } = message;

        debug!(
            heads = message_heads.len(),
            changes = message_changes.len(),
            "Received sync message"
        );

        let changes_is_empty = message_changes.is_empty();
        if !changes_is_empty {
            self.apply_changes(message_changes)?;
            state.shared_heads = advance_heads(&before_heads, &self.heads(), &state.shared_heads);
        }

        // Forget sent changes the peer now acknowledges having.
        let acknowledged = self.history.ancestors(&message_heads);
        state.sent_hashes.retain(|h| !acknowledged.contains(h));

        if changes_is_empty && message_heads == before_heads {
            state.last_sent_heads = message_heads.clone();
        }

        let known_heads: Vec<ChangeHash> = message_heads
            .iter()
            .filter(|h| self.history.has(h))
            .copied()
            .collect();
        if known_heads.len() == message_heads.len() {
            state.shared_heads = message_heads.clone();
            state.in_flight = false;
            // The peer has lost its data; resend everything.
            if message_heads.is_empty() {
                state.last_sent_heads = Vec::new();
                state.sent_hashes = BTreeSet::new();
            }
        } else {
            let merged: BTreeSet<ChangeHash> = state
                .shared_heads
                .iter()
                .copied()
                .chain(known_heads)
                .collect();
            state.shared_heads = merged.into_iter().collect();
        }

        state.their_have = Some(message_have);
        state.their_heads = Some(message_heads);
        state.their_need = Some(message_need);
        Ok(())
    }

    /// Summarise the changes added since `last_sync`.
    fn make_have(&self, last_sync: &[ChangeHash]) -> Have {
        let hashes: Vec<ChangeHash> = self
            .history
            .changes_since(last_sync)
            .into_iter()
            .map(Change::hash)
            .collect();
        Have {
            last_sync: last_sync.to_vec(),
            bloom: BloomFilter::from_hashes(hashes.iter()),
        }
    }

    /// Changes the peer lacks according to its summaries, plus everything it asked for.
    ///
    /// Anything that depends on a change we are sending is sent too, so a Bloom false positive
    /// on a parent cannot strand its descendants.
    fn changes_to_send(&self, have: &[Have], need: &[ChangeHash]) -> Vec<&Change> {
        if have.is_empty() {
            return need.iter().filter_map(|h| self.history.get(h)).collect();
        }

        let last_sync: Vec<ChangeHash> = have
            .iter()
            .flat_map(|h| h.last_sync.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let candidates = self.history.changes_since(&last_sync);

        let mut candidate_hashes = HashSet::new();
        let mut dependents: HashMap<ChangeHash, Vec<ChangeHash>> = HashMap::new();
        let mut to_send = HashSet::new();
        for change in &candidates {
            candidate_hashes.insert(change.hash());
            for dep in change.deps() {
                dependents.entry(*dep).or_default().push(change.hash());
            }
            if have.iter().all(|h| !h.bloom.contains_hash(&change.hash())) {
                to_send.insert(change.hash());
            }
        }

        let mut stack: Vec<ChangeHash> = to_send.iter().copied().collect();
        while let Some(hash) = stack.pop() {
            for dependent in dependents.get(&hash).into_iter().flatten() {
                if to_send.insert(*dependent) {
                    stack.push(*dependent);
                }
            }
        }

        let mut changes = Vec::new();
        for hash in need {
            to_send.insert(*hash);
            if candidate_hashes.contains(hash) {
                continue;
            }
            if let Some(change) = self.history.get(hash) {
                changes.push(change);
            }
        }
        changes.extend(candidates.into_iter().filter(|c| to_send.contains(&c.hash())));
        changes
    }
}

/// Heads both sides share after we applied new changes: our new heads that were not heads
/// before, plus previously shared heads that are still heads.
fn advance_heads(
    old_heads: &[ChangeHash],
    new_heads: &[ChangeHash],
    old_shared: &[ChangeHash],
) -> Vec<ChangeHash> {
    let advanced: BTreeSet<ChangeHash> = new_heads
        .iter()
        .filter(|h| !old_heads.contains(h))
        .chain(old_shared.iter().filter(|h| new_heads.contains(h)))
        .copied()
        .collect();
    advanced.into_iter().collect()
}
