//! Per-peer sync session state.

use std::collections::BTreeSet;

use super::{SyncError, protocol::Have};
use crate::{Result, change::ChangeHash, codec, constants::SYNC_STATE_TYPE};

/// What one replica knows about one peer during a sync session.
///
/// Keep one `SyncState` per peer and pass it to every
/// [`generate_sync_message`](crate::Document::generate_sync_message) and
/// [`receive_sync_message`](crate::Document::receive_sync_message) call for that peer. Only the
/// shared heads survive [`encode`](Self::encode); the rest is session bookkeeping that is rebuilt
/// on reconnect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncState {
    /// Heads both sides are known to have
    pub(crate) shared_heads: Vec<ChangeHash>,
    /// Our heads as of the last message we sent
    pub(crate) last_sent_heads: Vec<ChangeHash>,
    pub(crate) their_heads: Option<Vec<ChangeHash>>,
    pub(crate) their_need: Option<Vec<ChangeHash>>,
    pub(crate) their_have: Option<Vec<Have>>,
    /// Changes sent this session that the peer has not yet acknowledged
    pub(crate) sent_hashes: BTreeSet<ChangeHash>,
    /// A message is awaiting a reply
    pub(crate) in_flight: bool,
    pub(crate) have_responded: bool,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Heads both sides are known to share.
    pub fn shared_heads(&self) -> &[ChangeHash] {
        &self.shared_heads
    }

    /// The peer's heads from its last message, if any has been received.
    pub fn their_heads(&self) -> Option<&[ChangeHash]> {
        self.their_heads.as_deref()
    }

    /// Whether a message has been sent and not yet answered.
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Encode the persistent part of the state.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let body = codec::to_cbor(&self.shared_heads).map_err(|e| SyncError::Encode {
            what: "state",
            reason: e.to_string(),
        })?;
        let mut out = Vec::with_capacity(body.len() + 1);
        out.push(SYNC_STATE_TYPE);
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Restore a state saved with [`encode`](Self::encode).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (&kind, body) = bytes
            .split_first()
            .ok_or(SyncError::Empty { what: "state" })?;
        if kind != SYNC_STATE_TYPE {
            return Err(SyncError::UnknownStateType {
                found: kind,
                expected: SYNC_STATE_TYPE,
            }
            .into());
        }
        let shared_heads: Vec<ChangeHash> =
            codec::from_cbor(body).map_err(|e| SyncError::Malformed {
                what: "state",
                reason: e.to_string(),
            })?;
        Ok(Self {
            shared_heads,
            ..Self::default()
        })
    }
}
