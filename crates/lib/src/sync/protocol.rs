//! Sync message definitions and their wire encoding.
//!
//! Messages are transport-agnostic: callers move the encoded bytes however they like. An encoded
//! message is a single type byte followed by a DAG-CBOR body, so it can never be mistaken for a
//! snapshot or change chunk.

use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;

use super::{SyncError, bloom::BloomFilter};
use crate::{
    Result,
    change::{Change, ChangeHash},
    codec,
    constants::SYNC_MESSAGE_TYPE,
};

/// A summary of the changes the sender has added since `last_sync`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Have {
    /// Heads both sides were known to share when the summary was built
    pub last_sync: Vec<ChangeHash>,
    /// Every change of the sender not reachable from `last_sync`
    pub bloom: BloomFilter,
}

/// One round of the sync protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncMessage {
    /// The sender's current heads
    pub heads: Vec<ChangeHash>,
    /// Hashes the sender knows it is missing
    pub need: Vec<ChangeHash>,
    /// Summaries of what the sender already has
    pub have: Vec<Have>,
    /// Changes the sender believes the receiver lacks
    pub changes: Vec<Change>,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    heads: Vec<ChangeHash>,
    need: Vec<ChangeHash>,
    have: Vec<Have>,
    changes: Vec<ByteBuf>,
}

impl SyncMessage {
    /// Encode the message for transmission.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let wire = WireMessage {
            heads: self.heads.clone(),
            need: self.need.clone(),
            have: self.have.clone(),
            changes: self
                .changes
                .iter()
                .map(|c| ByteBuf::from(c.encoded_body().to_vec()))
                .collect(),
        };
        let body = codec::to_cbor(&wire).map_err(|e| SyncError::Encode {
            what: "message",
            reason: e.to_string(),
        })?;
        let mut out = Vec::with_capacity(body.len() + 1);
        out.push(SYNC_MESSAGE_TYPE);
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Decode a message. Any malformed input fails with a [`SyncError`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (&kind, body) = bytes
            .split_first()
            .ok_or(SyncError::Empty { what: "message" })?;
        if kind != SYNC_MESSAGE_TYPE {
            return Err(SyncError::UnknownMessageType {
                found: kind,
                expected: SYNC_MESSAGE_TYPE,
            }
            .into());
        }
        let wire: WireMessage = codec::from_cbor(body).map_err(|e| malformed(e.to_string()))?;
        for have in &wire.have {
            have.bloom.validate()?;
        }
        let changes = wire
            .changes
            .iter()
            .map(|body| Change::from_encoded_body(body).map_err(|e| malformed(e.to_string())))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            heads: wire.heads,
            need: wire.need,
            have: wire.have,
            changes,
        })
    }
}

fn malformed(reason: String) -> SyncError {
    SyncError::Malformed {
        what: "message",
        reason,
    }
}
