//!
//! Defines the unit of history (`Change`) and related types.
//!
//! A `Change` is the immutable, content-addressable record produced by one commit: an ordered,
//! non-empty batch of operations plus the hashes of the changes it causally follows. Changes form
//! a DAG through those parent hashes; the changes with no children are a document's *heads*.

pub mod builder;
pub mod errors;
pub mod hash;

pub use builder::ChangeBuilder;
pub use errors::ChangeError;
pub use hash::{ChangeHash, HashError};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    actor::ActorId,
    codec::{self, ChunkKind},
    crdt::op::{Op, OpId},
};

/// The serialized content of a change. The change hash is computed over its canonical encoding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct ChangeBody {
    pub(crate) actor: ActorId,
    pub(crate) seq: u64,
    pub(crate) start_op: u64,
    pub(crate) time: i64,
    pub(crate) message: Option<String>,
    /// Parent hashes, kept sorted.
    pub(crate) deps: Vec<ChangeHash>,
    pub(crate) ops: Vec<Op>,
}

impl ChangeBody {
    /// Reject empty bodies and bodies whose op counters, plus the one after them, do not fit in
    /// a `u64`.
    pub(crate) fn check_ops(&self) -> std::result::Result<(), ChangeError> {
        if self.ops.is_empty() {
            return Err(ChangeError::EmptyChange);
        }
        u64::try_from(self.ops.len())
            .ok()
            .and_then(|len| self.start_op.checked_add(len))
            .map(|_| ())
            .ok_or(ChangeError::OpCounterOverflow {
                start_op: self.start_op,
                ops: self.ops.len(),
            })
    }
}

/// An atomic, hashable, causally-linked batch of operations.
///
/// Operations inside a change carry consecutive counters starting at [`Change::start_op`], all
/// attributed to the change's actor, so their ids are implied rather than stored.
///
/// # Immutability
///
/// A `Change` never changes once built. Its [`hash`](Change::hash) is computed once from the
/// canonical encoding of its body, and the encoded bytes are retained so the change can be
/// re-transmitted without re-encoding.
///
/// ```
/// use quilt::{Document, ROOT};
///
/// let mut doc = Document::new();
/// doc.put(&ROOT, "title", "draft").unwrap();
/// doc.commit_with(Some("first".to_string()), Some(1_700_000_000_000)).unwrap();
///
/// let change = doc.get_last_local_change().unwrap();
/// assert_eq!(change.seq(), 1);
/// assert_eq!(change.message(), Some("first"));
/// assert_eq!(change.len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct Change {
    body: ChangeBody,
    encoded: Vec<u8>,
    hash: ChangeHash,
}

impl PartialEq for Change {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Change {
    /// Creates a new `ChangeBuilder` for a change by `actor` with the given sequence number
    /// and first operation counter.
    pub fn builder(actor: ActorId, seq: u64, start_op: u64) -> ChangeBuilder {
        ChangeBuilder::new(actor, seq, start_op)
    }

    pub(crate) fn from_body(body: ChangeBody) -> std::result::Result<Self, ChangeError> {
        let encoded = codec::to_cbor(&body).map_err(|e| ChangeError::EncodingFailed {
            reason: e.to_string(),
        })?;
        let hash = ChangeHash::digest(&encoded);
        Ok(Self {
            body,
            encoded,
            hash,
        })
    }

    /// Rebuild a change from the raw body bytes it was hashed over.
    pub(crate) fn from_encoded_body(encoded: &[u8]) -> Result<Self> {
        let body: ChangeBody = codec::from_cbor(encoded)?;
        body.check_ops()?;
        Ok(Self {
            body,
            encoded: encoded.to_vec(),
            hash: ChangeHash::digest(encoded),
        })
    }

    /// Decode a single change from its standalone (incremental) encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let chunk = codec::decode_single_chunk(bytes, ChunkKind::Change)?;
        Self::from_encoded_body(chunk.body)
    }

    /// Encode this change as a standalone chunk that can be passed to
    /// [`Document::load_incremental`](crate::Document::load_incremental).
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(codec::encode_chunk(ChunkKind::Change, &self.encoded)?)
    }

    /// The canonical encoding of the change body.
    pub(crate) fn encoded_body(&self) -> &[u8] {
        &self.encoded
    }

    /// The content hash identifying this change.
    pub fn hash(&self) -> ChangeHash {
        self.hash
    }

    /// The actor that created this change.
    pub fn actor(&self) -> &ActorId {
        &self.body.actor
    }

    /// Per-actor sequence number, starting at 1.
    pub fn seq(&self) -> u64 {
        self.body.seq
    }

    /// Counter of the first operation in this change.
    pub fn start_op(&self) -> u64 {
        self.body.start_op
    }

    /// Counter of the last operation in this change.
    pub fn max_op(&self) -> u64 {
        self.body.start_op + self.body.ops.len() as u64 - 1
    }

    /// Commit time in milliseconds since the Unix epoch.
    pub fn time(&self) -> i64 {
        self.body.time
    }

    /// Optional commit message.
    pub fn message(&self) -> Option<&str> {
        self.body.message.as_deref()
    }

    /// Hashes of the changes this change causally follows, sorted.
    pub fn deps(&self) -> &[ChangeHash] {
        &self.body.deps
    }

    /// Number of operations in this change.
    pub fn len(&self) -> usize {
        self.body.ops.len()
    }

    /// A built change is never empty; this exists for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.body.ops.is_empty()
    }

    /// Iterate over the operations together with their implied ids.
    pub fn iter_ops(&self) -> impl Iterator<Item = (OpId, &Op)> + '_ {
        self.body
            .ops
            .iter()
            .enumerate()
            .map(|(i, op)| (OpId::new(self.body.start_op + i as u64, self.body.actor.clone()), op))
    }
}
