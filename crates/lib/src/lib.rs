//!
//! Quilt: a replicated document engine. Edit offline, merge anywhere.
//! This library provides a conflict-free replicated document made of maps, lists and rich text,
//! plus the change history and sync protocol used to reconcile replicas.
//!
//! ## Core Concepts
//!
//! * **Actors (`actor::ActorId`)**: Opaque replica identities. Every operation carries the actor that
//!   created it, and actor ids break ties between concurrent writes.
//! * **Operations (`crdt::op::Op`)**: Immutable edits identified by a Lamport-style `(counter, actor)` pair.
//! * **Changes (`change::Change`)**: Atomic, content-addressed batches of operations. Changes link to
//!   their causal parents by hash and form a DAG whose frontier is the document's *heads*.
//! * **Object store (`crdt::ObjectStore`)**: The live tree of maps, lists and text materialized by
//!   replaying the change log. Concurrent writes resolve deterministically.
//! * **Documents (`document::Document`)**: The handle applications edit. It owns the change log, the
//!   materialized store and an implicit open transaction.
//! * **Sync (`sync`)**: A symmetric two-party protocol that exchanges heads, Bloom-filter summaries
//!   and missing changes until both replicas converge.
//! * **Codec (`codec`)**: The binary framing used for snapshots, single changes and sync messages.

pub mod actor;
pub mod change;
pub mod clock;
pub mod codec;
pub mod constants;
pub mod crdt;
pub mod document;
pub(crate) mod history;
pub mod sync;
pub(crate) mod transaction;

pub use actor::ActorId;
pub use change::{Change, ChangeHash};
#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;
pub use clock::{Clock, SystemClock};
pub use crdt::{
    Cursor, ExpandMark, Mark, ObjId, ObjType, ObjectStore, OpId, Prop, ROOT, ScalarValue, Value,
    ValueTree,
};
pub use document::Document;
pub use sync::{SyncMessage, SyncState};

/// Result type used throughout the Quilt library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Quilt library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured actor id errors from the actor module
    #[error(transparent)]
    Actor(actor::ActorError),

    /// Structured change hash parsing errors
    #[error(transparent)]
    Hash(change::HashError),

    /// Structured change and history errors from the change module
    #[error(transparent)]
    Change(change::ChangeError),

    /// Structured CRDT errors from the crdt module
    #[error(transparent)]
    CRDT(crdt::CRDTError),

    /// Structured encoding errors from the codec module
    #[error(transparent)]
    Codec(codec::CodecError),

    /// Structured sync protocol errors from the sync module
    #[error(transparent)]
    Sync(sync::SyncError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
            Error::Actor(_) => "actor",
            Error::Hash(_) => "hash",
            Error::Change(_) => "change",
            Error::CRDT(_) => "crdt",
            Error::Codec(_) => "codec",
            Error::Sync(_) => "sync",
        }
    }

    /// Check if this error indicates an object, key or change was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::CRDT(crdt_err) => crdt_err.is_not_found_error(),
            Error::Change(change_err) => change_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error was caused by malformed caller input.
    ///
    /// Validation errors are raised before any state is mutated.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Actor(_) | Error::Hash(_) => true,
            Error::CRDT(crdt_err) => crdt_err.is_validation_error(),
            _ => false,
        }
    }

    /// Check if this error is an operation/value type mismatch.
    pub fn is_type_mismatch(&self) -> bool {
        match self {
            Error::CRDT(crdt_err) => crdt_err.is_type_error(),
            _ => false,
        }
    }

    /// Check if this error indicates an invalid change or unreadable history.
    pub fn is_corrupt_history(&self) -> bool {
        match self {
            Error::Change(change_err) => change_err.is_integrity_error(),
            Error::Codec(_) => true,
            _ => false,
        }
    }

    /// Check if this error is a cursor that no longer resolves.
    pub fn is_cursor_invalidated(&self) -> bool {
        match self {
            Error::CRDT(crdt_err) => crdt_err.is_cursor_error(),
            _ => false,
        }
    }

    /// Check if this error came from the sync protocol.
    pub fn is_sync_error(&self) -> bool {
        matches!(self, Error::Sync(_))
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}
