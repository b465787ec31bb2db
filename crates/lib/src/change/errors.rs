//! Change-specific error types for the Quilt library.
//!
//! This module defines structured error types for building changes and inserting them into a
//! document's history.

use thiserror::Error;

use super::ChangeHash;
use crate::actor::ActorId;

/// Errors that can occur while building, importing or looking up changes.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ChangeError {
    /// A change was rejected because its content is inconsistent with the history it extends
    #[error("Invalid change {hash}: {reason}")]
    InvalidChange {
        /// Hash of the rejected change
        hash: ChangeHash,
        /// Why the change was rejected
        reason: String,
    },

    /// A change references a parent that cannot be resolved
    #[error("Change {hash} depends on missing change {dependency}")]
    MissingDependency {
        /// Hash of the change with the dangling reference
        hash: ChangeHash,
        /// The parent hash that could not be found
        dependency: ChangeHash,
    },

    /// Two different changes claim the same actor and sequence number
    #[error("Duplicate sequence number {seq} for actor {actor}")]
    DuplicateSeq {
        /// The actor whose sequence collided
        actor: ActorId,
        /// The colliding sequence number
        seq: u64,
    },

    /// A change's op counters are not fresh: they do not follow every op it depends on, or
    /// another change by the same actor already claimed them
    #[error("Change {hash} starting at op {start_op} conflicts with op counter {counter}")]
    OpCounterConflict {
        /// Hash of the rejected change
        hash: ChangeHash,
        /// First op counter of the rejected change
        start_op: u64,
        /// The counter already present in history
        counter: u64,
    },

    /// The op counters of a change do not fit in 64 bits
    #[error("Op counters starting at {start_op} overflow for {ops} operations")]
    OpCounterOverflow {
        /// First op counter of the change
        start_op: u64,
        /// Number of operations in the change
        ops: usize,
    },

    /// A change must contain at least one operation
    #[error("Change must contain at least one operation")]
    EmptyChange,

    /// A hash was requested that the history does not contain
    #[error("Change not found: {hash}")]
    UnknownHash {
        /// The hash that was looked up
        hash: ChangeHash,
    },

    /// Encoding a change body failed
    #[error("Change encoding failed: {reason}")]
    EncodingFailed {
        /// Underlying encoder message
        reason: String,
    },
}

impl ChangeError {
    /// Check if this error indicates a change could not be found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ChangeError::UnknownHash { .. })
    }

    /// Check if this error indicates broken or inconsistent history.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            ChangeError::InvalidChange { .. }
                | ChangeError::MissingDependency { .. }
                | ChangeError::DuplicateSeq { .. }
                | ChangeError::OpCounterConflict { .. }
                | ChangeError::OpCounterOverflow { .. }
        )
    }

    /// Get the hash of the change this error concerns, if any.
    pub fn hash(&self) -> Option<&ChangeHash> {
        match self {
            ChangeError::InvalidChange { hash, .. }
            | ChangeError::MissingDependency { hash, .. }
            | ChangeError::OpCounterConflict { hash, .. }
            | ChangeError::UnknownHash { hash } => Some(hash),
            _ => None,
        }
    }
}

impl From<ChangeError> for crate::Error {
    fn from(err: ChangeError) -> Self {
        crate::Error::Change(err)
    }
}
