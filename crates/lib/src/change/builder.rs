//! Builder for creating Change instances.

use super::{Change, ChangeBody, ChangeError, ChangeHash};
use crate::{actor::ActorId, crdt::op::Op};

/// A builder for creating `Change` instances.
///
/// `ChangeBuilder` allows mutable construction of a change's content. Once finalized with
/// `build()`, it produces an immutable `Change` whose hash is computed from its canonical
/// encoding. Parent hashes are sorted and deduplicated so that the same causal position always
/// encodes the same way.
///
/// The builder provides two patterns for construction:
/// 1. Ownership chaining: each method returns `self`.
/// 2. Mutable reference: methods ending in `_mut` modify the builder in place.
#[derive(Clone, Debug)]
pub struct ChangeBuilder {
    body: ChangeBody,
}

impl ChangeBuilder {
    /// Creates a new `ChangeBuilder`.
    ///
    /// # Arguments
    /// * `actor` - The actor committing the change.
    /// * `seq` - The actor's sequence number for this change (1-based).
    /// * `start_op` - Lamport counter of the first operation.
    pub fn new(actor: ActorId, seq: u64, start_op: u64) -> Self {
        Self {
            body: ChangeBody {
                actor,
                seq,
                start_op,
                time: 0,
                message: None,
                deps: Vec::new(),
                ops: Vec::new(),
            },
        }
    }

    /// Set the causal parents of the change.
    pub fn deps(mut self, deps: Vec<ChangeHash>) -> Self {
        self.deps_mut(deps);
        self
    }

    /// Mutable reference version of `deps`.
    pub fn deps_mut(&mut self, deps: Vec<ChangeHash>) -> &mut Self {
        self.body.deps = deps;
        self
    }

    /// Set the commit message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.body.message = Some(message.into());
        self
    }

    /// Mutable reference version of `message`, accepting an optional message.
    pub fn message_mut(&mut self, message: Option<String>) -> &mut Self {
        self.body.message = message;
        self
    }

    /// Set the commit time in milliseconds since the Unix epoch.
    pub fn time(mut self, time: i64) -> Self {
        self.body.time = time;
        self
    }

    /// Mutable reference version of `time`.
    pub fn time_mut(&mut self, time: i64) -> &mut Self {
        self.body.time = time;
        self
    }

    /// Append an operation.
    pub fn push_op(mut self, op: Op) -> Self {
        self.body.ops.push(op);
        self
    }

    /// Append several operations in order.
    pub fn extend_ops_mut(&mut self, ops: impl IntoIterator<Item = Op>) -> &mut Self {
        self.body.ops.extend(ops);
        self
    }

    /// Build the final immutable `Change`.
    ///
    /// Fails with [`ChangeError::EmptyChange`] if no operations were added, and with
    /// [`ChangeError::OpCounterOverflow`] if the op counters would pass `u64::MAX`.
    pub fn build(mut self) -> Result<Change, ChangeError> {
        self.body.check_ops()?;
        self.body.deps.sort();
        self.body.deps.dedup();
        Change::from_body(self.body)
    }
}
