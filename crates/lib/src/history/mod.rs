//! The change DAG of one document.
//!
//! [`ChangeGraph`] stores applied changes in the order they were applied, which is always a
//! causal order: a change is only appended once every parent is present. Changes that arrive
//! before their parents wait in a queue until they can be applied.

mod traversal;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::warn;

use crate::{
    actor::ActorId,
    change::{Change, ChangeError, ChangeHash},
};

#[derive(Debug, Clone, Default)]
pub(crate) struct ChangeGraph {
    /// Applied changes in causal order
    changes: Vec<Change>,
    index: HashMap<ChangeHash, usize>,
    heads: BTreeSet<ChangeHash>,
    /// Which change claimed each (actor, seq) pair
    seqs: HashMap<(ActorId, u64), ChangeHash>,
    max_seq: HashMap<ActorId, u64>,
    /// Highest op counter in each change and its ancestors
    op_clock: HashMap<ChangeHash, u64>,
    /// Op counter ranges claimed by each actor, keyed by first counter
    op_ranges: HashMap<ActorId, BTreeMap<u64, u64>>,
    /// Changes whose parents have not all arrived yet
    queue: Vec<Change>,
}

impl ChangeGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.changes.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Change> + '_ {
        self.changes.iter()
    }

    /// Changes applied after the first `from` changes.
    pub(crate) fn tail(&self, from: usize) -> &[Change] {
        self.changes.get(from..).unwrap_or_default()
    }

    pub(crate) fn get(&self, hash: &ChangeHash) -> Option<&Change> {
        self.index.get(hash).map(|&i| &self.changes[i])
    }

    pub(crate) fn has(&self, hash: &ChangeHash) -> bool {
        self.index.contains_key(hash)
    }

    /// Current heads, sorted.
    pub(crate) fn heads(&self) -> Vec<ChangeHash> {
        self.heads.iter().copied().collect()
    }

    pub(crate) fn max_seq(&self, actor: &ActorId) -> u64 {
        self.max_seq.get(actor).copied().unwrap_or(0)
    }

    /// Most recent change by `actor`.
    pub(crate) fn last_by(&self, actor: &ActorId) -> Option<&Change> {
        let seq = self.max_seq(actor);
        self.seqs
            .get(&(actor.clone(), seq))
            .and_then(|hash| self.get(hash))
    }

    /// Whether every parent of `change` has been applied.
    pub(crate) fn is_ready(&self, change: &Change) -> bool {
        change.deps().iter().all(|dep| self.has(dep))
    }

    /// Check that `change` can be appended: all parents present, no sequence collision, and op
    /// ids that are new and greater than every op the change depends on.
    pub(crate) fn check(&self, change: &Change) -> Result<(), ChangeError> {
        if self.has(&change.hash()) {
            return Ok(());
        }
        if let Some(dependency) = change.deps().iter().find(|dep| !self.has(dep)) {
            return Err(ChangeError::MissingDependency {
                hash: change.hash(),
                dependency: *dependency,
            });
        }
        let existing = self.seqs.get(&(change.actor().clone(), change.seq()));
        if existing.is_some_and(|hash| *hash != change.hash()) {
            return Err(ChangeError::DuplicateSeq {
                actor: change.actor().clone(),
                seq: change.seq(),
            });
        }

        let causal_max = self.causal_max_op(change.deps());
        if change.start_op() <= causal_max {
            return Err(ChangeError::OpCounterConflict {
                hash: change.hash(),
                start_op: change.start_op(),
                counter: causal_max,
            });
        }
        let claimed = self
            .op_ranges
            .get(change.actor())
            .and_then(|ranges| ranges.range(..=change.max_op()).next_back());
        if let Some((&first, &last)) = claimed {
            if last >= change.start_op() {
                return Err(ChangeError::OpCounterConflict {
                    hash: change.hash(),
                    start_op: change.start_op(),
                    counter: first.max(change.start_op()),
                });
            }
        }
        Ok(())
    }

    /// Highest op counter among `deps` and their ancestors, or 0 for no deps.
    fn causal_max_op(&self, deps: &[ChangeHash]) -> u64 {
        deps.iter()
            .filter_map(|dep| self.op_clock.get(dep))
            .copied()
            .max()
            .unwrap_or(0)
    }

    /// Append a change that passed [`check`](Self::check).
    pub(crate) fn insert(&mut self, change: Change) {
        let hash = change.hash();
        if self.has(&hash) {
            return;
        }
        for dep in change.deps() {
            self.heads.remove(dep);
        }
        self.heads.insert(hash);
        self.seqs.insert((change.actor().clone(), change.seq()), hash);
        let max = self.max_seq.entry(change.actor().clone()).or_insert(0);
        *max = (*max).max(change.seq());
        let clock = self.causal_max_op(change.deps()).max(change.max_op());
        self.op_clock.insert(hash, clock);
        self.op_ranges
            .entry(change.actor().clone())
            .or_default()
            .insert(change.start_op(), change.max_op());
        self.index.insert(hash, self.changes.len());
        self.changes.push(change);
    }

    /// Hold a change until its parents arrive.
    pub(crate) fn enqueue(&mut self, change: Change) {
        if self.has(&change.hash()) || self.queue.iter().any(|c| c.hash() == change.hash()) {
            return;
        }
        warn!(
            hash = %change.hash(),
            missing = change.deps().iter().filter(|d| !self.has(d)).count(),
            "Deferring change with missing dependencies"
        );
        self.queue.push(change);
    }

    /// Take the next queued change whose parents are now all present.
    pub(crate) fn pop_ready(&mut self) -> Option<Change> {
        self.queue.retain(|c| !self.index.contains_key(&c.hash()));
        let pos = self.queue.iter().position(|c| self.is_ready(c))?;
        Some(self.queue.remove(pos))
    }

    #[cfg(test)]
    pub(crate) fn queued(&self) -> &[Change] {
        &self.queue
    }

    /// Hashes we need but do not have: unknown entries of `heads` plus the missing parents of
    /// queued changes.
    pub(crate) fn missing_deps(&self, heads: &[ChangeHash]) -> Vec<ChangeHash> {
        let in_queue: BTreeSet<ChangeHash> = self.queue.iter().map(Change::hash).collect();
        let mut missing: BTreeSet<ChangeHash> = self
            .queue
            .iter()
            .flat_map(|c| c.deps().iter().copied())
            .filter(|dep| !self.has(dep) && !in_queue.contains(dep))
            .collect();
        missing.extend(
            heads
                .iter()
                .filter(|h| !self.has(h) && !in_queue.contains(h))
                .copied(),
        );
        missing.into_iter().collect()
    }
}
