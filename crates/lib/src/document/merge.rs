//! Importing changes from other replicas, and forking.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::Document;
use crate::{
    Result,
    change::{Change, ChangeError, ChangeHash},
    crdt::ObjectStore,
    history::ChangeGraph,
};

impl Document {
    /// Apply changes received from elsewhere, in any order.
    ///
    /// Changes already present are skipped. Changes whose parents are missing wait in a queue
    /// and are applied as soon as the parents arrive; see
    /// [`get_missing_deps`](Self::get_missing_deps). Pending local edits are committed first.
    ///
    /// A change that contradicts the history it extends is rejected with
    /// [`ChangeError::InvalidChange`]; changes applied before it in the same call stay applied.
    pub fn apply_changes(&mut self, changes: impl IntoIterator<Item = Change>) -> Result<()> {
        self.commit()?;
        for change in changes {
            if self.history.has(&change.hash()) {
                continue;
            }
            if self.history.is_ready(&change) {
                self.apply_change(change)?;
                self.apply_ready()?;
            } else {
                self.history.enqueue(change);
            }
        }
        Ok(())
    }

    /// Apply one change whose parents are all present.
    pub(super) fn apply_change(&mut self, change: Change) -> Result<()> {
        self.history.check(&change)?;
        let hash = change.hash();
        if let Err(err) = self.store.apply_change(&change) {
            warn!(%hash, error = %err, "Rejected change");
            self.rebuild()?;
            return Err(ChangeError::InvalidChange {
                hash,
                reason: err.to_string(),
            }
            .into());
        }
        debug!(
            %hash,
            actor = %change.actor(),
            seq = change.seq(),
            ops = change.len(),
            "Applied change"
        );
        self.history.insert(change);
        Ok(())
    }

    /// Apply queued changes until none is ready.
    fn apply_ready(&mut self) -> Result<()> {
        while let Some(change) = self.history.pop_ready() {
            self.apply_change(change)?;
        }
        Ok(())
    }

    /// Import every change of `other` that this document lacks.
    ///
    /// Both documents commit their pending edits first. Nothing is imported unless every
    /// imported change's parents resolve, either here or among the imported changes. Merging is
    /// commutative, associative and idempotent: replicas that have merged the same set of changes
    /// have identical state.
    ///
    /// Returns the new heads, or an empty list if there was nothing to import.
    pub fn merge(&mut self, other: &mut Document) -> Result<Vec<ChangeHash>> {
        self.commit()?;
        other.commit()?;

        if self.history.contains_all(&self.heads(), &other.heads()) {
            return Ok(Vec::new());
        }
        let incoming: Vec<Change> = other
            .history
            .iter()
            .filter(|c| !self.history.has(&c.hash()))
            .cloned()
            .collect();

        let incoming_hashes: HashSet<ChangeHash> = incoming.iter().map(Change::hash).collect();
        for change in &incoming {
            let missing = change
                .deps()
                .iter()
                .find(|dep| !self.history.has(dep) && !incoming_hashes.contains(*dep));
            if let Some(dependency) = missing {
                return Err(ChangeError::MissingDependency {
                    hash: change.hash(),
                    dependency: *dependency,
                }
                .into());
            }
        }

        debug!(
            changes = incoming.len(),
            from = %other.actor,
            "Merging document"
        );
        for change in incoming {
            self.apply_change(change)?;
        }
        self.apply_ready()?;
        Ok(self.heads())
    }

    /// An independent copy of this document with a new random actor id.
    ///
    /// Pending edits are committed first so the fork sees them.
    pub fn fork(&mut self) -> Result<Document> {
        self.commit()?;
        Ok(self.derive(self.history.clone(), self.store.clone()))
    }

    /// An independent copy of this document as it was at `heads`, with a new random actor id.
    pub fn fork_at(&mut self, heads: &[ChangeHash]) -> Result<Document> {
        self.commit()?;
        let changes = self.history.changes_at(heads)?;
        let mut history = ChangeGraph::new();
        let mut store = ObjectStore::new();
        for change in changes {
            store.apply_change(change)?;
            history.insert(change.clone());
        }
        debug!(changes = history.len(), "Forked document at historical heads");
        Ok(self.derive(history, store))
    }
}
