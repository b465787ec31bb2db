//! Ancestry queries over the change DAG.
//!
//! Walks parent references breadth-first from a set of heads. Used to compute which changes a
//! peer lacks, to slice history for forks and historical views, and to check whether one set of
//! heads is already contained in another.

use std::collections::{HashSet, VecDeque};

use super::ChangeGraph;
use crate::change::{Change, ChangeError, ChangeHash};

impl ChangeGraph {
    /// Every change reachable from `heads`, the heads included. Unknown hashes are skipped.
    pub(crate) fn ancestors(&self, heads: &[ChangeHash]) -> HashSet<ChangeHash> {
        let mut seen = HashSet::new();
        let mut queue: VecDeque<ChangeHash> =
            heads.iter().filter(|h| self.has(h)).copied().collect();

        while let Some(hash) = queue.pop_front() {
            if !seen.insert(hash) {
                continue;
            }
            if let Some(change) = self.get(&hash) {
                queue.extend(change.deps().iter().filter(|d| !seen.contains(*d)).copied());
            }
        }
        seen
    }

    /// Changes not reachable from `since`, in causal order.
    ///
    /// Hashes in `since` that this graph does not know are ignored, so a peer's heads can be
    /// passed as-is.
    pub(crate) fn changes_since(&self, since: &[ChangeHash]) -> Vec<&Change> {
        let known = self.ancestors(since);
        self.changes
            .iter()
            .filter(|c| !known.contains(&c.hash()))
            .collect()
    }

    /// The history up to and including `heads`, in causal order.
    ///
    /// Fails if any of `heads` is unknown.
    pub(crate) fn changes_at(&self, heads: &[ChangeHash]) -> Result<Vec<&Change>, ChangeError> {
        if let Some(unknown) = heads.iter().find(|h| !self.has(h)) {
            return Err(ChangeError::UnknownHash { hash: *unknown });
        }
        let reachable = self.ancestors(heads);
        Ok(self
            .changes
            .iter()
            .filter(|c| reachable.contains(&c.hash()))
            .collect())
    }

    /// Whether every change reachable from `heads` is also reachable from `from`.
    pub(crate) fn contains_all(&self, from: &[ChangeHash], heads: &[ChangeHash]) -> bool {
        let known = self.ancestors(from);
        heads.iter().all(|h| known.contains(h))
    }
}
