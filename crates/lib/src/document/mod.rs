//! The document handle applications edit.
//!
//! A [`Document`] owns a replica's change history and the [`ObjectStore`] materialized from it,
//! plus an implicit transaction that collects local edits until the next commit. Reads always
//! reflect pending edits. History operations (merging, applying remote changes, saving, sync)
//! commit pending edits first, so they only ever see sealed changes.
//!
//! The history is the source of truth. Whenever a mutation fails part way, or a transaction is
//! rolled back, the store is rebuilt from the history rather than patched.

mod edit;
mod merge;
mod persist;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    Result,
    actor::ActorId,
    change::{Change, ChangeHash},
    clock::{Clock, SystemClock},
    crdt::{Cursor, Mark, ObjId, ObjType, ObjectStore, Prop, Value},
    history::ChangeGraph,
    transaction::Transaction,
};

/// A replica of a replicated document.
///
/// ```
/// use quilt::{Document, ObjType, ROOT};
///
/// let mut doc = Document::new();
/// let list = doc.put_object(&ROOT, "todo", ObjType::List).unwrap();
/// doc.insert(&list, 0, "write docs").unwrap();
/// doc.commit().unwrap();
///
/// assert_eq!(doc.length(&list), 1);
/// assert_eq!(doc.heads().len(), 1);
/// ```
#[derive(Debug)]
pub struct Document {
    actor: ActorId,
    pub(crate) history: ChangeGraph,
    store: ObjectStore,
    tx: Option<Transaction>,
    clock: Arc<dyn Clock>,
    /// History length at the last save, for incremental saves
    saved_len: usize,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document with a random actor id.
    pub fn new() -> Self {
        Self::with_actor(ActorId::random())
    }

    /// An empty document that records edits as `actor`.
    pub fn with_actor(actor: ActorId) -> Self {
        Self {
            actor,
            history: ChangeGraph::new(),
            store: ObjectStore::new(),
            tx: None,
            clock: Arc::new(SystemClock),
            saved_len: 0,
        }
    }

    /// An empty document with a random actor id that timestamps commits with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            ..Self::new()
        }
    }

    /// A document sharing this one's history and clock under a fresh actor.
    fn derive(&self, history: ChangeGraph, store: ObjectStore) -> Self {
        Self {
            actor: ActorId::random(),
            history,
            store,
            tx: None,
            clock: Arc::clone(&self.clock),
            saved_len: 0,
        }
    }

    pub fn get_actor(&self) -> &ActorId {
        &self.actor
    }

    /// Change the actor future edits are recorded as. Pending edits are committed first under
    /// the old actor.
    pub fn set_actor(&mut self, actor: ActorId) -> Result<()> {
        self.commit()?;
        self.actor = actor;
        Ok(())
    }

    /// Open the implicit transaction if none is open.
    ///
    /// Write methods call this themselves; calling it explicitly only pins the transaction's
    /// parents to the current heads.
    pub fn begin(&mut self) {
        if self.tx.is_none() {
            self.tx = Some(new_transaction(&self.actor, &self.history, &self.store));
        }
    }

    /// Number of edits waiting for the next commit.
    pub fn pending_ops(&self) -> usize {
        self.tx.as_ref().map_or(0, Transaction::len)
    }

    /// Seal pending edits into a change, timestamped by the document's clock.
    ///
    /// Returns the new change's hash, or `None` if there was nothing to commit.
    pub fn commit(&mut self) -> Result<Option<ChangeHash>> {
        self.commit_with(None, None)
    }

    /// Seal pending edits into a change with an optional message and timestamp (milliseconds
    /// since the Unix epoch).
    pub fn commit_with(
        &mut self,
        message: Option<String>,
        time: Option<i64>,
    ) -> Result<Option<ChangeHash>> {
        let Some(tx) = self.tx.take() else {
            return Ok(None);
        };
        if tx.is_empty() {
            return Ok(None);
        }
        let seq = tx.seq();
        let ops = tx.len();
        let time = time
            .unwrap_or_else(|| i64::try_from(self.clock.now_millis()).unwrap_or(i64::MAX));

        let change = match tx.into_change(message, time) {
            Ok(change) => change,
            Err(err) => {
                warn!(error = %err, "Commit failed, discarding pending edits");
                self.rebuild()?;
                return Err(err.into());
            }
        };
        if let Err(err) = self.history.check(&change) {
            warn!(error = %err, "Commit failed, discarding pending edits");
            self.rebuild()?;
            return Err(err.into());
        }

        let hash = change.hash();
        debug!(%hash, actor = %self.actor, seq, ops, "Committed change");
        self.history.insert(change);
        Ok(Some(hash))
    }

    /// Discard pending edits, returning how many were dropped.
    pub fn rollback(&mut self) -> Result<usize> {
        let Some(tx) = self.tx.take() else {
            return Ok(0);
        };
        let dropped = tx.len();
        if dropped > 0 {
            self.rebuild()?;
            debug!(dropped, "Rolled back pending edits");
        }
        Ok(dropped)
    }

    /// Re-derive the store from history.
    fn rebuild(&mut self) -> Result<()> {
        self.tx = None;
        self.store = ObjectStore::from_changes(self.history.iter())?;
        Ok(())
    }

    /// The hashes of the changes no other change depends on, sorted.
    pub fn heads(&self) -> Vec<ChangeHash> {
        self.history.heads()
    }

    /// Changes not reachable from `since`, in causal order. An empty `since` returns the whole
    /// history.
    pub fn get_changes(&self, since: &[ChangeHash]) -> Vec<Change> {
        self.history
            .changes_since(since)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn get_change_by_hash(&self, hash: &ChangeHash) -> Option<&Change> {
        self.history.get(hash)
    }

    /// The most recent committed change made by this document's actor.
    pub fn get_last_local_change(&self) -> Option<&Change> {
        self.history.last_by(&self.actor)
    }

    /// Hashes this document lacks: unknown entries of `heads` and the missing parents of changes
    /// waiting in the queue.
    pub fn get_missing_deps(&self, heads: &[ChangeHash]) -> Vec<ChangeHash> {
        self.history.missing_deps(heads)
    }

    /// Number of changes in the history.
    pub fn change_count(&self) -> usize {
        self.history.len()
    }

    /// A read-only view of the document as of `heads`.
    ///
    /// Pending edits are not part of any historical state.
    pub fn at(&self, heads: &[ChangeHash]) -> Result<ObjectStore> {
        let changes = self.history.changes_at(heads)?;
        Ok(ObjectStore::from_changes(changes)?)
    }

    /// The live store, including pending edits.
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn object_type(&self, obj: &ObjId) -> Option<ObjType> {
        self.store.object_type(obj)
    }

    /// The winning value at `prop`. See [`ObjectStore::get`].
    pub fn get(&self, obj: &ObjId, prop: impl Into<Prop>) -> Result<Option<Value>> {
        Ok(self.store.get(obj, prop)?)
    }

    /// Every concurrently visible value at `prop`, winner last.
    pub fn get_all(&self, obj: &ObjId, prop: impl Into<Prop>) -> Result<Vec<Value>> {
        Ok(self.store.get_all(obj, prop)?)
    }

    pub fn keys(&self, obj: &ObjId) -> Vec<String> {
        self.store.keys(obj)
    }

    pub fn length(&self, obj: &ObjId) -> usize {
        self.store.length(obj)
    }

    pub fn values(&self, obj: &ObjId) -> Vec<Value> {
        self.store.values(obj)
    }

    pub fn text(&self, obj: &ObjId) -> Result<String> {
        Ok(self.store.text(obj)?)
    }

    pub fn marks(&self, obj: &ObjId) -> Vec<Mark> {
        self.store.marks(obj)
    }

    pub fn marks_at(&self, obj: &ObjId, pos: usize) -> Vec<Mark> {
        self.store.marks_at(obj, pos)
    }

    /// A cursor at the element currently at `pos`. It follows that element through later edits.
    pub fn cursor(&self, obj: &ObjId, pos: usize) -> Result<Cursor> {
        Ok(self.store.cursor(obj, pos)?)
    }

    /// The current index of a cursor's element. Fails if the element has been deleted.
    pub fn cursor_position(&self, obj: &ObjId, cursor: &Cursor) -> Result<usize> {
        Ok(self.store.cursor_position(obj, cursor)?)
    }

    /// Render an object and everything beneath it as JSON.
    pub fn to_json(&self, obj: &ObjId) -> serde_json::Value {
        self.store.to_json(obj)
    }

    /// [`to_json`](Self::to_json), pretty-printed.
    pub fn to_json_string(&self, obj: &ObjId) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_json(obj))?)
    }
}

/// A transaction extending the current heads.
fn new_transaction(actor: &ActorId, history: &ChangeGraph, store: &ObjectStore) -> Transaction {
    Transaction::new(
        actor.clone(),
        history.max_seq(actor) + 1,
        store.max_op() + 1,
        history.heads(),
    )
}
