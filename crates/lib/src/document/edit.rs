//! Local edits.
//!
//! Every method records into the implicit transaction, opening it if needed. A failed call
//! records nothing.

use super::{Document, new_transaction};
use crate::{
    Result,
    crdt::{CRDTError, ExpandMark, ObjId, ObjType, ObjectStore, Prop, ScalarValue, ValueTree},
    transaction::Transaction,
};

impl Document {
    fn edit<T>(
        &mut self,
        f: impl FnOnce(&mut Transaction, &mut ObjectStore) -> std::result::Result<T, CRDTError>,
    ) -> Result<T> {
        let Document {
            actor,
            history,
            store,
            tx,
            ..
        } = self;
        let tx = tx.get_or_insert_with(|| new_transaction(actor, history, store));
        Ok(f(tx, store)?)
    }

    /// Write a scalar to a map key or an existing list element.
    pub fn put(
        &mut self,
        obj: &ObjId,
        prop: impl Into<Prop>,
        value: impl Into<ScalarValue>,
    ) -> Result<()> {
        let (prop, value) = (prop.into(), value.into());
        self.edit(|tx, store| tx.put(store, obj, prop, value))
    }

    /// Create an empty nested object at a map key or existing list element.
    pub fn put_object(
        &mut self,
        obj: &ObjId,
        prop: impl Into<Prop>,
        obj_type: ObjType,
    ) -> Result<ObjId> {
        let prop = prop.into();
        self.edit(|tx, store| tx.put_object(store, obj, prop, obj_type))
    }

    /// Insert a scalar into a list so that it ends up at `index`.
    pub fn insert(
        &mut self,
        obj: &ObjId,
        index: usize,
        value: impl Into<ScalarValue>,
    ) -> Result<()> {
        let value = value.into();
        self.edit(|tx, store| tx.insert(store, obj, index, value))
    }

    /// Insert an empty nested object into a list at `index`.
    pub fn insert_object(&mut self, obj: &ObjId, index: usize, obj_type: ObjType) -> Result<ObjId> {
        self.edit(|tx, store| tx.insert_object(store, obj, index, obj_type))
    }

    /// Remove a map key or list element. Removing an absent key is not an error.
    pub fn delete(&mut self, obj: &ObjId, prop: impl Into<Prop>) -> Result<()> {
        let prop = prop.into();
        self.edit(|tx, store| tx.delete(store, obj, prop))
    }

    /// Add `by` (possibly negative) to a counter.
    pub fn increment(&mut self, obj: &ObjId, prop: impl Into<Prop>, by: i64) -> Result<()> {
        let prop = prop.into();
        self.edit(|tx, store| tx.increment(store, obj, prop, by))
    }

    /// Delete `del` elements of a list at `pos` and insert `values` in their place.
    pub fn splice(
        &mut self,
        obj: &ObjId,
        pos: usize,
        del: usize,
        values: impl IntoIterator<Item = ScalarValue>,
    ) -> Result<()> {
        let values = values.into_iter().collect();
        self.edit(|tx, store| tx.splice(store, obj, pos, del, values))
    }

    /// Delete `del` characters of a text object at `pos` and insert `text` in their place.
    pub fn splice_text(&mut self, obj: &ObjId, pos: usize, del: usize, text: &str) -> Result<()> {
        self.edit(|tx, store| tx.splice_text(store, obj, pos, del, text))
    }

    /// Annotate `[start, end)` of a text object with `name = value`.
    ///
    /// `expand` decides whether text later inserted exactly at either boundary joins the mark.
    pub fn mark(
        &mut self,
        obj: &ObjId,
        start: usize,
        end: usize,
        name: &str,
        value: impl Into<ScalarValue>,
        expand: ExpandMark,
    ) -> Result<()> {
        let value = value.into();
        self.edit(|tx, store| tx.mark(store, obj, start, end, name, value, expand))
    }

    /// Remove the mark `name` from `[start, end)`.
    pub fn unmark(
        &mut self,
        obj: &ObjId,
        start: usize,
        end: usize,
        name: &str,
        expand: ExpandMark,
    ) -> Result<()> {
        self.edit(|tx, store| tx.mark(store, obj, start, end, name, ScalarValue::Null, expand))
    }

    /// Write a whole value tree at `prop`, creating nested objects as needed.
    ///
    /// Returns the id of the outermost object created, or `None` for a scalar.
    pub fn put_tree(
        &mut self,
        obj: &ObjId,
        prop: impl Into<Prop>,
        tree: ValueTree,
    ) -> Result<Option<ObjId>> {
        let prop = prop.into();
        let (obj_type, tree) = match tree {
            ValueTree::Scalar(value) => {
                self.put(obj, prop, value)?;
                return Ok(None);
            }
            tree => (tree_type(&tree), tree),
        };
        let child = self.put_object(obj, prop, obj_type)?;
        self.fill(&child, tree)?;
        Ok(Some(child))
    }

    /// Insert a whole value tree into a list at `index`.
    pub fn insert_tree(
        &mut self,
        obj: &ObjId,
        index: usize,
        tree: ValueTree,
    ) -> Result<Option<ObjId>> {
        let (obj_type, tree) = match tree {
            ValueTree::Scalar(value) => {
                self.insert(obj, index, value)?;
                return Ok(None);
            }
            tree => (tree_type(&tree), tree),
        };
        let child = self.insert_object(obj, index, obj_type)?;
        self.fill(&child, tree)?;
        Ok(Some(child))
    }

    /// Populate a freshly created object with the contents of `tree`.
    fn fill(&mut self, obj: &ObjId, tree: ValueTree) -> Result<()> {
        match tree {
            ValueTree::Scalar(_) => {}
            ValueTree::Map(entries) => {
                for (key, value) in entries {
                    self.put_tree(obj, key, value)?;
                }
            }
            ValueTree::List(items) => {
                for (index, item) in items.into_iter().enumerate() {
                    self.insert_tree(obj, index, item)?;
                }
            }
            ValueTree::Text(text) => self.splice_text(obj, 0, 0, &text)?,
        }
        Ok(())
    }
}

fn tree_type(tree: &ValueTree) -> ObjType {
    match tree {
        ValueTree::List(_) => ObjType::List,
        ValueTree::Text(_) => ObjType::Text,
        ValueTree::Map(_) | ValueTree::Scalar(_) => ObjType::Map,
    }
}
