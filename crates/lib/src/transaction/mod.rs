//! Pending local edits.
//!
//! A [`Transaction`] records the operations a document makes between commits. Each operation is
//! applied to the live [`ObjectStore`] the moment it is recorded, so reads observe uncommitted
//! edits, and the recorded ops become a single [`Change`] on commit.
//!
//! Op ids are implied by position: the n-th op recorded has counter `start_op + n` and the
//! transaction's actor.
//!
//! Every method validates its arguments against the current store before recording anything. A
//! failed call leaves both the transaction and the store as they were; operations recorded by
//! earlier calls stay in place.

use crate::{
    actor::ActorId,
    change::{Change, ChangeError, ChangeHash},
    crdt::{
        CRDTError, ExpandMark, ObjId, ObjType, ObjectStore, Prop, ScalarValue,
        marks::MarkData,
        op::{ElemId, Key, Op, OpAction, OpId},
        slot::Slot,
        store::{ObjectData, type_mismatch},
    },
};

#[derive(Debug, Clone)]
pub(crate) struct Transaction {
    actor: ActorId,
    seq: u64,
    start_op: u64,
    /// Heads when the transaction opened
    deps: Vec<ChangeHash>,
    ops: Vec<Op>,
}

impl Transaction {
    pub(crate) fn new(actor: ActorId, seq: u64, start_op: u64, deps: Vec<ChangeHash>) -> Self {
        Self {
            actor,
            seq,
            start_op,
            deps,
            ops: Vec::new(),
        }
    }

    /// Number of operations recorded so far.
    pub(crate) fn len(&self) -> usize {
        self.ops.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }

    fn next_id(&self) -> OpId {
        OpId::new(self.start_op + self.ops.len() as u64, self.actor.clone())
    }

    /// Apply `op` to the store and, if it was accepted, record it.
    fn record(&mut self, store: &mut ObjectStore, op: Op) -> Result<OpId, CRDTError> {
        let id = self.next_id();
        store.apply_op(id.clone(), &op)?;
        self.ops.push(op);
        Ok(id)
    }

    pub(crate) fn put(
        &mut self,
        store: &mut ObjectStore,
        obj: &ObjId,
        prop: Prop,
        value: ScalarValue,
    ) -> Result<(), CRDTError> {
        let (key, slot) = target(store, obj, &prop, "put")?;
        let pred = slot.map(Slot::visible_ids).unwrap_or_default();
        self.record(
            store,
            Op {
                obj: obj.clone(),
                key,
                insert: false,
                action: OpAction::Put(value),
                pred,
            },
        )?;
        Ok(())
    }

    pub(crate) fn put_object(
        &mut self,
        store: &mut ObjectStore,
        obj: &ObjId,
        prop: Prop,
        obj_type: ObjType,
    ) -> Result<ObjId, CRDTError> {
        let (key, slot) = target(store, obj, &prop, "put_object")?;
        let pred = slot.map(Slot::visible_ids).unwrap_or_default();
        let id = self.record(
            store,
            Op {
                obj: obj.clone(),
                key,
                insert: false,
                action: OpAction::MakeObject(obj_type),
                pred,
            },
        )?;
        Ok(ObjId::Id(id))
    }

    pub(crate) fn insert(
        &mut self,
        store: &mut ObjectStore,
        obj: &ObjId,
        index: usize,
        value: ScalarValue,
    ) -> Result<(), CRDTError> {
        let key = insertion_point(store, obj, index, "insert")?;
        self.record(
            store,
            Op {
                obj: obj.clone(),
                key,
                insert: true,
                action: OpAction::Put(value),
                pred: Vec::new(),
            },
        )?;
        Ok(())
    }

    pub(crate) fn insert_object(
        &mut self,
        store: &mut ObjectStore,
        obj: &ObjId,
        index: usize,
        obj_type: ObjType,
    ) -> Result<ObjId, CRDTError> {
        let key = insertion_point(store, obj, index, "insert_object")?;
        let id = self.record(
            store,
            Op {
                obj: obj.clone(),
                key,
                insert: true,
                action: OpAction::MakeObject(obj_type),
                pred: Vec::new(),
            },
        )?;
        Ok(ObjId::Id(id))
    }

    /// Delete a map key or list element. Deleting an absent map key does nothing.
    pub(crate) fn delete(
        &mut self,
        store: &mut ObjectStore,
        obj: &ObjId,
        prop: Prop,
    ) -> Result<(), CRDTError> {
        let (key, slot) = target(store, obj, &prop, "delete")?;
        let pred = slot.map(Slot::visible_ids).unwrap_or_default();
        if pred.is_empty() {
            return Ok(());
        }
        self.record(
            store,
            Op {
                obj: obj.clone(),
                key,
                insert: false,
                action: OpAction::Delete,
                pred,
            },
        )?;
        Ok(())
    }

    /// Add `by` to the counter at `prop`.
    pub(crate) fn increment(
        &mut self,
        store: &mut ObjectStore,
        obj: &ObjId,
        prop: Prop,
        by: i64,
    ) -> Result<(), CRDTError> {
        let (key, slot) = target(store, obj, &prop, "increment")?;
        let Some((slot, winner)) = slot.and_then(|s| s.winner().map(|w| (s, w))) else {
            return Err(CRDTError::KeyNotFound {
                operation: "increment".to_string(),
                obj: obj.to_string(),
                key: prop.to_string(),
            });
        };
        if !winner.is_counter() {
            return Err(type_mismatch("increment", obj, "counter", winner.type_name()));
        }
        let pred = slot.visible_counter_ids();
        self.record(
            store,
            Op {
                obj: obj.clone(),
                key,
                insert: false,
                action: OpAction::Increment(by),
                pred,
            },
        )?;
        Ok(())
    }

    /// Delete `del` elements at `pos` of a list or text object, then insert `values` there.
    pub(crate) fn splice(
        &mut self,
        store: &mut ObjectStore,
        obj: &ObjId,
        pos: usize,
        del: usize,
        values: Vec<ScalarValue>,
    ) -> Result<(), CRDTError> {
        let obj_type = store.require(obj, "splice")?.obj_type;
        let len = store.require_seq(obj, "splice")?.len();
        if pos > len || del > len - pos {
            return Err(CRDTError::IndexOutOfBounds {
                operation: "splice".to_string(),
                obj: obj.to_string(),
                index: pos.saturating_add(del),
                len,
            });
        }
        for value in &values {
            value.validate()?;
            if obj_type == ObjType::Text && value.as_str().is_none() {
                return Err(type_mismatch("splice", obj, "str", value.type_name()));
            }
        }

        for _ in 0..del {
            self.delete(store, obj, Prop::Seq(pos))?;
        }
        for (offset, value) in values.into_iter().enumerate() {
            self.insert(store, obj, pos + offset, value)?;
        }
        Ok(())
    }

    /// Replace `del` characters at `pos` of a text object with `text`.
    pub(crate) fn splice_text(
        &mut self,
        store: &mut ObjectStore,
        obj: &ObjId,
        pos: usize,
        del: usize,
        text: &str,
    ) -> Result<(), CRDTError> {
        let obj_type = store.require(obj, "splice_text")?.obj_type;
        if obj_type != ObjType::Text {
            return Err(type_mismatch(
                "splice_text",
                obj,
                "text",
                &obj_type.to_string(),
            ));
        }
        let values = text.chars().map(ScalarValue::from).collect();
        self.splice(store, obj, pos, del, values)
    }

    /// Annotate `[start, end)` of a text object. A null `value` removes the mark from the range.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn mark(
        &mut self,
        store: &mut ObjectStore,
        obj: &ObjId,
        start: usize,
        end: usize,
        name: &str,
        value: ScalarValue,
        expand: ExpandMark,
    ) -> Result<(), CRDTError> {
        let state = store.require(obj, "mark")?;
        let seq = match (&state.data, state.obj_type) {
            (ObjectData::Seq(seq), ObjType::Text) => seq,
            _ => {
                return Err(type_mismatch(
                    "mark",
                    obj,
                    "text",
                    &state.obj_type.to_string(),
                ));
            }
        };
        if end <= start {
            return Err(CRDTError::InvalidMark {
                obj: obj.to_string(),
                reason: format!("empty range [{start}, {end})"),
            });
        }
        if end > seq.len() {
            return Err(CRDTError::InvalidMark {
                obj: obj.to_string(),
                reason: format!("range [{start}, {end}) exceeds length {}", seq.len()),
            });
        }
        value.validate()?;
        let (start_anchor, end_anchor) = MarkData::anchor(seq, start, end, expand).ok_or_else(
            || CRDTError::InvalidMark {
                obj: obj.to_string(),
                reason: format!("cannot anchor [{start}, {end})"),
            },
        )?;

        self.record(
            store,
            Op {
                obj: obj.clone(),
                key: Key::Map(name.to_string()),
                insert: false,
                action: OpAction::Mark(MarkData {
                    name: name.to_string(),
                    value,
                    start: start_anchor,
                    end: end_anchor,
                    expand,
                }),
                pred: Vec::new(),
            },
        )?;
        Ok(())
    }

    /// Seal the recorded operations into a change.
    pub(crate) fn into_change(
        self,
        message: Option<String>,
        time: i64,
    ) -> Result<Change, ChangeError> {
        let mut builder = Change::builder(self.actor, self.seq, self.start_op)
            .deps(self.deps)
            .time(time);
        builder.message_mut(message).extend_ops_mut(self.ops);
        builder.build()
    }
}

/// Resolve `prop` to the key an operation writes and the slot currently there.
///
/// A map key that was never written has no slot. A list index must name a visible element.
fn target<'a>(
    store: &'a ObjectStore,
    obj: &ObjId,
    prop: &Prop,
    operation: &str,
) -> Result<(Key, Option<&'a Slot>), CRDTError> {
    let state = store.require(obj, operation)?;
    match (&state.data, prop) {
        (ObjectData::Map(map), Prop::Map(key)) => Ok((Key::Map(key.clone()), map.get(key))),
        (ObjectData::Seq(_), Prop::Seq(index)) => {
            let element = store.require_element(obj, *index, operation)?;
            Ok((
                Key::Seq(ElemId::Id(element.id.clone())),
                Some(&element.slot),
            ))
        }
        _ => Err(CRDTError::InvalidProp {
            operation: operation.to_string(),
            obj: obj.to_string(),
            prop: prop.to_string(),
        }),
    }
}

/// The element a new element at `index` goes after.
fn insertion_point(
    store: &ObjectStore,
    obj: &ObjId,
    index: usize,
    operation: &str,
) -> Result<Key, CRDTError> {
    let seq = store.require_seq(obj, operation)?;
    if index == 0 {
        return Ok(Key::Seq(ElemId::Head));
    }
    let prev = seq
        .nth(index - 1)
        .ok_or_else(|| CRDTError::IndexOutOfBounds {
            operation: operation.to_string(),
            obj: obj.to_string(),
            index,
            len: seq.len(),
        })?;
    Ok(Key::Seq(ElemId::Id(prev.id.clone())))
}
