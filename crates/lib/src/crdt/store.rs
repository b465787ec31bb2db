//! The materialized object tree.
//!
//! [`ObjectStore`] holds the visible state derived from replaying operations: the root map and
//! every nested map, list and text object. The change log stays the source of truth; a store can
//! always be rebuilt from it with [`ObjectStore::from_changes`], which is how failed mutations and
//! rollbacks are undone and how historical views are produced.

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use super::{
    CRDTError,
    cursor::Cursor,
    marks::{Mark, MarkOp, resolve_marks},
    op::{ElemId, Key, ObjId, Op, OpAction, OpId, Prop},
    sequence::{Element, Sequence},
    slot::{Slot, SlotOp, SlotValue},
    value::{ObjType, Value},
};
use crate::change::Change;

#[derive(Debug, Clone)]
pub(crate) enum ObjectData {
    Map(BTreeMap<String, Slot>),
    Seq(Sequence),
}

#[derive(Debug, Clone)]
pub(crate) struct ObjectState {
    pub(crate) obj_type: ObjType,
    pub(crate) data: ObjectData,
    /// Mark ops, ordered by id
    pub(crate) marks: Vec<MarkOp>,
}

impl ObjectState {
    fn new(obj_type: ObjType) -> Self {
        let data = match obj_type {
            ObjType::Map => ObjectData::Map(BTreeMap::new()),
            ObjType::List | ObjType::Text => ObjectData::Seq(Sequence::default()),
        };
        Self {
            obj_type,
            data,
            marks: Vec::new(),
        }
    }
}

/// Visible state of a document, materialized from its operations.
///
/// Reads are forgiving: an unknown object, an absent key or an index past the end yields an
/// empty result rather than an error. Only using the wrong kind of property (an index on a map,
/// a key on a list) is rejected.
///
/// A store is returned by [`Document::at`](crate::Document::at) as a read-only view of a
/// historical state.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    objects: HashMap<ObjId, ObjectState>,
    max_op: u64,
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore {
    /// An empty store holding only the root map.
    pub fn new() -> Self {
        let mut objects = HashMap::new();
        objects.insert(ObjId::Root, ObjectState::new(ObjType::Map));
        Self {
            objects,
            max_op: 0,
        }
    }

    /// Replay `changes`, which must be in causal order.
    pub(crate) fn from_changes<'a>(
        changes: impl IntoIterator<Item = &'a Change>,
    ) -> Result<Self, CRDTError> {
        let mut store = Self::new();
        for change in changes {
            store.apply_change(change)?;
        }
        Ok(store)
    }

    /// Highest op counter applied so far.
    pub(crate) fn max_op(&self) -> u64 {
        self.max_op
    }

    pub(crate) fn apply_change(&mut self, change: &Change) -> Result<(), CRDTError> {
        for (id, op) in change.iter_ops() {
            self.apply_op(id, op)?;
        }
        Ok(())
    }

    /// Validate and apply one operation.
    ///
    /// Validation happens before any mutation, so a rejected op leaves the store untouched.
    pub(crate) fn apply_op(&mut self, id: OpId, op: &Op) -> Result<(), CRDTError> {
        self.check_op(op)?;
        trace!(op_id = %id, obj = %op.obj, action = op.action.name(), "Applying op");

        self.max_op = self.max_op.max(id.counter());
        if let OpAction::MakeObject(obj_type) = &op.action {
            self.objects
                .insert(ObjId::Id(id.clone()), ObjectState::new(*obj_type));
        }

        let state = self
            .objects
            .get_mut(&op.obj)
            .ok_or_else(|| not_found(op.action.name(), &op.obj))?;

        if let OpAction::Mark(data) = &op.action {
            let pos = state.marks.partition_point(|m| m.id < id);
            state.marks.insert(
                pos,
                MarkOp {
                    id,
                    data: data.clone(),
                },
            );
            return Ok(());
        }

        match (&mut state.data, &op.key) {
            (ObjectData::Map(map), Key::Map(key)) => {
                let slot = map.entry(key.clone()).or_default();
                apply_to_slot(slot, id, op);
            }
            (ObjectData::Seq(seq), Key::Seq(elem)) if op.insert => {
                let after = match elem {
                    ElemId::Head => None,
                    ElemId::Id(after) => Some(after),
                };
                let value = slot_value(&op.action).ok_or_else(|| invalid_op(op))?;
                let element = Element {
                    slot: Slot::with_op(id.clone(), value),
                    id,
                };
                seq.insert(after, element);
            }
            (ObjectData::Seq(seq), Key::Seq(ElemId::Id(elem))) => {
                let element = seq
                    .element_mut(elem)
                    .ok_or_else(|| elem_not_found(op, elem))?;
                apply_to_slot(&mut element.slot, id, op);
            }
            _ => return Err(invalid_op(op)),
        }
        Ok(())
    }

    fn check_op(&self, op: &Op) -> Result<(), CRDTError> {
        let operation = op.action.name();
        let state = self
            .objects
            .get(&op.obj)
            .ok_or_else(|| not_found(operation, &op.obj))?;

        match &op.action {
            OpAction::Put(value) => {
                value.validate()?;
                if state.obj_type == ObjType::Text && value.as_str().is_none() {
                    return Err(type_mismatch(operation, &op.obj, "str", value.type_name()));
                }
            }
            OpAction::MakeObject(obj_type) => {
                if state.obj_type == ObjType::Text {
                    return Err(type_mismatch(
                        operation,
                        &op.obj,
                        "str",
                        &obj_type.to_string(),
                    ));
                }
            }
            OpAction::Mark(data) => {
                let ObjectData::Seq(seq) = &state.data else {
                    return Err(type_mismatch(
                        operation,
                        &op.obj,
                        "text",
                        &state.obj_type.to_string(),
                    ));
                };
                if state.obj_type != ObjType::Text {
                    return Err(type_mismatch(
                        operation,
                        &op.obj,
                        "text",
                        &state.obj_type.to_string(),
                    ));
                }
                for elem in [data.start.element(), data.end.element()].into_iter().flatten() {
                    if !seq.contains(elem) {
                        return Err(elem_not_found(op, elem));
                    }
                }
                return Ok(());
            }
            OpAction::Increment(_) | OpAction::Delete => {
                if op.insert {
                    return Err(invalid_op(op));
                }
            }
        }

        match (&state.data, &op.key) {
            (ObjectData::Map(_), Key::Map(_)) if !op.insert => Ok(()),
            (ObjectData::Seq(_), Key::Seq(ElemId::Head)) if op.insert => Ok(()),
            (ObjectData::Seq(seq), Key::Seq(ElemId::Id(elem))) => {
                if seq.contains(elem) {
                    Ok(())
                } else {
                    Err(elem_not_found(op, elem))
                }
            }
            _ => Err(invalid_op(op)),
        }
    }

    pub(crate) fn state(&self, obj: &ObjId) -> Option<&ObjectState> {
        self.objects.get(obj)
    }

    /// The object, which a mutation requires to exist.
    pub(crate) fn require(&self, obj: &ObjId, operation: &str) -> Result<&ObjectState, CRDTError> {
        self.objects
            .get(obj)
            .ok_or_else(|| not_found(operation, obj))
    }

    /// The sequence behind a list or text object.
    pub(crate) fn require_seq(&self, obj: &ObjId, operation: &str) -> Result<&Sequence, CRDTError> {
        let state = self.require(obj, operation)?;
        match &state.data {
            ObjectData::Seq(seq) => Ok(seq),
            ObjectData::Map(_) => Err(type_mismatch(
                operation,
                obj,
                "list or text",
                &state.obj_type.to_string(),
            )),
        }
    }

    /// The visible element at `index`, which a mutation requires to exist.
    pub(crate) fn require_element(
        &self,
        obj: &ObjId,
        index: usize,
        operation: &str,
    ) -> Result<&Element, CRDTError> {
        let seq = self.require_seq(obj, operation)?;
        seq.nth(index).ok_or_else(|| CRDTError::IndexOutOfBounds {
            operation: operation.to_string(),
            obj: obj.to_string(),
            index,
            len: seq.len(),
        })
    }

    fn slot(&self, obj: &ObjId, prop: &Prop, operation: &str) -> Result<Option<&Slot>, CRDTError> {
        let Some(state) = self.objects.get(obj) else {
            return Ok(None);
        };
        match (&state.data, prop) {
            (ObjectData::Map(map), Prop::Map(key)) => Ok(map.get(key)),
            (ObjectData::Seq(seq), Prop::Seq(index)) => Ok(seq.nth(*index).map(|e| &e.slot)),
            _ => Err(CRDTError::InvalidProp {
                operation: operation.to_string(),
                obj: obj.to_string(),
                prop: prop.to_string(),
            }),
        }
    }

    /// The type of an object, or `None` if it does not exist.
    pub fn object_type(&self, obj: &ObjId) -> Option<ObjType> {
        self.objects.get(obj).map(|s| s.obj_type)
    }

    /// The winning value at `prop`, or `None` if there is none.
    pub fn get(&self, obj: &ObjId, prop: impl Into<Prop>) -> Result<Option<Value>, CRDTError> {
        let prop = prop.into();
        Ok(self
            .slot(obj, &prop, "get")?
            .and_then(Slot::winner)
            .map(SlotOp::value))
    }

    /// Every concurrently visible value at `prop`, ordered by op id so the winner comes last.
    pub fn get_all(&self, obj: &ObjId, prop: impl Into<Prop>) -> Result<Vec<Value>, CRDTError> {
        let prop = prop.into();
        Ok(self
            .slot(obj, &prop, "get_all")?
            .map(|slot| slot.visible().map(SlotOp::value).collect())
            .unwrap_or_default())
    }

    /// Visible keys of a map, in sorted order. Lists and text have no keys.
    pub fn keys(&self, obj: &ObjId) -> Vec<String> {
        match self.objects.get(obj).map(|s| &s.data) {
            Some(ObjectData::Map(map)) => map
                .iter()
                .filter(|(_, slot)| slot.is_visible())
                .map(|(key, _)| key.clone())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Number of visible keys or elements.
    pub fn length(&self, obj: &ObjId) -> usize {
        match self.objects.get(obj).map(|s| &s.data) {
            Some(ObjectData::Map(map)) => map.values().filter(|slot| slot.is_visible()).count(),
            Some(ObjectData::Seq(seq)) => seq.len(),
            None => 0,
        }
    }

    /// Winning values of a map in key order, or of a sequence in element order.
    pub fn values(&self, obj: &ObjId) -> Vec<Value> {
        match self.objects.get(obj).map(|s| &s.data) {
            Some(ObjectData::Map(map)) => map
                .values()
                .filter_map(Slot::winner)
                .map(SlotOp::value)
                .collect(),
            Some(ObjectData::Seq(seq)) => seq
                .visible()
                .filter_map(|e| e.slot.winner())
                .map(SlotOp::value)
                .collect(),
            None => Vec::new(),
        }
    }

    /// The content of a text object.
    pub fn text(&self, obj: &ObjId) -> Result<String, CRDTError> {
        let Some(state) = self.objects.get(obj) else {
            return Ok(String::new());
        };
        match (&state.data, state.obj_type) {
            (ObjectData::Seq(seq), ObjType::Text) => Ok(seq
                .visible()
                .filter_map(|e| e.slot.winner())
                .filter_map(|op| match &op.value {
                    SlotValue::Scalar(s) => s.as_str().map(str::to_string),
                    SlotValue::Object(_) => None,
                })
                .collect()),
            _ => Err(type_mismatch(
                "text",
                obj,
                "text",
                &state.obj_type.to_string(),
            )),
        }
    }

    /// All marks on a text object with ranges resolved against this state.
    pub fn marks(&self, obj: &ObjId) -> Vec<Mark> {
        match self.objects.get(obj) {
            Some(ObjectState {
                data: ObjectData::Seq(seq),
                marks,
                ..
            }) => resolve_marks(seq, marks),
            _ => Vec::new(),
        }
    }

    /// Marks whose range contains `pos`.
    pub fn marks_at(&self, obj: &ObjId, pos: usize) -> Vec<Mark> {
        self.marks(obj)
            .into_iter()
            .filter(|m| m.contains(pos))
            .collect()
    }

    /// Capture a cursor at the element currently at `pos`.
    pub fn cursor(&self, obj: &ObjId, pos: usize) -> Result<Cursor, CRDTError> {
        let element = self.require_element(obj, pos, "cursor")?;
        Ok(Cursor::new(element.id.clone()))
    }

    /// Resolve a cursor to the current index of its element.
    pub fn cursor_position(&self, obj: &ObjId, cursor: &Cursor) -> Result<usize, CRDTError> {
        let seq = self.require_seq(obj, "cursor_position")?;
        match seq.visible_index(cursor.elem()) {
            Some((index, true)) => Ok(index),
            _ => Err(CRDTError::CursorInvalidated {
                cursor: cursor.to_string(),
                obj: obj.to_string(),
            }),
        }
    }

    /// Render an object and everything beneath it as JSON.
    ///
    /// Counters and timestamps become numbers, byte strings become arrays of numbers and text
    /// objects become strings. An unknown object renders as `null`.
    pub fn to_json(&self, obj: &ObjId) -> serde_json::Value {
        let Some(state) = self.objects.get(obj) else {
            return serde_json::Value::Null;
        };
        match &state.data {
            ObjectData::Map(map) => serde_json::Value::Object(
                map.iter()
                    .filter_map(|(key, slot)| {
                        slot.winner()
                            .map(|op| (key.clone(), self.value_to_json(op.value())))
                    })
                    .collect(),
            ),
            ObjectData::Seq(_) if state.obj_type == ObjType::Text => {
                serde_json::Value::String(self.text(obj).unwrap_or_default())
            }
            ObjectData::Seq(seq) => serde_json::Value::Array(
                seq.visible()
                    .filter_map(|e| e.slot.winner())
                    .map(|op| self.value_to_json(op.value()))
                    .collect(),
            ),
        }
    }

    fn value_to_json(&self, value: Value) -> serde_json::Value {
        match value {
            Value::Scalar(s) => s.to_json(),
            Value::Object(_, id) => self.to_json(&id),
        }
    }
}

fn slot_value(action: &OpAction) -> Option<SlotValue> {
    match action {
        OpAction::Put(v) => Some(SlotValue::Scalar(v.clone())),
        OpAction::MakeObject(t) => Some(SlotValue::Object(*t)),
        _ => None,
    }
}

fn apply_to_slot(slot: &mut Slot, id: OpId, op: &Op) {
    match &op.action {
        OpAction::Increment(by) => slot.increment(*by, &op.pred),
        OpAction::Delete => slot.delete(&id, &op.pred),
        action => {
            if let Some(value) = slot_value(action) {
                slot.put(id, value, &op.pred);
            }
        }
    }
}

fn not_found(operation: &str, obj: &ObjId) -> CRDTError {
    CRDTError::ObjectNotFound {
        operation: operation.to_string(),
        obj: obj.to_string(),
    }
}

fn elem_not_found(op: &Op, elem: &OpId) -> CRDTError {
    CRDTError::ElementNotFound {
        operation: op.action.name().to_string(),
        obj: op.obj.to_string(),
        elem: elem.to_string(),
    }
}

fn invalid_op(op: &Op) -> CRDTError {
    let prop = match &op.key {
        Key::Map(key) => format!("'{key}'"),
        Key::Seq(ElemId::Head) => "head".to_string(),
        Key::Seq(ElemId::Id(id)) => id.to_string(),
    };
    CRDTError::InvalidProp {
        operation: op.action.name().to_string(),
        obj: op.obj.to_string(),
        prop,
    }
}

pub(crate) fn type_mismatch(operation: &str, obj: &ObjId, expected: &str, actual: &str) -> CRDTError {
    CRDTError::TypeMismatch {
        operation: operation.to_string(),
        obj: obj.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}
