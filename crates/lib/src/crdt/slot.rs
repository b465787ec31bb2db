//! A single addressable slot: one map key or one sequence element.
//!
//! A slot keeps every put/make operation that ever targeted it, ordered by op id. An operation is
//! visible while nothing supersedes it; among visible operations the highest id wins, and the
//! rest are reported as conflicts.

use super::{
    ScalarValue,
    op::{ObjId, OpId},
    value::{ObjType, Value},
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SlotValue {
    Scalar(ScalarValue),
    Object(ObjType),
}

#[derive(Debug, Clone)]
pub(crate) struct SlotOp {
    pub(crate) id: OpId,
    pub(crate) value: SlotValue,
    /// Operations that overwrote or deleted this one
    pub(crate) succ: Vec<OpId>,
    /// Sum of increments applied to a counter
    pub(crate) incs: i64,
}

impl SlotOp {
    pub(crate) fn is_visible(&self) -> bool {
        self.succ.is_empty()
    }

    pub(crate) fn is_counter(&self) -> bool {
        matches!(self.value, SlotValue::Scalar(ScalarValue::Counter(_)))
    }

    pub(crate) fn value(&self) -> Value {
        match &self.value {
            SlotValue::Scalar(ScalarValue::Counter(base)) => {
                Value::Scalar(ScalarValue::Counter(base.saturating_add(self.incs)))
            }
            SlotValue::Scalar(s) => Value::Scalar(s.clone()),
            SlotValue::Object(t) => Value::Object(*t, ObjId::Id(self.id.clone())),
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match &self.value {
            SlotValue::Scalar(s) => s.type_name(),
            SlotValue::Object(t) => match t {
                ObjType::Map => "map",
                ObjType::List => "list",
                ObjType::Text => "text",
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Slot {
    ops: Vec<SlotOp>,
}

impl Slot {
    pub(crate) fn with_op(id: OpId, value: SlotValue) -> Self {
        let mut slot = Self::default();
        slot.put(id, value, &[]);
        slot
    }

    /// Record a new value, superseding the operations named in `pred`.
    pub(crate) fn put(&mut self, id: OpId, value: SlotValue, pred: &[OpId]) {
        self.supersede(&id, pred);
        let pos = self.ops.partition_point(|op| op.id < id);
        self.ops.insert(
            pos,
            SlotOp {
                id,
                value,
                succ: Vec::new(),
                incs: 0,
            },
        );
    }

    /// Remove the operations named in `pred`.
    pub(crate) fn delete(&mut self, id: &OpId, pred: &[OpId]) {
        self.supersede(id, pred);
    }

    /// Add `by` to every counter named in `pred`.
    pub(crate) fn increment(&mut self, by: i64, pred: &[OpId]) {
        for op in self.ops.iter_mut().filter(|op| pred.contains(&op.id)) {
            if op.is_counter() {
                op.incs = op.incs.saturating_add(by);
            }
        }
    }

    fn supersede(&mut self, id: &OpId, pred: &[OpId]) {
        for op in self.ops.iter_mut().filter(|op| pred.contains(&op.id)) {
            op.succ.push(id.clone());
        }
    }

    pub(crate) fn visible(&self) -> impl DoubleEndedIterator<Item = &SlotOp> + '_ {
        self.ops.iter().filter(|op| op.is_visible())
    }

    /// The winning operation: the visible one with the highest id.
    pub(crate) fn winner(&self) -> Option<&SlotOp> {
        self.visible().next_back()
    }

    pub(crate) fn is_visible(&self) -> bool {
        self.ops.iter().any(SlotOp::is_visible)
    }

    pub(crate) fn visible_ids(&self) -> Vec<OpId> {
        self.visible().map(|op| op.id.clone()).collect()
    }

    pub(crate) fn visible_counter_ids(&self) -> Vec<OpId> {
        self.visible()
            .filter(|op| op.is_counter())
            .map(|op| op.id.clone())
            .collect()
    }
}
