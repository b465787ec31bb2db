//! Rich-text marks.
//!
//! A mark op stores its range as two anchors attached to element ids rather than numeric
//! positions, so the range follows the text through later edits. Which side of a boundary an
//! anchor attaches to is decided by the expansion policy when the mark is created: an anchor on
//! the outer side of a boundary swallows text inserted there, one on the inner side does not.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{CRDTError, ScalarValue, op::OpId, sequence::Sequence};

/// Whether text inserted exactly at a mark boundary joins the mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpandMark {
    None,
    Before,
    After,
    Both,
}

impl ExpandMark {
    pub fn expand_before(&self) -> bool {
        matches!(self, ExpandMark::Before | ExpandMark::Both)
    }

    pub fn expand_after(&self) -> bool {
        matches!(self, ExpandMark::After | ExpandMark::Both)
    }
}

impl fmt::Display for ExpandMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExpandMark::None => "none",
            ExpandMark::Before => "before",
            ExpandMark::After => "after",
            ExpandMark::Both => "both",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ExpandMark {
    type Err = CRDTError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ExpandMark::None),
            "before" => Ok(ExpandMark::Before),
            "after" => Ok(ExpandMark::After),
            "both" => Ok(ExpandMark::Both),
            other => Err(CRDTError::InvalidValue {
                reason: format!("unknown mark expansion '{other}'"),
            }),
        }
    }
}

/// One end of a mark range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anchor {
    /// The start of the text, before any element
    Start,
    /// The end of the text, after every element
    End,
    /// Immediately before the element
    Before(OpId),
    /// Immediately after the element
    After(OpId),
}

impl Anchor {
    pub(crate) fn element(&self) -> Option<&OpId> {
        match self {
            Anchor::Before(id) | Anchor::After(id) => Some(id),
            Anchor::Start | Anchor::End => None,
        }
    }

    fn resolve(&self, seq: &Sequence, len: usize) -> Option<usize> {
        match self {
            Anchor::Start => Some(0),
            Anchor::End => Some(len),
            Anchor::Before(id) => seq.visible_index(id).map(|(idx, _)| idx),
            Anchor::After(id) => seq
                .visible_index(id)
                .map(|(idx, visible)| idx + usize::from(visible)),
        }
    }
}

/// Payload of a mark operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkData {
    pub name: String,
    /// `Null` removes the mark from the range
    pub value: ScalarValue,
    pub start: Anchor,
    pub end: Anchor,
    pub expand: ExpandMark,
}

impl MarkData {
    /// Anchor a `[start, end)` range of visible positions according to `expand`.
    pub(crate) fn anchor(
        seq: &Sequence,
        start: usize,
        end: usize,
        expand: ExpandMark,
    ) -> Option<(Anchor, Anchor)> {
        let len = seq.len();
        let start_anchor = if expand.expand_before() {
            if start == 0 {
                Anchor::Start
            } else {
                Anchor::After(seq.nth(start - 1)?.id.clone())
            }
        } else {
            Anchor::Before(seq.nth(start)?.id.clone())
        };
        let end_anchor = if expand.expand_after() {
            if end == len {
                Anchor::End
            } else {
                Anchor::Before(seq.nth(end)?.id.clone())
            }
        } else {
            Anchor::After(seq.nth(end.checked_sub(1)?)?.id.clone())
        };
        Some((start_anchor, end_anchor))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MarkOp {
    pub(crate) id: OpId,
    pub(crate) data: MarkData,
}

/// A mark with its range resolved against a particular state.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub name: String,
    pub value: ScalarValue,
    pub start: usize,
    pub end: usize,
}

impl Mark {
    pub fn contains(&self, pos: usize) -> bool {
        self.start <= pos && pos < self.end
    }
}

/// Resolve every mark op against `seq` and flatten them into non-overlapping runs per name.
///
/// Where ops with the same name overlap, the one with the higher id decides the value of each
/// position. A null value erases the mark. Runs are sorted by start, end and name.
pub(crate) fn resolve_marks(seq: &Sequence, ops: &[MarkOp]) -> Vec<Mark> {
    let len = seq.len();
    let mut by_name: BTreeMap<&str, Vec<Option<(&OpId, &ScalarValue)>>> = BTreeMap::new();

    for op in ops {
        let (Some(start), Some(end)) = (
            op.data.start.resolve(seq, len),
            op.data.end.resolve(seq, len),
        ) else {
            continue;
        };
        let positions = by_name
            .entry(op.data.name.as_str())
            .or_insert_with(|| vec![None; len]);
        for slot in positions.iter_mut().take(end.min(len)).skip(start) {
            let wins = match slot {
                Some((id, _)) => **id < op.id,
                None => true,
            };
            if wins {
                *slot = Some((&op.id, &op.data.value));
            }
        }
    }

    let mut marks = Vec::new();
    for (name, positions) in by_name {
        let mut run: Option<Mark> = None;
        for (pos, winner) in positions.iter().enumerate() {
            let value = winner.map(|(_, v)| v).filter(|v| !v.is_null());
            let Some(v) = value else {
                marks.extend(run.take());
                continue;
            };
            let extends = matches!(&run, Some(current) if current.value == *v && current.end == pos);
            if extends {
                if let Some(current) = run.as_mut() {
                    current.end = pos + 1;
                }
            } else {
                marks.extend(run.take());
                run = Some(Mark {
                    name: name.to_string(),
                    value: v.clone(),
                    start: pos,
                    end: pos + 1,
                });
            }
        }
        marks.extend(run);
    }

    marks.sort_by(|a, b| (a.start, a.end, &a.name).cmp(&(b.start, b.end, &b.name)));
    marks
}
