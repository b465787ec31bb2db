//! Operations and the identifiers they are addressed by.
//!
//! An [`Op`] is the atomic edit unit. Its identity is an [`OpId`], a Lamport counter paired
//! with the creating actor. The id is implied by the op's position inside a
//! [`Change`](crate::Change) rather than stored. Object ids, list element ids and cursors are all op ids underneath.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{CRDTError, ScalarValue, marks::MarkData, value::ObjType};
use crate::{actor::ActorId, constants::ROOT_OBJ};

/// Lamport-style identifier of an operation.
///
/// Ordering compares the counter first and the actor second, which is the total order used to
/// resolve concurrent writes: the higher id wins.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OpId {
    counter: u64,
    actor: ActorId,
}

impl OpId {
    pub fn new(counter: u64, actor: ActorId) -> Self {
        Self { counter, actor }
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn actor(&self) -> &ActorId {
        &self.actor
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.counter, self.actor)
    }
}

impl fmt::Debug for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpId({self})")
    }
}

impl FromStr for OpId {
    type Err = CRDTError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| CRDTError::InvalidObjId {
            input: s.to_string(),
            reason,
        };
        let (counter, actor) = s
            .split_once('@')
            .ok_or_else(|| invalid("expected <counter>@<actor>".to_string()))?;
        let counter = counter
            .parse::<u64>()
            .map_err(|e| invalid(format!("bad counter: {e}")))?;
        let actor = actor
            .parse::<ActorId>()
            .map_err(|e| invalid(e.to_string()))?;
        Ok(Self::new(counter, actor))
    }
}

/// Identifier of a map, list or text object.
///
/// The root map has no creating operation and is addressed by [`ROOT`]. Every other object is
/// identified by the id of the operation that created it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjId {
    Root,
    Id(OpId),
}

/// The implicit root map of every document.
pub const ROOT: ObjId = ObjId::Root;

impl ObjId {
    pub fn is_root(&self) -> bool {
        matches!(self, ObjId::Root)
    }
}

impl fmt::Display for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjId::Root => write!(f, "{ROOT_OBJ}"),
            ObjId::Id(id) => write!(f, "{id}"),
        }
    }
}

impl fmt::Debug for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjId({self})")
    }
}

impl FromStr for ObjId {
    type Err = CRDTError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ROOT_OBJ {
            return Ok(ObjId::Root);
        }
        Ok(ObjId::Id(s.parse()?))
    }
}

/// Reference to a position in a sequence: the virtual head, or an inserted element.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElemId {
    Head,
    Id(OpId),
}

/// Where inside an object an operation lands.
///
/// For an insert, `Seq` names the element the new one goes after. For other sequence
/// operations it names the element being written.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Map(String),
    Seq(ElemId),
}

/// A user-facing address inside an object: a map key or a visible 0-based index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Prop {
    Map(String),
    Seq(usize),
}

impl fmt::Display for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prop::Map(key) => write!(f, "'{key}'"),
            Prop::Seq(index) => write!(f, "[{index}]"),
        }
    }
}

impl From<&str> for Prop {
    fn from(key: &str) -> Self {
        Prop::Map(key.to_string())
    }
}

impl From<String> for Prop {
    fn from(key: String) -> Self {
        Prop::Map(key)
    }
}

impl From<&String> for Prop {
    fn from(key: &String) -> Self {
        Prop::Map(key.clone())
    }
}

impl From<usize> for Prop {
    fn from(index: usize) -> Self {
        Prop::Seq(index)
    }
}

/// What an operation does.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum OpAction {
    /// Write a scalar (including a new counter)
    Put(ScalarValue),
    /// Create a nested object in the slot
    MakeObject(ObjType),
    /// Add a delta to the counters named in `pred`
    Increment(i64),
    /// Remove the values named in `pred`
    Delete,
    /// Annotate a range of a text object
    Mark(MarkData),
}

impl OpAction {
    pub fn name(&self) -> &'static str {
        match self {
            OpAction::Put(_) => "put",
            OpAction::MakeObject(_) => "make",
            OpAction::Increment(_) => "increment",
            OpAction::Delete => "delete",
            OpAction::Mark(_) => "mark",
        }
    }
}

/// An immutable edit.
///
/// `pred` lists the ids of the operations this one supersedes (for puts and deletes) or
/// increments (for increments): the values that were visible in the slot when it was created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Op {
    pub obj: ObjId,
    pub key: Key,
    pub insert: bool,
    pub action: OpAction,
    pub pred: Vec<OpId>,
}
