//! Conflict-free replicated data types for documents.
//!
//! This module holds the data model that lets independent replicas edit the same document and
//! converge without coordination. Every edit is an [`op::Op`] identified by a Lamport-style
//! [`op::OpId`]; the [`ObjectStore`] replays ops into the visible tree.
//!
//! # Conflict resolution
//!
//! Concurrent writes to one map key or list element are all kept. The visible value is the one
//! written by the operation with the highest id (counter first, actor second); the others remain
//! readable through [`ObjectStore::get_all`]. Counters never conflict: concurrent increments add.
//!
//! # Core Types
//!
//! - [`ObjectStore`] - The materialized tree of maps, lists and text
//! - [`ScalarValue`] / [`Value`] - Values stored in and read from slots
//! - [`Cursor`] - A stable position in a list or text object
//! - [`Mark`] / [`ExpandMark`] - Rich-text annotations and their boundary behaviour

pub mod cursor;
pub mod errors;
pub mod marks;
pub mod op;
pub(crate) mod sequence;
pub(crate) mod slot;
pub mod store;
pub mod value;

pub use cursor::Cursor;
pub use errors::CRDTError;
pub use marks::{ExpandMark, Mark};
pub use op::{ObjId, OpId, Prop, ROOT};
pub use store::ObjectStore;
pub use value::{ObjType, ScalarValue, Value, ValueTree};
