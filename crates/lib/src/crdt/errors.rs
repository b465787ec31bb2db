//! Error types for CRDT operations.
//!
//! This module defines structured error types for reading and writing the object store:
//! unknown objects and elements, out-of-range positions, operation/value type mismatches,
//! invalid marks and cursors that no longer resolve.

use thiserror::Error;

/// Structured error types for CRDT operations.
///
/// Every variant carries the operation kind and the target it was applied to, so the message is
/// enough to diagnose a failure without access to the document.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CRDTError {
    /// The target object does not exist in the current state
    #[error("{operation}: object {obj} not found")]
    ObjectNotFound { operation: String, obj: String },

    /// The map key or sequence element required by the operation is absent
    #[error("{operation}: key '{key}' not found in {obj}")]
    KeyNotFound {
        operation: String,
        obj: String,
        key: String,
    },

    /// An operation references a sequence element id unknown to the object
    #[error("{operation}: element {elem} not found in {obj}")]
    ElementNotFound {
        operation: String,
        obj: String,
        elem: String,
    },

    /// A numeric position is outside the visible sequence
    #[error("{operation}: index {index} out of bounds for {obj} (length {len})")]
    IndexOutOfBounds {
        operation: String,
        obj: String,
        index: usize,
        len: usize,
    },

    /// The operation kind is incompatible with the target's type
    #[error("{operation}: type mismatch on {obj}, expected {expected}, found {actual}")]
    TypeMismatch {
        operation: String,
        obj: String,
        expected: String,
        actual: String,
    },

    /// A map key was used on a sequence or an index on a map
    #[error("{operation}: invalid property {prop} for {obj}")]
    InvalidProp {
        operation: String,
        obj: String,
        prop: String,
    },

    /// A value outside the supported taxonomy was supplied
    #[error("Invalid CRDT value: {reason}")]
    InvalidValue { reason: String },

    /// A mark range or name was rejected
    #[error("Invalid mark on {obj}: {reason}")]
    InvalidMark { obj: String, reason: String },

    /// A cursor string could not be parsed
    #[error("Invalid cursor '{input}': {reason}")]
    InvalidCursor { input: String, reason: String },

    /// An object or op id string could not be parsed
    #[error("Invalid object id '{input}': {reason}")]
    InvalidObjId { input: String, reason: String },

    /// The element a cursor refers to has been deleted or is unknown
    #[error("Cursor {cursor} no longer resolves in {obj}")]
    CursorInvalidated { cursor: String, obj: String },
}

impl CRDTError {
    /// Check if this error is related to object, key or element lookup
    pub fn is_not_found_error(&self) -> bool {
        matches!(
            self,
            CRDTError::ObjectNotFound { .. }
                | CRDTError::KeyNotFound { .. }
                | CRDTError::ElementNotFound { .. }
        )
    }

    /// Check if this error was caused by malformed input
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            CRDTError::IndexOutOfBounds { .. }
                | CRDTError::InvalidProp { .. }
                | CRDTError::InvalidValue { .. }
                | CRDTError::InvalidMark { .. }
                | CRDTError::InvalidCursor { .. }
                | CRDTError::InvalidObjId { .. }
        )
    }

    /// Check if this error is related to type mismatches
    pub fn is_type_error(&self) -> bool {
        matches!(self, CRDTError::TypeMismatch { .. })
    }

    /// Check if this error is a cursor that no longer resolves
    pub fn is_cursor_error(&self) -> bool {
        matches!(self, CRDTError::CursorInvalidated { .. })
    }

    /// Get the operation kind if this is an operation-specific error
    pub fn operation(&self) -> Option<&str> {
        match self {
            CRDTError::ObjectNotFound { operation, .. }
            | CRDTError::KeyNotFound { operation, .. }
            | CRDTError::ElementNotFound { operation, .. }
            | CRDTError::IndexOutOfBounds { operation, .. }
            | CRDTError::TypeMismatch { operation, .. }
            | CRDTError::InvalidProp { operation, .. } => Some(operation),
            _ => None,
        }
    }

    /// Get the target object if the error concerns one
    pub fn object(&self) -> Option<&str> {
        match self {
            CRDTError::ObjectNotFound { obj, .. }
            | CRDTError::KeyNotFound { obj, .. }
            | CRDTError::ElementNotFound { obj, .. }
            | CRDTError::IndexOutOfBounds { obj, .. }
            | CRDTError::TypeMismatch { obj, .. }
            | CRDTError::InvalidProp { obj, .. }
            | CRDTError::InvalidMark { obj, .. }
            | CRDTError::CursorInvalidated { obj, .. } => Some(obj),
            _ => None,
        }
    }
}

// Conversion from CRDTError to the main Error type
impl From<CRDTError> for crate::Error {
    fn from(err: CRDTError) -> Self {
        crate::Error::CRDT(err)
    }
}
