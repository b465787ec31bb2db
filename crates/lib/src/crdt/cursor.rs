//! Stable positions in lists and text.

use std::fmt;
use std::str::FromStr;

use super::{CRDTError, op::OpId};

/// A stable reference to an element of a list or text object.
///
/// A cursor remembers the element id rather than its index, so it keeps pointing at the same
/// element while other elements are inserted or deleted around it. Resolving a cursor whose
/// element has been deleted fails with [`CRDTError::CursorInvalidated`].
///
/// Cursors render as `<counter>@<actor hex>` and parse back from that form.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Cursor(OpId);

impl Cursor {
    pub(crate) fn new(elem: OpId) -> Self {
        Self(elem)
    }

    pub(crate) fn elem(&self) -> &OpId {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cursor({})", self.0)
    }
}

impl FromStr for Cursor {
    type Err = CRDTError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<OpId>()
            .map(Cursor)
            .map_err(|e| CRDTError::InvalidCursor {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}
