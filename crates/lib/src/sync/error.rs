//! Error types for the synchronization module.

use thiserror::Error;

/// Errors that can occur while decoding sync messages or sync state.
///
/// A decoding failure never touches the [`SyncState`](super::SyncState) or document it would
/// have been applied to.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    /// The input was empty.
    #[error("Empty sync {what}")]
    Empty { what: &'static str },

    /// The leading type byte does not identify a sync message.
    #[error("Not a sync message: type byte {found:#04x}, expected {expected:#04x}")]
    UnknownMessageType { found: u8, expected: u8 },

    /// The leading type byte does not identify an encoded sync state.
    #[error("Not a sync state: type byte {found:#04x}, expected {expected:#04x}")]
    UnknownStateType { found: u8, expected: u8 },

    /// The body could not be decoded.
    #[error("Malformed sync {what}: {reason}")]
    Malformed { what: &'static str, reason: String },

    /// A Bloom filter's declared size does not match its bit array.
    #[error("Invalid bloom filter: {reason}")]
    InvalidBloom { reason: String },

    /// Encoding a message or state failed.
    #[error("Failed to encode sync {what}: {reason}")]
    Encode { what: &'static str, reason: String },
}

impl SyncError {
    /// Check if this error came from undecodable input.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            SyncError::Empty { .. }
                | SyncError::UnknownMessageType { .. }
                | SyncError::UnknownStateType { .. }
                | SyncError::Malformed { .. }
                | SyncError::InvalidBloom { .. }
        )
    }
}

impl From<SyncError> for crate::Error {
    fn from(err: SyncError) -> Self {
        crate::Error::Sync(err)
    }
}
