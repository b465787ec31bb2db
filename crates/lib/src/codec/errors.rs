//! Error types for the binary codec.

use thiserror::Error;

/// Errors raised while encoding or decoding snapshots and changes.
///
/// Every decoding failure is fatal for the call that hit it and leaves the target document
/// untouched.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CodecError {
    /// The input does not start with the chunk magic bytes
    #[error("Not a quilt chunk: bad magic bytes at offset {offset}")]
    BadMagic { offset: usize },

    /// The body does not match the checksum in the chunk header
    #[error("Chunk checksum mismatch at offset {offset}: expected {expected}, computed {actual}")]
    ChecksumMismatch {
        offset: usize,
        expected: String,
        actual: String,
    },

    /// The input ends before the chunk does
    #[error("Truncated chunk at offset {offset}: need {needed} bytes, have {available}")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The chunk kind byte is not recognised
    #[error("Unknown chunk kind {kind:#04x} at offset {offset}")]
    UnknownChunkKind { offset: usize, kind: u8 },

    /// A chunk of a different kind than expected was found
    #[error("Expected a {expected} chunk, found {found}")]
    UnexpectedChunk { expected: String, found: String },

    /// Serializing a value failed
    #[error("Encoding failed: {reason}")]
    Encode { reason: String },

    /// Deserializing a body failed
    #[error("Decoding failed: {reason}")]
    Decode { reason: String },
}

impl CodecError {
    /// Check if the input was cut short rather than corrupted.
    pub fn is_truncated(&self) -> bool {
        matches!(self, CodecError::Truncated { .. })
    }

    /// Check if the framing around a body was invalid.
    pub fn is_framing_error(&self) -> bool {
        matches!(
            self,
            CodecError::BadMagic { .. }
                | CodecError::ChecksumMismatch { .. }
                | CodecError::Truncated { .. }
                | CodecError::UnknownChunkKind { .. }
                | CodecError::UnexpectedChunk { .. }
        )
    }
}

impl From<CodecError> for crate::Error {
    fn from(err: CodecError) -> Self {
        crate::Error::Codec(err)
    }
}
