//! Content-addressable identifier for changes.
//!
//! A [`ChangeHash`] is the SHA-256 digest of a change's canonical encoding.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::constants::HASH_LEN;

/// Errors raised while parsing a change hash.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashError {
    /// The string is not valid hex
    #[error("Invalid hash hex: {0}")]
    InvalidHex(String),

    /// The decoded hash has the wrong number of bytes
    #[error("Invalid hash length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

impl From<HashError> for crate::Error {
    fn from(err: HashError) -> Self {
        crate::Error::Hash(err)
    }
}

/// A fixed-width 32-byte content digest identifying a change.
///
/// Identical content always produces the identical hash, which is what lets merge and sync
/// deduplicate changes without coordination.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ChangeHash(pub [u8; HASH_LEN]);

impl ChangeHash {
    /// Hash the given bytes with SHA-256.
    pub fn digest(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hasher.finalize().into())
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex encoding of the digest.
    pub fn to_hex_string(&self) -> String {
        hex::encode(self.0)
    }
}

impl TryFrom<&[u8]> for ChangeHash {
    type Error = HashError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; HASH_LEN] = bytes.try_into().map_err(|_| HashError::InvalidLength {
            expected: HASH_LEN,
            got: bytes.len(),
        })?;
        Ok(Self(array))
    }
}

impl FromStr for ChangeHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| HashError::InvalidHex(format!("{s}: {e}")))?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Display for ChangeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_string())
    }
}

impl fmt::Debug for ChangeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChangeHash({})", self.to_hex_string())
    }
}

impl Serialize for ChangeHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for ChangeHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes = serde_bytes::ByteBuf::deserialize(deserializer)?;
        ChangeHash::try_from(bytes.as_slice()).map_err(serde::de::Error::custom)
    }
}
