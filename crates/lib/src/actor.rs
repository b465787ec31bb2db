//! Replica identity.
//!
//! An [`ActorId`] is an opaque byte string naming one replica. It appears in every operation id
//! and is compared lexicographically to break ties between concurrent writes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while constructing an actor id.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActorError {
    /// The hex representation could not be decoded
    #[error("Invalid actor id hex '{input}': {reason}")]
    InvalidHex { input: String, reason: String },

    /// Actor ids must contain at least one byte
    #[error("Actor id must not be empty")]
    Empty,
}

impl From<ActorError> for crate::Error {
    fn from(err: ActorError) -> Self {
        crate::Error::Actor(err)
    }
}

/// A unique replica identifier.
///
/// Externally an actor id is either its raw bytes or their lowercase hex encoding; the two forms
/// are interchangeable. Ordering is lexicographic over the bytes.
///
/// ```
/// use quilt::ActorId;
///
/// let actor: ActorId = "0a0b".parse().unwrap();
/// assert_eq!(actor.as_bytes(), &[0x0a, 0x0b]);
/// assert_eq!(actor.to_string(), "0a0b");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(#[serde(with = "serde_bytes")] Vec<u8>);

impl ActorId {
    /// Generate a random 16-byte actor id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().as_bytes().to_vec())
    }

    /// Build an actor id from raw bytes, rejecting the empty string.
    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, ActorError> {
        if bytes.is_empty() {
            return Err(ActorError::Empty);
        }
        Ok(Self(bytes.to_vec()))
    }

    /// The raw bytes of this actor id.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex encoding of the actor id.
    pub fn to_hex_string(&self) -> String {
        hex::encode(&self.0)
    }
}

impl From<&[u8]> for ActorId {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for ActorId {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<uuid::Uuid> for ActorId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid.as_bytes().to_vec())
    }
}

impl FromStr for ActorId {
    type Err = ActorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| ActorError::InvalidHex {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        Self::try_from_bytes(&bytes)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_string())
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.to_hex_string())
    }
}
