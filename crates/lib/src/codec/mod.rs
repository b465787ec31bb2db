//! Binary encoding of snapshots and changes.
//!
//! Bodies are DAG-CBOR, which is deterministic: the same value always encodes to the same bytes,
//! so a change hash computed over its encoded body is stable across replicas.
//!
//! Every unit written to disk or handed to another replica is wrapped in a chunk:
//!
//! ```text
//! magic (4) | checksum (4) | kind (1) | body length (u32, big-endian) | body
//! ```
//!
//! The checksum is the first four bytes of the SHA-256 of the body. A document snapshot is one
//! chunk whose body lists the encoded bodies of every change in causal order; an incremental save
//! is a concatenation of change chunks. Sync messages use their own encoding and are never
//! chunks.

pub mod errors;

use std::fmt;

pub use errors::CodecError;
use serde::{Serialize, de::DeserializeOwned};
use serde_bytes::ByteBuf;
use sha2::{Digest, Sha256};

use crate::{
    Result,
    change::Change,
    constants::{CHUNK_CHECKSUM_LEN, CHUNK_HEADER_LEN, CHUNK_MAGIC},
};

/// What a chunk contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// A full snapshot: every change of a document
    Document,
    /// One change
    Change,
}

impl ChunkKind {
    fn to_byte(self) -> u8 {
        match self {
            ChunkKind::Document => 0,
            ChunkKind::Change => 1,
        }
    }

    fn from_byte(kind: u8, offset: usize) -> std::result::Result<Self, CodecError> {
        match kind {
            0 => Ok(ChunkKind::Document),
            1 => Ok(ChunkKind::Change),
            kind => Err(CodecError::UnknownChunkKind { offset, kind }),
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkKind::Document => write!(f, "document"),
            ChunkKind::Change => write!(f, "change"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Chunk<'a> {
    pub(crate) kind: ChunkKind,
    pub(crate) body: &'a [u8],
}

fn checksum(body: &[u8]) -> [u8; CHUNK_CHECKSUM_LEN] {
    let digest = Sha256::digest(body);
    let mut out = [0u8; CHUNK_CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHUNK_CHECKSUM_LEN]);
    out
}

/// The length field of a chunk header. Bodies must fit in a `u32`.
fn body_len_field(len: usize) -> std::result::Result<[u8; 4], CodecError> {
    u32::try_from(len)
        .map(u32::to_be_bytes)
        .map_err(|_| CodecError::Encode {
            reason: format!("chunk body of {len} bytes exceeds {} bytes", u32::MAX),
        })
}

pub(crate) fn encode_chunk(
    kind: ChunkKind,
    body: &[u8],
) -> std::result::Result<Vec<u8>, CodecError> {
    let len = body_len_field(body.len())?;
    let mut out = Vec::with_capacity(CHUNK_HEADER_LEN + body.len());
    out.extend_from_slice(&CHUNK_MAGIC);
    out.extend_from_slice(&checksum(body));
    out.push(kind.to_byte());
    out.extend_from_slice(&len);
    out.extend_from_slice(body);
    Ok(out)
}

/// Decode the chunk starting at `offset`, returning it and the offset just past it.
fn decode_chunk_at(
    bytes: &[u8],
    offset: usize,
) -> std::result::Result<(Chunk<'_>, usize), CodecError> {
    let available = bytes.len() - offset;
    if available < CHUNK_HEADER_LEN {
        return Err(CodecError::Truncated {
            offset,
            needed: CHUNK_HEADER_LEN,
            available,
        });
    }
    let header = &bytes[offset..offset + CHUNK_HEADER_LEN];
    if header[..CHUNK_MAGIC.len()] != CHUNK_MAGIC {
        return Err(CodecError::BadMagic { offset });
    }
    let sum_end = CHUNK_MAGIC.len() + CHUNK_CHECKSUM_LEN;
    let expected_sum = &header[CHUNK_MAGIC.len()..sum_end];
    let kind = ChunkKind::from_byte(header[sum_end], offset)?;
    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&header[sum_end + 1..CHUNK_HEADER_LEN]);
    let body_len = u32::from_be_bytes(len_bytes) as usize;

    let body_start = offset + CHUNK_HEADER_LEN;
    if bytes.len() - body_start < body_len {
        return Err(CodecError::Truncated {
            offset,
            needed: CHUNK_HEADER_LEN + body_len,
            available,
        });
    }
    let body = &bytes[body_start..body_start + body_len];
    let actual_sum = checksum(body);
    if actual_sum[..] != *expected_sum {
        return Err(CodecError::ChecksumMismatch {
            offset,
            expected: hex::encode(expected_sum),
            actual: hex::encode(actual_sum),
        });
    }
    Ok((Chunk { kind, body }, body_start + body_len))
}

/// Split a concatenation of chunks.
pub(crate) fn decode_chunks(bytes: &[u8]) -> std::result::Result<Vec<Chunk<'_>>, CodecError> {
    let mut chunks = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let (chunk, next) = decode_chunk_at(bytes, offset)?;
        chunks.push(chunk);
        offset = next;
    }
    Ok(chunks)
}

/// Decode input that must be exactly one chunk of the `expected` kind.
pub(crate) fn decode_single_chunk(
    bytes: &[u8],
    expected: ChunkKind,
) -> std::result::Result<Chunk<'_>, CodecError> {
    let (chunk, end) = decode_chunk_at(bytes, 0)?;
    if chunk.kind != expected {
        return Err(CodecError::UnexpectedChunk {
            expected: expected.to_string(),
            found: chunk.kind.to_string(),
        });
    }
    if end != bytes.len() {
        return Err(CodecError::Decode {
            reason: format!("{} trailing bytes after {expected} chunk", bytes.len() - end),
        });
    }
    Ok(chunk)
}

pub(crate) fn to_cbor<T: Serialize>(value: &T) -> std::result::Result<Vec<u8>, CodecError> {
    serde_ipld_dagcbor::to_vec(value).map_err(|e| CodecError::Encode {
        reason: e.to_string(),
    })
}

pub(crate) fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> std::result::Result<T, CodecError> {
    serde_ipld_dagcbor::from_slice(bytes).map_err(|e| CodecError::Decode {
        reason: e.to_string(),
    })
}

/// Encode a snapshot of `changes`, which must be in causal order.
pub(crate) fn encode_document<'a>(changes: impl IntoIterator<Item = &'a Change>) -> Result<Vec<u8>> {
    let bodies: Vec<ByteBuf> = changes
        .into_iter()
        .map(|c| ByteBuf::from(c.encoded_body().to_vec()))
        .collect();
    let body = to_cbor(&bodies)?;
    Ok(encode_chunk(ChunkKind::Document, &body)?)
}

fn decode_document_body(body: &[u8]) -> Result<Vec<Change>> {
    let bodies: Vec<ByteBuf> = from_cbor(body)?;
    bodies
        .iter()
        .map(|b| Change::from_encoded_body(b.as_slice()))
        .collect()
}

/// Decode input that must be exactly one document chunk.
pub(crate) fn decode_document(bytes: &[u8]) -> Result<Vec<Change>> {
    let chunk = decode_single_chunk(bytes, ChunkKind::Document)?;
    decode_document_body(chunk.body)
}

/// Decode any concatenation of document and change chunks into their changes, in order.
pub(crate) fn decode_changes(bytes: &[u8]) -> Result<Vec<Change>> {
    let mut changes = Vec::new();
    for chunk in decode_chunks(bytes)? {
        match chunk.kind {
            ChunkKind::Document => changes.extend(decode_document_body(chunk.body)?),
            ChunkKind::Change => changes.push(Change::from_encoded_body(chunk.body)?),
        }
    }
    Ok(changes)
}
