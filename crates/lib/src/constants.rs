//! Constants used throughout the Quilt library.
//!
//! This module provides central definitions for reserved identifiers, codec framing bytes and
//! sync tuning parameters.

/// External representation of the implicit root map.
pub const ROOT_OBJ: &str = "_root";

/// Leading bytes of every encoded document or change chunk.
pub const CHUNK_MAGIC: [u8; 4] = [0x71, 0x75, 0x6c, 0x74];

/// Length of the truncated SHA-256 checksum carried in a chunk header.
pub const CHUNK_CHECKSUM_LEN: usize = 4;

/// Chunk header length: magic, checksum, kind byte and a big-endian `u32` body length.
pub const CHUNK_HEADER_LEN: usize = CHUNK_MAGIC.len() + CHUNK_CHECKSUM_LEN + 1 + 4;

/// Leading byte of an encoded sync message.
pub const SYNC_MESSAGE_TYPE: u8 = 0x42;

/// Leading byte of an encoded sync state.
pub const SYNC_STATE_TYPE: u8 = 0x43;

/// Bloom filter bits allotted to each change hash in a sync summary.
pub const BLOOM_BITS_PER_ENTRY: u32 = 10;

/// Number of bit probes per change hash in a sync summary.
pub const BLOOM_NUM_PROBES: u32 = 7;

/// Length in bytes of a change hash.
pub const HASH_LEN: usize = 32;
