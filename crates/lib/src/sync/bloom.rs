//! Bloom filter summarising a set of change hashes.
//!
//! Sized at a fixed number of bits per entry and probed with positions derived from the hash
//! bytes themselves (change hashes are already uniformly distributed). A false positive makes
//! the sender skip a change the peer lacks; the peer then asks for it by hash in its `need` list
//! on the next round.

use serde::{Deserialize, Serialize};

use super::SyncError;
use crate::{
    change::ChangeHash,
    constants::{BLOOM_BITS_PER_ENTRY, BLOOM_NUM_PROBES},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloomFilter {
    num_entries: u32,
    num_bits_per_entry: u32,
    num_probes: u32,
    #[serde(with = "serde_bytes")]
    bits: Vec<u8>,
}

impl Default for BloomFilter {
    fn default() -> Self {
        Self {
            num_entries: 0,
            num_bits_per_entry: BLOOM_BITS_PER_ENTRY,
            num_probes: BLOOM_NUM_PROBES,
            bits: Vec::new(),
        }
    }
}

fn bits_len(num_entries: u32, num_bits_per_entry: u32) -> usize {
    (num_entries as usize * num_bits_per_entry as usize).div_ceil(8)
}

impl BloomFilter {
    pub fn from_hashes<'a>(hashes: impl ExactSizeIterator<Item = &'a ChangeHash>) -> Self {
        let num_entries = hashes.len() as u32;
        let mut filter = Self {
            num_entries,
            bits: vec![0; bits_len(num_entries, BLOOM_BITS_PER_ENTRY)],
            ..Self::default()
        };
        for hash in hashes {
            filter.add_hash(hash);
        }
        filter
    }

    pub fn len(&self) -> usize {
        self.num_entries as usize
    }

    pub fn is_empty(&self) -> bool {
        self.num_entries == 0
    }

    /// Bit positions for `hash`, by double hashing over the first three words of the hash.
    fn probes(&self, hash: &ChangeHash) -> impl Iterator<Item = usize> + use<> {
        let bytes = hash.as_bytes();
        let modulo = 8 * self.bits.len() as u64;
        let word = |i: usize| {
            u64::from(u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]))
        };

        let mut x = word(0) % modulo;
        let mut y = word(4) % modulo;
        let z = word(8) % modulo;
        (0..self.num_probes).map(move |i| {
            if i > 0 {
                x = (x + y) % modulo;
                y = (y + z) % modulo;
            }
            x as usize
        })
    }

    fn add_hash(&mut self, hash: &ChangeHash) {
        for probe in self.probes(hash) {
            self.bits[probe >> 3] |= 1 << (probe & 7);
        }
    }

    /// Whether `hash` may be in the set. Never false for a hash that was added.
    pub fn contains_hash(&self, hash: &ChangeHash) -> bool {
        if self.num_entries == 0 {
            return false;
        }
        self.probes(hash)
            .all(|probe| self.bits[probe >> 3] & (1 << (probe & 7)) != 0)
    }

    /// Check that a decoded filter uses our parameters and is internally consistent.
    pub(crate) fn validate(&self) -> Result<(), SyncError> {
        if self.num_bits_per_entry != BLOOM_BITS_PER_ENTRY || self.num_probes != BLOOM_NUM_PROBES {
            return Err(SyncError::InvalidBloom {
                reason: format!(
                    "expected {BLOOM_BITS_PER_ENTRY} bits per entry and {BLOOM_NUM_PROBES} probes, \
                     got {} and {}",
                    self.num_bits_per_entry, self.num_probes
                ),
            });
        }
        let expected = bits_len(self.num_entries, self.num_bits_per_entry);
        if self.bits.len() != expected {
            return Err(SyncError::InvalidBloom {
                reason: format!(
                    "{} entries need {expected} bytes, got {}",
                    self.num_entries,
                    self.bits.len()
                ),
            });
        }
        Ok(())
    }
}
