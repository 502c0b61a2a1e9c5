//! Entropy pool ring buffer.
//!
//! A fixed-size byte buffer with a private read cursor. Callers can only
//! mix new material in, shuffle, and read from the cursor; the cursor
//! itself is never exposed for writing.

use crate::source::{EntropySource, SourceError};

/// Fixed-size, continuously remixed entropy buffer.
pub struct EntropyPool {
    /// Pool bytes.
    bytes: Vec<u8>,
    /// Read position, always in `[0, bytes.len())`.
    cursor: usize,
    /// Total bytes XORed into the pool (for metrics).
    total_mixed: u64,
    /// Total bytes read out of the pool.
    total_extracted: u64,
}

impl EntropyPool {
    /// Creates a zeroed pool of `size` bytes.
    ///
    /// A zero size is bumped to one byte so the cursor invariant holds.
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0u8; size.max(1)],
            cursor: 0,
            total_mixed: 0,
            total_extracted: 0,
        }
    }

    /// Creates a pool holding exactly `bytes`.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let mut pool = Self::new(bytes.len());
        if !bytes.is_empty() {
            pool.bytes = bytes;
        }
        pool
    }

    /// Overwrites the whole pool with bytes from `source`.
    pub fn fill_from(&mut self, source: &mut dyn EntropySource) -> Result<(), SourceError> {
        source.fill(&mut self.bytes)?;
        tracing::trace!(
            source = source.name(),
            pool_size = self.bytes.len(),
            "Filled entropy pool"
        );
        Ok(())
    }

    /// XORs `data` into the pool starting at the cursor, wrapping around.
    ///
    /// The cursor does not move.
    pub fn mix(&mut self, data: &[u8]) {
        let len = self.bytes.len();
        for (i, &b) in data.iter().enumerate() {
            self.bytes[(self.cursor + i) % len] ^= b;
        }
        self.total_mixed += data.len() as u64;
    }

    /// Copies `n` bytes from the cursor and advances it.
    pub fn extract(&mut self, n: usize) -> Vec<u8> {
        let out = self.peek(n);
        self.cursor = (self.cursor + n) % self.bytes.len();
        self.total_extracted += n as u64;
        out
    }

    /// Reads a little-endian `u32` from the cursor and advances it by four.
    pub fn extract_u32(&mut self) -> u32 {
        let bytes = self.extract(4);
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Copies `n` bytes from the cursor without advancing it.
    pub fn peek(&self, n: usize) -> Vec<u8> {
        let len = self.bytes.len();
        (0..n).map(|i| self.bytes[(self.cursor + i) % len]).collect()
    }

    /// One Fisher-Yates pass driven by the pool's own bytes.
    ///
    /// Swap indices come from pairs of pool bytes offset by the cursor,
    /// so the permutation depends on both content and read position.
    pub fn shuffle(&mut self) {
        let len = self.bytes.len();
        for i in (1..len).rev() {
            let r = u16::from_le_bytes([self.bytes[i], self.bytes[(i + self.cursor + 1) % len]]);
            let j = r as usize % (i + 1);
            self.bytes.swap(i, j);
        }
    }

    /// Returns the pool size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Returns total bytes mixed into the pool.
    pub fn total_mixed(&self) -> u64 {
        self.total_mixed
    }

    /// Returns total bytes read from the pool.
    pub fn total_extracted(&self) -> u64 {
        self.total_extracted
    }

    #[cfg(test)]
    pub(crate) fn cursor(&self) -> usize {
        self.cursor
    }

    #[cfg(test)]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for EntropyPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntropyPool")
            .field("size", &self.bytes.len())
            .field("total_mixed", &self.total_mixed)
            .field("total_extracted", &self.total_extracted)
            .finish_non_exhaustive()
    }
}
