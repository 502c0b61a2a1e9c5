//! Entropy source abstraction.
//!
//! The engine never detects its environment at runtime. A source is
//! chosen at construction time, and a failing source is replaced by the
//! weaker [`FallbackEntropySource`] so the downgrade is always visible.

use chrono::Utc;
use rand_chacha::ChaCha20Rng;
use rand_core::{OsRng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while reading entropy.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source could not produce bytes.
    #[error("entropy source unavailable: {0}")]
    Unavailable(String),
}

/// Quality class of an entropy source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStrength {
    /// Operating system CSPRNG.
    Cryptographic,
    /// Pseudo-random output with a guessable seed.
    Weak,
    /// Fixed bytes, for reproducible test fixtures.
    Deterministic,
}

impl SourceStrength {
    /// Returns true only for cryptographic-quality sources.
    pub fn is_strong(&self) -> bool {
        matches!(self, SourceStrength::Cryptographic)
    }
}

/// Trait for entropy source implementations.
///
/// This abstraction allows swapping between the operating system
/// generator, a weaker fallback and fixed test fixtures.
pub trait EntropySource {
    /// Fills `dest` with entropy.
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), SourceError>;

    /// Quality class of this source.
    fn strength(&self) -> SourceStrength;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}

/// Operating system randomness via `getrandom`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropySource;

impl OsEntropySource {
    /// Creates the source.
    pub fn new() -> Self {
        Self
    }
}

impl EntropySource for OsEntropySource {
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), SourceError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| SourceError::Unavailable(e.to_string()))
    }

    fn strength(&self) -> SourceStrength {
        SourceStrength::Cryptographic
    }

    fn name(&self) -> &'static str {
        "os"
    }
}

/// ChaCha20 stream seeded from the wall clock.
///
/// Anyone who can estimate the construction time can narrow down the
/// seed, so this source is always reported as [`SourceStrength::Weak`].
pub struct FallbackEntropySource {
    rng: ChaCha20Rng,
}

impl FallbackEntropySource {
    /// Seeds a new stream from the current time.
    pub fn new() -> Self {
        let now = Utc::now();
        let nanos = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp_millis().wrapping_mul(1_000_000));
        Self {
            rng: ChaCha20Rng::seed_from_u64(nanos as u64),
        }
    }

    /// Fills `dest`. Unlike the trait method this cannot fail.
    pub fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest);
    }
}

impl Default for FallbackEntropySource {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropySource for FallbackEntropySource {
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), SourceError> {
        self.fill_bytes(dest);
        Ok(())
    }

    fn strength(&self) -> SourceStrength {
        SourceStrength::Weak
    }

    fn name(&self) -> &'static str {
        "chacha-clock-fallback"
    }
}

/// Repeats a fixed byte pattern. For tests and replays only.
#[derive(Debug, Clone)]
pub struct FixedEntropySource {
    pattern: Vec<u8>,
    offset: usize,
}

impl FixedEntropySource {
    /// Creates a source cycling through `pattern`.
    ///
    /// An empty pattern yields zero bytes.
    pub fn new(pattern: Vec<u8>) -> Self {
        Self { pattern, offset: 0 }
    }

    /// A varied, reproducible fixture.
    pub fn counting(len: usize) -> Self {
        Self::new((0..len).map(|i| (i * 17 + 31) as u8).collect())
    }
}

impl EntropySource for FixedEntropySource {
    fn fill(&mut self, dest: &mut [u8]) -> Result<(), SourceError> {
        if self.pattern.is_empty() {
            dest.fill(0);
            return Ok(());
        }
        for byte in dest.iter_mut() {
            *byte = self.pattern[self.offset];
            self.offset = (self.offset + 1) % self.pattern.len();
        }
        Ok(())
    }

    fn strength(&self) -> SourceStrength {
        SourceStrength::Deterministic
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Source that always fails, for exercising the fallback path.
#[cfg(test)]
pub(crate) struct FailingEntropySource;

#[cfg(test)]
impl EntropySource for FailingEntropySource {
    fn fill(&mut self, _dest: &mut [u8]) -> Result<(), SourceError> {
        Err(SourceError::Unavailable("no entropy device".into()))
    }

    fn strength(&self) -> SourceStrength {
        SourceStrength::Cryptographic
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_source_fills() {
        let mut source = OsEntropySource::new();
        let mut buf = [0u8; 64];
        source.fill(&mut buf).unwrap();
        assert!(buf.iter().any(|&b| b != 0));
        assert!(source.strength().is_strong());
    }

    #[test]
    fn test_fallback_is_weak() {
        let mut source = FallbackEntropySource::new();
        let mut buf = [0u8; 32];
        source.fill(&mut buf).unwrap();
        assert_eq!(source.strength(), SourceStrength::Weak);
        assert!(!source.strength().is_strong());
    }

    #[test]
    fn test_fixed_source_cycles() {
        let mut source = FixedEntropySource::new(vec![1, 2, 3]);
        let mut buf = [0u8; 7];
        source.fill(&mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 1, 2, 3, 1]);

        // Continues where it left off
        let mut next = [0u8; 2];
        source.fill(&mut next).unwrap();
        assert_eq!(next, [2, 3]);
    }

    #[test]
    fn test_empty_fixed_source_yields_zeros() {
        let mut source = FixedEntropySource::new(Vec::new());
        let mut buf = [0xFFu8; 4];
        source.fill(&mut buf).unwrap();
        assert_eq!(buf, [0; 4]);
    }
}
