//! Verification hashing.
//!
//! Binds a draw to its game and proof snippet. The default two-pass
//! djb2 mixer is kept for compatibility with previously issued records
//! and only catches naive tampering. BLAKE3 and SHA-256 are available
//! for new games that do not need to match older hashes.

use blake3::Hasher as Blake3Hasher;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Seed characters mixed in front of every message.
const SEED_PREFIX_LEN: usize = 16;
/// Game id characters mixed after every message.
const GAME_SUFFIX_LEN: usize = 8;
/// Width of the zero-padded djb2 output.
const DJB2_HEX_WIDTH: usize = 12;

/// Supported verification hash algorithms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// Two-pass djb2. Not collision resistant; compatible default.
    #[default]
    Djb2,
    /// BLAKE3 keyed with the hash of the game seed.
    Blake3,
    /// SHA-256 over the seed followed by the message.
    Sha256,
}

/// Lowercase hex encoding.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// djb2 over UTF-16 code units with a wrapping signed 32-bit accumulator.
fn djb2(input: &str) -> i32 {
    input.encode_utf16().fold(5381i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_add(hash)
            .wrapping_add(i32::from(unit))
    })
}

/// Signed hex rendering: `-` followed by the magnitude for negatives.
fn signed_hex(value: i32) -> String {
    if value < 0 {
        format!("-{:x}", value.unsigned_abs())
    } else {
        format!("{:x}", value)
    }
}

/// Two-pass djb2, hex-encoded and zero-padded to twelve characters.
pub fn djb2_two_pass(input: &str) -> String {
    let first = djb2(input);
    let second = djb2(&signed_hex(first));
    format!("{:0width$x}", second.unsigned_abs(), width = DJB2_HEX_WIDTH)
}

/// Computes verification hashes for one game.
///
/// Holds the seed and game id so every record of the game is salted
/// the same way.
#[derive(Clone)]
pub struct VerificationHasher {
    algorithm: HashAlgorithm,
    seed: String,
    game_id: String,
}

impl VerificationHasher {
    /// Creates a hasher for the given game.
    pub fn new(algorithm: HashAlgorithm, seed: impl Into<String>, game_id: impl Into<String>) -> Self {
        Self {
            algorithm,
            seed: seed.into(),
            game_id: game_id.into(),
        }
    }

    /// Returns the configured algorithm.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Returns the game id this hasher is bound to.
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    fn seed_prefix(&self) -> &str {
        let end = self
            .seed
            .char_indices()
            .nth(SEED_PREFIX_LEN)
            .map(|(i, _)| i)
            .unwrap_or(self.seed.len());
        &self.seed[..end]
    }

    fn game_suffix(&self) -> &str {
        let count = self.game_id.chars().count();
        let start = self
            .game_id
            .char_indices()
            .nth(count.saturating_sub(GAME_SUFFIX_LEN))
            .map(|(i, _)| i)
            .unwrap_or(0);
        &self.game_id[start..]
    }

    /// The string bound by a verification hash.
    pub fn message(&self, draw_id: u64, number: u32, proof: &str) -> String {
        format!(
            "{}:{}-{}-{}-{}:{}",
            self.seed_prefix(),
            self.game_id,
            draw_id,
            number,
            proof,
            self.game_suffix()
        )
    }

    /// Hashes one draw into its verification hash.
    pub fn hash_draw(&self, draw_id: u64, number: u32, proof: &str) -> String {
        self.digest_str(&self.message(draw_id, number, proof))
    }

    /// Hashes an arbitrary string with the configured algorithm.
    pub fn digest_str(&self, input: &str) -> String {
        match self.algorithm {
            HashAlgorithm::Djb2 => djb2_two_pass(input),
            HashAlgorithm::Blake3 => {
                let key = *blake3::hash(self.seed.as_bytes()).as_bytes();
                let mut hasher = Blake3Hasher::new_keyed(&key);
                hasher.update(input.as_bytes());
                hasher.finalize().to_hex().to_string()
            }
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(self.seed.as_bytes());
                hasher.update(input.as_bytes());
                to_hex(&hasher.finalize())
            }
        }
    }
}

impl std::fmt::Debug for VerificationHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationHasher")
            .field("algorithm", &self.algorithm)
            .field("game_id", &self.game_id)
            .finish_non_exhaustive()
    }
}
