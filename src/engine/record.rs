//! Draw and verification record types.

use serde::{Deserialize, Serialize};

/// One drawn number.
///
/// Created once per draw and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draw {
    /// The drawn value.
    pub number: u32,
    /// Draw time in epoch milliseconds.
    pub timestamp: i64,
    /// 1-based position in the draw history.
    pub draw_id: u64,
}

/// Proof material bound to a single draw.
///
/// Fields are crate-private: once the engine has stored a record,
/// nothing outside the crate can alter it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRecord {
    pub(crate) draw_id: u64,
    pub(crate) number: u32,
    pub(crate) timestamp: i64,
    /// Hex-encoded pool snippet captured after the draw.
    pub(crate) proof: String,
    pub(crate) verification_hash: String,
}

impl VerificationRecord {
    /// Returns the draw this record belongs to.
    #[inline]
    pub fn draw_id(&self) -> u64 {
        self.draw_id
    }

    /// Returns the recorded number.
    #[inline]
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Returns the draw timestamp in epoch milliseconds.
    #[inline]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Returns the hex-encoded proof snippet.
    #[inline]
    pub fn proof(&self) -> &str {
        &self.proof
    }

    /// Returns the stored verification hash.
    #[inline]
    pub fn verification_hash(&self) -> &str {
        &self.verification_hash
    }
}

/// Summary counts over a draw history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawStatistics {
    /// Distinct values drawn so far.
    pub unique_numbers: usize,
    /// All draws, duplicates included.
    pub total_draws: usize,
}
