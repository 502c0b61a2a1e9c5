//! Fairness report and verification export payloads.

use super::statistics::FairnessStatistics;
use crate::engine::{DrawStatistics, VerificationRecord};
use crate::source::SourceStrength;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Seed characters shown in reports and exports.
const SEED_PARTIAL_LEN: usize = 16;

/// Abbreviated seed, safe to show publicly.
pub fn seed_partial(seed: &str) -> String {
    let prefix: String = seed.chars().take(SEED_PARTIAL_LEN).collect();
    format!("{}...", prefix)
}

/// Inclusive number range of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberRange {
    /// Smallest drawable number.
    pub min: u32,
    /// Largest drawable number.
    pub max: u32,
}

/// Confidence band derived from the fairness score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfidenceLevel {
    /// Score of at least 90 with every draw verified.
    VeryHigh,
    /// Score of at least 75 with every draw verified.
    Good,
    /// Score of at least 60; review recommended.
    Acceptable,
    /// Anything lower, or failed verification below 60.
    Investigate,
    /// No draws yet.
    InsufficientData,
}

impl ConfidenceLevel {
    /// Maps a score and verification outcome to a band.
    pub fn assess(score: u8, all_verified: bool, total_draws: usize) -> Self {
        if total_draws == 0 {
            ConfidenceLevel::InsufficientData
        } else if score >= 90 && all_verified {
            ConfidenceLevel::VeryHigh
        } else if score >= 75 && all_verified {
            ConfidenceLevel::Good
        } else if score >= 60 {
            ConfidenceLevel::Acceptable
        } else {
            ConfidenceLevel::Investigate
        }
    }

    /// Verdict text in English.
    pub fn english(&self) -> &'static str {
        match self {
            ConfidenceLevel::VeryHigh => {
                "The game shows very high confidence of fairness. All draws verified and the distribution is consistent with randomness."
            }
            ConfidenceLevel::Good => {
                "The game shows good confidence of fairness. All draws verified with minor statistical deviations."
            }
            ConfidenceLevel::Acceptable => {
                "The game shows acceptable fairness, but a manual review is recommended."
            }
            ConfidenceLevel::Investigate => {
                "The game shows anomalies that should be investigated before its results are trusted."
            }
            ConfidenceLevel::InsufficientData => {
                "No draws have been made yet; fairness cannot be assessed."
            }
        }
    }

    /// Verdict text in Spanish.
    pub fn spanish(&self) -> &'static str {
        match self {
            ConfidenceLevel::VeryHigh => {
                "El juego muestra una confianza muy alta de imparcialidad. Todos los sorteos verificados y la distribución es coherente con el azar."
            }
            ConfidenceLevel::Good => {
                "El juego muestra una buena confianza de imparcialidad. Todos los sorteos verificados con desviaciones estadísticas menores."
            }
            ConfidenceLevel::Acceptable => {
                "El juego muestra una imparcialidad aceptable, pero se recomienda una revisión manual."
            }
            ConfidenceLevel::Investigate => {
                "El juego muestra anomalías que deben investigarse antes de confiar en sus resultados."
            }
            ConfidenceLevel::InsufficientData => {
                "Aún no se han realizado sorteos; no es posible evaluar la imparcialidad."
            }
        }
    }
}

/// Human-readable verdict in English and Spanish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conclusion {
    /// Band the texts describe.
    pub level: ConfidenceLevel,
    /// English text.
    pub en: String,
    /// Spanish text.
    pub es: String,
}

impl From<ConfidenceLevel> for Conclusion {
    fn from(level: ConfidenceLevel) -> Self {
        Self {
            level,
            en: level.english().to_string(),
            es: level.spanish().to_string(),
        }
    }
}

/// Recomputed-on-demand fairness snapshot.
///
/// The score is an advisory heuristic, not a certification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FairnessReport {
    /// Audited game.
    pub game_id: String,
    /// Draws in the history, duplicates included.
    pub total_draws: usize,
    /// Abbreviated seed; see [`seed_partial`].
    pub seed_used: String,
    /// Configured number range.
    pub number_range: NumberRange,
    /// Count per value, zero for values never drawn.
    pub distribution: BTreeMap<u32, u64>,
    /// Statistical test results.
    pub statistics: FairnessStatistics,
    /// Verification outcome per draw id.
    pub draw_verifications: BTreeMap<u64, bool>,
    /// True when every draw verified.
    pub all_draws_verified: bool,
    /// Heuristic score (0-100).
    pub fairness_score: u8,
    /// Strength of the source that seeded the pool.
    pub entropy_source: SourceStrength,
    /// Verdict derived from the score.
    pub conclusion: Conclusion,
    /// Broken thresholds, rendered as text.
    pub findings: Vec<String>,
    /// Report creation time.
    pub generated_at: DateTime<Utc>,
}

/// Result of verifying every draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSummary {
    /// Logical AND of all results; true for an empty history.
    pub verified: bool,
    /// Outcome per draw id.
    pub results: BTreeMap<u64, bool>,
}

impl VerificationSummary {
    /// Number of draws that failed verification.
    pub fn failed(&self) -> usize {
        self.results.values().filter(|&&ok| !ok).count()
    }
}

/// Package handed to external auditors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationExport {
    /// Exported game.
    pub game_id: String,
    /// Digest of the full seed under the game's hash algorithm.
    pub seed_hash: String,
    /// Abbreviated seed; see [`seed_partial`].
    pub seed_partial: String,
    /// Draws in the history.
    pub draw_count: usize,
    /// Every stored verification record, by draw id.
    pub verification_data: Vec<VerificationRecord>,
    /// Export time in epoch milliseconds.
    pub timestamp: i64,
    /// Milliseconds since the engine was created.
    pub running_time: i64,
    /// Distinct and total draw counts.
    pub statistics: DrawStatistics,
    /// Full seed. Present only on explicit request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_complete: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_bands() {
        assert_eq!(ConfidenceLevel::assess(95, true, 10), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::assess(95, false, 10), ConfidenceLevel::Acceptable);
        assert_eq!(ConfidenceLevel::assess(80, true, 10), ConfidenceLevel::Good);
        assert_eq!(ConfidenceLevel::assess(60, true, 10), ConfidenceLevel::Acceptable);
        assert_eq!(ConfidenceLevel::assess(59, true, 10), ConfidenceLevel::Investigate);
        assert_eq!(ConfidenceLevel::assess(40, false, 10), ConfidenceLevel::Investigate);
        assert_eq!(ConfidenceLevel::assess(100, true, 0), ConfidenceLevel::InsufficientData);
    }

    #[test]
    fn test_conclusion_is_bilingual() {
        let conclusion = Conclusion::from(ConfidenceLevel::Good);
        assert!(conclusion.en.contains("good confidence"));
        assert!(conclusion.es.contains("buena confianza"));
    }

    #[test]
    fn test_seed_partial() {
        assert_eq!(seed_partial("0123456789abcdef0011"), "0123456789abcdef...");
        assert_eq!(seed_partial("abc"), "abc...");
    }

    #[test]
    fn test_summary_failed_count() {
        let summary = VerificationSummary {
            verified: false,
            results: [(1, true), (2, false), (3, false)].into_iter().collect(),
        };
        assert_eq!(summary.failed(), 2);
    }
}
