//! Fairness thresholds and score weights.
//!
//! Every constant here is a heuristic inherited from the game's
//! published behaviour, not a derived critical value. Tune freely;
//! the resulting score is advisory.

use super::statistics::FairnessStatistics;
use serde::{Deserialize, Serialize};

/// Thresholds and weights used by the fairness auditor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FairnessThresholds {
    /// Chi-squared threshold is `range_size * chi_squared_multiplier`.
    pub chi_squared_multiplier: f64,
    /// Runs test accepts randomness when `|z|` is below this.
    pub runs_z_critical: f64,
    /// Longest tolerated run of one repeated value.
    pub max_consecutive_repeats: usize,
    /// Occurrences at which a subsequence counts as a repeated pattern.
    pub min_pattern_occurrences: usize,
    /// Shortest subsequence scanned for repeats.
    pub pattern_min_len: usize,
    /// Longest subsequence scanned for repeats.
    pub pattern_max_len: usize,
    /// Weight of the distribution score in the fairness score.
    pub distribution_weight: f64,
    /// Weight of the verification score in the fairness score.
    pub verification_weight: f64,
    /// Share of the distribution score from standard deviation closeness.
    pub std_dev_weight: f64,
    /// Share of the distribution score from the chi-squared check.
    pub chi_squared_weight: f64,
}

impl Default for FairnessThresholds {
    fn default() -> Self {
        Self {
            chi_squared_multiplier: 1.5,
            runs_z_critical: 1.96, // 95% two-sided, normal approximation
            max_consecutive_repeats: 3,
            min_pattern_occurrences: 2,
            pattern_min_len: 2,
            pattern_max_len: 5,
            distribution_weight: 0.4,
            verification_weight: 0.6,
            std_dev_weight: 0.7,
            chi_squared_weight: 0.3,
        }
    }
}

impl FairnessThresholds {
    /// Tighter chi-squared and runs limits.
    pub fn strict() -> Self {
        Self {
            chi_squared_multiplier: 1.2,
            runs_z_critical: 1.645,
            max_consecutive_repeats: 2,
            ..Default::default()
        }
    }

    /// Chi-squared threshold for a range of `range_size` values.
    pub fn chi_squared_threshold(&self, range_size: u64) -> f64 {
        range_size as f64 * self.chi_squared_multiplier
    }

    /// Lists every threshold the statistics and verification results break.
    pub fn check(
        &self,
        stats: &FairnessStatistics,
        failed_verifications: usize,
    ) -> Vec<FairnessViolation> {
        let mut violations = Vec::new();

        if !stats.chi_squared_test {
            violations.push(FairnessViolation::ChiSquared {
                observed: stats.chi_squared,
                threshold: stats.chi_squared_threshold,
            });
        }

        if !stats.runs_test.is_random {
            violations.push(FairnessViolation::RunsTest {
                z_score: stats.runs_test.z_score,
                critical: self.runs_z_critical,
            });
        }

        if stats.pattern_detection.suspicious {
            violations.push(FairnessViolation::SuspiciousPatterns {
                repeated_sequences: stats.pattern_detection.repeated_sequences.len(),
                max_consecutive: stats.pattern_detection.max_consecutive,
            });
        }

        if failed_verifications > 0 {
            violations.push(FairnessViolation::VerificationFailed {
                failed: failed_verifications,
            });
        }

        violations
    }
}

/// Threshold violation types.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FairnessViolation {
    /// Distribution too far from uniform.
    #[error("chi-squared {observed:.2} exceeds threshold {threshold:.2}")]
    ChiSquared {
        /// Observed statistic.
        observed: f64,
        /// Pass threshold.
        threshold: f64,
    },

    /// Too few or too many runs around the median.
    #[error("runs test z-score {z_score:.3} outside +/-{critical:.3}")]
    RunsTest {
        /// Observed z-score.
        z_score: f64,
        /// Critical value.
        critical: f64,
    },

    /// Recurring subsequences or long runs of one value.
    #[error("{repeated_sequences} repeated sequences, longest repeat run {max_consecutive}")]
    SuspiciousPatterns {
        /// Distinct recurring subsequences.
        repeated_sequences: usize,
        /// Longest run of one value.
        max_consecutive: usize,
    },

    /// Some draws do not verify.
    #[error("{failed} draws failed verification")]
    VerificationFailed {
        /// Draws whose hash does not match.
        failed: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::statistics::{distribution, FairnessStatistics};

    #[test]
    fn test_default_threshold_for_bingo_range() {
        let thresholds = FairnessThresholds::default();
        assert!((thresholds.chi_squared_threshold(90) - 135.0).abs() < 1e-9);
    }

    #[test]
    fn test_balanced_draws_pass() {
        let thresholds = FairnessThresholds::default();
        let numbers = [1, 2, 4, 5, 3, 1, 5, 4, 3, 2];
        let dist = distribution(&numbers, 1, 5);
        let stats = FairnessStatistics::analyze(&numbers, &dist, 5, &thresholds);

        assert!(thresholds.check(&stats, 0).is_empty());
    }

    #[test]
    fn test_skewed_draws_fail_chi_squared() {
        let thresholds = FairnessThresholds::default();
        let numbers = [1, 2, 1, 2, 1, 2, 1, 2, 1, 2, 1, 2];
        let dist = distribution(&numbers, 1, 5);
        let stats = FairnessStatistics::analyze(&numbers, &dist, 5, &thresholds);

        let violations = thresholds.check(&stats, 1);
        assert!(violations
            .iter()
            .any(|v| matches!(v, FairnessViolation::ChiSquared { .. })));
        assert!(violations
            .iter()
            .any(|v| matches!(v, FairnessViolation::VerificationFailed { failed: 1 })));
    }
}
