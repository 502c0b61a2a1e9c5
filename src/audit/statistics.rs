//! Statistical checks over a draw history.
//!
//! These tests are coarse sanity checks, not proofs of fairness.
//! Passing them is necessary but not sufficient for a fair game.

use super::threshold::FairnessThresholds;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts occurrences of every value in `[min, max]`.
///
/// Values never drawn appear with a count of zero.
pub fn distribution(numbers: &[u32], min: u32, max: u32) -> BTreeMap<u32, u64> {
    let mut counts: BTreeMap<u32, u64> = (min..=max).map(|v| (v, 0)).collect();
    for n in numbers {
        if let Some(count) = counts.get_mut(n) {
            *count += 1;
        }
    }
    counts
}

/// Wald-Wolfowitz runs test above/below the median.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunsTestResult {
    /// Median of the drawn values.
    pub median: f64,
    /// Draws strictly above the median.
    pub above: usize,
    /// Draws strictly below the median.
    pub below: usize,
    /// Observed runs of same-side values.
    pub runs: usize,
    /// Runs expected for a random sequence.
    pub expected_runs: f64,
    /// Standard deviation of the run count.
    pub standard_deviation: f64,
    /// `(runs - expected_runs) / standard_deviation`.
    pub z_score: f64,
    /// False when one side is empty and no statistic can be formed.
    pub sufficient_data: bool,
    /// `|z_score|` within the critical value.
    pub is_random: bool,
}

impl RunsTestResult {
    /// Runs the test. Values equal to the median are skipped.
    pub fn analyze(numbers: &[u32], z_critical: f64) -> Self {
        let median = median(numbers);
        let signs: Vec<bool> = numbers
            .iter()
            .filter_map(|&n| {
                let v = f64::from(n);
                if v > median {
                    Some(true)
                } else if v < median {
                    Some(false)
                } else {
                    None
                }
            })
            .collect();

        let above = signs.iter().filter(|&&s| s).count();
        let below = signs.len() - above;
        let runs = if signs.is_empty() {
            0
        } else {
            1 + signs.windows(2).filter(|w| w[0] != w[1]).count()
        };

        let n1 = above as f64;
        let n2 = below as f64;
        let n = n1 + n2;
        let product = 2.0 * n1 * n2;

        let variance = if above > 0 && below > 0 {
            product * (product - n) / (n * n * (n - 1.0))
        } else {
            0.0
        };

        if variance <= 0.0 {
            return Self {
                median,
                above,
                below,
                runs,
                expected_runs: runs as f64,
                standard_deviation: 0.0,
                z_score: 0.0,
                sufficient_data: false,
                is_random: true,
            };
        }

        let expected_runs = product / n + 1.0;
        let standard_deviation = variance.sqrt();
        let z_score = (runs as f64 - expected_runs) / standard_deviation;

        Self {
            median,
            above,
            below,
            runs,
            expected_runs,
            standard_deviation,
            z_score,
            sufficient_data: true,
            is_random: z_score.abs() < z_critical,
        }
    }
}

fn median(numbers: &[u32]) -> f64 {
    if numbers.is_empty() {
        return 0.0;
    }
    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (f64::from(sorted[mid - 1]) + f64::from(sorted[mid])) / 2.0
    } else {
        f64::from(sorted[mid])
    }
}

/// A value drawn several times in a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsecutiveRepeat {
    /// Repeated value.
    pub number: u32,
    /// 1-based position of the first draw in the run.
    pub start_draw: usize,
    /// Draws in the run.
    pub length: usize,
}

/// A subsequence that occurs more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatedSequence {
    /// The recurring values, in order.
    pub sequence: Vec<u32>,
    /// Times the sequence occurs, overlaps included.
    pub occurrences: usize,
    /// 1-based position of the first occurrence.
    pub first_draw: usize,
}

/// Immediate repeats and recurring subsequences.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternReport {
    /// Runs of one value longer than the allowed maximum.
    pub consecutive_repeats: Vec<ConsecutiveRepeat>,
    /// Subsequences occurring at least the configured number of times.
    pub repeated_sequences: Vec<RepeatedSequence>,
    /// Longest run of one value (0 for an empty history).
    pub max_consecutive: usize,
    /// Either list is non-empty.
    pub suspicious: bool,
}

impl PatternReport {
    /// Scans the history for repeats.
    pub fn analyze(numbers: &[u32], thresholds: &FairnessThresholds) -> Self {
        let mut consecutive_repeats = Vec::new();
        let mut max_consecutive = 0;

        let mut start = 0;
        while start < numbers.len() {
            let mut end = start + 1;
            while end < numbers.len() && numbers[end] == numbers[start] {
                end += 1;
            }
            let length = end - start;
            max_consecutive = max_consecutive.max(length);
            if length >= 2 {
                consecutive_repeats.push(ConsecutiveRepeat {
                    number: numbers[start],
                    start_draw: start + 1,
                    length,
                });
            }
            start = end;
        }

        let mut repeated_sequences = Vec::new();
        let min_len = thresholds.pattern_min_len.max(2);
        for len in min_len..=thresholds.pattern_max_len {
            // (occurrences, first index) per window
            let mut seen: BTreeMap<&[u32], (usize, usize)> = BTreeMap::new();
            for (i, window) in numbers.windows(len).enumerate() {
                seen.entry(window).or_insert((0, i)).0 += 1;
            }
            let mut found: Vec<RepeatedSequence> = seen
                .into_iter()
                .filter(|(_, (count, _))| *count >= thresholds.min_pattern_occurrences)
                .map(|(window, (occurrences, first))| RepeatedSequence {
                    sequence: window.to_vec(),
                    occurrences,
                    first_draw: first + 1,
                })
                .collect();
            found.sort_by_key(|s| s.first_draw);
            repeated_sequences.extend(found);
        }

        let suspicious = !repeated_sequences.is_empty()
            || max_consecutive > thresholds.max_consecutive_repeats;

        Self {
            consecutive_repeats,
            repeated_sequences,
            max_consecutive,
            suspicious,
        }
    }
}

/// Statistical bundle of a fairness report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FairnessStatistics {
    /// `total_draws / range_size`.
    pub expected_frequency: f64,
    /// Spread of per-value counts around the expected frequency.
    pub standard_deviation: f64,
    /// Spread a uniform multinomial would show: `sqrt(n p (1 - p))`.
    pub theoretical_standard_deviation: f64,
    /// Chi-squared statistic against a uniform distribution.
    pub chi_squared: f64,
    /// Heuristic pass threshold for `chi_squared`.
    pub chi_squared_threshold: f64,
    /// `chi_squared` is below the threshold.
    pub chi_squared_test: bool,
    /// Runs test above/below the median.
    pub runs_test: RunsTestResult,
    /// Repeat and subsequence detection.
    pub pattern_detection: PatternReport,
}

impl FairnessStatistics {
    /// Runs every check over `numbers` and its `distribution`.
    pub fn analyze(
        numbers: &[u32],
        distribution: &BTreeMap<u32, u64>,
        range_size: u64,
        thresholds: &FairnessThresholds,
    ) -> Self {
        let total = numbers.len() as f64;
        let range = range_size.max(1) as f64;
        let expected_frequency = total / range;

        let squared_deviation: f64 = distribution
            .values()
            .map(|&observed| (observed as f64 - expected_frequency).powi(2))
            .sum();
        let standard_deviation = (squared_deviation / range).sqrt();

        let chi_squared = if expected_frequency > 0.0 {
            squared_deviation / expected_frequency
        } else {
            0.0
        };
        let chi_squared_threshold = thresholds.chi_squared_threshold(range_size);

        let p = 1.0 / range;
        let theoretical_standard_deviation = (total * p * (1.0 - p)).sqrt();

        Self {
            expected_frequency,
            standard_deviation,
            theoretical_standard_deviation,
            chi_squared,
            chi_squared_threshold,
            chi_squared_test: chi_squared < chi_squared_threshold,
            runs_test: RunsTestResult::analyze(numbers, thresholds.runs_z_critical),
            pattern_detection: PatternReport::analyze(numbers, thresholds),
        }
    }

    /// Distribution score in `[0, 100]`.
    ///
    /// Blends how close the observed spread is to the theoretical one
    /// with the chi-squared pass/fail.
    pub fn distribution_score(&self, thresholds: &FairnessThresholds) -> f64 {
        let theoretical = self.theoretical_standard_deviation;
        let closeness = if theoretical > 0.0 {
            (1.0 - (self.standard_deviation - theoretical).abs() / theoretical).clamp(0.0, 1.0)
        } else if self.standard_deviation == 0.0 {
            1.0
        } else {
            0.0
        };
        let chi = if self.chi_squared_test { 1.0 } else { 0.0 };

        100.0 * (thresholds.std_dev_weight * closeness + thresholds.chi_squared_weight * chi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribution_covers_range() {
        let dist = distribution(&[2, 2, 5, 9], 1, 5);
        assert_eq!(dist.len(), 5);
        assert_eq!(dist[&1], 0);
        assert_eq!(dist[&2], 2);
        assert_eq!(dist[&5], 1);
        // Out-of-range values are ignored
        assert_eq!(dist.values().sum::<u64>(), 3);
    }

    #[test]
    fn test_uniform_counts_have_zero_chi_squared() {
        let numbers: Vec<u32> = (1..=10).chain(1..=10).collect();
        let dist = distribution(&numbers, 1, 10);
        let stats =
            FairnessStatistics::analyze(&numbers, &dist, 10, &FairnessThresholds::default());

        assert!((stats.expected_frequency - 2.0).abs() < 1e-9);
        assert_eq!(stats.chi_squared, 0.0);
        assert_eq!(stats.standard_deviation, 0.0);
        assert!(stats.chi_squared_test);
    }

    #[test]
    fn test_chi_squared_value() {
        // counts 4,0 over a range of 2: expected 2, chi = (4 + 4) / 2
        let numbers = [1, 1, 1, 1];
        let dist = distribution(&numbers, 1, 2);
        let stats =
            FairnessStatistics::analyze(&numbers, &dist, 2, &FairnessThresholds::default());

        assert!((stats.chi_squared - 4.0).abs() < 1e-9);
        assert!((stats.chi_squared_threshold - 3.0).abs() < 1e-9);
        assert!(!stats.chi_squared_test);
    }

    #[test]
    fn test_empty_history() {
        let dist = distribution(&[], 1, 90);
        let thresholds = FairnessThresholds::default();
        let stats = FairnessStatistics::analyze(&[], &dist, 90, &thresholds);

        assert_eq!(stats.expected_frequency, 0.0);
        assert!(stats.chi_squared_test);
        assert!(!stats.runs_test.sufficient_data);
        assert!(!stats.pattern_detection.suspicious);
        assert!((stats.distribution_score(&thresholds) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[5, 1, 3]), 3.0);
        assert_eq!(median(&[4, 1, 3, 2]), 2.5);
    }

    #[test]
    fn test_runs_alternating_sequence_not_random() {
        let numbers: Vec<u32> = (0..40).map(|i| if i % 2 == 0 { 10 } else { 80 }).collect();
        let result = RunsTestResult::analyze(&numbers, 1.96);

        assert_eq!(result.runs, 40);
        assert!(result.sufficient_data);
        assert!(result.z_score > 1.96);
        assert!(!result.is_random);
    }

    #[test]
    fn test_runs_two_blocks_not_random() {
        let numbers: Vec<u32> = (0..20).map(|i| if i < 10 { 5 } else { 60 }).collect();
        let result = RunsTestResult::analyze(&numbers, 1.96);

        assert_eq!(result.runs, 2);
        assert!(result.z_score < -1.96);
        assert!(!result.is_random);
    }

    #[test]
    fn test_runs_mixed_sequence_random() {
        let numbers = [1, 2, 4, 5, 3, 1, 5, 4, 3, 2];
        let result = RunsTestResult::analyze(&numbers, 1.96);

        assert_eq!(result.above, 4);
        assert_eq!(result.below, 4);
        assert_eq!(result.runs, 5);
        assert!((result.expected_runs - 5.0).abs() < 1e-9);
        assert!(result.is_random);
    }

    #[test]
    fn test_runs_constant_sequence_insufficient() {
        let result = RunsTestResult::analyze(&[7, 7, 7, 7], 1.96);
        assert!(!result.sufficient_data);
        assert!(result.is_random);
    }

    #[test]
    fn test_consecutive_repeats_detected() {
        let thresholds = FairnessThresholds::default();
        let report = PatternReport::analyze(&[3, 8, 8, 8, 8, 1], &thresholds);

        assert_eq!(report.max_consecutive, 4);
        assert_eq!(
            report.consecutive_repeats,
            vec![ConsecutiveRepeat {
                number: 8,
                start_draw: 2,
                length: 4
            }]
        );
        assert!(report.suspicious);
    }

    #[test]
    fn test_repeated_subsequence_detected() {
        let thresholds = FairnessThresholds::default();
        let report = PatternReport::analyze(&[10, 20, 30, 1, 10, 20, 30, 2], &thresholds);

        assert!(report.suspicious);
        assert!(report.repeated_sequences.contains(&RepeatedSequence {
            sequence: vec![10, 20, 30],
            occurrences: 2,
            first_draw: 1,
        }));
        assert!(report
            .repeated_sequences
            .iter()
            .all(|s| s.sequence.len() <= 3));
    }

    #[test]
    fn test_clean_history_not_suspicious() {
        let thresholds = FairnessThresholds::default();
        let report = PatternReport::analyze(&[1, 2, 4, 5, 3, 1, 5, 4, 3, 2], &thresholds);

        assert!(report.repeated_sequences.is_empty());
        assert!(report.consecutive_repeats.is_empty());
        assert_eq!(report.max_consecutive, 1);
        assert!(!report.suspicious);
    }
}
