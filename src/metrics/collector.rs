//! Metrics collection and registry.

use crate::audit::FairnessReport;
use crate::engine::EntropyEngine;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of game state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Total draws, duplicates included.
    pub total_draws: u64,
    /// Distinct values drawn.
    pub unique_numbers: u64,
    /// Draws whose proof verifies.
    pub verified_draws: u64,
    /// Draws whose proof does not verify.
    pub failed_verifications: u64,
    /// Heuristic fairness score (0-100).
    pub fairness_score: u8,
    /// Chi-squared statistic of the distribution.
    pub chi_squared: f64,
    /// Runs test z-score.
    pub runs_z_score: f64,
    /// Pattern detection flagged the history.
    pub suspicious_patterns: bool,
    /// Pool was filled from a cryptographic source.
    pub entropy_source_strong: bool,
    /// Error entries in the game log.
    pub log_errors: u64,
}

/// Prometheus metrics registry for fairness monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    // Draw metrics
    draws_total: IntCounter,
    unique_numbers: IntGauge,

    // Verification metrics
    verified_draws: IntGauge,
    failed_verifications: IntGauge,

    // Fairness metrics
    fairness_score: IntGauge,
    chi_squared: Gauge,
    runs_z_score: Gauge,
    suspicious_patterns: IntGauge,

    // Engine metrics
    entropy_source_strong: IntGauge,
    log_errors: IntGauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all fairness metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let draws_total = IntCounter::new("bingo_draws_total", "Total numbers drawn")?;
        let unique_numbers =
            IntGauge::new("bingo_unique_numbers", "Distinct numbers drawn so far")?;

        let verified_draws = IntGauge::new(
            "bingo_verified_draws",
            "Draws whose verification hash recomputes correctly",
        )?;
        let failed_verifications = IntGauge::new(
            "bingo_failed_verifications",
            "Draws whose verification hash does not match",
        )?;

        let fairness_score = IntGauge::new(
            "bingo_fairness_score",
            "Advisory fairness score (0-100)",
        )?;
        let chi_squared = Gauge::new(
            "bingo_chi_squared",
            "Chi-squared statistic of the draw distribution",
        )?;
        let runs_z_score = Gauge::new("bingo_runs_z_score", "Runs test z-score")?;
        let suspicious_patterns = IntGauge::new(
            "bingo_suspicious_patterns",
            "Pattern detection flagged the draw history (1=yes, 0=no)",
        )?;

        let entropy_source_strong = IntGauge::new(
            "bingo_entropy_source_strong",
            "Entropy pool filled from a cryptographic source (1=yes, 0=no)",
        )?;
        let log_errors = IntGauge::new("bingo_log_errors", "Error entries in the game log")?;

        registry.register(Box::new(draws_total.clone()))?;
        registry.register(Box::new(unique_numbers.clone()))?;
        registry.register(Box::new(verified_draws.clone()))?;
        registry.register(Box::new(failed_verifications.clone()))?;
        registry.register(Box::new(fairness_score.clone()))?;
        registry.register(Box::new(chi_squared.clone()))?;
        registry.register(Box::new(runs_z_score.clone()))?;
        registry.register(Box::new(suspicious_patterns.clone()))?;
        registry.register(Box::new(entropy_source_strong.clone()))?;
        registry.register(Box::new(log_errors.clone()))?;

        Ok(Self {
            registry,
            draws_total,
            unique_numbers,
            verified_draws,
            failed_verifications,
            fairness_score,
            chi_squared,
            runs_z_score,
            suspicious_patterns,
            entropy_source_strong,
            log_errors,
        })
    }

    /// Updates all metrics from a snapshot.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        // Counters only move forward
        let current_draws = self.draws_total.get();
        if snapshot.total_draws > current_draws {
            self.draws_total.inc_by(snapshot.total_draws - current_draws);
        }
        self.unique_numbers.set(snapshot.unique_numbers as i64);

        self.verified_draws.set(snapshot.verified_draws as i64);
        self.failed_verifications
            .set(snapshot.failed_verifications as i64);

        self.fairness_score.set(i64::from(snapshot.fairness_score));
        self.chi_squared.set(snapshot.chi_squared);
        self.runs_z_score.set(snapshot.runs_z_score);
        self.suspicious_patterns
            .set(if snapshot.suspicious_patterns { 1 } else { 0 });

        self.entropy_source_strong
            .set(if snapshot.entropy_source_strong { 1 } else { 0 });
        self.log_errors.set(snapshot.log_errors as i64);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from an engine and a report generated over it.
    pub fn from_report(engine: &EntropyEngine, report: &FairnessReport) -> Self {
        let verified = report.draw_verifications.values().filter(|&&ok| ok).count() as u64;
        let stats = engine.statistics();

        Self {
            total_draws: stats.total_draws as u64,
            unique_numbers: stats.unique_numbers as u64,
            verified_draws: verified,
            failed_verifications: report.draw_verifications.len() as u64 - verified,
            fairness_score: report.fairness_score,
            chi_squared: report.statistics.chi_squared,
            runs_z_score: report.statistics.runs_test.z_score,
            suspicious_patterns: report.statistics.pattern_detection.suspicious,
            entropy_source_strong: engine.entropy_strength().is_strong(),
            log_errors: engine.log_summary().error as u64,
        }
    }
}
