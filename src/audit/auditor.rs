//! Draw verification and fairness reporting.
//!
//! The auditor only ever reads engine state. Verification is a pure
//! recomputation, so repeated calls without new draws always agree.

use super::report::{
    seed_partial, Conclusion, ConfidenceLevel, FairnessReport, NumberRange, VerificationExport,
    VerificationSummary,
};
use super::statistics::{distribution, FairnessStatistics};
use super::threshold::FairnessThresholds;
use crate::engine::EntropyEngine;
use crate::source::LogLevel;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

/// Auditor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditorConfig {
    /// Verify the existing history when an auditor is created.
    pub auto_verify: bool,
    /// Base URL of a server holding its own copy of the records.
    pub remote_endpoint: Option<String>,
    /// Timeout for remote cross-checks, in milliseconds.
    pub remote_timeout_ms: u64,
    /// Statistical test limits and score weights.
    pub thresholds: FairnessThresholds,
}

impl Default for AuditorConfig {
    fn default() -> Self {
        Self {
            auto_verify: true,
            remote_endpoint: None,
            remote_timeout_ms: 3000,
            thresholds: FairnessThresholds::default(),
        }
    }
}

/// Verifies draws and produces fairness reports for one engine.
///
/// Borrowing the engine makes it impossible to audit without one and
/// guarantees the auditor cannot change what it audits.
pub struct FairnessAuditor<'a> {
    engine: &'a EntropyEngine,
    config: AuditorConfig,
}

impl<'a> FairnessAuditor<'a> {
    /// Creates an auditor over `engine`.
    pub fn new(engine: &'a EntropyEngine, config: AuditorConfig) -> Self {
        let auditor = Self { engine, config };

        if auditor.config.auto_verify && engine.draw_count() > 0 {
            let summary = auditor.verify_all_draws();
            if summary.verified {
                tracing::info!(
                    game_id = engine.game_id(),
                    draws = summary.results.len(),
                    "All draws verified"
                );
            } else {
                tracing::error!(
                    game_id = engine.game_id(),
                    failed = summary.failed(),
                    "Draw verification failed"
                );
            }
        }

        auditor
    }

    /// Creates an auditor with default settings.
    pub fn with_defaults(engine: &'a EntropyEngine) -> Self {
        Self::new(engine, AuditorConfig::default())
    }

    /// Returns the audited engine.
    pub fn engine(&self) -> &'a EntropyEngine {
        self.engine
    }

    /// Returns the auditor configuration.
    pub fn config(&self) -> &AuditorConfig {
        &self.config
    }

    /// Recomputes the hash of `draw_id` and compares it to the stored one.
    ///
    /// Fails closed: a missing record or disabled verification yields
    /// `false`, never an error.
    pub fn verify_draw(&self, draw_id: u64) -> bool {
        let log = self.engine.log();

        if !self.engine.is_verification_enabled() {
            log.record(
                LogLevel::Error,
                "Verification is disabled for this game",
                json!({ "drawId": draw_id }),
            );
            return false;
        }

        let Some(record) = self.engine.verification_record(draw_id) else {
            log.record(
                LogLevel::Error,
                "No verification record for draw",
                json!({ "drawId": draw_id }),
            );
            return false;
        };

        let expected = self
            .engine
            .hasher()
            .hash_draw(draw_id, record.number(), record.proof());
        let verified = expected == record.verification_hash() && record.draw_id() == draw_id;

        if verified {
            log.record(
                LogLevel::Debug,
                "Draw verified",
                json!({ "drawId": draw_id }),
            );
        } else {
            log.record(
                LogLevel::Error,
                "Verification hash mismatch",
                json!({
                    "drawId": draw_id,
                    "stored": record.verification_hash(),
                    "recomputed": expected,
                }),
            );
        }

        verified
    }

    /// Verifies draws `1..=N`.
    pub fn verify_all_draws(&self) -> VerificationSummary {
        let results: BTreeMap<u64, bool> = (1..=self.engine.draw_count() as u64)
            .map(|id| (id, self.verify_draw(id)))
            .collect();
        let verified = results.values().all(|&ok| ok);

        VerificationSummary { verified, results }
    }

    /// Builds a fresh fairness report from the current history.
    pub fn generate_fairness_report(&self) -> FairnessReport {
        let engine = self.engine;
        let config = engine.config();
        let thresholds = &self.config.thresholds;

        let numbers: Vec<u32> = engine.draw_history().iter().map(|d| d.number).collect();
        let distribution = distribution(&numbers, config.min_value, config.max_value);
        let statistics =
            FairnessStatistics::analyze(&numbers, &distribution, config.range_size(), thresholds);

        let summary = self.verify_all_draws();
        let total_draws = numbers.len();
        let fairness_score = self.fairness_score(&statistics, &summary);
        let level = ConfidenceLevel::assess(fairness_score, summary.verified, total_draws);

        let findings = thresholds
            .check(&statistics, summary.failed())
            .iter()
            .map(|v| v.to_string())
            .collect();

        tracing::debug!(
            game_id = engine.game_id(),
            total_draws,
            fairness_score,
            chi_squared = statistics.chi_squared,
            runs_z = statistics.runs_test.z_score,
            "Fairness report generated"
        );

        FairnessReport {
            game_id: engine.game_id().to_string(),
            total_draws,
            seed_used: seed_partial(engine.seed()),
            number_range: NumberRange {
                min: config.min_value,
                max: config.max_value,
            },
            distribution,
            statistics,
            all_draws_verified: summary.verified,
            draw_verifications: summary.results,
            fairness_score,
            entropy_source: engine.entropy_strength(),
            conclusion: Conclusion::from(level),
            findings,
            generated_at: Utc::now(),
        }
    }

    /// Heuristic 0-100 score. Advisory only.
    fn fairness_score(&self, statistics: &FairnessStatistics, summary: &VerificationSummary) -> u8 {
        let thresholds = &self.config.thresholds;
        let distribution_score = statistics.distribution_score(thresholds);

        let verification_score = if summary.results.is_empty() {
            100.0
        } else {
            let passed = summary.results.len() - summary.failed();
            100.0 * passed as f64 / summary.results.len() as f64
        };

        let score = thresholds.distribution_weight * distribution_score
            + thresholds.verification_weight * verification_score;
        score.round().clamp(0.0, 100.0) as u8
    }

    /// Packages verification records for an external audit.
    ///
    /// With `include_seed` the full seed is attached. Whoever holds it
    /// can reason about pool state, so only hand such exports to
    /// trusted parties.
    pub fn export_verification_data(&self, include_seed: bool) -> VerificationExport {
        let engine = self.engine;

        let seed_complete = if include_seed {
            tracing::warn!(
                game_id = engine.game_id(),
                "Exporting complete seed; holders can predict pool state"
            );
            Some(engine.seed().to_string())
        } else {
            None
        };

        VerificationExport {
            game_id: engine.game_id().to_string(),
            seed_hash: engine.hasher().digest_str(engine.seed()),
            seed_partial: seed_partial(engine.seed()),
            draw_count: engine.draw_count(),
            verification_data: engine.verification_records().values().cloned().collect(),
            timestamp: Utc::now().timestamp_millis(),
            running_time: engine.running_time_ms(),
            statistics: engine.statistics(),
            seed_complete,
        }
    }
}

impl std::fmt::Debug for FairnessAuditor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FairnessAuditor")
            .field("game_id", &self.engine.game_id())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixture_engine;
    use crate::pool::HashAlgorithm;
    use crate::source::{EngineConfig, FixedEntropySource};

    fn engine_with_algorithm(algorithm: HashAlgorithm) -> EntropyEngine {
        let config = EngineConfig {
            game_id: Some("game-upgrade-0001".into()),
            hash_algorithm: algorithm,
            ..EngineConfig::with_range(1, 90)
        };
        EntropyEngine::with_source(config, Box::new(FixedEntropySource::counting(251))).unwrap()
    }

    fn assert_algorithm_verifies_and_detects_tampering(algorithm: HashAlgorithm) {
        let mut engine = engine_with_algorithm(algorithm);
        for _ in 0..6 {
            engine.generate_number();
        }
        assert_eq!(engine.hasher().algorithm(), algorithm);

        {
            let auditor = FairnessAuditor::with_defaults(&engine);
            assert!(auditor.verify_all_draws().verified);
            assert!(auditor.generate_fairness_report().all_draws_verified);
        }

        let record = engine.record_mut(4).unwrap();
        let mut proof = record.proof.clone().into_bytes();
        proof[5] = if proof[5] == b'a' { b'b' } else { b'a' };
        record.proof = String::from_utf8(proof).unwrap();

        let auditor = FairnessAuditor::with_defaults(&engine);
        assert!(!auditor.verify_draw(4));
        assert_eq!(auditor.verify_all_draws().failed(), 1);
    }

    #[test]
    fn test_ten_draw_scenario() {
        let mut engine = fixture_engine(1, 90);
        for _ in 0..10 {
            engine.generate_number();
        }
        assert_eq!(engine.draw_history().len(), 10);

        let auditor = FairnessAuditor::with_defaults(&engine);
        assert!((1..=10).all(|id| auditor.verify_draw(id)));

        let report = auditor.generate_fairness_report();
        assert_eq!(report.total_draws, 10);
        assert_eq!(report.distribution.values().sum::<u64>(), 10);
        assert_eq!(report.distribution.len(), 90);
        assert!(report.all_draws_verified);
        assert_eq!(report.draw_verifications.len(), 10);
        assert!(report.fairness_score <= 100);
    }

    #[test]
    fn test_tamper_detection_on_proof() {
        let mut engine = fixture_engine(1, 90);
        for _ in 0..5 {
            engine.generate_number();
        }

        // Flip one bit of the first proof character
        let record = engine.record_mut(3).unwrap();
        let mut proof = record.proof.clone().into_bytes();
        proof[0] = if proof[0] == b'0' { b'1' } else { b'0' };
        record.proof = String::from_utf8(proof).unwrap();

        let auditor = FairnessAuditor::with_defaults(&engine);
        assert!(!auditor.verify_draw(3));
        for id in [1, 2, 4, 5] {
            assert!(auditor.verify_draw(id));
        }

        let summary = auditor.verify_all_draws();
        assert!(!summary.verified);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.results[&3], false);
    }

    #[test]
    fn test_tamper_detection_on_number_and_hash() {
        let mut engine = fixture_engine(1, 90);
        for _ in 0..3 {
            engine.generate_number();
        }

        let record = engine.record_mut(1).unwrap();
        record.number = if record.number == 90 { 1 } else { record.number + 1 };
        engine.record_mut(2).unwrap().verification_hash = "000000000000".into();

        let auditor = FairnessAuditor::with_defaults(&engine);
        assert!(!auditor.verify_draw(1));
        assert!(!auditor.verify_draw(2));
        assert!(auditor.verify_draw(3));
    }

    #[test]
    fn test_verify_is_idempotent() {
        let mut engine = fixture_engine(1, 90);
        engine.generate_number();
        let auditor = FairnessAuditor::with_defaults(&engine);

        let first = auditor.verify_draw(1);
        assert_eq!(first, auditor.verify_draw(1));
        assert_eq!(first, auditor.verify_draw(1));
        assert!(!auditor.verify_draw(2));
        assert!(!auditor.verify_draw(2));
    }

    #[test]
    fn test_missing_record_fails_closed() {
        let engine = fixture_engine(1, 90);
        let auditor = FairnessAuditor::with_defaults(&engine);
        assert!(!auditor.verify_draw(1));
        assert!(!auditor.verify_draw(0));
    }

    #[test]
    fn test_failed_verifications_reach_game_log() {
        let mut engine = fixture_engine(1, 90);
        engine.generate_number();
        engine.generate_number();
        engine.record_mut(2).unwrap().verification_hash = "000000000000".into();

        let config = AuditorConfig {
            auto_verify: false,
            ..Default::default()
        };
        let auditor = FairnessAuditor::new(&engine, config);
        let before = engine.log_summary();

        assert!(!auditor.verify_draw(99));
        assert!(!auditor.verify_draw(2));
        assert!(auditor.verify_draw(1));

        let after = engine.log_summary();
        assert_eq!(after.error, before.error + 2);

        let messages: Vec<String> = engine
            .log()
            .entries()
            .into_iter()
            .filter(|e| e.level == LogLevel::Error)
            .map(|e| e.message)
            .collect();
        assert!(messages.iter().any(|m| m == "No verification record for draw"));
        assert!(messages.iter().any(|m| m == "Verification hash mismatch"));
    }

    #[test]
    fn test_successful_verification_logged_at_debug() {
        let config = EngineConfig {
            game_id: Some("game-debug-0001".into()),
            log_level: LogLevel::Debug,
            ..EngineConfig::with_range(1, 90)
        };
        let mut engine =
            EntropyEngine::with_source(config, Box::new(FixedEntropySource::counting(251))).unwrap();
        engine.generate_number();
        let before = engine.log_summary().debug;

        assert!(FairnessAuditor::with_defaults(&engine).verify_draw(1));
        // One entry from auto-verify, one from the explicit call
        assert_eq!(engine.log_summary().debug, before + 2);
    }

    #[test]
    fn test_blake3_records_verify_and_detect_tampering() {
        assert_algorithm_verifies_and_detects_tampering(HashAlgorithm::Blake3);
    }

    #[test]
    fn test_sha256_records_verify_and_detect_tampering() {
        assert_algorithm_verifies_and_detects_tampering(HashAlgorithm::Sha256);
    }

    #[test]
    fn test_verification_disabled_fails_closed() {
        let config = EngineConfig {
            verification_enabled: false,
            ..Default::default()
        };
        let mut engine =
            EntropyEngine::with_source(config, Box::new(FixedEntropySource::counting(73))).unwrap();
        engine.generate_number();
        engine.generate_number();

        let auditor = FairnessAuditor::with_defaults(&engine);
        assert!(!auditor.verify_draw(1));

        let report = auditor.generate_fairness_report();
        assert!(!report.all_draws_verified);
        // Verification score contributes nothing
        assert!(report.fairness_score <= 40);
    }

    #[test]
    fn test_empty_history_vacuously_verified() {
        let engine = fixture_engine(1, 90);
        let auditor = FairnessAuditor::with_defaults(&engine);

        let summary = auditor.verify_all_draws();
        assert!(summary.verified);
        assert!(summary.results.is_empty());

        let report = auditor.generate_fairness_report();
        assert_eq!(report.fairness_score, 100);
        assert_eq!(report.conclusion.level, ConfidenceLevel::InsufficientData);
    }

    #[test]
    fn test_report_deterministic_without_new_draws() {
        let mut engine = fixture_engine(1, 90);
        for _ in 0..40 {
            engine.generate_number();
        }
        let auditor = FairnessAuditor::with_defaults(&engine);

        let a = auditor.generate_fairness_report();
        let b = auditor.generate_fairness_report();
        assert_eq!(a.distribution, b.distribution);
        assert_eq!(a.statistics, b.statistics);
        assert_eq!(a.fairness_score, b.fairness_score);
        assert_eq!(
            serde_json::to_string(&a.statistics).unwrap(),
            serde_json::to_string(&b.statistics).unwrap()
        );
    }

    #[test]
    fn test_report_json_shape() {
        let mut engine = fixture_engine(1, 90);
        engine.generate_number();
        let report = FairnessAuditor::with_defaults(&engine).generate_fairness_report();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["gameId"], "game-fixture-0001");
        assert_eq!(json["numberRange"]["min"], 1);
        assert_eq!(json["numberRange"]["max"], 90);
        assert!(json["statistics"]["chiSquaredThreshold"].is_number());
        assert!(json["statistics"]["runsTest"]["zScore"].is_number());
        assert!(json["statistics"]["patternDetection"]["suspicious"].is_boolean());
        assert_eq!(json["drawVerifications"]["1"], true);
        assert_eq!(json["entropySource"], "deterministic");
    }

    #[test]
    fn test_export_hides_seed_by_default() {
        let mut engine = fixture_engine(1, 90);
        for _ in 0..4 {
            engine.generate_number();
        }
        let auditor = FairnessAuditor::with_defaults(&engine);

        let export = auditor.export_verification_data(false);
        assert_eq!(export.draw_count, 4);
        assert_eq!(export.verification_data.len(), 4);
        assert_eq!(export.statistics.total_draws, 4);
        assert!(export.seed_complete.is_none());
        assert!(!export.seed_hash.contains(engine.seed()));
        assert_eq!(export.seed_partial.len(), 16 + 3);

        let json = serde_json::to_value(&export).unwrap();
        assert!(json.get("seedComplete").is_none());
        assert_eq!(json["verificationData"][0]["drawId"], 1);
    }

    #[test]
    fn test_export_with_seed() {
        let engine = fixture_engine(1, 90);
        let export = FairnessAuditor::with_defaults(&engine).export_verification_data(true);
        assert_eq!(export.seed_complete.as_deref(), Some(engine.seed()));
    }

    #[test]
    fn test_full_verification_sets_score_floor() {
        let config = EngineConfig {
            game_id: Some("floor".into()),
            ..EngineConfig::with_range(1, 90)
        };
        let mut engine =
            EntropyEngine::with_source(config, Box::new(FixedEntropySource::new(vec![0u8])))
                .unwrap();
        for _ in 0..30 {
            engine.generate_number();
        }

        // Verification alone contributes 60 points
        let report = FairnessAuditor::with_defaults(&engine).generate_fairness_report();
        assert!(report.all_draws_verified);
        assert!(report.fairness_score >= 60);
        assert_ne!(report.conclusion.level, ConfidenceLevel::Investigate);
    }
}
