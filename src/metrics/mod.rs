//! Prometheus metrics exporter for fairness monitoring.
//!
//! This module provides observability into a running game by exposing
//! metrics in Prometheus format, and (with the `server` feature) an HTTP
//! endpoint that also serves the published verification records.
//!
//! # Metrics Exposed
//!
//! ## Draw Metrics
//! - `bingo_draws_total` - Total numbers drawn
//! - `bingo_unique_numbers` - Distinct numbers drawn so far
//!
//! ## Verification Metrics
//! - `bingo_verified_draws` - Draws whose hash recomputes correctly
//! - `bingo_failed_verifications` - Draws whose hash does not match
//!
//! ## Fairness Metrics
//! - `bingo_fairness_score` - Advisory score (0-100)
//! - `bingo_chi_squared` - Chi-squared statistic
//! - `bingo_runs_z_score` - Runs test z-score
//! - `bingo_suspicious_patterns` - Pattern detection flag
//!
//! ## Engine Metrics
//! - `bingo_entropy_source_strong` - Cryptographic entropy source in use
//! - `bingo_log_errors` - Error entries in the game log
//!
//! # Example
//!
//! ```no_run
//! use bingo_fairness::audit::FairnessAuditor;
//! use bingo_fairness::engine::EntropyEngine;
//! use bingo_fairness::metrics::{MetricsRegistry, MetricsSnapshot};
//! use bingo_fairness::source::EngineConfig;
//!
//! let mut engine = EntropyEngine::new(EngineConfig::default()).expect("valid config");
//! engine.generate_number();
//!
//! let report = FairnessAuditor::with_defaults(&engine).generate_fairness_report();
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! registry.update(&MetricsSnapshot::from_report(&engine, &report));
//! ```

mod collector;
#[cfg(feature = "server")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "server")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError, VerificationState};
