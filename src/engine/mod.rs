//! Certified number generation.
//!
//! This module provides the [`EntropyEngine`], which draws numbers from
//! the entropy pool, keeps the ordered draw history, stores one
//! verification record per draw and maintains the structured game log.

mod generator;
mod log;
mod record;

#[cfg(test)]
pub(crate) use generator::tests::fixture_engine;
pub use generator::{EngineError, EntropyEngine, PROOF_LEN};
pub use log::{GameLog, JsonLinesSink, LogEntry, LogError, LogSink, LogSummary, NullSink};
pub use record::{Draw, DrawStatistics, VerificationRecord};
