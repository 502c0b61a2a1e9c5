//! Entropy sources and engine configuration.
//!
//! This module provides the pluggable sources that seed the entropy
//! pool and the configuration that fixes a game's parameters. Sources
//! are injected explicitly so the weaker fallback path is a visible,
//! testable choice.

mod config;
mod entropy;

pub use config::{
    ConfigError, EngineConfig, FileConfig, LogLevel, OutputConfig, MAX_POOL_SIZE, MAX_RANGE_SIZE,
    MIN_POOL_SIZE,
};
#[cfg(test)]
pub(crate) use entropy::FailingEntropySource;
pub use entropy::{
    EntropySource, FallbackEntropySource, FixedEntropySource, OsEntropySource, SourceError,
    SourceStrength,
};
