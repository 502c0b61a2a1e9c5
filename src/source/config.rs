//! Engine and auditor configuration.
//!
//! The number range, pool geometry and verification switches are fixed
//! for the lifetime of a game. Changing any of them mid-game would break
//! the link between past draws and their verification records.

use crate::audit::AuditorConfig;
use crate::pool::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Smallest pool that can hold a full proof snippet with room to spare.
pub const MIN_POOL_SIZE: usize = 64;

/// Largest supported entropy pool, in bytes.
pub const MAX_POOL_SIZE: usize = 1 << 20;

/// Largest supported number of distinct values.
///
/// Reports carry one distribution entry per value, so the range bounds
/// report size.
pub const MAX_RANGE_SIZE: u64 = 1 << 16;

/// Minimum severity recorded by the game log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-draw detail.
    Debug,
    /// Lifecycle events.
    #[default]
    Info,
    /// Degraded operation (e.g. weak entropy fallback).
    Warn,
    /// Failed verification and similar.
    Error,
}

impl LogLevel {
    /// Lowercase level name as written to log sinks.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Construction options for an [`EntropyEngine`](crate::engine::EntropyEngine).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Smallest number that can be drawn (inclusive).
    pub min_value: u32,
    /// Largest number that can be drawn (inclusive).
    pub max_value: u32,
    /// Number of pool bytes hex-encoded into the game seed.
    pub seed_length: usize,
    /// Size of the entropy pool in bytes.
    pub entropy_pool_size: usize,
    /// Create a verification record for every draw.
    pub verification_enabled: bool,
    /// Record entries in the game log.
    pub log_results: bool,
    /// Minimum level recorded in the game log.
    pub log_level: LogLevel,
    /// Game identifier. Generated as `game-<time36>-<rand>` when absent.
    pub game_id: Option<String>,
    /// Hash used for verification records and the exported seed hash.
    pub hash_algorithm: HashAlgorithm,
    /// Append-only JSON lines file for the game log.
    pub log_file: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_value: 1,
            max_value: 90,
            seed_length: 256,
            entropy_pool_size: 1024,
            verification_enabled: true,
            log_results: true,
            log_level: LogLevel::Info,
            game_id: None,
            hash_algorithm: HashAlgorithm::Djb2,
            log_file: None,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration for the given inclusive range.
    pub fn with_range(min_value: u32, max_value: u32) -> Self {
        Self {
            min_value,
            max_value,
            ..Default::default()
        }
    }

    /// Number of distinct values in `[min_value, max_value]`.
    pub fn range_size(&self) -> u64 {
        u64::from(self.max_value.saturating_sub(self.min_value)) + 1
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_value >= self.max_value {
            return Err(ConfigError::InvalidRange {
                min: self.min_value,
                max: self.max_value,
            });
        }
        if self.range_size() > MAX_RANGE_SIZE {
            return Err(ConfigError::RangeTooLarge {
                size: self.range_size(),
                max: MAX_RANGE_SIZE,
            });
        }
        if self.entropy_pool_size < MIN_POOL_SIZE {
            return Err(ConfigError::InvalidPoolSize {
                size: self.entropy_pool_size,
                min: MIN_POOL_SIZE,
            });
        }
        if self.entropy_pool_size > MAX_POOL_SIZE {
            return Err(ConfigError::PoolTooLarge {
                size: self.entropy_pool_size,
                max: MAX_POOL_SIZE,
            });
        }
        if self.seed_length == 0 {
            return Err(ConfigError::InvalidSeedLength);
        }
        if self.seed_length > self.entropy_pool_size {
            return Err(ConfigError::SeedTooLong {
                seed_length: self.seed_length,
                pool_size: self.entropy_pool_size,
            });
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// `min_value` is not below `max_value`.
    #[error("invalid number range: min {min} must be below max {max}")]
    InvalidRange {
        /// Configured minimum.
        min: u32,
        /// Configured maximum.
        max: u32,
    },
    /// The range holds more values than [`MAX_RANGE_SIZE`].
    #[error("number range of {size} values exceeds the maximum of {max}")]
    RangeTooLarge {
        /// Values in the configured range.
        size: u64,
        /// Supported maximum.
        max: u64,
    },
    /// The pool is smaller than [`MIN_POOL_SIZE`].
    #[error("entropy pool of {size} bytes is below the minimum of {min}")]
    InvalidPoolSize {
        /// Configured pool size.
        size: usize,
        /// Supported minimum.
        min: usize,
    },
    /// The pool is larger than [`MAX_POOL_SIZE`].
    #[error("entropy pool of {size} bytes exceeds the maximum of {max}")]
    PoolTooLarge {
        /// Configured pool size.
        size: usize,
        /// Supported maximum.
        max: usize,
    },
    /// A zero-length seed.
    #[error("seed length must be at least one byte")]
    InvalidSeedLength,
    /// The seed would need more bytes than the pool holds.
    #[error("seed length {seed_length} exceeds the entropy pool size {pool_size}")]
    SeedTooLong {
        /// Configured seed length.
        seed_length: usize,
        /// Configured pool size.
        pool_size: usize,
    },
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The config file is not valid TOML for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// `[engine]` table.
    #[serde(default)]
    pub engine: EngineConfig,
    /// `[audit]` table.
    #[serde(default)]
    pub audit: AuditorConfig,
    /// `[output]` table.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration for the command-line driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Number of draws to perform.
    pub draws: u32,
    /// Draw distinct numbers only.
    pub unique: bool,
    /// Verification server port (0 to disable).
    pub server_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            draws: 75,
            unique: true,
            server_port: 0,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.engine.validate()?;
        Ok(config)
    }
}
