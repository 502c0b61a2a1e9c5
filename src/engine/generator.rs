//! Entropy-pool number generator with per-draw verification records.
//!
//! # Draw Model
//!
//! Each draw reads four bytes at the pool cursor, reduces them into the
//! configured range, then remixes the pool with wall-clock bytes and
//! shuffles it. The proof snippet for the verification record is taken
//! only after that remix, so it reflects a pool state the caller could
//! not see before the number was produced.
//!
//! Published material is always extracted, never peeked. The seed and
//! every proof move the cursor past their bytes, so no later draw reads
//! pool bytes that appear in a report or export.
//!
//! Records protect against editing the history after the fact. They say
//! nothing about bias in the generator itself; that is the job of the
//! statistical checks in [`crate::audit`].

use super::log::{GameLog, JsonLinesSink, LogSink, LogSummary, NullSink};
use super::record::{Draw, DrawStatistics, VerificationRecord};
use crate::pool::{to_hex, EntropyPool, VerificationHasher};
use crate::source::{
    ConfigError, EngineConfig, EntropySource, FallbackEntropySource, LogLevel, OsEntropySource,
    SourceError, SourceStrength,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Bytes of pool state captured as a draw proof.
pub const PROOF_LEN: usize = 32;

/// Characters of randomness in a generated game id.
const GAME_ID_RAND_LEN: usize = 9;

/// Errors that can occur while building or using an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Rejected configuration.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// More unique numbers requested than the range holds.
    #[error("cannot draw {requested} unique numbers from a range of {available}")]
    Exhausted {
        /// Requested set size.
        requested: u64,
        /// Distinct values in the range.
        available: u64,
    },

    /// Neither the configured nor the fallback source produced bytes.
    #[error("entropy error: {0}")]
    Source(#[from] SourceError),
}

/// Wall-clock bytes mixed into the pool on every draw.
fn clock_bytes() -> [u8; 12] {
    let now = Utc::now();
    let mut out = [0u8; 12];
    out[..8].copy_from_slice(&now.timestamp_millis().to_le_bytes());
    out[8..].copy_from_slice(&now.timestamp_subsec_nanos().to_le_bytes());
    out
}

fn base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

/// Builds `game-<time36>-<rand>` from the current time and a fresh
/// read from `source`. Pool bytes never leak into the id.
fn generate_game_id(source: &mut dyn EntropySource) -> String {
    let mut word = [0u8; 8];
    if let Err(e) = source.fill(&mut word) {
        tracing::warn!(error = %e, "Game id entropy unavailable, using clock");
        FallbackEntropySource::new().fill_bytes(&mut word);
    }
    let random: String = base36(u64::from_le_bytes(word))
        .chars()
        .take(GAME_ID_RAND_LEN)
        .collect();
    let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    format!("game-{}-{}", base36(millis), random)
}

/// Certified number generator for one game.
///
/// Owns the entropy pool, the draw history and the verification
/// records. Nothing else mutates them; auditors borrow the engine
/// immutably. Each game needs its own engine.
pub struct EntropyEngine {
    config: EngineConfig,
    game_id: String,
    pool: EntropyPool,
    /// Strength of the source that filled the pool.
    strength: SourceStrength,
    source_name: &'static str,
    /// Hex seed copied from the pool at construction. Never regenerated.
    seed: String,
    hasher: VerificationHasher,
    history: Vec<Draw>,
    records: BTreeMap<u64, VerificationRecord>,
    log: GameLog,
    started_at: DateTime<Utc>,
}

impl EntropyEngine {
    /// Creates an engine seeded from operating system randomness.
    ///
    /// Falls back to a weaker clock-seeded source if the OS source fails.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_source(config, Box::new(OsEntropySource::new()))
    }

    /// Creates an engine seeded from `source`.
    ///
    /// The game log goes to `config.log_file` when set.
    pub fn with_source(
        config: EngineConfig,
        source: Box<dyn EntropySource>,
    ) -> Result<Self, EngineError> {
        let sink: Box<dyn LogSink> = match &config.log_file {
            Some(path) => match JsonLinesSink::open(path) {
                Ok(sink) => Box::new(sink),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Game log file unavailable, keeping log in memory only"
                    );
                    Box::new(NullSink)
                }
            },
            None => Box::new(NullSink),
        };
        Self::with_parts(config, source, sink)
    }

    /// Creates an engine from an explicit source and log sink.
    pub fn with_parts(
        config: EngineConfig,
        mut source: Box<dyn EntropySource>,
        sink: Box<dyn LogSink>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let mut pool = EntropyPool::new(config.entropy_pool_size);
        let mut fallback_reason = None;
        if let Err(e) = pool.fill_from(source.as_mut()) {
            fallback_reason = Some(e.to_string());
            source = Box::new(FallbackEntropySource::new());
            pool.fill_from(source.as_mut())?;
        }
        let (strength, source_name) = (source.strength(), source.name());

        let game_id = match config.game_id.clone() {
            Some(id) => id,
            None => generate_game_id(source.as_mut()),
        };

        pool.mix(&clock_bytes());
        pool.shuffle();

        // The seed is consumed, not peeked: no draw may read its bytes
        let seed = to_hex(&pool.extract(config.seed_length));
        pool.mix(&clock_bytes());
        pool.shuffle();

        let hasher = VerificationHasher::new(config.hash_algorithm, seed.clone(), game_id.clone());
        let log = GameLog::new(game_id.clone(), config.log_results, config.log_level, sink);

        if let Some(reason) = fallback_reason {
            log.record(
                LogLevel::Warn,
                "Primary entropy source unavailable, using weaker fallback",
                json!({ "reason": reason, "source": source_name }),
            );
        } else if !strength.is_strong() {
            log.record(
                LogLevel::Warn,
                "Entropy source is not cryptographic; fairness guarantees are reduced",
                json!({ "source": source_name, "strength": strength }),
            );
        }

        log.record(
            LogLevel::Info,
            "Entropy engine initialized",
            json!({
                "minValue": config.min_value,
                "maxValue": config.max_value,
                "poolSize": pool.size(),
                "seedLength": config.seed_length,
                "verificationEnabled": config.verification_enabled,
                "hashAlgorithm": config.hash_algorithm,
                "entropySource": source_name,
            }),
        );

        Ok(Self {
            config,
            game_id,
            pool,
            strength,
            source_name,
            seed,
            hasher,
            history: Vec::new(),
            records: BTreeMap::new(),
            log,
            started_at: Utc::now(),
        })
    }

    /// Draws one number in `[min_value, max_value]`.
    ///
    /// Duplicates across draws are allowed.
    pub fn generate_number(&mut self) -> u32 {
        let raw = self.pool.extract_u32();
        let offset = u64::from(raw) % self.config.range_size();
        // offset < range_size, so this stays within max_value
        let number = self.config.min_value + offset as u32;

        self.pool.mix(&clock_bytes());
        self.pool.shuffle();

        let draw = Draw {
            number,
            timestamp: Utc::now().timestamp_millis(),
            draw_id: self.history.len() as u64 + 1,
        };
        self.history.push(draw.clone());

        self.log.record(
            LogLevel::Debug,
            "Number drawn",
            json!({ "drawId": draw.draw_id, "number": number }),
        );

        if self.config.verification_enabled {
            self.create_verification_record(&draw);
        }

        number
    }

    /// Draws until `count` distinct numbers have been produced.
    ///
    /// Discarded duplicates still appear in the draw history. Fails
    /// before drawing anything if the range is too small.
    pub fn generate_unique_set(&mut self, count: usize) -> Result<Vec<u32>, EngineError> {
        let available = self.config.range_size();
        let requested = count as u64;
        if requested > available {
            self.log.record(
                LogLevel::Error,
                "Unique set larger than number range",
                json!({ "requested": requested, "available": available }),
            );
            return Err(EngineError::Exhausted {
                requested,
                available,
            });
        }

        let mut seen = HashSet::with_capacity(count);
        let mut numbers = Vec::with_capacity(count);
        while numbers.len() < count {
            let number = self.generate_number();
            if seen.insert(number) {
                numbers.push(number);
            }
        }

        self.log.record(
            LogLevel::Info,
            "Unique set generated",
            json!({ "count": count, "drawsUsed": self.history.len() }),
        );

        Ok(numbers)
    }

    fn create_verification_record(&mut self, draw: &Draw) {
        // Consumed so a published proof never overlaps a later draw
        let proof = to_hex(&self.pool.extract(PROOF_LEN));
        let verification_hash = self.hasher.hash_draw(draw.draw_id, draw.number, &proof);

        self.log.record(
            LogLevel::Debug,
            "Verification record created",
            json!({ "drawId": draw.draw_id, "verificationHash": verification_hash }),
        );

        self.records.insert(
            draw.draw_id,
            VerificationRecord {
                draw_id: draw.draw_id,
                number: draw.number,
                timestamp: draw.timestamp,
                proof,
                verification_hash,
            },
        );
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the game id.
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// Returns the full hex seed.
    ///
    /// Anyone holding the seed can reason about pool state. Treat it as
    /// privileged.
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// Returns the hasher bound to this game.
    pub fn hasher(&self) -> &VerificationHasher {
        &self.hasher
    }

    /// Returns true if draws get verification records.
    pub fn is_verification_enabled(&self) -> bool {
        self.config.verification_enabled
    }

    /// Returns the strength of the entropy source in use.
    pub fn entropy_strength(&self) -> SourceStrength {
        self.strength
    }

    /// Returns the name of the entropy source in use.
    pub fn entropy_source(&self) -> &'static str {
        self.source_name
    }

    /// Returns all draws in order.
    pub fn draw_history(&self) -> &[Draw] {
        &self.history
    }

    /// Returns the number of draws so far.
    pub fn draw_count(&self) -> usize {
        self.history.len()
    }

    /// Returns the most recent draw.
    pub fn last_draw(&self) -> Option<&Draw> {
        self.history.last()
    }

    /// Returns the record for `draw_id`, if any.
    pub fn verification_record(&self, draw_id: u64) -> Option<&VerificationRecord> {
        self.records.get(&draw_id)
    }

    /// Returns all verification records keyed by draw id.
    pub fn verification_records(&self) -> &BTreeMap<u64, VerificationRecord> {
        &self.records
    }

    /// Counts distinct and total draws.
    pub fn statistics(&self) -> DrawStatistics {
        let unique: HashSet<u32> = self.history.iter().map(|d| d.number).collect();
        DrawStatistics {
            unique_numbers: unique.len(),
            total_draws: self.history.len(),
        }
    }

    /// Returns the engine construction time.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Milliseconds since construction.
    pub fn running_time_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }

    /// Returns the game log.
    pub fn log(&self) -> &GameLog {
        &self.log
    }

    /// Counts game log entries by level.
    pub fn log_summary(&self) -> LogSummary {
        self.log.summary()
    }

    /// Writes pending game log entries to the configured sink.
    pub fn flush_log(&self) {
        self.log.flush();
    }

    /// Returns the pool (read-only).
    pub fn pool(&self) -> &EntropyPool {
        &self.pool
    }

    /// Gives tests write access to a stored record.
    #[cfg(test)]
    pub(crate) fn record_mut(&mut self, draw_id: u64) -> Option<&mut VerificationRecord> {
        self.records.get_mut(&draw_id)
    }
}

impl std::fmt::Debug for EntropyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntropyEngine")
            .field("game_id", &self.game_id)
            .field("range", &(self.config.min_value..=self.config.max_value))
            .field("strength", &self.strength)
            .field("draws", &self.history.len())
            .finish_non_exhaustive()
    }
}
