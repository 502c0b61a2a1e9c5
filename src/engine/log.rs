//! In-memory game log with optional JSON lines persistence.
//!
//! Logging is best-effort. Sink failures are reported through `tracing`
//! and swallowed; they never abort a draw or a verification.

use crate::source::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Errors raised by log sinks.
#[derive(Debug, Error)]
pub enum LogError {
    /// Writing or flushing the sink failed.
    #[error("log i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// An entry could not be encoded as JSON.
    #[error("failed to serialize log entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One structured log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Time the entry was recorded.
    pub timestamp: DateTime<Utc>,
    /// Severity.
    pub level: LogLevel,
    /// Short event description.
    pub message: String,
    /// Game the entry belongs to.
    pub game_id: String,
    /// Event-specific payload.
    pub data: serde_json::Value,
}

/// Counts of recorded entries by level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSummary {
    /// All recorded entries.
    pub total: usize,
    /// `debug` entries.
    pub debug: usize,
    /// `info` entries.
    pub info: usize,
    /// `warn` entries.
    pub warn: usize,
    /// `error` entries.
    pub error: usize,
}

/// Destination for flushed log entries.
pub trait LogSink: Send + Sync {
    /// Writes one entry.
    fn write(&mut self, entry: &LogEntry) -> Result<(), LogError>;

    /// Flushes buffered output.
    fn flush(&mut self) -> Result<(), LogError>;
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn write(&mut self, _entry: &LogEntry) -> Result<(), LogError> {
        Ok(())
    }

    fn flush(&mut self) -> Result<(), LogError> {
        Ok(())
    }
}

/// Append-only file with one JSON object per line.
pub struct JsonLinesSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for JsonLinesSink {
    fn write(&mut self, entry: &LogEntry) -> Result<(), LogError> {
        serde_json::to_writer(&mut self.writer, entry)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), LogError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Structured log owned by one engine.
///
/// Recording takes `&self` so auditors borrowing the engine can log
/// their verification outcomes into the same game log.
pub struct GameLog {
    game_id: String,
    enabled: bool,
    min_level: LogLevel,
    state: Mutex<LogState>,
}

struct LogState {
    entries: Vec<LogEntry>,
    /// Entries already handed to the sink.
    flushed: usize,
    sink: Box<dyn LogSink>,
}

impl LogState {
    fn flush(&mut self) {
        while self.flushed < self.entries.len() {
            if let Err(e) = self.sink.write(&self.entries[self.flushed]) {
                tracing::warn!(
                    error = %e,
                    pending = self.entries.len() - self.flushed,
                    "Failed to write game log"
                );
                return;
            }
            self.flushed += 1;
        }
        if let Err(e) = self.sink.flush() {
            tracing::warn!(error = %e, "Failed to flush game log");
        }
    }
}

impl GameLog {
    /// Creates a log for `game_id`.
    pub fn new(
        game_id: impl Into<String>,
        enabled: bool,
        min_level: LogLevel,
        sink: Box<dyn LogSink>,
    ) -> Self {
        Self {
            game_id: game_id.into(),
            enabled,
            min_level,
            state: Mutex::new(LogState {
                entries: Vec::new(),
                flushed: 0,
                sink,
            }),
        }
    }

    // A panic while holding the lock leaves the entries intact
    fn state(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records an entry if logging is enabled and `level` passes the filter.
    ///
    /// Recorded entries are mirrored to `tracing`.
    pub fn record(&self, level: LogLevel, message: &str, data: serde_json::Value) {
        if !self.enabled || level < self.min_level {
            return;
        }

        match level {
            LogLevel::Debug => tracing::debug!(game_id = %self.game_id, %data, "{}", message),
            LogLevel::Info => tracing::info!(game_id = %self.game_id, %data, "{}", message),
            LogLevel::Warn => tracing::warn!(game_id = %self.game_id, %data, "{}", message),
            LogLevel::Error => tracing::error!(game_id = %self.game_id, %data, "{}", message),
        }

        self.state().entries.push(LogEntry {
            timestamp: Utc::now(),
            level,
            message: message.to_string(),
            game_id: self.game_id.clone(),
            data,
        });
    }

    /// Returns a copy of all recorded entries.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.state().entries.clone()
    }

    /// Counts recorded entries by level.
    pub fn summary(&self) -> LogSummary {
        let state = self.state();
        let mut summary = LogSummary {
            total: state.entries.len(),
            ..Default::default()
        };
        for entry in &state.entries {
            match entry.level {
                LogLevel::Debug => summary.debug += 1,
                LogLevel::Info => summary.info += 1,
                LogLevel::Warn => summary.warn += 1,
                LogLevel::Error => summary.error += 1,
            }
        }
        summary
    }

    /// Number of entries not yet written to the sink.
    pub fn pending(&self) -> usize {
        let state = self.state();
        state.entries.len() - state.flushed
    }

    /// Writes pending entries to the sink.
    ///
    /// Stops at the first failure and keeps the rest pending.
    pub fn flush(&self) {
        self.state().flush();
    }
}

impl Drop for GameLog {
    fn drop(&mut self) {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner).flush();
    }
}

impl std::fmt::Debug for GameLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("GameLog")
            .field("game_id", &self.game_id)
            .field("enabled", &self.enabled)
            .field("min_level", &self.min_level)
            .field("entries", &state.entries.len())
            .field("flushed", &state.flushed)
            .finish_non_exhaustive()
    }
}
