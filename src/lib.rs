//! Certified Bingo Number Generation
//!
//! An entropy-pooling number generator that binds every drawn number to
//! a verification record, plus an auditor that re-checks those records
//! and runs coarse statistical tests over the draw history.
//!
//! # Architecture
//!
//! The system follows an explicit data flow:
//!
//! ```text
//! source → pool → engine → audit
//!                   ↓        ↓
//!                  log    metrics / remote
//! ```
//!
//! # Design Principles
//!
//! - **Fail-closed verification**: Missing or altered records never verify
//! - **Visible fallback**: A weak entropy source is logged and reported
//! - **Append-only history**: Draws and records are never rewritten
//! - **No certification claims**: Scores and verdicts are advisory
//!
//! # Example
//!
//! ```no_run
//! use bingo_fairness::{
//!     audit::FairnessAuditor,
//!     engine::EntropyEngine,
//!     source::EngineConfig,
//! };
//!
//! let mut engine = EntropyEngine::new(EngineConfig::default()).unwrap();
//!
//! // Draw a full card without repeats
//! let card = engine.generate_unique_set(24).unwrap();
//! assert_eq!(card.len(), 24);
//!
//! // Audit the game so far
//! let auditor = FairnessAuditor::with_defaults(&engine);
//! let report = auditor.generate_fairness_report();
//! println!("score {} ({})", report.fairness_score, report.conclusion.en);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod audit;
pub mod engine;
pub mod metrics;
pub mod pool;
#[cfg(feature = "remote")]
pub mod remote;
pub mod source;

// Re-export commonly used types at crate root
pub use audit::{
    AuditorConfig, ConfidenceLevel, FairnessAuditor, FairnessReport, FairnessThresholds,
    VerificationExport,
};
pub use engine::{Draw, EngineError, EntropyEngine, VerificationRecord};
pub use pool::{EntropyPool, HashAlgorithm};
pub use source::{EngineConfig, EntropySource, FileConfig, OsEntropySource};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
