//! Fairness verification and statistical auditing.
//!
//! This module re-checks per-draw proofs and runs coarse statistical
//! tests over the draw history. The resulting score and verdict are
//! advisory, not a certification.

mod auditor;
mod report;
mod statistics;
mod threshold;

pub use auditor::{AuditorConfig, FairnessAuditor};
pub use report::{
    seed_partial, Conclusion, ConfidenceLevel, FairnessReport, NumberRange, VerificationExport,
    VerificationSummary,
};
pub use statistics::{
    distribution, ConsecutiveRepeat, FairnessStatistics, PatternReport, RepeatedSequence,
    RunsTestResult,
};
pub use threshold::{FairnessThresholds, FairnessViolation};
