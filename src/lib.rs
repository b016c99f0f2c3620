//! MyFlow Engine - Personal-baseline wellness analysis
//!
//! The engine turns a batch of daily wellness logs into personalized feedback
//! through a deterministic pipeline: normalization → load scoring → adaptive
//! baseline classification → pattern analysis → result assembly.
//!
//! ## Modules
//!
//! - **Load scoring**: Per-day Total Negative Load (TNL) with its components
//! - **Baseline classification**: Pacing state of a day against the user's own trailing window
//! - **Pattern analysis**: Protective factor ranking and sleep/symptom correlation
//!
//! All thresholds are self-relative; each call analyzes one user's series and
//! keeps nothing afterwards.

pub mod baseline;
pub mod config;
pub mod encoder;
pub mod error;
pub mod normalizer;
pub mod patterns;
pub mod pipeline;
pub mod schema;
pub mod scorer;
pub mod stats;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use baseline::BaselineClassifier;
pub use config::{EngineConfig, SleepPenaltyConfig};
pub use error::ComputeError;
pub use normalizer::Normalizer;
pub use patterns::{ProtectiveFactorRanker, SleepCorrelator};
pub use pipeline::{analyze_logs, score_logs, AnalysisEngine};
pub use scorer::LoadScorer;

// Schema exports
pub use schema::{AnalysisRequest, RawDailyLog, RawLogAdapter, ValidationReport, ValidationResult};

pub use types::{
    AnalysisReport, CorrelationResult, CustomFactor, DailyLogEntry, FactorEffect, FactorRankEntry,
    PacingState, ScoredDay,
};

/// Engine version embedded in all reports
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "myflow-engine";
