//! Pattern analyzers
//!
//! Two independent analyses over the whole normalized series (never windowed):
//! - Protective factor ranking by measured effect on the tracked symptom
//! - Sleep/symptom correlation with a personal sleep target

mod protective;
mod sleep;

pub use protective::ProtectiveFactorRanker;
pub use sleep::SleepCorrelator;
