//! Error types for the MyFlow engine

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during analysis
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Malformed entry {index} ({date}): {reason}")]
    MalformedEntry {
        /// Position of the entry in submission order
        index: usize,
        /// The entry's date as submitted, or "unknown" if it was missing
        date: String,
        reason: String,
    },

    #[error("Insufficient data for {analysis}: need at least {required} days, have {available}")]
    InsufficientData {
        analysis: &'static str,
        required: usize,
        available: usize,
    },

    #[error("Evaluation date {0} is not present in the series")]
    UnknownEvaluationDate(NaiveDate),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse request: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl ComputeError {
    /// Stable machine-readable tag so callers can render a message per kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ComputeError::MalformedEntry { .. } => "malformed_entry",
            ComputeError::InsufficientData { .. } => "insufficient_data",
            ComputeError::UnknownEvaluationDate(_) => "unknown_evaluation_date",
            ComputeError::InvalidConfig(_) => "invalid_config",
            ComputeError::ParseError(_) => "parse_error",
            ComputeError::JsonError(_) => "json_error",
            ComputeError::EncodingError(_) => "encoding_error",
        }
    }

    pub(crate) fn malformed(index: usize, date: Option<&str>, reason: impl Into<String>) -> Self {
        ComputeError::MalformedEntry {
            index,
            date: date.unwrap_or("unknown").to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn insufficient(analysis: &'static str, required: usize, available: usize) -> Self {
        ComputeError::InsufficientData {
            analysis,
            required,
            available,
        }
    }
}
