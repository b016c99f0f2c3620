//! Adaptive baseline classification
//!
//! This module derives personal thresholds from the trailing window of days
//! before the evaluation day (mean + one sample standard deviation) and
//! classifies the evaluation day against them. Nothing is remembered between
//! calls; every classification is recomputed from the supplied series.

use crate::error::ComputeError;
use crate::stats::{mean, sample_std_dev};
use crate::types::{PacingAssessment, PacingState, ScoredDay};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default baseline window in days
pub const DEFAULT_BASELINE_WINDOW: usize = 7;

const ANALYSIS: &str = "pacing classification";

/// Mean-plus-one-sigma threshold over a baseline window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineThreshold {
    pub mean: f64,
    pub std_dev: f64,
    pub threshold: f64,
}

impl BaselineThreshold {
    /// Compute over `values`; a window without spread has threshold equal to its mean
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let first = *values.first()?;
        if values.iter().all(|v| *v == first) {
            return Some(Self {
                mean: first,
                std_dev: 0.0,
                threshold: first,
            });
        }

        let mean = mean(values)?;
        let std_dev = sample_std_dev(values)?;
        Some(Self {
            mean,
            std_dev,
            threshold: mean + std_dev,
        })
    }

    pub fn is_exceeded_by(&self, value: f64) -> bool {
        value > self.threshold
    }
}

/// Classifier for the four pacing states
#[derive(Debug, Clone)]
pub struct BaselineClassifier {
    window_size: usize,
}

impl Default for BaselineClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_BASELINE_WINDOW)
    }
}

impl BaselineClassifier {
    /// Create a classifier with the given window size (also the minimum history)
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Classify the evaluation day of a date-sorted series.
    ///
    /// `evaluation_date` defaults to the last day. At least `window_size` days
    /// up to and including the evaluation day are required; days after it are
    /// ignored.
    pub fn classify(
        &self,
        days: &[ScoredDay],
        evaluation_date: Option<NaiveDate>,
    ) -> Result<PacingAssessment, ComputeError> {
        let eval_index = match evaluation_date {
            Some(date) => days
                .iter()
                .position(|d| d.date == date)
                .ok_or(ComputeError::UnknownEvaluationDate(date))?,
            None => days
                .len()
                .checked_sub(1)
                .ok_or_else(|| ComputeError::insufficient(ANALYSIS, self.window_size, 0))?,
        };

        let available = eval_index + 1;
        if available < self.window_size {
            return Err(ComputeError::insufficient(
                ANALYSIS,
                self.window_size,
                available,
            ));
        }

        let latest = &days[eval_index];
        let window = &days[eval_index.saturating_sub(self.window_size)..eval_index];

        let tnl_values: Vec<f64> = window.iter().map(|d| d.tnl).collect();
        let tic_values: Vec<f64> = window.iter().map(|d| d.tic_count as f64).collect();
        let (tnl_baseline, tic_baseline) = match (
            BaselineThreshold::from_values(&tnl_values),
            BaselineThreshold::from_values(&tic_values),
        ) {
            (Some(tnl), Some(tic)) => (tnl, tic),
            _ => return Err(ComputeError::insufficient(ANALYSIS, 2, available)),
        };

        let tic_latest = latest.tic_count as f64;
        let state = PacingState::from_spikes(
            tnl_baseline.is_exceeded_by(latest.tnl),
            tic_baseline.is_exceeded_by(tic_latest),
        );

        debug!(
            date = %latest.date,
            state = state.as_str(),
            tnl = latest.tnl,
            tnl_threshold = tnl_baseline.threshold,
            tic_threshold = tic_baseline.threshold,
            baseline_days = window.len(),
            "classified evaluation day"
        );

        Ok(PacingAssessment {
            pacing_state: state,
            recommendation: state.recommendation().to_string(),
            evaluation_date: latest.date,
            tnl_latest: latest.tnl,
            tnl_threshold: tnl_baseline.threshold,
            tic_latest,
            tic_threshold: tic_baseline.threshold,
            baseline_days: window.len(),
        })
    }
}
