//! Sleep and symptom correlation

use crate::error::ComputeError;
use crate::stats::{mean, pearson, quantile};
use crate::types::{CorrelationResult, DailyLogEntry};
use tracing::debug;

const ANALYSIS: &str = "sleep correlation";

/// Nights within this many hours of the target count as "near optimal"
pub const NEAR_OPTIMAL_HOURS: f64 = 0.75;

/// Nights more than this many hours from the target count as "far from optimal"
pub const FAR_FROM_OPTIMAL_HOURS: f64 = 1.5;

/// Correlates sleep duration with the tracked symptom
pub struct SleepCorrelator;

impl SleepCorrelator {
    /// Pearson r between sleep and tic count plus the personal sleep target.
    ///
    /// The target is the mean sleep over days whose tic count is at or below
    /// the 25th percentile of the series.
    pub fn correlate(
        entries: &[DailyLogEntry],
        window_days: usize,
    ) -> Result<CorrelationResult, ComputeError> {
        if entries.len() < window_days || entries.is_empty() {
            return Err(ComputeError::insufficient(
                ANALYSIS,
                window_days.max(1),
                entries.len(),
            ));
        }

        let sleep: Vec<f64> = entries.iter().map(|e| e.sleep_hours).collect();
        let tics: Vec<f64> = entries.iter().map(|e| e.tic_count as f64).collect();

        let r = pearson(&sleep, &tics).unwrap_or(0.0);
        let avg_sleep_hours = mean(&sleep).unwrap_or(0.0);

        let q1 = quantile(&tics, 0.25).unwrap_or(0.0);
        let low_tic_sleep: Vec<f64> = sleep
            .iter()
            .zip(&tics)
            .filter(|(_, t)| **t <= q1)
            .map(|(s, _)| *s)
            .collect();
        let optimal_sleep_hours = mean(&low_tic_sleep).unwrap_or(avg_sleep_hours);

        let near = tics_where(&sleep, &tics, optimal_sleep_hours, |d| d <= NEAR_OPTIMAL_HOURS);
        let far = tics_where(&sleep, &tics, optimal_sleep_hours, |d| d > FAR_FROM_OPTIMAL_HOURS);
        let avg_tics_near_optimal = mean(&near);
        let avg_tics_far_from_optimal = mean(&far);

        let percent_difference = match (avg_tics_near_optimal, avg_tics_far_from_optimal) {
            (Some(near), Some(far)) if near > 0.0 => Some((far - near) / near * 100.0),
            _ => None,
        };

        debug!(
            r,
            optimal_sleep_hours,
            low_tic_days = low_tic_sleep.len(),
            "correlated sleep with symptoms"
        );

        Ok(CorrelationResult {
            r,
            optimal_sleep_hours,
            avg_sleep_hours,
            avg_tics_near_optimal,
            avg_tics_far_from_optimal,
            percent_difference,
            days_analyzed: entries.len(),
        })
    }
}

/// Tic counts on days whose distance from `target` sleep satisfies `keep`
fn tics_where(sleep: &[f64], tics: &[f64], target: f64, keep: impl Fn(f64) -> bool) -> Vec<f64> {
    sleep
        .iter()
        .zip(tics)
        .filter(|(s, _)| keep((**s - target).abs()))
        .map(|(_, t)| *t)
        .collect()
}
