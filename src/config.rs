//! Engine configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.

use crate::error::ComputeError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default baseline window in days
pub const DEFAULT_WINDOW_DAYS: usize = 7;

/// Study minutes at which the study component saturates (15 hours)
pub const DEFAULT_STUDY_MINUTES_CEILING: u32 = 900;

/// Number of lowest-load days reported
pub const DEFAULT_BEST_DAYS: usize = 3;

/// Sleep-deficit penalty settings. Disabled by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepPenaltyConfig {
    pub enabled: bool,
    /// Sleep at or above this many hours carries no penalty
    pub healthy_sleep_hours: f64,
    /// Penalty points per hour of deficit
    pub weight: f64,
    /// Nights at or below this are "low sleep" for the vulnerability check
    pub low_sleep_hours: f64,
    /// Tic count at or above this is "high" for the vulnerability check
    pub high_tic_count: u8,
    /// Fewer low-sleep nights than this means no pattern can be confirmed
    pub min_low_sleep_days: usize,
    /// Share of low-sleep nights with high tics needed to confirm vulnerability
    pub vulnerability_ratio: f64,
}

impl Default for SleepPenaltyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            healthy_sleep_hours: 8.0,
            weight: 1.5,
            low_sleep_hours: 6.0,
            high_tic_count: 5,
            min_low_sleep_days: 3,
            vulnerability_ratio: 0.7,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum history (and baseline window) in days
    pub window_days: usize,
    /// Day to classify; `None` means the latest day in the series
    pub evaluation_date: Option<NaiveDate>,
    pub study_minutes_ceiling: u32,
    pub sleep_penalty: SleepPenaltyConfig,
    pub best_days: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            evaluation_date: None,
            study_minutes_ceiling: DEFAULT_STUDY_MINUTES_CEILING,
            sleep_penalty: SleepPenaltyConfig::default(),
            best_days: DEFAULT_BEST_DAYS,
        }
    }
}

impl EngineConfig {
    pub fn with_window_days(mut self, window_days: usize) -> Self {
        self.window_days = window_days;
        self
    }

    pub fn with_evaluation_date(mut self, date: NaiveDate) -> Self {
        self.evaluation_date = Some(date);
        self
    }

    pub fn with_sleep_penalty(mut self, enabled: bool) -> Self {
        self.sleep_penalty.enabled = enabled;
        self
    }

    /// Load configuration from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| ComputeError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.window_days < 2 {
            return Err(ComputeError::InvalidConfig(format!(
                "window_days must be at least 2, got {}",
                self.window_days
            )));
        }
        if self.study_minutes_ceiling == 0 {
            return Err(ComputeError::InvalidConfig(
                "study_minutes_ceiling must be positive".to_string(),
            ));
        }

        let penalty = &self.sleep_penalty;
        if !(0.0..=24.0).contains(&penalty.healthy_sleep_hours)
            || !(0.0..=24.0).contains(&penalty.low_sleep_hours)
        {
            return Err(ComputeError::InvalidConfig(
                "sleep hour thresholds must be within 0-24".to_string(),
            ));
        }
        if !penalty.weight.is_finite() || penalty.weight < 0.0 {
            return Err(ComputeError::InvalidConfig(
                "sleep_penalty.weight must be a non-negative number".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&penalty.vulnerability_ratio) {
            return Err(ComputeError::InvalidConfig(
                "sleep_penalty.vulnerability_ratio must be within 0-1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_json_is_default() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.window_days, 7);
        assert!(!config.sleep_penalty.enabled);
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_json(
            r#"{"window_days": 14, "sleep_penalty": {"enabled": true}, "evaluation_date": "2024-03-05"}"#,
        )
        .unwrap();
        assert_eq!(config.window_days, 14);
        assert!(config.sleep_penalty.enabled);
        assert_eq!(config.sleep_penalty.weight, 1.5);
        assert_eq!(
            config.evaluation_date,
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
    }

    #[test]
    fn test_rejects_tiny_window() {
        let err = EngineConfig::from_json(r#"{"window_days": 1}"#).unwrap_err();
        assert_eq!(err.kind(), "invalid_config");
    }

    #[test]
    fn test_rejects_bad_ratio() {
        let config = EngineConfig {
            sleep_penalty: SleepPenaltyConfig {
                vulnerability_ratio: 1.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
