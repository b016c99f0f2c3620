//! Core types for the MyFlow engine
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: normalized log entries, scored days, derived analyses, and the
//! assembled report.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Direction of a custom factor
///
/// Serialized as the integer the log store uses: `1` adds load, `-1` is protective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum FactorEffect {
    /// Adds to the day's load (`+1`)
    Stressor,
    /// Expected to reduce the tracked symptom (`-1`)
    Protective,
}

impl From<i64> for FactorEffect {
    fn from(value: i64) -> Self {
        if value >= 0 {
            FactorEffect::Stressor
        } else {
            FactorEffect::Protective
        }
    }
}

impl From<FactorEffect> for i64 {
    fn from(effect: FactorEffect) -> Self {
        effect.sign()
    }
}

impl FactorEffect {
    pub fn sign(&self) -> i64 {
        match self {
            FactorEffect::Stressor => 1,
            FactorEffect::Protective => -1,
        }
    }
}

/// A user-defined factor logged on a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFactor {
    /// Non-empty display name, compared exactly across days
    pub name: String,
    /// Intensity 1-5
    pub level: u8,
    pub effect: FactorEffect,
}

impl CustomFactor {
    pub fn new(name: impl Into<String>, level: u8, effect: FactorEffect) -> Self {
        Self {
            name: name.into(),
            level: level.clamp(1, 5),
            effect,
        }
    }

    pub fn stressor(name: impl Into<String>, level: u8) -> Self {
        Self::new(name, level, FactorEffect::Stressor)
    }

    pub fn protective(name: impl Into<String>, level: u8) -> Self {
        Self::new(name, level, FactorEffect::Protective)
    }

    /// Signed impact: `level * effect`
    pub fn impact(&self) -> i64 {
        self.level as i64 * self.effect.sign()
    }

    pub fn is_protective(&self) -> bool {
        self.effect == FactorEffect::Protective
    }
}

/// One normalized day of the user's log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLogEntry {
    pub date: NaiveDate,
    /// Hours slept, 0-24
    pub sleep_hours: f64,
    /// Minutes studied, unbounded here (the scorer applies its own ceiling)
    pub study_minutes: u32,
    /// Self-rated stress, 0-10
    pub stress: u8,
    /// Tracked symptom magnitude, 0-10
    pub tic_count: u8,
    #[serde(default)]
    pub screen_time_hours: f64,
    #[serde(default)]
    pub social_conflict: bool,
    #[serde(default)]
    pub custom_factors: Vec<CustomFactor>,
    #[serde(default)]
    pub journal: String,
}

impl DailyLogEntry {
    /// Create an entry with the required metrics and no optional data
    pub fn new(date: NaiveDate, sleep_hours: f64, study_minutes: u32, stress: u8, tic_count: u8) -> Self {
        Self {
            date,
            sleep_hours,
            study_minutes,
            stress,
            tic_count,
            screen_time_hours: 0.0,
            social_conflict: false,
            custom_factors: Vec::new(),
            journal: String::new(),
        }
    }

    pub fn with_factor(mut self, factor: CustomFactor) -> Self {
        self.custom_factors.push(factor);
        self
    }

    /// Protective factors logged on this day, in logged order
    pub fn protective_factors(&self) -> impl Iterator<Item = &CustomFactor> {
        self.custom_factors.iter().filter(|f| f.is_protective())
    }
}

/// Per-day load score with its components retained for charting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDay {
    pub date: NaiveDate,
    /// Total Negative Load
    pub tnl: f64,
    pub stress_component: f64,
    /// Study minutes rescaled onto 0-10
    pub study_component: f64,
    /// Sum of levels of load-adding custom factors
    pub positive_custom_component: f64,
    /// Sleep deficit penalty; zero unless the extension is enabled and applies
    pub sleep_penalty_component: f64,
    /// Negated sum of protective factor levels (<= 0); not part of TNL
    pub protective_custom_component: f64,
    pub tic_count: u8,
}

/// Classification of the evaluation day against the personal baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PacingState {
    GreenLight,
    HighLoadWarning,
    AdaptivePacingAlert,
    UnusualSpike,
}

impl PacingState {
    /// Decision table over (load over threshold, symptom over threshold)
    pub fn from_spikes(load_spiking: bool, tics_spiking: bool) -> Self {
        match (load_spiking, tics_spiking) {
            (false, false) => PacingState::GreenLight,
            (true, false) => PacingState::HighLoadWarning,
            (true, true) => PacingState::AdaptivePacingAlert,
            (false, true) => PacingState::UnusualSpike,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PacingState::GreenLight => "GREEN_LIGHT",
            PacingState::HighLoadWarning => "HIGH_LOAD_WARNING",
            PacingState::AdaptivePacingAlert => "ADAPTIVE_PACING_ALERT",
            PacingState::UnusualSpike => "UNUSUAL_SPIKE",
        }
    }

    /// Fixed recommendation template tag for this state
    pub fn recommendation(&self) -> &'static str {
        match self {
            PacingState::GreenLight => "maintain_momentum",
            PacingState::HighLoadWarning => "preventative_rest",
            PacingState::AdaptivePacingAlert => "switch_to_micro_goals",
            PacingState::UnusualSpike => "re_evaluate_custom_factors",
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            PacingState::GreenLight => "Load and symptoms are within your normal range",
            PacingState::HighLoadWarning => "Load is spiking while symptoms are stable",
            PacingState::AdaptivePacingAlert => "Load and symptoms are both spiking",
            PacingState::UnusualSpike => "Symptoms are spiking while load is normal",
        }
    }
}

/// Result of the adaptive baseline classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacingAssessment {
    pub pacing_state: PacingState,
    /// Template tag, see [`PacingState::recommendation`]
    pub recommendation: String,
    pub evaluation_date: NaiveDate,
    pub tnl_latest: f64,
    pub tnl_threshold: f64,
    pub tic_latest: f64,
    pub tic_threshold: f64,
    /// Number of preceding days the thresholds were computed over
    pub baseline_days: usize,
}

/// A protective factor ranked by measured effect on the symptom
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorRankEntry {
    pub name: String,
    /// Signed reduction against the overall mean; negative means more symptoms
    pub pct_tic_reduction: f64,
    /// Distinct dates the factor was logged on
    pub times_used: usize,
    pub avg_tics_with: f64,
    pub avg_tics_without: f64,
    pub avg_level: f64,
}

/// One of the lowest-load days and what was protecting it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestDay {
    pub date: NaiveDate,
    pub tnl: f64,
    pub tic_count: u8,
    pub protective_factors: Vec<String>,
}

/// Sleep/symptom correlation over the whole series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    /// Pearson r in [-1, 1]; 0 when either series is constant
    pub r: f64,
    /// Mean sleep over the lowest-quartile symptom days
    pub optimal_sleep_hours: f64,
    pub avg_sleep_hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_tics_near_optimal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_tics_far_from_optimal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_difference: Option<f64>,
    pub days_analyzed: usize,
}

/// Whether low sleep has historically coincided with high symptoms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepVulnerability {
    pub low_sleep_days: usize,
    pub high_tic_low_sleep_days: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    pub vulnerable: bool,
}

impl SleepVulnerability {
    pub fn not_assessed() -> Self {
        Self {
            low_sleep_days: 0,
            high_tic_low_sleep_days: 0,
            ratio: None,
            vulnerable: false,
        }
    }
}

// ============================================================================
// Report output types
// ============================================================================

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// The assembled analysis response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub window_days: usize,
    pub days_analyzed: usize,
    #[serde(flatten)]
    pub pacing: PacingAssessment,
    pub protective_factors: Vec<FactorRankEntry>,
    pub best_days: Vec<BestDay>,
    pub sleep_correlation: CorrelationResult,
    pub sleep_vulnerability: SleepVulnerability,
    pub per_day_breakdown: Vec<ScoredDay>,
}

/// Per-day load breakdown without classification or pattern analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub days_analyzed: usize,
    pub sleep_vulnerability: SleepVulnerability,
    pub per_day_breakdown: Vec<ScoredDay>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_decision_table() {
        assert_eq!(PacingState::from_spikes(false, false), PacingState::GreenLight);
        assert_eq!(PacingState::from_spikes(true, false), PacingState::HighLoadWarning);
        assert_eq!(PacingState::from_spikes(true, true), PacingState::AdaptivePacingAlert);
        assert_eq!(PacingState::from_spikes(false, true), PacingState::UnusualSpike);
    }

    #[test]
    fn test_pacing_state_serializes_as_tag() {
        let json = serde_json::to_string(&PacingState::HighLoadWarning).unwrap();
        assert_eq!(json, "\"HIGH_LOAD_WARNING\"");
        assert_eq!(PacingState::AdaptivePacingAlert.as_str(), "ADAPTIVE_PACING_ALERT");
    }

    #[test]
    fn test_factor_effect_from_sign() {
        let factor: CustomFactor =
            serde_json::from_str(r#"{"name":"Walk","level":3,"effect":-1}"#).unwrap();
        assert!(factor.is_protective());
        assert_eq!(factor.impact(), -3);

        let factor: CustomFactor =
            serde_json::from_str(r#"{"name":"Exam","level":4,"effect":0}"#).unwrap();
        assert_eq!(factor.effect, FactorEffect::Stressor);

        let json = serde_json::to_string(&CustomFactor::protective("Walk", 2)).unwrap();
        assert!(json.contains("\"effect\":-1"));
    }

    #[test]
    fn test_custom_factor_level_clamped() {
        assert_eq!(CustomFactor::stressor("Exam", 9).level, 5);
        assert_eq!(CustomFactor::protective("Nap", 0).level, 1);
    }
}
