//! Pipeline orchestration
//!
//! This module provides the public API for the MyFlow engine.
//! It orchestrates the full pipeline from submitted logs to the assembled report.

use crate::baseline::BaselineClassifier;
use crate::config::EngineConfig;
use crate::encoder::{AnalysisComponents, ReportEncoder};
use crate::error::ComputeError;
use crate::normalizer::Normalizer;
use crate::patterns::{ProtectiveFactorRanker, SleepCorrelator};
use crate::schema::{AnalysisRequest, RawLogAdapter};
use crate::scorer::{LoadScorer, ScoredSeries};
use crate::types::{AnalysisReport, DailyLogEntry, ScoreReport};
use tracing::{debug, info};

/// Analyze a request with the default configuration.
///
/// # Arguments
/// * `request_json` - A JSON array of daily logs, or an object
///   `{ "entries": [...], "window_days": 7, "evaluation_date": "YYYY-MM-DD" }`
///
/// # Returns
/// The analysis report as pretty-printed JSON
///
/// # Example
/// ```ignore
/// let report = analyze_logs(std::fs::read_to_string("logs.json")?)?;
/// ```
pub fn analyze_logs(request_json: String) -> Result<String, ComputeError> {
    AnalysisEngine::default().analyze_json(&request_json)
}

/// Score a request with the default configuration, returning the per-day breakdown JSON.
pub fn score_logs(request_json: String) -> Result<String, ComputeError> {
    AnalysisEngine::default().score_json(&request_json)
}

/// Analysis engine holding configuration and report metadata.
///
/// Stateless between calls apart from the instance ID stamped on reports, so
/// one engine can serve any number of independent requests.
pub struct AnalysisEngine {
    config: EngineConfig,
    encoder: ReportEncoder,
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            encoder: ReportEncoder::new(),
        }
    }
}

impl AnalysisEngine {
    /// Create an engine with a validated configuration
    pub fn new(config: EngineConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self {
            config,
            encoder: ReportEncoder::new(),
        })
    }

    /// Create an engine from a JSON configuration document
    pub fn from_config_json(json: &str) -> Result<Self, ComputeError> {
        Self::new(EngineConfig::from_json(json)?)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn instance_id(&self) -> &str {
        self.encoder.instance_id()
    }

    /// Analyze a request document and return the report as JSON
    pub fn analyze_json(&self, request_json: &str) -> Result<String, ComputeError> {
        let request = RawLogAdapter::parse_request(request_json)?;
        let report = self.analyze_request(&request)?;
        serde_json::to_string_pretty(&report).map_err(ComputeError::JsonError)
    }

    /// Analyze a parsed request, applying its per-call overrides
    pub fn analyze_request(&self, request: &AnalysisRequest) -> Result<AnalysisReport, ComputeError> {
        let entries = Normalizer::normalize(&request.entries)?;
        let config = self.effective_config(request)?;
        self.run(&entries, &config)
    }

    /// Analyze typed entries from an in-process caller
    pub fn analyze(&self, entries: Vec<DailyLogEntry>) -> Result<AnalysisReport, ComputeError> {
        let entries = Normalizer::normalize_entries(entries)?;
        self.run(&entries, &self.config)
    }

    /// Score a request document and return the per-day breakdown as JSON
    pub fn score_json(&self, request_json: &str) -> Result<String, ComputeError> {
        let request = RawLogAdapter::parse_request(request_json)?;
        let report = self.score_request(&request)?;
        serde_json::to_string_pretty(&report).map_err(ComputeError::JsonError)
    }

    /// Score a parsed request. Needs no minimum history.
    pub fn score_request(&self, request: &AnalysisRequest) -> Result<ScoreReport, ComputeError> {
        let entries = Normalizer::normalize(&request.entries)?;
        let config = self.effective_config(request)?;
        let scored = LoadScorer::score_series_as_of(&entries, &config, config.evaluation_date);
        Ok(self.encoder.encode_scores(scored))
    }

    /// Score an already-normalized series
    pub fn score(&self, entries: &[DailyLogEntry]) -> ScoredSeries {
        LoadScorer::score_series(entries, &self.config)
    }

    fn effective_config(&self, request: &AnalysisRequest) -> Result<EngineConfig, ComputeError> {
        let mut config = self.config.clone();
        if let Some(window_days) = request.window_days {
            config.window_days = window_days;
        }
        if let Some(date) = request.evaluation_date {
            config.evaluation_date = Some(date);
        }
        config.validate()?;
        Ok(config)
    }

    /// Run every stage over a normalized series.
    ///
    /// Stages:
    /// 1. LoadScorer - Per-day TNL and its components
    /// 2. BaselineClassifier - Pacing state of the evaluation day
    /// 3. ProtectiveFactorRanker - Ranking and best days
    /// 4. SleepCorrelator - Sleep/symptom correlation
    /// 5. ReportEncoder - Package the report
    fn run(
        &self,
        entries: &[DailyLogEntry],
        config: &EngineConfig,
    ) -> Result<AnalysisReport, ComputeError> {
        let window_days = config.window_days;
        debug!(days = entries.len(), window_days, "starting analysis");

        let scored = LoadScorer::score_series_as_of(entries, config, config.evaluation_date);

        let pacing = BaselineClassifier::new(window_days)
            .classify(&scored.days, config.evaluation_date)?;
        let protective_factors = ProtectiveFactorRanker::rank(entries, window_days)?;
        let sleep_correlation = SleepCorrelator::correlate(entries, window_days)?;
        let best_days = ProtectiveFactorRanker::best_days(&scored.days, entries, config.best_days);

        info!(
            days = entries.len(),
            evaluation_date = %pacing.evaluation_date,
            pacing_state = pacing.pacing_state.as_str(),
            protective_factors = protective_factors.len(),
            "analysis complete"
        );

        Ok(self.encoder.encode(AnalysisComponents {
            window_days,
            scored,
            pacing,
            protective_factors,
            best_days,
            sleep_correlation,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RawDailyLog;
    use crate::types::{CustomFactor, PacingState};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn make_logs(stress: &[i64], tics: &[i64]) -> Vec<RawDailyLog> {
        stress
            .iter()
            .zip(tics)
            .enumerate()
            .map(|(i, (s, t))| RawDailyLog::new(&format!("2024-03-{:02}", i + 1), 7.0, 0, *s, *t))
            .collect()
    }

    fn sample_request_json() -> String {
        serde_json::to_string(&make_logs(&[2, 2, 2, 2, 2, 2, 8], &[1, 1, 1, 1, 1, 1, 1])).unwrap()
    }

    #[test]
    fn test_analyze_logs_worked_example() {
        let json = analyze_logs(sample_request_json()).unwrap();
        let report: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(report["pacing_state"], "HIGH_LOAD_WARNING");
        assert_eq!(report["tnl_latest"], 8.0);
        assert_eq!(report["recommendation"], "preventative_rest");
        assert_eq!(report["producer"]["name"], crate::PRODUCER_NAME);
        assert_eq!(report["days_analyzed"], 7);
        assert_eq!(report["per_day_breakdown"].as_array().unwrap().len(), 7);
        assert_eq!(report["best_days"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_unordered_batch_with_duplicate_dates() {
        let mut logs = make_logs(&[2, 2, 2, 2, 2, 2, 2], &[1, 1, 1, 1, 1, 1, 1]);
        logs.reverse();
        // A later correction for the last day replaces the original
        logs.push(RawDailyLog::new("2024-03-07", 7.0, 0, 9, 1));

        let report = AnalysisEngine::default()
            .analyze_request(&AnalysisRequest::new(logs))
            .unwrap();
        assert_eq!(report.days_analyzed, 7);
        assert_eq!(report.pacing.evaluation_date, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
        assert_eq!(report.pacing.tnl_latest, 9.0);
        assert_eq!(report.pacing.pacing_state, PacingState::HighLoadWarning);
    }

    #[test]
    fn test_request_overrides() {
        let logs = make_logs(&[2, 2, 2, 9, 2], &[1, 1, 1, 1, 1]);
        let request = AnalysisRequest {
            entries: logs,
            window_days: Some(3),
            evaluation_date: NaiveDate::from_ymd_opt(2024, 3, 4),
        };

        let report = AnalysisEngine::default().analyze_request(&request).unwrap();
        assert_eq!(report.window_days, 3);
        assert_eq!(report.pacing.baseline_days, 3);
        assert_eq!(report.pacing.pacing_state, PacingState::HighLoadWarning);
        // Pattern analyzers still see the whole series
        assert_eq!(report.sleep_correlation.days_analyzed, 5);
    }

    #[test]
    fn test_envelope_json() {
        let logs = make_logs(&[2, 2, 2, 9], &[1, 1, 1, 1]);
        let json = serde_json::json!({ "entries": logs, "window_days": 4 }).to_string();
        let report: serde_json::Value =
            serde_json::from_str(&AnalysisEngine::default().analyze_json(&json).unwrap()).unwrap();
        assert_eq!(report["window_days"], 4);
        assert_eq!(report["pacing_state"], "HIGH_LOAD_WARNING");
    }

    #[test]
    fn test_insufficient_data_is_aggregate_failure() {
        let logs = make_logs(&[2; 6], &[1; 6]);
        let err = AnalysisEngine::default()
            .analyze_request(&AnalysisRequest::new(logs))
            .unwrap_err();
        assert_eq!(err.kind(), "insufficient_data");
    }

    #[test]
    fn test_malformed_entry_rejects_batch() {
        let mut logs = make_logs(&[2; 8], &[1; 8]);
        logs[3].symptoms = None;

        let err = AnalysisEngine::default()
            .analyze_request(&AnalysisRequest::new(logs))
            .unwrap_err();
        match err {
            ComputeError::MalformedEntry { index, date, reason } => {
                assert_eq!(index, 3);
                assert_eq!(date, "2024-03-04");
                assert!(reason.contains("symptoms.tic_count"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_evaluation_date() {
        let request = AnalysisRequest {
            entries: make_logs(&[2; 7], &[1; 7]),
            window_days: None,
            evaluation_date: NaiveDate::from_ymd_opt(2025, 1, 1),
        };
        let err = AnalysisEngine::default().analyze_request(&request).unwrap_err();
        assert_eq!(err.kind(), "unknown_evaluation_date");
    }

    #[test]
    fn test_invalid_window_override() {
        let request = AnalysisRequest {
            entries: make_logs(&[2; 7], &[1; 7]),
            window_days: Some(1),
            evaluation_date: None,
        };
        let err = AnalysisEngine::default().analyze_request(&request).unwrap_err();
        assert_eq!(err.kind(), "invalid_config");
    }

    #[test]
    fn test_analyze_typed_entries() {
        let entries: Vec<DailyLogEntry> = (1..=7)
            .map(|d| {
                let date = NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
                let tics = if d == 7 { 6 } else { 1 };
                DailyLogEntry::new(date, 7.0, 0, 2, tics)
                    .with_factor(CustomFactor::protective("Walk", 2))
            })
            .collect();

        let report = AnalysisEngine::default().analyze(entries).unwrap();
        assert_eq!(report.pacing.pacing_state, PacingState::UnusualSpike);
        assert_eq!(report.protective_factors.len(), 1);
        assert_eq!(report.protective_factors[0].times_used, 7);
    }

    #[test]
    fn test_sleep_penalty_config() {
        let logs: Vec<RawDailyLog> = (1..=8)
            .map(|d| RawDailyLog::new(&format!("2024-03-{d:02}"), 5.0, 0, 2, 8))
            .collect();
        let request = AnalysisRequest::new(logs);

        let plain = AnalysisEngine::default().analyze_request(&request).unwrap();
        assert!(plain.per_day_breakdown.iter().all(|d| d.sleep_penalty_component == 0.0));

        let engine =
            AnalysisEngine::from_config_json(r#"{"sleep_penalty": {"enabled": true}}"#).unwrap();
        let penalized = engine.analyze_request(&request).unwrap();
        assert!(penalized.sleep_vulnerability.vulnerable);
        assert!(penalized
            .per_day_breakdown
            .iter()
            .all(|d| (d.sleep_penalty_component - 4.5).abs() < 1e-9));
    }

    #[test]
    fn test_score_json_needs_no_history() {
        let json = serde_json::to_string(&make_logs(&[4], &[2])).unwrap();
        let report: serde_json::Value =
            serde_json::from_str(&score_logs(json).unwrap()).unwrap();
        assert_eq!(report["days_analyzed"], 1);
        assert_eq!(report["per_day_breakdown"][0]["tnl"], 4.0);
    }

    #[test]
    fn test_later_days_do_not_change_evaluation() {
        // Healthy history, then low sleep with high tics from day 8 onwards
        let logs: Vec<RawDailyLog> = (1..=12)
            .map(|d| {
                let (sleep, tics) = match d {
                    1..=7 => (8.0, 1),
                    8 => (5.0, 1),
                    _ => (5.0, 9),
                };
                RawDailyLog::new(&format!("2024-03-{d:02}"), sleep, 0, 2, tics)
            })
            .collect();
        let engine =
            AnalysisEngine::from_config_json(r#"{"sleep_penalty": {"enabled": true}}"#).unwrap();
        let evaluation_date = NaiveDate::from_ymd_opt(2024, 3, 8);

        let full = engine
            .analyze_request(&AnalysisRequest {
                entries: logs.clone(),
                window_days: None,
                evaluation_date,
            })
            .unwrap();
        let truncated = engine
            .analyze_request(&AnalysisRequest {
                entries: logs[..8].to_vec(),
                window_days: None,
                evaluation_date,
            })
            .unwrap();

        assert_eq!(full.pacing, truncated.pacing);
        assert_eq!(full.sleep_vulnerability, truncated.sleep_vulnerability);
        assert_eq!(full.pacing.pacing_state, PacingState::GreenLight);
        assert_eq!(full.pacing.tnl_latest, 2.0);
    }

    #[test]
    fn test_malformed_entry_reported_before_config_errors() {
        let mut logs = make_logs(&[2; 7], &[1; 7]);
        logs[2].emotional = None;
        let request = AnalysisRequest {
            entries: logs,
            window_days: Some(1),
            evaluation_date: None,
        };

        let engine = AnalysisEngine::default();
        assert_eq!(engine.analyze_request(&request).unwrap_err().kind(), "malformed_entry");
        assert_eq!(engine.score_request(&request).unwrap_err().kind(), "malformed_entry");
    }

    #[test]
    fn test_empty_batch_is_insufficient_data() {
        let err = AnalysisEngine::default()
            .analyze_request(&AnalysisRequest::new(Vec::new()))
            .unwrap_err();
        assert_eq!(err.kind(), "insufficient_data");
    }

    #[test]
    fn test_invalid_json() {
        let result = analyze_logs("not valid json".to_string());
        assert!(result.is_err());
    }
}
