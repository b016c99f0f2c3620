//! Result assembly
//!
//! This module packages the outputs of the scorer, classifier, and pattern
//! analyzers into one report with producer metadata. It computes nothing of
//! its own.

use crate::error::ComputeError;
use crate::scorer::ScoredSeries;
use crate::types::{
    AnalysisReport, BestDay, CorrelationResult, FactorRankEntry, PacingAssessment, ReportProducer,
    ScoreReport,
};
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::Utc;
use uuid::Uuid;

/// Everything one analysis produced, before packaging
#[derive(Debug, Clone)]
pub struct AnalysisComponents {
    pub window_days: usize,
    pub scored: ScoredSeries,
    pub pacing: PacingAssessment,
    pub protective_factors: Vec<FactorRankEntry>,
    pub best_days: Vec<BestDay>,
    pub sleep_correlation: CorrelationResult,
}

/// Report encoder stamping every report with the same instance ID
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn producer(&self) -> ReportProducer {
        ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: ENGINE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        }
    }

    /// Package analysis components into a report
    pub fn encode(&self, components: AnalysisComponents) -> AnalysisReport {
        let AnalysisComponents {
            window_days,
            scored,
            pacing,
            protective_factors,
            best_days,
            sleep_correlation,
        } = components;

        AnalysisReport {
            producer: self.producer(),
            computed_at_utc: Utc::now().to_rfc3339(),
            window_days,
            days_analyzed: scored.days.len(),
            pacing,
            protective_factors,
            best_days,
            sleep_correlation,
            sleep_vulnerability: scored.sleep_vulnerability,
            per_day_breakdown: scored.days,
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(&self, components: AnalysisComponents) -> Result<String, ComputeError> {
        let report = self.encode(components);
        serde_json::to_string_pretty(&report).map_err(ComputeError::JsonError)
    }

    /// Package a scored series on its own
    pub fn encode_scores(&self, scored: ScoredSeries) -> ScoreReport {
        ScoreReport {
            producer: self.producer(),
            computed_at_utc: Utc::now().to_rfc3339(),
            days_analyzed: scored.days.len(),
            sleep_vulnerability: scored.sleep_vulnerability,
            per_day_breakdown: scored.days,
        }
    }
}
