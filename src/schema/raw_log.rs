//! Daily log wire format
//!
//! Mirrors the nested JSON the log store writes for each day. Every field is
//! optional at this layer; the normalizer decides what is required and
//! reports what is missing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A scalar as submitted: numbers may arrive as JSON numbers or numeric strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Flag(bool),
    Other(serde_json::Value),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Number(v as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Flag(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl FieldValue {
    /// Coerce to a finite number; numeric strings are accepted
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            FieldValue::Number(n) if *n == 0.0 => Some(false),
            FieldValue::Number(n) if *n == 1.0 => Some(true),
            FieldValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPhysiological {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_hours: Option<FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCognitiveLoad {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_minutes: Option<FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEmotional {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress: Option<FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSymptoms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tic_count: Option<FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawScreen {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_time_hours: Option<FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSocial {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_conflict: Option<FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCustomFactor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<FieldValue>,
}

/// One day as stored by the log store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDailyLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physiological: Option<RawPhysiological>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cognitive_load: Option<RawCognitiveLoad>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional: Option<RawEmotional>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<RawSymptoms>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<RawScreen>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social: Option<RawSocial>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<Vec<RawCustomFactor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
}

impl RawDailyLog {
    /// Build a log with the required fields populated
    pub fn new(
        date: &str,
        sleep_hours: f64,
        study_minutes: i64,
        stress: i64,
        tic_count: i64,
    ) -> Self {
        Self {
            date: Some(date.to_string()),
            physiological: Some(RawPhysiological {
                sleep_hours: Some(sleep_hours.into()),
            }),
            cognitive_load: Some(RawCognitiveLoad {
                study_minutes: Some(study_minutes.into()),
            }),
            emotional: Some(RawEmotional {
                stress: Some(stress.into()),
            }),
            symptoms: Some(RawSymptoms {
                tic_count: Some(tic_count.into()),
            }),
            ..Default::default()
        }
    }

    pub fn with_factor(mut self, name: &str, level: i64, effect: i64) -> Self {
        self.custom.get_or_insert_with(Vec::new).push(RawCustomFactor {
            name: Some(name.to_string()),
            level: Some(level.into()),
            effect: Some(effect.into()),
        });
        self
    }
}

/// A batch of logs plus optional per-request overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub entries: Vec<RawDailyLog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_days: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation_date: Option<NaiveDate>,
}

impl AnalysisRequest {
    pub fn new(entries: Vec<RawDailyLog>) -> Self {
        Self {
            entries,
            window_days: None,
            evaluation_date: None,
        }
    }
}
