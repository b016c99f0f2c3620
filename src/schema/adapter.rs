//! Adapter for reading log-store batches
//!
//! Accepts a bare JSON array of daily logs, the `{ "entries": [...] }` request
//! envelope, or NDJSON with one log per line. Shape errors on a single entry
//! are reported against that entry's index rather than the whole document.

use crate::error::ComputeError;
use crate::normalizer::Normalizer;
use crate::schema::raw_log::{AnalysisRequest, RawDailyLog};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Adapter for parsing and checking submitted logs
pub struct RawLogAdapter;

impl RawLogAdapter {
    /// Parse a JSON string containing an array of daily logs
    pub fn parse_array(json: &str) -> Result<Vec<RawDailyLog>, ComputeError> {
        let values: Vec<Value> = serde_json::from_str(json)?;
        values
            .into_iter()
            .enumerate()
            .map(|(index, value)| decode_log(index, value))
            .collect()
    }

    /// Parse NDJSON (newline-delimited JSON) containing one daily log per line
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawDailyLog>, ComputeError> {
        let mut logs = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(trimmed).map_err(|e| {
                ComputeError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
            })?;
            let index = logs.len();
            logs.push(decode_log(index, value)?);
        }
        Ok(logs)
    }

    /// Parse a request: either a bare array of logs or the envelope object
    pub fn parse_request(json: &str) -> Result<AnalysisRequest, ComputeError> {
        let value: Value = serde_json::from_str(json)?;
        Self::request_from_value(value)
    }

    pub fn request_from_value(value: Value) -> Result<AnalysisRequest, ComputeError> {
        match value {
            Value::Array(items) => Ok(AnalysisRequest::new(decode_logs(items)?)),
            Value::Object(mut map) => {
                let entries = match map.remove("entries") {
                    Some(Value::Array(items)) => decode_logs(items)?,
                    Some(_) => {
                        return Err(ComputeError::ParseError(
                            "\"entries\" must be an array".to_string(),
                        ))
                    }
                    None => {
                        return Err(ComputeError::ParseError(
                            "request object has no \"entries\" array".to_string(),
                        ))
                    }
                };

                let window_days = match map.remove("window_days") {
                    None | Some(Value::Null) => None,
                    Some(value) => Some(
                        value
                            .as_u64()
                            .and_then(|v| usize::try_from(v).ok())
                            .ok_or_else(|| {
                                ComputeError::ParseError(format!(
                                    "window_days must be a non-negative integer, got {value}"
                                ))
                            })?,
                    ),
                };

                let evaluation_date = match map.remove("evaluation_date") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) => Some(parse_evaluation_date(&s)?),
                    Some(other) => {
                        return Err(ComputeError::ParseError(format!(
                            "evaluation_date must be a YYYY-MM-DD string, got {other}"
                        )))
                    }
                };

                Ok(AnalysisRequest {
                    entries,
                    window_days,
                    evaluation_date,
                })
            }
            _ => Err(ComputeError::ParseError(
                "expected a JSON array of logs or an object with \"entries\"".to_string(),
            )),
        }
    }

    /// Check every log in a request document, collecting all problems.
    ///
    /// Only a document that is not JSON at all (or has no entries array) is an
    /// error; per-entry problems are listed in the report.
    pub fn validate_json(json: &str) -> Result<ValidationReport, ComputeError> {
        let value: Value = serde_json::from_str(json)?;
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("entries") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(ComputeError::ParseError(
                        "request object has no \"entries\" array".to_string(),
                    ))
                }
            },
            _ => {
                return Err(ComputeError::ParseError(
                    "expected a JSON array of logs or an object with \"entries\"".to_string(),
                ))
            }
        };
        Ok(Self::validate_values(items))
    }

    /// Check every line of an NDJSON document; a line that is not JSON is an error
    pub fn validate_ndjson(ndjson: &str) -> Result<ValidationReport, ComputeError> {
        let mut items = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(trimmed).map_err(|e| {
                ComputeError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
            })?;
            items.push(value);
        }
        Ok(Self::validate_values(items))
    }

    fn validate_values(items: Vec<Value>) -> ValidationReport {
        let total_entries = items.len();
        let errors: Vec<ValidationResult> = items
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                let checked = decode_log(index, value)
                    .and_then(|log| Normalizer::normalize_log(index, &log).map(|_| ()));
                checked.err().map(ValidationResult::from_error)
            })
            .collect();
        ValidationReport::new(total_entries, errors)
    }

    /// Validate a batch of already-decoded logs
    pub fn validate_logs(logs: &[RawDailyLog]) -> Vec<ValidationResult> {
        logs.iter()
            .enumerate()
            .filter_map(|(index, log)| Normalizer::normalize_log(index, log).err())
            .map(ValidationResult::from_error)
            .collect()
    }
}

/// Outcome of validating a whole batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub invalid_entries: usize,
    pub errors: Vec<ValidationResult>,
}

impl ValidationReport {
    pub fn new(total_entries: usize, errors: Vec<ValidationResult>) -> Self {
        Self {
            total_entries,
            valid_entries: total_entries.saturating_sub(errors.len()),
            invalid_entries: errors.len(),
            errors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// One malformed entry found during validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub reason: String,
}

impl ValidationResult {
    fn from_error(error: ComputeError) -> Self {
        match error {
            ComputeError::MalformedEntry {
                index,
                date,
                reason,
            } => ValidationResult {
                index,
                date: (date != "unknown").then_some(date),
                reason,
            },
            other => ValidationResult {
                index: 0,
                date: None,
                reason: other.to_string(),
            },
        }
    }
}

fn decode_logs(items: Vec<Value>) -> Result<Vec<RawDailyLog>, ComputeError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, value)| decode_log(index, value))
        .collect()
}

fn decode_log(index: usize, value: Value) -> Result<RawDailyLog, ComputeError> {
    if !value.is_object() {
        return Err(ComputeError::malformed(index, None, "entry is not a JSON object"));
    }
    let date = value.get("date").and_then(Value::as_str).map(str::to_string);
    serde_json::from_value(value)
        .map_err(|e| ComputeError::malformed(index, date.as_deref(), e.to_string()))
}

fn parse_evaluation_date(raw: &str) -> Result<NaiveDate, ComputeError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ComputeError::ParseError(format!("evaluation_date {raw:?} is not YYYY-MM-DD"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_array() {
        let json = r#"[
            {"date":"2024-03-01","physiological":{"sleep_hours":7},"cognitive_load":{"study_minutes":60},"emotional":{"stress":3},"symptoms":{"tic_count":2}},
            {"date":"2024-03-02","physiological":{"sleep_hours":"6.5"},"cognitive_load":{"study_minutes":0},"emotional":{"stress":5},"symptoms":{"tic_count":4}}
        ]"#;

        let logs = RawLogAdapter::parse_array(json).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].date.as_deref(), Some("2024-03-02"));
    }

    #[test]
    fn test_parse_array_reports_entry_index() {
        let json = r#"[
            {"date":"2024-03-01"},
            {"date":"2024-03-02","custom":"not a list"}
        ]"#;

        match RawLogAdapter::parse_array(json).unwrap_err() {
            ComputeError::MalformedEntry { index, date, .. } => {
                assert_eq!(index, 1);
                assert_eq!(date, "2024-03-02");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_ndjson() {
        let ndjson = r#"{"date":"2024-03-01","emotional":{"stress":2}}

{"date":"2024-03-02","emotional":{"stress":4}}"#;

        let logs = RawLogAdapter::parse_ndjson(ndjson).unwrap();
        assert_eq!(logs.len(), 2);

        let err = RawLogAdapter::parse_ndjson("{\"date\":\"2024-03-01\"}\n{oops").unwrap_err();
        assert_eq!(err.kind(), "parse_error");
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_request_forms() {
        let bare = RawLogAdapter::parse_request("[]").unwrap();
        assert!(bare.entries.is_empty());
        assert_eq!(bare.window_days, None);

        let envelope = RawLogAdapter::parse_request(
            r#"{"entries":[{"date":"2024-03-01"}],"window_days":10,"evaluation_date":"2024-03-01"}"#,
        )
        .unwrap();
        assert_eq!(envelope.entries.len(), 1);
        assert_eq!(envelope.window_days, Some(10));
        assert_eq!(envelope.evaluation_date, NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_parse_request_rejects_bad_envelope() {
        let err = RawLogAdapter::parse_request(r#"{"entries":[],"evaluation_date":"03/01/2024"}"#)
            .unwrap_err();
        assert_eq!(err.kind(), "parse_error");

        let err = RawLogAdapter::parse_request(r#"{"logs":[]}"#).unwrap_err();
        assert_eq!(err.kind(), "parse_error");

        let err = RawLogAdapter::parse_request("42").unwrap_err();
        assert_eq!(err.kind(), "parse_error");

        let err = RawLogAdapter::parse_request("{not json").unwrap_err();
        assert_eq!(err.kind(), "json_error");
    }

    #[test]
    fn test_validate_collects_every_problem() {
        let json = r#"[
            {"date":"2024-03-01","physiological":{"sleep_hours":7},"cognitive_load":{"study_minutes":60},"emotional":{"stress":3},"symptoms":{"tic_count":2}},
            {"date":"2024-03-02","physiological":{"sleep_hours":7},"cognitive_load":{"study_minutes":60},"emotional":{"stress":"high"},"symptoms":{"tic_count":2}},
            {"physiological":{"sleep_hours":7}},
            5
        ]"#;

        let report = RawLogAdapter::validate_json(json).unwrap();
        assert_eq!(report.total_entries, 4);
        assert_eq!(report.valid_entries, 1);
        assert!(!report.is_valid());

        let results = &report.errors;
        assert_eq!(results.len(), 3);

        assert_eq!(results[0].index, 1);
        assert_eq!(results[0].date.as_deref(), Some("2024-03-02"));
        assert!(results[0].reason.contains("emotional.stress"));

        assert_eq!(results[1].index, 2);
        assert_eq!(results[1].date, None);
        assert!(results[1].reason.contains("date"));

        assert_eq!(results[2].index, 3);
    }

    #[test]
    fn test_validate_ndjson() {
        let ndjson = r#"{"date":"2024-03-01","physiological":{"sleep_hours":7},"cognitive_load":{"study_minutes":60},"emotional":{"stress":3},"symptoms":{"tic_count":2}}
{"date":"2024-03-02","physiological":{"sleep_hours":true},"cognitive_load":{"study_minutes":60},"emotional":{"stress":3},"symptoms":{"tic_count":2}}"#;

        let report = RawLogAdapter::validate_ndjson(ndjson).unwrap();
        assert_eq!(report.total_entries, 2);
        assert_eq!(report.invalid_entries, 1);
        assert!(report.errors[0].reason.contains("physiological.sleep_hours"));

        assert!(RawLogAdapter::validate_ndjson("{broken").is_err());
    }

    #[test]
    fn test_validate_logs_clean_batch() {
        let logs = vec![
            RawDailyLog::new("2024-03-01", 7.0, 60, 3, 2),
            RawDailyLog::new("2024-03-02", 8.0, 0, 1, 0).with_factor("Walk", 2, -1),
        ];
        assert!(RawLogAdapter::validate_logs(&logs).is_empty());
    }
}
