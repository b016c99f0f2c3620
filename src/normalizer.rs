//! Record normalization
//!
//! This module turns a submitted batch of daily logs into the canonical series
//! every later stage consumes:
//! - Required fields present and numeric, otherwise the batch is rejected
//! - Out-of-range values clamped silently to their declared domains
//! - Sorted ascending by date, with later submissions replacing earlier ones
//!   for the same date

use crate::error::ComputeError;
use crate::schema::{FieldValue, RawCustomFactor, RawDailyLog};
use crate::types::{CustomFactor, DailyLogEntry, FactorEffect};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, warn};

const MAX_SLEEP_HOURS: f64 = 24.0;
const MAX_SCALE: f64 = 10.0;
const MIN_FACTOR_LEVEL: f64 = 1.0;
const MAX_FACTOR_LEVEL: f64 = 5.0;

/// Normalizer for converting submitted logs to a canonical series
pub struct Normalizer;

impl Normalizer {
    /// Normalize a raw batch. Fails on the first malformed entry.
    pub fn normalize(logs: &[RawDailyLog]) -> Result<Vec<DailyLogEntry>, ComputeError> {
        let entries = logs
            .iter()
            .enumerate()
            .map(|(index, log)| Self::normalize_log(index, log))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::order_series(entries))
    }

    /// Normalize already-typed entries from an in-process caller
    pub fn normalize_entries(entries: Vec<DailyLogEntry>) -> Result<Vec<DailyLogEntry>, ComputeError> {
        let entries = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| Self::clamp_entry(index, entry))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::order_series(entries))
    }

    /// Convert one submitted log, `index` being its position in submission order
    pub fn normalize_log(index: usize, log: &RawDailyLog) -> Result<DailyLogEntry, ComputeError> {
        let raw_date = log.date.as_deref();
        let fail = |reason: String| ComputeError::malformed(index, raw_date, reason);

        let date = parse_date(raw_date.ok_or_else(|| fail("missing field date".to_string()))?)
            .ok_or_else(|| fail(format!("date {:?} is not YYYY-MM-DD", raw_date.unwrap_or(""))))?;

        let sleep_hours = required_number(
            log.physiological.as_ref().and_then(|p| p.sleep_hours.as_ref()),
            "physiological.sleep_hours",
        )
        .map_err(&fail)?
        .clamp(0.0, MAX_SLEEP_HOURS);

        let study_minutes = required_number(
            log.cognitive_load.as_ref().and_then(|c| c.study_minutes.as_ref()),
            "cognitive_load.study_minutes",
        )
        .map_err(&fail)?
        .round()
        .clamp(0.0, u32::MAX as f64) as u32;

        let stress = required_number(
            log.emotional.as_ref().and_then(|e| e.stress.as_ref()),
            "emotional.stress",
        )
        .map_err(&fail)?
        .round()
        .clamp(0.0, MAX_SCALE) as u8;

        let tic_count = required_number(
            log.symptoms.as_ref().and_then(|s| s.tic_count.as_ref()),
            "symptoms.tic_count",
        )
        .map_err(&fail)?
        .round()
        .clamp(0.0, MAX_SCALE) as u8;

        let screen_time_hours = match log.screen.as_ref().and_then(|s| s.screen_time_hours.as_ref()) {
            Some(value) => value
                .as_f64()
                .ok_or_else(|| fail("field screen.screen_time_hours is not numeric".to_string()))?
                .max(0.0),
            None => 0.0,
        };

        let social_conflict = match log.social.as_ref().and_then(|s| s.social_conflict.as_ref()) {
            Some(value) => value
                .as_bool()
                .ok_or_else(|| fail("field social.social_conflict is not a boolean".to_string()))?,
            None => false,
        };

        let custom_factors = log
            .custom
            .as_deref()
            .unwrap_or_default()
            .iter()
            .enumerate()
            .map(|(i, factor)| convert_factor(i, factor).map_err(&fail))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DailyLogEntry {
            date,
            sleep_hours,
            study_minutes,
            stress,
            tic_count,
            screen_time_hours,
            social_conflict,
            custom_factors,
            journal: log.journal.clone().unwrap_or_default(),
        })
    }

    fn clamp_entry(index: usize, mut entry: DailyLogEntry) -> Result<DailyLogEntry, ComputeError> {
        let date = entry.date.to_string();
        let fail = |reason: &str| ComputeError::malformed(index, Some(&date), reason);

        if !entry.sleep_hours.is_finite() {
            return Err(fail("sleep_hours is not a finite number"));
        }
        if !entry.screen_time_hours.is_finite() {
            return Err(fail("screen_time_hours is not a finite number"));
        }
        entry.sleep_hours = entry.sleep_hours.clamp(0.0, MAX_SLEEP_HOURS);
        entry.screen_time_hours = entry.screen_time_hours.max(0.0);
        entry.stress = entry.stress.min(MAX_SCALE as u8);
        entry.tic_count = entry.tic_count.min(MAX_SCALE as u8);

        for factor in &mut entry.custom_factors {
            let name = factor.name.trim();
            if name.is_empty() {
                return Err(fail("custom factor name is empty"));
            }
            if name.len() != factor.name.len() {
                factor.name = name.to_string();
            }
            factor.level = factor.level.clamp(MIN_FACTOR_LEVEL as u8, MAX_FACTOR_LEVEL as u8);
        }
        Ok(entry)
    }

    /// Sort by date; a later entry for an already-seen date replaces it
    fn order_series(entries: Vec<DailyLogEntry>) -> Vec<DailyLogEntry> {
        let submitted = entries.len();
        let mut by_date: BTreeMap<NaiveDate, DailyLogEntry> = BTreeMap::new();

        for entry in entries {
            if let Some(previous) = by_date.insert(entry.date, entry) {
                warn!(date = %previous.date, "duplicate date in batch, keeping later entry");
            }
        }

        debug!(submitted, days = by_date.len(), "normalized log series");
        by_date.into_values().collect()
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn required_number(value: Option<&FieldValue>, path: &str) -> Result<f64, String> {
    let value = value.ok_or_else(|| format!("missing field {path}"))?;
    value
        .as_f64()
        .ok_or_else(|| format!("field {path} is not numeric"))
}

fn convert_factor(position: usize, raw: &RawCustomFactor) -> Result<CustomFactor, String> {
    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| format!("custom[{position}].name is missing or empty"))?;

    let level = required_number(raw.level.as_ref(), &format!("custom[{position}].level"))?
        .round()
        .clamp(MIN_FACTOR_LEVEL, MAX_FACTOR_LEVEL) as u8;

    let effect = required_number(raw.effect.as_ref(), &format!("custom[{position}].effect"))?;
    let effect = if effect >= 0.0 {
        FactorEffect::Stressor
    } else {
        FactorEffect::Protective
    };

    Ok(CustomFactor {
        name: name.to_string(),
        level,
        effect,
    })
}
