//! Load scoring
//!
//! This module computes the per-day Total Negative Load (TNL):
//! - Stress, already on a 0-10 scale
//! - Study minutes rescaled onto 0-10 with a ceiling
//! - Levels of load-adding custom factors, unbounded
//! - Optionally, a sleep-deficit penalty for users whose history confirms
//!   that low sleep goes with high symptoms
//!
//! Protective factors are recorded for charting but never reduce TNL; their
//! effect is measured against the symptom by the pattern analyzers instead.

use crate::config::{EngineConfig, SleepPenaltyConfig};
use crate::types::{DailyLogEntry, ScoredDay, SleepVulnerability};
use chrono::NaiveDate;
use tracing::debug;

/// Scored series plus the vulnerability verdict that gated the sleep penalty
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSeries {
    pub days: Vec<ScoredDay>,
    pub sleep_vulnerability: SleepVulnerability,
}

/// Scorer for computing per-day load
pub struct LoadScorer;

impl LoadScorer {
    /// Score every day of a normalized series, judged as of its last day
    pub fn score_series(entries: &[DailyLogEntry], config: &EngineConfig) -> ScoredSeries {
        Self::score_series_as_of(entries, config, None)
    }

    /// Score every day, confirming sleep vulnerability only from days before
    /// `evaluation_date` (the last day when `None`)
    pub fn score_series_as_of(
        entries: &[DailyLogEntry],
        config: &EngineConfig,
        evaluation_date: Option<NaiveDate>,
    ) -> ScoredSeries {
        let penalty = &config.sleep_penalty;
        let sleep_vulnerability = assess_sleep_vulnerability(entries, penalty, evaluation_date);
        let apply_penalty = penalty.enabled && sleep_vulnerability.vulnerable;

        let days = entries
            .iter()
            .map(|entry| {
                let sleep_penalty = if apply_penalty {
                    sleep_deficit_penalty(entry.sleep_hours, penalty)
                } else {
                    0.0
                };
                Self::score_day(entry, config.study_minutes_ceiling, sleep_penalty)
            })
            .collect();

        debug!(
            days = entries.len(),
            sleep_penalty_applied = apply_penalty,
            "scored load series"
        );

        ScoredSeries {
            days,
            sleep_vulnerability,
        }
    }

    /// Score a single day
    pub fn score_day(entry: &DailyLogEntry, study_ceiling: u32, sleep_penalty: f64) -> ScoredDay {
        let stress_component = entry.stress as f64;
        let study_component = study_component(entry.study_minutes, study_ceiling);

        let mut positive_custom_component = 0.0;
        let mut protective_custom_component = 0.0;
        for factor in &entry.custom_factors {
            let impact = factor.impact() as f64;
            if impact > 0.0 {
                positive_custom_component += impact;
            } else {
                protective_custom_component += impact;
            }
        }

        let tnl = stress_component + study_component + positive_custom_component + sleep_penalty;

        ScoredDay {
            date: entry.date,
            tnl,
            stress_component,
            study_component,
            positive_custom_component,
            sleep_penalty_component: sleep_penalty,
            protective_custom_component,
            tic_count: entry.tic_count,
        }
    }
}

/// Study burden on a 0-10 scale, saturating at `ceiling` minutes
pub fn study_component(study_minutes: u32, ceiling: u32) -> f64 {
    if ceiling == 0 {
        return 0.0;
    }
    study_minutes.min(ceiling) as f64 / ceiling as f64 * 10.0
}

fn sleep_deficit_penalty(sleep_hours: f64, config: &SleepPenaltyConfig) -> f64 {
    (config.healthy_sleep_hours - sleep_hours).max(0.0) * config.weight
}

/// Check whether low-sleep nights have tended to come with high symptoms.
///
/// Only days strictly before `evaluation_date` count, so neither the judged
/// day nor anything after it can confirm its own penalty. `None` judges the
/// last day of the date-sorted series.
pub fn assess_sleep_vulnerability(
    entries: &[DailyLogEntry],
    config: &SleepPenaltyConfig,
    evaluation_date: Option<NaiveDate>,
) -> SleepVulnerability {
    let end = match evaluation_date {
        Some(date) => entries.partition_point(|e| e.date < date),
        None => entries.len().saturating_sub(1),
    };
    let history = &entries[..end];
    if history.is_empty() {
        return SleepVulnerability::not_assessed();
    }

    let low_sleep: Vec<&DailyLogEntry> = history
        .iter()
        .filter(|e| e.sleep_hours <= config.low_sleep_hours)
        .collect();
    let high_tic = low_sleep
        .iter()
        .filter(|e| e.tic_count >= config.high_tic_count)
        .count();

    if low_sleep.is_empty() || low_sleep.len() < config.min_low_sleep_days {
        return SleepVulnerability {
            low_sleep_days: low_sleep.len(),
            high_tic_low_sleep_days: high_tic,
            ratio: None,
            vulnerable: false,
        };
    }

    let ratio = high_tic as f64 / low_sleep.len() as f64;
    SleepVulnerability {
        low_sleep_days: low_sleep.len(),
        high_tic_low_sleep_days: high_tic,
        ratio: Some(ratio),
        vulnerable: ratio >= config.vulnerability_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CustomFactor;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn make_entry(day: u32, sleep: f64, study: u32, stress: u8, tics: u8) -> DailyLogEntry {
        DailyLogEntry::new(
            NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            sleep,
            study,
            stress,
            tics,
        )
    }

    #[test]
    fn test_tnl_components() {
        let entry = make_entry(1, 7.0, 450, 4, 2)
            .with_factor(CustomFactor::stressor("Exam", 3))
            .with_factor(CustomFactor::stressor("Argument", 2))
            .with_factor(CustomFactor::protective("Walk", 4));

        let day = LoadScorer::score_day(&entry, 900, 0.0);
        assert_eq!(day.stress_component, 4.0);
        assert!((day.study_component - 5.0).abs() < 1e-12);
        assert_eq!(day.positive_custom_component, 5.0);
        assert_eq!(day.protective_custom_component, -4.0);
        assert!((day.tnl - 14.0).abs() < 1e-12);
        assert_eq!(day.tic_count, 2);
    }

    #[test]
    fn test_study_component_clips() {
        for minutes in [900, 901, 1_500, 10_000, u32::MAX] {
            let value = study_component(minutes, 900);
            assert!((value - 10.0).abs() < 1e-12, "{minutes} -> {value}");
        }
        assert_eq!(study_component(0, 900), 0.0);
        assert!((study_component(90, 900) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_tnl_never_negative() {
        let mut entry = make_entry(1, 7.0, 0, 0, 0);
        for _ in 0..5 {
            entry = entry.with_factor(CustomFactor::protective("Music", 5));
        }
        let day = LoadScorer::score_day(&entry, 900, 0.0);
        assert_eq!(day.tnl, 0.0);
        assert!(day.study_component >= 0.0 && day.study_component <= 10.0);
    }

    #[test]
    fn test_penalty_disabled_by_default() {
        let entries: Vec<DailyLogEntry> = (1..=8).map(|d| make_entry(d, 4.0, 0, 2, 8)).collect();
        let scored = LoadScorer::score_series(&entries, &EngineConfig::default());

        // The history would confirm vulnerability, but the extension is off
        assert!(scored.sleep_vulnerability.vulnerable);
        assert!(scored.days.iter().all(|d| d.sleep_penalty_component == 0.0));
        assert!(scored.days.iter().all(|d| (d.tnl - 2.0).abs() < 1e-12));
    }

    #[test]
    fn test_penalty_applied_when_vulnerable() {
        let entries: Vec<DailyLogEntry> = (1..=8).map(|d| make_entry(d, 5.0, 0, 2, 8)).collect();
        let config = EngineConfig::default().with_sleep_penalty(true);
        let scored = LoadScorer::score_series(&entries, &config);

        // (8 - 5) * 1.5 = 4.5
        for day in &scored.days {
            assert!((day.sleep_penalty_component - 4.5).abs() < 1e-12);
            assert!((day.tnl - 6.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_penalty_not_applied_without_pattern() {
        let entries: Vec<DailyLogEntry> = (1..=8).map(|d| make_entry(d, 5.0, 0, 2, 1)).collect();
        let config = EngineConfig::default().with_sleep_penalty(true);
        let scored = LoadScorer::score_series(&entries, &config);

        assert!(!scored.sleep_vulnerability.vulnerable);
        assert_eq!(scored.sleep_vulnerability.ratio, Some(0.0));
        assert!(scored.days.iter().all(|d| d.sleep_penalty_component == 0.0));
    }

    #[test]
    fn test_vulnerability_needs_enough_low_sleep_days() {
        let mut entries: Vec<DailyLogEntry> = (1..=6).map(|d| make_entry(d, 8.0, 0, 2, 1)).collect();
        entries.push(make_entry(7, 5.0, 0, 2, 9));
        entries.push(make_entry(8, 5.0, 0, 2, 9));
        // Last day excluded: two low-sleep nights in history, three needed
        entries.push(make_entry(9, 5.0, 0, 2, 9));

        let verdict = assess_sleep_vulnerability(&entries, &SleepPenaltyConfig::default(), None);
        assert_eq!(verdict.low_sleep_days, 2);
        assert_eq!(verdict.ratio, None);
        assert!(!verdict.vulnerable);
    }

    #[test]
    fn test_vulnerability_ignores_evaluation_day_and_later() {
        let mut entries: Vec<DailyLogEntry> = (1..=7).map(|d| make_entry(d, 8.0, 0, 2, 1)).collect();
        entries.extend((8..=12).map(|d| make_entry(d, 5.0, 0, 2, 9)));
        let config = EngineConfig::default().with_sleep_penalty(true);

        let as_of_last = LoadScorer::score_series(&entries, &config);
        assert!(as_of_last.sleep_vulnerability.vulnerable);

        let day_8 = NaiveDate::from_ymd_opt(2024, 3, 8);
        let as_of_day_8 = LoadScorer::score_series_as_of(&entries, &config, day_8);
        assert_eq!(as_of_day_8.sleep_vulnerability.low_sleep_days, 0);
        assert!(!as_of_day_8.sleep_vulnerability.vulnerable);
        assert!(as_of_day_8.days.iter().all(|d| d.sleep_penalty_component == 0.0));

        let single = [make_entry(1, 4.0, 0, 2, 9)];
        let verdict = assess_sleep_vulnerability(&single, &config.sleep_penalty, None);
        assert_eq!(verdict, SleepVulnerability::not_assessed());
    }
}
