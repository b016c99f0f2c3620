//! Protective factor ranking

use crate::error::ComputeError;
use crate::stats::mean;
use crate::types::{BestDay, DailyLogEntry, FactorRankEntry, ScoredDay};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

const ANALYSIS: &str = "protective factor ranking";

/// Ranks protective factors against the overall symptom mean
pub struct ProtectiveFactorRanker;

#[derive(Default)]
struct FactorUsage {
    /// Indices of days the factor was logged on, ascending and distinct
    days: Vec<usize>,
    level_sum: f64,
    occurrences: usize,
}

impl ProtectiveFactorRanker {
    /// Rank every factor logged as protective anywhere in the series.
    ///
    /// Sorted descending by signed `pct_tic_reduction`, ties by name. A series
    /// without protective factors yields an empty list.
    pub fn rank(
        entries: &[DailyLogEntry],
        window_days: usize,
    ) -> Result<Vec<FactorRankEntry>, ComputeError> {
        if entries.len() < window_days {
            return Err(ComputeError::insufficient(ANALYSIS, window_days, entries.len()));
        }

        let tics: Vec<f64> = entries.iter().map(|e| e.tic_count as f64).collect();
        let overall_avg = mean(&tics).unwrap_or(0.0);

        let mut usage: BTreeMap<&str, FactorUsage> = BTreeMap::new();
        for (index, entry) in entries.iter().enumerate() {
            for factor in entry.protective_factors() {
                let record = usage.entry(factor.name.as_str()).or_default();
                if record.days.last() != Some(&index) {
                    record.days.push(index);
                }
                record.level_sum += factor.level as f64;
                record.occurrences += 1;
            }
        }

        let mut ranking: Vec<FactorRankEntry> = usage
            .into_iter()
            .map(|(name, record)| {
                let with: Vec<f64> = record.days.iter().map(|&i| tics[i]).collect();
                let without: Vec<f64> = tics
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| record.days.binary_search(i).is_err())
                    .map(|(_, t)| *t)
                    .collect();

                let avg_tics_with = mean(&with).unwrap_or(0.0);
                let avg_tics_without = mean(&without).unwrap_or(avg_tics_with);

                FactorRankEntry {
                    name: name.to_string(),
                    pct_tic_reduction: pct_reduction(overall_avg, avg_tics_with),
                    times_used: record.days.len(),
                    avg_tics_with,
                    avg_tics_without,
                    avg_level: record.level_sum / record.occurrences as f64,
                }
            })
            .collect();

        ranking.sort_by(|a, b| {
            b.pct_tic_reduction
                .total_cmp(&a.pct_tic_reduction)
                .then_with(|| a.name.cmp(&b.name))
        });

        debug!(
            factors = ranking.len(),
            overall_avg_tics = overall_avg,
            "ranked protective factors"
        );

        Ok(ranking)
    }

    /// The `count` lowest-load days with the protective factors logged on each.
    ///
    /// `days` and `entries` must be the same series in the same order.
    pub fn best_days(days: &[ScoredDay], entries: &[DailyLogEntry], count: usize) -> Vec<BestDay> {
        let mut paired: Vec<(&ScoredDay, &DailyLogEntry)> = days.iter().zip(entries).collect();
        paired.sort_by(|(a, _), (b, _)| match a.tnl.total_cmp(&b.tnl) {
            Ordering::Equal => a.date.cmp(&b.date),
            other => other,
        });

        paired
            .into_iter()
            .take(count)
            .map(|(day, entry)| {
                let mut names: Vec<String> = Vec::new();
                for factor in entry.protective_factors() {
                    if !names.contains(&factor.name) {
                        names.push(factor.name.clone());
                    }
                }
                BestDay {
                    date: day.date,
                    tnl: day.tnl,
                    tic_count: day.tic_count,
                    protective_factors: names,
                }
            })
            .collect()
    }
}

fn pct_reduction(overall_avg: f64, avg_with: f64) -> f64 {
    if overall_avg == 0.0 {
        return 0.0;
    }
    (overall_avg - avg_with) / overall_avg * 100.0
}
