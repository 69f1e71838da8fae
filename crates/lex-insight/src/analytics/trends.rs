//! Two-window trend detection.

use crate::types::{OrderedMap, TrendDirection, TrendEntry};
use crate::utils::{ColumnKind, column_kind, mean, present_numeric_values, round2};
use polars::prelude::*;

/// Compare the mean of the first half of the values with the second half.
///
/// The first half holds `n / 2` values. Returns `None` with fewer than three
/// values or when the change does not exceed `threshold_percent`. A zero
/// first-half mean counts as no change.
pub fn detect_trend(values: &[f64], threshold_percent: f64) -> Option<TrendEntry> {
    if values.len() <= 2 {
        return None;
    }

    let (first, second) = values.split_at(values.len() / 2);
    let first_half_mean = mean(first)?;
    let second_half_mean = mean(second)?;

    let change = second_half_mean - first_half_mean;
    let change_percent = if first_half_mean != 0.0 {
        change / first_half_mean * 100.0
    } else {
        0.0
    };
    if change_percent.abs() <= threshold_percent {
        return None;
    }

    Some(TrendEntry {
        direction: if change > 0.0 {
            TrendDirection::Increasing
        } else {
            TrendDirection::Decreasing
        },
        change_percent: round2(change_percent),
        first_half_mean: round2(first_half_mean),
        second_half_mean: round2(second_half_mean),
    })
}

/// Trend entries for every numeric column that shows one.
pub fn trend_report(df: &DataFrame, threshold_percent: f64) -> OrderedMap<TrendEntry> {
    df.get_columns()
        .iter()
        .filter(|col| column_kind(col.dtype()) == ColumnKind::Numeric)
        .filter_map(|col| {
            let values = present_numeric_values(col.as_materialized_series());
            detect_trend(&values, threshold_percent).map(|trend| (col.name().to_string(), trend))
        })
        .collect()
}
