//! Simple table anomalies.

use crate::types::{AnomalyReport, HighNullColumn};
use crate::utils::{distinct_count, duplicate_row_count, round2};
use polars::prelude::*;

/// Duplicate rows, constant columns and mostly-missing columns.
///
/// `high_null_threshold` is a fraction; a column is flagged when its missing
/// rate is strictly above it.
pub fn anomaly_report(df: &DataFrame, high_null_threshold: f64) -> AnomalyReport {
    let rows = df.height();

    let columns_with_single_value = df
        .get_columns()
        .iter()
        .filter(|col| distinct_count(col.as_materialized_series()) == 1)
        .map(|col| col.name().to_string())
        .collect();

    let columns_with_high_null_rate = if rows == 0 {
        Vec::new()
    } else {
        df.get_columns()
            .iter()
            .filter_map(|col| {
                let rate = col.null_count() as f64 / rows as f64;
                (rate > high_null_threshold).then(|| HighNullColumn {
                    column: col.name().to_string(),
                    null_percentage: round2(rate * 100.0),
                })
            })
            .collect()
    };

    AnomalyReport {
        duplicate_rows: duplicate_row_count(df),
        columns_with_single_value,
        columns_with_high_null_rate,
    }
}
