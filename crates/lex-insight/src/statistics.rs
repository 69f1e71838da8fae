//! Descriptive statistics over a cleaned table.

use crate::types::{CategoricalStats, DatasetSummary, NumericStats, OrderedMap, StatisticsDocument};
use crate::utils::{
    ColumnKind, column_kind, distinct_count, mean, present_numeric_values, quantile_sorted,
    sample_std, sorted, top_value_counts,
};
use polars::prelude::*;
use tracing::debug;

/// Most frequent values listed per categorical column.
pub const MOST_COMMON_LIMIT: usize = 10;

/// Compute the statistics document for a table.
pub fn statistics(df: &DataFrame) -> StatisticsDocument {
    let mut numeric_stats = OrderedMap::new();
    let mut categorical_stats = OrderedMap::new();

    for col in df.get_columns() {
        let series = col.as_materialized_series();
        match column_kind(col.dtype()) {
            ColumnKind::Numeric => {
                numeric_stats.insert(col.name().to_string(), numeric_summary(series));
            }
            ColumnKind::Categorical => {
                categorical_stats.insert(col.name().to_string(), categorical_summary(series));
            }
            _ => {}
        }
    }

    debug!(
        "Statistics: {} numeric, {} categorical columns",
        numeric_stats.len(),
        categorical_stats.len()
    );

    StatisticsDocument {
        summary: DatasetSummary {
            total_rows: df.height(),
            total_columns: df.width(),
            numeric_columns: numeric_stats.len(),
            categorical_columns: categorical_stats.len(),
        },
        numeric_stats,
        categorical_stats,
    }
}

/// Mean, median, sample std, min and max over the present values.
pub fn numeric_summary(series: &Series) -> NumericStats {
    let values = present_numeric_values(series);
    let ordered = sorted(&values);
    NumericStats {
        mean: mean(&values),
        median: quantile_sorted(&ordered, 0.5),
        std: sample_std(&values),
        min: ordered.first().copied(),
        max: ordered.last().copied(),
    }
}

/// Distinct count and top value frequencies.
pub fn categorical_summary(series: &Series) -> CategoricalStats {
    CategoricalStats {
        unique_values: distinct_count(series),
        most_common: top_value_counts(series, MOST_COMMON_LIMIT)
            .into_iter()
            .collect(),
    }
}
