//! Shared helpers for working with polars columns.
//!
//! Column classification, value extraction and frequency counting live here
//! because the cleaner, statistics engine, analytics engine and chart engine
//! all need the same answers to "is this column numeric?" and "what are its
//! most common values?".

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Column Classification
// =============================================================================

/// How a column is treated by the downstream engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integer or floating point numbers
    Numeric,
    /// Strings and booleans
    Categorical,
    /// Date, datetime or time values
    Temporal,
    /// Anything else, including columns with no values at all
    Other,
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a date/time type.
#[inline]
pub fn is_temporal_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Datetime(_, _) | DataType::Date | DataType::Time
    )
}

/// Classify a DataType.
pub fn column_kind(dtype: &DataType) -> ColumnKind {
    if is_numeric_dtype(dtype) {
        ColumnKind::Numeric
    } else if is_temporal_dtype(dtype) {
        ColumnKind::Temporal
    } else if matches!(dtype, DataType::String | DataType::Boolean) {
        ColumnKind::Categorical
    } else {
        ColumnKind::Other
    }
}

/// Names of the columns of the given kind, in table order.
pub fn columns_of_kind(df: &DataFrame, kind: ColumnKind) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| column_kind(col.dtype()) == kind)
        .map(|col| col.name().to_string())
        .collect()
}

// =============================================================================
// Value Extraction
// =============================================================================

/// Column values as `f64`, `None` for missing cells. Empty for non-numeric columns.
pub fn numeric_values(series: &Series) -> Vec<Option<f64>> {
    if !is_numeric_dtype(series.dtype()) {
        return Vec::new();
    }
    match series.cast(&DataType::Float64) {
        Ok(casted) => match casted.f64() {
            Ok(ca) => ca.into_iter().collect(),
            Err(_) => Vec::new(),
        },
        Err(_) => Vec::new(),
    }
}

/// Non-missing, finite column values as `f64`, in row order.
pub fn present_numeric_values(series: &Series) -> Vec<f64> {
    numeric_values(series)
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect()
}

/// Render a cell as the label used in value counts and chart labels.
///
/// Strings are returned without the quotes polars adds when displaying them.
pub fn cell_label(value: &AnyValue) -> Option<String> {
    match value {
        AnyValue::Null => None,
        AnyValue::String(s) => Some((*s).to_string()),
        AnyValue::StringOwned(s) => Some(s.to_string()),
        AnyValue::Boolean(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Non-missing cell labels in row order.
pub fn present_labels(series: &Series) -> Vec<String> {
    series.iter().filter_map(|v| cell_label(&v)).collect()
}

// =============================================================================
// Frequency Counting
// =============================================================================

/// Frequency of each distinct value, ordered by descending count with ties
/// broken by the order in which values were first seen.
pub fn value_counts<I>(values: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = String>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for value in values {
        match index.get(&value) {
            Some(&pos) => counts[pos].1 += 1,
            None => {
                index.insert(value.clone(), counts.len());
                counts.push((value, 1));
            }
        }
    }

    // stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// The `limit` most frequent non-missing values of a column.
pub fn top_value_counts(series: &Series, limit: usize) -> Vec<(String, usize)> {
    let mut counts = value_counts(present_labels(series));
    counts.truncate(limit);
    counts
}

/// Index of the first row holding the most frequent non-missing value.
///
/// Returning a row index instead of a label keeps the value's original type,
/// so booleans fill booleans and strings fill strings.
pub fn mode_row(series: &Series) -> Option<usize> {
    let labels: Vec<Option<String>> = series.iter().map(|v| cell_label(&v)).collect();
    let (winner, _) = value_counts(labels.iter().flatten().cloned())
        .into_iter()
        .next()?;
    labels
        .iter()
        .position(|label| label.as_deref() == Some(winner.as_str()))
}

/// Number of distinct non-missing values.
pub fn distinct_count(series: &Series) -> usize {
    value_counts(present_labels(series)).len()
}

// =============================================================================
// Row Identity
// =============================================================================

/// A key per row that is equal for two rows exactly when every cell is equal.
///
/// Cells are rendered with their dtype-aware debug form so `1` and `"1"`
/// never collide, and missing cells compare equal to each other.
pub fn row_keys(df: &DataFrame) -> Vec<String> {
    let mut keys = vec![String::new(); df.height()];
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        for (key, value) in keys.iter_mut().zip(series.iter()) {
            key.push_str(&format!("{:?}", value));
            key.push('\u{1f}');
        }
    }
    keys
}

/// Count of rows that repeat an earlier row exactly.
pub fn duplicate_row_count(df: &DataFrame) -> usize {
    let mut seen = std::collections::HashSet::new();
    row_keys(df)
        .into_iter()
        .filter(|key| !seen.insert(key.clone()))
        .count()
}

// =============================================================================
// Numeric Helpers
// =============================================================================

/// Round to two decimals.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1), `None` with fewer than two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0);
    Some(variance.sqrt())
}

/// Quantile of an ascending slice by linear interpolation between order
/// statistics.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Values sorted ascending.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}
