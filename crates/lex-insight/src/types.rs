//! Report and document types produced by the pipeline.
//!
//! Every type here is a value object: built once per run, never mutated after
//! it is returned, and serializable to strict JSON.

use crate::charts::ChartSpec;
use crate::utils::ColumnKind;
use indexmap::IndexMap;
use serde::Serialize;

// ============================================================================
// Ordered Map
// ============================================================================

/// A string-keyed map that serializes its entries in insertion order.
///
/// Used wherever the output is keyed by column name (column order) or by
/// value (frequency order). Re-inserting a key keeps its original position.
pub type OrderedMap<V> = IndexMap<String, V>;

// ============================================================================
// Profiling
// ============================================================================

/// Structural description of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    /// Polars dtype name (e.g. "i64", "str").
    pub dtype: String,
    pub kind: ColumnKind,
    pub missing: usize,
}

/// Table-level structural information.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataInfo {
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    pub column_types: OrderedMap<String>,
    pub missing_values: OrderedMap<usize>,
    /// Estimated in-memory size, e.g. "12.50 KB".
    pub memory_usage: String,
}

// ============================================================================
// Cleaning
// ============================================================================

/// A column rename performed by name normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamedColumn {
    pub from: String,
    pub to: String,
}

/// One transformation applied by the cleaner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum CleaningOperation {
    ColumnNamesCleaned {
        detail: String,
        renamed: Vec<RenamedColumn>,
    },
    DuplicatesRemoved {
        count: usize,
    },
    MissingValuesHandled {
        before: usize,
        after: usize,
    },
    /// Rows that only became identical once missing cells were filled.
    ImputedDuplicatesRemoved {
        count: usize,
    },
    NullColumnsRemoved {
        columns: Vec<String>,
    },
}

/// Audit trail of one cleaning pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningReport {
    pub original_rows: usize,
    pub original_columns: usize,
    pub operations: Vec<CleaningOperation>,
    pub cleaned_rows: usize,
    pub cleaned_columns: usize,
    pub rows_removed: usize,
}

impl CleaningReport {
    /// Rows removed as exact duplicates, before and after imputation.
    pub fn duplicates_removed(&self) -> usize {
        self.operations
            .iter()
            .map(|op| match op {
                CleaningOperation::DuplicatesRemoved { count }
                | CleaningOperation::ImputedDuplicatesRemoved { count } => *count,
                _ => 0,
            })
            .sum()
    }
}

// ============================================================================
// Statistics
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub total_rows: usize,
    pub total_columns: usize,
    pub numeric_columns: usize,
    pub categorical_columns: usize,
}

/// Descriptive statistics over the non-missing values of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericStats {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalStats {
    pub unique_values: usize,
    /// Up to ten values, most frequent first.
    pub most_common: OrderedMap<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsDocument {
    pub summary: DatasetSummary,
    pub numeric_stats: OrderedMap<NumericStats>,
    pub categorical_stats: OrderedMap<CategoricalStats>,
}

// ============================================================================
// Analytics
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationPair {
    pub col1: String,
    pub col2: String,
    pub correlation: f64,
    /// "strong positive" or "strong negative".
    pub strength: String,
}

/// Pearson correlation over every pair of numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationReport {
    pub columns: Vec<String>,
    /// Row-major square matrix; `None` where r is undefined.
    pub matrix: Vec<Vec<Option<f64>>>,
    pub strong_pairs: Vec<CorrelationPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierEntry {
    pub count: usize,
    pub percentage: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// First ten outlying values in row order.
    pub outlier_values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighNullColumn {
    pub column: String,
    pub null_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyReport {
    pub duplicate_rows: usize,
    pub columns_with_single_value: Vec<String>,
    pub columns_with_high_null_rate: Vec<HighNullColumn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendEntry {
    pub direction: TrendDirection,
    pub change_percent: f64,
    pub first_half_mean: f64,
    pub second_half_mean: f64,
}

/// Everything the analytics engine found. Columns without findings are absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    /// `None` when the table has fewer than two numeric columns.
    pub correlation: Option<CorrelationReport>,
    pub outliers: OrderedMap<OutlierEntry>,
    pub anomalies: AnomalyReport,
    pub trends: OrderedMap<TrendEntry>,
}

// ============================================================================
// Parsing
// ============================================================================

/// Outcome of datetime inference over the parsed table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatetimeInference {
    /// Columns converted to datetime.
    pub converted: Vec<String>,
    /// Columns that looked temporal but where no cell parsed; left as text.
    pub attempted_unconverted: Vec<String>,
}

// ============================================================================
// Pipeline Result
// ============================================================================

/// Which path produced the chart list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartSource {
    Ai,
    Fallback,
}

/// The merged result document of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct InsightResult {
    pub original_data_info: DataInfo,
    pub cleaned_data_info: DataInfo,
    pub cleaning_report: CleaningReport,
    pub column_profiles: Vec<ColumnProfile>,
    pub statistics: StatisticsDocument,
    pub analytics: AnalyticsReport,
    pub charts: Vec<ChartSpec>,
    pub chart_source: ChartSource,
    pub datetime_inference: DatetimeInference,
    /// ISO-8601 local timestamp of completion.
    pub processed_at: String,
}

impl InsightResult {
    /// The result as strict JSON.
    pub fn to_json(&self) -> serde_json::Value {
        crate::safety::normalize(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ordered_map_serializes_in_insertion_order() {
        let mut map = OrderedMap::new();
        map.insert("zeta".to_string(), 1usize);
        map.insert("alpha".to_string(), 2);
        map.insert("zeta".to_string(), 3);

        let text = serde_json::to_string(&map).unwrap();
        assert_eq!(text, r#"{"zeta":3,"alpha":2}"#);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("alpha"), Some(&2));
    }

    #[test]
    fn test_cleaning_operation_tagging() {
        let ops = vec![
            CleaningOperation::DuplicatesRemoved { count: 1 },
            CleaningOperation::MissingValuesHandled {
                before: 3,
                after: 0,
            },
            CleaningOperation::NullColumnsRemoved {
                columns: vec!["empty".to_string()],
            },
        ];
        assert_eq!(
            serde_json::to_value(&ops).unwrap(),
            json!([
                {"step": "duplicates_removed", "count": 1},
                {"step": "missing_values_handled", "before": 3, "after": 0},
                {"step": "null_columns_removed", "columns": ["empty"]}
            ])
        );
    }

    #[test]
    fn test_duplicates_removed_sums_both_passes() {
        let report = CleaningReport {
            original_rows: 10,
            original_columns: 2,
            operations: vec![
                CleaningOperation::DuplicatesRemoved { count: 2 },
                CleaningOperation::MissingValuesHandled {
                    before: 1,
                    after: 0,
                },
                CleaningOperation::ImputedDuplicatesRemoved { count: 1 },
            ],
            cleaned_rows: 7,
            cleaned_columns: 2,
            rows_removed: 3,
        };
        assert_eq!(report.duplicates_removed(), 3);
    }

    #[test]
    fn test_trend_direction_serialization() {
        assert_eq!(
            serde_json::to_string(&TrendDirection::Increasing).unwrap(),
            "\"increasing\""
        );
        assert_eq!(serde_json::to_string(&ChartSource::Fallback).unwrap(), "\"fallback\"");
    }
}
