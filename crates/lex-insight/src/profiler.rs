//! Structural profiling of a table.

use crate::types::{ColumnProfile, DataInfo, OrderedMap};
use crate::utils::column_kind;
use polars::prelude::*;

/// Data profiler for describing table structure.
pub struct DataProfiler;

impl DataProfiler {
    /// Row and column counts, dtypes, missing counts and a memory estimate.
    pub fn data_info(df: &DataFrame) -> DataInfo {
        let column_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let column_types = df
            .get_columns()
            .iter()
            .map(|col| (col.name().to_string(), col.dtype().to_string()))
            .collect::<OrderedMap<String>>();

        let missing_values = df
            .get_columns()
            .iter()
            .map(|col| (col.name().to_string(), col.null_count()))
            .collect::<OrderedMap<usize>>();

        DataInfo {
            rows: df.height(),
            columns: df.width(),
            column_names,
            column_types,
            missing_values,
            memory_usage: format_kilobytes(df.estimated_size()),
        }
    }

    /// One profile per column, in table order.
    pub fn column_profiles(df: &DataFrame) -> Vec<ColumnProfile> {
        df.get_columns()
            .iter()
            .map(|col| ColumnProfile {
                name: col.name().to_string(),
                dtype: col.dtype().to_string(),
                kind: column_kind(col.dtype()),
                missing: col.null_count(),
            })
            .collect()
    }
}

fn format_kilobytes(bytes: usize) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ColumnKind;

    #[test]
    fn test_data_info() {
        let df = df![
            "id" => [1i64, 2, 3],
            "name" => [Some("a"), None, Some("c")],
        ]
        .unwrap();

        let info = DataProfiler::data_info(&df);
        assert_eq!(info.rows, 3);
        assert_eq!(info.columns, 2);
        assert_eq!(info.column_names, vec!["id", "name"]);
        assert_eq!(info.column_types.get("id").map(String::as_str), Some("i64"));
        assert_eq!(info.missing_values.get("name"), Some(&1));
        assert!(info.memory_usage.ends_with(" KB"));
    }

    #[test]
    fn test_data_info_key_order_follows_columns() {
        let df = df!["z" => [1], "a" => [2], "m" => [3]].unwrap();
        let info = DataProfiler::data_info(&df);
        let keys: Vec<&str> = info.missing_values.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_column_profiles() {
        let df = df![
            "n" => [1.5, 2.5],
            "flag" => [true, false],
        ]
        .unwrap();
        let profiles = DataProfiler::column_profiles(&df);
        assert_eq!(profiles[0].kind, ColumnKind::Numeric);
        assert_eq!(profiles[1].kind, ColumnKind::Categorical);
        assert_eq!(profiles[1].missing, 0);
    }

    #[test]
    fn test_format_kilobytes() {
        assert_eq!(format_kilobytes(2048), "2.00 KB");
        assert_eq!(format_kilobytes(1536), "1.50 KB");
    }
}
