//! IQR outlier detection.

use crate::types::{OrderedMap, OutlierEntry};
use crate::utils::{ColumnKind, column_kind, present_numeric_values, quantile_sorted, round2, sorted};
use polars::prelude::*;

/// Outlying values listed per column.
const MAX_LISTED_OUTLIERS: usize = 10;

/// Inclusive bounds outside of which a value is an outlier.
pub fn iqr_bounds(values: &[f64], multiplier: f64) -> Option<(f64, f64)> {
    let ordered = sorted(values);
    let q1 = quantile_sorted(&ordered, 0.25)?;
    let q3 = quantile_sorted(&ordered, 0.75)?;
    let iqr = q3 - q1;
    Some((q1 - multiplier * iqr, q3 + multiplier * iqr))
}

/// Outlier report for every numeric column that has at least one outlier.
pub fn outlier_report(df: &DataFrame, multiplier: f64) -> OrderedMap<OutlierEntry> {
    let mut report = OrderedMap::new();
    let total_rows = df.height();

    for col in df.get_columns() {
        if column_kind(col.dtype()) != ColumnKind::Numeric {
            continue;
        }
        let values = present_numeric_values(col.as_materialized_series());
        let Some((lower_bound, upper_bound)) = iqr_bounds(&values, multiplier) else {
            continue;
        };

        let outliers: Vec<f64> = values
            .iter()
            .copied()
            .filter(|v| *v < lower_bound || *v > upper_bound)
            .collect();
        if outliers.is_empty() {
            continue;
        }

        report.insert(
            col.name().to_string(),
            OutlierEntry {
                count: outliers.len(),
                percentage: round2(outliers.len() as f64 / total_rows as f64 * 100.0),
                lower_bound,
                upper_bound,
                outlier_values: outliers.into_iter().take(MAX_LISTED_OUTLIERS).collect(),
            },
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_extreme_value() {
        let df = df!["n" => [1.0, 2.0, 3.0, 4.0, 100.0]].unwrap();
        let report = outlier_report(&df, 1.5);

        let entry = report.get("n").unwrap();
        assert_eq!(entry.count, 1);
        assert_eq!(entry.outlier_values, vec![100.0]);
        assert_eq!(entry.percentage, 20.0);
        // Q1 = 2, Q3 = 4, IQR = 2
        assert_eq!(entry.lower_bound, -1.0);
        assert_eq!(entry.upper_bound, 7.0);
    }

    #[test]
    fn test_outliers_lie_strictly_outside_bounds() {
        let values: Vec<f64> = (0..40).map(|i| (i % 7) as f64).chain([-50.0, 60.0, 75.0]).collect();
        let df = df!["n" => values.clone()].unwrap();
        let report = outlier_report(&df, 1.5);
        let entry = report.get("n").unwrap();

        let ordered = sorted(&values);
        let q1 = quantile_sorted(&ordered, 0.25).unwrap();
        let q3 = quantile_sorted(&ordered, 0.75).unwrap();
        assert!(entry.lower_bound <= q1 && q1 <= q3 && q3 <= entry.upper_bound);
        assert!(
            entry
                .outlier_values
                .iter()
                .all(|v| *v < entry.lower_bound || *v > entry.upper_bound)
        );
        assert_eq!(entry.outlier_values, vec![-50.0, 60.0, 75.0]);
    }

    #[test]
    fn test_listing_is_capped_in_row_order() {
        let mut values = vec![5.0; 40];
        values.extend((1..=12).map(|i| 1000.0 + i as f64));
        let df = df!["n" => values].unwrap();
        let entry = outlier_report(&df, 1.5).get("n").cloned().unwrap();
        assert_eq!(entry.count, 12);
        assert_eq!(entry.outlier_values.len(), 10);
        assert_eq!(entry.outlier_values[0], 1001.0);
    }

    #[test]
    fn test_clean_columns_are_omitted() {
        let df = df!["n" => [1.0, 2.0, 3.0], "s" => ["a", "b", "c"]].unwrap();
        assert!(outlier_report(&df, 1.5).is_empty());
    }
}
