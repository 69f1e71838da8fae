//! Missing-value imputation.
//!
//! Numeric columns take the median, string and boolean columns take the mode.
//! Temporal columns and columns without any value are left alone.

use crate::utils::{is_numeric_dtype, mode_row, numeric_values, present_numeric_values, quantile_sorted, sorted};
use polars::prelude::*;
use tracing::debug;

/// Value written into string columns that have no value to take a mode from.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Total number of missing cells in the table.
pub fn total_missing(df: &DataFrame) -> usize {
    df.get_columns().iter().map(|col| col.null_count()).sum()
}

/// Fill missing cells column by column.
pub(super) fn impute_missing(mut df: DataFrame) -> PolarsResult<DataFrame> {
    let targets: Vec<(String, DataType)> = df
        .get_columns()
        .iter()
        .filter(|col| col.null_count() > 0)
        .map(|col| (col.name().to_string(), col.dtype().clone()))
        .collect();

    for (name, dtype) in targets {
        let series = df.column(&name)?.as_materialized_series().clone();

        let filled = if is_numeric_dtype(&dtype) {
            fill_numeric_median(&series)
        } else if dtype == DataType::String {
            Some(fill_string_mode(&series)?)
        } else if dtype == DataType::Boolean {
            fill_boolean_mode(&series)?
        } else {
            None
        };

        match filled {
            Some(filled) => {
                debug!("Imputed {} missing values in '{}'", series.null_count(), name);
                df.replace(&name, filled)?;
            }
            None => debug!("Left missing values in '{}' ({})", name, dtype),
        }
    }

    Ok(df)
}

/// Median fill over the values present before imputation. The result is Float64.
fn fill_numeric_median(series: &Series) -> Option<Series> {
    let median = quantile_sorted(&sorted(&present_numeric_values(series)), 0.5)?;
    let values: Vec<Option<f64>> = numeric_values(series)
        .into_iter()
        .map(|v| Some(v.unwrap_or(median)))
        .collect();
    Some(Series::new(series.name().clone(), values))
}

fn fill_string_mode(series: &Series) -> PolarsResult<Series> {
    let ca = series.str()?;
    let fill = match mode_row(series) {
        Some(row) => ca.get(row).unwrap_or(UNKNOWN_CATEGORY).to_string(),
        None => UNKNOWN_CATEGORY.to_string(),
    };
    let values: Vec<&str> = ca.into_iter().map(|v| v.unwrap_or(fill.as_str())).collect();
    Ok(Series::new(series.name().clone(), values))
}

fn fill_boolean_mode(series: &Series) -> PolarsResult<Option<Series>> {
    let ca = series.bool()?;
    let Some(fill) = mode_row(series).and_then(|row| ca.get(row)) else {
        return Ok(None);
    };
    let values: Vec<bool> = ca.into_iter().map(|v| v.unwrap_or(fill)).collect();
    Ok(Some(Series::new(series.name().clone(), values)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_median_fill() {
        let df = df!["values" => [Some(1i64), None, Some(3), None, Some(10)]].unwrap();
        let df = impute_missing(df).unwrap();

        let values = df.column("values").unwrap();
        assert_eq!(values.dtype(), &DataType::Float64);
        assert_eq!(values.null_count(), 0);
        // median of [1, 3, 10]
        assert_eq!(values.get(1).unwrap().try_extract::<f64>().unwrap(), 3.0);
        assert_eq!(values.get(0).unwrap().try_extract::<f64>().unwrap(), 1.0);
    }

    #[test]
    fn test_complete_numeric_column_keeps_dtype() {
        let df = df!["n" => [1i64, 2, 3]].unwrap();
        let df = impute_missing(df).unwrap();
        assert_eq!(df.column("n").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_string_mode_fill() {
        let df = df!["city" => [Some("Oslo"), None, Some("Rome"), Some("Rome"), Some("Oslo")]].unwrap();
        let df = impute_missing(df).unwrap();
        // Oslo and Rome tie; Oslo was seen first
        let city = df.column("city").unwrap().str().unwrap().get(1);
        assert_eq!(city, Some("Oslo"));
    }

    #[test]
    fn test_string_column_without_values_gets_unknown() {
        let df = df!["s" => [None::<&str>, None]].unwrap();
        let df = impute_missing(df).unwrap();
        let values: Vec<Option<&str>> = df.column("s").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("Unknown"), Some("Unknown")]);
    }

    #[test]
    fn test_boolean_mode_fill() {
        let df = df!["flag" => [Some(true), Some(false), Some(false), None]].unwrap();
        let df = impute_missing(df).unwrap();
        let flag = df.column("flag").unwrap();
        assert_eq!(flag.dtype(), &DataType::Boolean);
        assert_eq!(flag.bool().unwrap().get(3), Some(false));
    }

    #[test]
    fn test_temporal_and_empty_columns_untouched() {
        let ts = Series::new("ts".into(), &[Some(0i64), None])
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap();
        let empty = Series::full_null("empty".into(), 2, &DataType::Null);
        let df = DataFrame::new(vec![ts.into_column(), empty.into_column()]).unwrap();

        let df = impute_missing(df).unwrap();
        assert_eq!(df.column("ts").unwrap().null_count(), 1);
        assert_eq!(df.column("empty").unwrap().null_count(), 2);
        assert_eq!(total_missing(&df), 3);
    }
}
