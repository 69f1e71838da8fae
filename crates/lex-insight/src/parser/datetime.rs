//! Datetime inference for string columns.

use crate::types::DatetimeInference;
use crate::utils::present_labels;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use tracing::debug;

/// Substrings of a column name that make it a datetime candidate.
const NAME_KEYWORDS: [&str; 6] = ["date", "time", "timestamp", "created", "updated", "dt"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

// Date pattern regex - compiled once at startup
static DATE_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}[-/]\d{2}[-/]\d{2}").expect("Invalid regex: date-like"));

/// Parse one cell in any of the accepted date/datetime layouts.
///
/// Offsets in RFC 3339 input are applied, so the result is in UTC.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn name_suggests_datetime(name: &str) -> bool {
    let lower = name.to_lowercase();
    NAME_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

fn values_look_like_dates(series: &Series, sample_size: usize) -> bool {
    let sample: Vec<String> = present_labels(series).into_iter().take(sample_size).collect();
    !sample.is_empty() && sample.iter().all(|v| DATE_LIKE.is_match(v))
}

/// Convert string columns that look temporal into millisecond datetimes.
///
/// A column is a candidate when its name contains a datetime keyword or when
/// every sampled value contains a `YYYY-MM-DD` style date. Cells that fail to
/// parse become missing; a candidate with no parseable cell is left as text
/// and reported as attempted but unconverted.
pub(super) fn infer_datetime_columns(
    mut df: DataFrame,
    sample_size: usize,
) -> PolarsResult<(DataFrame, DatetimeInference)> {
    let mut inference = DatetimeInference::default();

    let candidates: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|col| col.dtype() == &DataType::String)
        .filter(|col| {
            name_suggests_datetime(col.name())
                || values_look_like_dates(col.as_materialized_series(), sample_size)
        })
        .map(|col| col.name().to_string())
        .collect();

    for name in candidates {
        let (millis, original_nulls) = {
            let strings = df.column(&name)?.str()?;
            let millis: Vec<Option<i64>> = strings
                .into_iter()
                .map(|cell| cell.and_then(parse_datetime).map(|dt| dt.and_utc().timestamp_millis()))
                .collect();
            (millis, strings.null_count())
        };

        if millis.iter().all(Option::is_none) {
            debug!("Column '{}' looked temporal but no value parsed", name);
            inference.attempted_unconverted.push(name);
            continue;
        }

        let failed = millis.iter().filter(|v| v.is_none()).count() - original_nulls;
        let converted = Series::new(name.as_str().into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        df.with_column(converted)?;
        debug!(
            "Converted column '{}' to datetime ({} unparsable values set to missing)",
            name, failed
        );
        inference.converted.push(name);
    }

    Ok((df, inference))
}
