//! JSON-safety normalization.
//!
//! Everything that leaves the crate passes through here so it can be written
//! as strict JSON: only null, booleans, numbers, strings, arrays and objects,
//! no NaN or infinities, temporal values as ISO-8601 strings.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use polars::prelude::*;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use tracing::warn;

/// `Some(v)` for finite values, `None` for NaN and infinities.
#[inline]
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Convert a float to a JSON number, or null when it is not finite.
pub fn float_to_json(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Convert a single table cell to a JSON-safe value.
///
/// | Polars Type          | JSON Type       |
/// |----------------------|-----------------|
/// | Null                 | null            |
/// | Boolean              | boolean         |
/// | Int8-64 / UInt8-64   | number          |
/// | Float32/64           | number or null  |
/// | String               | string          |
/// | Date/Datetime/Time   | ISO-8601 string |
/// | Other                | string          |
pub fn cell_to_json(value: &AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(*b),

        AnyValue::Int8(i) => Value::Number((*i).into()),
        AnyValue::Int16(i) => Value::Number((*i).into()),
        AnyValue::Int32(i) => Value::Number((*i).into()),
        AnyValue::Int64(i) => Value::Number((*i).into()),
        AnyValue::UInt8(u) => Value::Number((*u).into()),
        AnyValue::UInt16(u) => Value::Number((*u).into()),
        AnyValue::UInt32(u) => Value::Number((*u).into()),
        AnyValue::UInt64(u) => Value::Number((*u).into()),

        AnyValue::Float32(f) => float_to_json(*f as f64),
        AnyValue::Float64(f) => float_to_json(*f),

        AnyValue::String(s) => Value::String((*s).to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),

        AnyValue::Date(days) => date_from_days(*days)
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),
        AnyValue::Datetime(ts, unit, _) => datetime_from_timestamp(*ts, *unit)
            .map(|dt| Value::String(iso_datetime(&dt)))
            .unwrap_or(Value::Null),
        AnyValue::DatetimeOwned(ts, unit, _) => datetime_from_timestamp(*ts, *unit)
            .map(|dt| Value::String(iso_datetime(&dt)))
            .unwrap_or(Value::Null),
        AnyValue::Time(nanos) => time_from_nanos(*nanos)
            .map(|t| Value::String(t.format("%H:%M:%S%.f").to_string()))
            .unwrap_or(Value::Null),

        // durations, lists, structs and anything newer: display form
        other => Value::String(other.to_string()),
    }
}

/// Days between 0001-01-01 and 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Convert a polars date physical value (days since the Unix epoch).
pub fn date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(EPOCH_DAYS_FROM_CE)?)
}

/// Convert a polars datetime physical value to a naive UTC datetime.
pub fn datetime_from_timestamp(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Nanoseconds => Utc.timestamp_nanos(value),
        TimeUnit::Microseconds => Utc.timestamp_micros(value).single()?,
        TimeUnit::Milliseconds => Utc.timestamp_millis_opt(value).single()?,
    };
    Some(dt.naive_utc())
}

fn time_from_nanos(nanos: i64) -> Option<NaiveTime> {
    let secs = u32::try_from(nanos / 1_000_000_000).ok()?;
    let sub = u32::try_from(nanos % 1_000_000_000).ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, sub)
}

/// ISO-8601 rendering used for every datetime the crate emits.
pub fn iso_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

/// Normalize any serializable structure into strict JSON.
///
/// Serialization already maps non-finite floats to null and chrono values to
/// ISO strings; [`sanitize`] then enforces the rules on the resulting tree.
/// A structure that cannot be represented at all (e.g. a map with non-string
/// keys) becomes null.
pub fn normalize<T: Serialize + ?Sized>(value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(v) => sanitize(v),
        Err(e) => {
            warn!("Value could not be normalized to JSON: {}", e);
            Value::Null
        }
    }
}

/// Walk a JSON tree and replace anything a strict parser would reject.
///
/// Idempotent: sanitizing an already sanitized tree returns it unchanged.
pub fn sanitize(value: Value) -> Value {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if !f.is_finite() => Value::Null,
            _ => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, sanitize(v)))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}
