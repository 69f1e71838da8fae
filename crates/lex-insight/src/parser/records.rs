//! Structured-record input (JSON).

use super::cells::{Cell, column_from_cells};
use super::delimited::decode;
use crate::error::{InsightError, Result};
use polars::prelude::*;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Parse a JSON array of objects, or a single object, into a table.
pub(super) fn parse_json(bytes: &[u8]) -> Result<DataFrame> {
    let text = decode(bytes);
    let root: Value = serde_json::from_str(&text)
        .map_err(|e| InsightError::EmptyOrUnparsable(format!("invalid JSON: {}", e)))?;

    let records: Vec<&Map<String, Value>> = match &root {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                other => Err(InsightError::InvalidShape(format!(
                    "array element is {}, expected an object",
                    kind_name(other)
                ))),
            })
            .collect::<Result<_>>()?,
        Value::Object(map) => vec![map],
        other => {
            return Err(InsightError::InvalidShape(format!(
                "top-level {} is not a record or array of records",
                kind_name(other)
            )));
        }
    };

    records_to_frame(&records)
}

fn records_to_frame(records: &[&Map<String, Value>]) -> Result<DataFrame> {
    // union of keys in first-seen order
    let mut names: Vec<&str> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for record in records {
        for key in record.keys() {
            if !index.contains_key(key.as_str()) {
                index.insert(key.as_str(), names.len());
                names.push(key.as_str());
            }
        }
    }

    let mut cells: Vec<Vec<Option<Cell>>> = vec![Vec::with_capacity(records.len()); names.len()];
    for record in records {
        for (pos, name) in names.iter().enumerate() {
            cells[pos].push(record.get(*name).and_then(json_cell));
        }
    }

    let columns = names
        .iter()
        .zip(cells.iter())
        .map(|(name, column_cells)| column_from_cells(name, column_cells))
        .collect::<PolarsResult<Vec<Column>>>()?;

    Ok(DataFrame::new(columns)?)
}

fn json_cell(value: &Value) -> Option<Cell> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(Cell::Bool(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Cell::Int(i)),
            None => n.as_f64().map(Cell::Float),
        },
        Value::String(s) => Some(Cell::Text(s.clone())),
        // nested structures are kept as compact JSON text
        nested => Some(Cell::Text(nested.to_string())),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
