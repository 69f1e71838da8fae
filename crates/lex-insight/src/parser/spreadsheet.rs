//! Spreadsheet input: the first sheet of any workbook calamine can open.

use super::cells::{Cell, column_from_cells, is_missing_token};
use super::datetime::parse_datetime;
use crate::error::{InsightError, Result};
use calamine::{Data, DataType as CellValue, Reader, open_workbook_auto_from_rs};
use polars::prelude::*;
use std::io::Cursor;
use tracing::debug;

/// Read the first worksheet, using its first row as the header.
pub(super) fn parse_spreadsheet(bytes: &[u8]) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| InsightError::EmptyOrUnparsable("workbook has no worksheets".to_string()))??;

    let rows: Vec<&[Data]> = range.rows().collect();
    let Some((header, body)) = rows.split_first() else {
        return Err(InsightError::EmptyOrUnparsable("first sheet is empty".to_string()));
    };
    debug!("Spreadsheet: {} header cells, {} data rows", header.len(), body.len());

    let names = unique_names(header.iter().enumerate().map(|(idx, head)| header_name(head, idx)));
    let columns = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<Option<Cell>> = body
                .iter()
                .map(|row| row.get(idx).and_then(sheet_cell))
                .collect();
            column_from_cells(name, &cells)
        })
        .collect::<PolarsResult<Vec<Column>>>()?;

    Ok(DataFrame::new(columns)?)
}

/// Header text, or `column_N` for a blank header cell.
fn header_name(cell: &Data, idx: usize) -> String {
    let text = cell.as_string().unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        format!("column_{}", idx + 1)
    } else {
        text.to_string()
    }
}

/// Suffix repeated header names with `_2`, `_3`, ... so every column is unique.
fn unique_names(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .map(|name| {
            let mut candidate = name.clone();
            let mut n = 2;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{}_{}", name, n);
                n += 1;
            }
            candidate
        })
        .collect()
}

fn sheet_cell(cell: &Data) -> Option<Cell> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::Int(i) => Some(Cell::Int(*i)),
        // workbooks store most numbers as floats; keep whole ones integral
        Data::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            Some(Cell::Int(*f as i64))
        }
        Data::Float(f) => Some(Cell::Float(*f)),
        Data::Bool(b) => Some(Cell::Bool(*b)),
        Data::String(s) if is_missing_token(s) => None,
        Data::String(s) => Some(Cell::Text(s.clone())),
        Data::DateTime(_) => cell.as_datetime().map(Cell::DateTime),
        Data::DateTimeIso(s) => Some(match parse_datetime(s) {
            Some(dt) => Cell::DateTime(dt),
            None => Cell::Text(s.clone()),
        }),
        Data::DurationIso(s) => Some(Cell::Text(s.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_name_fallback() {
        assert_eq!(header_name(&Data::String("Price".into()), 0), "Price");
        assert_eq!(header_name(&Data::String("  ".into()), 2), "column_3");
        assert_eq!(header_name(&Data::Empty, 0), "column_1");
    }

    #[test]
    fn test_repeated_headers_are_suffixed() {
        let names = unique_names(["a", "b", "a", "a"].into_iter().map(String::from));
        assert_eq!(names, vec!["a", "b", "a_2", "a_3"]);
    }

    #[test]
    fn test_sheet_cells() {
        assert_eq!(sheet_cell(&Data::Float(3.0)), Some(Cell::Int(3)));
        assert_eq!(sheet_cell(&Data::Float(2.5)), Some(Cell::Float(2.5)));
        assert_eq!(sheet_cell(&Data::Bool(false)), Some(Cell::Bool(false)));
        assert_eq!(sheet_cell(&Data::Empty), None);
        assert_eq!(sheet_cell(&Data::String(String::new())), None);
        assert_eq!(sheet_cell(&Data::String(" NA ".into())), None);
        assert_eq!(sheet_cell(&Data::String("#N/A".into())), None);
        assert_eq!(
            sheet_cell(&Data::String("NAB".into())),
            Some(Cell::Text("NAB".into()))
        );
        assert!(matches!(
            sheet_cell(&Data::DateTimeIso("2024-02-03T10:00:00".into())),
            Some(Cell::DateTime(_))
        ));
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        assert!(parse_spreadsheet(b"definitely not a workbook").is_err());
    }
}
