//! Typed cells shared by the record and spreadsheet readers.
//!
//! Both formats deliver loosely typed values cell by cell; a column's dtype
//! is decided from the non-missing cells once the whole column is collected.

use crate::safety::iso_datetime;
use chrono::NaiveDateTime;
use polars::prelude::*;

/// Text values read as missing in delimited files and spreadsheets.
///
/// Matched against the whole field; `"NA"` is missing, `"NAB"` is not.
pub(super) const MISSING_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a text cell stands for a missing value.
pub(super) fn is_missing_token(text: &str) -> bool {
    MISSING_TOKENS.contains(&text.trim())
}

/// One non-missing input value.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Cell {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Cell {
    fn to_text(&self) -> String {
        match self {
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::DateTime(dt) => iso_datetime(dt),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// The dtype a collected column resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellType {
    Int,
    Float,
    Bool,
    DateTime,
    Text,
    Empty,
}

fn resolve_type(cells: &[Option<Cell>]) -> CellType {
    let mut present = cells.iter().flatten().peekable();
    if present.peek().is_none() {
        return CellType::Empty;
    }

    let (mut ints, mut floats, mut bools, mut datetimes, mut total) = (0, 0, 0, 0, 0);
    for cell in present {
        total += 1;
        match cell {
            Cell::Int(_) => ints += 1,
            Cell::Float(_) => floats += 1,
            Cell::Bool(_) => bools += 1,
            Cell::DateTime(_) => datetimes += 1,
            Cell::Text(_) => return CellType::Text,
        }
    }

    if ints == total {
        CellType::Int
    } else if ints + floats == total {
        CellType::Float
    } else if bools == total {
        CellType::Bool
    } else if datetimes == total {
        CellType::DateTime
    } else {
        CellType::Text
    }
}

/// Build a typed column from collected cells.
///
/// All integers give Int64, any mix of integers and floats gives Float64,
/// all booleans give Boolean, all datetimes give a millisecond Datetime, and
/// everything else is rendered as text.
pub(super) fn column_from_cells(name: &str, cells: &[Option<Cell>]) -> PolarsResult<Column> {
    let series = match resolve_type(cells) {
        CellType::Int => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|c| match c {
                    Some(Cell::Int(i)) => Some(*i),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        CellType::Float => {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|c| c.as_ref().and_then(Cell::as_f64))
                .collect();
            Series::new(name.into(), values)
        }
        CellType::Bool => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|c| match c {
                    Some(Cell::Bool(b)) => Some(*b),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        CellType::DateTime => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|c| match c {
                    Some(Cell::DateTime(dt)) => Some(dt.and_utc().timestamp_millis()),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        }
        CellType::Text => {
            let values: Vec<Option<String>> = cells
                .iter()
                .map(|c| c.as_ref().map(Cell::to_text))
                .collect();
            Series::new(name.into(), values)
        }
        CellType::Empty => Series::full_null(name.into(), cells.len(), &DataType::Null),
    };
    Ok(series.into_column())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_integer_column() {
        let col = column_from_cells("n", &[Some(Cell::Int(1)), None, Some(Cell::Int(3))]).unwrap();
        assert_eq!(col.dtype(), &DataType::Int64);
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn test_mixed_numbers_become_float() {
        let col = column_from_cells("n", &[Some(Cell::Int(1)), Some(Cell::Float(2.5))]).unwrap();
        assert_eq!(col.dtype(), &DataType::Float64);
        assert_eq!(col.f64().unwrap().get(0), Some(1.0));
    }

    #[test]
    fn test_mixed_kinds_become_text() {
        let col = column_from_cells(
            "m",
            &[Some(Cell::Int(1)), Some(Cell::Bool(true)), Some(Cell::Text("x".into()))],
        )
        .unwrap();
        assert_eq!(col.dtype(), &DataType::String);
        let values: Vec<Option<&str>> = col.str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("1"), Some("true"), Some("x")]);
    }

    #[test]
    fn test_datetime_cells() {
        let dt = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let col = column_from_cells("d", &[Some(Cell::DateTime(dt)), None]).unwrap();
        assert_eq!(
            col.dtype(),
            &DataType::Datetime(TimeUnit::Milliseconds, None)
        );
    }

    #[test]
    fn test_empty_column() {
        let col = column_from_cells("e", &[None, None]).unwrap();
        assert_eq!(col.dtype(), &DataType::Null);
        assert_eq!(col.len(), 2);
    }
}
