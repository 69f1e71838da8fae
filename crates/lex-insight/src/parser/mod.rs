//! File parsing into a single in-memory table.
//!
//! This module provides functionality for:
//! - Dispatching on the declared file extension
//! - Delimited text with encoding fallback and delimiter sniffing
//! - Structured records (JSON arrays of objects, single objects)
//! - Spreadsheets (first sheet, first row as header)
//! - Datetime inference over string columns
//!
//! Every format ends in the same normalization: columns with no values at all
//! carry the `Null` dtype, and a table with zero rows or zero columns is
//! rejected.

mod cells;
mod datetime;
mod delimited;
mod records;
mod spreadsheet;

pub use datetime::parse_datetime;

use crate::error::{InsightError, Result};
use crate::types::DatetimeInference;
use polars::prelude::*;
use tracing::{debug, info};

/// Default number of non-missing values sampled when sniffing a column for dates.
pub const DEFAULT_DATETIME_SAMPLE: usize = 10;

/// Input formats the parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma separated values
    Csv,
    /// Delimited text with a sniffed delimiter
    Text,
    /// Array of records or a single record
    Json,
    /// Any workbook format (xlsx, xls, xlsm, xlsb, ods)
    Spreadsheet,
}

impl FileFormat {
    /// Resolve a declared extension, case-insensitive, with or without the
    /// leading dot.
    pub fn from_extension(extension: &str) -> Result<Self> {
        let normalized = extension.trim().trim_start_matches('.').to_lowercase();
        match normalized.as_str() {
            "csv" => Ok(Self::Csv),
            "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Ok(Self::Spreadsheet),
            _ => Err(InsightError::UnsupportedFormat(extension.to_string())),
        }
    }
}

/// A parsed table together with what datetime inference did to it.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub df: DataFrame,
    pub datetime_inference: DatetimeInference,
}

/// Parse raw file bytes into a table.
pub fn parse(bytes: &[u8], extension: &str) -> Result<DataFrame> {
    parse_with_report(bytes, extension).map(|parsed| parsed.df)
}

/// Parse raw file bytes and report which columns were converted to datetime.
pub fn parse_with_report(bytes: &[u8], extension: &str) -> Result<ParsedTable> {
    parse_with_sample_size(bytes, extension, DEFAULT_DATETIME_SAMPLE)
}

/// Parse with an explicit datetime sniffing sample size.
pub fn parse_with_sample_size(
    bytes: &[u8],
    extension: &str,
    datetime_sample_size: usize,
) -> Result<ParsedTable> {
    let format = FileFormat::from_extension(extension)?;
    info!("Parsing {} bytes as {:?}", bytes.len(), format);

    let df = match format {
        FileFormat::Csv => delimited::parse_csv(bytes)?,
        FileFormat::Text => delimited::parse_text(bytes)?,
        FileFormat::Json => records::parse_json(bytes)?,
        FileFormat::Spreadsheet => spreadsheet::parse_spreadsheet(bytes)?,
    };

    let df = mark_empty_columns(non_finite_to_null(df)?)?;
    if df.height() == 0 || df.width() == 0 {
        return Err(InsightError::EmptyOrUnparsable(format!(
            "table has {} rows and {} columns",
            df.height(),
            df.width()
        )));
    }

    let (df, datetime_inference) = datetime::infer_datetime_columns(df, datetime_sample_size)?;
    debug!(
        "Parsed table: {} rows x {} columns, {} datetime columns",
        df.height(),
        df.width(),
        datetime_inference.converted.len()
    );

    Ok(ParsedTable {
        df,
        datetime_inference,
    })
}

/// Treat NaN and infinite floats as missing.
fn non_finite_to_null(df: DataFrame) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(df.width());
    for col in df.get_columns() {
        let cleaned = match col.dtype() {
            DataType::Float64 => {
                let ca = col.f64()?;
                if ca.into_iter().flatten().all(f64::is_finite) {
                    col.clone()
                } else {
                    ca.into_iter()
                        .map(|v| v.filter(|x| x.is_finite()))
                        .collect::<Float64Chunked>()
                        .with_name(col.name().clone())
                        .into_series()
                        .into()
                }
            }
            DataType::Float32 => {
                let ca = col.f32()?;
                if ca.into_iter().flatten().all(f32::is_finite) {
                    col.clone()
                } else {
                    ca.into_iter()
                        .map(|v| v.filter(|x| x.is_finite()))
                        .collect::<Float32Chunked>()
                        .with_name(col.name().clone())
                        .into_series()
                        .into()
                }
            }
            _ => col.clone(),
        };
        columns.push(cleaned);
    }

    Ok(DataFrame::new(columns)?)
}

/// Give every column without a single value the `Null` dtype.
fn mark_empty_columns(df: DataFrame) -> Result<DataFrame> {
    if df.height() == 0 {
        return Ok(df);
    }

    let columns: Vec<Column> = df
        .get_columns()
        .iter()
        .map(|col| {
            if col.null_count() == col.len() && col.dtype() != &DataType::Null {
                Column::full_null(col.name().clone(), col.len(), &DataType::Null)
            } else {
                col.clone()
            }
        })
        .collect();

    Ok(DataFrame::new(columns)?)
}
