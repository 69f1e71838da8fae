//! Delimited text: CSV and sniffed `.txt` files.

use super::cells::MISSING_TOKENS;
use crate::error::{InsightError, Result};
use encoding_rs::WINDOWS_1252;
use polars::prelude::*;
use std::borrow::Cow;
use std::io::Cursor;
use tracing::debug;

/// Delimiters tried for `.txt` input, in order.
const TEXT_DELIMITERS: [u8; 4] = [b',', b'\t', b';', b'|'];

/// Rows used for schema inference.
const INFER_SCHEMA_ROWS: usize = 100;

/// Decode input as UTF-8, falling back to Windows-1252 for anything else.
///
/// A leading byte-order mark is dropped either way.
pub(super) fn decode(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(e) => {
            debug!("Input is not UTF-8 ({}), decoding as Windows-1252", e);
            WINDOWS_1252.decode_without_bom_handling(bytes).0
        }
    }
}

/// Parse comma separated input.
pub(super) fn parse_csv(bytes: &[u8]) -> Result<DataFrame> {
    let text = decode(bytes);
    read_delimited(&text, b',')
}

/// Parse delimited text, accepting the first delimiter that yields more
/// than one column.
pub(super) fn parse_text(bytes: &[u8]) -> Result<DataFrame> {
    let text = decode(bytes);

    for delimiter in TEXT_DELIMITERS {
        match read_delimited(&text, delimiter) {
            Ok(df) if df.width() > 1 => {
                debug!("Detected delimiter {:?}", delimiter as char);
                return Ok(df);
            }
            Ok(_) => debug!("Delimiter {:?} produced a single column", delimiter as char),
            Err(e) => debug!("Delimiter {:?} failed: {}", delimiter as char, e),
        }
    }

    Err(InsightError::EmptyOrUnparsable(
        "no delimiter produced more than one column".to_string(),
    ))
}

fn read_delimited(text: &str, separator: u8) -> Result<DataFrame> {
    if text.trim().is_empty() {
        return Err(InsightError::EmptyOrUnparsable("input is empty".to_string()));
    }

    let cursor = Cursor::new(text.as_bytes().to_vec());
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(separator)
                .with_quote_char(Some(b'"'))
                .with_null_values(Some(NullValues::AllColumns(
                    MISSING_TOKENS.iter().copied().map(PlSmallStr::from).collect(),
                )))
                .with_truncate_ragged_lines(true),
        )
        .into_reader_with_file_handle(cursor)
        .finish()
        .map_err(|e| InsightError::EmptyOrUnparsable(e.to_string()))
}
