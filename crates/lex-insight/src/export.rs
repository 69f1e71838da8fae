//! Writing pipeline outputs to disk.

use crate::error::Result;
use crate::types::InsightResult;
use polars::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the cleaned table.
pub const CLEANED_CSV: &str = "cleaned_data.csv";

/// File name of the result document.
pub const RESULTS_JSON: &str = "results.json";

/// Paths written by [`save_outputs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub cleaned_csv: PathBuf,
    pub results_json: PathBuf,
}

/// Write a table as comma-separated text with a header row.
pub fn write_csv<W: Write>(df: &mut DataFrame, mut writer: W) -> Result<()> {
    CsvWriter::new(&mut writer)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)?;
    Ok(())
}

/// Write `cleaned_data.csv` and `results.json` into `dir`, creating it if needed.
pub fn save_outputs(dir: &Path, df: &mut DataFrame, result: &InsightResult) -> Result<OutputPaths> {
    fs::create_dir_all(dir)?;

    let cleaned_csv = dir.join(CLEANED_CSV);
    write_csv(df, File::create(&cleaned_csv)?)?;
    info!("Cleaned data saved: {}", cleaned_csv.display());

    let results_json = dir.join(RESULTS_JSON);
    let mut file = File::create(&results_json)?;
    file.write_all(serde_json::to_string_pretty(&result.to_json())?.as_bytes())?;
    info!("Results saved: {}", results_json.display());

    Ok(OutputPaths {
        cleaned_csv,
        results_json,
    })
}
