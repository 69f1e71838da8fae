//! Data cleaning with an auditable report.
//!
//! Cleaning runs four steps in a fixed order:
//! 1. Normalize column names
//! 2. Remove exact duplicate rows
//! 3. Impute missing values (then drop rows that only now became duplicates)
//! 4. Drop columns that are still entirely missing
//!
//! Each step appends to the [`CleaningReport`] only when it changed the table,
//! so cleaning an already clean table yields a report with no operations.

mod dedup;
mod imputer;
mod names;

pub use imputer::{UNKNOWN_CATEGORY, total_missing};
pub use names::normalize_name;

use crate::error::Result;
use crate::types::{CleaningOperation, CleaningReport};
use polars::prelude::*;
use tracing::{debug, info};

/// Detail recorded for the column-name step.
const NAMES_DETAIL: &str = "Removed spaces and special characters from column names";

/// Clean a table, returning the cleaned table and a report of what changed.
pub fn clean(df: DataFrame) -> Result<(DataFrame, CleaningReport)> {
    let original_rows = df.height();
    let original_columns = df.width();
    let mut operations = Vec::new();

    info!("Cleaning {} rows x {} columns...", original_rows, original_columns);

    // 1. Column names
    let (df, renamed) = names::normalize_column_names(df)?;
    if !renamed.is_empty() {
        debug!("Renamed {} columns", renamed.len());
        operations.push(CleaningOperation::ColumnNamesCleaned {
            detail: NAMES_DETAIL.to_string(),
            renamed,
        });
    }

    // 2. Duplicate rows
    let (df, removed) = dedup::remove_duplicate_rows(df)?;
    if removed > 0 {
        debug!("Removed {} duplicate rows", removed);
        operations.push(CleaningOperation::DuplicatesRemoved { count: removed });
    }

    // 3. Missing values
    let before = total_missing(&df);
    let mut df = df;
    if before > 0 {
        df = imputer::impute_missing(df)?;
        let after = total_missing(&df);
        if after != before {
            debug!("Missing cells: {} -> {}", before, after);
            operations.push(CleaningOperation::MissingValuesHandled { before, after });

            let (deduped, removed) = dedup::remove_duplicate_rows(df)?;
            df = deduped;
            if removed > 0 {
                debug!("Removed {} rows duplicated by imputation", removed);
                operations.push(CleaningOperation::ImputedDuplicatesRemoved { count: removed });
            }
        }
    }

    // 4. Entirely missing columns
    let empty_columns: Vec<String> = if df.height() > 0 {
        df.get_columns()
            .iter()
            .filter(|col| col.null_count() == col.len())
            .map(|col| col.name().to_string())
            .collect()
    } else {
        Vec::new()
    };
    if !empty_columns.is_empty() {
        debug!("Dropping empty columns: {:?}", empty_columns);
        df = df.drop_many(empty_columns.iter().map(|name| PlSmallStr::from(name.as_str())));
        operations.push(CleaningOperation::NullColumnsRemoved {
            columns: empty_columns,
        });
    }

    let report = CleaningReport {
        original_rows,
        original_columns,
        operations,
        cleaned_rows: df.height(),
        cleaned_columns: df.width(),
        rows_removed: original_rows - df.height(),
    };
    info!(
        "Cleaning complete: {} rows x {} columns ({} operations)",
        report.cleaned_rows,
        report.cleaned_columns,
        report.operations.len()
    );

    Ok((df, report))
}
