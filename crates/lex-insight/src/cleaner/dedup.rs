//! Exact duplicate-row removal.

use crate::utils::row_keys;
use polars::prelude::*;
use std::collections::HashSet;

/// Remove rows identical to an earlier row, keeping the first occurrence and
/// the original row order. Returns the table and the number of rows removed.
pub(super) fn remove_duplicate_rows(df: DataFrame) -> PolarsResult<(DataFrame, usize)> {
    let mut seen = HashSet::new();
    let keep: Vec<bool> = row_keys(&df)
        .into_iter()
        .map(|key| seen.insert(key))
        .collect();

    let removed = keep.iter().filter(|k| !**k).count();
    if removed == 0 {
        return Ok((df, 0));
    }

    let mask = BooleanChunked::new("keep".into(), keep);
    Ok((df.filter(&mask)?, removed))
}
