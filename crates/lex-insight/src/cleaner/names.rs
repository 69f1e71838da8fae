//! Column-name normalization.

use crate::types::RenamedColumn;
use polars::prelude::*;
use std::collections::HashSet;

/// Normalize one raw column name: trim, lowercase, spaces to underscores.
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Normalize every column name, keeping names unique.
///
/// A name that collides with an earlier one gets `_2`, `_3`, ... appended;
/// a name that is empty after trimming becomes `column_<position>`.
/// Returns the renamed table and the list of names that changed.
pub(super) fn normalize_column_names(df: DataFrame) -> PolarsResult<(DataFrame, Vec<RenamedColumn>)> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut renamed = Vec::new();
    let mut columns = Vec::with_capacity(df.width());

    for (idx, col) in df.get_columns().iter().enumerate() {
        let original = col.name().to_string();
        let mut base = normalize_name(&original);
        if base.is_empty() {
            base = format!("column_{}", idx + 1);
        }

        let mut candidate = base.clone();
        let mut suffix = 2;
        while seen.contains(&candidate) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        seen.insert(candidate.clone());

        if candidate != original {
            renamed.push(RenamedColumn {
                from: original,
                to: candidate.clone(),
            });
        }
        columns.push(col.clone().with_name(candidate.into()));
    }

    Ok((DataFrame::new(columns)?, renamed))
}
