//! Pearson correlation between numeric columns.

use crate::types::{CorrelationPair, CorrelationReport};
use crate::utils::{ColumnKind, columns_of_kind, numeric_values};
use polars::prelude::*;

/// Pearson r over the rows where both values are present.
///
/// `None` with fewer than two complete pairs or when either side has zero
/// variance.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((*a, *b)),
            _ => None,
        })
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    let r = cov / (var_x.sqrt() * var_y.sqrt());
    Some(r.clamp(-1.0, 1.0))
}

/// Correlation matrix and strong pairs. `None` with fewer than two numeric columns.
pub fn correlation_report(df: &DataFrame, strong_threshold: f64) -> PolarsResult<Option<CorrelationReport>> {
    let columns = columns_of_kind(df, ColumnKind::Numeric);
    if columns.len() < 2 {
        return Ok(None);
    }

    let values = columns
        .iter()
        .map(|name| Ok(numeric_values(df.column(name)?.as_materialized_series())))
        .collect::<PolarsResult<Vec<_>>>()?;

    let n = columns.len();
    let mut matrix = vec![vec![None; n]; n];
    let mut strong_pairs = Vec::new();

    for i in 0..n {
        matrix[i][i] = Some(1.0);
        for j in (i + 1)..n {
            let r = pearson(&values[i], &values[j]);
            matrix[i][j] = r;
            matrix[j][i] = r;

            if let Some(r) = r
                && r.abs() > strong_threshold
            {
                strong_pairs.push(CorrelationPair {
                    col1: columns[i].clone(),
                    col2: columns[j].clone(),
                    correlation: r,
                    strength: if r > 0.0 { "strong positive" } else { "strong negative" }
                        .to_string(),
                });
            }
        }
    }

    Ok(Some(CorrelationReport {
        columns,
        matrix,
        strong_pairs,
    }))
}
