//! Analytics over a cleaned table.
//!
//! This module provides functionality for:
//! - Pearson correlation between numeric columns
//! - IQR outlier detection
//! - Duplicate, constant and high-null column anomalies
//! - Two-window trend detection

mod anomalies;
mod correlation;
mod outliers;
mod trends;

pub use anomalies::anomaly_report;
pub use correlation::{correlation_report, pearson};
pub use outliers::{iqr_bounds, outlier_report};
pub use trends::{detect_trend, trend_report};

use crate::config::InsightConfig;
use crate::error::Result;
use crate::types::AnalyticsReport;
use polars::prelude::*;
use tracing::debug;

/// Run every analytics pass with the thresholds from `config`.
pub fn analyze(df: &DataFrame, config: &InsightConfig) -> Result<AnalyticsReport> {
    let correlation = correlation_report(df, config.strong_correlation_threshold)?;
    let outliers = outlier_report(df, config.iqr_multiplier);
    let anomalies = anomaly_report(df, config.high_null_threshold);
    let trends = trend_report(df, config.trend_threshold_percent);

    debug!(
        "Analytics: {} strong pairs, {} outlier columns, {} trends",
        correlation.as_ref().map_or(0, |c| c.strong_pairs.len()),
        outliers.len(),
        trends.len()
    );

    Ok(AnalyticsReport {
        correlation,
        outliers,
        anomalies,
        trends,
    })
}
