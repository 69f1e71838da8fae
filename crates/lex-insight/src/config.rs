//! Configuration types for the insight pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Largest number of charts the chart engine will ever return.
pub const MAX_CHARTS: usize = 4;

/// Configuration for the insight pipeline.
///
/// Use [`InsightConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use lex_insight::config::InsightConfig;
///
/// let config = InsightConfig::builder()
///     .use_ai_charts(false)
///     .strong_correlation_threshold(0.8)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightConfig {
    /// Whether to ask the AI provider for chart suggestions.
    /// If false or no provider is configured, rule-based charts are used.
    /// Default: true
    pub use_ai_charts: bool,

    /// Maximum number of charts to emit (1 - 4).
    /// Default: 4
    pub max_charts: usize,

    /// Absolute Pearson r above which a column pair is reported as strong.
    /// Default: 0.7
    pub strong_correlation_threshold: f64,

    /// IQR multiplier for outlier bounds.
    /// Default: 1.5
    pub iqr_multiplier: f64,

    /// Missing-rate above which a column is flagged as high-null (0.0 - 1.0).
    /// Default: 0.5
    pub high_null_threshold: f64,

    /// Minimum absolute percent change between half-means to report a trend.
    /// Default: 5.0
    pub trend_threshold_percent: f64,

    /// Upper bound on one AI provider call, in seconds.
    /// Default: 30
    pub ai_timeout_secs: u64,

    /// Columns included in the AI data summary.
    /// Default: 10
    pub sample_columns: usize,

    /// Sample values per column in the AI data summary.
    /// Default: 5
    pub sample_values: usize,

    /// Non-missing values inspected when sniffing datetime columns.
    /// Default: 10
    pub datetime_sample_size: usize,

    /// Output directory for `cleaned_data.csv` and `results.json`.
    /// Default: "output"
    pub output_dir: PathBuf,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            use_ai_charts: true,
            max_charts: MAX_CHARTS,
            strong_correlation_threshold: 0.7,
            iqr_multiplier: 1.5,
            high_null_threshold: 0.5,
            trend_threshold_percent: 5.0,
            ai_timeout_secs: 30,
            sample_columns: 10,
            sample_values: 5,
            datetime_sample_size: 10,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl InsightConfig {
    /// Create a new configuration builder.
    pub fn builder() -> InsightConfigBuilder {
        InsightConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.strong_correlation_threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "strong_correlation_threshold".to_string(),
                value: self.strong_correlation_threshold,
            });
        }

        if !(0.0..=1.0).contains(&self.high_null_threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "high_null_threshold".to_string(),
                value: self.high_null_threshold,
            });
        }

        if !(self.iqr_multiplier > 0.0 && self.iqr_multiplier.is_finite()) {
            return Err(ConfigValidationError::InvalidMultiplier(self.iqr_multiplier));
        }

        if !(self.trend_threshold_percent >= 0.0 && self.trend_threshold_percent.is_finite()) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "trend_threshold_percent".to_string(),
                value: self.trend_threshold_percent,
            });
        }

        if self.max_charts == 0 || self.max_charts > MAX_CHARTS {
            return Err(ConfigValidationError::InvalidMaxCharts(self.max_charts));
        }

        if self.ai_timeout_secs == 0 {
            return Err(ConfigValidationError::ZeroValue("ai_timeout_secs"));
        }

        if self.sample_columns == 0 {
            return Err(ConfigValidationError::ZeroValue("sample_columns"));
        }

        if self.sample_values == 0 {
            return Err(ConfigValidationError::ZeroValue("sample_values"));
        }

        if self.datetime_sample_size == 0 {
            return Err(ConfigValidationError::ZeroValue("datetime_sample_size"));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value}")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid IQR multiplier: {0} (must be a positive number)")]
    InvalidMultiplier(f64),

    #[error("Invalid max charts: {0} (must be between 1 and 4)")]
    InvalidMaxCharts(usize),

    #[error("'{0}' must be at least 1")]
    ZeroValue(&'static str),
}

/// Builder for [`InsightConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct InsightConfigBuilder {
    use_ai_charts: Option<bool>,
    max_charts: Option<usize>,
    strong_correlation_threshold: Option<f64>,
    iqr_multiplier: Option<f64>,
    high_null_threshold: Option<f64>,
    trend_threshold_percent: Option<f64>,
    ai_timeout_secs: Option<u64>,
    sample_columns: Option<usize>,
    sample_values: Option<usize>,
    datetime_sample_size: Option<usize>,
    output_dir: Option<PathBuf>,
}

impl InsightConfigBuilder {
    /// Enable or disable AI-guided chart suggestions.
    pub fn use_ai_charts(mut self, use_ai: bool) -> Self {
        self.use_ai_charts = Some(use_ai);
        self
    }

    /// Set the maximum number of charts (1 - 4).
    pub fn max_charts(mut self, max: usize) -> Self {
        self.max_charts = Some(max);
        self
    }

    /// Set the absolute correlation above which a pair counts as strong.
    pub fn strong_correlation_threshold(mut self, threshold: f64) -> Self {
        self.strong_correlation_threshold = Some(threshold);
        self
    }

    /// Set the IQR multiplier used for outlier bounds.
    pub fn iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = Some(multiplier);
        self
    }

    /// Set the missing-rate above which a column is flagged.
    ///
    /// # Arguments
    /// * `threshold` - Value between 0.0 and 1.0 (e.g., 0.5 = 50%)
    pub fn high_null_threshold(mut self, threshold: f64) -> Self {
        self.high_null_threshold = Some(threshold);
        self
    }

    /// Set the minimum percent change for a trend to be reported.
    pub fn trend_threshold_percent(mut self, percent: f64) -> Self {
        self.trend_threshold_percent = Some(percent);
        self
    }

    /// Set the timeout for one AI provider call, in seconds.
    pub fn ai_timeout_secs(mut self, secs: u64) -> Self {
        self.ai_timeout_secs = Some(secs);
        self
    }

    /// Set how many columns the AI data summary includes.
    pub fn sample_columns(mut self, columns: usize) -> Self {
        self.sample_columns = Some(columns);
        self
    }

    /// Set how many sample values per column the AI data summary includes.
    pub fn sample_values(mut self, values: usize) -> Self {
        self.sample_values = Some(values);
        self
    }

    /// Set how many values are inspected when sniffing datetime columns.
    pub fn datetime_sample_size(mut self, size: usize) -> Self {
        self.datetime_sample_size = Some(size);
        self
    }

    /// Set the output directory.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `InsightConfig` or an error if validation fails.
    pub fn build(self) -> Result<InsightConfig, ConfigValidationError> {
        let defaults = InsightConfig::default();
        let config = InsightConfig {
            use_ai_charts: self.use_ai_charts.unwrap_or(defaults.use_ai_charts),
            max_charts: self.max_charts.unwrap_or(defaults.max_charts),
            strong_correlation_threshold: self
                .strong_correlation_threshold
                .unwrap_or(defaults.strong_correlation_threshold),
            iqr_multiplier: self.iqr_multiplier.unwrap_or(defaults.iqr_multiplier),
            high_null_threshold: self
                .high_null_threshold
                .unwrap_or(defaults.high_null_threshold),
            trend_threshold_percent: self
                .trend_threshold_percent
                .unwrap_or(defaults.trend_threshold_percent),
            ai_timeout_secs: self.ai_timeout_secs.unwrap_or(defaults.ai_timeout_secs),
            sample_columns: self.sample_columns.unwrap_or(defaults.sample_columns),
            sample_values: self.sample_values.unwrap_or(defaults.sample_values),
            datetime_sample_size: self
                .datetime_sample_size
                .unwrap_or(defaults.datetime_sample_size),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InsightConfig::default();
        assert!(config.use_ai_charts);
        assert_eq!(config.max_charts, 4);
        assert_eq!(config.strong_correlation_threshold, 0.7);
        assert_eq!(config.iqr_multiplier, 1.5);
        assert_eq!(config.high_null_threshold, 0.5);
        assert_eq!(config.trend_threshold_percent, 5.0);
        assert_eq!(config.sample_columns, 10);
        assert_eq!(config.sample_values, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = InsightConfig::builder()
            .use_ai_charts(false)
            .max_charts(2)
            .strong_correlation_threshold(0.9)
            .ai_timeout_secs(5)
            .output_dir("results")
            .build()
            .unwrap();

        assert!(!config.use_ai_charts);
        assert_eq!(config.max_charts, 2);
        assert_eq!(config.strong_correlation_threshold, 0.9);
        assert_eq!(config.ai_timeout_secs, 5);
        assert_eq!(config.output_dir, PathBuf::from("results"));
        // untouched fields keep their defaults
        assert_eq!(config.iqr_multiplier, 1.5);
    }

    #[test]
    fn test_validation_invalid_threshold() {
        let result = InsightConfig::builder()
            .strong_correlation_threshold(1.5)
            .build();

        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidThreshold { .. }
        ));
    }

    #[test]
    fn test_validation_invalid_max_charts() {
        assert!(matches!(
            InsightConfig::builder().max_charts(0).build().unwrap_err(),
            ConfigValidationError::InvalidMaxCharts(0)
        ));
        assert!(matches!(
            InsightConfig::builder().max_charts(5).build().unwrap_err(),
            ConfigValidationError::InvalidMaxCharts(5)
        ));
    }

    #[test]
    fn test_validation_rejects_non_positive_multiplier() {
        let result = InsightConfig::builder().iqr_multiplier(0.0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidMultiplier(_)
        ));
    }

    #[test]
    fn test_validation_zero_timeout() {
        let result = InsightConfig::builder().ai_timeout_secs(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::ZeroValue("ai_timeout_secs")
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "use_ai_charts": false,
            "max_charts": 3,
            "strong_correlation_threshold": 0.8,
            "iqr_multiplier": 3.0,
            "high_null_threshold": 0.4,
            "trend_threshold_percent": 10.0,
            "ai_timeout_secs": 12,
            "sample_columns": 6,
            "sample_values": 3,
            "datetime_sample_size": 20,
            "output_dir": "custom_output"
        }"#;

        let config: InsightConfig = serde_json::from_str(json).expect("Should deserialize");
        assert!(!config.use_ai_charts);
        assert_eq!(config.max_charts, 3);
        assert_eq!(config.iqr_multiplier, 3.0);
        assert_eq!(config.datetime_sample_size, 20);
        assert_eq!(config.output_dir.to_str().unwrap(), "custom_output");
        assert!(config.validate().is_ok());
    }
}
