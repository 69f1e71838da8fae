//! Main insight pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating parse, clean, describe, analyze and chart generation.

use crate::ai::AIProvider;
use crate::analytics::analyze;
use crate::charts::ChartGenerator;
use crate::cleaner::clean;
use crate::config::{ConfigValidationError, InsightConfig};
use crate::error::{InsightError, Result, ResultExt};
use crate::insights;
use crate::parser::parse_with_sample_size;
use crate::pipeline::progress::{
    CancellationToken, ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::profiler::DataProfiler;
use crate::safety::iso_datetime;
use crate::statistics::statistics;
use crate::types::InsightResult;
use chrono::Local;
use polars::prelude::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// The cleaned table together with the merged result document.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub df: DataFrame,
    pub result: InsightResult,
}

/// The insight pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use lex_insight::{Pipeline, InsightConfig, CancellationToken};
/// use lex_insight::ai::GeminiProvider;
/// use std::sync::Arc;
///
/// // With AI provider and progress reporting
/// let provider = Arc::new(GeminiProvider::new(api_key)?);
///
/// let output = Pipeline::builder()
///     .ai_provider(provider)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process(&bytes, "csv", Some("compare regions"))?;
///
/// // Without AI (rule-based charts)
/// let output = Pipeline::builder()
///     .config(InsightConfig::builder().use_ai_charts(false).build()?)
///     .build()?
///     .process(&bytes, "xlsx", None)?;
/// ```
pub struct Pipeline {
    config: InsightConfig,
    ai_provider: Option<Arc<dyn AIProvider>>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: CancellationToken,
    charts: ChartGenerator,
}

// Ensure Pipeline can be moved to a worker thread
static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    /// Run the whole pipeline over one uploaded file.
    ///
    /// `extension` is the declared file type (`csv`, `txt`, `json`, `xlsx`,
    /// ...). `instruction` is passed to the AI chart engine when one is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns `Err(InsightError::Cancelled)` if the pipeline was cancelled via
    /// the cancellation token, and parse errors for unsupported or unreadable
    /// input. AI failures never surface here.
    pub fn process(&self, bytes: &[u8], extension: &str, instruction: Option<&str>) -> Result<PipelineOutput> {
        match self.process_internal(bytes, extension, instruction) {
            Ok(output) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                Ok(output)
            }
            Err(e) => {
                if e.is_cancelled() {
                    self.report_progress(ProgressUpdate::cancelled());
                } else {
                    self.report_progress(ProgressUpdate::failed(e.to_string()));
                }
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Ask the configured provider for a narrative summary of a finished run.
    pub fn insights(&self, result: &InsightResult) -> String {
        insights::generate(
            self.ai_provider.as_ref(),
            &result.cleaned_data_info,
            &result.cleaning_report,
            &result.statistics,
            Duration::from_secs(self.config.ai_timeout_secs),
        )
    }

    /// Check if cancellation has been requested.
    fn check_cancelled(&self) -> Result<()> {
        if self.cancellation_token.is_cancelled() {
            return Err(InsightError::Cancelled);
        }
        Ok(())
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn stage(&self, stage: PipelineStage, message: &str) -> Result<()> {
        self.check_cancelled()?;
        info!("{}", message);
        self.report_progress(ProgressUpdate::new(stage, 0.0, message));
        Ok(())
    }

    fn process_internal(&self, bytes: &[u8], extension: &str, instruction: Option<&str>) -> Result<PipelineOutput> {
        let start_time = Instant::now();
        self.stage(PipelineStage::Initializing, "Starting insight pipeline...")?;

        // 1. Parse
        self.stage(PipelineStage::Parsing, "Parsing file...")?;
        let parsed = parse_with_sample_size(bytes, extension, self.config.datetime_sample_size)
            .context(format!("Failed to read .{} upload", extension.trim_start_matches('.')))?;
        let original_data_info = DataProfiler::data_info(&parsed.df);

        // 2. Clean
        self.stage(PipelineStage::Cleaning, "Cleaning data...")?;
        let (df, cleaning_report) = clean(parsed.df)?;

        // 3. Describe
        self.stage(PipelineStage::Profiling, "Profiling cleaned data...")?;
        let cleaned_data_info = DataProfiler::data_info(&df);
        let column_profiles = DataProfiler::column_profiles(&df);

        self.stage(PipelineStage::Statistics, "Computing statistics...")?;
        let statistics = statistics(&df);

        // 4. Analyze
        self.stage(PipelineStage::Analytics, "Running analytics...")?;
        let analytics = analyze(&df, &self.config)?;

        // 5. Charts
        self.stage(PipelineStage::ChartGeneration, "Generating charts...")?;
        let outcome = self.charts.generate(&df, instruction);

        let result = InsightResult {
            original_data_info,
            cleaned_data_info,
            cleaning_report,
            column_profiles,
            statistics,
            analytics,
            charts: outcome.charts,
            chart_source: outcome.source,
            datetime_inference: parsed.datetime_inference,
            processed_at: iso_datetime(&Local::now().naive_local()),
        };

        info!(
            "Pipeline finished in {:.2}s: {} rows, {} charts ({:?})",
            start_time.elapsed().as_secs_f64(),
            df.height(),
            result.charts.len(),
            result.chart_source
        );

        Ok(PipelineOutput { df, result })
    }
}

/// Builder for creating a [`Pipeline`] with custom configuration.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<InsightConfig>,
    ai_provider: Option<Arc<dyn AIProvider>>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: Option<CancellationToken>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: InsightConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the AI provider used for chart suggestions and insights.
    ///
    /// Without a provider, or with `use_ai_charts` off, charts come from
    /// the rule-based engine.
    pub fn ai_provider(mut self, provider: Arc<dyn AIProvider>) -> Self {
        self.ai_provider = Some(provider);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Set a cancellation token for stopping the pipeline between stages.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let charts = ChartGenerator::new(&config, self.ai_provider.clone());

        Ok(Pipeline {
            config,
            ai_provider: self.ai_provider,
            progress_reporter: self.progress_reporter,
            cancellation_token: self.cancellation_token.unwrap_or_default(),
            charts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert!(pipeline.ai_provider.is_none());
        assert!(!pipeline.charts.uses_ai());
        assert!(pipeline.config.use_ai_charts);
    }

    #[test]
    fn test_pipeline_builder_rejects_bad_config() {
        let mut config = InsightConfig::default();
        config.max_charts = 9;
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_stages_are_reported_in_order() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let sink = stages.clone();

        let pipeline = Pipeline::builder()
            .on_progress(move |update| sink.lock().unwrap().push(update.stage))
            .build()
            .unwrap();
        pipeline.process(b"a,b\n1,x\n2,y\n", "csv", None).unwrap();

        assert_eq!(
            *stages.lock().unwrap(),
            vec![
                PipelineStage::Initializing,
                PipelineStage::Parsing,
                PipelineStage::Cleaning,
                PipelineStage::Profiling,
                PipelineStage::Statistics,
                PipelineStage::Analytics,
                PipelineStage::ChartGeneration,
                PipelineStage::Complete,
            ]
        );
    }

    #[test]
    fn test_cancelled_pipeline() {
        let token = CancellationToken::new();
        let last = Arc::new(Mutex::new(None));
        let sink = last.clone();

        let pipeline = Pipeline::builder()
            .cancellation_token(token.clone())
            .on_progress(move |update| *sink.lock().unwrap() = Some(update.stage))
            .build()
            .unwrap();

        assert!(pipeline.check_cancelled().is_ok());
        token.cancel();

        let err = pipeline.process(b"a\n1\n", "csv", None).unwrap_err();
        assert!(matches!(err, InsightError::Cancelled));
        assert_eq!(*last.lock().unwrap(), Some(PipelineStage::Cancelled));
    }

    #[test]
    fn test_failure_is_reported() {
        let last = Arc::new(Mutex::new(None));
        let sink = last.clone();
        let pipeline = Pipeline::builder()
            .on_progress(move |update| *sink.lock().unwrap() = Some(update.stage))
            .build()
            .unwrap();

        let err = pipeline.process(b"whatever", "pdf", None).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
        assert_eq!(*last.lock().unwrap(), Some(PipelineStage::Failed));
    }
}
