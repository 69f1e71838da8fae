//! Tabular Data Insight Library
//!
//! Turns an uploaded tabular file into a cleaned table and a JSON-safe insight
//! document: cleaning report, statistics, analytics and ready-to-render chart
//! specifications.
//!
//! # Overview
//!
//! - **Parsing**: CSV, delimited text, JSON records and spreadsheets, with
//!   encoding fallback and datetime inference
//! - **Cleaning**: Column name normalization, duplicate removal, median/mode
//!   imputation
//! - **Statistics**: Numeric and categorical summaries
//! - **Analytics**: Correlations, IQR outliers, anomalies and trends
//! - **Charts**: AI-guided chart suggestions with a deterministic rule-based
//!   fallback
//! - **Progress Reporting**: Stage updates with cancellation support
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_insight::{InsightConfig, Pipeline};
//! use lex_insight::ai::GeminiProvider;
//! use std::sync::Arc;
//!
//! let bytes = std::fs::read("sales.csv")?;
//!
//! // Option 1: AI-guided charts
//! let provider = Arc::new(GeminiProvider::new(api_key)?);
//! let output = Pipeline::builder()
//!     .ai_provider(provider)
//!     .build()?
//!     .process(&bytes, "csv", Some("revenue by region"))?;
//!
//! // Option 2: Rule-based charts only
//! let output = Pipeline::builder()
//!     .config(InsightConfig::builder().use_ai_charts(false).build()?)
//!     .build()?
//!     .process(&bytes, "csv", None)?;
//!
//! println!("{}", serde_json::to_string_pretty(&output.result.to_json())?);
//! ```
//!
//! # Components
//!
//! Every stage is also usable on its own: [`parser::parse`], [`cleaner::clean`],
//! [`statistics::statistics`], [`analytics::analyze`] and
//! [`charts::ChartGenerator`].

pub mod ai;
pub mod analytics;
pub mod charts;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod export;
pub mod insights;
pub mod parser;
pub mod pipeline;
pub mod profiler;
pub mod safety;
pub mod statistics;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use analytics::analyze;
pub use charts::{ChartEngine, ChartGenerator, ChartOutcome, ChartSpec, ChartType};
pub use cleaner::clean;
pub use config::{ConfigValidationError, InsightConfig, InsightConfigBuilder, MAX_CHARTS};
pub use error::{InsightError, ResultExt};
pub use parser::{FileFormat, ParsedTable, parse};
pub use pipeline::{
    CancellationToken, ClosureProgressReporter, Pipeline, PipelineBuilder, PipelineOutput,
    PipelineStage, ProgressReporter, ProgressUpdate,
};
pub use profiler::DataProfiler;
pub use statistics::statistics;
pub use types::{
    AnalyticsReport, ChartSource, CleaningOperation, CleaningReport, ColumnProfile, DataInfo,
    DatetimeInference, InsightResult, StatisticsDocument,
};
pub use utils::ColumnKind;
