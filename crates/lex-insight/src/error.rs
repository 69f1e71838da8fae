//! Error types for the insight pipeline.
//!
//! Fatal errors (unsupported formats, unparsable input, bad JSON shapes,
//! cancellation) surface to the caller. AI failures and per-suggestion
//! conversion failures are recovered inside the chart engine and never leave
//! it, but they share this type so the recovery paths stay explicit.
//!
//! Errors serialize as `{code, message}` so a caller can hand them straight
//! to a frontend.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the insight pipeline.
#[derive(Error, Debug)]
pub enum InsightError {
    /// The declared file extension is not one the parser understands.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The input parsed to a table with no rows or no columns, or could not be
    /// parsed at all.
    #[error("File is empty or couldn't be parsed: {0}")]
    EmptyOrUnparsable(String),

    /// Structured-record input whose top level is neither an array of objects
    /// nor a single object.
    #[error("Invalid JSON shape: {0}")]
    InvalidShape(String),

    /// The external text-generation service failed or answered with garbage.
    #[error("AI service failure: {0}")]
    AiServiceFailure(String),

    /// A single chart suggestion could not be turned into a chart spec.
    #[error("Cannot convert {chart_type} suggestion: {reason}")]
    SuggestionConversion { chart_type: String, reason: String },

    /// Pipeline was cancelled by the caller.
    #[error("Pipeline cancelled")]
    Cancelled,

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal error (e.g., thread join failure).
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Spreadsheet reader error.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// HTTP request error (for the AI provider, only with "ai" feature).
    #[cfg(feature = "ai")]
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<InsightError>,
    },
}

impl InsightError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        InsightError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            Self::EmptyOrUnparsable(_) => "EMPTY_OR_UNPARSABLE",
            Self::InvalidShape(_) => "INVALID_SHAPE",
            Self::AiServiceFailure(_) => "AI_SERVICE_FAILURE",
            Self::SuggestionConversion { .. } => "SUGGESTION_CONVERSION_FAILED",
            Self::Cancelled => "CANCELLED",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Spreadsheet(_) => "SPREADSHEET_ERROR",
            #[cfg(feature = "ai")]
            Self::HttpRequest(_) => "HTTP_REQUEST_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error represents a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::WithContext { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Errors the pipeline handles itself by falling back or dropping work.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::AiServiceFailure(_) | Self::SuggestionConversion { .. } => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }

    pub(crate) fn conversion(chart_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SuggestionConversion {
            chart_type: chart_type.into(),
            reason: reason.into(),
        }
    }
}

impl Serialize for InsightError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("InsightError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for insight operations.
pub type Result<T> = std::result::Result<T, InsightError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| InsightError::Polars(e).with_context(context))
    }
}
