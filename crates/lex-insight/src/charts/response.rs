//! Parsing of AI chart-suggestion responses.
//!
//! Models wrap JSON in prose and Markdown fences more often than not, so the
//! response goes through a fixed sequence of recoveries before it is given up
//! on. Every step is a pure function.

use crate::error::{InsightError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// First `{` through last `}`.
static JSON_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("Invalid regex: JSON_SPAN"));

/// One chart the model proposes, before it is checked against the table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChartSuggestion {
    #[serde(rename = "type")]
    pub chart_type: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub aggregation: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Return the body of the first fenced block that looks like JSON.
///
/// Text without fences, or whose fences hold nothing JSON-like, is returned
/// trimmed and otherwise untouched.
pub fn strip_code_fences(text: &str) -> &str {
    if !text.contains("```") {
        return text.trim();
    }

    // odd segments are inside fences
    for segment in text.split("```").skip(1).step_by(2) {
        let segment = segment.trim();
        if segment.starts_with('{') {
            return segment;
        }
        if let Some(rest) = segment.strip_prefix("json") {
            return rest.trim();
        }
    }
    text.trim()
}

/// Parse a response body into a JSON value, falling back to the widest
/// `{...}` span when the body carries surrounding prose.
pub fn extract_json(text: &str) -> Result<Value> {
    let body = strip_code_fences(text);
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return Ok(value);
    }

    let span = JSON_SPAN
        .find(body)
        .ok_or_else(|| InsightError::AiServiceFailure("response contains no JSON object".to_string()))?;
    serde_json::from_str(span.as_str())
        .map_err(|e| InsightError::AiServiceFailure(format!("response JSON is malformed: {}", e)))
}

/// Parse the `{"charts": [...]}` envelope.
///
/// Entries that do not deserialize as suggestions are skipped; an envelope
/// without a `charts` list is an error.
pub fn parse_suggestions(text: &str) -> Result<Vec<ChartSuggestion>> {
    let value = extract_json(text)?;
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("charts") {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(InsightError::AiServiceFailure(
                    "response has no 'charts' list".to_string(),
                ));
            }
        },
        _ => {
            return Err(InsightError::AiServiceFailure(
                "response is not a JSON object".to_string(),
            ));
        }
    };

    let suggestions = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<ChartSuggestion>(entry) {
            Ok(suggestion) => Some(suggestion),
            Err(e) => {
                debug!("Skipping malformed chart suggestion: {}", e);
                None
            }
        })
        .collect();
    Ok(suggestions)
}
