//! AI-guided chart engine.

use super::ChartEngine;
use super::convert::suggestion_to_spec;
use super::response::parse_suggestions;
use super::spec::ChartSpec;
use crate::ai::{AIProvider, generate_with_timeout};
use crate::config::InsightConfig;
use crate::error::Result;
use crate::safety::{cell_to_json, sanitize};
use crate::utils::{ColumnKind, columns_of_kind};
use polars::prelude::*;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Chart engine that asks a language model which charts to draw.
///
/// The model only picks chart types and columns; all chart data is computed
/// from the table, so a misbehaving model can at worst produce no charts.
pub struct AiChartEngine {
    provider: Arc<dyn AIProvider>,
    timeout: Duration,
    sample_columns: usize,
    sample_values: usize,
}

impl AiChartEngine {
    pub fn new(provider: Arc<dyn AIProvider>, config: &InsightConfig) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(config.ai_timeout_secs),
            sample_columns: config.sample_columns,
            sample_values: config.sample_values,
        }
    }

    /// Bounded description of the table sent along with the prompt.
    pub fn data_summary(&self, df: &DataFrame) -> Value {
        let mut samples = Map::new();
        for col in df.get_columns().iter().take(self.sample_columns) {
            let values: Vec<Value> = col
                .as_materialized_series()
                .iter()
                .take(self.sample_values)
                .map(|v| cell_to_json(&v))
                .collect();
            samples.insert(col.name().to_string(), Value::Array(values));
        }

        sanitize(json!({
            "row_count": df.height(),
            "columns": df.get_column_names_str(),
            "numeric_columns": columns_of_kind(df, ColumnKind::Numeric),
            "categorical_columns": columns_of_kind(df, ColumnKind::Categorical),
            "datetime_columns": columns_of_kind(df, ColumnKind::Temporal),
            "sample_data": samples,
        }))
    }

    /// The single prompt sent to the provider.
    pub fn build_prompt(summary: &Value, instruction: Option<&str>) -> String {
        let summary_text = serde_json::to_string_pretty(summary).unwrap_or_else(|_| summary.to_string());
        let instruction = instruction
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or("none");

        format!(
            "You are a data visualization assistant. Suggest charts for the dataset below.\n\n\
             Dataset summary:\n{summary_text}\n\n\
             User instruction: {instruction}\n\n\
             Suggest 3 to 4 charts that best reveal patterns in this data. \
             Use only these chart types: bar, pie, line, scatter. \
             Use only column names that appear in the summary. \
             A scatter chart needs two numeric columns. \
             A line chart needs a datetime or numeric column, optionally followed by a categorical column to split by.\n\n\
             Respond with strict JSON only, no explanations, in exactly this format:\n\
             {{\"charts\": [{{\"type\": \"bar\", \"title\": \"Chart title\", \"columns\": [\"column_name\"], \
             \"aggregation\": \"count\", \"description\": \"What the chart shows\"}}]}}"
        )
    }
}

impl ChartEngine for AiChartEngine {
    fn generate_charts(&self, df: &DataFrame, instruction: Option<&str>) -> Result<Vec<ChartSpec>> {
        let prompt = Self::build_prompt(&self.data_summary(df), instruction);
        let reply = generate_with_timeout(&self.provider, prompt, self.timeout)?;
        let suggestions = parse_suggestions(&reply)?;
        info!("{} suggested {} charts", self.provider.name(), suggestions.len());

        let charts = suggestions
            .iter()
            .filter_map(|suggestion| match suggestion_to_spec(suggestion, df) {
                Ok(spec) => Some(spec),
                Err(e) => {
                    debug!("Dropping chart suggestion {:?}: {}", suggestion.title, e);
                    None
                }
            })
            .collect();
        Ok(charts)
    }

    fn name(&self) -> &str {
        "ai"
    }
}
