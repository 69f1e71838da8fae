//! Narrative insight summary written by a language model.
//!
//! Unlike chart generation this has no deterministic fallback: without a
//! provider, or when the call fails, the caller gets a short message saying
//! so instead of an error.

use crate::ai::{AIProvider, generate_with_timeout};
use crate::safety::normalize;
use crate::types::{CleaningReport, DataInfo, StatisticsDocument};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Returned when no provider is configured.
pub const NOT_CONFIGURED_MESSAGE: &str =
    "AI insights are not configured. Set GEMINI_API_KEY to enable them.";

/// Returned when the provider answers with nothing.
pub const EMPTY_REPLY_MESSAGE: &str = "Unable to generate insights. Please try again.";

/// The analyst prompt for one dataset.
pub fn build_prompt(info: &DataInfo, cleaning_report: &CleaningReport, statistics: &StatisticsDocument) -> String {
    let pretty = |value: serde_json::Value| {
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
    };

    format!(
        "You are a data analyst. Analyze the following dataset information and provide insightful observations.\n\n\
         Dataset Information:\n\
         - Total Rows: {rows}\n\
         - Total Columns: {columns}\n\
         - Column Names: {names}\n\n\
         Data Cleaning Report:\n{report}\n\n\
         Statistical Summary:\n{stats}\n\n\
         Please provide:\n\
         1. **Key Findings** (3-5 bullet points): the most important insights about the data\n\
         2. **Data Quality Assessment**: a brief assessment of data quality based on the cleaning report\n\
         3. **Notable Patterns**: interesting patterns or trends you observe\n\
         4. **Recommendations**: 2-3 actionable recommendations based on the analysis\n\n\
         Format your response in clear markdown with headers and bullet points. \
         Keep it concise and business-focused.",
        rows = info.rows,
        columns = info.columns,
        names = info.column_names.join(", "),
        report = pretty(normalize(cleaning_report)),
        stats = pretty(normalize(statistics)),
    )
}

/// Ask `provider` for an insight summary.
///
/// Always returns text: the model's markdown on success, otherwise a fixed
/// explanatory message.
pub fn generate(
    provider: Option<&Arc<dyn AIProvider>>,
    info: &DataInfo,
    cleaning_report: &CleaningReport,
    statistics: &StatisticsDocument,
    timeout: Duration,
) -> String {
    let Some(provider) = provider else {
        return NOT_CONFIGURED_MESSAGE.to_string();
    };

    let prompt = build_prompt(info, cleaning_report, statistics);
    match generate_with_timeout(provider, prompt, timeout) {
        Ok(text) if !text.trim().is_empty() => {
            info!("Generated insights with {}", provider.name());
            text
        }
        Ok(_) => EMPTY_REPLY_MESSAGE.to_string(),
        Err(e) => {
            warn!("Insight generation failed: {}", e);
            format!("Error generating insights: {}", e)
        }
    }
}
