//! Chart-specification engine.
//!
//! This module provides both AI-guided and rule-based chart engines. The
//! [`ChartGenerator`] tries the AI engine when one is configured and falls
//! back to the rules whenever the AI path fails or yields nothing usable, so
//! chart generation never fails the pipeline.

mod ai_engine;
mod convert;
mod response;
mod rule_engine;
mod spec;

pub use ai_engine::AiChartEngine;
pub use convert::suggestion_to_spec;
pub use response::{ChartSuggestion, extract_json, parse_suggestions, strip_code_fences};
pub use rule_engine::RuleBasedChartEngine;
pub use spec::{ChartData, ChartSpec, ChartType, Color, Dataset, Point, SeriesData, title_case};

use crate::ai::AIProvider;
use crate::config::InsightConfig;
use crate::error::Result;
use crate::types::ChartSource;
use polars::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Trait for chart engines.
///
/// Implementations decide which charts to draw for a table and compute
/// their data.
pub trait ChartEngine: Send + Sync {
    /// Produce chart specs for `df`, optionally steered by a free-text
    /// instruction.
    fn generate_charts(&self, df: &DataFrame, instruction: Option<&str>) -> Result<Vec<ChartSpec>>;

    /// Short engine name for logging.
    fn name(&self) -> &str;
}

/// Charts together with the path that produced them.
#[derive(Debug, Clone)]
pub struct ChartOutcome {
    pub charts: Vec<ChartSpec>,
    pub source: ChartSource,
}

/// Chooses between the AI and rule-based engines.
pub struct ChartGenerator {
    ai: Option<AiChartEngine>,
    rules: RuleBasedChartEngine,
    max_charts: usize,
}

impl ChartGenerator {
    /// Build a generator. The AI engine is used only when a provider is
    /// given and `config.use_ai_charts` is set.
    pub fn new(config: &InsightConfig, provider: Option<Arc<dyn AIProvider>>) -> Self {
        let ai = provider
            .filter(|_| config.use_ai_charts)
            .map(|provider| AiChartEngine::new(provider, config));
        Self {
            ai,
            rules: RuleBasedChartEngine::new(),
            max_charts: config.max_charts,
        }
    }

    /// Whether the AI path will be attempted.
    pub fn uses_ai(&self) -> bool {
        self.ai.is_some()
    }

    /// Generate at most `max_charts` charts. Never fails.
    pub fn generate(&self, df: &DataFrame, instruction: Option<&str>) -> ChartOutcome {
        if let Some(ai) = &self.ai {
            match ai.generate_charts(df, instruction) {
                Ok(charts) => {
                    let charts = self.accept(df, charts);
                    if !charts.is_empty() {
                        info!("Generated {} AI-guided charts", charts.len());
                        return ChartOutcome {
                            charts,
                            source: ChartSource::Ai,
                        };
                    }
                    warn!("AI produced no usable charts, using rule-based charts");
                }
                Err(e) => warn!("AI chart generation failed, using rule-based charts: {}", e),
            }
        }

        let charts = match self.rules.generate_charts(df, instruction) {
            Ok(charts) => self.accept(df, charts),
            Err(e) => {
                warn!("Rule-based chart generation failed: {}", e);
                Vec::new()
            }
        };
        info!("Generated {} rule-based charts", charts.len());
        ChartOutcome {
            charts,
            source: ChartSource::Fallback,
        }
    }

    /// Normalize, validate and cap a batch of charts.
    fn accept(&self, df: &DataFrame, charts: Vec<ChartSpec>) -> Vec<ChartSpec> {
        charts
            .into_iter()
            .map(ChartSpec::normalized)
            .filter(|chart| match chart.validate(df) {
                Ok(()) => true,
                Err(e) => {
                    debug!("Discarding chart '{}': {}", chart.title, e);
                    false
                }
            })
            .take(self.max_charts)
            .collect()
    }
}
