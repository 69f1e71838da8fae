//! CLI entry point for the insight pipeline.

use anyhow::{Result, anyhow};
use clap::Parser;
use dotenv::dotenv;
use lex_insight::export::save_outputs;
use lex_insight::{CleaningOperation, InsightConfig, InsightResult, Pipeline};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[cfg(feature = "ai")]
use lex_insight::ai::{GeminiConfig, GeminiProvider};
#[cfg(feature = "ai")]
use std::env;
#[cfg(feature = "ai")]
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    author = "Lex Machina Team",
    version,
    about = "Tabular data cleaning, analytics and chart generation",
    long_about = "Cleans an uploaded table and produces statistics, analytics and chart specifications.\n\n\
                  SUPPORTED FORMATS:\n  \
                  csv, txt (comma, tab, semicolon or pipe delimited), json, xlsx, xls, xlsm, xlsb, ods\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  GEMINI_API_KEY    API key for Google Gemini (enables AI-guided charts and insights)\n\n\
                  EXAMPLES:\n  \
                  # Basic usage\n  \
                  lex-insight -i sales.csv\n\n  \
                  # Steer the chart suggestions\n  \
                  lex-insight -i sales.xlsx --instruction \"compare revenue across regions\"\n\n  \
                  # Rule-based charts only, JSON to stdout\n  \
                  lex-insight -i sales.json --no-ai --json"
)]
struct Args {
    /// Path to the file to process
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for cleaned_data.csv and results.json
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Free-text instruction for the AI chart suggestions
    #[arg(long)]
    instruction: Option<String>,

    /// Disable AI chart suggestions (use rule-based charts only)
    #[arg(long, default_value = "false")]
    no_ai: bool,

    /// Print the result document as JSON to stdout instead of a summary
    ///
    /// Disables all logging so stdout only carries JSON.
    #[arg(long)]
    json: bool,

    /// Also ask the AI provider for a narrative insight summary
    #[arg(long)]
    insights: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and the result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Load environment variables from .env file
    dotenv().ok();

    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }
    let extension = args
        .input
        .extension()
        .and_then(|ext| ext.to_str())
        .ok_or_else(|| anyhow!("Input file has no extension: {}", args.input.display()))?
        .to_string();
    let bytes = std::fs::read(&args.input)?;

    let config = InsightConfig::builder()
        .use_ai_charts(!args.no_ai)
        .output_dir(&args.output)
        .build()?;
    let pipeline = build_pipeline(&args, config)?;

    let mut output = match pipeline.process(&bytes, &extension, args.instruction.as_deref()) {
        Ok(output) => output,
        Err(e) => {
            error!("Pipeline failed: {}", e);
            return Err(anyhow!("Pipeline failed: {}", e));
        }
    };

    let paths = save_outputs(&pipeline.config().output_dir, &mut output.df, &output.result)?;
    info!(
        "Outputs written to {} and {}",
        paths.cleaned_csv.display(),
        paths.results_json.display()
    );

    let insights = args.insights.then(|| pipeline.insights(&output.result));

    if args.json {
        let mut document = output.result.to_json();
        if let (Some(text), Some(map)) = (insights, document.as_object_mut()) {
            map.insert("insights".to_string(), serde_json::Value::String(text));
        }
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    print_human_readable_summary(&output.result, &args.input, &paths.results_json);
    if let Some(text) = insights {
        println!("INSIGHTS");
        println!("{}", "-".repeat(40));
        println!("{}", text);
        println!();
    }

    Ok(())
}

/// Build the pipeline with optional AI support.
#[cfg(feature = "ai")]
fn build_pipeline(args: &Args, config: InsightConfig) -> Result<Pipeline> {
    let gemini_config = GeminiConfig::for_pipeline(&config);
    let mut builder = Pipeline::builder().config(config);

    if args.no_ai && !args.insights {
        info!("Running in rule-based mode (AI disabled)");
    } else {
        match env::var("GEMINI_API_KEY") {
            Ok(api_key) if !api_key.trim().is_empty() => {
                info!("Using Gemini for chart suggestions");
                builder = builder.ai_provider(Arc::new(GeminiProvider::with_config(
                    api_key,
                    gemini_config,
                )?));
            }
            _ => warn!("GEMINI_API_KEY not set. Falling back to rule-based charts."),
        }
    }

    if !args.quiet {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Build the pipeline without AI support (fallback when "ai" feature is disabled).
#[cfg(not(feature = "ai"))]
fn build_pipeline(args: &Args, config: InsightConfig) -> Result<Pipeline> {
    if !args.no_ai {
        warn!("AI support not compiled in. Using rule-based charts.");
        warn!("Compile with --features ai to enable AI support.");
    }

    let mut builder = Pipeline::builder().config(config);
    if !args.quiet {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Print a human-readable summary of the run.
///
/// Uses `println!` on purpose: this is the CLI's user-facing output.
fn print_human_readable_summary(result: &InsightResult, input: &Path, results_json: &Path) {
    let report = &result.cleaning_report;

    println!();
    println!("{}", "=".repeat(80));
    println!("ANALYSIS COMPLETE: {}", input.display());
    println!("{}", "=".repeat(80));
    println!();

    println!("DATASET");
    println!("{}", "-".repeat(40));
    println!(
        "  Before cleaning: {} rows x {} columns",
        report.original_rows, report.original_columns
    );
    println!(
        "  After cleaning:  {} rows x {} columns ({} rows removed)",
        report.cleaned_rows, report.cleaned_columns, report.rows_removed
    );
    if !result.datetime_inference.converted.is_empty() {
        println!(
            "  Datetime columns: {}",
            result.datetime_inference.converted.join(", ")
        );
    }
    println!();

    println!("CLEANING");
    println!("{}", "-".repeat(40));
    if report.operations.is_empty() {
        println!("  No changes needed");
    }
    for operation in &report.operations {
        let line = match operation {
            CleaningOperation::ColumnNamesCleaned { renamed, .. } => {
                format!("Renamed {} columns", renamed.len())
            }
            CleaningOperation::DuplicatesRemoved { count } => {
                format!("Removed {} duplicate rows", count)
            }
            CleaningOperation::MissingValuesHandled { before, after } => {
                format!("Filled missing values ({} -> {} missing cells)", before, after)
            }
            CleaningOperation::ImputedDuplicatesRemoved { count } => {
                format!("Removed {} rows duplicated by imputation", count)
            }
            CleaningOperation::NullColumnsRemoved { columns } => {
                format!("Dropped empty columns: {}", columns.join(", "))
            }
        };
        println!("  - {}", line);
    }
    println!();

    println!("ANALYTICS");
    println!("{}", "-".repeat(40));
    if let Some(correlation) = &result.analytics.correlation {
        for pair in &correlation.strong_pairs {
            println!(
                "  {} / {}: r = {:.2} ({})",
                pair.col1, pair.col2, pair.correlation, pair.strength
            );
        }
    }
    for (column, entry) in result.analytics.outliers.iter() {
        println!(
            "  {}: {} outliers ({:.2}% of rows)",
            column, entry.count, entry.percentage
        );
    }
    for (column, trend) in result.analytics.trends.iter() {
        println!(
            "  {}: {:?} by {:.2}%",
            column, trend.direction, trend.change_percent
        );
    }
    let anomalies = &result.analytics.anomalies;
    if anomalies.duplicate_rows > 0 {
        println!("  {} duplicate rows remain", anomalies.duplicate_rows);
    }
    if !anomalies.columns_with_single_value.is_empty() {
        println!(
            "  Constant columns: {}",
            anomalies.columns_with_single_value.join(", ")
        );
    }
    println!();

    println!("CHARTS ({:?})", result.chart_source);
    println!("{}", "-".repeat(40));
    for chart in &result.charts {
        println!("  [{}] {}", chart.chart_type, chart.title);
    }
    println!();

    println!("Full results: {}", results_json.display());
    println!("{}", "=".repeat(80));
}
