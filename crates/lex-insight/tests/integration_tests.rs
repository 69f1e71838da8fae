//! Integration tests for the insight pipeline.
//!
//! These tests drive the public API end to end: raw bytes in, cleaned table
//! and result document out.

use lex_insight::ai::AIProvider;
use lex_insight::export::{CLEANED_CSV, RESULTS_JSON, save_outputs};
use lex_insight::insights::NOT_CONFIGURED_MESSAGE;
use lex_insight::{
    ChartSource, ChartType, CleaningOperation, InsightConfig, InsightError, Pipeline,
    PipelineOutput, clean, parse,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture(filename: &str) -> Vec<u8> {
    std::fs::read(fixtures_path().join(filename)).expect("Failed to read fixture")
}

/// Provider that always answers with the same text and records every prompt.
struct CannedProvider {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl CannedProvider {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

impl AIProvider for CannedProvider {
    fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "Canned"
    }
}

struct BrokenProvider;

impl AIProvider for BrokenProvider {
    fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        anyhow::bail!("503 Service Unavailable")
    }

    fn name(&self) -> &str {
        "Broken"
    }
}

fn rule_based_pipeline() -> Pipeline {
    Pipeline::builder()
        .config(
            InsightConfig::builder()
                .use_ai_charts(false)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
}

fn run(pipeline: &Pipeline, bytes: &[u8], extension: &str) -> PipelineOutput {
    pipeline
        .process(bytes, extension, None)
        .expect("Pipeline should complete successfully")
}

fn assert_charts_reference_columns(output: &PipelineOutput) {
    let names: Vec<String> = output
        .df
        .get_column_names_str()
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert!(output.result.charts.len() <= 4);
    for chart in &output.result.charts {
        assert!(!chart.data.datasets.is_empty(), "chart '{}' has no data", chart.title);
        for column in &chart.columns {
            assert!(
                names.contains(column),
                "chart '{}' references unknown column '{}'",
                chart.title,
                column
            );
        }
    }
}

// ============================================================================
// Full Pipeline Tests
// ============================================================================

#[test]
fn test_full_pipeline_sales_fixture() {
    let output = run(&rule_based_pipeline(), &load_fixture("sales.csv"), "csv");
    let result = &output.result;

    assert_eq!(result.original_data_info.rows, 12);
    assert_eq!(result.cleaned_data_info.rows, 11);
    assert_eq!(result.cleaning_report.duplicates_removed(), 1);
    assert_eq!(result.cleaning_report.rows_removed, 1);
    assert_eq!(output.df.height(), 11);

    assert_eq!(
        output.df.get_column_names_str(),
        vec!["order_date", "region", "units_sold", "revenue_($)", "order_id"]
    );
    assert_eq!(result.datetime_inference.converted, vec!["Order Date".to_string()]);

    // every gap is imputed
    assert!(result.cleaned_data_info.missing_values.iter().all(|(_, n)| *n == 0));
    assert!(result.statistics.numeric_stats.contains_key("units_sold"));
    assert!(result.statistics.categorical_stats.contains_key("region"));

    assert_eq!(result.chart_source, ChartSource::Fallback);
    assert!(!result.charts.is_empty());
    assert_charts_reference_columns(&output);
}

#[test]
fn test_duplicate_rows_are_removed() {
    let output = run(&rule_based_pipeline(), b"a,b\n1,x\n1,x\n2,y\n", "csv");

    assert_eq!(output.df.height(), 2);
    assert_eq!(output.result.cleaning_report.duplicates_removed(), 1);
    assert_eq!(
        output.result.cleaning_report.operations,
        vec![CleaningOperation::DuplicatesRemoved { count: 1 }]
    );
}

#[test]
fn test_single_extreme_value_is_the_only_outlier() {
    let output = run(&rule_based_pipeline(), b"v\n1\n2\n3\n4\n100\n", "csv");

    let entry = output
        .result
        .analytics
        .outliers
        .get("v")
        .expect("v should have outliers");
    assert_eq!(entry.count, 1);
    assert_eq!(entry.outlier_values, vec![100.0]);
    assert_eq!(entry.percentage, 20.0);
}

#[test]
fn test_identifier_columns_are_not_charted() {
    let output = run(
        &rule_based_pipeline(),
        b"id,color\n1,red\n2,blue\n3,red\n4,green\n",
        "csv",
    );

    let charts = &output.result.charts;
    assert_eq!(charts.len(), 1);
    assert_eq!(charts[0].chart_type, ChartType::Pie);
    assert_eq!(charts[0].columns, vec!["color".to_string()]);
}

#[test]
fn test_json_records_input() {
    let bytes = br#"[
        {"city": "Lyon", "temp": 12.5},
        {"city": "Oslo", "temp": null},
        {"city": "Lima", "temp": 19.0, "rain": 3}
    ]"#;
    let output = run(&rule_based_pipeline(), bytes, "json");

    assert_eq!(output.df.get_column_names_str(), vec!["city", "temp", "rain"]);
    assert_eq!(output.df.height(), 3);
    assert_eq!(output.df.column("temp").unwrap().null_count(), 0);
}

#[test]
fn test_tab_delimited_text_input() {
    let df = parse(b"name\tscore\nada\t9\nbob\t7\n", "txt").unwrap();
    assert_eq!(df.get_column_names_str(), vec!["name", "score"]);
    assert_eq!(df.height(), 2);
}

#[test]
fn test_legacy_encoding_is_decoded() {
    // "café" in windows-1252
    let bytes = b"item,price\ncaf\xe9,3\nth\xe9,2\n";
    let df = parse(bytes, "csv").unwrap();
    let first = df.column("item").unwrap().str().unwrap().get(0);
    assert_eq!(first, Some("café"));
}

#[test]
fn test_missing_tokens_keep_column_numeric() {
    let output = run(&rule_based_pipeline(), b"price,b\n1,x\nNA,y\n3,z\n", "csv");

    let price = output.df.column("price").unwrap();
    assert!(price.dtype().is_numeric());
    assert_eq!(price.f64().unwrap().get(1), Some(2.0));
    assert!(output.result.statistics.numeric_stats.contains_key("price"));
    assert!(
        output
            .result
            .cleaning_report
            .operations
            .contains(&CleaningOperation::MissingValuesHandled { before: 1, after: 0 })
    );
}

#[test]
fn test_nan_is_counted_and_imputed() {
    let output = run(&rule_based_pipeline(), b"a,b\n1,x\nNaN,y\n3,z\n", "csv");

    assert_eq!(output.result.original_data_info.missing_values.get("a"), Some(&1));
    assert!(
        output
            .result
            .cleaning_report
            .operations
            .contains(&CleaningOperation::MissingValuesHandled { before: 1, after: 0 })
    );
    assert_eq!(output.df.column("a").unwrap().f64().unwrap().get(1), Some(2.0));
}

#[test]
fn test_infinite_values_are_imputed() {
    let output = run(
        &rule_based_pipeline(),
        b"a,b\n1.0,x\ninf,y\n3.0,z\n-inf,w\n5.0,v\n",
        "csv",
    );

    let a = output.df.column("a").unwrap().f64().unwrap();
    assert_eq!(a.null_count(), 0);
    assert!(a.into_iter().flatten().all(f64::is_finite));
    assert_eq!(a.get(1), Some(3.0));
}

#[test]
fn test_spreadsheet_first_sheet_is_parsed() {
    let df = parse(&load_fixture("regions.xlsx"), "xlsx").unwrap();

    assert_eq!(df.get_column_names_str(), vec!["region", "column_2", "units"]);
    assert_eq!(df.height(), 3);
    assert_eq!(df.column("region").unwrap().dtype(), &DataType::String);
    assert_eq!(df.column("column_2").unwrap().dtype(), &DataType::Int64);
    assert_eq!(df.column("column_2").unwrap().null_count(), 1);
    assert_eq!(df.column("units").unwrap().dtype(), &DataType::Int64);
    assert_eq!(df.column("units").unwrap().null_count(), 1);
}

#[test]
fn test_spreadsheet_pipeline_imputes_gaps() {
    let output = run(&rule_based_pipeline(), &load_fixture("regions.xlsx"), "xlsx");

    assert_eq!(output.result.original_data_info.rows, 3);
    assert_eq!(output.df.column("units").unwrap().f64().unwrap().get(2), Some(6.0));
    assert_eq!(output.df.column("column_2").unwrap().f64().unwrap().get(1), Some(20.0));
    assert!(
        output
            .result
            .cleaning_report
            .operations
            .contains(&CleaningOperation::MissingValuesHandled { before: 2, after: 0 })
    );
}

// ============================================================================
// AI Chart Path Tests
// ============================================================================

#[test]
fn test_ai_suggestions_are_converted() {
    let provider = CannedProvider::new(
        r#"{"charts": [
            {"type": "bar", "columns": ["Region"], "aggregation": "count", "title": "Orders by region"},
            {"type": "scatter", "columns": ["units_sold", "revenue_($)"]},
            {"type": "radar", "columns": ["region"]},
            {"type": "pie", "columns": ["does_not_exist"]}
        ]}"#,
    );
    let pipeline = Pipeline::builder().ai_provider(provider.clone()).build().unwrap();

    let output = pipeline
        .process(&load_fixture("sales.csv"), "csv", Some("compare regions"))
        .unwrap();

    assert_eq!(output.result.chart_source, ChartSource::Ai);
    let types: Vec<ChartType> = output.result.charts.iter().map(|c| c.chart_type).collect();
    assert_eq!(types, vec![ChartType::Bar, ChartType::Scatter]);
    assert_eq!(output.result.charts[0].title, "Orders by region");
    assert_charts_reference_columns(&output);

    let prompts = provider.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("compare regions"));
}

#[test]
fn test_fenced_empty_reply_falls_back() {
    let provider = CannedProvider::new("```json\n{\"charts\": []}\n```");
    let pipeline = Pipeline::builder().ai_provider(provider).build().unwrap();

    let output = run(&pipeline, &load_fixture("sales.csv"), "csv");

    assert_eq!(output.result.chart_source, ChartSource::Fallback);
    assert!(!output.result.charts.is_empty());
    assert_charts_reference_columns(&output);
}

#[test]
fn test_provider_failure_falls_back() {
    let pipeline = Pipeline::builder()
        .ai_provider(Arc::new(BrokenProvider))
        .build()
        .unwrap();

    let output = run(&pipeline, &load_fixture("sales.csv"), "csv");
    assert_eq!(output.result.chart_source, ChartSource::Fallback);
}

#[test]
fn test_disabled_ai_never_calls_provider() {
    let provider = CannedProvider::new(r#"{"charts": []}"#);
    let pipeline = Pipeline::builder()
        .config(
            InsightConfig::builder()
                .use_ai_charts(false)
                .build()
                .unwrap(),
        )
        .ai_provider(provider.clone())
        .build()
        .unwrap();

    run(&pipeline, b"a,b\n1,2\n3,4\n", "csv");
    assert!(provider.prompts.lock().unwrap().is_empty());
}

// ============================================================================
// Insights Tests
// ============================================================================

#[test]
fn test_insights_without_provider() {
    let pipeline = rule_based_pipeline();
    let output = run(&pipeline, b"a\n1\n2\n", "csv");
    assert_eq!(pipeline.insights(&output.result), NOT_CONFIGURED_MESSAGE);
}

#[test]
fn test_insights_with_provider() {
    let provider = CannedProvider::new("Revenue grows steadily.");
    let pipeline = Pipeline::builder().ai_provider(provider.clone()).build().unwrap();
    let output = run(&pipeline, &load_fixture("sales.csv"), "csv");

    assert_eq!(pipeline.insights(&output.result), "Revenue grows steadily.");
    let prompts = provider.prompts.lock().unwrap();
    assert!(prompts.last().unwrap().contains("Key Findings"));
}

// ============================================================================
// Result Document Tests
// ============================================================================

#[test]
fn test_result_json_is_strict() {
    // a constant column has an undefined correlation and zero spread
    let output = run(
        &rule_based_pipeline(),
        b"x,flat,label\n1,5,a\n2,5,b\n3,5,a\n4,5,b\n",
        "csv",
    );

    let text = serde_json::to_string(&output.result.to_json()).unwrap();
    assert!(!text.contains("NaN"));
    assert!(!text.contains("Infinity"));

    let reparsed: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(reparsed["chart_source"], "fallback");
    assert_eq!(reparsed["cleaned_data_info"]["rows"], 4);
    assert_eq!(
        reparsed["analytics"]["anomalies"]["columns_with_single_value"],
        serde_json::json!(["flat"])
    );
}

#[test]
fn test_cleaning_is_idempotent() {
    let df = parse(&load_fixture("sales.csv"), "csv").unwrap();
    let (once, first_report) = clean(df).unwrap();
    assert!(!first_report.operations.is_empty());

    let (twice, second_report) = clean(once.clone()).unwrap();
    assert!(second_report.operations.is_empty());
    assert!(once.equals_missing(&twice));
}

#[test]
fn test_save_outputs_writes_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut output = run(&rule_based_pipeline(), b"a,b\n1,x\n2,y\n", "csv");

    let paths = save_outputs(dir.path(), &mut output.df, &output.result).unwrap();
    assert_eq!(paths.cleaned_csv, dir.path().join(CLEANED_CSV));
    assert_eq!(paths.results_json, dir.path().join(RESULTS_JSON));

    let csv = std::fs::read_to_string(&paths.cleaned_csv).unwrap();
    assert_eq!(csv, "a,b\n1,x\n2,y\n");

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.results_json).unwrap()).unwrap();
    assert_eq!(json["cleaning_report"]["cleaned_rows"], 2);
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_unsupported_extension() {
    let err = rule_based_pipeline().process(b"%PDF-1.7", "pdf", None).unwrap_err();
    assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
}

#[test]
fn test_empty_upload() {
    let err = rule_based_pipeline().process(b"", "csv", None).unwrap_err();
    assert_eq!(err.error_code(), "EMPTY_OR_UNPARSABLE");
}

#[test]
fn test_json_scalar_is_invalid_shape() {
    let err = rule_based_pipeline().process(b"[1, 2, 3]", "json", None).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_SHAPE");
}

#[test]
fn test_corrupt_spreadsheet_is_rejected() {
    let err = rule_based_pipeline()
        .process(b"not really a workbook", "xlsx", None)
        .unwrap_err();
    assert!(!matches!(err, InsightError::Cancelled));
    assert!(
        ["SPREADSHEET_ERROR", "EMPTY_OR_UNPARSABLE"].contains(&err.error_code()),
        "unexpected error code {}",
        err.error_code()
    );
}
