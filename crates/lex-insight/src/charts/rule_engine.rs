//! Deterministic fallback chart engine.

use super::ChartEngine;
use super::convert::complete_pairs;
use super::spec::{
    BAR_BACKGROUND, BAR_BORDER, ChartData, ChartSpec, ChartType, Color, Dataset, LINE_BACKGROUND,
    LINE_BORDER, PALETTE, SCATTER_BACKGROUND, SCATTER_BORDER, SeriesData, base_options,
    pie_options, scatter_options, title_case,
};
use crate::error::Result;
use crate::utils::{
    ColumnKind, column_kind, mean, numeric_values, present_numeric_values, quantile_sorted,
    sorted, top_value_counts,
};
use polars::prelude::*;
use tracing::debug;

/// Name fragments that mark identifier-like columns.
const IDENTIFIER_MARKERS: [&str; 3] = ["id", "_id", "index"];

/// Additional fragment excluded from categorical charts.
const TIMESTAMP_MARKER: &str = "timestamp";

/// Slices in the fallback pie chart.
const PIE_SLICES: usize = 10;

/// Rule-based chart engine.
///
/// Produces up to four charts from column types alone:
/// 1. Bar of mean, median, max and min of the first numeric column
/// 2. Pie of the most frequent values of the first categorical column
/// 3. Scatter of the first two numeric columns
/// 4. Line of the first numeric column's values
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedChartEngine;

impl RuleBasedChartEngine {
    pub fn new() -> Self {
        Self
    }

    /// Numeric columns that do not look like identifiers.
    pub fn chartable_numeric(df: &DataFrame) -> Vec<String> {
        chartable(df, ColumnKind::Numeric, &IDENTIFIER_MARKERS)
    }

    /// Categorical columns that look like neither identifiers nor timestamps.
    pub fn chartable_categorical(df: &DataFrame) -> Vec<String> {
        let mut markers = IDENTIFIER_MARKERS.to_vec();
        markers.push(TIMESTAMP_MARKER);
        chartable(df, ColumnKind::Categorical, &markers)
    }

    fn summary_bar(&self, df: &DataFrame, col: &str) -> Result<Option<ChartSpec>> {
        let values = present_numeric_values(df.column(col)?.as_materialized_series());
        let ordered = sorted(&values);
        let (Some(avg), Some(median)) = (mean(&values), quantile_sorted(&ordered, 0.5)) else {
            return Ok(None);
        };
        let (min, max) = (ordered[0], ordered[ordered.len() - 1]);

        let title = format!("{} Summary", title_case(col));
        let dataset = Dataset::new(
            title_case(col),
            SeriesData::Values(vec![Some(avg), Some(median), Some(max), Some(min)]),
            Color::Single(BAR_BACKGROUND.into()),
        )
        .border(BAR_BORDER, 2);

        Ok(Some(ChartSpec {
            chart_type: ChartType::Bar,
            description: format!("Mean, median, max and min of {}", col),
            columns: vec![col.to_string()],
            data: ChartData {
                labels: Some(["Mean", "Median", "Max", "Min"].map(String::from).to_vec()),
                datasets: vec![dataset],
            },
            options: base_options(&format!("{} Statistics", title_case(col))),
            title,
        }))
    }

    fn distribution_pie(&self, df: &DataFrame, col: &str) -> Result<Option<ChartSpec>> {
        let counts = top_value_counts(df.column(col)?.as_materialized_series(), PIE_SLICES);
        if counts.is_empty() {
            return Ok(None);
        }
        let colors = PALETTE.iter().take(counts.len()).map(|c| c.to_string()).collect();
        let (labels, values): (Vec<String>, Vec<Option<f64>>) =
            counts.into_iter().map(|(l, c)| (l, Some(c as f64))).unzip();

        let title = format!("{} Distribution", title_case(col));
        Ok(Some(ChartSpec {
            chart_type: ChartType::Pie,
            description: format!("Distribution of values in {} column", col),
            columns: vec![col.to_string()],
            data: ChartData {
                labels: Some(labels),
                datasets: vec![Dataset::new(
                    title_case(col),
                    SeriesData::Values(values),
                    Color::PerValue(colors),
                )],
            },
            options: pie_options(&title),
            title,
        }))
    }

    fn relationship_scatter(&self, df: &DataFrame, x: &str, y: &str) -> Result<Option<ChartSpec>> {
        let points = complete_pairs(
            df.column(x)?.as_materialized_series(),
            df.column(y)?.as_materialized_series(),
            None,
        );
        if points.is_empty() {
            return Ok(None);
        }

        let dataset = Dataset::new(
            format!("{} vs {}", x, y),
            SeriesData::Points(points),
            Color::Single(SCATTER_BACKGROUND.into()),
        )
        .border(SCATTER_BORDER, 1);

        Ok(Some(ChartSpec {
            chart_type: ChartType::Scatter,
            title: format!("{} vs {}", title_case(x), title_case(y)),
            description: "Scatter plot showing relationship between two numeric columns".to_string(),
            columns: vec![x.to_string(), y.to_string()],
            data: ChartData {
                labels: None,
                datasets: vec![dataset],
            },
            options: scatter_options(&format!("{} vs {}", x, y), x, y),
        }))
    }

    fn value_line(&self, df: &DataFrame, col: &str) -> Result<Option<ChartSpec>> {
        let values = numeric_values(df.column(col)?.as_materialized_series());
        if values.is_empty() {
            return Ok(None);
        }
        let labels = (1..=values.len()).map(|i| format!("Row {}", i)).collect();

        let dataset = Dataset::new(
            title_case(col),
            SeriesData::Values(values),
            Color::Single(LINE_BACKGROUND.into()),
        )
        .border(LINE_BORDER, 2)
        .curve(true, 0.4);

        Ok(Some(ChartSpec {
            chart_type: ChartType::Line,
            title: format!("{} Trend", title_case(col)),
            description: format!("Trend visualization for {}", col),
            columns: vec![col.to_string()],
            data: ChartData {
                labels: Some(labels),
                datasets: vec![dataset],
            },
            options: base_options(&format!("{} Over Data Points", title_case(col))),
        }))
    }
}

impl ChartEngine for RuleBasedChartEngine {
    fn generate_charts(&self, df: &DataFrame, _instruction: Option<&str>) -> Result<Vec<ChartSpec>> {
        let numeric = Self::chartable_numeric(df);
        let categorical = Self::chartable_categorical(df);
        debug!(
            "Fallback charts from {} numeric and {} categorical columns",
            numeric.len(),
            categorical.len()
        );

        let mut charts = Vec::new();
        if let Some(col) = numeric.first() {
            charts.extend(self.summary_bar(df, col)?);
        }
        if let Some(col) = categorical.first() {
            charts.extend(self.distribution_pie(df, col)?);
        }
        if let [x, y, ..] = numeric.as_slice() {
            charts.extend(self.relationship_scatter(df, x, y)?);
        }
        if let Some(col) = numeric.first() {
            charts.extend(self.value_line(df, col)?);
        }
        Ok(charts)
    }

    fn name(&self) -> &str {
        "rules"
    }
}

fn chartable(df: &DataFrame, kind: ColumnKind, markers: &[&str]) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|col| column_kind(col.dtype()) == kind)
        .map(|col| col.name().to_string())
        .filter(|name| {
            let lower = name.to_lowercase();
            !markers.iter().any(|marker| lower.contains(marker))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn types(charts: &[ChartSpec]) -> Vec<ChartType> {
        charts.iter().map(|c| c.chart_type).collect()
    }

    #[test]
    fn test_full_fallback_set() {
        let df = df![
            "price" => [10.0, 20.0, 30.0, 40.0],
            "quantity" => [1, 2, 3, 4],
            "region" => ["north", "south", "north", "east"],
        ]
        .unwrap();

        let charts = RuleBasedChartEngine::new().generate_charts(&df, None).unwrap();
        assert_eq!(
            types(&charts),
            vec![ChartType::Bar, ChartType::Pie, ChartType::Scatter, ChartType::Line]
        );

        let bar = &charts[0];
        assert_eq!(bar.title, "Price Summary");
        assert_eq!(
            bar.data.datasets[0].data,
            SeriesData::Values(vec![Some(25.0), Some(25.0), Some(40.0), Some(10.0)])
        );

        let line = &charts[3];
        assert_eq!(line.data.labels.as_ref().unwrap()[0], "Row 1");
        assert_eq!(line.options["plugins"]["title"]["text"], "Price Over Data Points");
        assert_eq!(line.data.datasets[0].tension, Some(0.4));
    }

    #[test]
    fn test_identifier_columns_are_skipped() {
        let df = df![
            "id" => [1, 2, 3],
            "category" => ["a", "b", "a"],
        ]
        .unwrap();
        let charts = RuleBasedChartEngine::new().generate_charts(&df, None).unwrap();
        assert_eq!(types(&charts), vec![ChartType::Pie]);
        assert_eq!(charts[0].columns, vec!["category"]);
    }

    #[test]
    fn test_marker_matching_is_case_insensitive() {
        let df = df![
            "Row_Index" => [1, 2],
            "Customer_ID" => [7, 8],
            "event_timestamp" => ["x", "y"],
        ]
        .unwrap();
        assert!(RuleBasedChartEngine::chartable_numeric(&df).is_empty());
        assert!(RuleBasedChartEngine::chartable_categorical(&df).is_empty());
        assert!(RuleBasedChartEngine::new().generate_charts(&df, None).unwrap().is_empty());
    }

    #[test]
    fn test_scatter_uses_all_complete_rows() {
        let values: Vec<f64> = (0..120).map(|i| i as f64).collect();
        let df = df!["a" => values.clone(), "b" => values].unwrap();
        let charts = RuleBasedChartEngine::new().generate_charts(&df, None).unwrap();
        let scatter = charts.iter().find(|c| c.chart_type == ChartType::Scatter).unwrap();
        assert_eq!(scatter.data.datasets[0].data.len(), 120);
        assert_eq!(scatter.options["scales"]["x"]["title"]["text"], "a");
    }
}
