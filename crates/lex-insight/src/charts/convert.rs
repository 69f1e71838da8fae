//! Conversion of AI chart suggestions into chart specs.
//!
//! A suggestion only names a chart type and some columns; the data is always
//! computed here from the table. Anything that does not fit the table fails
//! with [`InsightError::SuggestionConversion`] and only that suggestion is
//! dropped.

use super::response::ChartSuggestion;
use super::spec::{
    BAR_BACKGROUND, BAR_BORDER, ChartData, ChartSpec, ChartType, Color, Dataset, LINE_BACKGROUND,
    LINE_BORDER, PALETTE, Point, SCATTER_BACKGROUND, SCATTER_BORDER, SeriesData, base_options,
    pie_options, scatter_options, title_case,
};
use crate::cleaner::{UNKNOWN_CATEGORY, normalize_name};
use crate::error::{InsightError, Result};
use crate::safety::{date_from_days, datetime_from_timestamp};
use crate::utils::{
    ColumnKind, cell_label, column_kind, mean, numeric_values, present_numeric_values,
    top_value_counts, value_counts,
};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;

/// Categories shown in bar and pie charts.
const TOP_CATEGORIES: usize = 10;

/// Points shown in value-sequence line charts and scatter charts.
const MAX_POINTS: usize = 50;

/// Series in a split daily-count line chart.
const MAX_SERIES: usize = 5;

/// Build a chart spec from one suggestion, checked against `df`.
pub fn suggestion_to_spec(suggestion: &ChartSuggestion, df: &DataFrame) -> Result<ChartSpec> {
    let chart_type: ChartType = suggestion.chart_type.parse()?;
    let columns = suggestion
        .columns
        .iter()
        .map(|name| resolve_column(df, chart_type, name))
        .collect::<Result<Vec<_>>>()?;
    if columns.is_empty() {
        return Err(InsightError::conversion(
            chart_type.as_str(),
            "suggestion names no columns",
        ));
    }

    let title = suggestion
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| format!("{} {}", title_case(&columns[0]), title_case(chart_type.as_str())));
    let draft = Draft {
        chart_type,
        title,
        description: suggestion.description.clone().unwrap_or_default(),
        columns,
    };

    let spec = match chart_type {
        ChartType::Bar => bar_chart(df, draft, suggestion.aggregation.as_deref())?,
        ChartType::Pie => pie_chart(df, draft)?,
        ChartType::Line => line_chart(df, draft)?,
        ChartType::Scatter => scatter_chart(df, draft)?,
    };
    spec.validate(df)?;
    Ok(spec)
}

/// Match a suggested column name to a table column.
///
/// Models often echo the column names of the raw upload, so a name that is
/// not found verbatim is retried in its cleaned form.
fn resolve_column(df: &DataFrame, chart_type: ChartType, name: &str) -> Result<String> {
    if df.column(name).is_ok() {
        return Ok(name.to_string());
    }
    let cleaned = normalize_name(name);
    if df.column(&cleaned).is_ok() {
        return Ok(cleaned);
    }
    Err(InsightError::conversion(
        chart_type.as_str(),
        format!("column '{}' does not exist", name),
    ))
}

struct Draft {
    chart_type: ChartType,
    title: String,
    description: String,
    columns: Vec<String>,
}

impl Draft {
    fn fail(&self, reason: impl Into<String>) -> InsightError {
        InsightError::conversion(self.chart_type.as_str(), reason)
    }

    fn first(&self) -> &str {
        &self.columns[0]
    }

    fn finish(self, labels: Option<Vec<String>>, datasets: Vec<Dataset>, options: serde_json::Value) -> ChartSpec {
        ChartSpec {
            chart_type: self.chart_type,
            title: self.title,
            description: self.description,
            columns: self.columns,
            data: ChartData { labels, datasets },
            options,
        }
    }
}

// ============================================================================
// Per-type builders
// ============================================================================

fn bar_chart(df: &DataFrame, draft: Draft, aggregation: Option<&str>) -> Result<ChartSpec> {
    let series = df.column(draft.first())?.as_materialized_series().clone();
    let kind = column_kind(series.dtype());
    let counting = aggregation.is_some_and(|a| a.trim().eq_ignore_ascii_case("count"));

    let (labels, values, label) = match kind {
        ColumnKind::Temporal => {
            let counts = daily_counts(&series, None);
            let labels = date_labels(&counts);
            let values = counts.values().map(|c| Some(*c as f64)).collect();
            (labels, values, "Count".to_string())
        }
        _ if counting || kind == ColumnKind::Categorical => {
            let counts = top_value_counts(&series, TOP_CATEGORIES);
            let (labels, values): (Vec<String>, Vec<Option<f64>>) =
                counts.into_iter().map(|(l, c)| (l, Some(c as f64))).unzip();
            (labels, values, "Count".to_string())
        }
        ColumnKind::Numeric => {
            let avg = mean(&present_numeric_values(&series))
                .ok_or_else(|| draft.fail(format!("column '{}' has no values", draft.first())))?;
            (
                vec![draft.first().to_string()],
                vec![Some(avg)],
                format!("Average {}", title_case(draft.first())),
            )
        }
        _ => {
            return Err(draft.fail(format!(
                "column '{}' cannot be charted as bars",
                draft.first()
            )));
        }
    };
    if labels.is_empty() {
        return Err(draft.fail(format!("column '{}' has no values", draft.first())));
    }

    let dataset = Dataset::new(label, SeriesData::Values(values), Color::Single(BAR_BACKGROUND.into()))
        .border(BAR_BORDER, 2);
    let options = base_options(&draft.title);
    Ok(draft.finish(Some(labels), vec![dataset], options))
}

fn pie_chart(df: &DataFrame, draft: Draft) -> Result<ChartSpec> {
    let series = df.column(draft.first())?.as_materialized_series().clone();
    let counts = top_value_counts(&series, TOP_CATEGORIES);
    if counts.is_empty() {
        return Err(draft.fail(format!("column '{}' has no values", draft.first())));
    }

    let colors = PALETTE.iter().take(counts.len()).map(|c| c.to_string()).collect();
    let (labels, values): (Vec<String>, Vec<Option<f64>>) =
        counts.into_iter().map(|(l, c)| (l, Some(c as f64))).unzip();

    let dataset = Dataset::new(
        title_case(draft.first()),
        SeriesData::Values(values),
        Color::PerValue(colors),
    );
    let options = pie_options(&draft.title);
    Ok(draft.finish(Some(labels), vec![dataset], options))
}

fn line_chart(df: &DataFrame, draft: Draft) -> Result<ChartSpec> {
    let series = df.column(draft.first())?.as_materialized_series().clone();

    match column_kind(series.dtype()) {
        ColumnKind::Temporal => {
            let split = draft
                .columns
                .get(1)
                .map(|name| df.column(name).map(|c| c.as_materialized_series().clone()))
                .transpose()?
                .filter(|s| column_kind(s.dtype()) == ColumnKind::Categorical);

            let total = daily_counts(&series, None);
            if total.is_empty() {
                return Err(draft.fail(format!("column '{}' holds no dates", draft.first())));
            }
            let labels = date_labels(&total);

            let datasets = match split {
                Some(split) => split_categories(&series, &split)
                    .into_iter()
                    .enumerate()
                    .map(|(i, category)| {
                        let counts = daily_counts(&series, Some((&split, &category)));
                        let values = total
                            .keys()
                            .map(|day| Some(counts.get(day).copied().unwrap_or(0) as f64))
                            .collect();
                        let color = PALETTE[i % PALETTE.len()];
                        Dataset::new(category, SeriesData::Values(values), Color::Single(color.into()))
                            .border(color, 2)
                            .curve(false, 0.4)
                    })
                    .collect(),
                None => {
                    let values = total.values().map(|c| Some(*c as f64)).collect();
                    vec![
                        Dataset::new("Count", SeriesData::Values(values), Color::Single(LINE_BACKGROUND.into()))
                            .border(LINE_BORDER, 2)
                            .curve(true, 0.4),
                    ]
                }
            };
            let options = base_options(&draft.title);
            Ok(draft.finish(Some(labels), datasets, options))
        }
        ColumnKind::Numeric => {
            let values: Vec<Option<f64>> = numeric_values(&series).into_iter().take(MAX_POINTS).collect();
            if values.is_empty() {
                return Err(draft.fail(format!("column '{}' has no values", draft.first())));
            }
            let labels = (1..=values.len()).map(|i| format!("Point {}", i)).collect();
            let dataset = Dataset::new(
                title_case(draft.first()),
                SeriesData::Values(values),
                Color::Single(LINE_BACKGROUND.into()),
            )
            .border(LINE_BORDER, 2)
            .curve(true, 0.4);
            let options = base_options(&draft.title);
            Ok(draft.finish(Some(labels), vec![dataset], options))
        }
        _ => Err(draft.fail(format!(
            "column '{}' is neither temporal nor numeric",
            draft.first()
        ))),
    }
}

fn scatter_chart(df: &DataFrame, draft: Draft) -> Result<ChartSpec> {
    if draft.columns.len() < 2 {
        return Err(draft.fail("scatter needs two columns"));
    }
    let (x_name, y_name) = (draft.columns[0].clone(), draft.columns[1].clone());
    let x = df.column(&x_name)?.as_materialized_series().clone();
    let y = df.column(&y_name)?.as_materialized_series().clone();
    for (name, series) in [(&x_name, &x), (&y_name, &y)] {
        if column_kind(series.dtype()) != ColumnKind::Numeric {
            return Err(draft.fail(format!("column '{}' is not numeric", name)));
        }
    }

    let points = complete_pairs(&x, &y, Some(MAX_POINTS));
    if points.is_empty() {
        return Err(draft.fail("no rows have both values"));
    }

    let dataset = Dataset::new(
        format!("{} vs {}", x_name, y_name),
        SeriesData::Points(points),
        Color::Single(SCATTER_BACKGROUND.into()),
    )
    .border(SCATTER_BORDER, 1);
    let options = scatter_options(&draft.title, &x_name, &y_name);
    Ok(draft.finish(None, vec![dataset], options))
}

// ============================================================================
// Helpers
// ============================================================================

/// `{x, y}` points for the rows where both columns hold a value.
pub(crate) fn complete_pairs(x: &Series, y: &Series, limit: Option<usize>) -> Vec<Point> {
    numeric_values(x)
        .into_iter()
        .zip(numeric_values(y))
        .filter_map(|pair| match pair {
            (Some(x), Some(y)) => Some(Point { x, y }),
            _ => None,
        })
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// Calendar day of a date or datetime cell.
fn cell_date(value: &AnyValue) -> Option<NaiveDate> {
    match value {
        AnyValue::Date(days) => date_from_days(*days),
        AnyValue::Datetime(ts, unit, _) => datetime_from_timestamp(*ts, *unit).map(|dt| dt.date()),
        AnyValue::DatetimeOwned(ts, unit, _) => {
            datetime_from_timestamp(*ts, *unit).map(|dt| dt.date())
        }
        _ => None,
    }
}

fn category_of(value: &AnyValue) -> String {
    cell_label(value).unwrap_or_else(|| UNKNOWN_CATEGORY.to_string())
}

/// Rows per calendar day in ascending date order, optionally restricted to
/// the rows whose `split` column holds the given category.
fn daily_counts(dates: &Series, only: Option<(&Series, &str)>) -> BTreeMap<NaiveDate, usize> {
    let mut counts = BTreeMap::new();
    for (row, value) in dates.iter().enumerate() {
        let Some(day) = cell_date(&value) else {
            continue;
        };
        if let Some((split, category)) = only {
            let Ok(cell) = split.get(row) else {
                continue;
            };
            if category_of(&cell) != category {
                continue;
            }
        }
        *counts.entry(day).or_insert(0) += 1;
    }
    counts
}

/// The most frequent categories among rows that carry a date.
fn split_categories(dates: &Series, split: &Series) -> Vec<String> {
    let categories = dates
        .iter()
        .zip(split.iter())
        .filter(|(date, _)| cell_date(date).is_some())
        .map(|(_, category)| category_of(&category));
    value_counts(categories)
        .into_iter()
        .take(MAX_SERIES)
        .map(|(category, _)| category)
        .collect()
}

fn date_labels(counts: &BTreeMap<NaiveDate, usize>) -> Vec<String> {
    counts.keys().map(|d| d.format("%Y-%m-%d").to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn suggestion(chart_type: &str, columns: &[&str], aggregation: Option<&str>) -> ChartSuggestion {
        ChartSuggestion {
            chart_type: chart_type.to_string(),
            title: Some("Test".to_string()),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            aggregation: aggregation.map(String::from),
            description: None,
        }
    }

    fn values(spec: &ChartSpec, idx: usize) -> Vec<Option<f64>> {
        match &spec.data.datasets[idx].data {
            SeriesData::Values(v) => v.clone(),
            SeriesData::Points(_) => panic!("expected values"),
        }
    }

    fn sales() -> DataFrame {
        df![
            "region" => ["north", "south", "north", "east", "north"],
            "amount" => [10.0, 20.0, 30.0, 40.0, 50.0],
            "units" => [1, 2, 3, 4, 5],
        ]
        .unwrap()
    }

    fn with_dates(df: DataFrame) -> DataFrame {
        let days = ["2024-01-02", "2024-01-01", "2024-01-02", "2024-01-03", "2024-01-02"];
        let dates: Vec<NaiveDate> = days
            .iter()
            .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap())
            .collect();
        let mut df = df;
        df.with_column(Series::new("order_date".into(), dates)).unwrap();
        df
    }

    #[test]
    fn test_bar_counts_categories() {
        let spec = suggestion_to_spec(&suggestion("bar", &["region"], None), &sales()).unwrap();
        assert_eq!(spec.data.labels.clone().unwrap(), vec!["north", "south", "east"]);
        assert_eq!(values(&spec, 0), vec![Some(3.0), Some(1.0), Some(1.0)]);
    }

    #[test]
    fn test_bar_numeric_mean_and_count_aggregation() {
        let df = sales();
        let mean = suggestion_to_spec(&suggestion("bar", &["amount"], Some("mean")), &df).unwrap();
        assert_eq!(mean.data.labels.clone().unwrap(), vec!["amount"]);
        assert_eq!(values(&mean, 0), vec![Some(30.0)]);

        let counted = suggestion_to_spec(&suggestion("bar", &["units"], Some("COUNT")), &df).unwrap();
        assert_eq!(counted.data.labels.clone().unwrap().len(), 5);
    }

    #[test]
    fn test_bar_dates_ascending() {
        let df = with_dates(sales());
        let spec = suggestion_to_spec(&suggestion("bar", &["order_date"], None), &df).unwrap();
        assert_eq!(
            spec.data.labels.clone().unwrap(),
            vec!["2024-01-01", "2024-01-02", "2024-01-03"]
        );
        assert_eq!(values(&spec, 0), vec![Some(1.0), Some(3.0), Some(1.0)]);
    }

    #[test]
    fn test_pie_uses_palette_per_slice() {
        let spec = suggestion_to_spec(&suggestion("pie", &["region"], None), &sales()).unwrap();
        match &spec.data.datasets[0].background_color {
            Color::PerValue(colors) => assert_eq!(colors.len(), 3),
            Color::Single(_) => panic!("expected one color per slice"),
        }
        assert_eq!(spec.options["plugins"]["legend"]["position"], "right");
    }

    #[test]
    fn test_line_split_by_category() {
        let df = with_dates(sales());
        let spec =
            suggestion_to_spec(&suggestion("line", &["order_date", "region"], None), &df).unwrap();
        let labels = spec.data.labels.clone().unwrap();
        assert_eq!(labels.len(), 3);
        let series: Vec<&str> = spec.data.datasets.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(series, vec!["north", "south", "east"]);
        // every north row falls on 2024-01-02
        assert_eq!(values(&spec, 0), vec![Some(0.0), Some(3.0), Some(0.0)]);
    }

    #[test]
    fn test_line_numeric_points() {
        let values_in: Vec<f64> = (0..80).map(|i| i as f64).collect();
        let df = df!["reading" => values_in].unwrap();
        let spec = suggestion_to_spec(&suggestion("line", &["reading"], None), &df).unwrap();
        let labels = spec.data.labels.clone().unwrap();
        assert_eq!(labels.len(), 50);
        assert_eq!(labels[0], "Point 1");
        assert_eq!(labels[49], "Point 50");
    }

    #[test]
    fn test_scatter_pairs() {
        let df = df![
            "a" => [Some(1.0), None, Some(3.0)],
            "b" => [Some(2.0), Some(5.0), Some(6.0)],
        ]
        .unwrap();
        let spec = suggestion_to_spec(&suggestion("scatter", &["a", "b"], None), &df).unwrap();
        assert!(spec.data.labels.is_none());
        assert_eq!(
            spec.data.datasets[0].data,
            SeriesData::Points(vec![Point { x: 1.0, y: 2.0 }, Point { x: 3.0, y: 6.0 }])
        );
    }

    #[test]
    fn test_raw_column_names_resolve_to_cleaned() {
        let df = df!["unit_price" => [1.0, 2.0]].unwrap();
        let spec = suggestion_to_spec(&suggestion("line", &["Unit Price"], None), &df).unwrap();
        assert_eq!(spec.columns, vec!["unit_price"]);
    }

    #[test]
    fn test_conversion_failures() {
        let df = sales();
        let cases = [
            suggestion("heatmap", &["amount"], None),
            suggestion("bar", &["missing"], None),
            suggestion("scatter", &["amount", "region"], None),
            suggestion("scatter", &["amount"], None),
            suggestion("line", &["region"], None),
            suggestion("pie", &[], None),
        ];
        for case in cases {
            let err = suggestion_to_spec(&case, &df).unwrap_err();
            assert_eq!(err.error_code(), "SUGGESTION_CONVERSION_FAILED", "{:?}", case);
        }
    }
}
