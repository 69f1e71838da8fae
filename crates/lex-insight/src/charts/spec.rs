//! Chart specification types.
//!
//! A [`ChartSpec`] is a declarative description of one chart in the shape
//! Chart.js consumes: `{type, title, description, data: {labels, datasets},
//! options}`. Nothing here renders anything.

use crate::error::{InsightError, Result};
use crate::safety::{finite, sanitize};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

// ============================================================================
// Palette
// ============================================================================

pub(crate) const BAR_BACKGROUND: &str = "rgba(99, 102, 241, 0.6)";
pub(crate) const BAR_BORDER: &str = "rgba(99, 102, 241, 1)";
pub(crate) const SCATTER_BACKGROUND: &str = "rgba(236, 72, 153, 0.6)";
pub(crate) const SCATTER_BORDER: &str = "rgba(236, 72, 153, 1)";
pub(crate) const LINE_BACKGROUND: &str = "rgba(139, 92, 246, 0.1)";
pub(crate) const LINE_BORDER: &str = "rgba(139, 92, 246, 1)";

/// Slice colors for pie charts and multi-series line charts.
pub(crate) const PALETTE: [&str; 10] = [
    "rgba(99, 102, 241, 0.8)",
    "rgba(139, 92, 246, 0.8)",
    "rgba(236, 72, 153, 0.8)",
    "rgba(34, 211, 238, 0.8)",
    "rgba(251, 146, 60, 0.8)",
    "rgba(132, 204, 22, 0.8)",
    "rgba(248, 113, 113, 0.8)",
    "rgba(253, 224, 71, 0.8)",
    "rgba(167, 139, 250, 0.8)",
    "rgba(94, 234, 212, 0.8)",
];

// ============================================================================
// Types
// ============================================================================

/// The four supported chart kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Pie,
    Line,
    Scatter,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Pie => "pie",
            Self::Line => "line",
            Self::Scatter => "scatter",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bar" => Ok(Self::Bar),
            "pie" => Ok(Self::Pie),
            "line" => Ok(Self::Line),
            "scatter" => Ok(Self::Scatter),
            other => Err(InsightError::conversion(other, "unknown chart type")),
        }
    }
}

/// One `{x, y}` point of a scatter dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Dataset values: a sequence aligned with the labels, or scatter points.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesData {
    Values(Vec<Option<f64>>),
    Points(Vec<Point>),
}

impl SeriesData {
    pub fn len(&self) -> usize {
        match self {
            Self::Values(v) => v.len(),
            Self::Points(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single color or one color per value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Color {
    Single(String),
    PerValue(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: SeriesData,
    #[serde(rename = "backgroundColor")]
    pub background_color: Color,
    #[serde(rename = "borderColor", skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(rename = "borderWidth")]
    pub border_width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
}

impl Dataset {
    pub(crate) fn new(label: impl Into<String>, data: SeriesData, background: Color) -> Self {
        Self {
            label: label.into(),
            data,
            background_color: background,
            border_color: None,
            border_width: 2,
            fill: None,
            tension: None,
        }
    }

    pub(crate) fn border(mut self, color: &str, width: u32) -> Self {
        self.border_color = Some(color.to_string());
        self.border_width = width;
        self
    }

    pub(crate) fn curve(mut self, fill: bool, tension: f64) -> Self {
        self.fill = Some(fill);
        self.tension = Some(tension);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    /// Absent for scatter charts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    pub datasets: Vec<Dataset>,
}

/// A declarative chart description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub title: String,
    pub description: String,
    /// Table columns the chart is built from.
    pub columns: Vec<String>,
    pub data: ChartData,
    /// Rendering hints.
    pub options: Value,
}

impl ChartSpec {
    /// Check that every referenced column exists and the series agree in length.
    pub fn validate(&self, df: &DataFrame) -> Result<()> {
        let fail = |reason: String| Err(InsightError::conversion(self.chart_type.as_str(), reason));

        for column in &self.columns {
            if df.column(column).is_err() {
                return fail(format!("column '{}' does not exist", column));
            }
        }
        if self.data.datasets.is_empty() {
            return fail("chart has no datasets".to_string());
        }

        match self.chart_type {
            ChartType::Scatter => {
                if self
                    .data
                    .datasets
                    .iter()
                    .any(|ds| !matches!(ds.data, SeriesData::Points(_)))
                {
                    return fail("scatter datasets must be x/y points".to_string());
                }
            }
            _ => {
                let Some(labels) = &self.data.labels else {
                    return fail("chart has no labels".to_string());
                };
                for ds in &self.data.datasets {
                    match &ds.data {
                        SeriesData::Values(values) if values.len() == labels.len() => {}
                        SeriesData::Values(values) => {
                            return fail(format!(
                                "dataset '{}' has {} values for {} labels",
                                ds.label,
                                values.len(),
                                labels.len()
                            ));
                        }
                        SeriesData::Points(_) => {
                            return fail(format!("dataset '{}' holds points", ds.label));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Replace non-finite numbers with missing values and drop scatter points
    /// that cannot be represented, so the chart serializes to strict JSON.
    ///
    /// Label-aligned values keep their slot as `null`. A scatter point with a
    /// NaN or infinite coordinate has no slot to keep, so the point is removed
    /// and the dataset gets shorter.
    pub fn normalized(mut self) -> Self {
        for ds in &mut self.data.datasets {
            ds.data = match std::mem::replace(&mut ds.data, SeriesData::Values(Vec::new())) {
                SeriesData::Values(values) => {
                    SeriesData::Values(values.into_iter().map(|v| v.and_then(finite)).collect())
                }
                SeriesData::Points(points) => {
                    let total = points.len();
                    let kept: Vec<Point> = points
                        .into_iter()
                        .filter(|p| p.x.is_finite() && p.y.is_finite())
                        .collect();
                    if kept.len() < total {
                        debug!(
                            "Dropped {} non-finite points from '{}'",
                            total - kept.len(),
                            ds.label
                        );
                    }
                    SeriesData::Points(kept)
                }
            };
            if let Some(tension) = ds.tension {
                ds.tension = finite(tension);
            }
        }
        self.options = sanitize(std::mem::take(&mut self.options));
        self
    }
}

// ============================================================================
// Options
// ============================================================================

/// Responsive chart with a visible legend and title.
pub(crate) fn base_options(title: &str) -> Value {
    json!({
        "responsive": true,
        "plugins": {
            "legend": {"display": true},
            "title": {"display": true, "text": title}
        }
    })
}

/// Pie charts keep their legend on the right.
pub(crate) fn pie_options(title: &str) -> Value {
    json!({
        "responsive": true,
        "plugins": {
            "legend": {"position": "right"},
            "title": {"display": true, "text": title}
        }
    })
}

/// Scatter charts name their axes after the plotted columns.
pub(crate) fn scatter_options(title: &str, x: &str, y: &str) -> Value {
    let mut options = base_options(title);
    options["scales"] = json!({
        "x": {"title": {"display": true, "text": x}},
        "y": {"title": {"display": true, "text": y}}
    });
    options
}

/// Capitalize the first letter of every word, lowercasing the rest.
///
/// A word starts after any non-alphabetic character, so `unit_price`
/// becomes `Unit_Price`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}
