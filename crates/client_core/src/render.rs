//! Pure view-model derivation for an analysis payload.

use serde_json::Value;
use shared::domain::{AnalysisResult, PayloadMap};

use crate::error::RenderError;

pub const FEATURE_IMPORTANCE_TITLE: &str = "Feature Importance";
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledField {
    pub label: &'static str,
    pub value: String,
}

impl LabeledField {
    pub fn display_value(&self) -> String {
        capitalize_first(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryView {
    pub problem_type: LabeledField,
    pub domain: LabeledField,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricCard {
    pub name: String,
    pub value: f64,
    pub formatted: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarChartSeries {
    pub title: &'static str,
    pub categories: Vec<String>,
    pub values: Vec<f64>,
    pub y_starts_at_zero: bool,
    pub show_legend: bool,
}

impl BarChartSeries {
    pub fn bars(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.categories
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotImage {
    pub key: String,
    pub label: String,
    pub src: String,
}

impl PlotImage {
    pub fn base64_payload(&self) -> &str {
        self.src
            .strip_prefix(PNG_DATA_URI_PREFIX)
            .unwrap_or(&self.src)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub summary: SummaryView,
    pub metrics: Vec<MetricCard>,
    pub feature_importance: BarChartSeries,
    pub plots: Vec<PlotImage>,
}

pub fn render_report(result: &AnalysisResult) -> Result<ReportView, RenderError> {
    Ok(ReportView {
        summary: render_summary(result),
        metrics: render_metrics(&result.metrics)?,
        feature_importance: render_feature_importance(&result.feature_importances)?,
        plots: render_plots(&result.plots)?,
    })
}

pub fn render_summary(result: &AnalysisResult) -> SummaryView {
    SummaryView {
        problem_type: LabeledField {
            label: "Problem type",
            value: result.problem_type.clone(),
        },
        domain: LabeledField {
            label: "Domain",
            value: result.domain.clone(),
        },
    }
}

pub fn render_metrics(metrics: &PayloadMap) -> Result<Vec<MetricCard>, RenderError> {
    metrics
        .iter()
        .map(|(name, raw)| {
            let value = raw.as_f64().ok_or_else(|| RenderError::NonNumericMetric {
                name: name.clone(),
                found: json_kind(raw),
            })?;
            Ok(MetricCard {
                name: name.clone(),
                value,
                formatted: format_metric_value(value),
            })
        })
        .collect()
}

pub fn render_feature_importance(
    importances: &PayloadMap,
) -> Result<BarChartSeries, RenderError> {
    let mut categories = Vec::with_capacity(importances.len());
    let mut values = Vec::with_capacity(importances.len());
    for (name, raw) in importances {
        let value = raw
            .as_f64()
            .ok_or_else(|| RenderError::NonNumericImportance {
                name: name.clone(),
                found: json_kind(raw),
            })?;
        categories.push(name.clone());
        values.push(value);
    }

    Ok(BarChartSeries {
        title: FEATURE_IMPORTANCE_TITLE,
        categories,
        values,
        y_starts_at_zero: true,
        show_legend: false,
    })
}

pub fn render_plots(plots: &PayloadMap) -> Result<Vec<PlotImage>, RenderError> {
    plots
        .iter()
        .map(|(key, raw)| {
            let Value::String(payload) = raw else {
                return Err(RenderError::InvalidPlotPayload {
                    name: key.clone(),
                    found: json_kind(raw),
                });
            };
            Ok(PlotImage {
                key: key.clone(),
                label: plot_label(key),
                src: format!("{PNG_DATA_URI_PREFIX}{payload}"),
            })
        })
        .collect()
}

/// Fixed-point with four decimals: `0.5` -> `0.5000`, `-3` -> `-3.0000`.
/// Negative zero prints unsigned.
pub fn format_metric_value(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{value:.4}")
}

pub fn plot_label(key: &str) -> String {
    capitalize_first(&key.replace('_', " "))
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
