//! Dashboard summary
//!
//! Evaluates a [`DashboardSpec`] against a loaded table: headline cards with
//! formatted figures and chart panels as Plotly figure JSON.

use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;

use super::{Accent, CardSpec, ChartKind, ChartSpec, DashboardKind, DashboardSpec, MetricExpr, SeriesSpec};
use crate::aggregate::{self, AggregateError, AggregateResult, GroupSort, GroupSpec};
use crate::table::{RecordTable, Value};

/// Display text of a card whose value cannot be computed
pub const UNAVAILABLE: &str = "n/a";

/// A computed headline figure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub label: String,
    /// `None` when the metric is undefined (empty column, zero denominator)
    pub value: Option<f64>,
    pub display: String,
    pub accent: Accent,
}

/// A computed chart panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub width: u8,
    /// Plotly figure: `{ "data": [...], "layout": {...} }`
    pub figure: serde_json::Value,
}

/// Everything the page shows, derived from one snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub kind: DashboardKind,
    pub title: String,
    pub row_count: usize,
    pub cards: Vec<MetricCard>,
    pub charts: Vec<Chart>,
}

/// Compute cards and charts for `spec` over `table`.
///
/// A zero denominator in a card yields an `n/a` card instead of an error;
/// structural problems (unknown or non-numeric columns) are returned.
pub fn build_summary(spec: &DashboardSpec, table: &RecordTable) -> AggregateResult<DashboardSummary> {
    let cards = spec
        .cards
        .iter()
        .map(|card| build_card(card, table))
        .collect::<AggregateResult<Vec<_>>>()?;

    let charts = spec
        .charts
        .iter()
        .map(|chart| build_chart(chart, table))
        .collect::<AggregateResult<Vec<_>>>()?;

    Ok(DashboardSummary {
        kind: spec.kind,
        title: spec.title.clone(),
        row_count: table.len(),
        cards,
        charts,
    })
}

fn evaluate(expr: &MetricExpr, table: &RecordTable) -> AggregateResult<Option<f64>> {
    match expr {
        MetricExpr::Count => Ok(Some(aggregate::count(table) as f64)),
        MetricExpr::Sum(column) => aggregate::sum(table, column).map(Some),
        MetricExpr::Mean(column) => aggregate::mean(table, column),
        MetricExpr::Ratio { num, den } => aggregate::column_ratio(table, num, den).map(Some),
        MetricExpr::Percentage { num, den } => {
            aggregate::column_percentage(table, num, den).map(Some)
        }
    }
}

fn build_card(card: &CardSpec, table: &RecordTable) -> AggregateResult<MetricCard> {
    let value = match evaluate(&card.expr, table) {
        Ok(value) => value,
        Err(AggregateError::DivisionByZero { expression }) => {
            tracing::warn!(
                card = %card.label,
                expression = %expression,
                "Denominator is zero, showing placeholder"
            );
            None
        }
        Err(e) => return Err(e),
    };

    let display = value
        .map(|v| card.format.apply(v))
        .unwrap_or_else(|| UNAVAILABLE.to_string());

    Ok(MetricCard {
        label: card.label.clone(),
        value,
        display,
        accent: card.accent,
    })
}

fn build_chart(chart: &ChartSpec, table: &RecordTable) -> AggregateResult<Chart> {
    let title = chart.title.as_str();

    let figure = match &chart.kind {
        ChartKind::Histogram { column, bins } => {
            let bins = aggregate::histogram(table, column, *bins)?;
            let x: Vec<f64> = bins.iter().map(|b| b.midpoint()).collect();
            let widths: Vec<f64> = bins.iter().map(|b| b.end - b.start).collect();
            let y: Vec<usize> = bins.iter().map(|b| b.count).collect();
            json!({
                "data": [{ "type": "bar", "name": column, "x": x, "y": y, "width": widths }],
                "layout": { "title": title, "bargap": 0.05, "xaxis": { "title": column }, "yaxis": { "title": "count" } }
            })
        }
        ChartKind::Bar { group } => {
            let (labels, values, column) = grouped_series(table, group)?;
            json!({
                "data": [{ "type": "bar", "name": column, "x": labels, "y": values }],
                "layout": { "title": title, "yaxis": { "title": column } }
            })
        }
        ChartKind::Pie { group } => {
            let (labels, values, _) = grouped_series(table, group)?;
            json!({
                "data": [{ "type": "pie", "labels": labels, "values": values }],
                "layout": { "title": title }
            })
        }
        ChartKind::PieCounts { column } => {
            let counts = aggregate::value_counts(table, column)?;
            let labels: Vec<String> = counts.iter().map(|(v, _)| v.to_key_string()).collect();
            let values: Vec<usize> = counts.iter().map(|(_, n)| *n).collect();
            json!({
                "data": [{ "type": "pie", "labels": labels, "values": values }],
                "layout": { "title": title }
            })
        }
        ChartKind::Lines { x, series } => {
            let traces = row_traces(table, x, series, |name, xs, ys| {
                json!({ "type": "scatter", "mode": "lines+markers", "name": name, "x": xs, "y": ys })
            })?;
            json!({ "data": traces, "layout": { "title": title } })
        }
        ChartKind::GroupedBars { x, series } => {
            let traces = row_traces(table, x, series, |name, xs, ys| {
                json!({ "type": "bar", "name": name, "x": xs, "y": ys })
            })?;
            json!({ "data": traces, "layout": { "title": title, "barmode": "group" } })
        }
        ChartKind::LinesBy { x, value, color_by } => {
            let traces = color_traces(table, x, value, color_by)?;
            json!({
                "data": traces,
                "layout": { "title": title, "xaxis": { "title": x }, "yaxis": { "title": value } }
            })
        }
    };

    Ok(Chart {
        title: chart.title.clone(),
        width: chart.width,
        figure,
    })
}

/// Group labels and the first output column of a grouped reduction
fn grouped_series(
    table: &RecordTable,
    group: &GroupSpec,
) -> AggregateResult<(Vec<String>, Vec<Option<f64>>, String)> {
    let grouped = aggregate::group_by(table, group)?;
    let column = grouped
        .columns
        .first()
        .cloned()
        .ok_or_else(|| AggregateError::InvalidSpec("no value column to plot".to_string()))?;

    let labels = grouped.rows.iter().map(|r| r.label()).collect();
    let values = grouped.column(&column);
    Ok((labels, values, column))
}

/// One trace per series, x and y taken row by row
fn row_traces<F>(
    table: &RecordTable,
    x: &str,
    series: &[SeriesSpec],
    make_trace: F,
) -> AggregateResult<Vec<serde_json::Value>>
where
    F: Fn(&str, &[&Value], &[Option<f64>]) -> serde_json::Value,
{
    let xs: Vec<&Value> = table
        .values(x)
        .ok_or_else(|| AggregateError::UnknownColumn(x.to_string()))?
        .collect();

    series
        .iter()
        .map(|s| {
            let ys = aggregate::numeric_values(table, &s.column)?;
            Ok(make_trace(&s.name, &xs, &ys))
        })
        .collect()
}

/// `sum(value)` by `(x, color_by)` in key order, split into one trace per color value
fn color_traces(
    table: &RecordTable,
    x: &str,
    value: &str,
    color_by: &str,
) -> AggregateResult<Vec<serde_json::Value>> {
    let spec = GroupSpec::by(&[x, color_by])
        .sum(&[value])
        .sorted(GroupSort::KeyAscending);
    let grouped = aggregate::group_by(table, &spec)?;

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut traces: Vec<(String, Vec<Value>, Vec<Option<f64>>)> = Vec::new();

    for row in &grouped.rows {
        let color = row.keys[1].to_key_string();
        let slot = match index.get(&color) {
            Some(&slot) => slot,
            None => {
                traces.push((color.clone(), Vec::new(), Vec::new()));
                index.insert(color, traces.len() - 1);
                traces.len() - 1
            }
        };
        traces[slot].1.push(row.keys[0].clone());
        traces[slot].2.push(row.get(value));
    }

    Ok(traces
        .into_iter()
        .map(|(name, xs, ys)| {
            json!({ "type": "scatter", "mode": "lines", "name": name, "x": xs, "y": ys })
        })
        .collect())
}
