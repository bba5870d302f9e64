//! HTML Presenter
//!
//! Renders a [`DashboardSummary`] as a single self-contained page: a navbar,
//! a row of headline cards and the chart panels laid out on a 12-column
//! grid. Charts are drawn client-side by Plotly from the embedded figure JSON.

use std::fmt::Write;

use crate::dashboards::{Chart, DashboardSpec, DashboardSummary, MetricCard};

const BOOTSTRAP_CSS: &str = "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css";
const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Render the full dashboard page
pub fn render_page(spec: &DashboardSpec, summary: &DashboardSummary) -> String {
    let mut body = String::new();
    body.push_str(&render_navbar(spec));
    body.push_str("<div class=\"container-fluid\">");
    let _ = write!(body, "<h3 class=\"mb-4\">{}</h3>", escape_html(&summary.title));
    body.push_str(&render_cards(&summary.cards));
    body.push_str(&render_charts(&summary.charts));
    body.push_str("</div>");

    format!(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
<title>{title}</title>\
<link rel=\"stylesheet\" href=\"{css}\">\
<script src=\"{plotly}\" charset=\"utf-8\"></script>\
</head><body>{body}</body></html>",
        title = escape_html(&spec.page_title),
        css = BOOTSTRAP_CSS,
        plotly = PLOTLY_JS,
        body = body,
    )
}

fn render_navbar(spec: &DashboardSpec) -> String {
    format!(
        "<nav class=\"navbar navbar-expand navbar-dark bg-{accent} mb-4\">\
<div class=\"container-fluid\">\
<a class=\"navbar-brand\" href=\"/\">{brand}</a>\
<ul class=\"navbar-nav ms-auto\"><li class=\"nav-item\">\
<a class=\"nav-link active\" href=\"/\">{page}</a></li></ul>\
</div></nav>",
        accent = spec.navbar_accent.as_str(),
        brand = escape_html(&spec.brand),
        page = escape_html(&spec.page_title),
    )
}

fn render_cards(cards: &[MetricCard]) -> String {
    if cards.is_empty() {
        return String::new();
    }
    let width = (12 / cards.len()).max(1);

    let mut html = String::from("<div class=\"row mb-4\">");
    for card in cards {
        let _ = write!(
            html,
            "<div class=\"col-{width}\"><div class=\"card\"><div class=\"card-body\">\
<h5 class=\"card-title\">{label}</h5>\
<h3 class=\"text-{accent}\">{display}</h3>\
</div></div></div>",
            width = width,
            label = escape_html(&card.label),
            accent = card.accent.as_str(),
            display = escape_html(&card.display),
        );
    }
    html.push_str("</div>");
    html
}

/// Pack panels into rows of at most 12 grid columns
fn layout_rows(charts: &[Chart]) -> Vec<&[Chart]> {
    let mut rows = Vec::new();
    let mut start = 0;
    let mut used = 0u32;

    for (i, chart) in charts.iter().enumerate() {
        let width = u32::from(chart.width);
        if used + width > 12 && i > start {
            rows.push(&charts[start..i]);
            start = i;
            used = 0;
        }
        used += width;
    }
    if start < charts.len() {
        rows.push(&charts[start..]);
    }
    rows
}

fn render_charts(charts: &[Chart]) -> String {
    let mut html = String::new();
    let mut index = 0;

    for row in layout_rows(charts) {
        html.push_str("<div class=\"row mb-4\">");
        for chart in row {
            let _ = write!(
                html,
                "<div class=\"col-{width}\"><div id=\"chart-{index}\" class=\"dashboard-chart\"></div>\
<script>Plotly.newPlot(\"chart-{index}\", {figure}.data, {figure}.layout, {{responsive: true}});</script>\
</div>",
                width = chart.width,
                index = index,
                figure = script_json(&chart.figure),
            );
            index += 1;
        }
        html.push_str("</div>");
    }
    html
}

/// Serialize JSON for inclusion inside a `<script>` element
pub fn script_json(value: &serde_json::Value) -> String {
    // serde_json output cannot fail for a Value; "null" keeps the page loadable regardless
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

/// Escape text for HTML element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
