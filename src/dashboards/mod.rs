//! Dashboard Descriptors
//!
//! Each dashboard variant is data, not code: a [`DashboardSpec`] naming the
//! snapshot object, its column schema, the headline cards and the charts.
//! [`build_summary`] turns any spec plus a loaded table into the figures the
//! page shows.
//!
//! ## Variants
//!
//! - [`customer`]: customer analytics (age, spending, location, gender)
//! - [`financial`]: monthly revenue, profit and expenses against budget
//! - [`sales`]: revenue and units by date, region and product

pub mod customer;
pub mod financial;
mod format;
pub mod sales;
mod summary;

pub use format::{group_thousands, Format};
pub use summary::{build_summary, Chart, DashboardSummary, MetricCard, UNAVAILABLE};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::aggregate::GroupSpec;
use crate::table::TableSchema;

/// Which dashboard this process serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DashboardKind {
    Customer,
    Financial,
    Sales,
}

impl DashboardKind {
    pub fn all() -> &'static [DashboardKind] {
        &[
            DashboardKind::Customer,
            DashboardKind::Financial,
            DashboardKind::Sales,
        ]
    }

    /// Descriptor for this variant
    pub fn spec(&self) -> DashboardSpec {
        match self {
            DashboardKind::Customer => customer::spec(),
            DashboardKind::Financial => financial::spec(),
            DashboardKind::Sales => sales::spec(),
        }
    }
}

impl std::fmt::Display for DashboardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashboardKind::Customer => write!(f, "customer"),
            DashboardKind::Financial => write!(f, "financial"),
            DashboardKind::Sales => write!(f, "sales"),
        }
    }
}

impl FromStr for DashboardKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "customer" | "customers" | "customer-analytics" => Ok(DashboardKind::Customer),
            "financial" | "finance" | "financial-reports" => Ok(DashboardKind::Financial),
            "sales" | "sales-dashboard" => Ok(DashboardKind::Sales),
            other => Err(format!("unknown dashboard '{}'", other)),
        }
    }
}

/// Bootstrap-style accent used for navbar and card figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    Primary,
    Success,
    Info,
    Warning,
    Danger,
}

impl Accent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Accent::Primary => "primary",
            Accent::Success => "success",
            Accent::Info => "info",
            Accent::Warning => "warning",
            Accent::Danger => "danger",
        }
    }
}

/// A scalar computed over the whole table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricExpr {
    /// Number of rows
    Count,
    Sum(String),
    Mean(String),
    /// `sum(num) / sum(den)`
    Ratio { num: String, den: String },
    /// `sum(num) / sum(den) * 100`
    Percentage { num: String, den: String },
}

impl MetricExpr {
    pub fn sum(column: &str) -> Self {
        MetricExpr::Sum(column.to_string())
    }

    pub fn mean(column: &str) -> Self {
        MetricExpr::Mean(column.to_string())
    }

    pub fn ratio(num: &str, den: &str) -> Self {
        MetricExpr::Ratio {
            num: num.to_string(),
            den: den.to_string(),
        }
    }

    pub fn percentage(num: &str, den: &str) -> Self {
        MetricExpr::Percentage {
            num: num.to_string(),
            den: den.to_string(),
        }
    }
}

/// A headline card
#[derive(Debug, Clone, PartialEq)]
pub struct CardSpec {
    pub label: String,
    pub expr: MetricExpr,
    pub format: Format,
    pub accent: Accent,
}

impl CardSpec {
    pub fn new(label: &str, expr: MetricExpr, format: Format, accent: Accent) -> Self {
        Self {
            label: label.to_string(),
            expr,
            format,
            accent,
        }
    }
}

/// A named column plotted as one series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSpec {
    pub column: String,
    pub name: String,
}

impl SeriesSpec {
    pub fn new(column: &str, name: &str) -> Self {
        Self {
            column: column.to_string(),
            name: name.to_string(),
        }
    }
}

/// What a chart panel plots
#[derive(Debug, Clone, PartialEq)]
pub enum ChartKind {
    /// Equal-width histogram of a numeric column
    Histogram { column: String, bins: usize },
    /// Bars of the first value column of a grouped reduction
    Bar { group: GroupSpec },
    /// Pie slices of the first value column of a grouped reduction
    Pie { group: GroupSpec },
    /// Pie of value occurrences in a column
    PieCounts { column: String },
    /// Row-order lines, one per series
    Lines { x: String, series: Vec<SeriesSpec> },
    /// `sum(value)` grouped by `(x, color_by)`, one line per `color_by` value
    LinesBy {
        x: String,
        value: String,
        color_by: String,
    },
    /// Row-order bars side by side, one per series
    GroupedBars { x: String, series: Vec<SeriesSpec> },
}

/// A chart panel
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    /// Grid width out of 12
    pub width: u8,
    pub kind: ChartKind,
}

impl ChartSpec {
    pub fn new(title: &str, width: u8, kind: ChartKind) -> Self {
        Self {
            title: title.to_string(),
            width: width.clamp(1, 12),
            kind,
        }
    }
}

/// Full descriptor of one dashboard variant
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSpec {
    pub kind: DashboardKind,
    /// Page heading
    pub title: String,
    /// Navbar brand
    pub brand: String,
    /// Browser tab title and nav link label
    pub page_title: String,
    pub navbar_accent: Accent,
    /// Object key of the snapshot within the bucket
    pub object_key: String,
    pub schema: TableSchema,
    pub cards: Vec<CardSpec>,
    pub charts: Vec<ChartSpec>,
}

impl DashboardSpec {
    /// Builder method: read the snapshot from a different key
    pub fn with_object_key(mut self, key: impl Into<String>) -> Self {
        self.object_key = key.into();
        self
    }
}
