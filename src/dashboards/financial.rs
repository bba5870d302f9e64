//! Financial reports dashboard
//!
//! One row per month; charts plot actuals against budget in file order.

use super::{
    Accent, CardSpec, ChartKind, ChartSpec, DashboardKind, DashboardSpec, Format, MetricExpr,
    SeriesSpec,
};
use crate::table::{ColumnSchema, TableSchema};

pub const OBJECT_KEY: &str = "dashboards/financial_data.csv";

pub fn spec() -> DashboardSpec {
    DashboardSpec {
        kind: DashboardKind::Financial,
        title: "Financial Performance Reports".to_string(),
        brand: "Analytics Platform - Finance".to_string(),
        page_title: "Financial Reports".to_string(),
        navbar_accent: Accent::Info,
        object_key: OBJECT_KEY.to_string(),
        schema: TableSchema::new(vec![
            ColumnSchema::text("month"),
            ColumnSchema::number("revenue"),
            ColumnSchema::number("budget_revenue"),
            ColumnSchema::number("profit"),
            ColumnSchema::number("expenses"),
            ColumnSchema::number("budget_expenses"),
        ]),
        cards: vec![
            CardSpec::new(
                "Total Revenue",
                MetricExpr::sum("revenue"),
                Format::Currency { decimals: 0 },
                Accent::Success,
            ),
            CardSpec::new(
                "Total Profit",
                MetricExpr::sum("profit"),
                Format::Currency { decimals: 0 },
                Accent::Primary,
            ),
            CardSpec::new(
                "Profit Margin",
                MetricExpr::percentage("profit", "revenue"),
                Format::Percent { decimals: 1 },
                Accent::Info,
            ),
        ],
        charts: vec![
            ChartSpec::new(
                "Revenue: Actual vs Budget",
                12,
                ChartKind::Lines {
                    x: "month".to_string(),
                    series: vec![
                        SeriesSpec::new("revenue", "Actual Revenue"),
                        SeriesSpec::new("budget_revenue", "Budget Revenue"),
                    ],
                },
            ),
            ChartSpec::new(
                "Monthly Profit Trend",
                6,
                ChartKind::Lines {
                    x: "month".to_string(),
                    series: vec![SeriesSpec::new("profit", "Profit")],
                },
            ),
            ChartSpec::new(
                "Expenses: Actual vs Budget",
                6,
                ChartKind::GroupedBars {
                    x: "month".to_string(),
                    series: vec![
                        SeriesSpec::new("expenses", "Actual Expenses"),
                        SeriesSpec::new("budget_expenses", "Budget Expenses"),
                    ],
                },
            ),
        ],
    }
}
