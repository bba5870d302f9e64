//! Customer analytics dashboard

use super::{Accent, CardSpec, ChartKind, ChartSpec, DashboardKind, DashboardSpec, Format, MetricExpr};
use crate::aggregate::GroupSpec;
use crate::table::{ColumnSchema, TableSchema};

pub const OBJECT_KEY: &str = "dashboards/customer_data.csv";

pub fn spec() -> DashboardSpec {
    DashboardSpec {
        kind: DashboardKind::Customer,
        title: "Customer Analytics Dashboard".to_string(),
        brand: "Analytics Platform - Customers".to_string(),
        page_title: "Customer Analytics".to_string(),
        navbar_accent: Accent::Primary,
        object_key: OBJECT_KEY.to_string(),
        schema: TableSchema::new(vec![
            ColumnSchema::number("age"),
            ColumnSchema::number("total_spent"),
            ColumnSchema::text("location"),
            ColumnSchema::text("gender"),
            ColumnSchema::date("signup_date"),
        ]),
        cards: vec![
            CardSpec::new("Total Customers", MetricExpr::Count, Format::Integer, Accent::Primary),
            CardSpec::new(
                "Average Spending",
                MetricExpr::mean("total_spent"),
                Format::Currency { decimals: 2 },
                Accent::Success,
            ),
            CardSpec::new(
                "Average Age",
                MetricExpr::mean("age"),
                Format::Decimal {
                    decimals: 1,
                    suffix: "years".to_string(),
                },
                Accent::Info,
            ),
        ],
        charts: vec![
            ChartSpec::new(
                "Customer Age Distribution",
                6,
                ChartKind::Histogram {
                    column: "age".to_string(),
                    bins: 20,
                },
            ),
            ChartSpec::new(
                "Customer Gender Distribution",
                6,
                ChartKind::PieCounts {
                    column: "gender".to_string(),
                },
            ),
            ChartSpec::new(
                "Total Spending by Location",
                12,
                ChartKind::Bar {
                    group: GroupSpec::by(&["location"]).sum(&["total_spent"]),
                },
            ),
        ],
    }
}
