//! Sales dashboard

use super::{Accent, CardSpec, ChartKind, ChartSpec, DashboardKind, DashboardSpec, Format, MetricExpr};
use crate::aggregate::GroupSpec;
use crate::table::{ColumnSchema, TableSchema};

pub const OBJECT_KEY: &str = "dashboards/sales_data.csv";

pub fn spec() -> DashboardSpec {
    DashboardSpec {
        kind: DashboardKind::Sales,
        title: "Sales Performance Dashboard".to_string(),
        brand: "Analytics Platform - Sales".to_string(),
        page_title: "Sales Dashboard".to_string(),
        navbar_accent: Accent::Success,
        object_key: OBJECT_KEY.to_string(),
        schema: TableSchema::new(vec![
            ColumnSchema::date("date"),
            ColumnSchema::text("region"),
            ColumnSchema::text("product"),
            ColumnSchema::number("revenue"),
            ColumnSchema::number("units_sold"),
        ]),
        cards: vec![
            CardSpec::new(
                "Total Revenue",
                MetricExpr::sum("revenue"),
                Format::Currency { decimals: 0 },
                Accent::Success,
            ),
            CardSpec::new(
                "Total Units Sold",
                MetricExpr::sum("units_sold"),
                Format::Integer,
                Accent::Primary,
            ),
            CardSpec::new(
                "Avg Revenue/Unit",
                MetricExpr::ratio("revenue", "units_sold"),
                Format::Currency { decimals: 2 },
                Accent::Info,
            ),
        ],
        charts: vec![
            ChartSpec::new(
                "Revenue Over Time by Region",
                12,
                ChartKind::LinesBy {
                    x: "date".to_string(),
                    value: "revenue".to_string(),
                    color_by: "region".to_string(),
                },
            ),
            ChartSpec::new(
                "Total Revenue by Product",
                6,
                ChartKind::Bar {
                    group: GroupSpec::by(&["product"]).sum(&["revenue"]),
                },
            ),
            ChartSpec::new(
                "Revenue Distribution by Region",
                6,
                ChartKind::Pie {
                    group: GroupSpec::by(&["region"]).sum(&["revenue"]),
                },
            ),
        ],
    }
}
