//! Scalar metrics and distributions
//!
//! Whole-table reductions used for headline figures, plus value counts and
//! histograms for distribution charts.

use serde::Serialize;
use std::collections::HashMap;

use super::error::{AggregateError, AggregateResult};
use super::grouping::numeric_column;
use crate::table::{RecordTable, Value};

/// Sum of the present values of a numeric column
pub fn sum(table: &RecordTable, column: &str) -> AggregateResult<f64> {
    Ok(present(table, column)?.iter().sum())
}

/// Mean of the present values, `None` when the column has none
pub fn mean(table: &RecordTable, column: &str) -> AggregateResult<Option<f64>> {
    let values = present(table, column)?;
    if values.is_empty() {
        return Ok(None);
    }
    Ok(Some(values.iter().sum::<f64>() / values.len() as f64))
}

/// Number of rows
pub fn count(table: &RecordTable) -> usize {
    table.len()
}

/// `numerator / denominator`, refusing a zero denominator
pub fn ratio(numerator: f64, denominator: f64) -> AggregateResult<f64> {
    if denominator == 0.0 {
        return Err(AggregateError::DivisionByZero {
            expression: format!("{} / 0", numerator),
        });
    }
    Ok(numerator / denominator)
}

/// `sum(numerator) / sum(denominator)` over two numeric columns
pub fn column_ratio(table: &RecordTable, numerator: &str, denominator: &str) -> AggregateResult<f64> {
    let num = sum(table, numerator)?;
    let den = sum(table, denominator)?;
    ratio(num, den).map_err(|_| AggregateError::DivisionByZero {
        expression: format!("sum({}) / sum({})", numerator, denominator),
    })
}

/// `sum(numerator) / sum(denominator) * 100`
pub fn column_percentage(table: &RecordTable, numerator: &str, denominator: &str) -> AggregateResult<f64> {
    column_ratio(table, numerator, denominator).map(|r| r * 100.0)
}

/// Row-order values of a numeric column, `None` for missing cells
pub fn numeric_values(table: &RecordTable, column: &str) -> AggregateResult<Vec<Option<f64>>> {
    let idx = numeric_column(table, column)?;
    Ok(table.rows().iter().map(|row| row[idx].as_f64()).collect())
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Occurrences of each distinct value, in first-seen order. Missing cells are skipped.
pub fn value_counts(table: &RecordTable, column: &str) -> AggregateResult<Vec<(Value, usize)>> {
    let values = table
        .values(column)
        .ok_or_else(|| AggregateError::UnknownColumn(column.to_string()))?;

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(Value, usize)> = Vec::new();

    for value in values.filter(|v| !v.is_missing()) {
        match index.get(&value.to_key_string()) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(value.to_key_string(), counts.len());
                counts.push((value.clone(), 1));
            }
        }
    }

    Ok(counts)
}

/// One equal-width histogram bin. `end` is exclusive except for the last bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// Equal-width histogram of a numeric column between its min and max
pub fn histogram(table: &RecordTable, column: &str, bins: usize) -> AggregateResult<Vec<HistogramBin>> {
    if bins == 0 {
        return Err(AggregateError::InvalidSpec(
            "histogram needs at least one bin".to_string(),
        ));
    }

    let values = present(table, column)?;
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    // A constant column gets one unit-wide bin centred on the value
    if min == max {
        return Ok(vec![HistogramBin {
            start: min - 0.5,
            end: max + 0.5,
            count: values.len(),
        }]);
    }

    let width = (max - min) / bins as f64;
    let mut result: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for v in values {
        let slot = (((v - min) / width) as usize).min(bins - 1);
        result[slot].count += 1;
    }

    Ok(result)
}

fn present(table: &RecordTable, column: &str) -> AggregateResult<Vec<f64>> {
    let idx = numeric_column(table, column)?;
    Ok(table.rows().iter().filter_map(|row| row[idx].as_f64()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{parse_str, ColumnSchema, LoadOptions, TableSchema};

    fn financial(data: &str) -> RecordTable {
        let schema = TableSchema::new(vec![
            ColumnSchema::text("month"),
            ColumnSchema::number("revenue"),
            ColumnSchema::number("profit"),
        ]);
        parse_str(data, &schema, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_profit_margin() {
        let table = financial("month,revenue,profit\nJan,400,60\nFeb,600,90\n");

        assert_eq!(sum(&table, "revenue").unwrap(), 1000.0);
        assert_eq!(sum(&table, "profit").unwrap(), 150.0);

        let margin = column_percentage(&table, "profit", "revenue").unwrap();
        assert_eq!(round_to(margin, 1), 15.0);
    }

    #[test]
    fn test_zero_denominator_is_error() {
        let table = financial("month,revenue,profit\nJan,0,60\nFeb,0,90\n");

        let err = column_ratio(&table, "profit", "revenue").unwrap_err();
        assert_eq!(
            err,
            AggregateError::DivisionByZero {
                expression: "sum(profit) / sum(revenue)".into()
            }
        );
        assert!(ratio(1.0, 0.0).is_err());
        assert!(ratio(0.0, -0.0).is_err());
    }

    #[test]
    fn test_mean_and_count() {
        let table = financial("month,revenue,profit\nJan,10,\nFeb,20,\n");

        assert_eq!(count(&table), 2);
        assert_eq!(mean(&table, "revenue").unwrap(), Some(15.0));
        assert_eq!(mean(&table, "profit").unwrap(), None);
        assert_eq!(sum(&table, "profit").unwrap(), 0.0);
    }

    #[test]
    fn test_scalar_on_text_column_fails() {
        let table = financial("month,revenue,profit\nJan,10,1\n");
        assert!(matches!(sum(&table, "month"), Err(AggregateError::NotNumeric { .. })));
        assert!(matches!(mean(&table, "cost"), Err(AggregateError::UnknownColumn(_))));
    }

    #[test]
    fn test_numeric_values_keep_row_order() {
        let table = financial("month,revenue,profit\nJan,10,\nFeb,,3\n");
        assert_eq!(numeric_values(&table, "revenue").unwrap(), vec![Some(10.0), None]);
        assert!(numeric_values(&table, "month").is_err());
    }

    #[test]
    fn test_value_counts_first_seen() {
        let table = financial("month,revenue,profit\nFeb,1,1\nJan,1,1\nFeb,1,1\n,1,1\n");
        let counts = value_counts(&table, "month").unwrap();

        assert_eq!(
            counts,
            vec![(Value::Text("Feb".into()), 2), (Value::Text("Jan".into()), 1)]
        );
    }

    #[test]
    fn test_histogram_bins() {
        let table = financial("month,revenue,profit\na,0,1\nb,5,1\nc,10,1\nd,10,1\n");
        let bins = histogram(&table, "revenue", 2).unwrap();

        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[1].count, 3);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);
        assert_eq!(bins[1].end, 10.0);
    }

    #[test]
    fn test_histogram_constant_column() {
        let table = financial("month,revenue,profit\na,7,1\nb,7,1\n");
        let bins = histogram(&table, "revenue", 20).unwrap();

        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[0].midpoint(), 7.0);
        assert_eq!(bins[0].end - bins[0].start, 1.0);
    }

    #[test]
    fn test_histogram_rejects_zero_bins() {
        let table = financial("month,revenue,profit\na,7,1\n");
        assert!(matches!(histogram(&table, "revenue", 0), Err(AggregateError::InvalidSpec(_))));
    }
}
