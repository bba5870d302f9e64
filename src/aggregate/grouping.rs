//! Grouped reductions
//!
//! Partitions a record table by one or more key columns and reduces the
//! value columns of each group.
//!
//! ```text
//! rows → key of each row → group (first-seen order) → reduce → optional sort
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::error::{AggregateError, AggregateResult};
use crate::table::{ColumnType, RecordTable, Value};

/// Name of the value produced by [`Reduction::Count`]
pub const COUNT_COLUMN: &str = "count";

/// Reduction applied to each group's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduction {
    Sum,
    Mean,
    Count,
}

impl Reduction {
    /// Apply the reduction to the present values of one group.
    ///
    /// `Sum` of nothing is zero; `Mean` of nothing is undefined.
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        match self {
            Self::Sum => Some(values.iter().sum()),
            Self::Mean => {
                if values.is_empty() {
                    None
                } else {
                    Some(values.iter().sum::<f64>() / values.len() as f64)
                }
            }
            Self::Count => Some(values.len() as f64),
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sum" => Some(Self::Sum),
            "mean" | "avg" | "average" => Some(Self::Mean),
            "count" => Some(Self::Count),
            _ => None,
        }
    }
}

impl std::fmt::Display for Reduction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sum => write!(f, "sum"),
            Self::Mean => write!(f, "mean"),
            Self::Count => write!(f, "count"),
        }
    }
}

/// Ordering of grouped output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GroupSort {
    /// Order in which each key first appears in the table
    #[default]
    FirstSeen,
    /// Ascending by key values, left to right
    KeyAscending,
    /// Descending by a reduced value column
    ValueDescending(String),
}

/// Grouping specification: key columns, value columns and a reduction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    pub keys: Vec<String>,
    pub values: Vec<String>,
    pub reduction: Reduction,
    pub sort: GroupSort,
}

impl GroupSpec {
    /// Start a specification grouped by `keys`, counting rows
    pub fn by(keys: &[&str]) -> Self {
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            values: Vec::new(),
            reduction: Reduction::Count,
            sort: GroupSort::FirstSeen,
        }
    }

    pub fn sum(self, values: &[&str]) -> Self {
        self.reduce(Reduction::Sum, values)
    }

    pub fn mean(self, values: &[&str]) -> Self {
        self.reduce(Reduction::Mean, values)
    }

    pub fn count(self) -> Self {
        self.reduce(Reduction::Count, &[])
    }

    pub fn reduce(mut self, reduction: Reduction, values: &[&str]) -> Self {
        self.reduction = reduction;
        self.values = values.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn sorted(mut self, sort: GroupSort) -> Self {
        self.sort = sort;
        self
    }

    /// Names of the value columns in the output rows
    pub fn output_columns(&self) -> Vec<String> {
        match self.reduction {
            Reduction::Count => vec![COUNT_COLUMN.to_string()],
            _ => self.values.clone(),
        }
    }
}

/// One output row of a grouped reduction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    /// Key values, one per key column
    pub keys: Vec<Value>,
    /// Reduced values in output-column order. A mean over no values is omitted.
    pub values: Vec<(String, f64)>,
    /// Number of table rows folded into this group
    pub row_count: usize,
}

impl GroupRow {
    /// Get a reduced value by column name
    pub fn get(&self, column: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| *v)
    }

    /// Keys joined for display ("North / Widget")
    pub fn label(&self) -> String {
        self.keys
            .iter()
            .map(Value::to_key_string)
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

/// Result of a grouped reduction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedTable {
    pub keys: Vec<String>,
    pub columns: Vec<String>,
    pub reduction: Reduction,
    pub rows: Vec<GroupRow>,
}

impl GroupedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one output column in row order, `None` where omitted
    pub fn column(&self, name: &str) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.get(name)).collect()
    }

    /// Total number of source rows across all groups
    pub fn total_rows(&self) -> usize {
        self.rows.iter().map(|r| r.row_count).sum()
    }
}

/// Partition `table` by the spec's keys and reduce each group
pub fn group_by(table: &RecordTable, spec: &GroupSpec) -> AggregateResult<GroupedTable> {
    let (key_idx, value_idx) = resolve(table, spec)?;

    // Groups in first-seen order, indexed by their key strings
    let mut index: HashMap<Vec<String>, usize> = HashMap::new();
    let mut groups: Vec<(Vec<Value>, Vec<Vec<f64>>, usize)> = Vec::new();

    for row in table.rows() {
        let key_strings: Vec<String> = key_idx.iter().map(|&i| row[i].to_key_string()).collect();

        let slot = match index.get(&key_strings) {
            Some(&slot) => slot,
            None => {
                let keys = key_idx.iter().map(|&i| row[i].clone()).collect();
                groups.push((keys, vec![Vec::new(); value_idx.len()], 0));
                index.insert(key_strings, groups.len() - 1);
                groups.len() - 1
            }
        };

        let (_, buckets, count) = &mut groups[slot];
        *count += 1;
        for (bucket, &i) in buckets.iter_mut().zip(&value_idx) {
            if let Some(v) = row[i].as_f64() {
                bucket.push(v);
            }
        }
    }

    let mut rows: Vec<GroupRow> = groups
        .into_iter()
        .map(|(keys, buckets, row_count)| {
            let values = match spec.reduction {
                Reduction::Count => vec![(COUNT_COLUMN.to_string(), row_count as f64)],
                reduction => spec
                    .values
                    .iter()
                    .zip(&buckets)
                    .filter_map(|(name, vals)| reduction.apply(vals).map(|v| (name.clone(), v)))
                    .collect(),
            };
            GroupRow {
                keys,
                values,
                row_count,
            }
        })
        .collect();

    match &spec.sort {
        GroupSort::FirstSeen => {}
        GroupSort::KeyAscending => rows.sort_by(|a, b| {
            a.keys
                .iter()
                .zip(&b.keys)
                .map(|(x, y)| x.sort_cmp(y))
                .find(|o| o.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        GroupSort::ValueDescending(column) => rows.sort_by(|a, b| {
            let x = a.get(column).unwrap_or(f64::NEG_INFINITY);
            let y = b.get(column).unwrap_or(f64::NEG_INFINITY);
            y.total_cmp(&x)
        }),
    }

    Ok(GroupedTable {
        keys: spec.keys.clone(),
        columns: spec.output_columns(),
        reduction: spec.reduction,
        rows,
    })
}

/// Validate the spec against the table and resolve column positions
fn resolve(table: &RecordTable, spec: &GroupSpec) -> AggregateResult<(Vec<usize>, Vec<usize>)> {
    if spec.keys.is_empty() {
        return Err(AggregateError::InvalidSpec(
            "at least one key column is required".to_string(),
        ));
    }
    if spec.reduction != Reduction::Count && spec.values.is_empty() {
        return Err(AggregateError::InvalidSpec(format!(
            "{} needs at least one value column",
            spec.reduction
        )));
    }

    let key_idx = spec
        .keys
        .iter()
        .map(|k| {
            table
                .column_index(k)
                .ok_or_else(|| AggregateError::UnknownColumn(k.clone()))
        })
        .collect::<AggregateResult<Vec<_>>>()?;

    let value_columns: &[String] = if spec.reduction == Reduction::Count {
        &[]
    } else {
        &spec.values
    };

    let value_idx = value_columns
        .iter()
        .map(|name| numeric_column(table, name))
        .collect::<AggregateResult<Vec<_>>>()?;

    if let GroupSort::ValueDescending(column) = &spec.sort {
        if !spec.output_columns().contains(column) {
            return Err(AggregateError::InvalidSpec(format!(
                "cannot sort by '{}', not an output column",
                column
            )));
        }
    }

    Ok((key_idx, value_idx))
}

/// Position of a numeric column
pub(crate) fn numeric_column(table: &RecordTable, name: &str) -> AggregateResult<usize> {
    let (idx, column) = table
        .column(name)
        .ok_or_else(|| AggregateError::UnknownColumn(name.to_string()))?;

    if column.column_type != ColumnType::Number {
        return Err(AggregateError::NotNumeric {
            column: name.to_string(),
            actual: column.column_type.to_string(),
        });
    }

    Ok(idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{parse_str, ColumnSchema, LoadOptions, TableSchema};
    use std::collections::HashSet;

    fn sales() -> RecordTable {
        let schema = TableSchema::new(vec![
            ColumnSchema::date("date"),
            ColumnSchema::text("region"),
            ColumnSchema::text("product"),
            ColumnSchema::number("revenue"),
            ColumnSchema::number("units_sold"),
        ]);
        let data = "date,region,product,revenue,units_sold
2024-01-02,South,Widget,50,1
2024-01-01,North,Widget,100,4
2024-01-01,South,Gadget,80,2
2024-01-02,North,Gadget,,3
2024-01-01,North,Gadget,20,1
";
        parse_str(data, &schema, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_sum_first_seen_order() {
        let table = sales();
        let grouped = group_by(&table, &GroupSpec::by(&["region"]).sum(&["revenue"])).unwrap();

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped.rows[0].label(), "South");
        assert_eq!(grouped.rows[0].get("revenue"), Some(130.0));
        assert_eq!(grouped.rows[1].label(), "North");
        assert_eq!(grouped.rows[1].get("revenue"), Some(120.0));
    }

    #[test]
    fn test_grouping_is_a_partition() {
        let table = sales();
        let grouped = group_by(&table, &GroupSpec::by(&["date", "region"]).sum(&["revenue"])).unwrap();

        assert_eq!(grouped.total_rows(), table.len());

        let labels: HashSet<String> = grouped.rows.iter().map(GroupRow::label).collect();
        assert_eq!(labels.len(), grouped.len());
    }

    #[test]
    fn test_key_ascending_sort_on_dates() {
        let table = sales();
        let spec = GroupSpec::by(&["date", "region"])
            .sum(&["revenue"])
            .sorted(GroupSort::KeyAscending);
        let grouped = group_by(&table, &spec).unwrap();

        let labels: Vec<String> = grouped.rows.iter().map(GroupRow::label).collect();
        assert_eq!(
            labels,
            vec![
                "2024-01-01 / North",
                "2024-01-01 / South",
                "2024-01-02 / North",
                "2024-01-02 / South",
            ]
        );
        assert_eq!(grouped.rows[0].get("revenue"), Some(120.0));
        // Only a missing revenue in this group
        assert_eq!(grouped.rows[2].get("revenue"), Some(0.0));
    }

    #[test]
    fn test_value_descending_sort() {
        let table = sales();
        let spec = GroupSpec::by(&["product"])
            .sum(&["units_sold"])
            .sorted(GroupSort::ValueDescending("units_sold".into()));
        let grouped = group_by(&table, &spec).unwrap();

        assert_eq!(grouped.rows[0].label(), "Gadget");
        assert_eq!(grouped.rows[0].get("units_sold"), Some(6.0));
    }

    #[test]
    fn test_mean_skips_missing() {
        let table = sales();
        let grouped = group_by(&table, &GroupSpec::by(&["product"]).mean(&["revenue"])).unwrap();

        let gadget = grouped.rows.iter().find(|r| r.label() == "Gadget").unwrap();
        assert_eq!(gadget.get("revenue"), Some(50.0));
        assert_eq!(gadget.row_count, 3);
    }

    #[test]
    fn test_mean_of_nothing_is_omitted() {
        let table = sales();
        let grouped = group_by(&table, &GroupSpec::by(&["date", "region"]).mean(&["revenue"])).unwrap();

        let empty = grouped.rows.iter().find(|r| r.label() == "2024-01-02 / North").unwrap();
        assert_eq!(empty.get("revenue"), None);
        assert!(grouped.rows.iter().flat_map(|r| &r.values).all(|(_, v)| v.is_finite()));
    }

    #[test]
    fn test_count() {
        let table = sales();
        let grouped = group_by(&table, &GroupSpec::by(&["region"]).count()).unwrap();

        assert_eq!(grouped.columns, vec![COUNT_COLUMN]);
        assert_eq!(grouped.column(COUNT_COLUMN), vec![Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_deterministic_output() {
        let table = sales();
        let spec = GroupSpec::by(&["region", "product"]).sum(&["revenue", "units_sold"]);

        let first = serde_json::to_string(&group_by(&table, &spec).unwrap()).unwrap();
        let second = serde_json::to_string(&group_by(&table, &spec).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_and_non_numeric_columns() {
        let table = sales();

        let err = group_by(&table, &GroupSpec::by(&["country"]).sum(&["revenue"])).unwrap_err();
        assert_eq!(err, AggregateError::UnknownColumn("country".into()));

        let err = group_by(&table, &GroupSpec::by(&["region"]).sum(&["product"])).unwrap_err();
        assert!(matches!(err, AggregateError::NotNumeric { .. }));
    }

    #[test]
    fn test_invalid_specs() {
        let table = sales();

        let err = group_by(&table, &GroupSpec::by(&[]).count()).unwrap_err();
        assert!(matches!(err, AggregateError::InvalidSpec(_)));

        let err = group_by(&table, &GroupSpec::by(&["region"]).sum(&[])).unwrap_err();
        assert!(matches!(err, AggregateError::InvalidSpec(_)));

        let spec = GroupSpec::by(&["region"])
            .sum(&["revenue"])
            .sorted(GroupSort::ValueDescending("units_sold".into()));
        assert!(matches!(group_by(&table, &spec), Err(AggregateError::InvalidSpec(_))));
    }

    #[test]
    fn test_reduction_parse() {
        assert_eq!(Reduction::parse("AVG"), Some(Reduction::Mean));
        assert_eq!(Reduction::parse("sum"), Some(Reduction::Sum));
        assert_eq!(Reduction::parse("median"), None);
    }
}
