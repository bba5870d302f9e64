//! Core types for the in-memory record table
//!
//! - `Value`: a single typed cell
//! - `ColumnSchema` / `TableSchema`: declared column types for a snapshot
//! - `RecordTable`: the parsed, immutable table

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Missing,
}

impl Value {
    /// Numeric value, if this cell holds one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Canonical string form, used for grouping keys and labels
    pub fn to_key_string(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Missing => String::new(),
        }
    }

    /// Total order used when sorting grouped output.
    ///
    /// Missing sorts first, then numbers, dates and text; values of the
    /// same kind compare naturally.
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        fn rank(v: &Value) -> u8 {
            match v {
                Value::Missing => 0,
                Value::Number(_) => 1,
                Value::Date(_) => 2,
                Value::Text(_) => 3,
            }
        }

        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_key_string())
    }
}

/// Declared type of a column
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Number,
    Date,
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Text => write!(f, "text"),
            ColumnType::Number => write!(f, "number"),
            ColumnType::Date => write!(f, "date"),
        }
    }
}

/// A declared column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
    /// Whether the header must contain this column
    pub required: bool,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            required: true,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Number)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Date)
    }

    /// Builder method: column may be absent from the file
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// Declared columns of a snapshot. Undeclared columns load as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnSchema>) -> Self {
        Self { columns }
    }

    pub fn get(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Declared type, defaulting to text for undeclared columns
    pub fn type_of(&self, name: &str) -> ColumnType {
        self.get(name)
            .map(|c| c.column_type)
            .unwrap_or(ColumnType::Text)
    }

    pub fn required(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns.iter().filter(|c| c.required)
    }
}

/// A column of a loaded table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

/// Parsed snapshot: ordered columns and rows of typed values.
///
/// Built once by the loader and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTable {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl RecordTable {
    /// Assemble a table. Every row must have one value per column.
    pub(crate) fn from_parts(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Position and definition of a column
    pub fn column(&self, name: &str) -> Option<(usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column(name).map(|(idx, _)| idx)
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// All values of a column in row order
    pub fn values(&self, name: &str) -> Option<impl Iterator<Item = &Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Present numeric values of a column, skipping missing cells
    pub fn numbers(&self, name: &str) -> Option<Vec<f64>> {
        Some(self.values(name)?.filter_map(Value::as_f64).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RecordTable {
        RecordTable::from_parts(
            vec![
                Column {
                    name: "region".into(),
                    column_type: ColumnType::Text,
                },
                Column {
                    name: "revenue".into(),
                    column_type: ColumnType::Number,
                },
            ],
            vec![
                vec![Value::Text("North".into()), Value::Number(10.0)],
                vec![Value::Text("South".into()), Value::Missing],
                vec![Value::Text("North".into()), Value::Number(2.5)],
            ],
        )
    }

    #[test]
    fn test_numbers_skip_missing() {
        let table = sample();
        assert_eq!(table.numbers("revenue"), Some(vec![10.0, 2.5]));
        assert_eq!(table.numbers("nope"), None);
    }

    #[test]
    fn test_column_lookup() {
        let table = sample();
        assert_eq!(table.len(), 3);
        assert_eq!(table.column_index("revenue"), Some(1));
        assert_eq!(table.column_names(), vec!["region", "revenue"]);
    }

    #[test]
    fn test_key_strings() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(Value::Date(date).to_key_string(), "2024-03-09");
        assert_eq!(Value::Number(3.0).to_key_string(), "3");
        assert_eq!(Value::Missing.to_key_string(), "");
    }

    #[test]
    fn test_sort_order() {
        let mut values = vec![
            Value::Number(10.0),
            Value::Missing,
            Value::Number(2.0),
        ];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(
            values,
            vec![Value::Missing, Value::Number(2.0), Value::Number(10.0)]
        );
    }

    #[test]
    fn test_schema_defaults_to_text() {
        let schema = TableSchema::new(vec![ColumnSchema::number("age")]);
        assert_eq!(schema.type_of("age"), ColumnType::Number);
        assert_eq!(schema.type_of("notes"), ColumnType::Text);
    }

    #[test]
    fn test_value_serializes_untagged() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let json = serde_json::to_string(&vec![
            Value::Text("a".into()),
            Value::Number(1.5),
            Value::Date(date),
            Value::Missing,
        ])
        .unwrap();
        assert_eq!(json, r#"["a",1.5,"2024-01-02",null]"#);
    }
}
