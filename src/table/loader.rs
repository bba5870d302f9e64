//! Snapshot Loader
//!
//! Fetches a delimited-text object from the store, stages it in a temporary
//! file and parses it into a [`RecordTable`] using a declared schema.
//!
//! # Pipeline
//!
//! ```text
//! fetch(key) → stage to temp file → parse header → parse rows → coerce types
//! ```
//!
//! The temp file is removed when the staging guard drops, whether parsing
//! succeeds or fails.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

use super::error::{LoadError, LoadResult};
use super::types::{Column, ColumnType, RecordTable, TableSchema, Value};
use crate::store::ObjectStore;

/// Cell spellings treated as missing values
const MISSING_MARKERS: &[&str] = &["NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "#N/A", "<NA>"];

/// Date formats tried in order for date columns
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Datetime formats whose date part is kept
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Options for parsing delimited text
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field delimiter
    pub delimiter: u8,

    /// Directory for the staged copy (default: the system temp dir)
    pub temp_dir: Option<PathBuf>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            temp_dir: None,
        }
    }
}

impl LoadOptions {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }
}

/// Fetch `key` from the store and parse it into a record table
pub async fn load_table(
    store: &dyn ObjectStore,
    key: &str,
    schema: &TableSchema,
    options: &LoadOptions,
) -> LoadResult<RecordTable> {
    if store.bucket().trim().is_empty() {
        return Err(LoadError::Configuration(
            "data bucket is not set".to_string(),
        ));
    }

    let started = Instant::now();
    tracing::info!(bucket = %store.bucket(), key = %key, "Fetching snapshot");

    let bytes = store.fetch(key).await?;
    let fetched_ms = started.elapsed().as_millis() as u64;

    let staged = stage(&bytes, options.temp_dir.as_deref())?;
    let result = parse_path(staged.path(), schema, options);
    drop(staged);

    let table = result?;
    tracing::info!(
        bucket = %store.bucket(),
        key = %key,
        bytes = bytes.len(),
        rows = table.len(),
        columns = table.columns().len(),
        fetch_ms = fetched_ms,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Snapshot loaded"
    );

    Ok(table)
}

/// Write downloaded bytes to a temp file that is deleted on drop
fn stage(bytes: &[u8], dir: Option<&Path>) -> LoadResult<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("dashboards-snapshot-").suffix(".csv");
    let mut file = match dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

/// Parse a delimited file on disk
pub fn parse_path(path: &Path, schema: &TableSchema, options: &LoadOptions) -> LoadResult<RecordTable> {
    let file = std::fs::File::open(path)?;
    parse_reader(file, schema, options)
}

/// Parse delimited text held in memory (useful for testing)
pub fn parse_str(data: &str, schema: &TableSchema, options: &LoadOptions) -> LoadResult<RecordTable> {
    parse_reader(data.as_bytes(), schema, options)
}

/// Parse delimited text from any reader
pub fn parse_reader<R: Read>(
    reader: R,
    schema: &TableSchema,
    options: &LoadOptions,
) -> LoadResult<RecordTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| LoadError::parse(0, "", describe_csv_error(&e)))?
        .clone();

    let columns = resolve_columns(&headers, schema)?;

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let row_num = idx + 1;
        let record = result.map_err(|e| LoadError::parse(row_num, "", describe_csv_error(&e)))?;

        let row = columns
            .iter()
            .zip(record.iter())
            .map(|(column, raw)| parse_cell(raw, column).map_err(|msg| LoadError::parse(row_num, &column.name, msg)))
            .collect::<LoadResult<Vec<Value>>>()?;

        rows.push(row);
    }

    Ok(RecordTable::from_parts(columns, rows))
}

/// Match the header row against the schema
fn resolve_columns(headers: &csv::StringRecord, schema: &TableSchema) -> LoadResult<Vec<Column>> {
    if headers.is_empty() || headers.iter().all(str::is_empty) {
        return Err(LoadError::parse(0, "", "missing header row"));
    }

    let mut seen = HashSet::new();
    for name in headers.iter() {
        if name.is_empty() {
            return Err(LoadError::parse(0, "", "empty column name in header"));
        }
        if !seen.insert(name) {
            return Err(LoadError::parse(0, name, "duplicate column name"));
        }
    }

    if let Some(missing) = schema.required().find(|c| !seen.contains(c.name.as_str())) {
        return Err(LoadError::parse(
            0,
            &missing.name,
            format!("required {} column is missing", missing.column_type),
        ));
    }

    Ok(headers
        .iter()
        .map(|name| Column {
            name: name.to_string(),
            column_type: schema.type_of(name),
        })
        .collect())
}

/// Convert one raw cell according to its column type
fn parse_cell(raw: &str, column: &Column) -> Result<Value, String> {
    if raw.is_empty() || MISSING_MARKERS.contains(&raw) {
        return Ok(Value::Missing);
    }

    match column.column_type {
        ColumnType::Text => Ok(Value::Text(raw.to_string())),
        ColumnType::Number => parse_number(raw)
            .map(Value::Number)
            .ok_or_else(|| format!("invalid number '{}'", raw)),
        ColumnType::Date => parse_date(raw)
            .map(Value::Date)
            .ok_or_else(|| format!("invalid date '{}'", raw)),
    }
}

/// Parse a finite number
fn parse_number(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse a calendar date, accepting common date and datetime spellings
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }

    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive())
}

fn describe_csv_error(err: &csv::Error) -> String {
    match err.kind() {
        csv::ErrorKind::Utf8 { .. } => "invalid UTF-8 in field".to_string(),
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("expected {} fields, found {}", expected_len, len),
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;
    use crate::table::ColumnSchema;
    use tempfile::tempdir;

    fn sales_schema() -> TableSchema {
        TableSchema::new(vec![
            ColumnSchema::date("date"),
            ColumnSchema::text("region"),
            ColumnSchema::text("product"),
            ColumnSchema::number("revenue"),
            ColumnSchema::number("units_sold"),
        ])
    }

    const SALES: &str = "date,region,product,revenue,units_sold
2024-01-01,North,Widget,100.5,4
2024-01-01,South,Gadget,80,2
2024-01-02,North,Gadget,,3
";

    #[test]
    fn test_row_count_matches_data_lines() {
        let table = parse_str(SALES, &sales_schema(), &LoadOptions::default()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.column_names(), vec!["date", "region", "product", "revenue", "units_sold"]);
    }

    #[test]
    fn test_date_column_is_coerced() {
        let table = parse_str(SALES, &sales_schema(), &LoadOptions::default()).unwrap();
        let dates: Vec<_> = table.values("date").unwrap().collect();
        assert!(dates.iter().all(|v| v.as_date().is_some()));
        assert_eq!(
            dates[2].as_date(),
            NaiveDate::from_ymd_opt(2024, 1, 2)
        );
    }

    #[test]
    fn test_empty_cell_is_missing() {
        let table = parse_str(SALES, &sales_schema(), &LoadOptions::default()).unwrap();
        assert_eq!(table.numbers("revenue"), Some(vec![100.5, 80.0]));
        assert!(table.rows()[2][3].is_missing());
    }

    #[test]
    fn test_ragged_row_is_parse_error() {
        let data = "date,region,product,revenue,units_sold
2024-01-01,North,Widget,100,4
2024-01-02,North,Widget,100
";
        let err = parse_str(data, &sales_schema(), &LoadOptions::default()).unwrap_err();
        match err {
            LoadError::Parse { row, message, .. } => {
                assert_eq!(row, 2);
                assert!(message.contains("expected 5 fields"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_date_names_row() {
        let data = "date,region,product,revenue,units_sold
2024-01-01,North,Widget,100,4
2024-01-02,North,Widget,100,4
someday,South,Widget,100,4
";
        let err = parse_str(data, &sales_schema(), &LoadOptions::default()).unwrap_err();
        match err {
            LoadError::Parse { row, column, .. } => {
                assert_eq!(row, 3);
                assert_eq!(column, "date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_numeric_value_is_parse_error() {
        let data = "date,region,product,revenue,units_sold
2024-01-01,North,Widget,lots,4
";
        let err = parse_str(data, &sales_schema(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { row: 1, ref column, .. } if column == "revenue"));
    }

    #[test]
    fn test_missing_required_column() {
        let data = "date,region,revenue,units_sold
2024-01-01,North,100,4
";
        let err = parse_str(data, &sales_schema(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { row: 0, ref column, .. } if column == "product"));
    }

    #[test]
    fn test_empty_input_is_parse_error() {
        let err = parse_str("", &sales_schema(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { row: 0, .. }));
    }

    #[test]
    fn test_duplicate_header_is_parse_error() {
        let schema = TableSchema::default();
        let err = parse_str("a,b,a\n1,2,3\n", &schema, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { row: 0, ref column, .. } if column == "a"));
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let schema = TableSchema::default();
        let bytes: &[u8] = b"name,city\nok,Oslo\nbad,\xff\xfe\n";
        let err = parse_reader(bytes, &schema, &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { row: 2, .. }));
    }

    #[test]
    fn test_bom_and_undeclared_columns() {
        let schema = TableSchema::new(vec![ColumnSchema::number("age")]);
        let data = "\u{feff}age,notes\n31,first\n";
        let table = parse_str(data, &schema, &LoadOptions::default()).unwrap();

        assert_eq!(table.column_names(), vec!["age", "notes"]);
        assert_eq!(table.columns()[1].column_type, ColumnType::Text);
        assert_eq!(table.rows()[0][1], Value::Text("first".into()));
    }

    #[test]
    fn test_missing_markers_and_delimiter() {
        let schema = TableSchema::new(vec![ColumnSchema::number("revenue")]);
        let options = LoadOptions::default().with_delimiter(b';');
        let table = parse_str("month;revenue\nJan;NaN\nFeb; 12 \n", &schema, &options).unwrap();

        assert!(table.rows()[0][1].is_missing());
        assert_eq!(table.rows()[1][1], Value::Number(12.0));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15);
        assert_eq!(parse_date("2024-03-15"), expected);
        assert_eq!(parse_date("2024/03/15"), expected);
        assert_eq!(parse_date("03/15/2024"), expected);
        assert_eq!(parse_date("15.03.2024"), expected);
        assert_eq!(parse_date("2024-03-15 08:30:00"), expected);
        assert_eq!(parse_date("2024-03-15T08:30:00Z"), expected);
        assert_eq!(parse_date("2024-02-30"), None);
    }

    #[test]
    fn test_staged_file_is_removed_on_drop() {
        let staged = stage(b"a,b\n1,2\n", None).unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_load_table_from_store() {
        let dir = tempdir().unwrap();
        let objects = dir.path().join("analytics").join("dashboards");
        std::fs::create_dir_all(&objects).unwrap();
        std::fs::write(objects.join("sales_data.csv"), SALES).unwrap();

        let store = LocalStore::new(dir.path(), "analytics").unwrap();
        let table = load_table(&store, "dashboards/sales_data.csv", &sales_schema(), &LoadOptions::default())
            .await
            .unwrap();

        assert_eq!(table.len(), 3);
    }

    fn staged_files(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    #[tokio::test]
    async fn test_load_table_removes_staged_copy_on_parse_error() {
        let dir = tempdir().unwrap();
        let staging = tempdir().unwrap();
        let objects = dir.path().join("analytics").join("dashboards");
        std::fs::create_dir_all(&objects).unwrap();
        std::fs::write(
            objects.join("sales_data.csv"),
            "date,region,product,revenue,units_sold\nsomeday,North,Widget,1,1\n",
        )
        .unwrap();

        let store = LocalStore::new(dir.path(), "analytics").unwrap();
        let options = LoadOptions::default().with_temp_dir(staging.path());
        let result = load_table(&store, "dashboards/sales_data.csv", &sales_schema(), &options).await;

        assert!(matches!(result, Err(LoadError::Parse { row: 1, .. })));
        assert!(staged_files(staging.path()).is_empty());
    }

    #[tokio::test]
    async fn test_load_table_removes_staged_copy_on_success() {
        let dir = tempdir().unwrap();
        let staging = tempdir().unwrap();
        let objects = dir.path().join("analytics").join("dashboards");
        std::fs::create_dir_all(&objects).unwrap();
        std::fs::write(objects.join("sales_data.csv"), SALES).unwrap();

        let store = LocalStore::new(dir.path(), "analytics").unwrap();
        let options = LoadOptions::default().with_temp_dir(staging.path());
        let table = load_table(&store, "dashboards/sales_data.csv", &sales_schema(), &options)
            .await
            .unwrap();

        assert_eq!(table.len(), 3);
        assert!(staged_files(staging.path()).is_empty());
    }

    #[tokio::test]
    async fn test_load_table_missing_object() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "analytics").unwrap();

        let result = load_table(&store, "dashboards/sales_data.csv", &sales_schema(), &LoadOptions::default()).await;
        assert!(matches!(result, Err(LoadError::NotFound { .. })));
    }
}
