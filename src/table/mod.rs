//! Record Table
//!
//! In-memory representation of a dashboard snapshot and the loader that
//! builds it from the object store.

mod error;
mod loader;
mod types;

pub use error::{LoadError, LoadResult};
pub use loader::{load_table, parse_date, parse_path, parse_reader, parse_str, LoadOptions};
pub use types::{Column, ColumnSchema, ColumnType, RecordTable, TableSchema, Value};
