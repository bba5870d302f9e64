//! Aggregator
//!
//! Pure functions over a [`RecordTable`](crate::table::RecordTable):
//! grouped reductions for chart series and scalar metrics for headline
//! cards. Identical input always yields identical output.

mod error;
mod grouping;
mod scalar;

pub use error::{AggregateError, AggregateResult};
pub use grouping::{group_by, GroupRow, GroupSort, GroupSpec, GroupedTable, Reduction, COUNT_COLUMN};
pub use scalar::{
    column_percentage, column_ratio, count, histogram, mean, numeric_values, ratio, round_to, sum,
    value_counts, HistogramBin,
};
