// Track Record Comparison Dashboard - Core Library
// Loading, filtering, aggregation, ranking, and chart data for the
// athletics prediction dataset. Rendering lives in the binary's TUI module
// so the core stays free of terminal dependencies.

pub mod aggregate;
pub mod charts;
pub mod error;
pub mod filter;
pub mod ranking;
pub mod store;
pub mod tables;

// Re-export commonly used types
pub use aggregate::{accuracy, count, mean, sum_true, summary, Metric, MetricsSummary};
pub use charts::{
    counts_by_discipline, flag_distribution, histogram, predicted_vs_actual, scatter,
    DisciplineFlagCount, FlagDistribution, HistogramBin, ScatterPoint, SeriesCount,
    DEFAULT_HISTOGRAM_BINS,
};
pub use error::{InvalidColumnReport, LoadError};
pub use filter::{filter, FilterCriteria};
pub use ranking::{top_n, SortDirection};
pub use store::{
    load_comparison_store, FlagColumn, NumericColumn, Record, RecordStore, TriState,
};
pub use tables::{load_standard_set, load_table, SupplementaryTable, STANDARD_TABLES};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
