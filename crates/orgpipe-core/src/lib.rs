//! Orgpipe Core - Common infrastructure for organization data pipelines
//!
//! This crate provides the source-agnostic pieces of the pipeline: the HTTP
//! client scope, the partitioned Parquet sink, the extract-transform-load
//! driver, and logging/progress reporting.

pub mod error;
pub mod http;
pub mod logging;
pub mod pipeline;
pub mod progress;
pub mod sink;

// Re-exports for convenience
pub use error::SchemaError;
pub use http::{FetchError, SHARED_RUNTIME, fresh_client};
pub use logging::init_logging;
pub use pipeline::{EtlSource, RawPage, RunState, RunSummary, run_etl};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use sink::{ParquetDirSink, PartitionSink, is_valid_parquet};
