//! Crunchbase organization pipeline
//!
//! Pulls organization records from the Crunchbase search API one page at a
//! time, flattens the nested JSON into a fixed nine-column schema, and
//! writes partitioned Parquet files.
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use orgpipe_crunchbase::{Config, run};
//!
//! let progress = orgpipe_core::ProgressContext::new();
//! let config = Config::new(
//!     "my-api-key".to_string(),
//!     NaiveDate::from_ymd_opt(2024, 1, 1),
//! );
//! let summary = run(&config, &progress).expect("pipeline failed");
//! println!("Wrote {} rows", summary.rows_written);
//! ```

pub mod api;
pub mod config;
pub mod runner;
pub mod schema;
pub mod source;
pub mod transform;

// Re-exports for convenience
pub use api::{OrgExtractor, SearchPage};
pub use config::{Config, DateWindow};
pub use runner::run;
pub use source::OrgSource;
