//! Crunchbase pipeline configuration

use std::path::PathBuf;

use chrono::{Local, NaiveDate};

use crate::api;

/// Default records per page
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Default fetch attempts per page before the run aborts
pub const DEFAULT_RETRIES: u32 = 5;

/// Incremental window for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// Lower bound for the `updated_at` predicate
    pub updated_since: NaiveDate,
    /// Partition the output is written under
    pub partition_date: NaiveDate,
}

impl DateWindow {
    /// No processing date means a full backfill: no effective lower bound,
    /// partitioned under today. With a date, the window starts one day
    /// earlier to absorb clock and timezone skew at the API.
    pub fn new(processing_date: Option<NaiveDate>) -> Self {
        match processing_date {
            None => Self {
                updated_since: NaiveDate::MIN,
                partition_date: Local::now().date_naive(),
            },
            Some(date) => Self {
                updated_since: date.pred_opt().unwrap_or(NaiveDate::MIN),
                partition_date: date,
            },
        }
    }
}

/// Runtime configuration for the organization pipeline
#[derive(Debug, Clone)]
pub struct Config {
    /// Search endpoint URL
    pub api_url: String,
    /// Credential sent as `X-cb-user-key`; read once, held for the run
    pub api_key: String,
    /// Records per page
    pub page_size: usize,
    /// Total fetch attempts per page
    pub retries: u32,
    /// Root directory for partitioned Parquet output
    pub output_dir: PathBuf,
    /// Zstd compression level for Parquet output
    pub zstd_level: i32,
    /// Incremental window
    pub window: DateWindow,
}

impl Config {
    /// Config with defaults for everything but the credential and window.
    pub fn new(api_key: String, processing_date: Option<NaiveDate>) -> Self {
        Self {
            api_url: api::SEARCH_URL.to_string(),
            api_key,
            page_size: DEFAULT_PAGE_SIZE,
            retries: DEFAULT_RETRIES,
            output_dir: PathBuf::from("output"),
            zstd_level: 3,
            window: DateWindow::new(processing_date),
        }
    }
}
