//! Extract-transform-load driver
//!
//! A data source implements [`EtlSource`]; [`run_etl`] owns the pagination
//! loop and the per-run state. One page is in flight at a time.

use std::time::Instant;

use arrow::array::RecordBatch;
use indicatif::ProgressBar;

use crate::progress::fmt_num;

/// One page of raw records plus the source-reported total.
pub struct RawPage<R> {
    /// Total matching records across all pages; stable for a run
    pub total: usize,
    pub records: Vec<R>,
}

/// The extract/transform/load capability set of a single data source.
///
/// Implementations supply source-specific fetch, reshape, and persistence;
/// the orchestration lives in [`run_etl`] and is the same for every source.
pub trait EtlSource {
    type Raw;

    /// Fetch one page at `cursor`. `None` requests the first page of a run.
    fn extract(&mut self, cursor: Option<&str>) -> anyhow::Result<RawPage<Self::Raw>>;

    /// Reshape one page of raw records into a flat record batch.
    fn transform(&self, records: Vec<Self::Raw>) -> anyhow::Result<RecordBatch>;

    /// Persist one transformed batch. `offset` is the number of records
    /// counted as loaded before this page.
    fn load(&mut self, batch: &RecordBatch, offset: usize) -> anyhow::Result<()>;

    /// Identifier of the last row of `batch`, used as the next cursor.
    fn next_cursor(&self, batch: &RecordBatch) -> anyhow::Result<String>;

    /// Page size requested from the source; drives progress accounting.
    fn page_size(&self) -> usize;
}

/// Pagination state for one run. Never persisted; a new run starts clean.
#[derive(Debug, Default)]
pub struct RunState {
    /// Records counted as loaded so far (in page-size steps)
    pub loaded: usize,
    /// Total frozen from the first successful page response
    pub total: Option<usize>,
    /// Last row identifier of the previous page
    pub cursor: Option<String>,
}

/// Drive a source until every matching record has been written.
///
/// Loop invariant: continue while the total is unknown or `loaded` has not
/// reached it. `loaded` advances by the requested page size, not by rows
/// written; a final page shorter than the page size overshoots the total,
/// which the bound tolerates.
pub fn run_etl<S: EtlSource>(source: &mut S, pb: &ProgressBar) -> anyhow::Result<RunSummary> {
    let start = Instant::now();
    let mut state = RunState::default();
    let mut pages = 0usize;
    let mut rows_written = 0usize;

    while state.total.map_or(true, |total| state.loaded < total) {
        let page = source.extract(state.cursor.as_deref())?;
        if state.total.is_none() {
            state.total = Some(page.total);
            pb.set_length(page.total as u64);
        }

        let batch = source.transform(page.records)?;
        source.load(&batch, state.loaded)?;
        rows_written += batch.num_rows();

        // An empty page carries no cursor row; the count bound ends the
        // loop without one.
        if batch.num_rows() > 0 {
            state.cursor = Some(source.next_cursor(&batch)?);
        }
        state.loaded += source.page_size();
        pages += 1;

        let total = state.total.unwrap_or(0);
        pb.set_position(state.loaded.min(total) as u64);
        log::info!("Collected {}/{}", state.loaded, total);
    }

    Ok(RunSummary {
        pages,
        rows_written,
        total_records: state.total.unwrap_or(0),
        elapsed: start.elapsed(),
    })
}

/// Summary of one pipeline run
#[derive(Debug)]
pub struct RunSummary {
    pub pages: usize,
    pub rows_written: usize,
    pub total_records: usize,
    pub elapsed: std::time::Duration,
}

impl RunSummary {
    pub fn log(&self) {
        log::info!("=== Run Summary ===");
        log::info!(
            "Rows: {} across {} pages (source reported {})",
            fmt_num(self.rows_written),
            self.pages,
            fmt_num(self.total_records)
        );
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());
    }
}
