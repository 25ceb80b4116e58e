//! Pipeline orchestration for the organization fetch

use std::fs;

use orgpipe_core::{ParquetDirSink, ProgressContext, RunSummary, run_etl};

use crate::api::OrgExtractor;
use crate::config::Config;
use crate::source::OrgSource;

/// Run the organization pipeline to completion.
///
/// Fatal errors (retry exhaustion, schema violations, sink IO) abort the
/// run; there is no partial-run recovery. Re-running, optionally with a
/// later processing date, is the only recovery path.
pub fn run(config: &Config, progress: &ProgressContext) -> anyhow::Result<RunSummary> {
    fs::create_dir_all(&config.output_dir)?;

    log::info!(
        "Fetching organizations updated since {} (partition {})",
        config.window.updated_since,
        config.window.partition_date
    );

    let extractor = OrgExtractor::new(
        config.api_url.clone(),
        config.api_key.clone(),
        config.window.updated_since,
        config.page_size,
        config.retries,
    );
    let sink = ParquetDirSink::new(config.output_dir.clone(), config.zstd_level);
    let mut source = OrgSource::new(
        extractor,
        sink,
        config.window.partition_date,
        config.page_size,
    );

    let pb = progress.records_bar();
    let summary = run_etl(&mut source, &pb)?;
    pb.finish_and_clear();

    summary.log();
    Ok(summary)
}
