//! orgpipe - Organization ETL
//!
//! Fetches organization records from the Crunchbase search API and writes
//! partitioned Parquet files.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

mod config;

use config::FileConfig;

#[derive(Parser)]
#[command(name = "orgpipe")]
#[command(about = "Organization ETL: paginated search API to partitioned Parquet")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./orgpipe.toml or ~/.config/orgpipe/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch all organizations matching the incremental window
    Fetch(FetchArgs),
    /// Show current configuration
    Config,
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Date used to window new records (YYYY-MM-DD); omit for a full backfill
    #[arg(short, long, value_parser = parse_date)]
    processing_date: Option<NaiveDate>,

    /// Output directory
    #[arg(short, long)]
    output: Option<std::path::PathBuf>,

    /// Records per page
    #[arg(long)]
    page_size: Option<usize>,

    /// Fetch attempts per page before the run aborts
    #[arg(long)]
    retries: Option<u32>,

    /// Zstd compression level (1-22)
    #[arg(short, long)]
    zstd_level: Option<i32>,
}

fn parse_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{s}': {e}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(orgpipe_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug  — the records bar shows activity
    //   non-TTY: info unless --debug          — logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    orgpipe_core::init_logging(quiet, cli.debug, multi);

    // Load configuration
    let file_config = if let Some(path) = cli.config {
        FileConfig::from_file(&path)?
    } else {
        FileConfig::load()?
    };

    match cli.command {
        Command::Fetch(args) => {
            // Credential check happens here, before any network activity
            let api_key = file_config.api.key.clone().context(
                "CB_API_KEY environment variable must be set \
                 (see https://data.crunchbase.com/docs/crunchbase-basic-using-api \
                 for obtaining a key)",
            )?;

            let mut config = orgpipe_crunchbase::Config::new(api_key, args.processing_date);
            config.api_url = file_config.api.base_url;
            config.page_size = args.page_size.unwrap_or(file_config.fetch.page_size);
            config.retries = args.retries.unwrap_or(file_config.fetch.retries);
            config.output_dir = args.output.unwrap_or(file_config.output.dir);
            config.zstd_level = args
                .zstd_level
                .unwrap_or(file_config.output.compression_level);

            let summary = orgpipe_crunchbase::run(&config, &progress)?;
            progress.println(format!(
                "Done: {} rows across {} pages",
                orgpipe_core::fmt_num(summary.rows_written),
                summary.pages
            ));
            Ok(())
        }
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec!["API base URL", &file_config.api.base_url]);
            table.add_row(vec![
                "API key",
                if file_config.api.key.is_some() {
                    "configured"
                } else {
                    "not set"
                },
            ]);
            table.add_row(vec![
                "Page size",
                &file_config.fetch.page_size.to_string(),
            ]);
            table.add_row(vec!["Retries", &file_config.fetch.retries.to_string()]);
            table.add_row(vec![
                "Output directory",
                &file_config.output.dir.display().to_string(),
            ]);
            table.add_row(vec![
                "Compression level",
                &file_config.output.compression_level.to_string(),
            ]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
