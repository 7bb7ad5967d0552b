//! Fetch command implementation

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::directory::JsonFileDirectory;
use crate::executor::{FetchExecutor, FetchRequest, DEFAULT_ENDPOINT};
use crate::fetcher::http::OhlcvHttpClient;
use crate::fetcher::pipeline::MAX_ATTEMPTS;
use crate::fetcher::FetchPolicy;
use crate::output::csv::CsvQuotesWriter;
use crate::output::{OutputWriter, QuotesWriter};
use crate::progress::ProgressObserver;
use crate::DateWindow;

use super::CliError;

/// Parse a compact `yyyymmdd` date argument.
fn parse_compact_date(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input.trim(), "%Y%m%d")
        .map_err(|_| format!("'{input}' is not a valid yyyymmdd date"))
}

/// Parse a non-negative seconds value.
fn parse_seconds(input: &str) -> Result<f64, String> {
    let value: f64 = input
        .parse()
        .map_err(|_| format!("'{input}' is not a valid number"))?;
    if !value.is_finite() || value < 0.0 {
        return Err("seconds must be a non-negative number".to_string());
    }
    Ok(value)
}

/// Coin OHLCV Downloader CLI
#[derive(Parser, Debug)]
#[command(name = "coin-ohlcv-downloader")]
#[command(about = "Download historical crypto OHLCV data in batched requests", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch historical OHLCV data for the assets in a directory file
    Fetch(FetchArgs),
}

/// Arguments for the fetch command
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Asset directory JSON file (array of {id, slug, name, symbol})
    #[arg(long)]
    pub assets: PathBuf,

    /// Output CSV file
    #[arg(long, default_value = "quotes.csv")]
    pub out: PathBuf,

    /// Reference currencies, comma separated (e.g. "USD,EUR")
    #[arg(long, default_value = "USD")]
    pub convert: String,

    /// Cap on the number of assets queried
    #[arg(long)]
    pub limit: Option<usize>,

    /// Start date (yyyymmdd)
    #[arg(long, value_parser = parse_compact_date)]
    pub start_date: NaiveDate,

    /// End date (yyyymmdd)
    #[arg(long, value_parser = parse_compact_date)]
    pub end_date: NaiveDate,

    /// Sampling interval (hourly, daily, weekly, monthly, yearly, 1h..12h, 1d..365d)
    #[arg(long, default_value = "daily")]
    pub interval: String,

    /// Seconds to pause before each request
    #[arg(long, default_value_t = 1.0, value_parser = parse_seconds)]
    pub sleep: f64,

    /// Seconds to wait between retry attempts
    ///
    /// Keep above 60 if the endpoint enforces a cooldown after abusive
    /// request patterns.
    #[arg(long, default_value_t = 70.0, value_parser = parse_seconds)]
    pub wait: f64,

    /// Pause 60 seconds after the run completes, so an immediately
    /// following invocation stays out of the abuse-detection window
    #[arg(long, default_value_t = false)]
    pub final_cooldown: bool,

    /// One request per asset, isolating failures per asset
    #[arg(long, default_value_t = false)]
    pub single: bool,

    /// Endpoint base URL
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub api_url: String,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

impl FetchArgs {
    /// Execute the fetch command.
    pub async fn execute(&self) -> Result<(), CliError> {
        let directory = JsonFileDirectory::load(&self.assets)?;

        let convert: Vec<String> = self
            .convert
            .split(',')
            .map(|code| code.trim().to_uppercase())
            .filter(|code| !code.is_empty())
            .collect();
        if convert.is_empty() {
            return Err(CliError::InvalidArgument(
                "at least one convert currency is required".to_string(),
            ));
        }

        let loader = Arc::new(OhlcvHttpClient::new(Duration::from_secs(self.timeout))?);
        let executor = FetchExecutor::new(loader)
            .with_policy(FetchPolicy {
                sleep_interval: Duration::from_secs_f64(self.sleep),
                retry_wait: Duration::from_secs_f64(self.wait),
                max_attempts: MAX_ATTEMPTS,
            })
            .with_endpoint(&self.api_url);

        let request = FetchRequest {
            window: DateWindow::new(self.start_date, self.end_date),
            interval: self.interval.clone(),
            convert,
            limit: self.limit,
            single_mode: self.single,
            final_cooldown: self.final_cooldown,
        };

        let observer = BarProgress::new();
        let result = executor.execute(&request, &directory, &observer).await?;
        observer.finish();

        info!(
            points = result.points.len(),
            batches = result.report.batches_total,
            failed_batches = result.report.batches_failed,
            advisories = result.report.advisories.len(),
            "fetch complete"
        );
        if !result.report.is_complete() {
            warn!(
                failed_batches = result.report.batches_failed,
                "run finished with partial data; see advisories above"
            );
        }

        let mut writer = CsvQuotesWriter::new(&self.out)?;
        writer.write_points(&result.points)?;
        writer.close()?;
        info!(path = %self.out.display(), "result written");

        Ok(())
    }
}

/// Terminal progress bar advanced once per completed batch.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches {msg}")
                .expect("hardcoded template is valid")
                .progress_chars("#>-"),
        );
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for BarProgress {
    fn batch_completed(&self, completed: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(completed as u64);
    }
}
