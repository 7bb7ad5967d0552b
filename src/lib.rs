//! # Coin OHLCV Downloader Library
//!
//! A library for downloading historical OHLCV (open/high/low/close/volume)
//! time series for batches of crypto assets from a rate-limited, paginated
//! JSON web API, and normalizing the nested per-currency responses into a
//! flat tabular record set.
//!
//! ## Features
//!
//! - **Request Batching**: Computes the minimal number of HTTP requests that
//!   respect the server's row limit and a practical URL-length budget, then
//!   partitions assets across them round-robin
//! - **Resilient Fetching**: Sequential requests under a configurable pacing
//!   gap, bounded retries with a fixed wait, and per-batch failure isolation
//! - **Normalization**: Flattens each asset's nested per-currency quote
//!   payload into uniform [`QuotePoint`] records
//! - **Partial Results**: A batch that exhausts its retries contributes zero
//!   records; the run completes with whatever data the other batches produced
//!
//! ## Quick Start
//!
//! ```no_run
//! use coin_ohlcv_downloader::directory::InMemoryDirectory;
//! use coin_ohlcv_downloader::executor::{FetchExecutor, FetchRequest};
//! use coin_ohlcv_downloader::fetcher::http::OhlcvHttpClient;
//! use coin_ohlcv_downloader::progress::NoopProgress;
//! use coin_ohlcv_downloader::DateWindow;
//! use chrono::NaiveDate;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let loader = Arc::new(OhlcvHttpClient::new(std::time::Duration::from_secs(30))?);
//! let executor = FetchExecutor::new(loader);
//!
//! let request = FetchRequest {
//!     window: DateWindow::new(
//!         NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
//!         NaiveDate::from_ymd_opt(2020, 1, 10).unwrap(),
//!     ),
//!     interval: "daily".to_string(),
//!     convert: vec!["USD".to_string()],
//!     limit: None,
//!     single_mode: false,
//!     final_cooldown: false,
//! };
//!
//! let directory = InMemoryDirectory::new(vec![]);
//! let result = executor.execute(&request, &directory, &NoopProgress).await?;
//! println!("fetched {} points", result.points.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`interval`] - Interval token resolution and date-window validation
//! - [`planner`] - Batch capacity planning and request URL construction
//! - [`fetcher`] - HTTP transport, pacing, and the resilient fetch pipeline
//! - [`normalize`] - Nested response payloads to flat records
//! - [`assemble`] - Result concatenation, slug enrichment, final cooldown
//! - [`executor`] - Orchestration of the five pipeline stages
//! - [`directory`] - Asset directory collaborator interface
//! - [`output`] - CSV persistence for result sets
//! - [`report`] - Advisory diagnostics and run metadata

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::NaiveDate;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result concatenation, slug enrichment, and the trailing cooldown
pub mod assemble;

/// CLI command implementations
pub mod cli;

/// Asset directory collaborator interface and implementations
pub mod directory;

/// Fetch orchestration across the pipeline stages
pub mod executor;

/// HTTP transport, request pacing, and the resilient fetch pipeline
pub mod fetcher;

/// Interval token resolution and date-window validation
pub mod interval;

/// Response payload normalization into flat records
pub mod normalize;

/// Data output writers
pub mod output;

/// Batch capacity planning and request URL construction
pub mod planner;

/// Progress observer side channel
pub mod progress;

/// Advisory diagnostics, run metadata, and the result set
pub mod report;

// Re-export commonly used types
pub use report::{Advisory, ResultSet, RunMetadata, RunReport};

/// Earliest date for which the endpoint serves historical data.
///
/// Requests whose window ends before this date are rejected outright;
/// windows that merely start before it proceed with an advisory, since the
/// server silently clamps to this floor.
pub fn data_floor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2013, 4, 29).expect("hardcoded date is valid")
}

/// Sampling granularity accepted by the endpoint's `time_period` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimePeriod {
    /// One bucket per hour
    #[serde(rename = "hourly")]
    Hourly,
    /// One bucket per day
    #[serde(rename = "daily")]
    Daily,
}

impl TimePeriod {
    /// Wire value for the `time_period` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::Hourly => "hourly",
            TimePeriod::Daily => "daily",
        }
    }
}

impl std::fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inclusive date range for a historical data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// First date of the window (inclusive)
    pub start: NaiveDate,
    /// Last date of the window (inclusive)
    pub end: NaiveDate,
}

impl DateWindow {
    /// Create a new window. Ordering is validated by [`interval::resolve`],
    /// not here, so callers can construct windows freely before validation.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Number of daily buckets spanned by the window, both endpoints
    /// included.
    pub fn daily_points(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Number of hourly buckets spanned by the window.
    pub fn hourly_points(&self) -> i64 {
        self.daily_points() * 24
    }

    /// `time_start` query value: start-of-day UTC, in UNIX seconds.
    pub fn time_start_unix(&self) -> i64 {
        self.start
            .and_hms_opt(0, 0, 0)
            .expect("midnight is a valid time")
            .and_utc()
            .timestamp()
    }

    /// `time_end` query value: 23:59:59 UTC of the end date, in UNIX
    /// seconds, so the end date is fully included.
    pub fn time_end_unix(&self) -> i64 {
        self.end
            .and_hms_opt(23, 59, 59)
            .expect("end of day is a valid time")
            .and_utc()
            .timestamp()
    }
}

/// One normalized OHLCV observation for one asset in one reference currency.
///
/// `name` and `symbol` are copied from the response envelope, which is
/// authoritative at fetch time; `slug` is left-enriched from the asset
/// directory and is `None` when the directory has no entry for the id.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QuotePoint {
    /// Bucket timestamp as reported in the per-currency quote
    pub timestamp: DateTime<Utc>,
    /// Reference currency the prices are denominated in (e.g. "USD")
    pub ref_currency: String,
    /// Opening price
    pub open: Decimal,
    /// Highest price
    pub high: Decimal,
    /// Lowest price
    pub low: Decimal,
    /// Closing price
    pub close: Decimal,
    /// Traded volume
    pub volume: Decimal,
    /// Market capitalization at the bucket
    pub market_cap: Decimal,
    /// Bucket open time
    pub time_open: DateTime<Utc>,
    /// Bucket close time
    pub time_close: DateTime<Utc>,
    /// Time of the bucket high
    pub time_high: DateTime<Utc>,
    /// Time of the bucket low
    pub time_low: DateTime<Utc>,
    /// Numeric asset id
    pub asset_id: u64,
    /// Asset name from the response envelope
    pub name: String,
    /// Asset ticker symbol from the response envelope
    pub symbol: String,
    /// Directory slug, when the directory knows the id
    pub slug: Option<String>,
}
