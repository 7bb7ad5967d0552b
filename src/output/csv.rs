//! CSV output writer implementation

use crate::QuotePoint;
use chrono::{DateTime, Utc};
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, info};

use super::{OutputError, OutputResult, OutputWriter, QuotesWriter};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer
const FLUSH_INTERVAL: u64 = 1_000;

fn format_time(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// CSV record for one quote point
#[derive(Debug, Serialize)]
struct QuoteRecord {
    timestamp: String,
    ref_currency: String,
    open: String,
    high: String,
    low: String,
    close: String,
    volume: String,
    market_cap: String,
    time_open: String,
    time_close: String,
    time_high: String,
    time_low: String,
    asset_id: u64,
    name: String,
    symbol: String,
    slug: Option<String>,
}

impl From<&QuotePoint> for QuoteRecord {
    fn from(point: &QuotePoint) -> Self {
        Self {
            timestamp: format_time(&point.timestamp),
            ref_currency: point.ref_currency.clone(),
            open: point.open.to_string(),
            high: point.high.to_string(),
            low: point.low.to_string(),
            close: point.close.to_string(),
            volume: point.volume.to_string(),
            market_cap: point.market_cap.to_string(),
            time_open: format_time(&point.time_open),
            time_close: format_time(&point.time_close),
            time_high: format_time(&point.time_high),
            time_low: format_time(&point.time_low),
            asset_id: point.asset_id,
            name: point.name.clone(),
            symbol: point.symbol.clone(),
            slug: point.slug.clone(),
        }
    }
}

/// CSV writer for quote points
pub struct CsvQuotesWriter {
    writer: Writer<BufWriter<File>>,
    points_written: u64,
}

impl CsvQuotesWriter {
    /// Create a new CSV quotes writer with the default buffer size
    pub fn new<P: AsRef<Path>>(path: P) -> OutputResult<Self> {
        Self::new_with_buffer_size(path, DEFAULT_BUFFER_SIZE)
    }

    /// Create a new CSV quotes writer with a custom buffer size
    pub fn new_with_buffer_size<P: AsRef<Path>>(path: P, buffer_size: usize) -> OutputResult<Self> {
        let path = path.as_ref();
        info!("Creating CSV writer: path={}", path.display());

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OutputError::IoError(format!("Failed to create directory: {e}")))?;
        }

        let file = File::create(path)
            .map_err(|e| OutputError::IoError(format!("Failed to create file: {e}")))?;

        let buf_writer = BufWriter::with_capacity(buffer_size, file);
        let csv_writer = Writer::from_writer(buf_writer);

        Ok(Self {
            writer: csv_writer,
            points_written: 0,
        })
    }

    /// Number of points written so far
    pub fn points_written(&self) -> u64 {
        self.points_written
    }
}

impl QuotesWriter for CsvQuotesWriter {
    fn write_point(&mut self, point: &QuotePoint) -> OutputResult<()> {
        let record = QuoteRecord::from(point);

        self.writer
            .serialize(&record)
            .map_err(|e| OutputError::CsvError(format!("Failed to write point: {e}")))?;

        self.points_written += 1;

        if self.points_written % FLUSH_INTERVAL == 0 {
            self.flush()?;
            debug!("Progress: {} points written", self.points_written);
        }

        Ok(())
    }
}

impl OutputWriter for CsvQuotesWriter {
    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::FlushError(format!("Failed to flush: {e}")))
    }

    fn close(mut self) -> OutputResult<()> {
        self.flush()?;

        let buf_writer = self
            .writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get inner writer: {e}")))?;

        let file = buf_writer
            .into_inner()
            .map_err(|e| OutputError::IoError(format!("Failed to get file handle: {e}")))?;

        file.sync_all()
            .map_err(|e| OutputError::IoError(format!("Failed to sync file: {e}")))?;

        info!(
            "CSV writer closed successfully: {} points written",
            self.points_written
        );
        Ok(())
    }
}
