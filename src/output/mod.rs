//! Data output writers

use crate::QuotePoint;

pub mod csv;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    CsvError(String),

    /// Buffer flush error
    #[error("flush error: {0}")]
    FlushError(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Generic output writer trait
pub trait OutputWriter {
    /// Flush any buffered data to disk
    fn flush(&mut self) -> OutputResult<()>;

    /// Close the writer and finalize output
    fn close(self) -> OutputResult<()>;
}

/// Trait for writing normalized quote points
pub trait QuotesWriter: OutputWriter {
    /// Write a single quote point to output
    fn write_point(&mut self, point: &QuotePoint) -> OutputResult<()>;

    /// Write multiple quote points at once
    fn write_points(&mut self, points: &[QuotePoint]) -> OutputResult<()> {
        for point in points {
            self.write_point(point)?;
        }
        Ok(())
    }
}
