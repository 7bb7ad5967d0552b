//! CLI error types and conversions

use crate::directory::DirectoryError;
use crate::executor::ExecuteError;
use crate::fetcher::FetcherError;
use crate::output::OutputError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Asset directory could not be loaded
    #[error("directory error: {0}")]
    DirectoryError(#[from] DirectoryError),

    /// Request failed validation
    #[error("{0}")]
    ValidationError(#[from] ExecuteError),

    /// Fetcher error
    #[error("fetcher error: {0}")]
    FetcherError(#[from] FetcherError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
