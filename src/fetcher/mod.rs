//! Data fetching: HTTP transport, request pacing, and the resilient
//! per-batch pipeline.

use crate::normalize::HistoricalResponse;
use crate::planner::Batch;
use async_trait::async_trait;

pub mod http;
pub mod pacer;
pub mod pipeline;
pub mod retry;

pub use pipeline::{BatchOutcome, FetchPolicy, ResilientFetcher};

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// HTTP request error (non-2xx status)
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),

    /// Response parse error
    #[error("parse error: {0}")]
    ParseError(String),

    /// Network error (timeout, connection refused, DNS failure)
    #[error("network error: {0}")]
    NetworkError(String),

    /// Rate limit exceeded (HTTP 429)
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// API-level error reported inside a 2xx response body
    #[error("API error: {0}")]
    ApiError(String),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Transport seam: turns one [`Batch`] into one as-received response
/// document. Production code uses [`http::OhlcvHttpClient`]; tests
/// substitute mock loaders.
#[async_trait]
pub trait BatchLoader: Send + Sync {
    /// Issue the batch's request and deserialize the response.
    async fn load(&self, batch: &Batch) -> FetcherResult<HistoricalResponse>;
}
