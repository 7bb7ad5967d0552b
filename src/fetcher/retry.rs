//! Retry classification and log message formatting.
//!
//! Retry noise is easy to make useless; these helpers keep every retry and
//! failure line in one consistent shape: what failed, which attempt, which
//! batch, and how long until the next try.

use reqwest::{Error as ReqwestError, StatusCode};
use std::time::Duration;

/// Classification of fetch errors for user messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryErrorType {
    /// Network timeout
    NetworkTimeout,
    /// Connection refused, DNS failure, or other offline scenarios
    NetworkOffline,
    /// HTTP 429 rate limit exceeded
    RateLimit,
    /// HTTP 5xx server error
    ServerError(u16),
    /// HTTP 4xx client error (except 429)
    ClientError(u16),
    /// Response body was not valid JSON for the expected shape
    MalformedBody,
    /// Generic fallback when no better classification fits
    NetworkGeneric,
}

impl RetryErrorType {
    /// User-facing description used inside retry log messages.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "network timeout",
            Self::NetworkOffline => "connection failed",
            Self::RateLimit => "rate limit exceeded",
            Self::ServerError(code) => match code {
                500 => "internal server error",
                502 => "bad gateway",
                503 => "service unavailable",
                504 => "gateway timeout",
                _ => "server error",
            },
            Self::ClientError(code) => match code {
                404 => "resource not found",
                451 => "unavailable due to restrictions",
                _ => "client error",
            },
            Self::MalformedBody => "malformed response body",
            Self::NetworkGeneric => "network error",
        }
    }
}

/// Derive a [`RetryErrorType`] from an HTTP status or reqwest error.
pub fn extract_error_type(status: Option<StatusCode>, err: Option<&ReqwestError>) -> RetryErrorType {
    if let Some(status) = status {
        if status.as_u16() == 429 {
            return RetryErrorType::RateLimit;
        }
        if status.is_server_error() {
            return RetryErrorType::ServerError(status.as_u16());
        }
        if status.is_client_error() {
            return RetryErrorType::ClientError(status.as_u16());
        }
    }

    if let Some(err) = err {
        if err.is_timeout() {
            return RetryErrorType::NetworkTimeout;
        }
        if err.is_connect() {
            return RetryErrorType::NetworkOffline;
        }
        if err.is_decode() {
            return RetryErrorType::MalformedBody;
        }
    }

    RetryErrorType::NetworkGeneric
}

/// Context for formatting retry messages for one batch attempt.
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// Current attempt number (1-based)
    pub attempt: u32,
    /// Maximum number of attempts configured
    pub max_attempts: u32,
    /// Type of error that triggered the retry
    pub error_type: RetryErrorType,
    /// Fixed wait until the next attempt
    pub wait: Duration,
    /// Position of the batch in issue order (0-based)
    pub batch_index: usize,
    /// Number of assets the batch covers
    pub asset_count: usize,
    /// Original error message for details
    pub error_message: String,
}

impl RetryContext {
    /// Standardized retry line with attempt counters and batch context.
    pub fn format_retry(&self) -> String {
        format!(
            "Retrying batch {} ({} assets) after {} - attempt {}/{}, waiting {:.1} seconds",
            self.batch_index + 1,
            self.asset_count,
            self.error_type.description(),
            self.attempt,
            self.max_attempts,
            self.wait.as_secs_f64()
        )
    }

    /// Final failure line once all attempts are exhausted.
    pub fn format_failure(&self) -> String {
        format!(
            "Batch {} ({} assets) failed after {} attempts: {}",
            self.batch_index + 1,
            self.asset_count,
            self.max_attempts,
            self.error_message
        )
    }
}
