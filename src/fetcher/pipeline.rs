//! Resilient per-batch fetch pipeline.
//!
//! Three behaviors compose, in order, around every batch request: the pacing
//! delay, a bounded retry loop with a fixed wait, and fallback-to-absent
//! once attempts are exhausted. A failed batch yields an empty outcome, not
//! an error; nothing propagates past the batch boundary, so one dead batch
//! never cancels the rest of the run.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::fetcher::pacer::RequestPacer;
use crate::fetcher::retry::{RetryContext, RetryErrorType};
use crate::fetcher::{BatchLoader, FetcherError};
use crate::normalize::HistoricalResponse;
use crate::planner::Batch;
use crate::progress::ProgressObserver;

/// Default pause before each outbound request.
pub const DEFAULT_SLEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Default wait between retry attempts. Kept above the endpoint's observed
/// 60-second cooldown after abusive request patterns.
pub const DEFAULT_RETRY_WAIT: Duration = Duration::from_secs(70);

/// Attempts per batch: the initial request plus two retries.
pub const MAX_ATTEMPTS: u32 = 3;

/// Tunable fetch discipline for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Pause before each outbound request (zero permitted)
    pub sleep_interval: Duration,
    /// Fixed wait between retry attempts
    pub retry_wait: Duration,
    /// Total attempts per batch before giving up
    pub max_attempts: u32,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            sleep_interval: DEFAULT_SLEEP_INTERVAL,
            retry_wait: DEFAULT_RETRY_WAIT,
            max_attempts: MAX_ATTEMPTS,
        }
    }
}

/// Result of one batch after all attempts: the batch itself, the payload if
/// any attempt succeeded, and the last error text if none did.
#[derive(Debug)]
pub struct BatchOutcome {
    /// The batch as planned
    pub batch: Batch,
    /// Parsed response, absent when every attempt failed
    pub payload: Option<HistoricalResponse>,
    /// Last error observed, present only when the payload is absent
    pub last_error: Option<String>,
}

/// Sequential batch fetcher with pacing, bounded retry, and failure
/// absorption.
pub struct ResilientFetcher {
    policy: FetchPolicy,
    pacer: RequestPacer,
}

impl ResilientFetcher {
    /// Create a fetcher with the given policy.
    pub fn new(policy: FetchPolicy) -> Self {
        Self {
            pacer: RequestPacer::new(policy.sleep_interval),
            policy,
        }
    }

    /// Fetch all batches in order. The observer is advanced exactly once
    /// per batch, success or exhausted-retry failure alike.
    pub async fn fetch_batches(
        &self,
        loader: &dyn BatchLoader,
        batches: Vec<Batch>,
        observer: &dyn ProgressObserver,
    ) -> Vec<BatchOutcome> {
        let total = batches.len();
        let mut outcomes = Vec::with_capacity(total);

        for (index, batch) in batches.into_iter().enumerate() {
            let outcome = match self.fetch_one(loader, &batch, index).await {
                Ok(payload) => BatchOutcome {
                    batch,
                    payload: Some(payload),
                    last_error: None,
                },
                Err(error) => BatchOutcome {
                    batch,
                    payload: None,
                    last_error: Some(error.to_string()),
                },
            };
            observer.batch_completed(index + 1, total);
            outcomes.push(outcome);
        }

        outcomes
    }

    /// One batch through the full discipline: pace, attempt, wait, retry,
    /// give up.
    async fn fetch_one(
        &self,
        loader: &dyn BatchLoader,
        batch: &Batch,
        batch_index: usize,
    ) -> Result<HistoricalResponse, FetcherError> {
        let mut last_error = None;

        for attempt in 1..=self.policy.max_attempts {
            self.pacer.acquire().await;

            match loader.load(batch).await {
                Ok(payload) => {
                    debug!(batch = batch_index + 1, attempt, "batch fetched");
                    return Ok(payload);
                }
                Err(error) => {
                    let context = RetryContext {
                        attempt,
                        max_attempts: self.policy.max_attempts,
                        error_type: classify(&error),
                        wait: self.policy.retry_wait,
                        batch_index,
                        asset_count: batch.asset_ids.len(),
                        error_message: error.to_string(),
                    };

                    if attempt < self.policy.max_attempts {
                        warn!("{}", context.format_retry());
                        sleep(self.policy.retry_wait).await;
                    } else {
                        warn!("{}", context.format_failure());
                    }
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            FetcherError::NetworkError("all attempts exhausted".to_string())
        }))
    }
}

fn classify(error: &FetcherError) -> RetryErrorType {
    match error {
        FetcherError::RateLimitExceeded => RetryErrorType::RateLimit,
        FetcherError::HttpStatus(status) if *status >= 500 => RetryErrorType::ServerError(*status),
        FetcherError::HttpStatus(status) => RetryErrorType::ClientError(*status),
        FetcherError::ParseError(_) => RetryErrorType::MalformedBody,
        FetcherError::NetworkError(_) | FetcherError::ApiError(_) => RetryErrorType::NetworkGeneric,
    }
}
