//! HTTP transport for batch requests.
//!
//! One GET per batch against the pre-built request URL. The client owns a
//! request timeout so a hanging endpoint bounds a batch's latency instead of
//! stalling the whole run. Retries live a level up in the pipeline; this
//! layer only classifies a single attempt's outcome.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::fetcher::retry::extract_error_type;
use crate::fetcher::{BatchLoader, FetcherError, FetcherResult};
use crate::normalize::HistoricalResponse;
use crate::planner::Batch;

/// HTTP client issuing one request per batch.
pub struct OhlcvHttpClient {
    client: Client,
}

impl OhlcvHttpClient {
    /// Build a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> FetcherResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetcherError::NetworkError(format!("failed to build client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BatchLoader for OhlcvHttpClient {
    async fn load(&self, batch: &Batch) -> FetcherResult<HistoricalResponse> {
        debug!(
            url = %batch.request_url,
            assets = batch.asset_ids.len(),
            "issuing batch request"
        );

        let response = self.client.get(&batch.request_url).send().await.map_err(|e| {
            let kind = extract_error_type(None, Some(&e));
            FetcherError::NetworkError(format!("{}: {e}", kind.description()))
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(FetcherError::RateLimitExceeded);
        }
        if !status.is_success() {
            return Err(FetcherError::HttpStatus(status.as_u16()));
        }

        let payload = response
            .json::<HistoricalResponse>()
            .await
            .map_err(|e| FetcherError::ParseError(format!("failed to deserialize response: {e}")))?;

        if let Some(status) = &payload.status {
            if status.error_code.unwrap_or(0) != 0 {
                return Err(FetcherError::ApiError(
                    status
                        .error_message
                        .clone()
                        .unwrap_or_else(|| format!("error code {:?}", status.error_code)),
                ));
            }
        }

        debug!(assets = payload.data.len(), "batch response parsed");
        Ok(payload)
    }
}
