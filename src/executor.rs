//! Fetch orchestration: resolve → plan → fetch → normalize → assemble.
//!
//! The executor owns the run lifecycle. Validation is the only fatal
//! failure; everything downstream of planning degrades to advisories so a
//! run always completes with whatever data survived.

use std::sync::Arc;
use tracing::{info, warn};

use crate::assemble::assemble;
use crate::directory::AssetDirectory;
use crate::fetcher::{BatchLoader, FetchPolicy, ResilientFetcher};
use crate::interval::{self, ResolveError};
use crate::normalize::normalize;
use crate::planner::{self, RequestTemplate, ServerLimits};
use crate::progress::ProgressObserver;
use crate::report::{Advisory, ResultSet, RunMetadata, RunReport};
use crate::DateWindow;

/// Default historical OHLCV endpoint.
pub const DEFAULT_ENDPOINT: &str =
    "https://web-api.coinmarketcap.com/v1.1/cryptocurrency/ohlcv/historical";

/// Errors that abort a run before any request is issued.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// Request window or interval failed validation
    #[error("validation error: {0}")]
    Validation(#[from] ResolveError),
}

/// What one run should fetch.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Inclusive date range
    pub window: DateWindow,
    /// Interval token (unrecognized tokens fall back to daily)
    pub interval: String,
    /// Reference currencies for the `convert` parameter
    pub convert: Vec<String>,
    /// Cap on the number of directory assets queried
    pub limit: Option<usize>,
    /// One request per asset, bypassing capacity math
    pub single_mode: bool,
    /// Pause 60 seconds before returning
    pub final_cooldown: bool,
}

/// Orchestrates the complete fetch workflow over an injected transport.
pub struct FetchExecutor {
    loader: Arc<dyn BatchLoader>,
    policy: FetchPolicy,
    limits: ServerLimits,
    endpoint: String,
}

impl FetchExecutor {
    /// Create an executor with default policy, limits, and endpoint.
    pub fn new(loader: Arc<dyn BatchLoader>) -> Self {
        Self {
            loader,
            policy: FetchPolicy::default(),
            limits: ServerLimits::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Override the fetch discipline (pacing gap, retry wait, attempts).
    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override the assumed server capacity limits.
    pub fn with_limits(mut self, limits: ServerLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Override the endpoint base URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Run the full pipeline for one request.
    ///
    /// Fails only on window/interval validation; fetch and normalization
    /// problems surface as advisories in the returned report.
    pub async fn execute(
        &self,
        request: &FetchRequest,
        directory: &dyn AssetDirectory,
        observer: &dyn ProgressObserver,
    ) -> Result<ResultSet, ExecuteError> {
        let resolution = interval::resolve(&request.interval, request.window)?;
        let mut advisories = resolution.advisories;

        let assets = directory.assets();
        let capped = match request.limit {
            Some(limit) => &assets[..limit.min(assets.len())],
            None => assets,
        };
        let ids: Vec<u64> = capped.iter().map(|asset| asset.id).collect();

        let template = RequestTemplate::new(
            &self.endpoint,
            request.convert.clone(),
            request.window,
            &resolution.spec,
        );
        let batches = planner::plan(
            &ids,
            &resolution.spec,
            &template,
            request.single_mode,
            &self.limits,
        );

        info!(
            assets = ids.len(),
            batches = batches.len(),
            interval = %resolution.spec.token,
            time_period = %resolution.spec.time_period,
            points_per_asset = resolution.spec.points_per_window,
            "run planned"
        );

        let fetcher = ResilientFetcher::new(self.policy);
        let outcomes = fetcher
            .fetch_batches(self.loader.as_ref(), batches, observer)
            .await;

        let batches_total = outcomes.len();
        let mut batches_failed = 0;
        let mut groups = Vec::new();

        for (batch_index, outcome) in outcomes.into_iter().enumerate() {
            match outcome.payload {
                Some(response) => {
                    for id in &outcome.batch.asset_ids {
                        match normalize(*id, response.asset(*id), &mut advisories) {
                            Ok(points) => groups.push(points),
                            Err(error) => {
                                warn!(asset_id = id, %error, "asset skipped");
                                advisories.push(Advisory::MalformedPayload {
                                    asset_id: *id,
                                    detail: error.to_string(),
                                });
                            }
                        }
                    }
                }
                None => {
                    batches_failed += 1;
                    advisories.push(Advisory::BatchFailed {
                        batch_index,
                        asset_ids: outcome.batch.asset_ids.clone(),
                        detail: outcome.last_error.unwrap_or_default(),
                    });
                }
            }
        }

        let metadata = RunMetadata {
            window: request.window,
            interval: resolution.spec.token,
            time_period: resolution.spec.time_period,
            convert: request.convert.clone(),
        };
        let report = RunReport {
            advisories,
            batches_total,
            batches_failed,
        };

        Ok(assemble(
            groups,
            &directory.slug_map(),
            request.final_cooldown,
            metadata,
            report,
        )
        .await)
    }
}
