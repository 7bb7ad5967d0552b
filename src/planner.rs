//! Batch capacity planning and request URL construction.
//!
//! The endpoint caps every response at a fixed number of rows and, in
//! practice, rejects over-long request URLs. Both ceilings are folded into a
//! single batch count: the larger of the row-limit term and the URL-length
//! term. Assets are then spread round-robin so batch sizes differ by at most
//! one and no batch is biased toward low- or high-indexed assets.

use crate::interval::IntervalSpec;
use crate::{DateWindow, TimePeriod};
use serde::Serialize;

/// Server-side capacity constraints, kept as configurable policy because the
/// actual limits are undocumented and may drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerLimits {
    /// Maximum rows the server returns per request
    pub max_rows: u32,
    /// Practical request URL length budget, in characters
    pub url_budget: u32,
    /// Characters reserved for fixed URL scaffolding (scheme, path, params)
    pub url_overhead: u32,
    /// Estimated characters per comma-joined asset id
    pub id_width: u32,
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            max_rows: 10_000,
            url_budget: 2_000,
            url_overhead: 142,
            id_width: 6,
        }
    }
}

/// Fixed parts of the request URL, shared by every batch of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTemplate {
    /// Endpoint base URL, without query string
    pub endpoint: String,
    /// Reference currencies for the `convert` parameter
    pub convert: Vec<String>,
    /// `time_start` in UNIX seconds
    pub time_start: i64,
    /// `time_end` in UNIX seconds
    pub time_end: i64,
    /// Resolved interval token
    pub interval: String,
    /// Resolved sampling granularity
    pub time_period: TimePeriod,
}

impl RequestTemplate {
    /// Build a template from the resolved interval spec and window.
    pub fn new(
        endpoint: impl Into<String>,
        convert: Vec<String>,
        window: DateWindow,
        spec: &IntervalSpec,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            convert,
            time_start: window.time_start_unix(),
            time_end: window.time_end_unix(),
            interval: spec.token.clone(),
            time_period: spec.time_period,
        }
    }

    /// Substitute a group of asset ids into the URL template. Parameter
    /// order matches the endpoint's documented form.
    pub fn url_for_ids(&self, ids: &[u64]) -> String {
        let id_list = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}?convert={}&time_end={}&time_start={}&interval={}&time_period={}&id={}",
            self.endpoint,
            self.convert.join(","),
            self.time_end,
            self.time_start,
            self.interval,
            self.time_period,
            id_list
        )
    }
}

/// One HTTP request covering a group of assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Batch {
    /// Asset ids covered by this request, in round-robin assignment order
    pub asset_ids: Vec<u64>,
    /// Fully built request URL
    pub request_url: String,
}

/// Number of batches needed for `asset_count` assets at the given expected
/// point count, honoring both the row limit and the URL length budget.
pub fn batch_count(asset_count: usize, points_per_window: f64, limits: &ServerLimits) -> usize {
    if asset_count == 0 {
        return 0;
    }

    let k = asset_count as f64;

    // Row-limit term: how many assets fit under max_rows per response. An
    // interval producing more points than max_rows still gets one asset per
    // batch rather than a zero divisor.
    let rows_per_batch = (f64::from(limits.max_rows) / points_per_window)
        .floor()
        .max(1.0);
    let row_term = (k / rows_per_batch).ceil();

    // URL-length term: how many ids fit in the remaining character budget.
    let ids_per_url =
        f64::from(limits.url_budget - limits.url_overhead) / f64::from(limits.id_width);
    let url_term = (k / ids_per_url).ceil();

    row_term.max(url_term) as usize
}

/// Partition assets into batches and build each batch's request URL.
///
/// With `single_mode`, every asset gets its own batch regardless of capacity
/// math, giving callers an isolated failure domain per asset. Otherwise the
/// two-term capacity formula decides the batch count and assets are assigned
/// round-robin (`index mod n`), so sizes differ by at most one.
pub fn plan(
    asset_ids: &[u64],
    spec: &IntervalSpec,
    template: &RequestTemplate,
    single_mode: bool,
    limits: &ServerLimits,
) -> Vec<Batch> {
    if asset_ids.is_empty() {
        return Vec::new();
    }

    let n = if single_mode {
        asset_ids.len()
    } else {
        batch_count(asset_ids.len(), spec.points_per_window, limits)
    };

    let mut groups: Vec<Vec<u64>> = vec![Vec::new(); n];
    for (index, id) in asset_ids.iter().enumerate() {
        groups[index % n].push(*id);
    }

    groups
        .into_iter()
        .map(|ids| Batch {
            request_url: template.url_for_ids(&ids),
            asset_ids: ids,
        })
        .collect()
}
