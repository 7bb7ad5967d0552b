//! Run diagnostics and the externally visible result set.
//!
//! Advisories are the non-fatal half of the error taxonomy: conditions the
//! caller should know about but that never abort a run. They are collected
//! into the [`RunReport`] attached to the [`ResultSet`] and mirrored as
//! `warn!` logs at the point they arise.

use crate::{DateWindow, QuotePoint, TimePeriod};
use chrono::NaiveDate;
use serde::Serialize;

/// Non-fatal diagnostic surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Advisory {
    /// Window start predates the data-availability floor; the server clamps
    /// silently, so early buckets may be missing.
    StartBeforeFloor {
        /// Requested start date
        start: NaiveDate,
        /// The floor it predates
        floor: NaiveDate,
    },
    /// Unrecognized interval token was substituted with the default.
    UnknownInterval {
        /// The token as supplied
        token: String,
        /// The token actually used
        substituted: String,
    },
    /// Asset returned no quote entries (or was absent from the batch
    /// response) and contributes no records.
    EmptyQuotes {
        /// Numeric asset id
        asset_id: u64,
    },
    /// Asset payload could not be normalized (e.g. malformed timestamps)
    /// and was skipped.
    MalformedPayload {
        /// Numeric asset id
        asset_id: u64,
        /// Underlying parse failure
        detail: String,
    },
    /// Batch exhausted all retry attempts and contributes no records.
    BatchFailed {
        /// Position of the batch in issue order (0-based)
        batch_index: usize,
        /// Assets the batch covered
        asset_ids: Vec<u64>,
        /// Last error observed
        detail: String,
    },
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Advisory::StartBeforeFloor { start, floor } => write!(
                f,
                "start date {start} predates data floor {floor}; early buckets may be empty"
            ),
            Advisory::UnknownInterval { token, substituted } => write!(
                f,
                "unrecognized interval '{token}', using '{substituted}' instead"
            ),
            Advisory::EmptyQuotes { asset_id } => {
                write!(f, "asset {asset_id} returned no quotes and was skipped")
            }
            Advisory::MalformedPayload { asset_id, detail } => {
                write!(f, "asset {asset_id} payload could not be normalized: {detail}")
            }
            Advisory::BatchFailed {
                batch_index,
                asset_ids,
                detail,
            } => write!(
                f,
                "batch {} ({} assets) failed all attempts: {detail}",
                batch_index + 1,
                asset_ids.len()
            ),
        }
    }
}

/// Side information describing what a run requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunMetadata {
    /// Requested date window
    pub window: DateWindow,
    /// Interval token actually used (after any substitution)
    pub interval: String,
    /// Resolved sampling granularity
    pub time_period: TimePeriod,
    /// Reference currencies requested via `convert`
    pub convert: Vec<String>,
}

/// Diagnostics accumulated over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// All advisories, in the order they arose
    pub advisories: Vec<Advisory>,
    /// Number of batches issued
    pub batches_total: usize,
    /// Number of batches that exhausted their retries
    pub batches_failed: usize,
}

impl RunReport {
    /// Whether every batch produced a payload.
    pub fn is_complete(&self) -> bool {
        self.batches_failed == 0
    }
}

/// The externally visible artifact of a run: flat records plus metadata.
#[derive(Debug, Clone)]
pub struct ResultSet {
    /// Normalized records in batch-completion order. Callers requiring
    /// determinism must sort by `(asset_id, ref_currency, timestamp)`.
    pub points: Vec<QuotePoint>,
    /// What the run requested
    pub metadata: RunMetadata,
    /// What the run observed
    pub report: RunReport,
}
