//! Interval token resolution and date-window validation.
//!
//! The endpoint accepts a fixed vocabulary of interval tokens, each mapping
//! to a `time_period` granularity (hourly or daily) and a divisor applied to
//! the raw bucket count of the window. The table below is the server's
//! contract and must not drift.

use crate::report::Advisory;
use crate::{data_floor, DateWindow, TimePeriod};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::warn;

/// Token substituted when the requested interval is unrecognized.
pub const DEFAULT_INTERVAL: &str = "daily";

/// Interval token vocabulary: token → (granularity, divisor).
static INTERVAL_TABLE: Lazy<HashMap<&'static str, (TimePeriod, u32)>> = Lazy::new(|| {
    HashMap::from([
        ("hourly", (TimePeriod::Hourly, 1)),
        ("1h", (TimePeriod::Hourly, 1)),
        ("2h", (TimePeriod::Hourly, 2)),
        ("3h", (TimePeriod::Hourly, 3)),
        ("4h", (TimePeriod::Hourly, 4)),
        ("6h", (TimePeriod::Hourly, 6)),
        ("12h", (TimePeriod::Hourly, 1)),
        ("daily", (TimePeriod::Daily, 1)),
        ("weekly", (TimePeriod::Daily, 7)),
        ("monthly", (TimePeriod::Daily, 30)),
        ("yearly", (TimePeriod::Daily, 365)),
        ("1d", (TimePeriod::Daily, 1)),
        ("2d", (TimePeriod::Daily, 2)),
        ("3d", (TimePeriod::Daily, 3)),
        ("7d", (TimePeriod::Daily, 7)),
        ("14d", (TimePeriod::Daily, 14)),
        ("15d", (TimePeriod::Daily, 15)),
        ("30d", (TimePeriod::Daily, 30)),
        ("60d", (TimePeriod::Daily, 60)),
        ("90d", (TimePeriod::Daily, 90)),
        ("365d", (TimePeriod::Daily, 365)),
    ])
});

/// Validation errors that abort a run before any request is issued.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    /// End date predates the earliest available data
    #[error("end date {end} predates data floor {floor}; no data exists for this window")]
    EndBeforeFloor {
        /// Requested end date
        end: NaiveDate,
        /// The floor it predates
        floor: NaiveDate,
    },

    /// Window start is after its end
    #[error("window start {start} is after end {end}")]
    InvertedWindow {
        /// Requested start date
        start: NaiveDate,
        /// Requested end date
        end: NaiveDate,
    },
}

/// Canonical sampling parameters derived from an interval token and window.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalSpec {
    /// Token actually used (after any substitution), passed through to the
    /// request URL verbatim
    pub token: String,
    /// Granularity for the `time_period` query parameter
    pub time_period: TimePeriod,
    /// Divisor applied to the raw bucket count
    pub divisor: u32,
    /// Expected data points per asset for the window at this interval
    pub points_per_window: f64,
}

/// Outcome of interval resolution: the spec plus any advisories raised.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Canonical sampling parameters
    pub spec: IntervalSpec,
    /// Non-fatal conditions observed while resolving
    pub advisories: Vec<Advisory>,
}

/// Resolve an interval token and date window into canonical sampling
/// parameters.
///
/// Fatal: the window ends before the data floor, or is inverted. Advisory:
/// the window starts before the floor, or the token is unrecognized (the
/// default `daily` is substituted). Resolution is deterministic for a given
/// `(token, window)` pair.
pub fn resolve(token: &str, window: DateWindow) -> Result<Resolution, ResolveError> {
    let floor = data_floor();

    if window.start > window.end {
        return Err(ResolveError::InvertedWindow {
            start: window.start,
            end: window.end,
        });
    }

    if window.end < floor {
        return Err(ResolveError::EndBeforeFloor {
            end: window.end,
            floor,
        });
    }

    let mut advisories = Vec::new();

    if window.start < floor {
        warn!(
            start = %window.start,
            floor = %floor,
            "window starts before the data floor; early buckets may be empty"
        );
        advisories.push(Advisory::StartBeforeFloor {
            start: window.start,
            floor,
        });
    }

    let (canonical, (time_period, divisor)) = match INTERVAL_TABLE.get_key_value(token) {
        Some((key, entry)) => (*key, *entry),
        None => {
            warn!(token, substituted = DEFAULT_INTERVAL, "unrecognized interval token");
            advisories.push(Advisory::UnknownInterval {
                token: token.to_string(),
                substituted: DEFAULT_INTERVAL.to_string(),
            });
            (
                DEFAULT_INTERVAL,
                INTERVAL_TABLE[DEFAULT_INTERVAL],
            )
        }
    };

    let raw_points = match time_period {
        TimePeriod::Hourly => window.hourly_points(),
        TimePeriod::Daily => window.daily_points(),
    };

    Ok(Resolution {
        spec: IntervalSpec {
            token: canonical.to_string(),
            time_period,
            divisor,
            points_per_window: raw_points as f64 / f64::from(divisor),
        },
        advisories,
    })
}
