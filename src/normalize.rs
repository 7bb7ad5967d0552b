//! Normalization of nested response payloads into flat records.
//!
//! The endpoint nests quotes twice: per asset, then per reference currency
//! inside each time bucket. Normalization flattens that into one
//! [`QuotePoint`] per (currency, bucket), copying the asset's `id`, `name`,
//! and `symbol` from the response envelope, which is authoritative for those
//! fields at fetch time.
//!
//! Output is grouped by reference currency (outer, sorted) then source
//! order (inner). That makes normalization deterministic and idempotent,
//! but not chronological across currencies; consumers needing time order
//! must sort.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::warn;

use crate::report::Advisory;
use crate::QuotePoint;

/// As-received response document for one batch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoricalResponse {
    /// Per-asset payloads, keyed by stringified asset id
    #[serde(default)]
    pub data: HashMap<String, AssetPayload>,
    /// API status envelope, when present
    #[serde(default)]
    pub status: Option<ApiStatus>,
}

impl HistoricalResponse {
    /// Look up one asset's payload by numeric id.
    pub fn asset(&self, id: u64) -> Option<&AssetPayload> {
        self.data.get(&id.to_string())
    }
}

/// API status envelope carried alongside the data.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiStatus {
    /// Zero or absent on success
    #[serde(default)]
    pub error_code: Option<i64>,
    /// Human-readable failure description
    #[serde(default)]
    pub error_message: Option<String>,
}

/// One asset's slice of a batch response.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetPayload {
    /// Numeric asset id
    pub id: u64,
    /// Asset name as the server knows it
    pub name: String,
    /// Ticker symbol as the server knows it
    pub symbol: String,
    /// Time buckets, in server order
    #[serde(default)]
    pub quotes: Vec<QuoteEntry>,
}

/// One time bucket with its per-currency quote map.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteEntry {
    /// Bucket open time
    pub time_open: String,
    /// Bucket close time
    pub time_close: String,
    /// Time of the bucket high
    pub time_high: String,
    /// Time of the bucket low
    pub time_low: String,
    /// OHLCV values keyed by reference currency
    #[serde(default)]
    pub quote: BTreeMap<String, QuoteValues>,
}

/// OHLCV values in one reference currency.
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteValues {
    /// Opening price
    pub open: Decimal,
    /// Highest price
    pub high: Decimal,
    /// Lowest price
    pub low: Decimal,
    /// Closing price
    pub close: Decimal,
    /// Traded volume
    #[serde(default)]
    pub volume: Decimal,
    /// Market capitalization
    #[serde(default)]
    pub market_cap: Decimal,
    /// Bucket timestamp
    pub timestamp: String,
}

/// Normalization errors
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// Timestamp field could not be parsed
    #[error("invalid timestamp '{value}': {detail}")]
    InvalidTimestamp {
        /// The offending field value
        value: String,
        /// Underlying parse failure
        detail: String,
    },
}

/// Parse a timestamp-bearing field: ISO 8601 `YYYY-MM-DDTHH:MM:SS`, with
/// fractional seconds and a trailing `Z` tolerated.
fn parse_point_time(value: &str) -> Result<DateTime<Utc>, NormalizeError> {
    let trimmed = value.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|dt| dt.and_utc())
        .map_err(|e| NormalizeError::InvalidTimestamp {
            value: value.to_string(),
            detail: e.to_string(),
        })
}

/// Flatten one asset's payload into quote points.
///
/// An absent payload or one with zero quote entries is not an error: it
/// raises exactly one advisory naming the asset and yields no records.
/// Malformed timestamps are errors for this asset alone; the caller
/// absorbs them the same way it absorbs batch failures.
pub fn normalize(
    asset_id: u64,
    payload: Option<&AssetPayload>,
    advisories: &mut Vec<Advisory>,
) -> Result<Vec<QuotePoint>, NormalizeError> {
    let payload = match payload {
        Some(payload) if !payload.quotes.is_empty() => payload,
        _ => {
            warn!(asset_id, "no quotes in payload, skipping asset");
            advisories.push(Advisory::EmptyQuotes { asset_id });
            return Ok(Vec::new());
        }
    };

    let currencies: BTreeSet<&String> = payload
        .quotes
        .iter()
        .flat_map(|entry| entry.quote.keys())
        .collect();

    let mut points = Vec::new();
    for currency in currencies {
        for entry in &payload.quotes {
            let Some(values) = entry.quote.get(currency) else {
                continue;
            };
            points.push(QuotePoint {
                timestamp: parse_point_time(&values.timestamp)?,
                ref_currency: currency.clone(),
                open: values.open,
                high: values.high,
                low: values.low,
                close: values.close,
                volume: values.volume,
                market_cap: values.market_cap,
                time_open: parse_point_time(&entry.time_open)?,
                time_close: parse_point_time(&entry.time_close)?,
                time_high: parse_point_time(&entry.time_high)?,
                time_low: parse_point_time(&entry.time_low)?,
                asset_id: payload.id,
                name: payload.name.clone(),
                symbol: payload.symbol.clone(),
                slug: None,
            });
        }
    }

    Ok(points)
}
