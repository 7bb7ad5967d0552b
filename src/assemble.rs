//! Final assembly of normalized records into the result set.
//!
//! Concatenation preserves batch-completion order only; callers needing a
//! deterministic order sort by `(asset_id, ref_currency, timestamp)`. The
//! optional trailing cooldown keeps an immediately following run out of the
//! endpoint's abuse-detection window; it is a plain in-process pause with no
//! persisted state.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

use crate::report::{ResultSet, RunMetadata, RunReport};
use crate::QuotePoint;

/// Fixed pause applied when a final cooldown is requested.
pub const FINAL_COOLDOWN: Duration = Duration::from_secs(60);

/// Concatenate normalized groups, enrich slugs, and optionally cool down.
///
/// Slug enrichment is a left join: an asset id unknown to the directory
/// keeps its records with `slug = None` rather than dropping them.
pub async fn assemble(
    groups: Vec<Vec<QuotePoint>>,
    slug_by_id: &HashMap<u64, String>,
    final_cooldown: bool,
    metadata: RunMetadata,
    report: RunReport,
) -> ResultSet {
    let mut points: Vec<QuotePoint> = groups.into_iter().flatten().collect();

    for point in &mut points {
        point.slug = slug_by_id.get(&point.asset_id).cloned();
    }

    info!(
        points = points.len(),
        batches = report.batches_total,
        failed = report.batches_failed,
        advisories = report.advisories.len(),
        "run assembled"
    );

    if final_cooldown {
        info!(
            seconds = FINAL_COOLDOWN.as_secs(),
            "cooling down before returning"
        );
        sleep(FINAL_COOLDOWN).await;
    }

    ResultSet {
        points,
        metadata,
        report,
    }
}
