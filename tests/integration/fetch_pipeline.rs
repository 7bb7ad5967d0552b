//! End-to-end pipeline tests over a mock transport

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate};
use coin_ohlcv_downloader::directory::{AssetDirectory, AssetRef, InMemoryDirectory};
use coin_ohlcv_downloader::executor::{FetchExecutor, FetchRequest};
use coin_ohlcv_downloader::fetcher::{BatchLoader, FetchPolicy, FetcherError, FetcherResult};
use coin_ohlcv_downloader::normalize::HistoricalResponse;
use coin_ohlcv_downloader::planner::Batch;
use coin_ohlcv_downloader::progress::NoopProgress;
use coin_ohlcv_downloader::{Advisory, DateWindow};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn test_policy() -> FetchPolicy {
    FetchPolicy {
        sleep_interval: Duration::ZERO,
        retry_wait: Duration::from_millis(1),
        max_attempts: 3,
    }
}

fn directory() -> InMemoryDirectory {
    let asset = |id: u64, slug: &str, name: &str, symbol: &str| AssetRef {
        id,
        slug: slug.to_string(),
        name: name.to_string(),
        symbol: symbol.to_string(),
        first_historical_data: None,
        last_historical_data: None,
    };
    InMemoryDirectory::new(vec![
        asset(1, "bitcoin", "Bitcoin", "BTC"),
        asset(1027, "ethereum", "Ethereum", "ETH"),
        asset(1839, "binance-coin", "Binance Coin", "BNB"),
    ])
}

fn request(window: DateWindow, single_mode: bool) -> FetchRequest {
    FetchRequest {
        window,
        interval: "daily".to_string(),
        convert: vec!["USD".to_string()],
        limit: None,
        single_mode,
        final_cooldown: false,
    }
}

fn january_window() -> DateWindow {
    DateWindow::new(
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2020, 1, 10).unwrap(),
    )
}

/// Build one asset's payload with daily quotes over the window.
fn asset_payload(asset: &AssetRef, start: NaiveDate, days: i64) -> Value {
    let quotes: Vec<Value> = (0..days)
        .map(|offset| {
            let day = start + ChronoDuration::days(offset);
            let stamp = |time: &str| format!("{day}T{time}");
            json!({
                "time_open": stamp("00:00:00.000Z"),
                "time_close": stamp("23:59:59.999Z"),
                "time_high": stamp("12:00:00.000Z"),
                "time_low": stamp("06:00:00.000Z"),
                "quote": {
                    "USD": {
                        "open": 100.0 + offset as f64,
                        "high": 110.0 + offset as f64,
                        "low": 90.0 + offset as f64,
                        "close": 105.0 + offset as f64,
                        "volume": 1_000_000.0,
                        "market_cap": 10_000_000.0,
                        "timestamp": stamp("23:59:59.999Z"),
                    }
                }
            })
        })
        .collect();

    json!({
        "id": asset.id,
        "name": asset.name,
        "symbol": asset.symbol,
        "quotes": quotes,
    })
}

/// Mock transport serving synthetic payloads for the test directory.
struct MockLoader {
    assets: Vec<AssetRef>,
    start: NaiveDate,
    days: i64,
    empty_ids: HashSet<u64>,
    fail_ids: HashSet<u64>,
    calls: AtomicUsize,
}

impl MockLoader {
    fn new(directory: &InMemoryDirectory, start: NaiveDate, days: i64) -> Self {
        Self {
            assets: directory.assets().to_vec(),
            start,
            days,
            empty_ids: HashSet::new(),
            fail_ids: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    fn with_empty(mut self, id: u64) -> Self {
        self.empty_ids.insert(id);
        self
    }

    fn with_failing(mut self, id: u64) -> Self {
        self.fail_ids.insert(id);
        self
    }
}

#[async_trait]
impl BatchLoader for MockLoader {
    async fn load(&self, batch: &Batch) -> FetcherResult<HistoricalResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if batch.asset_ids.iter().any(|id| self.fail_ids.contains(id)) {
            return Err(FetcherError::HttpStatus(500));
        }

        let mut data = serde_json::Map::new();
        for id in &batch.asset_ids {
            let Some(asset) = self.assets.iter().find(|asset| asset.id == *id) else {
                continue;
            };
            let payload = if self.empty_ids.contains(id) {
                json!({"id": asset.id, "name": asset.name, "symbol": asset.symbol, "quotes": []})
            } else {
                asset_payload(asset, self.start, self.days)
            };
            data.insert(id.to_string(), payload);
        }

        let response = json!({"data": data, "status": {"error_code": 0}});
        Ok(serde_json::from_value(response).expect("synthetic response is valid"))
    }
}

#[tokio::test]
async fn test_small_run_completes_in_one_batch() {
    let directory = directory();
    let loader = Arc::new(MockLoader::new(&directory, january_window().start, 10));
    let executor = FetchExecutor::new(loader.clone()).with_policy(test_policy());

    let result = executor
        .execute(&request(january_window(), false), &directory, &NoopProgress)
        .await
        .unwrap();

    assert_eq!(result.report.batches_total, 1);
    assert_eq!(loader.calls.load(Ordering::SeqCst), 1);

    // One point per asset per day, single currency.
    assert_eq!(result.points.len(), 30);
    assert!(result.points.len() <= 3 * 10);
    assert!(result.report.advisories.is_empty());
}

#[tokio::test]
async fn test_slugs_enriched_from_directory() {
    let directory = directory();
    let loader = Arc::new(MockLoader::new(&directory, january_window().start, 10));
    let executor = FetchExecutor::new(loader).with_policy(test_policy());

    let result = executor
        .execute(&request(january_window(), false), &directory, &NoopProgress)
        .await
        .unwrap();

    let bitcoin = result.points.iter().find(|p| p.asset_id == 1).unwrap();
    assert_eq!(bitcoin.slug.as_deref(), Some("bitcoin"));
    assert_eq!(bitcoin.name, "Bitcoin");
    assert_eq!(bitcoin.symbol, "BTC");
}

#[tokio::test]
async fn test_empty_quotes_excluded_with_one_advisory() {
    let directory = directory();
    let loader =
        Arc::new(MockLoader::new(&directory, january_window().start, 10).with_empty(1027));
    let executor = FetchExecutor::new(loader).with_policy(test_policy());

    let result = executor
        .execute(&request(january_window(), false), &directory, &NoopProgress)
        .await
        .unwrap();

    // The empty asset contributes nothing; the others are untouched.
    assert!(result.points.iter().all(|p| p.asset_id != 1027));
    assert_eq!(result.points.len(), 20);

    let empty_advisories: Vec<_> = result
        .report
        .advisories
        .iter()
        .filter(|advisory| matches!(advisory, Advisory::EmptyQuotes { asset_id: 1027 }))
        .collect();
    assert_eq!(empty_advisories.len(), 1);
}

#[tokio::test]
async fn test_failed_batch_absorbed_with_partial_results() {
    let directory = directory();
    let loader =
        Arc::new(MockLoader::new(&directory, january_window().start, 10).with_failing(1839));
    let executor = FetchExecutor::new(loader.clone()).with_policy(test_policy());

    // Single mode isolates the failure to one asset's batch.
    let result = executor
        .execute(&request(january_window(), true), &directory, &NoopProgress)
        .await
        .unwrap();

    assert_eq!(result.report.batches_total, 3);
    assert_eq!(result.report.batches_failed, 1);

    // Two healthy batches once each, the failing batch three attempts.
    assert_eq!(loader.calls.load(Ordering::SeqCst), 5);

    // Other batches' records are present.
    assert_eq!(result.points.len(), 20);
    assert!(result.points.iter().any(|p| p.asset_id == 1));
    assert!(result.points.iter().any(|p| p.asset_id == 1027));

    assert!(result.report.advisories.iter().any(|advisory| matches!(
        advisory,
        Advisory::BatchFailed { asset_ids, .. } if asset_ids == &vec![1839]
    )));
}

#[tokio::test]
async fn test_limit_caps_the_asset_universe() {
    let directory = directory();
    let loader = Arc::new(MockLoader::new(&directory, january_window().start, 10));
    let executor = FetchExecutor::new(loader).with_policy(test_policy());

    let mut req = request(january_window(), false);
    req.limit = Some(2);
    let result = executor
        .execute(&req, &directory, &NoopProgress)
        .await
        .unwrap();

    let ids: HashSet<u64> = result.points.iter().map(|p| p.asset_id).collect();
    assert_eq!(ids, HashSet::from([1, 1027]));
}

#[tokio::test]
async fn test_progress_advances_once_per_batch() {
    use coin_ohlcv_downloader::progress::ProgressObserver;

    struct Recorder(AtomicUsize);
    impl ProgressObserver for Recorder {
        fn batch_completed(&self, completed: usize, total: usize) {
            assert!(completed <= total);
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let directory = directory();
    let loader =
        Arc::new(MockLoader::new(&directory, january_window().start, 10).with_failing(1839));
    let executor = FetchExecutor::new(loader).with_policy(test_policy());

    let observer = Recorder(AtomicUsize::new(0));
    executor
        .execute(&request(january_window(), true), &directory, &observer)
        .await
        .unwrap();

    // Three single-mode batches, failed ones included.
    assert_eq!(observer.0.load(Ordering::SeqCst), 3);
}
