//! Validation failures must abort before any HTTP activity

use async_trait::async_trait;
use chrono::NaiveDate;
use coin_ohlcv_downloader::directory::{AssetRef, InMemoryDirectory};
use coin_ohlcv_downloader::executor::{ExecuteError, FetchExecutor, FetchRequest};
use coin_ohlcv_downloader::fetcher::{BatchLoader, FetcherResult};
use coin_ohlcv_downloader::normalize::HistoricalResponse;
use coin_ohlcv_downloader::planner::Batch;
use coin_ohlcv_downloader::progress::NoopProgress;
use coin_ohlcv_downloader::DateWindow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Loader that records how often it was reached.
struct CountingLoader {
    calls: AtomicUsize,
}

#[async_trait]
impl BatchLoader for CountingLoader {
    async fn load(&self, _batch: &Batch) -> FetcherResult<HistoricalResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(HistoricalResponse::default())
    }
}

fn directory() -> InMemoryDirectory {
    InMemoryDirectory::new(vec![AssetRef {
        id: 1,
        slug: "bitcoin".to_string(),
        name: "Bitcoin".to_string(),
        symbol: "BTC".to_string(),
        first_historical_data: None,
        last_historical_data: None,
    }])
}

fn request(start: (i32, u32, u32), end: (i32, u32, u32)) -> FetchRequest {
    FetchRequest {
        window: DateWindow::new(
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        ),
        interval: "daily".to_string(),
        convert: vec!["USD".to_string()],
        limit: None,
        single_mode: false,
        final_cooldown: false,
    }
}

#[tokio::test]
async fn test_end_before_floor_aborts_before_any_request() {
    let loader = Arc::new(CountingLoader {
        calls: AtomicUsize::new(0),
    });
    let executor = FetchExecutor::new(loader.clone());

    // 2013-04-28 is one day before the data floor.
    let error = executor
        .execute(&request((2013, 4, 1), (2013, 4, 28)), &directory(), &NoopProgress)
        .await
        .unwrap_err();

    assert!(matches!(error, ExecuteError::Validation(_)));
    assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_inverted_window_aborts_before_any_request() {
    let loader = Arc::new(CountingLoader {
        calls: AtomicUsize::new(0),
    });
    let executor = FetchExecutor::new(loader.clone());

    let error = executor
        .execute(&request((2020, 2, 1), (2020, 1, 1)), &directory(), &NoopProgress)
        .await
        .unwrap_err();

    assert!(matches!(error, ExecuteError::Validation(_)));
    assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_directory_issues_no_requests() {
    let loader = Arc::new(CountingLoader {
        calls: AtomicUsize::new(0),
    });
    let executor = FetchExecutor::new(loader.clone());

    let result = executor
        .execute(
            &request((2020, 1, 1), (2020, 1, 10)),
            &InMemoryDirectory::new(vec![]),
            &NoopProgress,
        )
        .await
        .unwrap();

    assert!(result.points.is_empty());
    assert_eq!(result.report.batches_total, 0);
    assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
}
