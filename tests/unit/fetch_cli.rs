//! Unit tests for CLI argument parsing

use clap::Parser;
use coin_ohlcv_downloader::cli::{Cli, Commands};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn test_minimal_fetch_args_use_defaults() {
    let cli = parse(&[
        "coin-ohlcv-downloader",
        "fetch",
        "--assets",
        "assets.json",
        "--start-date",
        "20200101",
        "--end-date",
        "20200110",
    ]);

    let Commands::Fetch(args) = cli.command;
    assert_eq!(args.convert, "USD");
    assert_eq!(args.interval, "daily");
    assert_eq!(args.sleep, 1.0);
    assert_eq!(args.wait, 70.0);
    assert_eq!(args.timeout, 30);
    assert!(!args.single);
    assert!(!args.final_cooldown);
    assert_eq!(args.limit, None);
    assert_eq!(args.out.to_str().unwrap(), "quotes.csv");
}

#[test]
fn test_full_flag_surface() {
    let cli = parse(&[
        "coin-ohlcv-downloader",
        "fetch",
        "--assets",
        "assets.json",
        "--out",
        "data/run.csv",
        "--convert",
        "USD,EUR",
        "--limit",
        "50",
        "--start-date",
        "20190601",
        "--end-date",
        "20190901",
        "--interval",
        "weekly",
        "--sleep",
        "2.5",
        "--wait",
        "90",
        "--final-cooldown",
        "--single",
        "--api-url",
        "https://example.test/historical",
        "--timeout",
        "10",
    ]);

    let Commands::Fetch(args) = cli.command;
    assert_eq!(args.convert, "USD,EUR");
    assert_eq!(args.limit, Some(50));
    assert_eq!(args.interval, "weekly");
    assert_eq!(args.sleep, 2.5);
    assert_eq!(args.wait, 90.0);
    assert!(args.single);
    assert!(args.final_cooldown);
    assert_eq!(args.api_url, "https://example.test/historical");
    assert_eq!(args.timeout, 10);
}

#[test]
fn test_dates_must_be_compact_form() {
    let result = Cli::try_parse_from([
        "coin-ohlcv-downloader",
        "fetch",
        "--assets",
        "assets.json",
        "--start-date",
        "2020-01-01",
        "--end-date",
        "20200110",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_negative_sleep_is_rejected() {
    let result = Cli::try_parse_from([
        "coin-ohlcv-downloader",
        "fetch",
        "--assets",
        "assets.json",
        "--start-date",
        "20200101",
        "--end-date",
        "20200110",
        "--sleep",
        "-1",
    ]);
    assert!(result.is_err());
}
