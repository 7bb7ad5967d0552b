//! Asset directory collaborator.
//!
//! Discovery of the asset universe is outside this crate's scope; callers
//! supply it through [`AssetDirectory`]. The directory is consumed once at
//! the start of a run: its id order determines request order and its slugs
//! enrich the normalized records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// One entry of the asset directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    /// Numeric id, unique within the directory
    pub id: u64,
    /// URL slug (e.g. "bitcoin")
    pub slug: String,
    /// Display name (e.g. "Bitcoin")
    pub name: String,
    /// Ticker symbol (e.g. "BTC")
    pub symbol: String,
    /// First date the endpoint has data for this asset, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_historical_data: Option<NaiveDate>,
    /// Last date the endpoint has data for this asset, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_historical_data: Option<NaiveDate>,
}

/// Directory loading errors.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// File could not be read
    #[error("failed to read directory file: {0}")]
    IoError(#[from] std::io::Error),

    /// File contents were not a valid asset list
    #[error("failed to parse directory file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Source of the asset universe for a run.
pub trait AssetDirectory {
    /// All known assets, in the order requests should cover them.
    fn assets(&self) -> &[AssetRef];

    /// Id → slug lookup used for result enrichment.
    fn slug_map(&self) -> HashMap<u64, String> {
        self.assets()
            .iter()
            .map(|asset| (asset.id, asset.slug.clone()))
            .collect()
    }
}

/// Directory backed by an in-memory asset list.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    assets: Vec<AssetRef>,
}

impl InMemoryDirectory {
    /// Wrap an asset list.
    pub fn new(assets: Vec<AssetRef>) -> Self {
        Self { assets }
    }
}

impl AssetDirectory for InMemoryDirectory {
    fn assets(&self) -> &[AssetRef] {
        &self.assets
    }
}

/// Directory loaded from a JSON file containing an array of [`AssetRef`]s.
#[derive(Debug, Clone)]
pub struct JsonFileDirectory {
    assets: Vec<AssetRef>,
}

impl JsonFileDirectory {
    /// Load and parse the directory file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DirectoryError> {
        let contents = std::fs::read_to_string(path)?;
        let assets: Vec<AssetRef> = serde_json::from_str(&contents)?;
        Ok(Self { assets })
    }
}

impl AssetDirectory for JsonFileDirectory {
    fn assets(&self) -> &[AssetRef] {
        &self.assets
    }
}
