//! Storage abstractions for the stock baseline and product inventory.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml           # Sources, rules and fetcher settings
//! ├── previous_stock.json   # Ledger: in-stock URLs per source, last run
//! ├── sazen-matcha.json     # Inventory: products of one source
//! └── ippodo-matcha.json
//! ```

pub mod inventory;
pub mod local;

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// Re-export for convenience
pub use inventory::{InventoryProvider, JsonInventory};
pub use local::JsonLedger;

/// In-stock product URLs per source key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockSnapshot {
    sources: BTreeMap<String, BTreeSet<String>>,
}

impl StockSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot with an empty set for each key.
    pub fn empty_for<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            sources: keys
                .into_iter()
                .map(|k| (k.to_string(), BTreeSet::new()))
                .collect(),
        }
    }

    /// Keep exactly `keys`: absent sources become empty, unknown ones are dropped.
    pub fn restricted_to<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            sources: keys
                .into_iter()
                .map(|k| (k.to_string(), self.get(k).clone()))
                .collect(),
        }
    }

    /// In-stock URLs for a source; empty when the source has no record.
    pub fn get(&self, key: &str) -> &BTreeSet<String> {
        static EMPTY: BTreeSet<String> = BTreeSet::new();
        self.sources.get(key).unwrap_or(&EMPTY)
    }

    /// Replace the set for a source.
    pub fn insert(&mut self, key: impl Into<String>, urls: BTreeSet<String>) {
        self.sources.insert(key.into(), urls);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.sources.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl<K: Into<String>, V: IntoIterator<Item = String>> FromIterator<(K, V)> for StockSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            sources: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into_iter().collect()))
                .collect(),
        }
    }
}

/// Durable store for the comparison baseline.
///
/// Read once when a run starts and replaced once when it ends. A single
/// writer is assumed.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Load the last saved snapshot. A ledger that was never written yields
    /// an empty snapshot.
    async fn load(&self) -> Result<StockSnapshot>;

    /// Replace the stored snapshot with `snapshot`.
    async fn save(&self, snapshot: &StockSnapshot) -> Result<()>;
}
