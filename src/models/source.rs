// src/models/source.rs

//! Source (retailer) definitions and their per-source policies.

use serde::{Deserialize, Serialize};

use crate::models::{AvailabilityRule, Product};

/// How a source's product pages are probed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyPolicy {
    /// One page at a time; for origins that time out under parallel load
    #[default]
    Sequential,
    /// All pages together, joined before the source completes
    Parallel,
}

/// When a change to a source's in-stock set is worth a notification.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotifyPolicy {
    /// Any addition or removal, as long as something is in stock
    #[default]
    Strict,
    /// Any addition or removal, once more than `n` items are in stock
    Threshold(usize),
}

impl NotifyPolicy {
    /// Number of in-stock items that must be exceeded.
    pub fn floor(&self) -> usize {
        match self {
            Self::Strict => 0,
            Self::Threshold(n) => *n,
        }
    }
}

/// A configured source, as written in `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Stable key used for persistence and checker lookup (e.g. "SAZEN")
    pub key: String,

    /// Display name (e.g. "Sazen Tea")
    pub name: String,

    /// Inventory file holding this source's products
    pub inventory_file: String,

    #[serde(default)]
    pub concurrency: ConcurrencyPolicy,

    /// Upper bound on in-flight fetches for `parallel` sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent: Option<usize>,

    #[serde(default)]
    pub policy: NotifyPolicy,

    /// Keep the previous baseline when every fetch for this source fails
    #[serde(default)]
    pub hold_when_unreachable: bool,

    /// Extraction rule for product pages
    pub rule: AvailabilityRule,
}

/// A source resolved for one run, with its products loaded.
#[derive(Debug, Clone)]
pub struct Source {
    pub key: String,
    pub name: String,
    pub products: Vec<Product>,
    pub concurrency: ConcurrencyPolicy,
    pub max_concurrent: Option<usize>,
    pub policy: NotifyPolicy,
    pub hold_when_unreachable: bool,
}

impl Source {
    /// Attach a product list to a configured source.
    pub fn from_config(config: &SourceConfig, products: Vec<Product>) -> Self {
        Self {
            key: config.key.clone(),
            name: config.name.clone(),
            products,
            concurrency: config.concurrency,
            max_concurrent: config.max_concurrent,
            policy: config.policy,
            hold_when_unreachable: config.hold_when_unreachable,
        }
    }

    /// Number of products owned by this source.
    pub fn product_count(&self) -> usize {
        self.products.len()
    }
}
