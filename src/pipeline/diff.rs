//! Change detection between stock snapshots.
//!
//! Compares a source's previous in-stock URL set with the current one and
//! decides, under the source's [`NotifyPolicy`], whether the change is worth
//! a notification.
//!
//! - `Strict`: the sets differ and something is in stock
//! - `Threshold(k)`: the sets differ and more than `k` items are in stock
//!
//! `Threshold(0)` behaves exactly like `Strict`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{NotifyPolicy, Product};
use crate::services::SourceReport;

/// URLs that entered or left the in-stock set.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StockDelta {
    /// In current but not in previous
    pub added: Vec<String>,
    /// In previous but not in current
    pub removed: Vec<String>,
}

impl StockDelta {
    /// Check if there are any changes.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }

    /// Get the total number of changes.
    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len()
    }
}

/// Per-source result of change detection.
#[derive(Debug, Clone)]
pub struct ChangeOutcome {
    pub source_key: String,
    /// Products currently in stock, in inventory order
    pub in_stock: Vec<Product>,
    pub delta: StockDelta,
    pub significant: bool,
}

/// Applies a notification policy to snapshot changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector {
    policy: NotifyPolicy,
}

impl ChangeDetector {
    pub fn new(policy: NotifyPolicy) -> Self {
        Self { policy }
    }

    /// Detector for the strict-change policy.
    pub fn strict() -> Self {
        Self::new(NotifyPolicy::Strict)
    }

    /// Detector that ignores changes while at most `threshold` items are in stock.
    pub fn threshold(threshold: usize) -> Self {
        Self::new(NotifyPolicy::Threshold(threshold))
    }

    pub fn policy(&self) -> NotifyPolicy {
        self.policy
    }

    /// Whether moving from `previous` to `current` should be announced.
    pub fn is_significant(&self, previous: &BTreeSet<String>, current: &BTreeSet<String>) -> bool {
        previous != current && current.len() > self.policy.floor()
    }

    /// Calculate the delta between two sets.
    pub fn delta(previous: &BTreeSet<String>, current: &BTreeSet<String>) -> StockDelta {
        StockDelta {
            added: current.difference(previous).cloned().collect(),
            removed: previous.difference(current).cloned().collect(),
        }
    }

    /// Evaluate a source report against the previous baseline.
    pub fn evaluate(&self, previous: &BTreeSet<String>, report: &SourceReport) -> ChangeOutcome {
        ChangeOutcome {
            source_key: report.source_key.clone(),
            in_stock: report.in_stock.clone(),
            delta: Self::delta(previous, &report.in_stock_keys),
            significant: self.is_significant(previous, &report.in_stock_keys),
        }
    }
}

/// Convenience function to test significance under a policy.
pub fn is_significant(
    previous: &BTreeSet<String>,
    current: &BTreeSet<String>,
    policy: NotifyPolicy,
) -> bool {
    ChangeDetector::new(policy).is_significant(previous, current)
}
