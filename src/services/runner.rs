// src/services/runner.rs

//! Source runner.
//!
//! Fetches every product page of one source, following the source's
//! concurrency policy, and classifies each page with the source's checker.
//! A failed or timed-out fetch marks that product unavailable and never
//! aborts the rest of the source.

use std::collections::BTreeSet;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::models::{ConcurrencyPolicy, FetcherConfig, Product, Source};
use crate::services::{AvailabilityChecker, CheckerRegistry, PageFetcher};

/// Timing settings applied to every fetch.
#[derive(Debug, Clone, Copy)]
pub struct RunnerOptions {
    /// Deadline for a single page fetch
    pub fetch_timeout: Duration,
    /// Pause between fetches of a sequential source
    pub request_delay: Duration,
}

impl RunnerOptions {
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self {
            fetch_timeout: Duration::from_secs(config.timeout_secs),
            request_delay: Duration::from_millis(config.request_delay_ms),
        }
    }
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self::from_config(&FetcherConfig::default())
    }
}

/// Whether the source could be observed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    Checked,
    /// Every product fetch failed
    Unreachable,
}

/// Outcome of probing one source.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source_key: String,
    /// In-stock products, in inventory order
    pub in_stock: Vec<Product>,
    /// URLs of `in_stock`
    pub in_stock_keys: BTreeSet<String>,
    /// Products attempted
    pub checked: usize,
    /// Fetches that failed or timed out
    pub failures: usize,
}

impl SourceReport {
    pub fn status(&self) -> SourceStatus {
        if self.checked > 0 && self.failures == self.checked {
            SourceStatus::Unreachable
        } else {
            SourceStatus::Checked
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    InStock,
    OutOfStock,
    Failed,
}

/// Probes the products of a source.
pub struct SourceRunner<'a> {
    fetcher: &'a dyn PageFetcher,
    registry: &'a CheckerRegistry,
    options: RunnerOptions,
}

impl<'a> SourceRunner<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        registry: &'a CheckerRegistry,
        options: RunnerOptions,
    ) -> Self {
        Self {
            fetcher,
            registry,
            options,
        }
    }

    /// Check every product of `source`.
    pub async fn run_source(&self, source: &Source) -> SourceReport {
        let Some(checker) = self.registry.get(&source.key) else {
            log::warn!(
                "No availability checker for {}; treating all {} products as unavailable",
                source.key,
                source.product_count()
            );
            return SourceReport {
                source_key: source.key.clone(),
                in_stock: Vec::new(),
                in_stock_keys: BTreeSet::new(),
                checked: 0,
                failures: 0,
            };
        };
        let checker = checker.as_ref();

        log::info!(
            "Checking {} products on {} ({:?})",
            source.product_count(),
            source.name,
            source.concurrency
        );

        let probes = match source.concurrency {
            ConcurrencyPolicy::Sequential => self.probe_sequential(checker, &source.products).await,
            ConcurrencyPolicy::Parallel => {
                let limit = source
                    .max_concurrent
                    .unwrap_or(source.products.len())
                    .max(1);
                self.probe_parallel(checker, &source.products, limit).await
            }
        };

        let mut report = SourceReport {
            source_key: source.key.clone(),
            in_stock: Vec::new(),
            in_stock_keys: BTreeSet::new(),
            checked: probes.len(),
            failures: 0,
        };

        for (product, probe) in source.products.iter().zip(probes) {
            match probe {
                Probe::InStock => {
                    report.in_stock_keys.insert(product.url.clone());
                    report.in_stock.push(product.clone());
                }
                Probe::OutOfStock => {}
                Probe::Failed => report.failures += 1,
            }
        }

        if report.failures > 0 {
            log::warn!(
                "{}: {} of {} product pages could not be fetched",
                source.name,
                report.failures,
                report.checked
            );
        }
        report
    }

    async fn probe_sequential(
        &self,
        checker: &dyn AvailabilityChecker,
        products: &[Product],
    ) -> Vec<Probe> {
        let mut probes = Vec::with_capacity(products.len());
        for (i, product) in products.iter().enumerate() {
            if i > 0 && !self.options.request_delay.is_zero() {
                tokio::time::sleep(self.options.request_delay).await;
            }
            probes.push(self.probe(checker, product).await);
        }
        probes
    }

    async fn probe_parallel(
        &self,
        checker: &dyn AvailabilityChecker,
        products: &[Product],
        limit: usize,
    ) -> Vec<Probe> {
        // `buffered` keeps results in input order and waits for all of them.
        stream::iter(products)
            .map(|product| self.probe(checker, product))
            .buffered(limit)
            .collect()
            .await
    }

    async fn probe(&self, checker: &dyn AvailabilityChecker, product: &Product) -> Probe {
        match self.fetch_page(&product.url).await {
            Ok(page) if checker.is_in_stock(product, &page) => Probe::InStock,
            Ok(_) => Probe::OutOfStock,
            Err(e) => {
                log::warn!("Failed to fetch {} ({}): {}", product.name, product.url, e);
                Probe::Failed
            }
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        match tokio::time::timeout(self.options.fetch_timeout, self.fetcher.fetch(url)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout {
                url: url.to_string(),
                secs: self.options.fetch_timeout.as_secs_f64(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        IN_STOCK_PAGE, Page, SOLD_OUT_PAGE, ScriptedFetcher, product_url, test_source,
        test_source_config,
    };

    fn registry(keys: &[&str]) -> CheckerRegistry {
        let configs: Vec<_> = keys.iter().map(|k| test_source_config(k)).collect();
        CheckerRegistry::from_sources(&configs).unwrap()
    }

    fn options() -> RunnerOptions {
        RunnerOptions {
            fetch_timeout: Duration::from_millis(200),
            request_delay: Duration::ZERO,
        }
    }

    fn urls(report: &SourceReport) -> Vec<&str> {
        report.in_stock.iter().map(|p| p.url.as_str()).collect()
    }

    #[tokio::test]
    async fn test_preserves_inventory_order() {
        let source = test_source("X", &["c", "a", "b", "d"]);
        let fetcher = ScriptedFetcher::new()
            .page(&product_url("X", "c"), Page::Body(IN_STOCK_PAGE))
            .page(&product_url("X", "a"), Page::Body(SOLD_OUT_PAGE))
            .page(&product_url("X", "b"), Page::Body(IN_STOCK_PAGE))
            .page(&product_url("X", "d"), Page::Body(IN_STOCK_PAGE));
        let registry = registry(&["X"]);

        let report = SourceRunner::new(&fetcher, &registry, options())
            .run_source(&source)
            .await;

        assert_eq!(
            urls(&report),
            vec![
                product_url("X", "c"),
                product_url("X", "b"),
                product_url("X", "d")
            ]
        );
        assert_eq!(report.in_stock_keys.len(), 3);
        assert_eq!(report.checked, 4);
        assert_eq!(report.failures, 0);
        assert_eq!(report.status(), SourceStatus::Checked);
    }

    #[tokio::test]
    async fn test_failure_isolated() {
        let mut source = test_source("X", &["a", "b", "c"]);
        source.concurrency = ConcurrencyPolicy::Parallel;
        let fetcher = ScriptedFetcher::new()
            .page(&product_url("X", "a"), Page::Body(IN_STOCK_PAGE))
            .page(&product_url("X", "b"), Page::Error)
            .page(&product_url("X", "c"), Page::Body(IN_STOCK_PAGE));
        let registry = registry(&["X"]);

        let report = SourceRunner::new(&fetcher, &registry, options())
            .run_source(&source)
            .await;

        assert_eq!(urls(&report), vec![product_url("X", "a"), product_url("X", "c")]);
        assert_eq!(report.failures, 1);
        assert_eq!(fetcher.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let source = test_source("X", &["slow", "fast"]);
        let fetcher = ScriptedFetcher::new()
            .page(&product_url("X", "slow"), Page::Hang)
            .page(&product_url("X", "fast"), Page::Body(IN_STOCK_PAGE));
        let registry = registry(&["X"]);

        let report = SourceRunner::new(&fetcher, &registry, options())
            .run_source(&source)
            .await;

        assert_eq!(urls(&report), vec![product_url("X", "fast")]);
        assert_eq!(report.failures, 1);
    }

    #[tokio::test]
    async fn test_sequential_one_at_a_time() {
        let source = test_source("X", &["a", "b", "c"]);
        let fetcher = ScriptedFetcher::new().with_latency(Duration::from_millis(10));
        let registry = registry(&["X"]);

        SourceRunner::new(&fetcher, &registry, options())
            .run_source(&source)
            .await;

        assert_eq!(fetcher.peak_in_flight(), 1);
        assert_eq!(
            fetcher.calls(),
            vec![
                product_url("X", "a"),
                product_url("X", "b"),
                product_url("X", "c")
            ]
        );
    }

    #[tokio::test]
    async fn test_parallel_overlaps_fetches() {
        let mut source = test_source("X", &["a", "b", "c", "d"]);
        source.concurrency = ConcurrencyPolicy::Parallel;
        let fetcher = ScriptedFetcher::new().with_latency(Duration::from_millis(50));
        let registry = registry(&["X"]);

        SourceRunner::new(&fetcher, &registry, options())
            .run_source(&source)
            .await;

        assert_eq!(fetcher.peak_in_flight(), 4);
    }

    #[tokio::test]
    async fn test_parallel_respects_bound() {
        let mut source = test_source("X", &["a", "b", "c", "d", "e"]);
        source.concurrency = ConcurrencyPolicy::Parallel;
        source.max_concurrent = Some(2);
        let fetcher = ScriptedFetcher::new().with_latency(Duration::from_millis(20));
        let registry = registry(&["X"]);

        SourceRunner::new(&fetcher, &registry, options())
            .run_source(&source)
            .await;

        assert_eq!(fetcher.peak_in_flight(), 2);
        assert_eq!(fetcher.calls().len(), 5);
    }

    #[tokio::test]
    async fn test_all_failed_is_unreachable() {
        let source = test_source("X", &["a", "b"]);
        let fetcher = ScriptedFetcher::new();
        let registry = registry(&["X"]);

        let report = SourceRunner::new(&fetcher, &registry, options())
            .run_source(&source)
            .await;

        assert!(report.in_stock.is_empty());
        assert_eq!(report.status(), SourceStatus::Unreachable);
    }

    #[tokio::test]
    async fn test_empty_source_is_checked() {
        let source = test_source("X", &[]);
        let fetcher = ScriptedFetcher::new();
        let registry = registry(&["X"]);

        let report = SourceRunner::new(&fetcher, &registry, options())
            .run_source(&source)
            .await;

        assert_eq!(report.status(), SourceStatus::Checked);
        assert!(report.in_stock_keys.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_source_skips_fetching() {
        let source = test_source("UNKNOWN", &["a"]);
        let fetcher = ScriptedFetcher::new()
            .page(&product_url("UNKNOWN", "a"), Page::Body(IN_STOCK_PAGE));
        let registry = registry(&["X"]);

        let report = SourceRunner::new(&fetcher, &registry, options())
            .run_source(&source)
            .await;

        assert!(report.in_stock.is_empty());
        assert!(fetcher.calls().is_empty());
    }
}
