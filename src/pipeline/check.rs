// src/pipeline/check.rs

//! Stock check passes driven by a configuration and a storage directory.

use std::path::Path;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::models::Config;
use crate::notify::Notifier;
use crate::pipeline::load::load_sources;
use crate::pipeline::run::{RunContext, RunReport, run_once};
use crate::services::{CheckerRegistry, PageFetcher, RunnerOptions, SourceStatus};
use crate::storage::{JsonInventory, JsonLedger};
use crate::utils::log::{header, separator, sub_item, summary};
use crate::utils::time;

/// Run one stock check pass.
///
/// The ledger lives at `{storage_dir}/{paths.ledger_file}` and inventories
/// under `{storage_dir}/{paths.inventory_dir}`.
pub async fn run_check(
    config: &Config,
    storage_dir: &Path,
    fetcher: &dyn PageFetcher,
    notifier: &dyn Notifier,
) -> Result<RunReport> {
    header("Stock check starting");

    config.validate()?;
    let registry = CheckerRegistry::from_sources(&config.sources)?;
    let inventory = JsonInventory::new(storage_dir.join(&config.paths.inventory_dir));
    let sources = load_sources(&config.sources, &inventory).await?;
    let ledger = JsonLedger::new(storage_dir.join(&config.paths.ledger_file));

    let total: usize = sources.iter().map(|s| s.product_count()).sum();
    log::info!("Loaded {} sources with {} products", sources.len(), total);

    let timestamp = time::now_in(config.notifier.utc_offset_minutes)?;
    let ctx = RunContext {
        registry: &registry,
        fetcher,
        ledger: &ledger,
        notifier,
        options: RunnerOptions::from_config(&config.fetcher),
    };
    let report = run_once(&ctx, &sources, timestamp).await?;

    log_report(&report);
    Ok(report)
}

/// Counters for a finished watch loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchStats {
    pub passes: usize,
    pub failed: usize,
}

/// Run passes every `interval` until `max_passes` is reached, or forever.
///
/// A failed pass is logged and the next one still runs. Passes never overlap.
pub async fn run_watch(
    config: &Config,
    storage_dir: &Path,
    fetcher: &dyn PageFetcher,
    notifier: &dyn Notifier,
    interval: Duration,
    max_passes: Option<usize>,
) -> WatchStats {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut stats = WatchStats::default();
    while max_passes.is_none_or(|max| stats.passes < max) {
        ticker.tick().await;

        stats.passes += 1;
        if let Err(e) = run_check(config, storage_dir, fetcher, notifier).await {
            stats.failed += 1;
            log::error!("Stock check pass {} failed: {}", stats.passes, e);
        }
        log::debug!("Next pass in {:?}", interval);
    }
    stats
}

fn log_report(report: &RunReport) {
    separator();
    for source in &report.sources {
        let status = match (source.status, source.held) {
            (SourceStatus::Unreachable, true) => "unreachable, baseline held",
            (SourceStatus::Unreachable, false) => "unreachable",
            (SourceStatus::Checked, _) if source.notified => "notified",
            (SourceStatus::Checked, _) if source.significant => "changed, not notified",
            (SourceStatus::Checked, _) => "unchanged",
        };
        sub_item(&format!(
            "{}: {}/{} in stock, {} failed, {}",
            source.name,
            source.in_stock,
            source.checked,
            source.failures,
            status
        ));
    }

    summary(
        "Stock check complete",
        &[
            ("Timestamp", time::format_timestamp(&report.timestamp)),
            ("Sources", report.sources.len().to_string()),
            (
                "In stock",
                report
                    .sources
                    .iter()
                    .map(|s| s.in_stock)
                    .sum::<usize>()
                    .to_string(),
            ),
            ("Notifications sent", report.notifications_sent.to_string()),
            (
                "Notification failures",
                report.notification_failures.to_string(),
            ),
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StockLedger;
    use crate::test_helpers::{
        IN_STOCK_PAGE, Page, RecordingNotifier, SOLD_OUT_PAGE, ScriptedFetcher, product_url,
        test_source_config,
    };
    use tempfile::TempDir;

    fn setup() -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        let products = format!(
            r#"[
                {{"website": "X", "manufacturer": "M", "name": "A", "url": "{}"}},
                {{"website": "X", "manufacturer": "M", "name": "B", "url": "{}"}}
            ]"#,
            product_url("X", "a"),
            product_url("X", "b")
        );
        std::fs::write(dir.path().join("x.json"), products).unwrap();

        let mut config = Config {
            sources: vec![test_source_config("X")],
            ..Config::default()
        };
        config.fetcher.timeout_secs = 1;
        (dir, config)
    }

    fn fetcher() -> ScriptedFetcher {
        ScriptedFetcher::new()
            .page(&product_url("X", "a"), Page::Body(IN_STOCK_PAGE))
            .page(&product_url("X", "b"), Page::Body(SOLD_OUT_PAGE))
    }

    #[tokio::test]
    async fn test_check_writes_ledger_and_notifies() {
        let (dir, config) = setup();
        let notifier = RecordingNotifier::new();

        let report = run_check(&config, dir.path(), &fetcher(), &notifier)
            .await
            .unwrap();

        assert_eq!(report.notifications_sent, 1);
        assert_eq!(notifier.events()[0].products[0].name, "A");

        let ledger = JsonLedger::new(dir.path().join(&config.paths.ledger_file));
        let stored = ledger.load().await.unwrap();
        assert_eq!(stored, report.snapshot);
        assert!(stored.get("X").contains(&product_url("X", "a")));
    }

    #[tokio::test]
    async fn test_invalid_config_aborts_before_fetching() {
        let (dir, mut config) = setup();
        config.fetcher.timeout_secs = 0;
        let fetcher = fetcher();

        let result = run_check(&config, dir.path(), &fetcher, &RecordingNotifier::new()).await;

        assert!(result.is_err());
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_watch_notifies_once_for_stable_stock() {
        let (dir, config) = setup();
        let notifier = RecordingNotifier::new();

        let stats = run_watch(
            &config,
            dir.path(),
            &fetcher(),
            &notifier,
            Duration::from_millis(10),
            Some(3),
        )
        .await;

        assert_eq!(stats, WatchStats { passes: 3, failed: 0 });
        assert_eq!(notifier.events().len(), 1);
    }

    #[tokio::test]
    async fn test_watch_continues_after_failed_pass() {
        let (dir, config) = setup();
        std::fs::write(dir.path().join(&config.paths.ledger_file), "not json").unwrap();
        let notifier = RecordingNotifier::new();

        let stats = run_watch(
            &config,
            dir.path(),
            &fetcher(),
            &notifier,
            Duration::from_millis(10),
            Some(2),
        )
        .await;

        assert_eq!(stats, WatchStats { passes: 2, failed: 2 });
        assert!(notifier.events().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_config_keeps_ledger() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "[[sources]]\nkey = \"NOISY\"\nname = ").unwrap();
        let ledger_path = dir.path().join("previous_stock.json");
        let saved = r#"{"NOISY":["https://noisy.example/a"]}"#;
        std::fs::write(&ledger_path, saved).unwrap();

        assert!(Config::load_or_default(&config_path).is_err());
        assert_eq!(std::fs::read_to_string(&ledger_path).unwrap(), saved);
    }
}
