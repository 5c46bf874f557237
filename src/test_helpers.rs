//! A set of helpers for testing

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{ConcurrencyPolicy, NotifyPolicy, Product, Source};
use crate::notify::{NotificationEvent, Notifier};
use crate::services::PageFetcher;
use crate::storage::{StockLedger, StockSnapshot};

/// Page body that passes the `button_label` rule used by [`test_source`].
pub const IN_STOCK_PAGE: &str = "<html><body><button>Add to cart</button></body></html>";

/// Page body that fails it.
pub const SOLD_OUT_PAGE: &str = "<html><body><button>Sold out</button></body></html>";

/// Scripted response for one URL.
#[derive(Debug, Clone)]
pub enum Page {
    Body(&'static str),
    Error,
    Hang,
}

/// A fetcher that serves scripted pages and records its traffic.
#[derive(Default)]
pub struct ScriptedFetcher {
    pages: Mutex<HashMap<String, Page>>,
    latency: Duration,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn page(self, url: &str, page: Page) -> Self {
        self.set(url, page);
        self
    }

    /// Replace the scripted page for `url`.
    pub fn set(&self, url: &str, page: Page) {
        self.pages.lock().unwrap().insert(url.to_string(), page);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let page = self.pages.lock().unwrap().get(url).cloned();
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let result = match page {
            Some(Page::Body(body)) => Ok(body.to_string()),
            Some(Page::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
            Some(Page::Error) | None => Err(AppError::fetch(url, "connection refused")),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Ledger held in memory, optionally failing on load or save.
#[derive(Default)]
pub struct MemoryLedger {
    snapshot: Mutex<Option<StockSnapshot>>,
    saves: AtomicUsize,
    fail_load: bool,
    fail_save: bool,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: StockSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            ..Self::default()
        }
    }

    pub fn failing_load() -> Self {
        Self {
            fail_load: true,
            ..Self::default()
        }
    }

    pub fn failing_save() -> Self {
        Self {
            fail_save: true,
            ..Self::default()
        }
    }

    pub fn stored(&self) -> Option<StockSnapshot> {
        self.snapshot.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StockLedger for MemoryLedger {
    async fn load(&self) -> Result<StockSnapshot> {
        if self.fail_load {
            return Err(AppError::ledger("disk unavailable"));
        }
        Ok(self.stored().unwrap_or_default())
    }

    async fn save(&self, snapshot: &StockSnapshot) -> Result<()> {
        if self.fail_save {
            return Err(AppError::ledger("disk full"));
        }
        *self.snapshot.lock().unwrap() = Some(snapshot.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Notifier that records events, optionally failing for some sources.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<NotificationEvent>>,
    failing_sources: Vec<String>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(sources: &[&str]) -> Self {
        Self {
            failing_sources: sources.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, event: &NotificationEvent) -> Result<()> {
        self.events.lock().unwrap().push(event.clone());
        if self.failing_sources.contains(&event.source_key) {
            return Err(AppError::notify("chat not found"));
        }
        Ok(())
    }
}

/// Product owned by `source` at `https://{source}.example/{slug}`.
pub fn product(source: &str, slug: &str) -> Product {
    Product {
        source: source.to_string(),
        manufacturer: format!("{source} Maker"),
        name: slug.to_string(),
        url: product_url(source, slug),
    }
}

pub fn product_url(source: &str, slug: &str) -> String {
    format!("https://{}.example/{}", source.to_lowercase(), slug)
}

/// A source with one product per slug.
pub fn test_source(key: &str, slugs: &[&str]) -> Source {
    Source {
        key: key.to_string(),
        name: format!("{key} Shop"),
        products: slugs.iter().map(|s| product(key, s)).collect(),
        concurrency: ConcurrencyPolicy::Sequential,
        max_concurrent: None,
        policy: NotifyPolicy::Strict,
        hold_when_unreachable: false,
    }
}

/// `SourceConfig` matching [`test_source`], using a `button_label` rule.
pub fn test_source_config(key: &str) -> crate::models::SourceConfig {
    crate::models::SourceConfig {
        key: key.to_string(),
        name: format!("{key} Shop"),
        inventory_file: format!("{}.json", key.to_lowercase()),
        concurrency: ConcurrencyPolicy::Sequential,
        max_concurrent: None,
        policy: NotifyPolicy::Strict,
        hold_when_unreachable: false,
        rule: crate::models::AvailabilityRule::ButtonLabel {
            selector: "button".to_string(),
            label: "Add to cart".to_string(),
        },
    }
}
