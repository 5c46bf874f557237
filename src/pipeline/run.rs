// src/pipeline/run.rs

//! One full pass over all sources.
//!
//! 1. Load the previous snapshot from the ledger
//! 2. Probe every source
//! 3. Detect significant changes per source
//! 4. Save the current snapshot (always, exactly once)
//! 5. Notify sources with significant changes
//!
//! Only ledger failures abort a run. They happen before any notification
//! is sent.

use chrono::{DateTime, FixedOffset};
use futures::future::join_all;

use crate::error::Result;
use crate::models::Source;
use crate::notify::{NotificationEvent, Notifier};
use crate::pipeline::diff::{ChangeDetector, ChangeOutcome, StockDelta};
use crate::pipeline::guard::{GuardResult, UnreachableGuard};
use crate::services::{CheckerRegistry, PageFetcher, RunnerOptions, SourceRunner, SourceStatus};
use crate::storage::{StockLedger, StockSnapshot};

/// Collaborators of a run.
pub struct RunContext<'a> {
    pub registry: &'a CheckerRegistry,
    pub fetcher: &'a dyn PageFetcher,
    pub ledger: &'a dyn StockLedger,
    pub notifier: &'a dyn Notifier,
    pub options: RunnerOptions,
}

/// What happened to one source during a run.
#[derive(Debug, Clone)]
pub struct SourceSummary {
    pub key: String,
    pub name: String,
    pub checked: usize,
    pub failures: usize,
    pub in_stock: usize,
    pub status: SourceStatus,
    /// Previous baseline kept because the source was unreachable
    pub held: bool,
    pub delta: StockDelta,
    pub significant: bool,
    pub notified: bool,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub timestamp: DateTime<FixedOffset>,
    pub sources: Vec<SourceSummary>,
    /// Snapshot written to the ledger
    pub snapshot: StockSnapshot,
    pub notifications_sent: usize,
    pub notification_failures: usize,
}

/// Run one pass over `sources`, stamped with `timestamp`.
pub async fn run_once(
    ctx: &RunContext<'_>,
    sources: &[Source],
    timestamp: DateTime<FixedOffset>,
) -> Result<RunReport> {
    let keys: Vec<&str> = sources.iter().map(|s| s.key.as_str()).collect();
    let previous = ctx.ledger.load().await?.restricted_to(keys.iter().copied());

    // Sources share nothing but their own snapshot slot.
    let runner = SourceRunner::new(ctx.fetcher, ctx.registry, ctx.options);
    let reports = join_all(sources.iter().map(|source| runner.run_source(source))).await;

    let mut current = StockSnapshot::empty_for(keys.iter().copied());
    let mut outcomes: Vec<ChangeOutcome> = Vec::with_capacity(sources.len());
    let mut summaries: Vec<SourceSummary> = Vec::with_capacity(sources.len());

    for (source, report) in sources.iter().zip(&reports) {
        let baseline = previous.get(&source.key);

        let (outcome, held) = match UnreachableGuard::for_source(source).check(report) {
            GuardResult::Accept => {
                current.insert(&source.key, report.in_stock_keys.clone());
                (ChangeDetector::new(source.policy).evaluate(baseline, report), false)
            }
            GuardResult::Hold { .. } => {
                current.insert(&source.key, baseline.clone());
                let outcome = ChangeOutcome {
                    source_key: source.key.clone(),
                    in_stock: Vec::new(),
                    delta: StockDelta::default(),
                    significant: false,
                };
                (outcome, true)
            }
        };

        if outcome.significant {
            log::info!(
                "{}: {} in stock (+{} / -{}), notifying",
                source.name,
                outcome.in_stock.len(),
                outcome.delta.added.len(),
                outcome.delta.removed.len()
            );
        } else {
            log::info!(
                "No significant stock change for {} ({} in stock). Skipping message.",
                source.name,
                outcome.in_stock.len()
            );
        }

        summaries.push(SourceSummary {
            key: source.key.clone(),
            name: source.name.clone(),
            checked: report.checked,
            failures: report.failures,
            in_stock: report.in_stock.len(),
            status: report.status(),
            held,
            delta: outcome.delta.clone(),
            significant: outcome.significant,
            notified: false,
        });
        outcomes.push(outcome);
    }

    ctx.ledger.save(&current).await?;

    let mut notifications_sent = 0;
    let mut notification_failures = 0;
    for ((source, outcome), summary) in sources.iter().zip(&outcomes).zip(&mut summaries) {
        if !outcome.significant || outcome.in_stock.is_empty() {
            continue;
        }

        let event = NotificationEvent::new(source, &outcome.in_stock, timestamp);
        match ctx.notifier.send(&event).await {
            Ok(()) => {
                notifications_sent += 1;
                summary.notified = true;
            }
            Err(e) => {
                notification_failures += 1;
                log::error!("Failed to notify for {}: {}", source.name, e);
            }
        }
    }

    Ok(RunReport {
        timestamp,
        sources: summaries,
        snapshot: current,
        notifications_sent,
        notification_failures,
    })
}
