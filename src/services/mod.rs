//! Service layer for the stock watcher.
//!
//! This module contains the business logic for:
//! - Page classification (`AvailabilityChecker`, `CheckerRegistry`)
//! - Page retrieval (`PageFetcher`, `HttpFetcher`)
//! - Per-source probing (`SourceRunner`)

mod availability;
mod fetcher;
mod runner;

pub use availability::{AvailabilityChecker, CheckerRegistry, RuleChecker};
pub use fetcher::{HttpFetcher, PageFetcher};
pub use runner::{RunnerOptions, SourceReport, SourceRunner, SourceStatus};
