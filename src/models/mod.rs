// src/models/mod.rs

//! Domain models for the stock watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod product;
mod rule;
mod source;

// Re-export all public types
pub use config::{Config, FetcherConfig, NotifierConfig, PathsConfig};
pub use product::{Product, ProductSummary};
pub use rule::AvailabilityRule;
pub use source::{ConcurrencyPolicy, NotifyPolicy, Source, SourceConfig};
