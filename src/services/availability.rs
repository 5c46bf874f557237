// src/services/availability.rs

//! Availability checking against fetched product pages.
//!
//! Each source carries an [`AvailabilityRule`]; the registry compiles it once
//! into a [`RuleChecker`] and hands it out by source key. A page that cannot
//! be classified with confidence (rule markers missing, error or block page)
//! is reported as not in stock.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{AvailabilityRule, Product, SourceConfig};

/// Decides whether a product page reports the item as purchasable.
pub trait AvailabilityChecker: Send + Sync {
    fn is_in_stock(&self, product: &Product, page: &str) -> bool;
}

/// An [`AvailabilityRule`] with its selectors compiled.
#[derive(Debug)]
pub enum RuleChecker {
    MarkerAndAction {
        unavailable: Selector,
        unavailable_text: String,
        action: Selector,
    },
    VisibleElement {
        selector: Selector,
        hidden_style: Regex,
    },
    ButtonLabel {
        selector: Selector,
        label: String,
    },
}

impl RuleChecker {
    /// Compile a rule. Fails on selectors that do not parse.
    pub fn compile(rule: &AvailabilityRule) -> Result<Self> {
        rule.validate()?;

        Ok(match rule {
            AvailabilityRule::MarkerAndAction {
                unavailable_selector,
                unavailable_text,
                action_selector,
            } => Self::MarkerAndAction {
                unavailable: parse_selector(unavailable_selector)?,
                unavailable_text: unavailable_text.trim().to_string(),
                action: parse_selector(action_selector)?,
            },
            AvailabilityRule::VisibleElement { selector } => Self::VisibleElement {
                selector: parse_selector(selector)?,
                hidden_style: Regex::new(r"(?i)display\s*:\s*none")
                    .map_err(|e| AppError::config(format!("hidden style pattern: {e}")))?,
            },
            AvailabilityRule::ButtonLabel { selector, label } => Self::ButtonLabel {
                selector: parse_selector(selector)?,
                label: normalize(label),
            },
        })
    }

    /// Classify a page body.
    pub fn check(&self, page: &str) -> bool {
        let document = Html::parse_document(page);

        match self {
            Self::MarkerAndAction {
                unavailable,
                unavailable_text,
                action,
            } => {
                let marker: String = document
                    .select(unavailable)
                    .map(|el| element_text(&el))
                    .collect::<Vec<_>>()
                    .join(" ");
                !marker.contains(unavailable_text.as_str())
                    && document.select(action).next().is_some()
            }
            Self::VisibleElement {
                selector,
                hidden_style,
            } => document.select(selector).any(|el| {
                let style = el.value().attr("style").unwrap_or("");
                !hidden_style.is_match(style)
            }),
            Self::ButtonLabel { selector, label } => document
                .select(selector)
                .any(|el| normalize(&element_text(&el)).contains(label.as_str())),
        }
    }
}

impl AvailabilityChecker for RuleChecker {
    fn is_in_stock(&self, product: &Product, page: &str) -> bool {
        let in_stock = self.check(page);
        log::debug!(
            "{} [{}]: {}",
            product.name,
            product.url,
            if in_stock { "in stock" } else { "unavailable" }
        );
        in_stock
    }
}

/// Checkers keyed by source key.
#[derive(Clone, Default)]
pub struct CheckerRegistry {
    checkers: HashMap<String, Arc<dyn AvailabilityChecker>>,
}

impl CheckerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile the rule of every configured source.
    pub fn from_sources(sources: &[SourceConfig]) -> Result<Self> {
        let mut registry = Self::new();
        for source in sources {
            let checker = RuleChecker::compile(&source.rule)
                .map_err(|e| AppError::config(format!("Source '{}': {}", source.key, e)))?;
            registry.register(&source.key, Arc::new(checker));
        }
        Ok(registry)
    }

    /// Register (or replace) the checker for a source key.
    pub fn register(&mut self, key: impl Into<String>, checker: Arc<dyn AvailabilityChecker>) {
        self.checkers.insert(key.into(), checker);
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn AvailabilityChecker>> {
        self.checkers.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.checkers.contains_key(key)
    }

    /// Check a page with the checker of `source_key`; unknown sources are never in stock.
    pub fn is_in_stock(&self, source_key: &str, product: &Product, page: &str) -> bool {
        match self.checkers.get(source_key) {
            Some(checker) => checker.is_in_stock(product, page),
            None => {
                log::warn!("No availability checker registered for source '{source_key}'");
                false
            }
        }
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
