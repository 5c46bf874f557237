//! Notification events and delivery.
//!
//! The run pipeline emits one [`NotificationEvent`] per source whose in-stock
//! set changed significantly. Delivery is behind the [`Notifier`] trait:
//!
//! - [`TelegramNotifier`]: posts an HTML message through the Bot API
//! - [`ConsoleNotifier`]: writes the plain-text message to the log

pub mod console;
pub mod telegram;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::error::Result;
use crate::models::{Product, ProductSummary, Source};
use crate::utils::time::format_timestamp;

pub use console::ConsoleNotifier;
pub use telegram::TelegramNotifier;

/// A source's in-stock products, ready to be announced.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotificationEvent {
    pub source_key: String,
    pub source_name: String,
    /// In inventory order
    pub products: Vec<ProductSummary>,
    pub timestamp: DateTime<FixedOffset>,
}

impl NotificationEvent {
    pub fn new(source: &Source, products: &[Product], timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            source_key: source.key.clone(),
            source_name: source.name.clone(),
            products: products.iter().map(ProductSummary::from).collect(),
            timestamp,
        }
    }

    /// Plain-text message body.
    pub fn render_text(&self) -> String {
        let list = self
            .products
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{}. {} - {} ({})", i + 1, p.manufacturer, p.name, p.url))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{}\n{} ({}) has items in stock:\n{}",
            format_timestamp(&self.timestamp),
            self.source_name,
            self.source_key,
            list
        )
    }

    /// Telegram-flavoured HTML message body.
    pub fn render_html(&self) -> String {
        let list = self
            .products
            .iter()
            .enumerate()
            .map(|(i, p)| {
                format!(
                    "{}. <a href=\"{}\">{} - {}</a>",
                    i + 1,
                    escape_html(&p.url),
                    escape_html(&p.manufacturer),
                    escape_html(&p.name)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "<b>{}</b>\n\nBack in stock on <b><u>{}</u></b>:\n{}",
            escape_html(&format_timestamp(&self.timestamp)),
            escape_html(&self.source_name),
            list
        )
    }
}

/// Delivers notification events to a channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, event: &NotificationEvent) -> Result<()>;
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
