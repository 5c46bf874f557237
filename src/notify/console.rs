// src/notify/console.rs

use async_trait::async_trait;

use crate::error::Result;
use crate::notify::{NotificationEvent, Notifier};

/// Writes notifications to the log instead of a messaging channel.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, event: &NotificationEvent) -> Result<()> {
        log::info!(
            "=== Notification: {} ===\n{}",
            event.source_key,
            event.render_text()
        );
        Ok(())
    }
}
