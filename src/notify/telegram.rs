// src/notify/telegram.rs

//! Telegram Bot API notifier.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::notify::{NotificationEvent, Notifier};

const API_BASE: &str = "https://api.telegram.org";

/// Bot API limit on the length of one message.
const MAX_MESSAGE_CHARS: usize = 4096;

/// Sends notifications to a Telegram chat via `sendMessage`.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(client: Client, bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            client,
            api_base: API_BASE.to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Point at a different Bot API server (e.g. a local one).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        // The endpoint embeds the bot token; keep it out of error text.
        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Http(e.without_url()))?;
        let status = response.status();
        let reply: ApiResponse = response.json().await.map_err(|e| {
            AppError::notify(format!(
                "Telegram replied with HTTP {status}: {}",
                e.without_url()
            ))
        })?;

        if !reply.ok {
            return Err(AppError::notify(format!(
                "Telegram rejected message (HTTP {}): {}",
                status,
                reply.description.unwrap_or_else(|| "no description".into())
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, event: &NotificationEvent) -> Result<()> {
        let message = event.render_html();
        for chunk in split_message(&message, MAX_MESSAGE_CHARS) {
            self.send_text(&chunk).await?;
        }
        log::info!(
            "Telegram notification sent for {} ({} products)",
            event.source_key,
            event.products.len()
        );
        Ok(())
    }
}

/// Split at line boundaries so each part stays within `limit` characters.
///
/// A single line longer than `limit` is cut into `limit`-sized parts.
fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();

        if line_len > limit {
            log::warn!(
                "Message line of {} characters exceeds the {} limit; cutting it",
                line_len,
                limit
            );
            if !current.is_empty() {
                parts.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = line.chars().collect();
            parts.extend(chars.chunks(limit.max(1)).map(|c| c.iter().collect::<String>()));
            continue;
        }

        let needed = if current.is_empty() { line_len } else { line_len + 1 };
        if !current.is_empty() && current_len + needed > limit {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}
