//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::SourceConfig;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP fetching behavior settings
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// File locations, relative to the storage directory
    #[serde(default)]
    pub paths: PathsConfig,

    /// Notification delivery settings
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Monitored sources
    #[serde(default = "defaults::default_sources")]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, or the built-in defaults when the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error. Falling
    /// back there would replace the configured sources and drop their
    /// baselines at the next save.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Err(AppError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Config not found at {}. Using defaults.", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(AppError::config(format!(
                "Cannot load {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Override settings from environment variables, where set.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(token) = var("TELEGRAM_BOT_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.notifier.telegram_bot_token = Some(token);
        }
        if let Some(chat_id) = var("TELEGRAM_CHAT_ID").filter(|c| !c.trim().is_empty()) {
            self.notifier.telegram_chat_id = Some(chat_id);
        }
        if let Some(secs) = var("FETCH_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.fetcher.timeout_secs = secs;
        }
        if let Some(ms) = var("REQUEST_DELAY_MS").and_then(|v| v.parse().ok()) {
            self.fetcher.request_delay_ms = ms;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetcher.user_agent is empty"));
        }
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::validation("fetcher.timeout_secs must be > 0"));
        }
        if self.paths.ledger_file.trim().is_empty() {
            return Err(AppError::validation("paths.ledger_file is empty"));
        }
        if self.notifier.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(AppError::validation(
                "notifier.utc_offset_minutes must be within one day",
            ));
        }
        if self.sources.is_empty() {
            return Err(AppError::validation("No sources defined"));
        }

        let mut keys = HashSet::new();
        for source in &self.sources {
            if source.key.trim().is_empty() {
                return Err(AppError::validation("Source with an empty key"));
            }
            if !keys.insert(source.key.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate source key '{}'",
                    source.key
                )));
            }
            if source.inventory_file.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "Source '{}' has no inventory_file",
                    source.key
                )));
            }
            if source.max_concurrent == Some(0) {
                return Err(AppError::validation(format!(
                    "Source '{}': max_concurrent must be > 0",
                    source.key
                )));
            }
            source.rule.validate().map_err(|e| {
                AppError::validation(format!("Source '{}': {}", source.key, e))
            })?;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetcher: FetcherConfig::default(),
            paths: PathsConfig::default(),
            notifier: NotifierConfig::default(),
            sources: defaults::default_sources(),
        }
    }
}

/// HTTP client and fetching behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-page fetch timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between requests of a sequential source, in milliseconds
    #[serde(default)]
    pub request_delay_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: 0,
        }
    }
}

/// File locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Ledger file holding the previous in-stock snapshot
    #[serde(default = "defaults::ledger_file")]
    pub ledger_file: String,

    /// Directory containing per-source inventory files
    #[serde(default = "defaults::inventory_dir")]
    pub inventory_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            ledger_file: defaults::ledger_file(),
            inventory_dir: defaults::inventory_dir(),
        }
    }
}

/// Notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Offset from UTC used for message timestamps
    #[serde(default = "defaults::utc_offset_minutes")]
    pub utc_offset_minutes: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_bot_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_chat_id: Option<String>,
}

impl NotifierConfig {
    /// Bot token and chat id, when both are configured.
    pub fn telegram(&self) -> Option<(&str, &str)> {
        match (&self.telegram_bot_token, &self.telegram_chat_id) {
            (Some(token), Some(chat_id)) => Some((token.as_str(), chat_id.as_str())),
            _ => None,
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: defaults::utc_offset_minutes(),
            telegram_bot_token: None,
            telegram_chat_id: None,
        }
    }
}

mod defaults {
    use crate::models::{AvailabilityRule, ConcurrencyPolicy, NotifyPolicy, SourceConfig};

    // Fetcher defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Path defaults
    pub fn ledger_file() -> String {
        "previous_stock.json".into()
    }
    pub fn inventory_dir() -> String {
        ".".into()
    }

    // Singapore time
    pub fn utc_offset_minutes() -> i32 {
        8 * 60
    }

    // Source defaults
    pub fn default_sources() -> Vec<SourceConfig> {
        vec![
            SourceConfig {
                key: "SAZEN".to_string(),
                name: "Sazen Tea".to_string(),
                inventory_file: "sazen-matcha.json".to_string(),
                concurrency: ConcurrencyPolicy::Sequential,
                max_concurrent: None,
                policy: NotifyPolicy::Strict,
                hold_when_unreachable: false,
                rule: AvailabilityRule::MarkerAndAction {
                    unavailable_selector: "p strong.red".to_string(),
                    unavailable_text: "This product is unavailable".to_string(),
                    action_selector: "form#basket-add".to_string(),
                },
            },
            SourceConfig {
                key: "IPPODO".to_string(),
                name: "Ippodo Tea".to_string(),
                inventory_file: "ippodo-matcha.json".to_string(),
                concurrency: ConcurrencyPolicy::Parallel,
                max_concurrent: None,
                policy: NotifyPolicy::Strict,
                hold_when_unreachable: false,
                rule: AvailabilityRule::VisibleElement {
                    selector: ".product-form__buttons button".to_string(),
                },
            },
        ]
    }
}
