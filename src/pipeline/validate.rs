// src/pipeline/validate.rs

use std::path::Path;

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::load::load_sources;
use crate::services::CheckerRegistry;
use crate::storage::JsonInventory;
use crate::utils::log::{header, sub_item};

/// Counts reported by a successful validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationSummary {
    pub sources: usize,
    pub products: usize,
}

/// Validate configuration, extraction rules and inventories.
pub async fn run_validate(config: &Config, storage_dir: &Path) -> Result<ValidationSummary> {
    header("Validating configuration");

    match validate(config, storage_dir).await {
        Ok(summary) => {
            log::info!("Configuration OK");
            Ok(summary)
        }
        Err(e) => {
            log::error!("Validation failed: {}", e);
            Err(e)
        }
    }
}

async fn validate(config: &Config, storage_dir: &Path) -> Result<ValidationSummary> {
    config.validate()?;
    sub_item(&format!("User agent: {}", config.fetcher.user_agent));
    sub_item(&format!("Fetch timeout: {}s", config.fetcher.timeout_secs));

    CheckerRegistry::from_sources(&config.sources)?;
    sub_item(&format!("Rules compiled for {} sources", config.sources.len()));

    let inventory = JsonInventory::new(storage_dir.join(&config.paths.inventory_dir));
    let sources = load_sources(&config.sources, &inventory).await?;
    for source in &sources {
        sub_item(&format!(
            "{} ({}): {} products, {:?}, {:?}",
            source.name,
            source.key,
            source.product_count(),
            source.concurrency,
            source.policy
        ));
    }

    Ok(ValidationSummary {
        sources: sources.len(),
        products: sources.iter().map(|s| s.product_count()).sum(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::AvailabilityRule;
    use crate::test_helpers::test_source_config;
    use tempfile::TempDir;

    fn config() -> Config {
        Config {
            sources: vec![test_source_config("X")],
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_valid_setup() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("x.json"),
            r#"[
                {"website": "X", "manufacturer": "M", "name": "One", "url": "https://x.example/1"},
                {"website": "X", "manufacturer": "M", "name": "Two", "url": "https://x.example/2"}
            ]"#,
        )
        .unwrap();

        let summary = run_validate(&config(), dir.path()).await.unwrap();
        assert_eq!(
            summary,
            ValidationSummary {
                sources: 1,
                products: 2
            }
        );
    }

    #[tokio::test]
    async fn test_bad_selector_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = config();
        config.sources[0].rule = AvailabilityRule::VisibleElement {
            selector: "[[broken".to_string(),
        };

        let result = run_validate(&config, dir.path()).await;
        match result {
            Err(AppError::Config(message)) => assert!(message.contains("[[broken")),
            other => panic!("expected a config error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_config_errors_reported() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            sources: Vec::new(),
            ..Config::default()
        };

        assert!(run_validate(&config, dir.path()).await.is_err());
    }
}
