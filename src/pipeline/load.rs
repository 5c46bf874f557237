// src/pipeline/load.rs

use crate::error::Result;
use crate::models::{Source, SourceConfig};
use crate::storage::InventoryProvider;

/// Resolve configured sources to runtime sources with their products.
///
/// Sources keep configuration order. An inventory that cannot be read aborts
/// the load.
pub async fn load_sources(
    configs: &[SourceConfig],
    inventory: &dyn InventoryProvider,
) -> Result<Vec<Source>> {
    let mut sources = Vec::with_capacity(configs.len());
    for config in configs {
        let products = inventory.load_products(config).await?;
        log::debug!("Loaded {} products for {}", products.len(), config.name);
        sources.push(Source::from_config(config, products));
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonInventory;
    use crate::test_helpers::test_source_config;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_sources_in_config_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("b.json"),
            r#"[{"website": "B", "manufacturer": "M", "name": "N", "url": "https://b.example/1"}]"#,
        )
        .unwrap();

        let configs = vec![test_source_config("B"), test_source_config("A")];
        let sources = load_sources(&configs, &JsonInventory::new(dir.path()))
            .await
            .unwrap();

        let keys: Vec<&str> = sources.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["B", "A"]);
        assert_eq!(sources[0].product_count(), 1);
        // a.json is missing
        assert_eq!(sources[1].product_count(), 0);
    }

    #[tokio::test]
    async fn test_malformed_inventory_fails() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.json"), "{not json").unwrap();

        let result = load_sources(&[test_source_config("A")], &JsonInventory::new(dir.path())).await;
        assert!(result.is_err());
    }
}
