// src/storage/inventory.rs

//! Product inventory loading.
//!
//! The inventory is produced by a separate catalog refresh and stored as one
//! JSON array per source:
//!
//! ```json
//! [{ "website": "SAZEN", "manufacturer": "...", "name": "...", "url": "https://..." }]
//! ```

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Product, SourceConfig};

/// Supplies the products configured for a source.
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    async fn load_products(&self, source: &SourceConfig) -> Result<Vec<Product>>;
}

/// Inventory files in a directory, one per source.
#[derive(Debug, Clone)]
pub struct JsonInventory {
    root_dir: PathBuf,
}

impl JsonInventory {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    fn path(&self, source: &SourceConfig) -> PathBuf {
        self.root_dir.join(&source.inventory_file)
    }
}

#[async_trait]
impl InventoryProvider for JsonInventory {
    async fn load_products(&self, source: &SourceConfig) -> Result<Vec<Product>> {
        let path = self.path(source);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!(
                    "{} inventory not found at {}",
                    source.name,
                    path.display()
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        let raw: Vec<Product> = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::validation(format!("Inventory {} is malformed: {}", path.display(), e))
        })?;

        Ok(sanitize(&source.key, raw))
    }
}

/// Claim products for `source_key`, dropping foreign, invalid and repeated entries.
///
/// The first occurrence of a URL wins and input order is preserved.
pub fn sanitize(source_key: &str, raw: Vec<Product>) -> Vec<Product> {
    let mut seen = HashSet::new();
    let mut products = Vec::with_capacity(raw.len());

    for mut product in raw {
        if product.source.is_empty() {
            product.source = source_key.to_string();
        } else if product.source != source_key {
            log::warn!(
                "Skipping {} listed under '{}' in the {} inventory",
                product.url,
                product.source,
                source_key
            );
            continue;
        }

        if let Err(e) = Url::parse(&product.url) {
            log::warn!("Skipping product with invalid URL '{}': {}", product.url, e);
            continue;
        }

        if seen.insert(product.url.clone()) {
            products.push(product);
        } else {
            log::debug!("Duplicate inventory entry {}", product.url);
        }
    }

    products
}
