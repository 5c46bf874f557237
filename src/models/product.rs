//! Product data structure.

use serde::{Deserialize, Serialize};

/// A monitored catalog entry, identified by its page URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    /// Key of the owning source. Older inventory files call this `website`.
    #[serde(default, alias = "website")]
    pub source: String,

    /// Manufacturer or brand label
    pub manufacturer: String,

    /// Product display name
    pub name: String,

    /// Canonical product page URL
    pub url: String,
}

impl Product {
    /// Identity of the product within a snapshot.
    pub fn id(&self) -> &str {
        &self.url
    }

    /// Render as a numbered list entry: `1. Maker - Name (url)`.
    pub fn list_entry(&self, position: usize) -> String {
        format!(
            "{}. {} - {} ({})",
            position, self.manufacturer, self.name, self.url
        )
    }
}

/// Product fields carried in a notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductSummary {
    pub manufacturer: String,
    pub name: String,
    pub url: String,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            manufacturer: product.manufacturer.clone(),
            name: product.name.clone(),
            url: product.url.clone(),
        }
    }
}
