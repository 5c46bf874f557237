//! Local filesystem ledger.
//!
//! Stores the snapshot as `{"SOURCE": ["url", ...]}`. Every save replaces the
//! whole file through a temp file and a rename, so a reader sees either the
//! old snapshot or the new one.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::{StockLedger, StockSnapshot};

/// Ledger kept in a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonLedger {
    path: PathBuf,
}

impl JsonLedger {
    /// Create a ledger backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl StockLedger for JsonLedger {
    async fn load(&self) -> Result<StockSnapshot> {
        let bytes = self
            .read_bytes()
            .await
            .map_err(|e| AppError::ledger(format!("reading {}: {}", self.path.display(), e)))?;

        match bytes {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                AppError::ledger(format!("parsing {}: {}", self.path.display(), e))
            }),
            None => {
                log::info!(
                    "No ledger at {}; starting from an empty baseline",
                    self.path.display()
                );
                Ok(StockSnapshot::new())
            }
        }
    }

    async fn save(&self, snapshot: &StockSnapshot) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        self.write_bytes(&bytes)
            .await
            .map_err(|e| AppError::ledger(format!("writing {}: {}", self.path.display(), e)))?;
        log::debug!(
            "Ledger saved to {} ({} sources)",
            self.path.display(),
            snapshot.len()
        );
        Ok(())
    }
}
