//! Persistent stores backed by JSON files in the data directory.

pub mod cache;
pub mod identity;

pub use cache::ResponseCache;
pub use identity::{IdentityField, IdentityStore};

use std::path::Path;

use crate::common::error::StoreError;

/// Write `content` to `path` atomically (tmp file + rename).
pub(crate) async fn atomic_write(path: &Path, content: &str) -> Result<(), StoreError> {
    let io_err = |source: std::io::Error| StoreError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, content).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}

/// Read a JSON store file. A missing or corrupt file yields `None` so the
/// caller starts from an empty store (the old file is left untouched).
pub(crate) async fn read_json_or_empty<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let content = tokio::fs::read_to_string(path).await.ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring corrupt store file {}: {}", path.display(), e);
            None
        }
    }
}
