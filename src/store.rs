//! The key-value blob store that the ledger persists into.
//!
//! Every key holds one text blob which is read whole and overwritten whole. `FileStore` keeps each
//! key in its own JSON file under the budget home directory; `MemoryStore` keeps them in memory.

use crate::error::Res;
use crate::utils;
use anyhow::{bail, Context};
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::trace;

/// A store of text blobs addressed by key.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync + Debug {
    /// Returns the blob stored under `key`, or `None` if nothing has been stored there.
    async fn get(&self, key: &str) -> Res<Option<String>>;

    /// Replaces whatever is stored under `key` with `value`.
    async fn put(&self, key: &str, value: &str) -> Res<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> Res<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            bail!("Invalid store key '{key}'");
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait::async_trait]
impl BlobStore for FileStore {
    async fn get(&self, key: &str) -> Res<Option<String>> {
        let path = self.key_path(key)?;
        if !utils::exists(&path).await? {
            trace!("No blob at {}", path.display());
            return Ok(None);
        }
        trace!("Reading blob from {}", path.display());
        Ok(Some(utils::read(&path).await?))
    }

    async fn put(&self, key: &str, value: &str) -> Res<()> {
        let path = self.key_path(key)?;
        utils::make_dir(&self.dir).await?;

        // Write the whole blob aside first so a crash never leaves a half-written file in place.
        let tmp = path.with_extension("json.tmp");
        utils::write(&tmp, value).await?;
        utils::rename(&tmp, &path)
            .await
            .with_context(|| format!("Unable to replace the blob for '{key}'"))?;
        trace!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

/// Keeps blobs in memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `value` under `key`.
    pub fn with_blob(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::default();
        if let Ok(mut data) = store.data.lock() {
            data.insert(key.into(), value.into());
        }
        store
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryStore {
    async fn get(&self, key: &str) -> Res<Option<String>> {
        let data = self
            .data
            .lock()
            .map_err(|_| anyhow::anyhow!("The memory store lock is poisoned"))?;
        Ok(data.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Res<()> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| anyhow::anyhow!("The memory store lock is poisoned"))?;
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
