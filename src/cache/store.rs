//! Durable backing stores for the verdict cache.

use crate::core::error::{AppError, Result};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A single-slot text store: read once at startup, rewritten wholesale on save.
pub trait CacheStore: Send + Sync {
    /// Returns the stored text, or `None` if nothing was ever saved.
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, contents: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
    fn describe(&self) -> String;
}

/// Keeps the cache in a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStore for FileStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&self.path)?))
    }

    fn save(&self, contents: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        // Readers must never see a partially written file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            AppError::Cache(format!(
                "Failed to move cache into place at {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process store; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(contents.into()))),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.slot.lock().clone()
    }
}

impl CacheStore for MemoryStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, contents: &str) -> Result<()> {
        *self.slot.lock() = Some(contents.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock() = None;
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
