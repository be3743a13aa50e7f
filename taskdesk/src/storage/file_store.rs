//! File-backed token store
//!
//! Keeps the tokens in a small JSON object on disk. The file is rewritten
//! atomically (temp file + rename) on every change.

use super::TokenStore;
use crate::error::{AppError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// JSON file store
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a store backed by the file at `path`
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Store inside `dir` using the default file name
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Storage(format!("Failed to parse {:?}: {}", self.path, e)))
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(values)?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.path)?;

        tracing::debug!("Token file written: {:?}", self.path);
        Ok(())
    }

    fn modify(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> bool) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut values = self.load()?;
        if f(&mut values) {
            self.save(&values)?;
        }
        Ok(())
    }
}

impl TokenStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.modify(|values| {
            values.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.modify(|values| values.remove(key).is_some())
    }
}
