//! Storage module
//!
//! Key/value persistence for the two session tokens. Every store is
//! synchronous: reads happen once at startup and writes on login/logout.

pub mod file_store;
pub mod keyring_store;

pub use file_store::FileStore;
pub use keyring_store::KeyringStore;

use crate::error::Result;
use std::collections::HashMap;
use std::sync::Mutex;

/// A synchronous string store that survives restarts
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store for tests and sessions that should not outlive the process
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}
