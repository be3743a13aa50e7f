//! OS credential store backed token storage
//!
//! Each key becomes one credential entry under the TaskDesk service name.

use super::TokenStore;
use crate::config::KEYRING_SERVICE;
use crate::error::{AppError, Result};
use keyring::Entry;

/// Token store using the platform credential manager
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE)
    }

    /// Use a custom service name, e.g. one per server profile
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key)
            .map_err(|e| AppError::Storage(format!("Failed to create keyring entry: {}", e)))
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AppError::Storage(format!("Failed to read {}: {}", key, e))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| AppError::Storage(format!("Failed to store {}: {}", key, e)))?;

        tracing::debug!("Stored {} in credential manager", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to delete {}: {}", key, e))),
        }
    }
}
