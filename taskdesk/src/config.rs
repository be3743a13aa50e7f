//! Client configuration
//!
//! Central location for the constants used throughout the client, plus the
//! `ClientConfig` loaded from a JSON file with environment overrides.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ===== API =====

/// Default server location when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Path prefix every REST route lives under
pub const API_PREFIX: &str = "/api";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "TASKDESK_API_URL";

/// Environment variable overriding the request timeout
pub const TIMEOUT_ENV: &str = "TASKDESK_TIMEOUT_SECS";

// ===== Session tokens =====

/// Key of the persisted access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Key of the persisted refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Service name used for OS credential store entries
pub const KEYRING_SERVICE: &str = "TaskDesk";

// ===== Task list queries =====

/// Page size used by the task list
pub const DEFAULT_PAGE_LIMIT: u32 = 12;

/// Largest page size the server accepts
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Maximum task title length in characters
pub const MAX_TITLE_LENGTH: usize = 255;

// ===== Pagination =====

/// Number of page buttons shown around the current page
pub const DEFAULT_MAX_VISIBLE_PAGES: u32 = 5;

// ===== Analytics =====

/// Trend windows longer than this many days are bucketed weekly
pub const DAILY_RESOLUTION_MAX_DAYS: u32 = 30;

/// Days per trend bucket once bucketing kicks in
pub const TREND_BUCKET_DAYS: usize = 7;

/// Smallest trend window the server accepts
pub const MIN_TREND_DAYS: u32 = 7;

/// Largest trend window the server accepts
pub const MAX_TREND_DAYS: u32 = 365;

// ===== Files =====

/// Upload file names are truncated to this many characters
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Runtime configuration for the API client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    format!("TaskDesk-Client/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a JSON file, falling back to defaults when the
    /// file does not exist, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)
                .map_err(|e| AppError::Config(format!("Failed to parse {:?}: {}", path, e)))?
        } else {
            tracing::info!("Config file {:?} not found, using defaults", path);
            Self::default()
        };

        config.with_env_overrides()
    }

    /// Apply `TASKDESK_API_URL` / `TASKDESK_TIMEOUT_SECS` on top of `self`
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            self.api_url = url;
        }

        if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
            self.timeout_secs = raw.trim().parse().map_err(|_| {
                AppError::Config(format!("{} must be a number of seconds, got {:?}", TIMEOUT_ENV, raw))
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "api_url must start with http:// or https://, got {:?}",
                self.api_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(AppError::Config("timeout_secs must be greater than 0".to_string()));
        }
        Ok(())
    }

    /// Base URL of the REST routes, e.g. `http://localhost:8000/api`
    pub fn api_base(&self) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), API_PREFIX)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Directory holding the config file and the token file
pub fn app_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("taskdesk"))
        .ok_or_else(|| AppError::Config("Failed to resolve the user data directory".to_string()))
}
