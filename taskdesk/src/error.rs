//! Error types for the TaskDesk client
//!
//! All errors use thiserror for structured error handling.
//! Every failure reaching the view layer is one of the classified variants
//! below, and errors serialize to their display string for the frontend.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Bad credentials or an expired/invalid token
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Input rejected by the server or by client-side checks
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A read failed (network, server error, undecodable body)
    #[error("Failed to load data: {0}")]
    Fetch(String),

    /// A create or update request failed
    #[error("Failed to save changes: {0}")]
    Mutation(String),

    /// A delete request failed; the item was not removed
    #[error("Failed to delete: {0}")]
    Delete(String),

    #[error("Token storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Whether this error means the session is no longer valid
    pub fn is_auth(&self) -> bool {
        matches!(self, AppError::Auth(_))
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
