//! HTTP transport for the task service
//!
//! Wraps a `reqwest::Client`, attaches the bearer token, unwraps the
//! `{ success, data }` envelope and classifies every failure into an
//! `AppError` variant according to the kind of request that failed.

use super::models::{ApiErrorBody, ApiResponse};
use crate::config::ClientConfig;
use crate::error::{AppError, Result};
use crate::session::SessionState;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// What a request does, which decides how its failures are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Read,
    Write,
    Delete,
}

/// Client for the task service REST API
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    session: Arc<SessionState>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Arc<SessionState>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let base = config.api_base();
        tracing::info!("API client targeting {}", base);

        Ok(Self {
            http,
            base,
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.authorized(self.http.get(self.url(path)))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.authorized(self.http.post(self.url(path)))
    }

    pub(crate) fn put(&self, path: &str) -> RequestBuilder {
        self.authorized(self.http.put(self.url(path)))
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.authorized(self.http.delete(self.url(path)))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.access_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and check the status; error bodies become classified errors
    pub(crate) async fn execute(&self, builder: RequestBuilder, kind: RequestKind) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| transport_error(&e, kind))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        tracing::debug!("Request failed with {}: {}", status, message);

        if status == StatusCode::UNAUTHORIZED {
            self.session.invalidate();
        }

        Err(classify_status(status, message, kind))
    }

    /// Send and unwrap the `data` field of the response envelope
    pub(crate) async fn data<T: DeserializeOwned>(&self, builder: RequestBuilder, kind: RequestKind) -> Result<T> {
        let envelope: ApiResponse<T> = self.body(builder, kind).await?;
        Ok(envelope.data)
    }

    /// Send and decode the whole response body
    pub(crate) async fn body<T: DeserializeOwned>(&self, builder: RequestBuilder, kind: RequestKind) -> Result<T> {
        let response = self.execute(builder, kind).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| kind.failure(format!("Unexpected response body: {}", e)))
    }

    /// Send and drain the body, for deletes and other empty responses
    pub(crate) async fn send(&self, builder: RequestBuilder, kind: RequestKind) -> Result<()> {
        self.execute(builder, kind).await?;
        Ok(())
    }

    /// Send and return the raw response bytes (downloads, CSV export)
    pub(crate) async fn bytes(&self, builder: RequestBuilder, kind: RequestKind) -> Result<Vec<u8>> {
        let response = self.execute(builder, kind).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(&e, kind))?;
        Ok(bytes.to_vec())
    }
}

impl RequestKind {
    /// The generic failure variant for this kind of request
    pub fn failure(self, message: String) -> AppError {
        match self {
            RequestKind::Read => AppError::Fetch(message),
            RequestKind::Write => AppError::Mutation(message),
            RequestKind::Delete => AppError::Delete(message),
        }
    }
}

fn transport_error(err: &reqwest::Error, kind: RequestKind) -> AppError {
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("could not reach server: {}", err)
    } else {
        err.to_string()
    };
    tracing::warn!("Transport failure ({:?}): {}", kind, message);
    kind.failure(message)
}

/// Map a non-success status onto the error taxonomy
pub(crate) fn classify_status(status: StatusCode, message: String, kind: RequestKind) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED => AppError::Auth(message),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY
            if kind != RequestKind::Read =>
        {
            AppError::Validation(message)
        }
        _ => kind.failure(message),
    }
}

/// Server-provided message from the error envelope, else the status text
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        return match parsed.error.code {
            Some(code) if !code.is_empty() => format!("{} ({})", parsed.error.message, code),
            _ => parsed.error.message,
        };
    }

    status
        .canonical_reason()
        .map(|reason| format!("{} {}", status.as_u16(), reason))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
