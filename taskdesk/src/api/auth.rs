//! Authentication endpoints

use super::client::{ApiClient, RequestKind};
use super::models::{AuthTokens, User};
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Credential exchange and profile lookup
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange email and password for a token pair
    async fn login(&self, email: &str, password: &str) -> Result<AuthTokens>;

    /// Create an account and receive its token pair
    async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthTokens>;

    /// Profile of the user owning the current access token
    async fn me(&self) -> Result<User>;
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<AuthTokens> {
        tracing::debug!("Exchanging credentials for {}", email);
        // OAuth2 password form: the email travels as `username`
        let form = [("username", email), ("password", password)];
        self.data(self.post("/auth/login").form(&form), RequestKind::Write)
            .await
    }

    async fn register(&self, name: &str, email: &str, password: &str) -> Result<AuthTokens> {
        tracing::debug!("Registering account for {}", email);
        let body = RegisterRequest {
            name,
            email,
            password,
        };
        self.data(self.post("/auth/register").json(&body), RequestKind::Write)
            .await
    }

    async fn me(&self) -> Result<User> {
        self.data(self.get("/auth/me"), RequestKind::Read).await
    }
}
