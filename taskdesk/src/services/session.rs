//! Session service
//!
//! Owns the sign-in lifecycle: restoring a persisted session at startup,
//! logging in, registering and logging out.

use crate::api::models::{AuthTokens, User};
use crate::api::AuthApi;
use crate::error::{AppError, Result};
use crate::session::{AuthStatus, SessionState};
use std::sync::Arc;

/// Service for establishing and ending the authenticated session
pub struct SessionManager<A: AuthApi> {
    api: Arc<A>,
    state: Arc<SessionState>,
}

impl<A: AuthApi> SessionManager<A> {
    pub fn new(api: Arc<A>, state: Arc<SessionState>) -> Self {
        Self { api, state }
    }

    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    /// Restore the session from a persisted token.
    ///
    /// Without a token this resolves immediately. A token the server rejects
    /// (or any other failure) clears both tokens; the failure is logged and
    /// not returned.
    pub async fn restore(&self) -> AuthStatus {
        match self.state.status() {
            AuthStatus::Unauthenticated => {}
            other => {
                tracing::debug!("Restore skipped, status is {:?}", other);
                return other;
            }
        }

        let Some(access_token) = self.state.access_token() else {
            tracing::info!("No stored session");
            return AuthStatus::Unauthenticated;
        };

        self.state.set_status(AuthStatus::Restoring);
        tracing::info!("Restoring stored session");

        match self.api.me().await {
            Ok(user) => {
                let refresh_token = self.state.refresh_token().unwrap_or_default();
                self.state.establish(access_token, refresh_token, user);
            }
            Err(e) => {
                tracing::warn!("Stored session could not be restored: {}", e);
                self.state.end();
            }
        }

        self.state.status()
    }

    /// Exchange credentials for tokens, persist them, then load the profile
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        tracing::info!("Logging in as {}", email);
        self.begin()?;

        let tokens = match self.api.login(email, password).await {
            Ok(tokens) => tokens,
            Err(e) => return Err(self.fail(e)),
        };

        self.finish(tokens).await
    }

    /// Create an account, then sign in with the issued tokens
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        tracing::info!("Registering {}", email);
        self.begin()?;

        if let Err(e) = validate_registration(name, email, password) {
            return Err(self.fail(e));
        }

        let tokens = match self.api.register(name.trim(), email.trim(), password).await {
            Ok(tokens) => tokens,
            Err(e) => return Err(self.fail(e)),
        };

        self.finish(tokens).await
    }

    /// Sign out locally. No request is made; calling it twice is harmless.
    pub fn logout(&self) {
        if self.state.is_authenticated() {
            tracing::info!("Logging out");
        }
        self.state.end();
    }

    fn begin(&self) -> Result<()> {
        match self.state.status() {
            AuthStatus::Unauthenticated => {
                self.state.set_status(AuthStatus::LoggingIn);
                Ok(())
            }
            AuthStatus::Authenticated => Err(AppError::Validation(
                "already signed in, log out first".to_string(),
            )),
            other => Err(AppError::Validation(format!(
                "sign-in already in progress ({:?})",
                other
            ))),
        }
    }

    async fn finish(&self, tokens: AuthTokens) -> Result<User> {
        if let Err(e) = self.state.persist_tokens(&tokens) {
            return Err(self.fail(e));
        }

        match self.api.me().await {
            Ok(user) => {
                self.state
                    .establish(tokens.access_token, tokens.refresh_token, user.clone());
                Ok(user)
            }
            Err(e) => {
                tracing::warn!("Profile fetch after sign-in failed: {}", e);
                Err(self.fail(e))
            }
        }
    }

    /// Back to unauthenticated with nothing persisted
    fn fail(&self, err: AppError) -> AppError {
        self.state.end();
        err
    }
}

fn validate_registration(name: &str, email: &str, password: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation(format!("invalid email address {:?}", email)));
    }
    if password.is_empty() {
        return Err(AppError::Validation("password is required".to_string()));
    }
    Ok(())
}
