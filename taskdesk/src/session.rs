//! Shared session state
//!
//! Holds the signed-in user in memory and the two tokens in a `TokenStore`.
//! One `SessionState` is shared (via `Arc`) by the `SessionManager` and the
//! `ApiClient`, so a rejected token observed by any request signs the whole
//! client out.

use crate::api::models::{AuthTokens, User};
use crate::config::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::error::Result;
use crate::storage::TokenStore;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;

/// Where the client is in the authentication lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Unauthenticated,
    Restoring,
    LoggingIn,
    Authenticated,
}

/// Authenticated identity plus its tokens
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: Option<User>,
}

type SignOutHook = Box<dyn Fn() + Send + Sync>;

pub struct SessionState {
    store: Arc<dyn TokenStore>,
    session: RwLock<Option<Session>>,
    status: watch::Sender<AuthStatus>,
    sign_out_hooks: RwLock<Vec<SignOutHook>>,
}

impl SessionState {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let (status, _) = watch::channel(AuthStatus::Unauthenticated);
        Self {
            store,
            session: RwLock::new(None),
            status,
            sign_out_hooks: RwLock::new(Vec::new()),
        }
    }

    /// Run `hook` every time the status drops back to `Unauthenticated`,
    /// whether through logout, a failed sign-in or a rejected token
    pub fn on_sign_out(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.sign_out_hooks
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .push(Box::new(hook));
    }

    pub fn status(&self) -> AuthStatus {
        *self.status.borrow()
    }

    /// Receive every status transition, including forced sign-outs
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.status.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == AuthStatus::Authenticated
    }

    pub fn current_user(&self) -> Option<User> {
        self.read().as_ref().and_then(|s| s.user.clone())
    }

    pub fn current_user_id(&self) -> Option<String> {
        self.read()
            .as_ref()
            .and_then(|s| s.user.as_ref().map(|u| u.id.clone()))
    }

    /// Snapshot of the in-memory session
    pub fn session(&self) -> Option<Session> {
        self.read().clone()
    }

    /// Token sent as bearer credentials, read from the persistent store
    pub fn access_token(&self) -> Option<String> {
        match self.store.get(ACCESS_TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read access token: {}", e);
                None
            }
        }
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.get(REFRESH_TOKEN_KEY).ok().flatten()
    }

    /// Sign out because the server rejected our token.
    ///
    /// Tokens are always cleared. Returns `true` only for the call that
    /// actually ended an authenticated session, so concurrent failures
    /// announce the transition once.
    pub fn invalidate(&self) -> bool {
        self.clear_tokens();

        let ended = self.write().take().is_some();
        if ended {
            self.set_status(AuthStatus::Unauthenticated);
            tracing::warn!("Session rejected by server, signed out");
        }
        ended
    }

    /// Write both tokens; on a partial failure nothing stays persisted
    pub(crate) fn persist_tokens(&self, tokens: &AuthTokens) -> Result<()> {
        let written = self
            .store
            .set(ACCESS_TOKEN_KEY, &tokens.access_token)
            .and_then(|_| self.store.set(REFRESH_TOKEN_KEY, &tokens.refresh_token));

        if let Err(e) = written {
            self.clear_tokens();
            return Err(e);
        }
        Ok(())
    }

    pub(crate) fn clear_tokens(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!("Failed to remove {}: {}", key, e);
            }
        }
    }

    pub(crate) fn establish(&self, access_token: String, refresh_token: String, user: User) {
        tracing::info!("Signed in as {} ({})", user.email, user.id);
        *self.write() = Some(Session {
            access_token,
            refresh_token,
            user: Some(user),
        });
        self.set_status(AuthStatus::Authenticated);
    }

    /// Drop the in-memory session and tokens without announcing a rejection
    pub(crate) fn end(&self) {
        self.clear_tokens();
        self.write().take();
        self.set_status(AuthStatus::Unauthenticated);
    }

    pub(crate) fn set_status(&self, status: AuthStatus) {
        let changed = self.status.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            tracing::debug!("Auth status {:?} -> {:?}", current, status);
            *current = status;
            true
        });

        if changed && status == AuthStatus::Unauthenticated {
            let hooks = self.sign_out_hooks.read().unwrap_or_else(|p| p.into_inner());
            for hook in hooks.iter() {
                hook();
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.session.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.session.write().unwrap_or_else(|p| p.into_inner())
    }
}
