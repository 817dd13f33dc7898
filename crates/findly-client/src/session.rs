//! # Session
//!
//! The explicit auth context shared by the HTTP client and every state holder.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Session::new(store)                                                  │
//! │        │  token present? ──► logged in = true / false                  │
//! │        ▼                                                               │
//! │   ┌──────────┐   login(token)    ┌──────────┐                          │
//! │   │LOGGED OUT│ ────────────────► │LOGGED IN │                          │
//! │   │  false   │ ◄──────────────── │  true    │                          │
//! │   └──────────┘  logout() / 401   └──────────┘                          │
//! │        │                               │                                │
//! │        └──────── watch<bool> ──────────┘                                │
//! │                       │                                                 │
//! │        Catalog ◄──────┼──────► Favorites                                │
//! │                       ▼                                                 │
//! │                    Account                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The flag is published on a `tokio::sync::watch` channel. Observers only
//! read it; the store is written through [`Session::login`] and
//! [`Session::logout`] alone.

use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tracing::{info, warn};

use findly_core::{AuthToken, FALLBACK_LOGIN_NAME};

use crate::error::ClientResult;
use crate::token_store::{MemoryTokenStore, TokenStore};

struct SessionInner {
    store: Arc<dyn TokenStore>,
    token: RwLock<Option<AuthToken>>,
    state_tx: watch::Sender<bool>,
}

/// Cheap-to-clone handle to the shared session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Restores the session from the store.
    ///
    /// An unreadable store is treated as logged out.
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let token = store.load().unwrap_or_else(|e| {
            warn!(error = %e, "Stored token unreadable, starting logged out");
            None
        });

        let logged_in = token.is_some();
        if let Some(token) = &token {
            info!(user_id = %token.user_id, "Restored session");
        }

        let (state_tx, _) = watch::channel(logged_in);
        Session {
            inner: Arc::new(SessionInner {
                store,
                token: RwLock::new(token),
                state_tx,
            }),
        }
    }

    /// Session backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Persists the token and publishes logged-in.
    pub fn login(&self, token: AuthToken) -> ClientResult<()> {
        self.inner.store.save(&token)?;

        info!(user_id = %token.user_id, login = %token.login, "Session started");
        *self.write_token() = Some(token);
        self.inner.state_tx.send_replace(true);
        Ok(())
    }

    /// Clears the token and publishes logged-out.
    ///
    /// Always succeeds locally; a store failure is logged.
    pub fn logout(&self) {
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "Failed to clear stored token");
        }

        let previous = self.write_token().take();
        if let Some(token) = previous {
            info!(user_id = %token.user_id, "Session ended");
        }
        self.inner.state_tx.send_replace(false);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        *self.inner.state_tx.borrow()
    }

    /// New observer of the logged-in flag.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.state_tx.subscribe()
    }

    /// Bearer string for the `Authorization` header.
    pub fn bearer(&self) -> Option<String> {
        self.read_token().as_ref().map(|t| t.token.clone())
    }

    pub fn user_id(&self) -> Option<String> {
        self.read_token().as_ref().map(|t| t.user_id.clone())
    }

    /// Display name for the profile screen.
    pub fn login_name(&self) -> String {
        self.read_token()
            .as_ref()
            .map(|t| t.login.clone())
            .unwrap_or_else(|| FALLBACK_LOGIN_NAME.to_string())
    }

    pub fn current_token(&self) -> Option<AuthToken> {
        self.read_token().clone()
    }

    fn read_token(&self) -> std::sync::RwLockReadGuard<'_, Option<AuthToken>> {
        self.inner.token.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_token(&self) -> std::sync::RwLockWriteGuard<'_, Option<AuthToken>> {
        self.inner.token.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("user_id", &self.user_id())
            .finish()
    }
}
