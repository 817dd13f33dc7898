//! # Token Store
//!
//! Persistence for the single auth token record.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TokenStore (trait)                                                     │
//! │    load()  -> Option<AuthToken>                                         │
//! │    save(&AuthToken)   overwrite                                         │
//! │    clear()            delete                                            │
//! │                                                                         │
//! │  MemoryTokenStore   tests, ephemeral sessions                           │
//! │  FileTokenStore     CLI, one TOML file, owner-only permissions         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store is dumb on purpose: [`Session`](crate::session::Session) owns the
//! logged-in flag and is the only caller.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use findly_core::AuthToken;

use crate::error::{ClientError, ClientResult};

/// Storage for the one token record.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> ClientResult<Option<AuthToken>>;

    /// Overwrites any existing record.
    fn save(&self, token: &AuthToken) -> ClientResult<()>;

    /// Removes the record. Clearing an empty store is not an error.
    fn clear(&self) -> ClientResult<()>;
}

// =============================================================================
// In-Memory Store
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<AuthToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a token, as if a previous run had logged in.
    pub fn with_token(token: AuthToken) -> Self {
        MemoryTokenStore {
            token: Mutex::new(Some(token)),
        }
    }

    fn slot(&self) -> ClientResult<std::sync::MutexGuard<'_, Option<AuthToken>>> {
        self.token
            .lock()
            .map_err(|_| ClientError::TokenStore("token mutex poisoned".into()))
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> ClientResult<Option<AuthToken>> {
        Ok(self.slot()?.clone())
    }

    fn save(&self, token: &AuthToken) -> ClientResult<()> {
        *self.slot()? = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        *self.slot()? = None;
        Ok(())
    }
}

// =============================================================================
// File Store
// =============================================================================

/// On-disk layout: a single `[token]` table.
#[derive(Serialize, Deserialize)]
struct TokenFile {
    token: AuthToken,
}

/// Token persisted as a TOML file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileTokenStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn store_err(err: impl std::fmt::Display) -> ClientError {
    ClientError::TokenStore(err.to_string())
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> ClientResult<Option<AuthToken>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path).map_err(store_err)?;
        let file: TokenFile = toml::from_str(&contents).map_err(store_err)?;
        debug!(path = ?self.path, user_id = %file.token.user_id, "Loaded stored token");
        Ok(Some(file.token))
    }

    fn save(&self, token: &AuthToken) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(store_err)?;
        }

        let contents = toml::to_string_pretty(&TokenFile {
            token: token.clone(),
        })
        .map_err(store_err)?;
        std::fs::write(&self.path, contents).map_err(store_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(store_err)?;
        }

        debug!(path = ?self.path, "Token saved");
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(store_err(e)),
        }
    }
}
