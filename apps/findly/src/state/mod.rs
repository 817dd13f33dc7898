//! # State Module
//!
//! Per-screen state holders.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │ CatalogState │  │FavoritesState│  │   AccountState   │              │
//! │  │              │  │              │  │                  │              │
//! │  │  Arc<Mutex<  │  │  Arc<Mutex<  │  │  Arc<Mutex<      │              │
//! │  │  CatalogView │  │  Favorites   │  │  AccountView     │              │
//! │  │  >>          │  │  View>>      │  │  >>              │              │
//! │  └──────┬───────┘  └──────┬───────┘  └────────┬─────────┘              │
//! │         └─────────────────┼───────────────────┘                        │
//! │                           ▼                                             │
//! │             Arc<dyn FindlyApi> + Session                                │
//! │                                                                         │
//! │  LOCKING RULE:                                                         │
//! │  • The view mutex is never held across an `.await`                     │
//! │  • Mutations: lock, change, snapshot, unlock, await, lock, commit or   │
//! │    restore the snapshot                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod account;
mod catalog;
mod favorites;

pub use account::{AccountScreen, AccountState, AccountView};
pub use catalog::{CatalogFilters, CatalogScreen, CatalogState, CatalogView};
pub use favorites::{FavoritesState, FavoritesView};

use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

/// Result of a user-triggered mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOutcome {
    /// The server confirmed the optimistic change.
    Committed,
    /// The call failed and the pre-mutation copy was restored.
    RolledBack,
    /// A mutation for the same offer is still in flight; nothing happened.
    Skipped,
    /// No session; the auth prompt was raised and no call was made.
    AuthRequired,
    /// The price prompt is now open for the offer.
    PromptOpened,
    /// Rejected locally (unknown offer, bad price); no call was made.
    Invalid,
}

/// Locks a view, recovering it if a previous holder panicked.
pub(crate) fn lock<T>(view: &Mutex<T>) -> MutexGuard<'_, T> {
    view.lock().unwrap_or_else(|e| e.into_inner())
}
