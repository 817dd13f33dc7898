//! # Findly App Library
//!
//! State holders for the Findly screens, wired to the REST client. A UI shell
//! (or the bundled CLI) builds an [`App`], spawns the session watchers and
//! renders view snapshots.
//!
//! ## Module Organization
//! ```text
//! findly/
//! ├── lib.rs            ◄─── You are here (wiring & tracing)
//! ├── state/
//! │   ├── mod.rs        ◄─── MutationOutcome, shared lock helper
//! │   ├── catalog.rs    ◄─── Search paging, offers, optimistic flags
//! │   ├── favorites.rs  ◄─── Liked offers, removal, alerts
//! │   └── account.rs    ◄─── LOGIN ⇄ REGISTER ⇄ PROFILE
//! ├── notifications.rs  ◄─── Device token, push routing
//! ├── inflight.rs       ◄─── Per-offer mutation de-duplication
//! ├── error.rs          ◄─── UiError shown on views
//! └── main.rs           ◄─── Headless CLI
//! ```
//!
//! ## Session Fan-out
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Session::login / logout / 401 teardown                                 │
//! │        │                                                                │
//! │        ▼ watch<bool>                                                    │
//! │  ┌─────────────┬──────────────────┬──────────────────┐                 │
//! │  ▼             ▼                  ▼                  │                 │
//! │ catalog      favorites          account              │ one task each   │
//! │ clear/reload clear/load         screen switch        │                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod inflight;
pub mod notifications;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use findly_client::{
    ClientConfig, ClientResult, FileTokenStore, FindlyApi, HttpApiClient, MemoryTokenStore,
    Session, TokenStore,
};

use notifications::{NotificationRouter, SharedDeviceToken};
use state::{AccountState, CatalogState, FavoritesState};

/// Everything a Findly front end needs, sharing one session and one API.
#[derive(Clone)]
pub struct App {
    pub config: ClientConfig,
    pub session: Session,
    pub api: Arc<dyn FindlyApi>,
    pub device_token: SharedDeviceToken,
    pub catalog: CatalogState,
    pub favorites: FavoritesState,
    pub account: AccountState,
    pub notifications: NotificationRouter,
}

impl App {
    pub fn new(config: ClientConfig, session: Session, api: Arc<dyn FindlyApi>) -> Self {
        let device_token = SharedDeviceToken::default();
        let catalog = CatalogState::new(api.clone(), session.clone(), config.page_size());
        let favorites = FavoritesState::new(api.clone(), session.clone());
        let account = AccountState::new(
            api.clone(),
            session.clone(),
            Arc::new(device_token.clone()),
        );
        let notifications = NotificationRouter::new(favorites.clone(), session.clone());

        App {
            config,
            session,
            api,
            device_token,
            catalog,
            favorites,
            account,
            notifications,
        }
    }

    /// Builds the app against the configured server, restoring a stored token.
    pub fn from_config(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let store: Arc<dyn TokenStore> = match config.token_path() {
            Some(path) => {
                debug!(?path, "Using file token store");
                Arc::new(FileTokenStore::new(path))
            }
            None => {
                debug!("No data directory, token kept in memory");
                Arc::new(MemoryTokenStore::new())
            }
        };
        let session = Session::new(store);
        let api = HttpApiClient::new(&config, session.clone())?;

        info!(
            base_url = %api.base_url(),
            authenticated = session.is_authenticated(),
            "Findly client ready"
        );
        Ok(App::new(config, session, Arc::new(api)))
    }

    /// Spawns one task per state holder that follows session changes.
    ///
    /// Each task holds a clone of its state holder, and with it the session,
    /// so the tasks run until their handles are aborted.
    pub fn spawn_session_watchers(&self) -> Vec<JoinHandle<()>> {
        let catalog = {
            let catalog = self.catalog.clone();
            let mut rx = self.session.subscribe();
            tokio::spawn(async move {
                while rx.changed().await.is_ok() {
                    let logged_in = *rx.borrow_and_update();
                    catalog.on_session_changed(logged_in).await;
                }
            })
        };

        let favorites = {
            let favorites = self.favorites.clone();
            let mut rx = self.session.subscribe();
            tokio::spawn(async move {
                while rx.changed().await.is_ok() {
                    let logged_in = *rx.borrow_and_update();
                    favorites.on_session_changed(logged_in).await;
                }
            })
        };

        let account = {
            let account = self.account.clone();
            let mut rx = self.session.subscribe();
            tokio::spawn(async move {
                while rx.changed().await.is_ok() {
                    let logged_in = *rx.borrow_and_update();
                    debug!(logged_in, "Session changed");
                    account.on_session_changed(logged_in);
                }
            })
        };

        vec![catalog, favorites, account]
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=findly_client=trace` - Show request flow of the client only
/// - Default: `info,findly=debug`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,findly=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AccountScreen;
    use crate::testing::{liked, offer, book, wait_until, FakeApi};

    fn app(api: &Arc<FakeApi>) -> App {
        App::new(ClientConfig::default(), Session::in_memory(), api.clone())
    }

    #[tokio::test]
    async fn test_watchers_follow_login_and_logout() {
        let api = FakeApi::new();
        api.set_favorites(vec![liked("o1")]);
        let app = app(&api);
        let handles = app.spawn_session_watchers();

        app.account.login("reader", "hunter2").await.unwrap();
        wait_until(|| app.favorites.snapshot().favorites.len() == 1).await;

        app.account.logout();
        wait_until(|| app.favorites.snapshot().favorites.is_empty()).await;
        wait_until(|| app.account.snapshot().screen == AccountScreen::Login).await;

        for handle in handles {
            handle.abort();
        }
    }

    #[tokio::test]
    async fn test_teardown_clears_offer_flags() {
        let api = FakeApi::new();
        let mut alerted = offer("o1", 100);
        alerted.is_liked = true;
        alerted.is_price_set = true;
        api.set_offers(vec![alerted]);
        let app = app(&api);
        let handles = app.spawn_session_watchers();

        app.account.login("reader", "hunter2").await.unwrap();
        app.catalog.open_book(book("b1")).await;
        assert!(app.catalog.snapshot().offers[0].is_liked);

        app.session.logout();
        wait_until(|| {
            app.catalog
                .snapshot()
                .offers
                .iter()
                .all(|o| !o.is_liked && !o.is_price_set)
        })
        .await;

        for handle in handles {
            handle.abort();
        }
    }

    #[test]
    fn test_page_size_comes_from_config() {
        let api = FakeApi::new();
        let mut config = ClientConfig::default();
        config.catalog.page_size = 25;

        let app = App::new(config, Session::in_memory(), api);

        assert_eq!(app.catalog.snapshot().page_size, 25);
        assert_eq!(app.account.snapshot().screen, AccountScreen::Login);
    }
}
