//! # findly-client: REST Client and Session
//!
//! Everything in the Findly client that leaves the process: HTTP calls to the
//! catalog/favorites/users API, the stored auth token, and the configuration
//! that points at the server.
//!
//! ## Module Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         findly-client                                   │
//! │                                                                         │
//! │   config ──► http::HttpApiClient ──implements──► api::FindlyApi         │
//! │                    │                                  ▲                 │
//! │                    │ bearer / 401 teardown            │ used by         │
//! │                    ▼                                  │ state holders   │
//! │               session::Session ◄── token_store::TokenStore              │
//! │                    │                                                    │
//! │                    └── watch<bool> ──► observers                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use findly_client::{ClientConfig, FindlyApi, HttpApiClient, Session};
//! use findly_core::BookQuery;
//!
//! # async fn run() -> findly_client::ClientResult<()> {
//! let config = ClientConfig::load_or_default(None);
//! let session = Session::in_memory();
//! let api = HttpApiClient::new(&config, session)?;
//!
//! let query = BookQuery { title: Some("Kobzar".into()), ..Default::default() };
//! let books = api.search_books(&query).await?;
//! println!("{} books", books.len());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod token_store;

pub use api::FindlyApi;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpApiClient;
pub use session::Session;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
