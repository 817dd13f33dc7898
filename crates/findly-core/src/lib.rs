//! # findly-core: Pure Domain Model for the Findly client
//!
//! This crate holds the data the Findly client moves around: catalog books,
//! shop offers, favorites, auth tokens, and the small set of rules that apply
//! to them. It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Findly Client Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI shell (out of tree)                       │   │
//! │  │    Search ──► Book offers ──► Favorites ──► Account            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ reads views                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 apps/findly (state holders)                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               findly-client (REST + session)                    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ findly-core (THIS CRATE) ★                      │   │
//! │  │   types • money • validation • error                            │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Wire/domain types (Book, Offer, LikedOffer, AuthToken, ...)
//! - [`money`] - Prices in integer minor units
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation for forms and ids
//!
//! ## Example Usage
//!
//! ```rust
//! use findly_core::money::Money;
//! use findly_core::validation::parse_price_input;
//!
//! let alert = parse_price_input("249,50").unwrap();
//! assert_eq!(alert, Money::from_minor(24950));
//! ```

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// First page number understood by the catalog endpoint.
pub const FIRST_PAGE: u32 = 1;

/// Books requested per catalog page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound accepted for a configured page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Maximum length of a title/author search string.
pub const MAX_SEARCH_LEN: usize = 100;

/// Display name used when no login name is stored.
pub const FALLBACK_LOGIN_NAME: &str = "User";
