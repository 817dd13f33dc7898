//! # Domain Types
//!
//! Wire and domain types shared by the client and the state holders.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Book       │   │      Offer      │   │   LikedOffer    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │──►│  id             │──►│  offer_id       │       │
//! │  │  title/authors  │   │  price (Money)  │   │  book_title     │       │
//! │  │  min/max price  │   │  shop_name      │   │  current_price  │       │
//! │  │  is_available   │   │  is_liked       │   │  is_notify_set  │       │
//! │  └─────────────────┘   │  is_price_set   │   └─────────────────┘       │
//! │   catalog snapshot     └─────────────────┘    favorites projection      │
//! │                         mutated optimistically                          │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   AuthToken     │   │   BookQuery     │   │  Cover/Publisher│       │
//! │  │  bearer, user   │   │  filters + page │   │  filter lookups │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All wire types use camelCase JSON keys, matching the REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::{DEFAULT_PAGE_SIZE, FIRST_PAGE};

// =============================================================================
// Auth
// =============================================================================

/// The single stored credential record.
///
/// Created on successful login/register, overwritten on each login, deleted on
/// logout. Its presence is what "authenticated" means.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    /// Opaque bearer string sent as `Authorization: Bearer <token>`.
    pub token: String,
    pub user_id: String,
    /// Login name shown on the profile screen.
    pub login: String,
    pub saved_at: DateTime<Utc>,
}

impl AuthToken {
    pub fn new(token: impl Into<String>, user_id: impl Into<String>, login: impl Into<String>) -> Self {
        AuthToken {
            token: token.into(),
            user_id: user_id.into(),
            login: login.into(),
            saved_at: Utc::now(),
        }
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("login", &self.login)
            .field("saved_at", &self.saved_at)
            .finish()
    }
}

/// Response of `users/login` and `users/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub login: String,
    pub token: String,
    pub user_id: String,
}

impl From<AuthResponse> for AuthToken {
    fn from(resp: AuthResponse) -> Self {
        AuthToken::new(resp.token, resp.user_id, resp.login)
    }
}

/// Body of `users/login` and `users/register`.
///
/// `device_token` is the push-notification token of this device, so the
/// server can deliver price alerts to it.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub login: String,
    pub password: String,
    pub device_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("device_token", &self.device_token)
            .finish()
    }
}

/// Body of `users/change-password`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Generic `{"message": "..."}` response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

// =============================================================================
// Catalog
// =============================================================================

/// A catalog book. Immutable snapshot from a catalog query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    /// Publisher name.
    pub publisher: String,
    /// Cover type name (hardcover, paperback, ...).
    pub cover: String,
    #[ts(type = "number | null")]
    pub min_price: Option<Money>,
    #[ts(type = "number | null")]
    pub max_price: Option<Money>,
    pub is_available: bool,
}

/// Cover type, used as a catalog filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cover {
    pub id: String,
    pub name: String,
}

/// Publisher, used as a catalog filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Publisher {
    pub id: String,
    pub title: String,
}

/// Filters and paging for `GET catalog/books`.
///
/// Text filters are stored already normalized: `None` means "not sent".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher_id: Option<String>,
    pub cover_id: Option<String>,
    pub page_number: u32,
    pub page_size: u32,
    /// Only books currently in stock somewhere.
    pub available_only: bool,
}

impl Default for BookQuery {
    fn default() -> Self {
        BookQuery {
            title: None,
            author: None,
            publisher_id: None,
            cover_id: None,
            page_number: FIRST_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            available_only: false,
        }
    }
}

impl BookQuery {
    /// Query parameters in the order and spelling the API expects.
    ///
    /// Absent filters are omitted; paging and availability are always sent.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(7);
        if let Some(title) = &self.title {
            pairs.push(("Title", title.clone()));
        }
        if let Some(author) = &self.author {
            pairs.push(("Author", author.clone()));
        }
        if let Some(id) = &self.publisher_id {
            pairs.push(("PublisherId", id.clone()));
        }
        if let Some(id) = &self.cover_id {
            pairs.push(("CoverId", id.clone()));
        }
        pairs.push(("PageNumber", self.page_number.to_string()));
        pairs.push(("PageSize", self.page_size.to_string()));
        pairs.push(("IsAvailable", self.available_only.to_string()));
        pairs
    }
}

// =============================================================================
// Offers
// =============================================================================

/// A shop's offer for a book.
///
/// `is_liked` / `is_price_set` are per-user flags that the client flips
/// optimistically; the server holds the authoritative values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Offer {
    pub id: String,
    #[ts(type = "number")]
    pub price: Money,
    pub is_available: bool,
    /// External purchase link.
    pub link: String,
    pub shop_name: String,
    pub shop_logo_url: Option<String>,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_price_set: bool,
}

/// Price sort order of the offer list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PriceOrder {
    Ascending,
    /// Most expensive first. Initial order of the offers screen.
    #[default]
    Descending,
}

impl PriceOrder {
    pub fn toggled(self) -> Self {
        match self {
            PriceOrder::Ascending => PriceOrder::Descending,
            PriceOrder::Descending => PriceOrder::Ascending,
        }
    }

    /// Sorts offers by price. Stable, so equal prices keep server order.
    pub fn sort(self, offers: &mut [Offer]) {
        match self {
            PriceOrder::Ascending => offers.sort_by(|a, b| a.price.cmp(&b.price)),
            PriceOrder::Descending => offers.sort_by(|a, b| b.price.cmp(&a.price)),
        }
    }
}

/// A favorited offer as listed by `GET favorites`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LikedOffer {
    pub offer_id: String,
    pub book_title: String,
    pub book_image_url: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub shop_name: String,
    pub link: String,
    #[ts(type = "number")]
    pub current_price: Money,
    pub is_available: bool,
    /// A price alert is configured for this offer.
    #[serde(default)]
    pub is_notify_set: bool,
}

/// Body of `PATCH favorites/add-price`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPriceRequest {
    pub offer_id: String,
    pub price: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(id: &str, minor: i64) -> Offer {
        Offer {
            id: id.to_string(),
            price: Money::from_minor(minor),
            is_available: true,
            link: format!("https://shop.example/{}", id),
            shop_name: "Shop".to_string(),
            shop_logo_url: None,
            is_liked: false,
            is_price_set: false,
        }
    }

    #[test]
    fn test_book_from_api_json() {
        let json = r#"{
            "id": "b1",
            "title": "Kobzar",
            "imageUrl": null,
            "authors": ["Taras Shevchenko"],
            "publisher": "A-BA-BA-HA-LA-MA-HA",
            "cover": "Hardcover",
            "minPrice": 249.9,
            "maxPrice": null,
            "isAvailable": true
        }"#;
        let book: Book = serde_json::from_str(json).unwrap();
        assert_eq!(book.title, "Kobzar");
        assert_eq!(book.min_price, Some(Money::from_minor(24990)));
        assert_eq!(book.max_price, None);
        assert!(book.is_available);
    }

    #[test]
    fn test_offer_flags_default_to_false() {
        let json = r#"{
            "id": "o1", "price": 199, "isAvailable": false,
            "link": "https://shop.example/o1", "shopName": "Yakaboo", "shopLogoUrl": null
        }"#;
        let offer: Offer = serde_json::from_str(json).unwrap();
        assert!(!offer.is_liked);
        assert!(!offer.is_price_set);
        assert_eq!(offer.price, Money::from_minor(19900));
    }

    #[test]
    fn test_query_pairs_omit_absent_filters() {
        let query = BookQuery {
            title: Some("Kobzar".to_string()),
            page_number: 2,
            ..Default::default()
        };
        let pairs = query.to_query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("Title", "Kobzar".to_string()),
                ("PageNumber", "2".to_string()),
                ("PageSize", "10".to_string()),
                ("IsAvailable", "false".to_string()),
            ]
        );
    }

    #[test]
    fn test_price_order_sort_and_toggle() {
        let mut offers = vec![offer("a", 300), offer("b", 100), offer("c", 200)];

        PriceOrder::Ascending.sort(&mut offers);
        let ids: Vec<_> = offers.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);

        let order = PriceOrder::Ascending.toggled();
        assert_eq!(order, PriceOrder::Descending);
        order.sort(&mut offers);
        let ids: Vec<_> = offers.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["a", "c", "b"]);
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials {
            login: "reader".to_string(),
            password: "hunter2".to_string(),
            device_token: "fcm-1".to_string(),
        };
        let debug = format!("{:?}", creds);
        assert!(debug.contains("reader"));
        assert!(!debug.contains("hunter2"));

        let token = AuthToken::new("secret-jwt", "u1", "reader");
        assert!(!format!("{:?}", token).contains("secret-jwt"));
    }

    #[test]
    fn test_auth_response_into_token() {
        let resp: AuthResponse =
            serde_json::from_str(r#"{"login":"reader","token":"jwt","userId":"u1"}"#).unwrap();
        let token = AuthToken::from(resp);
        assert_eq!(token.token, "jwt");
        assert_eq!(token.user_id, "u1");
        assert_eq!(token.login, "reader");
    }
}
