//! # API Trait
//!
//! One async method per REST call. The state holders depend on this trait,
//! never on [`HttpApiClient`](crate::http::HttpApiClient) directly, so they
//! can run against a scripted fake.

use async_trait::async_trait;

use findly_core::{
    AddPriceRequest, AuthResponse, Book, BookQuery, ChangePasswordRequest, Cover, Credentials,
    LikedOffer, MessageResponse, Offer, Publisher,
};

use crate::error::ClientResult;

#[async_trait]
pub trait FindlyApi: Send + Sync {
    // =========================================================================
    // Users
    // =========================================================================

    /// `POST users/login`
    async fn login(&self, credentials: &Credentials) -> ClientResult<AuthResponse>;

    /// `POST users/register`
    async fn register(&self, credentials: &Credentials) -> ClientResult<AuthResponse>;

    /// `POST users/change-password`
    async fn change_password(&self, request: &ChangePasswordRequest)
        -> ClientResult<MessageResponse>;

    // =========================================================================
    // Catalog
    // =========================================================================

    /// `GET catalog/books`
    async fn search_books(&self, query: &BookQuery) -> ClientResult<Vec<Book>>;

    /// `GET catalog/covers`
    async fn covers(&self) -> ClientResult<Vec<Cover>>;

    /// `GET catalog/publishers`
    async fn publishers(&self) -> ClientResult<Vec<Publisher>>;

    /// `GET books/{bookId}/offers`
    async fn offers_for_book(&self, book_id: &str) -> ClientResult<Vec<Offer>>;

    // =========================================================================
    // Favorites
    // =========================================================================

    /// `GET favorites`
    async fn favorites(&self) -> ClientResult<Vec<LikedOffer>>;

    /// `POST favorites/{offerId}`
    async fn add_favorite(&self, offer_id: &str) -> ClientResult<MessageResponse>;

    /// `DELETE favorites/{offerId}`
    async fn remove_favorite(&self, offer_id: &str) -> ClientResult<MessageResponse>;

    /// `PATCH favorites/add-price`
    async fn add_price_alert(&self, request: &AddPriceRequest) -> ClientResult<MessageResponse>;

    /// `PATCH favorites/remove-price/{offerId}`
    async fn remove_price_alert(&self, offer_id: &str) -> ClientResult<MessageResponse>;
}
