//! # HTTP API Client
//!
//! [`FindlyApi`] over `reqwest`.
//!
//! ## Request Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  endpoint(path) ──► attach Bearer (if stored) ──► send                 │
//! │                                                     │                   │
//! │                          ┌──────────────────────────┼────────────┐     │
//! │                          ▼                          ▼            ▼     │
//! │                        2xx                         401        other    │
//! │                     decode body            session.logout()  Rejected  │
//! │                                            Unauthorized      {status,  │
//! │                                                              message}  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is retried. Every call, anonymous ones included, runs the 401
//! teardown here.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use findly_core::validation::validate_resource_id;
use findly_core::{
    AddPriceRequest, AuthResponse, Book, BookQuery, ChangePasswordRequest, Cover, Credentials,
    LikedOffer, MessageResponse, Offer, Publisher,
};

use crate::api::FindlyApi;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;

/// REST client bound to one base URL and one session.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Session,
}

impl HttpApiClient {
    pub fn new(config: &ClientConfig, session: Session) -> ClientResult<Self> {
        Ok(Self::with_client(reqwest::Client::new(), config.base_url()?, session))
    }

    /// Builds a client around an existing `reqwest::Client`.
    ///
    /// `base_url` should end in `/`; see [`ClientConfig::base_url`].
    pub fn with_client(http: reqwest::Client, base_url: Url, session: Session) -> Self {
        HttpApiClient {
            http,
            base_url,
            session,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // =========================================================================
    // Request Helpers
    // =========================================================================

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn request(&self, method: Method, path: &str) -> ClientResult<ApiRequest> {
        let url = self.endpoint(path)?;
        debug!(%method, %url, "API request");

        let bearer = self.session.bearer();
        let mut builder = self.http.request(method, url);
        if let Some(token) = &bearer {
            builder = builder.bearer_auth(token);
        }
        Ok(ApiRequest { builder, bearer })
    }

    /// Sends the request and maps every non-2xx status to an error.
    async fn execute(&self, request: ApiRequest) -> ClientResult<Response> {
        let response = request.builder.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "API response");

        if status == StatusCode::UNAUTHORIZED {
            // Only the token that was refused is torn down, not a newer login
            if self.session.bearer() == request.bearer {
                warn!(url = %response.url(), "API answered 401, ending session");
                self.session.logout();
            } else {
                debug!(url = %response.url(), "401 for a replaced token, session kept");
            }
            return Err(ClientError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_message(&body, status);
            warn!(status = status.as_u16(), message = %message, "API rejected request");
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        let response = self.execute(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Like [`send_json`](Self::send_json) for endpoints whose success body is
    /// `{"message": ...}`, plain text, or empty.
    async fn send_message(&self, request: ApiRequest) -> ClientResult<MessageResponse> {
        let response = self.execute(request).await?;
        let body = response.text().await?;

        if body.trim().is_empty() {
            return Ok(MessageResponse::default());
        }

        Ok(serde_json::from_str(&body).unwrap_or(MessageResponse {
            message: body.trim().to_string(),
        }))
    }
}

/// A request plus the bearer it was built with.
struct ApiRequest {
    builder: RequestBuilder,
    bearer: Option<String>,
}

impl ApiRequest {
    fn json<T: Serialize + ?Sized>(self, body: &T) -> Self {
        ApiRequest {
            builder: self.builder.json(body),
            ..self
        }
    }

    fn query<T: Serialize + ?Sized>(self, query: &T) -> Self {
        ApiRequest {
            builder: self.builder.query(query),
            ..self
        }
    }
}

/// Pulls a human-readable message out of an error body.
///
/// Accepts `{"message": ...}`, `{"title": ...}` problem details, or plain
/// text; falls back to the status reason.
fn extract_message(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "title"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                if !text.trim().is_empty() {
                    return text.trim().to_string();
                }
            }
        }
    } else if !body.trim().is_empty() {
        return body.trim().to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

// =============================================================================
// FindlyApi Implementation
// =============================================================================

#[async_trait]
impl FindlyApi for HttpApiClient {
    async fn login(&self, credentials: &Credentials) -> ClientResult<AuthResponse> {
        let request = self.request(Method::POST, "users/login")?.json(credentials);
        self.send_json(request).await
    }

    async fn register(&self, credentials: &Credentials) -> ClientResult<AuthResponse> {
        let request = self.request(Method::POST, "users/register")?.json(credentials);
        self.send_json(request).await
    }

    async fn change_password(
        &self,
        request: &ChangePasswordRequest,
    ) -> ClientResult<MessageResponse> {
        let request = self
            .request(Method::POST, "users/change-password")?
            .json(request);
        self.send_message(request).await
    }

    async fn search_books(&self, query: &BookQuery) -> ClientResult<Vec<Book>> {
        let request = self
            .request(Method::GET, "catalog/books")?
            .query(&query.to_query_pairs());
        self.send_json(request).await
    }

    async fn covers(&self) -> ClientResult<Vec<Cover>> {
        self.send_json(self.request(Method::GET, "catalog/covers")?)
            .await
    }

    async fn publishers(&self) -> ClientResult<Vec<Publisher>> {
        self.send_json(self.request(Method::GET, "catalog/publishers")?)
            .await
    }

    async fn offers_for_book(&self, book_id: &str) -> ClientResult<Vec<Offer>> {
        validate_resource_id("book id", book_id)?;
        let path = format!("books/{}/offers", book_id);
        self.send_json(self.request(Method::GET, &path)?).await
    }

    async fn favorites(&self) -> ClientResult<Vec<LikedOffer>> {
        self.send_json(self.request(Method::GET, "favorites")?).await
    }

    async fn add_favorite(&self, offer_id: &str) -> ClientResult<MessageResponse> {
        validate_resource_id("offer id", offer_id)?;
        let path = format!("favorites/{}", offer_id);
        self.send_message(self.request(Method::POST, &path)?).await
    }

    async fn remove_favorite(&self, offer_id: &str) -> ClientResult<MessageResponse> {
        validate_resource_id("offer id", offer_id)?;
        let path = format!("favorites/{}", offer_id);
        self.send_message(self.request(Method::DELETE, &path)?).await
    }

    async fn add_price_alert(&self, request: &AddPriceRequest) -> ClientResult<MessageResponse> {
        validate_resource_id("offer id", &request.offer_id)?;
        let request = self
            .request(Method::PATCH, "favorites/add-price")?
            .json(request);
        self.send_message(request).await
    }

    async fn remove_price_alert(&self, offer_id: &str) -> ClientResult<MessageResponse> {
        validate_resource_id("offer id", offer_id)?;
        let path = format!("favorites/remove-price/{}", offer_id);
        self.send_message(self.request(Method::PATCH, &path)?).await
    }
}
