//! HttpApiClient against a throwaway axum server on an ephemeral port.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::sync::Notify;

use findly_client::{ClientConfig, ClientError, FindlyApi, HttpApiClient, Session};
use findly_core::{AddPriceRequest, AuthToken, BookQuery, Credentials, Money};

// =============================================================================
// Test Server
// =============================================================================

#[derive(Debug, Clone)]
struct Seen {
    method: &'static str,
    path: String,
    auth: Option<String>,
    query: HashMap<String, String>,
    body: Option<Value>,
}

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<Seen>>,
}

impl Recorder {
    fn push(&self, seen: Seen) {
        self.seen.lock().unwrap().push(seen);
    }

    fn last(&self) -> Seen {
        self.seen.lock().unwrap().last().cloned().expect("no request recorded")
    }

    fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

type Shared = Arc<Recorder>;

fn auth(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn books(
    State(rec): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    rec.push(Seen {
        method: "GET",
        path: "catalog/books".into(),
        auth: auth(&headers),
        query,
        body: None,
    });
    Json(json!([{
        "id": "b1",
        "title": "Кобзар",
        "imageUrl": null,
        "authors": ["Тарас Шевченко"],
        "publisher": "A-BA-BA-HA-LA-MA-HA",
        "cover": "Hardcover",
        "minPrice": 249.9,
        "maxPrice": 410,
        "isAvailable": true
    }]))
}

async fn offers(State(rec): State<Shared>, headers: HeaderMap, Path(book_id): Path<String>) -> Json<Value> {
    rec.push(Seen {
        method: "GET",
        path: format!("books/{}/offers", book_id),
        auth: auth(&headers),
        query: HashMap::new(),
        body: None,
    });
    Json(json!([
        { "id": "o1", "price": 249.9, "isAvailable": true, "link": "https://a.example/o1",
          "shopName": "Yakaboo", "shopLogoUrl": null, "isLiked": true, "isPriceSet": false },
        { "id": "o2", "price": 410, "isAvailable": false, "link": "https://b.example/o2",
          "shopName": "Book Club", "shopLogoUrl": "https://b.example/logo.png" }
    ]))
}

async fn login(State(rec): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    rec.push(Seen {
        method: "POST",
        path: "users/login".into(),
        auth: None,
        query: HashMap::new(),
        body: Some(body.clone()),
    });
    if body["password"] == "hunter2" {
        (
            StatusCode::OK,
            Json(json!({ "login": body["login"], "token": "jwt-1", "userId": "u1" })),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Wrong login or password" })),
        )
    }
}

async fn add_favorite(State(rec): State<Shared>, headers: HeaderMap, Path(offer_id): Path<String>) -> StatusCode {
    rec.push(Seen {
        method: "POST",
        path: format!("favorites/{}", offer_id),
        auth: auth(&headers),
        query: HashMap::new(),
        body: None,
    });
    StatusCode::OK
}

async fn remove_favorite(
    State(rec): State<Shared>,
    headers: HeaderMap,
    Path(offer_id): Path<String>,
) -> &'static str {
    rec.push(Seen {
        method: "DELETE",
        path: format!("favorites/{}", offer_id),
        auth: auth(&headers),
        query: HashMap::new(),
        body: None,
    });
    "Removed from favorites"
}

async fn add_price(State(rec): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    rec.push(Seen {
        method: "PATCH",
        path: "favorites/add-price".into(),
        auth: auth(&headers),
        query: HashMap::new(),
        body: Some(body),
    });
    Json(json!({ "message": "Price alert set" }))
}

async fn favorites_expired(State(rec): State<Shared>, headers: HeaderMap) -> StatusCode {
    rec.push(Seen {
        method: "GET",
        path: "favorites".into(),
        auth: auth(&headers),
        query: HashMap::new(),
        body: None,
    });
    StatusCode::UNAUTHORIZED
}

async fn covers_broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "")
}

async fn spawn_server() -> (String, Shared) {
    let rec = Shared::default();
    let app = Router::new()
        .route("/api/catalog/books", get(books))
        .route("/api/catalog/covers", get(covers_broken))
        .route("/api/books/{book_id}/offers", get(offers))
        .route("/api/users/login", post(login))
        .route("/api/favorites", get(favorites_expired))
        .route("/api/favorites/{offer_id}", post(add_favorite).delete(remove_favorite))
        .route("/api/favorites/add-price", patch(add_price))
        .with_state(rec.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api", addr), rec)
}

/// Answers `GET favorites` with 401, but only after `release` fires.
#[derive(Default)]
struct Gate {
    arrived: Notify,
    release: Notify,
}

async fn favorites_held_401(State(gate): State<Arc<Gate>>) -> StatusCode {
    gate.arrived.notify_one();
    gate.release.notified().await;
    StatusCode::UNAUTHORIZED
}

async fn spawn_gated_server() -> (String, Arc<Gate>) {
    let gate = Arc::new(Gate::default());
    let app = Router::new()
        .route("/api/favorites", get(favorites_held_401))
        .with_state(gate.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api", addr), gate)
}

fn client(base_url: &str, session: Session) -> HttpApiClient {
    let mut config = ClientConfig::default();
    config.api.base_url = base_url.to_string();
    HttpApiClient::new(&config, session).unwrap()
}

fn logged_in() -> Session {
    let session = Session::in_memory();
    session.login(AuthToken::new("jwt-1", "u1", "reader")).unwrap();
    session
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn search_sends_bearer_and_encoded_filters() {
    let (base, rec) = spawn_server().await;
    let api = client(&base, logged_in());

    let query = BookQuery {
        title: Some("Кобзар".into()),
        page_number: 2,
        available_only: true,
        ..Default::default()
    };
    let books = api.search_books(&query).await.unwrap();

    assert_eq!(books.len(), 1);
    assert_eq!(books[0].min_price, Some(Money::from_minor(24990)));
    assert_eq!(books[0].max_price, Some(Money::from_minor(41000)));

    let seen = rec.last();
    assert_eq!(seen.auth.as_deref(), Some("Bearer jwt-1"));
    assert_eq!(seen.query.get("Title").map(String::as_str), Some("Кобзар"));
    assert_eq!(seen.query.get("PageNumber").map(String::as_str), Some("2"));
    assert_eq!(seen.query.get("PageSize").map(String::as_str), Some("10"));
    assert_eq!(seen.query.get("IsAvailable").map(String::as_str), Some("true"));
    assert!(!seen.query.contains_key("Author"));
    assert!(!seen.query.contains_key("PublisherId"));
}

#[tokio::test]
async fn anonymous_requests_carry_no_auth_header() {
    let (base, rec) = spawn_server().await;
    let api = client(&base, Session::in_memory());

    let offers = api.offers_for_book("b1").await.unwrap();
    assert_eq!(offers.len(), 2);
    assert!(offers[0].is_liked);
    assert!(!offers[1].is_liked);
    assert_eq!(offers[1].shop_logo_url.as_deref(), Some("https://b.example/logo.png"));

    let seen = rec.last();
    assert_eq!(seen.path, "books/b1/offers");
    assert!(seen.auth.is_none());
}

#[tokio::test]
async fn login_posts_camel_case_credentials() {
    let (base, rec) = spawn_server().await;
    let api = client(&base, Session::in_memory());

    let resp = api
        .login(&Credentials {
            login: "reader".into(),
            password: "hunter2".into(),
            device_token: "fcm-42".into(),
        })
        .await
        .unwrap();
    assert_eq!(resp.token, "jwt-1");
    assert_eq!(resp.user_id, "u1");

    let body = rec.last().body.unwrap();
    assert_eq!(body["deviceToken"], "fcm-42");
    assert_eq!(body["login"], "reader");
}

#[tokio::test]
async fn rejected_call_surfaces_server_message() {
    let (base, _rec) = spawn_server().await;
    let session = Session::in_memory();
    let api = client(&base, session.clone());

    let err = api
        .login(&Credentials {
            login: "reader".into(),
            password: "wrong".into(),
            device_token: String::new(),
        })
        .await
        .unwrap_err();

    match err {
        ClientError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Wrong login or password");
        }
        other => panic!("expected Rejected, got {:?}", other),
    }
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn empty_error_body_falls_back_to_status_reason() {
    let (base, _rec) = spawn_server().await;
    let api = client(&base, Session::in_memory());

    let err = api.covers().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Rejected { status: 500, ref message } if message == "Internal Server Error"
    ));
}

#[tokio::test]
async fn unauthorized_tears_down_session() {
    let (base, rec) = spawn_server().await;
    let session = logged_in();
    let mut rx = session.subscribe();
    let api = client(&base, session.clone());

    let err = api.favorites().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(rec.last().auth.as_deref(), Some("Bearer jwt-1"));
    assert!(!session.is_authenticated());
    assert!(session.bearer().is_none());
    rx.changed().await.unwrap();
    assert!(!*rx.borrow());
}

#[tokio::test]
async fn late_unauthorized_keeps_newer_login() {
    let (base, gate) = spawn_gated_server().await;
    let session = Session::in_memory();
    session.login(AuthToken::new("expired", "u1", "reader")).unwrap();
    let api = client(&base, session.clone());

    let call = tokio::spawn({
        let api = api.clone();
        async move { api.favorites().await }
    });
    gate.arrived.notified().await;

    // Re-login while the old token's request is still on the wire
    session.login(AuthToken::new("fresh", "u1", "reader")).unwrap();
    gate.release.notify_one();

    let err = call.await.unwrap().unwrap_err();
    assert!(err.is_unauthorized());
    assert!(session.is_authenticated());
    assert_eq!(session.bearer().as_deref(), Some("fresh"));
}

#[tokio::test]
async fn favorite_mutations_hit_the_right_routes() {
    let (base, rec) = spawn_server().await;
    let api = client(&base, logged_in());

    let added = api.add_favorite("o1").await.unwrap();
    assert!(added.message.is_empty());
    assert_eq!(rec.last().method, "POST");
    assert_eq!(rec.last().path, "favorites/o1");

    let removed = api.remove_favorite("o1").await.unwrap();
    assert_eq!(removed.message, "Removed from favorites");
    assert_eq!(rec.last().method, "DELETE");

    let alert = api
        .add_price_alert(&AddPriceRequest {
            offer_id: "o1".into(),
            price: Money::from_minor(19950),
        })
        .await
        .unwrap();
    assert_eq!(alert.message, "Price alert set");

    let body = rec.last().body.unwrap();
    assert_eq!(body["offerId"], "o1");
    assert_eq!(body["price"], json!(199.5));
    assert_eq!(rec.count(), 3);
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = client(&format!("http://{}/api/", addr), Session::in_memory());
    let err = api.publishers().await.unwrap_err();
    assert!(err.is_transport(), "unexpected error: {:?}", err);
}
