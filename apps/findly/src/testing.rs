//! Scripted in-memory `FindlyApi` for state holder tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use findly_client::{ClientError, ClientResult, FindlyApi, Session};
use findly_core::{
    AddPriceRequest, AuthResponse, AuthToken, Book, BookQuery, ChangePasswordRequest, Cover,
    Credentials, LikedOffer, MessageResponse, Money, Offer, Publisher,
};

pub(crate) struct FakeApi {
    pages: Mutex<VecDeque<Vec<Book>>>,
    covers: Mutex<Vec<Cover>>,
    publishers: Mutex<Vec<Publisher>>,
    offers: Mutex<Vec<Offer>>,
    favorites: Mutex<Vec<LikedOffer>>,
    fail_reads: AtomicBool,
    fail_mutations: AtomicBool,
    held: AtomicBool,
    gate: Semaphore,
    calls: Mutex<Vec<String>>,
    queries: Mutex<Vec<BookQuery>>,
    credentials: Mutex<Vec<Credentials>>,
    alerts: Mutex<Vec<AddPriceRequest>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeApi {
            pages: Mutex::new(VecDeque::new()),
            covers: Mutex::new(vec![Cover {
                id: "c1".into(),
                name: "Hardcover".into(),
            }]),
            publishers: Mutex::new(vec![Publisher {
                id: "p1".into(),
                title: "A-BA-BA-HA-LA-MA-HA".into(),
            }]),
            offers: Mutex::new(Vec::new()),
            favorites: Mutex::new(Vec::new()),
            fail_reads: AtomicBool::new(false),
            fail_mutations: AtomicBool::new(false),
            held: AtomicBool::new(false),
            gate: Semaphore::new(0),
            calls: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            credentials: Mutex::new(Vec::new()),
            alerts: Mutex::new(Vec::new()),
        })
    }

    // =========================================================================
    // Scripting
    // =========================================================================

    /// Queues book pages; each search pops one, then returns empty pages.
    pub fn push_page(&self, books: Vec<Book>) {
        self.pages.lock().unwrap().push_back(books);
    }

    pub fn set_offers(&self, offers: Vec<Offer>) {
        *self.offers.lock().unwrap() = offers;
    }

    pub fn set_favorites(&self, favorites: Vec<LikedOffer>) {
        *self.favorites.lock().unwrap() = favorites;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    /// Every following call records itself, then waits for [`release`](Self::release).
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Following calls run straight through; calls already held still need
    /// [`release`](Self::release).
    pub fn resume(&self) {
        self.held.store(false, Ordering::SeqCst);
    }

    /// Lets `n` held calls proceed.
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, call: &str) -> bool {
        self.calls().iter().any(|c| c == call)
    }

    pub fn queries(&self) -> Vec<BookQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn credentials(&self) -> Vec<Credentials> {
        self.credentials.lock().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<AddPriceRequest> {
        self.alerts.lock().unwrap().clone()
    }

    async fn checkpoint(&self, call: String) {
        self.calls.lock().unwrap().push(call);
        if self.held.load(Ordering::SeqCst) {
            self.gate.acquire().await.unwrap().forget();
        }
    }

    fn read<T>(&self, value: T) -> ClientResult<T> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(ClientError::ConnectionFailed("simulated outage".into()))
        } else {
            Ok(value)
        }
    }

    fn mutation(&self) -> ClientResult<MessageResponse> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            Err(ClientError::Rejected {
                status: 500,
                message: "simulated failure".into(),
            })
        } else {
            Ok(MessageResponse::default())
        }
    }
}

#[async_trait]
impl FindlyApi for FakeApi {
    async fn login(&self, credentials: &Credentials) -> ClientResult<AuthResponse> {
        self.checkpoint(format!("login:{}", credentials.login)).await;
        self.credentials.lock().unwrap().push(credentials.clone());
        if credentials.password != "hunter2" {
            return Err(ClientError::Rejected {
                status: 400,
                message: "Wrong login or password".into(),
            });
        }
        Ok(AuthResponse {
            login: credentials.login.clone(),
            token: "jwt-1".into(),
            user_id: "u1".into(),
        })
    }

    async fn register(&self, credentials: &Credentials) -> ClientResult<AuthResponse> {
        self.checkpoint(format!("register:{}", credentials.login)).await;
        self.credentials.lock().unwrap().push(credentials.clone());
        if credentials.login == "taken" {
            return Err(ClientError::Rejected {
                status: 409,
                message: "Login already taken".into(),
            });
        }
        Ok(AuthResponse {
            login: credentials.login.clone(),
            token: "jwt-new".into(),
            user_id: "u2".into(),
        })
    }

    async fn change_password(
        &self,
        request: &ChangePasswordRequest,
    ) -> ClientResult<MessageResponse> {
        self.checkpoint("change_password".into()).await;
        if request.old_password != "hunter2" {
            return Err(ClientError::Rejected {
                status: 400,
                message: "Old password is incorrect".into(),
            });
        }
        Ok(MessageResponse {
            message: "Password changed".into(),
        })
    }

    async fn search_books(&self, query: &BookQuery) -> ClientResult<Vec<Book>> {
        self.checkpoint(format!("search:{}", query.page_number)).await;
        self.queries.lock().unwrap().push(query.clone());
        let page = self.pages.lock().unwrap().pop_front().unwrap_or_default();
        self.read(page)
    }

    async fn covers(&self) -> ClientResult<Vec<Cover>> {
        self.checkpoint("covers".into()).await;
        self.read(self.covers.lock().unwrap().clone())
    }

    async fn publishers(&self) -> ClientResult<Vec<Publisher>> {
        self.checkpoint("publishers".into()).await;
        self.read(self.publishers.lock().unwrap().clone())
    }

    async fn offers_for_book(&self, book_id: &str) -> ClientResult<Vec<Offer>> {
        self.checkpoint(format!("offers:{}", book_id)).await;
        self.read(self.offers.lock().unwrap().clone())
    }

    async fn favorites(&self) -> ClientResult<Vec<LikedOffer>> {
        self.checkpoint("favorites".into()).await;
        self.read(self.favorites.lock().unwrap().clone())
    }

    async fn add_favorite(&self, offer_id: &str) -> ClientResult<MessageResponse> {
        self.checkpoint(format!("add_favorite:{}", offer_id)).await;
        self.mutation()
    }

    async fn remove_favorite(&self, offer_id: &str) -> ClientResult<MessageResponse> {
        self.checkpoint(format!("remove_favorite:{}", offer_id)).await;
        self.mutation()
    }

    async fn add_price_alert(&self, request: &AddPriceRequest) -> ClientResult<MessageResponse> {
        self.checkpoint(format!("add_price:{}", request.offer_id)).await;
        self.alerts.lock().unwrap().push(request.clone());
        self.mutation()
    }

    async fn remove_price_alert(&self, offer_id: &str) -> ClientResult<MessageResponse> {
        self.checkpoint(format!("remove_price:{}", offer_id)).await;
        self.mutation()
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub(crate) fn book(id: &str) -> Book {
    Book {
        id: id.to_string(),
        title: format!("Book {}", id),
        image_url: None,
        authors: vec!["Taras Shevchenko".to_string()],
        publisher: "A-BA-BA-HA-LA-MA-HA".to_string(),
        cover: "Hardcover".to_string(),
        min_price: Some(Money::from_minor(19900)),
        max_price: Some(Money::from_minor(41000)),
        is_available: true,
    }
}

pub(crate) fn books(prefix: &str, n: usize) -> Vec<Book> {
    (0..n).map(|i| book(&format!("{}{}", prefix, i))).collect()
}

pub(crate) fn offer(id: &str, minor: i64) -> Offer {
    Offer {
        id: id.to_string(),
        price: Money::from_minor(minor),
        is_available: true,
        link: format!("https://shop.example/{}", id),
        shop_name: "Yakaboo".to_string(),
        shop_logo_url: None,
        is_liked: false,
        is_price_set: false,
    }
}

pub(crate) fn liked(offer_id: &str) -> LikedOffer {
    LikedOffer {
        offer_id: offer_id.to_string(),
        book_title: "Kobzar".to_string(),
        book_image_url: None,
        authors: vec!["Taras Shevchenko".to_string()],
        shop_name: "Yakaboo".to_string(),
        link: format!("https://shop.example/{}", offer_id),
        current_price: Money::from_minor(24990),
        is_available: true,
        is_notify_set: false,
    }
}

pub(crate) fn logged_in_session() -> Session {
    let session = Session::in_memory();
    session
        .login(AuthToken::new("jwt-1", "u1", "reader"))
        .unwrap();
    session
}

/// Yields to the runtime until `cond` holds.
pub(crate) async fn wait_until(cond: impl Fn() -> bool) {
    for _ in 0..10_000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
