//! # Catalog State
//!
//! Book search with paging, and the offer list of one selected book.
//!
//! ## Screen Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Catalog State Machine                                │
//! │                                                                         │
//! │   ┌────────────────────────┐  open_book(book)  ┌─────────────────────┐ │
//! │   │          LIST          │ ────────────────► │       DETAILS       │ │
//! │   │                        │                   │                     │ │
//! │   │  set_title/author/...  │ ◄──────────────── │  offers sorted by   │ │
//! │   │   └► reset to page 1   │    close_book()   │  price_order        │ │
//! │   │  load_next_page()      │                   │  toggle_favorite    │ │
//! │   │   └► append            │                   │  bell / prompt      │ │
//! │   └────────────────────────┘                   └─────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Paging
//! A reset clears the list, bumps `generation` and fetches page 1; any page
//! still in flight from an older generation is dropped when it lands. Appends
//! are refused while a fetch is running or after an empty page marked the
//! end of the results.
//!
//! ## Optimistic Offer Flags
//! ```text
//!   lock ─► copy offer ─► flip flags ─► unlock ─► await API
//!                                                   │
//!                         ┌─────────────────────────┴──────┐
//!                         ▼                                ▼
//!                       Ok: keep                  Err: put the copy back,
//!                                                 set view.error
//! ```
//!
//! The copy only goes back into the offer list it was taken from;
//! `offers_generation` moves whenever that list is replaced or cleared.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, info, warn};

use findly_client::{FindlyApi, Session};
use findly_core::validation::{normalize_search_text, parse_price_input, validate_alert_price};
use findly_core::{
    AddPriceRequest, Book, BookQuery, CoreError, Cover, Money, Offer, PriceOrder, Publisher,
    FIRST_PAGE,
};

use super::{lock, MutationOutcome};
use crate::error::UiError;
use crate::inflight::InFlight;

/// Items from the end of the list at which the next page is requested.
const NEAR_END_THRESHOLD: usize = 2;

// =============================================================================
// View
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogScreen {
    #[default]
    List,
    Details,
}

/// Search filters as the user typed/selected them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFilters {
    pub title: String,
    pub author: String,
    pub publisher_id: Option<String>,
    pub cover_id: Option<String>,
    pub available_only: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
    pub screen: CatalogScreen,

    // Reference data for the filter pickers
    pub covers: Vec<Cover>,
    pub publishers: Vec<Publisher>,

    // LIST
    pub filters: CatalogFilters,
    pub books: Vec<Book>,
    /// Page number the next fetch will request.
    pub next_page: u32,
    pub page_size: u32,
    pub is_loading: bool,
    pub is_last_page: bool,

    // DETAILS
    pub selected_book: Option<Book>,
    pub offers: Vec<Offer>,
    pub offers_loading: bool,
    pub price_order: PriceOrder,

    // Prompts
    /// Offer id waiting for a price-alert threshold.
    pub price_prompt: Option<String>,
    pub show_auth_prompt: bool,

    pub error: Option<UiError>,

    #[serde(skip)]
    generation: u64,
    #[serde(skip)]
    offers_generation: u64,
}

impl CatalogView {
    fn new(page_size: u32) -> Self {
        CatalogView {
            screen: CatalogScreen::List,
            covers: Vec::new(),
            publishers: Vec::new(),
            filters: CatalogFilters::default(),
            books: Vec::new(),
            next_page: FIRST_PAGE,
            page_size,
            is_loading: false,
            is_last_page: false,
            selected_book: None,
            offers: Vec::new(),
            offers_loading: false,
            price_order: PriceOrder::default(),
            price_prompt: None,
            show_auth_prompt: false,
            error: None,
            generation: 0,
            offers_generation: 0,
        }
    }

    pub fn offer(&self, offer_id: &str) -> Option<&Offer> {
        self.offers.iter().find(|o| o.id == offer_id)
    }

    fn offer_mut(&mut self, offer_id: &str) -> Option<&mut Offer> {
        self.offers.iter_mut().find(|o| o.id == offer_id)
    }

    /// Puts a pre-mutation copy back in place, unless the offers were
    /// reloaded since it was taken.
    fn restore_offer(&mut self, original: Offer, offers_generation: u64) {
        if self.offers_generation != offers_generation {
            debug!(offer_id = %original.id, "Offers replaced meanwhile, rollback dropped");
            return;
        }
        if let Some(slot) = self.offer_mut(&original.id) {
            *slot = original;
        }
    }

    fn query(&self) -> Result<BookQuery, UiError> {
        Ok(BookQuery {
            title: normalize_search_text("title", &self.filters.title)?,
            author: normalize_search_text("author", &self.filters.author)?,
            publisher_id: self.filters.publisher_id.clone(),
            cover_id: self.filters.cover_id.clone(),
            page_number: self.next_page,
            page_size: self.page_size,
            available_only: self.filters.available_only,
        })
    }

    fn replace_offers(&mut self, offers: Vec<Offer>) {
        self.offers_generation += 1;
        self.offers = offers;
    }

    fn clear_user_flags(&mut self) {
        for offer in &mut self.offers {
            offer.is_liked = false;
            offer.is_price_set = false;
        }
        self.price_prompt = None;
    }
}

// =============================================================================
// State Holder
// =============================================================================

#[derive(Clone)]
pub struct CatalogState {
    view: Arc<Mutex<CatalogView>>,
    api: Arc<dyn FindlyApi>,
    session: Session,
    in_flight: InFlight,
}

impl CatalogState {
    pub fn new(api: Arc<dyn FindlyApi>, session: Session, page_size: u32) -> Self {
        CatalogState {
            view: Arc::new(Mutex::new(CatalogView::new(page_size))),
            api,
            session,
            in_flight: InFlight::new(),
        }
    }

    /// Executes a function with read access to the view.
    pub fn with_view<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&CatalogView) -> R,
    {
        f(&lock(&self.view))
    }

    /// Owned copy of the view, e.g. for rendering.
    pub fn snapshot(&self) -> CatalogView {
        self.with_view(|view| view.clone())
    }

    fn with_view_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut CatalogView) -> R,
    {
        f(&mut lock(&self.view))
    }

    // =========================================================================
    // LIST: reference data and paging
    // =========================================================================

    /// Loads publishers, then covers, then the first page of books.
    pub async fn load_reference_data(&self) {
        let publishers = match self.api.publishers().await {
            Ok(publishers) => publishers,
            Err(e) => return self.fail("Loading publishers", e.into()),
        };
        let covers = match self.api.covers().await {
            Ok(covers) => covers,
            Err(e) => return self.fail("Loading covers", e.into()),
        };

        debug!(publishers = publishers.len(), covers = covers.len(), "Reference data loaded");
        self.with_view_mut(|view| {
            view.publishers = publishers;
            view.covers = covers;
        });

        self.refresh().await;
    }

    pub async fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.with_view_mut(|view| view.filters.title = title);
        self.refresh().await;
    }

    pub async fn set_author(&self, author: impl Into<String>) {
        let author = author.into();
        self.with_view_mut(|view| view.filters.author = author);
        self.refresh().await;
    }

    pub async fn set_publisher(&self, publisher_id: Option<String>) {
        self.with_view_mut(|view| view.filters.publisher_id = publisher_id);
        self.refresh().await;
    }

    pub async fn set_cover(&self, cover_id: Option<String>) {
        self.with_view_mut(|view| view.filters.cover_id = cover_id);
        self.refresh().await;
    }

    pub async fn set_available_only(&self, available_only: bool) {
        self.with_view_mut(|view| view.filters.available_only = available_only);
        self.refresh().await;
    }

    /// Drops the current results and fetches page 1 with the current filters.
    pub async fn refresh(&self) {
        self.fetch_page(true).await;
    }

    /// Appends the next page unless a fetch is running or the end was reached.
    pub async fn load_next_page(&self) {
        self.fetch_page(false).await;
    }

    /// True when the item at `index` is close enough to the end of the list
    /// that the next page should be requested.
    pub fn near_end(&self, index: usize) -> bool {
        self.with_view(|view| {
            !view.is_loading
                && !view.is_last_page
                && index.saturating_add(NEAR_END_THRESHOLD) >= view.books.len()
        })
    }

    async fn fetch_page(&self, reset: bool) {
        let prepared = self.with_view_mut(|view| {
            if reset {
                view.generation += 1;
                view.next_page = FIRST_PAGE;
                view.is_last_page = false;
                view.books.clear();
                view.error = None;
            } else if view.is_loading || view.is_last_page {
                return None;
            }

            match view.query() {
                Ok(query) => {
                    view.is_loading = true;
                    Some((query, view.generation))
                }
                Err(e) => {
                    view.is_loading = false;
                    view.error = Some(e);
                    None
                }
            }
        });

        let Some((query, generation)) = prepared else {
            return;
        };

        debug!(page = query.page_number, reset, "Fetching books");
        let result = self.api.search_books(&query).await;

        self.with_view_mut(|view| {
            if view.generation != generation {
                debug!(page = query.page_number, "Dropping superseded page");
                return;
            }
            view.is_loading = false;

            match result {
                Ok(books) if books.is_empty() => {
                    debug!(page = query.page_number, "Empty page, end of results");
                    view.is_last_page = true;
                }
                Ok(books) => {
                    debug!(page = query.page_number, count = books.len(), "Page loaded");
                    view.books.extend(books);
                    view.next_page += 1;
                }
                Err(e) if reset => view.error = Some(e.into()),
                Err(e) => warn!(page = query.page_number, error = %e, "Next page failed"),
            }
        });
    }

    // =========================================================================
    // DETAILS: offers of one book
    // =========================================================================

    pub async fn open_book(&self, book: Book) {
        let book_id = book.id.clone();
        self.with_view_mut(|view| {
            view.screen = CatalogScreen::Details;
            view.selected_book = Some(book);
            view.replace_offers(Vec::new());
        });
        self.load_offers(&book_id).await;
    }

    pub fn close_book(&self) {
        self.with_view_mut(|view| {
            view.screen = CatalogScreen::List;
            view.selected_book = None;
            view.replace_offers(Vec::new());
            view.offers_loading = false;
            view.price_prompt = None;
        });
    }

    /// Flips the price order and re-sorts the loaded offers.
    pub fn toggle_sort_order(&self) {
        self.with_view_mut(|view| {
            view.price_order = view.price_order.toggled();
            let order = view.price_order;
            order.sort(&mut view.offers);
        });
    }

    async fn load_offers(&self, book_id: &str) {
        self.with_view_mut(|view| view.offers_loading = true);
        let result = self.api.offers_for_book(book_id).await;

        self.with_view_mut(|view| {
            let still_selected = view
                .selected_book
                .as_ref()
                .is_some_and(|book| book.id == book_id);
            if !still_selected {
                return;
            }
            view.offers_loading = false;

            match result {
                Ok(mut offers) => {
                    view.price_order.sort(&mut offers);
                    debug!(book_id, count = offers.len(), "Offers loaded");
                    view.replace_offers(offers);
                }
                Err(e) => {
                    warn!(book_id, error = %e, "Loading offers failed");
                    view.error = Some(e.into());
                }
            }
        });
    }

    // =========================================================================
    // Favorites and price alerts
    // =========================================================================

    /// Flips `is_liked` now, then asks the server.
    pub async fn toggle_favorite(&self, offer_id: &str) -> MutationOutcome {
        if !self.require_session() {
            return MutationOutcome::AuthRequired;
        }
        let Some(_guard) = self.in_flight.try_begin(offer_id) else {
            debug!(offer_id, "Favorite toggle already in flight");
            return MutationOutcome::Skipped;
        };

        self.flip_favorite(offer_id).await
    }

    /// Bell tap on an offer.
    ///
    /// Alert set: optimistic unset. Alert not set: like the offer if needed,
    /// then open the price prompt. A failed like is rolled back and reported
    /// on the view, but the prompt still opens while the session lasts.
    pub async fn bell(&self, offer_id: &str) -> MutationOutcome {
        if !self.require_session() {
            return MutationOutcome::AuthRequired;
        }
        let Some(_guard) = self.in_flight.try_begin(offer_id) else {
            debug!(offer_id, "Bell ignored, offer busy");
            return MutationOutcome::Skipped;
        };

        let found = self.with_view(|view| {
            view.offer(offer_id)
                .map(|offer| (offer.clone(), view.offers_generation))
        });
        let Some((offer, offers_generation)) = found else {
            return self.not_found(offer_id);
        };

        if offer.is_price_set {
            return self.unset_price_alert(offer, offers_generation).await;
        }

        if !offer.is_liked {
            let outcome = self.flip_favorite(offer_id).await;
            if outcome == MutationOutcome::Invalid || !self.session.is_authenticated() {
                return outcome;
            }
        }

        self.with_view_mut(|view| view.price_prompt = Some(offer_id.to_string()));
        MutationOutcome::PromptOpened
    }

    /// Submits the threshold typed into the price prompt.
    pub async fn confirm_price_input(&self, input: &str) -> MutationOutcome {
        match parse_price_input(input) {
            Ok(price) => self.confirm_price_alert(price).await,
            Err(e) => {
                self.with_view_mut(|view| view.error = Some(e.into()));
                MutationOutcome::Invalid
            }
        }
    }

    /// Closes the prompt and sets the alert, optimistically marking the offer
    /// liked and alerted.
    pub async fn confirm_price_alert(&self, price: Money) -> MutationOutcome {
        let Some(offer_id) = self.with_view(|view| view.price_prompt.clone()) else {
            self.with_view_mut(|view| view.error = Some(CoreError::NoPendingPriceAlert.into()));
            return MutationOutcome::Invalid;
        };
        if let Err(e) = validate_alert_price(price) {
            self.with_view_mut(|view| view.error = Some(e.into()));
            return MutationOutcome::Invalid;
        }
        if !self.require_session() {
            return MutationOutcome::AuthRequired;
        }
        let Some(_guard) = self.in_flight.try_begin(&offer_id) else {
            return MutationOutcome::Skipped;
        };

        let original = self.with_view_mut(|view| {
            view.price_prompt = None;
            let offers_generation = view.offers_generation;
            let offer = view.offer_mut(&offer_id)?;
            let original = offer.clone();
            offer.is_price_set = true;
            offer.is_liked = true;
            Some((original, offers_generation))
        });
        let Some((original, offers_generation)) = original else {
            return self.not_found(&offer_id);
        };

        let request = AddPriceRequest {
            offer_id: offer_id.clone(),
            price,
        };
        match self.api.add_price_alert(&request).await {
            Ok(_) => {
                info!(offer_id = %offer_id, %price, "Price alert set");
                MutationOutcome::Committed
            }
            Err(e) => self.roll_back(original, offers_generation, e.into()),
        }
    }

    pub fn dismiss_price_prompt(&self) {
        self.with_view_mut(|view| view.price_prompt = None);
    }

    pub fn dismiss_auth_prompt(&self) {
        self.with_view_mut(|view| view.show_auth_prompt = false);
    }

    pub fn clear_error(&self) {
        self.with_view_mut(|view| view.error = None);
    }

    /// Reacts to login/logout published by the session.
    pub async fn on_session_changed(&self, logged_in: bool) {
        if !logged_in {
            self.with_view_mut(|view| {
                view.clear_user_flags();
                view.show_auth_prompt = false;
            });
            return;
        }

        // Flags are per user; refetch them for the open book.
        let open_book = self.with_view_mut(|view| {
            view.show_auth_prompt = false;
            view.selected_book.as_ref().map(|book| book.id.clone())
        });
        if let Some(book_id) = open_book {
            self.load_offers(&book_id).await;
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn require_session(&self) -> bool {
        if self.session.is_authenticated() {
            return true;
        }
        debug!("Session required, raising auth prompt");
        self.with_view_mut(|view| view.show_auth_prompt = true);
        false
    }

    /// Favorite toggle without the session and in-flight checks.
    async fn flip_favorite(&self, offer_id: &str) -> MutationOutcome {
        let original = self.with_view_mut(|view| {
            let offers_generation = view.offers_generation;
            let offer = view.offer_mut(offer_id)?;
            let original = offer.clone();
            offer.is_liked = !offer.is_liked;
            Some((original, offers_generation))
        });
        let Some((original, offers_generation)) = original else {
            return self.not_found(offer_id);
        };

        let result = if original.is_liked {
            self.api.remove_favorite(offer_id).await
        } else {
            self.api.add_favorite(offer_id).await
        };

        match result {
            Ok(_) => {
                debug!(offer_id, liked = !original.is_liked, "Favorite toggled");
                MutationOutcome::Committed
            }
            Err(e) => self.roll_back(original, offers_generation, e.into()),
        }
    }

    async fn unset_price_alert(&self, offer: Offer, offers_generation: u64) -> MutationOutcome {
        self.with_view_mut(|view| {
            if let Some(slot) = view.offer_mut(&offer.id) {
                slot.is_price_set = false;
            }
        });

        match self.api.remove_price_alert(&offer.id).await {
            Ok(_) => {
                info!(offer_id = %offer.id, "Price alert removed");
                MutationOutcome::Committed
            }
            Err(e) => self.roll_back(offer, offers_generation, e.into()),
        }
    }

    fn roll_back(
        &self,
        mut original: Offer,
        offers_generation: u64,
        error: UiError,
    ) -> MutationOutcome {
        warn!(offer_id = %original.id, error = %error, "Rolling back offer");
        // A 401 may have ended the session meanwhile; never restore user flags then.
        if !self.session.is_authenticated() {
            original.is_liked = false;
            original.is_price_set = false;
        }
        self.with_view_mut(|view| {
            view.restore_offer(original, offers_generation);
            view.error = Some(error);
        });
        MutationOutcome::RolledBack
    }

    fn not_found(&self, offer_id: &str) -> MutationOutcome {
        self.with_view_mut(|view| {
            view.error = Some(CoreError::OfferNotFound(offer_id.to_string()).into())
        });
        MutationOutcome::Invalid
    }

    fn fail(&self, what: &str, error: UiError) {
        warn!(error = %error, "{} failed", what);
        self.with_view_mut(|view| view.error = Some(error));
    }
}
