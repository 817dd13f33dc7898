//! # Favorites State
//!
//! The signed-in user's liked offers and their price alerts.
//!
//! Removal filters the entry out immediately; if the server refuses, the
//! entry goes back at the index it was taken from. Alert set/unset flip
//! `is_notify_set` and restore the pre-mutation copy on failure.
//!
//! `generation` moves whenever the list is replaced or cleared. A rollback
//! only applies to the list it was taken from.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, info, warn};

use findly_client::{FindlyApi, Session};
use findly_core::validation::{parse_price_input, validate_alert_price};
use findly_core::{AddPriceRequest, CoreError, LikedOffer, Money};

use super::{lock, MutationOutcome};
use crate::error::UiError;
use crate::inflight::InFlight;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesView {
    pub favorites: Vec<LikedOffer>,
    pub is_loading: bool,
    /// Offer id waiting for a price-alert threshold.
    pub price_prompt: Option<String>,
    pub error: Option<UiError>,

    #[serde(skip)]
    generation: u64,
}

impl FavoritesView {
    pub fn favorite(&self, offer_id: &str) -> Option<&LikedOffer> {
        self.favorites.iter().find(|f| f.offer_id == offer_id)
    }

    fn favorite_mut(&mut self, offer_id: &str) -> Option<&mut LikedOffer> {
        self.favorites.iter_mut().find(|f| f.offer_id == offer_id)
    }

    fn restore(&mut self, original: LikedOffer, generation: u64) {
        if self.generation != generation {
            debug!(offer_id = %original.offer_id, "List replaced meanwhile, rollback dropped");
            return;
        }
        if let Some(slot) = self.favorite_mut(&original.offer_id) {
            *slot = original;
        }
    }

    fn clear(&mut self) {
        // Invalidates any load still in flight
        self.generation += 1;
        self.favorites.clear();
        self.is_loading = false;
        self.price_prompt = None;
    }
}

#[derive(Clone)]
pub struct FavoritesState {
    view: Arc<Mutex<FavoritesView>>,
    api: Arc<dyn FindlyApi>,
    session: Session,
    in_flight: InFlight,
}

impl FavoritesState {
    pub fn new(api: Arc<dyn FindlyApi>, session: Session) -> Self {
        FavoritesState {
            view: Arc::new(Mutex::new(FavoritesView::default())),
            api,
            session,
            in_flight: InFlight::new(),
        }
    }

    pub fn with_view<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&FavoritesView) -> R,
    {
        f(&lock(&self.view))
    }

    pub fn snapshot(&self) -> FavoritesView {
        self.with_view(|view| view.clone())
    }

    fn with_view_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut FavoritesView) -> R,
    {
        f(&mut lock(&self.view))
    }

    /// Replaces the list with the server's. Without a session the list is
    /// just cleared.
    pub async fn load(&self) {
        if !self.session.is_authenticated() {
            self.with_view_mut(FavoritesView::clear);
            return;
        }

        let generation = self.with_view_mut(|view| {
            view.generation += 1;
            view.is_loading = true;
            view.error = None;
            view.generation
        });

        let result = self.api.favorites().await;

        self.with_view_mut(|view| {
            if view.generation != generation {
                return;
            }
            view.is_loading = false;
            match result {
                Ok(favorites) => {
                    debug!(count = favorites.len(), "Favorites loaded");
                    view.generation += 1;
                    view.favorites = favorites;
                }
                Err(e) => {
                    warn!(error = %e, "Loading favorites failed");
                    view.error = Some(e.into());
                }
            }
        });
    }

    /// Takes the offer out of the list now, then asks the server.
    pub async fn remove(&self, offer_id: &str) -> MutationOutcome {
        let Some(_guard) = self.in_flight.try_begin(offer_id) else {
            return MutationOutcome::Skipped;
        };

        let removed = self.with_view_mut(|view| {
            let index = view.favorites.iter().position(|f| f.offer_id == offer_id)?;
            Some((index, view.favorites.remove(index), view.generation))
        });
        let Some((index, original, generation)) = removed else {
            return self.not_found(offer_id);
        };

        match self.api.remove_favorite(offer_id).await {
            Ok(_) => {
                debug!(offer_id, "Favorite removed");
                MutationOutcome::Committed
            }
            Err(e) => {
                let error = UiError::from(e);
                warn!(offer_id, error = %error, "Restoring removed favorite");
                self.with_view_mut(|view| {
                    // A reload or logout meanwhile already decided the list
                    if view.generation == generation && view.favorite(offer_id).is_none() {
                        let index = index.min(view.favorites.len());
                        view.favorites.insert(index, original);
                    }
                    view.error = Some(error);
                });
                MutationOutcome::RolledBack
            }
        }
    }

    /// Bell tap: unset an active alert, or open the price prompt.
    pub async fn bell(&self, offer_id: &str) -> MutationOutcome {
        let Some(_guard) = self.in_flight.try_begin(offer_id) else {
            return MutationOutcome::Skipped;
        };

        let original = self.with_view_mut(|view| {
            let generation = view.generation;
            let favorite = view.favorite_mut(offer_id)?;
            let original = favorite.clone();
            if favorite.is_notify_set {
                favorite.is_notify_set = false;
            } else {
                view.price_prompt = Some(offer_id.to_string());
            }
            Some((original, generation))
        });
        let Some((original, generation)) = original else {
            return self.not_found(offer_id);
        };
        if !original.is_notify_set {
            return MutationOutcome::PromptOpened;
        }

        match self.api.remove_price_alert(offer_id).await {
            Ok(_) => {
                info!(offer_id, "Price alert removed");
                MutationOutcome::Committed
            }
            Err(e) => self.roll_back(original, generation, e.into()),
        }
    }

    pub async fn confirm_price_input(&self, input: &str) -> MutationOutcome {
        match parse_price_input(input) {
            Ok(price) => self.confirm_price_alert(price).await,
            Err(e) => {
                self.with_view_mut(|view| view.error = Some(e.into()));
                MutationOutcome::Invalid
            }
        }
    }

    pub async fn confirm_price_alert(&self, price: Money) -> MutationOutcome {
        let Some(offer_id) = self.with_view(|view| view.price_prompt.clone()) else {
            self.with_view_mut(|view| view.error = Some(CoreError::NoPendingPriceAlert.into()));
            return MutationOutcome::Invalid;
        };
        if let Err(e) = validate_alert_price(price) {
            self.with_view_mut(|view| view.error = Some(e.into()));
            return MutationOutcome::Invalid;
        }
        let Some(_guard) = self.in_flight.try_begin(&offer_id) else {
            return MutationOutcome::Skipped;
        };

        let original = self.with_view_mut(|view| {
            view.price_prompt = None;
            let generation = view.generation;
            let favorite = view.favorite_mut(&offer_id)?;
            let original = favorite.clone();
            favorite.is_notify_set = true;
            Some((original, generation))
        });
        let Some((original, generation)) = original else {
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
            Err(e) => self.roll_back(original, generation, e.into()),
        }
    }

    pub fn dismiss_price_prompt(&self) {
        self.with_view_mut(|view| view.price_prompt = None);
    }

    pub fn clear_error(&self) {
        self.with_view_mut(|view| view.error = None);
    }

    pub async fn on_session_changed(&self, logged_in: bool) {
        if logged_in {
            self.load().await;
        } else {
            self.with_view_mut(|view| {
                view.clear();
                view.error = None;
            });
        }
    }

    fn roll_back(&self, original: LikedOffer, generation: u64, error: UiError) -> MutationOutcome {
        warn!(offer_id = %original.offer_id, error = %error, "Rolling back favorite");
        self.with_view_mut(|view| {
            view.restore(original, generation);
            view.error = Some(error);
        });
        MutationOutcome::RolledBack
    }

    fn not_found(&self, offer_id: &str) -> MutationOutcome {
        self.with_view_mut(|view| {
            view.error = Some(CoreError::FavoriteNotFound(offer_id.to_string()).into())
        });
        MutationOutcome::Invalid
    }
}
