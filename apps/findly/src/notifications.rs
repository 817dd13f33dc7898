//! # Push Notifications
//!
//! Device token supply and routing of inbound pushes.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Push Flow                                            │
//! │                                                                         │
//! │  Push service ──► PushPayload (JSON) ──► PushMessage ──► Router        │
//! │                                                            │            │
//! │                         ┌──────────────────────────────────┤            │
//! │                         ▼                                  ▼            │
//! │             session? ── yes ──► FavoritesState::load   no: ignore      │
//! │                                                                         │
//! │  Push service ──► on_new_token(token) ──► SharedDeviceToken            │
//! │                                      └──► sent with login/register     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Delivery itself is outside this crate.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use findly_client::Session;

use crate::state::FavoritesState;

/// Data key carrying the push type.
const TYPE_KEY: &str = "type";

// =============================================================================
// Device Token
// =============================================================================

/// Supplies this device's push token. Empty when none is known yet.
pub trait DeviceTokenProvider: Send + Sync {
    fn current_token(&self) -> String;
}

/// Device token updated by the push service.
#[derive(Debug, Clone, Default)]
pub struct SharedDeviceToken {
    token: Arc<RwLock<String>>,
}

impl SharedDeviceToken {
    pub fn new(token: impl Into<String>) -> Self {
        SharedDeviceToken {
            token: Arc::new(RwLock::new(token.into())),
        }
    }

    /// Replaces the token after the push service rotated it.
    pub fn on_new_token(&self, token: impl Into<String>) {
        let token = token.into();
        debug!(empty = token.is_empty(), "Device token updated");
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = token;
    }
}

impl DeviceTokenProvider for SharedDeviceToken {
    fn current_token(&self) -> String {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

// =============================================================================
// Messages
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushKind {
    ReloadFavorites,
    PriceAlert,
    Unknown(String),
}

impl PushKind {
    fn from_type(value: Option<&str>) -> Self {
        match value {
            Some("reload_favorites") => PushKind::ReloadFavorites,
            Some("price_alert") => PushKind::PriceAlert,
            Some(other) => PushKind::Unknown(other.to_string()),
            None => PushKind::Unknown(String::new()),
        }
    }
}

/// An inbound push, already decoded.
#[derive(Debug, Clone)]
pub struct PushMessage {
    pub kind: PushKind,
    pub data: HashMap<String, String>,
    pub title: Option<String>,
    pub body: Option<String>,
}

impl PushMessage {
    pub fn from_data(data: HashMap<String, String>) -> Self {
        PushMessage {
            kind: PushKind::from_type(data.get(TYPE_KEY).map(String::as_str)),
            data,
            title: None,
            body: None,
        }
    }
}

/// Wire shape of a push.
///
/// ```json
/// {
///   "data": { "type": "price_alert", "offerId": "o1" },
///   "notification": { "title": "Price dropped", "body": "Kobzar is now 199.99" }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushPayload {
    #[serde(default)]
    pub data: HashMap<String, String>,
    #[serde(default)]
    pub notification: Option<PushNotification>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushNotification {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl From<PushPayload> for PushMessage {
    fn from(payload: PushPayload) -> Self {
        let notification = payload.notification.unwrap_or_default();
        PushMessage {
            title: notification.title,
            body: notification.body,
            ..PushMessage::from_data(payload.data)
        }
    }
}

// =============================================================================
// Router
// =============================================================================

/// What the router did with a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushAction {
    ReloadedFavorites,
    IgnoredLoggedOut,
    IgnoredUnknown,
}

#[derive(Clone)]
pub struct NotificationRouter {
    favorites: FavoritesState,
    session: Session,
}

impl NotificationRouter {
    pub fn new(favorites: FavoritesState, session: Session) -> Self {
        NotificationRouter { favorites, session }
    }

    pub async fn handle(&self, message: PushMessage) -> PushAction {
        if let PushKind::Unknown(kind) = &message.kind {
            warn!(kind = %kind, "Ignoring push of unknown type");
            return PushAction::IgnoredUnknown;
        }
        if !self.session.is_authenticated() {
            debug!(kind = ?message.kind, "Ignoring push while logged out");
            return PushAction::IgnoredLoggedOut;
        }

        info!(kind = ?message.kind, title = ?message.title, "Push received, reloading favorites");
        self.favorites.load().await;
        PushAction::ReloadedFavorites
    }
}
