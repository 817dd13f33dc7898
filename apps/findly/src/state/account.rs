//! # Account State
//!
//! ```text
//!   ┌───────┐ navigate_to_register ┌──────────┐
//!   │ LOGIN │ ───────────────────► │ REGISTER │
//!   │       │ ◄─────────────────── │          │
//!   └───┬───┘  navigate_to_login   └────┬─────┘
//!       │ session: logged in            │ session: logged in
//!       ▼                               ▼
//!   ┌─────────────────────────────────────────┐
//!   │                 PROFILE                 │
//!   │  change_password, logout                │
//!   └─────────────────────────────────────────┘
//!       │ session: logged out
//!       ▼
//!     LOGIN (REGISTER stays put)
//! ```
//!
//! Screens follow the session; `login`/`register` only store the token.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, info, warn};

use findly_client::{FindlyApi, Session};
use findly_core::validation::{validate_login, validate_password};
use findly_core::{AuthToken, ChangePasswordRequest, Credentials};

use super::lock;
use crate::error::UiError;
use crate::notifications::DeviceTokenProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountScreen {
    Login,
    Register,
    Profile,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub screen: AccountScreen,
    /// Login shown on the profile; fallback name when unknown.
    pub login_name: String,
    pub is_loading: bool,
    /// Last informational message from the server (e.g. password changed).
    pub message: Option<String>,
    pub error: Option<UiError>,
}

#[derive(Clone)]
pub struct AccountState {
    view: Arc<Mutex<AccountView>>,
    api: Arc<dyn FindlyApi>,
    session: Session,
    device_tokens: Arc<dyn DeviceTokenProvider>,
}

enum AuthMode {
    Login,
    Register,
}

impl AccountState {
    pub fn new(
        api: Arc<dyn FindlyApi>,
        session: Session,
        device_tokens: Arc<dyn DeviceTokenProvider>,
    ) -> Self {
        let screen = if session.is_authenticated() {
            AccountScreen::Profile
        } else {
            AccountScreen::Login
        };
        let view = AccountView {
            screen,
            login_name: session.login_name(),
            is_loading: false,
            message: None,
            error: None,
        };
        AccountState {
            view: Arc::new(Mutex::new(view)),
            api,
            session,
            device_tokens,
        }
    }

    pub fn with_view<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AccountView) -> R,
    {
        f(&lock(&self.view))
    }

    pub fn snapshot(&self) -> AccountView {
        self.with_view(|view| view.clone())
    }

    fn with_view_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut AccountView) -> R,
    {
        f(&mut lock(&self.view))
    }

    pub async fn login(&self, login: &str, password: &str) -> Result<(), UiError> {
        self.authenticate(AuthMode::Login, login, password).await
    }

    pub async fn register(&self, login: &str, password: &str) -> Result<(), UiError> {
        self.authenticate(AuthMode::Register, login, password).await
    }

    /// Reports the server's message on the view; the screen does not change.
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), UiError> {
        let checked = validate_password("old password", old_password)
            .and_then(|_| validate_password("new password", new_password));
        if let Err(e) = checked {
            return Err(self.record_error(e.into()));
        }

        self.begin();
        let request = ChangePasswordRequest {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        };
        match self.api.change_password(&request).await {
            Ok(response) => {
                info!("Password changed");
                self.with_view_mut(|view| {
                    view.is_loading = false;
                    view.message = Some(response.message);
                });
                Ok(())
            }
            Err(e) => Err(self.record_error(e.into())),
        }
    }

    /// Drops the session; the screen follows through the session watcher.
    pub fn logout(&self) {
        info!("Logging out");
        self.session.logout();
    }

    pub fn navigate_to_register(&self) {
        self.navigate(AccountScreen::Register);
    }

    pub fn navigate_to_login(&self) {
        self.navigate(AccountScreen::Login);
    }

    pub fn refresh_user_data(&self) {
        let login_name = self.session.login_name();
        self.with_view_mut(|view| view.login_name = login_name);
    }

    pub fn clear_error(&self) {
        self.with_view_mut(|view| view.error = None);
    }

    pub fn on_session_changed(&self, logged_in: bool) {
        let login_name = self.session.login_name();
        self.with_view_mut(|view| {
            view.login_name = login_name;
            if logged_in {
                view.screen = AccountScreen::Profile;
            } else {
                view.message = None;
                if view.screen != AccountScreen::Register {
                    view.screen = AccountScreen::Login;
                }
            }
        });
    }

    async fn authenticate(
        &self,
        mode: AuthMode,
        login: &str,
        password: &str,
    ) -> Result<(), UiError> {
        let login = match validate_login(login) {
            Ok(login) => login,
            Err(e) => return Err(self.record_error(e.into())),
        };
        if let Err(e) = validate_password("password", password) {
            return Err(self.record_error(e.into()));
        }

        self.begin();
        let credentials = Credentials {
            login,
            password: password.to_string(),
            device_token: self.device_tokens.current_token(),
        };

        let result = match mode {
            AuthMode::Login => self.api.login(&credentials).await,
            AuthMode::Register => self.api.register(&credentials).await,
        };
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(login = %credentials.login, error = %e, "Authentication failed");
                return Err(self.record_error(e.into()));
            }
        };

        if let Err(e) = self.session.login(AuthToken::from(response)) {
            return Err(self.record_error(e.into()));
        }
        info!(login = %credentials.login, "Signed in");
        self.with_view_mut(|view| view.is_loading = false);
        // PROFILE on return, without waiting for the session watcher
        self.on_session_changed(true);
        Ok(())
    }

    fn navigate(&self, screen: AccountScreen) {
        debug!(?screen, "Account navigation");
        self.with_view_mut(|view| {
            view.screen = screen;
            view.error = None;
            view.message = None;
        });
    }

    fn begin(&self) {
        self.with_view_mut(|view| {
            view.is_loading = true;
            view.error = None;
            view.message = None;
        });
    }

    fn record_error(&self, error: UiError) -> UiError {
        self.with_view_mut(|view| {
            view.is_loading = false;
            view.error = Some(error.clone());
        });
        error
    }
}
