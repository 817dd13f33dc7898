//! # UI Error Type
//!
//! What a screen shows when something fails.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Findly                                 │
//! │                                                                         │
//! │  State holder call                                                      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Transport failure? ─── ClientError::ConnectionFailed ──┐              │
//! │         │                                               │              │
//! │         ▼                                               ▼              │
//! │  401? ──────────────── ClientError::Unauthorized ──── UiError ───────► │
//! │         │                                               ▲   view.error │
//! │         ▼                                               │              │
//! │  Local check failed? ── CoreError / ValidationError ────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Raw transport and decoding details are logged, never shown.

use serde::Serialize;

use findly_client::ClientError;
use findly_core::{CoreError, ValidationError};

/// Error surfaced on a view.
///
/// ## Serialization
/// ```json
/// {
///   "code": "REJECTED",
///   "message": "Wrong login or password"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Server unreachable or timed out
    Network,

    /// Server answered 401; the session is gone
    Unauthorized,

    /// Input rejected locally
    Validation,

    /// Server answered with another non-2xx status
    Rejected,

    /// Action needs a signed-in user
    AuthRequired,

    /// Anything else
    Internal,
}

impl UiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        UiError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        UiError::new(ErrorCode::Validation, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        UiError::new(ErrorCode::Internal, message)
    }

    pub fn auth_required() -> Self {
        UiError::from(CoreError::AuthRequired)
    }
}

impl From<ClientError> for UiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::ConnectionFailed(e) => {
                tracing::warn!("API unreachable: {}", e);
                UiError::new(ErrorCode::Network, "Could not reach the server")
            }
            ClientError::Timeout => UiError::new(ErrorCode::Network, "The server took too long to answer"),
            ClientError::Unauthorized => {
                UiError::new(ErrorCode::Unauthorized, "Session expired, please sign in again")
            }
            ClientError::Rejected { status, message } => {
                let message = if message.is_empty() {
                    format!("Request failed ({})", status)
                } else {
                    message
                };
                UiError::new(ErrorCode::Rejected, message)
            }
            ClientError::DeserializationFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Unexpected API response: {}", e);
                UiError::internal("Unexpected server response")
            }
            ClientError::TokenStore(e) => {
                tracing::error!("Token store failed: {}", e);
                UiError::internal("Could not save your sign-in")
            }
            ClientError::Validation(e) => UiError::validation(e.to_string()),
            err @ (ClientError::InvalidConfig(_)
            | ClientError::InvalidUrl(_)
            | ClientError::ConfigLoadFailed(_)
            | ClientError::ConfigSaveFailed(_)) => {
                tracing::error!("Client misconfigured: {}", err);
                UiError::internal(err.to_string())
            }
        }
    }
}

impl From<CoreError> for UiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AuthRequired => UiError::new(ErrorCode::AuthRequired, err.to_string()),
            CoreError::Validation(e) => UiError::validation(e.to_string()),
            CoreError::OfferNotFound(_)
            | CoreError::FavoriteNotFound(_)
            | CoreError::NoPendingPriceAlert => UiError::internal(err.to_string()),
        }
    }
}

impl From<ValidationError> for UiError {
    fn from(err: ValidationError) -> Self {
        UiError::validation(err.to_string())
    }
}

impl std::fmt::Display for UiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for UiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_codes() {
        let err = UiError::from(ClientError::ConnectionFailed("tcp reset by 10.0.2.2".into()));
        assert_eq!(err.code, ErrorCode::Network);
        assert!(!err.message.contains("10.0.2.2"));

        let err = UiError::from(ClientError::Rejected {
            status: 409,
            message: "Login already taken".into(),
        });
        assert_eq!(err.code, ErrorCode::Rejected);
        assert_eq!(err.message, "Login already taken");

        let err = UiError::from(ClientError::Rejected {
            status: 502,
            message: String::new(),
        });
        assert_eq!(err.message, "Request failed (502)");

        assert_eq!(UiError::from(ClientError::Unauthorized).code, ErrorCode::Unauthorized);
    }

    #[test]
    fn test_core_errors_map_to_codes() {
        assert_eq!(UiError::auth_required().code, ErrorCode::AuthRequired);

        let err = UiError::from(ValidationError::MustBePositive {
            field: "price".into(),
        });
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(err.message, "price must be positive");
    }

    #[test]
    fn test_serializes_screaming_code() {
        let json = serde_json::to_value(UiError::auth_required()).unwrap();
        assert_eq!(json["code"], "AUTH_REQUIRED");
    }
}
