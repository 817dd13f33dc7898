//! # Error Types
//!
//! Domain-specific error types for findly-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  findly-core errors (this file)                                        │
//! │  ├── CoreError        - Domain errors (missing offer, no prompt, ...)  │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  findly-client errors (separate crate)                                 │
//! │  └── ClientError      - HTTP / session / config failures               │
//! │                                                                         │
//! │  App errors                                                            │
//! │  └── UiError          - What a screen shows (code + message)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError / ClientError → UiError → screen    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain errors raised by the state holders before any network call.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The offer is not part of the currently displayed offer list.
    #[error("Offer not found: {0}")]
    OfferNotFound(String),

    /// The offer is not part of the favorites list.
    #[error("Favorite not found: {0}")]
    FavoriteNotFound(String),

    /// A price was confirmed while no price prompt was open.
    #[error("No offer selected for a price alert")]
    NoPendingPriceAlert,

    /// The operation needs an authenticated session.
    #[error("Sign in to use favorites and price alerts")]
    AuthRequired,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., unparsable price, id with a slash).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
