//! # Validation Module
//!
//! Input validation for the forms and ids that reach the REST API.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI shell                                                      │
//! │  └── Field-level hints while typing                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: State holders (Rust)                                         │
//! │  └── THIS MODULE: reject before spending a request                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Catalog/Users API                                            │
//! │  └── Authoritative rules (password policy, unique logins, ...)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_PAGE_SIZE, MAX_SEARCH_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_LOGIN_LEN: usize = 64;
const MAX_PASSWORD_LEN: usize = 128;

// =============================================================================
// Account Validators
// =============================================================================

/// Validates a login name and returns it trimmed.
///
/// ```rust
/// use findly_core::validation::validate_login;
///
/// assert_eq!(validate_login("  reader ").unwrap(), "reader");
/// assert!(validate_login("   ").is_err());
/// ```
pub fn validate_login(login: &str) -> ValidationResult<String> {
    let login = login.trim();

    if login.is_empty() {
        return Err(ValidationError::Required {
            field: "login".to_string(),
        });
    }

    if login.chars().count() > MAX_LOGIN_LEN {
        return Err(ValidationError::TooLong {
            field: "login".to_string(),
            max: MAX_LOGIN_LEN,
        });
    }

    Ok(login.to_string())
}

/// Validates a password. Passwords are never trimmed; policy lives server-side.
pub fn validate_password(field: &str, password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if password.chars().count() > MAX_PASSWORD_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_PASSWORD_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Catalog Validators
// =============================================================================

/// Normalizes a title/author filter.
///
/// Blank input means "no filter" and yields `None`.
///
/// ```rust
/// use findly_core::validation::normalize_search_text;
///
/// assert_eq!(normalize_search_text("field", " Kobzar ").unwrap(), Some("Kobzar".to_string()));
/// assert_eq!(normalize_search_text("field", "   ").unwrap(), None);
/// ```
pub fn normalize_search_text(field: &str, text: &str) -> ValidationResult<Option<String>> {
    let text = text.trim();

    if text.is_empty() {
        return Ok(None);
    }

    if text.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    Ok(Some(text.to_string()))
}

/// Validates a catalog page size.
pub fn validate_page_size(page_size: u32) -> ValidationResult<()> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "page_size".to_string(),
            min: 1,
            max: MAX_PAGE_SIZE as i64,
        });
    }

    Ok(())
}

/// Validates a server-issued id before it is interpolated into a URL path.
///
/// Ids are opaque (GUIDs in practice), but they must be non-empty and must not
/// be able to change the path they are placed in.
pub fn validate_resource_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id
        .chars()
        .any(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace())
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must not contain path or query characters".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Price Alert Validators
// =============================================================================

/// Validates a price-alert threshold.
pub fn validate_alert_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Parses the text typed into the price prompt.
///
/// ```rust
/// use findly_core::money::Money;
/// use findly_core::validation::parse_price_input;
///
/// assert_eq!(parse_price_input("199,99").unwrap(), Money::from_minor(19999));
/// assert!(parse_price_input("0").is_err());
/// assert!(parse_price_input("cheap").is_err());
/// ```
pub fn parse_price_input(input: &str) -> ValidationResult<Money> {
    if input.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "price".to_string(),
        });
    }

    let price = Money::parse_decimal(input).ok_or_else(|| ValidationError::InvalidFormat {
        field: "price".to_string(),
        reason: "expected a number with at most two decimals".to_string(),
    })?;

    validate_alert_price(price)?;
    Ok(price)
}
