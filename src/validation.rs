//! Input validation for listkeep
//!
//! Runs before any optimistic mutation begins, so a rejected input never
//! touches store state.

use thiserror::Error;

/// Validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Text cannot be empty")]
    Empty,

    #[error("Text is too long ({0} characters, max {1})")]
    TooLong(usize, usize),

    #[error("Invalid tag '{0}': {1}")]
    InvalidTag(String, &'static str),

    #[error("Invalid name '{0}': {1}")]
    InvalidName(String, &'static str),

    #[error("Invalid currency code '{0}'")]
    InvalidCurrency(String),

    #[error("Quantity must be greater than zero, got {0}")]
    InvalidQuantity(String),

    #[error("Price {0} is out of range")]
    PriceOutOfRange(String),

    #[error("Cannot reorder: {0}")]
    InvalidOrder(&'static str),
}

/// Maximum length for captured text
pub const MAX_INPUT_LENGTH: usize = 2000;

/// Maximum length for tag names
pub const MAX_TAG_LENGTH: usize = 50;

/// Maximum length for list, category and item names
pub const MAX_NAME_LENGTH: usize = 120;

/// Validate the text of an inbox input or list entry
pub fn validate_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    let len = text.chars().count();
    if len > MAX_INPUT_LENGTH {
        return Err(ValidationError::TooLong(len, MAX_INPUT_LENGTH));
    }

    Ok(())
}

/// Validate a list, category or item name
///
/// Rules:
/// - Must not be blank
/// - At most 120 characters
/// - No control characters
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::InvalidName(
            name.to_string(),
            "exceeds maximum length",
        ));
    }

    if name.chars().any(char::is_control) {
        return Err(ValidationError::InvalidName(
            name.to_string(),
            "contains control characters",
        ));
    }

    Ok(())
}

/// Validate and normalize a tag name (lowercase, no leading `#`)
pub fn normalize_tag(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim().trim_start_matches('#').to_lowercase();

    if name.is_empty() {
        return Err(ValidationError::InvalidTag(raw.to_string(), "cannot be empty"));
    }

    if name.chars().count() > MAX_TAG_LENGTH {
        return Err(ValidationError::InvalidTag(
            raw.to_string(),
            "exceeds maximum length",
        ));
    }

    if !name.chars().all(is_tag_char) {
        return Err(ValidationError::InvalidTag(
            raw.to_string(),
            "contains invalid characters (only letters, numbers, underscore, and hyphen allowed)",
        ));
    }

    Ok(name)
}

pub(crate) fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// Validate an ISO 4217 currency code (`BRL`, `USD`)
pub fn validate_currency(code: &str) -> Result<(), ValidationError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidCurrency(code.to_string()))
    }
}

/// Validate a quantity typed by the user
pub fn validate_quantity(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidQuantity(value.to_string()))
    }
}

/// Convert a typed price to minor units, refusing amounts that do not fit
pub fn validate_price(amount: f64) -> Result<i64, ValidationError> {
    crate::store::pricing::to_minor(amount)
        .filter(|minor| *minor >= 0)
        .ok_or_else(|| ValidationError::PriceOutOfRange(amount.to_string()))
}
