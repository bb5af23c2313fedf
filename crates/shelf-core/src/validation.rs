//! # Validation Module
//!
//! Input checks run before any dispatch or network call.
//!
//! ## Usage
//! ```rust
//! use shelf_core::validation::{validate_book_id, validate_comment, validate_quantity};
//!
//! assert!(validate_book_id("64f0c2a1e4b0").is_ok());
//! assert_eq!(validate_comment("  nice copy ").unwrap(), "nice copy");
//! assert!(validate_quantity(0).is_ok()); // 0 means "remove"
//! ```

use crate::error::ValidationError;
use crate::{MAX_COMMENT_LEN, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a book identifier.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - Letters, digits, hyphens and underscores only
pub fn validate_book_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "book id".to_string(),
        });
    }

    if id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "book id".to_string(),
            max: 64,
        });
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "book id".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a comment body and returns it trimmed.
pub fn validate_comment(text: &str) -> ValidationResult<String> {
    let text = text.trim();

    if text.is_empty() {
        return Err(ValidationError::Required {
            field: "comment".to_string(),
        });
    }

    if text.chars().count() > MAX_COMMENT_LEN {
        return Err(ValidationError::TooLong {
            field: "comment".to_string(),
            max: MAX_COMMENT_LEN,
        });
    }

    Ok(text.to_string())
}

/// Validates a purchase quantity set by the user. Zero is allowed and means
/// the line is removed.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if !(0..=MAX_ITEM_QUANTITY).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}
