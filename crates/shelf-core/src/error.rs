//! # Error Types
//!
//! Domain-specific error types for shelf-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shelf-core errors (this file)                                         │
//! │  ├── CoreError        - Cart and catalog rule violations               │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  shelf-db errors                                                       │
//! │  └── DbError          - Offline store failures                         │
//! │                                                                         │
//! │  shelf-client errors                                                   │
//! │  └── ClientError      - Network, GraphQL, config, auth                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → front end           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by cart and state operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A cart operation referenced a book that has no cart line.
    #[error("Book not in cart: {0}")]
    BookNotInCart(String),

    /// The server reports zero copies of this book.
    ///
    /// ## When This Occurs
    /// ```text
    /// getBookById → { _id: "b7", quantity: 0 }
    ///      │
    ///      ▼
    /// plan_add_to_cart → OutOfStock { book_id: "b7" }
    /// ```
    /// A missing quantity is not out of stock; it defaults to 1.
    #[error("Book {book_id} is out of stock")]
    OutOfStock { book_id: String },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before any state change or network call.
#[derive(Debug, Error)]
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

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
