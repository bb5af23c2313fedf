//! # shelf-core: Pure Domain Logic for Shelf
//!
//! Everything the marketplace client decides without touching the network or
//! the disk lives here: the book model, cart merging, the action reducer that
//! owns every state transition, and the view models the front ends render.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Shelf Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Front end (CLI / web shell)                     │   │
//! │  │        Catalog ──► Detail ──► Add to cart ──► Comment           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │         shelf-client (GraphQL, container, write queue)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shelf-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   cart    │  │   state   │  │  catalog  │  │   │
//! │  │   │   Book    │  │ CartLine  │  │  Action   │  │  detail   │  │   │
//! │  │   │  Comment  │  │  merge    │  │  reduce   │  │  (views)  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO TASKS • PURE FUNCTIONS               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Books, categories, users and comments
//! - [`money`] - Integer-cent prices
//! - [`cart`] - Cart lines and the add-to-cart merge
//! - [`state`] - `ClientState`, the closed `Action` set and the reducer
//! - [`catalog`] - Catalog view model and the dispatch guard
//! - [`detail`] - Detail page view model and comment drafts
//! - [`validation`] - Input checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use shelf_core::cart::plan_add_to_cart;
//! use shelf_core::state::{reduce, ClientState};
//! use shelf_core::{Book, Money};
//!
//! let book = Book::new("b1", "Dune", Money::from_cents(1250));
//! let mut state = ClientState::default();
//!
//! let change = plan_add_to_cart(&state.cart, &book).unwrap();
//! reduce(&mut state, change.action());
//!
//! assert_eq!(state.cart[0].purchase_quantity, 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod detail;
pub mod error;
pub mod money;
pub mod state;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{CartChange, CartLine, CartTotals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use state::{Action, ClientState};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Image shown whenever a book or cart line has no image of its own.
pub const PLACEHOLDER_IMAGE: &str = "no-image.jpg";

/// Display name for a missing user.
pub const ANONYMOUS: &str = "Anonymous";

/// Display name for a missing category.
pub const UNKNOWN: &str = "Unknown";

/// Maximum distinct lines allowed in the cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum purchase quantity of a single cart line.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum length of a comment body, in characters.
pub const MAX_COMMENT_LEN: usize = 280;
