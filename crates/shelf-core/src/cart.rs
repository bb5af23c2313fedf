//! # Cart Lines and the Add-to-Cart Merge
//!
//! ## Add-to-Cart Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     plan_add_to_cart(cart, book)                        │
//! │                                                                         │
//! │   find line by book id                                                  │
//! │        │                                                                │
//! │        ├── found (qty q) ──► Incremented(line with q + 1)               │
//! │        │                       action: UpdateCartQuantity { id, q+1 }   │
//! │        │                                                                │
//! │        └── not found ──────► Inserted(line with qty 1)                  │
//! │                                action: AddToCart(line)                  │
//! │                                                                         │
//! │   Either way the returned line is the full record that gets mirrored    │
//! │   into the offline `cart` store.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Planning is separate from applying: the caller dispatches
//! [`CartChange::action`] and persists [`CartChange::line`], so the reducer
//! stays the only thing that mutates state.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::state::Action;
use crate::types::{resolve_image, Book};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One book's entry in the cart.
///
/// The serialized form is also the offline `cart` record, keyed by `_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    #[serde(rename = "_id")]
    pub id: String,

    pub name: String,

    pub price: Money,

    /// Copies the seller has available.
    pub quantity: i64,

    /// Always a displayable image (placeholder already applied).
    pub image: String,

    /// How many copies the buyer wants; at least 1.
    pub purchase_quantity: i64,
}

impl CartLine {
    /// Builds a fresh line with purchase quantity 1.
    ///
    /// Missing or non-positive available quantity defaults to 1.
    pub fn from_book(book: &Book) -> Self {
        CartLine {
            id: book.id.clone(),
            name: book.name.clone(),
            price: book.price,
            quantity: book.quantity.filter(|q| *q > 0).unwrap_or(1),
            image: book.display_image().to_string(),
            purchase_quantity: 1,
        }
    }

    /// Copy of this line with a different purchase quantity.
    pub fn with_purchase_quantity(&self, purchase_quantity: i64) -> Self {
        CartLine {
            purchase_quantity,
            ..self.clone()
        }
    }

    /// Lines restored from older offline records may lack an image.
    pub fn normalized(mut self) -> Self {
        self.image = resolve_image(Some(self.image.as_str())).to_string();
        if self.purchase_quantity < 1 {
            self.purchase_quantity = 1;
        }
        self
    }

    pub fn line_total(&self) -> Money {
        self.price.multiply_quantity(self.purchase_quantity)
    }
}

// =============================================================================
// Add-to-Cart Planning
// =============================================================================

/// What adding a book to the cart will do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartChange {
    /// The book was not in the cart; this is its new line.
    Inserted(CartLine),
    /// The book was in the cart; this is the line after the increment.
    Incremented(CartLine),
}

impl CartChange {
    /// The record to mirror into the offline store.
    pub fn line(&self) -> &CartLine {
        match self {
            CartChange::Inserted(line) | CartChange::Incremented(line) => line,
        }
    }

    /// The action to dispatch.
    pub fn action(&self) -> Action {
        match self {
            CartChange::Inserted(line) => Action::AddToCart(line.clone()),
            CartChange::Incremented(line) => Action::UpdateCartQuantity {
                id: line.id.clone(),
                purchase_quantity: line.purchase_quantity,
            },
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, CartChange::Inserted(_))
    }
}

/// Decides how adding one copy of `book` changes `cart`.
///
/// ## Errors
/// - [`CoreError::OutOfStock`] when the server reports exactly zero copies
/// - [`CoreError::QuantityTooLarge`] past [`MAX_ITEM_QUANTITY`]
/// - [`CoreError::CartTooLarge`] when a new line would exceed [`MAX_CART_ITEMS`]
pub fn plan_add_to_cart(cart: &[CartLine], book: &Book) -> CoreResult<CartChange> {
    if book.quantity == Some(0) {
        return Err(CoreError::OutOfStock {
            book_id: book.id.clone(),
        });
    }

    if let Some(existing) = find_line(cart, &book.id) {
        let next = existing.purchase_quantity + 1;
        if next > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: next,
                max: MAX_ITEM_QUANTITY,
            });
        }
        return Ok(CartChange::Incremented(existing.with_purchase_quantity(next)));
    }

    if cart.len() >= MAX_CART_ITEMS {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        });
    }

    Ok(CartChange::Inserted(CartLine::from_book(book)))
}

pub fn find_line<'a>(cart: &'a [CartLine], id: &str) -> Option<&'a CartLine> {
    cart.iter().find(|line| line.id == id)
}

// =============================================================================
// Totals
// =============================================================================

/// Cart summary for the cart drawer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub subtotal: Money,
}

impl From<&[CartLine]> for CartTotals {
    fn from(cart: &[CartLine]) -> Self {
        CartTotals {
            line_count: cart.len(),
            total_quantity: cart.iter().map(|l| l.purchase_quantity).sum(),
            subtotal: cart.iter().map(CartLine::line_total).sum(),
        }
    }
}
