//! # Client State and Reducer
//!
//! `ClientState` is the one shared mutable structure of a session. It only
//! changes through [`reduce`], driven by the closed [`Action`] set.
//!
//! ## Action Vocabulary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Action                          Effect on ClientState                  │
//! │  ──────                          ─────────────────────                  │
//! │  UpdateBooks(books)              products = books                       │
//! │  UpdateCategories(cats)          categories = cats                      │
//! │  UpdateCurrentCategory(id)       current_category = id                  │
//! │  AddToCart(line)                 insert, or merge into existing line    │
//! │  AddMultipleToCart(lines)        AddToCart for each line                │
//! │  UpdateCartQuantity{id, q}       q == 0 → remove, else set              │
//! │  RemoveFromCart(id)              drop the line                          │
//! │  ClearCart                       cart = [], cart_open = false           │
//! │  ToggleCart                      cart_open = !cart_open                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The reducer enforces cart identity on its own: an insert for a book that
//! already has a line merges quantities instead of duplicating the line.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::CartLine;
use crate::types::{Book, Category};
use crate::MAX_ITEM_QUANTITY;

/// The whole client-side state of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ClientState {
    /// Selected category id; empty means "all".
    pub current_category: String,

    /// Cart lines, unique by book id, in insertion order.
    pub cart: Vec<CartLine>,

    pub cart_open: bool,

    /// Last fetched catalog.
    pub products: Vec<Book>,

    pub categories: Vec<Category>,
}

/// Every sanctioned mutation of [`ClientState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    UpdateBooks(Vec<Book>),
    UpdateCategories(Vec<Category>),
    UpdateCurrentCategory(String),
    AddToCart(CartLine),
    AddMultipleToCart(Vec<CartLine>),
    UpdateCartQuantity { id: String, purchase_quantity: i64 },
    RemoveFromCart(String),
    ClearCart,
    ToggleCart,
}

impl Action {
    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::UpdateBooks(_) => "UPDATE_BOOKS",
            Action::UpdateCategories(_) => "UPDATE_CATEGORIES",
            Action::UpdateCurrentCategory(_) => "UPDATE_CURRENT_CATEGORY",
            Action::AddToCart(_) => "ADD_TO_CART",
            Action::AddMultipleToCart(_) => "ADD_MULTIPLE_TO_CART",
            Action::UpdateCartQuantity { .. } => "UPDATE_CART_QUANTITY",
            Action::RemoveFromCart(_) => "REMOVE_FROM_CART",
            Action::ClearCart => "CLEAR_CART",
            Action::ToggleCart => "TOGGLE_CART",
        }
    }
}

/// Applies `action` to `state`.
///
/// Returns `true` when the state actually changed. Actions naming a book
/// that is not in the cart are no-ops.
pub fn reduce(state: &mut ClientState, action: Action) -> bool {
    match action {
        Action::UpdateBooks(books) => replace(&mut state.products, books),
        Action::UpdateCategories(categories) => replace(&mut state.categories, categories),
        Action::UpdateCurrentCategory(id) => replace(&mut state.current_category, id),
        Action::AddToCart(line) => merge_line(&mut state.cart, line),
        Action::AddMultipleToCart(lines) => lines
            .into_iter()
            .fold(false, |changed, line| merge_line(&mut state.cart, line) || changed),
        Action::UpdateCartQuantity {
            id,
            purchase_quantity,
        } => {
            if purchase_quantity <= 0 {
                return remove_line(&mut state.cart, &id);
            }
            let purchase_quantity = purchase_quantity.min(MAX_ITEM_QUANTITY);
            match state.cart.iter_mut().find(|l| l.id == id) {
                Some(line) if line.purchase_quantity != purchase_quantity => {
                    line.purchase_quantity = purchase_quantity;
                    true
                }
                _ => false,
            }
        }
        Action::RemoveFromCart(id) => remove_line(&mut state.cart, &id),
        Action::ClearCart => {
            let changed = !state.cart.is_empty() || state.cart_open;
            state.cart.clear();
            state.cart_open = false;
            changed
        }
        Action::ToggleCart => {
            state.cart_open = !state.cart_open;
            true
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn merge_line(cart: &mut Vec<CartLine>, line: CartLine) -> bool {
    let line = line.normalized();
    match cart.iter_mut().find(|l| l.id == line.id) {
        Some(existing) => {
            let merged =
                (existing.purchase_quantity + line.purchase_quantity).min(MAX_ITEM_QUANTITY);
            let changed = existing.purchase_quantity != merged;
            existing.purchase_quantity = merged;
            changed
        }
        None => {
            cart.push(line);
            true
        }
    }
}

fn remove_line(cart: &mut Vec<CartLine>, id: &str) -> bool {
    let before = cart.len();
    cart.retain(|l| l.id != id);
    cart.len() != before
}

// =============================================================================
// Selectors
// =============================================================================

/// Cached products in `current_category`; all products when it is empty.
pub fn books_in_category(state: &ClientState) -> Vec<Book> {
    if state.current_category.is_empty() {
        return state.products.clone();
    }
    state
        .products
        .iter()
        .filter(|b| b.category_id() == Some(state.current_category.as_str()))
        .cloned()
        .collect()
}

pub fn cart_line<'a>(state: &'a ClientState, id: &str) -> Option<&'a CartLine> {
    crate::cart::find_line(&state.cart, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::Category;

    fn line(id: &str, qty: i64) -> CartLine {
        CartLine::from_book(&Book::new(id, id, Money::from_cents(500))).with_purchase_quantity(qty)
    }

    #[test]
    fn test_add_to_cart_merges_duplicates() {
        let mut state = ClientState::default();
        assert!(reduce(&mut state, Action::AddToCart(line("b1", 1))));
        assert!(reduce(&mut state, Action::AddToCart(line("b1", 2))));

        assert_eq!(state.cart.len(), 1);
        assert_eq!(state.cart[0].purchase_quantity, 3);
    }

    #[test]
    fn test_update_quantity_sets_and_removes() {
        let mut state = ClientState::default();
        reduce(&mut state, Action::AddToCart(line("b1", 2)));

        assert!(reduce(
            &mut state,
            Action::UpdateCartQuantity {
                id: "b1".into(),
                purchase_quantity: 3
            }
        ));
        assert_eq!(state.cart[0].purchase_quantity, 3);

        assert!(reduce(
            &mut state,
            Action::UpdateCartQuantity {
                id: "b1".into(),
                purchase_quantity: 0
            }
        ));
        assert!(state.cart.is_empty());
    }

    #[test]
    fn test_update_quantity_for_unknown_book_is_noop() {
        let mut state = ClientState::default();
        let changed = reduce(
            &mut state,
            Action::UpdateCartQuantity {
                id: "ghost".into(),
                purchase_quantity: 4,
            },
        );
        assert!(!changed);
        assert!(state.cart.is_empty());
    }

    #[test]
    fn test_update_books_reports_unchanged_payload() {
        let mut state = ClientState::default();
        let books = vec![Book::new("b1", "Dune", Money::from_cents(900))];

        assert!(reduce(&mut state, Action::UpdateBooks(books.clone())));
        assert!(!reduce(&mut state, Action::UpdateBooks(books)));
    }

    #[test]
    fn test_toggle_and_clear() {
        let mut state = ClientState::default();
        reduce(&mut state, Action::ToggleCart);
        assert!(state.cart_open);
        reduce(&mut state, Action::ToggleCart);
        assert!(!state.cart_open);

        reduce(&mut state, Action::AddMultipleToCart(vec![line("a", 1), line("b", 1)]));
        reduce(&mut state, Action::ToggleCart);
        assert!(reduce(&mut state, Action::ClearCart));
        assert!(state.cart.is_empty());
        assert!(!state.cart_open);
        assert!(!reduce(&mut state, Action::ClearCart));
    }

    #[test]
    fn test_books_in_category() {
        let fiction = Category::new("c1", "Fiction");
        let mut state = ClientState {
            products: vec![
                Book::new("b1", "Dune", Money::from_cents(900)).with_category(fiction.clone()),
                Book::new("b2", "SICP", Money::from_cents(4000)),
            ],
            ..Default::default()
        };

        assert_eq!(books_in_category(&state).len(), 2);

        reduce(&mut state, Action::UpdateCurrentCategory("c1".into()));
        let filtered = books_in_category(&state);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "b1");
    }
}
