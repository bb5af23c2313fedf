//! # Cart Controller
//!
//! Cart operations outside the detail page: restoring the cart from the
//! offline store, changing quantities, removing lines and clearing.
//!
//! Every operation dispatches first and mirrors the result into the offline
//! `cart` store second. The in-memory cart is authoritative; a failed mirror
//! is logged and counted by the write queue.

use std::convert::Infallible;
use std::sync::Arc;
use tracing::{info, warn};

use shelf_core::state::cart_line;
use shelf_core::validation::validate_quantity;
use shelf_core::{Action, CartLine, CartTotals, CoreError};
use shelf_db::StoreName;

use crate::error::{ClientError, ClientResult};
use crate::persist::{OfflineStore, OfflineWriterHandle};
use crate::store::StateContainer;

/// Queues a put of `line` into the offline cart store.
pub(crate) fn mirror_line(writer: &OfflineWriterHandle, line: &CartLine) {
    match serde_json::to_value(line) {
        // Enqueue failures are logged and counted by the queue.
        Ok(record) => {
            let _ = writer.put(StoreName::Cart, line.id.clone(), record);
        }
        Err(e) => warn!(book_id = %line.id, error = %e, "Failed to encode cart line"),
    }
}

#[derive(Clone)]
pub struct CartController {
    state: StateContainer,
    writer: OfflineWriterHandle,
    offline: Arc<dyn OfflineStore>,
}

impl CartController {
    pub fn new(
        state: StateContainer,
        writer: OfflineWriterHandle,
        offline: Arc<dyn OfflineStore>,
    ) -> Self {
        CartController {
            state,
            writer,
            offline,
        }
    }

    /// Restores the persisted cart when the in-memory cart is empty.
    ///
    /// Returns the number of lines restored. Records that no longer decode
    /// as cart lines are skipped.
    pub async fn hydrate(&self) -> ClientResult<usize> {
        if !self.state.select(|s| s.cart.is_empty()) {
            return Ok(0);
        }

        let records = self.offline.get_all(StoreName::Cart).await?;
        let lines: Vec<CartLine> = records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<CartLine>(record) {
                Ok(line) => Some(line),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed offline cart record");
                    None
                }
            })
            .collect();

        // Something may have landed in the cart while the store was read.
        let restored = self.state.dispatch_with(|s| {
            if s.cart.is_empty() {
                let count = lines.len();
                Ok::<_, ClientError>((Action::AddMultipleToCart(lines), count))
            } else {
                Ok((Action::AddMultipleToCart(Vec::new()), 0))
            }
        })?;

        if restored > 0 {
            info!(lines = restored, "Cart restored from offline store");
        }
        Ok(restored)
    }

    /// Sets a line's purchase quantity. Zero removes the line.
    pub fn set_quantity(&self, id: &str, quantity: i64) -> ClientResult<()> {
        validate_quantity(quantity)?;

        if quantity == 0 {
            if !self.remove(id) {
                return Err(CoreError::BookNotInCart(id.to_string()).into());
            }
            return Ok(());
        }

        let line = self.state.dispatch_with(|s| match cart_line(s, id) {
            Some(line) => {
                let updated = line.with_purchase_quantity(quantity);
                Ok((
                    Action::UpdateCartQuantity {
                        id: id.to_string(),
                        purchase_quantity: quantity,
                    },
                    updated,
                ))
            }
            None => Err(CoreError::BookNotInCart(id.to_string())),
        })?;

        mirror_line(&self.writer, &line);
        Ok(())
    }

    /// Removes a line. Returns false when the book was not in the cart.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.state.dispatch(Action::RemoveFromCart(id.to_string()));
        if removed {
            let _ = self.writer.delete(StoreName::Cart, id);
        }
        removed
    }

    /// Empties the cart and closes the drawer. Returns the lines removed.
    pub fn clear(&self) -> usize {
        let ids = self
            .state
            .dispatch_with(|s| {
                let ids: Vec<String> = s.cart.iter().map(|l| l.id.clone()).collect();
                Ok::<_, Infallible>((Action::ClearCart, ids))
            })
            .unwrap_or_default();

        for id in &ids {
            let _ = self.writer.delete(StoreName::Cart, id.as_str());
        }
        ids.len()
    }

    /// Flips the cart drawer; returns whether it is now open.
    pub fn toggle(&self) -> bool {
        self.state.dispatch(Action::ToggleCart);
        self.state.select(|s| s.cart_open)
    }

    pub fn lines(&self) -> Vec<CartLine> {
        self.state.select(|s| s.cart.clone())
    }

    pub fn totals(&self) -> CartTotals {
        self.state.select(|s| CartTotals::from(s.cart.as_slice()))
    }

    pub fn is_open(&self) -> bool {
        self.state.select(|s| s.cart_open)
    }
}
