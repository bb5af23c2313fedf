//! # State Container
//!
//! Owns the session's [`ClientState`]. `dispatch` is the only way in; each
//! action runs the pure reducer to completion before the next one starts.
//!
//! ```text
//! dispatch(action) ──► reduce(&mut state, action) ──► changed?
//!                                                       │ yes
//!                                                       ▼
//!                                          subscribers notified
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::debug;

use shelf_core::state::reduce;
use shelf_core::{Action, ClientState};

/// Shared handle to the client state. Cheap to clone.
#[derive(Debug, Clone)]
pub struct StateContainer {
    state: Arc<watch::Sender<ClientState>>,
    /// Serializes dispatches so a plan and its action apply back to back.
    writes: Arc<Mutex<()>>,
    dispatches: Arc<AtomicU64>,
}

impl StateContainer {
    pub fn new() -> Self {
        Self::with_state(ClientState::default())
    }

    pub fn with_state(state: ClientState) -> Self {
        StateContainer {
            state: Arc::new(watch::Sender::new(state)),
            writes: Arc::new(Mutex::new(())),
            dispatches: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Applies `action` and returns whether the state changed.
    pub fn dispatch(&self, action: Action) -> bool {
        let _write = self.write_lock();
        let name = action.name();
        let changed = self.state.send_if_modified(|state| reduce(state, action));
        let count = self.dispatches.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(action = name, changed, dispatch = count, "Dispatched");
        changed
    }

    /// Plans an action from the current state and applies it before any
    /// other dispatch can land.
    ///
    /// A planning error leaves the state untouched and is returned as-is.
    pub fn dispatch_with<T, E>(
        &self,
        plan: impl FnOnce(&ClientState) -> Result<(Action, T), E>,
    ) -> Result<T, E> {
        let _write = self.write_lock();
        let (action, value) = plan(&self.state.borrow())?;

        let name = action.name();
        let changed = self.state.send_if_modified(|state| reduce(state, action));
        let count = self.dispatches.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(action = name, changed, dispatch = count, "Dispatched");
        Ok(value)
    }

    fn write_lock(&self) -> MutexGuard<'_, ()> {
        // The guard protects no data, so a poisoned lock is still usable.
        self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads a projection of the current state.
    pub fn select<T>(&self, f: impl FnOnce(&ClientState) -> T) -> T {
        f(&self.state.borrow())
    }

    pub fn snapshot(&self) -> ClientState {
        self.state.borrow().clone()
    }

    /// Receiver woken after every state-changing dispatch.
    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.state.subscribe()
    }

    /// Dispatches so far, changing or not.
    pub fn dispatch_count(&self) -> u64 {
        self.dispatches.load(Ordering::Relaxed)
    }
}

impl Default for StateContainer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_core::{Book, CartLine, Money};

    fn line(id: &str) -> CartLine {
        CartLine::from_book(&Book::new(id, id, Money::from_cents(300)))
    }

    #[test]
    fn test_dispatch_and_select() {
        let store = StateContainer::new();
        assert!(store.dispatch(Action::AddToCart(line("b1"))));
        assert!(store.dispatch(Action::AddToCart(line("b1"))));

        let qty = store.select(|s| s.cart[0].purchase_quantity);
        assert_eq!(qty, 2);
        assert_eq!(store.dispatch_count(), 2);
    }

    #[test]
    fn test_noop_dispatch_is_counted_but_unchanged() {
        let store = StateContainer::new();
        assert!(!store.dispatch(Action::RemoveFromCart("ghost".into())));
        assert_eq!(store.dispatch_count(), 1);
        assert_eq!(store.snapshot(), ClientState::default());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes_only() {
        let store = StateContainer::new();
        let mut rx = store.subscribe();

        store.dispatch(Action::RemoveFromCart("ghost".into()));
        assert!(!rx.has_changed().unwrap());

        store.dispatch(Action::ToggleCart);
        assert!(rx.has_changed().unwrap());
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().cart_open);
    }

    #[test]
    fn test_dispatch_with_plans_against_current_state() {
        let store = StateContainer::new();
        store.dispatch(Action::AddToCart(line("b1")));

        let next: Result<i64, &str> = store.dispatch_with(|s| {
            let q = s.cart[0].purchase_quantity + 1;
            Ok((
                Action::UpdateCartQuantity {
                    id: "b1".into(),
                    purchase_quantity: q,
                },
                q,
            ))
        });
        assert_eq!(next, Ok(2));
        assert_eq!(store.select(|s| s.cart[0].purchase_quantity), 2);

        let err: Result<(), &str> = store.dispatch_with(|_| Err("nope"));
        assert_eq!(err, Err("nope"));
        assert_eq!(store.dispatch_count(), 2);
    }

    #[test]
    fn test_concurrent_planned_dispatches_do_not_lose_updates() {
        let store = StateContainer::new();
        store.dispatch(Action::AddToCart(line("b1")));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        let _: Result<(), ()> = store.dispatch_with(|s| {
                            Ok((
                                Action::UpdateCartQuantity {
                                    id: "b1".into(),
                                    purchase_quantity: s.cart[0].purchase_quantity + 1,
                                },
                                (),
                            ))
                        });
                    }
                })
            })
            .collect();
        for thread in threads {
            thread.join().unwrap();
        }

        assert_eq!(store.select(|s| s.cart[0].purchase_quantity), 201);
        assert_eq!(store.dispatch_count(), 201);
    }

    #[test]
    fn test_clones_share_state() {
        let store = StateContainer::new();
        let other = store.clone();
        other.dispatch(Action::ToggleCart);
        assert!(store.select(|s| s.cart_open));
        assert_eq!(store.dispatch_count(), 1);
    }
}
