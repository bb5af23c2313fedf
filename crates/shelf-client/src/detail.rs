//! # Detail Controller
//!
//! One book's page: loading it, adding it to the cart, and posting comments.
//!
//! ## Comment Flow
//! ```text
//! submit_comment
//!     │
//!     ├── logged out ──────► NotAuthenticated, draft kept
//!     ├── invalid draft ───► Validation error, draft kept, no request
//!     │
//!     └── addComment(bookId, text)
//!              │
//!              ├── Err ──► error! logged, draft kept
//!              │
//!              └── Ok ───► draft cleared if unchanged ──► getBookById refetch
//! ```

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use shelf_core::cart::plan_add_to_cart;
use shelf_core::detail::{CommentDraft, DetailState};
use shelf_core::validation::validate_book_id;
use shelf_core::{Action, Book, CartChange};

use crate::cart::mirror_line;
use crate::error::{ClientError, ClientResult};
use crate::persist::OfflineWriterHandle;
use crate::queries::BookApi;
use crate::session::Session;
use crate::store::StateContainer;

pub struct DetailController {
    api: BookApi,
    state: StateContainer,
    writer: OfflineWriterHandle,
    session: Session,
    book_id: String,
    book: Mutex<Option<Book>>,
    draft: Mutex<CommentDraft>,
}

impl DetailController {
    pub fn new(
        api: BookApi,
        state: StateContainer,
        writer: OfflineWriterHandle,
        session: Session,
        book_id: impl Into<String>,
    ) -> Self {
        DetailController {
            api,
            state,
            writer,
            session,
            book_id: book_id.into(),
            book: Mutex::new(None),
            draft: Mutex::new(CommentDraft::default()),
        }
    }

    pub fn book_id(&self) -> &str {
        &self.book_id
    }

    /// Queries the book and builds the page state.
    ///
    /// Query failures become [`DetailState::Failed`]; they are never returned
    /// as errors.
    pub async fn load(&self) -> DetailState {
        if let Err(e) = validate_book_id(&self.book_id) {
            return DetailState::failed(e.to_string());
        }

        match self.api.book_by_id(&self.book_id).await {
            Ok(Some(book)) => {
                let state = DetailState::ready(&book, self.session.logged_in());
                *self.book.lock().await = Some(book);
                state
            }
            Ok(None) => {
                debug!(book_id = %self.book_id, "Book not found");
                *self.book.lock().await = None;
                DetailState::NoData
            }
            Err(e) => {
                error!(book_id = %self.book_id, error = %e, "Failed to load book");
                DetailState::failed(e.to_string())
            }
        }
    }

    /// Adds one copy of this book to the cart and mirrors the resulting line.
    ///
    /// ## Errors
    /// - [`ClientError::NotAuthenticated`] for a logged-out session
    /// - [`ClientError::MissingData`] when the book no longer exists
    /// - [`ClientError::Core`] for out-of-stock or cart limits
    pub async fn add_to_cart(&self) -> ClientResult<CartChange> {
        if !self.session.logged_in() {
            return Err(ClientError::not_authenticated("add to your cart"));
        }

        let book = self.current_book().await?;
        let change = self.state.dispatch_with(|s| {
            let change = plan_add_to_cart(&s.cart, &book)?;
            Ok::<_, ClientError>((change.action(), change))
        })?;

        mirror_line(&self.writer, change.line());
        info!(
            book_id = %book.id,
            purchase_quantity = change.line().purchase_quantity,
            inserted = change.is_insert(),
            "Added to cart"
        );
        Ok(change)
    }

    /// The loaded book, fetching it if the page has not been loaded yet.
    async fn current_book(&self) -> ClientResult<Book> {
        let mut cached = self.book.lock().await;
        if let Some(book) = cached.as_ref() {
            return Ok(book.clone());
        }

        validate_book_id(&self.book_id)?;
        let book = self
            .api
            .book_by_id(&self.book_id)
            .await?
            .ok_or_else(|| ClientError::MissingData("getBookById".to_string()))?;
        *cached = Some(book.clone());
        Ok(book)
    }

    // =========================================================================
    // Comments
    // =========================================================================

    pub async fn set_draft(&self, text: impl Into<String>) {
        self.draft.lock().await.set_text(text);
    }

    pub async fn draft(&self) -> String {
        self.draft.lock().await.text().to_string()
    }

    /// Posts the current draft, then refetches the page.
    ///
    /// The draft is cleared only when the mutation succeeds and the text was
    /// not changed in the meantime.
    pub async fn submit_comment(&self) -> ClientResult<DetailState> {
        if !self.session.logged_in() {
            return Err(ClientError::not_authenticated("add a comment"));
        }

        let (sent, body) = {
            let draft = self.draft.lock().await;
            (draft.text().to_string(), draft.validated()?)
        };

        if let Err(e) = self.api.add_comment(&self.book_id, &body).await {
            error!(book_id = %self.book_id, error = %e, "Failed to add comment");
            return Err(e);
        }

        if !self.draft.lock().await.clear_if(&sent) {
            debug!(book_id = %self.book_id, "Draft edited while posting, keeping it");
        }
        Ok(self.load().await)
    }

    /// Flips the cart drawer; returns whether it is now open.
    pub fn toggle_cart(&self) -> bool {
        self.state.dispatch(Action::ToggleCart);
        self.state.select(|s| s.cart_open)
    }
}
