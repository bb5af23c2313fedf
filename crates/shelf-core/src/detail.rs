//! # Detail Page View Model
//!
//! Everything the book detail page shows, with each optional relation
//! already resolved to its default, and the comment draft that survives a
//! failed submission.
//!
//! ## Page States
//! ```text
//! Loading ──► Failed { message }   "Error: <message>"
//!        └──► NoData               "No book details available."
//!        └──► Ready(page)
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::Book;
use crate::validation::{validate_comment, ValidationResult};

pub const NO_DATA_MESSAGE: &str = "No book details available.";
pub const NO_COMMENTS_MESSAGE: &str = "No comments yet.";
pub const CART_LOGIN_PROMPT: &str = "** Please log in to add to your cart. **";
pub const COMMENT_LOGIN_PROMPT: &str = "** Please log in to add a comment. **";
pub const COMMENT_PLACEHOLDER: &str = "Write a comment";

/// The add-to-cart slot of the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum CartControl {
    AddToCart,
    LoginPrompt { message: String },
}

/// The comment input slot of the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum CommentBox {
    Editor { placeholder: String },
    LoginPrompt { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommentView {
    pub author: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DetailPage {
    pub book_id: String,
    pub name: String,
    pub author: String,
    /// Category name, "Unknown" when missing.
    pub category: String,
    pub condition: String,
    pub price: Money,
    /// Never empty.
    pub image: String,
    /// Owner name, "Anonymous" when missing.
    pub posted_by: String,
    pub cart_control: CartControl,
    pub comment_box: CommentBox,
    pub comments: Vec<CommentView>,
}

impl DetailPage {
    pub fn new(book: &Book, logged_in: bool) -> Self {
        let (cart_control, comment_box) = if logged_in {
            (
                CartControl::AddToCart,
                CommentBox::Editor {
                    placeholder: COMMENT_PLACEHOLDER.to_string(),
                },
            )
        } else {
            (
                CartControl::LoginPrompt {
                    message: CART_LOGIN_PROMPT.to_string(),
                },
                CommentBox::LoginPrompt {
                    message: COMMENT_LOGIN_PROMPT.to_string(),
                },
            )
        };

        DetailPage {
            book_id: book.id.clone(),
            name: book.name.clone(),
            author: book.author.clone(),
            category: book.category_name().to_string(),
            condition: book.condition.clone(),
            price: book.price,
            image: book.display_image().to_string(),
            posted_by: book.owner_name(),
            cart_control,
            comment_box,
            comments: book
                .comments
                .iter()
                .map(|c| CommentView {
                    author: c.author_name().to_string(),
                    body: c.body.clone(),
                })
                .collect(),
        }
    }

    /// "No comments yet." when the list is empty.
    pub fn comments_message(&self) -> Option<&'static str> {
        self.comments.is_empty().then_some(NO_COMMENTS_MESSAGE)
    }

    pub fn can_add_to_cart(&self) -> bool {
        self.cart_control == CartControl::AddToCart
    }

    pub fn can_comment(&self) -> bool {
        matches!(self.comment_box, CommentBox::Editor { .. })
    }
}

/// What the detail page currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "state", rename_all = "snake_case")]
#[ts(export)]
pub enum DetailState {
    Loading,
    /// The query failed; rendered instead of the page body.
    Failed { message: String },
    /// The query succeeded but returned no book.
    NoData,
    Ready { page: Box<DetailPage> },
}

impl DetailState {
    pub fn ready(book: &Book, logged_in: bool) -> Self {
        DetailState::Ready {
            page: Box::new(DetailPage::new(book, logged_in)),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        DetailState::Failed {
            message: message.into(),
        }
    }

    pub fn page(&self) -> Option<&DetailPage> {
        match self {
            DetailState::Ready { page } => Some(page),
            _ => None,
        }
    }

    /// Single-line status text for the non-ready states.
    pub fn status_line(&self) -> Option<String> {
        match self {
            DetailState::Loading => Some("Loading...".to_string()),
            DetailState::Failed { message } => Some(format!("Error: {}", message)),
            DetailState::NoData => Some(NO_DATA_MESSAGE.to_string()),
            DetailState::Ready { .. } => None,
        }
    }
}

// =============================================================================
// Comment Draft
// =============================================================================

/// The text in the comment box.
///
/// Cleared only after a successful submission, and only if it was not edited
/// while the request was in flight. A failed one leaves it intact so the user
/// can retry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDraft {
    text: String,
}

impl CommentDraft {
    pub fn new(text: impl Into<String>) -> Self {
        CommentDraft { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Clears the draft only if it still holds `sent`. Returns whether it did.
    pub fn clear_if(&mut self, sent: &str) -> bool {
        if self.text != sent {
            return false;
        }
        self.text.clear();
        true
    }

    /// Trimmed body ready to send.
    pub fn validated(&self) -> ValidationResult<String> {
        validate_comment(&self.text)
    }
}
