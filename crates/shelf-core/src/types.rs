//! # Domain Types
//!
//! Read-only projections of the marketplace's server data.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Book       │   │    Category     │   │    UserRef      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  _id            │──►│  _id            │   │  _id?           │       │
//! │  │  name, author   │   │  name           │   │  firstName?     │       │
//! │  │  price (Money)  │   └─────────────────┘   │  lastName?      │       │
//! │  │  image?         │                         └────────▲────────┘       │
//! │  │  userId? ───────┼─────────────────────────────────┤                 │
//! │  │  comment[] ─────┼──►┌─────────────────┐           │                 │
//! │  └─────────────────┘   │    Comment      │           │                 │
//! │                        │  comment (text) │           │                 │
//! │                        │  userId? ───────┼───────────┘                 │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Serde names follow the server (`_id`, `userId`, `comment`) so the same
//! shapes round-trip through the offline `books` store. Every optional
//! relation has a display accessor that degrades to a fixed default instead
//! of failing.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::{ANONYMOUS, PLACEHOLDER_IMAGE, UNKNOWN};

// =============================================================================
// Category
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Category {
            id: id.into(),
            name: name.into(),
        }
    }
}

// =============================================================================
// User Reference
// =============================================================================

/// A user as it appears nested inside books and comments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserRef {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl UserRef {
    pub fn named(first: impl Into<String>, last: impl Into<String>) -> Self {
        UserRef {
            id: None,
            first_name: Some(first.into()),
            last_name: Some(last.into()),
        }
    }

    /// First name, or "Anonymous" when missing or blank.
    pub fn first_name_or_anonymous(&self) -> &str {
        non_blank(self.first_name.as_deref()).unwrap_or(ANONYMOUS)
    }

    /// "First Last", with "Anonymous" standing in for the first name and the
    /// last name dropped when missing.
    pub fn display_name(&self) -> String {
        match non_blank(self.last_name.as_deref()) {
            Some(last) => format!("{} {}", self.first_name_or_anonymous(), last),
            None => self.first_name_or_anonymous().to_string(),
        }
    }
}

// =============================================================================
// Comment
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Comment {
    /// Comment body.
    #[serde(rename = "comment", default)]
    pub body: String,

    /// Author; absent for anonymous or deleted users.
    #[serde(rename = "userId", default)]
    pub author: Option<UserRef>,
}

impl Comment {
    pub fn new(body: impl Into<String>, author: Option<UserRef>) -> Self {
        Comment {
            body: body.into(),
            author,
        }
    }

    pub fn author_name(&self) -> &str {
        self.author
            .as_ref()
            .map(UserRef::first_name_or_anonymous)
            .unwrap_or(ANONYMOUS)
    }
}

// =============================================================================
// Book
// =============================================================================

/// A used book listed on the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Book {
    /// Unique identifier assigned by the server.
    #[serde(rename = "_id")]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub author: String,

    #[serde(default)]
    pub category: Option<Category>,

    /// Free-text condition ("Like new", "Worn cover", ...).
    #[serde(default)]
    pub condition: String,

    pub price: Money,

    /// Copies available; `None` when the server did not say.
    #[serde(default)]
    pub quantity: Option<i64>,

    #[serde(default)]
    pub image: Option<String>,

    /// The listing user.
    #[serde(rename = "userId", default)]
    pub owner: Option<UserRef>,

    #[serde(rename = "comment", default)]
    pub comments: Vec<Comment>,
}

impl Book {
    /// Creates a book with only the fields every listing has.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Money) -> Self {
        Book {
            id: id.into(),
            name: name.into(),
            author: String::new(),
            category: None,
            condition: String::new(),
            price,
            quantity: None,
            image: None,
            owner: None,
            comments: Vec::new(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_owner(mut self, owner: UserRef) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_comment(mut self, comment: Comment) -> Self {
        self.comments.push(comment);
        self
    }

    /// The image to show: the book's own, or the placeholder. Never empty.
    pub fn display_image(&self) -> &str {
        resolve_image(self.image.as_deref())
    }

    pub fn category_name(&self) -> &str {
        self.category
            .as_ref()
            .and_then(|c| non_blank(Some(c.name.as_str())))
            .unwrap_or(UNKNOWN)
    }

    pub fn category_id(&self) -> Option<&str> {
        self.category.as_ref().map(|c| c.id.as_str())
    }

    /// Name shown after "Posted by:".
    pub fn owner_name(&self) -> String {
        self.owner
            .as_ref()
            .map(UserRef::display_name)
            .unwrap_or_else(|| ANONYMOUS.to_string())
    }
}

/// Resolves an optional image to something displayable.
pub fn resolve_image(image: Option<&str>) -> &str {
    non_blank(image).unwrap_or(PLACEHOLDER_IMAGE)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_image_falls_back() {
        let book = Book::new("b1", "Dune", Money::from_cents(900));
        assert_eq!(book.display_image(), PLACEHOLDER_IMAGE);

        let book = book.with_image("");
        assert_eq!(book.display_image(), PLACEHOLDER_IMAGE);

        let book = book.with_image("dune.jpg");
        assert_eq!(book.display_image(), "dune.jpg");
    }

    #[test]
    fn test_relational_defaults() {
        let book = Book::new("b1", "Dune", Money::from_cents(900));
        assert_eq!(book.category_name(), "Unknown");
        assert_eq!(book.owner_name(), "Anonymous");

        let book = book
            .with_category(Category::new("c1", "Science Fiction"))
            .with_owner(UserRef::named("Frank", "Herbert"));
        assert_eq!(book.category_name(), "Science Fiction");
        assert_eq!(book.owner_name(), "Frank Herbert");
    }

    #[test]
    fn test_owner_with_missing_names() {
        let owner = UserRef {
            id: Some("u1".into()),
            first_name: None,
            last_name: Some("Herbert".into()),
        };
        assert_eq!(owner.display_name(), "Anonymous Herbert");

        let owner = UserRef {
            id: None,
            first_name: Some("Frank".into()),
            last_name: None,
        };
        assert_eq!(owner.display_name(), "Frank");
    }

    #[test]
    fn test_comment_author_defaults() {
        assert_eq!(Comment::new("great", None).author_name(), "Anonymous");
        let author = UserRef {
            first_name: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(Comment::new("great", Some(author)).author_name(), "Anonymous");
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::json!({
            "_id": "b1",
            "name": "Dune",
            "price": 900,
            "userId": { "firstName": "Frank" },
            "comment": [{ "comment": "classic", "userId": null }]
        });
        let book: Book = serde_json::from_value(json).unwrap();
        assert_eq!(book.id, "b1");
        assert_eq!(book.owner_name(), "Frank");
        assert_eq!(book.comments[0].body, "classic");
        assert_eq!(book.comments[0].author_name(), "Anonymous");
        assert!(book.quantity.is_none());
    }

    #[test]
    fn test_user_ref_emits_null_id() {
        let value = serde_json::to_value(UserRef::named("Ada", "Lovelace")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "_id": null, "firstName": "Ada", "lastName": "Lovelace" })
        );
    }
}
