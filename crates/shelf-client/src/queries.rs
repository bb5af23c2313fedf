//! # Book API
//!
//! The four operations the marketplace server exposes, and the wire records
//! they return. Prices arrive as decimal dollars and are converted to
//! [`Money`] here; nothing past this module sees a float.
//!
//! ## Operations
//! ```text
//! allBooks                       → [Book { category }]
//! getBookById(id)                → Book { category, userId, comment { userId } } | null
//! addComment(bookId, comment)    → { _id }      (caller refetches the book)
//! categories                     → [Category]
//! ```

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

use shelf_core::{Book, Category, Comment, Money, UserRef};

use crate::error::{ClientError, ClientResult};
use crate::graphql::{GraphqlRequest, GraphqlTransport};

// =============================================================================
// Query Documents
// =============================================================================

pub const QUERY_ALL_BOOKS: &str = r#"
query allBooks {
  allBooks {
    _id
    name
    author
    image
    price
    quantity
    condition
    category {
      _id
      name
    }
  }
}
"#;

pub const QUERY_BOOK_BY_ID: &str = r#"
query getBookById($id: ID!) {
  getBookById(id: $id) {
    _id
    name
    author
    image
    price
    quantity
    condition
    category {
      _id
      name
    }
    userId {
      _id
      firstName
      lastName
    }
    comment {
      comment
      userId {
        _id
        firstName
      }
    }
  }
}
"#;

pub const MUTATION_ADD_COMMENT: &str = r#"
mutation addComment($bookId: ID!, $comment: String!) {
  addComment(bookId: $bookId, comment: $comment) {
    _id
  }
}
"#;

pub const QUERY_CATEGORIES: &str = r#"
query categories {
  categories {
    _id
    name
  }
}
"#;

// =============================================================================
// Wire Records
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
struct CommentRecord {
    #[serde(default)]
    comment: Option<String>,
    #[serde(rename = "userId", default)]
    user_id: Option<UserRef>,
}

/// A book as the server sends it.
#[derive(Debug, Clone, Deserialize)]
struct BookRecord {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    quantity: Option<i64>,
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    category: Option<Category>,
    #[serde(rename = "userId", default)]
    user_id: Option<UserRef>,
    #[serde(default)]
    comment: Option<Vec<Option<CommentRecord>>>,
}

impl TryFrom<BookRecord> for Book {
    type Error = ClientError;

    fn try_from(record: BookRecord) -> ClientResult<Self> {
        let price = match record.price {
            None => Money::zero(),
            Some(dollars) => Money::from_dollars(dollars).ok_or_else(|| {
                ClientError::Deserialization(format!(
                    "book {} has invalid price {}",
                    record.id, dollars
                ))
            })?,
        };

        Ok(Book {
            id: record.id,
            name: record.name,
            author: record.author.unwrap_or_default(),
            category: record.category,
            condition: record.condition.unwrap_or_default(),
            price,
            quantity: record.quantity,
            image: record.image.filter(|i| !i.is_empty()),
            owner: record.user_id,
            comments: record
                .comment
                .unwrap_or_default()
                .into_iter()
                .flatten()
                .map(|c| Comment::new(c.comment.unwrap_or_default(), c.user_id))
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct IdRecord {
    #[serde(rename = "_id")]
    id: String,
}

/// Pulls `field` out of a `data` object.
fn field<T: serde::de::DeserializeOwned>(data: &mut Value, name: &str) -> ClientResult<T> {
    let value = data
        .get_mut(name)
        .map(Value::take)
        .ok_or_else(|| ClientError::MissingData(name.to_string()))?;
    Ok(serde_json::from_value(value)?)
}

// =============================================================================
// Book API
// =============================================================================

/// Typed access to the marketplace operations.
#[derive(Clone)]
pub struct BookApi {
    transport: Arc<dyn GraphqlTransport>,
}

impl BookApi {
    pub fn new(transport: Arc<dyn GraphqlTransport>) -> Self {
        BookApi { transport }
    }

    pub async fn all_books(&self) -> ClientResult<Vec<Book>> {
        let mut data = self
            .transport
            .execute(GraphqlRequest::new("allBooks", QUERY_ALL_BOOKS))
            .await?;

        let records: Vec<BookRecord> = field(&mut data, "allBooks")?;
        let books = records
            .into_iter()
            .map(Book::try_from)
            .collect::<ClientResult<Vec<_>>>()?;

        debug!(count = books.len(), "Fetched catalog");
        Ok(books)
    }

    /// `Ok(None)` when the server answers `getBookById: null`.
    pub async fn book_by_id(&self, id: &str) -> ClientResult<Option<Book>> {
        let mut data = self
            .transport
            .execute(
                GraphqlRequest::new("getBookById", QUERY_BOOK_BY_ID)
                    .with_variables(json!({ "id": id })),
            )
            .await?;

        let record: Option<BookRecord> = field(&mut data, "getBookById")?;
        record.map(Book::try_from).transpose()
    }

    /// Posts a comment and returns the id of the commented book.
    pub async fn add_comment(&self, book_id: &str, comment: &str) -> ClientResult<String> {
        let mut data = self
            .transport
            .execute(
                GraphqlRequest::new("addComment", MUTATION_ADD_COMMENT)
                    .with_variables(json!({ "bookId": book_id, "comment": comment })),
            )
            .await?;

        let result: IdRecord = field(&mut data, "addComment")?;
        info!(book_id = %result.id, "Comment added");
        Ok(result.id)
    }

    pub async fn categories(&self) -> ClientResult<Vec<Category>> {
        let mut data = self
            .transport
            .execute(GraphqlRequest::new("categories", QUERY_CATEGORIES))
            .await?;
        field(&mut data, "categories")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeServer;

    fn record(value: Value) -> ClientResult<Book> {
        Book::try_from(serde_json::from_value::<BookRecord>(value).unwrap())
    }

    #[test]
    fn test_record_conversion() {
        let book = record(json!({
            "_id": "b1",
            "name": "Dune",
            "author": "Frank Herbert",
            "price": 12.5,
            "quantity": null,
            "image": "",
            "userId": { "_id": "u1", "firstName": "Sam", "lastName": null },
            "comment": [
                { "comment": "Great", "userId": { "_id": "u2", "firstName": "Ana" } },
                null,
                { "comment": "Meh", "userId": null }
            ]
        }))
        .unwrap();

        assert_eq!(book.price, Money::from_cents(1250));
        assert_eq!(book.quantity, None);
        assert_eq!(book.image, None);
        assert_eq!(book.owner_name(), "Sam");
        assert_eq!(book.comments.len(), 2);
        assert_eq!(book.comments[1].author_name(), "Anonymous");
    }

    #[test]
    fn test_negative_price_rejected() {
        let err = record(json!({ "_id": "b1", "name": "x", "price": -1.0 })).unwrap_err();
        assert!(matches!(err, ClientError::Deserialization(_)));
    }

    #[tokio::test]
    async fn test_all_books() {
        let server = FakeServer::with_books(vec![
            Book::new("b1", "Dune", Money::from_cents(999)),
            Book::new("b2", "Emma", Money::from_cents(450)),
        ]);
        let api = BookApi::new(server.clone());

        let books = api.all_books().await.unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].price, Money::from_cents(999));
        assert_eq!(server.calls("allBooks"), 1);
    }

    #[tokio::test]
    async fn test_book_by_id_null_is_none() {
        let server = FakeServer::with_books(vec![]);
        let api = BookApi::new(server);
        assert!(api.book_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_comment_then_refetch() {
        let server = FakeServer::with_books(vec![Book::new("b1", "Dune", Money::from_cents(999))]);
        let api = BookApi::new(server);

        assert_eq!(api.add_comment("b1", "Loved it").await.unwrap(), "b1");
        let book = api.book_by_id("b1").await.unwrap().unwrap();
        assert_eq!(book.comments.len(), 1);
        assert_eq!(book.comments[0].body, "Loved it");
    }

    #[tokio::test]
    async fn test_server_errors_propagate() {
        let server = FakeServer::with_books(vec![]);
        server.fail("categories", "boom");
        let api = BookApi::new(server);

        let err = api.categories().await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
