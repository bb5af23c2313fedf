//! # shelf-db: Offline Store for Shelf
//!
//! The client's offline cache: a SQLite table of JSON records addressed by
//! store name and key. It mirrors cart writes and the last fetched catalog so
//! a new session can start from where the previous one stopped. It is never
//! the source of truth; the in-memory client state is.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shelf Data Flow                                  │
//! │                                                                         │
//! │  shelf-client write queue (put / delete)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     shelf-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────────┐  ┌────────────┐  │   │
//! │  │   │   Database    │    │ OfflineRecord-     │  │ Migrations │  │   │
//! │  │   │   (pool.rs)   │◄───│ Repository         │  │ (embedded) │  │   │
//! │  │   └───────────────┘    └────────────────────┘  └────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  offline_records(store, key, payload, updated_at)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shelf_db::{Database, DbConfig, StoreName};
//!
//! let db = Database::new(DbConfig::new("shelf.db")).await?;
//! let store = db.offline_records();
//!
//! store.put(StoreName::Cart, "b1", &serde_json::json!({ "_id": "b1" })).await?;
//! let lines = store.get_all(StoreName::Cart).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::offline::{OfflineRecord, OfflineRecordRepository, StoreName};
