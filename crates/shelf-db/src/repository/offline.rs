//! # Offline Record Repository
//!
//! Keyed JSON records grouped into named stores.
//!
//! ## Stores
//! ```text
//! ┌────────────┬──────────────┬───────────────────────────────────────────┐
//! │ Store      │ Key          │ Payload                                   │
//! ├────────────┼──────────────┼───────────────────────────────────────────┤
//! │ cart       │ book id      │ CartLine                                  │
//! │ books      │ book id      │ Book (last catalog fetch)                 │
//! │ categories │ category id  │ Category                                  │
//! └────────────┴──────────────┴───────────────────────────────────────────┘
//! ```
//!
//! `put` is an upsert. Rows keep their original rowid on update, so
//! `get_all` returns records in first-insert order.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Named partition of the offline store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreName {
    Cart,
    Books,
    Categories,
}

impl StoreName {
    pub const ALL: [StoreName; 3] = [StoreName::Cart, StoreName::Books, StoreName::Categories];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreName::Cart => "cart",
            StoreName::Books => "books",
            StoreName::Categories => "categories",
        }
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreName {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cart" => Ok(StoreName::Cart),
            "books" => Ok(StoreName::Books),
            "categories" => Ok(StoreName::Categories),
            other => Err(DbError::UnknownStore(other.to_string())),
        }
    }
}

/// One stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct OfflineRecord {
    pub store: StoreName,
    pub key: String,
    pub payload: Value,
    pub updated_at: DateTime<Utc>,
}

/// Repository over the `offline_records` table.
#[derive(Debug, Clone)]
pub struct OfflineRecordRepository {
    pool: SqlitePool,
}

impl OfflineRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OfflineRecordRepository { pool }
    }

    /// Inserts or replaces the record at `(store, key)`.
    pub async fn put(&self, store: StoreName, key: &str, payload: &Value) -> DbResult<()> {
        let body = serde_json::to_string(payload)?;
        let now = Utc::now();

        debug!(store = %store, key = %key, "Writing offline record");

        sqlx::query(
            r#"
            INSERT INTO offline_records (store, key, payload, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (store, key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(store.as_str())
        .bind(key)
        .bind(body)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replaces the contents of `store` with `records` in one transaction.
    pub async fn replace_all(&self, store: StoreName, records: &[(String, Value)]) -> DbResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM offline_records WHERE store = ?1")
            .bind(store.as_str())
            .execute(&mut *tx)
            .await?;

        for (key, payload) in records {
            let body = serde_json::to_string(payload)?;
            sqlx::query(
                r#"
                INSERT INTO offline_records (store, key, payload, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (store, key) DO UPDATE SET
                    payload = excluded.payload,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(store.as_str())
            .bind(key)
            .bind(body)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(store = %store, count = records.len(), "Replaced offline records");
        Ok(())
    }

    pub async fn get(&self, store: StoreName, key: &str) -> DbResult<Option<Value>> {
        let row = sqlx::query("SELECT payload FROM offline_records WHERE store = ?1 AND key = ?2")
            .bind(store.as_str())
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let body: String = row.try_get("payload")?;
                Ok(Some(serde_json::from_str(&body)?))
            }
            None => Ok(None),
        }
    }

    /// All payloads in `store`, in first-insert order.
    pub async fn get_all(&self, store: StoreName) -> DbResult<Vec<Value>> {
        Ok(self
            .records(store)
            .await?
            .into_iter()
            .map(|r| r.payload)
            .collect())
    }

    /// Full records in `store`, in first-insert order.
    pub async fn records(&self, store: StoreName) -> DbResult<Vec<OfflineRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT store, key, payload, updated_at
            FROM offline_records
            WHERE store = ?1
            ORDER BY rowid ASC
            "#,
        )
        .bind(store.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> DbResult<OfflineRecord> {
                let store: String = row.try_get("store")?;
                let body: String = row.try_get("payload")?;
                Ok(OfflineRecord {
                    store: store.parse()?,
                    key: row.try_get("key")?,
                    payload: serde_json::from_str(&body)?,
                    updated_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }

    /// Deletes one record. Returns whether it existed.
    pub async fn delete(&self, store: StoreName, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM offline_records WHERE store = ?1 AND key = ?2")
            .bind(store.as_str())
            .bind(key)
            .execute(&self.pool)
            .await?;

        debug!(store = %store, key = %key, deleted = result.rows_affected(), "Deleted offline record");
        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self, store: StoreName) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM offline_records WHERE store = ?1")
                .bind(store.as_str())
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
