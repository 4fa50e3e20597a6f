//! store.rs: durable ledger of papers already delivered by email.
//!
//! One SQLite table keyed by arXiv identifier. Rows are only ever inserted
//! (insert-if-absent) by the delivery path; deletion is an administrative
//! concern (`prune_older_than`, `reset`).

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::StoreError;

pub const DEFAULT_DB_FILE: &str = "papers.db";

const CREATE_TABLE: &str = r"CREATE TABLE IF NOT EXISTS delivered_papers (
    identifier   TEXT PRIMARY KEY,
    title        TEXT NOT NULL,
    topic        TEXT,
    delivered_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

// SQLite CURRENT_TIMESTAMP layout, always UTC.
const SQLITE_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DeliveredEntry {
    pub identifier: String,
    pub title: String,
    pub topic: Option<String>,
    pub delivered_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ResultStore {
    pool: SqlitePool,
}

impl ResultStore {
    /// Open (creating if needed) the ledger at `path`.
    #[tracing::instrument(skip(path), fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    /// Private in-memory ledger, gone when the store is dropped.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Every delivered identifier, in no particular order.
    pub async fn load_identifiers(&self) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT identifier FROM delivered_papers")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Insert-if-absent. Returns `true` when a new row was written; an existing
    /// row (and its original `delivered_at`) is left untouched.
    pub async fn insert_if_absent(
        &self,
        identifier: &str,
        title: &str,
        topic: Option<&str>,
    ) -> Result<bool, StoreError> {
        let res = sqlx::query(
            r"INSERT OR IGNORE INTO delivered_papers (identifier, title, topic)
              VALUES (?, ?, ?)",
        )
        .bind(identifier)
        .bind(title)
        .bind(topic)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM delivered_papers")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn get(&self, identifier: &str) -> Result<Option<DeliveredEntry>, StoreError> {
        let row: Option<(String, String, Option<String>, String)> = sqlx::query_as(
            r"SELECT identifier, title, topic, delivered_at
              FROM delivered_papers WHERE identifier = ?",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        row.map(entry_from_row).transpose()
    }

    /// All entries, most recently delivered first.
    pub async fn list(&self) -> Result<Vec<DeliveredEntry>, StoreError> {
        let rows: Vec<(String, String, Option<String>, String)> = sqlx::query_as(
            r"SELECT identifier, title, topic, delivered_at
              FROM delivered_papers
              ORDER BY delivered_at DESC, identifier ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(entry_from_row).collect()
    }

    /// Delete entries delivered more than `days` days ago. Returns rows removed.
    pub async fn prune_older_than(&self, days: u32) -> Result<u64, StoreError> {
        let res = sqlx::query(
            r"DELETE FROM delivered_papers
              WHERE delivered_at < datetime('now', ?)",
        )
        .bind(format!("-{days} days"))
        .execute(&self.pool)
        .await?;
        let deleted = res.rows_affected();
        tracing::info!(target: "store", deleted, days, "pruned delivered papers");
        Ok(deleted)
    }

    /// Drop and recreate the table.
    pub async fn reset(&self) -> Result<(), StoreError> {
        sqlx::query("DROP TABLE IF EXISTS delivered_papers")
            .execute(&self.pool)
            .await?;
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        tracing::warn!(target: "store", "result store reset");
        Ok(())
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn entry_from_row(
    (identifier, title, topic, delivered_at): (String, String, Option<String>, String),
) -> Result<DeliveredEntry, StoreError> {
    let naive = NaiveDateTime::parse_from_str(&delivered_at, SQLITE_TS_FORMAT)
        .map_err(|_| StoreError::Timestamp(delivered_at.clone()))?;
    Ok(DeliveredEntry {
        identifier,
        title,
        topic,
        delivered_at: Utc.from_utc_datetime(&naive),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn backdate(store: &ResultStore, id: &str, ts: &str) {
        sqlx::query("UPDATE delivered_papers SET delivered_at = ? WHERE identifier = ?")
            .bind(ts)
            .bind(id)
            .execute(store.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn insert_is_idempotent_and_keeps_timestamp() {
        let store = ResultStore::open_in_memory().await.unwrap();
        assert!(store
            .insert_if_absent("2401.1", "First", Some("ml"))
            .await
            .unwrap());
        backdate(&store, "2401.1", "2020-05-05 12:00:00").await;

        assert!(!store
            .insert_if_absent("2401.1", "Changed title", None)
            .await
            .unwrap());

        let e = store.get("2401.1").await.unwrap().unwrap();
        assert_eq!(e.title, "First");
        assert_eq!(e.topic.as_deref(), Some("ml"));
        assert_eq!(e.delivered_at.to_rfc3339(), "2020-05-05T12:00:00+00:00");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = ResultStore::open_in_memory().await.unwrap();
        for id in ["a", "b", "c"] {
            store.insert_if_absent(id, id, None).await.unwrap();
        }
        backdate(&store, "a", "2024-01-02 00:00:00").await;
        backdate(&store, "b", "2024-01-03 00:00:00").await;
        backdate(&store, "c", "2024-01-01 00:00:00").await;

        let ids: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.identifier)
            .collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn prune_removes_only_old_rows() {
        let store = ResultStore::open_in_memory().await.unwrap();
        store.insert_if_absent("old", "Old", None).await.unwrap();
        store.insert_if_absent("new", "New", None).await.unwrap();
        backdate(&store, "old", "2000-01-01 00:00:00").await;

        assert_eq!(store.prune_older_than(30).await.unwrap(), 1);
        assert!(store.get("old").await.unwrap().is_none());
        assert!(store.get("new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn reset_empties_and_keeps_table_usable() {
        let store = ResultStore::open_in_memory().await.unwrap();
        store.insert_if_absent("x", "X", None).await.unwrap();
        store.reset().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.insert_if_absent("x", "X", None).await.unwrap());
    }
}
