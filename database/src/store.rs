//! Named buckets of ordered key/value pairs on top of SQLite.
//!
//! Writers are serialized: [`Store::update`] holds the writer lock until the
//! returned [`Txn`] is committed or dropped. Dropping a `Txn` without calling
//! [`Txn::commit`] rolls everything back.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{DatabaseConfig, DatabaseError};

pub const PLAYERS_BUCKET: &str = "players";
pub const WHITELIST_BUCKET: &str = "whitelist";

#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
    writer: Arc<Mutex<()>>,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Opens the pool described by `config` and brings the schema up to date.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = config
            .create_pool()
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        let store = Self::new(pool);
        store.run_migrations().await?;
        tracing::info!("Opened player store at {}", config.url);
        Ok(store)
    }

    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Read-only transaction. Sees either all or none of any writer's changes.
    ///
    /// In-memory stores have a single connection, so there a reader waits
    /// until an open write transaction commits or rolls back. File stores
    /// read concurrently with the writer.
    pub async fn view(&self) -> Result<Txn, DatabaseError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Transaction(e.to_string()))?;
        Ok(Txn { tx, _writer: None })
    }

    /// Write transaction; waits for any other writer to finish first.
    pub async fn update(&self) -> Result<Txn, DatabaseError> {
        let guard = self.writer.clone().lock_owned().await;
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::Transaction(e.to_string()))?;
        Ok(Txn {
            tx,
            _writer: Some(guard),
        })
    }
}

pub struct Txn {
    tx: Transaction<'static, Sqlite>,
    _writer: Option<OwnedMutexGuard<()>>,
}

impl Txn {
    pub async fn commit(self) -> Result<(), DatabaseError> {
        self.tx
            .commit()
            .await
            .map_err(|e| DatabaseError::Transaction(e.to_string()))
    }

    pub async fn bucket_exists(&mut self, bucket: &str) -> Result<bool, DatabaseError> {
        let row = sqlx::query("SELECT 1 FROM buckets WHERE name = ?")
            .bind(bucket)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;
        Ok(row.is_some())
    }

    pub async fn create_bucket_if_missing(&mut self, bucket: &str) -> Result<(), DatabaseError> {
        sqlx::query("INSERT OR IGNORE INTO buckets (name) VALUES (?)")
            .bind(bucket)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;
        Ok(())
    }

    pub async fn get(&mut self, bucket: &str, key: &str) -> Result<Option<String>, DatabaseError> {
        sqlx::query_scalar::<_, String>("SELECT value FROM entries WHERE bucket = ? AND key = ?")
            .bind(bucket)
            .bind(key)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))
    }

    pub async fn put(&mut self, bucket: &str, key: &str, value: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO entries (bucket, key, value) VALUES (?, ?, ?)
             ON CONFLICT (bucket, key) DO UPDATE SET value = excluded.value",
        )
        .bind(bucket)
        .bind(key)
        .bind(value)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::Query(e.to_string()))?;
        Ok(())
    }

    /// Returns whether a value was actually removed.
    pub async fn delete(&mut self, bucket: &str, key: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM entries WHERE bucket = ? AND key = ?")
            .bind(bucket)
            .bind(key)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn clear_bucket(&mut self, bucket: &str) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM entries WHERE bucket = ?")
            .bind(bucket)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::Query(e.to_string()))?;
        Ok(result.rows_affected())
    }

    /// Every pair in `bucket`, ordered by key.
    pub async fn entries(&mut self, bucket: &str) -> Result<Vec<(String, String)>, DatabaseError> {
        sqlx::query_as::<_, (String, String)>(
            "SELECT key, value FROM entries WHERE bucket = ? ORDER BY key",
        )
        .bind(bucket)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::Query(e.to_string()))
    }

    pub async fn get_json<T: DeserializeOwned>(
        &mut self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<T>, DatabaseError> {
        match self.get(bucket, key).await? {
            Some(value) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    pub async fn put_json<T: Serialize>(
        &mut self,
        bucket: &str,
        key: &str,
        value: &T,
    ) -> Result<(), DatabaseError> {
        let value = serde_json::to_string(value)?;
        self.put(bucket, key, &value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> Store {
        Store::connect(&DatabaseConfig::in_memory())
            .await
            .expect("Failed to open store")
    }

    #[tokio::test]
    async fn test_players_bucket_exists_after_migrations() {
        let store = memory_store().await;
        let mut txn = store.view().await.unwrap();
        assert!(txn.bucket_exists(PLAYERS_BUCKET).await.unwrap());
        assert!(!txn.bucket_exists(WHITELIST_BUCKET).await.unwrap());
    }

    #[tokio::test]
    async fn test_put_get_delete_in_one_transaction() {
        let store = memory_store().await;
        let mut txn = store.update().await.unwrap();
        txn.put(PLAYERS_BUCKET, "b", "2").await.unwrap();
        txn.put(PLAYERS_BUCKET, "a", "1").await.unwrap();
        txn.put(PLAYERS_BUCKET, "a", "3").await.unwrap();

        assert_eq!(txn.get(PLAYERS_BUCKET, "a").await.unwrap().as_deref(), Some("3"));
        assert_eq!(
            txn.entries(PLAYERS_BUCKET).await.unwrap(),
            vec![
                ("a".to_string(), "3".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
        assert!(txn.delete(PLAYERS_BUCKET, "a").await.unwrap());
        assert!(!txn.delete(PLAYERS_BUCKET, "a").await.unwrap());
        txn.commit().await.unwrap();

        let mut txn = store.view().await.unwrap();
        assert_eq!(txn.get(PLAYERS_BUCKET, "a").await.unwrap(), None);
        assert_eq!(txn.get(PLAYERS_BUCKET, "b").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let store = memory_store().await;
        {
            let mut txn = store.update().await.unwrap();
            txn.create_bucket_if_missing(WHITELIST_BUCKET).await.unwrap();
            txn.put(WHITELIST_BUCKET, "k", "v").await.unwrap();
        }

        let mut txn = store.view().await.unwrap();
        assert!(!txn.bucket_exists(WHITELIST_BUCKET).await.unwrap());
        assert!(txn.entries(WHITELIST_BUCKET).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_put_into_missing_bucket_fails() {
        let store = memory_store().await;
        let mut txn = store.update().await.unwrap();
        let result = txn.put("nope", "k", "v").await;
        assert!(matches!(result, Err(DatabaseError::Query(_))));
    }

    #[tokio::test]
    async fn test_clear_bucket_only_touches_that_bucket() {
        let store = memory_store().await;
        let mut txn = store.update().await.unwrap();
        txn.create_bucket_if_missing(WHITELIST_BUCKET).await.unwrap();
        txn.put(WHITELIST_BUCKET, "w1", "{}").await.unwrap();
        txn.put(WHITELIST_BUCKET, "w2", "{}").await.unwrap();
        txn.put(PLAYERS_BUCKET, "p1", "{}").await.unwrap();

        assert_eq!(txn.clear_bucket(WHITELIST_BUCKET).await.unwrap(), 2);
        assert!(txn.bucket_exists(WHITELIST_BUCKET).await.unwrap());
        assert_eq!(txn.entries(PLAYERS_BUCKET).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_reader_waits_for_open_writer() {
        let store = memory_store().await;
        let mut txn = store.update().await.unwrap();
        txn.put(PLAYERS_BUCKET, "a", "1").await.unwrap();

        let blocked =
            tokio::time::timeout(std::time::Duration::from_millis(200), store.view()).await;
        assert!(blocked.is_err());

        txn.commit().await.unwrap();
        let mut reader = store.view().await.unwrap();
        assert_eq!(reader.get(PLAYERS_BUCKET, "a").await.unwrap().as_deref(), Some("1"));
    }
}
