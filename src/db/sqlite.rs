//! SQLite adapter for the key/value persistence port.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use super::KeyValueStore;
use crate::errors::AppError;

/// Key/value store backed by the `kv_store` table.
#[derive(Clone)]
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
}

impl SqliteKeyValueStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn read(&self, key: &str) -> Result<Option<String>, AppError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get("value")))
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at"#,
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        tracing::debug!(key, bytes = value.len(), "Persisted snapshot");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use tempfile::TempDir;

    async fn open_store(dir: &TempDir) -> SqliteKeyValueStore {
        let pool = init_database(&dir.path().join("nested/kv.sqlite"))
            .await
            .unwrap();
        SqliteKeyValueStore::new(pool)
    }

    #[tokio::test]
    async fn test_read_missing_key() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        assert_eq!(store.read("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        store.write("k", "[1]").await.unwrap();
        store.write("k", "[1,2]").await.unwrap();

        assert_eq!(store.read("k").await.unwrap().as_deref(), Some("[1,2]"));
    }

    #[tokio::test]
    async fn test_value_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = open_store(&dir).await;
            store.write("theme", "\"dark\"").await.unwrap();
            store.pool.close().await;
        }

        let store = open_store(&dir).await;
        assert_eq!(
            store.read("theme").await.unwrap().as_deref(),
            Some("\"dark\"")
        );

        store.remove("theme").await.unwrap();
        assert_eq!(store.read("theme").await.unwrap(), None);
    }
}
