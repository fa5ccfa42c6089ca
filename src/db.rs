use std::path::Path;

use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::debug;

pub type DB = SqlitePool;

pub async fn open(path: &Path) -> Result<DB> {
    let opts = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .with_context(|| format!("Failed to open database: {}", path.display()))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS preferences (
            key        TEXT PRIMARY KEY,
            value      TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(&pool)
    .await
    .context("Failed to create preferences table")?;

    debug!(path = %path.display(), "opened preference store");
    Ok(pool)
}

/// String-keyed preference storage. Values are JSON documents.
#[derive(Clone, Debug)]
pub struct KvStore {
    pool: DB,
}

impl KvStore {
    pub fn new(pool: DB) -> Self {
        Self { pool }
    }

    pub async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM preferences WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read preference `{}`", key))?;
        Ok(value)
    }

    pub async fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO preferences (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE
            SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to write preference `{}`", key))?;
        Ok(())
    }

    /// Returns whether a value was actually removed.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let res = sqlx::query("DELETE FROM preferences WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete preference `{}`", key))?;
        Ok(res.rows_affected() == 1)
    }

    /// `Ok(None)` when the key is absent; an error when the stored value does
    /// not parse as `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key).await? {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .with_context(|| format!("Malformed value stored under `{}`", key))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)
            .with_context(|| format!("Failed to serialize value for `{}`", key))?;
        self.set_raw(key, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> (KvStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let pool = open(&dir.path().join("curls.db")).await.unwrap();
        (KvStore::new(pool), dir)
    }

    #[tokio::test]
    async fn set_then_get_overwrites() {
        let (kv, _dir) = create_test_store().await;

        kv.set_json("numbers", &vec![1, 2, 3]).await.unwrap();
        kv.set_json("numbers", &vec![4]).await.unwrap();

        let got: Option<Vec<i32>> = kv.get_json("numbers").await.unwrap();
        assert_eq!(got, Some(vec![4]));
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let (kv, _dir) = create_test_store().await;
        let got: Option<Vec<i32>> = kv.get_json("nope").await.unwrap();
        assert!(got.is_none());
        assert!(!kv.remove("nope").await.unwrap());
    }

    #[tokio::test]
    async fn malformed_value_is_an_error() {
        let (kv, _dir) = create_test_store().await;
        kv.set_raw("broken", "{not json").await.unwrap();

        let got = kv.get_json::<Vec<String>>("broken").await;
        assert!(got.is_err());
        assert!(kv.remove("broken").await.unwrap());
    }
}
