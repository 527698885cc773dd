//! Sync/preference metadata repository implementation
//!
//! Key-value rows, JSON-encoded, carrying the selected category filter,
//! the auto-sync flag, sync timestamps, the per-installation identifier,
//! and the default-seed marker.

use libsql::Connection;
use uuid::Uuid;

use crate::error::{Error, Result};

const KEY_CATEGORY_FILTER: &str = "category_filter";
const KEY_AUTO_SYNC: &str = "auto_sync_enabled";
const KEY_LAST_SYNC: &str = "last_sync_time";
const KEY_LAST_LOCAL_CHANGE: &str = "last_local_change";
const KEY_INSTALLATION_ID: &str = "installation_id";
const KEY_SEEDED: &str = "seeded";

/// Trait for metadata storage operations (async)
#[allow(async_fn_in_trait)]
pub trait MetaRepository {
    /// Selected category filter, `"all"` when unset
    async fn category_filter(&self) -> Result<String>;
    async fn set_category_filter(&self, filter: &str) -> Result<()>;

    /// Whether periodic sync is enabled, off when unset
    async fn auto_sync_enabled(&self) -> Result<bool>;
    async fn set_auto_sync_enabled(&self, enabled: bool) -> Result<()>;

    /// Timestamp of the last successful sync (Unix ms)
    async fn last_sync_time(&self) -> Result<Option<i64>>;
    async fn set_last_sync_time(&self, timestamp_ms: i64) -> Result<()>;

    /// Timestamp of the last local mutation (Unix ms)
    async fn last_local_change(&self) -> Result<Option<i64>>;
    async fn set_last_local_change(&self, timestamp_ms: i64) -> Result<()>;

    /// Per-installation identifier, generated and persisted on first use
    async fn installation_id(&self) -> Result<String>;

    /// Whether the default quote set has been seeded
    async fn has_seeded(&self) -> Result<bool>;
    async fn mark_seeded(&self) -> Result<()>;
}

/// libSQL implementation of `MetaRepository`
pub struct LibSqlMetaRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlMetaRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM meta WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    async fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO meta (key, value) VALUES (?, ?)",
                [key, value],
            )
            .await?;
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key).await? {
            Some(raw) => {
                let value = serde_json::from_str(&raw).map_err(|error| {
                    Error::Database(format!("corrupt meta value for '{key}': {error}"))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set_json<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set_raw(key, &serde_json::to_string(value)?).await
    }
}

impl MetaRepository for LibSqlMetaRepository<'_> {
    async fn category_filter(&self) -> Result<String> {
        Ok(self
            .get_json::<String>(KEY_CATEGORY_FILTER)
            .await?
            .unwrap_or_else(|| "all".to_string()))
    }

    async fn set_category_filter(&self, filter: &str) -> Result<()> {
        self.set_json(KEY_CATEGORY_FILTER, &filter.trim().to_lowercase())
            .await
    }

    async fn auto_sync_enabled(&self) -> Result<bool> {
        Ok(self.get_json(KEY_AUTO_SYNC).await?.unwrap_or(false))
    }

    async fn set_auto_sync_enabled(&self, enabled: bool) -> Result<()> {
        self.set_json(KEY_AUTO_SYNC, &enabled).await
    }

    async fn last_sync_time(&self) -> Result<Option<i64>> {
        self.get_json(KEY_LAST_SYNC).await
    }

    async fn set_last_sync_time(&self, timestamp_ms: i64) -> Result<()> {
        self.set_json(KEY_LAST_SYNC, &timestamp_ms).await
    }

    async fn last_local_change(&self) -> Result<Option<i64>> {
        self.get_json(KEY_LAST_LOCAL_CHANGE).await
    }

    async fn set_last_local_change(&self, timestamp_ms: i64) -> Result<()> {
        self.set_json(KEY_LAST_LOCAL_CHANGE, &timestamp_ms).await
    }

    async fn installation_id(&self) -> Result<String> {
        if let Some(id) = self.get_json::<String>(KEY_INSTALLATION_ID).await? {
            return Ok(id);
        }

        let id = Uuid::now_v7().to_string();
        self.set_json(KEY_INSTALLATION_ID, &id).await?;
        Ok(id)
    }

    async fn has_seeded(&self) -> Result<bool> {
        Ok(self.get_json(KEY_SEEDED).await?.unwrap_or(false))
    }

    async fn mark_seeded(&self) -> Result<()> {
        self.set_json(KEY_SEEDED, &true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_defaults_when_unset() {
        let db = setup().await;
        let repo = LibSqlMetaRepository::new(db.connection());

        assert_eq!(repo.category_filter().await.unwrap(), "all");
        assert!(!repo.auto_sync_enabled().await.unwrap());
        assert_eq!(repo.last_sync_time().await.unwrap(), None);
        assert_eq!(repo.last_local_change().await.unwrap(), None);
        assert!(!repo.has_seeded().await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_round_trips() {
        let db = setup().await;
        let repo = LibSqlMetaRepository::new(db.connection());

        repo.set_category_filter("  Motivation ").await.unwrap();
        assert_eq!(repo.category_filter().await.unwrap(), "motivation");

        repo.set_auto_sync_enabled(true).await.unwrap();
        assert!(repo.auto_sync_enabled().await.unwrap());

        repo.set_last_sync_time(12_345).await.unwrap();
        assert_eq!(repo.last_sync_time().await.unwrap(), Some(12_345));

        repo.set_last_local_change(23_456).await.unwrap();
        assert_eq!(repo.last_local_change().await.unwrap(), Some(23_456));

        repo.mark_seeded().await.unwrap();
        assert!(repo.has_seeded().await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_installation_id_is_stable() {
        let db = setup().await;
        let repo = LibSqlMetaRepository::new(db.connection());

        let first = repo.installation_id().await.unwrap();
        let second = repo.installation_id().await.unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
