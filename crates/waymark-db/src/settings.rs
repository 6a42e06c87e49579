//! System settings repository and its bounded-TTL read cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use tokio::sync::RwLock;
use tracing::debug;

use waymark_core::{defaults, Error, Result, SettingsRepository, SystemSetting};

/// PostgreSQL implementation of SettingsRepository.
pub struct PgSettingsRepository {
    pool: PgPool,
}

impl PgSettingsRepository {
    /// Create a new PgSettingsRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_row(row: &sqlx::postgres::PgRow) -> SystemSetting {
        SystemSetting {
            key: row.get("key"),
            value: row.get("value"),
            description: row.get("description"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<SystemSetting>> {
        let row = sqlx::query("SELECT * FROM system_setting WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.as_ref().map(Self::parse_row))
    }

    async fn list(&self) -> Result<Vec<SystemSetting>> {
        let rows = sqlx::query("SELECT * FROM system_setting ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(Self::parse_row).collect())
    }

    async fn put(&self, key: &str, value: &str) -> Result<SystemSetting> {
        let row = sqlx::query(
            "INSERT INTO system_setting (key, value, updated_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
             RETURNING *",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(Self::parse_row(&row))
    }
}

struct CacheEntry {
    value: Option<String>,
    fetched_at: Instant,
}

/// Read cache over a settings repository.
///
/// Entries live for a bounded TTL and every write goes through the cache,
/// which invalidates the key immediately. Reads tolerate staleness up to
/// the TTL window; two reads within the window and no intervening write
/// return identical values.
#[derive(Clone)]
pub struct SettingsCache {
    repo: Arc<dyn SettingsRepository>,
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl SettingsCache {
    /// Wrap a repository with the default TTL.
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self::with_ttl(repo, Duration::from_secs(defaults::SETTINGS_CACHE_TTL_SECS))
    }

    /// Wrap a repository with a custom TTL (tests use short windows).
    pub fn with_ttl(repo: Arc<dyn SettingsRepository>, ttl: Duration) -> Self {
        Self {
            repo,
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Get a setting value, serving from cache within the TTL.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(key) {
                if entry.fetched_at.elapsed() < self.ttl {
                    return Ok(entry.value.clone());
                }
            }
        }

        let value = self.repo.get(key).await?.map(|s| s.value);
        debug!(
            subsystem = "db",
            component = "settings_cache",
            op = "refresh",
            key = key,
            "Settings cache refreshed from store"
        );

        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(value)
    }

    /// Get a setting, treating empty values as unset.
    pub async fn get_non_empty(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key).await?.filter(|v| !v.is_empty()))
    }

    /// Write a setting and invalidate its cache entry.
    pub async fn put(&self, key: &str, value: &str) -> Result<SystemSetting> {
        let setting = self.repo.put(key, value).await?;
        self.invalidate(key).await;
        Ok(setting)
    }

    /// Drop one cached key.
    pub async fn invalidate(&self, key: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
    }

    /// Drop every cached key.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }

    /// List settings, always from the store (admin view).
    pub async fn list(&self) -> Result<Vec<SystemSetting>> {
        self.repo.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory settings store counting reads, for cache behavior tests.
    struct MemorySettings {
        values: RwLock<HashMap<String, String>>,
        reads: AtomicUsize,
    }

    impl MemorySettings {
        fn new() -> Self {
            Self {
                values: RwLock::new(HashMap::new()),
                reads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SettingsRepository for MemorySettings {
        async fn get(&self, key: &str) -> Result<Option<SystemSetting>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.values.read().await.get(key).map(|v| SystemSetting {
                key: key.to_string(),
                value: v.clone(),
                description: None,
                updated_at: Utc::now(),
            }))
        }

        async fn list(&self) -> Result<Vec<SystemSetting>> {
            let values = self.values.read().await;
            Ok(values
                .iter()
                .map(|(k, v)| SystemSetting {
                    key: k.clone(),
                    value: v.clone(),
                    description: None,
                    updated_at: Utc::now(),
                })
                .collect())
        }

        async fn put(&self, key: &str, value: &str) -> Result<SystemSetting> {
            self.values
                .write()
                .await
                .insert(key.to_string(), value.to_string());
            Ok(SystemSetting {
                key: key.to_string(),
                value: value.to_string(),
                description: None,
                updated_at: Utc::now(),
            })
        }
    }

    #[tokio::test]
    async fn test_reads_within_ttl_hit_cache_and_are_identical() {
        let store = Arc::new(MemorySettings::new());
        store.put("genai_model", "gemini-2.0-flash").await.unwrap();

        let cache = SettingsCache::with_ttl(store.clone(), Duration::from_secs(60));

        let first = cache.get("genai_model").await.unwrap();
        let second = cache.get("genai_model").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.as_deref(), Some("gemini-2.0-flash"));
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_write_invalidates_cached_key() {
        let store = Arc::new(MemorySettings::new());
        store.put("genai_api_key", "old").await.unwrap();

        let cache = SettingsCache::with_ttl(store.clone(), Duration::from_secs(60));
        assert_eq!(cache.get("genai_api_key").await.unwrap().as_deref(), Some("old"));

        cache.put("genai_api_key", "new").await.unwrap();
        assert_eq!(cache.get("genai_api_key").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let store = Arc::new(MemorySettings::new());
        store.put("toggle", "true").await.unwrap();

        let cache = SettingsCache::with_ttl(store.clone(), Duration::from_millis(10));
        let _ = cache.get("toggle").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = cache.get("toggle").await.unwrap();

        assert_eq!(store.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_key_is_cached_as_absent() {
        let store = Arc::new(MemorySettings::new());
        let cache = SettingsCache::with_ttl(store.clone(), Duration::from_secs(60));

        assert_eq!(cache.get("absent").await.unwrap(), None);
        assert_eq!(cache.get("absent").await.unwrap(), None);
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_non_empty_filters_blank_values() {
        let store = Arc::new(MemorySettings::new());
        store.put("places_api_key", "").await.unwrap();

        let cache = SettingsCache::with_ttl(store, Duration::from_secs(60));
        assert_eq!(cache.get_non_empty("places_api_key").await.unwrap(), None);
    }
}
