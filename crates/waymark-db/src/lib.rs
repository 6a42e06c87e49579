//! # waymark-db
//!
//! PostgreSQL database layer for waymark.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for all core entities
//! - The bounded-TTL system-settings cache
//! - Embedded schema migrations (feature `migrations`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use waymark_db::Database;
//! use waymark_core::{CreateTripRequest, TripRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/waymark").await?;
//!
//!     let trip = db.trips.create(user_id, CreateTripRequest {
//!         title: "Kyoto in May".to_string(),
//!         ..Default::default()
//!     }).await?;
//!
//!     println!("Created trip: {}", trip.id);
//!     Ok(())
//! }
//! ```

pub mod import_jobs;
pub mod locations;
pub mod pool;
pub mod settings;
pub mod tags;
pub mod trips;
pub mod usage;
pub mod users;

// Test fixtures for integration tests
// Note: always compiled so integration tests (in tests/) can use
// DEFAULT_TEST_DATABASE_URL.
pub mod test_fixtures;

// Re-export core types
pub use waymark_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// Re-export repository implementations
pub use import_jobs::PgImportJobRepository;
pub use locations::PgLocationRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use settings::{PgSettingsRepository, SettingsCache};
pub use tags::PgTagRepository;
pub use trips::{new_share_token, PgTripRepository};
pub use usage::PgUsageRepository;
pub use users::PgUserRepository;

use std::sync::Arc;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::PgPool,
    /// User lookup for API-key auth.
    pub users: Arc<PgUserRepository>,
    /// Trip repository for CRUD operations.
    pub trips: Arc<PgTripRepository>,
    /// Location repository for CRUD + enrichment writes.
    pub locations: Arc<PgLocationRepository>,
    /// Tag repository for normalization-aware tag management.
    pub tags: Arc<PgTagRepository>,
    /// Append-only usage ledger.
    pub usage: Arc<PgUsageRepository>,
    /// System settings with bounded-TTL read cache.
    pub settings: SettingsCache,
    /// Bulk-import progress tracking.
    pub import_jobs: Arc<PgImportJobRepository>,
}

impl Database {
    /// Connect with default pool configuration.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        Ok(Self::from_pool(pool))
    }

    /// Build the repository set over an existing pool.
    pub fn from_pool(pool: sqlx::PgPool) -> Self {
        let settings_repo: Arc<dyn SettingsRepository> =
            Arc::new(PgSettingsRepository::new(pool.clone()));
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            trips: Arc::new(PgTripRepository::new(pool.clone())),
            locations: Arc::new(PgLocationRepository::new(pool.clone())),
            tags: Arc::new(PgTagRepository::new(pool.clone())),
            usage: Arc::new(PgUsageRepository::new(pool.clone())),
            settings: SettingsCache::new(settings_repo),
            import_jobs: Arc::new(PgImportJobRepository::new(pool.clone())),
            pool,
        }
    }

    /// Run embedded migrations against the connected database.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Internal(format!("Migration failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
