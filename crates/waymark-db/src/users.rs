//! User repository implementation.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use waymark_core::{Error, Result, User, UserRepository};

/// PostgreSQL implementation of UserRepository.
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> User {
        User {
            id: row.get("id"),
            email: row.get("email"),
            display_name: row.get("display_name"),
            api_key: row.get("api_key"),
            is_admin: row.get("is_admin"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, display_name, api_key, is_admin, created_at
             FROM app_user WHERE api_key = $1",
        )
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_row))
    }

    async fn get(&self, id: Uuid) -> Result<User> {
        let row = sqlx::query(
            "SELECT id, email, display_name, api_key, is_admin, created_at
             FROM app_user WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("user {}", id)))?;

        Ok(Self::parse_row(row))
    }
}
