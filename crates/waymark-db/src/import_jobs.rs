//! Import-job repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use waymark_core::{Error, ImportJob, ImportJobRepository, ImportStatus, Result};

/// PostgreSQL implementation of ImportJobRepository.
pub struct PgImportJobRepository {
    pool: PgPool,
}

impl PgImportJobRepository {
    /// Create a new PgImportJobRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn str_to_status(s: &str) -> ImportStatus {
        match s {
            "completed" => ImportStatus::Completed,
            "failed" => ImportStatus::Failed,
            _ => ImportStatus::Processing,
        }
    }

    fn parse_row(row: &sqlx::postgres::PgRow) -> ImportJob {
        let status: String = row.get("status");
        ImportJob {
            id: row.get("id"),
            user_id: row.get("user_id"),
            trip_id: row.get("trip_id"),
            source_type: row.get("source_type"),
            status: Self::str_to_status(&status),
            total_locations: row.get("total_locations"),
            processed_locations: row.get("processed_locations"),
            imported_locations: row.get("imported_locations"),
            error_message: row.get("error_message"),
            created_at: row.get("created_at"),
            completed_at: row.get("completed_at"),
        }
    }
}

#[async_trait]
impl ImportJobRepository for PgImportJobRepository {
    async fn create(&self, user_id: Uuid, trip_id: Uuid, source_type: &str) -> Result<ImportJob> {
        let row = sqlx::query(
            "INSERT INTO import_job (id, user_id, trip_id, source_type, status, created_at)
             VALUES ($1, $2, $3, $4, 'processing', $5)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(trip_id)
        .bind(source_type)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::parse_row(&row))
    }

    async fn set_total(&self, id: Uuid, total: i32) -> Result<()> {
        sqlx::query("UPDATE import_job SET total_locations = $2 WHERE id = $1")
            .bind(id)
            .bind(total)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn increment_processed(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE import_job SET processed_locations = processed_locations + 1 WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn finalize(
        &self,
        id: Uuid,
        status: ImportStatus,
        imported: i32,
        error_message: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE import_job SET status = $2, imported_locations = $3,
                 error_message = $4, completed_at = $5
             WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(imported)
        .bind(error_message)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<ImportJob> {
        let row = sqlx::query("SELECT * FROM import_job WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("import job {}", id)))?;
        Ok(Self::parse_row(&row))
    }
}
