//! Trip repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use waymark_core::{
    defaults, CreateTripRequest, Error, LocationPreview, Result, Trip, TripRepository,
    TripSummary, UpdateTripRequest,
};

/// Generate an opaque 16-character share token.
///
/// Hex characters of a v4 UUID with the dashes stripped; long enough to be
/// unguessable for read-only sharing, short enough to paste into a URL.
pub fn new_share_token() -> String {
    Uuid::new_v4().simple().to_string()[..16].to_string()
}

/// PostgreSQL implementation of TripRepository.
pub struct PgTripRepository {
    pool: PgPool,
}

impl PgTripRepository {
    /// Create a new PgTripRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_row(row: sqlx::postgres::PgRow) -> Trip {
        Trip {
            id: row.get("id"),
            user_id: row.get("user_id"),
            title: row.get("title"),
            description: row.get("description"),
            share_token: row.get("share_token"),
            home_base_address: row.get("home_base_address"),
            home_base_url: row.get("home_base_url"),
            home_base_latitude: row.get("home_base_latitude"),
            home_base_longitude: row.get("home_base_longitude"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl TripRepository for PgTripRepository {
    async fn create(&self, user_id: Uuid, req: CreateTripRequest) -> Result<Trip> {
        if req.title.trim().is_empty() {
            return Err(Error::InvalidInput("Title is required".to_string()));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        let share_token = new_share_token();

        let row = sqlx::query(
            "INSERT INTO trip (id, user_id, title, description, share_token,
                 home_base_address, home_base_url, home_base_latitude, home_base_longitude,
                 created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
             RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .bind(req.title.trim())
        .bind(&req.description)
        .bind(&share_token)
        .bind(&req.home_base_address)
        .bind(&req.home_base_url)
        .bind(req.home_base_latitude)
        .bind(req.home_base_longitude)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::parse_row(row))
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<TripSummary>> {
        let rows = sqlx::query(
            "SELECT t.*, COUNT(l.id) AS location_count
             FROM trip t
             LEFT JOIN location l ON l.trip_id = t.id
             WHERE t.user_id = $1
             GROUP BY t.id
             ORDER BY t.updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let location_count: i64 = row.get("location_count");
            let trip = Self::parse_row(row);

            let preview_rows = sqlx::query(
                "SELECT id, name, url_image FROM location
                 WHERE trip_id = $1
                 ORDER BY order_index ASC
                 LIMIT $2",
            )
            .bind(trip.id)
            .bind(defaults::TRIP_PREVIEW_LOCATIONS)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

            let preview_locations = preview_rows
                .into_iter()
                .map(|r| LocationPreview {
                    id: r.get("id"),
                    name: r.get("name"),
                    url_image: r.get("url_image"),
                })
                .collect();

            summaries.push(TripSummary {
                trip,
                location_count,
                preview_locations,
            });
        }

        Ok(summaries)
    }

    async fn get(&self, id: Uuid, user_id: Uuid) -> Result<Trip> {
        let row = sqlx::query("SELECT * FROM trip WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::TripNotFound(id))?;

        Ok(Self::parse_row(row))
    }

    async fn get_by_share_token(&self, token: &str) -> Result<Trip> {
        let row = sqlx::query("SELECT * FROM trip WHERE share_token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound("trip".to_string()))?;

        Ok(Self::parse_row(row))
    }

    async fn update(&self, id: Uuid, user_id: Uuid, req: UpdateTripRequest) -> Result<Trip> {
        // Ownership check first so an update against someone else's trip
        // reads as not-found, not as a silent no-op.
        let current = self.get(id, user_id).await?;

        let row = sqlx::query(
            "UPDATE trip SET
                 title = $3,
                 description = $4,
                 home_base_address = $5,
                 home_base_url = $6,
                 home_base_latitude = $7,
                 home_base_longitude = $8,
                 updated_at = $9
             WHERE id = $1 AND user_id = $2
             RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .bind(req.title.unwrap_or(current.title))
        .bind(req.description.or(current.description))
        .bind(req.home_base_address.or(current.home_base_address))
        .bind(req.home_base_url.or(current.home_base_url))
        .bind(req.home_base_latitude.or(current.home_base_latitude))
        .bind(req.home_base_longitude.or(current.home_base_longitude))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::parse_row(row))
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM trip WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::TripNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_token_shape() {
        let token = new_share_token();
        assert_eq!(token.len(), 16);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_share_tokens_are_unique() {
        let a = new_share_token();
        let b = new_share_token();
        assert_ne!(a, b);
    }
}
