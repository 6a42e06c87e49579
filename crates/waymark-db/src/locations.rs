//! Location repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use waymark_core::{
    defaults, CreateLocationRequest, Error, Location, LocationRepository, LocationSearchRequest,
    LocationWithTags, PlaceEnrichment, Result, Tag, TagCategory, UpdateLocationRequest,
};

use crate::escape_like;

/// PostgreSQL implementation of LocationRepository.
pub struct PgLocationRepository {
    pool: PgPool,
}

impl PgLocationRepository {
    /// Create a new PgLocationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_row(row: &sqlx::postgres::PgRow) -> Location {
        Location {
            id: row.get("id"),
            trip_id: row.get("trip_id"),
            user_id: row.get("user_id"),
            name: row.get("name"),
            latitude: row.get("latitude"),
            longitude: row.get("longitude"),
            address: row.get("address"),
            source_url: row.get("source_url"),
            url_title: row.get("url_title"),
            url_description: row.get("url_description"),
            url_image: row.get("url_image"),
            phone: row.get("phone"),
            hours: row.get("hours"),
            price_range: row.get("price_range"),
            rating: row.get("rating"),
            cuisine: row.get("cuisine"),
            reservation_url: row.get("reservation_url"),
            raw_transcription: row.get("raw_transcription"),
            polished_description: row.get("polished_description"),
            place_id: row.get("place_id"),
            place_rating: row.get("place_rating"),
            place_review_count: row.get("place_review_count"),
            place_types: row.get("place_types"),
            place_website: row.get("place_website"),
            place_phone: row.get("place_phone"),
            place_address: row.get("place_address"),
            places_enriched_at: row.get("places_enriched_at"),
            order_index: row.get("order_index"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    /// Load tags for each location id, preserving the input ordering.
    async fn with_tags(&self, locations: Vec<Location>) -> Result<Vec<LocationWithTags>> {
        let ids: Vec<Uuid> = locations.iter().map(|l| l.id).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT lt.location_id, t.id, t.name, t.category, t.usage_count,
                    t.created_by_llm, t.is_active, t.created_at
             FROM location_tag lt
             JOIN tag t ON t.id = lt.tag_id
             WHERE lt.location_id = ANY($1)
             ORDER BY t.name",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut by_location: std::collections::HashMap<Uuid, Vec<Tag>> =
            std::collections::HashMap::new();
        for row in rows {
            let location_id: Uuid = row.get("location_id");
            let category: String = row.get("category");
            by_location.entry(location_id).or_default().push(Tag {
                id: row.get("id"),
                name: row.get("name"),
                category: TagCategory::parse_lenient(&category),
                usage_count: row.get("usage_count"),
                created_by_llm: row.get("created_by_llm"),
                is_active: row.get("is_active"),
                created_at: row.get("created_at"),
            });
        }

        Ok(locations
            .into_iter()
            .map(|location| {
                let tags = by_location.remove(&location.id).unwrap_or_default();
                LocationWithTags { location, tags }
            })
            .collect())
    }

    async fn fetch_one(&self, id: Uuid) -> Result<Location> {
        let row = sqlx::query("SELECT * FROM location WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::LocationNotFound(id))?;
        Ok(Self::parse_row(&row))
    }
}

#[async_trait]
impl LocationRepository for PgLocationRepository {
    async fn insert(&self, req: CreateLocationRequest) -> Result<Location> {
        if req.name.trim().is_empty() {
            return Err(Error::InvalidInput("Location name is required".to_string()));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        let row = sqlx::query(
            "INSERT INTO location (id, trip_id, user_id, name, latitude, longitude, address,
                 source_url, url_title, url_description, url_image, phone, hours, price_range,
                 rating, cuisine, reservation_url, raw_transcription, order_index,
                 created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                 $17, $18,
                 (SELECT COALESCE(MAX(order_index), 0) + 1 FROM location WHERE trip_id = $2),
                 $19, $19)
             RETURNING *",
        )
        .bind(id)
        .bind(req.trip_id)
        .bind(req.user_id)
        .bind(req.name.trim())
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(&req.address)
        .bind(&req.source_url)
        .bind(&req.url_title)
        .bind(&req.url_description)
        .bind(&req.url_image)
        .bind(&req.phone)
        .bind(&req.hours)
        .bind(&req.price_range)
        .bind(&req.rating)
        .bind(&req.cuisine)
        .bind(&req.reservation_url)
        .bind(&req.raw_transcription)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::parse_row(&row))
    }

    async fn fetch(&self, id: Uuid, user_id: Uuid) -> Result<LocationWithTags> {
        let row = sqlx::query("SELECT * FROM location WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::LocationNotFound(id))?;

        let location = Self::parse_row(&row);
        let mut with_tags = self.with_tags(vec![location]).await?;
        with_tags
            .pop()
            .ok_or_else(|| Error::Internal("location vanished while loading tags".to_string()))
    }

    async fn list_for_trip(&self, trip_id: Uuid) -> Result<Vec<LocationWithTags>> {
        let rows = sqlx::query("SELECT * FROM location WHERE trip_id = $1 ORDER BY order_index")
            .bind(trip_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let locations = rows.iter().map(Self::parse_row).collect();
        self.with_tags(locations).await
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<LocationWithTags>> {
        let rows =
            sqlx::query("SELECT * FROM location WHERE user_id = $1 ORDER BY created_at DESC")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;

        let locations = rows.iter().map(Self::parse_row).collect();
        self.with_tags(locations).await
    }

    async fn search(&self, req: LocationSearchRequest) -> Result<Vec<LocationWithTags>> {
        // Dynamic filters are numbered after the fixed user_id bind.
        let mut sql = String::from(
            "SELECT DISTINCT l.*
             FROM location l
             LEFT JOIN location_tag lt ON lt.location_id = l.id
             LEFT JOIN tag t ON t.id = lt.tag_id
             WHERE l.user_id = $1",
        );

        let pattern = req
            .query
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .map(|q| format!("%{}%", escape_like(q.trim())));

        let mut idx = 1;
        let pattern_idx = pattern.as_ref().map(|_| {
            idx += 1;
            idx
        });
        let trip_idx = req.trip_id.map(|_| {
            idx += 1;
            idx
        });
        let tags_idx = if req.tag_names.is_empty() {
            None
        } else {
            idx += 1;
            Some(idx)
        };

        if let Some(i) = pattern_idx {
            sql.push_str(&format!(
                " AND (l.name ILIKE ${i} OR l.polished_description ILIKE ${i}
                   OR l.raw_transcription ILIKE ${i} OR l.address ILIKE ${i})"
            ));
        }
        if let Some(i) = trip_idx {
            sql.push_str(&format!(" AND l.trip_id = ${i}"));
        }
        if let Some(i) = tags_idx {
            sql.push_str(&format!(" AND t.name = ANY(${i})"));
        }
        sql.push_str(&format!(
            " ORDER BY l.created_at DESC LIMIT {}",
            defaults::SEARCH_RESULT_LIMIT
        ));

        let mut query = sqlx::query(&sql).bind(req.user_id);
        if let Some(p) = &pattern {
            query = query.bind(p);
        }
        if let Some(trip_id) = req.trip_id {
            query = query.bind(trip_id);
        }
        if !req.tag_names.is_empty() {
            query = query.bind(&req.tag_names);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(Error::Database)?;
        let locations = rows.iter().map(Self::parse_row).collect();
        self.with_tags(locations).await
    }

    async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        req: UpdateLocationRequest,
    ) -> Result<LocationWithTags> {
        let current = self.fetch(id, user_id).await?.location;

        sqlx::query(
            "UPDATE location SET
                 name = $2, latitude = $3, longitude = $4, address = $5, source_url = $6,
                 raw_transcription = $7, polished_description = $8, order_index = $9,
                 updated_at = $10
             WHERE id = $1",
        )
        .bind(id)
        .bind(req.name.unwrap_or(current.name))
        .bind(req.latitude.unwrap_or(current.latitude))
        .bind(req.longitude.unwrap_or(current.longitude))
        .bind(req.address.or(current.address))
        .bind(req.source_url.or(current.source_url))
        .bind(req.raw_transcription.or(current.raw_transcription))
        .bind(req.polished_description.or(current.polished_description))
        .bind(req.order_index.unwrap_or(current.order_index))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        // Full tag-set replacement, keeping usage counts honest in the
        // same transaction.
        if let Some(tag_ids) = req.tag_ids {
            let mut tx = self.pool.begin().await.map_err(Error::Database)?;

            sqlx::query("DELETE FROM location_tag WHERE location_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;

            for tag_id in &tag_ids {
                sqlx::query(
                    "INSERT INTO location_tag (location_id, tag_id) VALUES ($1, $2)
                     ON CONFLICT DO NOTHING",
                )
                .bind(id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;
            }

            sqlx::query(
                "UPDATE tag SET usage_count =
                     (SELECT COUNT(*) FROM location_tag WHERE tag_id = tag.id)",
            )
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

            tx.commit().await.map_err(Error::Database)?;
        }

        self.fetch(id, user_id).await
    }

    async fn set_resolved(
        &self,
        id: Uuid,
        latitude: f64,
        longitude: f64,
        address: Option<&str>,
        raw_transcription: Option<&str>,
        polished_description: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE location SET
                 latitude = $2,
                 longitude = $3,
                 address = COALESCE($4, address),
                 raw_transcription = COALESCE($5, raw_transcription),
                 polished_description = COALESCE($6, polished_description),
                 updated_at = $7
             WHERE id = $1",
        )
        .bind(id)
        .bind(latitude)
        .bind(longitude)
        .bind(address)
        .bind(raw_transcription)
        .bind(polished_description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::LocationNotFound(id));
        }
        Ok(())
    }

    async fn apply_enrichment(
        &self,
        id: Uuid,
        enrichment: &PlaceEnrichment,
        enriched_at: DateTime<Utc>,
    ) -> Result<()> {
        // Places data takes priority over scraped fields; scraped values
        // survive only where enrichment has nothing.
        let result = sqlx::query(
            "UPDATE location SET
                 place_id = $2,
                 place_rating = $3,
                 place_review_count = $4,
                 place_types = $5,
                 place_website = $6,
                 place_phone = $7,
                 place_address = $8,
                 phone = COALESCE($7, phone),
                 address = COALESCE($8, address),
                 hours = COALESCE($9, hours),
                 price_range = COALESCE($10, price_range),
                 places_enriched_at = $11,
                 updated_at = $11
             WHERE id = $1",
        )
        .bind(id)
        .bind(&enrichment.place_id)
        .bind(enrichment.rating)
        .bind(enrichment.review_count)
        .bind(&enrichment.types)
        .bind(&enrichment.website)
        .bind(&enrichment.phone)
        .bind(&enrichment.formatted_address)
        .bind(&enrichment.hours)
        .bind(&enrichment.price_range)
        .bind(enriched_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::LocationNotFound(id));
        }
        Ok(())
    }

    async fn set_transcription(
        &self,
        id: Uuid,
        raw_transcription: &str,
        polished_description: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE location SET
                 raw_transcription = $2,
                 polished_description = COALESCE($3, polished_description),
                 updated_at = $4
             WHERE id = $1",
        )
        .bind(id)
        .bind(raw_transcription)
        .bind(polished_description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::LocationNotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        // Ensure the row belongs to the user before mutating anything.
        let _ = self.fetch_one(id).await?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let result = sqlx::query("DELETE FROM location WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::LocationNotFound(id));
        }

        // The cascade removed the join rows; bring counts back in line.
        sqlx::query(
            "UPDATE tag SET usage_count =
                 (SELECT COUNT(*) FROM location_tag WHERE tag_id = tag.id)",
        )
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }
}
