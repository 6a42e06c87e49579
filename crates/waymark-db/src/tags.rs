//! Tag repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use waymark_core::{
    normalize_tag_name, validate_tag_name, Error, ListTagsRequest, Result, Tag, TagCategory,
    TagDeleteOutcome, TagMergeResult, TagRepository, TagSuggestion, UpdateTagRequest,
};

use crate::escape_like;

/// PostgreSQL implementation of TagRepository.
pub struct PgTagRepository {
    pool: PgPool,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_row(row: &sqlx::postgres::PgRow) -> Tag {
        let category: String = row.get("category");
        Tag {
            id: row.get("id"),
            name: row.get("name"),
            category: TagCategory::parse_lenient(&category),
            usage_count: row.get("usage_count"),
            created_by_llm: row.get("created_by_llm"),
            is_active: row.get("is_active"),
            created_at: row.get("created_at"),
        }
    }

    async fn fetch_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<Tag> {
        let row = sqlx::query("SELECT * FROM tag WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::TagNotFound(id))?;
        Ok(Self::parse_row(&row))
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn create(&self, name: &str, category: TagCategory, created_by_llm: bool) -> Result<Tag> {
        let normalized = normalize_tag_name(name);
        validate_tag_name(&normalized).map_err(Error::InvalidInput)?;

        let existing =
            sqlx::query("SELECT id FROM tag WHERE LOWER(name) = LOWER($1)")
                .bind(&normalized)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;
        if existing.is_some() {
            return Err(Error::InvalidInput(format!(
                "Tag already exists: {}",
                normalized
            )));
        }

        let row = sqlx::query(
            "INSERT INTO tag (id, name, category, usage_count, created_by_llm, is_active, created_at)
             VALUES ($1, $2, $3, 0, $4, TRUE, $5)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&normalized)
        .bind(category.as_str())
        .bind(created_by_llm)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::parse_row(&row))
    }

    async fn list(&self, req: ListTagsRequest) -> Result<Vec<Tag>> {
        let mut sql = String::from("SELECT * FROM tag WHERE TRUE");
        let mut idx = 0;

        let category_idx = req.category.map(|_| {
            idx += 1;
            idx
        });
        let search = req
            .search
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| format!("%{}%", escape_like(s.trim())));
        let search_idx = search.as_ref().map(|_| {
            idx += 1;
            idx
        });

        if let Some(i) = category_idx {
            sql.push_str(&format!(" AND category = ${i}"));
        }
        if let Some(i) = search_idx {
            sql.push_str(&format!(" AND name ILIKE ${i}"));
        }
        if !req.include_inactive {
            sql.push_str(" AND is_active = TRUE");
        }
        sql.push_str(" ORDER BY category ASC, usage_count DESC, name ASC");

        let mut query = sqlx::query(&sql);
        if let Some(category) = req.category {
            query = query.bind(category.as_str());
        }
        if let Some(pattern) = &search {
            query = query.bind(pattern);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(Error::Database)?;
        Ok(rows.iter().map(Self::parse_row).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Tag> {
        let row = sqlx::query("SELECT * FROM tag WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::TagNotFound(id))?;
        Ok(Self::parse_row(&row))
    }

    async fn update(&self, id: Uuid, req: UpdateTagRequest) -> Result<Tag> {
        let current = self.get(id).await?;

        let name = match req.name {
            Some(raw) => {
                let normalized = normalize_tag_name(&raw);
                validate_tag_name(&normalized).map_err(Error::InvalidInput)?;
                normalized
            }
            None => current.name,
        };

        let row = sqlx::query(
            "UPDATE tag SET name = $2, category = $3, is_active = $4
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&name)
        .bind(req.category.unwrap_or(current.category).as_str())
        .bind(req.is_active.unwrap_or(current.is_active))
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Self::parse_row(&row))
    }

    async fn resolve_suggestions(&self, suggestions: &[TagSuggestion]) -> Result<Vec<Uuid>> {
        let mut tag_ids = Vec::with_capacity(suggestions.len());

        for suggestion in suggestions {
            let normalized = normalize_tag_name(&suggestion.name);
            if validate_tag_name(&normalized).is_err() {
                // A malformed model suggestion costs one tag, not the pass.
                continue;
            }

            let existing = sqlx::query("SELECT id FROM tag WHERE LOWER(name) = LOWER($1)")
                .bind(&normalized)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;

            let id = match existing {
                Some(row) => row.get("id"),
                None => {
                    let id = Uuid::new_v4();
                    sqlx::query(
                        "INSERT INTO tag (id, name, category, usage_count, created_by_llm, is_active, created_at)
                         VALUES ($1, $2, $3, 0, TRUE, TRUE, $4)",
                    )
                    .bind(id)
                    .bind(&normalized)
                    .bind(suggestion.category.as_str())
                    .bind(Utc::now())
                    .execute(&self.pool)
                    .await
                    .map_err(Error::Database)?;
                    id
                }
            };

            if !tag_ids.contains(&id) {
                tag_ids.push(id);
            }
        }

        Ok(tag_ids)
    }

    async fn attach_to_location(&self, location_id: Uuid, tag_ids: &[Uuid]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        for tag_id in tag_ids {
            let result = sqlx::query(
                "INSERT INTO location_tag (location_id, tag_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(location_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

            if result.rows_affected() > 0 {
                sqlx::query("UPDATE tag SET usage_count = usage_count + 1 WHERE id = $1")
                    .bind(tag_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(Error::Database)?;
            }
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn set_for_location(&self, location_id: Uuid, tag_ids: &[Uuid]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query("DELETE FROM location_tag WHERE location_id = $1")
            .bind(location_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        for tag_id in tag_ids {
            sqlx::query(
                "INSERT INTO location_tag (location_id, tag_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(location_id)
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
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<TagDeleteOutcome> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let _ = Self::fetch_tx(&mut tx, id).await?;

        let usage: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM location_tag WHERE tag_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .map_err(Error::Database)?;

        let outcome = if usage > 0 {
            sqlx::query("UPDATE tag SET is_active = FALSE WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;
            TagDeleteOutcome::SoftDeleted
        } else {
            sqlx::query("DELETE FROM tag WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;
            TagDeleteOutcome::HardDeleted
        };

        tx.commit().await.map_err(Error::Database)?;
        Ok(outcome)
    }

    async fn merge(&self, source_id: Uuid, target_id: Uuid) -> Result<TagMergeResult> {
        if source_id == target_id {
            return Err(Error::InvalidInput(
                "Cannot merge a tag with itself".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Both tags must exist before anything moves.
        let _ = Self::fetch_tx(&mut tx, source_id).await?;
        let _ = Self::fetch_tx(&mut tx, target_id).await?;

        let merged_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM location_tag WHERE tag_id = $1")
                .bind(source_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(Error::Database)?;

        // Move associations onto the target, dropping ones that would
        // duplicate an existing target association.
        sqlx::query(
            "INSERT INTO location_tag (location_id, tag_id)
             SELECT location_id, $2 FROM location_tag WHERE tag_id = $1
             ON CONFLICT DO NOTHING",
        )
        .bind(source_id)
        .bind(target_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        sqlx::query("DELETE FROM location_tag WHERE tag_id = $1")
            .bind(source_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        sqlx::query(
            "UPDATE tag SET usage_count =
                 (SELECT COUNT(*) FROM location_tag WHERE tag_id = $1)
             WHERE id = $1",
        )
        .bind(target_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        sqlx::query("DELETE FROM tag WHERE id = $1")
            .bind(source_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        let target = Self::fetch_tx(&mut tx, target_id).await?;
        tx.commit().await.map_err(Error::Database)?;

        Ok(TagMergeResult {
            merged_count,
            target,
        })
    }

    async fn recompute_usage_counts(&self) -> Result<()> {
        sqlx::query(
            "UPDATE tag SET usage_count =
                 (SELECT COUNT(*) FROM location_tag WHERE tag_id = tag.id)",
        )
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }
}
