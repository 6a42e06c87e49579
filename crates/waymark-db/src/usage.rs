//! Usage-ledger repository implementation.
//!
//! Append-only: rows are inserted once and only ever read back for
//! aggregate reporting. No update or delete path exists.

use async_trait::async_trait;
use chrono::{Datelike, Duration, TimeZone, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use waymark_core::pricing::calculate_cost;
use waymark_core::{
    defaults, ApiUsageLog, Error, Result, ServiceCost, UsageEntry, UsagePeriod, UsageRepository,
    UsageSummary, UserCost,
};

/// PostgreSQL implementation of UsageRepository.
pub struct PgUsageRepository {
    pool: PgPool,
}

impl PgUsageRepository {
    /// Create a new PgUsageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Start of the reporting window for a period, in UTC.
    pub fn window_start(period: UsagePeriod) -> chrono::DateTime<Utc> {
        let now = Utc::now();
        match period {
            UsagePeriod::Day => Utc
                .with_ymd_and_hms(now.year(), now.month(), now.day(), 0, 0, 0)
                .single()
                .unwrap_or(now),
            UsagePeriod::Week => now - Duration::days(7),
            UsagePeriod::Month => Utc
                .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
                .single()
                .unwrap_or(now),
            UsagePeriod::Year => Utc
                .with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0)
                .single()
                .unwrap_or(now),
        }
    }

    fn parse_row(row: &sqlx::postgres::PgRow) -> ApiUsageLog {
        ApiUsageLog {
            id: row.get("id"),
            user_id: row.get("user_id"),
            location_id: row.get("location_id"),
            service: row.get("service"),
            operation: row.get("operation"),
            model: row.get("model"),
            input_tokens: row.get("input_tokens"),
            output_tokens: row.get("output_tokens"),
            audio_duration_seconds: row.get("audio_duration_seconds"),
            cost_usd: row.get("cost_usd"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl UsageRepository for PgUsageRepository {
    async fn record(&self, entry: UsageEntry) -> Result<()> {
        let cost_usd = calculate_cost(
            &entry.service,
            entry.model.as_deref(),
            entry.input_tokens,
            entry.output_tokens,
        );

        sqlx::query(
            "INSERT INTO api_usage_log (id, user_id, location_id, service, operation, model,
                 input_tokens, output_tokens, audio_duration_seconds, cost_usd, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(entry.location_id)
        .bind(&entry.service)
        .bind(&entry.operation)
        .bind(&entry.model)
        .bind(entry.input_tokens)
        .bind(entry.output_tokens)
        .bind(entry.audio_duration_seconds)
        .bind(cost_usd)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }

    async fn summary(
        &self,
        period: UsagePeriod,
        service: Option<&str>,
        user_id: Option<Uuid>,
    ) -> Result<UsageSummary> {
        let start = Self::window_start(period);

        let service_rows = sqlx::query(
            "SELECT service, SUM(cost_usd) AS cost, COUNT(*) AS count
             FROM api_usage_log
             WHERE created_at >= $1
               AND ($2::text IS NULL OR service = $2)
               AND ($3::uuid IS NULL OR user_id = $3)
             GROUP BY service
             ORDER BY cost DESC",
        )
        .bind(start)
        .bind(service)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let by_service: Vec<ServiceCost> = service_rows
            .iter()
            .map(|row| ServiceCost {
                service: row.get("service"),
                cost: row.get::<Option<f64>, _>("cost").unwrap_or(0.0),
                count: row.get("count"),
            })
            .collect();

        let user_rows = sqlx::query(
            "SELECT u.user_id, a.email, SUM(u.cost_usd) AS cost, COUNT(*) AS count
             FROM api_usage_log u
             LEFT JOIN app_user a ON a.id = u.user_id
             WHERE u.created_at >= $1
               AND ($2::text IS NULL OR u.service = $2)
               AND ($3::uuid IS NULL OR u.user_id = $3)
             GROUP BY u.user_id, a.email
             ORDER BY cost DESC",
        )
        .bind(start)
        .bind(service)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let by_user: Vec<UserCost> = user_rows
            .iter()
            .map(|row| UserCost {
                user_id: row.get("user_id"),
                email: row.get("email"),
                cost: row.get::<Option<f64>, _>("cost").unwrap_or(0.0),
                count: row.get("count"),
            })
            .collect();

        let total = by_service.iter().map(|s| s.cost).sum();

        Ok(UsageSummary {
            total,
            by_service,
            by_user,
        })
    }

    async fn list(
        &self,
        period: UsagePeriod,
        service: Option<&str>,
        user_id: Option<Uuid>,
        page: i64,
    ) -> Result<(Vec<ApiUsageLog>, i64)> {
        let start = Self::window_start(period);
        let page = page.max(1);
        let limit = defaults::USAGE_PAGE_SIZE;
        let offset = (page - 1) * limit;

        let rows = sqlx::query(
            "SELECT * FROM api_usage_log
             WHERE created_at >= $1
               AND ($2::text IS NULL OR service = $2)
               AND ($3::uuid IS NULL OR user_id = $3)
             ORDER BY created_at DESC
             LIMIT $4 OFFSET $5",
        )
        .bind(start)
        .bind(service)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM api_usage_log
             WHERE created_at >= $1
               AND ($2::text IS NULL OR service = $2)
               AND ($3::uuid IS NULL OR user_id = $3)",
        )
        .bind(start)
        .bind(service)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok((rows.iter().map(Self::parse_row).collect(), total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_window_start_orders() {
        let day = PgUsageRepository::window_start(UsagePeriod::Day);
        let week = PgUsageRepository::window_start(UsagePeriod::Week);
        let year = PgUsageRepository::window_start(UsagePeriod::Year);
        assert!(week <= day);
        assert!(year <= day);
    }

    #[test]
    fn test_month_window_starts_on_first() {
        let month = PgUsageRepository::window_start(UsagePeriod::Month);
        assert_eq!(month.day(), 1);
        assert_eq!(month.time().hour(), 0);
    }
}
