use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::{
    domain::{cents_to_dollars, PricingEntry, ServiceType},
    error::{AppError, Result},
};

#[derive(FromRow)]
struct PricingRow {
    service_type: String,
    key: String,
    price_cents: i64,
    updated_at: NaiveDateTime,
}

#[async_trait]
pub trait PricingRepository: Send + Sync {
    async fn find(&self, service_type: ServiceType, key: &str) -> Result<Option<PricingEntry>>;
    async fn upsert(&self, service_type: ServiceType, key: &str, price_cents: i64) -> Result<PricingEntry>;
    async fn list(&self, service_type: Option<ServiceType>) -> Result<Vec<PricingEntry>>;
}

pub struct SqlitePricingRepository {
    pool: SqlitePool,
}

impl SqlitePricingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_entry(row: PricingRow) -> Result<PricingEntry> {
        Ok(PricingEntry {
            service_type: ServiceType::from_str(&row.service_type).ok_or_else(|| {
                AppError::Database(format!("Invalid service type: {}", row.service_type))
            })?,
            key: row.key,
            price_cents: row.price_cents,
            price_dollars: cents_to_dollars(row.price_cents),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl PricingRepository for SqlitePricingRepository {
    async fn find(&self, service_type: ServiceType, key: &str) -> Result<Option<PricingEntry>> {
        let row = sqlx::query_as::<_, PricingRow>(
            r#"
            SELECT service_type, key, price_cents, updated_at
            FROM pricing
            WHERE service_type = ? AND key = ?
            "#,
        )
        .bind(service_type.as_str())
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_entry(r)?)),
            None => Ok(None),
        }
    }

    async fn upsert(&self, service_type: ServiceType, key: &str, price_cents: i64) -> Result<PricingEntry> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO pricing (service_type, key, price_cents, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (service_type, key)
            DO UPDATE SET price_cents = excluded.price_cents,
                          updated_at = excluded.updated_at
            "#,
        )
        .bind(service_type.as_str())
        .bind(key)
        .bind(price_cents)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find(service_type, key)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve saved price".to_string()))
    }

    async fn list(&self, service_type: Option<ServiceType>) -> Result<Vec<PricingEntry>> {
        let rows = match service_type {
            Some(service_type) => {
                sqlx::query_as::<_, PricingRow>(
                    r#"
                    SELECT service_type, key, price_cents, updated_at
                    FROM pricing
                    WHERE service_type = ?
                    ORDER BY service_type ASC, key ASC
                    "#,
                )
                .bind(service_type.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, PricingRow>(
                    r#"
                    SELECT service_type, key, price_cents, updated_at
                    FROM pricing
                    ORDER BY service_type ASC, key ASC
                    "#,
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_entry).collect()
    }
}
