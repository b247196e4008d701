//! # Rate Config Repository
//!
//! Database operations for service-rate records.
//!
//! ## One Record Per Domain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  get_or_create(domain)                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT default ... ON CONFLICT(domain) DO NOTHING                      │
//! │       │   (concurrent first reads race here; the unique index picks    │
//! │       │    exactly one winner)                                          │
//! │       ▼                                                                 │
//! │  SELECT ... WHERE domain = ?  → the single authoritative record        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use expo_core::{RateConfig, ServiceDomain};

const RATE_COLUMNS: &str = "id, domain, rate_cents, shift_hours, created_at, updated_at";

/// Repository for rate config database operations.
#[derive(Debug, Clone)]
pub struct RateConfigRepository {
    pool: SqlitePool,
}

impl RateConfigRepository {
    /// Creates a new RateConfigRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RateConfigRepository { pool }
    }

    /// Gets the record of a domain, if one has been created.
    pub async fn get(&self, domain: ServiceDomain) -> DbResult<Option<RateConfig>> {
        let config = sqlx::query_as::<_, RateConfig>(&format!(
            "SELECT {RATE_COLUMNS} FROM rate_configs WHERE domain = ?1"
        ))
        .bind(domain)
        .fetch_optional(&self.pool)
        .await?;

        Ok(config)
    }

    /// Gets the record of a domain, creating it with the domain defaults
    /// on first access.
    pub async fn get_or_create(
        &self,
        domain: ServiceDomain,
        now: DateTime<Utc>,
    ) -> DbResult<RateConfig> {
        let default = RateConfig::default_for(domain, Uuid::new_v4().to_string(), now);

        let inserted = sqlx::query(
            r#"
            INSERT INTO rate_configs (id, domain, rate_cents, shift_hours, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(domain) DO NOTHING
            "#,
        )
        .bind(&default.id)
        .bind(default.domain)
        .bind(default.rate_cents)
        .bind(default.shift_hours)
        .bind(default.created_at)
        .bind(default.updated_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            info!(domain = %domain, rate_cents = default.rate_cents, "Created default rate config");
        }

        self.get(domain)
            .await?
            .ok_or_else(|| DbError::not_found("RateConfig", domain.as_str()))
    }

    /// Writes the rate and shift hours of a domain, creating the record
    /// if it doesn't exist yet.
    ///
    /// The record keeps its id and `created_at` across updates.
    pub async fn upsert(
        &self,
        domain: ServiceDomain,
        rate_cents: i64,
        shift_hours: Option<i64>,
        now: DateTime<Utc>,
    ) -> DbResult<RateConfig> {
        debug!(domain = %domain, rate_cents, ?shift_hours, "Upserting rate config");

        sqlx::query(
            r#"
            INSERT INTO rate_configs (id, domain, rate_cents, shift_hours, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(domain) DO UPDATE SET
                rate_cents = excluded.rate_cents,
                shift_hours = excluded.shift_hours,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(domain)
        .bind(rate_cents)
        .bind(shift_hours)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get(domain)
            .await?
            .ok_or_else(|| DbError::not_found("RateConfig", domain.as_str()))
    }

    /// Counts stored records.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rate_configs")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
