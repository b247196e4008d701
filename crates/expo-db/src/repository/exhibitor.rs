//! # Exhibitor Repository
//!
//! Exhibitors are the companies invoices are billed to. The invoice only
//! keeps a soft `exhibitor_id`; rendering looks the contact up here.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use expo_core::Exhibitor;

const EXHIBITOR_COLUMNS: &str = "id, company, contact_name, email, phone, created_at";

/// Repository for exhibitor database operations.
#[derive(Debug, Clone)]
pub struct ExhibitorRepository {
    pool: SqlitePool,
}

impl ExhibitorRepository {
    /// Creates a new ExhibitorRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExhibitorRepository { pool }
    }

    /// Gets an exhibitor by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Exhibitor>> {
        let exhibitor = sqlx::query_as::<_, Exhibitor>(&format!(
            "SELECT {EXHIBITOR_COLUMNS} FROM exhibitors WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(exhibitor)
    }

    /// Inserts a new exhibitor.
    pub async fn insert(&self, exhibitor: &Exhibitor) -> DbResult<Exhibitor> {
        debug!(id = %exhibitor.id, company = %exhibitor.company, "Inserting exhibitor");

        sqlx::query(
            r#"
            INSERT INTO exhibitors (id, company, contact_name, email, phone, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&exhibitor.id)
        .bind(&exhibitor.company)
        .bind(&exhibitor.contact_name)
        .bind(&exhibitor.email)
        .bind(&exhibitor.phone)
        .bind(exhibitor.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&exhibitor.id))?;

        Ok(exhibitor.clone())
    }
}
