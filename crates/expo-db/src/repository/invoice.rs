//! # Invoice Repository
//!
//! Database operations for invoices.
//!
//! ## Key Operations
//! - Latest number lookup for the number generator
//! - Filtered, paginated listing
//! - CRUD (the invoice number column is written once, on insert)
//! - Grouped statistics
//!
//! ## Items Column
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  invoices.items  TEXT                                                   │
//! │                                                                         │
//! │  [{"description":"Booth","quantity":2,"unitAmountCents":50000}, ...]    │
//! │                                                                         │
//! │  Ordered; written and read whole with serde_json.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use expo_core::{Invoice, InvoiceItem, InvoiceQuery, InvoiceStats, InvoiceStatus, StatusTotal};

const INVOICE_COLUMNS: &str = "id, invoice_number, status, company, exhibitor_id, \
     issue_date, due_date, amount_cents, items, notes, paid_date, payment_id, \
     created_at, updated_at";

/// Raw `invoices` row; `items` is still JSON text.
#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    invoice_number: String,
    status: InvoiceStatus,
    company: String,
    exhibitor_id: Option<String>,
    issue_date: DateTime<Utc>,
    due_date: DateTime<Utc>,
    amount_cents: i64,
    items: String,
    notes: Option<String>,
    paid_date: Option<DateTime<Utc>>,
    payment_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DbError;

    fn try_from(row: InvoiceRow) -> DbResult<Self> {
        let items: Vec<InvoiceItem> =
            serde_json::from_str(&row.items).map_err(|e| DbError::InvalidData {
                entity: "Invoice".to_string(),
                reason: format!("items of {}: {}", row.invoice_number, e),
            })?;

        Ok(Invoice {
            id: row.id,
            invoice_number: row.invoice_number,
            status: row.status,
            company: row.company,
            exhibitor_id: row.exhibitor_id,
            issue_date: row.issue_date,
            due_date: row.due_date,
            amount_cents: row.amount_cents,
            items,
            notes: row.notes,
            paid_date: row.paid_date,
            payment_id: row.payment_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn encode_items(invoice: &Invoice) -> DbResult<String> {
    serde_json::to_string(&invoice.items).map_err(|e| DbError::InvalidData {
        entity: "Invoice".to_string(),
        reason: e.to_string(),
    })
}

/// Escapes LIKE wildcards so user input matches literally (`ESCAPE '\'`).
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Appends the WHERE clause shared by the list and count queries.
fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &InvoiceQuery, now: DateTime<Utc>) {
    qb.push(" WHERE 1 = 1");

    if let Some(term) = query.search_term() {
        let pattern = like_pattern(term);
        qb.push(" AND (LOWER(invoice_number) LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR LOWER(company) LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }

    match query.status {
        Some(InvoiceStatus::Overdue) => {
            qb.push(" AND status = 'pending' AND due_date < ")
                .push_bind(now);
        }
        Some(status) => {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        None => {}
    }

    if let Some(exhibitor_id) = &query.exhibitor_id {
        qb.push(" AND exhibitor_id = ").push_bind(exhibitor_id.clone());
    }
    if let Some(from) = query.due_from {
        qb.push(" AND due_date >= ").push_bind(from);
    }
    if let Some(to) = query.due_to {
        qb.push(" AND due_date <= ").push_bind(to);
    }
}

/// Repository for invoice database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = InvoiceRepository::new(pool);
///
/// let latest = repo.latest_number_with_prefix("INV-202610-").await?;
/// let (items, total) = repo.list(&InvoiceQuery::default(), Utc::now()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Gets an invoice by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Invoice))` - Invoice found
    /// * `Ok(None)` - Invoice not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let row: Option<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Invoice::try_from).transpose()
    }

    /// Returns the highest invoice number starting with `prefix`.
    ///
    /// Sequences are zero-padded to a minimum width, so a longer number is a
    /// larger sequence and equal lengths compare as text. Creation time only
    /// breaks exact ties. The result never depends on clock order, so a row
    /// stamped earlier than a lower-numbered one cannot hide the maximum.
    pub async fn latest_number_with_prefix(&self, prefix: &str) -> DbResult<Option<String>> {
        debug!(prefix = %prefix, "Looking up latest invoice number");

        let number: Option<String> = sqlx::query_scalar(
            r#"
            SELECT invoice_number
            FROM invoices
            WHERE substr(invoice_number, 1, length(?1)) = ?1
            ORDER BY length(invoice_number) DESC, invoice_number DESC, created_at DESC
            LIMIT 1
            "#,
        )
        .bind(prefix)
        .fetch_optional(&self.pool)
        .await?;

        Ok(number)
    }

    /// Inserts a new invoice.
    ///
    /// ## Returns
    /// * `Ok(Invoice)` - Inserted invoice
    /// * `Err(DbError::UniqueViolation)` - Invoice number already taken
    pub async fn insert(&self, invoice: &Invoice) -> DbResult<Invoice> {
        debug!(invoice_number = %invoice.invoice_number, "Inserting invoice");

        let items = encode_items(invoice)?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number, status, company, exhibitor_id,
                issue_date, due_date, amount_cents, items, notes,
                paid_date, payment_id, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14
            )
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.invoice_number)
        .bind(invoice.status)
        .bind(&invoice.company)
        .bind(&invoice.exhibitor_id)
        .bind(invoice.issue_date)
        .bind(invoice.due_date)
        .bind(invoice.amount_cents)
        .bind(items)
        .bind(&invoice.notes)
        .bind(invoice.paid_date)
        .bind(&invoice.payment_id)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&invoice.invoice_number))?;

        Ok(invoice.clone())
    }

    /// Updates an existing invoice.
    ///
    /// `invoice_number` and `created_at` are never written here.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Invoice doesn't exist
    pub async fn update(&self, invoice: &Invoice) -> DbResult<()> {
        debug!(id = %invoice.id, "Updating invoice");

        let items = encode_items(invoice)?;

        let result = sqlx::query(
            r#"
            UPDATE invoices SET
                status = ?2,
                company = ?3,
                exhibitor_id = ?4,
                issue_date = ?5,
                due_date = ?6,
                amount_cents = ?7,
                items = ?8,
                notes = ?9,
                paid_date = ?10,
                payment_id = ?11,
                updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(&invoice.id)
        .bind(invoice.status)
        .bind(&invoice.company)
        .bind(&invoice.exhibitor_id)
        .bind(invoice.issue_date)
        .bind(invoice.due_date)
        .bind(invoice.amount_cents)
        .bind(items)
        .bind(&invoice.notes)
        .bind(invoice.paid_date)
        .bind(&invoice.payment_id)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", &invoice.id));
        }

        Ok(())
    }

    /// Deletes an invoice.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Invoice doesn't exist
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting invoice");

        let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        Ok(())
    }

    /// Lists invoices matching `query`, ordered by due date ascending.
    ///
    /// ## Returns
    /// The requested page and the number of rows matching the filters.
    pub async fn list(
        &self,
        query: &InvoiceQuery,
        now: DateTime<Utc>,
    ) -> DbResult<(Vec<Invoice>, i64)> {
        debug!(
            page = query.page(),
            limit = query.limit(),
            status = ?query.status,
            "Listing invoices"
        );

        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM invoices");
        push_filters(&mut count_qb, query, now);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut select_qb =
            QueryBuilder::<Sqlite>::new(format!("SELECT {INVOICE_COLUMNS} FROM invoices"));
        push_filters(&mut select_qb, query, now);
        select_qb
            .push(" ORDER BY due_date ASC, created_at ASC LIMIT ")
            .push_bind(query.limit())
            .push(" OFFSET ")
            .push_bind(query.offset());

        let rows: Vec<InvoiceRow> = select_qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        let invoices = rows
            .into_iter()
            .map(Invoice::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        debug!(count = invoices.len(), total, "List returned invoices");
        Ok((invoices, total))
    }

    /// Count and amount sum grouped by stored status, plus the overdue slice.
    pub async fn stats(&self, now: DateTime<Utc>) -> DbResult<InvoiceStats> {
        let groups: Vec<(InvoiceStatus, i64, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*), COALESCE(SUM(amount_cents), 0)
            FROM invoices
            GROUP BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let (overdue_count, overdue_total): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(amount_cents), 0)
            FROM invoices
            WHERE status = 'pending' AND due_date < ?1
            "#,
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(InvoiceStats::from_groups(
            groups
                .into_iter()
                .map(|(status, count, total)| (status, StatusTotal::new(count, total))),
            StatusTotal::new(overdue_count, overdue_total),
        ))
    }

    /// Counts all invoices (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{Duration, TimeZone};
    use expo_core::NewInvoice;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn invoice(number: &str, company: &str, due_in_days: i64, created: DateTime<Utc>) -> Invoice {
        NewInvoice {
            company: company.to_string(),
            exhibitor_id: None,
            issue_date: None,
            due_date: now() + Duration::days(due_in_days),
            amount_cents: 10_000,
            items: vec![InvoiceItem::new("Booth", 1, 10_000)],
            notes: None,
            status: None,
        }
        .into_invoice(uuid::Uuid::new_v4().to_string(), number.to_string(), created)
    }

    async fn repo() -> InvoiceRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.invoices()
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip_items() {
        let repo = repo().await;
        let mut inv = invoice("INV-202610-0001", "Acme", 10, now());
        inv.items.push(InvoiceItem {
            description: "Extra chair".to_string(),
            quantity: None,
            unit_amount_cents: 700,
        });
        repo.insert(&inv).await.unwrap();

        let loaded = repo.get_by_id(&inv.id).await.unwrap().unwrap();
        assert_eq!(loaded, inv);
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_number_is_unique_violation() {
        let repo = repo().await;
        repo.insert(&invoice("INV-202610-0001", "Acme", 10, now()))
            .await
            .unwrap();

        let err = repo
            .insert(&invoice("INV-202610-0001", "Other", 10, now()))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
        assert!(err.to_string().contains("INV-202610-0001"));
        assert_eq!(repo.count().await.unwrap(), 1);

        let (kept, _) = repo.list(&InvoiceQuery::default(), now()).await.unwrap();
        assert_eq!(kept[0].company, "Acme");
    }

    #[tokio::test]
    async fn test_latest_number_is_highest_sequence() {
        let repo = repo().await;
        assert!(repo
            .latest_number_with_prefix("INV-202610-")
            .await
            .unwrap()
            .is_none());

        // 0002 stamped before 0001: creation order must not hide it
        repo.insert(&invoice("INV-202610-0002", "A", 1, now()))
            .await
            .unwrap();
        repo.insert(&invoice("INV-202610-0001", "B", 1, now() + Duration::seconds(5)))
            .await
            .unwrap();
        repo.insert(&invoice("INV-202609-0099", "C", 1, now() + Duration::seconds(9)))
            .await
            .unwrap();

        assert_eq!(
            repo.latest_number_with_prefix("INV-202610-").await.unwrap().as_deref(),
            Some("INV-202610-0002")
        );

        // Past 9999 the number grows a digit and still sorts last
        repo.insert(&invoice("INV-202610-9999", "D", 1, now()))
            .await
            .unwrap();
        repo.insert(&invoice("INV-202610-10000", "E", 1, now() - Duration::days(1)))
            .await
            .unwrap();

        assert_eq!(
            repo.latest_number_with_prefix("INV-202610-").await.unwrap().as_deref(),
            Some("INV-202610-10000")
        );
    }

    #[tokio::test]
    async fn test_update_never_touches_number() {
        let repo = repo().await;
        let mut inv = invoice("INV-202610-0001", "Acme", 10, now());
        repo.insert(&inv).await.unwrap();

        inv.company = "Acme Renamed".to_string();
        inv.invoice_number = "INV-202610-9999".to_string();
        repo.update(&inv).await.unwrap();

        let loaded = repo.get_by_id(&inv.id).await.unwrap().unwrap();
        assert_eq!(loaded.company, "Acme Renamed");
        assert_eq!(loaded.invoice_number, "INV-202610-0001");
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let repo = repo().await;
        let inv = invoice("INV-202610-0001", "Acme", 10, now());

        assert!(matches!(repo.update(&inv).await, Err(DbError::NotFound { .. })));
        assert!(matches!(repo.delete(&inv.id).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_filters_and_pagination() {
        let repo = repo().await;
        for (i, company) in ["Acme", "Globex", "Initech", "Acme Tents", "Umbrella"]
            .iter()
            .enumerate()
        {
            let number = format!("INV-202610-{:04}", i + 1);
            repo.insert(&invoice(&number, company, 10 - i as i64, now()))
                .await
                .unwrap();
        }

        // Ordered by due date ascending
        let (all, total) = repo.list(&InvoiceQuery::default(), now()).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(all[0].company, "Umbrella");
        assert_eq!(all[4].company, "Acme");

        // Case-insensitive search over company and number
        let query = InvoiceQuery {
            search: Some("acme".to_string()),
            ..Default::default()
        };
        let (found, total) = repo.list(&query, now()).await.unwrap();
        assert_eq!(total, 2);
        assert!(found.iter().all(|i| i.company.starts_with("Acme")));

        let query = InvoiceQuery {
            search: Some("0003".to_string()),
            ..Default::default()
        };
        let (found, _) = repo.list(&query, now()).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].company, "Initech");

        // Wildcards in the search term match literally
        let query = InvoiceQuery {
            search: Some("%".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.list(&query, now()).await.unwrap().1, 0);

        // Second page of two
        let query = InvoiceQuery {
            page: Some(2),
            limit: Some(2),
            ..Default::default()
        };
        let (page, total) = repo.list(&query, now()).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].company, "Initech");
    }

    #[tokio::test]
    async fn test_list_overdue_and_due_range() {
        let repo = repo().await;
        let past = invoice("INV-202610-0001", "Late Co", -3, now());
        let future = invoice("INV-202610-0002", "Early Co", 3, now());
        let mut paid_past = invoice("INV-202610-0003", "Paid Co", -3, now());
        paid_past.status = InvoiceStatus::Paid;
        for inv in [&past, &future, &paid_past] {
            repo.insert(inv).await.unwrap();
        }

        let query = InvoiceQuery {
            status: Some(InvoiceStatus::Overdue),
            ..Default::default()
        };
        let (overdue, _) = repo.list(&query, now()).await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, past.id);

        let query = InvoiceQuery {
            due_from: Some(now()),
            due_to: Some(now() + Duration::days(7)),
            ..Default::default()
        };
        let (ranged, _) = repo.list(&query, now()).await.unwrap();
        assert_eq!(ranged.len(), 1);
        assert_eq!(ranged[0].id, future.id);
    }

    #[tokio::test]
    async fn test_stats_groups_and_overdue() {
        let repo = repo().await;
        let mut a = invoice("INV-202610-0001", "A", -1, now());
        a.amount_cents = 1_000;
        let mut b = invoice("INV-202610-0002", "B", 5, now());
        b.amount_cents = 2_000;
        let mut c = invoice("INV-202610-0003", "C", 5, now());
        c.amount_cents = 4_000;
        c.status = InvoiceStatus::Paid;
        for inv in [&a, &b, &c] {
            repo.insert(inv).await.unwrap();
        }

        let stats = repo.stats(now()).await.unwrap();
        assert_eq!(stats.pending, StatusTotal::new(2, 3_000));
        assert_eq!(stats.paid, StatusTotal::new(1, 4_000));
        assert_eq!(stats.cancelled, StatusTotal::default());
        assert_eq!(stats.overdue, StatusTotal::new(1, 1_000));
        assert_eq!(stats.total, StatusTotal::new(3, 7_000));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Acme"), "%acme%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
