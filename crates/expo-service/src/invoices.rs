//! # Invoice Lifecycle Manager
//!
//! Create, read, list, update, delete, mark-paid, statistics and PDF
//! rendering of invoices.
//!
//! ## Create With Retry
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create(NewInvoice)                                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_new_invoice                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─► generator.next(now) ──► stamp created_at ──► invoices.insert       │
//! │  │                                  │                                   │
//! │  │      UniqueViolation             │ Ok                                │
//! │  └── backoff (attempt < retries) ◄──┤──────────► return invoice        │
//! │                                     │                                   │
//! │         attempts exhausted ─────────┴──────────► ServiceError::Conflict│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A collision never overwrites: the losing insert is rejected by the
//! unique index and the caller either gets a fresh number or `Conflict`.
//! The lookup returns the highest sequence and the losing number is already
//! committed, so each retry lands strictly above the number it lost. With
//! N creators racing, N attempts are always enough.

use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use expo_core::render::{render_invoice, RenderOptions};
use expo_core::validation::{
    validate_new_invoice, validate_payment_id, validate_search_query,
};
use expo_core::{
    Invoice, InvoicePatch, InvoiceQuery, InvoiceStats, InvoiceStatus, NewInvoice, Page,
    PaginationMeta,
};
use expo_db::{DbError, ExhibitorRepository, InvoiceRepository};

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::numbering::InvoiceNumberGenerator;

const RETRY_INITIAL_INTERVAL: Duration = Duration::from_millis(2);
const RETRY_MAX_INTERVAL: Duration = Duration::from_millis(50);

/// Settings the lifecycle manager needs from the service configuration.
#[derive(Debug, Clone)]
pub struct InvoiceSettings {
    /// Insert attempts before a number collision becomes `Conflict`.
    pub number_retry_attempts: u32,
    /// Presentation template; `generated_at` is replaced on every render.
    pub render: RenderOptions,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        InvoiceSettings::from(&ServiceConfig::default())
    }
}

impl From<&ServiceConfig> for InvoiceSettings {
    fn from(config: &ServiceConfig) -> Self {
        InvoiceSettings {
            number_retry_attempts: config.number_retry_attempts.max(1),
            render: config.render_options(Utc::now()),
        }
    }
}

/// Jittered exponential pauses between colliding insert attempts.
///
/// The default randomization factor (0.5) spreads creators that lost the
/// same number so they do not look it up again in lockstep.
fn collision_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: RETRY_INITIAL_INTERVAL,
        max_interval: RETRY_MAX_INTERVAL,
        multiplier: 2.0,
        max_elapsed_time: None,
        ..Default::default()
    }
}

/// A rendered invoice document.
#[derive(Debug, Clone)]
pub struct RenderedInvoice {
    pub invoice_number: String,
    pub pdf: Vec<u8>,
}

/// Invoice lifecycle manager.
///
/// ## Usage
/// ```rust,ignore
/// let service = InvoiceService::new(db.invoices(), db.exhibitors(), InvoiceSettings::default());
///
/// let invoice = service.create(input).await?;
/// let paid = service.mark_paid(&invoice.id, Some("UPI-7781".into())).await?;
/// ```
#[derive(Debug, Clone)]
pub struct InvoiceService {
    invoices: InvoiceRepository,
    exhibitors: ExhibitorRepository,
    numbers: InvoiceNumberGenerator,
    settings: InvoiceSettings,
}

impl InvoiceService {
    pub fn new(
        invoices: InvoiceRepository,
        exhibitors: ExhibitorRepository,
        settings: InvoiceSettings,
    ) -> Self {
        InvoiceService {
            numbers: InvoiceNumberGenerator::new(invoices.clone()),
            invoices,
            exhibitors,
            settings,
        }
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Creates an invoice with a freshly generated number.
    ///
    /// ## Errors
    /// - `Validation` for bad input
    /// - `Conflict` when every attempt collided with an existing number
    /// - `Unavailable` when the store is down
    pub async fn create(&self, input: NewInvoice) -> ServiceResult<Invoice> {
        validate_new_invoice(&input)?;

        let attempts = self.settings.number_retry_attempts.max(1);
        let mut backoff = collision_backoff();
        let mut last_collision = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                if let Some(pause) = backoff.next_backoff() {
                    tokio::time::sleep(pause).await;
                }
            }

            let number = self.numbers.next(Utc::now()).await;
            // Stamped after the lookup so creation order follows number order.
            let created_at = Utc::now();
            let invoice = input
                .clone()
                .into_invoice(Uuid::new_v4().to_string(), number, created_at);

            match self.invoices.insert(&invoice).await {
                Ok(created) => {
                    info!(
                        id = %created.id,
                        invoice_number = %created.invoice_number,
                        company = %created.company,
                        amount_cents = created.amount_cents,
                        "Invoice created"
                    );
                    return Ok(created);
                }
                Err(e) if e.is_unique_violation() => {
                    warn!(
                        attempt,
                        attempts,
                        invoice_number = %invoice.invoice_number,
                        "Invoice number collision, retrying"
                    );
                    last_collision = Some(e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::Conflict(match last_collision {
            Some(DbError::UniqueViolation { value, .. }) => format!(
                "invoice number {} is already taken after {} attempts",
                value, attempts
            ),
            _ => format!("no free invoice number after {} attempts", attempts),
        }))
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Gets an invoice by ID.
    pub async fn get(&self, id: &str) -> ServiceResult<Invoice> {
        self.invoices
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Invoice", id))
    }

    /// Lists invoices with filters and pagination.
    pub async fn list(&self, mut query: InvoiceQuery) -> ServiceResult<Page<Invoice>> {
        if let Some(search) = &query.search {
            query.search = Some(validate_search_query(search)?);
        }

        let (items, total) = self.invoices.list(&query, Utc::now()).await?;

        debug!(returned = items.len(), total, "Listed invoices");

        Ok(Page {
            items,
            pagination: PaginationMeta::new(query.page(), query.limit(), total),
        })
    }

    /// Statistics as of `now`.
    pub async fn stats(&self, now: DateTime<Utc>) -> ServiceResult<InvoiceStats> {
        Ok(self.invoices.stats(now).await?)
    }

    // =========================================================================
    // Update / Delete
    // =========================================================================

    /// Applies a patch. The invoice number is never changed.
    pub async fn update(&self, id: &str, patch: InvoicePatch) -> ServiceResult<Invoice> {
        let mut invoice = self.get(id).await?;
        patch.apply(&mut invoice, Utc::now())?;

        self.invoices.update(&invoice).await?;

        info!(id = %invoice.id, status = %invoice.status, "Invoice updated");
        Ok(invoice)
    }

    /// Deletes an invoice.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.invoices.delete(id).await?;
        info!(id = %id, "Invoice deleted");
        Ok(())
    }

    /// Marks an invoice paid now.
    ///
    /// Idempotent: an already-paid invoice is returned unchanged, keeping
    /// its original paid date and payment id.
    pub async fn mark_paid(&self, id: &str, payment_id: Option<String>) -> ServiceResult<Invoice> {
        if let Some(payment_id) = &payment_id {
            validate_payment_id(payment_id)?;
        }

        let mut invoice = self.get(id).await?;
        if invoice.status == InvoiceStatus::Paid {
            debug!(id = %id, "Invoice already paid");
            return Ok(invoice);
        }

        let now = Utc::now();
        invoice.status = InvoiceStatus::Paid;
        invoice.paid_date = Some(now);
        invoice.payment_id = payment_id.map(|p| p.trim().to_string());
        invoice.updated_at = now;

        self.invoices.update(&invoice).await?;

        info!(
            id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            payment_id = ?invoice.payment_id,
            "Invoice marked paid"
        );
        Ok(invoice)
    }

    // =========================================================================
    // Render
    // =========================================================================

    /// Renders an invoice to PDF.
    ///
    /// A missing linked exhibitor only drops the contact lines.
    pub async fn render_pdf(&self, id: &str) -> ServiceResult<RenderedInvoice> {
        let invoice = self.get(id).await?;

        let exhibitor = match &invoice.exhibitor_id {
            Some(exhibitor_id) => {
                let found = self.exhibitors.get_by_id(exhibitor_id).await?;
                if found.is_none() {
                    debug!(%exhibitor_id, "Linked exhibitor not found, rendering without contact");
                }
                found
            }
            None => None,
        };

        let options = RenderOptions {
            generated_at: Utc::now(),
            ..self.settings.render.clone()
        };
        let invoice_number = invoice.invoice_number.clone();

        let pdf = tokio::task::spawn_blocking(move || {
            render_invoice(&invoice, exhibitor.as_ref(), &options)
        })
        .await
        .map_err(|e| ServiceError::Internal(format!("render task failed: {}", e)))??;

        info!(%invoice_number, bytes = pdf.len(), "Invoice rendered");
        Ok(RenderedInvoice {
            invoice_number,
            pdf,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use expo_core::{InvoiceItem, StatusTotal};
    use expo_db::{Database, DbConfig};

    async fn service() -> (Database, InvoiceService) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = InvoiceService::new(db.invoices(), db.exhibitors(), InvoiceSettings::default());
        (db, service)
    }

    fn new_invoice(company: &str, due_in_days: i64) -> NewInvoice {
        NewInvoice {
            company: company.to_string(),
            exhibitor_id: None,
            issue_date: None,
            due_date: Utc::now() + Duration::days(due_in_days),
            amount_cents: 100_000,
            items: vec![InvoiceItem::new("Booth", 2, 50_000)],
            notes: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_numbers() {
        let (_db, service) = service().await;

        let first = service.create(new_invoice("Acme", 30)).await.unwrap();
        let second = service.create(new_invoice("Globex", 30)).await.unwrap();

        let prefix = expo_core::numbering::PeriodKey::from_datetime(first.created_at).prefix();
        assert_eq!(first.invoice_number, format!("{prefix}0001"));
        assert_eq!(second.invoice_number, format!("{prefix}0002"));
        assert_eq!(first.status, InvoiceStatus::Pending);
        assert_eq!(first.issue_date, first.created_at);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let (_db, service) = service().await;

        let err = service.create(new_invoice("  ", 30)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_after_out_of_order_timestamps() {
        let (db, service) = service().await;
        let now = Utc::now();
        let prefix = expo_core::numbering::PeriodKey::from_datetime(now).prefix();

        // A slow creator stamped 0002 before a faster creator's 0001 landed.
        let first = new_invoice("Fast", 30).into_invoice(
            Uuid::new_v4().to_string(),
            format!("{prefix}0001"),
            now + Duration::milliseconds(3),
        );
        let second = new_invoice("Slow", 30).into_invoice(
            Uuid::new_v4().to_string(),
            format!("{prefix}0002"),
            now,
        );
        db.invoices().insert(&first).await.unwrap();
        db.invoices().insert(&second).await.unwrap();

        let mut numbers = Vec::new();
        for company in ["Acme", "Globex", "Initech"] {
            let created = service.create(new_invoice(company, 30)).await.unwrap();
            numbers.push(created.invoice_number);
        }
        assert_eq!(
            numbers,
            vec![
                format!("{prefix}0003"),
                format!("{prefix}0004"),
                format!("{prefix}0005")
            ]
        );

        // Nothing was overwritten
        let kept = db.invoices().get_by_id(&second.id).await.unwrap().unwrap();
        assert_eq!(kept.company, "Slow");
        assert_eq!(db.invoices().count().await.unwrap(), 5);
    }

    #[test]
    fn test_collision_backoff_stays_bounded() {
        let mut backoff = collision_backoff();
        let mut pauses = Vec::new();
        for _ in 0..12 {
            pauses.push(backoff.next_backoff().unwrap());
        }

        assert!(pauses[0] >= RETRY_INITIAL_INTERVAL / 2);
        assert!(pauses[0] < RETRY_INITIAL_INTERVAL * 2);
        assert!(pauses.iter().all(|p| *p < RETRY_MAX_INTERVAL * 2));
    }

    #[tokio::test]
    async fn test_get_update_delete() {
        let (_db, service) = service().await;
        let created = service.create(new_invoice("Acme", 30)).await.unwrap();

        let patch = InvoicePatch {
            company: Some("Acme Holdings".to_string()),
            notes: Some(Some("Corner booth".to_string())),
            ..Default::default()
        };
        let updated = service.update(&created.id, patch).await.unwrap();
        assert_eq!(updated.company, "Acme Holdings");
        assert_eq!(updated.invoice_number, created.invoice_number);

        let fetched = service.get(&created.id).await.unwrap();
        assert_eq!(fetched.notes.as_deref(), Some("Corner booth"));

        let overdue = InvoicePatch {
            status: Some(InvoiceStatus::Overdue),
            ..Default::default()
        };
        assert!(matches!(
            service.update(&created.id, overdue).await,
            Err(ServiceError::Validation(_))
        ));

        let bad_items = InvoicePatch {
            items: Some(vec![InvoiceItem::new("Booth", -1, 50_000)]),
            ..Default::default()
        };
        assert!(matches!(
            service.update(&created.id, bad_items).await,
            Err(ServiceError::Validation(_))
        ));
        let stored = service.get(&created.id).await.unwrap();
        assert_eq!(stored.items, created.items);

        service.delete(&created.id).await.unwrap();
        assert!(matches!(
            service.get(&created.id).await,
            Err(ServiceError::NotFound { .. })
        ));
        assert!(matches!(
            service.delete(&created.id).await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_mark_paid_is_idempotent() {
        let (_db, service) = service().await;
        let created = service.create(new_invoice("Acme", 30)).await.unwrap();

        let paid = service
            .mark_paid(&created.id, Some("UPI-7781".to_string()))
            .await
            .unwrap();
        assert_eq!(paid.status, InvoiceStatus::Paid);
        assert!(paid.paid_date.is_some());
        assert_eq!(paid.payment_id.as_deref(), Some("UPI-7781"));

        let again = service
            .mark_paid(&created.id, Some("UPI-9999".to_string()))
            .await
            .unwrap();
        assert_eq!(again.paid_date, paid.paid_date);
        assert_eq!(again.payment_id.as_deref(), Some("UPI-7781"));

        assert!(matches!(
            service.mark_paid("missing", None).await,
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_paginates() {
        let (_db, service) = service().await;
        for i in 0..3 {
            service
                .create(new_invoice(&format!("Company {i}"), 10 + i))
                .await
                .unwrap();
        }

        let page = service
            .list(InvoiceQuery {
                page: Some(2),
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].company, "Company 2");
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.total_pages, 2);
        assert!(!page.pagination.has_next);
        assert!(page.pagination.has_prev);

        let too_long = InvoiceQuery {
            search: Some("x".repeat(101)),
            ..Default::default()
        };
        assert!(matches!(
            service.list(too_long).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_stats_reports_overdue() {
        let (_db, service) = service().await;
        service.create(new_invoice("Late", -2)).await.unwrap();
        let paid = service.create(new_invoice("Paid", 5)).await.unwrap();
        service.mark_paid(&paid.id, None).await.unwrap();

        let stats = service.stats(Utc::now()).await.unwrap();
        assert_eq!(stats.pending, StatusTotal::new(1, 100_000));
        assert_eq!(stats.overdue, StatusTotal::new(1, 100_000));
        assert_eq!(stats.paid, StatusTotal::new(1, 100_000));
        assert_eq!(stats.total, StatusTotal::new(2, 200_000));
    }

    #[tokio::test]
    async fn test_render_pdf_with_missing_exhibitor() {
        let (_db, service) = service().await;
        let mut input = new_invoice("Acme", 30);
        input.exhibitor_id = Some("gone".to_string());
        let created = service.create(input).await.unwrap();

        let rendered = service.render_pdf(&created.id).await.unwrap();
        assert_eq!(rendered.invoice_number, created.invoice_number);
        assert!(rendered.pdf.starts_with(b"%PDF"));
    }
}
