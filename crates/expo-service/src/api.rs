//! # Boundary
//!
//! Uniform response shapes for whatever transport sits in front of the
//! services. Routing and authentication live outside this workspace.
//!
//! ## Envelope
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Success (201)                      Failure (409)                       │
//! │  {                                  {                                   │
//! │    "success": true,                   "success": false,                 │
//! │    "data": { "invoiceNumber":         "error": "CONFLICT",              │
//! │              "INV-202610-0007", … },  "message": "Conflict: invoice     │
//! │    "message": "Invoice created"                 number … is taken"      │
//! │  }                                  }                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status Mapping
//! | ServiceError | Code | Status |
//! |--------------|------|--------|
//! | Validation | `VALIDATION_ERROR` | 400 |
//! | NotFound | `NOT_FOUND` | 404 |
//! | Conflict | `CONFLICT` | 409 |
//! | Unavailable | `SERVICE_UNAVAILABLE` | 503 |
//! | Render | `RENDER_ERROR` | 500 |
//! | Internal | `INTERNAL` | 500 |

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error};

use expo_core::rates::Usage;
use expo_core::{InvoicePatch, InvoiceQuery, NewInvoice, RateUpdate, ServiceDomain};
use expo_db::Database;

use crate::config::ServiceConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::invoices::{InvoiceService, InvoiceSettings};
use crate::rates::RateService;

// =============================================================================
// Response Types
// =============================================================================

/// Body of every boundary response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// HTTP status plus envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiReply {
    pub status: u16,
    pub body: Envelope,
}

impl ApiReply {
    fn ok(status: u16, data: serde_json::Value, message: Option<&str>) -> Self {
        ApiReply {
            status,
            body: Envelope {
                success: true,
                data: Some(data),
                error: None,
                message: message.map(str::to_string),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.body.success
    }
}

impl From<ApiError> for ApiReply {
    fn from(err: ApiError) -> Self {
        ApiReply {
            status: err.code.status(),
            body: Envelope {
                success: false,
                data: None,
                error: Some(err.code),
                message: Some(err.message),
            },
        }
    }
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,
    /// Resource not found (404)
    NotFound,
    /// Uniqueness conflict (409)
    Conflict,
    /// Store unreachable (503)
    ServiceUnavailable,
    /// Document could not be produced (500)
    RenderError,
    /// Anything else (500)
    Internal,
}

impl ErrorCode {
    pub const fn status(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 400,
            ErrorCode::NotFound => 404,
            ErrorCode::Conflict => 409,
            ErrorCode::ServiceUnavailable => 503,
            ErrorCode::RenderError | ErrorCode::Internal => 500,
        }
    }
}

/// Boundary error: code plus human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(_) => ApiError::new(ErrorCode::ValidationError, err.to_string()),
            ServiceError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            ServiceError::Conflict(_) => ApiError::new(ErrorCode::Conflict, err.to_string()),
            ServiceError::Unavailable(e) => {
                error!(error = %e, "Store unavailable");
                ApiError::new(ErrorCode::ServiceUnavailable, "Service temporarily unavailable")
            }
            ServiceError::Render(e) => {
                error!(error = %e, "Invoice render failed");
                ApiError::new(ErrorCode::RenderError, format!("Render failed: {}", e))
            }
            ServiceError::Internal(e) => {
                // Log the actual error but return a generic message
                error!(error = %e, "Internal error");
                ApiError::new(ErrorCode::Internal, "Internal server error")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// A rendered invoice ready to be sent as a download.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfAttachment {
    /// `<invoiceNumber>.pdf`
    pub filename: String,
    pub content_type: &'static str,
    /// `attachment; filename="<invoiceNumber>.pdf"`
    pub content_disposition: String,
    pub bytes: Vec<u8>,
}

impl PdfAttachment {
    pub const CONTENT_TYPE: &'static str = "application/pdf";

    pub fn new(invoice_number: &str, bytes: Vec<u8>) -> Self {
        let filename = format!("{}.pdf", invoice_number);
        PdfAttachment {
            content_disposition: format!("attachment; filename=\"{}\"", filename),
            filename,
            content_type: Self::CONTENT_TYPE,
            bytes,
        }
    }
}

// =============================================================================
// Reply Helpers
// =============================================================================

fn reply<T: Serialize>(result: ServiceResult<T>, status: u16, message: Option<&str>) -> ApiReply {
    let value = result.and_then(|data| {
        serde_json::to_value(data)
            .map_err(|e| ServiceError::Internal(format!("response encoding failed: {}", e)))
    });

    match value {
        Ok(data) => ApiReply::ok(status, data, message),
        Err(e) => ApiReply::from(ApiError::from(e)),
    }
}

fn parse_domain(domain: &str) -> ServiceResult<ServiceDomain> {
    Ok(domain.parse::<ServiceDomain>()?)
}

// =============================================================================
// Back Office Facade
// =============================================================================

/// Every boundary operation of the back office.
///
/// ## Usage
/// ```rust,ignore
/// let office = BackOffice::connect(&ServiceConfig::from_env()?).await?;
///
/// let reply = office.create_invoice(input).await;
/// assert_eq!(reply.status, 201);
/// ```
#[derive(Debug, Clone)]
pub struct BackOffice {
    db: Database,
    invoices: InvoiceService,
    rates: RateService,
}

impl BackOffice {
    /// Wires the services over an open database.
    pub fn new(db: Database, settings: InvoiceSettings) -> Self {
        BackOffice {
            invoices: InvoiceService::new(db.invoices(), db.exhibitors(), settings),
            rates: RateService::new(db.rate_configs()),
            db,
        }
    }

    /// Opens the configured database and wires the services.
    pub async fn connect(config: &ServiceConfig) -> ServiceResult<Self> {
        let db = Database::new(config.to_db_config()).await?;
        Ok(BackOffice::new(db, InvoiceSettings::from(config)))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn invoices(&self) -> &InvoiceService {
        &self.invoices
    }

    pub fn rates(&self) -> &RateService {
        &self.rates
    }

    // =========================================================================
    // Invoices
    // =========================================================================

    pub async fn create_invoice(&self, input: NewInvoice) -> ApiReply {
        debug!(company = %input.company, "create_invoice");
        reply(self.invoices.create(input).await, 201, Some("Invoice created"))
    }

    pub async fn get_invoice(&self, id: &str) -> ApiReply {
        reply(self.invoices.get(id).await, 200, None)
    }

    pub async fn list_invoices(&self, query: InvoiceQuery) -> ApiReply {
        reply(self.invoices.list(query).await, 200, None)
    }

    pub async fn update_invoice(&self, id: &str, patch: InvoicePatch) -> ApiReply {
        reply(self.invoices.update(id, patch).await, 200, Some("Invoice updated"))
    }

    pub async fn delete_invoice(&self, id: &str) -> ApiReply {
        let result = self
            .invoices
            .delete(id)
            .await
            .map(|()| serde_json::json!({ "id": id }));
        reply(result, 200, Some("Invoice deleted"))
    }

    pub async fn mark_invoice_paid(&self, id: &str, payment_id: Option<String>) -> ApiReply {
        reply(
            self.invoices.mark_paid(id, payment_id).await,
            200,
            Some("Invoice marked as paid"),
        )
    }

    pub async fn invoice_stats(&self) -> ApiReply {
        reply(self.invoices.stats(Utc::now()).await, 200, None)
    }

    /// Renders an invoice as a download, or the error reply.
    pub async fn invoice_pdf(&self, id: &str) -> Result<PdfAttachment, ApiReply> {
        match self.invoices.render_pdf(id).await {
            Ok(rendered) => Ok(PdfAttachment::new(&rendered.invoice_number, rendered.pdf)),
            Err(e) => Err(ApiReply::from(ApiError::from(e))),
        }
    }

    // =========================================================================
    // Rates
    // =========================================================================

    pub async fn get_rate_config(&self, domain: &str) -> ApiReply {
        let result = match parse_domain(domain) {
            Ok(domain) => self.rates.get_config(domain).await,
            Err(e) => Err(e),
        };
        reply(result, 200, None)
    }

    pub async fn update_rate_config(&self, domain: &str, update: RateUpdate) -> ApiReply {
        let result = match parse_domain(domain) {
            Ok(domain) => self.rates.update_config(domain, update).await,
            Err(e) => Err(e),
        };
        reply(result, 200, Some("Rate updated"))
    }

    pub async fn reset_rate_config(&self, domain: &str) -> ApiReply {
        let result = match parse_domain(domain) {
            Ok(domain) => self.rates.reset_config(domain).await,
            Err(e) => Err(e),
        };
        reply(result, 200, Some("Rate reset to default"))
    }

    pub async fn list_rate_configs(&self) -> ApiReply {
        reply(self.rates.list_configs().await, 200, None)
    }

    pub async fn calculate_cost(&self, domain: &str, usage: Usage) -> ApiReply {
        let result = match parse_domain(domain) {
            Ok(domain) => self.rates.calculate(domain, usage).await,
            Err(e) => Err(e),
        };
        reply(result, 200, None)
    }

    pub async fn calculate_bulk(&self, domain: &str, lines: Vec<Usage>) -> ApiReply {
        let result = match parse_domain(domain) {
            Ok(domain) => self.rates.calculate_bulk(domain, &lines).await,
            Err(e) => Err(e),
        };
        reply(result, 200, None)
    }

    pub async fn calculate_housekeeping_hours(&self, hours: f64, staff: i64) -> ApiReply {
        reply(
            self.rates.calculate_housekeeping_hours(hours, staff).await,
            200,
            None,
        )
    }

    // =========================================================================
    // Health
    // =========================================================================

    pub async fn health(&self) -> ApiReply {
        if self.db.health_check().await {
            ApiReply::ok(200, serde_json::json!({ "database": "ok" }), None)
        } else {
            ApiReply::from(ApiError::new(
                ErrorCode::ServiceUnavailable,
                "Database unreachable",
            ))
        }
    }
}
