//! # Invoice Document Renderer
//!
//! Turns an invoice (plus optional linked exhibitor) into PDF bytes.
//!
//! ## Two Phases
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Invoice + Exhibitor? + RenderOptions                                   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  layout::layout_invoice   (pure, testable)                              │
//! │        │  DocumentLayout { pages: [ texts + rules ], total }            │
//! │        ▼                                                                │
//! │  pdf::encode              (printpdf, in-memory buffer)                  │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  Vec<u8>  returned only once the document is finalized                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any failure in either phase is a single [`RenderError`] and no bytes.

pub mod layout;
pub mod pdf;

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::error::RenderError;
use crate::types::{Exhibitor, Invoice};

pub use layout::{layout_invoice, Align, DocumentLayout, FontWeight, PageLayout, Rule, TextRun};

/// Default short date format (`19/10/2026`).
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Default currency label.
pub const DEFAULT_CURRENCY: &str = "INR";

/// Presentation settings for a rendered invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Label printed before amounts (`INR 1000.00`).
    pub currency: String,
    /// Printed under the `INVOICE` heading when set.
    pub issuer_name: Option<String>,
    /// strftime pattern for issue and due dates.
    pub date_format: String,
    /// Moment the document is produced. Drives the footer and overdue status.
    pub generated_at: DateTime<Utc>,
    /// Boilerplate printed above the generation timestamp.
    pub footer_lines: Vec<String>,
}

impl RenderOptions {
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        RenderOptions {
            currency: DEFAULT_CURRENCY.to_string(),
            issuer_name: None,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            generated_at,
            footer_lines: vec![
                "Thank you for exhibiting with us.".to_string(),
                "This is a computer-generated invoice and requires no signature.".to_string(),
            ],
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_issuer_name(mut self, issuer: impl Into<String>) -> Self {
        self.issuer_name = Some(issuer.into());
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Formats `at` with the configured date format.
    pub fn format_date(&self, at: DateTime<Utc>) -> Result<String, RenderError> {
        format_date(at, &self.date_format)
    }
}

/// Formats a timestamp, reporting a bad pattern instead of panicking.
pub fn format_date(at: DateTime<Utc>, format: &str) -> Result<String, RenderError> {
    let mut out = String::new();
    write!(out, "{}", at.format(format)).map_err(|_| RenderError::DateFormat {
        format: format.to_string(),
    })?;
    Ok(out)
}

/// Renders an invoice to PDF bytes.
///
/// ## Example
/// ```rust
/// use expo_core::render::{render_invoice, RenderOptions};
/// use expo_core::types::{InvoiceItem, NewInvoice};
/// use chrono::{Duration, Utc};
///
/// let now = Utc::now();
/// let invoice = NewInvoice {
///     company: "Acme Stands".into(),
///     exhibitor_id: None,
///     issue_date: None,
///     due_date: now + Duration::days(30),
///     amount_cents: 100_000,
///     items: vec![InvoiceItem::new("Booth", 2, 50_000)],
///     notes: None,
///     status: None,
/// }
/// .into_invoice("id".into(), "INV-202610-0001".into(), now);
///
/// let bytes = render_invoice(&invoice, None, &RenderOptions::new(now)).unwrap();
/// assert!(bytes.starts_with(b"%PDF"));
/// ```
pub fn render_invoice(
    invoice: &Invoice,
    exhibitor: Option<&Exhibitor>,
    options: &RenderOptions,
) -> Result<Vec<u8>, RenderError> {
    let document = layout_invoice(invoice, exhibitor, options)?;
    pdf::encode(&document, &invoice.invoice_number)
}
