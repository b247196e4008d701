//! # Domain Types
//!
//! Core domain types used throughout the Expo Back Office.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Invoice      │   │   InvoiceItem   │   │   Exhibitor     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  description    │   │  id (UUID)      │       │
//! │  │  invoice_number │   │  quantity?      │   │  company        │       │
//! │  │  status         │   │  unit_amount    │   │  contact_name   │       │
//! │  │  amount_cents   │   └─────────────────┘   │  email / phone  │       │
//! │  │  items (JSON)   │                         └─────────────────┘       │
//! │  └─────────────────┘                                                   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  InvoiceStatus  │   │  ServiceDomain  │   │   RateConfig    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Pending        │   │  Housekeeping   │   │  domain (uniq)  │       │
//! │  │  Paid           │   │  SecurityGuard  │   │  rate_cents     │       │
//! │  │  Overdue*       │   │  WaterConnection│   │  shift_hours?   │       │
//! │  │  Cancelled      │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘   * derived, never stored                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Invoices have:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `invoice_number`: `INV-YYYYMM-NNNN` - human-readable, also immutable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{validate_amount_cents, validate_company, validate_items};

// =============================================================================
// Invoice Status
// =============================================================================

/// The status of an invoice.
///
/// `Overdue` is a view over `Pending` + a past due date. It is accepted as a
/// list filter and produced by [`Invoice::effective_status`], but it is never
/// written to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Issued, awaiting payment.
    Pending,
    /// Payment received.
    Paid,
    /// Pending and past its due date (derived).
    Overdue,
    /// Withdrawn; excluded from receivables.
    Cancelled,
}

impl InvoiceStatus {
    /// Statuses that can be persisted.
    pub const STORED: [InvoiceStatus; 3] = [
        InvoiceStatus::Pending,
        InvoiceStatus::Paid,
        InvoiceStatus::Cancelled,
    ];

    /// Lowercase name as stored and serialized.
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }

    /// Whether this status may be written to the store.
    pub const fn is_stored(&self) -> bool {
        !matches!(self, InvoiceStatus::Overdue)
    }
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Pending
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: ["pending", "paid", "overdue", "cancelled"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Invoice Item
// =============================================================================

/// A line on an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub description: String,
    /// Missing quantity counts as 1.
    #[serde(default)]
    pub quantity: Option<i64>,
    pub unit_amount_cents: i64,
}

impl InvoiceItem {
    /// Creates an item with an explicit quantity.
    pub fn new(description: impl Into<String>, quantity: i64, unit_amount_cents: i64) -> Self {
        InvoiceItem {
            description: description.into(),
            quantity: Some(quantity),
            unit_amount_cents,
        }
    }

    /// Quantity used for pricing.
    #[inline]
    pub fn effective_quantity(&self) -> i64 {
        self.quantity.unwrap_or(1)
    }

    /// Unit amount as Money.
    #[inline]
    pub fn unit_amount(&self) -> Money {
        Money::from_cents(self.unit_amount_cents)
    }

    /// `quantity × unit_amount`, or `None` when it overflows.
    pub fn line_amount(&self) -> Option<Money> {
        self.unit_amount().checked_multiply(self.effective_quantity())
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// An invoice issued to an exhibitor company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Human-readable number, `INV-YYYYMM-NNNN`. Never changes.
    pub invoice_number: String,

    /// Stored status (pending, paid or cancelled).
    pub status: InvoiceStatus,

    /// Billed company name.
    pub company: String,

    /// Optional back-reference to the exhibitor record.
    pub exhibitor_id: Option<String>,

    #[ts(as = "String")]
    pub issue_date: DateTime<Utc>,

    #[ts(as = "String")]
    pub due_date: DateTime<Utc>,

    /// Amount used for statistics. Independent from the item total.
    pub amount_cents: i64,

    /// Ordered line items.
    pub items: Vec<InvoiceItem>,

    pub notes: Option<String>,

    #[ts(as = "Option<String>")]
    pub paid_date: Option<DateTime<Utc>>,

    /// External payment reference recorded by mark-paid.
    pub payment_id: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Status as seen at `now`: pending invoices past due read as overdue.
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvoiceStatus {
        match self.status {
            InvoiceStatus::Pending if self.due_date < now => InvoiceStatus::Overdue,
            status => status,
        }
    }

    /// Stored amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// New Invoice
// =============================================================================

/// Input for creating an invoice.
///
/// The invoice number, id and timestamps are assigned by the lifecycle
/// manager; callers never supply them.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoice {
    pub company: String,
    #[serde(default)]
    pub exhibitor_id: Option<String>,
    /// Defaults to the creation time.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub issue_date: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub amount_cents: i64,
    #[serde(default)]
    pub items: Vec<InvoiceItem>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Defaults to pending.
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
}

impl NewInvoice {
    /// Builds the invoice record that will be inserted.
    pub fn into_invoice(self, id: String, invoice_number: String, now: DateTime<Utc>) -> Invoice {
        Invoice {
            id,
            invoice_number,
            status: self
                .status
                .filter(InvoiceStatus::is_stored)
                .unwrap_or_default(),
            company: self.company,
            exhibitor_id: self.exhibitor_id,
            issue_date: self.issue_date.unwrap_or(now),
            due_date: self.due_date,
            amount_cents: self.amount_cents,
            items: self.items,
            notes: self.notes,
            paid_date: None,
            payment_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Invoice Patch
// =============================================================================

/// Partial update of an invoice.
///
/// Nullable fields use `Option<Option<T>>`: absent leaves the field alone,
/// `null` clears it. There is deliberately no `invoice_number` field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePatch {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub exhibitor_id: Option<Option<String>>,
    #[serde(default)]
    pub issue_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub amount_cents: Option<i64>,
    #[serde(default)]
    pub items: Option<Vec<InvoiceItem>>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub paid_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "nullable")]
    pub payment_id: Option<Option<String>>,
}

/// Distinguishes an explicit `null` from a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl InvoicePatch {
    /// Applies the patch in place and bumps `updated_at`.
    ///
    /// The whole patch is checked before anything is written, with the
    /// same rules as creation.
    ///
    /// ## Errors
    /// - `status: overdue` (derived, cannot be stored)
    /// - empty or over-long `company`
    /// - negative `amountCents`
    /// - invalid items
    pub fn apply(self, invoice: &mut Invoice, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(status) = self.status {
            if !status.is_stored() {
                return Err(ValidationError::NotAllowed {
                    field: "status".to_string(),
                    allowed: InvoiceStatus::STORED
                        .iter()
                        .map(|s| s.as_str().to_string())
                        .collect(),
                });
            }
        }
        if let Some(company) = &self.company {
            validate_company(company)?;
        }
        if let Some(amount_cents) = self.amount_cents {
            validate_amount_cents(amount_cents)?;
        }
        if let Some(items) = &self.items {
            validate_items(items)?;
        }

        if let Some(status) = self.status {
            invoice.status = status;
        }
        if let Some(company) = self.company {
            invoice.company = company;
        }
        if let Some(exhibitor_id) = self.exhibitor_id {
            invoice.exhibitor_id = exhibitor_id;
        }
        if let Some(issue_date) = self.issue_date {
            invoice.issue_date = issue_date;
        }
        if let Some(due_date) = self.due_date {
            invoice.due_date = due_date;
        }
        if let Some(amount_cents) = self.amount_cents {
            invoice.amount_cents = amount_cents;
        }
        if let Some(items) = self.items {
            invoice.items = items;
        }
        if let Some(notes) = self.notes {
            invoice.notes = notes;
        }
        if let Some(paid_date) = self.paid_date {
            invoice.paid_date = paid_date;
        }
        if let Some(payment_id) = self.payment_id {
            invoice.payment_id = payment_id;
        }
        invoice.updated_at = now;
        Ok(())
    }
}

// =============================================================================
// Exhibitor
// =============================================================================

/// An exhibiting company and its billing contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Exhibitor {
    pub id: String,
    pub company: String,
    pub contact_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Service Domain
// =============================================================================

/// The service-rate domains offered to exhibitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ServiceDomain {
    /// Cleaning staff, priced per shift.
    Housekeeping,
    /// Security guards, priced per guard per day.
    SecurityGuard,
    /// Water connections, priced per connection.
    WaterConnection,
}

impl ServiceDomain {
    pub const ALL: [ServiceDomain; 3] = [
        ServiceDomain::Housekeeping,
        ServiceDomain::SecurityGuard,
        ServiceDomain::WaterConnection,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ServiceDomain::Housekeeping => "housekeeping",
            ServiceDomain::SecurityGuard => "security_guard",
            ServiceDomain::WaterConnection => "water_connection",
        }
    }

    /// Baseline rate restored by reset-to-default.
    ///
    /// | Domain | Rate |
    /// |--------|------|
    /// | housekeeping | 2000 per shift |
    /// | security guard | 2500 per guard per day |
    /// | water connection | 15000 per connection |
    pub const fn default_rate(&self) -> Money {
        match self {
            ServiceDomain::Housekeeping => Money::from_major(2000),
            ServiceDomain::SecurityGuard => Money::from_major(2500),
            ServiceDomain::WaterConnection => Money::from_major(15000),
        }
    }

    /// Baseline length of one priced unit of work, in hours.
    pub const fn default_shift_hours(&self) -> Option<i64> {
        match self {
            ServiceDomain::Housekeeping => Some(8),
            ServiceDomain::SecurityGuard => Some(12),
            ServiceDomain::WaterConnection => None,
        }
    }

    /// What one unit of `rate_cents` buys.
    pub const fn unit_label(&self) -> &'static str {
        match self {
            ServiceDomain::Housekeeping => "shift",
            ServiceDomain::SecurityGuard => "guard-day",
            ServiceDomain::WaterConnection => "connection",
        }
    }
}

impl fmt::Display for ServiceDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceDomain {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "housekeeping" => Ok(ServiceDomain::Housekeeping),
            "security_guard" | "security" => Ok(ServiceDomain::SecurityGuard),
            "water_connection" | "water" => Ok(ServiceDomain::WaterConnection),
            _ => Err(ValidationError::NotAllowed {
                field: "domain".to_string(),
                allowed: ServiceDomain::ALL
                    .iter()
                    .map(|d| d.as_str().to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Rate Config
// =============================================================================

/// The single authoritative rate record of a service domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RateConfig {
    pub id: String,
    pub domain: ServiceDomain,
    /// Price of one unit (shift, guard-day, connection) in cents.
    pub rate_cents: i64,
    /// Hours in one shift (housekeeping) or guard-day (security).
    pub shift_hours: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl RateConfig {
    /// Builds the default record of a domain.
    pub fn default_for(domain: ServiceDomain, id: String, now: DateTime<Utc>) -> Self {
        RateConfig {
            id,
            domain,
            rate_cents: domain.default_rate().cents(),
            shift_hours: domain.default_shift_hours(),
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn rate(&self) -> Money {
        Money::from_cents(self.rate_cents)
    }
}

/// Caller-supplied changes to a rate record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RateUpdate {
    #[serde(default)]
    pub rate_cents: Option<i64>,
    #[serde(default)]
    pub shift_hours: Option<i64>,
}

// =============================================================================
// Unit Tests
// =============================================================================
