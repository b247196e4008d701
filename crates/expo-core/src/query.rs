//! List filters, pagination metadata and invoice statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::InvoiceStatus;
use crate::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

// =============================================================================
// Invoice Query
// =============================================================================

/// Filters and paging for the invoice list.
///
/// All fields are optional; an empty query returns the first ten invoices by
/// due date.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default, rename_all = "camelCase")]
pub struct InvoiceQuery {
    /// Case-insensitive substring over invoice number and company.
    pub search: Option<String>,
    /// `overdue` selects pending invoices whose due date has passed.
    pub status: Option<InvoiceStatus>,
    pub exhibitor_id: Option<String>,
    #[ts(as = "Option<String>")]
    pub due_from: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub due_to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl InvoiceQuery {
    /// Page number, at least 1.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to `1..=100`.
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Trimmed search term, `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Pagination metadata attached to every list response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    /// Rows matching the filters, across all pages.
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let total = total.max(0);
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        let start = (page - 1).saturating_mul(limit);

        PaginationMeta {
            page,
            limit,
            total,
            total_pages,
            has_next: start.saturating_add(limit) < total,
            has_prev: page > 1,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

// =============================================================================
// Statistics
// =============================================================================

/// Count and amount sum of one slice of invoices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StatusTotal {
    pub count: i64,
    pub total_cents: i64,
}

impl StatusTotal {
    pub fn new(count: i64, total_cents: i64) -> Self {
        StatusTotal { count, total_cents }
    }

    fn absorb(&mut self, other: StatusTotal) {
        self.count += other.count;
        self.total_cents = self.total_cents.saturating_add(other.total_cents);
    }
}

/// Dashboard statistics over the stored `amount_cents` of each invoice.
///
/// `pending` includes the overdue slice; `overdue` is reported separately
/// and is not added into the grand total a second time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceStats {
    pub pending: StatusTotal,
    pub paid: StatusTotal,
    pub cancelled: StatusTotal,
    pub overdue: StatusTotal,
    pub total: StatusTotal,
}

impl InvoiceStats {
    /// Builds statistics from per-status rows plus the overdue slice.
    ///
    /// `Overdue` rows in `by_status` are ignored since overdue is never stored.
    pub fn from_groups(
        by_status: impl IntoIterator<Item = (InvoiceStatus, StatusTotal)>,
        overdue: StatusTotal,
    ) -> Self {
        let mut stats = InvoiceStats {
            overdue,
            ..Default::default()
        };
        for (status, total) in by_status {
            let slot = match status {
                InvoiceStatus::Pending => &mut stats.pending,
                InvoiceStatus::Paid => &mut stats.paid,
                InvoiceStatus::Cancelled => &mut stats.cancelled,
                InvoiceStatus::Overdue => continue,
            };
            slot.absorb(total);
            stats.total.absorb(total);
        }
        stats
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
