//! # Invoice Number Generator
//!
//! Produces `INV-YYYYMM-NNNN` numbers, one sequence per calendar month.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  next(now = 2026-10-19)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  prefix "INV-202610-"                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  latest_number_with_prefix ──► "INV-202610-0041"                       │
//! │       │                              │                                  │
//! │       │ none                         ▼                                  │
//! │       ▼                        sequence 41 + 1                          │
//! │  "INV-202610-0001"            "INV-202610-0042"                        │
//! │                                                                         │
//! │  Lookup or parse fails ──► warn! + "INV-2026-<8 digits of epoch ms>"   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The generator never writes. Two concurrent callers can derive the same
//! number; the unique index rejects the second insert and the lifecycle
//! manager asks for a new number.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use expo_core::numbering::{fallback_number, next_from_latest, PeriodKey};
use expo_db::InvoiceRepository;

/// Derives the next invoice number from the store.
#[derive(Debug, Clone)]
pub struct InvoiceNumberGenerator {
    invoices: InvoiceRepository,
}

impl InvoiceNumberGenerator {
    pub fn new(invoices: InvoiceRepository) -> Self {
        InvoiceNumberGenerator { invoices }
    }

    /// Returns the next number for the month of `now`.
    ///
    /// Never fails: any lookup or parse problem yields the time-derived
    /// fallback number instead.
    pub async fn next(&self, now: DateTime<Utc>) -> String {
        let period = PeriodKey::from_datetime(now);
        let prefix = period.prefix();

        let latest = match self.invoices.latest_number_with_prefix(&prefix).await {
            Ok(latest) => latest,
            Err(e) => {
                let fallback = fallback_number(now);
                warn!(error = %e, %fallback, "Invoice number lookup failed, using fallback");
                return fallback;
            }
        };

        match next_from_latest(&period, latest.as_deref()) {
            Ok(number) => {
                debug!(%number, "Derived invoice number");
                number
            }
            Err(e) => {
                let fallback = fallback_number(now);
                warn!(error = %e, %fallback, "Latest invoice number unusable, using fallback");
                fallback
            }
        }
    }
}
