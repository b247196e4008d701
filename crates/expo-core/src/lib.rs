//! # expo-core: Pure Business Logic for the Expo Back Office
//!
//! This crate holds the business rules of the exhibition back office as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Expo Back Office Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Admin frontend / HTTP layer (outside workspace)        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Envelope { success, data, error }      │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    expo-service                                 │   │
//! │  │    InvoiceService, RateService, number generator, api facade   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ expo-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ numbering │  │   rates   │  │  render   │  │   │
//! │  │   │  Invoice  │  │ INV-YYYY  │  │  Usage    │  │  layout   │  │   │
//! │  │   │ RateConfig│  │  MM-NNNN  │  │ Breakdown │  │  + PDF    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    expo-db (Database Layer)                     │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Invoice, RateConfig, Exhibitor, ...)
//! - [`query`] - List filters, pagination metadata, statistics
//! - [`money`] - Money type with integer arithmetic
//! - [`numbering`] - Invoice number format and sequence rules
//! - [`rates`] - Service-rate calculators
//! - [`render`] - Invoice document layout and PDF encoding
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use expo_core::numbering::{next_from_latest, PeriodKey};
//! use chrono::{TimeZone, Utc};
//!
//! let period = PeriodKey::from_datetime(Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap());
//! assert_eq!(next_from_latest(&period, None).unwrap(), "INV-202603-0001");
//! assert_eq!(
//!     next_from_latest(&period, Some("INV-202603-0041")).unwrap(),
//!     "INV-202603-0042"
//! );
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod numbering;
pub mod query;
pub mod rates;
pub mod render;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, RenderError, ValidationError};
pub use money::Money;
pub use query::*;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Leading token of every invoice number.
pub const INVOICE_PREFIX: &str = "INV";

/// Minimum width of the zero-padded sequence part.
pub const SEQUENCE_WIDTH: usize = 4;

/// Page size used when a list query does not ask for one.
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Upper bound for a list page.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Maximum lines accepted in one bulk rate calculation.
pub const MAX_BULK_LINES: usize = 500;
