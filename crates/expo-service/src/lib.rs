//! # expo-service: Invoice Lifecycle and Service Rates
//!
//! Orchestrates expo-core logic over expo-db storage and exposes the
//! result through a uniform response envelope.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Back Office Request                             │
//! │                                                                         │
//! │  transport (out of scope) ──► BackOffice (api.rs)                       │
//! │                                    │                                    │
//! │                  ┌─────────────────┴─────────────────┐                  │
//! │                  ▼                                   ▼                  │
//! │         InvoiceService                         RateService              │
//! │         (invoices.rs)                          (rates.rs)               │
//! │           │        │                               │                    │
//! │           │        ▼                               │                    │
//! │           │  InvoiceNumberGenerator                │                    │
//! │           │  (numbering.rs)                        │                    │
//! │           ▼        │                               ▼                    │
//! │   InvoiceRepository / ExhibitorRepository   RateConfigRepository        │
//! │                                                                         │
//! │  ServiceError ──► ApiError ──► ApiReply { status, Envelope }            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`api`] - Envelope, status mapping, PDF attachment, `BackOffice` facade
//! - [`invoices`] - Invoice lifecycle manager
//! - [`numbering`] - Invoice number generator (fail-soft)
//! - [`rates`] - Rate configuration and calculation
//! - [`config`] - Environment configuration
//! - [`telemetry`] - Tracing setup
//! - [`error`] - Service error taxonomy

pub mod api;
pub mod config;
pub mod error;
pub mod invoices;
pub mod numbering;
pub mod rates;
pub mod telemetry;

pub use api::{ApiError, ApiReply, BackOffice, Envelope, ErrorCode, PdfAttachment};
pub use config::{ConfigError, ServiceConfig};
pub use error::{ServiceError, ServiceResult};
pub use invoices::{InvoiceService, InvoiceSettings, RenderedInvoice};
pub use numbering::InvoiceNumberGenerator;
pub use rates::RateService;
