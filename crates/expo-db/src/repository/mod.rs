//! # Repository Module
//!
//! Database repository implementations for the Expo Back Office.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  InvoiceService                                                        │
//! │       │                                                                 │
//! │       │  invoices.latest_number_with_prefix("INV-202610-")             │
//! │       │  invoices.insert(&invoice)                                     │
//! │       ▼                                                                 │
//! │  InvoiceRepository                                                     │
//! │  ├── get_by_id / latest_number_with_prefix                             │
//! │  ├── list (filters + pagination) / count                               │
//! │  ├── insert / update / delete                                          │
//! │  └── stats (grouped count + sum)                                       │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`invoice::InvoiceRepository`] - Invoice CRUD, listing and statistics
//! - [`rate_config::RateConfigRepository`] - One rate record per domain
//! - [`exhibitor::ExhibitorRepository`] - Linked customer records

pub mod exhibitor;
pub mod invoice;
pub mod rate_config;
