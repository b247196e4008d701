//! # Service Error Types
//!
//! The error taxonomy every service operation reports in.
//!
//! ## Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbError::NotFound                         → ServiceError::NotFound     │
//! │  DbError::UniqueViolation                  → ServiceError::Conflict     │
//! │  DbError::ConnectionFailed / PoolExhausted / Busy → Unavailable         │
//! │  DbError (anything else)                   → ServiceError::Internal     │
//! │  CoreError::Validation / UsageMismatch     → ServiceError::Validation   │
//! │  CoreError::CostOverflow                   → ServiceError::Validation   │
//! │  RenderError                               → ServiceError::Render       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use expo_core::{CoreError, RenderError, ValidationError};
use expo_db::DbError;
use thiserror::Error;

/// Errors returned by the lifecycle manager and the rate service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A uniqueness rule was violated (e.g. invoice number collisions
    /// outlasted every retry).
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// The store could not be reached.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            DbError::UniqueViolation { .. } => ServiceError::Conflict(err.to_string()),
            _ if err.is_unavailable() => ServiceError::Unavailable(err.to_string()),
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(inner) => ServiceError::Validation(inner.to_string()),
            CoreError::MalformedInvoiceNumber { .. } => ServiceError::Internal(err.to_string()),
            CoreError::UsageMismatch { .. } | CoreError::CostOverflow { .. } => {
                ServiceError::Validation(err.to_string())
            }
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use expo_core::ServiceDomain;

    #[test]
    fn test_db_error_mapping() {
        assert!(matches!(
            ServiceError::from(DbError::duplicate("invoices.invoice_number", "INV-202610-0001")),
            ServiceError::Conflict(_)
        ));
        assert!(matches!(
            ServiceError::from(DbError::PoolExhausted),
            ServiceError::Unavailable(_)
        ));
        assert!(matches!(
            ServiceError::from(DbError::Busy("database is locked".into())),
            ServiceError::Unavailable(_)
        ));
        assert!(matches!(
            ServiceError::from(DbError::not_found("Invoice", "x")),
            ServiceError::NotFound { .. }
        ));
        assert!(matches!(
            ServiceError::from(DbError::QueryFailed("boom".into())),
            ServiceError::Internal(_)
        ));
    }

    #[test]
    fn test_core_error_mapping() {
        let mismatch = CoreError::UsageMismatch {
            domain: ServiceDomain::WaterConnection,
            usage: "guard-days",
        };
        let err = ServiceError::from(mismatch);
        assert_eq!(
            err.to_string(),
            "Validation failed: guard-days cannot be priced with the water_connection rate"
        );
    }
}
