//! # Error Types
//!
//! Domain-specific error types for expo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  expo-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── RenderError      - Invoice document could not be produced         │
//! │                                                                         │
//! │  expo-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  expo-service errors                                                   │
//! │  ├── ServiceError     - NotFound / Conflict / Validation / ...         │
//! │  └── ApiError         - What the boundary serializes                   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → ApiError           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::ServiceDomain;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A usage line was submitted to the calculator of another domain.
    ///
    /// ## When This Occurs
    /// - Guard-days sent to the water-connection calculator
    /// - Shifts sent to the security calculator
    #[error("{usage} cannot be priced with the {domain} rate")]
    UsageMismatch {
        domain: ServiceDomain,
        usage: &'static str,
    },

    /// A cost does not fit into the money representation.
    #[error("Cost calculation overflowed for {domain}")]
    CostOverflow { domain: ServiceDomain },

    /// Invoice number could not be understood.
    #[error("Malformed invoice number '{number}': {reason}")]
    MalformedInvoiceNumber { number: String, reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// A collection that needs entries was empty.
    #[error("{field} must contain at least one entry")]
    Empty { field: String },
}

// =============================================================================
// Render Error
// =============================================================================

/// Failures while producing an invoice document.
///
/// A render error always means "no document": partial output is dropped
/// before the error is returned.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An item amount or the document total does not fit in i64 cents.
    #[error("Amount overflow while totalling item {index}")]
    AmountOverflow { index: usize },

    /// The configured date format is not a valid strftime pattern.
    #[error("Invalid date format '{format}'")]
    DateFormat { format: String },

    /// The PDF encoder failed.
    #[error("PDF encoding failed: {0}")]
    Encoding(String),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::UsageMismatch {
            domain: ServiceDomain::WaterConnection,
            usage: "guard-days",
        };
        assert_eq!(
            err.to_string(),
            "guard-days cannot be priced with the water_connection rate"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "company".to_string(),
        };
        assert_eq!(err.to_string(), "company is required");

        let err = ValidationError::Empty {
            field: "lines".to_string(),
        };
        assert_eq!(err.to_string(), "lines must contain at least one entry");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustNotBeNegative {
            field: "rate".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
