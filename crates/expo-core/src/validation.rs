//! # Validation Module
//!
//! Input validation utilities for the Expo Back Office.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Admin frontend                                               │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: expo-service                                                 │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: rates, counts, ids, search terms                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE(invoice_number), UNIQUE(domain)                            │
//! │  └── CHECK(rate_cents >= 0), CHECK(status IN ...)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use expo_core::validation::{validate_rate_cents, validate_count};
//!
//! validate_rate_cents(200_000).unwrap();
//! assert!(validate_count("guards", 0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{InvoiceItem, NewInvoice, RateUpdate, ServiceDomain};
use crate::MAX_BULK_LINES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (no filter)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates a payment reference recorded by mark-paid.
pub fn validate_payment_id(payment_id: &str) -> ValidationResult<()> {
    let payment_id = payment_id.trim();

    if payment_id.is_empty() {
        return Err(ValidationError::Required {
            field: "paymentId".to_string(),
        });
    }

    if payment_id.len() > 120 {
        return Err(ValidationError::TooLong {
            field: "paymentId".to_string(),
            max: 120,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a rate in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (complimentary service)
///
/// ## Example
/// ```rust
/// use expo_core::validation::validate_rate_cents;
///
/// assert!(validate_rate_cents(250_000).is_ok());
/// assert!(validate_rate_cents(0).is_ok());
/// assert!(validate_rate_cents(-1).is_err());
/// ```
pub fn validate_rate_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "rateCents".to_string(),
        });
    }

    Ok(())
}

/// Validates a shift length in hours (1 to 24).
pub fn validate_shift_hours(hours: i64) -> ValidationResult<()> {
    if !(1..=24).contains(&hours) {
        return Err(ValidationError::OutOfRange {
            field: "shiftHours".to_string(),
            min: 1,
            max: 24,
        });
    }

    Ok(())
}

/// Validates a usage count (shifts, guards, days, connections, staff).
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_count(field: &str, count: i64) -> ValidationResult<()> {
    if count <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates fractional hours for the custom-hours housekeeping estimate.
pub fn validate_hours(hours: f64) -> ValidationResult<()> {
    if !hours.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "hours".to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    if hours <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "hours".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates a rate update against the rules of its domain.
///
/// Water connections have no shift length, so `shiftHours` is rejected there.
pub fn validate_rate_update(domain: ServiceDomain, update: &RateUpdate) -> ValidationResult<()> {
    if let Some(cents) = update.rate_cents {
        validate_rate_cents(cents)?;
    }

    if let Some(hours) = update.shift_hours {
        if domain.default_shift_hours().is_none() {
            return Err(ValidationError::NotAllowed {
                field: "shiftHours".to_string(),
                allowed: vec![],
            });
        }
        validate_shift_hours(hours)?;
    }

    Ok(())
}

/// Validates caller input for a new invoice.
///
/// ## Rules
/// - Company is required, at most 200 characters
/// - Amount must not be negative
/// - Items per [`validate_items`]
pub fn validate_new_invoice(input: &NewInvoice) -> ValidationResult<()> {
    validate_company(&input.company)?;
    validate_amount_cents(input.amount_cents)?;
    validate_items(&input.items)
}

/// Company name: required, at most 200 characters.
pub fn validate_company(company: &str) -> ValidationResult<()> {
    let company = company.trim();
    if company.is_empty() {
        return Err(ValidationError::Required {
            field: "company".to_string(),
        });
    }
    if company.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "company".to_string(),
            max: 200,
        });
    }
    Ok(())
}

pub fn validate_amount_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "amountCents".to_string(),
        });
    }
    Ok(())
}

/// Every item needs a description, a non-negative unit amount and, when
/// given, a positive quantity.
pub fn validate_items(items: &[InvoiceItem]) -> ValidationResult<()> {
    for item in items {
        if item.description.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "items.description".to_string(),
            });
        }
        if item.unit_amount_cents < 0 {
            return Err(ValidationError::MustNotBeNegative {
                field: "items.unitAmountCents".to_string(),
            });
        }
        if let Some(quantity) = item.quantity {
            validate_count("items.quantity", quantity)?;
        }
    }
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the size of a bulk calculation batch.
///
/// ## Rules
/// - At least one line
/// - At most MAX_BULK_LINES (500)
pub fn validate_bulk_size(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::Empty {
            field: "lines".to_string(),
        });
    }

    if lines > MAX_BULK_LINES {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_BULK_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  acme ").unwrap(), "acme");
        assert_eq!(validate_search_query("").unwrap(), "");
        assert!(validate_search_query(&"a".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_rate_cents() {
        assert!(validate_rate_cents(0).is_ok());
        assert!(validate_rate_cents(1_500_000).is_ok());
        assert!(validate_rate_cents(-100).is_err());
    }

    #[test]
    fn test_validate_count() {
        assert!(validate_count("guards", 1).is_ok());
        assert!(validate_count("guards", 0).is_err());
        assert!(validate_count("days", -3).is_err());
    }

    #[test]
    fn test_validate_hours() {
        assert!(validate_hours(4.5).is_ok());
        assert!(validate_hours(0.0).is_err());
        assert!(validate_hours(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_rate_update() {
        let update = RateUpdate {
            rate_cents: Some(300_000),
            shift_hours: Some(10),
        };
        assert!(validate_rate_update(ServiceDomain::Housekeeping, &update).is_ok());
        assert!(validate_rate_update(ServiceDomain::WaterConnection, &update).is_err());

        let update = RateUpdate {
            rate_cents: Some(-1),
            shift_hours: None,
        };
        assert!(validate_rate_update(ServiceDomain::SecurityGuard, &update).is_err());

        let update = RateUpdate {
            rate_cents: None,
            shift_hours: Some(25),
        };
        assert!(validate_rate_update(ServiceDomain::SecurityGuard, &update).is_err());
    }

    #[test]
    fn test_validate_new_invoice() {
        use chrono::Utc;

        let mut input = NewInvoice {
            company: "Acme".to_string(),
            exhibitor_id: None,
            issue_date: None,
            due_date: Utc::now(),
            amount_cents: 100_000,
            items: vec![InvoiceItem::new("Booth", 2, 50_000)],
            notes: None,
            status: None,
        };
        assert!(validate_new_invoice(&input).is_ok());

        input.company = "   ".to_string();
        assert!(matches!(
            validate_new_invoice(&input),
            Err(ValidationError::Required { .. })
        ));

        input.company = "Acme".to_string();
        input.amount_cents = -1;
        assert!(validate_new_invoice(&input).is_err());

        input.amount_cents = 0;
        input.items[0].quantity = Some(0);
        assert!(validate_new_invoice(&input).is_err());
    }

    #[test]
    fn test_validate_bulk_size() {
        assert!(validate_bulk_size(0).is_err());
        assert!(validate_bulk_size(1).is_ok());
        assert!(validate_bulk_size(MAX_BULK_LINES + 1).is_err());
    }
}
