//! # Invoice Numbering Rules
//!
//! Pure rules for the human-readable invoice number. Looking up the latest
//! number is I/O and lives in `expo-service`; everything else is here.
//!
//! ## Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │     INV - 202603 - 0042                                                │
//! │     ───   ──────   ────                                                │
//! │      │      │       └── sequence, zero-padded to at least 4 digits     │
//! │      │      └────────── period key YYYYMM (year + month of creation)   │
//! │      └───────────────── fixed prefix                                   │
//! │                                                                         │
//! │  Sequences restart at 0001 for every period.                           │
//! │  Sequence 10000 renders as INV-202603-10000 (no truncation).           │
//! │                                                                         │
//! │  Fallback (lookup failed):  INV-2026-41234567                          │
//! │                                   └── last 8 digits of epoch millis    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Datelike, Utc};
use std::fmt;

use crate::error::{CoreError, CoreResult};
use crate::{INVOICE_PREFIX, SEQUENCE_WIDTH};

// =============================================================================
// Period Key
// =============================================================================

/// The `YYYYMM` period scoping a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodKey {
    year: i32,
    month: u32,
}

impl PeriodKey {
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        PeriodKey {
            year: at.year(),
            month: at.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// `INV-YYYYMM-`, the prefix shared by every number of this period.
    pub fn prefix(&self) -> String {
        format!("{}-{}-", INVOICE_PREFIX, self)
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

// =============================================================================
// Formatting & Parsing
// =============================================================================

/// Formats `sequence` as a number of `period`.
///
/// ## Example
/// ```rust
/// use expo_core::numbering::{format_number, PeriodKey};
/// use chrono::{TimeZone, Utc};
///
/// let period = PeriodKey::from_datetime(Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap());
/// assert_eq!(format_number(&period, 7), "INV-202601-0007");
/// assert_eq!(format_number(&period, 12345), "INV-202601-12345");
/// ```
pub fn format_number(period: &PeriodKey, sequence: u64) -> String {
    format!(
        "{}{:0width$}",
        period.prefix(),
        sequence,
        width = SEQUENCE_WIDTH
    )
}

/// Extracts the sequence of a number belonging to `period`.
///
/// Everything after the prefix must be ASCII digits.
pub fn parse_sequence(period: &PeriodKey, number: &str) -> CoreResult<u64> {
    let malformed = |reason: &str| CoreError::MalformedInvoiceNumber {
        number: number.to_string(),
        reason: reason.to_string(),
    };

    let prefix = period.prefix();
    let rest = number
        .strip_prefix(prefix.as_str())
        .ok_or_else(|| malformed(&format!("expected prefix {prefix}")))?;

    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("sequence must be digits"));
    }

    rest.parse::<u64>()
        .map_err(|_| malformed("sequence is out of range"))
}

/// Derives the next number of `period` from the latest one, if any.
///
/// ## Rules
/// - No previous number: sequence 1
/// - Previous number: its sequence + 1
/// - Unparseable previous number: `MalformedInvoiceNumber`
pub fn next_from_latest(period: &PeriodKey, latest: Option<&str>) -> CoreResult<String> {
    let next = match latest {
        None => 1,
        Some(number) => parse_sequence(period, number)?
            .checked_add(1)
            .ok_or_else(|| CoreError::MalformedInvoiceNumber {
                number: number.to_string(),
                reason: "sequence exhausted".to_string(),
            })?,
    };
    Ok(format_number(period, next))
}

/// Time-derived number used when the sequence cannot be determined.
///
/// ## Example
/// ```rust
/// use expo_core::numbering::fallback_number;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.timestamp_millis_opt(1_760_000_123_456).unwrap();
/// assert_eq!(fallback_number(at), "INV-2025-00123456");
/// ```
pub fn fallback_number(at: DateTime<Utc>) -> String {
    format!(
        "{}-{}-{:08}",
        INVOICE_PREFIX,
        at.year(),
        at.timestamp_millis().rem_euclid(100_000_000)
    )
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn period(year: i32, month: u32) -> PeriodKey {
        PeriodKey::from_datetime(Utc.with_ymd_and_hms(year, month, 15, 10, 0, 0).unwrap())
    }

    #[test]
    fn test_period_key_display() {
        assert_eq!(period(2026, 3).to_string(), "202603");
        assert_eq!(period(2026, 12).prefix(), "INV-202612-");
    }

    #[test]
    fn test_first_number_of_period() {
        assert_eq!(next_from_latest(&period(2026, 3), None).unwrap(), "INV-202603-0001");
    }

    #[test]
    fn test_increments_latest() {
        let p = period(2026, 3);
        assert_eq!(
            next_from_latest(&p, Some("INV-202603-0009")).unwrap(),
            "INV-202603-0010"
        );
        assert_eq!(
            next_from_latest(&p, Some("INV-202603-9999")).unwrap(),
            "INV-202603-10000"
        );
        assert_eq!(
            next_from_latest(&p, Some("INV-202603-10000")).unwrap(),
            "INV-202603-10001"
        );
    }

    #[test]
    fn test_malformed_latest_is_an_error() {
        let p = period(2026, 3);
        assert!(next_from_latest(&p, Some("INV-202603-00A1")).is_err());
        assert!(next_from_latest(&p, Some("INV-202603-")).is_err());
        assert!(next_from_latest(&p, Some("INV-202602-0001")).is_err());
        assert!(next_from_latest(&p, Some("INV-202603-99999999999999999999")).is_err());
    }

    #[test]
    fn test_parse_sequence() {
        let p = period(2026, 3);
        assert_eq!(parse_sequence(&p, "INV-202603-0042").unwrap(), 42);
    }

    #[test]
    fn test_fallback_number_shape() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();
        let number = fallback_number(at);
        let rest = number.strip_prefix("INV-2026-").unwrap();
        assert_eq!(rest.len(), 8);
        assert!(rest.bytes().all(|b| b.is_ascii_digit()));
    }
}
