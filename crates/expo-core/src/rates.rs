//! # Service-Rate Calculators
//!
//! Pure pricing of housekeeping, security and water-connection usage against
//! the fetched [`RateConfig`] of a domain.
//!
//! ## Formulas
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Housekeeping   total = rate_per_shift × shifts                        │
//! │  Security       total = rate_per_guard_day × guards × days             │
//! │  Water          total = cost_per_connection × connections              │
//! │                                                                         │
//! │  Housekeeping (custom hours)                                           │
//! │    hourly = rate_per_shift / shift_hours      rounded to cents         │
//! │    total  = hourly × hours × staff            rounded to whole units   │
//! │                                                                         │
//! │  Bulk: one RateConfig, many lines                                      │
//! │    line_i = rate × units_i       grand_total = Σ line_i                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All arithmetic is checked; a result that does not fit in i64 cents is a
//! `CostOverflow`, never a wrapped value.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{RateConfig, ServiceDomain};
use crate::validation::{validate_bulk_size, validate_count, validate_hours, validate_rate_cents};

// =============================================================================
// Usage
// =============================================================================

/// A quantity of service to be priced.
///
/// The variant must match the domain of the rate it is priced against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Usage {
    /// Housekeeping shifts.
    Shifts { shifts: i64 },
    /// Security guards over a number of days.
    GuardDays { guards: i64, days: i64 },
    /// Water connections.
    Connections { connections: i64 },
}

impl Usage {
    /// The only domain that can price this usage.
    pub const fn domain(&self) -> ServiceDomain {
        match self {
            Usage::Shifts { .. } => ServiceDomain::Housekeeping,
            Usage::GuardDays { .. } => ServiceDomain::SecurityGuard,
            Usage::Connections { .. } => ServiceDomain::WaterConnection,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Usage::Shifts { .. } => "shifts",
            Usage::GuardDays { .. } => "guard-days",
            Usage::Connections { .. } => "connections",
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            Usage::Shifts { shifts } => validate_count("shifts", shifts),
            Usage::GuardDays { guards, days } => {
                validate_count("guards", guards)?;
                validate_count("days", days)
            }
            Usage::Connections { connections } => validate_count("connections", connections),
        }
    }

    /// Number of rate units this usage consumes.
    fn units(&self) -> Option<i64> {
        match *self {
            Usage::Shifts { shifts } => Some(shifts),
            Usage::GuardDays { guards, days } => guards.checked_mul(days),
            Usage::Connections { connections } => Some(connections),
        }
    }
}

// =============================================================================
// Breakdowns
// =============================================================================

/// Cost of one usage line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub domain: ServiceDomain,
    pub usage: Usage,
    pub rate_cents: i64,
    /// Shifts, guard-days or connections.
    pub units: i64,
    pub total_cents: i64,
}

impl CostBreakdown {
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Cost of a batch priced against one rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BulkBreakdown {
    pub domain: ServiceDomain,
    pub rate_cents: i64,
    /// Per-line results, in input order.
    pub lines: Vec<CostBreakdown>,
    pub total_units: i64,
    pub total_cents: i64,
}

/// Housekeeping estimate for an arbitrary number of hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct HourlyBreakdown {
    pub rate_cents: i64,
    pub shift_hours: i64,
    /// Rate per hour, rounded to cents.
    pub hourly_rate_cents: i64,
    pub hours: f64,
    pub staff: i64,
    /// Rounded to whole currency units (always a multiple of 100).
    pub total_cents: i64,
}

// =============================================================================
// Calculators
// =============================================================================

/// Prices one usage line.
///
/// ## Errors
/// - `UsageMismatch` when the usage belongs to another domain
/// - `Validation` for non-positive counts or a negative stored rate
/// - `CostOverflow` when the total does not fit
pub fn calculate(config: &RateConfig, usage: &Usage) -> CoreResult<CostBreakdown> {
    validate_rate_cents(config.rate_cents)?;
    price_line(config, usage)
}

/// Prices a batch of lines with a single rate.
///
/// ## Example
/// ```rust
/// use expo_core::rates::{calculate_bulk, Usage};
/// use expo_core::types::{RateConfig, ServiceDomain};
/// use chrono::Utc;
///
/// let config = RateConfig::default_for(ServiceDomain::WaterConnection, "w".into(), Utc::now());
/// let lines = [Usage::Connections { connections: 2 }, Usage::Connections { connections: 3 }];
/// let bulk = calculate_bulk(&config, &lines).unwrap();
///
/// assert_eq!(bulk.lines[0].total_cents, 3_000_000);
/// assert_eq!(bulk.total_cents, 7_500_000);
/// ```
pub fn calculate_bulk(config: &RateConfig, lines: &[Usage]) -> CoreResult<BulkBreakdown> {
    validate_rate_cents(config.rate_cents)?;
    validate_bulk_size(lines.len())?;

    let overflow = || CoreError::CostOverflow {
        domain: config.domain,
    };

    let mut breakdowns = Vec::with_capacity(lines.len());
    let mut total_units: i64 = 0;
    let mut total_cents: i64 = 0;

    for usage in lines {
        let line = price_line(config, usage)?;
        total_units = total_units.checked_add(line.units).ok_or_else(overflow)?;
        total_cents = total_cents
            .checked_add(line.total_cents)
            .ok_or_else(overflow)?;
        breakdowns.push(line);
    }

    Ok(BulkBreakdown {
        domain: config.domain,
        rate_cents: config.rate_cents,
        lines: breakdowns,
        total_units,
        total_cents,
    })
}

/// Estimates housekeeping cost for `hours` of work by `staff` people.
///
/// ## Example
/// ```rust
/// use expo_core::rates::calculate_housekeeping_hours;
/// use expo_core::types::{RateConfig, ServiceDomain};
/// use chrono::Utc;
///
/// // 2000 per 8-hour shift → 250.00 per hour
/// let config = RateConfig::default_for(ServiceDomain::Housekeeping, "h".into(), Utc::now());
/// let estimate = calculate_housekeeping_hours(&config, 4.5, 3).unwrap();
///
/// assert_eq!(estimate.hourly_rate_cents, 25_000);
/// assert_eq!(estimate.total_cents, 337_500);
/// ```
pub fn calculate_housekeeping_hours(
    config: &RateConfig,
    hours: f64,
    staff: i64,
) -> CoreResult<HourlyBreakdown> {
    if config.domain != ServiceDomain::Housekeeping {
        return Err(CoreError::UsageMismatch {
            domain: config.domain,
            usage: "hours",
        });
    }
    validate_rate_cents(config.rate_cents)?;
    validate_hours(hours)?;
    validate_count("staff", staff)?;

    let shift_hours = config
        .shift_hours
        .or(config.domain.default_shift_hours())
        .filter(|h| *h > 0)
        .ok_or(ValidationError::MustBePositive {
            field: "shiftHours".to_string(),
        })?;

    // Half-up division; rate_cents is non-negative here.
    let hourly_rate_cents = (config.rate_cents / shift_hours)
        + i64::from((config.rate_cents % shift_hours) * 2 >= shift_hours);

    let total_major = (hourly_rate_cents as f64 / 100.0) * hours * staff as f64;
    let total_major = total_major.round();
    if !total_major.is_finite() || total_major >= (i64::MAX / 100) as f64 {
        return Err(CoreError::CostOverflow {
            domain: config.domain,
        });
    }

    Ok(HourlyBreakdown {
        rate_cents: config.rate_cents,
        shift_hours,
        hourly_rate_cents,
        hours,
        staff,
        total_cents: total_major as i64 * 100,
    })
}

fn price_line(config: &RateConfig, usage: &Usage) -> CoreResult<CostBreakdown> {
    if usage.domain() != config.domain {
        return Err(CoreError::UsageMismatch {
            domain: config.domain,
            usage: usage.label(),
        });
    }
    usage.validate()?;

    let overflow = || CoreError::CostOverflow {
        domain: config.domain,
    };
    let units = usage.units().ok_or_else(overflow)?;
    let total = config.rate().checked_multiply(units).ok_or_else(overflow)?;

    Ok(CostBreakdown {
        domain: config.domain,
        usage: *usage,
        rate_cents: config.rate_cents,
        units,
        total_cents: total.cents(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
