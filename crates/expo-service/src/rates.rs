//! # Rate Service
//!
//! Rate configuration and cost calculation for the three service domains.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  calculate_bulk(security_guard, [3×2, 1×5, 4×1])                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  rate_configs.get_or_create(security_guard)   ← one fetch per batch    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  expo_core::rates::calculate_bulk(&config, &lines)   (pure)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BulkBreakdown { lines: [6, 5, 4 guard-days], total_units: 15, ... }   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::info;

use expo_core::rates::{self, BulkBreakdown, CostBreakdown, HourlyBreakdown, Usage};
use expo_core::validation::validate_rate_update;
use expo_core::{RateConfig, RateUpdate, ServiceDomain};
use expo_db::RateConfigRepository;

use crate::error::ServiceResult;

/// Rate configuration and calculation service.
#[derive(Debug, Clone)]
pub struct RateService {
    configs: RateConfigRepository,
}

impl RateService {
    pub fn new(configs: RateConfigRepository) -> Self {
        RateService { configs }
    }

    /// Returns the record of a domain, creating the default on first access.
    pub async fn get_config(&self, domain: ServiceDomain) -> ServiceResult<RateConfig> {
        Ok(self.configs.get_or_create(domain, Utc::now()).await?)
    }

    /// Updates the rate and/or shift length of a domain in place.
    ///
    /// Fields left out of `update` keep their stored values.
    pub async fn update_config(
        &self,
        domain: ServiceDomain,
        update: RateUpdate,
    ) -> ServiceResult<RateConfig> {
        validate_rate_update(domain, &update)?;

        let now = Utc::now();
        let current = self.configs.get_or_create(domain, now).await?;

        let updated = self
            .configs
            .upsert(
                domain,
                update.rate_cents.unwrap_or(current.rate_cents),
                update.shift_hours.or(current.shift_hours),
                now,
            )
            .await?;

        info!(
            domain = %domain,
            rate_cents = updated.rate_cents,
            shift_hours = ?updated.shift_hours,
            "Rate config updated"
        );
        Ok(updated)
    }

    /// Restores the default rate and shift length of a domain.
    pub async fn reset_config(&self, domain: ServiceDomain) -> ServiceResult<RateConfig> {
        let reset = self
            .configs
            .upsert(
                domain,
                domain.default_rate().cents(),
                domain.default_shift_hours(),
                Utc::now(),
            )
            .await?;

        info!(domain = %domain, rate_cents = reset.rate_cents, "Rate config reset to default");
        Ok(reset)
    }

    /// Records of all domains, materializing defaults where missing.
    pub async fn list_configs(&self) -> ServiceResult<Vec<RateConfig>> {
        let now = Utc::now();
        let mut configs = Vec::with_capacity(ServiceDomain::ALL.len());
        for domain in ServiceDomain::ALL {
            configs.push(self.configs.get_or_create(domain, now).await?);
        }
        Ok(configs)
    }

    /// Prices one usage line against the current rate of `domain`.
    pub async fn calculate(
        &self,
        domain: ServiceDomain,
        usage: Usage,
    ) -> ServiceResult<CostBreakdown> {
        let config = self.get_config(domain).await?;
        Ok(rates::calculate(&config, &usage)?)
    }

    /// Prices a batch of lines with a single rate fetch.
    pub async fn calculate_bulk(
        &self,
        domain: ServiceDomain,
        lines: &[Usage],
    ) -> ServiceResult<BulkBreakdown> {
        let config = self.get_config(domain).await?;
        Ok(rates::calculate_bulk(&config, lines)?)
    }

    /// Housekeeping estimate for custom hours.
    pub async fn calculate_housekeeping_hours(
        &self,
        hours: f64,
        staff: i64,
    ) -> ServiceResult<HourlyBreakdown> {
        let config = self.get_config(ServiceDomain::Housekeeping).await?;
        Ok(rates::calculate_housekeeping_hours(&config, hours, staff)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use expo_db::{Database, DbConfig};

    async fn service() -> RateService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        RateService::new(db.rate_configs())
    }

    #[tokio::test]
    async fn test_get_config_is_idempotent() {
        let service = service().await;

        let first = service.get_config(ServiceDomain::Housekeeping).await.unwrap();
        let second = service.get_config(ServiceDomain::Housekeeping).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.rate_cents, 200_000);
        assert_eq!(first.shift_hours, Some(8));
    }

    #[tokio::test]
    async fn test_update_then_reset() {
        let service = service().await;

        let updated = service
            .update_config(
                ServiceDomain::SecurityGuard,
                RateUpdate {
                    rate_cents: Some(300_000),
                    shift_hours: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.rate_cents, 300_000);
        assert_eq!(updated.shift_hours, Some(12));

        let cost = service
            .calculate(ServiceDomain::SecurityGuard, Usage::GuardDays { guards: 2, days: 3 })
            .await
            .unwrap();
        assert_eq!(cost.total_cents, 1_800_000);

        service.reset_config(ServiceDomain::SecurityGuard).await.unwrap();
        let config = service.get_config(ServiceDomain::SecurityGuard).await.unwrap();
        assert_eq!(config.rate_cents, 250_000);
        assert_eq!(config.id, updated.id);
    }

    #[tokio::test]
    async fn test_reset_restores_every_default() {
        let service = service().await;
        for domain in ServiceDomain::ALL {
            service
                .update_config(
                    domain,
                    RateUpdate {
                        rate_cents: Some(1),
                        shift_hours: None,
                    },
                )
                .await
                .unwrap();
            service.reset_config(domain).await.unwrap();
        }

        let rates: Vec<i64> = service
            .list_configs()
            .await
            .unwrap()
            .iter()
            .map(|c| c.rate().major())
            .collect();
        assert_eq!(rates, vec![2000, 2500, 15000]);
    }

    #[tokio::test]
    async fn test_invalid_updates() {
        let service = service().await;

        let negative = RateUpdate {
            rate_cents: Some(-5),
            shift_hours: None,
        };
        assert!(matches!(
            service.update_config(ServiceDomain::Housekeeping, negative).await,
            Err(ServiceError::Validation(_))
        ));

        let water_shift = RateUpdate {
            rate_cents: None,
            shift_hours: Some(8),
        };
        assert!(matches!(
            service.update_config(ServiceDomain::WaterConnection, water_shift).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_bulk_and_mismatch() {
        let service = service().await;

        let lines = [
            Usage::Connections { connections: 1 },
            Usage::Connections { connections: 4 },
        ];
        let bulk = service
            .calculate_bulk(ServiceDomain::WaterConnection, &lines)
            .await
            .unwrap();
        assert_eq!(bulk.lines[1].total_cents, 6_000_000);
        assert_eq!(bulk.total_cents, 7_500_000);

        assert!(matches!(
            service
                .calculate(ServiceDomain::WaterConnection, Usage::Shifts { shifts: 2 })
                .await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            service.calculate_bulk(ServiceDomain::Housekeeping, &[]).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_housekeeping_hours() {
        let service = service().await;
        let estimate = service.calculate_housekeeping_hours(4.5, 3).await.unwrap();
        assert_eq!(estimate.hourly_rate_cents, 25_000);
        assert_eq!(estimate.total_cents, 337_500);
    }
}
