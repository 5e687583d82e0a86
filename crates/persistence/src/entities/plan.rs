//! Plan entity (database row mapping).

use domain::models::{CoverageMode, Plan, PlanLimits, PlanTier};
use domain::services::StoreError;
use sqlx::FromRow;
use uuid::Uuid;

pub const PLAN_COLUMNS: &str =
    "id, name, tier, price_monthly, price_yearly, service_calls, service_radius_km, coverage_mode";

/// Database row mapping for the plans table.
#[derive(Debug, Clone, FromRow)]
pub struct PlanEntity {
    pub id: Uuid,
    pub name: String,
    pub tier: String,
    pub price_monthly: i64,
    pub price_yearly: i64,
    pub service_calls: Option<i32>,
    pub service_radius_km: Option<f64>,
    pub coverage_mode: Option<String>,
}

impl TryFrom<PlanEntity> for Plan {
    type Error = StoreError;

    fn try_from(entity: PlanEntity) -> Result<Self, Self::Error> {
        let tier = entity.tier.parse::<PlanTier>().map_err(StoreError::Corrupt)?;
        let coverage_mode = entity
            .coverage_mode
            .as_deref()
            .map(str::parse::<CoverageMode>)
            .transpose()
            .map_err(StoreError::Corrupt)?;

        Ok(Plan {
            id: entity.id,
            name: entity.name,
            tier,
            price_monthly: entity.price_monthly,
            price_yearly: entity.price_yearly,
            limits: PlanLimits {
                service_calls: entity.service_calls,
                service_radius: entity.service_radius_km,
                coverage_mode,
            },
        })
    }
}
