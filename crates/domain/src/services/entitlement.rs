//! Entitlement resolution with auto-provisioning and plan repair.
//!
//! A requester's current entitlement may be missing or point at a plan that
//! no longer exists. Both cases are fixed here on the request path and the
//! fix is persisted, so later reads see a clean record.

use chrono::{DateTime, Duration, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::DispatchError;
use crate::models::entitlement::PROVISIONED_PERIOD_DAYS;
use crate::models::{Entitlement, EntitlementStatus, NewEntitlement, Plan, PlanTier};
use crate::services::store::{EntitlementStore, PlanCatalog};

/// How the entitlement was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Existing record with a valid plan.
    Existing,
    /// No current record existed; an entry-level one was created.
    Provisioned,
    /// The plan reference was missing and has been rewritten.
    Repaired,
}

/// A current entitlement together with its plan.
#[derive(Debug, Clone)]
pub struct ResolvedEntitlement {
    pub entitlement: Entitlement,
    pub plan: Plan,
    pub resolution: Resolution,
}

/// Lowest entry-level plan: free or trial tier, cheapest first.
pub fn select_entry_plan(plans: &[Plan]) -> Option<&Plan> {
    plans
        .iter()
        .filter(|p| p.tier.is_entry_level())
        .min_by_key(|p| (p.tier, p.price_monthly))
}

/// Picks a replacement plan for an entitlement whose plan reference is lost.
///
/// Trial or unpaid entitlements get the entry plan. Paid ones get the plan
/// whose monthly or yearly price equals the amount paid, else the standard
/// tier.
pub fn select_repair_plan<'a>(entitlement: &Entitlement, plans: &'a [Plan]) -> Option<&'a Plan> {
    if entitlement.status == EntitlementStatus::Trial || entitlement.amount == 0 {
        return select_entry_plan(plans);
    }

    plans
        .iter()
        .find(|p| p.matches_amount(entitlement.amount))
        .or_else(|| plans.iter().find(|p| p.tier == PlanTier::Standard))
}

/// Resolves the requester's current entitlement and plan.
pub async fn resolve_entitlement(
    entitlements: &dyn EntitlementStore,
    plans: &dyn PlanCatalog,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<ResolvedEntitlement, DispatchError> {
    let Some(mut entitlement) = entitlements.find_current(user_id).await? else {
        return provision(entitlements, plans, user_id, now).await;
    };

    if let Some(plan_id) = entitlement.plan_id {
        if let Some(plan) = plans.find_plan(plan_id).await? {
            return Ok(ResolvedEntitlement {
                entitlement,
                plan,
                resolution: Resolution::Existing,
            });
        }
        warn!(
            entitlement_id = %entitlement.id,
            plan_id = %plan_id,
            "Entitlement references a missing plan"
        );
    }

    let catalog = plans.list_plans().await?;
    let plan = select_repair_plan(&entitlement, &catalog).cloned().ok_or_else(|| {
        error!(
            entitlement_id = %entitlement.id,
            amount = entitlement.amount,
            "No plan available to repair entitlement"
        );
        DispatchError::Configuration(
            "Subscription plan could not be resolved. Please contact support.".to_string(),
        )
    })?;

    entitlements.repair_plan(entitlement.id, plan.id).await?;
    entitlement.plan_id = Some(plan.id);

    info!(
        entitlement_id = %entitlement.id,
        plan = %plan.name,
        "Repaired entitlement plan reference"
    );

    Ok(ResolvedEntitlement {
        entitlement,
        plan,
        resolution: Resolution::Repaired,
    })
}

async fn provision(
    entitlements: &dyn EntitlementStore,
    plans: &dyn PlanCatalog,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<ResolvedEntitlement, DispatchError> {
    let catalog = plans.list_plans().await?;
    let plan = select_entry_plan(&catalog).cloned().ok_or_else(|| {
        error!("No free or trial plan configured; cannot provision entitlements");
        DispatchError::Configuration("No default subscription plan is configured".to_string())
    })?;

    let status = if plan.tier == PlanTier::Trial {
        EntitlementStatus::Trial
    } else {
        EntitlementStatus::Active
    };

    let entitlement = entitlements
        .create_entitlement(NewEntitlement {
            user_id,
            plan_id: plan.id,
            status,
            start_date: now,
            end_date: now + Duration::days(PROVISIONED_PERIOD_DAYS),
            amount: plan.price_monthly,
        })
        .await?;

    info!(
        user_id = %user_id,
        plan = %plan.name,
        "Provisioned entry-level entitlement"
    );

    Ok(ResolvedEntitlement {
        entitlement,
        plan,
        resolution: Resolution::Provisioned,
    })
}
