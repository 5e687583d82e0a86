//! Plan catalog repository.

use async_trait::async_trait;
use domain::models::Plan;
use domain::services::{PlanCatalog, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db_error;
use crate::entities::plan::{PlanEntity, PLAN_COLUMNS};
use crate::metrics::QueryTimer;

/// Read-only access to the plans table.
#[derive(Clone)]
pub struct PlanRepository {
    pool: PgPool,
}

impl PlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanCatalog for PlanRepository {
    async fn find_plan(&self, id: Uuid) -> Result<Option<Plan>, StoreError> {
        let timer = QueryTimer::new("find_plan_by_id");
        let result = sqlx::query_as::<_, PlanEntity>(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result.map_err(db_error)?.map(Plan::try_from).transpose()
    }

    async fn list_plans(&self) -> Result<Vec<Plan>, StoreError> {
        let timer = QueryTimer::new("list_plans");
        let result = sqlx::query_as::<_, PlanEntity>(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans ORDER BY price_monthly ASC, created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map_err(db_error)?
            .into_iter()
            .map(Plan::try_from)
            .collect()
    }
}
