//! SOS alert repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{Alert, AlertFilter, AlertStatus, NewAlert, StatusMatch};
use domain::services::{AlertStore, StoreError, Transition};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db_error;
use crate::entities::alert::{AlertEntity, ALERT_COLUMNS};
use crate::metrics::QueryTimer;

/// Repository for SOS alert database operations.
#[derive(Clone)]
pub struct AlertRepository {
    pool: PgPool,
}

impl AlertRepository {
    /// Creates a new AlertRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn status_names(statuses: &[AlertStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

/// Appends the OR-of-clauses condition for `filter`.
fn push_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &AlertFilter) {
    for (i, clause) in filter.any_of.iter().enumerate() {
        if i > 0 {
            query.push(" OR ");
        }
        query.push("(TRUE");
        match &clause.statuses {
            StatusMatch::Any => {}
            StatusMatch::In(list) => {
                query
                    .push(" AND status = ANY(")
                    .push_bind(status_names(list))
                    .push(")");
            }
            StatusMatch::NotIn(list) => {
                query
                    .push(" AND NOT (status = ANY(")
                    .push_bind(status_names(list))
                    .push("))");
            }
        }
        if let Some(user_id) = clause.created_by {
            query.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(garage_id) = clause.assigned_garage {
            query.push(" AND assigned_garage = ").push_bind(garage_id);
        }
        query.push(")");
    }
}

#[async_trait]
impl AlertStore for AlertRepository {
    async fn create_alert(&self, new: NewAlert) -> Result<Alert, StoreError> {
        let timer = QueryTimer::new("create_sos_alert");
        let result = sqlx::query_as::<_, AlertEntity>(&format!(
            r#"
            INSERT INTO sos_alerts (
                user_id, longitude, latitude, address, phone, vehicle_type,
                status, priority, sla_deadline, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $8, $9, $9)
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(new.location.longitude)
        .bind(new.location.latitude)
        .bind(&new.address)
        .bind(&new.phone)
        .bind(&new.vehicle_type)
        .bind(new.priority.as_str())
        .bind(new.sla_deadline)
        .bind(new.created_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result.map_err(db_error)?.try_into()
    }

    async fn find_alert(&self, id: Uuid) -> Result<Option<Alert>, StoreError> {
        let timer = QueryTimer::new("find_sos_alert_by_id");
        let result = sqlx::query_as::<_, AlertEntity>(&format!(
            "SELECT {ALERT_COLUMNS} FROM sos_alerts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result.map_err(db_error)?.map(Alert::try_from).transpose()
    }

    async fn list_alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>, StoreError> {
        if filter.any_of.is_empty() {
            return Ok(Vec::new());
        }

        let timer = QueryTimer::new("list_sos_alerts");
        let mut query =
            QueryBuilder::<Postgres>::new(format!("SELECT {ALERT_COLUMNS} FROM sos_alerts WHERE "));
        push_filter(&mut query, filter);
        query.push(" ORDER BY created_at DESC, id DESC");

        let result = query
            .build_query_as::<AlertEntity>()
            .fetch_all(&self.pool)
            .await;
        timer.record();

        result
            .map_err(db_error)?
            .into_iter()
            .map(Alert::try_from)
            .collect()
    }

    async fn apply_transition(
        &self,
        id: Uuid,
        expected: AlertStatus,
        expected_garage: Option<Uuid>,
        transition: Transition,
        at: DateTime<Utc>,
    ) -> Result<Option<Alert>, StoreError> {
        let timer = QueryTimer::new("transition_sos_alert");
        // Status and assignee check plus write in one statement: concurrent
        // changes serialize on the row lock and the loser matches no row.
        let result = sqlx::query_as::<_, AlertEntity>(&format!(
            r#"
            UPDATE sos_alerts
            SET status = $3,
                assigned_garage = COALESCE($4, assigned_garage),
                assigned_at = CASE WHEN $4::uuid IS NULL THEN assigned_at ELSE $5 END,
                resolved_at = CASE WHEN $3 = 'resolved' THEN $5 ELSE resolved_at END,
                updated_at = $5
            WHERE id = $1 AND status = $2 AND assigned_garage IS NOT DISTINCT FROM $6
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(expected.as_str())
        .bind(transition.to.as_str())
        .bind(transition.assign_garage)
        .bind(at)
        .bind(expected_garage)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result.map_err(db_error)?.map(Alert::try_from).transpose()
    }
}
