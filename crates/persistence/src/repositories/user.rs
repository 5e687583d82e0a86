//! User profile repository.

use async_trait::async_trait;
use domain::models::UserProfile;
use domain::services::{AccountDirectory, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db_error;
use crate::entities::UserProfileEntity;
use crate::metrics::QueryTimer;

/// Read access to account profiles owned by the account service.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountDirectory for UserRepository {
    async fn find_profile(&self, id: Uuid) -> Result<Option<UserProfile>, StoreError> {
        let timer = QueryTimer::new("find_user_profile");
        let result = sqlx::query_as::<_, UserProfileEntity>(
            "SELECT id, name, email, phone, role FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map_err(db_error)?
            .map(UserProfile::try_from)
            .transpose()
    }

    async fn list_admins(&self) -> Result<Vec<UserProfile>, StoreError> {
        let timer = QueryTimer::new("list_admin_profiles");
        let result = sqlx::query_as::<_, UserProfileEntity>(
            "SELECT id, name, email, phone, role FROM users WHERE role = 'admin' ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map_err(db_error)?
            .into_iter()
            .map(UserProfile::try_from)
            .collect()
    }
}
