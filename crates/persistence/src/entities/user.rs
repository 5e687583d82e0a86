//! User entity (database row mapping).

use domain::models::{Role, UserProfile};
use domain::services::StoreError;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table, limited to profile fields.
#[derive(Debug, Clone, FromRow)]
pub struct UserProfileEntity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
}

impl TryFrom<UserProfileEntity> for UserProfile {
    type Error = StoreError;

    fn try_from(entity: UserProfileEntity) -> Result<Self, Self::Error> {
        let role = entity.role.parse::<Role>().map_err(StoreError::Corrupt)?;

        Ok(UserProfile {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            phone: entity.phone,
            role,
        })
    }
}
