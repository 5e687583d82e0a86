//! Account models used by dispatch.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use shared::role::Role;

/// Authenticated caller of a dispatch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// What an actor may see and do, resolved from role plus garage ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorScope {
    Admin,
    /// Owner of the garage profile `garage_id`.
    Garage { garage_id: Uuid },
    Requester { user_id: Uuid },
}

/// Account profile as stored by the account service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// Displayable requester details attached to alert listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl From<UserProfile> for UserSummary {
    fn from(p: UserProfile) -> Self {
        Self {
            id: p.id,
            name: p.name,
            email: p.email,
            phone: p.phone,
        }
    }
}
