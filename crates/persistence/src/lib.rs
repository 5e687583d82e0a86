//! Persistence layer for the SOS dispatch backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations of the dispatch store traits

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;

use std::sync::Arc;

use domain::services::{DispatchStores, StoreError};
use sqlx::PgPool;

use repositories::{
    AlertRepository, GarageRepository, PlanRepository, PointsRepository, SubscriptionRepository,
    UserRepository,
};

/// Maps a driver error into the domain store error.
pub(crate) fn db_error(err: sqlx::Error) -> StoreError {
    tracing::error!(error = %err, "Database operation failed");
    StoreError::Database(err.to_string())
}

/// Builds the PostgreSQL-backed store set used by the dispatch service.
pub fn dispatch_stores(pool: PgPool) -> DispatchStores {
    DispatchStores {
        alerts: Arc::new(AlertRepository::new(pool.clone())),
        entitlements: Arc::new(SubscriptionRepository::new(pool.clone())),
        plans: Arc::new(PlanRepository::new(pool.clone())),
        responders: Arc::new(GarageRepository::new(pool.clone())),
        accounts: Arc::new(UserRepository::new(pool.clone())),
        rewards: Arc::new(PointsRepository::new(pool)),
    }
}
