//! Domain layer for the roadside SOS dispatch backend.
//!
//! This crate contains:
//! - Domain models (Alert, Entitlement, Plan, Responder, PointsRecord)
//! - Collaborator interfaces (stores, directories, notification sink)
//! - The dispatch service: entitlement resolution, quota enforcement,
//!   responder discovery and the role-gated alert state machine
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::DispatchError;
