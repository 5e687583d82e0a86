//! Shared utilities and common types for the roadside dispatch backend.
//!
//! This crate provides common functionality used across all other crates:
//! - JWT access token encoding and decoding
//! - Account roles carried in tokens
//! - Common validation logic

pub mod jwt;
pub mod role;
pub mod validation;
