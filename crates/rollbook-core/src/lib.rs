//! Rollbook core — domain models, repository contracts and the
//! organization hierarchy engine.
//!
//! This crate is storage-agnostic: repositories are trait definitions
//! implemented elsewhere (see `rollbook-db`), and the hierarchy service
//! is generic over them.

pub mod error;
pub mod hierarchy;
pub mod models;
pub mod repository;
