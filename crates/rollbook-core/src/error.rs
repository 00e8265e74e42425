//! Error types for the rollbook system.
//!
//! Every variant is non-retryable: the caller must change its input or
//! the tree state before trying again.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RollbookError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Parent organization not found: {id}")]
    ParentNotFound { id: String },

    #[error("Organization code already in use: {code}")]
    DuplicateCode { code: String },

    #[error("Organization cannot be its own parent: {id}")]
    SelfParent { id: String },

    #[error("Moving {id} under {parent_id} would create a cycle")]
    CyclicReference { id: String, parent_id: String },

    #[error("Organization {id} still has child organizations")]
    HasChildren { id: String },

    #[error("Organization {id} still has {count} members on file")]
    HasMembers { id: String, count: u64 },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type RollbookResult<T> = Result<T, RollbookError>;
