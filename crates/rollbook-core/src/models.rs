//! Domain models for rollbook.
//!
//! These are the core types shared across all crates.

pub mod member;
pub mod organization;
