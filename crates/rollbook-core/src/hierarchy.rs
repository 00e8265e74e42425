//! Organization hierarchy management.
//!
//! The forest of organizational units is stored flat; everything here
//! works on parent references. [`Forest`] is a read-only snapshot index
//! for traversal, [`subtree_level_changes`] computes buffered level
//! corrections for a moved subtree, and [`HierarchyService`] is the
//! single write path that keeps the forest acyclic and
//! level-consistent.

mod forest;
mod relevel;
mod service;

pub use forest::Forest;
pub use relevel::{LevelChange, subtree_level_changes};
pub use service::HierarchyService;
