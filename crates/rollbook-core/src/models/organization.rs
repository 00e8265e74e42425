//! Organization domain model.
//!
//! Organizational units form a forest: each unit carries an optional
//! parent reference and a derived depth level (root = 1). The shape of
//! the forest is managed exclusively by the hierarchy service.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification of an organizational unit.
///
/// Informational only — the hierarchy algorithms never branch on it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrganizationType {
    Committee,
    GeneralBranch,
    Branch,
    WorkCommittee,
}

/// An organizational unit of the membership organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    /// Human-readable name. Never empty.
    pub name: String,
    /// Optional registry code, globally unique when present.
    pub code: Option<String>,
    pub org_type: OrganizationType,
    /// `None` marks a root organization.
    pub parent_id: Option<Uuid>,
    /// Depth in the tree, root = 1. Derived — writable only through the
    /// hierarchy service, never by callers.
    pub level: u32,
    pub secretary_id: Option<Uuid>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub contact_phone: Option<String>,
    pub established_date: Option<NaiveDate>,
    /// Inactive organizations stay in the store and keep their place in
    /// the hierarchy; they are only dropped from the active-tree view.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new organization.
///
/// There is no `level` here: it is computed from the parent at creation
/// time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    pub code: Option<String>,
    pub org_type: OrganizationType,
    pub parent_id: Option<Uuid>,
    pub secretary_id: Option<Uuid>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub contact_phone: Option<String>,
    pub established_date: Option<NaiveDate>,
    /// Defaults to `true` if unset.
    pub is_active: Option<bool>,
}

/// Fields that can be updated on an existing organization.
///
/// Carries neither `parent_id` nor `level`; structural changes go
/// through the hierarchy service's move operation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub code: Option<Option<String>>,
    pub org_type: Option<OrganizationType>,
    pub secretary_id: Option<Option<Uuid>>,
    pub description: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub contact_phone: Option<Option<String>>,
    pub established_date: Option<Option<NaiveDate>>,
    pub is_active: Option<bool>,
}

/// An organization with its children attached, for tree views.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationNode {
    pub organization: Organization,
    pub children: Vec<OrganizationNode>,
}
