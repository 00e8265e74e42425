//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The organization repository
//! deliberately splits descriptive updates from structural writes
//! (`set_parent`/`set_level`): the latter exist only for the hierarchy
//! service, which owns the forest invariants. Repositories never
//! enforce those invariants themselves.

use uuid::Uuid;

use crate::error::RollbookResult;
use crate::models::member::{CreateMember, Member, UpdateMember};
use crate::models::organization::{CreateOrganization, Organization, UpdateOrganization};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

pub trait OrganizationRepository: Send + Sync {
    /// Insert a new organization. `level` is computed by the hierarchy
    /// service; the store never derives it. Fails with `DuplicateCode`
    /// if the code is already taken.
    fn create(
        &self,
        input: CreateOrganization,
        level: u32,
    ) -> impl Future<Output = RollbookResult<Organization>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RollbookResult<Organization>> + Send;

    fn get_by_code(
        &self,
        code: &str,
    ) -> impl Future<Output = RollbookResult<Organization>> + Send;

    /// Direct children of `parent_id`, or the root set when `None`.
    fn get_by_parent(
        &self,
        parent_id: Option<Uuid>,
    ) -> impl Future<Output = RollbookResult<Vec<Organization>>> + Send;

    /// Every organization, in creation order.
    fn get_all(&self) -> impl Future<Output = RollbookResult<Vec<Organization>>> + Send;

    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = RollbookResult<PaginatedResult<Organization>>> + Send;

    /// Overwrite descriptive fields and refresh `updated_at`.
    /// `parent_id` and `level` are not reachable from
    /// [`UpdateOrganization`].
    fn update(
        &self,
        id: Uuid,
        input: UpdateOrganization,
    ) -> impl Future<Output = RollbookResult<Organization>> + Send;

    /// Structural write: reparent a node and set its recomputed level.
    fn set_parent(
        &self,
        id: Uuid,
        parent_id: Option<Uuid>,
        level: u32,
    ) -> impl Future<Output = RollbookResult<()>> + Send;

    /// Structural write: set a node's recomputed level.
    fn set_level(&self, id: Uuid, level: u32) -> impl Future<Output = RollbookResult<()>> + Send;

    fn delete(&self, id: Uuid) -> impl Future<Output = RollbookResult<()>> + Send;
}

/// Member head-count capability.
///
/// The only thing the hierarchy service needs from the member
/// subsystem: the delete guard refuses to remove an organization that
/// still has members on file.
pub trait MemberCensus: Send + Sync {
    fn count_by_organization(
        &self,
        organization_id: Uuid,
    ) -> impl Future<Output = RollbookResult<u64>> + Send;
}

pub trait MemberRepository: MemberCensus {
    fn create(&self, input: CreateMember) -> impl Future<Output = RollbookResult<Member>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RollbookResult<Member>> + Send;

    fn update(
        &self,
        id: Uuid,
        input: UpdateMember,
    ) -> impl Future<Output = RollbookResult<Member>> + Send;

    fn delete(&self, id: Uuid) -> impl Future<Output = RollbookResult<()>> + Send;

    fn list_by_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = RollbookResult<PaginatedResult<Member>>> + Send;
}
