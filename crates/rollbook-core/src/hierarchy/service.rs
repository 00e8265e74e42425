//! Hierarchy service — the single write path for the organization
//! forest.

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{RollbookError, RollbookResult};
use crate::models::organization::{
    CreateOrganization, Organization, OrganizationNode, UpdateOrganization,
};
use crate::repository::{MemberCensus, OrganizationRepository};

use super::forest::Forest;
use super::relevel::subtree_level_changes;

/// Hierarchy service.
///
/// Generic over repository implementations so that the hierarchy layer
/// has no dependency on the database crate.
///
/// All structural mutations run under one process-wide mutex: the
/// cycle-check read, the parent-existence read and every resulting
/// write happen without interleaving, so concurrent readers never
/// observe a cyclic or mis-leveled forest. Reads take no lock; each
/// builds its own consistent snapshot.
pub struct HierarchyService<O: OrganizationRepository, M: MemberCensus> {
    organizations: O,
    members: M,
    structural: Mutex<()>,
}

impl<O: OrganizationRepository, M: MemberCensus> HierarchyService<O, M> {
    pub fn new(organizations: O, members: M) -> Self {
        Self {
            organizations,
            members,
            structural: Mutex::new(()),
        }
    }

    /// Create an organization, deriving its level from the parent.
    pub async fn create(&self, input: CreateOrganization) -> RollbookResult<Organization> {
        let _guard = self.structural.lock().await;

        // 1. Validate the name.
        if input.name.trim().is_empty() {
            return Err(RollbookError::Validation {
                message: "organization name must not be empty".into(),
            });
        }

        // 2. A requested code must not be in use anywhere.
        if let Some(code) = &input.code {
            self.ensure_code_free(code, None).await?;
        }

        // 3. Derive the level from the parent chain.
        let level = match input.parent_id {
            Some(parent_id) => self.parent_level(parent_id).await? + 1,
            None => 1,
        };

        // 4. Persist. `is_active` defaults to true in the store.
        self.organizations.create(input, level).await
    }

    /// Reparent an organization and recompute levels across its whole
    /// subtree. `new_parent_id = None` makes it a root.
    pub async fn move_organization(
        &self,
        id: Uuid,
        new_parent_id: Option<Uuid>,
    ) -> RollbookResult<()> {
        let _guard = self.structural.lock().await;

        // One snapshot backs every check and the buffered relevel.
        let forest = Forest::new(self.organizations.get_all().await?);
        if !forest.contains(id) {
            return Err(not_found(id));
        }

        let new_level = match new_parent_id {
            Some(parent_id) => {
                if parent_id == id {
                    return Err(RollbookError::SelfParent { id: id.to_string() });
                }
                if forest.is_descendant(id, parent_id) {
                    return Err(RollbookError::CyclicReference {
                        id: id.to_string(),
                        parent_id: parent_id.to_string(),
                    });
                }
                let parent =
                    forest
                        .get(parent_id)
                        .ok_or_else(|| RollbookError::ParentNotFound {
                            id: parent_id.to_string(),
                        })?;
                parent.level + 1
            }
            None => 1,
        };

        // Buffer the subtree's corrected levels before any write, then
        // apply parents-first.
        let changes = subtree_level_changes(&forest, id, new_level);

        self.organizations
            .set_parent(id, new_parent_id, new_level)
            .await?;
        for change in &changes {
            self.organizations.set_level(change.id, change.level).await?;
        }

        Ok(())
    }

    /// Update descriptive fields. Structural changes must go through
    /// [`Self::move_organization`].
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateOrganization,
    ) -> RollbookResult<Organization> {
        let _guard = self.structural.lock().await;

        if let Some(name) = &input.name {
            if name.trim().is_empty() {
                return Err(RollbookError::Validation {
                    message: "organization name must not be empty".into(),
                });
            }
        }

        // A changed code must be free, its current holder excepted.
        if let Some(Some(code)) = &input.code {
            self.ensure_code_free(code, Some(id)).await?;
        }

        self.organizations.update(id, input).await
    }

    /// Delete a childless, memberless organization.
    pub async fn delete(&self, id: Uuid) -> RollbookResult<()> {
        let _guard = self.structural.lock().await;

        let org = self.organizations.get_by_id(id).await?;

        let children = self.organizations.get_by_parent(Some(org.id)).await?;
        if !children.is_empty() {
            return Err(RollbookError::HasChildren { id: id.to_string() });
        }

        let count = self.members.count_by_organization(id).await?;
        if count > 0 {
            return Err(RollbookError::HasMembers {
                id: id.to_string(),
                count,
            });
        }

        self.organizations.delete(id).await
    }

    // -------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------

    pub async fn get(&self, id: Uuid) -> RollbookResult<Organization> {
        self.organizations.get_by_id(id).await
    }

    /// All organizations below `id`, breadth-first.
    pub async fn descendants(&self, id: Uuid) -> RollbookResult<Vec<Organization>> {
        let forest = Forest::new(self.organizations.get_all().await?);
        if !forest.contains(id) {
            return Err(not_found(id));
        }
        Ok(forest.descendants(id).into_iter().cloned().collect())
    }

    /// All organizations above `id`, nearest first.
    pub async fn ancestors(&self, id: Uuid) -> RollbookResult<Vec<Organization>> {
        let forest = Forest::new(self.organizations.get_all().await?);
        if !forest.contains(id) {
            return Err(not_found(id));
        }
        Ok(forest.ancestors(id).into_iter().cloned().collect())
    }

    pub async fn roots(&self) -> RollbookResult<Vec<Organization>> {
        self.organizations.get_by_parent(None).await
    }

    pub async fn leaves(&self) -> RollbookResult<Vec<Organization>> {
        let forest = Forest::new(self.organizations.get_all().await?);
        Ok(forest.leaves().into_iter().cloned().collect())
    }

    /// The whole forest, nested for display.
    pub async fn tree(&self) -> RollbookResult<Vec<OrganizationNode>> {
        let forest = Forest::new(self.organizations.get_all().await?);
        Ok(forest.nested())
    }

    /// The forest restricted to active organizations.
    pub async fn active_tree(&self) -> RollbookResult<Vec<OrganizationNode>> {
        let forest = Forest::new(self.organizations.get_all().await?);
        Ok(forest.nested_active())
    }

    // -------------------------------------------------------------------

    /// Reject `code` if any organization other than `except` holds it.
    async fn ensure_code_free(&self, code: &str, except: Option<Uuid>) -> RollbookResult<()> {
        match self.organizations.get_by_code(code).await {
            Ok(holder) if Some(holder.id) != except => Err(RollbookError::DuplicateCode {
                code: code.to_string(),
            }),
            Ok(_) => Ok(()),
            Err(RollbookError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Level of the prospective parent, or `ParentNotFound`.
    async fn parent_level(&self, parent_id: Uuid) -> RollbookResult<u32> {
        match self.organizations.get_by_id(parent_id).await {
            Ok(parent) => Ok(parent.level),
            Err(RollbookError::NotFound { .. }) => Err(RollbookError::ParentNotFound {
                id: parent_id.to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}

fn not_found(id: Uuid) -> RollbookError {
    RollbookError::NotFound {
        entity: "organization".into(),
        id: id.to_string(),
    }
}
