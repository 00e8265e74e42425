//! Integration tests for the hierarchy service on in-memory SurrealDB:
//! level derivation, cycle refusal, cascading relevel and the delete
//! guards.

use rollbook_core::error::RollbookError;
use rollbook_core::hierarchy::HierarchyService;
use rollbook_core::models::member::CreateMember;
use rollbook_core::models::organization::{
    CreateOrganization, OrganizationType, UpdateOrganization,
};
use rollbook_core::repository::{MemberRepository, OrganizationRepository};
use rollbook_db::repository::{SurrealMemberRepository, SurrealOrganizationRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;
type Service = HierarchyService<SurrealOrganizationRepository<Db>, SurrealMemberRepository<Db>>;

/// Helper: in-memory DB, migrations, service plus direct repo handles.
async fn setup() -> (
    Service,
    SurrealOrganizationRepository<Db>,
    SurrealMemberRepository<Db>,
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    rollbook_db::run_migrations(&db).await.unwrap();

    let org_repo = SurrealOrganizationRepository::new(db.clone());
    let member_repo = SurrealMemberRepository::new(db);
    let service = HierarchyService::new(org_repo.clone(), member_repo.clone());
    (service, org_repo, member_repo)
}

fn unit(name: &str, org_type: OrganizationType, parent_id: Option<Uuid>) -> CreateOrganization {
    CreateOrganization {
        name: name.into(),
        code: None,
        org_type,
        parent_id,
        secretary_id: None,
        description: None,
        address: None,
        contact_phone: None,
        established_date: None,
        is_active: None,
    }
}

/// Every stored organization must satisfy: root ⇒ level 1, otherwise
/// level = parent.level + 1.
async fn assert_level_invariant(repo: &SurrealOrganizationRepository<Db>) {
    let all = repo.get_all().await.unwrap();
    for org in &all {
        match org.parent_id {
            None => assert_eq!(org.level, 1, "root {} must be level 1", org.name),
            Some(parent_id) => {
                let parent = all
                    .iter()
                    .find(|o| o.id == parent_id)
                    .unwrap_or_else(|| panic!("parent of {} missing", org.name));
                assert_eq!(
                    org.level,
                    parent.level + 1,
                    "level of {} inconsistent with parent {}",
                    org.name,
                    parent.name
                );
            }
        }
    }
}

// -----------------------------------------------------------------------
// Create
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_assigns_levels_from_parent() {
    let (service, org_repo, _) = setup().await;

    let committee = service
        .create(unit("Committee", OrganizationType::Committee, None))
        .await
        .unwrap();
    assert_eq!(committee.level, 1);
    assert!(committee.is_active);

    let general = service
        .create(unit(
            "General Branch",
            OrganizationType::GeneralBranch,
            Some(committee.id),
        ))
        .await
        .unwrap();
    assert_eq!(general.level, 2);

    let branch = service
        .create(unit("Branch", OrganizationType::Branch, Some(general.id)))
        .await
        .unwrap();
    assert_eq!(branch.level, 3);

    assert_level_invariant(&org_repo).await;
}

#[tokio::test]
async fn create_rejects_missing_parent() {
    let (service, _, _) = setup().await;

    let result = service
        .create(unit(
            "Orphan",
            OrganizationType::Branch,
            Some(Uuid::new_v4()),
        ))
        .await;
    assert!(matches!(result, Err(RollbookError::ParentNotFound { .. })));
}

#[tokio::test]
async fn create_rejects_empty_name() {
    let (service, _, _) = setup().await;

    let result = service
        .create(unit("   ", OrganizationType::Branch, None))
        .await;
    assert!(matches!(result, Err(RollbookError::Validation { .. })));
}

#[tokio::test]
async fn create_rejects_duplicate_code() {
    let (service, _, _) = setup().await;

    let mut first = unit("First", OrganizationType::Committee, None);
    first.code = Some("ORG-001".into());
    service.create(first).await.unwrap();

    let mut second = unit("Second", OrganizationType::Committee, None);
    second.code = Some("ORG-001".into());
    let result = service.create(second).await;
    assert!(matches!(result, Err(RollbookError::DuplicateCode { .. })));
}

// -----------------------------------------------------------------------
// Move
// -----------------------------------------------------------------------

#[tokio::test]
async fn move_rejects_self_parent() {
    let (service, _, _) = setup().await;

    let org = service
        .create(unit("Solo", OrganizationType::Committee, None))
        .await
        .unwrap();

    let result = service.move_organization(org.id, Some(org.id)).await;
    assert!(matches!(result, Err(RollbookError::SelfParent { .. })));
}

#[tokio::test]
async fn move_rejects_cycle_and_leaves_tree_unchanged() {
    let (service, org_repo, _) = setup().await;

    // Chain: a -> b -> c.
    let a = service
        .create(unit("A", OrganizationType::Committee, None))
        .await
        .unwrap();
    let b = service
        .create(unit("B", OrganizationType::GeneralBranch, Some(a.id)))
        .await
        .unwrap();
    let c = service
        .create(unit("C", OrganizationType::Branch, Some(b.id)))
        .await
        .unwrap();

    // Reparenting a under its own grandchild must fail.
    let result = service.move_organization(a.id, Some(c.id)).await;
    assert!(matches!(
        result,
        Err(RollbookError::CyclicReference { .. })
    ));

    // All three nodes unchanged.
    let a2 = org_repo.get_by_id(a.id).await.unwrap();
    let b2 = org_repo.get_by_id(b.id).await.unwrap();
    let c2 = org_repo.get_by_id(c.id).await.unwrap();
    assert_eq!((a2.parent_id, a2.level), (None, 1));
    assert_eq!((b2.parent_id, b2.level), (Some(a.id), 2));
    assert_eq!((c2.parent_id, c2.level), (Some(b.id), 3));
    assert_level_invariant(&org_repo).await;
}

#[tokio::test]
async fn move_under_new_parent_cascades_levels() {
    let (service, org_repo, _) = setup().await;

    // r -> c1 -> c2, plus a second root r2.
    let r = service
        .create(unit("R", OrganizationType::Committee, None))
        .await
        .unwrap();
    let c1 = service
        .create(unit("C1", OrganizationType::GeneralBranch, Some(r.id)))
        .await
        .unwrap();
    let c2 = service
        .create(unit("C2", OrganizationType::Branch, Some(c1.id)))
        .await
        .unwrap();
    let r2 = service
        .create(unit("R2", OrganizationType::Committee, None))
        .await
        .unwrap();

    service.move_organization(c1.id, Some(r2.id)).await.unwrap();

    let c1_moved = org_repo.get_by_id(c1.id).await.unwrap();
    let c2_moved = org_repo.get_by_id(c2.id).await.unwrap();
    assert_eq!(c1_moved.parent_id, Some(r2.id));
    assert_eq!(c1_moved.level, 2);
    assert_eq!(c2_moved.level, 3);
    assert_level_invariant(&org_repo).await;

    // Promoting c1 to a root pulls the whole subtree up.
    service.move_organization(c1.id, None).await.unwrap();

    let c1_root = org_repo.get_by_id(c1.id).await.unwrap();
    let c2_child = org_repo.get_by_id(c2.id).await.unwrap();
    assert_eq!(c1_root.parent_id, None);
    assert_eq!(c1_root.level, 1);
    assert_eq!(c2_child.level, 2);
    assert_level_invariant(&org_repo).await;

    // r lost its only child and is a leaf again.
    assert!(org_repo.get_by_parent(Some(r.id)).await.unwrap().is_empty());
}

#[tokio::test]
async fn move_deep_subtree_relevels_every_descendant() {
    let (service, org_repo, _) = setup().await;

    let root = service
        .create(unit("Root", OrganizationType::Committee, None))
        .await
        .unwrap();
    let mid = service
        .create(unit("Mid", OrganizationType::GeneralBranch, Some(root.id)))
        .await
        .unwrap();
    let left = service
        .create(unit("Left", OrganizationType::Branch, Some(mid.id)))
        .await
        .unwrap();
    let right = service
        .create(unit("Right", OrganizationType::Branch, Some(mid.id)))
        .await
        .unwrap();
    let deep = service
        .create(unit("Deep", OrganizationType::WorkCommittee, Some(left.id)))
        .await
        .unwrap();

    let anchor = service
        .create(unit("Anchor", OrganizationType::Committee, None))
        .await
        .unwrap();
    let anchor_child = service
        .create(unit(
            "Anchor Child",
            OrganizationType::GeneralBranch,
            Some(anchor.id),
        ))
        .await
        .unwrap();

    // Hang mid (level 2, three descendants) under anchor_child (level 2).
    service
        .move_organization(mid.id, Some(anchor_child.id))
        .await
        .unwrap();

    assert_eq!(org_repo.get_by_id(mid.id).await.unwrap().level, 3);
    assert_eq!(org_repo.get_by_id(left.id).await.unwrap().level, 4);
    assert_eq!(org_repo.get_by_id(right.id).await.unwrap().level, 4);
    assert_eq!(org_repo.get_by_id(deep.id).await.unwrap().level, 5);
    assert_level_invariant(&org_repo).await;
}

#[tokio::test]
async fn move_rejects_missing_node_and_missing_parent() {
    let (service, _, _) = setup().await;

    let org = service
        .create(unit("Here", OrganizationType::Committee, None))
        .await
        .unwrap();

    let result = service.move_organization(Uuid::new_v4(), None).await;
    assert!(matches!(result, Err(RollbookError::NotFound { .. })));

    let result = service
        .move_organization(org.id, Some(Uuid::new_v4()))
        .await;
    assert!(matches!(result, Err(RollbookError::ParentNotFound { .. })));
}

// -----------------------------------------------------------------------
// Update
// -----------------------------------------------------------------------

#[tokio::test]
async fn update_rechecks_code_uniqueness_excluding_self() {
    let (service, _, _) = setup().await;

    let mut first = unit("First", OrganizationType::Committee, None);
    first.code = Some("A-1".into());
    let first = service.create(first).await.unwrap();

    let mut second = unit("Second", OrganizationType::Committee, None);
    second.code = Some("B-2".into());
    let second = service.create(second).await.unwrap();

    // Stealing another organization's code fails.
    let result = service
        .update(
            second.id,
            UpdateOrganization {
                code: Some(Some("A-1".into())),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(RollbookError::DuplicateCode { .. })));

    // Re-asserting one's own code is fine.
    let kept = service
        .update(
            first.id,
            UpdateOrganization {
                code: Some(Some("A-1".into())),
                name: Some("First Renamed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(kept.code.as_deref(), Some("A-1"));
    assert_eq!(kept.name, "First Renamed");
}

#[tokio::test]
async fn update_never_touches_structure() {
    let (service, org_repo, _) = setup().await;

    let root = service
        .create(unit("Root", OrganizationType::Committee, None))
        .await
        .unwrap();
    let child = service
        .create(unit("Child", OrganizationType::Branch, Some(root.id)))
        .await
        .unwrap();

    service
        .update(
            child.id,
            UpdateOrganization {
                name: Some("Child Renamed".into()),
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let after = org_repo.get_by_id(child.id).await.unwrap();
    assert_eq!(after.parent_id, Some(root.id));
    assert_eq!(after.level, 2);
    assert!(!after.is_active);
    assert_level_invariant(&org_repo).await;
}

// -----------------------------------------------------------------------
// Delete
// -----------------------------------------------------------------------

#[tokio::test]
async fn delete_guards_children_and_members() {
    let (service, _, member_repo) = setup().await;

    let root = service
        .create(unit("Root", OrganizationType::Committee, None))
        .await
        .unwrap();
    let leaf = service
        .create(unit("Leaf", OrganizationType::Branch, Some(root.id)))
        .await
        .unwrap();

    // A node with children cannot go.
    let result = service.delete(root.id).await;
    assert!(matches!(result, Err(RollbookError::HasChildren { .. })));

    // A childless node with members cannot go either.
    let member = member_repo
        .create(CreateMember {
            organization_id: leaf.id,
            name: "Ada".into(),
            email: None,
            phone: None,
            joined_date: None,
        })
        .await
        .unwrap();

    let result = service.delete(leaf.id).await;
    assert!(matches!(
        result,
        Err(RollbookError::HasMembers { count: 1, .. })
    ));

    // Once the member moves on, the leaf and then the root can go.
    member_repo.delete(member.id).await.unwrap();
    service.delete(leaf.id).await.unwrap();
    service.delete(root.id).await.unwrap();

    let result = service.get(root.id).await;
    assert!(matches!(result, Err(RollbookError::NotFound { .. })));
}

#[tokio::test]
async fn delete_missing_organization_not_found() {
    let (service, _, _) = setup().await;

    let result = service.delete(Uuid::new_v4()).await;
    assert!(matches!(result, Err(RollbookError::NotFound { .. })));
}

// -----------------------------------------------------------------------
// Traversal
// -----------------------------------------------------------------------

/// Builds: committee -> {gb1 -> {b1, b2}, gb2}, plus lone root.
async fn seed_forest(service: &Service) -> Vec<Uuid> {
    let committee = service
        .create(unit("Committee", OrganizationType::Committee, None))
        .await
        .unwrap();
    let gb1 = service
        .create(unit("GB1", OrganizationType::GeneralBranch, Some(committee.id)))
        .await
        .unwrap();
    let gb2 = service
        .create(unit("GB2", OrganizationType::GeneralBranch, Some(committee.id)))
        .await
        .unwrap();
    let b1 = service
        .create(unit("B1", OrganizationType::Branch, Some(gb1.id)))
        .await
        .unwrap();
    let b2 = service
        .create(unit("B2", OrganizationType::Branch, Some(gb1.id)))
        .await
        .unwrap();
    let lone = service
        .create(unit("Lone", OrganizationType::Committee, None))
        .await
        .unwrap();
    vec![committee.id, gb1.id, gb2.id, b1.id, b2.id, lone.id]
}

#[tokio::test]
async fn descendants_and_ancestors() {
    let (service, _, _) = setup().await;
    let ids = seed_forest(&service).await;
    let (committee, gb1, gb2, b1, b2, lone) = (ids[0], ids[1], ids[2], ids[3], ids[4], ids[5]);

    let below: Vec<Uuid> = service
        .descendants(committee)
        .await
        .unwrap()
        .iter()
        .map(|o| o.id)
        .collect();
    assert_eq!(below.len(), 4);
    assert!(below.contains(&gb1) && below.contains(&gb2));
    assert!(below.contains(&b1) && below.contains(&b2));
    assert!(!below.contains(&committee), "excludes the node itself");
    assert!(!below.contains(&lone));

    let above: Vec<Uuid> = service
        .ancestors(b1)
        .await
        .unwrap()
        .iter()
        .map(|o| o.id)
        .collect();
    assert_eq!(above, vec![gb1, committee], "nearest ancestor first");

    assert!(service.descendants(lone).await.unwrap().is_empty());
    assert!(service.ancestors(committee).await.unwrap().is_empty());

    let missing = service.descendants(Uuid::new_v4()).await;
    assert!(matches!(missing, Err(RollbookError::NotFound { .. })));
}

#[tokio::test]
async fn acyclicity_no_node_is_its_own_descendant() {
    let (service, _, _) = setup().await;
    let ids = seed_forest(&service).await;

    for id in ids {
        let below = service.descendants(id).await.unwrap();
        assert!(below.iter().all(|o| o.id != id));
    }
}

#[tokio::test]
async fn roots_and_leaves() {
    let (service, _, _) = setup().await;
    let ids = seed_forest(&service).await;
    let (committee, gb2, b1, b2, lone) = (ids[0], ids[2], ids[3], ids[4], ids[5]);

    let roots: Vec<Uuid> = service.roots().await.unwrap().iter().map(|o| o.id).collect();
    assert_eq!(roots.len(), 2);
    assert!(roots.contains(&committee) && roots.contains(&lone));

    let leaves: Vec<Uuid> = service
        .leaves()
        .await
        .unwrap()
        .iter()
        .map(|o| o.id)
        .collect();
    assert_eq!(leaves.len(), 4);
    for id in [gb2, b1, b2, lone] {
        assert!(leaves.contains(&id));
    }
}

#[tokio::test]
async fn traversal_completeness() {
    let (service, org_repo, _) = setup().await;
    seed_forest(&service).await;

    let roots = service.roots().await.unwrap();
    let mut covered = 0;
    for root in &roots {
        covered += 1 + service.descendants(root.id).await.unwrap().len();
    }
    assert_eq!(covered, org_repo.get_all().await.unwrap().len());
}

#[tokio::test]
async fn tree_nests_and_active_tree_prunes() {
    let (service, _, _) = setup().await;
    let ids = seed_forest(&service).await;
    let (committee, gb1) = (ids[0], ids[1]);

    let tree = service.tree().await.unwrap();
    assert_eq!(tree.len(), 2);
    let committee_node = tree
        .iter()
        .find(|n| n.organization.id == committee)
        .unwrap();
    assert_eq!(committee_node.children.len(), 2);
    let gb1_node = committee_node
        .children
        .iter()
        .find(|n| n.organization.id == gb1)
        .unwrap();
    assert_eq!(gb1_node.children.len(), 2);

    // Deactivating gb1 prunes its whole subtree from the active view.
    service
        .update(
            gb1,
            UpdateOrganization {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let active = service.active_tree().await.unwrap();
    let committee_node = active
        .iter()
        .find(|n| n.organization.id == committee)
        .unwrap();
    assert_eq!(committee_node.children.len(), 1);
    assert!(
        committee_node
            .children
            .iter()
            .all(|n| n.organization.id != gb1)
    );

    // The full tree still shows it.
    let full = service.tree().await.unwrap();
    let committee_node = full
        .iter()
        .find(|n| n.organization.id == committee)
        .unwrap();
    assert_eq!(committee_node.children.len(), 2);
}
