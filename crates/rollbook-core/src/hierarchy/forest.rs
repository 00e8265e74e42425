//! Read-only snapshot index over the organization forest.

use std::collections::{HashMap, HashSet, VecDeque};

use uuid::Uuid;

use crate::models::organization::{Organization, OrganizationNode};

/// An in-memory adjacency index over a full organization snapshot.
///
/// Built once per traversal call from `get_all`, so every query below
/// is an O(n) walk regardless of tree shape. Child order is
/// deterministic: creation time, then id.
#[derive(Debug)]
pub struct Forest {
    by_id: HashMap<Uuid, Organization>,
    children: HashMap<Uuid, Vec<Uuid>>,
    /// Snapshot order, for stable `roots`/`leaves` output.
    order: Vec<Uuid>,
}

impl Forest {
    /// Build the index from a store snapshot.
    pub fn new(mut organizations: Vec<Organization>) -> Self {
        organizations.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));

        let mut by_id = HashMap::with_capacity(organizations.len());
        let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        let mut order = Vec::with_capacity(organizations.len());

        for org in organizations {
            if let Some(parent_id) = org.parent_id {
                children.entry(parent_id).or_default().push(org.id);
            }
            order.push(org.id);
            by_id.insert(org.id, org);
        }

        Self {
            by_id,
            children,
            order,
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&Organization> {
        self.by_id.get(&id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Direct children of `id`, in creation order.
    pub fn children(&self, id: Uuid) -> &[Uuid] {
        self.children.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Every node reachable by child edges from `id`, excluding `id`
    /// itself, breadth-first.
    ///
    /// The visited set makes traversal terminate and visit each node at
    /// most once even if the snapshot carries a residual cycle.
    pub fn descendants(&self, id: Uuid) -> Vec<&Organization> {
        let mut visited = HashSet::from([id]);
        let mut queue: VecDeque<Uuid> = self.children(id).iter().copied().collect();
        let mut result = Vec::new();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(org) = self.by_id.get(&current) {
                result.push(org);
                queue.extend(self.children(current).iter().copied());
            }
        }

        result
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: Uuid) -> Vec<&Organization> {
        let mut visited = HashSet::from([id]);
        let mut result = Vec::new();
        let mut current = self.by_id.get(&id).and_then(|org| org.parent_id);

        while let Some(ancestor_id) = current {
            if !visited.insert(ancestor_id) {
                break;
            }
            let Some(ancestor) = self.by_id.get(&ancestor_id) else {
                break;
            };
            result.push(ancestor);
            current = ancestor.parent_id;
        }

        result
    }

    /// Organizations without a parent.
    pub fn roots(&self) -> Vec<&Organization> {
        self.order
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .filter(|org| org.parent_id.is_none())
            .collect()
    }

    /// Organizations without children.
    pub fn leaves(&self) -> Vec<&Organization> {
        self.order
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .filter(|org| self.children(org.id).is_empty())
            .collect()
    }

    /// True iff `candidate` lies in the descendant set of `ancestor`.
    ///
    /// This is the primitive the move operation uses to refuse cycles.
    pub fn is_descendant(&self, ancestor: Uuid, candidate: Uuid) -> bool {
        let mut visited = HashSet::from([ancestor]);
        let mut queue: VecDeque<Uuid> = self.children(ancestor).iter().copied().collect();

        while let Some(current) = queue.pop_front() {
            if current == candidate {
                return true;
            }
            if visited.insert(current) {
                queue.extend(self.children(current).iter().copied());
            }
        }

        false
    }

    /// The full forest as nested nodes, for display.
    pub fn nested(&self) -> Vec<OrganizationNode> {
        self.roots()
            .iter()
            .filter_map(|root| self.node(root.id, false))
            .collect()
    }

    /// The forest restricted to active organizations; an inactive node
    /// prunes its whole subtree.
    pub fn nested_active(&self) -> Vec<OrganizationNode> {
        self.roots()
            .iter()
            .filter_map(|root| self.node(root.id, true))
            .collect()
    }

    fn node(&self, id: Uuid, active_only: bool) -> Option<OrganizationNode> {
        let org = self.by_id.get(&id)?;
        if active_only && !org.is_active {
            return None;
        }
        let children = self
            .children(id)
            .iter()
            .filter_map(|&child| self.node(child, active_only))
            .collect();
        Some(OrganizationNode {
            organization: org.clone(),
            children,
        })
    }
}
