//! Subtree level recomputation after a reparent.

use std::collections::{HashMap, HashSet, VecDeque};

use uuid::Uuid;

use super::forest::Forest;

/// A buffered level assignment for one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelChange {
    pub id: Uuid,
    pub level: u32,
}

/// Compute corrected levels for every descendant of `root_id`, given
/// that `root_id` itself is about to take `root_level`.
///
/// Breadth-first, so each entry's parent precedes it in the returned
/// list and already carries its corrected level. Nothing is written
/// here: the caller applies the buffer only after the whole subtree has
/// been computed, so a failed move never leaves a child inconsistent
/// with an already-updated parent.
pub fn subtree_level_changes(forest: &Forest, root_id: Uuid, root_level: u32) -> Vec<LevelChange> {
    let mut levels: HashMap<Uuid, u32> = HashMap::from([(root_id, root_level)]);
    let mut visited: HashSet<Uuid> = HashSet::from([root_id]);
    let mut queue: VecDeque<Uuid> = VecDeque::from([root_id]);
    let mut changes = Vec::new();

    while let Some(current) = queue.pop_front() {
        let parent_level = levels[&current];
        for &child in forest.children(current) {
            if !visited.insert(child) {
                continue;
            }
            let level = parent_level + 1;
            levels.insert(child, level);
            changes.push(LevelChange { id: child, level });
            queue.push_back(child);
        }
    }

    changes
}
