//! Activity forest arena with bounded descendant expansion.
//!
//! # Responsibility
//! - Rebuild child lists from stored parent links.
//! - Expand an activity name into its descendant id set up to a depth cap.
//!
//! # Invariants
//! - Nodes reference each other by arena index only; no back-pointers.
//! - Traversals carry a visited set, so corrupted (cyclic) links terminate.
//! - A parent id with no matching activity is treated as a root.

use crate::model::activity::{Activity, ActivityId};
use log::warn;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Identifier set produced by descendant expansion, ordered ascending.
pub type ActivityIdSet = BTreeSet<ActivityId>;

pub type TreeIndexResult<T> = Result<T, TreeIndexError>;

/// Errors from activity tree lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeIndexError {
    /// No activity carries the requested name.
    ActivityNotFound(String),
    /// No activity carries the requested id.
    UnknownActivity(ActivityId),
    /// The parent chain starting at this activity loops back on itself.
    CycleDetected(ActivityId),
}

impl Display for TreeIndexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ActivityNotFound(name) => write!(f, "activity not found: `{name}`"),
            Self::UnknownActivity(id) => write!(f, "activity not found: {id}"),
            Self::CycleDetected(id) => write!(f, "activity hierarchy cycle at {id}"),
        }
    }
}

impl Error for TreeIndexError {}

#[derive(Debug, Clone)]
struct ActivityNode {
    activity: Activity,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Arena-backed activity forest.
#[derive(Debug, Clone, Default)]
pub struct ActivityTree {
    nodes: Vec<ActivityNode>,
    by_id: HashMap<ActivityId, usize>,
    by_name: HashMap<String, Vec<usize>>,
}

impl ActivityTree {
    /// Builds the forest from a flat activity list.
    ///
    /// Children are ordered by ascending id. Duplicate ids keep the first
    /// occurrence.
    pub fn from_activities(activities: impl IntoIterator<Item = Activity>) -> Self {
        let mut tree = Self::default();
        for activity in activities {
            if tree.by_id.contains_key(&activity.id) {
                warn!(
                    "event=activity_index_build module=index status=skip reason=duplicate_id activity_id={}",
                    activity.id
                );
                continue;
            }
            let index = tree.nodes.len();
            tree.by_id.insert(activity.id, index);
            tree.by_name
                .entry(activity.name.clone())
                .or_default()
                .push(index);
            tree.nodes.push(ActivityNode {
                activity,
                parent: None,
                children: Vec::new(),
            });
        }

        for index in 0..tree.nodes.len() {
            let Some(parent_id) = tree.nodes[index].activity.parent_id else {
                continue;
            };
            match tree.by_id.get(&parent_id).copied() {
                Some(parent_index) => {
                    tree.nodes[index].parent = Some(parent_index);
                    tree.nodes[parent_index].children.push(index);
                }
                None => warn!(
                    "event=activity_index_build module=index status=skip reason=dangling_parent activity_id={} parent_id={parent_id}",
                    tree.nodes[index].activity.id
                ),
            }
        }

        for node_index in 0..tree.nodes.len() {
            let mut children = std::mem::take(&mut tree.nodes[node_index].children);
            children.sort_by_key(|child| tree.nodes[*child].activity.id);
            tree.nodes[node_index].children = children;
        }
        for indexes in tree.by_name.values_mut() {
            indexes.sort_by_key(|index| tree.nodes[*index].activity.id);
        }

        tree
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: ActivityId) -> Option<&Activity> {
        self.by_id.get(&id).map(|index| &self.nodes[*index].activity)
    }

    /// Returns every activity with exactly this name, ordered by id.
    pub fn find_by_name(&self, name: &str) -> Vec<&Activity> {
        self.by_name
            .get(name)
            .map(|indexes| {
                indexes
                    .iter()
                    .map(|index| &self.nodes[*index].activity)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns direct children of `id`, ordered by id.
    pub fn children(&self, id: ActivityId) -> TreeIndexResult<Vec<&Activity>> {
        let index = self.index_of(id)?;
        Ok(self.nodes[index]
            .children
            .iter()
            .map(|child| &self.nodes[*child].activity)
            .collect())
    }

    /// Returns the number of edges between `id` and its forest root.
    ///
    /// # Errors
    /// - `UnknownActivity` when `id` is not indexed.
    /// - `CycleDetected` when the parent chain loops.
    pub fn depth_of(&self, id: ActivityId) -> TreeIndexResult<u32> {
        let start = self.index_of(id)?;
        let mut visited = HashSet::from([start]);
        let mut depth = 0u32;
        let mut cursor = self.nodes[start].parent;
        while let Some(current) = cursor {
            if !visited.insert(current) {
                return Err(TreeIndexError::CycleDetected(id));
            }
            depth += 1;
            cursor = self.nodes[current].parent;
        }
        Ok(depth)
    }

    /// Expands `name` into the ids of the matching activity and its
    /// descendants at most `max_depth` edges below it.
    ///
    /// Depth is counted from the queried activity, not the forest root.
    /// When several activities share `name`, the result is their union.
    ///
    /// # Errors
    /// - `ActivityNotFound` when no activity has this exact name.
    pub fn expand_descendants(&self, name: &str, max_depth: u32) -> TreeIndexResult<ActivityIdSet> {
        let roots = self
            .by_name
            .get(name)
            .filter(|indexes| !indexes.is_empty())
            .ok_or_else(|| TreeIndexError::ActivityNotFound(name.to_string()))?;

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        for root in roots {
            if visited.insert(*root) {
                queue.push_back((*root, 0u32));
            }
        }

        let mut result = ActivityIdSet::new();
        while let Some((index, depth)) = queue.pop_front() {
            let node = &self.nodes[index];
            result.insert(node.activity.id);
            if depth >= max_depth {
                continue;
            }
            for child in &node.children {
                if visited.insert(*child) {
                    queue.push_back((*child, depth + 1));
                }
            }
        }

        Ok(result)
    }

    fn index_of(&self, id: ActivityId) -> TreeIndexResult<usize> {
        self.by_id
            .get(&id)
            .copied()
            .ok_or(TreeIndexError::UnknownActivity(id))
    }
}
