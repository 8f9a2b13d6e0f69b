//! Activity taxonomy node.
//!
//! # Invariants
//! - `name` is trimmed and non-blank.
//! - `name` is unique among siblings sharing the same `parent_id`.
//! - The parent chain is acyclic and no longer than the active depth policy.

use serde::{Deserialize, Serialize};

/// Stable activity identifier.
pub type ActivityId = i64;

/// One node of the activity forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    /// `None` means a forest root.
    pub parent_id: Option<ActivityId>,
}

impl Activity {
    pub fn new(id: ActivityId, name: impl Into<String>, parent_id: Option<ActivityId>) -> Self {
        Self {
            id,
            name: name.into(),
            parent_id,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
