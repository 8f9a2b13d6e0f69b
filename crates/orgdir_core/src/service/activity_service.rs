//! Activity taxonomy use-case service.
//!
//! # Responsibility
//! - Validate hierarchy invariants above the repository layer.
//! - Resolve activity names into descendant id sets under the depth policy.
//! - Expose the administrative max-depth update.
//!
//! # Invariants
//! - Names are trimmed and non-blank; siblings never share a name.
//! - A new activity's depth never exceeds the policy at creation time.
//! - Lowering the policy later does not touch stored activities; it only
//!   caps future expansions.

use crate::index::activity_tree::{ActivityIdSet, ActivityTree, TreeIndexError};
use crate::model::activity::{Activity, ActivityId};
use crate::policy::depth_policy::{DepthPolicy, DepthPolicyError};
use crate::repo::catalog_repo::{CatalogRepository, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Errors from activity service operations.
#[derive(Debug)]
pub enum ActivityServiceError {
    /// Name is blank after trim.
    InvalidName,
    /// No activity carries this name.
    NotFound(String),
    /// Parent activity does not exist.
    ParentNotFound(ActivityId),
    /// A sibling already uses this name.
    DuplicateName {
        parent_id: Option<ActivityId>,
        name: String,
    },
    /// The new activity would sit deeper than the policy allows.
    DepthExceeded { depth: u32, max_depth: u32 },
    /// Rejected max-depth update.
    InvalidDepth(DepthPolicyError),
    /// Stored parent links are inconsistent.
    CorruptHierarchy(TreeIndexError),
    /// Repository-level failure.
    Repo(RepoError),
}

impl ActivityServiceError {
    /// Stable machine-readable category for transport layers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) | Self::ParentNotFound(_) => "not_found",
            Self::InvalidName | Self::DepthExceeded { .. } | Self::InvalidDepth(_) => {
                "invalid_argument"
            }
            Self::DuplicateName { .. } => "conflict",
            Self::CorruptHierarchy(_) | Self::Repo(_) => "internal",
        }
    }
}

impl Display for ActivityServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "activity name must not be blank"),
            Self::NotFound(name) => write!(f, "activity not found: `{name}`"),
            Self::ParentNotFound(id) => write!(f, "parent activity not found: {id}"),
            Self::DuplicateName { parent_id, name } => match parent_id {
                Some(parent_id) => write!(
                    f,
                    "activity `{name}` already exists under parent {parent_id}"
                ),
                None => write!(f, "root activity `{name}` already exists"),
            },
            Self::DepthExceeded { depth, max_depth } => write!(
                f,
                "activity depth {depth} exceeds configured maximum {max_depth}"
            ),
            Self::InvalidDepth(err) => write!(f, "{err}"),
            Self::CorruptHierarchy(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ActivityServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDepth(err) => Some(err),
            Self::CorruptHierarchy(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ActivityServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DepthPolicyError> for ActivityServiceError {
    fn from(value: DepthPolicyError) -> Self {
        Self::InvalidDepth(value)
    }
}

impl From<TreeIndexError> for ActivityServiceError {
    fn from(value: TreeIndexError) -> Self {
        match value {
            TreeIndexError::ActivityNotFound(name) => Self::NotFound(name),
            TreeIndexError::UnknownActivity(id) => Self::ParentNotFound(id),
            other => Self::CorruptHierarchy(other),
        }
    }
}

/// Activity taxonomy service facade.
pub struct ActivityService<R: CatalogRepository> {
    repo: R,
    policy: Arc<DepthPolicy>,
}

impl<R: CatalogRepository> ActivityService<R> {
    /// Creates service from repository implementation and shared policy.
    pub fn new(repo: R, policy: Arc<DepthPolicy>) -> Self {
        Self { repo, policy }
    }

    /// Creates one activity under an optional parent.
    ///
    /// # Contract
    /// - Root activities have depth 0.
    /// - Fails with `DepthExceeded` when `parent depth + 1` is above the
    ///   current policy.
    pub fn create_activity(
        &self,
        parent_id: Option<ActivityId>,
        name: impl Into<String>,
    ) -> Result<Activity, ActivityServiceError> {
        let name = normalize_name(name.into())?;

        let depth = match parent_id {
            None => 0,
            Some(parent_id) => self.load_tree()?.depth_of(parent_id)? + 1,
        };
        let max_depth = self.policy.get_max_depth();
        if depth > max_depth {
            warn!(
                "event=activity_create module=activity status=rejected error_code=depth_exceeded depth={depth} max_depth={max_depth}"
            );
            return Err(ActivityServiceError::DepthExceeded { depth, max_depth });
        }

        let has_sibling = self
            .repo
            .fetch_activities_by_name(name.as_str())?
            .iter()
            .any(|activity| activity.parent_id == parent_id);
        if has_sibling {
            return Err(ActivityServiceError::DuplicateName { parent_id, name });
        }

        let activity = self
            .repo
            .create_activity(name.as_str(), parent_id)
            .map_err(|err| match err {
                RepoError::Conflict(_) => ActivityServiceError::DuplicateName {
                    parent_id,
                    name: name.clone(),
                },
                other => other.into(),
            })?;
        info!(
            "event=activity_create module=activity status=ok activity_id={} depth={depth}",
            activity.id
        );
        Ok(activity)
    }

    /// Returns every activity with this exact name.
    pub fn find_activities(&self, name: &str) -> Result<Vec<Activity>, ActivityServiceError> {
        let activities = self.repo.fetch_activities_by_name(name)?;
        if activities.is_empty() {
            return Err(ActivityServiceError::NotFound(name.to_string()));
        }
        Ok(activities)
    }

    /// Expands `name` into descendant ids under the current depth policy.
    pub fn expand_descendants(&self, name: &str) -> Result<ActivityIdSet, ActivityServiceError> {
        let max_depth = self.policy.get_max_depth();
        Ok(self.load_tree()?.expand_descendants(name, max_depth)?)
    }

    /// Returns the current maximum hierarchy depth.
    pub fn max_depth(&self) -> u32 {
        self.policy.get_max_depth()
    }

    /// Updates the maximum hierarchy depth and returns the previous value.
    pub fn set_max_depth(&self, new_value: i64) -> Result<u32, ActivityServiceError> {
        self.policy.set_max_depth(new_value).map_err(|err| {
            warn!(
                "event=depth_policy_update module=activity status=rejected error_code=invalid_depth value={new_value}"
            );
            err.into()
        })
    }

    /// Builds a fresh tree index from the repository snapshot.
    pub fn load_tree(&self) -> Result<ActivityTree, ActivityServiceError> {
        Ok(ActivityTree::from_activities(self.repo.list_activities()?))
    }
}

fn normalize_name(value: String) -> Result<String, ActivityServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ActivityServiceError::InvalidName);
    }
    Ok(trimmed.to_string())
}
