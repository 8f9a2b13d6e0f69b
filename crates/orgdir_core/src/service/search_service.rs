//! Organization search use-case service.
//!
//! # Responsibility
//! - Turn typed search requests into one repository fetch each.
//! - Expand activity filters through the tree index under the depth policy.
//! - Classify candidate buildings with the geo predicates.
//!
//! # Invariants
//! - Results are ordered by ascending organization id.
//! - An empty result is `Ok(vec![])`; only unknown activity names and
//!   unknown organization lookups produce `NotFound`.
//! - Log events carry filter kinds and counts, never raw query text.

use crate::geo::{within_bounds, within_radius, BoundingBox, GeoError};
use crate::index::activity_tree::{ActivityTree, TreeIndexError};
use crate::model::organization::{Organization, OrganizationId};
use crate::model::query::{BoundsQuery, RadiusQuery};
use crate::policy::depth_policy::DepthPolicy;
use crate::repo::catalog_repo::{CatalogRepository, OrganizationFilter, RepoError};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

pub type SearchServiceResult<T> = Result<T, SearchServiceError>;

/// Errors surfaced to search callers.
#[derive(Debug)]
pub enum SearchServiceError {
    /// Referenced activity or organization does not exist.
    NotFound(String),
    /// Malformed radius or bounds.
    InvalidArgument(String),
    /// Out-of-range or NaN latitude/longitude.
    InvalidCoordinate { latitude: f64, longitude: f64 },
    /// Stored hierarchy is inconsistent.
    Hierarchy(TreeIndexError),
    /// Repository-level failure.
    Repo(RepoError),
}

impl SearchServiceError {
    /// Stable machine-readable category for transport layers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::InvalidCoordinate { .. } => "invalid_coordinate",
            Self::Hierarchy(_) | Self::Repo(_) => "internal",
        }
    }
}

impl Display for SearchServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(message) => write!(f, "{message}"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::InvalidCoordinate {
                latitude,
                longitude,
            } => write!(f, "invalid coordinate ({latitude}, {longitude})"),
            Self::Hierarchy(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SearchServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Hierarchy(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GeoError> for SearchServiceError {
    fn from(value: GeoError) -> Self {
        match value {
            GeoError::InvalidCoordinate {
                latitude,
                longitude,
            } => Self::InvalidCoordinate {
                latitude,
                longitude,
            },
            GeoError::InvalidArgument(message) => Self::InvalidArgument(message),
        }
    }
}

impl From<TreeIndexError> for SearchServiceError {
    fn from(value: TreeIndexError) -> Self {
        match value {
            TreeIndexError::ActivityNotFound(_) | TreeIndexError::UnknownActivity(_) => {
                Self::NotFound(value.to_string())
            }
            TreeIndexError::CycleDetected(_) => Self::Hierarchy(value),
        }
    }
}

impl From<RepoError> for SearchServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Organization search coordinator.
pub struct SearchService<R: CatalogRepository> {
    repo: R,
    policy: Arc<DepthPolicy>,
}

impl<R: CatalogRepository> SearchService<R> {
    /// Creates service from repository implementation and shared policy.
    pub fn new(repo: R, policy: Arc<DepthPolicy>) -> Self {
        Self { repo, policy }
    }

    /// Organizations whose name contains `fragment`, ignoring case.
    pub fn search_by_name(&self, fragment: &str) -> SearchServiceResult<Vec<Organization>> {
        self.fetch(&OrganizationFilter::NameContains(fragment.to_string()))
    }

    /// Organizations whose building address contains `fragment`.
    pub fn search_by_address(&self, fragment: &str) -> SearchServiceResult<Vec<Organization>> {
        self.fetch(&OrganizationFilter::AddressContains(fragment.to_string()))
    }

    /// Organizations linked to `activity_name` or any descendant within the
    /// current depth policy.
    ///
    /// # Errors
    /// - `NotFound` when no activity has this exact name.
    pub fn search_by_activity(&self, activity_name: &str) -> SearchServiceResult<Vec<Organization>> {
        let max_depth = self.policy.get_max_depth();
        let tree = ActivityTree::from_activities(self.repo.list_activities()?);
        let activity_ids = tree
            .expand_descendants(activity_name, max_depth)
            .map_err(|err| {
                info!(
                    "event=org_search module=search status=not_found filter=activity_in max_depth={max_depth}"
                );
                SearchServiceError::from(err)
            })?;
        debug!(
            "event=activity_expand module=search status=ok max_depth={max_depth} activity_count={}",
            activity_ids.len()
        );
        self.fetch(&OrganizationFilter::ActivityIn(activity_ids))
    }

    /// Organizations whose building lies within the query radius.
    pub fn search_by_radius(&self, query: &RadiusQuery) -> SearchServiceResult<Vec<Organization>> {
        let (center, radius_km) = query.validate()?;
        let prefilter = match BoundingBox::enclosing_circle(center, radius_km)? {
            Some(bounds) => OrganizationFilter::WithinBounds(bounds),
            None => OrganizationFilter::All,
        };

        let mut matched = Vec::new();
        for organization in self.fetch(&prefilter)? {
            if within_radius(center, radius_km, organization.building.location)? {
                matched.push(organization);
            }
        }
        debug!(
            "event=org_search module=search status=ok filter=radius result_count={}",
            matched.len()
        );
        Ok(matched)
    }

    /// Organizations whose building lies inside the query rectangle.
    pub fn search_by_bounds(&self, query: &BoundsQuery) -> SearchServiceResult<Vec<Organization>> {
        let bounds = query.validate()?;
        let mut matched = Vec::new();
        for organization in self.fetch(&OrganizationFilter::WithinBounds(bounds))? {
            if within_bounds(bounds, organization.building.location)? {
                matched.push(organization);
            }
        }
        Ok(matched)
    }

    /// Loads one organization by id.
    pub fn get_organization(&self, id: OrganizationId) -> SearchServiceResult<Organization> {
        self.fetch(&OrganizationFilter::Id(id))?
            .into_iter()
            .next()
            .ok_or_else(|| SearchServiceError::NotFound(format!("organization not found: {id}")))
    }

    /// Loads one organization by exact name.
    pub fn get_organization_by_name(&self, name: &str) -> SearchServiceResult<Organization> {
        self.fetch(&OrganizationFilter::NameEquals(name.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| SearchServiceError::NotFound("organization not found".to_string()))
    }

    fn fetch(&self, filter: &OrganizationFilter) -> SearchServiceResult<Vec<Organization>> {
        let started_at = Instant::now();
        match self.repo.fetch_organizations(filter) {
            Ok(organizations) => {
                info!(
                    "event=org_search module=search status=ok filter={} result_count={} duration_ms={}",
                    filter.kind(),
                    organizations.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(organizations)
            }
            Err(err) => {
                error!(
                    "event=org_search module=search status=error filter={} duration_ms={} error={err}",
                    filter.kind(),
                    started_at.elapsed().as_millis()
                );
                Err(err.into())
            }
        }
    }
}
