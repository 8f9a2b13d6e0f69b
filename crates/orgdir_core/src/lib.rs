//! Core domain logic for the organization directory.
//! Owns the catalog schema, the activity hierarchy rules and the search
//! semantics; transport layers stay thin wrappers over [`service`].

pub mod config;
pub mod db;
pub mod geo;
pub mod index;
pub mod logging;
pub mod model;
pub mod policy;
pub mod repo;
pub mod service;

pub use config::{load_config, CatalogConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError};
pub use geo::{distance_km, within_bounds, within_radius, BoundingBox, Coordinate, GeoError};
pub use index::activity_tree::{ActivityTree, TreeIndexError};
pub use logging::{default_log_level, init_logging, LoggingError};
pub use model::activity::{Activity, ActivityId};
pub use model::building::{Building, BuildingId, NewBuilding};
pub use model::organization::{NewOrganization, Organization, OrganizationId};
pub use model::query::{BoundsQuery, RadiusQuery, SetMaxDepthRequest};
pub use policy::depth_policy::{DepthPolicy, DepthPolicyError, DEFAULT_MAX_DEPTH};
pub use repo::catalog_repo::{
    CatalogRepository, OrganizationFilter, RepoError, RepoResult, SqliteCatalogRepository,
};
pub use service::activity_service::{ActivityService, ActivityServiceError};
pub use service::search_service::{SearchService, SearchServiceError, SearchServiceResult};
