//! Organization read model.
//!
//! # Invariants
//! - `name` is unique across the catalog.
//! - `activity_ids` is sorted ascending and free of duplicates.
//! - `phones` keeps the stored order.

use super::activity::ActivityId;
use super::building::{Building, BuildingId};
use serde::{Deserialize, Serialize};

/// Stable organization identifier.
pub type OrganizationId = i64;

/// Organization joined with its building and activity links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub phones: Vec<String>,
    pub building: Building,
    pub activity_ids: Vec<ActivityId>,
}

/// Input for creating an organization during catalog seeding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    pub phones: Vec<String>,
    pub building_id: BuildingId,
    pub activity_ids: Vec<ActivityId>,
}
