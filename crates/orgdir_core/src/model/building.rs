//! Building record.

use crate::geo::Coordinate;
use serde::{Deserialize, Serialize};

/// Stable building identifier.
pub type BuildingId = i64;

/// Physical location shared by one or more organizations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    /// Free-text postal address.
    pub address: String,
    /// Always within valid latitude/longitude ranges once persisted.
    pub location: Coordinate,
}

/// Input for creating a building during catalog seeding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBuilding {
    pub address: String,
    pub location: Coordinate,
}
