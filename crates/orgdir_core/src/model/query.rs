//! Typed request models for the search and admin entry points.
//!
//! Query-string parameters are deserialized into these structs by the
//! transport layer and validated here before any repository access.

use crate::geo::{validate_radius, BoundingBox, Coordinate, GeoResult};
use crate::policy::depth_policy::{checked_depth, DepthPolicyResult};
use serde::{Deserialize, Serialize};

/// `GET /organization/geo/radius?lat&lon&radius_km`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusQuery {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    pub radius_km: f64,
}

impl RadiusQuery {
    pub fn new(latitude: f64, longitude: f64, radius_km: f64) -> Self {
        Self {
            latitude,
            longitude,
            radius_km,
        }
    }

    /// Returns the validated center and radius.
    pub fn validate(&self) -> GeoResult<(Coordinate, f64)> {
        let radius_km = validate_radius(self.radius_km)?;
        let center = Coordinate::new(self.latitude, self.longitude).validate()?;
        Ok((center, radius_km))
    }
}

/// `GET /organization/geo/bounds?min_lat&min_lon&max_lat&max_lon`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsQuery {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundsQuery {
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    pub fn validate(&self) -> GeoResult<BoundingBox> {
        BoundingBox::new(self.min_lat, self.min_lon, self.max_lat, self.max_lon)
    }
}

/// `POST /activity/set-max-level` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetMaxDepthRequest {
    /// Signed so that negative input reaches validation instead of failing
    /// deserialization with an opaque message.
    #[serde(alias = "max_depth")]
    pub max_level: i64,
}

impl SetMaxDepthRequest {
    pub fn validate(&self) -> DepthPolicyResult<u32> {
        checked_depth(self.max_level)
    }
}
