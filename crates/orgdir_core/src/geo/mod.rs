//! Great-circle distance and bounding-box predicates.
//!
//! # Responsibility
//! - Compute haversine distances between catalog coordinates.
//! - Classify points against radius and rectangle filters.
//!
//! # Invariants
//! - Every public function validates its inputs; no function panics on NaN.
//! - Bounding boxes never wrap the antimeridian (`min_lon <= max_lon`).

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Mean Earth radius used by every distance computation.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

const MIN_LATITUDE: f64 = -90.0;
const MAX_LATITUDE: f64 = 90.0;
const MIN_LONGITUDE: f64 = -180.0;
const MAX_LONGITUDE: f64 = 180.0;

/// Outward margin of [`BoundingBox::enclosing_circle`], about 0.1 m.
pub const BOX_PADDING_DEG: f64 = 1e-6;

pub type GeoResult<T> = Result<T, GeoError>;

/// Errors from geo computations.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoError {
    /// Latitude/longitude outside the valid range, or not a finite number.
    InvalidCoordinate { latitude: f64, longitude: f64 },
    /// Radius or bounds that cannot describe a region.
    InvalidArgument(String),
}

impl Display for GeoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCoordinate {
                latitude,
                longitude,
            } => write!(f, "invalid coordinate ({latitude}, {longitude})"),
            Self::InvalidArgument(message) => write!(f, "invalid geo argument: {message}"),
        }
    }
}

impl Error for GeoError {}

/// WGS84-style latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Builds a coordinate without validation.
    ///
    /// Use [`Coordinate::validate`] (or any function in this module) before
    /// trusting the value.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `Ok(self)` when both components are within range.
    pub fn validate(self) -> GeoResult<Self> {
        let latitude_ok = (MIN_LATITUDE..=MAX_LATITUDE).contains(&self.latitude);
        let longitude_ok = (MIN_LONGITUDE..=MAX_LONGITUDE).contains(&self.longitude);
        if latitude_ok && longitude_ok {
            Ok(self)
        } else {
            Err(GeoError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

/// Axis-aligned latitude/longitude rectangle, inclusive on every edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Builds a validated bounding box.
    ///
    /// # Errors
    /// - `InvalidCoordinate` when a corner is out of range.
    /// - `InvalidArgument` when a minimum exceeds its maximum.
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> GeoResult<Self> {
        let bounds = Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        };
        bounds.validate()
    }

    /// Returns `Ok(self)` when corners are valid and ordered.
    pub fn validate(self) -> GeoResult<Self> {
        Coordinate::new(self.min_lat, self.min_lon).validate()?;
        Coordinate::new(self.max_lat, self.max_lon).validate()?;
        if self.min_lat > self.max_lat {
            return Err(GeoError::InvalidArgument(format!(
                "min_lat {} exceeds max_lat {}",
                self.min_lat, self.max_lat
            )));
        }
        if self.min_lon > self.max_lon {
            return Err(GeoError::InvalidArgument(format!(
                "min_lon {} exceeds max_lon {}",
                self.min_lon, self.max_lon
            )));
        }
        Ok(self)
    }

    /// Returns a box containing every point within `radius_km` of `center`,
    /// including points at exactly `radius_km`.
    ///
    /// Edges are widened by [`BOX_PADDING_DEG`] so that rounding in the
    /// degree conversion never cuts off a boundary point; callers still
    /// classify candidates with [`within_radius`].
    ///
    /// Returns `Ok(None)` when the circle reaches a pole or crosses the
    /// antimeridian, where a single non-wrapping box cannot contain it.
    pub fn enclosing_circle(center: Coordinate, radius_km: f64) -> GeoResult<Option<Self>> {
        let center = center.validate()?;
        validate_radius(radius_km)?;

        let angular = radius_km / EARTH_RADIUS_KM;
        let lat_rad = center.latitude.to_radians();
        let min_lat_rad = lat_rad - angular;
        let max_lat_rad = lat_rad + angular;
        if min_lat_rad <= -std::f64::consts::FRAC_PI_2 || max_lat_rad >= std::f64::consts::FRAC_PI_2
        {
            return Ok(None);
        }

        // Longitudes of the two meridians tangent to the circle.
        let delta_lon = (angular.sin() / lat_rad.cos())
            .clamp(-1.0, 1.0)
            .asin()
            .to_degrees();
        let min_lon = center.longitude - delta_lon;
        let max_lon = center.longitude + delta_lon;
        if min_lon < MIN_LONGITUDE || max_lon > MAX_LONGITUDE {
            return Ok(None);
        }

        Ok(Some(Self {
            min_lat: (min_lat_rad.to_degrees() - BOX_PADDING_DEG).max(MIN_LATITUDE),
            min_lon: (min_lon - BOX_PADDING_DEG).max(MIN_LONGITUDE),
            max_lat: (max_lat_rad.to_degrees() + BOX_PADDING_DEG).min(MAX_LATITUDE),
            max_lon: (max_lon + BOX_PADDING_DEG).min(MAX_LONGITUDE),
        }))
    }
}

/// Haversine great-circle distance in kilometers.
///
/// # Errors
/// - `InvalidCoordinate` when either point is out of range or NaN.
pub fn distance_km(a: Coordinate, b: Coordinate) -> GeoResult<f64> {
    let a = a.validate()?;
    let b = b.validate()?;

    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = lat_b - lat_a;
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `h` marginally past 1.0 for antipodal points.
    let c = 2.0 * h.clamp(0.0, 1.0).sqrt().asin();
    Ok(EARTH_RADIUS_KM * c)
}

/// Returns whether `point` lies within `radius_km` of `center` (inclusive).
///
/// # Errors
/// - `InvalidArgument` when `radius_km` is not a positive finite number.
/// - `InvalidCoordinate` when either point is invalid.
pub fn within_radius(center: Coordinate, radius_km: f64, point: Coordinate) -> GeoResult<bool> {
    validate_radius(radius_km)?;
    Ok(distance_km(center, point)? <= radius_km)
}

/// Returns whether `point` lies inside `bounds` (edges inclusive).
pub fn within_bounds(bounds: BoundingBox, point: Coordinate) -> GeoResult<bool> {
    let bounds = bounds.validate()?;
    let point = point.validate()?;
    Ok((bounds.min_lat..=bounds.max_lat).contains(&point.latitude)
        && (bounds.min_lon..=bounds.max_lon).contains(&point.longitude))
}

pub(crate) fn validate_radius(radius_km: f64) -> GeoResult<f64> {
    if radius_km.is_finite() && radius_km > 0.0 {
        Ok(radius_km)
    } else {
        Err(GeoError::InvalidArgument(format!(
            "radius_km must be a positive finite number, got {radius_km}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        distance_km, within_bounds, within_radius, BoundingBox, Coordinate, GeoError,
    };
    use proptest::prelude::*;

    const RED_SQUARE: Coordinate = Coordinate::new(55.751244, 37.618423);
    const NEVSKY: Coordinate = Coordinate::new(59.935241, 30.327894);

    fn any_coordinate() -> impl Strategy<Value = Coordinate> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lon)| Coordinate::new(lat, lon))
    }

    #[test]
    fn moscow_to_saint_petersburg_is_about_634_km() {
        let distance = distance_km(RED_SQUARE, NEVSKY).unwrap();
        assert!((distance - 634.0).abs() < 5.0, "got {distance}");
    }

    #[test]
    fn antipodal_points_are_half_circumference_apart() {
        let distance =
            distance_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0)).unwrap();
        let expected = std::f64::consts::PI * super::EARTH_RADIUS_KM;
        assert!((distance - expected).abs() < 1e-6);
    }

    #[test]
    fn distance_rejects_out_of_range_and_nan() {
        let err = distance_km(Coordinate::new(91.0, 0.0), RED_SQUARE).unwrap_err();
        assert!(matches!(err, GeoError::InvalidCoordinate { .. }));

        let err = distance_km(RED_SQUARE, Coordinate::new(0.0, f64::NAN)).unwrap_err();
        assert!(matches!(err, GeoError::InvalidCoordinate { .. }));

        let err = distance_km(RED_SQUARE, Coordinate::new(0.0, -180.5)).unwrap_err();
        assert!(matches!(err, GeoError::InvalidCoordinate { .. }));
    }

    #[test]
    fn within_radius_rejects_non_positive_radius() {
        for radius in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = within_radius(RED_SQUARE, radius, RED_SQUARE).unwrap_err();
            assert!(matches!(err, GeoError::InvalidArgument(_)), "radius {radius}");
        }
    }

    #[test]
    fn within_radius_matches_nearby_point_only() {
        let center = Coordinate::new(55.75, 37.62);
        assert!(within_radius(center, 1.0, RED_SQUARE).unwrap());
        assert!(!within_radius(Coordinate::new(0.0, 0.0), 1.0, RED_SQUARE).unwrap());
    }

    #[test]
    fn within_bounds_is_inclusive_and_validates_ordering() {
        let bounds = BoundingBox::new(55.0, 37.0, 56.0, 38.0).unwrap();
        assert!(within_bounds(bounds, Coordinate::new(55.75, 37.62)).unwrap());
        assert!(within_bounds(bounds, Coordinate::new(55.0, 38.0)).unwrap());
        assert!(!within_bounds(bounds, Coordinate::new(59.93, 30.34)).unwrap());

        let err = BoundingBox::new(56.0, 37.0, 55.0, 38.0).unwrap_err();
        assert!(matches!(err, GeoError::InvalidArgument(_)));
        let err = BoundingBox::new(55.0, 38.0, 56.0, 37.0).unwrap_err();
        assert!(matches!(err, GeoError::InvalidArgument(_)));

        let unordered = BoundingBox {
            min_lat: 10.0,
            min_lon: 0.0,
            max_lat: 0.0,
            max_lon: 10.0,
        };
        let err = within_bounds(unordered, Coordinate::new(5.0, 5.0)).unwrap_err();
        assert!(matches!(err, GeoError::InvalidArgument(_)));
    }

    #[test]
    fn enclosing_circle_gives_up_near_poles_and_antimeridian() {
        assert!(BoundingBox::enclosing_circle(Coordinate::new(89.99, 0.0), 5.0)
            .unwrap()
            .is_none());
        assert!(BoundingBox::enclosing_circle(Coordinate::new(0.0, 179.99), 5.0)
            .unwrap()
            .is_none());
        assert!(BoundingBox::enclosing_circle(RED_SQUARE, 5.0)
            .unwrap()
            .is_some());
    }

    #[test]
    fn enclosing_box_keeps_points_at_exact_radius() {
        let center = Coordinate::new(10.0, 20.0);
        for step in 1..400 {
            let offset = f64::from(step) * 0.0123;
            for point in [
                Coordinate::new(center.latitude + offset, center.longitude),
                Coordinate::new(center.latitude - offset, center.longitude),
                Coordinate::new(center.latitude, center.longitude + offset),
                Coordinate::new(center.latitude, center.longitude - offset),
            ] {
                let radius = distance_km(center, point).unwrap();
                let bounds = BoundingBox::enclosing_circle(center, radius)
                    .unwrap()
                    .unwrap();
                assert!(within_radius(center, radius, point).unwrap());
                assert!(
                    within_bounds(bounds, point).unwrap(),
                    "{point:?} at {radius} km fell outside {bounds:?}"
                );
            }
        }
    }

    proptest! {
        #[test]
        fn distance_to_self_is_zero(point in any_coordinate()) {
            prop_assert_eq!(distance_km(point, point).unwrap(), 0.0);
        }

        #[test]
        fn distance_is_symmetric(a in any_coordinate(), b in any_coordinate()) {
            let forward = distance_km(a, b).unwrap();
            let backward = distance_km(b, a).unwrap();
            prop_assert!((forward - backward).abs() < 1e-9);
        }

        #[test]
        fn within_radius_agrees_with_distance(
            center in any_coordinate(),
            point in any_coordinate(),
            radius in 0.001f64..20_000.0,
        ) {
            let inside = within_radius(center, radius, point).unwrap();
            prop_assert_eq!(inside, distance_km(center, point).unwrap() <= radius);
        }

        #[test]
        fn enclosing_box_contains_points_on_the_circle(
            center in (-80.0f64..=80.0, -170.0f64..=170.0),
            bearing in 0.0f64..360.0,
            reach in 0.1f64..200.0,
        ) {
            let center = Coordinate::new(center.0, center.1);
            let point = destination(center, bearing, reach);
            let radius = distance_km(center, point).unwrap();
            let Some(bounds) = BoundingBox::enclosing_circle(center, radius).unwrap() else {
                return Ok(());
            };
            prop_assert!(within_bounds(bounds, point).unwrap());
        }
    }

    fn destination(origin: Coordinate, bearing_deg: f64, distance: f64) -> Coordinate {
        let angular = distance / super::EARTH_RADIUS_KM;
        let bearing = bearing_deg.to_radians();
        let lat1 = origin.latitude.to_radians();
        let lon1 = origin.longitude.to_radians();
        let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
        let lon2 = lon1
            + (bearing.sin() * angular.sin() * lat1.cos())
                .atan2(angular.cos() - lat1.sin() * lat2.sin());
        Coordinate::new(lat2.to_degrees(), lon2.to_degrees())
    }
}
