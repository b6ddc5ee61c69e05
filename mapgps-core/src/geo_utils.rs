//! Geographic utilities: great-circle distance, coordinate matching, bounds.

use geo::{BoundingRect, MultiPoint, Point, Rect};

use crate::LatLng;

/// Mean Earth radius used by the route optimizer, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two points in kilometres.
pub fn haversine_km(a: &LatLng, b: &LatLng) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// True when both axes differ by strictly less than `epsilon` degrees.
pub fn same_position(a: &LatLng, b: &LatLng, epsilon: f64) -> bool {
    (a.lat - b.lat).abs() < epsilon && (a.lng - b.lng).abs() < epsilon
}

/// Bounding box of a set of positions (x = longitude, y = latitude).
pub fn compute_bounds(points: &[LatLng]) -> Option<Rect<f64>> {
    let multi: MultiPoint<f64> = points.iter().map(|p| Point::from(*p)).collect();
    multi.bounding_rect()
}
