//! Per-type feature counts.
//!
//! Always a full rescan of the document; the counts are cheap and never
//! drift from the data.

use std::collections::HashSet;

use geojson::Value;
use serde::Serialize;

use crate::feature::{FeatureKind, GeometryKind};
use crate::store::FeatureStore;

/// Counts shown in the stats panel and encoded in export file names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MapStats {
    /// 1 when a document is loaded
    pub file_count: u32,
    /// GPS points plus untyped or unrecognised Point features
    pub point_count: usize,
    /// Line geometries, or distinct waypoint route ids when there are none
    pub route_count: usize,
    /// Point spots plus polygons
    pub spot_count: usize,
}

/// Count the features of a document.
pub fn compute_stats(store: Option<&FeatureStore>) -> MapStats {
    let Some(store) = store else {
        return MapStats::default();
    };

    let mut stats = MapStats {
        file_count: 1,
        ..MapStats::default()
    };
    let mut line_count = 0;
    let mut waypoint_routes: HashSet<&str> = HashSet::new();

    for feature in store.iter() {
        if let Some(geometry) = &feature.feature().geometry {
            line_count += count_lines(&geometry.value);
        }

        match feature.geometry_kind() {
            GeometryKind::Point => match feature.kind() {
                FeatureKind::RouteWaypoint => {
                    if let Some(route_id) = feature.route_id().filter(|id| !id.is_empty()) {
                        waypoint_routes.insert(route_id);
                    }
                }
                FeatureKind::Spot => stats.spot_count += 1,
                FeatureKind::GpsPoint | FeatureKind::Generic | FeatureKind::Unknown(_) => {
                    stats.point_count += 1
                }
            },
            kind if kind.is_polygonal() => stats.spot_count += 1,
            _ => {}
        }
    }

    stats.route_count = if line_count > 0 {
        line_count
    } else {
        waypoint_routes.len()
    };
    stats
}

fn count_lines(value: &Value) -> usize {
    match value {
        Value::LineString(_) | Value::MultiLineString(_) => 1,
        Value::GeometryCollection(geometries) => {
            geometries.iter().map(|g| count_lines(&g.value)).sum()
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gps(id: &str, lng: f64, lat: f64) -> String {
        format!(
            r#"{{"type": "Feature", "properties": {{"type": "ポイントGPS", "id": "{}"}},
                "geometry": {{"type": "Point", "coordinates": [{}, {}]}}}}"#,
            id, lng, lat
        )
    }

    fn waypoint(route_id: &str, number: u32) -> String {
        format!(
            r#"{{"type": "Feature", "properties": {{"type": "route_waypoint", "route_id": "{}", "waypoint_number": "{}"}},
                "geometry": {{"type": "Point", "coordinates": [135.005, 34.005]}}}}"#,
            route_id, number
        )
    }

    fn collection(features: &[String]) -> FeatureStore {
        let text = format!(
            r#"{{"type": "FeatureCollection", "features": [{}]}}"#,
            features.join(",")
        );
        FeatureStore::parse(&text).unwrap()
    }

    #[test]
    fn test_nothing_loaded() {
        assert_eq!(compute_stats(None), MapStats::default());
    }

    #[test]
    fn test_waypoint_fallback_scenario() {
        let store = collection(&[
            gps("A", 135.0, 34.0),
            gps("B", 135.01, 34.01),
            waypoint("route_A_to_B", 1),
            waypoint("route_A_to_B", 2),
            waypoint("route_A_to_B", 3),
            r#"{"type": "Feature", "properties": {"type": "spot", "name": "falls"},
                "geometry": {"type": "Point", "coordinates": [135.1, 34.1]}}"#
                .to_string(),
        ]);
        let stats = compute_stats(Some(&store));
        assert_eq!(
            stats,
            MapStats {
                file_count: 1,
                point_count: 2,
                route_count: 1,
                spot_count: 1,
            }
        );
    }

    #[test]
    fn test_line_geometries_take_precedence() {
        let store = collection(&[
            waypoint("route_A_to_B", 1),
            waypoint("route_C_to_D", 1),
            r#"{"type": "Feature", "properties": {},
                "geometry": {"type": "GeometryCollection", "geometries": [
                    {"type": "LineString", "coordinates": [[135.0, 34.0], [135.1, 34.1]]},
                    {"type": "MultiLineString", "coordinates": [[[135.0, 34.0], [135.1, 34.1]]]},
                    {"type": "Point", "coordinates": [135.0, 34.0]}
                ]}}"#
                .to_string(),
        ]);
        assert_eq!(compute_stats(Some(&store)).route_count, 2);
    }

    #[test]
    fn test_untyped_points_and_polygons() {
        let store = collection(&[
            r#"{"type": "Feature", "properties": {},
                "geometry": {"type": "Point", "coordinates": [135.0, 34.0]}}"#
                .to_string(),
            r#"{"type": "Feature", "properties": {"type": "marker"},
                "geometry": {"type": "Point", "coordinates": [135.0, 34.0]}}"#
                .to_string(),
            r#"{"type": "Feature", "properties": {"type": "ポイントGPS"},
                "geometry": {"type": "Polygon", "coordinates": [[[135.0, 34.0], [135.1, 34.0], [135.1, 34.1], [135.0, 34.0]]]}}"#
                .to_string(),
        ]);
        let stats = compute_stats(Some(&store));
        assert_eq!(stats.point_count, 2);
        assert_eq!(stats.spot_count, 1);
        assert_eq!(stats.route_count, 0);
    }
}
