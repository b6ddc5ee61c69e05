//! Greedy nearest-neighbour waypoint ordering.
//!
//! Starting at the route's start point, repeatedly visit the closest
//! remaining waypoint. O(n²) in the number of waypoints, which stays in the
//! tens for hand-edited routes.

use log::debug;

use crate::error::{EditError, Result};
use crate::feature::FeatureId;
use crate::geo_utils::haversine_km;
use crate::routes::{waypoints_of, Route};
use crate::store::FeatureStore;
use crate::LatLng;

/// Order `candidates` by repeatedly taking the nearest one to the current
/// position, beginning at `start`.
///
/// Ties go to the candidate listed first.
///
/// # Example
/// ```
/// use mapgps_core::{nearest_neighbor_order, LatLng};
///
/// let start = LatLng::new(34.0, 135.0);
/// let candidates = [
///     ("far", LatLng::new(34.009, 135.009)),
///     ("near", LatLng::new(34.001, 135.001)),
///     ("middle", LatLng::new(34.005, 135.005)),
/// ];
/// assert_eq!(nearest_neighbor_order(start, &candidates), vec!["near", "middle", "far"]);
/// ```
pub fn nearest_neighbor_order<T: Copy>(start: LatLng, candidates: &[(T, LatLng)]) -> Vec<T> {
    let mut remaining: Vec<(T, LatLng)> = candidates.to_vec();
    let mut ordered = Vec::with_capacity(remaining.len());
    let mut current = start;

    while !remaining.is_empty() {
        let mut nearest_index = 0;
        let mut min_distance = f64::INFINITY;

        for (index, (_, position)) in remaining.iter().enumerate() {
            let distance = haversine_km(&current, position);
            if distance < min_distance {
                min_distance = distance;
                nearest_index = index;
            }
        }

        let (item, position) = remaining.remove(nearest_index);
        ordered.push(item);
        current = position;
    }

    ordered
}

/// Renumber a route's waypoints `1..=n` along the nearest-neighbour chain.
///
/// Both endpoints must exist as GPS points; otherwise nothing is changed.
/// Candidates are taken in document order, so running this twice gives the
/// same numbering. Waypoints without a Point position keep their relative
/// order and are numbered after the placed ones.
///
/// Returns the number of waypoints renumbered.
pub fn optimize_route(store: &mut FeatureStore, route_id: &str) -> Result<usize> {
    let route = Route::parse(route_id).ok_or_else(|| EditError::InvalidRouteId {
        route_id: route_id.to_string(),
    })?;

    let missing = |point_id: &str| EditError::MissingEndpoint {
        route_id: route_id.to_string(),
        point_id: point_id.to_string(),
    };
    let start = store
        .gps_point(&route.start_id)
        .and_then(|f| f.position())
        .ok_or_else(|| missing(&route.start_id))?;
    if store.gps_point(&route.end_id).is_none() {
        return Err(missing(&route.end_id));
    }

    let candidates: Vec<(FeatureId, LatLng)> = store
        .iter()
        .filter(|f| f.is_waypoint_of(route_id))
        .filter_map(|f| f.position().map(|p| (f.id(), p)))
        .collect();
    let unplaced: Vec<FeatureId> = waypoints_of(store, route_id)
        .iter()
        .filter(|f| f.position().is_none())
        .map(|f| f.id())
        .collect();

    let mut order = nearest_neighbor_order(start, &candidates);
    order.extend(unplaced);

    for (rank, id) in order.iter().enumerate() {
        if let Some(feature) = store.get_mut(*id) {
            feature.set_property("waypoint_number", (rank + 1).to_string());
        }
    }

    debug!(
        "[optimize] Renumbered {} waypoints of {}",
        order.len(),
        route_id
    );
    Ok(order.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::waypoint_ids;

    fn store_with(waypoints: &[(f64, f64, &str)], with_end: bool) -> FeatureStore {
        let mut features = vec![serde_json::json!({
            "type": "Feature",
            "properties": {"type": "ポイントGPS", "id": "A"},
            "geometry": {"type": "Point", "coordinates": [135.0, 34.0]}
        })];
        if with_end {
            features.push(serde_json::json!({
                "type": "Feature",
                "properties": {"type": "ポイントGPS", "id": "B"},
                "geometry": {"type": "Point", "coordinates": [135.01, 34.01]}
            }));
        }
        for (lat, lng, number) in waypoints {
            features.push(serde_json::json!({
                "type": "Feature",
                "properties": {"type": "route_waypoint", "route_id": "route_A_to_B", "waypoint_number": number},
                "geometry": {"type": "Point", "coordinates": [lng, lat]}
            }));
        }
        let text = serde_json::json!({"type": "FeatureCollection", "features": features}).to_string();
        FeatureStore::parse(&text).unwrap()
    }

    fn positions_in_order(store: &FeatureStore) -> Vec<LatLng> {
        waypoints_of(store, "route_A_to_B")
            .iter()
            .filter_map(|f| f.position())
            .collect()
    }

    #[test]
    fn test_chain_follows_proximity_from_start() {
        let mut store = store_with(
            &[
                (34.008, 135.008, "1"),
                (34.002, 135.002, "2"),
                (34.005, 135.005, "3"),
            ],
            true,
        );
        assert_eq!(optimize_route(&mut store, "route_A_to_B"), Ok(3));
        assert_eq!(
            positions_in_order(&store),
            vec![
                LatLng::new(34.002, 135.002),
                LatLng::new(34.005, 135.005),
                LatLng::new(34.008, 135.008),
            ]
        );
        let numbers: Vec<_> = waypoints_of(&store, "route_A_to_B")
            .iter()
            .map(|f| f.str_property("waypoint_number").unwrap().to_string())
            .collect();
        assert_eq!(numbers, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_idempotent_and_preserves_set() {
        let mut store = store_with(
            &[
                (34.004, 135.001, "5"),
                (34.001, 135.004, "1"),
                (34.009, 135.002, "9"),
                (34.003, 135.003, "2"),
            ],
            true,
        );
        let mut before = waypoint_ids(&store, "route_A_to_B");
        optimize_route(&mut store, "route_A_to_B").unwrap();
        let once = waypoint_ids(&store, "route_A_to_B");
        optimize_route(&mut store, "route_A_to_B").unwrap();
        let twice = waypoint_ids(&store, "route_A_to_B");
        assert_eq!(once, twice);

        let mut after = once.clone();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn test_ties_keep_document_order() {
        let mut store = store_with(&[(34.005, 135.005, "2"), (34.005, 135.005, "1")], true);
        let document_order: Vec<_> = store
            .iter()
            .filter(|f| f.is_waypoint_of("route_A_to_B"))
            .map(|f| f.id())
            .collect();
        optimize_route(&mut store, "route_A_to_B").unwrap();
        assert_eq!(waypoint_ids(&store, "route_A_to_B"), document_order);
    }

    #[test]
    fn test_missing_endpoint_changes_nothing() {
        let mut store = store_with(&[(34.008, 135.008, "1"), (34.002, 135.002, "2")], false);
        let before = store.to_collection();
        assert!(matches!(
            optimize_route(&mut store, "route_A_to_B"),
            Err(EditError::MissingEndpoint { ref point_id, .. }) if point_id == "B"
        ));
        assert_eq!(store.to_collection(), before);
    }

    #[test]
    fn test_no_waypoints_and_bad_ids() {
        let mut store = store_with(&[], true);
        assert_eq!(optimize_route(&mut store, "route_A_to_B"), Ok(0));
        assert!(matches!(
            optimize_route(&mut store, "A-B"),
            Err(EditError::InvalidRouteId { .. })
        ));
    }

    #[test]
    fn test_empty_candidates() {
        let order: Vec<u8> = nearest_neighbor_order(LatLng::new(0.0, 0.0), &[]);
        assert!(order.is_empty());
    }
}
