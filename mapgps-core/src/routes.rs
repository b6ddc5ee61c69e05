//! # Route Registry
//!
//! Routes are not stored as features. A route exists because waypoint
//! features carry a `route_id` of the form `route_<startId>_to_<endId>`; the
//! start and end are GPS points looked up by `properties.id`.
//!
//! The registry is a derived index. It is never authoritative and is rebuilt
//! from the store after structural edits.

use std::collections::{BTreeSet, HashSet};

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::feature::{FeatureId, FeatureKind, StoredFeature};
use crate::store::FeatureStore;
use crate::LatLng;

static ROUTE_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^route_(.+)_to_(.+)$").expect("route id pattern is valid"));

/// A start/end pair identified by its route id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Route {
    pub route_id: String,
    pub start_id: String,
    pub end_id: String,
}

impl Route {
    /// Split a route id into its endpoints.
    ///
    /// The start part is matched greedily, so `route_a_to_b_to_c` starts at
    /// `a_to_b` and ends at `c`.
    pub fn parse(route_id: &str) -> Option<Self> {
        let captures = ROUTE_ID_PATTERN.captures(route_id)?;
        Some(Self {
            route_id: route_id.to_string(),
            start_id: captures[1].to_string(),
            end_id: captures[2].to_string(),
        })
    }

    /// Display label used in route pickers.
    pub fn label(&self, waypoint_count: usize) -> String {
        format!("{} ～ {} ({})", self.start_id, self.end_id, waypoint_count)
    }

    fn touches_prefix(&self, prefix: char) -> bool {
        self.start_id.starts_with(prefix) || self.end_id.starts_with(prefix)
    }
}

/// Collect the routes referenced by Point waypoints, in first-seen order.
///
/// Ids that do not match the route pattern are skipped with a warning.
pub fn extract_routes(store: &FeatureStore) -> Vec<Route> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut routes = Vec::new();

    for feature in store.iter() {
        if !feature.is_point() || feature.kind() != &FeatureKind::RouteWaypoint {
            continue;
        }
        let Some(route_id) = feature.route_id().filter(|id| !id.is_empty()) else {
            continue;
        };
        if !seen.insert(route_id) {
            continue;
        }
        match Route::parse(route_id) {
            Some(route) => routes.push(route),
            None => warn!("[routes] Ignoring malformed route id '{}'", route_id),
        }
    }

    routes
}

/// Waypoints of a route sorted by `waypoint_number`.
///
/// The sort is stable, so waypoints sharing a number (or lacking one, which
/// reads as 0) keep document order.
pub fn waypoints_of<'a>(store: &'a FeatureStore, route_id: &str) -> Vec<&'a StoredFeature> {
    let mut waypoints: Vec<&StoredFeature> =
        store.iter().filter(|f| f.is_waypoint_of(route_id)).collect();
    waypoints.sort_by_key(|f| f.waypoint_number());
    waypoints
}

/// Ids of a route's waypoints in traversal order.
pub fn waypoint_ids(store: &FeatureStore, route_id: &str) -> Vec<FeatureId> {
    waypoints_of(store, route_id).iter().map(|f| f.id()).collect()
}

pub fn waypoint_count(store: &FeatureStore, route_id: &str) -> usize {
    store.iter().filter(|f| f.is_waypoint_of(route_id)).count()
}

/// Polyline `[start, ...waypoints, end]` for a route.
///
/// Missing endpoints are left out. Returns `None` when fewer than two
/// positions resolve or the route id is malformed.
pub fn line_coordinates(store: &FeatureStore, route_id: &str) -> Option<Vec<LatLng>> {
    let route = Route::parse(route_id)?;
    let endpoint = |point_id: &str| store.gps_point(point_id).and_then(|f| f.position());

    let mut coords = Vec::new();
    coords.extend(endpoint(&route.start_id));
    coords.extend(
        waypoints_of(store, route_id)
            .iter()
            .filter_map(|f| f.position()),
    );
    coords.extend(endpoint(&route.end_id));

    if coords.len() >= 2 {
        Some(coords)
    } else {
        None
    }
}

/// One entry of the filtered route picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteOption {
    pub route_id: String,
    pub label: String,
    pub waypoint_count: usize,
}

/// Derived index of routes with the cascading picker filters.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    routes: Vec<Route>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_store(store: &FeatureStore) -> Self {
        Self {
            routes: extract_routes(store),
        }
    }

    /// Replace the index with a fresh scan of the store.
    pub fn rebuild(&mut self, store: &FeatureStore) {
        self.routes = extract_routes(store);
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn get(&self, route_id: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.route_id == route_id)
    }

    pub fn contains(&self, route_id: &str) -> bool {
        self.get(route_id).is_some()
    }

    pub fn remove(&mut self, route_id: &str) -> Option<Route> {
        let index = self.routes.iter().position(|r| r.route_id == route_id)?;
        Some(self.routes.remove(index))
    }

    /// Sorted first characters of every route endpoint id.
    pub fn start_prefixes(&self) -> Vec<char> {
        self.routes
            .iter()
            .flat_map(|r| [&r.start_id, &r.end_id])
            .filter_map(|id| id.chars().next())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sorted endpoint ids, narrowed to ids starting with `prefix`.
    pub fn end_candidates(&self, prefix: Option<char>) -> Vec<String> {
        self.routes
            .iter()
            .flat_map(|r| [&r.start_id, &r.end_id])
            .filter(|id| prefix.map_or(true, |p| id.starts_with(p)))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Routes with an endpoint starting with `prefix`, then with an endpoint
    /// equal to `end_id`. Registry order is kept.
    pub fn filter(&self, prefix: Option<char>, end_id: Option<&str>) -> Vec<&Route> {
        self.routes
            .iter()
            .filter(|r| prefix.map_or(true, |p| r.touches_prefix(p)))
            .filter(|r| end_id.map_or(true, |e| r.start_id == e || r.end_id == e))
            .collect()
    }

    /// Filtered routes with their picker labels.
    pub fn options(
        &self,
        store: &FeatureStore,
        prefix: Option<char>,
        end_id: Option<&str>,
    ) -> Vec<RouteOption> {
        self.filter(prefix, end_id)
            .into_iter()
            .map(|route| {
                let count = waypoint_count(store, &route.route_id);
                RouteOption {
                    route_id: route.route_id.clone(),
                    label: route.label(count),
                    waypoint_count: count,
                }
            })
            .collect()
    }
}
