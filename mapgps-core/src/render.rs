//! Rendering capability used by the editors.
//!
//! The editors never draw anything themselves. They ask a [`MapSurface`] for
//! the marker of a feature and change its colour or drag state, and they hand
//! it coordinate lists to draw as polylines. Any map backend can implement
//! these traits; [`HeadlessSurface`] keeps the resulting state in memory.

use std::collections::{BTreeMap, HashMap};

use crate::feature::{FeatureId, FeatureKind, GeometryKind, StoredFeature};
use crate::store::FeatureStore;
use crate::LatLng;

/// Marker colours.
pub mod palette {
    pub const GPS_POINT: &str = "#008000";
    pub const GENERIC_POINT: &str = "#006400";
    pub const ROUTE_ENDPOINT_SELECTED: &str = "#ff0000";
    pub const WAYPOINT: &str = "#f58220";
    pub const WAYPOINT_SELECTED: &str = "#ef454a";
    pub const ROUTE_LINE: &str = "#ef454a";
    pub const SPOT: &str = "#0000ff";
    pub const SPOT_SELECTED: &str = "#00ffff";
    pub const POLYGON: &str = "#3388ff";
}

/// Resting colour of a feature's marker.
pub fn default_color(feature: &StoredFeature) -> &'static str {
    let geometry = feature.geometry_kind();
    if geometry != GeometryKind::Point {
        return palette::POLYGON;
    }
    match feature.kind() {
        FeatureKind::GpsPoint => palette::GPS_POINT,
        FeatureKind::RouteWaypoint => palette::WAYPOINT,
        FeatureKind::Spot => palette::SPOT,
        FeatureKind::Generic | FeatureKind::Unknown(_) => palette::GENERIC_POINT,
    }
}

/// Handle of a drawn polyline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolylineId(pub u64);

/// What the editors need from a rendered feature.
pub trait MarkerHandle {
    fn set_highlight(&mut self, color: &'static str);
    fn set_draggable(&mut self, draggable: bool);
    fn remove(&mut self);
    fn position(&self) -> Option<LatLng>;
    fn set_position(&mut self, position: LatLng);
}

/// The map the editors draw on.
pub trait MapSurface {
    type Marker: MarkerHandle;

    /// Marker of a feature, if one is on the map.
    fn marker(&mut self, id: FeatureId) -> Option<&mut Self::Marker>;

    /// Draw a marker for a feature.
    fn place_marker(&mut self, feature: &StoredFeature, color: &'static str);

    fn draw_polyline(&mut self, coords: &[LatLng], color: &'static str) -> PolylineId;

    fn erase_polyline(&mut self, line: PolylineId);

    /// Drop every marker and line.
    fn clear(&mut self);

    fn remove_marker(&mut self, id: FeatureId) {
        if let Some(marker) = self.marker(id) {
            marker.remove();
        }
    }

    fn highlight(&mut self, id: FeatureId, color: &'static str) {
        if let Some(marker) = self.marker(id) {
            marker.set_highlight(color);
        }
    }

    fn set_draggable(&mut self, id: FeatureId, draggable: bool) {
        if let Some(marker) = self.marker(id) {
            marker.set_draggable(draggable);
        }
    }

    fn move_marker(&mut self, id: FeatureId, position: LatLng) {
        if let Some(marker) = self.marker(id) {
            marker.set_position(position);
        }
    }
}

/// Replace whatever is on the surface with markers for every feature.
pub fn draw_document<S: MapSurface>(surface: &mut S, store: &FeatureStore) {
    surface.clear();
    for feature in store.iter() {
        surface.place_marker(feature, default_color(feature));
    }
}

// ============================================================================
// Headless implementation
// ============================================================================

/// In-memory marker state.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMarker {
    pub position: Option<LatLng>,
    pub color: &'static str,
    pub draggable: bool,
    removed: bool,
}

impl MarkerHandle for HeadlessMarker {
    fn set_highlight(&mut self, color: &'static str) {
        self.color = color;
    }

    fn set_draggable(&mut self, draggable: bool) {
        self.draggable = draggable;
    }

    fn remove(&mut self) {
        self.removed = true;
        self.draggable = false;
    }

    fn position(&self) -> Option<LatLng> {
        self.position
    }

    fn set_position(&mut self, position: LatLng) {
        self.position = Some(position);
    }
}

/// A surface that draws nothing and remembers everything.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    markers: HashMap<FeatureId, HeadlessMarker>,
    lines: BTreeMap<PolylineId, (Vec<LatLng>, &'static str)>,
    next_line: u64,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a marker that is still on the map.
    pub fn marker_state(&self, id: FeatureId) -> Option<&HeadlessMarker> {
        self.markers.get(&id).filter(|m| !m.removed)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.values().filter(|m| !m.removed).count()
    }

    /// Ids of markers currently accepting drags, sorted.
    pub fn draggable_markers(&self) -> Vec<FeatureId> {
        let mut ids: Vec<_> = self
            .markers
            .iter()
            .filter(|(_, m)| !m.removed && m.draggable)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn lines(&self) -> impl Iterator<Item = &[LatLng]> {
        self.lines.values().map(|(coords, _)| coords.as_slice())
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

impl MapSurface for HeadlessSurface {
    type Marker = HeadlessMarker;

    fn marker(&mut self, id: FeatureId) -> Option<&mut HeadlessMarker> {
        self.markers.get_mut(&id).filter(|m| !m.removed)
    }

    fn place_marker(&mut self, feature: &StoredFeature, color: &'static str) {
        let position = feature
            .position()
            .or_else(|| feature.positions().first().copied());
        self.markers.insert(
            feature.id(),
            HeadlessMarker {
                position,
                color,
                draggable: false,
                removed: false,
            },
        );
    }

    fn draw_polyline(&mut self, coords: &[LatLng], color: &'static str) -> PolylineId {
        self.next_line += 1;
        let id = PolylineId(self.next_line);
        self.lines.insert(id, (coords.to_vec(), color));
        id
    }

    fn erase_polyline(&mut self, line: PolylineId) {
        self.lines.remove(&line);
    }

    fn clear(&mut self) {
        self.markers.clear();
        self.lines.clear();
    }
}
