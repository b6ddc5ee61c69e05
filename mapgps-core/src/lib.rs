//! # MapGPS Core
//!
//! Editing core for GeoJSON map annotation: GPS control points, routes made of
//! ordered waypoints, and named spots.
//!
//! This library provides:
//! - A feature store that owns the loaded FeatureCollection
//! - Route and spot registries derived from the document
//! - Route and spot editors as explicit state machines
//! - Greedy nearest-neighbour waypoint ordering
//! - Per-type statistics recomputed from the document
//!
//! Rendering is not part of this crate. Editors talk to the map through the
//! [`MapSurface`] trait, and [`HeadlessSurface`] records what would be drawn.
//!
//! ## Quick Start
//!
//! ```rust
//! use mapgps_core::{EditMode, EditorConfig, EditorSession, HeadlessSurface, LatLng};
//!
//! let text = r#"{"type": "FeatureCollection", "features": [
//!     {"type": "Feature", "properties": {"type": "ポイントGPS", "id": "A"},
//!      "geometry": {"type": "Point", "coordinates": [135.0, 34.0]}},
//!     {"type": "Feature", "properties": {"type": "ポイントGPS", "id": "B"},
//!      "geometry": {"type": "Point", "coordinates": [135.01, 34.01]}},
//!     {"type": "Feature", "properties": {"type": "route_waypoint",
//!      "route_id": "route_A_to_B", "waypoint_number": "1"},
//!      "geometry": {"type": "Point", "coordinates": [135.005, 34.005]}}
//! ]}"#;
//!
//! let mut session = EditorSession::new(HeadlessSurface::new(), EditorConfig::default());
//! session.load_str(text).unwrap();
//! assert_eq!(session.stats().route_count, 1);
//!
//! session.set_mode(EditMode::Route);
//! session.select_route(Some("route_A_to_B"));
//! session.toggle_route_add_move().unwrap();
//! session.click_map(LatLng::new(34.002, 135.002)).unwrap();
//! assert_eq!(session.route_waypoint_count("route_A_to_B"), 2);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{EditError, OptionExt, Result};

// User-facing messages
pub mod notice;
pub use notice::{Notice, NoticeLevel};

// Editor configuration
pub mod config;
pub use config::EditorConfig;

// Geographic utilities (distance, matching, bounds)
pub mod geo_utils;

// Typed feature view and the document store
pub mod feature;
pub use feature::{FeatureId, FeatureKind, GeometryKind, StoredFeature};
pub mod store;
pub use store::FeatureStore;

// Route registry and ordering
pub mod routes;
pub use routes::{
    extract_routes, line_coordinates, waypoint_count, waypoint_ids, waypoints_of, Route, RouteOption,
    RouteRegistry,
};
pub mod optimize;
pub use optimize::{nearest_neighbor_order, optimize_route};

// Spot registry
pub mod spots;
pub use spots::{extract_spots, Spot, SpotRegistry};

// Rendering capability
pub mod render;
pub use render::{HeadlessSurface, MapSurface, MarkerHandle, PolylineId};

// Editors
pub mod route_editor;
pub use route_editor::{RouteEditMode, RouteEditor};
pub mod spot_editor;
pub use spot_editor::{SpotDetails, SpotEditMode, SpotEditor};

// Statistics
pub mod stats;
pub use stats::{compute_stats, MapStats};

// Application shell
pub mod session;
pub use session::{EditMode, EditorSession};

// ============================================================================
// Core Types
// ============================================================================

/// A map position in degrees.
///
/// GeoJSON stores positions as `[longitude, latitude]`; this type keeps the
/// two axes named to avoid mixing them up.
///
/// # Example
/// ```
/// use mapgps_core::LatLng;
/// let minoh_falls = LatLng::new(34.853667, 135.472041);
/// assert_eq!(minoh_falls.to_position(), vec![135.472041, 34.853667]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Read a GeoJSON position. Extra axes (altitude) are ignored.
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lng, lat, ..] => Some(Self::new(*lat, *lng)),
            _ => None,
        }
    }

    /// GeoJSON position `[lng, lat]`.
    pub fn to_position(self) -> Vec<f64> {
        vec![self.lng, self.lat]
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// The position itself if it can be written to a document.
    pub fn checked(self) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(EditError::InvalidPosition {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }
}

impl From<LatLng> for geo::Point<f64> {
    fn from(p: LatLng) -> Self {
        geo::Point::new(p.lng, p.lat)
    }
}
