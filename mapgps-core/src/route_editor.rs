//! # Route Editor
//!
//! Explicit state machine for editing one route at a time:
//!
//! ```text
//! Idle ──toggle add/move──▶ AddMove(route) ──toggle / exit──▶ Idle
//! Idle ──toggle delete───▶ Delete(route)  ──toggle / exit──▶ Idle
//! ```
//!
//! Entering one mode leaves the other, exiting is idempotent, and selecting a
//! different route leaves whatever mode was active. Waypoints are addressed by
//! [`FeatureId`], so re-optimization after an edit cannot retarget a drag in
//! progress.

use log::{debug, info};

use crate::error::{EditError, OptionExt, Result};
use crate::feature::{waypoint_feature, FeatureId};
use crate::geo_utils::same_position;
use crate::optimize::optimize_route;
use crate::render::{palette, MapSurface, MarkerHandle, PolylineId};
use crate::routes::{line_coordinates, waypoint_ids, Route, RouteRegistry};
use crate::store::FeatureStore;
use crate::LatLng;

/// Edit mode of the route editor. Active modes carry the route they were
/// entered for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RouteEditMode {
    #[default]
    Idle,
    AddMove(String),
    Delete(String),
}

impl RouteEditMode {
    pub fn route_id(&self) -> Option<&str> {
        match self {
            RouteEditMode::Idle => None,
            RouteEditMode::AddMove(route_id) | RouteEditMode::Delete(route_id) => Some(route_id),
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, RouteEditMode::Idle)
    }
}

/// Waypoint armed for dragging. The identity is fixed when the drag starts.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveDrag {
    route_id: String,
    waypoint: FeatureId,
    moved: bool,
}

/// Selection, mode and drag state of route editing.
#[derive(Debug, Default)]
pub struct RouteEditor {
    selected: Option<String>,
    mode: RouteEditMode,
    route_line: Option<PolylineId>,
    drag: Option<ActiveDrag>,
}

impl RouteEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_route(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn mode(&self) -> &RouteEditMode {
        &self.mode
    }

    /// Waypoint currently armed for dragging.
    pub fn dragging(&self) -> Option<FeatureId> {
        self.drag.as_ref().map(|d| d.waypoint)
    }

    /// Forget all state. Used when a new document replaces the old one and
    /// the surface has already been cleared.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Select a route (or nothing) and highlight it.
    ///
    /// An active mode for another route is exited first and returned. The
    /// previous highlight is always cleared. An id that resolves to no
    /// waypoint and no endpoint leaves nothing selected.
    pub fn select_route<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        surface: &mut S,
        route_id: Option<&str>,
    ) -> Option<RouteEditMode> {
        let route_id = route_id.filter(|id| !id.is_empty());
        let exited = if self.mode.is_active() && self.mode.route_id() != route_id {
            self.exit_mode(store, surface)
        } else {
            None
        };

        self.reset_highlight(store, surface);
        let Some(route_id) = route_id else {
            return exited;
        };
        if !route_resolves(store, route_id) {
            debug!("[route_editor] {} resolves to nothing, selection cleared", route_id);
            return exited;
        }

        self.selected = Some(route_id.to_string());
        paint_route(
            store,
            surface,
            route_id,
            palette::ROUTE_ENDPOINT_SELECTED,
            palette::WAYPOINT_SELECTED,
        );
        self.redraw_line(store, surface);
        debug!("[route_editor] Selected {}", route_id);
        exited
    }

    /// Restore resting colours, erase the route line and drop the selection.
    pub fn reset_highlight<S: MapSurface>(&mut self, store: &FeatureStore, surface: &mut S) {
        if let Some(line) = self.route_line.take() {
            surface.erase_polyline(line);
        }
        if let Some(route_id) = self.selected.take() {
            paint_route(store, surface, &route_id, palette::GPS_POINT, palette::WAYPOINT);
        }
    }

    fn redraw_line<S: MapSurface>(&mut self, store: &FeatureStore, surface: &mut S) {
        if let Some(line) = self.route_line.take() {
            surface.erase_polyline(line);
        }
        let Some(route_id) = &self.selected else {
            return;
        };
        if let Some(coords) = line_coordinates(store, route_id) {
            self.route_line = Some(surface.draw_polyline(&coords, palette::ROUTE_LINE));
        }
    }

    fn refresh_line<S: MapSurface>(&mut self, store: &FeatureStore, surface: &mut S, route_id: &str) {
        if self.selected.as_deref() == Some(route_id) {
            self.redraw_line(store, surface);
        }
    }

    // ========================================================================
    // Modes
    // ========================================================================

    /// Toggle add/move mode for the selected route. Returns whether the mode
    /// is now active.
    pub fn toggle_add_move<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        surface: &mut S,
    ) -> Result<bool> {
        let route_id = self.selected.clone().ok_or(EditError::NoRouteSelected)?;
        let was_add_move = matches!(self.mode, RouteEditMode::AddMove(_));
        self.exit_mode(store, surface);
        if was_add_move {
            return Ok(false);
        }
        debug!("[route_editor] Add/move mode on {}", route_id);
        self.mode = RouteEditMode::AddMove(route_id);
        Ok(true)
    }

    /// Toggle delete mode for the selected route. Returns whether the mode is
    /// now active.
    pub fn toggle_delete<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        surface: &mut S,
    ) -> Result<bool> {
        let route_id = self.selected.clone().ok_or(EditError::NoRouteSelected)?;
        let was_delete = matches!(self.mode, RouteEditMode::Delete(_));
        self.exit_mode(store, surface);
        if was_delete {
            return Ok(false);
        }
        debug!("[route_editor] Delete mode on {}", route_id);
        self.mode = RouteEditMode::Delete(route_id);
        Ok(true)
    }

    /// Leave the active mode, returning it. A drag in progress is committed
    /// at the marker's current position, not rolled back.
    pub fn exit_mode<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        surface: &mut S,
    ) -> Option<RouteEditMode> {
        if let Some(drag) = self.drag.take() {
            self.finish_drag(store, surface, drag, None);
        }

        let previous = std::mem::take(&mut self.mode);
        if let RouteEditMode::AddMove(route_id) = &previous {
            for id in waypoint_ids(store, route_id) {
                surface.set_draggable(id, false);
            }
        }
        if previous.is_active() {
            debug!("[route_editor] Left {:?}", previous);
            Some(previous)
        } else {
            None
        }
    }

    // ========================================================================
    // Waypoint edits
    // ========================================================================

    /// Append a waypoint numbered after the current maximum, then re-optimize
    /// the route.
    ///
    /// The waypoint is kept even when the route's endpoints are missing and
    /// re-optimization has to be skipped. Invalid positions are rejected
    /// before anything changes.
    pub fn add_waypoint<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        surface: &mut S,
        route_id: &str,
        position: LatLng,
    ) -> Result<FeatureId> {
        if Route::parse(route_id).is_none() {
            return Err(EditError::InvalidRouteId {
                route_id: route_id.to_string(),
            });
        }
        let position = position.checked()?;

        let number = store
            .iter()
            .filter(|f| f.is_waypoint_of(route_id))
            .map(|f| f.waypoint_number())
            .fold(0, i64::max)
            + 1;
        let id = store.insert(waypoint_feature(route_id, number, position));

        let color = if self.selected.as_deref() == Some(route_id) {
            palette::WAYPOINT_SELECTED
        } else {
            palette::WAYPOINT
        };
        if let Some(feature) = store.get(id) {
            surface.place_marker(feature, color);
        }
        debug!(
            "[route_editor] Added waypoint {} to {} at ({:.6}, {:.6})",
            id, route_id, position.lat, position.lng
        );

        self.reoptimize(store, surface, route_id);
        Ok(id)
    }

    /// Move the waypoint at `index` of the current sorted order.
    ///
    /// The index is resolved to an identity once; the returned id is what
    /// later moves of the same waypoint should use.
    pub fn move_waypoint<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        surface: &mut S,
        route_id: &str,
        index: usize,
        position: LatLng,
    ) -> Result<FeatureId> {
        let id = waypoint_ids(store, route_id)
            .get(index)
            .copied()
            .ok_or_else(|| EditError::WaypointNotFound {
                route_id: route_id.to_string(),
            })?;
        self.move_waypoint_by_id(store, surface, route_id, id, position)?;
        Ok(id)
    }

    /// Rewrite a waypoint's coordinates without renumbering.
    pub fn move_waypoint_by_id<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        surface: &mut S,
        route_id: &str,
        id: FeatureId,
        position: LatLng,
    ) -> Result<()> {
        let position = position.checked()?;
        let feature = store.get_mut(id).ok_or_unknown_feature(id)?;
        if !feature.is_waypoint_of(route_id) || !feature.set_position(position) {
            return Err(EditError::NotAWaypoint {
                id,
                route_id: route_id.to_string(),
            });
        }
        surface.move_marker(id, position);
        self.refresh_line(store, surface, route_id);
        Ok(())
    }

    /// Arm a waypoint of the add/move route for dragging. Any other armed
    /// waypoint is finished first.
    pub fn begin_drag<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        surface: &mut S,
        id: FeatureId,
    ) -> Result<()> {
        let RouteEditMode::AddMove(route_id) = &self.mode else {
            return Err(EditError::ModeInactive { mode: "Add/move" });
        };
        let route_id = route_id.clone();
        let feature = store.get(id).ok_or_unknown_feature(id)?;
        if !feature.is_waypoint_of(&route_id) || !feature.is_point() {
            return Err(EditError::NotAWaypoint { id, route_id });
        }

        if let Some(previous) = self.drag.take() {
            self.finish_drag(store, surface, previous, None);
        }
        surface.set_draggable(id, true);
        self.drag = Some(ActiveDrag {
            route_id,
            waypoint: id,
            moved: false,
        });
        Ok(())
    }

    /// Follow the pointer with the armed waypoint.
    pub fn drag_to<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        surface: &mut S,
        position: LatLng,
    ) -> Result<()> {
        let drag = self
            .drag
            .as_ref()
            .ok_or(EditError::ModeInactive { mode: "Waypoint drag" })?;
        let (route_id, id) = (drag.route_id.clone(), drag.waypoint);
        self.move_waypoint_by_id(store, surface, &route_id, id, position)?;
        if let Some(drag) = self.drag.as_mut() {
            drag.moved = true;
        }
        Ok(())
    }

    /// Drop the armed waypoint at `position` and re-optimize its route.
    pub fn end_drag<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        surface: &mut S,
        position: LatLng,
    ) -> Result<FeatureId> {
        let position = position.checked()?;
        let drag = self
            .drag
            .take()
            .ok_or(EditError::ModeInactive { mode: "Waypoint drag" })?;
        let id = drag.waypoint;
        self.finish_drag(store, surface, drag, Some(position));
        Ok(id)
    }

    fn finish_drag<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        surface: &mut S,
        drag: ActiveDrag,
        position: Option<LatLng>,
    ) {
        let id = drag.waypoint;
        let target = position
            .or_else(|| surface.marker(id).and_then(|m| m.position()))
            .filter(LatLng::is_valid);
        let current = store.get(id).and_then(|f| f.position());

        let mut moved = drag.moved;
        if let Some(target) = target.filter(|t| Some(*t) != current) {
            if let Some(feature) = store.get_mut(id) {
                moved |= feature.set_position(target);
                surface.move_marker(id, target);
            }
        }

        surface.set_draggable(id, false);
        if moved {
            self.reoptimize(store, surface, &drag.route_id);
        }
    }

    /// Remove a waypoint by identity, then re-optimize the rest.
    pub fn delete_waypoint<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        surface: &mut S,
        route_id: &str,
        id: FeatureId,
    ) -> Result<()> {
        let feature = store.get(id).ok_or_unknown_feature(id)?;
        if !feature.is_waypoint_of(route_id) {
            return Err(EditError::NotAWaypoint {
                id,
                route_id: route_id.to_string(),
            });
        }

        if self.dragging() == Some(id) {
            self.drag = None;
        }
        store.remove(id);
        surface.remove_marker(id);
        debug!("[route_editor] Deleted waypoint {} from {}", id, route_id);

        self.reoptimize(store, surface, route_id);
        Ok(())
    }

    /// Remove the first waypoint (in document order) whose coordinates match
    /// `position` within `epsilon` degrees on both axes.
    pub fn delete_waypoint_at<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        surface: &mut S,
        route_id: &str,
        position: LatLng,
        epsilon: f64,
    ) -> Result<FeatureId> {
        let id = store
            .iter()
            .filter(|f| f.is_waypoint_of(route_id))
            .find(|f| {
                f.position()
                    .is_some_and(|p| same_position(&p, &position, epsilon))
            })
            .map(|f| f.id())
            .ok_or_else(|| EditError::WaypointNotFound {
                route_id: route_id.to_string(),
            })?;
        self.delete_waypoint(store, surface, route_id, id)?;
        Ok(id)
    }

    /// Renumber a route by proximity and redraw it.
    pub fn optimize<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        surface: &mut S,
        route_id: &str,
    ) -> Result<usize> {
        let count = optimize_route(store, route_id)?;
        self.refresh_line(store, surface, route_id);
        Ok(count)
    }

    fn reoptimize<S: MapSurface>(&mut self, store: &mut FeatureStore, surface: &mut S, route_id: &str) {
        if let Err(e) = optimize_route(store, route_id) {
            debug!("[route_editor] Skipped re-optimization: {}", e);
        }
        self.refresh_line(store, surface, route_id);
    }

    /// Remove every waypoint of a route and drop it from the registry.
    /// Returns the number of waypoints removed.
    pub fn delete_route<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        registry: &mut RouteRegistry,
        surface: &mut S,
        route_id: &str,
    ) -> usize {
        self.exit_mode(store, surface);
        if self.selected.as_deref() == Some(route_id) {
            self.reset_highlight(store, surface);
        }

        let ids: Vec<FeatureId> = store
            .iter()
            .filter(|f| f.is_waypoint_of(route_id))
            .map(|f| f.id())
            .collect();
        for id in &ids {
            surface.remove_marker(*id);
        }
        let removed = store.remove_where(|f| f.is_waypoint_of(route_id));
        registry.remove(route_id);

        info!("[route_editor] Cleared route {} ({} waypoints)", route_id, removed);
        removed
    }

    // ========================================================================
    // Input dispatch
    // ========================================================================

    /// A click on empty map. Adds a waypoint in add/move mode; ignored
    /// otherwise.
    pub fn handle_map_click<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        surface: &mut S,
        position: LatLng,
    ) -> Result<Option<FeatureId>> {
        match self.mode.clone() {
            RouteEditMode::AddMove(route_id) => self
                .add_waypoint(store, surface, &route_id, position)
                .map(Some),
            _ => Ok(None),
        }
    }

    /// A click on a waypoint marker. Arms it for dragging in add/move mode and
    /// deletes it in delete mode.
    pub fn handle_waypoint_click<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        surface: &mut S,
        id: FeatureId,
    ) -> Result<()> {
        match self.mode.clone() {
            RouteEditMode::Idle => Ok(()),
            RouteEditMode::AddMove(_) => self.begin_drag(store, surface, id),
            RouteEditMode::Delete(route_id) => self.delete_waypoint(store, surface, &route_id, id),
        }
    }
}

fn paint_route<S: MapSurface>(
    store: &FeatureStore,
    surface: &mut S,
    route_id: &str,
    endpoint_color: &'static str,
    waypoint_color: &'static str,
) {
    if let Some(route) = Route::parse(route_id) {
        for point_id in [&route.start_id, &route.end_id] {
            if let Some(point) = store.gps_point(point_id) {
                surface.highlight(point.id(), endpoint_color);
            }
        }
    }
    for id in waypoint_ids(store, route_id) {
        surface.highlight(id, waypoint_color);
    }
}

/// True when the route has a waypoint or at least one endpoint on the map.
fn route_resolves(store: &FeatureStore, route_id: &str) -> bool {
    let Some(route) = Route::parse(route_id) else {
        return false;
    };
    store.iter().any(|f| f.is_waypoint_of(route_id))
        || store.gps_point(&route.start_id).is_some()
        || store.gps_point(&route.end_id).is_some()
}
