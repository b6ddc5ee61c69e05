//! # Editor Session
//!
//! Application shell that owns the document, the derived registries, both
//! editors and the map surface. Front ends translate their input events into
//! session calls and drain [`Notice`]s afterwards.
//!
//! After every successful edit the registries are rebuilt and the stats are
//! recomputed from scratch. Errors come back as `Err` and are also queued as
//! notices, except stale references which are only logged.

use geo::Rect;
use geojson::FeatureCollection;
use log::{info, warn};

use crate::config::EditorConfig;
use crate::error::{EditError, OptionExt, Result};
use crate::feature::FeatureId;
use crate::notice::Notice;
use crate::render::{draw_document, MapSurface};
use crate::route_editor::{RouteEditMode, RouteEditor};
use crate::routes::{waypoint_count, RouteOption, RouteRegistry};
use crate::spot_editor::{SpotDetails, SpotEditor};
use crate::spots::SpotRegistry;
use crate::stats::{compute_stats, MapStats};
use crate::store::FeatureStore;
use crate::LatLng;

/// Which panel is driving map input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    GeoJson,
    Route,
    Spot,
}

/// Disjoint borrows of the session handed to an edit.
struct Workspace<'a, S> {
    store: &'a mut FeatureStore,
    routes: &'a mut RouteRegistry,
    spots: &'a mut SpotRegistry,
    route_editor: &'a mut RouteEditor,
    spot_editor: &'a mut SpotEditor,
    surface: &'a mut S,
}

fn selected_route(editor: &RouteEditor) -> Result<String> {
    editor
        .selected_route()
        .map(str::to_string)
        .ok_or(EditError::NoRouteSelected)
}

fn mode_label(mode: &RouteEditMode) -> &'static str {
    match mode {
        RouteEditMode::AddMove(_) => "Add/move",
        RouteEditMode::Delete(_) => "Delete",
        RouteEditMode::Idle => "Idle",
    }
}

pub struct EditorSession<S: MapSurface> {
    surface: S,
    config: EditorConfig,
    store: Option<FeatureStore>,
    routes: RouteRegistry,
    spots: SpotRegistry,
    route_editor: RouteEditor,
    spot_editor: SpotEditor,
    mode: EditMode,
    stats: MapStats,
    notices: Vec<Notice>,
}

impl<S: MapSurface> EditorSession<S> {
    pub fn new(surface: S, config: EditorConfig) -> Self {
        let spot_editor = SpotEditor::new(&config);
        Self {
            surface,
            config,
            store: None,
            routes: RouteRegistry::new(),
            spots: SpotRegistry::new(),
            route_editor: RouteEditor::new(),
            spot_editor,
            mode: EditMode::default(),
            stats: MapStats::default(),
            notices: Vec::new(),
        }
    }

    // ========================================================================
    // Document lifecycle
    // ========================================================================

    /// Replace the document with a parsed collection.
    pub fn load(&mut self, collection: FeatureCollection) {
        self.install(FeatureStore::from_collection(collection));
    }

    /// Parse and load GeoJSON text. On failure the current document is kept.
    pub fn load_str(&mut self, text: &str) -> Result<()> {
        let parsed = FeatureStore::parse(text);
        let store = self.report(parsed)?;
        self.install(store);
        Ok(())
    }

    fn install(&mut self, store: FeatureStore) {
        self.route_editor.reset();
        self.spot_editor.reset();
        draw_document(&mut self.surface, &store);
        self.routes.rebuild(&store);
        self.spots.rebuild(&store);
        self.stats = compute_stats(Some(&store));
        info!(
            "[session] Loaded {} features: {} points, {} routes, {} spots",
            store.len(),
            self.stats.point_count,
            self.stats.route_count,
            self.stats.spot_count
        );
        self.store = Some(store);
        self.notify(Notice::success("GeoJSON file loaded"));
    }

    /// The document pretty-printed for export.
    pub fn export_json(&mut self) -> Result<String> {
        let result = self
            .store
            .as_ref()
            .ok_or_nothing_loaded()
            .and_then(FeatureStore::to_json_pretty);
        let text = self.report(result)?;
        info!("[session] Exported {} bytes", text.len());
        self.notify(Notice::success("GeoJSON file exported"));
        Ok(text)
    }

    pub fn store(&self) -> Option<&FeatureStore> {
        self.store.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.store.is_some()
    }

    /// Latest counts.
    pub fn stats(&self) -> MapStats {
        self.stats
    }

    /// Extent of the document, for fitting the view.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.store.as_ref()?.bounds()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Take the queued notices, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn report<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!("[session] {}", e);
            if !e.is_referential() {
                self.notices.push(e.to_notice());
            }
        }
        result
    }

    /// Run a mutation against the loaded document, then rebuild derived state.
    fn edit<T, F>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(Workspace<'_, S>) -> Result<T>,
    {
        let result = self.store.as_mut().ok_or_nothing_loaded().and_then(|store| {
            op(Workspace {
                store,
                routes: &mut self.routes,
                spots: &mut self.spots,
                route_editor: &mut self.route_editor,
                spot_editor: &mut self.spot_editor,
                surface: &mut self.surface,
            })
        });
        if result.is_ok() {
            self.refresh();
        }
        self.report(result)
    }

    fn refresh(&mut self) {
        if let Some(store) = &self.store {
            self.routes.rebuild(store);
            self.spots.rebuild(store);
        }
        self.stats = compute_stats(self.store.as_ref());
    }

    // ========================================================================
    // Modes
    // ========================================================================

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// Switch panels. Leaving spot editing drops the spot selection; leaving
    /// route editing ends any route edit mode but keeps the selection.
    pub fn set_mode(&mut self, mode: EditMode) {
        if mode == self.mode {
            return;
        }
        if let Some(store) = self.store.as_mut() {
            if self.mode == EditMode::Spot {
                self.spot_editor.clear(store, &mut self.surface);
            }
            if self.mode == EditMode::Route {
                self.route_editor.exit_mode(store, &mut self.surface);
            }
        }
        self.mode = mode;
        self.refresh();
    }

    /// Route a click on empty map to the active panel.
    pub fn click_map(&mut self, position: LatLng) -> Result<Option<FeatureId>> {
        let mode = self.mode;
        let added = self.edit(|ws| match mode {
            EditMode::Route => ws
                .route_editor
                .handle_map_click(ws.store, ws.surface, position),
            EditMode::Spot => ws
                .spot_editor
                .handle_map_click(ws.store, ws.spots, ws.surface, position),
            EditMode::GeoJson => Ok(None),
        })?;
        if added.is_some() {
            let text = match mode {
                EditMode::Spot => "Spot added",
                _ => "Waypoint added",
            };
            self.notify(Notice::success(text));
        }
        Ok(added)
    }

    // ========================================================================
    // Routes
    // ========================================================================

    pub fn routes(&self) -> &RouteRegistry {
        &self.routes
    }

    pub fn selected_route(&self) -> Option<&str> {
        self.route_editor.selected_route()
    }

    pub fn route_mode(&self) -> &RouteEditMode {
        self.route_editor.mode()
    }

    /// Picker entries narrowed by first character and endpoint id.
    pub fn route_options(&self, prefix: Option<char>, end_id: Option<&str>) -> Vec<RouteOption> {
        match &self.store {
            Some(store) => self.routes.options(store, prefix, end_id),
            None => Vec::new(),
        }
    }

    pub fn route_waypoint_count(&self, route_id: &str) -> usize {
        self.store
            .as_ref()
            .map_or(0, |store| waypoint_count(store, route_id))
    }

    /// Select and highlight a route. Ignored when nothing is loaded.
    pub fn select_route(&mut self, route_id: Option<&str>) {
        let Some(store) = self.store.as_mut() else {
            return;
        };
        if let Some(exited) = self.route_editor.select_route(store, &mut self.surface, route_id) {
            let text = format!("{} mode ended by route change", mode_label(&exited));
            self.notify(Notice::success(text));
        }
    }

    pub fn toggle_route_add_move(&mut self) -> Result<bool> {
        let active = self.edit(|ws| ws.route_editor.toggle_add_move(ws.store, ws.surface))?;
        self.notify(Notice::success(if active {
            "Click the map to add a waypoint. Click a waypoint to drag it."
        } else {
            "Add/move mode ended"
        }));
        Ok(active)
    }

    pub fn toggle_route_delete(&mut self) -> Result<bool> {
        let active = self.edit(|ws| ws.route_editor.toggle_delete(ws.store, ws.surface))?;
        self.notify(Notice::success(if active {
            "Click a waypoint to delete it"
        } else {
            "Delete mode ended"
        }));
        Ok(active)
    }

    /// Leave any route edit mode, committing a drag in progress.
    pub fn exit_route_mode(&mut self) {
        if let Some(store) = self.store.as_mut() {
            self.route_editor.exit_mode(store, &mut self.surface);
        }
        self.refresh();
    }

    /// A click on a waypoint marker, interpreted by the route edit mode.
    pub fn click_waypoint(&mut self, id: FeatureId) -> Result<()> {
        self.edit(|ws| ws.route_editor.handle_waypoint_click(ws.store, ws.surface, id))
    }

    pub fn drag_waypoint(&mut self, position: LatLng) -> Result<()> {
        self.edit(|ws| ws.route_editor.drag_to(ws.store, ws.surface, position))
    }

    pub fn end_waypoint_drag(&mut self, position: LatLng) -> Result<FeatureId> {
        self.edit(|ws| ws.route_editor.end_drag(ws.store, ws.surface, position))
    }

    /// Move the waypoint at a sorted position of a route.
    pub fn move_waypoint(
        &mut self,
        route_id: &str,
        index: usize,
        position: LatLng,
    ) -> Result<FeatureId> {
        self.edit(|ws| {
            ws.route_editor
                .move_waypoint(ws.store, ws.surface, route_id, index, position)
        })
    }

    /// Add a waypoint to the selected route outside of add/move mode.
    pub fn add_waypoint(&mut self, position: LatLng) -> Result<FeatureId> {
        let id = self.edit(|ws| {
            let route_id = selected_route(ws.route_editor)?;
            ws.route_editor
                .add_waypoint(ws.store, ws.surface, &route_id, position)
        })?;
        self.notify(Notice::success("Waypoint added"));
        Ok(id)
    }

    /// Delete a waypoint of the selected route.
    pub fn delete_waypoint(&mut self, id: FeatureId) -> Result<()> {
        self.edit(|ws| {
            let route_id = selected_route(ws.route_editor)?;
            ws.route_editor
                .delete_waypoint(ws.store, ws.surface, &route_id, id)
        })
    }

    /// Delete the selected route's waypoint at a marker position.
    pub fn delete_waypoint_at(&mut self, position: LatLng) -> Result<FeatureId> {
        let epsilon = self.config.match_epsilon_deg;
        self.edit(|ws| {
            let route_id = selected_route(ws.route_editor)?;
            ws.route_editor
                .delete_waypoint_at(ws.store, ws.surface, &route_id, position, epsilon)
        })
    }

    pub fn optimize_selected_route(&mut self) -> Result<usize> {
        let count = self.edit(|ws| {
            let route_id = selected_route(ws.route_editor)?;
            ws.route_editor.optimize(ws.store, ws.surface, &route_id)
        })?;
        self.notify(Notice::success(format!(
            "Route optimized ({} waypoints)",
            count
        )));
        Ok(count)
    }

    /// Remove every waypoint of the selected route.
    pub fn clear_route(&mut self) -> Result<usize> {
        let removed = self.edit(|ws| {
            let route_id = selected_route(ws.route_editor)?;
            Ok(ws
                .route_editor
                .delete_route(ws.store, ws.routes, ws.surface, &route_id))
        })?;
        self.notify(Notice::success("Route cleared"));
        Ok(removed)
    }

    // ========================================================================
    // Spots
    // ========================================================================

    pub fn spots(&self) -> &SpotRegistry {
        &self.spots
    }

    pub fn spot_categories(&self) -> &[String] {
        &self.config.spot_categories
    }

    pub fn selected_spot(&self) -> Option<FeatureId> {
        self.spot_editor.selected_spot()
    }

    pub fn selected_spot_details(&self) -> Option<SpotDetails> {
        self.spot_editor.details(self.store.as_ref()?)
    }

    /// Select a spot by picker index, or deselect.
    pub fn select_spot(&mut self, index: Option<usize>) -> Option<SpotDetails> {
        let store = self.store.as_ref()?;
        self.spot_editor
            .select_spot(store, &self.spots, &mut self.surface, index)
    }

    pub fn add_spot(&mut self, position: LatLng) -> Result<FeatureId> {
        let id = self.edit(|ws| {
            ws.spot_editor
                .add_spot(ws.store, ws.spots, ws.surface, position)
        })?;
        self.notify(Notice::success("Spot added"));
        Ok(id)
    }

    pub fn rename_spot(&mut self, new_name: &str) -> Result<String> {
        let name = self.edit(|ws| ws.spot_editor.rename_spot(ws.store, ws.spots, new_name))?;
        self.notify(Notice::success("Spot name updated"));
        Ok(name)
    }

    pub fn set_spot_category(&mut self, category: &str) -> Result<()> {
        self.edit(|ws| ws.spot_editor.set_category(ws.store, category))?;
        self.notify(Notice::success("Spot category updated"));
        Ok(())
    }

    pub fn delete_spot(&mut self) -> Result<String> {
        let name = self.edit(|ws| ws.spot_editor.delete_spot(ws.store, ws.spots, ws.surface))?;
        self.notify(Notice::success(format!("Spot '{}' deleted", name)));
        Ok(name)
    }

    pub fn toggle_spot_add_move(&mut self) -> Result<bool> {
        let active = self.edit(|ws| Ok(ws.spot_editor.toggle_add_move(ws.store, ws.surface)))?;
        let text = match (active, self.spot_editor.selected_spot()) {
            (true, Some(_)) => "Drag the spot to move it. Click the map to add a spot.",
            (true, None) => "Click the map to add a spot",
            (false, _) => "Add/move mode ended",
        };
        self.notify(Notice::success(text));
        Ok(active)
    }

    pub fn drag_spot(&mut self, position: LatLng) -> Result<FeatureId> {
        self.edit(|ws| ws.spot_editor.drag_spot(ws.store, ws.surface, position))
    }
}
