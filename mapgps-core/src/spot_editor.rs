//! # Spot Editor
//!
//! Selection and the add/move mode for spots. Unlike routes there is no
//! delete mode: deleting acts on the current selection immediately.

use log::{debug, info};
use serde::Serialize;

use crate::config::EditorConfig;
use crate::error::{EditError, OptionExt, Result};
use crate::feature::{spot_feature, FeatureId};
use crate::render::{default_color, palette, MapSurface};
use crate::spots::{Spot, SpotRegistry};
use crate::store::FeatureStore;
use crate::LatLng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpotEditMode {
    #[default]
    Idle,
    AddMove,
}

/// Values for the name and category fields of the selected spot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpotDetails {
    pub name: String,
    pub category: Option<String>,
}

#[derive(Debug)]
pub struct SpotEditor {
    selected: Option<FeatureId>,
    mode: SpotEditMode,
    draggable: Option<FeatureId>,
    placeholder_prefix: String,
}

impl Default for SpotEditor {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl SpotEditor {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            selected: None,
            mode: SpotEditMode::Idle,
            draggable: None,
            placeholder_prefix: config.placeholder_prefix.clone(),
        }
    }

    pub fn selected_spot(&self) -> Option<FeatureId> {
        self.selected
    }

    /// Picker index of the selection.
    pub fn selected_index(&self, registry: &SpotRegistry) -> Option<usize> {
        registry.index_of(self.selected?)
    }

    pub fn mode(&self) -> SpotEditMode {
        self.mode
    }

    /// Name and category of the selected spot.
    pub fn details(&self, store: &FeatureStore) -> Option<SpotDetails> {
        let feature = store.get(self.selected?)?;
        Some(SpotDetails {
            name: feature.name().unwrap_or_default().to_string(),
            category: feature.category().map(str::to_string),
        })
    }

    /// Forget selection and mode without touching the surface.
    pub fn reset(&mut self) {
        self.selected = None;
        self.mode = SpotEditMode::Idle;
        self.draggable = None;
    }

    /// Select the spot at a picker index, or deselect with `None`.
    ///
    /// The previous highlight is restored first. In add/move mode dragging
    /// moves to the new selection. Out-of-range indices change nothing.
    pub fn select_spot<S: MapSurface>(
        &mut self,
        store: &FeatureStore,
        registry: &SpotRegistry,
        surface: &mut S,
        index: Option<usize>,
    ) -> Option<SpotDetails> {
        let Some(index) = index else {
            self.restore_highlight(store, surface);
            self.selected = None;
            return None;
        };
        let spot = registry.get(index)?;
        let id = spot.feature;

        if self.selected != Some(id) {
            self.restore_highlight(store, surface);
        }
        self.selected = Some(id);
        surface.highlight(id, palette::SPOT_SELECTED);

        if self.mode == SpotEditMode::AddMove {
            self.move_drag_handle(store, surface);
        }
        debug!("[spot_editor] Selected '{}'", spot.name);
        self.details(store)
    }

    fn restore_highlight<S: MapSurface>(&self, store: &FeatureStore, surface: &mut S) {
        if let Some(feature) = self.selected.and_then(|id| store.get(id)) {
            surface.highlight(feature.id(), default_color(feature));
        }
    }

    /// Make the selected Point spot the only draggable one.
    fn move_drag_handle<S: MapSurface>(&mut self, store: &FeatureStore, surface: &mut S) {
        let target = self
            .selected
            .filter(|id| store.get(*id).is_some_and(|f| f.is_point()));
        if let Some(previous) = self.draggable.filter(|p| Some(*p) != target) {
            surface.set_draggable(previous, false);
        }
        if let Some(id) = target {
            surface.set_draggable(id, true);
        }
        self.draggable = target;
    }

    /// Create a Point spot with the next free placeholder name and select it.
    pub fn add_spot<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        registry: &mut SpotRegistry,
        surface: &mut S,
        position: LatLng,
    ) -> Result<FeatureId> {
        let position = position.checked()?;
        let name = registry.next_placeholder_name(&self.placeholder_prefix);
        let id = store.insert(spot_feature(&name, position));
        if let Some(feature) = store.get(id) {
            surface.place_marker(feature, palette::SPOT);
        }
        let index = registry.push(Spot {
            name: name.clone(),
            feature: id,
        });
        debug!(
            "[spot_editor] Added '{}' at ({:.6}, {:.6})",
            name, position.lat, position.lng
        );

        self.select_spot(store, registry, surface, Some(index));
        Ok(id)
    }

    /// Rename the selected spot. The name is trimmed and must not be empty.
    pub fn rename_spot(
        &mut self,
        store: &mut FeatureStore,
        registry: &mut SpotRegistry,
        new_name: &str,
    ) -> Result<String> {
        let id = self.selected.ok_or(EditError::NoSpotSelected)?;
        let name = new_name.trim();
        if name.is_empty() {
            return Err(EditError::EmptyName);
        }
        store
            .get_mut(id)
            .ok_or_unknown_feature(id)?
            .set_property("name", name);
        registry.rename(id, name);
        Ok(name.to_string())
    }

    /// Set `properties.category` of the selected spot. Any value is accepted.
    pub fn set_category(&mut self, store: &mut FeatureStore, category: &str) -> Result<()> {
        let id = self.selected.ok_or(EditError::NoSpotSelected)?;
        store
            .get_mut(id)
            .ok_or_unknown_feature(id)?
            .set_property("category", category);
        Ok(())
    }

    /// Delete the selected spot, returning its name.
    pub fn delete_spot<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        registry: &mut SpotRegistry,
        surface: &mut S,
    ) -> Result<String> {
        let id = self.selected.ok_or(EditError::NoSpotSelected)?;
        self.exit_add_move(surface);

        let removed = store.remove(id).ok_or_unknown_feature(id)?;
        registry.remove(id);
        surface.remove_marker(id);
        self.selected = None;

        let name = removed.name().unwrap_or_default().to_string();
        info!("[spot_editor] Deleted spot '{}'", name);
        Ok(name)
    }

    /// Toggle add/move mode. Returns whether the mode is now active.
    pub fn toggle_add_move<S: MapSurface>(&mut self, store: &FeatureStore, surface: &mut S) -> bool {
        if self.exit_add_move(surface) {
            return false;
        }
        self.mode = SpotEditMode::AddMove;
        self.move_drag_handle(store, surface);
        true
    }

    /// Leave add/move mode. Returns false if it was not active.
    pub fn exit_add_move<S: MapSurface>(&mut self, surface: &mut S) -> bool {
        if self.mode != SpotEditMode::AddMove {
            return false;
        }
        self.mode = SpotEditMode::Idle;
        if let Some(id) = self.draggable.take() {
            surface.set_draggable(id, false);
        }
        true
    }

    /// Move the draggable spot.
    pub fn drag_spot<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        surface: &mut S,
        position: LatLng,
    ) -> Result<FeatureId> {
        let position = position.checked()?;
        if self.mode != SpotEditMode::AddMove {
            return Err(EditError::ModeInactive { mode: "Spot add/move" });
        }
        let id = self.draggable.ok_or(EditError::NoSpotSelected)?;
        let feature = store.get_mut(id).ok_or_unknown_feature(id)?;
        feature.set_position(position);
        surface.move_marker(id, position);
        Ok(id)
    }

    /// A click on empty map. Adds a spot in add/move mode.
    pub fn handle_map_click<S: MapSurface>(
        &mut self,
        store: &mut FeatureStore,
        registry: &mut SpotRegistry,
        surface: &mut S,
        position: LatLng,
    ) -> Result<Option<FeatureId>> {
        match self.mode {
            SpotEditMode::AddMove => self.add_spot(store, registry, surface, position).map(Some),
            SpotEditMode::Idle => Ok(None),
        }
    }

    /// Leave add/move mode and drop the selection, restoring its colour.
    pub fn clear<S: MapSurface>(&mut self, store: &FeatureStore, surface: &mut S) {
        self.exit_add_move(surface);
        self.restore_highlight(store, surface);
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{draw_document, HeadlessSurface};

    fn setup() -> (FeatureStore, SpotRegistry, HeadlessSurface) {
        let store = FeatureStore::parse(
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"type": "spot", "name": "仮1", "category": "展望台"},
                 "geometry": {"type": "Point", "coordinates": [135.0, 34.0]}},
                {"type": "Feature", "properties": {"type": "spot", "name": "Minoh falls"},
                 "geometry": {"type": "Point", "coordinates": [135.47, 34.85]}},
                {"type": "Feature", "properties": {"name": "park"},
                 "geometry": {"type": "Polygon", "coordinates": [[[135.0, 34.0], [135.1, 34.0], [135.1, 34.1], [135.0, 34.0]]]}}
            ]}"#,
        )
        .unwrap();
        let registry = SpotRegistry::from_store(&store);
        let mut surface = HeadlessSurface::new();
        draw_document(&mut surface, &store);
        (store, registry, surface)
    }

    #[test]
    fn test_select_restores_previous_highlight() {
        let (store, registry, mut surface) = setup();
        let mut editor = SpotEditor::default();

        let details = editor
            .select_spot(&store, &registry, &mut surface, Some(0))
            .unwrap();
        assert_eq!(details.name, "仮1");
        assert_eq!(details.category.as_deref(), Some("展望台"));
        let first = registry.get(0).unwrap().feature;
        assert_eq!(surface.marker_state(first).unwrap().color, palette::SPOT_SELECTED);

        editor.select_spot(&store, &registry, &mut surface, Some(2));
        let polygon = registry.get(2).unwrap().feature;
        assert_eq!(surface.marker_state(first).unwrap().color, palette::SPOT);
        assert_eq!(surface.marker_state(polygon).unwrap().color, palette::SPOT_SELECTED);

        assert_eq!(editor.select_spot(&store, &registry, &mut surface, None), None);
        assert_eq!(surface.marker_state(polygon).unwrap().color, palette::POLYGON);
        assert_eq!(editor.selected_spot(), None);
    }

    #[test]
    fn test_add_spot_selects_it() {
        let (mut store, mut registry, mut surface) = setup();
        let mut editor = SpotEditor::default();

        assert_eq!(
            editor.handle_map_click(&mut store, &mut registry, &mut surface, LatLng::new(34.5, 135.5)),
            Ok(None)
        );

        assert!(editor.toggle_add_move(&store, &mut surface));
        let id = editor
            .handle_map_click(&mut store, &mut registry, &mut surface, LatLng::new(34.5, 135.5))
            .unwrap()
            .unwrap();
        assert_eq!(store.get(id).unwrap().name(), Some("仮2"));
        assert_eq!(editor.selected_spot(), Some(id));
        assert_eq!(editor.selected_index(&registry), Some(3));
        // The new spot is the one that can be dragged
        assert_eq!(surface.draggable_markers(), vec![id]);
    }

    #[test]
    fn test_invalid_position_changes_nothing() {
        let (mut store, mut registry, mut surface) = setup();
        let mut editor = SpotEditor::default();
        let before = store.len();

        let nan = LatLng::new(f64::NAN, 135.0);
        assert!(matches!(
            editor.add_spot(&mut store, &mut registry, &mut surface, nan),
            Err(EditError::InvalidPosition { .. })
        ));
        assert_eq!(store.len(), before);
        assert_eq!(registry.len(), 3);
        assert_eq!(editor.selected_spot(), None);

        editor.select_spot(&store, &registry, &mut surface, Some(0));
        editor.toggle_add_move(&store, &mut surface);
        let id = editor.selected_spot().unwrap();
        assert!(editor
            .drag_spot(&mut store, &mut surface, LatLng::new(34.0, 200.0))
            .is_err());
        assert_eq!(store.get(id).unwrap().position(), Some(LatLng::new(34.0, 135.0)));
    }

    #[test]
    fn test_rename_and_category() {
        let (mut store, mut registry, mut surface) = setup();
        let mut editor = SpotEditor::default();
        assert_eq!(
            editor.rename_spot(&mut store, &mut registry, "x"),
            Err(EditError::NoSpotSelected)
        );

        editor.select_spot(&store, &registry, &mut surface, Some(1));
        assert_eq!(
            editor.rename_spot(&mut store, &mut registry, "   "),
            Err(EditError::EmptyName)
        );
        assert_eq!(
            editor.rename_spot(&mut store, &mut registry, "  箕面大滝 "),
            Ok("箕面大滝".to_string())
        );
        assert_eq!(registry.get(1).unwrap().name, "箕面大滝");
        assert_eq!(editor.selected_index(&registry), Some(1));

        editor.set_category(&mut store, "no such category").unwrap();
        assert_eq!(
            editor.details(&store).unwrap().category.as_deref(),
            Some("no such category")
        );
    }

    #[test]
    fn test_drag_only_in_add_move() {
        let (mut store, registry, mut surface) = setup();
        let mut editor = SpotEditor::default();
        editor.select_spot(&store, &registry, &mut surface, Some(0));
        let target = LatLng::new(34.2, 135.2);
        assert!(matches!(
            editor.drag_spot(&mut store, &mut surface, target),
            Err(EditError::ModeInactive { .. })
        ));

        editor.toggle_add_move(&store, &mut surface);
        let id = editor.drag_spot(&mut store, &mut surface, target).unwrap();
        assert_eq!(store.get(id).unwrap().position(), Some(target));

        // Polygons are never draggable
        editor.select_spot(&store, &registry, &mut surface, Some(2));
        assert!(surface.draggable_markers().is_empty());
        assert_eq!(
            editor.drag_spot(&mut store, &mut surface, target),
            Err(EditError::NoSpotSelected)
        );

        assert!(!editor.toggle_add_move(&store, &mut surface));
        assert_eq!(editor.mode(), SpotEditMode::Idle);
    }

    #[test]
    fn test_delete_spot_frees_placeholder() {
        let (mut store, mut registry, mut surface) = setup();
        let mut editor = SpotEditor::default();
        assert_eq!(
            editor.delete_spot(&mut store, &mut registry, &mut surface),
            Err(EditError::NoSpotSelected)
        );

        editor.select_spot(&store, &registry, &mut surface, Some(0));
        let id = editor.selected_spot().unwrap();
        assert_eq!(
            editor.delete_spot(&mut store, &mut registry, &mut surface),
            Ok("仮1".to_string())
        );
        assert!(!store.contains(id));
        assert!(surface.marker_state(id).is_none());
        assert_eq!(registry.len(), 2);
        assert_eq!(editor.selected_spot(), None);
        assert_eq!(registry.next_placeholder_name("仮"), "仮1");
    }
}
