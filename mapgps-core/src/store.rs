//! # GeoData Store
//!
//! Owns the loaded FeatureCollection, the single mutable document of record.
//! Every feature gets a [`FeatureId`] when it enters the store; editors refer
//! to features by that id instead of by position or coordinates.
//!
//! Collection-level members (`bbox`, foreign members) are kept so that export
//! writes back what was read.

use std::str::FromStr;

use geo::Rect;
use geojson::{Bbox, Feature, FeatureCollection, GeoJson, JsonObject};

use crate::error::{EditError, Result};
use crate::feature::{FeatureId, FeatureKind, StoredFeature};
use crate::geo_utils::compute_bounds;

/// The loaded document.
#[derive(Debug, Clone, Default)]
pub struct FeatureStore {
    features: Vec<StoredFeature>,
    next_id: u64,
    bbox: Option<Bbox>,
    foreign_members: Option<JsonObject>,
}

impl FeatureStore {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a parsed collection.
    pub fn from_collection(collection: FeatureCollection) -> Self {
        let mut store = Self {
            features: Vec::with_capacity(collection.features.len()),
            next_id: 0,
            bbox: collection.bbox,
            foreign_members: collection.foreign_members,
        };
        for feature in collection.features {
            store.insert(feature);
        }
        store
    }

    /// Parse GeoJSON text. Anything other than a FeatureCollection is rejected.
    pub fn parse(text: &str) -> Result<Self> {
        let geojson = GeoJson::from_str(text).map_err(|e| EditError::InvalidGeoJson {
            message: e.to_string(),
        })?;
        match geojson {
            GeoJson::FeatureCollection(collection) => Ok(Self::from_collection(collection)),
            GeoJson::Feature(_) => Err(EditError::InvalidGeoJson {
                message: "expected a FeatureCollection, found a Feature".to_string(),
            }),
            GeoJson::Geometry(_) => Err(EditError::InvalidGeoJson {
                message: "expected a FeatureCollection, found a Geometry".to_string(),
            }),
        }
    }

    /// Rebuild the collection in document order.
    pub fn to_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: self.bbox.clone(),
            features: self.features.iter().map(|f| f.feature().clone()).collect(),
            foreign_members: self.foreign_members.clone(),
        }
    }

    /// Serialize with 2-space indentation.
    ///
    /// Coordinates are held as `f64`, so integer input such as `[135, 34]` is
    /// written back as `[135.0, 34.0]`. Property values are written as read.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_collection()).map_err(|e| EditError::Serialization {
            message: e.to_string(),
        })
    }

    // ========================================================================
    // Access
    // ========================================================================

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredFeature> {
        self.features.iter()
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: FeatureId) -> Option<&StoredFeature> {
        self.features.iter().find(|f| f.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: FeatureId) -> Option<&mut StoredFeature> {
        self.features.iter_mut().find(|f| f.id() == id)
    }

    fn index_of(&self, id: FeatureId) -> Option<usize> {
        self.features.iter().position(|f| f.id() == id)
    }

    /// First GPS point whose `properties.id` equals `point_id`.
    pub fn gps_point(&self, point_id: &str) -> Option<&StoredFeature> {
        self.features.iter().find(|f| {
            f.kind() == &FeatureKind::GpsPoint && f.point_id().as_deref() == Some(point_id)
        })
    }

    /// Bounding box of every coordinate in the document.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        let positions: Vec<_> = self.features.iter().flat_map(|f| f.positions()).collect();
        compute_bounds(&positions)
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Append a feature and return its new identity.
    pub(crate) fn insert(&mut self, feature: Feature) -> FeatureId {
        self.next_id += 1;
        let id = FeatureId::new(self.next_id);
        self.features.push(StoredFeature::new(id, feature));
        id
    }

    /// Remove a feature, returning it if it existed.
    pub(crate) fn remove(&mut self, id: FeatureId) -> Option<StoredFeature> {
        let index = self.index_of(id)?;
        Some(self.features.remove(index))
    }

    /// Remove every feature matching the predicate. Returns the number removed.
    pub(crate) fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&StoredFeature) -> bool,
    {
        let before = self.features.len();
        self.features.retain(|f| !predicate(f));
        before - self.features.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::spot_feature;
    use crate::LatLng;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "name": "sample",
        "features": [
            {"type": "Feature", "properties": {"type": "ポイントGPS", "id": "A"},
             "geometry": {"type": "Point", "coordinates": [135.0, 34.0]}},
            {"type": "Feature", "properties": {"type": "ポイントGPS", "id": "B"},
             "geometry": {"type": "Point", "coordinates": [135.01, 34.01]}}
        ]
    }"#;

    #[test]
    fn test_parse_assigns_ids_in_order() {
        let store = FeatureStore::parse(SAMPLE).unwrap();
        assert_eq!(store.len(), 2);
        let ids: Vec<_> = store.iter().map(|f| f.id().get()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(store.gps_point("B").is_some());
        assert!(store.gps_point("C").is_none());
    }

    #[test]
    fn test_parse_rejects_non_collections() {
        assert!(matches!(
            FeatureStore::parse("{not json"),
            Err(EditError::InvalidGeoJson { .. })
        ));
        let geometry = r#"{"type": "Point", "coordinates": [135.0, 34.0]}"#;
        assert!(matches!(
            FeatureStore::parse(geometry),
            Err(EditError::InvalidGeoJson { .. })
        ));
    }

    #[test]
    fn test_round_trip_keeps_foreign_members() {
        let store = FeatureStore::parse(SAMPLE).unwrap();
        let text = store.to_json_pretty().unwrap();
        assert!(text.contains("\n  \"type\": \"FeatureCollection\""));
        let reparsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(reparsed["name"], "sample");
        assert_eq!(reparsed["features"][1]["properties"]["id"], "B");
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut store = FeatureStore::new();
        let first = store.insert(spot_feature("仮1", LatLng::new(34.0, 135.0)));
        assert!(store.remove(first).is_some());
        let second = store.insert(spot_feature("仮1", LatLng::new(34.0, 135.0)));
        assert_ne!(first, second);
        assert!(store.remove(first).is_none());
    }

    #[test]
    fn test_bounds_cover_all_features() {
        let store = FeatureStore::parse(SAMPLE).unwrap();
        let rect = store.bounds().unwrap();
        assert_eq!(rect.min().x, 135.0);
        assert_eq!(rect.max().y, 34.01);
    }
}
