//! Spot registry.
//!
//! A spot is a Point feature typed `spot` or any Polygon/MultiPolygon, as long
//! as it carries a non-empty `properties.name`. Unnamed spots stay in the
//! document but are not listed.

use std::collections::HashSet;

use serde::Serialize;

use crate::feature::FeatureId;
use crate::store::FeatureStore;

/// A listed spot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Spot {
    pub name: String,
    pub feature: FeatureId,
}

/// Collect named spots in document order.
pub fn extract_spots(store: &FeatureStore) -> Vec<Spot> {
    store
        .iter()
        .filter(|f| f.is_spot())
        .filter_map(|f| {
            let name = f.name().filter(|n| !n.is_empty())?;
            Some(Spot {
                name: name.to_string(),
                feature: f.id(),
            })
        })
        .collect()
}

/// Ordered list of spots backing the spot picker.
#[derive(Debug, Clone, Default)]
pub struct SpotRegistry {
    spots: Vec<Spot>,
}

impl SpotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_store(store: &FeatureStore) -> Self {
        Self {
            spots: extract_spots(store),
        }
    }

    pub fn rebuild(&mut self, store: &FeatureStore) {
        self.spots = extract_spots(store);
    }

    pub fn clear(&mut self) {
        self.spots.clear();
    }

    pub fn spots(&self) -> &[Spot] {
        &self.spots
    }

    pub fn len(&self) -> usize {
        self.spots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }

    /// Spot at a picker index.
    pub fn get(&self, index: usize) -> Option<&Spot> {
        self.spots.get(index)
    }

    pub fn index_of(&self, id: FeatureId) -> Option<usize> {
        self.spots.iter().position(|s| s.feature == id)
    }

    pub(crate) fn push(&mut self, spot: Spot) -> usize {
        self.spots.push(spot);
        self.spots.len() - 1
    }

    pub(crate) fn remove(&mut self, id: FeatureId) -> Option<Spot> {
        let index = self.index_of(id)?;
        Some(self.spots.remove(index))
    }

    /// Update the display name of a listed spot. Its index does not change.
    pub(crate) fn rename(&mut self, id: FeatureId, name: &str) -> bool {
        match self.spots.iter_mut().find(|s| s.feature == id) {
            Some(spot) => {
                spot.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// `{prefix}{n}` with the smallest `n >= 1` not used by a listed spot.
    pub fn next_placeholder_name(&self, prefix: &str) -> String {
        let used: HashSet<&str> = self.spots.iter().map(|s| s.name.as_str()).collect();
        (1..)
            .map(|n| format!("{}{}", prefix, n))
            .find(|name| !used.contains(name.as_str()))
            .unwrap_or_else(|| prefix.to_string())
    }
}
