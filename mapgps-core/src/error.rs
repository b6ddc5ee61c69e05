//! Unified error handling for the editing core.
//!
//! Editing operations never panic on bad input. They return an [`EditError`]
//! before touching the document, and the session turns the error into a
//! user-facing notice whose level comes from [`EditError::severity`].

use std::fmt;

use crate::feature::FeatureId;
use crate::notice::{Notice, NoticeLevel};

/// Unified error type for editing operations.
#[derive(Debug, Clone, PartialEq)]
pub enum EditError {
    /// No document has been loaded yet
    NothingLoaded,
    /// An action needing a selected route was invoked without one
    NoRouteSelected,
    /// An action needing a selected spot was invoked without one
    NoSpotSelected,
    /// A route id does not follow `route_<start>_to_<end>`
    InvalidRouteId { route_id: String },
    /// The route's start or end GPS point is missing from the document
    MissingEndpoint { route_id: String, point_id: String },
    /// A feature id no longer refers to a stored feature
    UnknownFeature { id: FeatureId },
    /// No waypoint of the route matched the requested position or index
    WaypointNotFound { route_id: String },
    /// The feature exists but is not a waypoint of the given route
    NotAWaypoint { id: FeatureId, route_id: String },
    /// The action is only valid while the named edit mode is active
    ModeInactive { mode: &'static str },
    /// A rename was committed with an empty name
    EmptyName,
    /// Coordinates that are not finite or lie outside lat/lng ranges
    InvalidPosition { lat: f64, lng: f64 },
    /// Input text is not a GeoJSON FeatureCollection
    InvalidGeoJson { message: String },
    /// The document could not be serialized
    Serialization { message: String },
}

impl EditError {
    /// Severity used when the error is shown to the user.
    pub fn severity(&self) -> NoticeLevel {
        match self {
            EditError::MissingEndpoint { .. }
            | EditError::InvalidPosition { .. }
            | EditError::InvalidGeoJson { .. }
            | EditError::Serialization { .. } => NoticeLevel::Error,
            _ => NoticeLevel::Warning,
        }
    }

    /// Stale or mismatched references. These are dropped quietly instead of
    /// being shown to the user.
    pub fn is_referential(&self) -> bool {
        matches!(
            self,
            EditError::UnknownFeature { .. }
                | EditError::WaypointNotFound { .. }
                | EditError::NotAWaypoint { .. }
        )
    }

    pub fn to_notice(&self) -> Notice {
        match self.severity() {
            NoticeLevel::Error => Notice::error(self.to_string()),
            _ => Notice::warning(self.to_string()),
        }
    }
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::NothingLoaded => write!(f, "No GeoJSON document is loaded"),
            EditError::NoRouteSelected => write!(f, "Select a route first"),
            EditError::NoSpotSelected => write!(f, "Select a spot first"),
            EditError::InvalidRouteId { route_id } => {
                write!(f, "Route id '{}' is not of the form route_<start>_to_<end>", route_id)
            }
            EditError::MissingEndpoint { route_id, point_id } => {
                write!(
                    f,
                    "Route '{}' references missing GPS point '{}'",
                    route_id, point_id
                )
            }
            EditError::UnknownFeature { id } => write!(f, "Feature {} does not exist", id),
            EditError::WaypointNotFound { route_id } => {
                write!(f, "No matching waypoint on route '{}'", route_id)
            }
            EditError::NotAWaypoint { id, route_id } => {
                write!(f, "Feature {} is not a waypoint of route '{}'", id, route_id)
            }
            EditError::ModeInactive { mode } => write!(f, "{} mode is not active", mode),
            EditError::EmptyName => write!(f, "Spot name must not be empty"),
            EditError::InvalidPosition { lat, lng } => {
                write!(f, "Invalid position ({}, {})", lat, lng)
            }
            EditError::InvalidGeoJson { message } => {
                write!(f, "Failed to read GeoJSON: {}", message)
            }
            EditError::Serialization { message } => {
                write!(f, "Failed to serialize GeoJSON: {}", message)
            }
        }
    }
}

impl std::error::Error for EditError {}

/// Result type alias for editing operations.
pub type Result<T> = std::result::Result<T, EditError>;

/// Extension trait for converting Option to EditError.
pub trait OptionExt<T> {
    /// Convert Option to Result with an unknown-feature error.
    fn ok_or_unknown_feature(self, id: FeatureId) -> Result<T>;

    /// Convert Option to Result with a nothing-loaded error.
    fn ok_or_nothing_loaded(self) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_unknown_feature(self, id: FeatureId) -> Result<T> {
        self.ok_or(EditError::UnknownFeature { id })
    }

    fn ok_or_nothing_loaded(self) -> Result<T> {
        self.ok_or(EditError::NothingLoaded)
    }
}
