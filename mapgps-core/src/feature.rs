//! Typed view over GeoJSON features.
//!
//! Features keep their original GeoJSON representation so that export writes
//! back exactly what was loaded. What the editors need (the `properties.type`
//! discriminator, a stable identity) is attached beside the feature when it
//! enters the store.

use std::fmt;

use geojson::{Feature, Geometry, JsonObject, JsonValue, Value};
use serde::Serialize;

use crate::LatLng;

/// `properties.type` of a GPS control point.
pub const GPS_POINT_TAG: &str = "ポイントGPS";
/// `properties.type` of a route interior point.
pub const ROUTE_WAYPOINT_TAG: &str = "route_waypoint";
/// `properties.type` of a point of interest.
pub const SPOT_TAG: &str = "spot";

/// Stable identity of a stored feature.
///
/// Assigned in creation order by the store and never reused, so it stays valid
/// across re-sorting and renumbering of waypoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FeatureId(u64);

impl FeatureId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The `properties.type` discriminator, mapped once at load time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    GpsPoint,
    RouteWaypoint,
    Spot,
    /// No `type` property at all
    Generic,
    /// A `type` value this tool does not know about
    Unknown(String),
}

impl FeatureKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            GPS_POINT_TAG => FeatureKind::GpsPoint,
            ROUTE_WAYPOINT_TAG => FeatureKind::RouteWaypoint,
            SPOT_TAG => FeatureKind::Spot,
            other => FeatureKind::Unknown(other.to_string()),
        }
    }

    pub fn of(feature: &Feature) -> Self {
        match feature.property("type") {
            None | Some(JsonValue::Null) => FeatureKind::Generic,
            Some(JsonValue::String(tag)) => Self::from_tag(tag),
            Some(other) => FeatureKind::Unknown(other.to_string()),
        }
    }
}

/// Geometry type of a feature, `None` when the geometry is null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    GeometryCollection,
    None,
}

impl GeometryKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Point(_) => GeometryKind::Point,
            Value::MultiPoint(_) => GeometryKind::MultiPoint,
            Value::LineString(_) => GeometryKind::LineString,
            Value::MultiLineString(_) => GeometryKind::MultiLineString,
            Value::Polygon(_) => GeometryKind::Polygon,
            Value::MultiPolygon(_) => GeometryKind::MultiPolygon,
            Value::GeometryCollection(_) => GeometryKind::GeometryCollection,
        }
    }

    pub fn is_polygonal(self) -> bool {
        matches!(self, GeometryKind::Polygon | GeometryKind::MultiPolygon)
    }
}

/// A feature held by the store together with its identity and kind.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFeature {
    id: FeatureId,
    kind: FeatureKind,
    inner: Feature,
}

impl StoredFeature {
    pub(crate) fn new(id: FeatureId, inner: Feature) -> Self {
        Self {
            id,
            kind: FeatureKind::of(&inner),
            inner,
        }
    }

    pub fn id(&self) -> FeatureId {
        self.id
    }

    pub fn kind(&self) -> &FeatureKind {
        &self.kind
    }

    /// The untouched GeoJSON feature.
    pub fn feature(&self) -> &Feature {
        &self.inner
    }

    pub fn geometry_kind(&self) -> GeometryKind {
        self.inner
            .geometry
            .as_ref()
            .map(|g| GeometryKind::of(&g.value))
            .unwrap_or(GeometryKind::None)
    }

    pub fn is_point(&self) -> bool {
        self.geometry_kind() == GeometryKind::Point
    }

    /// Point spots and every polygon are spots.
    pub fn is_spot(&self) -> bool {
        let geometry = self.geometry_kind();
        (geometry == GeometryKind::Point && self.kind == FeatureKind::Spot)
            || geometry.is_polygonal()
    }

    pub fn is_waypoint_of(&self, route_id: &str) -> bool {
        self.kind == FeatureKind::RouteWaypoint && self.route_id() == Some(route_id)
    }

    pub fn str_property(&self, key: &str) -> Option<&str> {
        self.inner.property(key).and_then(JsonValue::as_str)
    }

    pub(crate) fn set_property(&mut self, key: &str, value: impl Into<JsonValue>) {
        self.inner.set_property(key, value);
    }

    /// `properties.id` of a GPS point. Integral numbers are accepted too.
    pub fn point_id(&self) -> Option<String> {
        match self.inner.property("id")? {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn route_id(&self) -> Option<&str> {
        self.str_property("route_id")
    }

    /// Numeric `waypoint_number`, read the way a lenient integer parse
    /// would: leading digits of a string or an integral JSON number.
    /// Anything else counts as 0.
    pub fn waypoint_number(&self) -> i64 {
        match self.inner.property("waypoint_number") {
            Some(JsonValue::String(s)) => parse_leading_int(s).unwrap_or(0),
            Some(JsonValue::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
                .unwrap_or(0),
            _ => 0,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.str_property("name")
    }

    pub fn category(&self) -> Option<&str> {
        self.str_property("category")
    }

    /// Position of a Point feature.
    pub fn position(&self) -> Option<LatLng> {
        match &self.inner.geometry.as_ref()?.value {
            Value::Point(coords) => LatLng::from_position(coords),
            _ => None,
        }
    }

    /// Rewrite the coordinates of a Point feature. Returns false for any other
    /// geometry, leaving it untouched.
    pub(crate) fn set_position(&mut self, position: LatLng) -> bool {
        match self.inner.geometry.as_mut().map(|g| &mut g.value) {
            Some(Value::Point(coords)) => {
                *coords = position.to_position();
                true
            }
            _ => false,
        }
    }

    /// All coordinate positions of the geometry, nested collections included.
    pub fn positions(&self) -> Vec<LatLng> {
        let mut out = Vec::new();
        if let Some(geometry) = &self.inner.geometry {
            collect_positions(&geometry.value, &mut out);
        }
        out
    }
}

fn collect_positions(value: &Value, out: &mut Vec<LatLng>) {
    match value {
        Value::Point(p) => out.extend(LatLng::from_position(p)),
        Value::MultiPoint(ps) | Value::LineString(ps) => {
            out.extend(ps.iter().filter_map(|p| LatLng::from_position(p)))
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => out.extend(
            lines
                .iter()
                .flatten()
                .filter_map(|p| LatLng::from_position(p)),
        ),
        Value::MultiPolygon(polygons) => out.extend(
            polygons
                .iter()
                .flatten()
                .flatten()
                .filter_map(|p| LatLng::from_position(p)),
        ),
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_positions(&g.value, out);
            }
        }
    }
}

/// Parse an optional sign followed by digits at the start of `s`, ignoring
/// leading whitespace and anything after the digits.
pub(crate) fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let value: i64 = rest[..digits].parse().ok()?;
    Some(if negative { -value } else { value })
}

fn point_feature(properties: JsonObject, position: LatLng) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(position.to_position()))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// New `route_waypoint` feature. The number is written as a string.
pub fn waypoint_feature(route_id: &str, waypoint_number: i64, position: LatLng) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("type".into(), ROUTE_WAYPOINT_TAG.into());
    properties.insert("route_id".into(), route_id.into());
    properties.insert("waypoint_number".into(), waypoint_number.to_string().into());
    point_feature(properties, position)
}

/// New Point `spot` feature.
pub fn spot_feature(name: &str, position: LatLng) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("type".into(), SPOT_TAG.into());
    properties.insert("name".into(), name.into());
    point_feature(properties, position)
}
