//! Render-facing primitives.
//!
//! A `DisplayFeature` is what the map surface draws: either a feature's own
//! shape or a synthesized vertex/midpoint marker. It carries rendering
//! metadata that never leaks into the user-facing GeoJSON.

use crate::geojson::{Geometry, GeometryKind, Position, Properties};
use crate::id::FeatureId;
use crate::path::CoordPath;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Meta {
    Feature,
    Vertex,
    Midpoint,
}

impl Meta {
    pub fn as_str(self) -> &'static str {
        match self {
            Meta::Feature => "feature",
            Meta::Vertex => "vertex",
            Meta::Midpoint => "midpoint",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayProperties {
    pub meta: Meta,
    /// Owning feature id; set on `Meta::Feature` primitives only.
    pub id: Option<FeatureId>,
    /// Feature a vertex or midpoint marker belongs to.
    pub parent: Option<FeatureId>,
    pub meta_type: Option<GeometryKind>,
    pub active: bool,
    pub mode: Option<String>,
    pub coord_path: Option<CoordPath>,
    /// Midpoint location, kept so a click can insert the vertex exactly.
    pub lng_lat: Option<Position>,
    /// User properties, emitted under `user_<name>` keys.
    pub user: Properties,
}

impl DisplayProperties {
    pub fn new(meta: Meta) -> Self {
        Self {
            meta,
            id: None,
            parent: None,
            meta_type: None,
            active: false,
            mode: None,
            coord_path: None,
            lng_lat: None,
            user: Properties::new(),
        }
    }

    /// `id` for features, `parent` for markers.
    pub fn owner(&self) -> Option<FeatureId> {
        self.id.or(self.parent)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFeature {
    pub geometry: Geometry,
    pub properties: DisplayProperties,
}

impl DisplayFeature {
    pub fn new(geometry: Geometry, properties: DisplayProperties) -> Self {
        Self {
            geometry,
            properties,
        }
    }

    pub fn meta(&self) -> Meta {
        self.properties.meta
    }

    pub fn is_active(&self) -> bool {
        self.properties.active
    }
}

impl Serialize for DisplayProperties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("meta", self.meta.as_str())?;
        if let Some(id) = &self.id {
            map.serialize_entry("id", id)?;
        }
        if let Some(parent) = &self.parent {
            map.serialize_entry("parent", parent)?;
        }
        if let Some(kind) = self.meta_type {
            map.serialize_entry("meta:type", kind.name())?;
        }
        map.serialize_entry("active", if self.active { "true" } else { "false" })?;
        if let Some(mode) = &self.mode {
            map.serialize_entry("mode", mode)?;
        }
        if let Some(path) = &self.coord_path {
            map.serialize_entry("coord_path", path)?;
        }
        if let Some([lng, lat]) = self.lng_lat {
            map.serialize_entry("lng", &lng)?;
            map.serialize_entry("lat", &lat)?;
        }
        for (name, value) in &self.user {
            map.serialize_entry(&format!("user_{name}"), value)?;
        }
        map.end()
    }
}

impl Serialize for DisplayFeature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("type", "Feature")?;
        map.serialize_entry("properties", &self.properties)?;
        map.serialize_entry("geometry", &self.geometry)?;
        map.end()
    }
}

/// Serialize a bucket of primitives as a GeoJSON FeatureCollection.
pub fn to_collection(features: &[DisplayFeature]) -> Value {
    serde_json::json!({
        "type": "FeatureCollection",
        "features": features,
    })
}
