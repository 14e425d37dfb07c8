//! GeoJSON input/output types and ingestion normalization.
//!
//! Positions are 2D `[lng, lat]`. Input positions may carry extra ordinates
//! (altitude and beyond); they are accepted and dropped. A Point with an
//! empty coordinate array (`[]`) is a placeholder that has not been placed
//! yet and maps to `None`.

use crate::error::DrawError;
use crate::id::FeatureId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use std::str::FromStr;

pub type Position = [f64; 2];

/// User-controlled feature properties, in insertion order.
pub type Properties = Map<String, Value>;

// ─── Geometry kinds ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

impl GeometryKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
            Self::MultiPoint => "MultiPoint",
            Self::MultiLineString => "MultiLineString",
            Self::MultiPolygon => "MultiPolygon",
        }
    }

    pub fn is_multi(self) -> bool {
        matches!(
            self,
            Self::MultiPoint | Self::MultiLineString | Self::MultiPolygon
        )
    }

    /// The single-part family this kind belongs to (`MultiPolygon` -> `Polygon`).
    pub fn base(self) -> GeometryKind {
        match self {
            Self::Point | Self::MultiPoint => Self::Point,
            Self::LineString | Self::MultiLineString => Self::LineString,
            Self::Polygon | Self::MultiPolygon => Self::Polygon,
        }
    }

    /// The multi-part kind for a family.
    pub fn multi(self) -> GeometryKind {
        match self.base() {
            Self::Point => Self::MultiPoint,
            Self::LineString => Self::MultiLineString,
            _ => Self::MultiPolygon,
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GeometryKind {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Point" => Ok(Self::Point),
            "LineString" => Ok(Self::LineString),
            "Polygon" => Ok(Self::Polygon),
            "MultiPoint" => Ok(Self::MultiPoint),
            "MultiLineString" => Ok(Self::MultiLineString),
            "MultiPolygon" => Ok(Self::MultiPolygon),
            other => Err(DrawError::InvalidGeometryType(other.to_string())),
        }
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(#[serde(with = "positions::point")] Option<Position>),
    LineString(#[serde(deserialize_with = "positions::line")] Vec<Position>),
    Polygon(#[serde(deserialize_with = "positions::rings")] Vec<Vec<Position>>),
    MultiPoint(#[serde(deserialize_with = "positions::line")] Vec<Position>),
    MultiLineString(#[serde(deserialize_with = "positions::rings")] Vec<Vec<Position>>),
    MultiPolygon(#[serde(deserialize_with = "positions::polygons")] Vec<Vec<Vec<Position>>>),
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Self::Point(_) => GeometryKind::Point,
            Self::LineString(_) => GeometryKind::LineString,
            Self::Polygon(_) => GeometryKind::Polygon,
            Self::MultiPoint(_) => GeometryKind::MultiPoint,
            Self::MultiLineString(_) => GeometryKind::MultiLineString,
            Self::MultiPolygon(_) => GeometryKind::MultiPolygon,
        }
    }

    /// Visit every position in document order.
    pub fn for_each_position(&self, mut f: impl FnMut(&Position)) {
        match self {
            Self::Point(p) => p.iter().for_each(f),
            Self::LineString(line) | Self::MultiPoint(line) => line.iter().for_each(f),
            Self::Polygon(rings) | Self::MultiLineString(rings) => {
                rings.iter().flatten().for_each(f)
            }
            Self::MultiPolygon(polys) => {
                for p in polys.iter().flatten().flatten() {
                    f(p);
                }
            }
        }
    }

    /// Copy of this geometry with every position passed through `f`.
    pub fn map_positions(&self, mut f: impl FnMut(Position) -> Position) -> Geometry {
        if let Self::Point(p) = self {
            return Self::Point(p.map(f));
        }
        let mut line = |l: &Vec<Position>| l.iter().map(|p| f(*p)).collect::<Vec<_>>();
        match self {
            Self::LineString(l) => Self::LineString(line(l)),
            Self::MultiPoint(l) => Self::MultiPoint(line(l)),
            Self::Polygon(r) => Self::Polygon(r.iter().map(&mut line).collect()),
            Self::MultiLineString(r) => Self::MultiLineString(r.iter().map(&mut line).collect()),
            Self::MultiPolygon(ps) => Self::MultiPolygon(
                ps.iter()
                    .map(|rings| rings.iter().map(&mut line).collect::<Vec<_>>())
                    .collect(),
            ),
            Self::Point(_) => self.clone(),
        }
    }
}

/// Assemble single-part geometries of one family into that family's
/// multi-part geometry. Parts from another family are skipped.
pub fn collect_multi(base: GeometryKind, parts: impl IntoIterator<Item = Geometry>) -> Geometry {
    let parts = parts.into_iter();
    match base.base() {
        GeometryKind::Point => Geometry::MultiPoint(
            parts
                .filter_map(|g| match g {
                    Geometry::Point(p) => p,
                    _ => None,
                })
                .collect(),
        ),
        GeometryKind::LineString => Geometry::MultiLineString(
            parts
                .filter_map(|g| match g {
                    Geometry::LineString(line) => Some(line),
                    _ => None,
                })
                .collect(),
        ),
        _ => Geometry::MultiPolygon(
            parts
                .filter_map(|g| match g {
                    Geometry::Polygon(rings) => Some(rings),
                    _ => None,
                })
                .collect(),
        ),
    }
}

mod positions {
    use super::Position;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    /// Two or more numbers, truncated to `[lng, lat]`.
    fn truncate<E: Error>(raw: &[f64]) -> Result<Position, E> {
        match raw {
            [lng, lat, ..] => Ok([*lng, *lat]),
            short => Err(E::invalid_length(short.len(), &"[lng, lat, ...]")),
        }
    }

    struct Lenient(Position);

    impl<'de> Deserialize<'de> for Lenient {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            let raw = Vec::<f64>::deserialize(d)?;
            truncate(&raw).map(Lenient)
        }
    }

    pub mod point {
        use super::super::Position;
        use super::truncate;
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        pub fn serialize<S: Serializer>(p: &Option<Position>, s: S) -> Result<S::Ok, S::Error> {
            match p {
                Some(p) => p.serialize(s),
                None => Vec::<f64>::new().serialize(s),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<Position>, D::Error> {
            let raw = Vec::<f64>::deserialize(d)?;
            if raw.is_empty() {
                return Ok(None);
            }
            truncate(&raw).map(Some)
        }
    }

    pub fn line<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Position>, D::Error> {
        let raw = Vec::<Lenient>::deserialize(d)?;
        Ok(raw.into_iter().map(|p| p.0).collect())
    }

    pub fn rings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<Position>>, D::Error> {
        let raw = Vec::<Vec<Lenient>>::deserialize(d)?;
        Ok(raw
            .into_iter()
            .map(|ring| ring.into_iter().map(|p| p.0).collect())
            .collect())
    }

    pub fn polygons<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Vec<Vec<Vec<Position>>>, D::Error> {
        let raw = Vec::<Vec<Vec<Lenient>>>::deserialize(d)?;
        Ok(raw
            .into_iter()
            .map(|rings| {
                rings
                    .into_iter()
                    .map(|ring| ring.into_iter().map(|p| p.0).collect())
                    .collect()
            })
            .collect())
    }
}

// ─── Features ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureTag {
    #[default]
    Feature,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionTag {
    #[default]
    FeatureCollection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(rename = "type", default)]
    pub tag: FeatureTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    #[serde(default)]
    pub properties: Properties,
    pub geometry: Geometry,
}

impl GeoJsonFeature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            tag: FeatureTag::Feature,
            id: None,
            properties: Properties::new(),
            geometry,
        }
    }

    pub fn with_id(mut self, id: impl Into<FeatureId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default)]
    pub tag: CollectionTag,
    pub features: Vec<GeoJsonFeature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<GeoJsonFeature>) -> Self {
        Self {
            tag: CollectionTag::FeatureCollection,
            features,
        }
    }
}

// ─── Normalization ───────────────────────────────────────────────────────

/// Normalize a Feature, FeatureCollection, or bare Geometry document into a
/// collection of validated features.
pub fn normalize(value: Value) -> Result<FeatureCollection, DrawError> {
    let kind = type_of(&value);
    let raw = match kind.as_deref() {
        Some("FeatureCollection") => match value.get("features") {
            Some(Value::Array(items)) => items.clone(),
            _ => return Err(DrawError::InvalidFeatureCollection),
        },
        Some("Feature") => vec![value],
        Some(other) => {
            other.parse::<GeometryKind>()?;
            vec![json!({ "type": "Feature", "properties": {}, "geometry": value })]
        }
        None => return Err(DrawError::InvalidGeoJson("missing \"type\"".into())),
    };
    let features = raw
        .into_iter()
        .map(parse_feature)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FeatureCollection::new(features))
}

/// Like [`normalize`] but only accepts a FeatureCollection document.
pub fn parse_collection(value: Value) -> Result<FeatureCollection, DrawError> {
    let is_collection = type_of(&value).as_deref() == Some("FeatureCollection")
        && value.get("features").is_some_and(Value::is_array);
    if !is_collection {
        return Err(DrawError::InvalidFeatureCollection);
    }
    normalize(value)
}

fn type_of(value: &Value) -> Option<String> {
    value.get("type").and_then(Value::as_str).map(str::to_owned)
}

fn parse_feature(mut value: Value) -> Result<GeoJsonFeature, DrawError> {
    let Some(obj) = value.as_object_mut() else {
        return Err(DrawError::InvalidGeoJson("feature is not an object".into()));
    };
    match obj.get("geometry") {
        None | Some(Value::Null) => return Err(DrawError::NullGeometry),
        Some(geometry) => {
            let name = geometry.get("type").and_then(Value::as_str).unwrap_or("");
            name.parse::<GeometryKind>()?;
        }
    }
    match obj.get("id") {
        Some(Value::Null) => {
            obj.remove("id");
        }
        Some(Value::Number(n)) => {
            let id = n.to_string();
            obj.insert("id".into(), Value::String(id));
        }
        _ => {}
    }
    if obj.get("properties").is_none_or(Value::is_null) {
        obj.insert("properties".into(), Value::Object(Map::new()));
    }
    Ok(serde_json::from_value(value)?)
}
