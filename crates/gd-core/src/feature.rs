//! Geometry feature model.
//!
//! Every geometry kind answers the same vertex-level questions through a
//! [`CoordPath`], so modes can read and mutate any vertex without knowing the
//! concrete shape. Multi-geometries hold child features of the bare kind and
//! forward path operations to `children[path.head]` with the tail.
//!
//! Polygons store rings *open*: the closing vertex is stripped on the way in
//! and re-added by [`Feature::get_coordinates`]. Path-addressed edits on an
//! invalid polygon are silently ignored.

use crate::display::{DisplayFeature, DisplayProperties, Meta};
use crate::error::DrawError;
use crate::geojson::{GeoJsonFeature, Geometry, GeometryKind, Position, Properties, collect_multi};
use crate::id::FeatureId;
use crate::path::CoordPath;

#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Point(Option<Position>),
    LineString(Vec<Position>),
    Polygon(Vec<Vec<Position>>),
    Multi {
        kind: GeometryKind,
        children: Vec<Feature>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    id: FeatureId,
    properties: Properties,
    shape: Shape,
    changed: bool,
}

impl Feature {
    /// Build a feature from GeoJSON-shaped coordinates. Closed polygon rings
    /// are opened when the polygon is valid.
    pub fn new(id: FeatureId, properties: Properties, geometry: Geometry) -> Self {
        Self {
            id,
            properties,
            shape: Shape::from_geometry(geometry, &[]),
            changed: false,
        }
    }

    /// Build from an ingested feature, generating an id when it has none.
    pub fn from_geojson(feature: GeoJsonFeature) -> Self {
        let id = feature.id.unwrap_or_else(FeatureId::generate);
        Self::new(id, feature.properties, feature.geometry)
    }

    pub fn id(&self) -> FeatureId {
        self.id
    }

    pub fn kind(&self) -> GeometryKind {
        match &self.shape {
            Shape::Point(_) => GeometryKind::Point,
            Shape::LineString(_) => GeometryKind::LineString,
            Shape::Polygon(_) => GeometryKind::Polygon,
            Shape::Multi { kind, .. } => *kind,
        }
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn set_properties(&mut self, properties: Properties) {
        if self.properties != properties {
            self.properties = properties;
            self.changed = true;
        }
    }

    pub fn set_property(&mut self, key: &str, value: serde_json::Value) {
        self.properties.insert(key.to_string(), value);
        self.changed = true;
    }

    /// Child features of a multi-geometry; empty for single geometries.
    pub fn children(&self) -> &[Feature] {
        match &self.shape {
            Shape::Multi { children, .. } => children,
            _ => &[],
        }
    }

    // ─── Change tracking ─────────────────────────────────────────────────

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Read and reset the changed flag.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    // ─── Whole-geometry access ───────────────────────────────────────────

    /// GeoJSON-ready copy of the coordinates. Polygon rings come back closed.
    pub fn get_coordinates(&self) -> Geometry {
        match &self.shape {
            Shape::Point(p) => Geometry::Point(*p),
            Shape::LineString(line) => Geometry::LineString(line.clone()),
            Shape::Polygon(rings) => Geometry::Polygon(close_rings(rings)),
            Shape::Multi { kind, children } => {
                collect_multi(*kind, children.iter().map(Feature::get_coordinates))
            }
        }
    }

    /// Replace the coordinates as-is. Polygon rings are taken to be open.
    pub fn set_coordinates(&mut self, geometry: Geometry) -> Result<(), DrawError> {
        self.check_kind(&geometry)?;
        self.shape = match geometry {
            Geometry::Point(p) => Shape::Point(p),
            Geometry::LineString(line) => Shape::LineString(line),
            Geometry::Polygon(rings) => Shape::Polygon(rings),
            multi => {
                let ids: Vec<FeatureId> = self.children().iter().map(Feature::id).collect();
                Shape::from_geometry(multi, &ids)
            }
        };
        self.changed = true;
        Ok(())
    }

    /// Replace the coordinates from GeoJSON input, where polygon rings are
    /// closed and the closing vertex is dropped.
    pub fn incoming_coords(&mut self, geometry: Geometry) -> Result<(), DrawError> {
        match geometry {
            Geometry::Polygon(mut rings) => {
                for ring in &mut rings {
                    ring.pop();
                }
                self.set_coordinates(Geometry::Polygon(rings))
            }
            other => self.set_coordinates(other),
        }
    }

    fn check_kind(&self, geometry: &Geometry) -> Result<(), DrawError> {
        if geometry.kind() == self.kind() {
            Ok(())
        } else {
            Err(DrawError::GeometryMismatch {
                expected: self.kind().name(),
                found: geometry.kind().name(),
            })
        }
    }

    // ─── Vertex access ───────────────────────────────────────────────────

    pub fn get_coordinate(&self, path: &CoordPath) -> Option<Position> {
        match &self.shape {
            Shape::Point(p) => *p,
            Shape::LineString(line) => line.get(path.get(0)?).copied(),
            Shape::Polygon(rings) => {
                if !self.is_valid() {
                    return None;
                }
                rings.get(path.get(0)?)?.get(path.get(1)?).copied()
            }
            Shape::Multi { children, .. } => {
                let (head, tail) = path.split_first()?;
                children.get(head)?.get_coordinate(&tail)
            }
        }
    }

    /// Set one vertex. A Point ignores `path`. Writing one past the end of a
    /// line or ring appends.
    pub fn update_coordinate(&mut self, path: &CoordPath, lng: f64, lat: f64) {
        let valid = self.is_valid();
        match &mut self.shape {
            Shape::Point(p) => {
                *p = Some([lng, lat]);
                self.changed = true;
            }
            Shape::LineString(line) => {
                if let Some(i) = path.get(0) {
                    self.changed |= write_at(line, i, [lng, lat]);
                }
            }
            Shape::Polygon(rings) => {
                if !valid {
                    log::trace!("vertex write on invalid polygon {} ignored", self.id);
                    return;
                }
                let (Some(r), Some(i)) = (path.get(0), path.get(1)) else {
                    return;
                };
                if r == rings.len() {
                    rings.push(Vec::new());
                }
                if let Some(ring) = rings.get_mut(r) {
                    self.changed |= write_at(ring, i, [lng, lat]);
                }
            }
            Shape::Multi { children, .. } => {
                if let Some(child) = child_for(children, path) {
                    child.0.update_coordinate(&child.1, lng, lat);
                    self.changed |= child.0.take_changed();
                }
            }
        }
    }

    /// Insert a vertex before `path`; an index past the end appends.
    pub fn add_coordinate(&mut self, path: &CoordPath, lng: f64, lat: f64) {
        let valid = self.is_valid();
        match &mut self.shape {
            Shape::Point(_) => {}
            Shape::LineString(line) => {
                if let Some(i) = path.get(0) {
                    line.insert(i.min(line.len()), [lng, lat]);
                    self.changed = true;
                }
            }
            Shape::Polygon(rings) => {
                if !valid {
                    return;
                }
                let (Some(r), Some(i)) = (path.get(0), path.get(1)) else {
                    return;
                };
                if let Some(ring) = rings.get_mut(r) {
                    ring.insert(i.min(ring.len()), [lng, lat]);
                    self.changed = true;
                }
            }
            Shape::Multi { children, .. } => {
                if let Some(child) = child_for(children, path) {
                    child.0.add_coordinate(&child.1, lng, lat);
                    self.changed |= child.0.take_changed();
                }
            }
        }
    }

    /// Remove a vertex. A polygon ring left with fewer than 3 vertices is
    /// dropped entirely.
    pub fn remove_coordinate(&mut self, path: &CoordPath) {
        let valid = self.is_valid();
        match &mut self.shape {
            Shape::Point(_) => {}
            Shape::LineString(line) => {
                if let Some(i) = path.get(0).filter(|i| *i < line.len()) {
                    line.remove(i);
                    self.changed = true;
                }
            }
            Shape::Polygon(rings) => {
                if !valid {
                    return;
                }
                let (Some(r), Some(i)) = (path.get(0), path.get(1)) else {
                    return;
                };
                let Some(ring) = rings.get_mut(r) else {
                    return;
                };
                if i < ring.len() {
                    ring.remove(i);
                }
                if ring.len() < 3 {
                    rings.remove(r);
                }
                self.changed = true;
            }
            Shape::Multi { children, .. } => {
                if let Some(child) = child_for(children, path) {
                    child.0.remove_coordinate(&child.1);
                    self.changed |= child.0.take_changed();
                }
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        match &self.shape {
            Shape::Point(p) => p.is_some_and(|[lng, lat]| lng.is_finite() && lat.is_finite()),
            Shape::LineString(line) => line.len() > 1,
            Shape::Polygon(rings) => polygon_is_valid(rings),
            Shape::Multi { children, .. } => children.iter().all(Feature::is_valid),
        }
    }

    // ─── Serialization ───────────────────────────────────────────────────

    /// Independent GeoJSON copy for API consumers.
    pub fn to_geojson(&self) -> GeoJsonFeature {
        GeoJsonFeature::new(self.get_coordinates())
            .with_id(self.id)
            .with_properties(self.properties.clone())
    }

    /// Metadata-augmented primitive for the render pipeline.
    pub fn internal(&self, mode: &str, user_properties: bool) -> DisplayFeature {
        let mut props = DisplayProperties::new(Meta::Feature);
        props.id = Some(self.id);
        props.meta_type = Some(self.kind());
        props.mode = Some(mode.to_string());
        if user_properties {
            props.user = self.properties.clone();
        }
        DisplayFeature::new(self.get_coordinates(), props)
    }
}

impl Shape {
    /// Children take their ids from `ids` by part index; parts past its end
    /// get fresh ones.
    fn from_geometry(geometry: Geometry, ids: &[FeatureId]) -> Shape {
        let spawn = |kind: GeometryKind, parts: Vec<Geometry>| Shape::Multi {
            kind,
            children: parts
                .into_iter()
                .enumerate()
                .map(|(i, g)| {
                    let id = ids.get(i).copied().unwrap_or_else(FeatureId::generate);
                    Feature::new(id, Properties::new(), g)
                })
                .collect(),
        };
        match geometry {
            Geometry::Point(p) => Shape::Point(p),
            Geometry::LineString(line) => Shape::LineString(line),
            Geometry::Polygon(mut rings) => {
                if polygon_is_valid(&rings) {
                    for ring in &mut rings {
                        ring.pop();
                    }
                }
                Shape::Polygon(rings)
            }
            Geometry::MultiPoint(points) => spawn(
                GeometryKind::MultiPoint,
                points.into_iter().map(|p| Geometry::Point(Some(p))).collect(),
            ),
            Geometry::MultiLineString(lines) => spawn(
                GeometryKind::MultiLineString,
                lines.into_iter().map(Geometry::LineString).collect(),
            ),
            Geometry::MultiPolygon(polys) => spawn(
                GeometryKind::MultiPolygon,
                polys.into_iter().map(Geometry::Polygon).collect(),
            ),
        }
    }
}

fn polygon_is_valid(rings: &[Vec<Position>]) -> bool {
    !rings.is_empty() && rings.iter().all(|ring| ring.len() > 2)
}

fn close_rings(rings: &[Vec<Position>]) -> Vec<Vec<Position>> {
    rings
        .iter()
        .map(|ring| {
            let mut closed = ring.clone();
            if let Some(first) = ring.first() {
                closed.push(*first);
            }
            closed
        })
        .collect()
}

/// Overwrite `items[i]`, or append when `i == len`. Returns whether it wrote.
fn write_at(items: &mut Vec<Position>, i: usize, value: Position) -> bool {
    match i.cmp(&items.len()) {
        std::cmp::Ordering::Less => {
            items[i] = value;
            true
        }
        std::cmp::Ordering::Equal => {
            items.push(value);
            true
        }
        std::cmp::Ordering::Greater => false,
    }
}

fn child_for<'a>(
    children: &'a mut [Feature],
    path: &CoordPath,
) -> Option<(&'a mut Feature, CoordPath)> {
    let (head, tail) = path.split_first()?;
    Some((children.get_mut(head)?, tail))
}
