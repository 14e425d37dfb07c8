//! Vertex and midpoint markers synthesized around an active feature.

use crate::{LAT_RENDERED_MAX, LAT_RENDERED_MIN};
use gd_core::{CoordPath, DisplayFeature, DisplayProperties, FeatureId, Geometry, Meta, Position};

#[derive(Debug, Clone, Copy, Default)]
pub struct SupplementaryOptions<'a> {
    /// Emit a midpoint marker between consecutive vertices.
    pub midpoints: bool,
    /// Vertex paths rendered as active.
    pub selected_paths: &'a [CoordPath],
}

pub fn create_vertex(
    parent: FeatureId,
    position: Position,
    path: CoordPath,
    selected: bool,
) -> DisplayFeature {
    let mut props = DisplayProperties::new(Meta::Vertex);
    props.parent = Some(parent);
    props.coord_path = Some(path);
    props.active = selected;
    DisplayFeature::new(Geometry::Point(Some(position)), props)
}

/// Midpoint between two vertex markers, addressed by the end vertex's path
/// so inserting there lands between them. `None` when either end lies
/// outside the renderable latitude band.
pub fn create_midpoint(
    parent: FeatureId,
    start: &DisplayFeature,
    end: &DisplayFeature,
) -> Option<DisplayFeature> {
    let (Geometry::Point(Some(a)), Geometry::Point(Some(b))) = (&start.geometry, &end.geometry)
    else {
        return None;
    };
    let renderable = |lat: f64| (LAT_RENDERED_MIN..=LAT_RENDERED_MAX).contains(&lat);
    if !renderable(a[1]) || !renderable(b[1]) {
        return None;
    }
    let mid = [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0];
    let mut props = DisplayProperties::new(Meta::Midpoint);
    props.parent = Some(parent);
    props.lng_lat = Some(mid);
    props.coord_path = end.properties.coord_path.clone();
    Some(DisplayFeature::new(Geometry::Point(Some(mid)), props))
}

/// Vertex (and optionally midpoint) markers for every vertex of `feature`.
pub fn create_supplementary_points(
    feature: &DisplayFeature,
    options: SupplementaryOptions<'_>,
) -> Vec<DisplayFeature> {
    let Some(owner) = feature.properties.id else {
        return Vec::new();
    };
    let mut out = Vec::new();
    collect(owner, &feature.geometry, &options, CoordPath::root(), &mut out);
    out
}

fn collect(
    owner: FeatureId,
    geometry: &Geometry,
    options: &SupplementaryOptions<'_>,
    base: CoordPath,
    out: &mut Vec<DisplayFeature>,
) {
    match geometry {
        Geometry::Point(Some(p)) => {
            let selected = options.selected_paths.contains(&base);
            out.push(create_vertex(owner, *p, base, selected));
        }
        Geometry::Point(None) => {}
        Geometry::LineString(line) => process_line(owner, line, options, &base, out),
        Geometry::Polygon(rings) => {
            for (r, ring) in rings.iter().enumerate() {
                process_line(owner, ring, options, &base.child(r), out);
            }
        }
        Geometry::MultiPoint(points) => {
            for (i, p) in points.iter().enumerate() {
                collect(owner, &Geometry::Point(Some(*p)), options, base.child(i), out);
            }
        }
        Geometry::MultiLineString(lines) => {
            for (i, line) in lines.iter().enumerate() {
                process_line(owner, line, options, &base.child(i), out);
            }
        }
        Geometry::MultiPolygon(polys) => {
            for (i, rings) in polys.iter().enumerate() {
                let child = Geometry::Polygon(rings.clone());
                collect(owner, &child, options, base.child(i), out);
            }
        }
    }
}

fn process_line(
    owner: FeatureId,
    line: &[Position],
    options: &SupplementaryOptions<'_>,
    base: &CoordPath,
    out: &mut Vec<DisplayFeature>,
) {
    let mut last: Option<DisplayFeature> = None;
    for (i, p) in line.iter().enumerate() {
        let path = base.child(i);
        let selected = options.selected_paths.contains(&path);
        let vertex = create_vertex(owner, *p, path, selected);
        if options.midpoints
            && let Some(prev) = &last
            && let Some(mid) = create_midpoint(owner, prev, &vertex)
        {
            out.push(mid);
        }
        // The ring-closing repeat of the first vertex gets no marker.
        if i == 0 || line.first() != Some(p) {
            out.push(vertex.clone());
        }
        last = Some(vertex);
    }
}
