//! Hit queries: which primitives sit under a pointer or a box.
//!
//! The map answers the raw query; this module turns the answer into the
//! list modes consume: one entry per feature, points before lines before
//! polygons, and smaller polygons before larger ones.

use crate::surface::MapSurface;
use gd_core::{DisplayFeature, Geometry, GeometryKind, Position};
use kurbo::{BezPath, Line, Point, Rect, Shape};
use std::collections::HashSet;

/// WGS84 equatorial radius in metres.
const EARTH_RADIUS: f64 = 6_378_137.0;

/// Square query box of half-size `buffer` around a screen point.
pub fn click_box(point: Point, buffer: f64) -> Rect {
    Rect::new(
        point.x - buffer,
        point.y - buffer,
        point.x + buffer,
        point.y + buffer,
    )
}

/// Query `surface` and return de-duplicated, sorted primitives.
pub fn features_at(surface: &dyn MapSurface, bbox: Rect, layers: &[String]) -> Vec<DisplayFeature> {
    let mut seen = HashSet::new();
    let hits: Vec<DisplayFeature> = surface
        .query_rendered_features(bbox, layers)
        .into_iter()
        .filter(|f| match f.properties.id {
            Some(id) => seen.insert(id),
            None => true,
        })
        .collect();
    log::trace!("features_at {bbox:?}: {} hits", hits.len());
    sort_features(hits)
}

fn rank(kind: GeometryKind) -> u8 {
    match kind.base() {
        GeometryKind::Point => 0,
        GeometryKind::LineString => 1,
        _ => 2,
    }
}

/// Stable sort: points, then lines, then polygons by ascending area.
pub fn sort_features(features: Vec<DisplayFeature>) -> Vec<DisplayFeature> {
    let mut keyed: Vec<(u8, f64, DisplayFeature)> = features
        .into_iter()
        .map(|f| {
            let kind = f.geometry.kind();
            (rank(kind), geodesic_area(&f.geometry), f)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
    keyed.into_iter().map(|(_, _, f)| f).collect()
}

// ─── Area ────────────────────────────────────────────────────────────────

/// Approximate geodesic area in square metres; zero for non-areal kinds.
pub fn geodesic_area(geometry: &Geometry) -> f64 {
    match geometry {
        Geometry::Polygon(rings) => polygon_area(rings),
        Geometry::MultiPolygon(polys) => polys.iter().map(|p| polygon_area(p)).sum(),
        _ => 0.0,
    }
}

fn polygon_area(rings: &[Vec<Position>]) -> f64 {
    let Some((outer, holes)) = rings.split_first() else {
        return 0.0;
    };
    holes
        .iter()
        .fold(ring_area(outer).abs(), |area, hole| area - ring_area(hole).abs())
}

fn ring_area(ring: &[Position]) -> f64 {
    let n = ring.len();
    if n <= 2 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let p1 = ring[i];
        let p2 = ring[(i + 1) % n];
        let p3 = ring[(i + 2) % n];
        area += (p3[0].to_radians() - p1[0].to_radians()) * p2[1].to_radians().sin();
    }
    area * EARTH_RADIUS * EARTH_RADIUS / 2.0
}

// ─── Intersection ────────────────────────────────────────────────────────

/// Whether a geometry (in the same space as `rect`) touches the rectangle.
pub fn intersects(geometry: &Geometry, rect: Rect) -> bool {
    match geometry {
        Geometry::Point(p) => p.is_some_and(|p| contains(rect, p)),
        Geometry::MultiPoint(points) => points.iter().any(|p| contains(rect, *p)),
        Geometry::LineString(line) => line_hits(line, rect),
        Geometry::MultiLineString(lines) => lines.iter().any(|l| line_hits(l, rect)),
        Geometry::Polygon(rings) => polygon_hits(rings, rect),
        Geometry::MultiPolygon(polys) => polys.iter().any(|p| polygon_hits(p, rect)),
    }
}

fn contains(rect: Rect, [x, y]: Position) -> bool {
    x >= rect.x0 && x <= rect.x1 && y >= rect.y0 && y <= rect.y1
}

fn edges(rect: Rect) -> [Line; 4] {
    let (a, b) = (Point::new(rect.x0, rect.y0), Point::new(rect.x1, rect.y0));
    let (c, d) = (Point::new(rect.x1, rect.y1), Point::new(rect.x0, rect.y1));
    [Line::new(a, b), Line::new(b, c), Line::new(c, d), Line::new(d, a)]
}

fn line_hits(line: &[Position], rect: Rect) -> bool {
    if line.iter().any(|p| contains(rect, *p)) {
        return true;
    }
    let sides = edges(rect);
    line.windows(2).any(|w| {
        let seg = Line::new(Point::new(w[0][0], w[0][1]), Point::new(w[1][0], w[1][1]));
        sides.iter().any(|side| segments_cross(seg, *side))
    })
}

/// Closed-segment intersection by orientation tests.
fn segments_cross(a: Line, b: Line) -> bool {
    let orient = |p: Point, q: Point, r: Point| (q - p).cross(r - p);
    let on_segment = |p: Point, q: Point, r: Point| {
        r.x >= p.x.min(q.x) && r.x <= p.x.max(q.x) && r.y >= p.y.min(q.y) && r.y <= p.y.max(q.y)
    };
    let d1 = orient(b.p0, b.p1, a.p0);
    let d2 = orient(b.p0, b.p1, a.p1);
    let d3 = orient(a.p0, a.p1, b.p0);
    let d4 = orient(a.p0, a.p1, b.p1);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(b.p0, b.p1, a.p0))
        || (d2 == 0.0 && on_segment(b.p0, b.p1, a.p1))
        || (d3 == 0.0 && on_segment(a.p0, a.p1, b.p0))
        || (d4 == 0.0 && on_segment(a.p0, a.p1, b.p1))
}

fn polygon_hits(rings: &[Vec<Position>], rect: Rect) -> bool {
    if rings.iter().any(|ring| line_hits(ring, rect)) {
        return true;
    }
    // Box entirely inside the outer ring (and not inside a hole).
    let center = rect.center();
    let inside = |ring: &Vec<Position>| ring_path(ring).contains(center);
    match rings.split_first() {
        Some((outer, holes)) => inside(outer) && !holes.iter().any(inside),
        None => false,
    }
}

fn ring_path(ring: &[Position]) -> BezPath {
    let mut path = BezPath::new();
    for (i, [x, y]) in ring.iter().enumerate() {
        if i == 0 {
            path.move_to((*x, *y));
        } else {
            path.line_to((*x, *y));
        }
    }
    path.close_path();
    path
}
