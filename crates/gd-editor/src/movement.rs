//! Dragging whole features and vertices.
//!
//! Every drag goes through a `MoveConstraint` that may shrink or wrap the
//! prospective delta before it is applied.

use gd_core::{FeatureId, Geometry};
use gd_render::{LAT_MAX, LAT_MIN, LAT_RENDERED_MAX, LAT_RENDERED_MIN};

use crate::store::Store;

const LNG_MIN: f64 = -270.0;
const LNG_MAX: f64 = 270.0;

/// A prospective move in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Delta {
    pub lng: f64,
    pub lat: f64,
}

impl Delta {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

/// Adjusts a drag delta for the geometries about to move.
pub trait MoveConstraint {
    fn constrain(&self, geometries: &[Geometry], delta: Delta) -> Delta;
}

/// Keeps dragged geometry on the renderable globe.
///
/// Latitude is clamped so the edge nearest the equator never leaves
/// ±85° and the far edge never leaves ±90°. Longitude deltas that would push
/// the extent past ±270° are wrapped by whole turns.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorldBounds;

impl MoveConstraint for WorldBounds {
    fn constrain(&self, geometries: &[Geometry], delta: Delta) -> Delta {
        let mut north_inner = LAT_MIN;
        let mut south_inner = LAT_MAX;
        let mut north_outer = LAT_MIN;
        let mut south_outer = LAT_MAX;
        let mut west = LNG_MAX;
        let mut east = LNG_MIN;

        for geometry in geometries {
            let Some([min_lng, min_lat, max_lng, max_lat]) = extent(geometry) else {
                continue;
            };
            north_inner = north_inner.max(min_lat);
            south_inner = south_inner.min(max_lat);
            north_outer = north_outer.max(max_lat);
            south_outer = south_outer.min(min_lat);
            west = west.min(min_lng);
            east = east.max(max_lng);
        }

        let mut out = delta;
        if north_inner + out.lat > LAT_RENDERED_MAX {
            out.lat = LAT_RENDERED_MAX - north_inner;
        }
        if north_outer + out.lat > LAT_MAX {
            out.lat = LAT_MAX - north_outer;
        }
        if south_inner + out.lat < LAT_RENDERED_MIN {
            out.lat = LAT_RENDERED_MIN - south_inner;
        }
        if south_outer + out.lat < LAT_MIN {
            out.lat = LAT_MIN - south_outer;
        }
        let turns = (out.lng.abs() / 360.0).ceil() * 360.0;
        if west + out.lng <= LNG_MIN {
            out.lng += turns;
        }
        if east + out.lng >= LNG_MAX {
            out.lng -= turns;
        }
        out
    }
}

/// `[min_lng, min_lat, max_lng, max_lat]`, or `None` for empty geometry.
fn extent(geometry: &Geometry) -> Option<[f64; 4]> {
    let mut bounds: Option<[f64; 4]> = None;
    geometry.for_each_position(|[lng, lat]| {
        let b = bounds.get_or_insert([*lng, *lat, *lng, *lat]);
        b[0] = b[0].min(*lng);
        b[1] = b[1].min(*lat);
        b[2] = b[2].max(*lng);
        b[3] = b[3].max(*lat);
    });
    bounds
}

/// Translate features by a constrained delta.
pub fn move_features(
    store: &mut Store,
    ids: &[FeatureId],
    delta: Delta,
    constraint: &dyn MoveConstraint,
) {
    let geometries: Vec<Geometry> = ids
        .iter()
        .filter_map(|id| store.get(*id))
        .map(|f| f.get_coordinates())
        .collect();
    let delta = constraint.constrain(&geometries, delta);
    for id in ids {
        store.edit(*id, |feature| {
            let moved = feature
                .get_coordinates()
                .map_positions(|[lng, lat]| [lng + delta.lng, lat + delta.lat]);
            if let Err(err) = feature.incoming_coords(moved) {
                log::warn!("move of {id} rejected: {err}");
            }
        });
    }
}
