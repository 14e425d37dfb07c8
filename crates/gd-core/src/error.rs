//! Error type shared by every GeoDraw crate.

use thiserror::Error;

/// Failures that indicate a caller bug: malformed geometry, unknown mode
/// names, or requests a mode cannot honour. Stale ids and edits on invalid
/// geometry are not errors; those are silently ignored.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DrawError {
    #[error("invalid geometry: null")]
    NullGeometry,

    #[error("invalid geometry type: {0}")]
    InvalidGeometryType(String),

    #[error("invalid FeatureCollection")]
    InvalidFeatureCollection,

    #[error("invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    #[error("{0} is not a valid mode")]
    UnknownMode(String),

    #[error("invalid event type: {0}")]
    InvalidEventType(String),

    #[error("direct_select mode doesn't handle point features")]
    DirectSelectPoint,

    #[error("a featureId of an existing feature is required to enter {0}")]
    MissingFeatureId(&'static str),

    #[error("invalid coordinate path: {0:?}")]
    InvalidCoordPath(String),

    #[error("geometry mismatch: expected {expected}, found {found}")]
    GeometryMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("`from` must match the first or last vertex of the line")]
    InvalidContinuation,
}

impl From<serde_json::Error> for DrawError {
    fn from(err: serde_json::Error) -> Self {
        DrawError::InvalidGeoJson(err.to_string())
    }
}
