pub mod display;
pub mod error;
pub mod event;
pub mod feature;
pub mod geojson;
pub mod id;
pub mod path;

pub use display::{DisplayFeature, DisplayProperties, Meta};
pub use error::DrawError;
pub use event::{Actions, DrawEvent, UpdateAction};
pub use feature::Feature;
pub use geojson::{
    FeatureCollection, GeoJsonFeature, Geometry, GeometryKind, Position, Properties,
    collect_multi, normalize, parse_collection,
};
pub use id::FeatureId;
pub use path::CoordPath;
