pub mod api;
pub mod events;
pub mod input;
pub mod modes;
pub mod movement;
pub mod options;
pub mod shortcuts;
pub mod store;
pub mod ui;

pub use api::Draw;
pub use input::{EventClass, InputEvent, KeyInput, MapEvent, Modifiers, PointerInput};
pub use modes::{
    DIRECT_SELECT, DRAW_LINE_STRING, DRAW_POINT, DRAW_POLYGON, Flow, Mode, ModeContext,
    ModeFactory, ModeOptions, Registrar, SIMPLE_SELECT,
};
pub use movement::{Delta, MoveConstraint, WorldBounds};
pub use options::DrawOptions;
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use store::{SelectedCoordinate, Store};
pub use ui::Cursor;

// Re-export the model and surface types so embedders need a single dependency
pub use gd_core::{
    Actions, CoordPath, DrawError, DrawEvent, FeatureCollection, FeatureId, GeoJsonFeature,
    Geometry, GeometryKind, Position, UpdateAction,
};
pub use gd_render::{Control, HeadlessSurface, Interaction, MapSurface, Source};
