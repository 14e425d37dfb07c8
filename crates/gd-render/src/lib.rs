pub mod headless;
pub mod hit;
pub mod supplementary;
pub mod surface;

pub use headless::HeadlessSurface;
pub use hit::{click_box, features_at, intersects, sort_features};
pub use supplementary::{SupplementaryOptions, create_midpoint, create_supplementary_points, create_vertex};
pub use surface::{Control, Interaction, MapSurface, Source};

/// Latitude band the map projection can render.
pub const LAT_RENDERED_MIN: f64 = -85.0;
pub const LAT_RENDERED_MAX: f64 = 85.0;
/// Hard latitude limits.
pub const LAT_MIN: f64 = -90.0;
pub const LAT_MAX: f64 = 90.0;
