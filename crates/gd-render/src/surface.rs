//! The boundary to the host map.
//!
//! The editor never draws pixels or hit-tests rendered geometry itself; it
//! pushes display primitives into two sources and asks the map which
//! primitives lie under a screen-space box.

use gd_core::{DisplayFeature, DrawEvent};
use kurbo::Rect;

/// The two render buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Frequently changing features (being dragged or drawn).
    Hot,
    /// Stable background features.
    Cold,
}

impl Source {
    pub fn id(self) -> &'static str {
        match self {
            Source::Hot => "geodraw-hot",
            Source::Cold => "geodraw-cold",
        }
    }
}

/// Map gestures the editor may suspend while it owns the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interaction {
    ScrollZoom,
    BoxZoom,
    DragRotate,
    DragPan,
    Keyboard,
    DoubleClickZoom,
    TouchZoomRotate,
}

impl Interaction {
    pub const ALL: [Interaction; 7] = [
        Interaction::ScrollZoom,
        Interaction::BoxZoom,
        Interaction::DragRotate,
        Interaction::DragPan,
        Interaction::Keyboard,
        Interaction::DoubleClickZoom,
        Interaction::TouchZoomRotate,
    ];
}

/// Toolbar controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Point,
    LineString,
    Polygon,
    Trash,
    CombineFeatures,
    UncombineFeatures,
}

pub trait MapSurface {
    /// Rendered primitives intersecting a screen-space box, topmost first.
    /// An empty `layers` slice means every layer.
    fn query_rendered_features(&self, bbox: Rect, layers: &[String]) -> Vec<DisplayFeature>;

    /// Replace the data of one source.
    fn set_data(&mut self, source: Source, features: &[DisplayFeature]);

    /// Emit a notification on the host's event channel.
    fn fire(&mut self, event: DrawEvent);

    fn interaction_enabled(&self, interaction: Interaction) -> bool;

    fn set_interaction(&mut self, interaction: Interaction, enabled: bool);

    /// Whether the hot/cold sources exist. Renders are skipped when they don't.
    fn has_sources(&self) -> bool {
        true
    }

    /// Create the hot/cold sources and their layers.
    fn add_sources(&mut self) {}

    fn remove_sources(&mut self) {}

    /// Swap cursor/state classes on the map container.
    fn update_classes(&mut self, _remove: &[String], _add: &[String]) {}

    /// Highlight a toolbar button, or clear the highlight.
    fn set_active_button(&mut self, _button: Option<Control>) {}

    /// Show (or hide, with `None`) the rubber-band box in screen space.
    fn show_box_select(&mut self, _rect: Option<Rect>) {}
}
