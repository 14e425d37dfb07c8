//! Notifications emitted to the host map.

use crate::geojson::GeoJsonFeature;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateAction {
    /// Whole features were dragged.
    Move,
    /// Vertices were dragged, inserted, or removed.
    ChangeCoordinates,
}

/// Which editing controls currently have something to act on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Actions {
    pub trash: bool,
    pub combine_features: bool,
    pub uncombine_features: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DrawEvent {
    Create {
        features: Vec<GeoJsonFeature>,
    },
    Update {
        action: UpdateAction,
        features: Vec<GeoJsonFeature>,
    },
    Delete {
        features: Vec<GeoJsonFeature>,
    },
    SelectionChange {
        features: Vec<GeoJsonFeature>,
        points: Vec<GeoJsonFeature>,
    },
    Combine {
        #[serde(rename = "createdFeatures")]
        created: Vec<GeoJsonFeature>,
        #[serde(rename = "deletedFeatures")]
        deleted: Vec<GeoJsonFeature>,
    },
    Uncombine {
        #[serde(rename = "createdFeatures")]
        created: Vec<GeoJsonFeature>,
        #[serde(rename = "deletedFeatures")]
        deleted: Vec<GeoJsonFeature>,
    },
    ModeChange {
        mode: String,
    },
    Actionable {
        actions: Actions,
    },
    Render,
}

impl DrawEvent {
    /// Event name on the host's notification channel.
    pub fn name(&self) -> &'static str {
        match self {
            DrawEvent::Create { .. } => "draw.create",
            DrawEvent::Update { .. } => "draw.update",
            DrawEvent::Delete { .. } => "draw.delete",
            DrawEvent::SelectionChange { .. } => "draw.selectionchange",
            DrawEvent::Combine { .. } => "draw.combine",
            DrawEvent::Uncombine { .. } => "draw.uncombine",
            DrawEvent::ModeChange { .. } => "draw.modechange",
            DrawEvent::Actionable { .. } => "draw.actionable",
            DrawEvent::Render => "draw.render",
        }
    }
}
