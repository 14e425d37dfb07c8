//! Session configuration.
//!
//! Every field has a default, so a host only spells out what it changes:
//!
//! ```json
//! { "box_select": false, "controls": { "trash": true } }
//! ```

use gd_core::DrawError;
use gd_render::Control;
use serde::Deserialize;

use crate::modes::SIMPLE_SELECT;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DrawOptions {
    /// Mode the session starts in.
    pub default_mode: String,
    pub keybindings: bool,
    pub touch_enabled: bool,
    /// Half-size in px of the box queried around a click.
    pub click_buffer: f64,
    /// Half-size in px of the box queried around a touch.
    pub touch_buffer: f64,
    /// Shift+drag draws a rubber band that selects what it touches.
    pub box_select: bool,
    /// Fallback for every control without an explicit override.
    pub display_controls_default: bool,
    pub controls: ControlOverrides,
    /// Re-emit user properties as `user_<name>` on rendered primitives.
    pub user_properties: bool,
    /// Layer ids passed to hit queries. Empty means every layer.
    pub layers: Vec<String>,
    pub click_tolerance: ClickTolerance,
    pub tap_tolerance: TapTolerance,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            default_mode: SIMPLE_SELECT.to_string(),
            keybindings: true,
            touch_enabled: true,
            click_buffer: 2.0,
            touch_buffer: 25.0,
            box_select: true,
            display_controls_default: true,
            controls: ControlOverrides::default(),
            user_properties: false,
            layers: Vec::new(),
            click_tolerance: ClickTolerance::default(),
            tap_tolerance: TapTolerance::default(),
        }
    }
}

impl DrawOptions {
    pub fn from_json(json: &str) -> Result<Self, DrawError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether the toolbar shows `control`.
    pub fn control_enabled(&self, control: Control) -> bool {
        let overridden = match control {
            Control::Point => self.controls.point,
            Control::LineString => self.controls.line_string,
            Control::Polygon => self.controls.polygon,
            Control::Trash => self.controls.trash,
            Control::CombineFeatures => self.controls.combine_features,
            Control::UncombineFeatures => self.controls.uncombine_features,
        };
        overridden.unwrap_or(self.display_controls_default)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlOverrides {
    pub point: Option<bool>,
    pub line_string: Option<bool>,
    pub polygon: Option<bool>,
    pub trash: Option<bool>,
    pub combine_features: Option<bool>,
    pub uncombine_features: Option<bool>,
}

/// A press/release pair is a click when the pointer moved less than `fine`
/// px, or less than `gross` px within `interval_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClickTolerance {
    pub fine: f64,
    pub gross: f64,
    pub interval_ms: u64,
}

impl Default for ClickTolerance {
    fn default() -> Self {
        Self {
            fine: 4.0,
            gross: 12.0,
            interval_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TapTolerance {
    pub distance: f64,
    pub interval_ms: u64,
}

impl Default for TapTolerance {
    fn default() -> Self {
        Self {
            distance: 25.0,
            interval_ms: 250,
        }
    }
}
