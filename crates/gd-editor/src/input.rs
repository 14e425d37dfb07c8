//! Input abstraction layer.
//!
//! The host translates its native pointer, touch and keyboard events into
//! `InputEvent`s. The dispatcher classifies them (click vs drag, tap vs
//! drag), attaches the hit-tested target and hands a `MapEvent` to the
//! active mode.

use std::fmt;
use std::str::FromStr;

use gd_core::{DisplayFeature, DrawError, Meta, Position};
use kurbo::Point;

use crate::options::{ClickTolerance, TapTolerance};

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };
}

/// One pointer sample in both screen and geographic space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    /// Screen position in px.
    pub point: Point,
    pub lng_lat: Position,
    /// Bitmask of held buttons; `1` is the primary button.
    pub buttons: u8,
    /// The button that changed state; `0` is the primary button.
    pub button: u8,
    pub modifiers: Modifiers,
    /// Host timestamp in milliseconds.
    pub time_ms: u64,
}

impl Default for PointerInput {
    fn default() -> Self {
        Self {
            point: Point::ZERO,
            lng_lat: [0.0, 0.0],
            buttons: 0,
            button: 0,
            modifiers: Modifiers::NONE,
            time_ms: 0,
        }
    }
}

impl PointerInput {
    /// A sample where screen px and degrees coincide, as on a headless
    /// surface with an identity projection.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            point: Point::new(x, y),
            lng_lat: [x, y],
            ..Self::default()
        }
    }

    pub fn with_time(mut self, time_ms: u64) -> Self {
        self.time_ms = time_ms;
        self
    }

    pub fn with_buttons(mut self, buttons: u8) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    /// `KeyboardEvent.key` value, e.g. `"Escape"` or `"3"`.
    pub key: String,
    /// Whether focus was on the map canvas.
    pub on_canvas: bool,
    pub modifiers: Modifiers,
}

impl KeyInput {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            on_canvas: true,
            modifiers: Modifiers::NONE,
        }
    }
}

/// A normalized event from the host.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    MouseDown(PointerInput),
    MouseMove(PointerInput),
    MouseUp(PointerInput),
    MouseOut(PointerInput),
    TouchStart(PointerInput),
    TouchMove(PointerInput),
    TouchEnd(PointerInput),
    KeyDown(KeyInput),
    KeyUp(KeyInput),
}

// ─── Event classes ───────────────────────────────────────────────────────

/// The classes a mode can register callbacks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventClass {
    Drag,
    Click,
    MouseMove,
    MouseDown,
    MouseUp,
    MouseOut,
    KeyDown,
    KeyUp,
    TouchStart,
    TouchMove,
    TouchEnd,
    Tap,
}

impl EventClass {
    pub const ALL: [EventClass; 12] = [
        EventClass::Drag,
        EventClass::Click,
        EventClass::MouseMove,
        EventClass::MouseDown,
        EventClass::MouseUp,
        EventClass::MouseOut,
        EventClass::KeyDown,
        EventClass::KeyUp,
        EventClass::TouchStart,
        EventClass::TouchMove,
        EventClass::TouchEnd,
        EventClass::Tap,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EventClass::Drag => "drag",
            EventClass::Click => "click",
            EventClass::MouseMove => "mousemove",
            EventClass::MouseDown => "mousedown",
            EventClass::MouseUp => "mouseup",
            EventClass::MouseOut => "mouseout",
            EventClass::KeyDown => "keydown",
            EventClass::KeyUp => "keyup",
            EventClass::TouchStart => "touchstart",
            EventClass::TouchMove => "touchmove",
            EventClass::TouchEnd => "touchend",
            EventClass::Tap => "tap",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for EventClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventClass {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventClass::ALL
            .into_iter()
            .find(|class| class.name() == s)
            .ok_or_else(|| DrawError::InvalidEventType(s.to_string()))
    }
}

// ─── Map events ──────────────────────────────────────────────────────────

/// What a mode callback receives.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEvent {
    pub pointer: PointerInput,
    /// Set for key events only.
    pub key: Option<String>,
    /// Topmost rendered primitive under the pointer.
    pub target: Option<DisplayFeature>,
}

impl MapEvent {
    pub fn pointer(pointer: PointerInput, target: Option<DisplayFeature>) -> Self {
        Self {
            pointer,
            key: None,
            target,
        }
    }

    pub fn key(input: &KeyInput) -> Self {
        Self {
            pointer: PointerInput {
                modifiers: input.modifiers,
                ..PointerInput::default()
            },
            key: Some(input.key.clone()),
            target: None,
        }
    }

    pub fn lng_lat(&self) -> Position {
        self.pointer.lng_lat
    }

    pub fn point(&self) -> Point {
        self.pointer.point
    }

    pub fn target_meta(&self) -> Option<Meta> {
        self.target.as_ref().map(DisplayFeature::meta)
    }

    /// Whether the pointer sits exactly on `position`.
    pub fn is_at(&self, position: &Position) -> bool {
        self.pointer.lng_lat == *position
    }
}

// ─── Gesture classification ─────────────────────────────────────────────

/// Remembers where presses started so releases can be classified.
#[derive(Debug, Clone, Default)]
pub struct GestureTracker {
    mouse_down: Option<(Point, u64)>,
    touch_start: Option<(Point, u64)>,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mouse_down(&mut self, input: &PointerInput) {
        self.mouse_down = Some((input.point, input.time_ms));
    }

    pub fn touch_start(&mut self, input: &PointerInput) {
        self.touch_start = Some((input.point, input.time_ms));
    }

    /// A release with no recorded press counts as a click in place.
    pub fn is_click(&self, end: &PointerInput, tolerance: &ClickTolerance) -> bool {
        let (start, time) = self.mouse_down.unwrap_or((end.point, end.time_ms));
        let distance = start.distance(end.point);
        let elapsed = end.time_ms.saturating_sub(time);
        distance < tolerance.fine
            || (distance < tolerance.gross && elapsed < tolerance.interval_ms)
    }

    pub fn is_tap(&self, end: &PointerInput, tolerance: &TapTolerance) -> bool {
        let (start, time) = self.touch_start.unwrap_or((end.point, end.time_ms));
        let distance = start.distance(end.point);
        let elapsed = end.time_ms.saturating_sub(time);
        distance < tolerance.distance && elapsed < tolerance.interval_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_class_names_round_trip() {
        for class in EventClass::ALL {
            assert_eq!(class.name().parse::<EventClass>().unwrap(), class);
        }
        match "dblclick".parse::<EventClass>() {
            Err(DrawError::InvalidEventType(name)) => assert_eq!(name, "dblclick"),
            other => panic!("expected InvalidEventType, got {other:?}"),
        }
    }

    #[test]
    fn click_within_fine_tolerance_ignores_time() {
        let mut tracker = GestureTracker::new();
        tracker.mouse_down(&PointerInput::at(0.0, 0.0).with_time(0));
        let tol = ClickTolerance::default();
        assert!(tracker.is_click(&PointerInput::at(3.0, 0.0).with_time(10_000), &tol));
    }

    #[test]
    fn gross_tolerance_needs_a_quick_release() {
        let mut tracker = GestureTracker::new();
        tracker.mouse_down(&PointerInput::at(0.0, 0.0).with_time(0));
        let tol = ClickTolerance::default();
        assert!(tracker.is_click(&PointerInput::at(10.0, 0.0).with_time(200), &tol));
        assert!(!tracker.is_click(&PointerInput::at(10.0, 0.0).with_time(600), &tol));
        assert!(!tracker.is_click(&PointerInput::at(20.0, 0.0).with_time(10), &tol));
    }

    #[test]
    fn tap_requires_distance_and_time() {
        let mut tracker = GestureTracker::new();
        tracker.touch_start(&PointerInput::at(0.0, 0.0).with_time(100));
        let tol = TapTolerance::default();
        assert!(tracker.is_tap(&PointerInput::at(20.0, 0.0).with_time(300), &tol));
        assert!(!tracker.is_tap(&PointerInput::at(20.0, 0.0).with_time(400), &tol));
        assert!(!tracker.is_tap(&PointerInput::at(30.0, 0.0).with_time(120), &tol));
    }

    #[test]
    fn release_without_press_is_a_click() {
        let tracker = GestureTracker::new();
        let end = PointerInput::at(50.0, 50.0).with_time(9_000);
        assert!(tracker.is_click(&end, &ClickTolerance::default()));
        assert!(tracker.is_tap(&end, &TapTolerance::default()));
    }
}
