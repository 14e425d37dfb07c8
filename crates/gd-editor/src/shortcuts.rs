//! Keyboard shortcut mapping.
//!
//! A handful of keys are reserved by the dispatcher: Backspace/Delete trash
//! the selection and the digit row switches draw modes. Everything else is
//! forwarded to the active mode.

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Trash,
    DrawPoint,
    DrawLineString,
    DrawPolygon,
}

/// Resolves key events into shortcut actions.
pub struct ShortcutMap;

impl ShortcutMap {
    /// `key` is the `KeyboardEvent.key` value (e.g. `"3"`, `"Delete"`).
    /// Returns `None` if the key has no binding.
    pub fn resolve(key: &str) -> Option<ShortcutAction> {
        match key {
            "Backspace" | "Delete" => Some(ShortcutAction::Trash),
            "1" => Some(ShortcutAction::DrawPoint),
            "2" => Some(ShortcutAction::DrawLineString),
            "3" => Some(ShortcutAction::DrawPolygon),
            _ => None,
        }
    }

    /// Whether the active mode gets to see `key`. Digits and delete keys are
    /// kept by the dispatcher, even the unbound ones.
    pub fn is_mode_key(key: &str) -> bool {
        let digit = key.len() == 1 && key.chars().all(|c| c.is_ascii_digit());
        !digit && !matches!(key, "Backspace" | "Delete")
    }
}
