//! Map container classes and toolbar highlight.
//!
//! Classes are queued during a dispatch and pushed as a delta afterwards, so
//! the host only touches the classes that actually changed.

use gd_core::Meta;
use gd_render::{Control, MapSurface};

use crate::options::DrawOptions;

/// Cursor hint for the map container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Add,
    Move,
    Drag,
    Pointer,
    None,
}

impl Cursor {
    pub fn as_str(self) -> &'static str {
        match self {
            Cursor::Add => "add",
            Cursor::Move => "move",
            Cursor::Drag => "drag",
            Cursor::Pointer => "pointer",
            Cursor::None => "none",
        }
    }
}

const MODE: usize = 0;
const FEATURE: usize = 1;
const MOUSE: usize = 2;
const KINDS: [&str; 3] = ["mode", "feature", "mouse"];

#[derive(Debug, Clone, Default)]
pub struct UiState {
    current: [Option<String>; 3],
    queued: [Option<String>; 3],
    active_button: Option<Control>,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_mode(&mut self, mode: &str) {
        self.queued[MODE] = Some(mode.to_string());
    }

    pub fn queue_feature(&mut self, meta: Meta) {
        self.queued[FEATURE] = Some(meta.as_str().to_string());
    }

    pub fn queue_mouse(&mut self, cursor: Cursor) {
        self.queued[MOUSE] = Some(cursor.as_str().to_string());
    }

    /// Classes as currently applied, e.g. `mouse-move`.
    pub fn classes(&self) -> Vec<String> {
        KINDS
            .iter()
            .zip(&self.current)
            .filter_map(|(kind, value)| value.as_ref().map(|v| format!("{kind}-{v}")))
            .collect()
    }

    /// Push queued changes to the map container.
    pub fn update(&mut self, map: &mut dyn MapSurface) {
        let mut remove = Vec::new();
        let mut add = Vec::new();
        for (i, kind) in KINDS.iter().enumerate() {
            let Some(next) = self.queued[i].take() else {
                continue;
            };
            if self.current[i].as_ref() == Some(&next) {
                continue;
            }
            if let Some(prev) = &self.current[i] {
                remove.push(format!("{kind}-{prev}"));
            }
            add.push(format!("{kind}-{next}"));
            self.current[i] = Some(next);
        }
        if !remove.is_empty() || !add.is_empty() {
            map.update_classes(&remove, &add);
        }
    }

    /// Drop every applied class.
    pub fn clear(&mut self, map: &mut dyn MapSurface) {
        let remove = self.classes();
        self.current = Default::default();
        self.queued = Default::default();
        if !remove.is_empty() {
            map.update_classes(&remove, &[]);
        }
    }

    /// Highlight a draw button. Buttons the toolbar does not show are never
    /// highlighted, and trash is a one-shot action.
    pub fn set_active_button(
        &mut self,
        map: &mut dyn MapSurface,
        options: &DrawOptions,
        button: Option<Control>,
    ) {
        let button = button.filter(|b| *b != Control::Trash && options.control_enabled(*b));
        if button == self.active_button {
            return;
        }
        self.active_button = button;
        map.set_active_button(button);
    }

    pub fn active_button(&self) -> Option<Control> {
        self.active_button
    }
}
