//! Predicates modes register their callbacks under.

use gd_core::Meta;

use crate::input::MapEvent;

pub fn always(_: &MapEvent) -> bool {
    true
}

pub fn no_target(e: &MapEvent) -> bool {
    e.target.is_none()
}

pub fn is_feature(e: &MapEvent) -> bool {
    e.target_meta() == Some(Meta::Feature)
}

pub fn is_vertex(e: &MapEvent) -> bool {
    e.target_meta() == Some(Meta::Vertex)
}

pub fn is_midpoint(e: &MapEvent) -> bool {
    e.target_meta() == Some(Meta::Midpoint)
}

pub fn is_active_feature(e: &MapEvent) -> bool {
    e.target
        .as_ref()
        .is_some_and(|t| t.meta() == Meta::Feature && t.is_active())
}

pub fn is_inactive_feature(e: &MapEvent) -> bool {
    e.target
        .as_ref()
        .is_some_and(|t| t.meta() == Meta::Feature && !t.is_active())
}

pub fn is_shift_down(e: &MapEvent) -> bool {
    e.pointer.modifiers.shift
}

/// Shift held while pressing the primary button.
pub fn is_shift_mousedown(e: &MapEvent) -> bool {
    e.pointer.modifiers.shift && e.pointer.button == 0
}

pub fn is_escape_key(e: &MapEvent) -> bool {
    e.key.as_deref() == Some("Escape")
}

pub fn is_enter_key(e: &MapEvent) -> bool {
    e.key.as_deref() == Some("Enter")
}
