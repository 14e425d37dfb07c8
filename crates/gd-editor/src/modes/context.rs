//! The facade modes use to reach the session.

use gd_core::{
    Actions, CoordPath, DisplayFeature, DrawEvent, Feature, FeatureId, Geometry, UpdateAction,
};
use gd_render::{Control, Interaction, MapSurface, click_box, features_at};
use kurbo::Rect;

use super::ModeOptions;
use crate::input::MapEvent;
use crate::movement::{Delta, MoveConstraint, move_features};
use crate::options::DrawOptions;
use crate::store::{SelectedCoordinate, Store};
use crate::ui::{Cursor, UiState};

/// A mode change requested from inside a mode. Applied by the dispatcher
/// after the requesting callback returns.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub mode: String,
    pub options: ModeOptions,
    /// Suppress the mode-change notification.
    pub silent: bool,
}

/// Hit box size for a pointer query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitBuffer {
    Click,
    Touch,
}

pub struct ModeContext<'a> {
    store: &'a mut Store,
    map: &'a mut dyn MapSurface,
    options: &'a DrawOptions,
    ui: &'a mut UiState,
    actions: &'a mut Actions,
    constraint: &'a dyn MoveConstraint,
    transition: &'a mut Option<Transition>,
}

impl<'a> ModeContext<'a> {
    pub fn new(
        store: &'a mut Store,
        map: &'a mut dyn MapSurface,
        options: &'a DrawOptions,
        ui: &'a mut UiState,
        actions: &'a mut Actions,
        constraint: &'a dyn MoveConstraint,
        transition: &'a mut Option<Transition>,
    ) -> Self {
        Self {
            store,
            map,
            options,
            ui,
            actions,
            constraint,
            transition,
        }
    }

    pub fn options(&self) -> &DrawOptions {
        self.options
    }

    pub fn store(&self) -> &Store {
        self.store
    }

    // ─── Features ────────────────────────────────────────────────────────

    pub fn get_feature(&self, id: FeatureId) -> Option<&Feature> {
        self.store.get(id)
    }

    pub fn add_feature(&mut self, feature: Feature) -> FeatureId {
        self.store.add(feature)
    }

    pub fn delete_features(&mut self, ids: &[FeatureId], silent: bool) {
        self.store.delete(ids, silent);
    }

    pub fn edit_feature<R>(
        &mut self,
        id: FeatureId,
        f: impl FnOnce(&mut Feature) -> R,
    ) -> Option<R> {
        self.store.edit(id, f)
    }

    /// Re-render one feature on the next flush.
    pub fn do_render(&mut self, id: FeatureId) {
        self.store.feature_changed(id);
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn is_selected(&self, id: FeatureId) -> bool {
        self.store.is_selected(id)
    }

    pub fn selected_ids(&self) -> Vec<FeatureId> {
        self.store.get_selected_ids()
    }

    /// Owned copies, so callers can keep them across mutations.
    pub fn selected_features(&self) -> Vec<Feature> {
        self.store.get_selected().into_iter().cloned().collect()
    }

    pub fn select(&mut self, ids: &[FeatureId]) {
        self.store.select(ids, false);
    }

    pub fn deselect(&mut self, ids: &[FeatureId]) {
        self.store.deselect(ids, false);
    }

    pub fn set_selected(&mut self, ids: &[FeatureId]) {
        self.store.set_selected(ids, false);
    }

    pub fn clear_selected_features(&mut self) {
        self.store.clear_selected(false);
    }

    pub fn set_selected_coordinates(&mut self, id: FeatureId, paths: &[CoordPath]) {
        let coords = paths
            .iter()
            .map(|p| SelectedCoordinate {
                feature_id: id,
                coord_path: p.clone(),
            })
            .collect();
        self.store.set_selected_coordinates(coords);
    }

    pub fn clear_selected_coordinates(&mut self) {
        self.store.clear_selected_coordinates();
    }

    // ─── Transitions ─────────────────────────────────────────────────────

    pub fn change_mode(&mut self, mode: &str, options: ModeOptions) {
        self.request(mode, options, false);
    }

    pub fn change_mode_silent(&mut self, mode: &str, options: ModeOptions) {
        self.request(mode, options, true);
    }

    fn request(&mut self, mode: &str, options: ModeOptions, silent: bool) {
        if let Some(prev) = self.transition.replace(Transition {
            mode: mode.to_string(),
            options,
            silent,
        }) {
            log::debug!("transition to {} superseded by {mode}", prev.mode);
        }
    }

    // ─── Notifications ───────────────────────────────────────────────────

    pub fn fire(&mut self, event: DrawEvent) {
        self.map.fire(event);
    }

    pub fn fire_update(&mut self, action: UpdateAction, ids: &[FeatureId]) {
        let features = ids
            .iter()
            .filter_map(|id| self.store.get(*id))
            .map(Feature::to_geojson)
            .collect();
        self.map.fire(DrawEvent::Update { action, features });
    }

    /// Fires only when something changed.
    pub fn set_actionable_state(&mut self, actions: Actions) {
        if *self.actions == actions {
            return;
        }
        *self.actions = actions;
        self.map.fire(DrawEvent::Actionable { actions });
    }

    // ─── UI ──────────────────────────────────────────────────────────────

    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.ui.queue_mouse(cursor);
    }

    pub fn activate_ui_button(&mut self, button: Option<Control>) {
        self.ui.set_active_button(self.map, self.options, button);
    }

    pub fn show_box_select(&mut self, rect: Option<Rect>) {
        self.map.show_box_select(rect);
    }

    // ─── Map interactions ────────────────────────────────────────────────

    pub fn drag_pan_enabled(&self) -> bool {
        self.map.interaction_enabled(Interaction::DragPan)
    }

    pub fn set_drag_pan(&mut self, enabled: bool) {
        self.map.set_interaction(Interaction::DragPan, enabled);
    }

    /// Re-enables only if it was enabled when the session started.
    pub fn enable_double_click_zoom(&mut self) {
        if self.store.initial_config_value(Interaction::DoubleClickZoom) {
            self.map.set_interaction(Interaction::DoubleClickZoom, true);
        }
    }

    pub fn disable_double_click_zoom(&mut self) {
        self.map.set_interaction(Interaction::DoubleClickZoom, false);
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn features_at_point(&self, event: &MapEvent, buffer: HitBuffer) -> Vec<DisplayFeature> {
        let half = match buffer {
            HitBuffer::Click => self.options.click_buffer,
            HitBuffer::Touch => self.options.touch_buffer,
        };
        features_at(&*self.map, click_box(event.point(), half), &self.options.layers)
    }

    pub fn features_in_box(&self, bbox: Rect) -> Vec<DisplayFeature> {
        features_at(&*self.map, bbox, &self.options.layers)
    }

    // ─── Movement ────────────────────────────────────────────────────────

    pub fn move_features(&mut self, ids: &[FeatureId], delta: Delta) {
        move_features(self.store, ids, delta, self.constraint);
    }

    pub fn constrain(&self, geometries: &[Geometry], delta: Delta) -> Delta {
        self.constraint.constrain(geometries, delta)
    }
}
