//! The editing session and its public API.
//!
//! A [`Draw`] owns everything one editing session needs:
//!
//! - the host map behind [`MapSurface`],
//! - the [`Store`] holding features and selection,
//! - the dispatcher with the active mode,
//! - UI class state and options.
//!
//! Host input goes through [`Draw::handle`], the host's frame loop calls
//! [`Draw::tick`], and applications read and write features through the
//! methods below. API mutations never emit create/update/delete
//! notifications; those are reserved for user gestures.

use gd_core::{
    DrawError, Feature, FeatureCollection, FeatureId, GeoJsonFeature, normalize, parse_collection,
};
use gd_render::{Interaction, MapSurface, click_box, features_at};
use indexmap::IndexSet;
use kurbo::Point;
use serde_json::Value;

use crate::events::Events;
use crate::modes::{
    DIRECT_SELECT, Mode, ModeFactory, ModeOptions, SIMPLE_SELECT, Transition, builtin,
};
use crate::movement::{MoveConstraint, WorldBounds};
use crate::options::DrawOptions;
use crate::store::Store;
use crate::ui::UiState;

pub struct Draw<S: MapSurface> {
    pub(crate) surface: S,
    pub(crate) store: Store,
    pub(crate) options: DrawOptions,
    pub(crate) ui: UiState,
    pub(crate) events: Events,
    pub(crate) constraint: Box<dyn MoveConstraint>,
}

impl<S: MapSurface> Draw<S> {
    /// Start a session with the built-in modes.
    pub fn new(surface: S, options: DrawOptions) -> Result<Self, DrawError> {
        Self::with_modes(surface, options, builtin())
    }

    /// Start a session with a custom mode table. The default mode must be
    /// among them.
    pub fn with_modes(
        surface: S,
        options: DrawOptions,
        modes: impl IntoIterator<Item = (&'static str, ModeFactory)>,
    ) -> Result<Self, DrawError> {
        let mut draw = Self {
            surface,
            store: Store::new(),
            options,
            ui: UiState::new(),
            events: Events::new(modes),
            constraint: Box::new(WorldBounds),
        };
        draw.store.store_map_config(&draw.surface);
        if draw.options.box_select {
            draw.surface.set_interaction(Interaction::BoxZoom, false);
        }
        draw.surface.add_sources();

        let default_mode = draw.options.default_mode.clone();
        draw.transition(Transition {
            mode: default_mode,
            options: ModeOptions::default(),
            silent: true,
        })?;
        log::debug!("session started in {}", draw.events.current_name);
        Ok(draw)
    }

    /// Make a custom mode available to `change_mode`.
    pub fn register_mode<M: Mode>(&mut self, name: &str) {
        self.events
            .modes
            .insert(name.to_string(), ModeFactory::of::<M>());
    }

    /// Replace the policy that limits how far a drag may move geometry.
    pub fn set_move_constraint(&mut self, constraint: impl MoveConstraint + 'static) {
        self.constraint = Box::new(constraint);
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn options(&self) -> &DrawOptions {
        &self.options
    }

    /// Perform the pending flush, if any. Returns whether one ran.
    pub fn tick(&mut self) -> bool {
        if !self.store.take_render_request() {
            return false;
        }
        self.flush();
        true
    }

    // ─── Features ────────────────────────────────────────────────────────

    /// Add a Feature, FeatureCollection or bare Geometry. Existing ids are
    /// updated in place; ids are generated for features that have none.
    pub fn add(&mut self, geojson: Value) -> Result<Vec<FeatureId>, DrawError> {
        let collection = normalize(geojson)?;
        self.add_collection(collection)
    }

    fn add_collection(&mut self, collection: FeatureCollection) -> Result<Vec<FeatureId>, DrawError> {
        let mut ids = Vec::with_capacity(collection.features.len());
        for feature in collection.features {
            ids.push(self.ingest(feature)?);
        }
        self.store.render();
        Ok(ids)
    }

    fn ingest(&mut self, feature: GeoJsonFeature) -> Result<FeatureId, DrawError> {
        let id = feature.id.unwrap_or_else(FeatureId::generate);
        let GeoJsonFeature {
            properties,
            geometry,
            ..
        } = feature;

        let same_kind = self
            .store
            .get(id)
            .map(|existing| (existing.kind() == geometry.kind(), existing.get_coordinates()));
        match same_kind {
            Some((true, current)) => {
                let moved = current != geometry;
                let result = self.store.edit(id, |existing| {
                    existing.set_properties(properties);
                    if moved {
                        existing.incoming_coords(geometry)
                    } else {
                        Ok(())
                    }
                });
                result.transpose()?;
            }
            _ => {
                self.store.add(Feature::new(id, properties, geometry));
            }
        }
        Ok(id)
    }

    /// Replace every feature with `collection`. Features not in it are
    /// deleted. Renders once.
    pub fn set(&mut self, collection: Value) -> Result<Vec<FeatureId>, DrawError> {
        let collection = parse_collection(collection)?;
        let previous = self.store.get_all_ids();

        self.store.begin_render_batch();
        let result = self.add_collection(collection).and_then(|ids| {
            let kept: IndexSet<FeatureId> = ids.iter().copied().collect();
            let stale: Vec<FeatureId> = previous
                .into_iter()
                .filter(|id| !kept.contains(id))
                .collect();
            if !stale.is_empty() {
                self.delete(&stale)?;
            }
            Ok(ids)
        });
        self.store.end_render_batch();
        result
    }

    pub fn get(&self, id: FeatureId) -> Option<GeoJsonFeature> {
        self.store.get(id).map(Feature::to_geojson)
    }

    pub fn get_all(&self) -> FeatureCollection {
        FeatureCollection::new(self.store.get_all().map(Feature::to_geojson).collect())
    }

    /// Delete silently. Leaves direct_select if its feature went away.
    pub fn delete(&mut self, ids: &[FeatureId]) -> Result<(), DrawError> {
        self.store.delete(ids, true);
        if self.events.current_name == DIRECT_SELECT && self.store.get_selected_ids().is_empty() {
            return self.leave_to_simple_select();
        }
        self.store.render();
        Ok(())
    }

    pub fn delete_all(&mut self) -> Result<(), DrawError> {
        let ids = self.store.get_all_ids();
        self.store.delete(&ids, true);
        if self.events.current_name == DIRECT_SELECT {
            return self.leave_to_simple_select();
        }
        self.store.render();
        Ok(())
    }

    fn leave_to_simple_select(&mut self) -> Result<(), DrawError> {
        self.transition(Transition {
            mode: SIMPLE_SELECT.to_string(),
            options: ModeOptions::default(),
            silent: true,
        })
    }

    pub fn set_feature_property(&mut self, id: FeatureId, key: &str, value: Value) {
        self.store.set_feature_property(id, key, value);
        self.store.render();
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn get_selected_ids(&self) -> Vec<FeatureId> {
        self.store.get_selected_ids()
    }

    pub fn get_selected(&self) -> FeatureCollection {
        FeatureCollection::new(
            self.store
                .get_selected()
                .into_iter()
                .map(Feature::to_geojson)
                .collect(),
        )
    }

    /// Selected vertices as Point features.
    pub fn get_selected_points(&self) -> FeatureCollection {
        FeatureCollection::new(self.store.get_selected_coordinates())
    }

    /// Ids of the features rendered under a screen point, topmost first.
    pub fn get_feature_ids_at(&self, point: Point) -> Vec<FeatureId> {
        let bbox = click_box(point, self.options.click_buffer);
        features_at(&self.surface, bbox, &self.options.layers)
            .into_iter()
            .filter_map(|f| f.properties.id)
            .collect()
    }

    // ─── Modes ───────────────────────────────────────────────────────────

    pub fn get_mode(&self) -> &str {
        &self.events.current_name
    }

    /// Switch modes without a mode-change notification.
    ///
    /// Re-entering simple_select only swaps the selection, and re-entering
    /// direct_select on the feature already being edited does nothing.
    pub fn change_mode(&mut self, mode: &str, options: ModeOptions) -> Result<(), DrawError> {
        let current = self.events.current_name.as_str();
        if mode == SIMPLE_SELECT && current == SIMPLE_SELECT {
            let wanted: IndexSet<FeatureId> = options.feature_ids.iter().copied().collect();
            let selected: IndexSet<FeatureId> = self.store.get_selected_ids().into_iter().collect();
            if wanted != selected {
                self.store.set_selected(&options.feature_ids, true);
                self.store.render();
            }
            return Ok(());
        }
        if mode == DIRECT_SELECT
            && current == DIRECT_SELECT
            && options.feature_id.is_some()
            && options.feature_id == self.store.get_selected_ids().first().copied()
        {
            return Ok(());
        }
        self.transition(Transition {
            mode: mode.to_string(),
            options,
            silent: true,
        })
    }

    pub fn trash(&mut self) -> Result<(), DrawError> {
        {
            let (mode, mut ctx) = self.split();
            if let Some(mode) = mode {
                mode.trash(&mut ctx);
            }
        }
        self.apply_pending()?;
        self.store.render();
        Ok(())
    }

    pub fn combine_features(&mut self) -> Result<(), DrawError> {
        {
            let (mode, mut ctx) = self.split();
            if let Some(mode) = mode {
                mode.combine_features(&mut ctx);
            }
        }
        self.apply_pending()?;
        self.store.render();
        Ok(())
    }

    pub fn uncombine_features(&mut self) -> Result<(), DrawError> {
        {
            let (mode, mut ctx) = self.split();
            if let Some(mode) = mode {
                mode.uncombine_features(&mut ctx);
            }
        }
        self.apply_pending()?;
        self.store.render();
        Ok(())
    }

    /// Redraw everything, e.g. after the host reloaded its style.
    pub fn style_reset(&mut self) {
        self.store.set_dirty();
        self.store.render();
    }

    /// End the session: drop the sources, restore the map's gestures and
    /// hand the surface back.
    pub fn remove(mut self) -> S {
        self.surface.remove_sources();
        self.store.restore_map_config(&mut self.surface);
        self.ui.clear(&mut self.surface);
        self.ui.set_active_button(&mut self.surface, &self.options, None);
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gd_core::{DrawEvent, Geometry};
    use gd_render::HeadlessSurface;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn session() -> Draw<HeadlessSurface> {
        Draw::new(HeadlessSurface::new(), DrawOptions::default()).unwrap()
    }

    #[test]
    fn starts_in_the_default_mode_silently() {
        let draw = session();
        assert_eq!(draw.get_mode(), SIMPLE_SELECT);
        assert!(draw.surface().events().is_empty());
        assert!(!draw.surface().interaction_enabled(Interaction::BoxZoom));
    }

    #[test]
    fn unknown_default_mode_is_rejected() {
        let options = DrawOptions {
            default_mode: "lasso".into(),
            ..DrawOptions::default()
        };
        match Draw::new(HeadlessSurface::new(), options) {
            Err(DrawError::UnknownMode(name)) => assert_eq!(name, "lasso"),
            Err(other) => panic!("expected UnknownMode, got {other:?}"),
            Ok(_) => panic!("expected UnknownMode, got a session"),
        }
    }

    #[test]
    fn re_adding_an_id_updates_in_place() {
        let mut draw = session();
        let ids = draw
            .add(json!({
                "type": "Feature", "id": "road", "properties": {"lanes": 2},
                "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}
            }))
            .unwrap();
        assert_eq!(ids, vec![FeatureId::intern("road")]);
        draw.tick();

        draw.add(json!({
            "type": "Feature", "id": "road", "properties": {"lanes": 4},
            "geometry": {"type": "LineString", "coordinates": [[0, 0], [2, 2]]}
        }))
        .unwrap();
        let road = draw.get(FeatureId::intern("road")).unwrap();
        assert_eq!(road.properties["lanes"], json!(4));
        assert_eq!(road.geometry, Geometry::LineString(vec![[0.0, 0.0], [2.0, 2.0]]));
        assert_eq!(draw.store().get_changed_ids(), vec![FeatureId::intern("road")]);
    }

    #[test]
    fn a_different_geometry_type_replaces_the_feature() {
        let mut draw = session();
        draw.add(json!({"type": "Feature", "id": "x", "geometry": {"type": "Point", "coordinates": [1, 1]}}))
            .unwrap();
        draw.add(json!({
            "type": "Feature", "id": "x",
            "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}
        }))
        .unwrap();
        let x = draw.get(FeatureId::intern("x")).unwrap();
        assert_eq!(x.geometry.kind(), gd_core::GeometryKind::LineString);
        assert_eq!(draw.get_all().features.len(), 1);
    }

    #[test]
    fn set_replaces_everything_and_renders_once() {
        let mut draw = session();
        draw.add(json!({"type": "Feature", "id": "old", "geometry": {"type": "Point", "coordinates": [0, 0]}}))
            .unwrap();
        draw.tick();
        draw.surface_mut().take_events();

        let ids = draw
            .set(json!({"type": "FeatureCollection", "features": [
                {"type": "Feature", "id": "new", "geometry": {"type": "Point", "coordinates": [5, 5]}}
            ]}))
            .unwrap();
        assert_eq!(ids, vec![FeatureId::intern("new")]);
        assert!(draw.get(FeatureId::intern("old")).is_none());
        assert!(draw.tick());
        assert!(!draw.tick());
        assert_eq!(draw.surface().event_names(), vec!["draw.render"]);
    }

    #[test]
    fn set_requires_a_feature_collection() {
        let mut draw = session();
        draw.tick();
        let err = draw
            .set(json!({"type": "Feature", "geometry": {"type": "Point", "coordinates": [0, 0]}}))
            .unwrap_err();
        assert_eq!(err, DrawError::InvalidFeatureCollection);
        assert!(!draw.store().render_requested());
    }

    #[test]
    fn null_geometry_is_rejected_before_anything_is_added() {
        let mut draw = session();
        let err = draw
            .add(json!({"type": "FeatureCollection", "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [0, 0]}},
                {"type": "Feature", "geometry": null}
            ]}))
            .unwrap_err();
        assert_eq!(err, DrawError::NullGeometry);
        assert!(draw.store().is_empty());
    }

    #[test]
    fn change_mode_within_simple_select_only_swaps_selection() {
        let mut draw = session();
        let ids = draw
            .add(json!({"type": "Feature", "geometry": {"type": "Point", "coordinates": [0, 0]}}))
            .unwrap();
        draw.change_mode(SIMPLE_SELECT, ModeOptions::select(&ids)).unwrap();
        assert_eq!(draw.get_selected_ids(), ids);
        assert_eq!(draw.get_mode(), SIMPLE_SELECT);
        draw.tick();
        assert!(
            !draw
                .surface()
                .events()
                .iter()
                .any(|e| matches!(e, DrawEvent::ModeChange { .. }))
        );
    }

    #[test]
    fn remove_restores_the_map() {
        let mut draw = session();
        draw.change_mode("draw_polygon", ModeOptions::default()).unwrap();
        let surface = draw.remove();
        assert!(surface.interaction_enabled(Interaction::BoxZoom));
        assert!(surface.interaction_enabled(Interaction::DoubleClickZoom));
        assert!(!surface.has_sources());
        assert_eq!(surface.active_button(), None);
        assert!(surface.classes().is_empty());
    }
}
