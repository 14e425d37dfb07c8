//! Feature store: the single source of truth for features and selection.
//!
//! The store owns every `Feature`, the selected feature ids, the selected
//! vertices and the change set that drives rendering. Rendering is split in
//! two phases driven by the editor: `begin_flush` works out which features
//! to recompute into the hot and cold sources, the editor expands them
//! through the active mode, and `finish_flush` pushes the result and emits
//! the queued notifications.
//!
//! `render()` never flushes directly. It raises a request flag that the
//! host's frame tick consumes, so any number of calls between two ticks
//! yields one flush.

use std::collections::HashMap;

use gd_core::{
    DisplayFeature, DrawEvent, Feature, FeatureId, GeoJsonFeature, Geometry, CoordPath,
};
use gd_render::{Interaction, MapSurface, Source};
use indexmap::{IndexMap, IndexSet};

/// One selected vertex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectedCoordinate {
    pub feature_id: FeatureId,
    pub coord_path: CoordPath,
}

/// Which features a flush recomputes, and into which source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPlan {
    pub hot: Vec<FeatureId>,
    pub cold: Vec<FeatureId>,
    cold_changed: bool,
}

#[derive(Debug, Default)]
pub struct Store {
    features: IndexMap<FeatureId, Feature>,
    selected: IndexSet<FeatureId>,
    selected_coordinates: Vec<SelectedCoordinate>,
    changed: IndexSet<FeatureId>,
    deleted_to_emit: Vec<Feature>,
    emit_selection_change: bool,
    dirty: bool,
    render_requested: bool,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Renders requested while batching.
    batch_renders: usize,
    hot: Vec<DisplayFeature>,
    cold: Vec<DisplayFeature>,
    initial_config: HashMap<Interaction, bool>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Features ────────────────────────────────────────────────────────

    /// Insert or replace a feature. Always marks it changed.
    pub fn add(&mut self, feature: Feature) -> FeatureId {
        let id = feature.id();
        self.changed.insert(id);
        self.features.insert(id, feature);
        id
    }

    pub fn get(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(&id)
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.features.contains_key(&id)
    }

    pub fn get_all(&self) -> impl Iterator<Item = &Feature> {
        self.features.values()
    }

    pub fn get_all_ids(&self) -> Vec<FeatureId> {
        self.features.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Mutate a feature in place. It joins the change set only if the
    /// closure actually changed something. Unknown ids are a no-op.
    pub fn edit<R>(&mut self, id: FeatureId, f: impl FnOnce(&mut Feature) -> R) -> Option<R> {
        let Some(feature) = self.features.get_mut(&id) else {
            log::trace!("edit of missing feature {id}");
            return None;
        };
        let out = f(feature);
        if feature.take_changed() {
            self.changed.insert(id);
        }
        Some(out)
    }

    /// Remove features. Unless `silent`, each is queued once for the next
    /// delete notification.
    pub fn delete(&mut self, ids: &[FeatureId], silent: bool) {
        for id in ids {
            let Some(feature) = self.features.shift_remove(id) else {
                continue;
            };
            self.selected.shift_remove(id);
            if !silent && !self.deleted_to_emit.iter().any(|f| f.id() == *id) {
                self.deleted_to_emit.push(feature);
            }
            self.dirty = true;
            log::debug!("deleted {id}{}", if silent { " (silent)" } else { "" });
        }
        self.refresh_selected_coordinates(silent);
    }

    pub fn set_feature_property(&mut self, id: FeatureId, key: &str, value: serde_json::Value) {
        if let Some(feature) = self.features.get_mut(&id) {
            feature.set_property(key, value);
            feature.take_changed();
            self.changed.insert(id);
        }
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Ids not in the store are skipped.
    pub fn select(&mut self, ids: &[FeatureId], silent: bool) {
        for id in ids {
            if self.selected.contains(id) {
                continue;
            }
            if !self.features.contains_key(id) {
                log::trace!("select of missing feature {id}");
                continue;
            }
            self.selected.insert(*id);
            self.changed.insert(*id);
            if !silent {
                self.emit_selection_change = true;
            }
        }
    }

    pub fn deselect(&mut self, ids: &[FeatureId], silent: bool) {
        for id in ids {
            if !self.selected.shift_remove(id) {
                continue;
            }
            self.changed.insert(*id);
            if !silent {
                self.emit_selection_change = true;
            }
        }
        self.refresh_selected_coordinates(silent);
    }

    pub fn clear_selected(&mut self, silent: bool) {
        let all: Vec<FeatureId> = self.selected.iter().copied().collect();
        self.deselect(&all, silent);
    }

    /// Make `ids` the selection, touching only the delta.
    pub fn set_selected(&mut self, ids: &[FeatureId], silent: bool) {
        let leaving: Vec<FeatureId> = self
            .selected
            .iter()
            .filter(|id| !ids.contains(id))
            .copied()
            .collect();
        self.deselect(&leaving, silent);
        let entering: Vec<FeatureId> = ids
            .iter()
            .filter(|id| !self.selected.contains(*id))
            .copied()
            .collect();
        self.select(&entering, silent);
    }

    pub fn is_selected(&self, id: FeatureId) -> bool {
        self.selected.contains(&id)
    }

    pub fn get_selected_ids(&self) -> Vec<FeatureId> {
        self.selected.iter().copied().collect()
    }

    pub fn get_selected(&self) -> Vec<&Feature> {
        self.selected
            .iter()
            .filter_map(|id| self.features.get(id))
            .collect()
    }

    /// Replace the selected vertices. Entries for missing features are
    /// dropped.
    pub fn set_selected_coordinates(&mut self, coordinates: Vec<SelectedCoordinate>) {
        self.selected_coordinates = coordinates
            .into_iter()
            .filter(|c| self.features.contains_key(&c.feature_id))
            .collect();
        self.emit_selection_change = true;
    }

    pub fn clear_selected_coordinates(&mut self) {
        self.selected_coordinates.clear();
        self.emit_selection_change = true;
    }

    pub fn selected_coordinates(&self) -> &[SelectedCoordinate] {
        &self.selected_coordinates
    }

    /// Selected vertices as GeoJSON points. Paths that no longer resolve are
    /// skipped.
    pub fn get_selected_coordinates(&self) -> Vec<GeoJsonFeature> {
        self.selected_coordinates
            .iter()
            .filter_map(|c| self.features.get(&c.feature_id)?.get_coordinate(&c.coord_path))
            .map(|p| GeoJsonFeature::new(Geometry::Point(Some(p))))
            .collect()
    }

    /// Drop selected vertices whose feature is no longer selected.
    pub fn refresh_selected_coordinates(&mut self, silent: bool) {
        let before = self.selected_coordinates.len();
        let selected = &self.selected;
        self.selected_coordinates
            .retain(|c| selected.contains(&c.feature_id));
        if self.selected_coordinates.len() != before && !silent {
            self.emit_selection_change = true;
        }
    }

    // ─── Change accounting ───────────────────────────────────────────────

    pub fn feature_changed(&mut self, id: FeatureId) {
        self.changed.insert(id);
    }

    pub fn get_changed_ids(&self) -> Vec<FeatureId> {
        self.changed.iter().copied().collect()
    }

    pub fn clear_changed_ids(&mut self) {
        self.changed.clear();
    }

    /// Force the next flush to redraw everything into the cold source.
    pub fn set_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // ─── Render scheduling ───────────────────────────────────────────────

    /// Request a flush on the next tick.
    pub fn render(&mut self) {
        if self.batch_depth > 0 {
            self.batch_renders += 1;
        } else {
            self.render_requested = true;
        }
    }

    pub fn render_requested(&self) -> bool {
        self.render_requested
    }

    /// Consume the pending request.
    pub fn take_render_request(&mut self) -> bool {
        std::mem::take(&mut self.render_requested)
    }

    /// Suppress renders until the matching `end_render_batch`.
    pub fn begin_render_batch(&mut self) {
        if self.batch_depth == 0 {
            self.batch_renders = 0;
        }
        self.batch_depth += 1;
    }

    /// When the outermost batch closes, request one render if any were
    /// suppressed.
    pub fn end_render_batch(&mut self) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0 && std::mem::take(&mut self.batch_renders) > 0 {
            self.render_requested = true;
        }
    }

    // ─── Flush ───────────────────────────────────────────────────────────

    /// Decide what to recompute and drop stale primitives from the buckets.
    pub fn begin_flush(&mut self) -> RenderPlan {
        let (hot, cold) = if self.dirty {
            (Vec::new(), self.get_all_ids())
        } else {
            let hot: Vec<FeatureId> = self
                .changed
                .iter()
                .filter(|id| self.features.contains_key(*id))
                .copied()
                .collect();
            let cold: IndexSet<FeatureId> = self
                .hot
                .iter()
                .filter_map(|f| f.properties.id)
                .filter(|id| !hot.contains(id) && self.features.contains_key(id))
                .collect();
            (hot, cold.into_iter().collect())
        };

        self.hot.clear();
        let last_cold = self.cold.len();
        if self.dirty {
            self.cold.clear();
        } else {
            self.cold
                .retain(|f| f.properties.owner().is_none_or(|id| !hot.contains(&id)));
        }
        let cold_changed = last_cold != self.cold.len() || !cold.is_empty();
        RenderPlan {
            hot,
            cold,
            cold_changed,
        }
    }

    /// Push the recomputed primitives and emit queued notifications.
    pub fn finish_flush(
        &mut self,
        map: &mut dyn MapSurface,
        plan: RenderPlan,
        hot: Vec<DisplayFeature>,
        cold: Vec<DisplayFeature>,
    ) {
        self.hot = hot;
        self.cold.extend(cold);
        log::trace!(
            "flush: {} hot, {} cold (cold pushed: {})",
            self.hot.len(),
            self.cold.len(),
            plan.cold_changed
        );

        if plan.cold_changed {
            map.set_data(Source::Cold, &self.cold);
        }
        map.set_data(Source::Hot, &self.hot);

        if std::mem::take(&mut self.emit_selection_change) {
            map.fire(DrawEvent::SelectionChange {
                features: self.get_selected().iter().map(|f| f.to_geojson()).collect(),
                points: self.get_selected_coordinates(),
            });
        }

        if !self.deleted_to_emit.is_empty() {
            let features = self.deleted_to_emit.drain(..).map(|f| f.to_geojson()).collect();
            map.fire(DrawEvent::Delete { features });
        }

        self.cleanup();
        map.fire(DrawEvent::Render);
    }

    /// End-of-flush bookkeeping, also used when the map has no sources.
    pub fn cleanup(&mut self) {
        self.dirty = false;
        self.changed.clear();
    }

    pub fn hot(&self) -> &[DisplayFeature] {
        &self.hot
    }

    pub fn cold(&self) -> &[DisplayFeature] {
        &self.cold
    }

    // ─── Map interaction config ──────────────────────────────────────────

    /// Remember how the map's gestures were configured when the session
    /// started.
    pub fn store_map_config(&mut self, map: &dyn MapSurface) {
        for interaction in Interaction::ALL {
            self.initial_config
                .insert(interaction, map.interaction_enabled(interaction));
        }
    }

    pub fn restore_map_config(&self, map: &mut dyn MapSurface) {
        for (interaction, enabled) in &self.initial_config {
            map.set_interaction(*interaction, *enabled);
        }
    }

    /// Unknown interactions count as enabled.
    pub fn initial_config_value(&self, interaction: Interaction) -> bool {
        self.initial_config.get(&interaction).copied().unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gd_core::Properties;
    use gd_render::HeadlessSurface;
    use pretty_assertions::assert_eq;

    fn line(id: &str) -> Feature {
        Feature::new(
            FeatureId::intern(id),
            Properties::new(),
            Geometry::LineString(vec![[0.0, 0.0], [1.0, 1.0]]),
        )
    }

    fn flush_plain(store: &mut Store, map: &mut HeadlessSurface) -> RenderPlan {
        let plan = store.begin_flush();
        let render = |ids: &[FeatureId], store: &Store| -> Vec<DisplayFeature> {
            ids.iter()
                .filter_map(|id| store.get(*id))
                .map(|f| f.internal("test", false))
                .collect()
        };
        let hot = render(&plan.hot, store);
        let cold = render(&plan.cold, store);
        store.finish_flush(map, plan.clone(), hot, cold);
        plan
    }

    #[test]
    fn delete_clears_selection_and_queues_once() {
        let mut store = Store::new();
        let a = store.add(line("store-a"));
        store.select(&[a], false);
        store.set_selected_coordinates(vec![SelectedCoordinate {
            feature_id: a,
            coord_path: CoordPath::new(&[1]),
        }]);
        store.delete(&[a, a, FeatureId::intern("store-missing")], false);

        assert!(store.get_selected_ids().is_empty());
        assert!(store.selected_coordinates().is_empty());
        assert_eq!(store.deleted_to_emit.len(), 1);
        assert!(store.is_dirty());
    }

    #[test]
    fn set_selected_touches_only_the_delta() {
        let mut store = Store::new();
        let a = store.add(line("store-sel-a"));
        let b = store.add(line("store-sel-b"));
        let c = store.add(line("store-sel-c"));
        store.set_selected(&[a, b], true);
        store.clear_changed_ids();

        store.set_selected(&[b, c], true);
        assert_eq!(store.get_selected_ids(), vec![b, c]);
        assert_eq!(store.get_changed_ids(), vec![a, c]);
        assert!(!store.emit_selection_change);
    }

    #[test]
    fn selecting_missing_ids_is_ignored() {
        let mut store = Store::new();
        store.select(&[FeatureId::intern("store-ghost")], false);
        assert!(store.get_selected_ids().is_empty());
        assert!(!store.emit_selection_change);
    }

    #[test]
    fn deselect_drops_selected_coordinates() {
        let mut store = Store::new();
        let a = store.add(line("store-coord-a"));
        store.select(&[a], true);
        store.set_selected_coordinates(vec![SelectedCoordinate {
            feature_id: a,
            coord_path: CoordPath::new(&[0]),
        }]);
        assert_eq!(store.get_selected_coordinates().len(), 1);
        store.emit_selection_change = false;

        store.deselect(&[a], true);
        assert!(store.selected_coordinates().is_empty());
        assert!(!store.emit_selection_change);
    }

    #[test]
    fn edit_marks_changed_only_on_real_change() {
        let mut store = Store::new();
        let a = store.add(line("store-edit-a"));
        store.clear_changed_ids();

        store.edit(a, |f| f.update_coordinate(&CoordPath::new(&[0]), 0.0, 0.0));
        assert!(store.get_changed_ids().is_empty());

        store.edit(a, |f| f.update_coordinate(&CoordPath::new(&[0]), 5.0, 5.0));
        assert_eq!(store.get_changed_ids(), vec![a]);
        assert_eq!(store.edit(FeatureId::intern("store-edit-missing"), |_| ()), None);
    }

    #[test]
    fn batch_coalesces_into_one_request() {
        let mut store = Store::new();
        store.begin_render_batch();
        store.begin_render_batch();
        store.render();
        store.render();
        store.end_render_batch();
        assert!(!store.render_requested());
        store.end_render_batch();
        assert!(store.take_render_request());
        assert!(!store.take_render_request());
    }

    #[test]
    fn empty_batch_requests_nothing() {
        let mut store = Store::new();
        store.begin_render_batch();
        store.end_render_batch();
        assert!(!store.render_requested());
    }

    #[test]
    fn changed_features_move_to_hot_then_back_to_cold() {
        let mut store = Store::new();
        let mut map = HeadlessSurface::new();
        let a = store.add(line("store-flush-a"));
        let b = store.add(line("store-flush-b"));
        store.set_dirty();

        let plan = flush_plain(&mut store, &mut map);
        assert_eq!(plan.cold, vec![a, b]);
        assert_eq!(map.cold().len(), 2);
        assert!(map.hot().is_empty());

        store.edit(a, |f| f.update_coordinate(&CoordPath::new(&[0]), 3.0, 3.0));
        let plan = flush_plain(&mut store, &mut map);
        assert_eq!(plan.hot, vec![a]);
        assert_eq!(map.hot().len(), 1);
        assert_eq!(map.cold().len(), 1);

        let plan = flush_plain(&mut store, &mut map);
        assert_eq!(plan.cold, vec![a]);
        assert!(map.hot().is_empty());
        assert_eq!(map.cold().len(), 2);
    }

    #[test]
    fn flush_emits_selection_then_delete_then_render() {
        let mut store = Store::new();
        let mut map = HeadlessSurface::new();
        let a = store.add(line("store-events-a"));
        let b = store.add(line("store-events-b"));
        store.select(&[a], false);
        store.delete(&[b], false);

        flush_plain(&mut store, &mut map);
        assert_eq!(
            map.event_names(),
            vec!["draw.selectionchange", "draw.delete", "draw.render"]
        );
        assert!(!store.is_dirty());
        assert!(store.get_changed_ids().is_empty());
    }

    #[test]
    fn map_config_defaults_to_enabled() {
        let mut store = Store::new();
        assert!(store.initial_config_value(Interaction::DoubleClickZoom));
        let map = HeadlessSurface::with_disabled(&[Interaction::DoubleClickZoom]);
        store.store_map_config(&map);
        assert!(!store.initial_config_value(Interaction::DoubleClickZoom));
        assert!(store.initial_config_value(Interaction::DragPan));
    }
}
