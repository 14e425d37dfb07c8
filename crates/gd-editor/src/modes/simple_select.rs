//! Selecting, moving, box-selecting, combining and uncombining features.

use gd_core::{
    Actions, DisplayFeature, DrawError, DrawEvent, Feature, FeatureId, GeometryKind, Position,
    UpdateAction, collect_multi,
};
use gd_render::{SupplementaryOptions, create_supplementary_points};
use indexmap::IndexSet;
use kurbo::{Point, Rect};

use super::selectors::{
    is_active_feature, is_feature, is_shift_down, is_shift_mousedown, is_vertex, no_target,
};
use super::{DIRECT_SELECT, Flow, Mode, ModeContext, ModeOptions, Registrar};
use crate::input::{EventClass, MapEvent};
use crate::movement::Delta;
use crate::ui::Cursor;

#[derive(Debug, Default)]
pub struct SimpleSelect {
    drag_move_location: Option<Position>,
    box_select_start: Option<Point>,
    box_selecting: bool,
    can_box_select: bool,
    drag_moving: bool,
    can_drag_move: bool,
    initial_drag_pan: bool,
}

impl Mode for SimpleSelect {
    fn setup(ctx: &mut ModeContext<'_>, options: ModeOptions) -> Result<Self, DrawError> {
        let ids: Vec<FeatureId> = options
            .feature_ids
            .into_iter()
            .filter(|id| ctx.get_feature(*id).is_some())
            .collect();
        ctx.set_selected(&ids);
        fire_actionable(ctx);
        Ok(Self {
            initial_drag_pan: ctx.drag_pan_enabled(),
            ..Self::default()
        })
    }

    fn register(on: &mut Registrar<Self>) {
        for class in [EventClass::Click, EventClass::Tap] {
            on.on(class, no_target, Self::click_anywhere);
            on.on(class, is_vertex, Self::click_on_vertex);
            on.on(class, is_feature, Self::click_on_feature);
        }
        on.on_any(EventClass::MouseDown, Self::note_drag_pan);
        on.on(EventClass::MouseDown, is_shift_mousedown, Self::start_box_select);
        on.on(EventClass::MouseDown, is_active_feature, Self::start_on_active_feature);
        on.on(EventClass::TouchStart, is_active_feature, Self::start_on_active_feature);
        on.on_any(EventClass::Drag, Self::drag);
        on.on_any(EventClass::MouseUp, Self::end);
        on.on_any(EventClass::TouchEnd, Self::end);
        on.on_any(EventClass::MouseMove, Self::mouse_move);
        on.on_any(EventClass::MouseOut, Self::mouse_out);
    }

    fn stop(&mut self, ctx: &mut ModeContext<'_>) {
        ctx.enable_double_click_zoom();
    }

    fn trash(&mut self, ctx: &mut ModeContext<'_>) {
        let ids = ctx.selected_ids();
        ctx.delete_features(&ids, false);
        fire_actionable(ctx);
    }

    fn combine_features(&mut self, ctx: &mut ModeContext<'_>) {
        let selected = ctx.selected_features();
        if selected.len() < 2 {
            return;
        }
        let base = selected[0].kind().base();
        if selected.iter().any(|f| f.kind().base() != base) {
            return;
        }

        let mut parts = Vec::new();
        for feature in &selected {
            if feature.kind().is_multi() {
                parts.extend(feature.children().iter().map(Feature::get_coordinates));
            } else {
                parts.push(feature.get_coordinates());
            }
        }
        let combined = Feature::new(
            FeatureId::generate(),
            selected[0].properties().clone(),
            collect_multi(base, parts),
        );
        let created = combined.to_geojson();
        let id = ctx.add_feature(combined);
        let old: Vec<FeatureId> = selected.iter().map(Feature::id).collect();
        ctx.delete_features(&old, true);
        ctx.set_selected(&[id]);

        ctx.fire(DrawEvent::Combine {
            created: vec![created],
            deleted: selected.iter().map(Feature::to_geojson).collect(),
        });
        fire_actionable(ctx);
    }

    fn uncombine_features(&mut self, ctx: &mut ModeContext<'_>) {
        let selected = ctx.selected_features();
        if selected.is_empty() {
            return;
        }
        let mut created = Vec::new();
        let mut deleted = Vec::new();
        for parent in selected.iter().filter(|f| f.kind().is_multi()) {
            for child in parent.children() {
                let mut part = child.clone();
                part.set_properties(parent.properties().clone());
                created.push(part.to_geojson());
                let id = ctx.add_feature(part);
                ctx.select(&[id]);
            }
            ctx.delete_features(&[parent.id()], true);
            deleted.push(parent.to_geojson());
        }
        if created.len() > 1 {
            ctx.fire(DrawEvent::Uncombine { created, deleted });
        }
        fire_actionable(ctx);
    }

    fn to_display_features(
        &self,
        ctx: &mut ModeContext<'_>,
        mut feature: DisplayFeature,
        out: &mut Vec<DisplayFeature>,
    ) {
        feature.properties.active = feature.properties.id.is_some_and(|id| ctx.is_selected(id));
        let markers = if feature.properties.active && feature.geometry.kind() != GeometryKind::Point
        {
            create_supplementary_points(&feature, SupplementaryOptions::default())
        } else {
            Vec::new()
        };
        out.push(feature);
        fire_actionable(ctx);
        out.extend(markers);
    }
}

/// Enable the controls the current selection can act on.
fn fire_actionable(ctx: &mut ModeContext<'_>) {
    let selected = ctx.selected_features();
    let combine_features = selected.len() > 1
        && selected
            .iter()
            .all(|f| f.kind().base() == selected[0].kind().base());
    ctx.set_actionable_state(Actions {
        trash: !selected.is_empty(),
        combine_features,
        uncombine_features: selected.iter().any(|f| f.kind().is_multi()),
    });
}

impl SimpleSelect {
    fn fire_update(ctx: &mut ModeContext<'_>) {
        let ids = ctx.selected_ids();
        ctx.fire_update(UpdateAction::Move, &ids);
    }

    fn stop_extended_interactions(&mut self, ctx: &mut ModeContext<'_>) {
        if self.box_selecting {
            ctx.show_box_select(None);
        }
        if (self.can_drag_move || self.can_box_select) && self.initial_drag_pan {
            ctx.set_drag_pan(true);
        }
        self.box_selecting = false;
        self.can_box_select = false;
        self.drag_moving = false;
        self.can_drag_move = false;
    }

    // ─── Clicks ──────────────────────────────────────────────────────────

    fn click_anywhere(&mut self, ctx: &mut ModeContext<'_>, _e: &MapEvent) -> Flow {
        let was_selected = ctx.selected_ids();
        if !was_selected.is_empty() {
            ctx.clear_selected_features();
            for id in was_selected {
                ctx.do_render(id);
            }
        }
        ctx.enable_double_click_zoom();
        self.stop_extended_interactions(ctx);
        Flow::Render
    }

    fn click_on_vertex(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) -> Flow {
        let Some(target) = &e.target else {
            return Flow::Render;
        };
        ctx.change_mode(
            DIRECT_SELECT,
            ModeOptions {
                feature_id: target.properties.parent,
                coord_path: target.properties.coord_path.clone(),
                start_pos: Some(e.lng_lat()),
                ..ModeOptions::default()
            },
        );
        ctx.set_cursor(Cursor::Move);
        Flow::Render
    }

    fn click_on_feature(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) -> Flow {
        let Some(id) = e.target.as_ref().and_then(|t| t.properties.id) else {
            return Flow::Render;
        };
        ctx.disable_double_click_zoom();
        self.stop_extended_interactions(ctx);

        let shift = is_shift_down(e);
        let was_selected = ctx.selected_ids();
        let selected = ctx.is_selected(id);
        let is_point = ctx
            .get_feature(id)
            .is_some_and(|f| f.kind() == GeometryKind::Point);

        if !shift && selected && !is_point {
            ctx.change_mode(DIRECT_SELECT, ModeOptions::edit(id));
            return Flow::Render;
        }

        match (selected, shift) {
            (true, true) => {
                ctx.deselect(&[id]);
                ctx.set_cursor(Cursor::Pointer);
                if was_selected.len() == 1 {
                    ctx.enable_double_click_zoom();
                }
            }
            (false, true) => {
                ctx.select(&[id]);
                ctx.set_cursor(Cursor::Move);
            }
            (false, false) => {
                for prev in was_selected {
                    ctx.do_render(prev);
                }
                ctx.set_selected(&[id]);
                ctx.set_cursor(Cursor::Move);
            }
            (true, false) => {}
        }
        ctx.do_render(id);
        Flow::Render
    }

    // ─── Drag move and box select ────────────────────────────────────────

    fn note_drag_pan(&mut self, ctx: &mut ModeContext<'_>, _e: &MapEvent) -> Flow {
        self.initial_drag_pan = ctx.drag_pan_enabled();
        Flow::Render
    }

    fn start_on_active_feature(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) -> Flow {
        self.initial_drag_pan = ctx.drag_pan_enabled();
        self.stop_extended_interactions(ctx);
        ctx.set_drag_pan(false);
        if let Some(id) = e.target.as_ref().and_then(|t| t.properties.id) {
            ctx.do_render(id);
        }
        self.can_drag_move = true;
        self.drag_move_location = Some(e.lng_lat());
        Flow::Render
    }

    fn start_box_select(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) -> Flow {
        self.initial_drag_pan = ctx.drag_pan_enabled();
        if !ctx.options().box_select {
            return Flow::Render;
        }
        self.stop_extended_interactions(ctx);
        ctx.set_drag_pan(false);
        self.box_select_start = Some(e.point());
        self.can_box_select = true;
        Flow::Render
    }

    fn drag(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) -> Flow {
        if self.can_drag_move {
            self.drag_move(ctx, e);
        } else if ctx.options().box_select && self.can_box_select {
            self.while_box_select(ctx, e);
        }
        Flow::Render
    }

    fn while_box_select(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) {
        let Some(start) = self.box_select_start else {
            return;
        };
        self.box_selecting = true;
        ctx.set_cursor(Cursor::Add);
        ctx.show_box_select(Some(Rect::from_points(start, e.point())));
    }

    fn drag_move(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) {
        self.drag_moving = true;
        let here = e.lng_lat();
        let Some(from) = self.drag_move_location.replace(here) else {
            return;
        };
        let ids = ctx.selected_ids();
        ctx.move_features(&ids, Delta::new(here[0] - from[0], here[1] - from[1]));
    }

    fn end(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) -> Flow {
        if self.drag_moving {
            Self::fire_update(ctx);
        } else if self.box_selecting
            && let Some(start) = self.box_select_start
        {
            let hits = ctx.features_in_box(Rect::from_points(start, e.point()));
            let ids: IndexSet<FeatureId> = hits
                .iter()
                .filter_map(|f| f.properties.id)
                .filter(|id| !ctx.is_selected(*id))
                .collect();
            if !ids.is_empty() {
                let ids: Vec<FeatureId> = ids.into_iter().collect();
                ctx.select(&ids);
                for id in ids {
                    ctx.do_render(id);
                }
                ctx.set_cursor(Cursor::Move);
            }
        }
        self.stop_extended_interactions(ctx);
        Flow::Render
    }

    fn mouse_move(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) -> Flow {
        if is_feature(e) && self.drag_moving {
            Self::fire_update(ctx);
        }
        self.stop_extended_interactions(ctx);
        Flow::SkipRender
    }

    fn mouse_out(&mut self, ctx: &mut ModeContext<'_>, _e: &MapEvent) -> Flow {
        if self.drag_moving {
            Self::fire_update(ctx);
            return Flow::Render;
        }
        Flow::SkipRender
    }
}
