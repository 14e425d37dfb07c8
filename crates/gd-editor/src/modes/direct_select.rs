//! Editing the vertices of one feature.

use gd_core::{
    Actions, CoordPath, DisplayFeature, DrawError, FeatureId, Geometry, GeometryKind, Position,
    UpdateAction,
};
use gd_render::{SupplementaryOptions, create_supplementary_points};

use super::selectors::{
    is_active_feature, is_inactive_feature, is_midpoint, is_shift_down, is_vertex, no_target,
};
use super::{Flow, Mode, ModeContext, ModeOptions, Registrar, SIMPLE_SELECT};
use crate::input::{EventClass, MapEvent};
use crate::movement::Delta;
use crate::ui::Cursor;

#[derive(Debug)]
pub struct DirectSelect {
    feature_id: FeatureId,
    drag_move_location: Option<Position>,
    drag_moving: bool,
    can_drag_move: bool,
    selected_coord_paths: Vec<CoordPath>,
    initial_drag_pan: bool,
}

impl Mode for DirectSelect {
    fn check_options(ctx: &ModeContext<'_>, options: &ModeOptions) -> Result<(), DrawError> {
        let feature = options
            .feature_id
            .and_then(|id| ctx.get_feature(id))
            .ok_or(DrawError::MissingFeatureId("direct_select"))?;
        if feature.kind() == GeometryKind::Point {
            return Err(DrawError::DirectSelectPoint);
        }
        Ok(())
    }

    fn setup(ctx: &mut ModeContext<'_>, options: ModeOptions) -> Result<Self, DrawError> {
        Self::check_options(ctx, &options)?;
        let feature_id = options
            .feature_id
            .ok_or(DrawError::MissingFeatureId("direct_select"))?;
        let selected_coord_paths: Vec<CoordPath> = options.coord_path.into_iter().collect();

        ctx.set_selected_coordinates(feature_id, &selected_coord_paths);
        ctx.set_selected(&[feature_id]);
        ctx.disable_double_click_zoom();
        ctx.set_actionable_state(Actions {
            trash: true,
            ..Actions::default()
        });

        Ok(Self {
            feature_id,
            drag_move_location: options.start_pos,
            drag_moving: false,
            can_drag_move: false,
            selected_coord_paths,
            initial_drag_pan: ctx.drag_pan_enabled(),
        })
    }

    fn register(on: &mut Registrar<Self>) {
        for class in [EventClass::MouseDown, EventClass::TouchStart] {
            on.on(class, is_midpoint, Self::on_midpoint);
            on.on(class, is_active_feature, Self::on_feature);
            on.on(class, is_vertex, Self::on_vertex);
        }
        on.on_any(EventClass::Click, Self::release);
        for class in [EventClass::Click, EventClass::Tap] {
            on.on(class, is_inactive_feature, Self::click_inactive);
            on.on(class, is_active_feature, Self::click_active_feature);
            on.on(class, no_target, Self::click_no_target);
        }
        on.on_any(EventClass::Drag, Self::drag);
        on.on_any(EventClass::MouseUp, Self::end);
        on.on_any(EventClass::TouchEnd, Self::end);
        on.on_any(EventClass::MouseMove, Self::mouse_move);
        on.on_any(EventClass::MouseOut, Self::mouse_out);
    }

    fn stop(&mut self, ctx: &mut ModeContext<'_>) {
        ctx.enable_double_click_zoom();
        ctx.clear_selected_coordinates();
    }

    /// Remove the selected vertices, highest path first so the remaining
    /// paths stay valid.
    fn trash(&mut self, ctx: &mut ModeContext<'_>) {
        let mut paths = std::mem::take(&mut self.selected_coord_paths);
        paths.sort_unstable_by(|a, b| b.cmp(a));
        ctx.edit_feature(self.feature_id, |feature| {
            for path in &paths {
                feature.remove_coordinate(path);
            }
        });
        self.fire_update(ctx);
        ctx.clear_selected_coordinates();
        self.fire_actionable(ctx);

        let valid = ctx
            .get_feature(self.feature_id)
            .is_some_and(|f| f.is_valid());
        if !valid {
            ctx.delete_features(&[self.feature_id], false);
            ctx.change_mode(SIMPLE_SELECT, ModeOptions::default());
        }
    }

    fn to_display_features(
        &self,
        ctx: &mut ModeContext<'_>,
        mut feature: DisplayFeature,
        out: &mut Vec<DisplayFeature>,
    ) {
        if feature.properties.id == Some(self.feature_id) {
            feature.properties.active = true;
            let markers = create_supplementary_points(
                &feature,
                SupplementaryOptions {
                    midpoints: true,
                    selected_paths: &self.selected_coord_paths,
                },
            );
            out.push(feature);
            out.extend(markers);
        } else {
            feature.properties.active = false;
            out.push(feature);
        }
        self.fire_actionable(ctx);
    }
}

impl DirectSelect {
    fn fire_update(&self, ctx: &mut ModeContext<'_>) {
        let ids = ctx.selected_ids();
        ctx.fire_update(UpdateAction::ChangeCoordinates, &ids);
    }

    fn fire_actionable(&self, ctx: &mut ModeContext<'_>) {
        ctx.set_actionable_state(Actions {
            trash: !self.selected_coord_paths.is_empty(),
            ..Actions::default()
        });
    }

    fn start_dragging(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) {
        self.initial_drag_pan = ctx.drag_pan_enabled();
        ctx.set_drag_pan(false);
        self.can_drag_move = true;
        self.drag_move_location = Some(e.lng_lat());
    }

    fn stop_dragging(&mut self, ctx: &mut ModeContext<'_>) {
        if self.can_drag_move && self.initial_drag_pan {
            ctx.set_drag_pan(true);
        }
        self.drag_moving = false;
        self.can_drag_move = false;
        self.drag_move_location = None;
    }

    // ─── Press ───────────────────────────────────────────────────────────

    fn on_vertex(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) -> Flow {
        self.start_dragging(ctx, e);
        let Some(path) = e.target.as_ref().and_then(|t| t.properties.coord_path.clone()) else {
            return Flow::Render;
        };
        if !self.selected_coord_paths.contains(&path) {
            if is_shift_down(e) {
                self.selected_coord_paths.push(path);
            } else {
                self.selected_coord_paths = vec![path];
            }
        }
        ctx.set_selected_coordinates(self.feature_id, &self.selected_coord_paths);
        Flow::Render
    }

    fn on_midpoint(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) -> Flow {
        self.start_dragging(ctx, e);
        let Some(target) = &e.target else {
            return Flow::Render;
        };
        let (Some(path), Some([lng, lat])) =
            (target.properties.coord_path.clone(), target.properties.lng_lat)
        else {
            return Flow::Render;
        };
        ctx.edit_feature(self.feature_id, |f| f.add_coordinate(&path, lng, lat));
        self.fire_update(ctx);
        self.selected_coord_paths = vec![path];
        ctx.set_selected_coordinates(self.feature_id, &self.selected_coord_paths);
        Flow::Render
    }

    fn on_feature(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) -> Flow {
        if self.selected_coord_paths.is_empty() {
            self.start_dragging(ctx, e);
        } else {
            self.stop_dragging(ctx);
        }
        Flow::Render
    }

    // ─── Drag ────────────────────────────────────────────────────────────

    fn drag(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) -> Flow {
        if !self.can_drag_move {
            return Flow::Render;
        }
        self.drag_moving = true;
        let here = e.lng_lat();
        let Some(from) = self.drag_move_location.replace(here) else {
            return Flow::Render;
        };
        let delta = Delta::new(here[0] - from[0], here[1] - from[1]);
        if self.selected_coord_paths.is_empty() {
            let ids = ctx.selected_ids();
            ctx.move_features(&ids, delta);
        } else {
            self.drag_vertex(ctx, delta);
        }
        Flow::Render
    }

    fn drag_vertex(&mut self, ctx: &mut ModeContext<'_>, delta: Delta) {
        let Some(feature) = ctx.get_feature(self.feature_id) else {
            return;
        };
        let vertices: Vec<(CoordPath, Position)> = self
            .selected_coord_paths
            .iter()
            .filter_map(|p| Some((p.clone(), feature.get_coordinate(p)?)))
            .collect();
        let points: Vec<Geometry> = vertices
            .iter()
            .map(|(_, p)| Geometry::Point(Some(*p)))
            .collect();
        let delta = ctx.constrain(&points, delta);
        ctx.edit_feature(self.feature_id, |feature| {
            for (path, [lng, lat]) in &vertices {
                feature.update_coordinate(path, lng + delta.lng, lat + delta.lat);
            }
        });
    }

    fn end(&mut self, ctx: &mut ModeContext<'_>, _e: &MapEvent) -> Flow {
        if self.drag_moving {
            self.fire_update(ctx);
        }
        self.stop_dragging(ctx);
        Flow::Render
    }

    // ─── Clicks ──────────────────────────────────────────────────────────

    fn release(&mut self, ctx: &mut ModeContext<'_>, _e: &MapEvent) -> Flow {
        self.stop_dragging(ctx);
        Flow::Render
    }

    fn click_no_target(&mut self, ctx: &mut ModeContext<'_>, _e: &MapEvent) -> Flow {
        ctx.change_mode(SIMPLE_SELECT, ModeOptions::default());
        Flow::Render
    }

    fn click_inactive(&mut self, ctx: &mut ModeContext<'_>, _e: &MapEvent) -> Flow {
        ctx.change_mode(SIMPLE_SELECT, ModeOptions::default());
        Flow::Render
    }

    fn click_active_feature(&mut self, ctx: &mut ModeContext<'_>, _e: &MapEvent) -> Flow {
        self.selected_coord_paths.clear();
        ctx.clear_selected_coordinates();
        ctx.do_render(self.feature_id);
        Flow::Render
    }

    // ─── Hover ───────────────────────────────────────────────────────────

    fn mouse_move(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) -> Flow {
        let on_feature = is_active_feature(e);
        let on_vertex = is_vertex(e);
        let no_coords = self.selected_coord_paths.is_empty();
        let cursor = if (on_feature && no_coords) || (on_vertex && !no_coords) {
            Cursor::Move
        } else {
            Cursor::None
        };
        ctx.set_cursor(cursor);

        let draggable = on_vertex || on_feature || is_midpoint(e);
        if draggable && self.drag_moving {
            self.fire_update(ctx);
        }
        self.stop_dragging(ctx);
        Flow::SkipRender
    }

    fn mouse_out(&mut self, ctx: &mut ModeContext<'_>, _e: &MapEvent) -> Flow {
        if self.drag_moving {
            self.fire_update(ctx);
        }
        Flow::SkipRender
    }
}
