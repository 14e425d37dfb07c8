use gd_core::{
    Actions, CoordPath, DisplayFeature, DrawError, DrawEvent, Feature, FeatureId, Geometry,
    GeometryKind, Position, Properties,
};
use gd_render::{Control, create_vertex};

use super::selectors::{is_enter_key, is_escape_key, is_vertex};
use super::{Flow, Mode, ModeContext, ModeOptions, Registrar, SIMPLE_SELECT};
use crate::input::{EventClass, MapEvent};
use crate::ui::Cursor;

/// Which end of the line grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// Draws a line string, or extends an existing one from either end.
///
/// The vertex at `position` is the uncommitted one that follows the
/// pointer. Drawing backwards keeps it at index 0 and inserts committed
/// vertices in front of it.
#[derive(Debug)]
pub struct DrawLineString {
    line_id: FeatureId,
    position: usize,
    direction: Direction,
}

/// Where a continuation starts, given the line's vertices.
fn continuation(line: &[Position], from: Position) -> Option<(usize, Direction)> {
    let last = line.len().checked_sub(1)?;
    if line[last] == from {
        Some((last + 1, Direction::Forward))
    } else if line[0] == from {
        Some((0, Direction::Backward))
    } else {
        None
    }
}

fn line_vertices(feature: &Feature) -> Vec<Position> {
    match feature.get_coordinates() {
        Geometry::LineString(line) => line,
        _ => Vec::new(),
    }
}

impl Mode for DrawLineString {
    fn check_options(ctx: &ModeContext<'_>, options: &ModeOptions) -> Result<(), DrawError> {
        let Some(id) = options.feature_id else {
            return Ok(());
        };
        let feature = ctx
            .get_feature(id)
            .ok_or(DrawError::MissingFeatureId("draw_line_string"))?;
        if feature.kind() != GeometryKind::LineString {
            return Err(DrawError::GeometryMismatch {
                expected: GeometryKind::LineString.name(),
                found: feature.kind().name(),
            });
        }
        let from = options.from.ok_or(DrawError::InvalidContinuation)?;
        continuation(&line_vertices(feature), from).ok_or(DrawError::InvalidContinuation)?;
        Ok(())
    }

    fn setup(ctx: &mut ModeContext<'_>, options: ModeOptions) -> Result<Self, DrawError> {
        Self::check_options(ctx, &options)?;
        let (line_id, position, direction) = match (options.feature_id, options.from) {
            (Some(id), Some(from)) => {
                let vertices = ctx.get_feature(id).map(line_vertices).unwrap_or_default();
                let (position, direction) =
                    continuation(&vertices, from).ok_or(DrawError::InvalidContinuation)?;
                let [lng, lat] = from;
                ctx.edit_feature(id, |line| {
                    line.add_coordinate(&CoordPath::new(&[position]), lng, lat)
                });
                (id, position, direction)
            }
            _ => {
                let line = Feature::new(
                    FeatureId::generate(),
                    Properties::new(),
                    Geometry::LineString(Vec::new()),
                );
                (ctx.add_feature(line), 0, Direction::Forward)
            }
        };

        ctx.clear_selected_features();
        ctx.disable_double_click_zoom();
        ctx.set_cursor(Cursor::Add);
        ctx.activate_ui_button(Some(Control::LineString));
        ctx.set_actionable_state(Actions {
            trash: true,
            ..Actions::default()
        });
        Ok(Self {
            line_id,
            position,
            direction,
        })
    }

    fn register(on: &mut Registrar<Self>) {
        for class in [EventClass::Click, EventClass::Tap] {
            on.on_any(class, Self::click_anywhere);
            on.on(class, is_vertex, Self::finish);
        }
        on.on_any(EventClass::MouseMove, Self::mouse_move);
        on.on(EventClass::KeyUp, is_escape_key, Self::escape);
        on.on(EventClass::KeyUp, is_enter_key, Self::finish);
    }

    fn stop(&mut self, ctx: &mut ModeContext<'_>) {
        ctx.enable_double_click_zoom();
        ctx.activate_ui_button(None);
        let position = CoordPath::new(&[self.position]);
        let Some(valid) = ctx.edit_feature(self.line_id, |line| {
            line.remove_coordinate(&position);
            line.is_valid()
        }) else {
            return;
        };
        if valid {
            if let Some(line) = ctx.get_feature(self.line_id).map(Feature::to_geojson) {
                ctx.fire(DrawEvent::Create {
                    features: vec![line],
                });
            }
        } else {
            ctx.delete_features(&[self.line_id], true);
            ctx.change_mode_silent(SIMPLE_SELECT, ModeOptions::default());
        }
    }

    fn trash(&mut self, ctx: &mut ModeContext<'_>) {
        ctx.delete_features(&[self.line_id], true);
        ctx.change_mode(SIMPLE_SELECT, ModeOptions::default());
    }

    fn to_display_features(
        &self,
        _ctx: &mut ModeContext<'_>,
        mut feature: DisplayFeature,
        out: &mut Vec<DisplayFeature>,
    ) {
        let active = feature.properties.id == Some(self.line_id);
        feature.properties.active = active;
        if !active {
            out.push(feature);
            return;
        }
        let Geometry::LineString(line) = &feature.geometry else {
            return;
        };
        if line.len() < 2 {
            return;
        }
        // The last committed vertex, next to the one under the pointer.
        let anchor = match self.direction {
            Direction::Forward => line.len() - 2,
            Direction::Backward => 1,
        };
        out.push(create_vertex(
            self.line_id,
            line[anchor],
            CoordPath::new(&[anchor]),
            false,
        ));
        out.push(feature);
    }
}

impl DrawLineString {
    fn vertex(&self, ctx: &ModeContext<'_>, index: usize) -> Option<Position> {
        ctx.get_feature(self.line_id)?
            .get_coordinate(&CoordPath::new(&[index]))
    }

    fn click_anywhere(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) -> Flow {
        let previous = match self.direction {
            Direction::Forward => self.position.checked_sub(1),
            Direction::Backward => Some(self.position + 1),
        };
        let repeated = previous
            .and_then(|i| self.vertex(ctx, i))
            .is_some_and(|p| e.is_at(&p));
        if repeated {
            return self.finish(ctx, e);
        }

        ctx.set_cursor(Cursor::Add);
        let [lng, lat] = e.lng_lat();
        let cursor = CoordPath::new(&[self.position]);
        match self.direction {
            Direction::Forward => {
                self.position += 1;
                let next = CoordPath::new(&[self.position]);
                ctx.edit_feature(self.line_id, |line| {
                    line.update_coordinate(&cursor, lng, lat);
                    line.update_coordinate(&next, lng, lat);
                });
            }
            Direction::Backward => {
                ctx.edit_feature(self.line_id, |line| {
                    line.update_coordinate(&cursor, lng, lat);
                    line.add_coordinate(&CoordPath::new(&[0]), lng, lat);
                });
            }
        }
        Flow::Render
    }

    fn mouse_move(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) -> Flow {
        let [lng, lat] = e.lng_lat();
        let cursor = CoordPath::new(&[self.position]);
        ctx.edit_feature(self.line_id, |line| line.update_coordinate(&cursor, lng, lat));
        if is_vertex(e) {
            ctx.set_cursor(Cursor::Pointer);
        }
        Flow::Render
    }

    fn finish(&mut self, ctx: &mut ModeContext<'_>, _e: &MapEvent) -> Flow {
        ctx.change_mode(SIMPLE_SELECT, ModeOptions::select(&[self.line_id]));
        Flow::Render
    }

    fn escape(&mut self, ctx: &mut ModeContext<'_>, _e: &MapEvent) -> Flow {
        ctx.delete_features(&[self.line_id], true);
        ctx.change_mode(SIMPLE_SELECT, ModeOptions::default());
        Flow::Render
    }
}
