use gd_core::{
    Actions, CoordPath, DisplayFeature, DrawError, DrawEvent, Feature, FeatureId, Geometry,
    Position, Properties,
};
use gd_render::{Control, create_vertex};

use super::selectors::{is_enter_key, is_escape_key, is_vertex};
use super::{Flow, Mode, ModeContext, ModeOptions, Registrar, SIMPLE_SELECT};
use crate::input::{EventClass, MapEvent};
use crate::ui::Cursor;

/// Draws a single-ring polygon, one click per vertex.
///
/// The ring is kept here rather than read back from the feature: a polygon
/// with fewer than three vertices is invalid, and path edits on an invalid
/// polygon are ignored. The vertex at `position` is the uncommitted one that
/// follows the pointer.
#[derive(Debug)]
pub struct DrawPolygon {
    polygon_id: FeatureId,
    ring: Vec<Position>,
    position: usize,
}

impl Mode for DrawPolygon {
    fn setup(ctx: &mut ModeContext<'_>, _options: ModeOptions) -> Result<Self, DrawError> {
        let polygon = Feature::new(
            FeatureId::generate(),
            Properties::new(),
            Geometry::Polygon(vec![Vec::new()]),
        );
        let polygon_id = ctx.add_feature(polygon);
        ctx.clear_selected_features();
        ctx.disable_double_click_zoom();
        ctx.set_cursor(Cursor::Add);
        ctx.activate_ui_button(Some(Control::Polygon));
        ctx.set_actionable_state(Actions {
            trash: true,
            ..Actions::default()
        });
        Ok(Self {
            polygon_id,
            ring: Vec::new(),
            position: 0,
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

    /// Commit the committed vertices, or discard the feature if they do not
    /// make a valid polygon.
    fn stop(&mut self, ctx: &mut ModeContext<'_>) {
        ctx.set_cursor(Cursor::None);
        ctx.enable_double_click_zoom();
        ctx.activate_ui_button(None);
        if ctx.get_feature(self.polygon_id).is_none() {
            return;
        }

        self.ring.truncate(self.position);
        self.sync(ctx);
        let committed = ctx
            .get_feature(self.polygon_id)
            .filter(|f| f.is_valid())
            .map(Feature::to_geojson);
        match committed {
            Some(feature) => ctx.fire(DrawEvent::Create {
                features: vec![feature],
            }),
            None => {
                ctx.delete_features(&[self.polygon_id], true);
                ctx.change_mode_silent(SIMPLE_SELECT, ModeOptions::default());
            }
        }
    }

    fn trash(&mut self, ctx: &mut ModeContext<'_>) {
        ctx.delete_features(&[self.polygon_id], true);
        ctx.change_mode(SIMPLE_SELECT, ModeOptions::default());
    }

    fn to_display_features(
        &self,
        _ctx: &mut ModeContext<'_>,
        mut feature: DisplayFeature,
        out: &mut Vec<DisplayFeature>,
    ) {
        let active = feature.properties.id == Some(self.polygon_id);
        feature.properties.active = active;
        if !active {
            out.push(feature);
            return;
        }

        // Closed ring: the count includes the repeated first vertex.
        let ring = match &feature.geometry {
            Geometry::Polygon(rings) => rings.first().cloned().unwrap_or_default(),
            _ => return,
        };
        let count = ring.len();
        if count < 3 {
            return;
        }
        out.push(create_vertex(
            self.polygon_id,
            ring[0],
            CoordPath::new(&[0, 0]),
            false,
        ));
        if count > 3 {
            let end = count - 3;
            out.push(create_vertex(
                self.polygon_id,
                ring[end],
                CoordPath::new(&[0, end]),
                false,
            ));
        }
        if count <= 4 {
            out.push(DisplayFeature::new(
                Geometry::LineString(vec![ring[0], ring[1]]),
                feature.properties.clone(),
            ));
            if count == 3 {
                return;
            }
        }
        out.push(feature);
    }
}

impl DrawPolygon {
    fn write(&mut self, index: usize, position: Position) {
        match self.ring.get_mut(index) {
            Some(slot) => *slot = position,
            None => self.ring.push(position),
        }
    }

    fn sync(&self, ctx: &mut ModeContext<'_>) {
        let ring = self.ring.clone();
        if let Some(Err(err)) = ctx.edit_feature(self.polygon_id, |f| {
            f.set_coordinates(Geometry::Polygon(vec![ring]))
        }) {
            log::warn!("polygon {} rejected ring: {err}", self.polygon_id);
        }
    }

    fn click_anywhere(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) -> Flow {
        let repeated = self
            .position
            .checked_sub(1)
            .and_then(|i| self.ring.get(i))
            .is_some_and(|last| e.is_at(last));
        if repeated {
            return self.finish(ctx, e);
        }
        ctx.set_cursor(Cursor::Add);
        let here = e.lng_lat();
        self.write(self.position, here);
        self.position += 1;
        self.write(self.position, here);
        self.sync(ctx);
        Flow::Render
    }

    fn mouse_move(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) -> Flow {
        self.write(self.position, e.lng_lat());
        self.sync(ctx);
        if is_vertex(e) {
            ctx.set_cursor(Cursor::Pointer);
        }
        Flow::Render
    }

    fn finish(&mut self, ctx: &mut ModeContext<'_>, _e: &MapEvent) -> Flow {
        ctx.change_mode(SIMPLE_SELECT, ModeOptions::select(&[self.polygon_id]));
        Flow::Render
    }

    fn escape(&mut self, ctx: &mut ModeContext<'_>, _e: &MapEvent) -> Flow {
        ctx.delete_features(&[self.polygon_id], true);
        ctx.change_mode(SIMPLE_SELECT, ModeOptions::default());
        Flow::Render
    }
}
