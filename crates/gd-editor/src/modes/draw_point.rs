use gd_core::{
    Actions, CoordPath, DisplayFeature, DrawError, DrawEvent, Feature, FeatureId, Geometry,
    Properties,
};
use gd_render::Control;

use super::selectors::{is_enter_key, is_escape_key};
use super::{Flow, Mode, ModeContext, ModeOptions, Registrar, SIMPLE_SELECT};
use crate::input::{EventClass, MapEvent};
use crate::ui::Cursor;

/// Places a single point. The placeholder feature exists from setup on but
/// is never rendered; it is discarded if the mode stops before a click.
#[derive(Debug)]
pub struct DrawPoint {
    point_id: FeatureId,
}

impl Mode for DrawPoint {
    fn setup(ctx: &mut ModeContext<'_>, _options: ModeOptions) -> Result<Self, DrawError> {
        let point = Feature::new(
            FeatureId::generate(),
            Properties::new(),
            Geometry::Point(None),
        );
        let point_id = ctx.add_feature(point);
        ctx.clear_selected_features();
        ctx.set_cursor(Cursor::Add);
        ctx.activate_ui_button(Some(Control::Point));
        ctx.set_actionable_state(Actions {
            trash: true,
            ..Actions::default()
        });
        Ok(Self { point_id })
    }

    fn register(on: &mut Registrar<Self>) {
        on.on_any(EventClass::Click, Self::place);
        on.on_any(EventClass::Tap, Self::place);
        on.on(
            EventClass::KeyUp,
            |e| is_escape_key(e) || is_enter_key(e),
            Self::abandon,
        );
    }

    fn stop(&mut self, ctx: &mut ModeContext<'_>) {
        ctx.activate_ui_button(None);
        let placed = ctx
            .get_feature(self.point_id)
            .is_none_or(|f| f.get_coordinate(&CoordPath::root()).is_some());
        if !placed {
            ctx.delete_features(&[self.point_id], true);
        }
    }

    fn trash(&mut self, ctx: &mut ModeContext<'_>) {
        self.discard(ctx);
    }

    fn to_display_features(
        &self,
        _ctx: &mut ModeContext<'_>,
        mut feature: DisplayFeature,
        out: &mut Vec<DisplayFeature>,
    ) {
        if feature.properties.id != Some(self.point_id) {
            feature.properties.active = false;
            out.push(feature);
        }
    }
}

impl DrawPoint {
    fn discard(&mut self, ctx: &mut ModeContext<'_>) {
        ctx.delete_features(&[self.point_id], true);
        ctx.change_mode(SIMPLE_SELECT, ModeOptions::default());
    }

    fn place(&mut self, ctx: &mut ModeContext<'_>, e: &MapEvent) -> Flow {
        ctx.set_cursor(Cursor::Move);
        let [lng, lat] = e.lng_lat();
        let created = ctx.edit_feature(self.point_id, |point| {
            point.update_coordinate(&CoordPath::root(), lng, lat);
            point.to_geojson()
        });
        if let Some(created) = created {
            ctx.fire(DrawEvent::Create {
                features: vec![created],
            });
        }
        ctx.change_mode(SIMPLE_SELECT, ModeOptions::select(&[self.point_id]));
        Flow::Render
    }

    fn abandon(&mut self, ctx: &mut ModeContext<'_>, _e: &MapEvent) -> Flow {
        self.discard(ctx);
        Flow::Render
    }
}
