//! Integration tests: pointer, touch and keyboard input driving the modes.
//!
//! Input goes through `Draw::handle` exactly as a host would send it, with
//! `tick()` standing in for the animation frame. The headless surface maps
//! screen px to degrees one to one.

use gd_core::{DrawEvent, FeatureId, Geometry, GeometryKind};
use gd_editor::{
    DIRECT_SELECT, DRAW_LINE_STRING, DRAW_POINT, DRAW_POLYGON, Draw, DrawError, DrawOptions,
    InputEvent, KeyInput, ModeOptions, Modifiers, PointerInput, SIMPLE_SELECT, UpdateAction,
};
use gd_render::{Control, HeadlessSurface, Interaction, MapSurface};
use pretty_assertions::assert_eq;
use serde_json::json;

fn session_with(options: DrawOptions) -> Draw<HeadlessSurface> {
    let _ = env_logger::builder().is_test(true).try_init();
    Draw::new(HeadlessSurface::new(), options).unwrap()
}

fn session() -> Draw<HeadlessSurface> {
    session_with(DrawOptions::default())
}

fn click(draw: &mut Draw<HeadlessSurface>, x: f64, y: f64) {
    let p = PointerInput::at(x, y);
    draw.handle(InputEvent::MouseDown(p.with_buttons(1))).unwrap();
    draw.handle(InputEvent::MouseUp(p)).unwrap();
    draw.tick();
}

fn shift_click(draw: &mut Draw<HeadlessSurface>, x: f64, y: f64) {
    let p = PointerInput::at(x, y).with_modifiers(Modifiers::SHIFT);
    draw.handle(InputEvent::MouseDown(p.with_buttons(1))).unwrap();
    draw.handle(InputEvent::MouseUp(p)).unwrap();
    draw.tick();
}

fn key(draw: &mut Draw<HeadlessSurface>, name: &str) {
    draw.handle(InputEvent::KeyDown(KeyInput::new(name))).unwrap();
    draw.handle(InputEvent::KeyUp(KeyInput::new(name))).unwrap();
    draw.tick();
}

fn created(draw: &Draw<HeadlessSurface>) -> Vec<Geometry> {
    draw.surface()
        .events()
        .iter()
        .filter_map(|e| match e {
            DrawEvent::Create { features } => Some(features.clone()),
            _ => None,
        })
        .flatten()
        .map(|f| f.geometry)
        .collect()
}

fn add_point(draw: &mut Draw<HeadlessSurface>, id: &str, x: f64, y: f64) -> FeatureId {
    draw.add(json!({"type": "Feature", "id": id, "geometry": {"type": "Point", "coordinates": [x, y]}}))
        .unwrap()[0]
}

// ─── Drawing ────────────────────────────────────────────────────────────

#[test]
fn polygon_from_three_clicks_and_enter() {
    let mut draw = session();
    draw.change_mode(DRAW_POLYGON, ModeOptions::default()).unwrap();
    draw.tick();

    click(&mut draw, 0.0, 0.0);
    click(&mut draw, 10.0, 0.0);
    click(&mut draw, 10.0, 10.0);
    draw.handle(InputEvent::KeyUp(KeyInput::new("Enter"))).unwrap();
    draw.tick();

    assert_eq!(
        created(&draw),
        vec![Geometry::Polygon(vec![vec![
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
            [0.0, 0.0],
        ]])]
    );
    assert_eq!(draw.get_mode(), SIMPLE_SELECT);
    assert_eq!(draw.get_selected_ids().len(), 1);
    assert!(
        draw.surface()
            .events()
            .iter()
            .any(|e| matches!(e, DrawEvent::ModeChange { mode } if mode == SIMPLE_SELECT))
    );
}

#[test]
fn polygon_preview_shows_a_line_before_the_third_vertex() {
    let mut draw = session();
    draw.change_mode(DRAW_POLYGON, ModeOptions::default()).unwrap();
    click(&mut draw, 0.0, 0.0);
    draw.handle(InputEvent::MouseMove(PointerInput::at(10.0, 0.0))).unwrap();
    draw.tick();

    let kinds: Vec<GeometryKind> = draw
        .surface()
        .hot()
        .iter()
        .map(|f| f.geometry.kind())
        .collect();
    assert_eq!(kinds, vec![GeometryKind::Point, GeometryKind::LineString]);
}

#[test]
fn escape_discards_the_polygon_silently() {
    let mut draw = session();
    draw.change_mode(DRAW_POLYGON, ModeOptions::default()).unwrap();
    click(&mut draw, 0.0, 0.0);
    click(&mut draw, 10.0, 0.0);
    draw.handle(InputEvent::KeyUp(KeyInput::new("Escape"))).unwrap();
    draw.tick();

    assert_eq!(draw.get_mode(), SIMPLE_SELECT);
    assert!(draw.get_all().features.is_empty());
    assert!(created(&draw).is_empty());
    assert!(!draw.surface().event_names().contains(&"draw.delete"));
}

#[test]
fn unfinished_polygon_is_dropped_on_mode_change() {
    let mut draw = session();
    draw.change_mode(DRAW_POLYGON, ModeOptions::default()).unwrap();
    click(&mut draw, 0.0, 0.0);
    click(&mut draw, 10.0, 0.0);

    draw.change_mode(DRAW_LINE_STRING, ModeOptions::default()).unwrap();
    assert_eq!(draw.get_mode(), DRAW_LINE_STRING);
    // Only the fresh line placeholder remains.
    let kinds: Vec<GeometryKind> = draw
        .get_all()
        .features
        .iter()
        .map(|f| f.geometry.kind())
        .collect();
    assert_eq!(kinds, vec![GeometryKind::LineString]);
    assert!(created(&draw).is_empty());
}

#[test]
fn double_click_zoom_is_suspended_while_drawing() {
    let mut draw = session();
    draw.change_mode(DRAW_LINE_STRING, ModeOptions::default()).unwrap();
    assert!(!draw.surface().interaction_enabled(Interaction::DoubleClickZoom));
    assert_eq!(draw.surface().active_button(), Some(Control::LineString));

    key(&mut draw, "Escape");
    assert!(draw.surface().interaction_enabled(Interaction::DoubleClickZoom));
    assert_eq!(draw.surface().active_button(), None);
}

#[test]
fn point_is_placed_by_a_tap() {
    let mut draw = session();
    draw.change_mode(DRAW_POINT, ModeOptions::default()).unwrap();
    let p = PointerInput::at(3.0, 4.0);
    draw.handle(InputEvent::TouchStart(p)).unwrap();
    draw.handle(InputEvent::TouchEnd(p.with_time(100))).unwrap();
    draw.tick();

    assert_eq!(created(&draw), vec![Geometry::Point(Some([3.0, 4.0]))]);
    assert_eq!(draw.get_mode(), SIMPLE_SELECT);
    let selected = draw.get_selected();
    assert_eq!(selected.features.len(), 1);
    assert_eq!(selected.features[0].geometry, Geometry::Point(Some([3.0, 4.0])));
}

#[test]
fn abandoned_point_leaves_nothing_behind() {
    let mut draw = session();
    draw.change_mode(DRAW_POINT, ModeOptions::default()).unwrap();
    assert_eq!(draw.get_all().features.len(), 1);
    draw.tick();
    // The placeholder is never drawn.
    assert!(draw.surface().hot().is_empty());
    assert!(draw.surface().cold().is_empty());

    draw.change_mode(SIMPLE_SELECT, ModeOptions::default()).unwrap();
    assert!(draw.get_all().features.is_empty());
}

#[test]
fn line_is_finished_by_clicking_the_last_vertex_again() {
    let mut draw = session();
    draw.change_mode(DRAW_LINE_STRING, ModeOptions::default()).unwrap();
    click(&mut draw, 0.0, 0.0);
    click(&mut draw, 5.0, 5.0);
    click(&mut draw, 5.0, 5.0);

    assert_eq!(
        created(&draw),
        vec![Geometry::LineString(vec![[0.0, 0.0], [5.0, 5.0]])]
    );
    assert_eq!(draw.get_mode(), SIMPLE_SELECT);
}

#[test]
fn line_continues_forward_from_its_last_vertex() {
    let mut draw = session();
    let road = draw
        .add(json!({"type": "Feature", "id": "road",
            "geometry": {"type": "LineString", "coordinates": [[0, 0], [10, 0]]}}))
        .unwrap()[0];
    draw.change_mode(DRAW_LINE_STRING, ModeOptions::continue_line(road, [10.0, 0.0]))
        .unwrap();
    click(&mut draw, 20.0, 0.0);
    draw.handle(InputEvent::KeyUp(KeyInput::new("Enter"))).unwrap();

    assert_eq!(
        draw.get(road).unwrap().geometry,
        Geometry::LineString(vec![[0.0, 0.0], [10.0, 0.0], [20.0, 0.0]])
    );
    assert_eq!(draw.get_selected_ids(), vec![road]);
}

#[test]
fn line_continues_backward_from_its_first_vertex() {
    let mut draw = session();
    let road = draw
        .add(json!({"type": "Feature", "id": "road",
            "geometry": {"type": "LineString", "coordinates": [[0, 0], [10, 0]]}}))
        .unwrap()[0];
    draw.change_mode(DRAW_LINE_STRING, ModeOptions::continue_line(road, [0.0, 0.0]))
        .unwrap();
    click(&mut draw, -10.0, 0.0);
    draw.handle(InputEvent::KeyUp(KeyInput::new("Enter"))).unwrap();

    assert_eq!(
        draw.get(road).unwrap().geometry,
        Geometry::LineString(vec![[-10.0, 0.0], [0.0, 0.0], [10.0, 0.0]])
    );
}

#[test]
fn continuation_must_start_at_an_endpoint() {
    let mut draw = session();
    let road = draw
        .add(json!({"type": "Feature", "id": "road",
            "geometry": {"type": "LineString", "coordinates": [[0, 0], [10, 0]]}}))
        .unwrap()[0];
    match draw.change_mode(DRAW_LINE_STRING, ModeOptions::continue_line(road, [5.0, 5.0])) {
        Err(DrawError::InvalidContinuation) => {}
        other => panic!("expected InvalidContinuation, got {other:?}"),
    }
    assert_eq!(draw.get_mode(), SIMPLE_SELECT);
}

// ─── Selecting and moving ───────────────────────────────────────────────

#[test]
fn click_selects_and_empty_click_clears() {
    let mut draw = session();
    let a = add_point(&mut draw, "a", 5.0, 5.0);
    let b = add_point(&mut draw, "b", 20.0, 20.0);
    draw.tick();

    click(&mut draw, 5.0, 5.0);
    assert_eq!(draw.get_selected_ids(), vec![a]);
    assert!(draw.surface().event_names().contains(&"draw.selectionchange"));

    shift_click(&mut draw, 20.0, 20.0);
    assert_eq!(draw.get_selected_ids(), vec![a, b]);

    shift_click(&mut draw, 5.0, 5.0);
    assert_eq!(draw.get_selected_ids(), vec![b]);

    click(&mut draw, 50.0, 50.0);
    assert!(draw.get_selected_ids().is_empty());
}

#[test]
fn dragging_a_selected_point_moves_it() {
    let mut draw = session();
    let pin = add_point(&mut draw, "pin", 5.0, 5.0);
    draw.tick();
    click(&mut draw, 5.0, 5.0);
    draw.surface_mut().take_events();

    let start = PointerInput::at(5.0, 5.0).with_buttons(1);
    draw.handle(InputEvent::MouseDown(start)).unwrap();
    assert!(!draw.surface().interaction_enabled(Interaction::DragPan));
    draw.handle(InputEvent::MouseMove(PointerInput::at(20.0, 5.0).with_buttons(1).with_time(50)))
        .unwrap();
    draw.handle(InputEvent::MouseMove(PointerInput::at(25.0, 8.0).with_buttons(1).with_time(80)))
        .unwrap();
    draw.handle(InputEvent::MouseUp(PointerInput::at(25.0, 8.0).with_time(100)))
        .unwrap();
    draw.tick();

    assert_eq!(draw.get(pin).unwrap().geometry, Geometry::Point(Some([25.0, 8.0])));
    assert!(draw.surface().interaction_enabled(Interaction::DragPan));
    let updates: Vec<UpdateAction> = draw
        .surface()
        .events()
        .iter()
        .filter_map(|e| match e {
            DrawEvent::Update { action, .. } => Some(*action),
            _ => None,
        })
        .collect();
    assert_eq!(updates, vec![UpdateAction::Move]);
}

#[test]
fn small_jitter_stays_a_click() {
    let mut draw = session();
    let pin = add_point(&mut draw, "pin", 5.0, 5.0);
    draw.tick();
    click(&mut draw, 5.0, 5.0);

    draw.handle(InputEvent::MouseDown(PointerInput::at(5.0, 5.0).with_buttons(1)))
        .unwrap();
    draw.handle(InputEvent::MouseMove(PointerInput::at(6.0, 6.0).with_buttons(1).with_time(20)))
        .unwrap();
    draw.tick();
    assert_eq!(draw.get(pin).unwrap().geometry, Geometry::Point(Some([5.0, 5.0])));
}

#[test]
fn shift_drag_box_selects_what_it_touches() {
    let mut draw = session();
    let a = add_point(&mut draw, "a", 5.0, 5.0);
    let b = add_point(&mut draw, "b", 8.0, 12.0);
    add_point(&mut draw, "far", 40.0, 40.0);
    draw.tick();

    let shift = Modifiers::SHIFT;
    draw.handle(InputEvent::MouseDown(
        PointerInput::at(0.0, 0.0).with_buttons(1).with_modifiers(shift),
    ))
    .unwrap();
    draw.handle(InputEvent::MouseMove(
        PointerInput::at(15.0, 15.0).with_buttons(1).with_modifiers(shift).with_time(300),
    ))
    .unwrap();
    assert!(draw.surface().box_select().is_some());
    draw.handle(InputEvent::MouseUp(
        PointerInput::at(15.0, 15.0).with_modifiers(shift).with_time(600),
    ))
    .unwrap();
    draw.tick();

    let mut selected = draw.get_selected_ids();
    selected.sort_by_key(|id| id.as_str());
    assert_eq!(selected, vec![a, b]);
    assert!(draw.surface().box_select().is_none());
}

#[test]
fn clicking_a_selected_line_enters_direct_select() {
    let mut draw = session();
    let road = draw
        .add(json!({"type": "Feature", "id": "road",
            "geometry": {"type": "LineString", "coordinates": [[0, 0], [20, 0]]}}))
        .unwrap()[0];
    draw.tick();

    click(&mut draw, 10.0, 0.0);
    assert_eq!(draw.get_selected_ids(), vec![road]);
    click(&mut draw, 10.0, 0.0);
    assert_eq!(draw.get_mode(), DIRECT_SELECT);
}

#[test]
fn direct_select_drags_a_vertex_and_trashes_it() {
    let mut draw = session();
    let road = draw
        .add(json!({"type": "Feature", "id": "road",
            "geometry": {"type": "LineString", "coordinates": [[0, 0], [20, 0], [40, 0]]}}))
        .unwrap()[0];
    draw.change_mode(DIRECT_SELECT, ModeOptions::edit(road)).unwrap();
    draw.tick();

    // Press on the middle vertex marker and drag it north.
    draw.handle(InputEvent::MouseDown(PointerInput::at(20.0, 0.0).with_buttons(1)))
        .unwrap();
    draw.handle(InputEvent::MouseMove(PointerInput::at(20.0, 15.0).with_buttons(1).with_time(40)))
        .unwrap();
    draw.handle(InputEvent::MouseUp(PointerInput::at(20.0, 15.0).with_time(60)))
        .unwrap();
    draw.tick();
    assert_eq!(
        draw.get(road).unwrap().geometry,
        Geometry::LineString(vec![[0.0, 0.0], [20.0, 15.0], [40.0, 0.0]])
    );
    assert_eq!(
        draw.get_selected_points().features[0].geometry,
        Geometry::Point(Some([20.0, 15.0]))
    );

    draw.trash().unwrap();
    draw.tick();
    assert_eq!(
        draw.get(road).unwrap().geometry,
        Geometry::LineString(vec![[0.0, 0.0], [40.0, 0.0]])
    );
    assert_eq!(
        update_actions(&draw),
        vec![UpdateAction::ChangeCoordinates, UpdateAction::ChangeCoordinates]
    );
}

fn update_actions(draw: &Draw<HeadlessSurface>) -> Vec<UpdateAction> {
    draw.surface()
        .events()
        .iter()
        .filter_map(|e| match e {
            DrawEvent::Update { action, .. } => Some(*action),
            _ => None,
        })
        .collect()
}

#[test]
fn pressing_the_closing_edge_midpoint_inserts_a_vertex() {
    let mut draw = session();
    let lot = draw
        .add(json!({"type": "Feature", "id": "lot", "geometry": {"type": "Polygon",
            "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]]}}))
        .unwrap()[0];
    draw.change_mode(DIRECT_SELECT, ModeOptions::edit(lot)).unwrap();
    draw.tick();
    draw.surface_mut().take_events();

    click(&mut draw, 0.0, 5.0);

    assert_eq!(
        draw.get(lot).unwrap().geometry,
        Geometry::Polygon(vec![vec![
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
            [0.0, 10.0],
            [0.0, 5.0],
            [0.0, 0.0],
        ]])
    );
    assert_eq!(update_actions(&draw), vec![UpdateAction::ChangeCoordinates]);

    let points = draw.get_selected_points();
    assert_eq!(points.features.len(), 1);
    assert_eq!(points.features[0].geometry, Geometry::Point(Some([0.0, 5.0])));
}

#[test]
fn midpoint_insert_lands_in_the_pressed_multi_polygon_part() {
    let mut draw = session();
    let parcels = draw
        .add(json!({"type": "Feature", "id": "parcels", "geometry": {"type": "MultiPolygon",
            "coordinates": [
                [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]],
                [[[30, 0], [40, 0], [40, 10], [30, 10], [30, 0]]]
            ]}}))
        .unwrap()[0];
    draw.change_mode(DIRECT_SELECT, ModeOptions::edit(parcels)).unwrap();
    draw.tick();
    draw.surface_mut().take_events();

    click(&mut draw, 35.0, 0.0);

    match draw.get(parcels).unwrap().geometry {
        Geometry::MultiPolygon(polys) => {
            assert_eq!(
                polys[0],
                vec![vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]]]
            );
            assert_eq!(
                polys[1],
                vec![vec![
                    [30.0, 0.0],
                    [35.0, 0.0],
                    [40.0, 0.0],
                    [40.0, 10.0],
                    [30.0, 10.0],
                    [30.0, 0.0],
                ]]
            );
        }
        other => panic!("expected MultiPolygon, got {other:?}"),
    }
    assert_eq!(update_actions(&draw), vec![UpdateAction::ChangeCoordinates]);
    assert_eq!(
        draw.get_selected_points().features[0].geometry,
        Geometry::Point(Some([35.0, 0.0]))
    );
}

#[test]
fn trashing_below_validity_deletes_the_feature() {
    let mut draw = session();
    let road = draw
        .add(json!({"type": "Feature", "id": "road",
            "geometry": {"type": "LineString", "coordinates": [[0, 0], [20, 0]]}}))
        .unwrap()[0];
    draw.change_mode(
        DIRECT_SELECT,
        ModeOptions {
            feature_id: Some(road),
            coord_path: Some("0".parse().unwrap()),
            ..ModeOptions::default()
        },
    )
    .unwrap();

    draw.trash().unwrap();
    draw.tick();
    assert!(draw.get(road).is_none());
    assert_eq!(draw.get_mode(), SIMPLE_SELECT);
    assert!(draw.surface().event_names().contains(&"draw.delete"));
}

// ─── Keyboard ───────────────────────────────────────────────────────────

#[test]
fn digit_keys_switch_to_draw_modes() {
    let mut draw = session();
    key(&mut draw, "3");
    assert_eq!(draw.get_mode(), DRAW_POLYGON);
    key(&mut draw, "Escape");
    key(&mut draw, "2");
    assert_eq!(draw.get_mode(), DRAW_LINE_STRING);
    key(&mut draw, "Escape");
    key(&mut draw, "1");
    assert_eq!(draw.get_mode(), DRAW_POINT);

    let modes: Vec<&str> = draw
        .surface()
        .events()
        .iter()
        .filter_map(|e| match e {
            DrawEvent::ModeChange { mode } => Some(mode.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        modes,
        vec![DRAW_POLYGON, SIMPLE_SELECT, DRAW_LINE_STRING, SIMPLE_SELECT, DRAW_POINT]
    );
}

#[test]
fn disabled_controls_ignore_their_shortcuts() {
    let options = DrawOptions::from_json(r#"{"controls": {"polygon": false, "trash": false}}"#).unwrap();
    let mut draw = session_with(options);
    key(&mut draw, "3");
    assert_eq!(draw.get_mode(), SIMPLE_SELECT);

    let pin = add_point(&mut draw, "pin", 1.0, 1.0);
    draw.change_mode(SIMPLE_SELECT, ModeOptions::select(&[pin])).unwrap();
    key(&mut draw, "Backspace");
    assert!(draw.get(pin).is_some());
}

#[test]
fn backspace_trashes_the_selection() {
    let mut draw = session();
    let pin = add_point(&mut draw, "pin", 1.0, 1.0);
    draw.change_mode(SIMPLE_SELECT, ModeOptions::select(&[pin])).unwrap();
    draw.tick();
    draw.surface_mut().take_events();

    key(&mut draw, "Backspace");
    assert!(draw.get(pin).is_none());
    assert!(draw.surface().event_names().contains(&"draw.delete"));
}

#[test]
fn keys_off_the_canvas_and_with_keybindings_off_are_ignored() {
    let mut draw = session();
    let mut off_canvas = KeyInput::new("3");
    off_canvas.on_canvas = false;
    draw.handle(InputEvent::KeyDown(off_canvas)).unwrap();
    assert_eq!(draw.get_mode(), SIMPLE_SELECT);

    let options = DrawOptions {
        keybindings: false,
        ..DrawOptions::default()
    };
    let mut draw = session_with(options);
    key(&mut draw, "3");
    assert_eq!(draw.get_mode(), SIMPLE_SELECT);
}

#[test]
fn touch_is_ignored_when_disabled() {
    let options = DrawOptions {
        touch_enabled: false,
        ..DrawOptions::default()
    };
    let mut draw = session_with(options);
    draw.change_mode(DRAW_POINT, ModeOptions::default()).unwrap();
    let p = PointerInput::at(3.0, 4.0);
    draw.handle(InputEvent::TouchStart(p)).unwrap();
    draw.handle(InputEvent::TouchEnd(p)).unwrap();
    assert_eq!(draw.get_mode(), DRAW_POINT);
    assert!(created(&draw).is_empty());
}

// ─── Cursor classes ─────────────────────────────────────────────────────

#[test]
fn hovering_updates_map_classes() {
    let mut draw = session();
    add_point(&mut draw, "pin", 5.0, 5.0);
    draw.tick();

    draw.handle(InputEvent::MouseMove(PointerInput::at(5.0, 5.0))).unwrap();
    let classes = draw.surface().classes();
    assert!(classes.contains(&"mouse-pointer"), "{classes:?}");
    assert!(classes.contains(&"feature-feature"), "{classes:?}");
    assert!(classes.contains(&"mode-simple_select"), "{classes:?}");

    draw.handle(InputEvent::MouseMove(PointerInput::at(50.0, 50.0))).unwrap();
    assert!(draw.surface().classes().contains(&"mouse-none"));

    draw.change_mode(DRAW_POLYGON, ModeOptions::default()).unwrap();
    draw.handle(InputEvent::MouseMove(PointerInput::at(50.0, 50.0))).unwrap();
    assert!(draw.surface().classes().contains(&"mouse-add"));
}
