//! Drives a headless session through a short scripted edit and prints every
//! notification the host would receive, one JSON line each.
//!
//! Run with `RUST_LOG=gd_editor=debug` to see mode transitions.

use gd_editor::{
    Draw, DrawError, DrawOptions, HeadlessSurface, InputEvent, KeyInput, PointerInput,
};

fn press(draw: &mut Draw<HeadlessSurface>, x: f64, y: f64, time: u64) -> Result<(), DrawError> {
    let p = PointerInput::at(x, y).with_time(time);
    draw.handle(InputEvent::MouseDown(p.with_buttons(1)))?;
    draw.handle(InputEvent::MouseUp(p))?;
    draw.tick();
    Ok(())
}

fn main() -> Result<(), DrawError> {
    env_logger::init();

    let mut draw = Draw::new(HeadlessSurface::new(), DrawOptions::default())?;

    // Draw a triangle with the polygon shortcut.
    draw.handle(InputEvent::KeyDown(KeyInput::new("3")))?;
    for (i, (x, y)) in [(0.0, 0.0), (40.0, 0.0), (20.0, 30.0)].into_iter().enumerate() {
        draw.handle(InputEvent::MouseMove(PointerInput::at(x, y)))?;
        press(&mut draw, x, y, i as u64 * 1000)?;
    }
    draw.handle(InputEvent::KeyUp(KeyInput::new("Enter")))?;
    draw.tick();

    // Drag the selected triangle east.
    let t = 10_000;
    draw.handle(InputEvent::MouseDown(
        PointerInput::at(20.0, 10.0).with_buttons(1).with_time(t),
    ))?;
    for step in 1..=5u32 {
        let x = 20.0 + f64::from(step) * 4.0;
        draw.handle(InputEvent::MouseMove(
            PointerInput::at(x, 10.0)
                .with_buttons(1)
                .with_time(t + u64::from(step) * 16),
        ))?;
    }
    draw.handle(InputEvent::MouseUp(PointerInput::at(40.0, 10.0).with_time(t + 200)))?;
    draw.tick();

    // Deselect and throw it away.
    press(&mut draw, 80.0, 80.0, 20_000)?;
    let ids: Vec<_> = draw.get_all().features.iter().filter_map(|f| f.id).collect();
    draw.delete(&ids)?;
    draw.tick();

    for event in draw.surface_mut().take_events() {
        let body = serde_json::to_string(&event).unwrap_or_default();
        println!("{:<20} {body}", event.name());
    }
    println!("mode: {}", draw.get_mode());
    Ok(())
}
