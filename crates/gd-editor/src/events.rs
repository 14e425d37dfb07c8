//! Mode dispatcher.
//!
//! Classifies host input, hit-tests it, and routes it to the active mode.
//! Also owns the transition protocol: a transition validates its options,
//! stops the current mode, starts the next one and forces a full redraw.

use std::collections::HashMap;

use gd_core::{Actions, DisplayFeature, DrawError, DrawEvent, FeatureId};
use gd_render::{Control, MapSurface, click_box, features_at};

use crate::api::Draw;
use crate::input::{EventClass, GestureTracker, InputEvent, KeyInput, MapEvent, PointerInput};
use crate::modes::{
    ActiveMode, DRAW_LINE_STRING, DRAW_POINT, DRAW_POLYGON, Flow, ModeContext, ModeFactory,
    ModeOptions, Transition,
};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::ui::Cursor;

/// Dispatcher state held by the session.
pub(crate) struct Events {
    pub(crate) modes: HashMap<String, ModeFactory>,
    pub(crate) current: Option<Box<dyn ActiveMode>>,
    pub(crate) current_name: String,
    pub(crate) gesture: GestureTracker,
    pub(crate) actions: Actions,
    pub(crate) pending: Option<Transition>,
}

impl Events {
    pub(crate) fn new(modes: impl IntoIterator<Item = (&'static str, ModeFactory)>) -> Self {
        Self {
            modes: modes
                .into_iter()
                .map(|(name, factory)| (name.to_string(), factory))
                .collect(),
            current: None,
            current_name: String::new(),
            gesture: GestureTracker::new(),
            actions: Actions::default(),
            pending: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    Mouse,
    Touch,
}

impl<S: MapSurface> Draw<S> {
    /// Borrow the active mode and a context over the rest of the session.
    pub(crate) fn split(&mut self) -> (Option<&mut (dyn ActiveMode + 'static)>, ModeContext<'_>) {
        let Draw {
            surface,
            store,
            options,
            ui,
            events,
            constraint,
        } = self;
        let ctx = ModeContext::new(
            store,
            surface,
            options,
            ui,
            &mut events.actions,
            &**constraint,
            &mut events.pending,
        );
        (events.current.as_deref_mut(), ctx)
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Feed one host event through classification and the active mode.
    pub fn handle(&mut self, input: InputEvent) -> Result<(), DrawError> {
        match input {
            InputEvent::MouseDown(p) => {
                self.events.gesture.mouse_down(&p);
                let target = self.hit_and_set_cursor(&p);
                self.delegate(EventClass::MouseDown, MapEvent::pointer(p, target))
            }
            InputEvent::MouseMove(p) => {
                if p.buttons == 1 {
                    return self.drag(p, Gesture::Mouse);
                }
                let target = self.hit_and_set_cursor(&p);
                self.delegate(EventClass::MouseMove, MapEvent::pointer(p, target))
            }
            InputEvent::MouseUp(p) => {
                let target = self.hit_and_set_cursor(&p);
                let class = if self
                    .events
                    .gesture
                    .is_click(&p, &self.options.click_tolerance)
                {
                    EventClass::Click
                } else {
                    EventClass::MouseUp
                };
                self.delegate(class, MapEvent::pointer(p, target))
            }
            InputEvent::MouseOut(p) => {
                self.delegate(EventClass::MouseOut, MapEvent::pointer(p, None))
            }
            InputEvent::TouchStart(p) => {
                if !self.options.touch_enabled {
                    return Ok(());
                }
                self.events.gesture.touch_start(&p);
                let target = self.touch_target(&p);
                self.delegate(EventClass::TouchStart, MapEvent::pointer(p, target))
            }
            InputEvent::TouchMove(p) => {
                if !self.options.touch_enabled {
                    return Ok(());
                }
                self.delegate(EventClass::TouchMove, MapEvent::pointer(p, None))?;
                self.drag(p, Gesture::Touch)
            }
            InputEvent::TouchEnd(p) => {
                if !self.options.touch_enabled {
                    return Ok(());
                }
                let target = self.touch_target(&p);
                let class = if self
                    .events
                    .gesture
                    .is_tap(&p, &self.options.tap_tolerance)
                {
                    EventClass::Tap
                } else {
                    EventClass::TouchEnd
                };
                self.delegate(class, MapEvent::pointer(p, target))
            }
            InputEvent::KeyDown(key) => self.key_down(&key),
            InputEvent::KeyUp(key) => {
                if !self.options.keybindings || !ShortcutMap::is_mode_key(&key.key) {
                    return Ok(());
                }
                self.delegate(EventClass::KeyUp, MapEvent::key(&key))
            }
        }
    }

    /// A pointer move with a button held only becomes a drag once it no
    /// longer qualifies as a click (or tap).
    fn drag(&mut self, p: PointerInput, gesture: Gesture) -> Result<(), DrawError> {
        let still_press = match gesture {
            Gesture::Mouse => self
                .events
                .gesture
                .is_click(&p, &self.options.click_tolerance),
            Gesture::Touch => self.events.gesture.is_tap(&p, &self.options.tap_tolerance),
        };
        if still_press {
            return Ok(());
        }
        self.ui.queue_mouse(Cursor::Drag);
        self.delegate(EventClass::Drag, MapEvent::pointer(p, None))
    }

    fn key_down(&mut self, key: &KeyInput) -> Result<(), DrawError> {
        if !self.options.keybindings || !key.on_canvas {
            return Ok(());
        }
        let (control, mode) = match ShortcutMap::resolve(&key.key) {
            Some(ShortcutAction::Trash) => {
                if self.options.control_enabled(Control::Trash) {
                    return self.trash();
                }
                return Ok(());
            }
            Some(ShortcutAction::DrawPoint) => (Control::Point, DRAW_POINT),
            Some(ShortcutAction::DrawLineString) => (Control::LineString, DRAW_LINE_STRING),
            Some(ShortcutAction::DrawPolygon) => (Control::Polygon, DRAW_POLYGON),
            None if ShortcutMap::is_mode_key(&key.key) => {
                return self.delegate(EventClass::KeyDown, MapEvent::key(key));
            }
            None => return Ok(()),
        };
        if !self.options.control_enabled(control) {
            return Ok(());
        }
        self.transition(Transition {
            mode: mode.to_string(),
            options: ModeOptions::default(),
            silent: false,
        })
    }

    /// Hit-test under the pointer and set the feature and mouse classes.
    fn hit_and_set_cursor(&mut self, p: &PointerInput) -> Option<DisplayFeature> {
        let bbox = click_box(p.point, self.options.click_buffer);
        let target = features_at(&self.surface, bbox, &self.options.layers)
            .into_iter()
            .next();
        let cursor = if self.events.current_name.contains("draw") {
            Cursor::Add
        } else {
            match &target {
                Some(t) if t.is_active() => Cursor::Move,
                Some(_) => Cursor::Pointer,
                None => Cursor::None,
            }
        };
        if let Some(t) = &target {
            self.ui.queue_feature(t.meta());
        }
        self.ui.queue_mouse(cursor);
        self.ui.update(&mut self.surface);
        target
    }

    fn touch_target(&self, p: &PointerInput) -> Option<DisplayFeature> {
        let bbox = click_box(p.point, self.options.touch_buffer);
        features_at(&self.surface, bbox, &self.options.layers)
            .into_iter()
            .next()
    }

    /// Run the active mode's callback for `class`, then apply any requested
    /// transition, render, and push classes.
    pub(crate) fn delegate(&mut self, class: EventClass, event: MapEvent) -> Result<(), DrawError> {
        log::trace!("{class} -> {}", self.events.current_name);
        let flow = {
            let (mode, mut ctx) = self.split();
            mode.and_then(|mode| mode.delegate(class, &mut ctx, &event))
        };
        self.apply_pending()?;
        let Some(flow) = flow else {
            return Ok(());
        };
        if flow == Flow::Render {
            self.store.render();
        }
        self.ui.update(&mut self.surface);
        Ok(())
    }

    // ─── Transitions ─────────────────────────────────────────────────────

    pub(crate) fn apply_pending(&mut self) -> Result<(), DrawError> {
        while let Some(next) = self.events.pending.take() {
            self.transition(next)?;
        }
        Ok(())
    }

    /// Stop the current mode and start `next`. Options are checked first,
    /// so a failed transition leaves the current mode running.
    pub(crate) fn transition(&mut self, next: Transition) -> Result<(), DrawError> {
        let factory = self
            .events
            .modes
            .get(&next.mode)
            .copied()
            .ok_or_else(|| DrawError::UnknownMode(next.mode.clone()))?;
        {
            let (_, ctx) = self.split();
            (factory.check)(&ctx, &next.options)?;
        }

        {
            let (mode, mut ctx) = self.split();
            if let Some(mode) = mode {
                mode.stop(&mut ctx);
            }
        }
        if let Some(nested) = self.events.pending.take() {
            log::debug!(
                "{} requested while stopping {}, superseded by {}",
                nested.mode,
                self.events.current_name,
                next.mode
            );
        }

        self.events.current = None;
        self.events.current_name = next.mode.clone();
        let started = {
            let (_, mut ctx) = self.split();
            (factory.start)(&mut ctx, next.options)?
        };
        self.events.current = Some(started);
        log::debug!("mode -> {}", next.mode);

        if !next.silent {
            self.surface.fire(DrawEvent::ModeChange { mode: next.mode });
        }
        self.store.set_dirty();
        self.store.render();
        Ok(())
    }

    // ─── Render ──────────────────────────────────────────────────────────

    /// Recompute the hot and cold sources through the active mode.
    pub(crate) fn flush(&mut self) {
        if !self.surface.has_sources() {
            self.store.cleanup();
            return;
        }
        let mode = self.events.current_name.clone();
        self.ui.queue_mode(&mode);

        let plan = self.store.begin_flush();
        let hot = self.display(&plan.hot, &mode);
        let cold = self.display(&plan.cold, &mode);
        self.store.finish_flush(&mut self.surface, plan, hot, cold);

        if let Some(dropped) = self.events.pending.take() {
            log::debug!("dropped transition to {} requested while rendering", dropped.mode);
        }
        self.ui.update(&mut self.surface);
    }

    fn display(&mut self, ids: &[FeatureId], mode_name: &str) -> Vec<DisplayFeature> {
        let user_properties = self.options.user_properties;
        let mut out = Vec::new();
        for id in ids {
            let Some(internal) = self
                .store
                .get(*id)
                .map(|f| f.internal(mode_name, user_properties))
            else {
                continue;
            };
            let start = out.len();
            let (mode, mut ctx) = self.split();
            match mode {
                Some(mode) => mode.to_display_features(&mut ctx, internal, &mut out),
                None => out.push(internal),
            }
            for primitive in &mut out[start..] {
                primitive.properties.mode = Some(mode_name.to_string());
            }
        }
        out
    }
}
