//! Editing modes.
//!
//! A mode is a type implementing [`Mode`]: its value is the per-activation
//! state, `setup` builds it, and `register` fills a [`Registrar`] with
//! `(event class, selector, callback)` triples. Dispatch walks a class's
//! triples in reverse registration order and runs the first callback whose
//! selector matches, so a mode registers general handlers first and
//! specific ones after.
//!
//! Modes never call each other. They talk to the session through
//! [`ModeContext`], and a transition they request is applied by the
//! dispatcher once the callback returns.

mod context;
mod direct_select;
mod draw_line_string;
mod draw_point;
mod draw_polygon;
pub mod selectors;
mod simple_select;

pub use context::{ModeContext, Transition};
pub use direct_select::DirectSelect;
pub use draw_line_string::DrawLineString;
pub use draw_point::DrawPoint;
pub use draw_polygon::DrawPolygon;
pub use simple_select::SimpleSelect;

use gd_core::{CoordPath, DisplayFeature, DrawError, FeatureId, Position};

use crate::input::{EventClass, MapEvent};

pub const SIMPLE_SELECT: &str = "simple_select";
pub const DIRECT_SELECT: &str = "direct_select";
pub const DRAW_POINT: &str = "draw_point";
pub const DRAW_LINE_STRING: &str = "draw_line_string";
pub const DRAW_POLYGON: &str = "draw_polygon";

/// What the dispatcher does after a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Request a render and push cursor classes.
    Render,
    /// Push cursor classes only.
    SkipRender,
}

/// Options handed to a mode when it starts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModeOptions {
    /// simple_select: features to select.
    pub feature_ids: Vec<FeatureId>,
    /// direct_select: the feature to edit. draw_line_string: the line to
    /// continue.
    pub feature_id: Option<FeatureId>,
    /// direct_select: vertex selected on entry.
    pub coord_path: Option<CoordPath>,
    /// direct_select: where the pointer went down, to arm a drag.
    pub start_pos: Option<Position>,
    /// draw_line_string: the endpoint to continue from.
    pub from: Option<Position>,
}

impl ModeOptions {
    pub fn select(ids: &[FeatureId]) -> Self {
        Self {
            feature_ids: ids.to_vec(),
            ..Self::default()
        }
    }

    pub fn edit(id: FeatureId) -> Self {
        Self {
            feature_id: Some(id),
            ..Self::default()
        }
    }

    pub fn continue_line(id: FeatureId, from: Position) -> Self {
        Self {
            feature_id: Some(id),
            from: Some(from),
            ..Self::default()
        }
    }
}

pub trait Mode: Sized + 'static {
    /// Validate options before the current mode is stopped, so a rejected
    /// transition leaves the session untouched.
    fn check_options(_ctx: &ModeContext<'_>, _options: &ModeOptions) -> Result<(), DrawError> {
        Ok(())
    }

    fn setup(ctx: &mut ModeContext<'_>, options: ModeOptions) -> Result<Self, DrawError>;

    fn register(on: &mut Registrar<Self>);

    fn stop(&mut self, _ctx: &mut ModeContext<'_>) {}

    fn trash(&mut self, _ctx: &mut ModeContext<'_>) {}

    fn combine_features(&mut self, _ctx: &mut ModeContext<'_>) {}

    fn uncombine_features(&mut self, _ctx: &mut ModeContext<'_>) {}

    /// Expand one feature into rendered primitives.
    fn to_display_features(
        &self,
        _ctx: &mut ModeContext<'_>,
        feature: DisplayFeature,
        out: &mut Vec<DisplayFeature>,
    ) {
        out.push(feature);
    }
}

// ─── Registration ────────────────────────────────────────────────────────

pub type Callback<M> = fn(&mut M, &mut ModeContext<'_>, &MapEvent) -> Flow;
type Selector = Box<dyn Fn(&MapEvent) -> bool>;

pub struct Registrar<M> {
    handlers: [Vec<(Selector, Callback<M>)>; 12],
}

impl<M> Default for Registrar<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Registrar<M> {
    pub fn new() -> Self {
        Self {
            handlers: std::array::from_fn(|_| Vec::new()),
        }
    }

    pub fn on(
        &mut self,
        class: EventClass,
        selector: impl Fn(&MapEvent) -> bool + 'static,
        callback: Callback<M>,
    ) {
        self.handlers[class.index()].push((Box::new(selector), callback));
    }

    /// Register a handler that matches every event of `class`.
    pub fn on_any(&mut self, class: EventClass, callback: Callback<M>) {
        self.on(class, selectors::always, callback);
    }

    /// Register by event name, e.g. `"mousedown"`.
    pub fn on_named(
        &mut self,
        class: &str,
        selector: impl Fn(&MapEvent) -> bool + 'static,
        callback: Callback<M>,
    ) -> Result<(), DrawError> {
        let class: EventClass = class.parse()?;
        self.on(class, selector, callback);
        Ok(())
    }

    fn matching(&self, class: EventClass, event: &MapEvent) -> Option<Callback<M>> {
        self.handlers[class.index()]
            .iter()
            .rev()
            .find(|(selector, _)| selector(event))
            .map(|(_, callback)| *callback)
    }

    pub fn len(&self, class: EventClass) -> usize {
        self.handlers[class.index()].len()
    }
}

// ─── Type-erased modes ───────────────────────────────────────────────────

/// A started mode, as the dispatcher sees it.
pub trait ActiveMode {
    /// Run the matching callback. `None` if no selector matched.
    fn delegate(
        &mut self,
        class: EventClass,
        ctx: &mut ModeContext<'_>,
        event: &MapEvent,
    ) -> Option<Flow>;

    fn stop(&mut self, ctx: &mut ModeContext<'_>);

    fn trash(&mut self, ctx: &mut ModeContext<'_>);

    fn combine_features(&mut self, ctx: &mut ModeContext<'_>);

    fn uncombine_features(&mut self, ctx: &mut ModeContext<'_>);

    fn to_display_features(
        &self,
        ctx: &mut ModeContext<'_>,
        feature: DisplayFeature,
        out: &mut Vec<DisplayFeature>,
    );
}

struct ModeHandler<M: Mode> {
    state: M,
    handlers: Registrar<M>,
}

impl<M: Mode> ActiveMode for ModeHandler<M> {
    fn delegate(
        &mut self,
        class: EventClass,
        ctx: &mut ModeContext<'_>,
        event: &MapEvent,
    ) -> Option<Flow> {
        let callback = self.handlers.matching(class, event)?;
        Some(callback(&mut self.state, ctx, event))
    }

    fn stop(&mut self, ctx: &mut ModeContext<'_>) {
        self.state.stop(ctx);
    }

    fn trash(&mut self, ctx: &mut ModeContext<'_>) {
        self.state.trash(ctx);
    }

    fn combine_features(&mut self, ctx: &mut ModeContext<'_>) {
        self.state.combine_features(ctx);
    }

    fn uncombine_features(&mut self, ctx: &mut ModeContext<'_>) {
        self.state.uncombine_features(ctx);
    }

    fn to_display_features(
        &self,
        ctx: &mut ModeContext<'_>,
        feature: DisplayFeature,
        out: &mut Vec<DisplayFeature>,
    ) {
        self.state.to_display_features(ctx, feature, out);
    }
}

type CheckFn = fn(&ModeContext<'_>, &ModeOptions) -> Result<(), DrawError>;
type StartFn = fn(&mut ModeContext<'_>, ModeOptions) -> Result<Box<dyn ActiveMode>, DrawError>;

/// How to start a registered mode.
#[derive(Clone, Copy)]
pub struct ModeFactory {
    pub(crate) check: CheckFn,
    pub(crate) start: StartFn,
}

impl ModeFactory {
    pub fn of<M: Mode>() -> Self {
        Self {
            check: M::check_options,
            start: start::<M>,
        }
    }
}

fn start<M: Mode>(
    ctx: &mut ModeContext<'_>,
    options: ModeOptions,
) -> Result<Box<dyn ActiveMode>, DrawError> {
    let state = M::setup(ctx, options)?;
    let mut handlers = Registrar::new();
    M::register(&mut handlers);
    Ok(Box::new(ModeHandler { state, handlers }))
}

/// The modes every session starts with.
pub fn builtin() -> [(&'static str, ModeFactory); 5] {
    [
        (SIMPLE_SELECT, ModeFactory::of::<SimpleSelect>()),
        (DIRECT_SELECT, ModeFactory::of::<DirectSelect>()),
        (DRAW_POINT, ModeFactory::of::<DrawPoint>()),
        (DRAW_LINE_STRING, ModeFactory::of::<DrawLineString>()),
        (DRAW_POLYGON, ModeFactory::of::<DrawPolygon>()),
    ]
}
