//! In-memory map surface.
//!
//! Screen space and geographic space coincide (`x = lng`, `y = lat`), so a
//! hit query is a plain geometry/box intersection against the last data
//! pushed to each source. Every call is recorded for inspection.

use crate::hit::intersects;
use crate::surface::{Control, Interaction, MapSurface, Source};
use gd_core::{DisplayFeature, DrawEvent};
use kurbo::Rect;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
pub struct HeadlessSurface {
    hot: Vec<DisplayFeature>,
    cold: Vec<DisplayFeature>,
    events: Vec<DrawEvent>,
    pushes: Vec<Source>,
    classes: BTreeSet<String>,
    disabled: HashMap<Interaction, bool>,
    active_button: Option<Control>,
    box_select: Option<Rect>,
    sources_removed: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface where the given interactions start out disabled.
    pub fn with_disabled(interactions: &[Interaction]) -> Self {
        let mut surface = Self::new();
        for i in interactions {
            surface.disabled.insert(*i, true);
        }
        surface
    }

    pub fn hot(&self) -> &[DisplayFeature] {
        &self.hot
    }

    pub fn cold(&self) -> &[DisplayFeature] {
        &self.cold
    }

    pub fn events(&self) -> &[DrawEvent] {
        &self.events
    }

    pub fn event_names(&self) -> Vec<&'static str> {
        self.events.iter().map(DrawEvent::name).collect()
    }

    /// Drain recorded notifications.
    pub fn take_events(&mut self) -> Vec<DrawEvent> {
        std::mem::take(&mut self.events)
    }

    /// Sources written, in call order.
    pub fn pushes(&self) -> &[Source] {
        &self.pushes
    }

    pub fn classes(&self) -> Vec<&str> {
        self.classes.iter().map(String::as_str).collect()
    }

    pub fn active_button(&self) -> Option<Control> {
        self.active_button
    }

    pub fn box_select(&self) -> Option<Rect> {
        self.box_select
    }
}

impl MapSurface for HeadlessSurface {
    fn query_rendered_features(&self, bbox: Rect, layers: &[String]) -> Vec<DisplayFeature> {
        let wanted = |source: Source| layers.is_empty() || layers.iter().any(|l| l == source.id());
        let mut out = Vec::new();
        for (source, bucket) in [(Source::Hot, &self.hot), (Source::Cold, &self.cold)] {
            if !wanted(source) {
                continue;
            }
            out.extend(
                bucket
                    .iter()
                    .rev()
                    .filter(|f| intersects(&f.geometry, bbox))
                    .cloned(),
            );
        }
        out
    }

    fn set_data(&mut self, source: Source, features: &[DisplayFeature]) {
        self.pushes.push(source);
        let bucket = match source {
            Source::Hot => &mut self.hot,
            Source::Cold => &mut self.cold,
        };
        *bucket = features.to_vec();
    }

    fn fire(&mut self, event: DrawEvent) {
        log::trace!("fire {}", event.name());
        self.events.push(event);
    }

    fn interaction_enabled(&self, interaction: Interaction) -> bool {
        !self.disabled.get(&interaction).copied().unwrap_or(false)
    }

    fn set_interaction(&mut self, interaction: Interaction, enabled: bool) {
        self.disabled.insert(interaction, !enabled);
    }

    fn has_sources(&self) -> bool {
        !self.sources_removed
    }

    fn add_sources(&mut self) {
        self.sources_removed = false;
    }

    fn remove_sources(&mut self) {
        self.sources_removed = true;
        self.hot.clear();
        self.cold.clear();
    }

    fn update_classes(&mut self, remove: &[String], add: &[String]) {
        for c in remove {
            self.classes.remove(c);
        }
        self.classes.extend(add.iter().cloned());
    }

    fn set_active_button(&mut self, button: Option<Control>) {
        self.active_button = button;
    }

    fn show_box_select(&mut self, rect: Option<Rect>) {
        self.box_select = rect;
    }
}
