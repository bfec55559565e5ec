//! Anchorboard - anchor/stretch layout and live transform propagation for dashboards
//!
//! Dashboard elements are placed with relative rules ("my top-left on your
//! top-right", "stretch my right edge to that element's left edge"). This crate
//! resolves those rules into absolute geometry and, while individual elements are
//! animated, keeps everything anchored to them visually attached without
//! re-running layout on every frame.
//!
//! # Example
//!
//! ```rust
//! use anchorboard::layout::{AnchorConfig, AnchorPoint, BoundingBox, Element, ElementGraph};
//! use anchorboard::animation::{AnimationEffect, SyncData};
//! use anchorboard::Dashboard;
//!
//! let graph = ElementGraph::from_elements([
//!     Element::rect("panel", 100.0, 40.0).at(100.0, 50.0),
//!     Element::rect("label", 20.0, 10.0).anchored(AnchorConfig::new(
//!         "panel",
//!         AnchorPoint::TopLeft,
//!         AnchorPoint::TopRight,
//!     )),
//! ])
//! .unwrap();
//!
//! let mut dashboard = Dashboard::new(graph);
//! let layout = dashboard.resolve_layout(BoundingBox::sized(800.0, 600.0)).unwrap();
//! assert!(layout.is_complete());
//!
//! let outcome = dashboard
//!     .process_animation_with_propagation("panel", &AnimationEffect::scale(1.2), &SyncData::default())
//!     .unwrap();
//! assert_eq!(outcome.scheduled_elements(), vec!["panel", "label"]);
//! ```

pub mod animation;
pub mod layout;
pub mod scene;

pub use animation::{AnimationConfig, AnimationError, FrameTicker, Propagator};
pub use layout::{LayoutConfig, LayoutError, LayoutResult};
pub use scene::{Scene, SceneError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use animation::{
    AnimationEffect, AnimationSequence, ElementTransformState, InvalidationSource, NodeResolver,
    PropagationContext, PropagationOutcome, SequenceOutcome, SyncData, TweenBackend,
};
use layout::{
    BoundingBox, ContentMeasurer, Element, ElementGraph, EstimatingMeasurer, LayoutHandle,
    LayoutScheduler,
};

/// Errors surfaced by the dashboard engine
#[derive(Debug, Error)]
pub enum Error {
    /// Error in the element graph or its constraints
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Error while animating an element
    #[error("animation error: {0}")]
    Animation(#[from] AnimationError),

    /// Error while loading a scene file
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
}

/// Configuration for the whole engine
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Constraint resolver configuration
    pub layout: LayoutConfig,
    /// Propagation and tween defaults
    pub animation: AnimationConfig,
}

impl EngineConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the layout configuration
    pub fn with_layout(mut self, config: LayoutConfig) -> Self {
        self.layout = config;
        self
    }

    /// Set the animation configuration
    pub fn with_animation(mut self, config: AnimationConfig) -> Self {
        self.animation = config;
        self
    }
}

/// One dashboard view: its elements, their layout, and their live animations
///
/// The dashboard owns every per-element record. Hosts with their own animation
/// runtime plug it in through [`Dashboard::with_backend`]; the default backend is
/// the in-process [`FrameTicker`].
pub struct Dashboard<B = FrameTicker> {
    graph: ElementGraph,
    backend: B,
    propagator: Propagator,
    scheduler: LayoutScheduler,
    measurer: Box<dyn ContentMeasurer>,
    config: EngineConfig,
    last_layout: Option<LayoutResult>,
}

impl Dashboard<FrameTicker> {
    /// Create a dashboard driven by a [`FrameTicker`], with every element registered
    pub fn new(graph: ElementGraph) -> Self {
        let ticker = FrameTicker::new();
        for id in graph.ids() {
            ticker.register(id);
        }
        Self::with_backend(graph, ticker)
    }

    /// Advance the ticker by `delta_ms` and fold finished tweens into the registry
    pub fn tick(&mut self, delta_ms: f64) {
        self.backend.tick(delta_ms);
        self.propagator.sync_completions();
    }

    /// Transform currently shown for an element, including running tweens
    pub fn displayed_transform(&self, element_id: &str) -> ElementTransformState {
        self.backend.values(element_id)
    }
}

impl<B: TweenBackend + NodeResolver> Dashboard<B> {
    /// Create a dashboard on a host-provided tween backend and node resolver
    pub fn with_backend(graph: ElementGraph, backend: B) -> Self {
        let config = EngineConfig::default();
        Self {
            graph,
            backend,
            propagator: Propagator::new(config.animation.clone()),
            scheduler: LayoutScheduler::new(),
            measurer: Box::new(EstimatingMeasurer::new(&config.layout)),
            config,
            last_layout: None,
        }
    }

    /// Replace the engine configuration
    ///
    /// Resets animation bookkeeping and the text measurer; call before animating.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.propagator.cleanup();
        self.propagator = Propagator::new(config.animation.clone());
        self.measurer = Box::new(EstimatingMeasurer::new(&config.layout));
        self.config = config;
        self
    }

    /// Measure content with a host-provided measurer
    pub fn with_measurer(mut self, measurer: impl ContentMeasurer + 'static) -> Self {
        self.measurer = Box::new(measurer);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &ElementGraph {
        &self.graph
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn propagator(&self) -> &Propagator {
        &self.propagator
    }

    /// Add an element after construction
    ///
    /// The element is unresolved until the next layout pass.
    pub fn insert_element(&mut self, element: Element) -> Result<(), LayoutError> {
        self.graph.insert(element)?;
        self.propagator.invalidate();
        Ok(())
    }

    /// Fail on anchor or stretch targets that name no element
    pub fn validate(&self) -> Result<(), LayoutError> {
        layout::validate_references(&self.graph)
    }

    /// Resolve every element's geometry inside `container`
    ///
    /// Returns `None` when a layout pass is already running; the request is then
    /// kept and runs on the next [`frame`](Self::frame).
    pub fn resolve_layout(&mut self, container: BoundingBox) -> Option<LayoutResult> {
        let graph = &mut self.graph;
        let measurer = self.measurer.as_ref();
        let config = &self.config.layout;
        let result = self
            .scheduler
            .run(container, |c| layout::resolve_layout(graph, c, measurer, config))?;
        self.last_layout = Some(result.clone());
        Some(result)
    }

    /// Queue a layout for the next [`frame`](Self::frame), replacing any earlier request
    pub fn request_layout(&self, container: BoundingBox) {
        self.scheduler.request(container);
    }

    /// Run the pending layout request, if any
    pub fn frame(&mut self) -> Option<LayoutResult> {
        let graph = &mut self.graph;
        let measurer = self.measurer.as_ref();
        let config = &self.config.layout;
        let result = self
            .scheduler
            .frame(|c| layout::resolve_layout(graph, c, measurer, config))?;
        self.last_layout = Some(result.clone());
        Some(result)
    }

    /// Handle through which collaborators can request layout passes
    pub fn layout_handle(&self) -> LayoutHandle {
        self.scheduler.handle()
    }

    /// Result of the most recent layout pass
    pub fn last_layout(&self) -> Option<&LayoutResult> {
        self.last_layout.as_ref()
    }

    /// Signal through which collaborators report element graph changes
    pub fn invalidation_source(&self) -> InvalidationSource {
        self.propagator.invalidation_source()
    }

    /// Committed transform state of an element (identity if never animated)
    pub fn transform_state(&self, element_id: &str) -> ElementTransformState {
        self.propagator.transform_state(element_id)
    }

    /// Animate one element, compensating everything anchored or stretched to it
    pub fn process_animation_with_propagation(
        &mut self,
        element_id: &str,
        effect: &AnimationEffect,
        sync: &SyncData,
    ) -> Result<PropagationOutcome, AnimationError> {
        let ctx = PropagationContext {
            graph: &self.graph,
            backend: &self.backend,
            nodes: &self.backend,
        };
        self.propagator
            .process_animation_with_propagation(ctx, element_id, effect, sync)
    }

    /// Play a sequence of effects on one element, compensating after every step
    pub fn process_animation_sequence_with_propagation(
        &mut self,
        element_id: &str,
        sequence: &AnimationSequence,
        sync: &SyncData,
    ) -> Result<SequenceOutcome, AnimationError> {
        let ctx = PropagationContext {
            graph: &self.graph,
            backend: &self.backend,
            nodes: &self.backend,
        };
        self.propagator
            .process_animation_sequence_with_propagation(ctx, element_id, sequence, sync)
    }

    /// Reverse every timeline `element_id` caused; returns how many were toggled
    pub fn reverse_animation_propagation(&mut self, element_id: &str) -> Result<usize, AnimationError> {
        self.propagator
            .reverse_animation_propagation(&self.graph, element_id)
    }

    /// Kill every timeline `element_id` caused; returns how many were killed
    pub fn stop_animation_propagation(&mut self, element_id: &str) -> Result<usize, AnimationError> {
        self.propagator
            .stop_animation_propagation(&self.graph, element_id)
    }

    /// Kill all timelines and forget all transform state
    pub fn cleanup(&mut self) {
        self.propagator.cleanup();
    }
}

impl<B> std::fmt::Debug for Dashboard<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("elements", &self.graph.len())
            .field("config", &self.config)
            .field("layout_pending", &self.scheduler.is_pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{AnchorConfig, AnchorPoint};
    use pretty_assertions::assert_eq;

    const EPSILON: f64 = 0.001;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn panel_with_label() -> ElementGraph {
        ElementGraph::from_elements([
            Element::rect("panel", 100.0, 40.0).at(100.0, 50.0),
            Element::rect("label", 20.0, 10.0).anchored(AnchorConfig::new(
                "panel",
                AnchorPoint::TopLeft,
                AnchorPoint::TopRight,
            )),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolve_layout_records_last_result() {
        let mut dashboard = Dashboard::new(panel_with_label());
        assert!(dashboard.last_layout().is_none());

        let result = dashboard.resolve_layout(BoundingBox::sized(800.0, 600.0)).unwrap();
        assert!(result.is_complete());
        assert_eq!(dashboard.last_layout().map(|l| l.passes), Some(result.passes));
        assert_eq!(
            result.get("label"),
            Some(BoundingBox::new(200.0, 50.0, 20.0, 10.0))
        );
    }

    #[test]
    fn test_requested_layout_runs_on_frame() {
        let mut dashboard = Dashboard::new(panel_with_label());
        assert!(dashboard.frame().is_none());

        dashboard.layout_handle().request(BoundingBox::sized(400.0, 300.0));
        dashboard.request_layout(BoundingBox::sized(800.0, 600.0));

        let result = dashboard.frame().unwrap();
        assert_eq!(result.container, BoundingBox::sized(800.0, 600.0));
        assert!(dashboard.frame().is_none());
    }

    #[test]
    fn test_animation_round_trip_through_ticker() {
        let mut dashboard = Dashboard::new(panel_with_label());
        dashboard.resolve_layout(BoundingBox::sized(800.0, 600.0));

        let sync = SyncData::default().with_duration(100.0);
        dashboard
            .process_animation_with_propagation("panel", &AnimationEffect::scale(1.2), &sync)
            .unwrap();
        for _ in 0..10 {
            dashboard.tick(16.0);
        }
        let shown = dashboard.displayed_transform("label");
        // Scaling about the panel centre (150, 70) moves its top-right corner by (10, -4)
        assert!(approx_eq(shown.translate_x, 10.0), "got {}", shown.translate_x);
        assert!(approx_eq(shown.translate_y, -4.0), "got {}", shown.translate_y);

        let toggled = dashboard.reverse_animation_propagation("panel").unwrap();
        assert_eq!(toggled, 2);
        for _ in 0..10 {
            dashboard.tick(16.0);
        }
        let shown = dashboard.displayed_transform("label");
        assert!(approx_eq(shown.translate_x, 0.0), "got {}", shown.translate_x);
        assert!(approx_eq(dashboard.transform_state("label").translate_x, 0.0));
    }

    #[test]
    fn test_insert_element_is_picked_up_by_propagation() {
        let mut dashboard = Dashboard::new(panel_with_label());
        dashboard
            .insert_element(Element::rect("badge", 8.0, 8.0).anchored(AnchorConfig::new(
                "label",
                AnchorPoint::TopLeft,
                AnchorPoint::BottomLeft,
            )))
            .unwrap();
        dashboard.backend().register("badge");
        dashboard.resolve_layout(BoundingBox::sized(800.0, 600.0));

        let outcome = dashboard
            .process_animation_with_propagation(
                "panel",
                &AnimationEffect::scale(1.2),
                &SyncData::default(),
            )
            .unwrap();
        assert_eq!(outcome.scheduled_elements(), vec!["panel", "label", "badge"]);
    }

    #[test]
    fn test_validate_reports_undefined_target() {
        let graph = ElementGraph::from_elements([Element::rect("a", 1.0, 1.0).anchored(
            AnchorConfig::new("missing", AnchorPoint::TopLeft, AnchorPoint::TopLeft),
        )])
        .unwrap();
        let dashboard = Dashboard::new(graph);
        assert!(matches!(
            dashboard.validate(),
            Err(LayoutError::UndefinedIdentifier { .. })
        ));
    }

    #[test]
    fn test_error_wraps_subsystems() {
        let err: Error = AnimationError::unresolved("panel").into();
        assert!(err.to_string().starts_with("animation error:"));
        let err: Error = LayoutError::duplicate("panel").into();
        assert!(err.to_string().starts_with("layout error:"));
    }
}
