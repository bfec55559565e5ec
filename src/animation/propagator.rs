//! Live transform propagation
//!
//! When an element is scaled, slid, rotated or faded, everything anchored or
//! stretched to it has to follow without re-running layout. The propagator
//! works out, per element:
//!
//! 1. **Self-compensation**: an element anchored to another element keeps its
//!    anchor point in place by translating against the displacement its own
//!    scale/rotate causes at that point
//! 2. **Direct compensation**: each dependent translates by the displacement of
//!    the point it follows, plus the source's self-compensation
//! 3. **Cascade**: each compensated dependent acts as a virtual source that moved
//!    by a pure translate, until no unprocessed dependents remain
//!
//! The results are committed into the tracked [`ElementTransformState`]s and
//! handed to the tween backend; every tween is recorded in the
//! [`TimelineRegistry`] so the whole propagation can later be reversed or
//! stopped by origin.

use std::collections::{HashMap, HashSet, VecDeque};

use super::analyzer::analyze;
use super::config::AnimationConfig;
use super::dependency::{DependencyIndex, InvalidationSource};
use super::effect::{
    total_displacement, AnimationEffect, AnimationSequence, EffectKind, EffectTiming, Movement,
    SyncData, TransformEffect,
};
use super::error::AnimationError;
use super::timeline::{PropagationTimeline, TimelineId, TimelineRegistry, TimelineRole};
use super::transform::ElementTransformState;
use super::tween::{NodeResolver, TweenBackend, TweenSpec};
use crate::layout::element::{Element, ElementGraph};
use crate::layout::find_similar;
use crate::layout::types::Vector;

/// Collaborators borrowed for the duration of one propagation call
#[derive(Clone, Copy)]
pub struct PropagationContext<'a> {
    pub graph: &'a ElementGraph,
    pub backend: &'a dyn TweenBackend,
    pub nodes: &'a dyn NodeResolver,
}

/// One tween handed to the backend
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledTransform {
    pub timeline_id: TimelineId,
    pub element_id: String,
    pub role: TimelineRole,
    pub effects: Vec<TransformEffect>,
}

/// What a single propagation did
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropagationOutcome {
    /// Translate applied to the animated element to keep its anchor point fixed
    pub self_compensation: Option<Vector>,
    pub scheduled: Vec<ScheduledTransform>,
    /// Elements with no resolvable node; their transforms were dropped
    pub skipped: Vec<String>,
}

impl PropagationOutcome {
    /// Net translate scheduled on `element_id` as compensation
    pub fn compensation_for(&self, element_id: &str) -> Option<Vector> {
        self.scheduled
            .iter()
            .filter(|s| s.element_id == element_id && s.role == TimelineRole::Compensation)
            .flat_map(|s| s.effects.iter())
            .map(|e| match *e {
                TransformEffect::Translate {
                    x,
                    y,
                    initial_offset,
                } => Vector::new(x, y) + initial_offset,
                _ => Vector::zero(),
            })
            .reduce(|a, b| a + b)
    }

    /// Ids of every element that received a tween, in scheduling order
    pub fn scheduled_elements(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.scheduled
            .iter()
            .map(|s| s.element_id.as_str())
            .filter(|id| seen.insert(*id))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.scheduled.is_empty()
    }

    fn merge(&mut self, other: PropagationOutcome) {
        self.scheduled.extend(other.scheduled);
        self.skipped.extend(other.skipped);
    }
}

/// What a sequence propagation did
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SequenceOutcome {
    /// The combined slide-in offset, shown from the start of the sequence
    pub initial_offset: Option<Vector>,
    pub steps: Vec<PropagationOutcome>,
}

impl SequenceOutcome {
    pub fn scheduled_count(&self) -> usize {
        self.steps.iter().map(|o| o.scheduled.len()).sum()
    }
}

/// A transform planned for one element, not yet committed
struct PlannedTransform {
    element_id: String,
    role: TimelineRole,
    effects: Vec<TransformEffect>,
}

/// Owns per-element transform state, the timeline registry and the dependency index
#[derive(Debug, Default)]
pub struct Propagator {
    config: AnimationConfig,
    states: HashMap<String, ElementTransformState>,
    registry: TimelineRegistry,
    index: DependencyIndex,
    index_generation: Option<u64>,
    invalidation: InvalidationSource,
}

impl Propagator {
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    /// Signal to hand to collaborators that change the element graph
    pub fn invalidation_source(&self) -> InvalidationSource {
        self.invalidation.clone()
    }

    /// Force the dependency index to be rebuilt on the next operation
    pub fn invalidate(&self) {
        self.invalidation.invalidate();
    }

    /// Committed transform of an element (identity if never animated)
    pub fn transform_state(&self, element_id: &str) -> ElementTransformState {
        self.states.get(element_id).copied().unwrap_or_default()
    }

    /// Elements with a tracked transform state
    pub fn tracked_elements(&self) -> impl Iterator<Item = (&str, &ElementTransformState)> {
        self.states.iter().map(|(id, state)| (id.as_str(), state))
    }

    pub fn registry(&self) -> &TimelineRegistry {
        &self.registry
    }

    /// Apply pending tween completions without starting anything
    pub fn sync_completions(&mut self) -> usize {
        self.registry.drain_completions()
    }

    /// Animate one element and keep everything that depends on it attached
    pub fn process_animation_with_propagation(
        &mut self,
        ctx: PropagationContext<'_>,
        element_id: &str,
        effect: &AnimationEffect,
        sync: &SyncData,
    ) -> Result<PropagationOutcome, AnimationError> {
        self.begin(ctx.graph);
        let element = animatable(ctx.graph, element_id)?;

        let state = self.transform_state(element_id);
        let effects = analyze(effect, element, &state, &self.config);
        let timing = self.resolve_timing(effect, sync, 0.0);

        Ok(self.propagate(ctx, element, effects, timing, TimelineRole::Primary))
    }

    /// Play effects back to back on one element, propagating each step
    pub fn process_animation_sequence_with_propagation(
        &mut self,
        ctx: PropagationContext<'_>,
        element_id: &str,
        sequence: &AnimationSequence,
        sync: &SyncData,
    ) -> Result<SequenceOutcome, AnimationError> {
        self.begin(ctx.graph);
        let element = animatable(ctx.graph, element_id)?;
        let mut outcome = SequenceOutcome::default();

        // Slide-in steps start off-position. The combined offset rides on the first
        // slide-in's tweens, which hold it from the start until they fully reverse.
        let offset = sequence
            .steps
            .iter()
            .filter(|step| {
                matches!(
                    step.kind,
                    EffectKind::Slide {
                        movement: Movement::In,
                        ..
                    }
                )
            })
            .flat_map(|step| analyze(step, element, &ElementTransformState::identity(), &self.config))
            .fold(Vector::zero(), |acc, e| acc + e.initial_offset());

        let mut held_offset =
            (offset.magnitude() >= self.config.significance_threshold).then_some(offset);
        if let Some(offset) = held_offset {
            log::debug!("'{}': sequence starts offset by {}", element_id, offset);
        }
        outcome.initial_offset = held_offset;

        let mut elapsed = 0.0;
        for step in &sequence.steps {
            let state = self.transform_state(element_id);
            let effects: Vec<TransformEffect> = analyze(step, element, &state, &self.config)
                .iter()
                .map(|effect| match held_offset {
                    Some(offset) if effect.initial_offset().magnitude() > 0.0 => {
                        held_offset = None;
                        effect.with_initial_offset(offset)
                    }
                    _ => effect.without_initial_offset(),
                })
                .filter(|e| e.is_significant(self.config.significance_threshold))
                .collect();
            let timing = self.resolve_timing(step, sync, elapsed);
            elapsed += step.delay_ms.unwrap_or(0.0) + timing.duration_ms;

            outcome
                .steps
                .push(self.propagate(ctx, element, effects, timing, TimelineRole::Primary));
        }

        Ok(outcome)
    }

    /// Toggle every timeline caused by `element_id`, on it and its dependents
    ///
    /// Returns the number of timelines toggled.
    pub fn reverse_animation_propagation(
        &mut self,
        graph: &ElementGraph,
        element_id: &str,
    ) -> Result<usize, AnimationError> {
        self.begin(graph);
        known(graph, element_id)?;

        let mut toggled = 0;
        for target in self.affected_elements(element_id) {
            let state = self.states.entry(target.clone()).or_default();
            let (forward, reversed): (Vec<_>, Vec<_>) = self
                .registry
                .for_origin_mut(&target, element_id)
                .partition(|t| !t.is_reversed);

            // Absolute effects (scale, rotate) must unwind newest first
            for timeline in forward.into_iter().rev() {
                timeline.toggle();
                for effect in timeline.effects.iter().rev() {
                    effect.unapply_from(state);
                }
                toggled += 1;
            }
            for timeline in reversed {
                timeline.toggle();
                for effect in &timeline.effects {
                    effect.apply_to(state);
                }
                toggled += 1;
            }
        }

        log::debug!("'{}': toggled {} timeline(s)", element_id, toggled);
        Ok(toggled)
    }

    /// Kill every timeline caused by `element_id`, on it and its dependents
    ///
    /// Committed transform state is left as is. Returns the number of timelines killed.
    pub fn stop_animation_propagation(
        &mut self,
        graph: &ElementGraph,
        element_id: &str,
    ) -> Result<usize, AnimationError> {
        self.begin(graph);
        known(graph, element_id)?;

        let mut killed = 0;
        for target in self.affected_elements(element_id) {
            for mut timeline in self.registry.remove_for_origin(&target, element_id) {
                timeline.tween.kill();
                killed += 1;
            }
        }

        log::debug!("'{}': killed {} timeline(s)", element_id, killed);
        Ok(killed)
    }

    /// Kill all timelines and forget all state
    pub fn cleanup(&mut self) {
        for mut timeline in self.registry.take_all() {
            timeline.tween.kill();
        }
        self.states.clear();
        self.index = DependencyIndex::default();
        self.index_generation = None;
    }

    /// Housekeeping shared by every public operation
    fn begin(&mut self, graph: &ElementGraph) {
        self.registry.drain_completions();

        let generation = self.invalidation.generation();
        if self.index_generation != Some(generation) {
            self.index = DependencyIndex::build(graph);
            self.index_generation = Some(generation);
            log::debug!(
                "rebuilt dependency index: {} edge(s)",
                self.index.edge_count()
            );
        }
    }

    /// The element itself followed by its transitive dependents
    fn affected_elements(&self, element_id: &str) -> Vec<String> {
        let mut elements = vec![element_id.to_string()];
        elements.extend(self.index.transitive_dependents(element_id));
        elements
    }

    fn resolve_timing(&self, effect: &AnimationEffect, sync: &SyncData, offset_ms: f64) -> EffectTiming {
        EffectTiming {
            duration_ms: sync
                .duration_ms
                .or(effect.duration_ms)
                .unwrap_or(self.config.default_duration_ms),
            delay_ms: sync.delay_ms.unwrap_or(0.0) + offset_ms + effect.delay_ms.unwrap_or(0.0),
            easing: sync
                .easing
                .or(effect.easing)
                .unwrap_or(self.config.default_easing),
        }
    }

    fn propagate(
        &mut self,
        ctx: PropagationContext<'_>,
        element: &Element,
        effects: Vec<TransformEffect>,
        timing: EffectTiming,
        role: TimelineRole,
    ) -> PropagationOutcome {
        if effects.is_empty() {
            log::debug!("'{}': nothing significant to animate", element.id);
            return PropagationOutcome::default();
        }

        let superseded = self.registry.supersede_completed(&element.id);
        if superseded > 0 {
            log::trace!("'{}': superseded {} completed timeline(s)", element.id, superseded);
        }

        let self_compensation = self.self_compensation(element, &effects);

        let mut primary = effects.clone();
        if let Some(delta) = self_compensation {
            primary.push(TransformEffect::translate(delta));
        }

        let mut plan = vec![PlannedTransform {
            element_id: element.id.clone(),
            role,
            effects: primary,
        }];
        plan.extend(self.cascade(
            ctx.graph,
            element,
            effects,
            self_compensation.unwrap_or_default(),
        ));

        let mut outcome = PropagationOutcome {
            self_compensation,
            ..PropagationOutcome::default()
        };
        for planned in plan {
            outcome.merge(self.commit(ctx, &element.id, planned, timing));
        }
        outcome
    }

    /// Translate that keeps an element's own anchor point fixed under its pivoting effects
    fn self_compensation(&self, element: &Element, effects: &[TransformEffect]) -> Option<Vector> {
        let anchor = element.layout_config.anchor.as_ref()?;
        anchor.anchor_to.element_id()?;

        let pivoting: Vec<&TransformEffect> = effects.iter().filter(|e| e.is_pivoting()).collect();
        if pivoting.is_empty() {
            return None;
        }

        let point = anchor.anchor_point.position(&element.bounds());
        let displacement = total_displacement(pivoting, point);
        (displacement.magnitude() >= self.config.significance_threshold).then(|| -displacement)
    }

    /// Breadth-first compensation of every transitive dependent
    fn cascade(
        &self,
        graph: &ElementGraph,
        source: &Element,
        effects: Vec<TransformEffect>,
        self_compensation: Vector,
    ) -> Vec<PlannedTransform> {
        let mut planned = Vec::new();
        let mut processed: HashSet<String> = HashSet::from([source.id.clone()]);
        let mut queue: VecDeque<(String, Vec<TransformEffect>, Vector)> =
            VecDeque::from([(source.id.clone(), effects, self_compensation)]);

        while let Some((source_id, source_effects, extra)) = queue.pop_front() {
            let Some(source_box) = graph.resolved_bounds(&source_id) else {
                continue;
            };
            let offset = source_effects
                .iter()
                .fold(Vector::zero(), |acc, e| acc + e.initial_offset());

            for edge in self.index.dependents_of(&source_id) {
                let dependent = &edge.dependent_element_id;
                if processed.contains(dependent) {
                    continue;
                }

                let point = edge.target_anchor_point.position(&source_box);
                let displacement = total_displacement(&source_effects, point) + extra;
                let compensation = TransformEffect::Translate {
                    x: displacement.x,
                    y: displacement.y,
                    initial_offset: offset,
                };
                if !compensation.is_significant(self.config.significance_threshold) {
                    continue;
                }

                processed.insert(dependent.clone());
                log::trace!(
                    "'{}' follows '{}' by {}",
                    dependent,
                    source_id,
                    displacement
                );
                planned.push(PlannedTransform {
                    element_id: dependent.clone(),
                    role: TimelineRole::Compensation,
                    effects: vec![compensation],
                });
                queue.push_back((dependent.clone(), vec![compensation], Vector::zero()));
            }
        }

        planned
    }

    /// Update tracked state and hand the transform to the backend
    fn commit(
        &mut self,
        ctx: PropagationContext<'_>,
        origin: &str,
        planned: PlannedTransform,
        timing: EffectTiming,
    ) -> PropagationOutcome {
        let mut outcome = PropagationOutcome::default();
        let Some(node) = ctx.nodes.resolve(&planned.element_id) else {
            log::debug!("no node for '{}', skipping its transform", planned.element_id);
            outcome.skipped.push(planned.element_id);
            return outcome;
        };

        let PlannedTransform {
            element_id,
            role,
            effects,
        } = planned;

        // A slide-in jumps to its offset on start and tweens the remainder
        let offset = effects
            .iter()
            .fold(Vector::zero(), |acc, e| acc + e.initial_offset());
        let state = self.states.entry(element_id.clone()).or_default();
        let mut from = *state;
        for effect in &effects {
            effect.apply_to(state);
        }
        from.translate_by(offset);
        let spec = TweenSpec {
            from,
            to: *state,
            initial_offset: offset,
            origin: effects.iter().find_map(|e| match *e {
                TransformEffect::Scale { origin, .. } | TransformEffect::Rotate { origin, .. } => {
                    Some(origin)
                }
                _ => None,
            }),
            timing,
        };

        let id = self.registry.allocate_id();
        let mut tween = ctx.backend.create_tween(&node, &spec);
        tween.on_complete(self.registry.completion_callback(id));
        tween.start();

        log::debug!(
            "scheduled {:?} timeline {} on '{}' ({} effect(s), {}ms after {}ms)",
            role,
            id,
            element_id,
            effects.len(),
            timing.duration_ms,
            timing.delay_ms
        );

        outcome.scheduled.push(ScheduledTransform {
            timeline_id: id,
            element_id: element_id.clone(),
            role,
            effects: effects.clone(),
        });
        self.registry.insert(PropagationTimeline {
            id,
            tween,
            element_id,
            origin: origin.to_string(),
            role,
            effects,
            is_reversed: false,
            completed: false,
        });

        outcome
    }
}

fn known<'g>(graph: &'g ElementGraph, element_id: &str) -> Result<&'g Element, AnimationError> {
    graph.get(element_id).ok_or_else(|| {
        let defined: HashSet<String> = graph.ids().map(str::to_string).collect();
        AnimationError::unknown(element_id, find_similar(&defined, element_id, 2))
    })
}

fn animatable<'g>(graph: &'g ElementGraph, element_id: &str) -> Result<&'g Element, AnimationError> {
    let element = known(graph, element_id)?;
    if !element.is_calculated() {
        return Err(AnimationError::unresolved(element_id));
    }
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::tween::FrameTicker;
    use crate::layout::anchor::AnchorPoint;
    use crate::layout::config::LayoutConfig;
    use crate::layout::element::AnchorConfig;
    use crate::layout::engine::resolve_layout;
    use crate::layout::measure::EstimatingMeasurer;
    use crate::layout::types::BoundingBox;

    const EPSILON: f64 = 0.001;

    fn approx_vec(v: Vector, x: f64, y: f64) -> bool {
        (v.x - x).abs() < EPSILON && (v.y - y).abs() < EPSILON
    }

    fn setup(elements: Vec<Element>) -> (ElementGraph, FrameTicker) {
        let mut graph = ElementGraph::from_elements(elements).unwrap();
        resolve_layout(
            &mut graph,
            BoundingBox::new(0.0, 0.0, 800.0, 600.0),
            &EstimatingMeasurer::default(),
            &LayoutConfig::default(),
        );
        let ticker = FrameTicker::new();
        for id in graph.ids() {
            ticker.register(id);
        }
        (graph, ticker)
    }

    fn ctx<'a>(graph: &'a ElementGraph, ticker: &'a FrameTicker) -> PropagationContext<'a> {
        PropagationContext {
            graph,
            backend: ticker,
            nodes: ticker,
        }
    }

    fn chain() -> Vec<Element> {
        vec![
            Element::rect("trigger", 100.0, 40.0).at(0.0, 50.0),
            Element::rect("target", 100.0, 40.0).anchored(AnchorConfig::new(
                "trigger",
                AnchorPoint::TopLeft,
                AnchorPoint::TopRight,
            )),
            Element::rect("description", 80.0, 20.0).anchored(AnchorConfig::new(
                "target",
                AnchorPoint::CenterLeft,
                AnchorPoint::CenterRight,
            )),
        ]
    }

    #[test]
    fn test_no_self_compensation_for_free_element() {
        let (graph, ticker) = setup(chain());
        let mut propagator = Propagator::default();
        let outcome = propagator
            .process_animation_with_propagation(
                ctx(&graph, &ticker),
                "trigger",
                &AnimationEffect::scale(1.5),
                &SyncData::default(),
            )
            .unwrap();
        assert_eq!(outcome.self_compensation, None);
        assert_eq!(outcome.scheduled_elements(), vec!["trigger", "target", "description"]);
    }

    #[test]
    fn test_no_self_compensation_when_anchored_to_container() {
        let (graph, ticker) = setup(vec![Element::rect("a", 50.0, 50.0).anchored(
            AnchorConfig::new("container", AnchorPoint::TopLeft, AnchorPoint::TopLeft),
        )]);
        let mut propagator = Propagator::default();
        let outcome = propagator
            .process_animation_with_propagation(
                ctx(&graph, &ticker),
                "a",
                &AnimationEffect::scale(2.0).with_origin("center center"),
                &SyncData::default(),
            )
            .unwrap();
        assert_eq!(outcome.self_compensation, None);
    }

    #[test]
    fn test_worked_example() {
        let (graph, ticker) = setup(chain());
        assert_eq!(
            graph.resolved_bounds("target"),
            Some(BoundingBox::new(100.0, 50.0, 100.0, 40.0))
        );

        let mut propagator = Propagator::default();
        let outcome = propagator
            .process_animation_with_propagation(
                ctx(&graph, &ticker),
                "target",
                &AnimationEffect::scale(1.2).with_origin("center center"),
                &SyncData::default(),
            )
            .unwrap();

        let self_comp = outcome.self_compensation.unwrap();
        assert!(approx_vec(self_comp, 10.0, 4.0), "self-comp {}", self_comp);
        let dependent = outcome.compensation_for("description").unwrap();
        assert!(approx_vec(dependent, 20.0, 4.0), "dependent {}", dependent);

        let state = propagator.transform_state("target");
        assert!((state.scale_x - 1.2).abs() < EPSILON);
        assert!(approx_vec(state.translation(), 10.0, 4.0));
    }

    #[test]
    fn test_translate_has_no_self_compensation() {
        let (graph, ticker) = setup(chain());
        let mut propagator = Propagator::default();
        let outcome = propagator
            .process_animation_with_propagation(
                ctx(&graph, &ticker),
                "target",
                &AnimationEffect::slide(
                    crate::animation::effect::SlideDirection::Down,
                    25.0,
                    Movement::Out,
                ),
                &SyncData::default(),
            )
            .unwrap();
        assert_eq!(outcome.self_compensation, None);
        assert!(approx_vec(
            outcome.compensation_for("description").unwrap(),
            0.0,
            25.0
        ));
    }

    #[test]
    fn test_missing_node_is_skipped() {
        let (graph, ticker) = setup(chain());
        ticker.unregister("target");
        let mut propagator = Propagator::default();
        let outcome = propagator
            .process_animation_with_propagation(
                ctx(&graph, &ticker),
                "trigger",
                &AnimationEffect::scale(1.5),
                &SyncData::default(),
            )
            .unwrap();
        assert_eq!(outcome.skipped, vec!["target".to_string()]);
        assert_eq!(outcome.scheduled_elements(), vec!["trigger", "description"]);
        assert_eq!(propagator.transform_state("target"), ElementTransformState::identity());
    }

    #[test]
    fn test_unknown_element_suggests() {
        let (graph, ticker) = setup(chain());
        let mut propagator = Propagator::default();
        let err = propagator
            .process_animation_with_propagation(
                ctx(&graph, &ticker),
                "targt",
                &AnimationEffect::fade(0.0),
                &SyncData::default(),
            )
            .unwrap_err();
        assert_eq!(err.suggestions(), Some(&["target".to_string()][..]));
    }

    #[test]
    fn test_unresolved_element_is_rejected() {
        let graph = ElementGraph::from_elements(chain()).unwrap();
        let ticker = FrameTicker::new();
        let mut propagator = Propagator::default();
        let err = propagator
            .process_animation_with_propagation(
                ctx(&graph, &ticker),
                "trigger",
                &AnimationEffect::fade(0.0),
                &SyncData::default(),
            )
            .unwrap_err();
        assert_eq!(err, AnimationError::unresolved("trigger"));
    }

    #[test]
    fn test_sync_timing_applies_to_compensations() {
        let (graph, ticker) = setup(chain());
        let mut propagator = Propagator::default();
        let sync = SyncData::default().with_duration(120.0).with_delay(30.0);
        propagator
            .process_animation_with_propagation(
                ctx(&graph, &ticker),
                "trigger",
                &AnimationEffect::scale(1.5).with_duration(999.0),
                &sync,
            )
            .unwrap();

        // 30ms delay + 120ms duration
        ticker.tick(149.0);
        assert!(!ticker.is_idle());
        ticker.tick(2.0);
        assert!(ticker.is_idle());
    }
}
