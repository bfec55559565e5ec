//! Tween backend abstraction and the bundled frame-driven backend
//!
//! The propagator never talks to a tween library directly. It resolves element
//! ids to [`NodeHandle`]s through a [`NodeResolver`] and asks a
//! [`TweenBackend`] for [`Tween`]s. [`FrameTicker`] implements both traits
//! in-process: tweens advance when the host calls [`FrameTicker::tick`], and
//! the composed per-element values can be read back at any time.
//!
//! Tweens compose additively: each one contributes `eased_progress * (to - from)`
//! on top of the identity transform, plus its initial offset from the moment it
//! starts until it has fully reversed. A killed tween keeps the contribution it
//! had reached, like a tween library leaving the node where it stopped.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use super::effect::EffectTiming;
use super::transform::ElementTransformState;
use crate::layout::types::{Point, Vector};

/// Opaque reference to a rendered node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    pub element_id: String,
    pub node: u64,
}

/// Direction a tween was playing when it completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweenEnd {
    Forward,
    Reverse,
}

pub type CompletionCallback = Box<dyn FnMut(TweenEnd)>;

/// What to animate on a node
#[derive(Debug, Clone, PartialEq)]
pub struct TweenSpec {
    /// Where the tween starts, already including `initial_offset`
    pub from: ElementTransformState,
    pub to: ElementTransformState,
    /// Translate the node jumps by on start and keeps until the tween has fully reversed
    pub initial_offset: Vector,
    /// Absolute transform origin for scale/rotate
    pub origin: Option<Point>,
    pub timing: EffectTiming,
}

/// A running (or runnable) animation on a single node
pub trait Tween {
    fn start(&mut self);
    /// Toggle playback direction; a completed tween plays back towards its start
    fn reverse(&mut self);
    /// Stop immediately, leaving the node where it is; no completion is reported
    fn kill(&mut self);
    fn on_complete(&mut self, callback: CompletionCallback);
    fn is_active(&self) -> bool;
    fn is_reversed(&self) -> bool;
}

pub trait TweenBackend {
    fn create_tween(&self, node: &NodeHandle, spec: &TweenSpec) -> Box<dyn Tween>;
}

pub trait NodeResolver {
    fn resolve(&self, element_id: &str) -> Option<NodeHandle>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Done,
}

struct TweenSlot {
    element_id: String,
    delta: ElementTransformState,
    offset: Vector,
    timing: EffectTiming,
    delay_left: f64,
    progress: f64,
    reversed: bool,
    phase: Phase,
    callback: Option<CompletionCallback>,
}

impl TweenSlot {
    fn contribution(&self) -> f64 {
        self.timing.easing.evaluate(self.progress)
    }

    /// Advance by `delta_ms`, returning the completion if one happened
    fn advance(&mut self, delta_ms: f64) -> Option<TweenEnd> {
        if self.phase != Phase::Running {
            return None;
        }

        let mut dt = delta_ms;
        if !self.reversed && self.delay_left > 0.0 {
            let used = dt.min(self.delay_left);
            self.delay_left -= used;
            dt -= used;
            if self.delay_left > 0.0 {
                return None;
            }
        }

        let step = if self.timing.duration_ms <= 0.0 {
            1.0
        } else {
            dt / self.timing.duration_ms
        };

        if self.reversed {
            self.progress = (self.progress - step).max(0.0);
            if self.progress <= 0.0 {
                self.phase = Phase::Done;
                return Some(TweenEnd::Reverse);
            }
        } else {
            self.progress = (self.progress + step).min(1.0);
            if self.progress >= 1.0 {
                self.phase = Phase::Done;
                return Some(TweenEnd::Forward);
            }
        }
        None
    }
}

#[derive(Default)]
struct TickerState {
    nodes: HashMap<String, NodeHandle>,
    next_node: u64,
    next_tween: u64,
    tweens: BTreeMap<u64, TweenSlot>,
    /// Contributions of killed tweens, per element
    settled: HashMap<String, ElementTransformState>,
}

/// In-process tween backend and node registry driven by explicit frame ticks
#[derive(Clone, Default)]
pub struct FrameTicker {
    inner: Rc<RefCell<TickerState>>,
}

impl fmt::Debug for FrameTicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("FrameTicker")
            .field("nodes", &state.nodes.len())
            .field("tweens", &state.tweens.len())
            .finish()
    }
}

impl FrameTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make an element resolvable, returning its handle
    pub fn register(&self, element_id: impl Into<String>) -> NodeHandle {
        let element_id = element_id.into();
        let mut state = self.inner.borrow_mut();
        if let Some(handle) = state.nodes.get(&element_id) {
            return handle.clone();
        }
        state.next_node += 1;
        let handle = NodeHandle {
            element_id: element_id.clone(),
            node: state.next_node,
        };
        state.nodes.insert(element_id, handle.clone());
        handle
    }

    pub fn unregister(&self, element_id: &str) {
        self.inner.borrow_mut().nodes.remove(element_id);
    }

    /// Advance every running tween by `delta_ms` and deliver completions
    pub fn tick(&self, delta_ms: f64) {
        let finished: Vec<(u64, TweenEnd)> = {
            let mut state = self.inner.borrow_mut();
            state
                .tweens
                .iter_mut()
                .filter_map(|(id, slot)| slot.advance(delta_ms).map(|end| (*id, end)))
                .collect()
        };

        for (id, end) in finished {
            fire_completion(&self.inner, id, end);
        }
    }

    /// Run `frames` ticks of `frame_ms` each
    pub fn run_frames(&self, frames: usize, frame_ms: f64) {
        for _ in 0..frames {
            self.tick(frame_ms);
        }
    }

    /// Composed transform currently shown for an element
    pub fn values(&self, element_id: &str) -> ElementTransformState {
        let state = self.inner.borrow();
        let mut values = ElementTransformState::identity();
        if let Some(settled) = state.settled.get(element_id) {
            values.add_scaled(settled, 1.0);
        }
        for slot in state.tweens.values().filter(|s| s.element_id == element_id) {
            if slot.phase != Phase::Idle {
                values.translate_by(slot.offset);
            }
            values.add_scaled(&slot.delta, slot.contribution());
        }
        values
    }

    /// Number of tweens still playing
    pub fn active_count(&self) -> usize {
        self.inner
            .borrow()
            .tweens
            .values()
            .filter(|s| s.phase == Phase::Running)
            .count()
    }

    pub fn is_idle(&self) -> bool {
        self.active_count() == 0
    }
}

/// Deliver a completion without holding the ticker borrow during the callback
fn fire_completion(inner: &Rc<RefCell<TickerState>>, id: u64, end: TweenEnd) {
    let callback = inner
        .borrow_mut()
        .tweens
        .get_mut(&id)
        .and_then(|slot| slot.callback.take());

    if let Some(mut callback) = callback {
        callback(end);
        if let Some(slot) = inner.borrow_mut().tweens.get_mut(&id) {
            slot.callback = Some(callback);
        }
    }

    // Fully reversed tweens contribute nothing and can be dropped
    if end == TweenEnd::Reverse {
        inner.borrow_mut().tweens.remove(&id);
    }
}

impl NodeResolver for FrameTicker {
    fn resolve(&self, element_id: &str) -> Option<NodeHandle> {
        self.inner.borrow().nodes.get(element_id).cloned()
    }
}

impl TweenBackend for FrameTicker {
    fn create_tween(&self, node: &NodeHandle, spec: &TweenSpec) -> Box<dyn Tween> {
        let mut state = self.inner.borrow_mut();
        state.next_tween += 1;
        let id = state.next_tween;
        state.tweens.insert(
            id,
            TweenSlot {
                element_id: node.element_id.clone(),
                delta: spec.from.delta_to(&spec.to),
                offset: spec.initial_offset,
                timing: spec.timing,
                delay_left: spec.timing.delay_ms,
                progress: 0.0,
                reversed: false,
                phase: Phase::Idle,
                callback: None,
            },
        );
        Box::new(FrameTween {
            id,
            inner: Rc::clone(&self.inner),
        })
    }
}

/// Handle to a tween owned by a [`FrameTicker`]
struct FrameTween {
    id: u64,
    inner: Rc<RefCell<TickerState>>,
}

impl FrameTween {
    fn with_slot<R>(&self, f: impl FnOnce(&mut TweenSlot) -> R) -> Option<R> {
        self.inner.borrow_mut().tweens.get_mut(&self.id).map(f)
    }
}

impl Tween for FrameTween {
    fn start(&mut self) {
        let instant = self.with_slot(|slot| {
            if slot.phase != Phase::Idle {
                return false;
            }
            slot.phase = Phase::Running;
            if slot.timing.duration_ms <= 0.0 && slot.delay_left <= 0.0 {
                slot.progress = 1.0;
                slot.phase = Phase::Done;
                return true;
            }
            false
        });
        if instant == Some(true) {
            fire_completion(&self.inner, self.id, TweenEnd::Forward);
        }
    }

    fn reverse(&mut self) {
        self.with_slot(|slot| {
            slot.reversed = !slot.reversed;
            if slot.phase == Phase::Done {
                slot.phase = Phase::Running;
            }
        });
    }

    fn kill(&mut self) {
        let mut state = self.inner.borrow_mut();
        if let Some(slot) = state.tweens.remove(&self.id) {
            let contribution = slot.contribution();
            let settled = state
                .settled
                .entry(slot.element_id)
                .or_insert_with(ElementTransformState::zero);
            if slot.phase != Phase::Idle {
                settled.translate_by(slot.offset);
            }
            settled.add_scaled(&slot.delta, contribution);
        }
    }

    fn on_complete(&mut self, callback: CompletionCallback) {
        self.with_slot(|slot| slot.callback = Some(callback));
    }

    fn is_active(&self) -> bool {
        self.with_slot(|slot| slot.phase == Phase::Running)
            .unwrap_or(false)
    }

    fn is_reversed(&self) -> bool {
        self.with_slot(|slot| slot.reversed).unwrap_or(false)
    }
}
