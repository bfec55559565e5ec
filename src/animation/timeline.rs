//! Registry of live propagation timelines
//!
//! Every tween scheduled by the propagator is recorded here, keyed by the element
//! it animates and tagged with the element whose animation caused it (its
//! origin). Reversal and stop act on timelines by origin.
//!
//! Tween completions arrive through callbacks that only push onto a shared queue;
//! the registry applies them when [`TimelineRegistry::drain_completions`] runs.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use super::effect::TransformEffect;
use super::tween::{CompletionCallback, Tween, TweenEnd};

pub type TimelineId = u64;

/// Why a timeline exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineRole {
    /// The animated element's own effects, merged with its self-compensation
    Primary,
    /// Keeps a dependent attached to the element it follows
    Compensation,
}

/// A scheduled tween and the bookkeeping needed to reverse or stop it
pub struct PropagationTimeline {
    pub id: TimelineId,
    pub tween: Box<dyn Tween>,
    pub element_id: String,
    /// Element whose animation produced this timeline
    pub origin: String,
    pub role: TimelineRole,
    /// Committed into the element's transform state when scheduled
    pub effects: Vec<TransformEffect>,
    pub is_reversed: bool,
    /// Finished playing forward; still reversible until superseded
    pub completed: bool,
}

impl PropagationTimeline {
    /// Toggle playback direction, returning the new `is_reversed`
    pub fn toggle(&mut self) -> bool {
        self.tween.reverse();
        self.is_reversed = !self.is_reversed;
        self.completed = false;
        self.is_reversed
    }
}

impl fmt::Debug for PropagationTimeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropagationTimeline")
            .field("id", &self.id)
            .field("element_id", &self.element_id)
            .field("origin", &self.origin)
            .field("role", &self.role)
            .field("effects", &self.effects)
            .field("is_reversed", &self.is_reversed)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

type CompletionQueue = Rc<RefCell<VecDeque<(TimelineId, TweenEnd)>>>;

/// Live timelines, keyed by element id
#[derive(Default)]
pub struct TimelineRegistry {
    timelines: HashMap<String, Vec<PropagationTimeline>>,
    next_id: TimelineId,
    completions: CompletionQueue,
}

impl fmt::Debug for TimelineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineRegistry")
            .field("timelines", &self.timelines)
            .field("pending_completions", &self.completions.borrow().len())
            .finish()
    }
}

impl TimelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the id for the next timeline
    pub fn allocate_id(&mut self) -> TimelineId {
        self.next_id += 1;
        self.next_id
    }

    /// Callback that reports a tween's completion for timeline `id`
    pub fn completion_callback(&self, id: TimelineId) -> CompletionCallback {
        let queue = Rc::clone(&self.completions);
        Box::new(move |end| queue.borrow_mut().push_back((id, end)))
    }

    pub fn insert(&mut self, timeline: PropagationTimeline) {
        self.timelines
            .entry(timeline.element_id.clone())
            .or_default()
            .push(timeline);
    }

    /// Apply queued completions: reverse completions remove their timeline,
    /// forward completions mark it completed
    pub fn drain_completions(&mut self) -> usize {
        let pending: Vec<(TimelineId, TweenEnd)> = self.completions.borrow_mut().drain(..).collect();
        let count = pending.len();

        for (id, end) in pending {
            for list in self.timelines.values_mut() {
                let Some(pos) = list.iter().position(|t| t.id == id) else {
                    continue;
                };
                match end {
                    TweenEnd::Forward => list[pos].completed = true,
                    TweenEnd::Reverse => {
                        let timeline = list.remove(pos);
                        log::trace!(
                            "timeline {} on '{}' finished reversing",
                            timeline.id,
                            timeline.element_id
                        );
                    }
                }
                break;
            }
        }

        self.timelines.retain(|_, list| !list.is_empty());
        count
    }

    /// Drop forward-completed timelines of an origin that is about to animate again
    pub fn supersede_completed(&mut self, origin: &str) -> usize {
        let mut dropped = 0;
        for list in self.timelines.values_mut() {
            list.retain_mut(|t| {
                if t.origin == origin && t.completed && !t.is_reversed {
                    t.tween.kill();
                    dropped += 1;
                    false
                } else {
                    true
                }
            });
        }
        self.timelines.retain(|_, list| !list.is_empty());
        dropped
    }

    pub fn for_element(&self, element_id: &str) -> &[PropagationTimeline] {
        self.timelines
            .get(element_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Timelines on `element_id` that were caused by `origin`
    pub fn for_origin_mut<'a>(
        &'a mut self,
        element_id: &str,
        origin: &'a str,
    ) -> impl Iterator<Item = &'a mut PropagationTimeline> + 'a {
        self.timelines
            .get_mut(element_id)
            .into_iter()
            .flat_map(|list| list.iter_mut())
            .filter(move |t| t.origin == origin)
    }

    /// Every timeline caused by `origin`, on any element
    pub fn by_origin<'a>(&'a self, origin: &'a str) -> impl Iterator<Item = &'a PropagationTimeline> + 'a {
        self.timelines
            .values()
            .flat_map(|list| list.iter())
            .filter(move |t| t.origin == origin)
    }

    /// Remove the timelines on `element_id` caused by `origin`
    pub fn remove_for_origin(&mut self, element_id: &str, origin: &str) -> Vec<PropagationTimeline> {
        let Some(list) = self.timelines.get_mut(element_id) else {
            return Vec::new();
        };
        let (removed, kept): (Vec<_>, Vec<_>) = list.drain(..).partition(|t| t.origin == origin);
        *list = kept;
        if list.is_empty() {
            self.timelines.remove(element_id);
        }
        removed
    }

    /// Remove and return every timeline
    pub fn take_all(&mut self) -> Vec<PropagationTimeline> {
        self.completions.borrow_mut().clear();
        self.timelines.drain().flat_map(|(_, list)| list).collect()
    }

    /// Total number of recorded timelines
    pub fn len(&self) -> usize {
        self.timelines.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of timelines whose tween is still playing
    pub fn live_count(&self) -> usize {
        self.timelines
            .values()
            .flat_map(|list| list.iter())
            .filter(|t| t.tween.is_active())
            .count()
    }
}
