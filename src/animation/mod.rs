//! Live transform propagation for animated dashboard elements
//!
//! Animations are described declaratively ([`AnimationEffect`]), normalized by
//! the analyzer into [`TransformEffect`]s, and propagated through the element
//! graph by the [`Propagator`], which keeps dependents attached while tweens play.

pub mod analyzer;
pub mod config;
pub mod dependency;
pub mod easing;
pub mod effect;
pub mod error;
pub mod propagator;
pub mod timeline;
pub mod transform;
pub mod tween;

pub use analyzer::analyze;
pub use config::AnimationConfig;
pub use dependency::{DependencyIndex, InvalidationSource};
pub use easing::EasingFunction;
pub use effect::{
    AnimationEffect, AnimationSequence, CustomParams, EffectKind, EffectTiming, Movement,
    SlideDirection, SyncData, TransformEffect,
};
pub use error::AnimationError;
pub use propagator::{
    PropagationContext, PropagationOutcome, Propagator, ScheduledTransform, SequenceOutcome,
};
pub use timeline::{PropagationTimeline, TimelineId, TimelineRegistry, TimelineRole};
pub use transform::{ElementTransformState, RotationTransform, ScaleTransform};
pub use tween::{FrameTicker, NodeHandle, NodeResolver, Tween, TweenBackend, TweenEnd, TweenSpec};
