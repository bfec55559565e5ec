//! Animation descriptions and normalized transform effects
//!
//! [`AnimationEffect`] is what a dashboard author writes ("scale to 1.2 over
//! 300ms"). The analyzer turns it into [`TransformEffect`]s: absolute, typed
//! transforms that the propagator can compute displacements for.

use serde::{Deserialize, Serialize};

use super::easing::EasingFunction;
use super::transform::{ElementTransformState, RotationTransform, ScaleTransform};
use crate::layout::types::{Dimension, Point, Vector};

/// Direction of a slide effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideDirection {
    Left,
    Right,
    Up,
    Down,
}

impl SlideDirection {
    /// Unit vector in screen coordinates (Y down)
    pub fn unit(self) -> Vector {
        match self {
            SlideDirection::Left => Vector::new(-1.0, 0.0),
            SlideDirection::Right => Vector::new(1.0, 0.0),
            SlideDirection::Up => Vector::new(0.0, -1.0),
            SlideDirection::Down => Vector::new(0.0, 1.0),
        }
    }
}

/// Whether a slide moves the element away from its place or into it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    /// Start displaced by the negated slide vector and end in place
    In,
    #[default]
    Out,
}

/// Free-form transform parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomParams {
    pub scale: Option<f64>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rotation: Option<f64>,
    pub opacity: Option<f64>,
    pub transform_origin: Option<String>,
}

/// The kind-specific half of an [`AnimationEffect`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EffectKind {
    Scale {
        #[serde(default)]
        scale_start: Option<f64>,
        scale_end: f64,
        #[serde(default)]
        transform_origin: Option<String>,
    },
    Slide {
        direction: SlideDirection,
        distance: Dimension,
        #[serde(default)]
        movement: Movement,
    },
    Rotate {
        #[serde(default)]
        rotation_start: Option<f64>,
        rotation_end: f64,
        #[serde(default)]
        transform_origin: Option<String>,
    },
    Fade {
        #[serde(default)]
        opacity_start: Option<f64>,
        opacity_end: f64,
    },
    Custom {
        #[serde(default)]
        params: CustomParams,
    },
}

/// A declarative animation on one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationEffect {
    #[serde(flatten)]
    pub kind: EffectKind,
    #[serde(default)]
    pub duration_ms: Option<f64>,
    #[serde(default)]
    pub delay_ms: Option<f64>,
    #[serde(default)]
    pub easing: Option<EasingFunction>,
}

impl AnimationEffect {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            duration_ms: None,
            delay_ms: None,
            easing: None,
        }
    }

    /// Uniform scale to `scale_end` from the current scale
    pub fn scale(scale_end: f64) -> Self {
        Self::new(EffectKind::Scale {
            scale_start: None,
            scale_end,
            transform_origin: None,
        })
    }

    pub fn slide(direction: SlideDirection, distance: impl Into<Dimension>, movement: Movement) -> Self {
        Self::new(EffectKind::Slide {
            direction,
            distance: distance.into(),
            movement,
        })
    }

    pub fn rotate(rotation_end: f64) -> Self {
        Self::new(EffectKind::Rotate {
            rotation_start: None,
            rotation_end,
            transform_origin: None,
        })
    }

    pub fn fade(opacity_end: f64) -> Self {
        Self::new(EffectKind::Fade {
            opacity_start: None,
            opacity_end,
        })
    }

    pub fn custom(params: CustomParams) -> Self {
        Self::new(EffectKind::Custom { params })
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_delay(mut self, delay_ms: f64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }

    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = Some(easing);
        self
    }

    /// Set an explicit transform origin (scale, rotate and custom effects only)
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        let origin = Some(origin.into());
        match &mut self.kind {
            EffectKind::Scale {
                transform_origin, ..
            }
            | EffectKind::Rotate {
                transform_origin, ..
            } => *transform_origin = origin,
            EffectKind::Custom { params } => params.transform_origin = origin,
            EffectKind::Slide { .. } | EffectKind::Fade { .. } => {}
        }
        self
    }

    /// Set an explicit start value (scale, rotate and fade effects only)
    pub fn from_value(mut self, start: f64) -> Self {
        match &mut self.kind {
            EffectKind::Scale { scale_start, .. } => *scale_start = Some(start),
            EffectKind::Rotate { rotation_start, .. } => *rotation_start = Some(start),
            EffectKind::Fade { opacity_start, .. } => *opacity_start = Some(start),
            EffectKind::Slide { .. } | EffectKind::Custom { .. } => {}
        }
        self
    }
}

/// An ordered list of effects played back to back on one element
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnimationSequence {
    pub steps: Vec<AnimationEffect>,
}

impl AnimationSequence {
    pub fn new(steps: Vec<AnimationEffect>) -> Self {
        Self { steps }
    }
}

/// Timing overrides shared by a primary animation and all of its compensations
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncData {
    pub duration_ms: Option<f64>,
    pub delay_ms: Option<f64>,
    pub easing: Option<EasingFunction>,
}

impl SyncData {
    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_delay(mut self, delay_ms: f64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }

    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = Some(easing);
        self
    }
}

/// Fully resolved tween timing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectTiming {
    pub duration_ms: f64,
    pub delay_ms: f64,
    pub easing: EasingFunction,
}

/// A normalized transform with absolute coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformEffect {
    Scale {
        start: (f64, f64),
        target: (f64, f64),
        origin: Point,
    },
    Translate {
        x: f64,
        y: f64,
        /// Displacement applied before the tween starts (slide-in)
        initial_offset: Vector,
    },
    Rotate {
        /// Degrees, clockwise
        start: f64,
        target: f64,
        origin: Point,
    },
    Fade {
        start: f64,
        end: f64,
    },
}

impl TransformEffect {
    /// Plain translate with no initial offset
    pub fn translate(delta: Vector) -> Self {
        TransformEffect::Translate {
            x: delta.x,
            y: delta.y,
            initial_offset: Vector::zero(),
        }
    }

    pub fn is_translate(&self) -> bool {
        matches!(self, TransformEffect::Translate { .. })
    }

    /// Scale and rotate: effects that move points around an origin
    pub fn is_pivoting(&self) -> bool {
        matches!(
            self,
            TransformEffect::Scale { .. } | TransformEffect::Rotate { .. }
        )
    }

    /// How far an absolute point moves under this effect
    ///
    /// Translate initial offsets are not included; they travel separately.
    pub fn displacement(&self, point: Point) -> Vector {
        match *self {
            TransformEffect::Scale {
                start,
                target,
                origin,
            } => ScaleTransform::new(start, target, origin).displacement(point),
            TransformEffect::Translate { x, y, .. } => Vector::new(x, y),
            TransformEffect::Rotate {
                start,
                target,
                origin,
            } => {
                // The point has already been carried to its `start` rotation
                RotationTransform::new(target, origin).transform_point(point)
                    - RotationTransform::new(start, origin).transform_point(point)
            }
            TransformEffect::Fade { .. } => Vector::zero(),
        }
    }

    pub fn initial_offset(&self) -> Vector {
        match *self {
            TransformEffect::Translate { initial_offset, .. } => initial_offset,
            _ => Vector::zero(),
        }
    }

    /// Copy of this effect without its initial offset
    pub fn without_initial_offset(&self) -> Self {
        self.with_initial_offset(Vector::zero())
    }

    /// Copy of a translate with its initial offset replaced; other effects are unchanged
    pub fn with_initial_offset(&self, initial_offset: Vector) -> Self {
        match *self {
            TransformEffect::Translate { x, y, .. } => TransformEffect::Translate {
                x,
                y,
                initial_offset,
            },
            other => other,
        }
    }

    /// True when the effect changes anything by at least `threshold`
    pub fn is_significant(&self, threshold: f64) -> bool {
        match *self {
            TransformEffect::Scale { start, target, .. } => {
                (target.0 - start.0).abs() >= threshold || (target.1 - start.1).abs() >= threshold
            }
            TransformEffect::Translate {
                x,
                y,
                initial_offset,
            } => {
                Vector::new(x, y).magnitude() >= threshold || initial_offset.magnitude() >= threshold
            }
            TransformEffect::Rotate { start, target, .. } => (target - start).abs() >= threshold,
            TransformEffect::Fade { start, end } => (end - start).abs() >= threshold,
        }
    }

    /// Commit this effect into a tracked state
    pub fn apply_to(&self, state: &mut ElementTransformState) {
        match *self {
            TransformEffect::Scale { target, .. } => {
                state.scale_x = target.0;
                state.scale_y = target.1;
            }
            TransformEffect::Translate {
                x,
                y,
                initial_offset,
            } => state.translate_by(Vector::new(x, y) + initial_offset),
            TransformEffect::Rotate { target, .. } => state.rotation = target,
            TransformEffect::Fade { end, .. } => state.opacity = end,
        }
    }

    /// Undo [`apply_to`](Self::apply_to)
    pub fn unapply_from(&self, state: &mut ElementTransformState) {
        match *self {
            TransformEffect::Scale { start, .. } => {
                state.scale_x = start.0;
                state.scale_y = start.1;
            }
            TransformEffect::Translate {
                x,
                y,
                initial_offset,
            } => state.translate_by(-(Vector::new(x, y) + initial_offset)),
            TransformEffect::Rotate { start, .. } => state.rotation = start,
            TransformEffect::Fade { start, .. } => state.opacity = start,
        }
    }
}

/// Sum of displacements of `point` under every effect
pub fn total_displacement<'a>(
    effects: impl IntoIterator<Item = &'a TransformEffect>,
    point: Point,
) -> Vector {
    effects
        .into_iter()
        .fold(Vector::zero(), |acc, effect| acc + effect.displacement(point))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 0.001;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_fade_never_displaces() {
        let fade = TransformEffect::Fade {
            start: 1.0,
            end: 0.0,
        };
        assert_eq!(fade.displacement(Point::new(123.0, 456.0)), Vector::zero());
        assert!(!fade.is_pivoting());
    }

    #[test]
    fn test_translate_displacement_ignores_initial_offset() {
        let slide = TransformEffect::Translate {
            x: 30.0,
            y: 0.0,
            initial_offset: Vector::new(-30.0, 0.0),
        };
        assert_eq!(slide.displacement(Point::origin()), Vector::new(30.0, 0.0));
        assert_eq!(slide.without_initial_offset().initial_offset(), Vector::zero());
    }

    #[test]
    fn test_rotation_displacement_starts_from_current_angle() {
        // centerRight of a 100x100 box, rotated about its centre
        let point = Point::new(100.0, 50.0);
        let origin = Point::new(50.0, 50.0);
        let first = TransformEffect::Rotate {
            start: 0.0,
            target: 90.0,
            origin,
        };
        let second = TransformEffect::Rotate {
            start: 90.0,
            target: 180.0,
            origin,
        };
        let d1 = first.displacement(point);
        assert!(approx_eq(d1.x, -50.0) && approx_eq(d1.y, 50.0), "{:?}", d1);
        let d2 = second.displacement(point);
        assert!(approx_eq(d2.x, -50.0) && approx_eq(d2.y, -50.0), "{:?}", d2);

        // Together they land the point on the opposite side of the centre
        let total = d1 + d2;
        assert!(approx_eq(total.x, -100.0) && approx_eq(total.y, 0.0), "{:?}", total);
    }

    #[test]
    fn test_significance() {
        let tiny = TransformEffect::Scale {
            start: (1.0, 1.0),
            target: (1.0005, 1.0),
            origin: Point::origin(),
        };
        assert!(!tiny.is_significant(0.001));
        let offset_only = TransformEffect::Translate {
            x: 0.0,
            y: 0.0,
            initial_offset: Vector::new(5.0, 0.0),
        };
        assert!(offset_only.is_significant(0.001));
    }

    #[test]
    fn test_apply_then_unapply_restores_state() {
        let mut state = ElementTransformState::identity();
        let effects = [
            TransformEffect::Scale {
                start: (1.0, 1.0),
                target: (1.5, 1.5),
                origin: Point::origin(),
            },
            TransformEffect::Translate {
                x: 10.0,
                y: 5.0,
                initial_offset: Vector::zero(),
            },
            TransformEffect::Rotate {
                start: 0.0,
                target: 45.0,
                origin: Point::origin(),
            },
        ];
        for effect in &effects {
            effect.apply_to(&mut state);
        }
        assert!(approx_eq(state.scale_x, 1.5));
        assert!(approx_eq(state.translate_x, 10.0));
        for effect in effects.iter().rev() {
            effect.unapply_from(&mut state);
        }
        assert_eq!(state, ElementTransformState::identity());
    }

    #[test]
    fn test_total_displacement_sums_effects() {
        let effects = [
            TransformEffect::translate(Vector::new(5.0, 0.0)),
            TransformEffect::Scale {
                start: (1.0, 1.0),
                target: (2.0, 2.0),
                origin: Point::origin(),
            },
        ];
        let d = total_displacement(&effects, Point::new(10.0, 10.0));
        assert!(approx_eq(d.x, 15.0));
        assert!(approx_eq(d.y, 10.0));
    }

    #[test]
    fn test_effect_deserializes_from_toml() {
        let effect: AnimationEffect = toml::from_str(
            r#"
type = "slide"
direction = "left"
distance = "50%"
movement = "in"
duration_ms = 250
easing = "power2.out"
"#,
        )
        .unwrap();
        assert_eq!(
            effect.kind,
            EffectKind::Slide {
                direction: SlideDirection::Left,
                distance: Dimension::Percent(50.0),
                movement: Movement::In,
            }
        );
        assert_eq!(effect.duration_ms, Some(250.0));
        assert_eq!(effect.easing, Some(EasingFunction::EaseOut));
    }
}
