//! Turns declarative animation effects into normalized transform effects
//!
//! Start values default to the element's tracked [`ElementTransformState`], so
//! an animation always continues from wherever earlier animations left the
//! element. Transform origins are resolved against the element's calculated
//! box into absolute coordinates.

use super::config::AnimationConfig;
use super::effect::{AnimationEffect, CustomParams, EffectKind, Movement, TransformEffect};
use super::transform::ElementTransformState;
use crate::layout::element::Element;
use crate::layout::types::{BoundingBox, Dimension, Point, Vector};

/// Normalize an effect on `element`, dropping insignificant parts
pub fn analyze(
    effect: &AnimationEffect,
    element: &Element,
    state: &ElementTransformState,
    config: &AnimationConfig,
) -> Vec<TransformEffect> {
    let bounds = element.bounds();

    let effects = match &effect.kind {
        EffectKind::Scale {
            scale_start,
            scale_end,
            transform_origin,
        } => {
            let start = scale_start.map_or((state.scale_x, state.scale_y), |s| (s, s));
            vec![TransformEffect::Scale {
                start,
                target: (*scale_end, *scale_end),
                origin: resolve_origin(transform_origin.as_deref(), element),
            }]
        }
        EffectKind::Slide {
            direction,
            distance,
            movement,
        } => {
            let length = match distance {
                Dimension::Px(px) => *px,
                Dimension::Percent(_) => distance.resolve(bounds.width.max(bounds.height)),
            };
            let unit = direction.unit();
            let vector = Vector::new(unit.x * length, unit.y * length);
            let initial_offset = match movement {
                Movement::In => -vector,
                Movement::Out => Vector::zero(),
            };
            vec![TransformEffect::Translate {
                x: vector.x,
                y: vector.y,
                initial_offset,
            }]
        }
        EffectKind::Rotate {
            rotation_start,
            rotation_end,
            transform_origin,
        } => vec![TransformEffect::Rotate {
            start: rotation_start.unwrap_or(state.rotation),
            target: *rotation_end,
            origin: resolve_origin(transform_origin.as_deref(), element),
        }],
        EffectKind::Fade {
            opacity_start,
            opacity_end,
        } => vec![TransformEffect::Fade {
            start: opacity_start.unwrap_or(state.opacity),
            end: *opacity_end,
        }],
        EffectKind::Custom { params } => analyze_custom(params, element, state),
    };

    let (kept, dropped): (Vec<_>, Vec<_>) = effects
        .into_iter()
        .partition(|e| e.is_significant(config.significance_threshold));
    if !dropped.is_empty() {
        log::trace!(
            "'{}': dropped {} insignificant effect(s)",
            element.id,
            dropped.len()
        );
    }
    kept
}

fn analyze_custom(
    params: &CustomParams,
    element: &Element,
    state: &ElementTransformState,
) -> Vec<TransformEffect> {
    let mut effects = Vec::new();

    let scale_x = params.scale_x.or(params.scale);
    let scale_y = params.scale_y.or(params.scale);
    if scale_x.is_some() || scale_y.is_some() {
        effects.push(TransformEffect::Scale {
            start: (state.scale_x, state.scale_y),
            target: (
                scale_x.unwrap_or(state.scale_x),
                scale_y.unwrap_or(state.scale_y),
            ),
            origin: resolve_origin(params.transform_origin.as_deref(), element),
        });
    }

    if params.x.is_some() || params.y.is_some() {
        effects.push(TransformEffect::translate(Vector::new(
            params.x.unwrap_or(0.0),
            params.y.unwrap_or(0.0),
        )));
    }

    if let Some(rotation) = params.rotation {
        effects.push(TransformEffect::Rotate {
            start: state.rotation,
            target: rotation,
            origin: resolve_origin(params.transform_origin.as_deref(), element),
        });
    }

    if let Some(opacity) = params.opacity {
        effects.push(TransformEffect::Fade {
            start: state.opacity,
            end: opacity,
        });
    }

    effects
}

/// Absolute transform origin for an element
///
/// An explicit origin string wins. Otherwise an anchored element pivots on its
/// own anchor point and a free element pivots on its center.
pub fn resolve_origin(origin: Option<&str>, element: &Element) -> Point {
    let bounds = element.bounds();
    if let Some(spec) = origin {
        match parse_origin(spec, &bounds) {
            Some(point) => return point,
            None => log::warn!(
                "element '{}': unrecognized transform origin '{}', using center",
                element.id,
                spec
            ),
        }
        return bounds.center();
    }

    match &element.layout_config.anchor {
        Some(anchor) => anchor.anchor_point.position(&bounds),
        None => bounds.center(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum OriginComponent {
    Left,
    Right,
    Top,
    Bottom,
    Center,
    Length(Dimension),
}

impl OriginComponent {
    fn parse(token: &str) -> Option<Self> {
        Some(match token.to_ascii_lowercase().as_str() {
            "left" => Self::Left,
            "right" => Self::Right,
            "top" => Self::Top,
            "bottom" => Self::Bottom,
            "center" | "middle" => Self::Center,
            other => Self::Length(Dimension::parse(other)?),
        })
    }

    fn is_vertical(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }

    fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    /// Offset along an axis of the given length
    fn resolve(self, length: f64) -> f64 {
        match self {
            Self::Left | Self::Top => 0.0,
            Self::Center => length / 2.0,
            Self::Right | Self::Bottom => length,
            Self::Length(d) => d.resolve(length),
        }
    }
}

/// Parse a CSS-style `transform-origin` ("center center", "left top", "50% 25%", "10px 4px")
fn parse_origin(spec: &str, bounds: &BoundingBox) -> Option<Point> {
    let tokens: Vec<OriginComponent> = spec
        .split_whitespace()
        .map(OriginComponent::parse)
        .collect::<Option<_>>()?;

    let (horizontal, vertical) = match tokens.as_slice() {
        [single] if single.is_vertical() => (OriginComponent::Center, *single),
        [single] => (*single, OriginComponent::Center),
        [a, b] if a.is_vertical() || b.is_horizontal() => (*b, *a),
        [a, b] => (*a, *b),
        _ => return None,
    };

    if horizontal.is_vertical() || vertical.is_horizontal() {
        return None;
    }

    Some(Point::new(
        bounds.x + horizontal.resolve(bounds.width),
        bounds.y + vertical.resolve(bounds.height),
    ))
}
