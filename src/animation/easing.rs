//! Easing functions for tween timing
//!
//! CSS-compatible curves (`linear`, `ease`, `ease-in`, `ease-out`,
//! `ease-in-out`, `cubic-bezier(x1, y1, x2, y2)`). The common tween-library
//! spellings (`none`, `power2.out`, `sine.inOut`, ...) are accepted as aliases
//! of the nearest CSS curve.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Easing function for tween timing.
///
/// Maps linear progress in `[0, 1]` to eased progress.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EasingFunction {
    Linear,
    /// `cubic-bezier(0.25, 0.1, 0.25, 1.0)`
    Ease,
    /// `cubic-bezier(0.42, 0, 1, 1)`
    EaseIn,
    /// `cubic-bezier(0, 0, 0.58, 1)`
    #[default]
    EaseOut,
    /// `cubic-bezier(0.42, 0, 0.58, 1)`
    EaseInOut,
    /// Custom curve; x values must lie in `[0, 1]`
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl EasingFunction {
    /// Evaluate the easing function at the given progress.
    pub fn evaluate(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            Self::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Self::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(*x1, *y1, *x2, *y2, t),
        }
    }

    /// Create a custom cubic bezier easing, rejecting x values outside `[0, 1]`.
    pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Option<Self> {
        ((0.0..=1.0).contains(&x1) && (0.0..=1.0).contains(&x2))
            .then_some(Self::CubicBezier { x1, y1, x2, y2 })
    }

    /// Parse a CSS or tween-library easing name.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if let Some(args) = name
            .strip_prefix("cubic-bezier(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let values: Vec<f64> = args
                .split(',')
                .map(|v| v.trim().parse::<f64>())
                .collect::<Result<_, _>>()
                .ok()?;
            return match values.as_slice() {
                [x1, y1, x2, y2] => Self::cubic_bezier(*x1, *y1, *x2, *y2),
                _ => None,
            };
        }

        let lower = name.to_ascii_lowercase();
        let easing = match lower.as_str() {
            "linear" | "none" => Self::Linear,
            "ease" => Self::Ease,
            "ease-in" | "ease_in" | "easein" => Self::EaseIn,
            "ease-out" | "ease_out" | "easeout" => Self::EaseOut,
            "ease-in-out" | "ease_in_out" | "easeinout" => Self::EaseInOut,
            other => {
                // power1.out, sine.inOut, quad.in, ...
                let (_, direction) = other.split_once('.')?;
                match direction {
                    "in" => Self::EaseIn,
                    "out" => Self::EaseOut,
                    "inout" => Self::EaseInOut,
                    _ => return None,
                }
            }
        };
        Some(easing)
    }
}

impl TryFrom<String> for EasingFunction {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::parse(&name).ok_or_else(|| format!("unknown easing '{}'", name))
    }
}

impl From<EasingFunction> for String {
    fn from(easing: EasingFunction) -> String {
        easing.to_string()
    }
}

impl fmt::Display for EasingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("linear"),
            Self::Ease => f.write_str("ease"),
            Self::EaseIn => f.write_str("ease-in"),
            Self::EaseOut => f.write_str("ease-out"),
            Self::EaseInOut => f.write_str("ease-in-out"),
            Self::CubicBezier { x1, y1, x2, y2 } => {
                write!(f, "cubic-bezier({}, {}, {}, {})", x1, y1, x2, y2)
            }
        }
    }
}

/// Evaluate a cubic bezier curve at time t.
///
/// Newton-Raphson finds the curve parameter whose x equals the progress, then
/// the y coordinate at that parameter is returned.
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, progress: f64) -> f64 {
    if progress <= 0.0 {
        return 0.0;
    }
    if progress >= 1.0 {
        return 1.0;
    }

    let t = solve_bezier_x(x1, x2, progress);
    bezier_component(y1, y2, t)
}

fn solve_bezier_x(x1: f64, x2: f64, target_x: f64) -> f64 {
    let mut t = target_x;

    for _ in 0..8 {
        let x = bezier_component(x1, x2, t) - target_x;
        if x.abs() < 1e-7 {
            break;
        }

        let dx = bezier_derivative(x1, x2, t);
        if dx.abs() < 1e-7 {
            break;
        }

        t = (t - x / dx).clamp(0.0, 1.0);
    }

    t
}

/// B(t) = 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³
#[inline]
fn bezier_component(p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t
}

/// B'(t) = 3(1-t)²·p1 + 6(1-t)t·(p2-p1) + 3t²·(1-p2)
#[inline]
fn bezier_derivative(p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * p1 + 6.0 * mt * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}
