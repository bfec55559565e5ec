//! Configuration for the animation subsystem

use serde::{Deserialize, Serialize};

use super::easing::EasingFunction;

/// Defaults and thresholds used when analyzing and scheduling animations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Effects changing less than this (scale delta, translate length,
    /// rotation degrees, opacity delta) are dropped
    pub significance_threshold: f64,

    /// Tween duration when neither the effect nor the sync data sets one
    pub default_duration_ms: f64,

    pub default_easing: EasingFunction,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            significance_threshold: 0.001,
            default_duration_ms: 500.0,
            default_easing: EasingFunction::EaseOut,
        }
    }
}

impl AnimationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_significance_threshold(mut self, threshold: f64) -> Self {
        self.significance_threshold = threshold;
        self
    }

    pub fn with_default_duration(mut self, duration_ms: f64) -> Self {
        self.default_duration_ms = duration_ms;
        self
    }

    pub fn with_default_easing(mut self, easing: EasingFunction) -> Self {
        self.default_easing = easing;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnimationConfig::default();
        assert_eq!(config.significance_threshold, 0.001);
        assert_eq!(config.default_duration_ms, 500.0);
        assert_eq!(config.default_easing, EasingFunction::EaseOut);
    }

    #[test]
    fn test_toml_overrides() {
        let config: AnimationConfig =
            toml::from_str("default_duration_ms = 250.0\ndefault_easing = \"linear\"").unwrap();
        assert_eq!(config.default_duration_ms, 250.0);
        assert_eq!(config.default_easing, EasingFunction::Linear);
        assert_eq!(config.significance_threshold, 0.001);
    }
}
