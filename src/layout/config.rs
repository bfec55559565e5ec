//! Configuration for the layout engine

use serde::{Deserialize, Serialize};

/// Configuration options for layout computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Upper bound on resolver passes before unresolved elements are reported
    pub max_passes: usize,

    /// Estimated glyph width as a fraction of the font size
    pub char_width_factor: f64,

    /// Estimated line height as a fraction of the font size
    pub line_height_factor: f64,

    /// Font size used when a text element does not specify one
    pub default_font_size: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_passes: 10,
            char_width_factor: 0.5,
            line_height_factor: 1.0,
            default_font_size: 14.0,
        }
    }
}

impl LayoutConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of resolver passes
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = passes;
        self
    }

    /// Set the text metrics used by the estimating measurer
    pub fn with_text_metrics(mut self, char_width_factor: f64, line_height_factor: f64) -> Self {
        self.char_width_factor = char_width_factor;
        self.line_height_factor = line_height_factor;
        self
    }

    /// Set the fallback font size
    pub fn with_default_font_size(mut self, size: f64) -> Self {
        self.default_font_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LayoutConfig::default();
        assert_eq!(config.max_passes, 10);
        assert_eq!(config.char_width_factor, 0.5);
        assert_eq!(config.line_height_factor, 1.0);
        assert_eq!(config.default_font_size, 14.0);
    }

    #[test]
    fn test_builder_pattern() {
        let config = LayoutConfig::new()
            .with_max_passes(3)
            .with_default_font_size(20.0);

        assert_eq!(config.max_passes, 3);
        assert_eq!(config.default_font_size, 20.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: LayoutConfig = toml::from_str("max_passes = 4").unwrap();
        assert_eq!(config.max_passes, 4);
        assert_eq!(config.default_font_size, 14.0);
    }
}
