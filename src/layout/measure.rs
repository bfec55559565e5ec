//! Intrinsic (content-derived) element sizes
//!
//! Measuring content is a side-effecting step owned by the host (font metrics,
//! live text nodes). The resolver asks a [`ContentMeasurer`] once per element and
//! caches the answer in [`IntrinsicSize`](super::element::IntrinsicSize).

use super::config::LayoutConfig;
use super::element::{Element, ElementKind};

/// Produces the natural size of an element's content
pub trait ContentMeasurer {
    /// Return `(width, height)` of the element's content
    fn measure(&self, element: &Element) -> (f64, f64);
}

/// Character-count text estimate, used when no real font metrics are available
#[derive(Debug, Clone)]
pub struct EstimatingMeasurer {
    char_width_factor: f64,
    line_height_factor: f64,
    default_font_size: f64,
}

impl EstimatingMeasurer {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            char_width_factor: config.char_width_factor,
            line_height_factor: config.line_height_factor,
            default_font_size: config.default_font_size,
        }
    }

    fn text_size(&self, text: &str, font_size: Option<f64>) -> (f64, f64) {
        let size = font_size.unwrap_or(self.default_font_size);
        let lines: Vec<&str> = text.lines().collect();
        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let line_count = lines.len().max(1);
        (
            longest as f64 * size * self.char_width_factor,
            line_count as f64 * size * self.line_height_factor,
        )
    }
}

impl Default for EstimatingMeasurer {
    fn default() -> Self {
        Self::new(&LayoutConfig::default())
    }
}

impl ContentMeasurer for EstimatingMeasurer {
    fn measure(&self, element: &Element) -> (f64, f64) {
        match &element.kind {
            ElementKind::Text { text, font_size } => self.text_size(text, *font_size),
            ElementKind::Button {
                text: Some(text),
                font_size,
            } => self.text_size(text, *font_size),
            ElementKind::Button { text: None, .. }
            | ElementKind::Rectangle
            | ElementKind::Endcap
            | ElementKind::Graph => (0.0, 0.0),
        }
    }
}

/// Make sure the element's intrinsic size has been measured, measuring at most once
pub fn ensure_intrinsic_size(element: &mut Element, measurer: &dyn ContentMeasurer) {
    if element.intrinsic_size.calculated {
        return;
    }
    let (width, height) = measurer.measure(element);
    element.intrinsic_size.width = width;
    element.intrinsic_size.height = height;
    element.intrinsic_size.calculated = true;
    log::trace!("measured '{}' as {}x{}", element.id, width, height);
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_text_estimate_matches_default_metrics() {
        // 14px font: 7px per character, 14px per line
        let measurer = EstimatingMeasurer::default();
        let element = Element::text("t", "STATUS");
        assert_eq!(measurer.measure(&element), (42.0, 14.0));
    }

    #[test]
    fn test_multiline_text_uses_longest_line() {
        let measurer = EstimatingMeasurer::default();
        let element = Element::new(
            "t",
            ElementKind::Text {
                text: "AB\nABCD".to_string(),
                font_size: Some(10.0),
            },
        );
        assert_eq!(measurer.measure(&element), (20.0, 20.0));
    }

    #[test]
    fn test_shapes_have_no_intrinsic_size() {
        let measurer = EstimatingMeasurer::default();
        assert_eq!(
            measurer.measure(&Element::new("r", ElementKind::Rectangle)),
            (0.0, 0.0)
        );
    }

    struct CountingMeasurer {
        calls: Cell<usize>,
    }

    impl ContentMeasurer for CountingMeasurer {
        fn measure(&self, _element: &Element) -> (f64, f64) {
            self.calls.set(self.calls.get() + 1);
            (5.0, 6.0)
        }
    }

    #[test]
    fn test_measurement_is_cached() {
        let measurer = CountingMeasurer {
            calls: Cell::new(0),
        };
        let mut element = Element::text("t", "x");
        ensure_intrinsic_size(&mut element, &measurer);
        ensure_intrinsic_size(&mut element, &measurer);
        assert_eq!(measurer.calls.get(), 1);
        assert_eq!(element.intrinsic_size.width, 5.0);
        assert!(element.intrinsic_size.calculated);
    }
}
