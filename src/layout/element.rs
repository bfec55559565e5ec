//! Element graph model
//!
//! An [`ElementGraph`] owns every element of a dashboard view together with its
//! placement rules and its calculated geometry. Elements are addressed by id
//! through an index map; the resolver and the propagator receive the graph by
//! reference and never keep ambient copies of element state.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::anchor::AnchorPoint;
use super::error::LayoutError;
use super::types::{BoundingBox, Dimension};

/// Names that refer to the dashboard container rather than to an element
pub const CONTAINER_SENTINELS: [&str; 2] = ["container", "canvas"];

/// Maximum number of independent stretch rules per element
pub const MAX_STRETCH_TARGETS: usize = 2;

/// What an anchor or stretch rule points at
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnchorTarget {
    /// The dashboard container (spelled `container` or `canvas`)
    Container,
    /// Another element, by id
    Element(String),
}

impl AnchorTarget {
    pub fn element(id: impl Into<String>) -> Self {
        let id = id.into();
        if CONTAINER_SENTINELS.contains(&id.as_str()) {
            AnchorTarget::Container
        } else {
            AnchorTarget::Element(id)
        }
    }

    /// The element id, unless this targets the container
    pub fn element_id(&self) -> Option<&str> {
        match self {
            AnchorTarget::Container => None,
            AnchorTarget::Element(id) => Some(id),
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, AnchorTarget::Container)
    }
}

impl From<String> for AnchorTarget {
    fn from(id: String) -> Self {
        AnchorTarget::element(id)
    }
}

impl From<&str> for AnchorTarget {
    fn from(id: &str) -> Self {
        AnchorTarget::element(id)
    }
}

impl From<AnchorTarget> for String {
    fn from(target: AnchorTarget) -> String {
        match target {
            AnchorTarget::Container => "container".to_string(),
            AnchorTarget::Element(id) => id,
        }
    }
}

impl fmt::Display for AnchorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorTarget::Container => f.write_str("container"),
            AnchorTarget::Element(id) => f.write_str(id),
        }
    }
}

/// "Put my `anchor_point` on `anchor_to`'s `target_anchor_point`"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorConfig {
    pub anchor_to: AnchorTarget,
    #[serde(default)]
    pub anchor_point: AnchorPoint,
    #[serde(default)]
    pub target_anchor_point: AnchorPoint,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
}

impl AnchorConfig {
    pub fn new(
        anchor_to: impl Into<AnchorTarget>,
        anchor_point: AnchorPoint,
        target_anchor_point: AnchorPoint,
    ) -> Self {
        Self {
            anchor_to: anchor_to.into(),
            anchor_point,
            target_anchor_point,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    pub fn with_offset(mut self, offset_x: f64, offset_y: f64) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self
    }
}

/// "Move my nearest edge to `stretch_to`'s `target_stretch_anchor_point`, minus padding"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StretchConfig {
    pub stretch_to: AnchorTarget,
    #[serde(default)]
    pub target_stretch_anchor_point: AnchorPoint,
    #[serde(default)]
    pub padding: f64,
}

impl StretchConfig {
    pub fn new(stretch_to: impl Into<AnchorTarget>, target_point: AnchorPoint) -> Self {
        Self {
            stretch_to: stretch_to.into(),
            target_stretch_anchor_point: target_point,
            padding: 0.0,
        }
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }
}

/// Placement rules of a single element
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConstraints {
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub x: Option<Dimension>,
    pub y: Option<Dimension>,
    pub anchor: Option<AnchorConfig>,
    pub stretch: Vec<StretchConfig>,
}

impl LayoutConstraints {
    /// Ids of every element this one waits on (container targets excluded)
    pub fn referenced_ids(&self) -> impl Iterator<Item = &str> {
        self.anchor
            .iter()
            .filter_map(|a| a.anchor_to.element_id())
            .chain(self.stretch.iter().filter_map(|s| s.stretch_to.element_id()))
    }
}

/// Visual kind of an element, with the content needed to measure it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementKind {
    Rectangle,
    Text {
        text: String,
        font_size: Option<f64>,
    },
    Endcap,
    Button {
        text: Option<String>,
        font_size: Option<f64>,
    },
    Graph,
}

/// Calculated absolute geometry of an element
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayoutState {
    pub bounds: BoundingBox,
    pub calculated: bool,
}

/// Content-derived size, measured once and cached
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IntrinsicSize {
    pub width: f64,
    pub height: f64,
    pub calculated: bool,
}

/// A dashboard element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    #[serde(flatten)]
    pub kind: ElementKind,
    #[serde(flatten)]
    pub layout_config: LayoutConstraints,
    #[serde(skip)]
    pub layout: LayoutState,
    #[serde(skip)]
    pub intrinsic_size: IntrinsicSize,
}

impl Element {
    pub fn new(id: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            kind,
            layout_config: LayoutConstraints::default(),
            layout: LayoutState::default(),
            intrinsic_size: IntrinsicSize::default(),
        }
    }

    /// Rectangle with a fixed pixel size
    pub fn rect(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self::new(id, ElementKind::Rectangle).with_size(width, height)
    }

    /// Text element, sized by measurement
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(
            id,
            ElementKind::Text {
                text: text.into(),
                font_size: None,
            },
        )
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.layout_config.width = Some(Dimension::Px(width));
        self.layout_config.height = Some(Dimension::Px(height));
        self
    }

    pub fn with_width(mut self, width: Dimension) -> Self {
        self.layout_config.width = Some(width);
        self
    }

    pub fn with_height(mut self, height: Dimension) -> Self {
        self.layout_config.height = Some(height);
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.layout_config.x = Some(Dimension::Px(x));
        self.layout_config.y = Some(Dimension::Px(y));
        self
    }

    pub fn anchored(mut self, anchor: AnchorConfig) -> Self {
        self.layout_config.anchor = Some(anchor);
        self
    }

    pub fn stretched(mut self, stretch: StretchConfig) -> Self {
        self.layout_config.stretch.push(stretch);
        self
    }

    /// Current absolute bounds (meaningful once `layout.calculated` is set)
    pub fn bounds(&self) -> BoundingBox {
        self.layout.bounds
    }

    pub fn is_calculated(&self) -> bool {
        self.layout.calculated
    }

    /// The element this one is anchored to, if any (container excluded)
    pub fn anchor_element(&self) -> Option<&str> {
        self.layout_config
            .anchor
            .as_ref()
            .and_then(|a| a.anchor_to.element_id())
    }
}

/// How a dependent element relates to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyType {
    Anchor,
    Stretch,
}

/// Derived edge: `dependent_element_id` is positioned relative to `target_element_id`
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDependency {
    pub dependent_element_id: String,
    pub target_element_id: String,
    /// The dependent's own anchor point (for stretch edges, the tracked target point)
    pub anchor_point: AnchorPoint,
    /// Point on the target that the dependent follows
    pub target_anchor_point: AnchorPoint,
    pub dependency_type: DependencyType,
}

/// Keyed collection of elements in insertion order
#[derive(Debug, Clone, Default)]
pub struct ElementGraph {
    elements: Vec<Element>,
    index: HashMap<String, usize>,
}

impl ElementGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph, rejecting duplicate ids and over-long stretch lists
    pub fn from_elements(elements: impl IntoIterator<Item = Element>) -> Result<Self, LayoutError> {
        let mut graph = Self::new();
        for element in elements {
            graph.insert(element)?;
        }
        Ok(graph)
    }

    /// Add an element, returning its index
    pub fn insert(&mut self, element: Element) -> Result<usize, LayoutError> {
        if self.index.contains_key(&element.id) {
            return Err(LayoutError::duplicate(&element.id));
        }
        if element.layout_config.stretch.len() > MAX_STRETCH_TARGETS {
            return Err(LayoutError::invalid_layout(
                &element.id,
                format!(
                    "at most {} stretch targets are supported, found {}",
                    MAX_STRETCH_TARGETS,
                    element.layout_config.stretch.len()
                ),
            ));
        }
        let idx = self.elements.len();
        self.index.insert(element.id.clone(), idx);
        self.elements.push(element);
        Ok(idx)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.index_of(id).map(|i| &self.elements[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Element> {
        let i = self.index_of(id)?;
        Some(&mut self.elements[i])
    }

    pub fn at(&self, idx: usize) -> &Element {
        &self.elements[idx]
    }

    pub fn at_mut(&mut self, idx: usize) -> &mut Element {
        &mut self.elements[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.elements.iter_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(|e| e.id.as_str())
    }

    /// Calculated bounds of an element, if it has been resolved
    pub fn resolved_bounds(&self, id: &str) -> Option<BoundingBox> {
        self.get(id)
            .filter(|e| e.layout.calculated)
            .map(|e| e.layout.bounds)
    }

    /// Every anchor and stretch edge between elements, in element order
    pub fn dependencies(&self) -> Vec<ElementDependency> {
        let mut edges = Vec::new();
        for element in &self.elements {
            if let Some(anchor) = &element.layout_config.anchor {
                if let Some(target) = anchor.anchor_to.element_id() {
                    edges.push(ElementDependency {
                        dependent_element_id: element.id.clone(),
                        target_element_id: target.to_string(),
                        anchor_point: anchor.anchor_point,
                        target_anchor_point: anchor.target_anchor_point,
                        dependency_type: DependencyType::Anchor,
                    });
                }
            }
            for stretch in &element.layout_config.stretch {
                if let Some(target) = stretch.stretch_to.element_id() {
                    edges.push(ElementDependency {
                        dependent_element_id: element.id.clone(),
                        target_element_id: target.to_string(),
                        anchor_point: stretch.target_stretch_anchor_point,
                        target_anchor_point: stretch.target_stretch_anchor_point,
                        dependency_type: DependencyType::Stretch,
                    });
                }
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_container_sentinels() {
        assert_eq!(AnchorTarget::element("container"), AnchorTarget::Container);
        assert_eq!(AnchorTarget::element("canvas"), AnchorTarget::Container);
        assert_eq!(
            AnchorTarget::element("main.title"),
            AnchorTarget::Element("main.title".to_string())
        );
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut graph = ElementGraph::new();
        graph.insert(Element::rect("a", 10.0, 10.0)).unwrap();
        let err = graph.insert(Element::rect("a", 20.0, 20.0)).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_too_many_stretch_targets_rejected() {
        let element = Element::rect("a", 10.0, 10.0)
            .stretched(StretchConfig::new("container", AnchorPoint::CenterRight))
            .stretched(StretchConfig::new("container", AnchorPoint::BottomCenter))
            .stretched(StretchConfig::new("container", AnchorPoint::CenterLeft));
        assert!(ElementGraph::from_elements([element]).is_err());
    }

    #[test]
    fn test_dependencies_skip_container_targets() {
        let graph = ElementGraph::from_elements([
            Element::rect("a", 10.0, 10.0).anchored(AnchorConfig::new(
                "container",
                AnchorPoint::TopLeft,
                AnchorPoint::TopLeft,
            )),
            Element::rect("b", 10.0, 10.0)
                .anchored(AnchorConfig::new(
                    "a",
                    AnchorPoint::TopLeft,
                    AnchorPoint::TopRight,
                ))
                .stretched(StretchConfig::new("container", AnchorPoint::CenterRight)),
            Element::rect("c", 10.0, 10.0)
                .stretched(StretchConfig::new("b", AnchorPoint::CenterLeft)),
        ])
        .unwrap();

        let edges = graph.dependencies();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].dependent_element_id, "b");
        assert_eq!(edges[0].target_element_id, "a");
        assert_eq!(edges[0].dependency_type, DependencyType::Anchor);
        assert_eq!(edges[1].dependent_element_id, "c");
        assert_eq!(edges[1].dependency_type, DependencyType::Stretch);
        assert_eq!(edges[1].target_anchor_point, AnchorPoint::CenterLeft);
    }

    #[test]
    fn test_element_deserializes_from_toml() {
        let source = r#"
id = "nav.label"
kind = "text"
text = "ENGINEERING"
font_size = 18
width = "25%"

[anchor]
anchor_to = "nav.button"
anchor_point = "centerLeft"
target_anchor_point = "centerRight"
offset_x = 8

[[stretch]]
stretch_to = "canvas"
target_stretch_anchor_point = "centerRight"
padding = 10
"#;
        let element: Element = toml::from_str(source).unwrap();
        assert_eq!(element.id, "nav.label");
        assert_eq!(
            element.kind,
            ElementKind::Text {
                text: "ENGINEERING".to_string(),
                font_size: Some(18.0),
            }
        );
        assert_eq!(element.layout_config.width, Some(Dimension::Percent(25.0)));
        let anchor = element.layout_config.anchor.as_ref().unwrap();
        assert_eq!(anchor.anchor_to, AnchorTarget::Element("nav.button".into()));
        assert_eq!(anchor.offset_x, 8.0);
        assert_eq!(element.layout_config.stretch[0].stretch_to, AnchorTarget::Container);
        assert!(!element.layout.calculated);
    }
}
