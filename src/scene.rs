//! Scene files: a dashboard view and its named animations in TOML
//!
//! ```toml
//! [config.layout]
//! max_passes = 12
//!
//! [container]
//! width = 800
//! height = 600
//!
//! [[elements]]
//! id = "nav.panel"
//! kind = "rectangle"
//! width = 100
//! height = 40
//! x = 100
//! y = 50
//!
//! [[elements]]
//! id = "nav.label"
//! kind = "text"
//! text = "STATUS"
//! anchor = { anchor_to = "nav.panel", anchor_point = "topLeft", target_anchor_point = "topRight" }
//!
//! [animations.grow]
//! element = "nav.panel"
//! type = "scale"
//! scale_end = 1.2
//! duration_ms = 300
//!
//! [animations.intro]
//! element = "nav.panel"
//! steps = [
//!     { type = "slide", direction = "left", distance = 40, movement = "in" },
//!     { type = "fade", opacity_start = 0.0, opacity_end = 1.0 },
//! ]
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::animation::{
    AnimationEffect, AnimationError, AnimationSequence, NodeResolver, SyncData, TweenBackend,
};
use crate::layout::{find_similar, BoundingBox, Element, ElementGraph, LayoutError};
use crate::{Dashboard, EngineConfig};

/// Errors that can occur when loading a scene
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Failed to read scene file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse scene TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid scene: {0}")]
    InvalidScene(#[from] LayoutError),
    #[error("Unknown animation '{name}'{}", format_suggestions(.suggestions))]
    UnknownAnimation {
        name: String,
        suggestions: Vec<String>,
    },
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}

/// Size of the dashboard container
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl Default for ContainerSize {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl ContainerSize {
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::sized(self.width, self.height)
    }
}

/// What a named animation plays
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AnimationBody {
    Sequence(AnimationSequence),
    Single(AnimationEffect),
}

/// A named animation: the element it runs on, what it plays, and shared timing
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SceneAnimation {
    pub element: String,
    #[serde(flatten)]
    pub body: AnimationBody,
    #[serde(default)]
    pub sync: SyncData,
}

impl SceneAnimation {
    /// Start this animation on `dashboard`, returning the number of tweens scheduled
    pub fn play<B: TweenBackend + NodeResolver>(
        &self,
        dashboard: &mut Dashboard<B>,
    ) -> Result<usize, AnimationError> {
        match &self.body {
            AnimationBody::Single(effect) => dashboard
                .process_animation_with_propagation(&self.element, effect, &self.sync)
                .map(|outcome| outcome.scheduled.len()),
            AnimationBody::Sequence(sequence) => dashboard
                .process_animation_sequence_with_propagation(&self.element, sequence, &self.sync)
                .map(|outcome| outcome.scheduled_count()),
        }
    }
}

/// A complete dashboard description loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub config: EngineConfig,
    pub container: ContainerSize,
    pub elements: Vec<Element>,
    pub animations: BTreeMap<String, SceneAnimation>,
}

impl Scene {
    /// Load a scene from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, SceneError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a scene from a TOML string
    pub fn from_str(content: &str) -> Result<Self, SceneError> {
        let scene: Scene = toml::from_str(content)?;
        log::debug!(
            "loaded scene with {} element(s) and {} animation(s)",
            scene.elements.len(),
            scene.animations.len()
        );
        Ok(scene)
    }

    /// Look up a named animation, suggesting close names when it is missing
    pub fn animation(&self, name: &str) -> Result<&SceneAnimation, SceneError> {
        self.animations.get(name).ok_or_else(|| {
            let defined: HashSet<String> = self.animations.keys().cloned().collect();
            SceneError::UnknownAnimation {
                name: name.to_string(),
                suggestions: find_similar(&defined, name, 2),
            }
        })
    }

    /// Build the element graph (fails on duplicate ids)
    pub fn graph(&self) -> Result<ElementGraph, SceneError> {
        Ok(ElementGraph::from_elements(self.elements.iter().cloned())?)
    }

    /// Build a ticker-driven dashboard configured from this scene
    pub fn into_dashboard(self) -> Result<Dashboard, SceneError> {
        let graph = ElementGraph::from_elements(self.elements)?;
        Ok(Dashboard::new(graph).with_config(self.config))
    }
}
