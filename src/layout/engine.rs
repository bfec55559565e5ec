//! Anchor/stretch constraint resolver
//!
//! Computes absolute geometry for every element of an [`ElementGraph`] from its
//! relative placement rules. Resolution is a bounded fixpoint:
//!
//! 1. **Reset**: every element is marked uncalculated
//! 2. **Passes**: each pass visits the unresolved elements in insertion order,
//!    measures their content once, and places every element whose anchor and
//!    stretch targets are already placed (or are the container)
//! 3. **Termination**: stop when everything is placed, when a pass places
//!    nothing new, or when `max_passes` is reached
//! 4. **Report**: whatever is left is diagnosed (missing target, cycle, blocked)
//!    and logged; those elements simply stay unplaced
//!
//! Within a pass an element sees the results of elements placed earlier in the
//! same pass, so a chain declared in dependency order resolves in one pass and a
//! chain of N elements declared in reverse order needs N passes.

use std::collections::{HashMap, HashSet};

use super::anchor::{Column, Row};
use super::config::LayoutConfig;
use super::element::{AnchorTarget, ElementGraph, StretchConfig};
use super::error::{UnresolvedElement, UnresolvedReason};
use super::find_similar;
use super::measure::{ensure_intrinsic_size, ContentMeasurer};
use super::types::{BoundingBox, Point, Vector};

/// The complete result of one layout pass
#[derive(Debug, Clone, Default)]
pub struct LayoutResult {
    /// Container bounds the layout was resolved against
    pub container: BoundingBox,
    /// Absolute geometry of every resolved element
    pub geometry: HashMap<String, BoundingBox>,
    /// Elements that could not be placed
    pub unresolved: Vec<UnresolvedElement>,
    /// Number of resolver passes executed
    pub passes: usize,
}

impl LayoutResult {
    /// Geometry of a resolved element
    pub fn get(&self, id: &str) -> Option<BoundingBox> {
        self.geometry.get(id).copied()
    }

    /// True when every element was placed
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// Ids of the unresolved elements
    pub fn unresolved_ids(&self) -> Vec<&str> {
        self.unresolved.iter().map(|u| u.id.as_str()).collect()
    }
}

/// Resolve every element of the graph against the container bounds
pub fn resolve_layout(
    graph: &mut ElementGraph,
    container: BoundingBox,
    measurer: &dyn ContentMeasurer,
    config: &LayoutConfig,
) -> LayoutResult {
    for element in graph.iter_mut() {
        element.layout.calculated = false;
    }

    let mut remaining = graph.len();
    let mut passes = 0;

    while remaining > 0 && passes < config.max_passes {
        passes += 1;
        let mut progress = 0;

        for idx in 0..graph.len() {
            if graph.at(idx).layout.calculated {
                continue;
            }
            ensure_intrinsic_size(graph.at_mut(idx), measurer);
            if !can_calculate_layout(graph, idx) {
                continue;
            }
            let Some(bounds) = calculate_bounds(graph, idx, &container) else {
                continue;
            };

            let element = graph.at_mut(idx);
            element.layout.bounds = bounds.clamped();
            element.layout.calculated = true;
            log::trace!("pass {}: placed '{}' at {}", passes, element.id, bounds);
            progress += 1;
        }

        remaining -= progress;
        if progress == 0 {
            break;
        }
    }

    log::debug!(
        "layout resolved {}/{} elements in {} passes",
        graph.len() - remaining,
        graph.len(),
        passes
    );

    let unresolved = if remaining > 0 {
        let ids: Vec<String> = graph
            .iter()
            .filter(|e| !e.layout.calculated)
            .map(|e| e.id.clone())
            .collect();
        let diagnosed = diagnose_unresolved(graph, &ids);
        for entry in &diagnosed {
            log::warn!("element '{}' left unresolved: {}", entry.id, entry.reason);
        }
        diagnosed
    } else {
        Vec::new()
    };

    let geometry = graph
        .iter()
        .filter(|e| e.layout.calculated)
        .map(|e| (e.id.clone(), e.layout.bounds))
        .collect();

    LayoutResult {
        container,
        geometry,
        unresolved,
        passes,
    }
}

/// True iff every anchor and stretch target is the container or already placed
pub fn can_calculate_layout(graph: &ElementGraph, idx: usize) -> bool {
    graph
        .at(idx)
        .layout_config
        .referenced_ids()
        .all(|target| graph.get(target).is_some_and(|e| e.layout.calculated))
}

/// Bounds of an anchor/stretch target, if it is available
fn target_bounds(
    graph: &ElementGraph,
    target: &AnchorTarget,
    container: &BoundingBox,
) -> Option<BoundingBox> {
    match target {
        AnchorTarget::Container => Some(*container),
        AnchorTarget::Element(id) => graph.resolved_bounds(id),
    }
}

/// Size first, then position, then stretch
fn calculate_bounds(
    graph: &ElementGraph,
    idx: usize,
    container: &BoundingBox,
) -> Option<BoundingBox> {
    let element = graph.at(idx);
    let config = &element.layout_config;

    let width = config
        .width
        .map(|w| w.resolve(container.width))
        .unwrap_or(element.intrinsic_size.width);
    let height = config
        .height
        .map(|h| h.resolve(container.height))
        .unwrap_or(element.intrinsic_size.height);
    let own = BoundingBox::sized(width, height);

    let origin = match &config.anchor {
        Some(anchor) => {
            let target = target_bounds(graph, &anchor.anchor_to, container)?;
            anchor
                .target_anchor_point
                .position(&target)
                .offset_by(-anchor.anchor_point.offset(&own))
                .offset_by(Vector::new(anchor.offset_x, anchor.offset_y))
        }
        None => Point::new(
            container.x + config.x.map_or(0.0, |x| x.resolve(container.width)),
            container.y + config.y.map_or(0.0, |y| y.resolve(container.height)),
        ),
    };

    let mut bounds = BoundingBox::new(origin.x, origin.y, width, height);
    for stretch in &config.stretch {
        let target = target_bounds(graph, &stretch.stretch_to, container)?;
        if stretch.target_stretch_anchor_point.column() == Column::Center
            && stretch.target_stretch_anchor_point.row() == Row::Center
        {
            log::warn!(
                "element '{}' stretches to the center of '{}', which names no edge",
                element.id,
                stretch.stretch_to
            );
            continue;
        }
        bounds = apply_stretch(bounds, stretch, &target);
    }

    Some(bounds)
}

/// Move the nearest edge(s) of `bounds` onto the stretch target point, minus padding
///
/// A target point in the left/right column stretches horizontally and one in the
/// top/bottom row stretches vertically. Targets at or beyond the element's center
/// pull the far edge; targets before it pull the near edge and keep the far edge.
pub fn apply_stretch(
    bounds: BoundingBox,
    stretch: &StretchConfig,
    target: &BoundingBox,
) -> BoundingBox {
    let anchor = stretch.target_stretch_anchor_point;
    let point = anchor.position(target);
    let center = bounds.center();
    let mut out = bounds;

    if anchor.column() != Column::Center {
        if point.x >= center.x {
            out.width = point.x - out.x - stretch.padding;
        } else {
            let right = out.right();
            out.x = point.x + stretch.padding;
            out.width = right - out.x;
        }
    }

    if anchor.row() != Row::Center {
        if point.y >= center.y {
            out.height = point.y - out.y - stretch.padding;
        } else {
            let bottom = out.bottom();
            out.y = point.y + stretch.padding;
            out.height = bottom - out.y;
        }
    }

    out
}

/// Classify why each of the given elements could not be placed
pub fn diagnose_unresolved(graph: &ElementGraph, ids: &[String]) -> Vec<UnresolvedElement> {
    let unresolved: HashSet<&str> = ids.iter().map(String::as_str).collect();
    let known: HashSet<String> = graph.ids().map(str::to_string).collect();

    // Edges restricted to the unresolved subgraph
    let mut waits_on: HashMap<&str, Vec<&str>> = HashMap::new();
    for id in ids {
        if let Some(element) = graph.get(id) {
            let targets = element
                .layout_config
                .referenced_ids()
                .filter(|t| unresolved.contains(t))
                .collect();
            waits_on.insert(id.as_str(), targets);
        }
    }

    ids.iter()
        .map(|id| {
            let reason = classify(graph, id, &known, &waits_on);
            UnresolvedElement {
                id: id.clone(),
                reason,
            }
        })
        .collect()
}

fn classify(
    graph: &ElementGraph,
    id: &str,
    known: &HashSet<String>,
    waits_on: &HashMap<&str, Vec<&str>>,
) -> UnresolvedReason {
    let Some(element) = graph.get(id) else {
        return UnresolvedReason::PassLimit;
    };

    if let Some(missing) = element
        .layout_config
        .referenced_ids()
        .find(|t| !known.contains(*t))
    {
        return UnresolvedReason::MissingTarget {
            target: missing.to_string(),
            suggestions: find_similar(known, missing, 2),
        };
    }

    if let Some(cycle) = find_cycle(id, waits_on) {
        return UnresolvedReason::Cycle { cycle };
    }

    match waits_on.get(id) {
        Some(targets) if !targets.is_empty() => UnresolvedReason::Blocked {
            waiting_on: targets.iter().map(|t| t.to_string()).collect(),
        },
        _ => UnresolvedReason::PassLimit,
    }
}

/// Find a dependency cycle that starts and ends at `start`
fn find_cycle<'a>(start: &'a str, waits_on: &HashMap<&'a str, Vec<&'a str>>) -> Option<Vec<String>> {
    fn visit<'a>(
        node: &'a str,
        start: &str,
        waits_on: &HashMap<&'a str, Vec<&'a str>>,
        path: &mut Vec<&'a str>,
        seen: &mut HashSet<&'a str>,
    ) -> bool {
        for &next in waits_on.get(node).map(Vec::as_slice).unwrap_or_default() {
            if next == start {
                path.push(next);
                return true;
            }
            if seen.insert(next) {
                path.push(next);
                if visit(next, start, waits_on, path, seen) {
                    return true;
                }
                path.pop();
            }
        }
        false
    }

    let mut path = vec![start];
    let mut seen = HashSet::new();
    seen.insert(start);
    if visit(start, start, waits_on, &mut path, &mut seen) {
        Some(path.into_iter().map(str::to_string).collect())
    } else {
        None
    }
}
