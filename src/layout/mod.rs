//! Layout engine for computing element positions and sizes
//!
//! This module takes an [`ElementGraph`] of relatively-placed elements and
//! resolves it into absolute geometry, producing a [`LayoutResult`].

pub mod anchor;
pub mod config;
pub mod element;
pub mod engine;
pub mod error;
pub mod measure;
pub mod schedule;
pub mod types;

pub use anchor::AnchorPoint;
pub use config::LayoutConfig;
pub use element::{
    AnchorConfig, AnchorTarget, DependencyType, Element, ElementDependency, ElementGraph,
    ElementKind, LayoutConstraints, StretchConfig,
};
pub use engine::{resolve_layout, LayoutResult};
pub use error::{LayoutError, UnresolvedElement, UnresolvedReason};
pub use measure::{ContentMeasurer, EstimatingMeasurer};
pub use schedule::{LayoutHandle, LayoutScheduler};
pub use types::*;

use std::collections::HashSet;

/// Validate that every anchor and stretch target resolves to a defined element.
pub fn validate_references(graph: &ElementGraph) -> Result<(), LayoutError> {
    let defined: HashSet<String> = graph.ids().map(str::to_string).collect();

    for element in graph.iter() {
        for target in element.layout_config.referenced_ids() {
            if !defined.contains(target) {
                return Err(LayoutError::undefined(
                    &element.id,
                    target,
                    find_similar(&defined, target, 2),
                ));
            }
        }
    }
    Ok(())
}

/// Compute Levenshtein edit distance between two strings
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Find defined names within `max_distance` edits of `target`, closest first
pub(crate) fn find_similar(
    defined: &HashSet<String>,
    target: &str,
    max_distance: usize,
) -> Vec<String> {
    let mut candidates: Vec<(String, usize)> = defined
        .iter()
        .filter_map(|name| {
            let dist = levenshtein_distance(name, target);
            if dist <= max_distance && dist > 0 {
                Some((name.clone(), dist))
            } else {
                None
            }
        })
        .collect();

    candidates.sort_by(|(a, da), (b, db)| da.cmp(db).then_with(|| a.cmp(b)));
    candidates
        .into_iter()
        .map(|(name, _)| name)
        .take(3)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_same() {
        assert_eq!(levenshtein_distance("hello", "hello"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein_distance("header", "heder"), 1);
        assert_eq!(levenshtein_distance("button", "buttons"), 1);
        assert_eq!(levenshtein_distance("", "abc"), 3);
    }

    #[test]
    fn test_find_similar_is_sorted_and_bounded() {
        let defined: HashSet<String> = ["nav.a", "nav.b", "nav.ab", "footer"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            find_similar(&defined, "nav.c", 2),
            vec!["nav.a".to_string(), "nav.b".to_string(), "nav.ab".to_string()]
        );
        assert!(find_similar(&defined, "zzz", 2).is_empty());
    }

    #[test]
    fn test_validate_references_reports_suggestions() {
        let graph = ElementGraph::from_elements([
            Element::rect("header", 10.0, 10.0),
            Element::rect("title", 10.0, 10.0).stretched(StretchConfig::new(
                "headr",
                AnchorPoint::CenterRight,
            )),
        ])
        .unwrap();
        let err = validate_references(&graph).unwrap_err();
        assert_eq!(err.suggestions(), Some(&["header".to_string()][..]));
    }

    #[test]
    fn test_container_targets_are_always_valid() {
        let graph = ElementGraph::from_elements([Element::rect("a", 10.0, 10.0).anchored(
            AnchorConfig::new("canvas", AnchorPoint::Center, AnchorPoint::Center),
        )])
        .unwrap();
        assert!(validate_references(&graph).is_ok());
    }
}
