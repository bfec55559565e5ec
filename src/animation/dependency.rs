//! Reverse dependency index over the element graph
//!
//! Maps each element to the elements anchored or stretched to it. The index is
//! rebuilt from scratch whenever the graph changes; collaborators signal such
//! changes through an [`InvalidationSource`].

use std::cell::Cell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::layout::element::{DependencyType, ElementDependency, ElementGraph};

/// Cloneable change signal; bumping it makes the next propagation rebuild its index
#[derive(Debug, Clone, Default)]
pub struct InvalidationSource {
    generation: Rc<Cell<u64>>,
}

impl InvalidationSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&self) {
        self.generation.set(self.generation.get() + 1);
    }

    pub fn generation(&self) -> u64 {
        self.generation.get()
    }
}

/// Edges grouped by target element
#[derive(Debug, Clone, Default)]
pub struct DependencyIndex {
    dependents: HashMap<String, Vec<ElementDependency>>,
    edge_count: usize,
}

impl DependencyIndex {
    /// Build from the graph's anchor and stretch edges; anchor edges sort first
    pub fn build(graph: &ElementGraph) -> Self {
        let mut dependents: HashMap<String, Vec<ElementDependency>> = HashMap::new();
        let mut edge_count = 0;
        for edge in graph.dependencies() {
            edge_count += 1;
            dependents
                .entry(edge.target_element_id.clone())
                .or_default()
                .push(edge);
        }
        for edges in dependents.values_mut() {
            edges.sort_by_key(|e| match e.dependency_type {
                DependencyType::Anchor => 0,
                DependencyType::Stretch => 1,
            });
        }
        Self {
            dependents,
            edge_count,
        }
    }

    /// Direct dependents of `target`, anchor edges before stretch edges
    pub fn dependents_of(&self, target: &str) -> &[ElementDependency] {
        self.dependents
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every element reachable from `source` through dependency edges, breadth first
    ///
    /// `source` itself is never included, even on a cycle.
    pub fn transitive_dependents(&self, source: &str) -> Vec<String> {
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(source);
        let mut queue: VecDeque<&str> = VecDeque::from([source]);
        let mut result = Vec::new();

        while let Some(current) = queue.pop_front() {
            for edge in self.dependents_of(current) {
                let dependent = edge.dependent_element_id.as_str();
                if seen.insert(dependent) {
                    result.push(dependent.to_string());
                    queue.push_back(dependent);
                }
            }
        }
        result
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}
