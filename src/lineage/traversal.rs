use crate::lineage::graph::LineageStore;
use crate::types::TraversalDirection;
use petgraph::graph::NodeIndex;
use std::collections::{HashSet, VecDeque};

/// Graph traversal utilities for lineage analysis
pub struct GraphTraversal;

impl GraphTraversal {
    /// Bounded breadth-first search from `start`.
    ///
    /// Returns `(node, depth)` pairs in discovery order: depth ascending, and
    /// within a depth by relationship creation order. Every node appears once,
    /// at the depth it was first reached.
    pub fn bfs(
        store: &LineageStore,
        start: NodeIndex,
        max_depth: usize,
        direction: TraversalDirection,
    ) -> Vec<(NodeIndex, usize)> {
        let mut visited = HashSet::new();
        let mut discovered = Vec::new();
        let mut queue = VecDeque::new();

        queue.push_back((start, 0));
        visited.insert(start);

        while let Some((current, depth)) = queue.pop_front() {
            discovered.push((current, depth));

            if depth >= max_depth {
                continue;
            }

            for edge in store.edges_of(current, direction) {
                if let Some(neighbor) = store.neighbor_via(edge, current) {
                    if visited.insert(neighbor) {
                        queue.push_back((neighbor, depth + 1));
                    }
                }
            }
        }

        discovered
    }
}
