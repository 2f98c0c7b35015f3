//! Deduplication index over every state the open list has accepted.
//!
//! Nodes are bucketed by heuristic. Equal diff maps imply equal
//! heuristics for a fixed start/target pair, so a lookup only compares
//! diff maps within one bucket.

use std::collections::HashMap;

use super::diff_map::DiffMap;
use super::node::{NodeArena, NodeId, SearchNode};

/// Heuristic-bucketed set of visited search states.
#[derive(Debug, Default)]
pub struct VisitedIndex {
    buckets: HashMap<u64, Vec<NodeId>>,
    size: usize,
}

impl VisitedIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a node under its heuristic bucket.
    pub fn insert(&mut self, id: NodeId, heuristic: u64) {
        self.buckets.entry(heuristic).or_default().push(id);
        self.size += 1;
    }

    /// Whether a node with the same diff map has been recorded.
    #[must_use]
    pub fn contains(&self, arena: &NodeArena, node: &SearchNode) -> bool {
        self.contains_matching(arena, node.heuristic, |diff| *diff == node.diff)
    }

    /// Whether any recorded node in the `heuristic` bucket satisfies
    /// `same_state`.
    ///
    /// Lets callers test a prospective child against the index before
    /// allocating its diff map.
    pub fn contains_matching(
        &self,
        arena: &NodeArena,
        heuristic: u64,
        mut same_state: impl FnMut(&DiffMap) -> bool,
    ) -> bool {
        self.buckets
            .get(&heuristic)
            .is_some_and(|bucket| bucket.iter().any(|id| same_state(&arena.get(*id).diff)))
    }

    /// Number of recorded nodes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }
}
