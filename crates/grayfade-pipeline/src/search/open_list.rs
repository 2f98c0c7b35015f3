//! The open list: an array-backed binary min-heap of frontier nodes.
//!
//! Entries are ordered by heuristic alone, not by `path_cost +
//! heuristic`. The search is therefore greedy best-first: it follows
//! whichever state looks closest to the target, which finds a short
//! transformation quickly but not necessarily the shortest one.
//!
//! The heap is hand-written rather than `std::collections::BinaryHeap`
//! because pruning relies on the level-order array layout: cutting the
//! tail of the array leaves a valid heap, with no re-heapify.

use serde::{Deserialize, Serialize};

use super::node::{NodeArena, NodeId};
use super::visited::VisitedIndex;
use crate::types::TransitionError;

/// Frontier truncation policy.
///
/// Once the open list holds at least `threshold_floor` entries, a prune
/// keeps `min(len, max(next_heuristic * heuristic_factor, min_keep))`
/// of them. The constants are tuning knobs with no derivation behind
/// them, which is why they are configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrunePolicy {
    /// Open lists shorter than this are never pruned.
    pub threshold_floor: usize,
    /// Lower bound on the number of entries kept.
    pub min_keep: usize,
    /// Entries kept per unit of the best remaining heuristic.
    pub heuristic_factor: u64,
}

impl PrunePolicy {
    /// Check the policy for values that would discard the whole frontier.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidConfig`] if `min_keep` is zero.
    pub fn validate(&self) -> Result<(), TransitionError> {
        if self.min_keep == 0 {
            return Err(TransitionError::InvalidConfig(
                "prune.min_keep must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of entries to keep out of `len`, given the best remaining
    /// heuristic.
    #[must_use]
    pub fn limit(&self, len: usize, next_heuristic: u64) -> usize {
        let by_heuristic = next_heuristic.saturating_mul(self.heuristic_factor);
        let by_heuristic = usize::try_from(by_heuristic).unwrap_or(usize::MAX);
        len.min(by_heuristic.max(self.min_keep))
    }
}

impl Default for PrunePolicy {
    fn default() -> Self {
        Self {
            threshold_floor: 10,
            min_keep: 500,
            heuristic_factor: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeapEntry {
    heuristic: u64,
    node: NodeId,
}

/// Min-heap of frontier nodes paired with the index of every node it
/// has ever accepted.
#[derive(Debug, Default)]
pub struct OpenList {
    heap: Vec<HeapEntry>,
    visited: VisitedIndex,
}

impl OpenList {
    /// Create an empty open list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the frontier and record it as visited.
    pub fn insert(&mut self, id: NodeId, heuristic: u64) {
        self.heap.push(HeapEntry {
            heuristic,
            node: id,
        });
        self.sift_up(self.heap.len() - 1);
        self.visited.insert(id, heuristic);
    }

    /// Remove and return the lowest-heuristic node.
    ///
    /// Returns `None` only when the frontier is empty, which the search
    /// loop treats as exhaustion.
    pub fn pop_min(&mut self) -> Option<NodeId> {
        let last = self.heap.pop()?;
        if self.heap.is_empty() {
            return Some(last.node);
        }
        let root = std::mem::replace(&mut self.heap[0], last);
        self.sift_down(0);
        Some(root.node)
    }

    /// The lowest-heuristic node, if any.
    #[must_use]
    pub fn peek_min(&self) -> Option<NodeId> {
        self.heap.first().map(|e| e.node)
    }

    /// Truncate the frontier according to `policy`.
    ///
    /// Returns the number of entries discarded. Discarded nodes stay in
    /// the visited index, so they are never generated again.
    pub fn prune(&mut self, policy: &PrunePolicy) -> usize {
        if self.heap.len() < policy.threshold_floor {
            return 0;
        }
        let Some(next) = self.heap.first() else {
            return 0;
        };
        let limit = policy.limit(self.heap.len(), next.heuristic);
        let discarded = self.heap.len() - limit;
        self.heap.truncate(limit);
        discarded
    }

    /// Whether `arena`'s node `id` duplicates a state this list has
    /// already accepted.
    #[must_use]
    pub fn has_seen(&self, arena: &NodeArena, id: NodeId) -> bool {
        self.visited.contains(arena, arena.get(id))
    }

    /// The index of every node ever inserted.
    #[must_use]
    pub const fn visited(&self) -> &VisitedIndex {
        &self.visited
    }

    /// Frontier size.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the frontier is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Node ids currently on the frontier, in heap array order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.heap.iter().map(|e| e.node)
    }

    /// Whether every parent entry is no greater than its children.
    #[must_use]
    pub fn is_heap_ordered(&self) -> bool {
        (1..self.heap.len()).all(|i| self.heap[(i - 1) / 2].heuristic <= self.heap[i].heuristic)
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.heap[parent].heuristic <= self.heap[index].heuristic {
                break;
            }
            self.heap.swap(parent, index);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut smallest = index;

            if left < len && self.heap[left].heuristic < self.heap[smallest].heuristic {
                smallest = left;
            }
            if right < len && self.heap[right].heuristic < self.heap[smallest].heuristic {
                smallest = right;
            }
            if smallest == index {
                break;
            }
            self.heap.swap(smallest, index);
            index = smallest;
        }
    }
}
