//! Search nodes and the append-only arena that owns them.
//!
//! Nodes refer to their parent by [`NodeId`]. A node never learns about
//! its children and is never mutated after it is pushed, so the arena is
//! a plain `Vec` that only grows.

use super::diff_map::{Coord, DiffMap};

/// Index of a node inside a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in arena order (root is 0).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One state in the search tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchNode {
    /// Pixel changed by the step that produced this node.
    pub position: Coord,
    /// Intensity change applied at `position` by that step.
    pub delta: i32,
    /// Parent node (`None` for the root).
    pub parent: Option<NodeId>,
    /// Steps from the root (root = 0).
    pub path_cost: u32,
    /// Summed absolute error against the target over sampled pixels.
    pub heuristic: u64,
    /// Cumulative deltas through this node's ancestry.
    pub diff: DiffMap,
}

impl SearchNode {
    /// Whether this node is the root of its tree.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Append-only owner of every node created during a search.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<SearchNode>,
}

impl NodeArena {
    /// Create an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Push the root node: no change applied, `path_cost = 0`.
    pub fn push_root(&mut self, heuristic: u64) -> NodeId {
        self.push(SearchNode {
            position: Coord::new(0, 0),
            delta: 0,
            parent: None,
            path_cost: 0,
            heuristic,
            diff: DiffMap::new(),
        })
    }

    /// Push a child of `parent` that applies `delta` at `position`.
    ///
    /// The child's diff map is the parent's with the step merged in and
    /// its path cost is one more than the parent's. `heuristic` is
    /// supplied by the caller, which tracks it incrementally.
    pub fn push_child(
        &mut self,
        parent: NodeId,
        position: Coord,
        delta: i32,
        heuristic: u64,
    ) -> NodeId {
        let parent_node = &self.nodes[parent.index()];
        let child = SearchNode {
            position,
            delta,
            parent: Some(parent),
            path_cost: parent_node.path_cost + 1,
            heuristic,
            diff: parent_node.diff.stepped(position, delta),
        };
        self.push(child)
    }

    fn push(&mut self, node: SearchNode) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(node);
        id
    }

    /// Borrow a node.
    ///
    /// `NodeId`s are only minted by this arena, so every id handed out
    /// is in range.
    #[must_use]
    pub fn get(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.index()]
    }

    /// Iterate from `id` up to and including the root.
    pub fn ancestry(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |current| self.get(*current).parent)
    }

    /// Number of nodes ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no node has been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_zero_cost_and_empty_diff() {
        let mut arena = NodeArena::new();
        let root = arena.push_root(42);
        let node = arena.get(root);
        assert!(node.is_root());
        assert_eq!(node.path_cost, 0);
        assert_eq!(node.heuristic, 42);
        assert!(node.diff.is_empty());
        assert_eq!(root.index(), 0);
    }

    #[test]
    fn child_inherits_and_extends_parent_diff() {
        let mut arena = NodeArena::new();
        let root = arena.push_root(10);
        let a = arena.push_child(root, Coord::new(1, 2), 3, 7);
        let b = arena.push_child(a, Coord::new(1, 2), 4, 3);

        let node_b = arena.get(b);
        assert_eq!(node_b.parent, Some(a));
        assert_eq!(node_b.path_cost, 2);
        assert_eq!(node_b.delta, 4);
        assert_eq!(node_b.diff.get(Coord::new(1, 2)), 7);

        // The parent is untouched by its child.
        assert_eq!(arena.get(a).diff.get(Coord::new(1, 2)), 3);
    }

    #[test]
    fn siblings_share_a_parent() {
        let mut arena = NodeArena::new();
        let root = arena.push_root(5);
        let a = arena.push_child(root, Coord::new(0, 0), 1, 4);
        let b = arena.push_child(root, Coord::new(0, 0), -1, 6);
        assert_eq!(arena.get(a).parent, arena.get(b).parent);
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn ancestry_walks_to_root() {
        let mut arena = NodeArena::new();
        let root = arena.push_root(0);
        let a = arena.push_child(root, Coord::new(0, 0), 1, 0);
        let b = arena.push_child(a, Coord::new(0, 1), 1, 0);
        let walk: Vec<NodeId> = arena.ancestry(b).collect();
        assert_eq!(walk, vec![b, a, root]);
    }
}
