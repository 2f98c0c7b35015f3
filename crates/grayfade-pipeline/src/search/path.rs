//! Turn a goal node's ancestry into an ordered frame sequence.

use image::{GrayImage, Luma};

use super::node::{NodeArena, NodeId};

/// Node ids from the root to `goal`, inclusive.
#[must_use]
pub fn path_ids(arena: &NodeArena, goal: NodeId) -> Vec<NodeId> {
    let mut ids: Vec<NodeId> = arena.ancestry(goal).collect();
    ids.reverse();
    ids
}

/// Materialize one frame per node on the root→`goal` path.
///
/// The first frame is `start` untouched. Each following frame copies its
/// predecessor and overwrites the single pixel its node changed with
/// that pixel's resolved value, so adjacent frames differ in at most one
/// pixel. The sequence has `path_cost(goal) + 1` frames.
#[must_use]
pub fn reconstruct_path(arena: &NodeArena, goal: NodeId, start: &GrayImage) -> Vec<GrayImage> {
    let ids = path_ids(arena, goal);
    let mut frames = Vec::with_capacity(ids.len());
    frames.push(start.clone());

    for id in ids.into_iter().skip(1) {
        let node = arena.get(id);
        let value = node.diff.value_at(node.position, start).clamp(0, 255);
        let mut frame = frames.last().unwrap_or(start).clone();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        frame.put_pixel(node.position.x, node.position.y, Luma([value as u8]));
        frames.push(frame);
    }

    frames
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::search::diff_map::Coord;

    #[test]
    fn root_only_path_is_start() {
        let start = GrayImage::from_raw(2, 1, vec![3, 4]).unwrap();
        let mut arena = NodeArena::new();
        let root = arena.push_root(0);

        let frames = reconstruct_path(&arena, root, &start);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_raw(), start.as_raw());
        assert_eq!(path_ids(&arena, root), vec![root]);
    }

    #[test]
    fn frames_apply_one_pixel_each() {
        let start = GrayImage::from_raw(2, 2, vec![10, 10, 10, 10]).unwrap();
        let mut arena = NodeArena::new();
        let root = arena.push_root(0);
        let a = arena.push_child(root, Coord::new(1, 1), 1, 0);
        let b = arena.push_child(a, Coord::new(0, 0), -4, 0);
        let c = arena.push_child(b, Coord::new(1, 1), 1, 0);

        let frames = reconstruct_path(&arena, c, &start);
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0].as_raw(), &vec![10, 10, 10, 10]);
        assert_eq!(frames[1].as_raw(), &vec![10, 10, 10, 11]);
        assert_eq!(frames[2].as_raw(), &vec![6, 10, 10, 11]);
        assert_eq!(frames[3].as_raw(), &vec![6, 10, 10, 12]);
        assert_eq!(path_ids(&arena, c), vec![root, a, b, c]);
    }

    #[test]
    fn final_frame_matches_diff_map() {
        let start = GrayImage::from_raw(3, 1, vec![0, 128, 255]).unwrap();
        let mut arena = NodeArena::new();
        let root = arena.push_root(0);
        let a = arena.push_child(root, Coord::new(2, 0), -255, 0);
        let b = arena.push_child(a, Coord::new(0, 0), 128, 0);

        let frames = reconstruct_path(&arena, b, &start);
        let last = frames.last().unwrap();
        assert_eq!(last.as_raw(), arena.get(b).diff.apply(&start).as_raw());
    }
}
