//! Child generation: propose single-pixel moves from a search node.
//!
//! For every sampled pixel two kinds of move are considered:
//!
//! - **copy** a neighbour: set the pixel to the value of one of its axis
//!   neighbours (or itself), which reads as content sliding across the
//!   frame;
//! - **fade** by one intensity unit in either direction.
//!
//! Proposals with the same delta collapse to one. Only the
//! `branching_factor` proposals with the lowest resulting heuristic are
//! kept per pixel; ties go to the proposal enumerated first.

use image::GrayImage;

use super::diff_map::{Coord, DiffMap, sampled_coords};
use super::node::SearchNode;

/// A prospective child: one delta at one pixel, with the heuristic the
/// resulting state would have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Pixel to change.
    pub position: Coord,
    /// Signed intensity change.
    pub delta: i32,
    /// Heuristic of the state after the change.
    pub heuristic: u64,
}

/// Outcome of expanding one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// A candidate reaches the target; the remaining candidates were
    /// discarded.
    Goal(Candidate),
    /// Every kept candidate, pixel by pixel in sampling order. Zero
    /// deltas and duplicates are still present; the caller filters them.
    Children(Vec<Candidate>),
}

/// Proposed delta at one pixel, annotated with the change in that
/// pixel's contribution to the heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelMove {
    delta: i32,
    delta_h: i64,
}

/// Generates candidate moves against a fixed start/target pair.
#[derive(Debug, Clone, Copy)]
pub struct Expander<'a> {
    start: &'a GrayImage,
    target: &'a GrayImage,
    scale: u32,
    branching_factor: usize,
}

impl<'a> Expander<'a> {
    /// Create an expander. `start` and `target` must share dimensions.
    #[must_use]
    pub const fn new(
        start: &'a GrayImage,
        target: &'a GrayImage,
        scale: u32,
        branching_factor: usize,
    ) -> Self {
        Self {
            start,
            target,
            scale,
            branching_factor,
        }
    }

    /// Propose children of `node`.
    #[must_use]
    pub fn expand(&self, node: &SearchNode) -> Expansion {
        let mut candidates = Vec::new();

        for coord in sampled_coords(self.start.width(), self.start.height(), self.scale) {
            let mut pixel_candidates: Vec<Candidate> = self
                .pixel_moves(&node.diff, coord)
                .into_iter()
                .map(|m| Candidate {
                    position: coord,
                    delta: m.delta,
                    heuristic: node.heuristic.saturating_add_signed(m.delta_h),
                })
                .collect();

            // Stable sort keeps enumeration order among equal heuristics.
            pixel_candidates.sort_by_key(|c| c.heuristic);
            pixel_candidates.truncate(self.branching_factor);
            candidates.extend(pixel_candidates);
        }

        // Heuristic zero means every sampled pixel matches the target.
        if let Some(goal) = candidates
            .iter()
            .find(|c| c.delta != 0 && c.heuristic == 0)
        {
            return Expansion::Goal(*goal);
        }

        Expansion::Children(candidates)
    }

    /// Distinct deltas proposed at `coord`, in enumeration order.
    fn pixel_moves(&self, diff: &DiffMap, coord: Coord) -> Vec<PixelMove> {
        let current = diff.value_at(coord, self.start);
        let desired = i32::from(self.target.get_pixel(coord.x, coord.y).0[0]);
        let current_error = i64::from((desired - current).abs());

        let mut moves: Vec<PixelMove> = Vec::with_capacity(7);
        let mut propose = |delta: i32| {
            if moves.iter().any(|m| m.delta == delta) {
                return;
            }
            let new_error = i64::from((desired - (current + delta)).abs());
            moves.push(PixelMove {
                delta,
                delta_h: new_error - current_error,
            });
        };

        for neighbour in self.neighbourhood(coord) {
            let value = if neighbour == coord {
                current
            } else {
                diff.value_at(neighbour, self.start)
            };
            propose(value - current);
        }

        for fade in [-1, 1] {
            if (0..=255).contains(&(current + fade)) {
                propose(fade);
            }
        }

        moves
    }

    /// The pixel and its axis neighbours inside the image, columns
    /// first: left, up, self, down, right.
    fn neighbourhood(&self, coord: Coord) -> impl Iterator<Item = Coord> {
        let (width, height) = self.start.dimensions();
        let Coord { x, y } = coord;
        [
            x.checked_sub(1).map(|lx| Coord::new(lx, y)),
            y.checked_sub(1).map(|uy| Coord::new(x, uy)),
            Some(coord),
            (y + 1 < height).then_some(Coord::new(x, y + 1)),
            (x + 1 < width).then_some(Coord::new(x + 1, y)),
        ]
        .into_iter()
        .flatten()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::search::diff_map::sampled_distance;
    use crate::search::node::NodeArena;

    fn gray(width: u32, height: u32, values: &[u8]) -> GrayImage {
        GrayImage::from_raw(width, height, values.to_vec()).unwrap()
    }

    fn root(start: &GrayImage, target: &GrayImage, scale: u32) -> (NodeArena, SearchNode) {
        let mut arena = NodeArena::new();
        let id = arena.push_root(sampled_distance(start, target, scale));
        let node = arena.get(id).clone();
        (arena, node)
    }

    fn children(expansion: Expansion) -> Vec<Candidate> {
        match expansion {
            Expansion::Children(c) => c,
            Expansion::Goal(g) => panic!("unexpected goal {g:?}"),
        }
    }

    #[test]
    fn single_pixel_proposes_fades_and_noop() {
        let start = gray(1, 1, &[0]);
        let target = gray(1, 1, &[100]);
        let (_arena, node) = root(&start, &target, 1);

        let got = children(Expander::new(&start, &target, 1, 3).expand(&node));
        // self (0), then -1 is out of range, then +1.
        let deltas: Vec<i32> = got.iter().map(|c| c.delta).collect();
        assert_eq!(deltas, vec![1, 0]);
        assert_eq!(got[0].heuristic, 99);
        assert_eq!(got[1].heuristic, 100);
    }

    #[test]
    fn copy_moves_use_neighbour_values() {
        // Row-major 2x2: (0,0)=1 (1,0)=2 (0,1)=3 (1,1)=0
        let start = gray(2, 2, &[1, 2, 3, 0]);
        let target = gray(2, 2, &[0, 0, 0, 0]);
        let (_arena, node) = root(&start, &target, 1);
        let expander = Expander::new(&start, &target, 1, 10);

        let moves = expander.pixel_moves(&node.diff, Coord::new(1, 1));
        let deltas: Vec<i32> = moves.iter().map(|m| m.delta).collect();
        // left (0,1)=3, up (1,0)=2, self, then fades -1 (out of range) and +1.
        assert_eq!(deltas, vec![3, 2, 0, 1]);

        let moves = expander.pixel_moves(&node.diff, Coord::new(0, 0));
        let deltas: Vec<i32> = moves.iter().map(|m| m.delta).collect();
        // self, down (0,1)=3, right (1,0)=2, fade -1; fade +1 repeats the copy of right.
        assert_eq!(deltas, vec![0, 2, 1, -1]);
    }

    #[test]
    fn duplicate_deltas_collapse() {
        let start = gray(3, 1, &[5, 5, 5]);
        let target = gray(3, 1, &[5, 9, 5]);
        let (_arena, node) = root(&start, &target, 1);
        let expander = Expander::new(&start, &target, 1, 10);

        let moves = expander.pixel_moves(&node.diff, Coord::new(1, 0));
        let deltas: Vec<i32> = moves.iter().map(|m| m.delta).collect();
        assert_eq!(deltas, vec![0, -1, 1]);
    }

    #[test]
    fn branching_cap_keeps_three_lowest() {
        // Centre pixel (1,1) of a 3x3 sees four distinct neighbours, so it
        // proposes 0 (self), four copies and two fades.
        #[rustfmt::skip]
        let start = gray(3, 3, &[
            0,  40,   0,
            10, 100,  30,
            0,  20,   0,
        ]);
        let mut target_values = start.as_raw().clone();
        target_values[4] = 22;
        let target = gray(3, 3, &target_values);
        let (_arena, node) = root(&start, &target, 1);
        assert_eq!(node.heuristic, 78);

        let expander = Expander::new(&start, &target, 1, 3);
        let moves = expander.pixel_moves(&node.diff, Coord::new(1, 1));
        let resulting: Vec<i32> = moves.iter().map(|m| 100 + m.delta).collect();
        // left 10, up 40, self 100, down 20, right 30, fades 99 and 101.
        assert_eq!(resulting, vec![10, 40, 100, 20, 30, 99, 101]);

        let got = children(expander.expand(&node));
        let centre: Vec<i32> = got
            .iter()
            .filter(|c| c.position == Coord::new(1, 1))
            .map(|c| 100 + c.delta)
            .collect();
        // Closest to 22: 20 (err 2), 30 (err 8), 10 (err 12).
        assert_eq!(centre, vec![20, 30, 10]);
    }

    #[test]
    fn ties_keep_enumeration_order() {
        // Target 20 sits between left (10) and right (30): equal error.
        let start = gray(3, 1, &[10, 100, 30]);
        let target = gray(3, 1, &[10, 20, 30]);
        let (_arena, node) = root(&start, &target, 1);

        let got = children(Expander::new(&start, &target, 1, 2).expand(&node));
        let centre: Vec<i32> = got
            .iter()
            .filter(|c| c.position == Coord::new(1, 0))
            .map(|c| 100 + c.delta)
            .collect();
        assert_eq!(centre, vec![10, 30]);
    }

    #[test]
    fn incremental_heuristic_matches_recomputation() {
        let start = gray(3, 2, &[0, 50, 200, 255, 7, 90]);
        let target = gray(3, 2, &[30, 50, 180, 250, 9, 0]);
        let mut arena = NodeArena::new();
        let root_id = arena.push_root(sampled_distance(&start, &target, 1));
        let node = arena.get(root_id).clone();
        let expander = Expander::new(&start, &target, 1, 3);

        for c in children(expander.expand(&node)) {
            let id = arena.push_child(root_id, c.position, c.delta, c.heuristic);
            let image = arena.get(id).diff.apply(&start);
            assert_eq!(sampled_distance(&image, &target, 1), c.heuristic, "{c:?}");
        }
    }

    #[test]
    fn goal_short_circuits() {
        let start = gray(2, 1, &[10, 10]);
        let target = gray(2, 1, &[10, 11]);
        let (_arena, node) = root(&start, &target, 1);

        let expansion = Expander::new(&start, &target, 1, 3).expand(&node);
        assert_eq!(
            expansion,
            Expansion::Goal(Candidate {
                position: Coord::new(1, 0),
                delta: 1,
                heuristic: 0,
            })
        );
    }

    #[test]
    fn unsampled_pixels_are_not_proposed() {
        let start = gray(3, 3, &[0; 9]);
        let target = gray(3, 3, &[9; 9]);
        let (_arena, node) = root(&start, &target, 2);
        assert_eq!(node.heuristic, 4 * 9);

        let got = children(Expander::new(&start, &target, 2, 3).expand(&node));
        assert!(got.iter().all(|c| c.position.x % 2 == 0 && c.position.y % 2 == 0));
    }
}
