//! Greedy best-first search over single-pixel edits.
//!
//! Every search state is the start image plus a sparse [`DiffMap`] of
//! cumulative per-pixel deltas. A child changes exactly one sampled pixel,
//! either by copying an axis neighbour's value or by fading one intensity
//! unit. Nodes are expanded in order of their heuristic (the summed
//! absolute error against the target over the sampled pixels), so the
//! search heads for whatever looks closest rather than for the cheapest
//! path.
//!
//! The reconstructed path becomes the frame sequence: one frame per node,
//! adjacent frames differing in at most one pixel.

mod controller;
mod diff_map;
mod expand;
mod node;
mod open_list;
mod path;
mod visited;

pub use controller::{SearchController, SearchState};
pub use diff_map::{Coord, DiffMap, sampled_coords, sampled_distance};
pub use expand::{Candidate, Expander, Expansion};
pub use node::{NodeArena, NodeId, SearchNode};
pub use open_list::{OpenList, PrunePolicy};
pub use path::{path_ids, reconstruct_path};
pub use visited::VisitedIndex;

use image::GrayImage;

use crate::diagnostics::ProgressObserver;
use crate::types::{SearchConfig, TransitionError};

/// Search for a frame sequence from `start` to `target`.
///
/// The first frame is `start`; the last matches `target` at every
/// sampled pixel.
///
/// # Errors
///
/// Returns an error for unusable inputs or configuration, or
/// [`TransitionError::SearchExhausted`] if no route to the target
/// survives.
pub fn search_transition(
    start: &GrayImage,
    target: &GrayImage,
    config: &SearchConfig,
    observer: &mut dyn ProgressObserver,
) -> Result<Vec<GrayImage>, TransitionError> {
    SearchController::new(start, target, config)?.run(observer)
}
