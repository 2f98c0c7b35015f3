//! The search loop.
//!
//! [`SearchController`] owns every piece of search state (node arena,
//! open list, visited index) and advances it one expansion at a time.
//! [`SearchController::run`] drives it to completion, pruning the
//! frontier and reporting progress every `batch_size` iterations.

use image::GrayImage;

use super::diff_map::sampled_distance;
use super::expand::{Expander, Expansion};
use super::node::{NodeArena, NodeId};
use super::open_list::OpenList;
use super::path::reconstruct_path;
use crate::diagnostics::{ProgressObserver, SearchProgress, SearchStats};
use crate::grayscale::ensure_same_dimensions;
use crate::types::{SearchConfig, TransitionError};

/// Where the search stands after a [`SearchController::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// The frontier still has nodes to expand.
    Running,
    /// A node matching the target at every sampled pixel was reached.
    GoalFound(NodeId),
    /// The frontier emptied before the target was reached.
    Exhausted,
}

/// Greedy best-first search from one grayscale image to another.
#[derive(Debug)]
pub struct SearchController<'a> {
    start: &'a GrayImage,
    target: &'a GrayImage,
    config: SearchConfig,
    arena: NodeArena,
    open: OpenList,
    goal: Option<NodeId>,
    stats: SearchStats,
}

impl<'a> SearchController<'a> {
    /// Validate the inputs and seed the search with the root node.
    ///
    /// A root that already matches the target is recorded as the goal
    /// and never enters the open list.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::EmptyImage`] or
    /// [`TransitionError::DimensionMismatch`] for unusable images and
    /// [`TransitionError::InvalidConfig`] for an invalid `config`.
    pub fn new(
        start: &'a GrayImage,
        target: &'a GrayImage,
        config: &SearchConfig,
    ) -> Result<Self, TransitionError> {
        ensure_same_dimensions(start, target)?;
        config.validate()?;

        let heuristic = sampled_distance(start, target, config.scale);
        let mut arena = NodeArena::new();
        let root = arena.push_root(heuristic);
        let mut open = OpenList::new();

        let goal = if heuristic == 0 {
            Some(root)
        } else {
            open.insert(root, heuristic);
            None
        };

        tracing::debug!(
            width = start.width(),
            height = start.height(),
            scale = config.scale,
            heuristic,
            "search seeded"
        );

        Ok(Self {
            start,
            target,
            config: *config,
            arena,
            open,
            goal,
            stats: SearchStats {
                initial_heuristic: heuristic,
                path_length: goal.map(|_| 0),
                ..SearchStats::default()
            },
        })
    }

    /// Perform one iteration: expand the lowest-heuristic node and push
    /// its surviving children.
    ///
    /// Once a goal has been found every further call returns the same
    /// [`SearchState::GoalFound`].
    pub fn step(&mut self) -> SearchState {
        if let Some(goal) = self.goal {
            return SearchState::GoalFound(goal);
        }
        let Some(current) = self.open.pop_min() else {
            return SearchState::Exhausted;
        };
        self.stats.expanded += 1;

        let expander = Expander::new(
            self.start,
            self.target,
            self.config.scale,
            self.config.branching_factor,
        );

        match expander.expand(self.arena.get(current)) {
            Expansion::Goal(candidate) => {
                let id = self.arena.push_child(
                    current,
                    candidate.position,
                    candidate.delta,
                    candidate.heuristic,
                );
                self.goal = Some(id);
                self.stats.path_length = Some(self.arena.get(id).path_cost);
                SearchState::GoalFound(id)
            }
            Expansion::Children(candidates) => {
                for candidate in candidates {
                    if candidate.delta == 0 {
                        self.stats.skipped_noop += 1;
                        continue;
                    }
                    let parent_diff = &self.arena.get(current).diff;
                    let seen =
                        self.open
                            .visited()
                            .contains_matching(&self.arena, candidate.heuristic, |diff| {
                                diff.matches_step(parent_diff, candidate.position, candidate.delta)
                            });
                    if seen {
                        self.stats.skipped_duplicate += 1;
                        continue;
                    }
                    let id = self.arena.push_child(
                        current,
                        candidate.position,
                        candidate.delta,
                        candidate.heuristic,
                    );
                    self.open.insert(id, candidate.heuristic);
                }
                self.stats.open_high_water = self.stats.open_high_water.max(self.open.len());
                SearchState::Running
            }
        }
    }

    /// Run until the goal is found, returning the frame sequence from
    /// `start` to the goal.
    ///
    /// Every `batch_size` iterations the open list is pruned and
    /// `observer` receives a [`SearchProgress`] snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::SearchExhausted`] if the open list
    /// empties first.
    #[tracing::instrument(skip_all, fields(initial_heuristic = self.stats.initial_heuristic))]
    pub fn run(
        &mut self,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Vec<GrayImage>, TransitionError> {
        let batch = u64::from(self.config.batch_size);
        let mut iterations: u64 = 0;

        loop {
            match self.step() {
                SearchState::Running => {
                    iterations += 1;
                    if iterations % batch == 0 {
                        self.end_batch(observer);
                    }
                }
                SearchState::GoalFound(goal) => {
                    let frames = reconstruct_path(&self.arena, goal, self.start);
                    tracing::info!(
                        expanded = self.stats.expanded,
                        generated = self.arena.len(),
                        frames = frames.len(),
                        "search reached target"
                    );
                    return Ok(frames);
                }
                SearchState::Exhausted => {
                    tracing::warn!(
                        expanded = self.stats.expanded,
                        pruned = self.stats.pruned,
                        "open list exhausted"
                    );
                    return Err(TransitionError::SearchExhausted {
                        expanded: self.stats.expanded,
                    });
                }
            }
        }
    }

    /// Prune the frontier and report progress.
    fn end_batch(&mut self, observer: &mut dyn ProgressObserver) {
        let pruned = self.open.prune(&self.config.prune);
        self.stats.pruned += u64::try_from(pruned).unwrap_or(u64::MAX);

        let next = self.open.peek_min().map(|id| self.arena.get(id));
        let progress = SearchProgress {
            expanded: self.stats.expanded,
            open_len: self.open.len(),
            closed_len: usize::try_from(self.stats.expanded).unwrap_or(usize::MAX),
            visited_len: self.open.visited().len(),
            pruned_total: self.stats.pruned,
            next_path_cost: next.map(|n| n.path_cost),
            next_heuristic: next.map(|n| n.heuristic),
        };
        tracing::debug!(
            expanded = progress.expanded,
            open = progress.open_len,
            pruned,
            "batch complete"
        );
        observer.on_search_progress(&progress);
    }

    /// Statistics gathered so far.
    #[must_use]
    pub fn stats(&self) -> SearchStats {
        SearchStats {
            generated: self.arena.len(),
            open_len: self.open.len(),
            ..self.stats
        }
    }

    /// Every node created so far.
    #[must_use]
    pub const fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// The current frontier.
    #[must_use]
    pub const fn open_list(&self) -> &OpenList {
        &self.open
    }
}
