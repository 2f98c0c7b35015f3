//! Progress telemetry and run statistics.
//!
//! Transitioners report progress through a [`ProgressObserver`] handed
//! in by the caller. Observers only watch: whichever one is supplied
//! (including none, via [`NoopObserver`]) the frames produced are the
//! same.

use serde::{Deserialize, Serialize};

/// Snapshot of the search, taken at each batch boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchProgress {
    /// Nodes expanded so far.
    pub expanded: u64,
    /// Frontier size after this batch's prune.
    pub open_len: usize,
    /// Expanded (closed) node count.
    pub closed_len: usize,
    /// Every node ever accepted onto the open list.
    pub visited_len: usize,
    /// Frontier entries discarded by pruning so far.
    pub pruned_total: u64,
    /// Path cost of the next node to expand, if any.
    pub next_path_cost: Option<u32>,
    /// Heuristic of the next node to expand, if any.
    pub next_heuristic: Option<u64>,
}

/// Progress of a diffusion transitioner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IterationProgress {
    /// One-based index of the finished iteration.
    pub iteration: u32,
    /// Configured iteration count.
    pub total: u32,
    /// Pixels whose value changed during this iteration.
    pub changed_pixels: u64,
}

/// Receives progress reports while a transition runs.
///
/// Both methods default to doing nothing, so an observer only
/// implements what it cares about.
pub trait ProgressObserver {
    /// Called every `batch_size` search iterations.
    fn on_search_progress(&mut self, _progress: &SearchProgress) {}

    /// Called after every diffusion iteration.
    fn on_iteration(&mut self, _progress: &IterationProgress) {}
}

/// Observer that ignores every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// Observer that forwards reports as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_search_progress(&mut self, p: &SearchProgress) {
        tracing::info!(
            expanded = p.expanded,
            open = p.open_len,
            closed = p.closed_len,
            visited = p.visited_len,
            pruned = p.pruned_total,
            next_g = p.next_path_cost,
            next_h = p.next_heuristic,
            "search progress"
        );
    }

    fn on_iteration(&mut self, p: &IterationProgress) {
        tracing::info!(
            iteration = p.iteration,
            total = p.total,
            changed = p.changed_pixels,
            "diffusion progress"
        );
    }
}

/// Observer that keeps every report, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    /// Search reports received.
    pub search: Vec<SearchProgress>,
    /// Diffusion reports received.
    pub iterations: Vec<IterationProgress>,
}

impl ProgressObserver for RecordingObserver {
    fn on_search_progress(&mut self, progress: &SearchProgress) {
        self.search.push(*progress);
    }

    fn on_iteration(&mut self, progress: &IterationProgress) {
        self.iterations.push(*progress);
    }
}

/// Summary of a finished (or abandoned) search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchStats {
    /// Nodes expanded.
    pub expanded: u64,
    /// Nodes created, including the root.
    pub generated: usize,
    /// Candidates dropped because their delta was zero.
    pub skipped_noop: u64,
    /// Candidates dropped because their state was already visited.
    pub skipped_duplicate: u64,
    /// Frontier entries discarded by pruning.
    pub pruned: u64,
    /// Frontier size when the search stopped.
    pub open_len: usize,
    /// Largest frontier size observed.
    pub open_high_water: usize,
    /// Heuristic of the root.
    pub initial_heuristic: u64,
    /// Steps on the returned path (`frames - 1`), once a goal is found.
    pub path_length: Option<u32>,
}

impl SearchStats {
    /// Format the statistics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Search Report\n{}", "=".repeat(40)));
        lines.push(format!("{:<22} {}", "Initial heuristic", self.initial_heuristic));
        lines.push(format!("{:<22} {}", "Expanded", self.expanded));
        lines.push(format!("{:<22} {}", "Generated", self.generated));
        lines.push(format!(
            "{:<22} {} no-op, {} duplicate",
            "Skipped", self.skipped_noop, self.skipped_duplicate
        ));
        lines.push(format!("{:<22} {}", "Pruned", self.pruned));
        lines.push(format!(
            "{:<22} {} (peak {})",
            "Open list", self.open_len, self.open_high_water
        ));
        lines.push(match self.path_length {
            Some(len) => format!("{:<22} {len} steps ({} frames)", "Path", len + 1),
            None => format!("{:<22} not found", "Path"),
        });

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_observer_accepts_reports() {
        let mut observer = NoopObserver;
        observer.on_search_progress(&SearchProgress {
            expanded: 1,
            open_len: 2,
            closed_len: 1,
            visited_len: 3,
            pruned_total: 0,
            next_path_cost: Some(1),
            next_heuristic: Some(4),
        });
        observer.on_iteration(&IterationProgress {
            iteration: 1,
            total: 10,
            changed_pixels: 5,
        });
    }

    #[test]
    fn recording_observer_keeps_order() {
        let mut observer = RecordingObserver::default();
        for i in 1..=3 {
            observer.on_iteration(&IterationProgress {
                iteration: i,
                total: 3,
                changed_pixels: u64::from(i),
            });
        }
        let seen: Vec<u32> = observer.iterations.iter().map(|p| p.iteration).collect();
        assert_eq!(seen, vec![1, 2, 3]);
        assert!(observer.search.is_empty());
    }

    #[test]
    fn report_mentions_path() {
        let stats = SearchStats {
            expanded: 12,
            generated: 40,
            path_length: Some(5),
            initial_heuristic: 9,
            ..SearchStats::default()
        };
        let report = stats.report();
        assert!(report.contains("Search Report"));
        assert!(report.contains("5 steps (6 frames)"));
        assert!(report.contains("Expanded"));
    }

    #[test]
    fn report_without_path() {
        let report = SearchStats::default().report();
        assert!(report.contains("not found"));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn progress_serializes_to_json() {
        let progress = SearchProgress {
            expanded: 7,
            open_len: 3,
            closed_len: 7,
            visited_len: 10,
            pruned_total: 0,
            next_path_cost: None,
            next_heuristic: None,
        };
        let json = serde_json::to_value(progress).unwrap();
        assert_eq!(json["expanded"], 7);
        assert!(json["next_heuristic"].is_null());
    }
}
