//! Frame producers: turn a start/target pair into a frame sequence.
//!
//! This module defines the [`Transitioner`] trait and the
//! [`TransitionerKind`] enum for selecting a producer at runtime.
//!
//! # Strategy pattern
//!
//! The search produces smooth single-pixel frame sequences but can be
//! slow on large images; the diffusion producers change whole frames at
//! a time and finish in a fixed number of rounds. Callers pick one via
//! configuration without the rest of the crate caring which.

use serde::{Deserialize, Serialize};

use crate::diagnostics::ProgressObserver;
use crate::types::{GrayImage, TransitionConfig, TransitionError};
use crate::{diffusion, search};

/// Selects which frame producer to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionerKind {
    /// Greedy best-first search over single-pixel edits. Adjacent frames
    /// differ in at most one pixel.
    #[default]
    Search,

    /// Relax every pixel toward the target once per iteration.
    Iterative,

    /// Relax the start and target toward each other until they meet.
    Bidirectional,
}

impl TransitionerKind {
    /// Every variant, in declaration order.
    pub const ALL: [Self; 3] = [Self::Search, Self::Iterative, Self::Bidirectional];

    /// The lowercase name used in configuration files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Iterative => "iterative",
            Self::Bidirectional => "bidirectional",
        }
    }
}

impl std::fmt::Display for TransitionerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Trait for frame-producing strategies.
pub trait Transitioner {
    /// Produce frames from `start` to `target`.
    ///
    /// The first frame is `start`. `config` has already been validated.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] if the images are unusable or the
    /// producer cannot reach the target.
    fn transition(
        &self,
        start: &GrayImage,
        target: &GrayImage,
        config: &TransitionConfig,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Vec<GrayImage>, TransitionError>;
}

impl Transitioner for TransitionerKind {
    fn transition(
        &self,
        start: &GrayImage,
        target: &GrayImage,
        config: &TransitionConfig,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Vec<GrayImage>, TransitionError> {
        match *self {
            Self::Search => {
                search::search_transition(start, target, &config.search_config(), observer)
            }
            Self::Iterative => diffusion::iterative(start, target, config.iterations, observer),
            Self::Bidirectional => diffusion::bidirectional(
                start,
                target,
                config.iterations,
                config.min_change_fraction,
                observer,
            ),
        }
    }
}
