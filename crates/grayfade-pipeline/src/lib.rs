//! grayfade-pipeline: Grayscale image transitions (sans-IO).
//!
//! Produces a sequence of frames that morphs a start image into a target
//! image. The default producer is a greedy best-first search over
//! single-pixel edits:
//!
//! start image -> search (expand, dedupe, prune) -> goal node ->
//! path reconstruction -> frames.
//!
//! Two diffusion producers (iterative and bidirectional) trade the
//! one-pixel-per-frame guarantee for a fixed number of whole-frame
//! relaxation rounds.
//!
//! This crate has **no I/O dependencies**: it takes image bytes or
//! decoded [`GrayImage`]s and returns frames in memory. Encoding and file
//! handling live in `grayfade-export` and the `grayfade` binary.

pub mod diagnostics;
pub mod diffusion;
pub mod grayscale;
pub mod search;
pub mod transition;
pub mod types;

pub use diagnostics::{
    IterationProgress, NoopObserver, ProgressObserver, RecordingObserver, SearchProgress,
    SearchStats, TracingObserver,
};
pub use search::{PrunePolicy, SearchController, SearchState};
pub use transition::{Transitioner, TransitionerKind};
pub use types::{Dimensions, GrayImage, SearchConfig, TransitionConfig, TransitionError};

/// Produce the frames of a transition from `start` to `target`.
///
/// Equivalent to [`transition_with_observer`] with a [`NoopObserver`].
///
/// # Errors
///
/// See [`transition_with_observer`].
pub fn transition(
    start: &GrayImage,
    target: &GrayImage,
    config: &TransitionConfig,
) -> Result<Vec<GrayImage>, TransitionError> {
    transition_with_observer(start, target, config, &mut NoopObserver)
}

/// Produce the frames of a transition, reporting progress to `observer`.
///
/// The first frame is `start`. For the search, the last frame equals
/// `target` at every sampled pixel and adjacent frames differ in at most
/// one pixel.
///
/// # Errors
///
/// Returns [`TransitionError::InvalidConfig`] if `config` fails
/// validation, [`TransitionError::EmptyImage`] or
/// [`TransitionError::DimensionMismatch`] for unusable images, and
/// [`TransitionError::SearchExhausted`] if the search runs out of states.
pub fn transition_with_observer(
    start: &GrayImage,
    target: &GrayImage,
    config: &TransitionConfig,
    observer: &mut dyn ProgressObserver,
) -> Result<Vec<GrayImage>, TransitionError> {
    config.validate()?;
    grayscale::ensure_same_dimensions(start, target)?;

    tracing::info!(
        transitioner = %config.transitioner,
        dimensions = %Dimensions::of(start),
        "starting transition"
    );
    config
        .transitioner
        .transition(start, target, config, observer)
}

/// Decode two encoded images and produce the frames between them.
///
/// Both images are converted to grayscale first.
///
/// # Errors
///
/// Returns [`TransitionError::EmptyInput`] or
/// [`TransitionError::ImageDecode`] if either input cannot be decoded,
/// plus every error of [`transition_with_observer`].
pub fn transition_bytes(
    start_bytes: &[u8],
    target_bytes: &[u8],
    config: &TransitionConfig,
    observer: &mut dyn ProgressObserver,
) -> Result<Vec<GrayImage>, TransitionError> {
    let start = grayscale::decode_and_grayscale(start_bytes)?;
    let target = grayscale::decode_and_grayscale(target_bytes)?;
    transition_with_observer(&start, &target, config, observer)
}
