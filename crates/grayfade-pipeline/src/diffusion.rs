//! Diffusion transitioners: whole-frame relaxation toward a goal image.
//!
//! Unlike the search, every pixel may change between two frames. Each
//! relaxation step moves a pixel one intensity unit toward its goal
//! value, or adopts an axis neighbour's value when that is at least as
//! close. The neighbour copies make image content appear to slide.

use image::{GrayImage, Luma};

use crate::diagnostics::{IterationProgress, ProgressObserver};
use crate::grayscale::ensure_same_dimensions;
use crate::types::{Dimensions, TransitionError};

/// One relaxation step of `current` toward `goal`.
///
/// All pixels are computed from `current`, so the update is
/// simultaneous. Returns the new frame and how many pixels changed.
#[must_use]
pub fn relax_toward(current: &GrayImage, goal: &GrayImage) -> (GrayImage, u64) {
    let (width, height) = current.dimensions();
    let mut next = current.clone();
    let mut changed: u64 = 0;

    for y in 0..height {
        for x in 0..width {
            let value = current.get_pixel(x, y).0[0];
            let desired = goal.get_pixel(x, y).0[0];
            if value == desired {
                continue;
            }

            let mut best = if desired > value { value + 1 } else { value - 1 };
            let mut best_error = best.abs_diff(desired);

            let neighbours = [
                x.checked_sub(1).map(|lx| (lx, y)),
                (x + 1 < width).then_some((x + 1, y)),
                y.checked_sub(1).map(|uy| (x, uy)),
                (y + 1 < height).then_some((x, y + 1)),
            ];
            for (nx, ny) in neighbours.into_iter().flatten() {
                let option = current.get_pixel(nx, ny).0[0];
                let error = option.abs_diff(desired);
                if error <= best_error {
                    best = option;
                    best_error = error;
                }
            }

            next.put_pixel(x, y, Luma([best]));
            changed += 1;
        }
    }

    (next, changed)
}

/// Relax `start` toward `target` for up to `iterations` rounds.
///
/// Frames are `start`, every intermediate frame, then `target`. Stops
/// early once a round changes nothing; the target is not repeated when
/// the last intermediate frame already equals it.
///
/// # Errors
///
/// Returns [`TransitionError::EmptyImage`] or
/// [`TransitionError::DimensionMismatch`] for unusable images.
pub fn iterative(
    start: &GrayImage,
    target: &GrayImage,
    iterations: u32,
    observer: &mut dyn ProgressObserver,
) -> Result<Vec<GrayImage>, TransitionError> {
    ensure_same_dimensions(start, target)?;

    let mut frames = vec![start.clone()];
    for iteration in 1..=iterations {
        let Some(current) = frames.last() else {
            break;
        };
        let (next, changed) = relax_toward(current, target);
        observer.on_iteration(&IterationProgress {
            iteration,
            total: iterations,
            changed_pixels: changed,
        });
        if changed == 0 {
            break;
        }
        frames.push(next);
    }

    if frames.last().is_none_or(|last| last.as_raw() != target.as_raw()) {
        frames.push(target.clone());
    }

    tracing::debug!(frames = frames.len(), "iterative transition finished");
    Ok(frames)
}

/// Relax from both ends toward each other.
///
/// Each round moves the forward image one step toward the current
/// backward image, then the backward image one step toward the new
/// forward image. Stops after `iterations` rounds or as soon as a
/// half-step changes fewer than `min_change_fraction` of all pixels, or
/// none at all.
///
/// Frames are the forward sequence (from `start`) followed by the
/// backward sequence reversed (ending at `target`).
///
/// # Errors
///
/// Returns [`TransitionError::EmptyImage`] or
/// [`TransitionError::DimensionMismatch`] for unusable images.
pub fn bidirectional(
    start: &GrayImage,
    target: &GrayImage,
    iterations: u32,
    min_change_fraction: f64,
    observer: &mut dyn ProgressObserver,
) -> Result<Vec<GrayImage>, TransitionError> {
    ensure_same_dimensions(start, target)?;

    let min_changed = min_changed_pixels(Dimensions::of(start), min_change_fraction).max(1);
    let mut forward = vec![start.clone()];
    let mut backward = vec![target.clone()];

    for iteration in 1..=iterations {
        let (Some(ahead), Some(behind)) = (forward.last(), backward.last()) else {
            break;
        };
        let (next_forward, changed_forward) = relax_toward(ahead, behind);
        let (next_backward, changed_backward) = relax_toward(behind, &next_forward);
        forward.push(next_forward);

        if changed_forward < min_changed {
            report(observer, iteration, iterations, changed_forward);
            break;
        }
        backward.push(next_backward);
        report(observer, iteration, iterations, changed_forward + changed_backward);
        if changed_backward < min_changed {
            break;
        }
    }

    tracing::debug!(
        forward = forward.len(),
        backward = backward.len(),
        "bidirectional transition finished"
    );
    forward.extend(backward.into_iter().rev());
    Ok(forward)
}

fn report(observer: &mut dyn ProgressObserver, iteration: u32, total: u32, changed: u64) {
    observer.on_iteration(&IterationProgress {
        iteration,
        total,
        changed_pixels: changed,
    });
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn min_changed_pixels(dimensions: Dimensions, fraction: f64) -> u64 {
    (dimensions.pixel_count() as f64 * fraction) as u64
}
