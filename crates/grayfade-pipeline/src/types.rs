//! Shared types for the grayfade transition engine.

use serde::{Deserialize, Serialize};

use crate::search::PrunePolicy;
use crate::transition::TransitionerKind;

/// Re-export `GrayImage` so downstream crates can pass frames around
/// without depending on `image` directly.
pub use image::GrayImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an existing grayscale image.
    #[must_use]
    pub fn of(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Configuration for producing a transition between two images.
///
/// Every field has a default, so a partial JSON object such as
/// `{"scale": 4}` deserializes into a complete configuration.
///
/// Call [`TransitionConfig::validate`] before running; the public
/// entry points in this crate do so automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Which frame producer to run.
    pub transitioner: TransitionerKind,

    /// Sampling stride. Only pixels whose `x` and `y` are both multiples
    /// of `scale` take part in the heuristic, child generation and the
    /// goal test. Larger values finish sooner but leave un-sampled
    /// pixels at their start values.
    pub scale: u32,

    /// Number of search iterations between prune passes and progress
    /// reports.
    pub batch_size: u32,

    /// Number of relaxation rounds for the diffusion transitioners.
    /// Ignored by the search.
    pub iterations: u32,

    /// Maximum number of candidate moves kept per sampled pixel per
    /// expansion.
    pub branching_factor: usize,

    /// Frontier truncation policy.
    pub prune: PrunePolicy,

    /// The bidirectional transitioner stops once a half-step changes
    /// fewer than this fraction of all pixels.
    pub min_change_fraction: f64,
}

impl TransitionConfig {
    /// Default sampling stride (every pixel).
    pub const DEFAULT_SCALE: u32 = 1;
    /// Default number of iterations between progress reports.
    pub const DEFAULT_BATCH_SIZE: u32 = 1;
    /// Default diffusion iteration count.
    pub const DEFAULT_ITERATIONS: u32 = 10;
    /// Default per-pixel branching cap.
    pub const DEFAULT_BRANCHING_FACTOR: usize = 3;
    /// Default bidirectional early-stop fraction.
    pub const DEFAULT_MIN_CHANGE_FRACTION: f64 = 0.15;

    /// Check the configuration for values no transitioner can run with.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidConfig`] naming the first
    /// offending field.
    pub fn validate(&self) -> Result<(), TransitionError> {
        if !(0.0..=1.0).contains(&self.min_change_fraction) {
            return Err(TransitionError::InvalidConfig(format!(
                "min_change_fraction must be within 0.0..=1.0, got {}",
                self.min_change_fraction
            )));
        }
        self.search_config().validate()
    }

    /// The subset of this configuration the search engine reads.
    #[must_use]
    pub const fn search_config(&self) -> SearchConfig {
        SearchConfig {
            scale: self.scale,
            batch_size: self.batch_size,
            branching_factor: self.branching_factor,
            prune: self.prune,
        }
    }
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            transitioner: TransitionerKind::default(),
            scale: Self::DEFAULT_SCALE,
            batch_size: Self::DEFAULT_BATCH_SIZE,
            iterations: Self::DEFAULT_ITERATIONS,
            branching_factor: Self::DEFAULT_BRANCHING_FACTOR,
            prune: PrunePolicy::default(),
            min_change_fraction: Self::DEFAULT_MIN_CHANGE_FRACTION,
        }
    }
}

/// Parameters of a single search run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Sampling stride (see [`TransitionConfig::scale`]).
    pub scale: u32,
    /// Iterations between prune passes and progress reports.
    pub batch_size: u32,
    /// Candidates kept per sampled pixel per expansion.
    pub branching_factor: usize,
    /// Frontier truncation policy.
    pub prune: PrunePolicy,
}

impl SearchConfig {
    /// Check the search parameters.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidConfig`] for a zero `scale`,
    /// `batch_size` or `branching_factor`, or an invalid prune policy.
    pub fn validate(&self) -> Result<(), TransitionError> {
        if self.scale == 0 {
            return Err(TransitionError::InvalidConfig(
                "scale must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(TransitionError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.branching_factor == 0 {
            return Err(TransitionError::InvalidConfig(
                "branching_factor must be at least 1".to_string(),
            ));
        }
        self.prune.validate()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        TransitionConfig::default().search_config()
    }
}

/// Errors that can occur while producing a transition.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    /// Failed to decode an input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// An input image has zero width or height.
    #[error("input image has no pixels")]
    EmptyImage,

    /// Start and target images differ in size.
    #[error("image dimensions differ: start is {start}, target is {target}")]
    DimensionMismatch {
        /// Dimensions of the start image.
        start: Dimensions,
        /// Dimensions of the target image.
        target: Dimensions,
    },

    /// Transition configuration is invalid.
    #[error("invalid transition configuration: {0}")]
    InvalidConfig(String),

    /// The open list emptied before any state matched the target.
    ///
    /// The move set cannot reach the target at the configured sampling
    /// stride, or pruning discarded every route to it.
    #[error("search exhausted the open list after {expanded} expansions without reaching the target")]
    SearchExhausted {
        /// Number of nodes expanded before the frontier ran dry.
        expanded: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_of_image() {
        let img = GrayImage::new(7, 3);
        let dims = Dimensions::of(&img);
        assert_eq!(
            dims,
            Dimensions {
                width: 7,
                height: 3
            }
        );
        assert_eq!(dims.pixel_count(), 21);
        assert_eq!(dims.to_string(), "7x3");
    }

    #[test]
    fn config_defaults() {
        let config = TransitionConfig::default();
        assert_eq!(config.transitioner, TransitionerKind::Search);
        assert_eq!(config.scale, 1);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.iterations, 10);
        assert_eq!(config.branching_factor, 3);
        assert_eq!(config.prune, PrunePolicy::default());
        assert!((config.min_change_fraction - 0.15).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_scale_is_rejected() {
        let config = TransitionConfig {
            scale: 0,
            ..TransitionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TransitionError::InvalidConfig(ref msg)) if msg.contains("scale")
        ));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let config = TransitionConfig {
            batch_size: 0,
            ..TransitionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TransitionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn out_of_range_change_fraction_is_rejected() {
        let config = TransitionConfig {
            min_change_fraction: 1.5,
            ..TransitionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn search_config_projection() {
        let config = TransitionConfig {
            scale: 4,
            batch_size: 25,
            branching_factor: 2,
            ..TransitionConfig::default()
        };
        let search = config.search_config();
        assert_eq!(search.scale, 4);
        assert_eq!(search.batch_size, 25);
        assert_eq!(search.branching_factor, 2);
        assert_eq!(search.prune, config.prune);
    }

    #[test]
    fn partial_json_fills_defaults() {
        #[allow(clippy::unwrap_used)]
        let config: TransitionConfig =
            serde_json::from_str(r#"{"scale": 4, "transitioner": "iterative"}"#).unwrap();
        assert_eq!(config.scale, 4);
        assert_eq!(config.transitioner, TransitionerKind::Iterative);
        assert_eq!(config.iterations, TransitionConfig::DEFAULT_ITERATIONS);
    }

    #[test]
    fn error_display_messages() {
        let err = TransitionError::DimensionMismatch {
            start: Dimensions {
                width: 2,
                height: 2,
            },
            target: Dimensions {
                width: 3,
                height: 2,
            },
        };
        assert_eq!(
            err.to_string(),
            "image dimensions differ: start is 2x2, target is 3x2"
        );
        assert_eq!(
            TransitionError::SearchExhausted { expanded: 12 }.to_string(),
            "search exhausted the open list after 12 expansions without reaching the target"
        );
        assert_eq!(
            TransitionError::EmptyInput.to_string(),
            "input image data is empty"
        );
    }
}
