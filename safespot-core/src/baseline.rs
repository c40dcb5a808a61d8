//! The AI baseline score consumed by blending.

use std::error::Error as StdError;

use thiserror::Error;

use crate::GeoPoint;

/// Failure reported by a baseline scorer.
#[derive(Debug, Error)]
pub enum BaselineError {
    /// The scorer could not be reached.
    #[error("baseline scorer unavailable: {reason}")]
    Unavailable {
        /// Human-readable cause.
        reason: String,
    },
    /// The backing model failed.
    #[error(transparent)]
    Backend(Box<dyn StdError + Send + Sync + 'static>),
}

/// Produce the AI-derived safety score for a point on the `1..=10` scale.
///
/// The range is a convention, not a guarantee; blending clamps its output.
pub trait BaselineScorer: Send + Sync {
    /// Return the baseline score for `point`.
    ///
    /// # Errors
    /// Returns [`BaselineError`] when the model cannot produce a score.
    fn baseline_score(&self, point: GeoPoint) -> Result<f64, BaselineError>;
}

/// Baseline scorer returning the same score everywhere.
///
/// Used when the caller already holds a baseline (for example the CLI's
/// `--baseline` flag).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedBaseline(pub f64);

impl BaselineScorer for FixedBaseline {
    fn baseline_score(&self, _point: GeoPoint) -> Result<f64, BaselineError> {
        Ok(self.0)
    }
}
