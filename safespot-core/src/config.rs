//! Tunable constants for aggregation and blending.
//!
//! [`EngineConfig`] is passed explicitly into every entry point, so the
//! aggregation stays a pure function of the record snapshot, the
//! configuration and the evaluation instant.

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tolerance used when checking that blend weights sum to one.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Relative weighting between the AI baseline and crowd feedback.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlendWeights {
    /// Share of the AI baseline in a blended score.
    pub ai: f64,
    /// Share of the feedback score in a blended score.
    pub feedback: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            ai: 0.6,
            feedback: 0.4,
        }
    }
}

impl BlendWeights {
    /// Validate the weights and return a copy.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidBlendWeights`] when either weight is
    /// negative or non-finite, or the pair does not sum to `1.0`.
    #[expect(
        clippy::float_arithmetic,
        reason = "validation sums the two weights"
    )]
    pub fn validate(self) -> Result<Self, ConfigError> {
        let finite = self.ai.is_finite() && self.feedback.is_finite();
        let non_negative = self.ai >= 0.0 && self.feedback >= 0.0;
        let sums_to_one = ((self.ai + self.feedback) - 1.0).abs() <= WEIGHT_SUM_TOLERANCE;
        if finite && non_negative && sums_to_one {
            Ok(self)
        } else {
            Err(ConfigError::InvalidBlendWeights {
                ai: self.ai,
                feedback: self.feedback,
            })
        }
    }
}

/// How a record's age affects its weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RecencyPolicy {
    /// Full weight inside the freshness window, zero outside it.
    #[default]
    HardCutoff,
    /// Weight falls linearly from one at submission to zero at the window edge.
    LinearDecay,
}

/// Engine configuration.
///
/// # Examples
/// ```
/// use safespot_core::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.min_feedback_threshold, 50);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Unique submitters required before feedback joins the score.
    pub min_feedback_threshold: u32,
    /// Cohort radius in metres.
    pub location_radius_meters: f64,
    /// Freshness window in days.
    pub max_feedback_age_days: u32,
    /// Ratings further than this many standard deviations from the mean are
    /// outliers.
    pub outlier_std_dev_threshold: f64,
    /// AI/feedback mixing weights.
    pub blend: BlendWeights,
    /// Age weighting policy.
    pub recency_policy: RecencyPolicy,
    /// Weight multiplier for trusted submitters.
    pub trusted_boost: f64,
    /// Approved records a submitter needs before they count as trusted.
    pub trusted_history_threshold: u32,
    /// Window in days for "recent" activity reporting.
    pub recent_window_days: u32,
    /// Decimal places used to bucket records into grid cells.
    pub grid_precision: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_feedback_threshold: 50,
            location_radius_meters: 100.0,
            max_feedback_age_days: 365,
            outlier_std_dev_threshold: 2.0,
            blend: BlendWeights::default(),
            recency_policy: RecencyPolicy::HardCutoff,
            trusted_boost: 1.25,
            trusted_history_threshold: 3,
            recent_window_days: 30,
            grid_precision: 3,
        }
    }
}

/// Highest supported grid precision; finer cells are below GPS accuracy.
pub const MAX_GRID_PRECISION: u8 = 6;

/// Longest supported day window, roughly a century.
pub const MAX_WINDOW_DAYS: u32 = 36_525;

/// Errors returned by [`EngineConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    /// The sufficiency threshold was zero.
    #[error("minimum feedback threshold must be positive")]
    ZeroThreshold,
    /// The radius was not a positive finite number.
    #[error("location radius {radius} must be a positive number of metres")]
    InvalidRadius {
        /// Rejected radius.
        radius: f64,
    },
    /// The freshness window was zero days.
    #[error("maximum feedback age must be at least one day")]
    ZeroAgeWindow,
    /// A day window exceeded [`MAX_WINDOW_DAYS`].
    #[error("{field} of {days} days exceeds the maximum of {MAX_WINDOW_DAYS}")]
    WindowTooLong {
        /// Name of the rejected field.
        field: &'static str,
        /// Rejected window.
        days: u32,
    },
    /// The outlier threshold was not a positive finite number.
    #[error("outlier threshold {sigma} must be a positive number of standard deviations")]
    InvalidOutlierThreshold {
        /// Rejected threshold.
        sigma: f64,
    },
    /// Blend weights were invalid.
    #[error("blend weights ai={ai} feedback={feedback} must be non-negative and sum to 1.0")]
    InvalidBlendWeights {
        /// Rejected AI weight.
        ai: f64,
        /// Rejected feedback weight.
        feedback: f64,
    },
    /// The trust boost was not a positive finite number.
    #[error("trusted boost {boost} must be positive")]
    InvalidTrustedBoost {
        /// Rejected boost.
        boost: f64,
    },
    /// The grid precision exceeded [`MAX_GRID_PRECISION`].
    #[error("grid precision {precision} exceeds the maximum of {MAX_GRID_PRECISION}")]
    GridTooFine {
        /// Rejected precision.
        precision: u8,
    },
}

impl EngineConfig {
    /// Validate every field and return a copy.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] encountered.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.min_feedback_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        if !is_positive(self.location_radius_meters) {
            return Err(ConfigError::InvalidRadius {
                radius: self.location_radius_meters,
            });
        }
        if self.max_feedback_age_days == 0 {
            return Err(ConfigError::ZeroAgeWindow);
        }
        check_window("max_feedback_age_days", self.max_feedback_age_days)?;
        check_window("recent_window_days", self.recent_window_days)?;
        if !is_positive(self.outlier_std_dev_threshold) {
            return Err(ConfigError::InvalidOutlierThreshold {
                sigma: self.outlier_std_dev_threshold,
            });
        }
        if !is_positive(self.trusted_boost) {
            return Err(ConfigError::InvalidTrustedBoost {
                boost: self.trusted_boost,
            });
        }
        if self.grid_precision > MAX_GRID_PRECISION {
            return Err(ConfigError::GridTooFine {
                precision: self.grid_precision,
            });
        }
        self.blend.validate()?;
        Ok(self)
    }
}

const fn check_window(field: &'static str, days: u32) -> Result<(), ConfigError> {
    if days > MAX_WINDOW_DAYS {
        Err(ConfigError::WindowTooLong { field, days })
    } else {
        Ok(())
    }
}

/// Whether `value` is finite and strictly positive.
#[must_use]
pub const fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[rstest]
    #[case(0.5, 0.5)]
    #[case(1.0, 0.0)]
    #[case(0.7, 0.3)]
    fn blend_weights_accept_unit_sum(#[case] ai: f64, #[case] feedback: f64) {
        assert!(BlendWeights { ai, feedback }.validate().is_ok());
    }

    #[rstest]
    #[case(0.6, 0.6)]
    #[case(1.2, -0.2)]
    #[case(f64::NAN, 0.4)]
    fn blend_weights_reject_invalid(#[case] ai: f64, #[case] feedback: f64) {
        assert!(matches!(
            BlendWeights { ai, feedback }.validate(),
            Err(ConfigError::InvalidBlendWeights { .. })
        ));
    }

    #[rstest]
    fn rejects_zero_threshold() {
        let config = EngineConfig {
            min_feedback_threshold: 0,
            ..EngineConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroThreshold));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-5.0)]
    #[case(f64::INFINITY)]
    fn rejects_non_positive_radius(#[case] radius: f64) {
        let config = EngineConfig {
            location_radius_meters: radius,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRadius { .. })
        ));
    }

    #[rstest]
    fn rejects_zero_age_window() {
        let config = EngineConfig {
            max_feedback_age_days: 0,
            ..EngineConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroAgeWindow));
    }

    #[rstest]
    fn rejects_unbounded_recent_window() {
        let config = EngineConfig {
            recent_window_days: u32::MAX,
            ..EngineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::WindowTooLong {
                field: "recent_window_days",
                days: u32::MAX,
            })
        );
    }

    #[rstest]
    fn rejects_unbounded_age_window() {
        let config = EngineConfig {
            max_feedback_age_days: MAX_WINDOW_DAYS + 1,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WindowTooLong {
                field: "max_feedback_age_days",
                ..
            })
        ));
    }

    #[rstest]
    fn accepts_a_century_window() {
        let config = EngineConfig {
            recent_window_days: MAX_WINDOW_DAYS,
            max_feedback_age_days: MAX_WINDOW_DAYS,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[rstest]
    fn rejects_non_positive_sigma() {
        let config = EngineConfig {
            outlier_std_dev_threshold: 0.0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOutlierThreshold { .. })
        ));
    }

    #[rstest]
    fn rejects_overly_fine_grid() {
        let config = EngineConfig {
            grid_precision: 9,
            ..EngineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::GridTooFine { precision: 9 })
        );
    }
}
