//! Per-record weights from recency and submitter trust.

use chrono::{DateTime, TimeDelta, Utc};
use safespot_core::{EngineConfig, FeedbackRecord, RecencyPolicy};

/// Age of a record at `now`; submissions dated in the future count as new.
#[must_use]
pub fn record_age(record: &FeedbackRecord, now: DateTime<Utc>) -> TimeDelta {
    now.signed_duration_since(record.submitted_at)
        .max(TimeDelta::zero())
}

/// Whether a record of this age lies inside the freshness window.
#[must_use]
pub fn is_fresh(age: TimeDelta, config: &EngineConfig) -> bool {
    age <= TimeDelta::days(i64::from(config.max_feedback_age_days))
}

/// Recency factor for a record of the given age.
///
/// Under [`RecencyPolicy::HardCutoff`] the factor is `1.0` inside the window
/// (boundary included) and `0.0` outside it. Under
/// [`RecencyPolicy::LinearDecay`] it falls from `1.0` at submission to `0.0`
/// at the window edge.
///
/// # Examples
/// ```
/// use chrono::TimeDelta;
/// use safespot_core::EngineConfig;
/// use safespot_scorer::recency_factor;
///
/// let config = EngineConfig::default();
/// assert_eq!(recency_factor(TimeDelta::days(365), &config), 1.0);
/// assert_eq!(recency_factor(TimeDelta::days(366), &config), 0.0);
/// ```
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "linear decay divides second counts well below 2^52"
)]
#[must_use]
pub fn recency_factor(age: TimeDelta, config: &EngineConfig) -> f64 {
    if !is_fresh(age, config) {
        return 0.0;
    }
    match config.recency_policy {
        RecencyPolicy::HardCutoff => 1.0,
        RecencyPolicy::LinearDecay => {
            let window = TimeDelta::days(i64::from(config.max_feedback_age_days));
            let elapsed = age.num_seconds() as f64 / window.num_seconds() as f64;
            (1.0 - elapsed).clamp(0.0, 1.0)
        }
    }
}

/// Trust factor: the configured boost for trusted submitters, else `1.0`.
#[must_use]
pub const fn trust_factor(trusted: bool, config: &EngineConfig) -> f64 {
    if trusted { config.trusted_boost } else { 1.0 }
}

/// A cohort member annotated with the factors that make up its weight.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedRecord<'a> {
    /// The underlying record.
    pub record: &'a FeedbackRecord,
    /// Whether the submitter is trusted.
    pub trusted: bool,
    /// Whether the record lies inside the freshness window.
    pub fresh: bool,
    /// Whether the outlier filter flagged the rating.
    pub outlier: bool,
    /// Recency factor in `0.0..=1.0`.
    pub recency_factor: f64,
    /// Trust factor (`1.0` or the configured boost).
    pub trust_factor: f64,
}

impl<'a> WeightedRecord<'a> {
    /// Annotate `record` with its recency and trust factors.
    ///
    /// The outlier flag starts cleared; the outlier filter sets it.
    #[must_use]
    pub fn new(
        record: &'a FeedbackRecord,
        trusted: bool,
        config: &EngineConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let age = record_age(record, now);
        Self {
            record,
            trusted,
            fresh: is_fresh(age, config),
            outlier: false,
            recency_factor: recency_factor(age, config),
            trust_factor: trust_factor(trusted, config),
        }
    }

    /// Combined weight: recency × trust, or zero for an outlier.
    ///
    /// The trust boost can lift the weight above `1.0`; the weighted mean
    /// divides by the total weight, so the mean stays within the rating
    /// range.
    #[expect(clippy::float_arithmetic, reason = "weights multiply factors")]
    #[must_use]
    pub const fn weight(&self) -> f64 {
        if self.outlier {
            0.0
        } else {
            self.recency_factor * self.trust_factor
        }
    }
}
