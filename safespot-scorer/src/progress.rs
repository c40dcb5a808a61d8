//! Threshold progress tracking.
//!
//! Progress is a pure function of the unique submitter count and the
//! sufficiency threshold. Bucket edges are computed with integer arithmetic
//! so the boundaries are exact for any threshold.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    activity::{Engagement, RecentActivity},
    summary::QueryArea,
};

/// Upper edge (inclusive, percent) of the `started` bucket.
const STARTED_CEILING_PERCENT: u64 = 25;
/// Lower edge (inclusive, percent) of the `nearly_complete` bucket.
const NEARLY_COMPLETE_FLOOR_PERCENT: u64 = 70;

/// Distance of a location from the sufficiency threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    /// No submitters yet.
    NotStarted,
    /// Up to a quarter of the threshold.
    Started,
    /// Between a quarter and seven tenths of the threshold.
    InProgress,
    /// Seven tenths of the threshold or more, but below it.
    NearlyComplete,
    /// Threshold reached.
    Complete,
}

impl ProgressState {
    /// Stable `snake_case` label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Started => "started",
            Self::InProgress => "in_progress",
            Self::NearlyComplete => "nearly_complete",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for ProgressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a unique submitter count against a threshold.
///
/// # Examples
/// ```
/// use safespot_scorer::{Progress, ProgressState};
///
/// let progress = Progress::from_count(12, 50);
/// assert_eq!(progress.state, ProgressState::Started);
/// assert_eq!(progress.remaining_needed, 38);
/// assert!((progress.progress_percentage - 24.0).abs() < 1e-9);
///
/// assert_eq!(Progress::from_count(13, 50).state, ProgressState::InProgress);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Bucket for the count.
    pub state: ProgressState,
    /// `min(100, 100 × count / threshold)`.
    pub progress_percentage: f64,
    /// Submitters still needed, never negative.
    pub remaining_needed: u64,
    /// Distinct submitters counted.
    pub unique_user_count: u64,
    /// Sufficiency threshold used.
    pub threshold: u32,
}

impl Progress {
    /// Classify `unique_user_count` against `threshold`.
    ///
    /// A zero threshold is always complete.
    #[must_use]
    pub fn from_count(unique_user_count: usize, threshold: u32) -> Self {
        let count = u64::try_from(unique_user_count).unwrap_or(u64::MAX);
        let target = u64::from(threshold);
        Self {
            state: classify(count, target),
            progress_percentage: percentage(count, target),
            remaining_needed: target.saturating_sub(count),
            unique_user_count: count,
            threshold,
        }
    }

    /// Whether the threshold is met.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == ProgressState::Complete
    }
}

fn classify(count: u64, target: u64) -> ProgressState {
    let scaled = u128::from(count) * 100;
    let target_wide = u128::from(target);
    if count >= target {
        ProgressState::Complete
    } else if count == 0 {
        ProgressState::NotStarted
    } else if scaled <= target_wide * u128::from(STARTED_CEILING_PERCENT) {
        ProgressState::Started
    } else if scaled >= target_wide * u128::from(NEARLY_COMPLETE_FLOOR_PERCENT) {
        ProgressState::NearlyComplete
    } else {
        ProgressState::InProgress
    }
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "percentages divide counts far below 2^52"
)]
const fn percentage(count: u64, target: u64) -> f64 {
    if count >= target {
        return 100.0;
    }
    (100.0 * count as f64 / target as f64).min(100.0)
}

/// Progress of one location with its recent activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    /// Query point and radius.
    pub query: QueryArea,
    /// Threshold progress.
    pub progress: Progress,
    /// Eligible records in the cohort.
    pub feedback_count: usize,
    /// Submissions in recent windows.
    pub recent_activity: RecentActivity,
    /// Submitter engagement.
    pub engagement: Engagement,
    /// Evaluation instant.
    pub evaluated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, ProgressState::NotStarted)]
    #[case(1, ProgressState::Started)]
    #[case(12, ProgressState::Started)]
    #[case(13, ProgressState::InProgress)]
    #[case(34, ProgressState::InProgress)]
    #[case(35, ProgressState::NearlyComplete)]
    #[case(49, ProgressState::NearlyComplete)]
    #[case(50, ProgressState::Complete)]
    #[case(120, ProgressState::Complete)]
    fn buckets_follow_the_default_threshold(#[case] count: usize, #[case] state: ProgressState) {
        assert_eq!(Progress::from_count(count, 50).state, state);
    }

    #[rstest]
    #[case(0, 50, 0.0)]
    #[case(25, 50, 50.0)]
    #[case(75, 50, 100.0)]
    fn percentage_is_capped(#[case] count: usize, #[case] threshold: u32, #[case] expected: f64) {
        let progress = Progress::from_count(count, threshold);
        assert!((progress.progress_percentage - expected).abs() < 1e-9);
    }

    #[rstest]
    fn remaining_never_goes_negative() {
        assert_eq!(Progress::from_count(70, 50).remaining_needed, 0);
        assert_eq!(Progress::from_count(0, 50).remaining_needed, 50);
    }

    #[rstest]
    fn zero_threshold_is_complete() {
        let progress = Progress::from_count(0, 0);
        assert!(progress.is_complete());
        assert!((progress.progress_percentage - 100.0).abs() < f64::EPSILON);
    }

    #[rstest]
    fn repeated_calls_agree() {
        assert_eq!(Progress::from_count(33, 50), Progress::from_count(33, 50));
    }

    #[rstest]
    fn states_serialise_in_snake_case() {
        let json = serde_json::to_string(&ProgressState::NearlyComplete).expect("serialise");
        assert_eq!(json, "\"nearly_complete\"");
    }
}
