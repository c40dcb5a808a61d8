//! System-wide feedback analytics.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, TimeDelta, Utc};
use safespot_core::{EngineConfig, FeedbackRecord, Rating, SubmitterId};
use serde::{Deserialize, Serialize};

use crate::{
    activity::within_window,
    needs::{group_into_cells, unique_submitters},
    stats::{RatingDistribution, count_as_f64, mean, population_std_dev, ratings_as_f64, ratio},
    weighting::record_age,
};

/// Days in the activity window reported by [`FeedbackAnalytics`].
const WEEK_DAYS: u32 = 7;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Reduction of the whole eligible record pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackAnalytics {
    /// Eligible records.
    pub total_feedback: usize,
    /// Distinct submitters.
    pub unique_users: usize,
    /// Distinct coordinate pairs.
    pub unique_locations: usize,
    /// Grid cells meeting the threshold.
    pub locations_with_sufficient_feedback: usize,
    /// Grid cells below the threshold.
    pub locations_needing_feedback: usize,
    /// Threshold in unique submitters.
    pub feedback_threshold: u32,
    /// Percentage of grid cells meeting the threshold; `0.0` without cells.
    pub completion_rate: f64,
    /// Records submitted in the last seven days.
    pub feedback_last_7_days: usize,
    /// `feedback_last_7_days / 7`.
    pub average_daily_feedback: f64,
    /// Plain mean of every rating.
    pub average_rating: Option<f64>,
    /// Population standard deviation of every rating.
    pub rating_std_dev: Option<f64>,
    /// Count per rating value.
    pub rating_distribution: RatingDistribution,
    /// Share of records from trusted submitters.
    pub trusted_ratio: f64,
    /// Mean record age in days.
    pub average_feedback_age_days: Option<f64>,
    /// Evaluation instant.
    pub evaluated_at: DateTime<Utc>,
}

/// Reduce `records` to system-wide analytics.
///
/// Grid cells use `config.grid_precision`; a cell is sufficient when its
/// unique submitter count meets `config.min_feedback_threshold`.
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "analytics report averages and percentages of counts"
)]
#[must_use]
pub fn analyze(
    records: &[FeedbackRecord],
    trusted: &BTreeSet<SubmitterId>,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> FeedbackAnalytics {
    let cells = group_into_cells(records, config.grid_precision);
    let threshold = usize::try_from(config.min_feedback_threshold).unwrap_or(usize::MAX);
    let sufficient = cells
        .values()
        .filter(|members| unique_submitters(members) >= threshold)
        .count();

    let ratings: Vec<Rating> = records.iter().map(|record| record.rating).collect();
    let values = ratings_as_f64(&ratings);
    let ages: Vec<f64> = records
        .iter()
        .map(|record| record_age(record, now).num_seconds() as f64 / SECONDS_PER_DAY)
        .collect();

    let unique_users = records
        .iter()
        .map(|record| &record.submitter)
        .collect::<HashSet<_>>()
        .len();
    let unique_locations = records
        .iter()
        .map(|record| {
            (
                record.location.latitude().to_bits(),
                record.location.longitude().to_bits(),
            )
        })
        .collect::<HashSet<_>>()
        .len();
    let last_week = records
        .iter()
        .filter(|record| within_window(record, now, TimeDelta::days(i64::from(WEEK_DAYS))))
        .count();
    let trusted_records = records
        .iter()
        .filter(|record| trusted.contains(&record.submitter))
        .count();

    FeedbackAnalytics {
        total_feedback: records.len(),
        unique_users,
        unique_locations,
        locations_with_sufficient_feedback: sufficient,
        locations_needing_feedback: cells.len() - sufficient,
        feedback_threshold: config.min_feedback_threshold,
        completion_rate: ratio(sufficient, cells.len()) * 100.0,
        feedback_last_7_days: last_week,
        average_daily_feedback: count_as_f64(last_week) / f64::from(WEEK_DAYS),
        average_rating: mean(&values),
        rating_std_dev: population_std_dev(&values),
        rating_distribution: RatingDistribution::from_ratings(&ratings),
        trusted_ratio: ratio(trusted_records, records.len()),
        average_feedback_age_days: mean(&ages),
        evaluated_at: now,
    }
}
