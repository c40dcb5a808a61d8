//! Aggregation statistics: reduce a cohort to an [`AggregationSummary`].
//!
//! Every reduction walks the cohort in member (id) order, so summarising
//! the same snapshot twice yields bit-identical floats.

use std::{collections::BTreeSet, fmt};

use chrono::{DateTime, TimeDelta, Utc};
use safespot_core::{Cohort, EngineConfig, FeedbackRecord, GeoPoint, Rating, SubmitterId};
use serde::{Deserialize, Serialize};

use crate::{
    activity::{Engagement, RecentActivity, within_window},
    outlier::flag_outliers,
    stats::{RatingDistribution, RatingStatistics, ratio},
    weighting::WeightedRecord,
};

/// Highest rating counted as a negative report.
pub const NEGATIVE_RATING_CEILING: u8 = 3;
/// Record count below which a summary warns about limited data.
pub const LIMITED_DATA_COUNT: usize = 10;

/// The point and radius a summary was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryArea {
    /// Query point; also the cohort's nominal centre.
    pub point: GeoPoint,
    /// Radius in metres.
    pub radius_meters: f64,
}

impl QueryArea {
    /// Describe the area a cohort was resolved for.
    #[must_use]
    pub const fn of(cohort: &Cohort) -> Self {
        Self {
            point: cohort.query(),
            radius_meters: cohort.radius_m(),
        }
    }
}

/// Reporting-only quality indicators.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityFlags {
    /// Share of records from trusted submitters.
    pub trusted_ratio: f64,
    /// Share of records inside the freshness window.
    pub freshness_ratio: f64,
    /// Records flagged as outliers.
    pub outlier_count: usize,
    /// Records outside the freshness window.
    pub stale_count: usize,
    /// Records inside the recent-activity window.
    pub recent_count: usize,
}

/// Guidance derived from the unweighted ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    /// Nobody has rated the location.
    NoFeedback,
    /// Average rating below 4.
    AvoidArea,
    /// Average rating below 6.
    ExerciseCaution,
    /// Average rating of 8 or more.
    GenerallySafe,
    /// Low ratings inside the recent-activity window.
    RecentNegativeReports {
        /// Ratings of 3 or less in the window.
        count: usize,
    },
    /// Fewer than ten records.
    LimitedData,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFeedback => f.write_str("no feedback available for this location"),
            Self::AvoidArea => f.write_str("low safety rating, consider avoiding this area"),
            Self::ExerciseCaution => f.write_str("moderate safety rating, exercise caution"),
            Self::GenerallySafe => f.write_str("high safety rating, generally safe area"),
            Self::RecentNegativeReports { count } => {
                write!(f, "recent negative feedback ({count} reports)")
            }
            Self::LimitedData => f.write_str("limited feedback data, more input needed"),
        }
    }
}

/// Reduction of a cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationSummary {
    /// Query point and radius.
    pub query: QueryArea,
    /// Eligible records in the cohort, outliers and stale records included.
    pub feedback_count: usize,
    /// Distinct submitters among all eligible records.
    pub unique_user_count: usize,
    /// Weighted mean over records with positive weight.
    pub mean_rating: Option<f64>,
    /// Count per rating value over all eligible records.
    pub rating_distribution: RatingDistribution,
    /// `mean_rating / 10`, in `0.0..=1.0`.
    pub feedback_safety_score: Option<f64>,
    /// Whether `unique_user_count` meets the threshold.
    pub has_sufficient_feedback: bool,
    /// Quality indicators.
    pub quality: QualityFlags,
    /// Unweighted statistics.
    pub statistics: RatingStatistics,
    /// Submissions in recent windows.
    pub recent_activity: RecentActivity,
    /// Submitter engagement.
    pub engagement: Engagement,
    /// Guidance for the location.
    pub recommendations: Vec<Recommendation>,
    /// Evaluation instant.
    pub evaluated_at: DateTime<Utc>,
}

/// Annotate every member with its weight factors and outlier flag.
#[must_use]
pub fn weigh_cohort<'a>(
    members: &'a [FeedbackRecord],
    trusted: &BTreeSet<SubmitterId>,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Vec<WeightedRecord<'a>> {
    let ratings: Vec<Rating> = members.iter().map(|record| record.rating).collect();
    let outliers = flag_outliers(&ratings, config.outlier_std_dev_threshold);
    members
        .iter()
        .zip(outliers)
        .map(|(record, outlier)| {
            let mut weighted =
                WeightedRecord::new(record, trusted.contains(&record.submitter), config, now);
            weighted.outlier = outlier;
            weighted
        })
        .collect()
}

/// `Σ(rating × weight) / Σ(weight)` over records with positive weight.
#[expect(
    clippy::float_arithmetic,
    reason = "the weighted mean divides weighted sums"
)]
#[must_use]
pub fn weighted_mean(records: &[WeightedRecord<'_>]) -> Option<f64> {
    let (weighted_sum, total_weight) = records
        .iter()
        .map(|entry| (entry.record.rating.as_f64(), entry.weight()))
        .filter(|(_, weight)| *weight > 0.0)
        .fold((0.0, 0.0), |(sum, total), (rating, weight)| {
            (sum + rating * weight, total + weight)
        });
    (total_weight > 0.0).then(|| weighted_sum / total_weight)
}

/// Rescale a 1–10 mean rating into `0.0..=1.0`.
#[expect(clippy::float_arithmetic, reason = "rescaling divides by ten")]
#[must_use]
pub const fn safety_score_from_mean(mean_rating: f64) -> f64 {
    (mean_rating / 10.0).clamp(0.0, 1.0)
}

/// Reduce `cohort` to a summary.
///
/// `trusted` holds the submitters the trust oracle vouched for. The result
/// depends only on the cohort, `trusted`, `config` and `now`.
#[must_use]
pub fn summarize_cohort(
    cohort: &Cohort,
    trusted: &BTreeSet<SubmitterId>,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> AggregationSummary {
    let members = cohort.members();
    let weighted = weigh_cohort(members, trusted, config, now);
    let ratings: Vec<Rating> = members.iter().map(|record| record.rating).collect();

    let mean_rating = weighted_mean(&weighted);
    let unique_user_count = cohort.unique_submitter_count();
    let threshold = usize::try_from(config.min_feedback_threshold).unwrap_or(usize::MAX);
    let statistics = RatingStatistics::from_ratings(&ratings);
    let recent_window = TimeDelta::days(i64::from(config.recent_window_days));

    let total = weighted.len();
    let trusted_count = weighted.iter().filter(|entry| entry.trusted).count();
    let fresh_count = weighted.iter().filter(|entry| entry.fresh).count();
    let quality = QualityFlags {
        trusted_ratio: ratio(trusted_count, total),
        freshness_ratio: ratio(fresh_count, total),
        outlier_count: weighted.iter().filter(|entry| entry.outlier).count(),
        stale_count: total - fresh_count,
        recent_count: members
            .iter()
            .filter(|record| within_window(record, now, recent_window))
            .count(),
    };

    AggregationSummary {
        query: QueryArea::of(cohort),
        feedback_count: members.len(),
        unique_user_count,
        mean_rating,
        rating_distribution: RatingDistribution::from_ratings(&ratings),
        feedback_safety_score: mean_rating.map(safety_score_from_mean),
        has_sufficient_feedback: unique_user_count >= threshold,
        quality,
        recommendations: recommend(members, statistics.average_rating, recent_window, now),
        statistics,
        recent_activity: RecentActivity::from_records(members, now),
        engagement: Engagement::from_records(members),
        evaluated_at: now,
    }
}

/// Guidance for a group of records given their unweighted average.
#[must_use]
pub fn recommend(
    records: &[FeedbackRecord],
    average_rating: Option<f64>,
    recent_window: TimeDelta,
    now: DateTime<Utc>,
) -> Vec<Recommendation> {
    let Some(average) = average_rating else {
        return vec![Recommendation::NoFeedback];
    };
    let mut recommendations = Vec::new();
    if average < 4.0 {
        recommendations.push(Recommendation::AvoidArea);
    } else if average < 6.0 {
        recommendations.push(Recommendation::ExerciseCaution);
    } else if average >= 8.0 {
        recommendations.push(Recommendation::GenerallySafe);
    }
    let recent_negative = records
        .iter()
        .filter(|record| record.rating.get() <= NEGATIVE_RATING_CEILING)
        .filter(|record| within_window(record, now, recent_window))
        .count();
    if recent_negative > 0 {
        recommendations.push(Recommendation::RecentNegativeReports {
            count: recent_negative,
        });
    }
    if records.len() < LIMITED_DATA_COUNT {
        recommendations.push(Recommendation::LimitedData);
    }
    recommendations
}
