//! Feedback aggregation and blended safety scoring.
//!
//! The crate turns the eligible feedback around a point into an
//! [`AggregationSummary`] and blends it with an AI baseline:
//! - **Quality weighting** gives each record a recency factor and a trust
//!   factor ([`WeightedRecord`]).
//! - **Outlier filtering** zeroes the weight of ratings more than
//!   `outlier_std_dev_threshold` population standard deviations from the
//!   cohort mean ([`flag_outliers`]).
//! - **Aggregation** reduces a cohort to counts, a weighted mean and a
//!   normalised feedback safety score ([`summarize_cohort`]).
//! - **Progress tracking** buckets the unique submitter count against the
//!   sufficiency threshold ([`Progress`]).
//! - **Blending** mixes the AI baseline with the feedback score once the
//!   threshold is met ([`blend_scores`]).
//!
//! [`FeedbackEngine`] wires these pure functions to a record store, a trust
//! oracle, a baseline scorer and a clock, and adds location-need ranking and
//! system analytics over the whole record pool.
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeSet;
//!
//! use chrono::{TimeZone, Utc};
//! use safespot_core::{Cohort, EngineConfig, GeoPoint};
//! use safespot_scorer::summarize_cohort;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let point = GeoPoint::new(13.05, 80.28)?;
//! let cohort = Cohort::resolve(point, 100.0, Vec::new())?;
//! let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().ok_or("date")?;
//! let summary = summarize_cohort(&cohort, &BTreeSet::new(), &EngineConfig::default(), now);
//! assert_eq!(summary.feedback_count, 0);
//! assert!(summary.feedback_safety_score.is_none());
//! assert!(!summary.has_sufficient_feedback);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod activity;
mod analytics;
mod blend;
mod engine;
mod error;
mod needs;
mod outlier;
mod progress;
mod stats;
mod summary;
mod weighting;

pub use activity::{ActiveSubmitter, Engagement, RecentActivity};
pub use analytics::{FeedbackAnalytics, analyze};
pub use blend::{BlendedScore, ScoringMethod, blend_scores};
pub use engine::FeedbackEngine;
pub use error::{EngineError, Upstream};
pub use needs::{
    GridKey, LocationNeed, NeedOrder, ParseNeedOrderError, group_into_cells,
    locations_needing_feedback,
};
pub use outlier::{MIN_OUTLIER_SAMPLE, flag_outliers};
pub use progress::{Progress, ProgressReport, ProgressState};
pub use stats::{RatingDistribution, RatingStatistics};
pub use summary::{
    AggregationSummary, LIMITED_DATA_COUNT, NEGATIVE_RATING_CEILING, QualityFlags, QueryArea,
    Recommendation, recommend, safety_score_from_mean, summarize_cohort, weigh_cohort,
    weighted_mean,
};
pub use weighting::{WeightedRecord, is_fresh, recency_factor, record_age, trust_factor};
