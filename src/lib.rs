//! Facade crate for the Safespot feedback engine.
//!
//! This crate re-exports the core domain types, the aggregation and blending
//! engine, and the optional SQLite record store behind a feature flag.

#![forbid(unsafe_code)]

pub use safespot_core::{
    ApprovalHistoryTrust, ApprovalState, BaselineError, BaselineScorer, BlendWeights, Clock,
    ClusterError, Cohort, ConfigError, EngineConfig, FeedbackRecord, FeedbackStore, FixedBaseline,
    FixedClock, GeoPoint, GeoPointError, MemoryFeedbackStore, Rating, RatingError, RecencyPolicy,
    StoreError, SubmitterId, SubmitterIdError, SystemClock, TrustOracle, haversine_distance_m,
};

#[cfg(feature = "store-sqlite")]
pub use safespot_core::{SqliteFeedbackStore, SqliteFeedbackStoreError};

pub use safespot_scorer::{
    AggregationSummary, BlendedScore, EngineError, FeedbackAnalytics, FeedbackEngine,
    LocationNeed, NeedOrder, Progress, ProgressReport, ProgressState, Recommendation,
    ScoringMethod, Upstream, blend_scores, summarize_cohort,
};
