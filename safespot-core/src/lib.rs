//! Core domain types for the Safespot feedback engine.
//!
//! Feedback records, query points and configuration validate at
//! construction so the aggregation code never sees malformed input.
//! Collaborators (record stores, trust oracles, baseline scorers and clocks)
//! are traits; the engine in `safespot-scorer` is generic over them.

#![forbid(unsafe_code)]

pub mod baseline;
pub mod clock;
pub mod cluster;
pub mod config;
pub mod feedback;
pub mod point;
pub mod store;
pub mod trust;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use baseline::{BaselineError, BaselineScorer, FixedBaseline};
pub use clock::{Clock, FixedClock, SystemClock};
pub use cluster::{ClusterError, Cohort, haversine_distance_m, search_rect, within_radius};
pub use config::{BlendWeights, ConfigError, EngineConfig, RecencyPolicy};
pub use feedback::{
    ApprovalState, FeedbackRecord, MAX_RATING, MIN_RATING, ParseApprovalStateError, Rating,
    RatingError, SubmitterId, SubmitterIdError,
};
pub use point::{GeoPoint, GeoPointError};
pub use store::{FeedbackStore, MemoryFeedbackStore, StoreError};
#[cfg(feature = "store-sqlite")]
pub use store::{FEEDBACK_TABLE_SQL, SqliteFeedbackStore, SqliteFeedbackStoreError};
pub use trust::{ApprovalHistoryTrust, TrustOracle};
