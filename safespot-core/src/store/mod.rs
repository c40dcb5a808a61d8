//! Read-only access to approved feedback records.
//!
//! The [`FeedbackStore`] trait is the only way the engine reads feedback.
//! Implementations must return eligible (approved or auto-approved) records
//! only; ordering is not significant because cohorts re-sort their members.

use std::{error::Error as StdError, sync::Arc};

use thiserror::Error;

use crate::{FeedbackRecord, GeoPoint};

mod memory;
#[cfg(feature = "store-sqlite")]
mod sqlite;

pub use memory::MemoryFeedbackStore;
#[cfg(feature = "store-sqlite")]
pub use sqlite::{FEEDBACK_TABLE_SQL, SqliteFeedbackStore, SqliteFeedbackStoreError};

/// Failure reported by a record store or a trust oracle.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("feedback store unavailable: {reason}")]
    Unavailable {
        /// Human-readable cause.
        reason: String,
    },
    /// The backing implementation failed.
    #[error(transparent)]
    Backend(Box<dyn StdError + Send + Sync + 'static>),
}

/// Read-only source of eligible feedback records.
///
/// Implementations must be `Send + Sync` so concurrent scoring requests can
/// share one store without coordination.
///
/// # Examples
///
/// ```rust
/// use safespot_core::{
///     Cohort, FeedbackRecord, FeedbackStore, GeoPoint, StoreError,
/// };
///
/// struct EmptyStore;
///
/// impl FeedbackStore for EmptyStore {
///     fn fetch_eligible_records(
///         &self,
///         _near: GeoPoint,
///         _radius_m: f64,
///     ) -> Result<Vec<FeedbackRecord>, StoreError> {
///         Ok(Vec::new())
///     }
///
///     fn all_eligible_records(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
///         Ok(Vec::new())
///     }
/// }
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let point = GeoPoint::new(0.0, 0.0)?;
/// let records = EmptyStore.fetch_eligible_records(point, 100.0)?;
/// assert!(Cohort::resolve(point, 100.0, records)?.is_empty());
/// # Ok(())
/// # }
/// ```
pub trait FeedbackStore: Send + Sync {
    /// Return eligible records within `radius_m` metres of `near`.
    ///
    /// Implementations may over-fetch (for example a bounding-box query);
    /// the cohort resolver applies the exact distance predicate.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backing store fails.
    fn fetch_eligible_records(
        &self,
        near: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<FeedbackRecord>, StoreError>;

    /// Return every eligible record in the store.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the backing store fails.
    fn all_eligible_records(&self) -> Result<Vec<FeedbackRecord>, StoreError>;
}

impl<S: FeedbackStore + ?Sized> FeedbackStore for Arc<S> {
    fn fetch_eligible_records(
        &self,
        near: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<FeedbackRecord>, StoreError> {
        (**self).fetch_eligible_records(near, radius_m)
    }

    fn all_eligible_records(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        (**self).all_eligible_records()
    }
}
