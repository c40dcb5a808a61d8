//! Builders and collaborator doubles shared by unit and behaviour tests.

use std::collections::HashSet;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use geo::{Destination, Haversine, Point};

use crate::{
    ApprovalState, BaselineError, BaselineScorer, FeedbackRecord, FeedbackStore, GeoPoint,
    Rating, StoreError, SubmitterId, TrustOracle,
};

/// Evaluation instant used by fixtures: 2026-06-01T12:00:00Z.
#[expect(
    clippy::expect_used,
    reason = "the literal instant is always representable"
)]
#[must_use]
pub fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0)
        .single()
        .expect("fixed reference instant")
}

/// Query point used by fixtures (Chennai, Marina Beach).
#[expect(
    clippy::expect_used,
    reason = "the literal coordinates are in range"
)]
#[must_use]
pub fn reference_point() -> GeoPoint {
    GeoPoint::new(13.0500, 80.2824).expect("reference point is valid")
}

/// A point `metres` due north of `origin` (south when negative), measured
/// on the same sphere as [`haversine_distance_m`](crate::haversine_distance_m).
#[expect(clippy::expect_used, reason = "test geometry stays near the reference point")]
#[must_use]
pub fn point_north_of(origin: GeoPoint, metres: f64) -> GeoPoint {
    let bearing = if metres.is_sign_negative() { 180.0 } else { 0.0 };
    let moved = Haversine.destination(Point::from(origin), bearing, metres.abs());
    GeoPoint::new(moved.y(), moved.x()).expect("offset stays within latitude range")
}

/// Fluent builder for [`FeedbackRecord`] fixtures.
///
/// Defaults: the reference point, rating 7, submitted one day before
/// [`reference_now`], approved.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    id: u64,
    submitter: String,
    location: GeoPoint,
    rating: u8,
    submitted_at: DateTime<Utc>,
    approval: ApprovalState,
    location_name: Option<String>,
}

impl RecordBuilder {
    /// Start a record with the given id and submitter.
    #[must_use]
    pub fn new(id: u64, submitter: &str) -> Self {
        Self {
            id,
            submitter: submitter.to_owned(),
            location: reference_point(),
            rating: 7,
            submitted_at: reference_now() - TimeDelta::days(1),
            approval: ApprovalState::Approved,
            location_name: None,
        }
    }

    /// Place the record.
    #[must_use]
    pub const fn at(mut self, location: GeoPoint) -> Self {
        self.location = location;
        self
    }

    /// Set the raw rating; validated in [`RecordBuilder::build`].
    #[must_use]
    pub const fn rating(mut self, rating: u8) -> Self {
        self.rating = rating;
        self
    }

    /// Submit the record `days` before [`reference_now`].
    #[must_use]
    pub fn days_old(mut self, days: i64) -> Self {
        self.submitted_at = reference_now() - TimeDelta::days(days);
        self
    }

    /// Set an explicit submission instant.
    #[must_use]
    pub const fn submitted_at(mut self, instant: DateTime<Utc>) -> Self {
        self.submitted_at = instant;
        self
    }

    /// Mark the record as awaiting review.
    #[must_use]
    pub const fn pending(mut self) -> Self {
        self.approval = ApprovalState::Pending;
        self
    }

    /// Set the approval state.
    #[must_use]
    pub const fn approval(mut self, approval: ApprovalState) -> Self {
        self.approval = approval;
        self
    }

    /// Attach a place name.
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.location_name = Some(name.to_owned());
        self
    }

    /// Build the record.
    ///
    /// # Panics
    /// Panics when the rating or submitter is invalid.
    #[expect(clippy::expect_used, reason = "fixtures fail fast on bad input")]
    #[must_use]
    pub fn build(self) -> FeedbackRecord {
        FeedbackRecord {
            id: self.id,
            submitter: SubmitterId::new(self.submitter).expect("fixture submitter"),
            location: self.location,
            rating: Rating::new(self.rating).expect("fixture rating"),
            submitted_at: self.submitted_at,
            approval: self.approval,
            location_name: self.location_name,
        }
    }
}

/// Build `count` fresh records from distinct submitters at `location`.
#[must_use]
pub fn distinct_submitters(count: u64, location: GeoPoint, rating: u8) -> Vec<FeedbackRecord> {
    (0..count)
        .map(|id| {
            RecordBuilder::new(id, &format!("user-{id}"))
                .at(location)
                .rating(rating)
                .build()
        })
        .collect()
}

/// Trust oracle trusting an explicit set of submitters.
#[derive(Debug, Clone, Default)]
pub struct FixedTrustOracle {
    trusted: HashSet<String>,
}

impl FixedTrustOracle {
    /// Trust the named submitters.
    #[must_use]
    pub fn trusting(ids: &[&str]) -> Self {
        Self {
            trusted: ids.iter().map(|id| (*id).to_owned()).collect(),
        }
    }
}

impl TrustOracle for FixedTrustOracle {
    fn is_trusted(&self, submitter: &SubmitterId) -> Result<bool, StoreError> {
        Ok(self.trusted.contains(submitter.as_str()))
    }
}

/// Store that always fails, for upstream error propagation tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStore;

impl FeedbackStore for UnavailableStore {
    fn fetch_eligible_records(
        &self,
        _near: GeoPoint,
        _radius_m: f64,
    ) -> Result<Vec<FeedbackRecord>, StoreError> {
        Err(StoreError::Unavailable {
            reason: "store offline".to_owned(),
        })
    }

    fn all_eligible_records(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        Err(StoreError::Unavailable {
            reason: "store offline".to_owned(),
        })
    }
}

impl TrustOracle for UnavailableStore {
    fn is_trusted(&self, _submitter: &SubmitterId) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable {
            reason: "store offline".to_owned(),
        })
    }
}

/// Baseline scorer that always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableBaseline;

impl BaselineScorer for UnavailableBaseline {
    fn baseline_score(&self, _point: GeoPoint) -> Result<f64, BaselineError> {
        Err(BaselineError::Unavailable {
            reason: "model offline".to_owned(),
        })
    }
}

/// Create a SQLite database at `path` holding `records` in the `feedback`
/// table.
///
/// # Errors
/// Propagates `rusqlite` failures.
#[cfg(feature = "store-sqlite")]
pub fn write_feedback_database(
    path: &std::path::Path,
    records: &[FeedbackRecord],
) -> rusqlite::Result<()> {
    let mut connection = rusqlite::Connection::open(path)?;
    connection.execute(crate::FEEDBACK_TABLE_SQL, [])?;
    let tx = connection.transaction()?;
    {
        let mut statement = tx.prepare(
            "INSERT INTO feedback (id, submitter_id, latitude, longitude, rating, created_at, \
             approval_status, location_name) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for record in records {
            statement.execute(rusqlite::params![
                record.id,
                record.submitter.as_str(),
                record.location.latitude(),
                record.location.longitude(),
                record.rating.get(),
                record.submitted_at.to_rfc3339(),
                record.approval.as_str(),
                record.location_name.as_deref(),
            ])?;
        }
    }
    tx.commit()
}
