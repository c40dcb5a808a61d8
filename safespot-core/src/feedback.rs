//! Feedback records as produced by the submission pipeline.
//!
//! Records are immutable once built. The aggregation core only reads them;
//! validation of the individual fields happens here, at the boundary, so the
//! statistics code never sees an out-of-range rating.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::GeoPoint;

/// Lowest rating a submitter can give.
pub const MIN_RATING: u8 = 1;
/// Highest rating a submitter can give.
pub const MAX_RATING: u8 = 10;

/// A safety rating in `1..=10`.
///
/// # Examples
/// ```
/// use safespot_core::Rating;
///
/// assert_eq!(Rating::new(7).map(Rating::get), Ok(7));
/// assert!(Rating::new(0).is_err());
/// assert!(Rating::new(11).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct Rating(u8);

/// Errors returned by [`Rating::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RatingError {
    /// The value fell outside `1..=10`.
    #[error("rating {value} must be between {MIN_RATING} and {MAX_RATING}")]
    OutOfRange {
        /// Rejected raw value.
        value: i64,
    },
}

impl Rating {
    /// Validate and wrap a raw rating.
    ///
    /// # Errors
    /// Returns [`RatingError::OutOfRange`] outside `1..=10`.
    pub fn new(value: u8) -> Result<Self, RatingError> {
        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(RatingError::OutOfRange {
                value: i64::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Validate a rating read from a wider integer column.
    ///
    /// # Errors
    /// Returns [`RatingError::OutOfRange`] when the value does not fit `1..=10`.
    pub fn from_i64(value: i64) -> Result<Self, RatingError> {
        u8::try_from(value)
            .map_err(|_| RatingError::OutOfRange { value })
            .and_then(Self::new)
    }

    /// The raw rating value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// The rating as a float for statistics.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// Opaque identity of the person who submitted feedback.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct SubmitterId(String);

/// Errors returned by [`SubmitterId::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitterIdError {
    /// The identifier was empty or whitespace.
    #[error("submitter id must not be blank")]
    Blank,
}

impl SubmitterId {
    /// Wrap a non-blank identifier.
    ///
    /// # Errors
    /// Returns [`SubmitterIdError::Blank`] for empty or whitespace input.
    pub fn new(id: impl Into<String>) -> Result<Self, SubmitterIdError> {
        let raw = id.into();
        if raw.trim().is_empty() {
            return Err(SubmitterIdError::Blank);
        }
        Ok(Self(raw))
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SubmitterId {
    type Error = SubmitterIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SubmitterId> for String {
    fn from(id: SubmitterId) -> Self {
        id.0
    }
}

/// Moderation outcome of a feedback record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ApprovalState {
    /// Approved by a moderator.
    Approved,
    /// Approved by the submission pipeline's automatic rules.
    AutoApproved,
    /// Awaiting manual review.
    Pending,
    /// Rejected during review.
    Rejected,
}

/// Error returned when parsing an unknown approval state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown approval state {value:?}")]
pub struct ParseApprovalStateError {
    /// The unrecognised input.
    pub value: String,
}

impl ApprovalState {
    /// Whether records in this state may join a cohort.
    #[must_use]
    pub const fn is_eligible(self) -> bool {
        matches!(self, Self::Approved | Self::AutoApproved)
    }

    /// Stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::AutoApproved => "auto_approved",
            Self::Pending => "pending",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for ApprovalState {
    type Err = ParseApprovalStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(Self::Approved),
            "auto_approved" => Ok(Self::AutoApproved),
            "pending" => Ok(Self::Pending),
            "rejected" => Ok(Self::Rejected),
            other => Err(ParseApprovalStateError {
                value: other.to_owned(),
            }),
        }
    }
}

/// One submitter's rating for a point.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use safespot_core::{ApprovalState, FeedbackRecord, GeoPoint, Rating, SubmitterId};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let record = FeedbackRecord::new(
///     1,
///     SubmitterId::new("alice")?,
///     GeoPoint::new(13.05, 80.28)?,
///     Rating::new(8)?,
///     Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).single().ok_or("bad date")?,
///     ApprovalState::AutoApproved,
/// );
/// assert!(record.is_eligible());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FeedbackRecord {
    /// Record identifier assigned by the store.
    pub id: u64,
    /// Who submitted the rating.
    pub submitter: SubmitterId,
    /// Where the rating applies.
    pub location: GeoPoint,
    /// The rating itself.
    pub rating: Rating,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
    /// Moderation state.
    pub approval: ApprovalState,
    /// Free-form place name supplied with the feedback.
    #[cfg_attr(feature = "serde", serde(default))]
    pub location_name: Option<String>,
}

impl FeedbackRecord {
    /// Construct a record without a place name.
    #[must_use]
    pub const fn new(
        id: u64,
        submitter: SubmitterId,
        location: GeoPoint,
        rating: Rating,
        submitted_at: DateTime<Utc>,
        approval: ApprovalState,
    ) -> Self {
        Self {
            id,
            submitter,
            location,
            rating,
            submitted_at,
            approval,
            location_name: None,
        }
    }

    /// Attach a place name while returning `self` for chaining.
    #[must_use]
    pub fn with_location_name(mut self, name: impl Into<String>) -> Self {
        self.location_name = Some(name.into());
        self
    }

    /// Whether the record may join a cohort.
    #[must_use]
    pub const fn is_eligible(&self) -> bool {
        self.approval.is_eligible()
    }
}
