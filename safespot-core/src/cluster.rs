//! Geo-cluster resolution: group feedback records around a query point.
//!
//! Membership is a great-circle distance test against the query point only.
//! Two members may be further apart than the radius from each other; the
//! cohort is a disc around the query, not a transitive cluster.

use geo::{Coord, Distance, Haversine, Point, Rect};
use thiserror::Error;

use crate::{FeedbackRecord, GeoPoint, SubmitterId, config::is_positive};

/// Sphere radius in metres behind [`haversine_distance_m`].
pub const EARTH_RADIUS_M: f64 = Haversine.radius();

/// Slack applied to the inclusive radius test to absorb trigonometric
/// round-off; one micrometre.
pub const BOUNDARY_TOLERANCE_M: f64 = 1e-6;

/// Extra degrees added to search rectangles, roughly one centimetre.
const RECT_MARGIN_DEG: f64 = 1e-7;

/// Errors raised while resolving a cohort.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ClusterError {
    /// The radius was not a positive finite number of metres.
    #[error("cohort radius {radius} must be a positive number of metres")]
    InvalidRadius {
        /// Rejected radius.
        radius: f64,
    },
}

/// Great-circle distance between two points in metres.
///
/// # Examples
/// ```
/// use safespot_core::{GeoPoint, haversine_distance_m};
///
/// # fn main() -> Result<(), safespot_core::GeoPointError> {
/// let a = GeoPoint::new(0.0, 0.0)?;
/// let b = GeoPoint::new(0.0, 1.0)?;
/// let metres = haversine_distance_m(a, b);
/// assert!((metres - 111_195.1).abs() < 1.0);
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn haversine_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b))
}

/// Whether `candidate` lies within `radius_m` of `centre`, boundary included.
#[expect(
    clippy::float_arithmetic,
    reason = "the inclusive boundary carries a round-off tolerance"
)]
#[must_use]
pub fn within_radius(centre: GeoPoint, candidate: GeoPoint, radius_m: f64) -> bool {
    haversine_distance_m(centre, candidate) <= radius_m + BOUNDARY_TOLERANCE_M
}

/// Degree rectangle (`x = longitude`, `y = latitude`) enclosing every point
/// within `radius_m` of `centre`.
///
/// The rectangle is a conservative prefilter for spatial indices; callers
/// still apply [`within_radius`]. Circles touching a pole or the antimeridian
/// widen to the full longitude range rather than splitting.
#[expect(
    clippy::float_arithmetic,
    reason = "bounding box derivation converts metres to degrees"
)]
#[must_use]
pub fn search_rect(centre: GeoPoint, radius_m: f64) -> Rect<f64> {
    let angular = radius_m / EARTH_RADIUS_M;
    let lat_delta = angular.to_degrees() + RECT_MARGIN_DEG;
    let min_lat = centre.latitude() - lat_delta;
    let max_lat = centre.latitude() + lat_delta;

    let cos_lat = centre.latitude().to_radians().cos();
    let touches_pole = min_lat <= -90.0 || max_lat >= 90.0;
    let ratio = angular.sin() / cos_lat;
    let (min_lon, max_lon) = if touches_pole || !ratio.is_finite() || ratio >= 1.0 {
        (-180.0, 180.0)
    } else {
        let lon_delta = ratio.asin().to_degrees() + RECT_MARGIN_DEG;
        let west = centre.longitude() - lon_delta;
        let east = centre.longitude() + lon_delta;
        if west < -180.0 || east > 180.0 {
            (-180.0, 180.0)
        } else {
            (west, east)
        }
    };

    Rect::new(
        Coord {
            x: min_lon,
            y: min_lat.max(-90.0),
        },
        Coord {
            x: max_lon,
            y: max_lat.min(90.0),
        },
    )
}

/// Eligible feedback records within a radius of a query point.
///
/// Members are ordered by record id so every reduction over a cohort sees
/// the same sequence regardless of store ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Cohort {
    query: GeoPoint,
    radius_m: f64,
    members: Vec<FeedbackRecord>,
}

impl Cohort {
    /// Select the eligible records from `pool` within `radius_m` of `query`.
    ///
    /// Ineligible records are discarded even if the pool contains them.
    ///
    /// # Errors
    /// Returns [`ClusterError::InvalidRadius`] when `radius_m` is not a
    /// positive finite number.
    ///
    /// # Examples
    /// ```
    /// use safespot_core::{Cohort, GeoPoint};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let query = GeoPoint::new(13.0, 80.0)?;
    /// let cohort = Cohort::resolve(query, 100.0, Vec::new())?;
    /// assert!(cohort.is_empty());
    /// # Ok(())
    /// # }
    /// ```
    pub fn resolve<I>(query: GeoPoint, radius_m: f64, pool: I) -> Result<Self, ClusterError>
    where
        I: IntoIterator<Item = FeedbackRecord>,
    {
        if !is_positive(radius_m) {
            return Err(ClusterError::InvalidRadius { radius: radius_m });
        }
        let mut members: Vec<FeedbackRecord> = pool
            .into_iter()
            .filter(FeedbackRecord::is_eligible)
            .filter(|record| within_radius(query, record.location, radius_m))
            .collect();
        members.sort_by_key(|record| record.id);
        Ok(Self {
            query,
            radius_m,
            members,
        })
    }

    /// The query point (also used as the cohort's nominal centre).
    #[must_use]
    pub const fn query(&self) -> GeoPoint {
        self.query
    }

    /// Radius in metres.
    #[must_use]
    pub const fn radius_m(&self) -> f64 {
        self.radius_m
    }

    /// Cohort members ordered by id.
    #[must_use]
    pub fn members(&self) -> &[FeedbackRecord] {
        &self.members
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the cohort has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Distinct submitters among the members.
    #[must_use]
    pub fn unique_submitter_count(&self) -> usize {
        let mut ids: Vec<&SubmitterId> = self.members.iter().map(|r| &r.submitter).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}
