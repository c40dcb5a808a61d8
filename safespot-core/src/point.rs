//! Validated WGS84 coordinates.

use geo::Coord;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A query or feedback location in WGS84 degrees.
///
/// Construction validates the range of both axes, so any `GeoPoint` in hand
/// is a legal input to the cluster resolver.
///
/// # Examples
/// ```
/// use safespot_core::GeoPoint;
///
/// # fn main() -> Result<(), safespot_core::GeoPointError> {
/// let point = GeoPoint::new(13.0827, 80.2707)?;
/// assert_eq!(point.latitude(), 13.0827);
/// assert!(GeoPoint::new(91.0, 0.0).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawGeoPoint", into = "RawGeoPoint"))]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

/// Errors returned by [`GeoPoint::new`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeoPointError {
    /// Latitude was non-finite or outside `-90.0..=90.0`.
    #[error("latitude {latitude} must be between -90 and 90 degrees")]
    InvalidLatitude {
        /// Rejected latitude.
        latitude: f64,
    },
    /// Longitude was non-finite or outside `-180.0..=180.0`.
    #[error("longitude {longitude} must be between -180 and 180 degrees")]
    InvalidLongitude {
        /// Rejected longitude.
        longitude: f64,
    },
}

impl GeoPoint {
    /// Validate and construct a point from latitude and longitude in degrees.
    ///
    /// # Errors
    /// Returns [`GeoPointError`] when either axis is out of range or not
    /// finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoPointError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoPointError::InvalidLatitude { latitude });
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoPointError::InvalidLongitude { longitude });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(self) -> f64 {
        self.longitude
    }

    /// Order points by latitude, then longitude.
    ///
    /// Both axes are finite by construction, so `total_cmp` agrees with the
    /// numeric order.
    #[must_use]
    pub fn cmp_lat_lon(&self, other: &Self) -> std::cmp::Ordering {
        self.latitude
            .total_cmp(&other.latitude)
            .then_with(|| self.longitude.total_cmp(&other.longitude))
    }
}

impl From<GeoPoint> for Coord<f64> {
    fn from(point: GeoPoint) -> Self {
        Self {
            x: point.longitude,
            y: point.latitude,
        }
    }
}

impl From<GeoPoint> for geo::Point<f64> {
    fn from(point: GeoPoint) -> Self {
        Self::from(Coord::from(point))
    }
}

#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = GeoPointError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

#[cfg(feature = "serde")]
impl From<GeoPoint> for RawGeoPoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
        }
    }
}
