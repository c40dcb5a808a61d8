//! Unweighted descriptive statistics over ratings.

use std::collections::BTreeMap;

use safespot_core::{MAX_RATING, MIN_RATING, Rating};
use serde::{Deserialize, Serialize};

/// Convert a record count to `f64`.
#[expect(
    clippy::cast_precision_loss,
    reason = "record counts stay far below 2^52"
)]
pub(crate) const fn count_as_f64(count: usize) -> f64 {
    count as f64
}

/// `part / whole`, or `0.0` for an empty whole.
#[expect(clippy::float_arithmetic, reason = "ratios divide two counts")]
pub(crate) const fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    count_as_f64(part) / count_as_f64(whole)
}

/// Arithmetic mean, `None` for an empty slice.
#[expect(clippy::float_arithmetic, reason = "the mean divides a sum")]
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / count_as_f64(values.len()))
}

/// Population standard deviation, `None` for an empty slice.
#[expect(
    clippy::float_arithmetic,
    reason = "variance sums squared deviations"
)]
pub(crate) fn population_std_dev(values: &[f64]) -> Option<f64> {
    let centre = mean(values)?;
    let variance = values
        .iter()
        .map(|value| (value - centre).powi(2))
        .sum::<f64>()
        / count_as_f64(values.len());
    Some(variance.sqrt())
}

/// Median of the values, `None` for an empty slice.
#[expect(
    clippy::float_arithmetic,
    reason = "an even-sized median averages the middle pair"
)]
pub(crate) fn median(values: &[f64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let len = sorted.len();
    let upper_index = len.checked_div(2)?;
    let upper = *sorted.get(upper_index)?;
    if len.is_multiple_of(2) {
        let lower = *sorted.get(upper_index.checked_sub(1)?)?;
        Some((lower + upper) / 2.0)
    } else {
        Some(upper)
    }
}

/// Ratings as floats, preserving order.
pub(crate) fn ratings_as_f64(ratings: &[Rating]) -> Vec<f64> {
    ratings.iter().map(|rating| rating.as_f64()).collect()
}

/// Count of records per rating value; every value in `1..=10` is present.
///
/// # Examples
/// ```
/// use safespot_core::Rating;
/// use safespot_scorer::RatingDistribution;
///
/// # fn main() -> Result<(), safespot_core::RatingError> {
/// let distribution = RatingDistribution::from_ratings(&[Rating::new(8)?, Rating::new(8)?]);
/// assert_eq!(distribution.count(8), 2);
/// assert_eq!(distribution.count(1), 0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingDistribution(BTreeMap<u8, usize>);

impl RatingDistribution {
    /// Count every rating.
    #[must_use]
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        let mut counts: BTreeMap<u8, usize> =
            (MIN_RATING..=MAX_RATING).map(|value| (value, 0)).collect();
        for rating in ratings {
            let slot = counts.entry(rating.get()).or_default();
            *slot = slot.saturating_add(1);
        }
        Self(counts)
    }

    /// Records carrying `rating`.
    #[must_use]
    pub fn count(&self, rating: u8) -> usize {
        self.0.get(&rating).copied().unwrap_or(0)
    }

    /// Total number of counted records.
    #[must_use]
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// Iterate `(rating, count)` pairs in rating order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        self.0.iter().map(|(rating, count)| (*rating, *count))
    }
}

impl Default for RatingDistribution {
    fn default() -> Self {
        Self::from_ratings(&[])
    }
}

/// Unweighted statistics reported alongside the weighted mean.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingStatistics {
    /// Plain mean of every rating.
    pub average_rating: Option<f64>,
    /// Median rating.
    pub median_rating: Option<f64>,
    /// Population standard deviation.
    pub rating_std_dev: Option<f64>,
    /// Lowest rating.
    pub min_rating: Option<u8>,
    /// Highest rating.
    pub max_rating: Option<u8>,
}

impl RatingStatistics {
    /// Describe `ratings`; every field is `None` for an empty slice.
    #[must_use]
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        let values = ratings_as_f64(ratings);
        Self {
            average_rating: mean(&values),
            median_rating: median(&values),
            rating_std_dev: population_std_dev(&values),
            min_rating: ratings.iter().map(|r| r.get()).min(),
            max_rating: ratings.iter().map(|r| r.get()).max(),
        }
    }
}
