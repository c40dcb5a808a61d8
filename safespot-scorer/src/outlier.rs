//! Statistical outlier detection within a cohort.

use safespot_core::Rating;

use crate::stats::{mean, population_std_dev, ratings_as_f64};

/// Smallest cohort in which outliers are judged.
pub const MIN_OUTLIER_SAMPLE: usize = 3;

/// Flag ratings further than `sigma` population standard deviations from
/// the mean.
///
/// Returns one flag per rating, in input order. Nothing is flagged when fewer
/// than [`MIN_OUTLIER_SAMPLE`] ratings are present or every rating is equal.
///
/// # Examples
/// ```
/// use safespot_core::Rating;
/// use safespot_scorer::flag_outliers;
///
/// # fn main() -> Result<(), safespot_core::RatingError> {
/// let mut ratings = vec![Rating::new(8)?; 10];
/// ratings.push(Rating::new(1)?);
/// let flags = flag_outliers(&ratings, 2.0);
/// assert_eq!(flags.iter().filter(|flag| **flag).count(), 1);
/// assert_eq!(flags.last(), Some(&true));
/// # Ok(())
/// # }
/// ```
#[expect(
    clippy::float_arithmetic,
    reason = "deviation tests compare against a multiple of sigma"
)]
#[must_use]
pub fn flag_outliers(ratings: &[Rating], sigma: f64) -> Vec<bool> {
    let values = ratings_as_f64(ratings);
    let spread = if values.len() < MIN_OUTLIER_SAMPLE {
        None
    } else {
        mean(&values).zip(population_std_dev(&values))
    };
    match spread {
        Some((centre, std_dev)) if std_dev > 0.0 => {
            let limit = sigma * std_dev;
            values
                .iter()
                .map(|value| (value - centre).abs() > limit)
                .collect()
        }
        _ => vec![false; values.len()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ratings(values: &[u8]) -> Vec<Rating> {
        values
            .iter()
            .map(|value| Rating::new(*value).expect("valid rating"))
            .collect()
    }

    #[rstest]
    fn flags_lone_low_rating_among_eights() {
        let mut values = vec![8; 10];
        values.push(1);
        let flags = flag_outliers(&ratings(&values), 2.0);
        let flagged: Vec<usize> = flags
            .iter()
            .enumerate()
            .filter_map(|(index, flag)| flag.then_some(index))
            .collect();
        assert_eq!(flagged, vec![10]);
    }

    #[rstest]
    #[case(&[])]
    #[case(&[1, 10])]
    #[case(&[6, 6, 6, 6])]
    fn flags_nothing_without_enough_spread(#[case] values: &[u8]) {
        let flags = flag_outliers(&ratings(values), 2.0);
        assert_eq!(flags.len(), values.len());
        assert!(flags.iter().all(|flag| !flag));
    }

    #[rstest]
    fn wide_sigma_flags_nothing() {
        let mut values = vec![8; 10];
        values.push(1);
        let flags = flag_outliers(&ratings(&values), 5.0);
        assert!(flags.iter().all(|flag| !flag));
    }
}
