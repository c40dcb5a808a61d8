//! Rank grid cells that still need feedback.
//!
//! Records are bucketed by rounding both coordinates to a fixed number of
//! decimal places (three places is roughly 100 m). Unlike cohorts, cells
//! partition the record pool, so each record belongs to exactly one cell.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use safespot_core::{EngineConfig, FeedbackRecord, GeoPoint, SubmitterId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    activity::RecentActivity,
    progress::Progress,
    stats::mean,
};

/// Integer grid coordinates: degrees scaled by `10^precision` and rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridKey {
    /// Scaled latitude.
    pub lat: i64,
    /// Scaled longitude.
    pub lon: i64,
}

impl GridKey {
    /// Cell containing `point` at `precision` decimal places.
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_possible_truncation,
        reason = "scaled degrees stay within i64 for precisions up to six places"
    )]
    #[must_use]
    pub fn of(point: GeoPoint, precision: u8) -> Self {
        let scale = 10_f64.powi(i32::from(precision));
        Self {
            lat: (point.latitude() * scale).round() as i64,
            lon: (point.longitude() * scale).round() as i64,
        }
    }
}

/// Group `records` into grid cells, keeping each cell's records in input
/// order.
#[must_use]
pub fn group_into_cells(
    records: &[FeedbackRecord],
    precision: u8,
) -> BTreeMap<GridKey, Vec<&FeedbackRecord>> {
    let mut cells: BTreeMap<GridKey, Vec<&FeedbackRecord>> = BTreeMap::new();
    for record in records {
        cells
            .entry(GridKey::of(record.location, precision))
            .or_default()
            .push(record);
    }
    cells
}

/// Distinct submitters among `records`.
pub(crate) fn unique_submitters(records: &[&FeedbackRecord]) -> usize {
    let mut ids: Vec<&SubmitterId> = records.iter().map(|record| &record.submitter).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.len()
}

/// Mean position of a cell's records.
fn cell_centre(records: &[&FeedbackRecord]) -> Option<GeoPoint> {
    let latitudes: Vec<f64> = records.iter().map(|r| r.location.latitude()).collect();
    let longitudes: Vec<f64> = records.iter().map(|r| r.location.longitude()).collect();
    let first = records.first()?.location;
    let centre = GeoPoint::new(mean(&latitudes)?, mean(&longitudes)?).unwrap_or(first);
    Some(centre)
}

/// Ordering applied to [`locations_needing_feedback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NeedOrder {
    /// Smallest `remaining_needed` first: locations closest to sufficiency.
    #[default]
    FewestRemaining,
    /// Largest `remaining_needed` first: locations furthest from sufficiency.
    MostRemaining,
}

impl NeedOrder {
    /// Stable kebab-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FewestRemaining => "fewest-remaining",
            Self::MostRemaining => "most-remaining",
        }
    }
}

impl fmt::Display for NeedOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`NeedOrder`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown ordering {value:?}; expected fewest-remaining or most-remaining")]
pub struct ParseNeedOrderError {
    /// The unrecognised input.
    pub value: String,
}

impl FromStr for NeedOrder {
    type Err = ParseNeedOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fewest-remaining" => Ok(Self::FewestRemaining),
            "most-remaining" => Ok(Self::MostRemaining),
            other => Err(ParseNeedOrderError {
                value: other.to_owned(),
            }),
        }
    }
}

/// A grid cell below the sufficiency threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationNeed {
    /// Cell identity.
    pub cell: GridKey,
    /// Mean position of the cell's records.
    pub point: GeoPoint,
    /// Threshold progress.
    pub progress: Progress,
    /// Eligible records in the cell.
    pub feedback_count: usize,
    /// Submissions in recent windows.
    pub recent_activity: RecentActivity,
    /// Place name from the most recent named record.
    pub sample_location_name: Option<String>,
}

fn sample_name(records: &[&FeedbackRecord]) -> Option<String> {
    records
        .iter()
        .filter(|record| record.location_name.is_some())
        .max_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| b.id.cmp(&a.id))
        })
        .and_then(|record| record.location_name.clone())
}

/// Cells whose unique submitter count is below the threshold, ordered by
/// `order` with ties on the point's latitude then longitude, truncated to
/// `limit`.
#[must_use]
pub fn locations_needing_feedback(
    records: &[FeedbackRecord],
    config: &EngineConfig,
    now: DateTime<Utc>,
    order: NeedOrder,
    limit: usize,
) -> Vec<LocationNeed> {
    let mut needs: Vec<LocationNeed> = group_into_cells(records, config.grid_precision)
        .into_iter()
        .filter_map(|(cell, members)| {
            let progress = Progress::from_count(
                unique_submitters(&members),
                config.min_feedback_threshold,
            );
            if progress.is_complete() {
                return None;
            }
            Some(LocationNeed {
                cell,
                point: cell_centre(&members)?,
                progress,
                feedback_count: members.len(),
                recent_activity: RecentActivity::from_records(members.iter().copied(), now),
                sample_location_name: sample_name(&members),
            })
        })
        .collect();

    needs.sort_by(|a, b| {
        let by_remaining = a.progress.remaining_needed.cmp(&b.progress.remaining_needed);
        let directed = match order {
            NeedOrder::FewestRemaining => by_remaining,
            NeedOrder::MostRemaining => by_remaining.reverse(),
        };
        directed.then_with(|| a.point.cmp_lat_lon(&b.point))
    });
    needs.truncate(limit);
    needs
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use safespot_core::test_support::{RecordBuilder, reference_now};

    fn at(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).expect("valid point")
    }

    #[fixture]
    fn config() -> EngineConfig {
        EngineConfig {
            min_feedback_threshold: 3,
            ..EngineConfig::default()
        }
    }

    /// Three cells: A with one submitter, B with two, C complete with three.
    #[fixture]
    fn records() -> Vec<FeedbackRecord> {
        vec![
            RecordBuilder::new(1, "a").at(at(13.0001, 80.0001)).build(),
            RecordBuilder::new(2, "a").at(at(13.0002, 80.0002)).build(),
            RecordBuilder::new(3, "a").at(at(13.1, 80.1)).named("Old name").days_old(10).build(),
            RecordBuilder::new(4, "b").at(at(13.1, 80.1)).named("Harbour").days_old(2).build(),
            RecordBuilder::new(5, "a").at(at(13.2, 80.2)).build(),
            RecordBuilder::new(6, "b").at(at(13.2, 80.2)).build(),
            RecordBuilder::new(7, "c").at(at(13.2, 80.2)).build(),
        ]
    }

    #[rstest]
    fn rounding_groups_nearby_records() {
        let a = GridKey::of(at(13.0001, 80.0004), 3);
        let b = GridKey::of(at(12.9996, 79.9999), 3);
        assert_eq!(a, b);
        assert_eq!(a, GridKey { lat: 13_000, lon: 80_000 });
    }

    #[rstest]
    fn complete_cells_are_omitted(config: EngineConfig, records: Vec<FeedbackRecord>) {
        let needs = locations_needing_feedback(
            &records,
            &config,
            reference_now(),
            NeedOrder::FewestRemaining,
            10,
        );
        assert_eq!(needs.len(), 2);
        assert!(needs.iter().all(|need| !need.progress.is_complete()));
    }

    #[rstest]
    #[case(NeedOrder::FewestRemaining, vec![1, 2])]
    #[case(NeedOrder::MostRemaining, vec![2, 1])]
    fn caller_chooses_the_direction(
        config: EngineConfig,
        records: Vec<FeedbackRecord>,
        #[case] order: NeedOrder,
        #[case] remaining: Vec<u64>,
    ) {
        let needs = locations_needing_feedback(&records, &config, reference_now(), order, 10);
        let got: Vec<u64> = needs.iter().map(|n| n.progress.remaining_needed).collect();
        assert_eq!(got, remaining);
    }

    #[rstest]
    fn ties_break_on_latitude(config: EngineConfig) {
        let records = vec![
            RecordBuilder::new(1, "a").at(at(13.5, 80.0)).build(),
            RecordBuilder::new(2, "a").at(at(13.4, 80.0)).build(),
        ];
        let needs = locations_needing_feedback(
            &records,
            &config,
            reference_now(),
            NeedOrder::FewestRemaining,
            10,
        );
        let latitudes: Vec<f64> = needs.iter().map(|n| n.point.latitude()).collect();
        assert_eq!(latitudes, vec![13.4, 13.5]);
    }

    #[rstest]
    fn limit_truncates(config: EngineConfig, records: Vec<FeedbackRecord>) {
        let needs = locations_needing_feedback(
            &records,
            &config,
            reference_now(),
            NeedOrder::FewestRemaining,
            1,
        );
        assert_eq!(needs.len(), 1);
    }

    #[rstest]
    fn cell_reports_centre_and_latest_name(config: EngineConfig, records: Vec<FeedbackRecord>) {
        let needs = locations_needing_feedback(
            &records,
            &config,
            reference_now(),
            NeedOrder::FewestRemaining,
            10,
        );
        let harbour = needs.first().expect("cell with two submitters");
        assert_eq!(harbour.sample_location_name.as_deref(), Some("Harbour"));
        assert_eq!(harbour.feedback_count, 2);

        let single = needs.get(1).expect("cell with one submitter");
        assert!((single.point.latitude() - 13.000_15).abs() < 1e-9);
        assert!((single.point.longitude() - 80.000_15).abs() < 1e-9);
    }

    #[rstest]
    #[case("fewest-remaining", NeedOrder::FewestRemaining)]
    #[case("most-remaining", NeedOrder::MostRemaining)]
    fn order_parses_kebab_case(#[case] raw: &str, #[case] expected: NeedOrder) {
        assert_eq!(raw.parse::<NeedOrder>(), Ok(expected));
    }

    #[rstest]
    fn order_rejects_unknown_labels() {
        assert!("sideways".parse::<NeedOrder>().is_err());
    }
}
