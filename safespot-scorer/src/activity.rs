//! Recent activity and submitter engagement reporting.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use safespot_core::{FeedbackRecord, SubmitterId};
use serde::{Deserialize, Serialize};

use crate::stats::ratio;

/// Whether `record` was submitted within `window` before `now`.
///
/// A window reaching past the earliest representable instant covers every
/// record.
pub(crate) fn within_window(
    record: &FeedbackRecord,
    now: DateTime<Utc>,
    window: TimeDelta,
) -> bool {
    now.checked_sub_signed(window)
        .is_none_or(|start| record.submitted_at >= start)
}

/// Records submitted in the last day, week and month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecentActivity {
    /// Submissions in the last 24 hours.
    pub last_24_hours: usize,
    /// Submissions in the last 7 days.
    pub last_7_days: usize,
    /// Submissions in the last 30 days.
    pub last_30_days: usize,
}

impl RecentActivity {
    /// Count submissions in each window ending at `now`.
    pub fn from_records<'a, I>(records: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a FeedbackRecord>,
    {
        records.into_iter().fold(Self::default(), |acc, record| Self {
            last_24_hours: acc.last_24_hours
                + usize::from(within_window(record, now, TimeDelta::hours(24))),
            last_7_days: acc.last_7_days
                + usize::from(within_window(record, now, TimeDelta::days(7))),
            last_30_days: acc.last_30_days
                + usize::from(within_window(record, now, TimeDelta::days(30))),
        })
    }
}

/// The submitter with the most records in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSubmitter {
    /// Submitter identity.
    pub submitter: SubmitterId,
    /// Records they contributed.
    pub feedback_count: usize,
}

/// How evenly submissions are spread across submitters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Engagement {
    /// Mean records per distinct submitter; `None` without records.
    pub average_feedback_per_user: Option<f64>,
    /// Most prolific submitter; ties go to the smallest id.
    pub most_active: Option<ActiveSubmitter>,
}

impl Engagement {
    /// Analyse the submitters of `records`.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a FeedbackRecord>,
    {
        let mut per_submitter: BTreeMap<&SubmitterId, usize> = BTreeMap::new();
        let mut total = 0_usize;
        for record in records {
            *per_submitter.entry(&record.submitter).or_default() += 1;
            total += 1;
        }
        if per_submitter.is_empty() {
            return Self::default();
        }
        let most_active = per_submitter
            .iter()
            .fold(None::<(&SubmitterId, usize)>, |best, (id, count)| match best {
                Some((_, best_count)) if best_count >= *count => best,
                _ => Some((id, *count)),
            })
            .map(|(id, count)| ActiveSubmitter {
                submitter: id.clone(),
                feedback_count: count,
            });
        Self {
            average_feedback_per_user: Some(ratio(total, per_submitter.len())),
            most_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use safespot_core::test_support::{RecordBuilder, reference_now};

    #[rstest]
    fn counts_each_window() {
        let records = vec![
            RecordBuilder::new(1, "a")
                .submitted_at(reference_now() - TimeDelta::hours(2))
                .build(),
            RecordBuilder::new(2, "b").days_old(3).build(),
            RecordBuilder::new(3, "c").days_old(20).build(),
            RecordBuilder::new(4, "d").days_old(90).build(),
        ];
        let activity = RecentActivity::from_records(&records, reference_now());
        assert_eq!(
            activity,
            RecentActivity {
                last_24_hours: 1,
                last_7_days: 2,
                last_30_days: 3,
            }
        );
    }

    #[rstest]
    fn window_past_the_earliest_instant_covers_every_record() {
        let record = RecordBuilder::new(1, "a").days_old(10_000).build();
        let window = TimeDelta::days(i64::from(u32::MAX));
        assert!(within_window(&record, reference_now(), window));
    }

    #[rstest]
    fn engagement_prefers_smallest_id_on_ties() {
        let records = vec![
            RecordBuilder::new(1, "zed").build(),
            RecordBuilder::new(2, "amy").build(),
            RecordBuilder::new(3, "zed").build(),
            RecordBuilder::new(4, "amy").build(),
            RecordBuilder::new(5, "bob").build(),
        ];
        let engagement = Engagement::from_records(&records);
        let most_active = engagement.most_active.expect("submitters present");
        assert_eq!(most_active.submitter.as_str(), "amy");
        assert_eq!(most_active.feedback_count, 2);
        let average = engagement.average_feedback_per_user.expect("average");
        assert!((average - 5.0 / 3.0).abs() < 1e-12);
    }

    #[rstest]
    fn empty_group_has_no_engagement() {
        let records: Vec<FeedbackRecord> = Vec::new();
        assert_eq!(Engagement::from_records(&records), Engagement::default());
    }
}
