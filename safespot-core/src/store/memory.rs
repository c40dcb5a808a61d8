//! In-memory record store backed by an R\*-tree.

use std::fmt;

use rstar::{AABB, RTree, RTreeObject};

use crate::{
    ApprovalHistoryTrust, FeedbackRecord, GeoPoint, StoreError, SubmitterId, TrustOracle,
    cluster::{search_rect, within_radius},
    trust::DEFAULT_TRUSTED_HISTORY,
};

use super::FeedbackStore;

#[derive(Debug, Clone)]
struct IndexedRecord(FeedbackRecord);

impl RTreeObject for IndexedRecord {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let location = self.0.location;
        AABB::from_point([location.longitude(), location.latitude()])
    }
}

/// Snapshot of eligible records held in memory.
///
/// Ineligible records are dropped at construction. Radius queries use the
/// R\*-tree for a bounding-box prefilter and then the haversine predicate.
///
/// # Examples
/// ```
/// use safespot_core::{FeedbackStore, GeoPoint, MemoryFeedbackStore};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryFeedbackStore::with_records(Vec::new());
/// let near = GeoPoint::new(13.0, 80.0)?;
/// assert!(store.fetch_eligible_records(near, 100.0)?.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MemoryFeedbackStore {
    index: RTree<IndexedRecord>,
    trust: ApprovalHistoryTrust,
}

impl fmt::Debug for MemoryFeedbackStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryFeedbackStore")
            .field("entries", &self.index.size())
            .finish_non_exhaustive()
    }
}

impl Default for MemoryFeedbackStore {
    fn default() -> Self {
        Self::with_records(Vec::new())
    }
}

impl MemoryFeedbackStore {
    /// Build a store from a record snapshot.
    #[must_use]
    pub fn with_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = FeedbackRecord>,
    {
        let eligible: Vec<FeedbackRecord> = records
            .into_iter()
            .filter(FeedbackRecord::is_eligible)
            .collect();
        let trust = ApprovalHistoryTrust::from_records(&eligible, DEFAULT_TRUSTED_HISTORY);
        let index = RTree::bulk_load(eligible.into_iter().map(IndexedRecord).collect());
        Self { index, trust }
    }

    /// Replace the trust threshold while returning `self` for chaining.
    #[must_use]
    pub fn with_trust_threshold(mut self, threshold: u32) -> Self {
        self.trust = self.trust.with_threshold(threshold);
        self
    }

    /// Number of eligible records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.size()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.size() == 0
    }
}

impl FeedbackStore for MemoryFeedbackStore {
    fn fetch_eligible_records(
        &self,
        near: GeoPoint,
        radius_m: f64,
    ) -> Result<Vec<FeedbackRecord>, StoreError> {
        let rect = search_rect(near, radius_m);
        let envelope =
            AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
        let mut records: Vec<FeedbackRecord> = self
            .index
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.0.clone())
            .filter(|record| within_radius(near, record.location, radius_m))
            .collect();
        records.sort_unstable_by_key(|record| record.id);
        Ok(records)
    }

    fn all_eligible_records(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        let mut records: Vec<FeedbackRecord> =
            self.index.iter().map(|entry| entry.0.clone()).collect();
        records.sort_unstable_by_key(|record| record.id);
        Ok(records)
    }
}

impl TrustOracle for MemoryFeedbackStore {
    fn is_trusted(&self, submitter: &SubmitterId) -> Result<bool, StoreError> {
        self.trust.is_trusted(submitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordBuilder, point_north_of, reference_point};
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> MemoryFeedbackStore {
        let origin = reference_point();
        MemoryFeedbackStore::with_records(vec![
            RecordBuilder::new(3, "alice").at(origin).build(),
            RecordBuilder::new(1, "bob").at(point_north_of(origin, 80.0)).build(),
            RecordBuilder::new(2, "carol").at(point_north_of(origin, 400.0)).build(),
            RecordBuilder::new(4, "dave").at(origin).pending().build(),
        ])
    }

    #[rstest]
    fn drops_ineligible_records(store: MemoryFeedbackStore) {
        assert_eq!(store.len(), 3);
    }

    #[rstest]
    fn radius_query_applies_haversine_and_sorts(store: MemoryFeedbackStore) {
        let found = store
            .fetch_eligible_records(reference_point(), 100.0)
            .expect("memory store is infallible");
        let ids: Vec<u64> = found.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[rstest]
    fn all_records_are_sorted(store: MemoryFeedbackStore) {
        let ids: Vec<u64> = store
            .all_eligible_records()
            .expect("memory store is infallible")
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[rstest]
    fn trust_counts_stored_history() {
        let records = (0..3).map(|id| RecordBuilder::new(id, "erin").build());
        let store = MemoryFeedbackStore::with_records(records);
        let erin = SubmitterId::new("erin").expect("valid id");
        assert_eq!(store.is_trusted(&erin).ok(), Some(true));
        let strict = store.with_trust_threshold(4);
        assert_eq!(strict.is_trusted(&erin).ok(), Some(false));
    }
}
