//! Submitter trust derived from approval history.

use std::{collections::HashMap, sync::Arc};

use crate::{FeedbackRecord, StoreError, SubmitterId};

/// Approved records a submitter needs before they count as trusted.
pub const DEFAULT_TRUSTED_HISTORY: u32 = 3;

/// Decide whether a submitter's feedback deserves the trust boost.
pub trait TrustOracle: Send + Sync {
    /// Report whether `submitter` is trusted.
    ///
    /// # Errors
    /// Returns [`StoreError`] when the history cannot be read.
    fn is_trusted(&self, submitter: &SubmitterId) -> Result<bool, StoreError>;
}

impl<T: TrustOracle + ?Sized> TrustOracle for Arc<T> {
    fn is_trusted(&self, submitter: &SubmitterId) -> Result<bool, StoreError> {
        (**self).is_trusted(submitter)
    }
}

/// Trust oracle counting eligible records per submitter.
///
/// # Examples
/// ```
/// use safespot_core::{ApprovalHistoryTrust, SubmitterId, TrustOracle};
///
/// let oracle = ApprovalHistoryTrust::from_records(std::iter::empty(), 3);
/// let alice = SubmitterId::new("alice").map_err(|e| e.to_string())?;
/// assert_eq!(oracle.is_trusted(&alice).ok(), Some(false));
/// # Ok::<(), String>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ApprovalHistoryTrust {
    approved: HashMap<SubmitterId, u32>,
    threshold: u32,
}

impl ApprovalHistoryTrust {
    /// Count eligible records per submitter; ineligible records are ignored.
    #[must_use]
    pub fn from_records<'a, I>(records: I, threshold: u32) -> Self
    where
        I: IntoIterator<Item = &'a FeedbackRecord>,
    {
        let mut approved: HashMap<SubmitterId, u32> = HashMap::new();
        for record in records.into_iter().filter(|r| r.is_eligible()) {
            let count = approved.entry(record.submitter.clone()).or_default();
            *count = count.saturating_add(1);
        }
        Self {
            approved,
            threshold,
        }
    }

    /// Replace the trust threshold while returning `self` for chaining.
    #[must_use]
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Number of eligible records held for `submitter`.
    #[must_use]
    pub fn approved_count(&self, submitter: &SubmitterId) -> u32 {
        self.approved.get(submitter).copied().unwrap_or(0)
    }
}

impl TrustOracle for ApprovalHistoryTrust {
    fn is_trusted(&self, submitter: &SubmitterId) -> Result<bool, StoreError> {
        Ok(self.approved_count(submitter) >= self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordBuilder;
    use rstest::rstest;

    #[rstest]
    #[case(2, false)]
    #[case(3, true)]
    #[case(5, true)]
    fn trust_requires_threshold_history(#[case] approved: u64, #[case] trusted: bool) {
        let records: Vec<_> = (0..approved)
            .map(|id| RecordBuilder::new(id, "alice").build())
            .collect();
        let oracle = ApprovalHistoryTrust::from_records(&records, DEFAULT_TRUSTED_HISTORY);
        let alice = SubmitterId::new("alice").expect("valid id");
        assert_eq!(oracle.is_trusted(&alice).ok(), Some(trusted));
    }

    #[rstest]
    fn pending_records_do_not_build_trust() {
        let records: Vec<_> = (0..5)
            .map(|id| RecordBuilder::new(id, "bob").pending().build())
            .collect();
        let oracle = ApprovalHistoryTrust::from_records(&records, DEFAULT_TRUSTED_HISTORY);
        let bob = SubmitterId::new("bob").expect("valid id");
        assert_eq!(oracle.approved_count(&bob), 0);
    }
}
