//! Request-time engine wiring the aggregation to its collaborators.
//!
//! [`FeedbackEngine`] owns a record store, a trust oracle, a baseline scorer
//! and a clock. Each query reads a fresh snapshot from the store and computes
//! its result from scratch; the engine keeps no state between calls, so one
//! instance can serve concurrent requests through a shared reference.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use safespot_core::{
    BaselineScorer, Clock, Cohort, EngineConfig, FeedbackRecord, FeedbackStore, GeoPoint,
    SubmitterId, TrustOracle,
};

use crate::{
    activity::{Engagement, RecentActivity},
    analytics::{FeedbackAnalytics, analyze},
    blend::{BlendedScore, blend_scores},
    error::EngineError,
    needs::{LocationNeed, NeedOrder, locations_needing_feedback},
    progress::{Progress, ProgressReport},
    summary::{AggregationSummary, QueryArea, summarize_cohort},
};

/// Feedback aggregation and blended scoring over external collaborators.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use safespot_core::{FixedBaseline, FixedClock, GeoPoint, MemoryFeedbackStore};
/// use safespot_scorer::{FeedbackEngine, ScoringMethod};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryFeedbackStore::default();
/// let trust = store.clone();
/// let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().ok_or("date")?);
/// let engine = FeedbackEngine::new(store, trust, FixedBaseline(6.5), clock, Default::default())?;
///
/// let score = engine.score(GeoPoint::new(13.05, 80.28)?)?;
/// assert_eq!(score.scoring_method, ScoringMethod::AiOnly);
/// assert_eq!(score.value, 6.5);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FeedbackEngine<S, T, B, C> {
    store: S,
    trust: T,
    baseline: B,
    clock: C,
    config: EngineConfig,
}

impl<S, T, B, C> FeedbackEngine<S, T, B, C>
where
    S: FeedbackStore,
    T: TrustOracle,
    B: BaselineScorer,
    C: Clock,
{
    /// Build an engine after validating `config`.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidConfig`] when `config` fails validation.
    pub fn new(
        store: S,
        trust: T,
        baseline: B,
        clock: C,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            store,
            trust,
            baseline,
            clock,
            config: config.validate()?,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Summarise feedback within `radius_m` metres of `point`.
    ///
    /// `None` uses the configured location radius.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidRadius`] for a non-positive radius and
    /// [`EngineError::UpstreamUnavailable`] when the store or trust oracle
    /// fails.
    pub fn summarize(
        &self,
        point: GeoPoint,
        radius_m: Option<f64>,
    ) -> Result<AggregationSummary, EngineError> {
        let now = self.clock.now();
        let cohort = self.cohort(point, radius_m)?;
        let trusted = self.trusted_submitters(cohort.members())?;
        let summary = summarize_cohort(&cohort, &trusted, &self.config, now);
        debug!(
            "summarised {} records from {} submitters near ({}, {}): sufficient={}",
            summary.feedback_count,
            summary.unique_user_count,
            point.latitude(),
            point.longitude(),
            summary.has_sufficient_feedback,
        );
        Ok(summary)
    }

    /// Report threshold progress within `radius_m` metres of `point`.
    ///
    /// Progress needs no trust lookups, so only the store is consulted.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidRadius`] for a non-positive radius and
    /// [`EngineError::UpstreamUnavailable`] when the store fails.
    pub fn progress(
        &self,
        point: GeoPoint,
        radius_m: Option<f64>,
    ) -> Result<ProgressReport, EngineError> {
        let now = self.clock.now();
        let cohort = self.cohort(point, radius_m)?;
        let progress = Progress::from_count(
            cohort.unique_submitter_count(),
            self.config.min_feedback_threshold,
        );
        debug!(
            "progress near ({}, {}): {} with {} remaining",
            point.latitude(),
            point.longitude(),
            progress.state,
            progress.remaining_needed,
        );
        Ok(ProgressReport {
            query: QueryArea::of(&cohort),
            progress,
            feedback_count: cohort.len(),
            recent_activity: RecentActivity::from_records(cohort.members(), now),
            engagement: Engagement::from_records(cohort.members()),
            evaluated_at: now,
        })
    }

    /// Blend the AI baseline for `point` with feedback inside the configured
    /// radius.
    ///
    /// # Errors
    /// Returns [`EngineError::UpstreamUnavailable`] when any collaborator
    /// fails and [`EngineError::InvalidBaseline`] when the baseline is not
    /// finite.
    pub fn score(&self, point: GeoPoint) -> Result<BlendedScore, EngineError> {
        let summary = self.summarize(point, None)?;
        let ai_score = self.baseline.baseline_score(point).map_err(|err| {
            warn!("baseline scorer failed: {err}");
            EngineError::baseline(err)
        })?;
        if !ai_score.is_finite() {
            return Err(EngineError::InvalidBaseline { score: ai_score });
        }
        let score = blend_scores(ai_score, summary, self.config.blend);
        debug!(
            "scored ({}, {}) as {:.2} via {:?}",
            point.latitude(),
            point.longitude(),
            score.value,
            score.scoring_method,
        );
        Ok(score)
    }

    /// Grid cells still below the threshold, ordered by `order` and
    /// truncated to `limit`.
    ///
    /// # Errors
    /// Returns [`EngineError::UpstreamUnavailable`] when the store fails.
    pub fn locations_needing_feedback(
        &self,
        limit: usize,
        order: NeedOrder,
    ) -> Result<Vec<LocationNeed>, EngineError> {
        let now = self.clock.now();
        let records = self.all_records()?;
        let needs = locations_needing_feedback(&records, &self.config, now, order, limit);
        debug!("{} locations need feedback (order {order}, limit {limit})", needs.len());
        Ok(needs)
    }

    /// System-wide analytics over every eligible record.
    ///
    /// # Errors
    /// Returns [`EngineError::UpstreamUnavailable`] when the store or trust
    /// oracle fails.
    pub fn analytics(&self) -> Result<FeedbackAnalytics, EngineError> {
        let now: DateTime<Utc> = self.clock.now();
        let records = self.all_records()?;
        let trusted = self.trusted_submitters(&records)?;
        Ok(analyze(&records, &trusted, &self.config, now))
    }

    fn cohort(&self, point: GeoPoint, radius_m: Option<f64>) -> Result<Cohort, EngineError> {
        let radius = radius_m.unwrap_or(self.config.location_radius_meters);
        if !(radius.is_finite() && radius > 0.0) {
            return Err(EngineError::InvalidRadius { radius });
        }
        let pool = self
            .store
            .fetch_eligible_records(point, radius)
            .map_err(|err| {
                warn!("record store failed: {err}");
                EngineError::store(err)
            })?;
        Cohort::resolve(point, radius, pool).map_err(|_| EngineError::InvalidRadius { radius })
    }

    fn all_records(&self) -> Result<Vec<FeedbackRecord>, EngineError> {
        self.store.all_eligible_records().map_err(|err| {
            warn!("record store failed: {err}");
            EngineError::store(err)
        })
    }

    /// Ask the oracle once per distinct submitter.
    fn trusted_submitters(
        &self,
        records: &[FeedbackRecord],
    ) -> Result<BTreeSet<SubmitterId>, EngineError> {
        let submitters: BTreeSet<&SubmitterId> =
            records.iter().map(|record| &record.submitter).collect();
        let mut trusted = BTreeSet::new();
        for submitter in submitters {
            let is_trusted = self.trust.is_trusted(submitter).map_err(|err| {
                warn!("trust oracle failed for {submitter}: {err}");
                EngineError::trust(err)
            })?;
            if is_trusted {
                trusted.insert(submitter.clone());
            }
        }
        Ok(trusted)
    }
}
