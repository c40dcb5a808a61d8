//! Blend the AI baseline with crowd feedback.

use safespot_core::{BlendWeights, MAX_RATING, MIN_RATING};
use serde::{Deserialize, Serialize};

use crate::summary::AggregationSummary;

/// How a [`BlendedScore`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMethod {
    /// The AI baseline alone; feedback was insufficient.
    AiOnly,
    /// Fixed-weight blend of the AI baseline and the feedback score.
    BlendedAiUserFeedback,
}

/// Final safety score for a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendedScore {
    /// Score on the 1–10 scale.
    pub value: f64,
    /// Whether feedback contributed.
    pub scoring_method: ScoringMethod,
    /// Weight given to the AI baseline.
    pub ai_weight: f64,
    /// Weight given to the feedback score.
    pub feedback_weight: f64,
    /// Baseline supplied by the AI scorer.
    pub ai_score: f64,
    /// Summary the feedback score came from; present only when blended.
    pub summary: Option<AggregationSummary>,
}

/// Combine `ai_score` with `summary` under `weights`.
///
/// Without sufficient feedback, or when the feedback score is absent, the
/// baseline passes through unchanged with weights `1.0`/`0.0`. Otherwise the
/// result is `ai × w_ai + feedback × 10 × w_feedback`, clamped to `1..=10`.
#[expect(
    clippy::float_arithmetic,
    reason = "blending is a weighted linear combination"
)]
#[must_use]
pub fn blend_scores(
    ai_score: f64,
    summary: AggregationSummary,
    weights: BlendWeights,
) -> BlendedScore {
    let feedback_score = summary
        .feedback_safety_score
        .filter(|_| summary.has_sufficient_feedback);
    let Some(feedback_score) = feedback_score else {
        return BlendedScore {
            value: ai_score,
            scoring_method: ScoringMethod::AiOnly,
            ai_weight: 1.0,
            feedback_weight: 0.0,
            ai_score,
            summary: None,
        };
    };
    let feedback_on_rating_scale = feedback_score * f64::from(MAX_RATING);
    let raw = ai_score * weights.ai + feedback_on_rating_scale * weights.feedback;
    BlendedScore {
        value: raw.clamp(f64::from(MIN_RATING), f64::from(MAX_RATING)),
        scoring_method: ScoringMethod::BlendedAiUserFeedback,
        ai_weight: weights.ai,
        feedback_weight: weights.feedback,
        ai_score,
        summary: Some(summary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use rstest::{fixture, rstest};
    use safespot_core::{
        Cohort, EngineConfig,
        test_support::{distinct_submitters, reference_now, reference_point},
    };

    use crate::summary::summarize_cohort;

    fn summary_with(submitters: u64, rating: u8) -> AggregationSummary {
        let records = distinct_submitters(submitters, reference_point(), rating);
        let cohort = Cohort::resolve(reference_point(), 100.0, records).expect("cohort");
        summarize_cohort(&cohort, &BTreeSet::new(), &EngineConfig::default(), reference_now())
    }

    #[fixture]
    fn sufficient() -> AggregationSummary {
        summary_with(50, 7)
    }

    #[rstest]
    fn blends_with_fixed_weights(mut sufficient: AggregationSummary) {
        sufficient.feedback_safety_score = Some(0.72);
        let score = blend_scores(6.5, sufficient, BlendWeights::default());
        assert_eq!(score.scoring_method, ScoringMethod::BlendedAiUserFeedback);
        assert!((score.value - 6.78).abs() < 1e-9, "value {}", score.value);
        assert_eq!(score.ai_weight, 0.6);
        assert_eq!(score.feedback_weight, 0.4);
        assert!(score.summary.is_some());
    }

    #[rstest]
    #[case(49, ScoringMethod::AiOnly)]
    #[case(50, ScoringMethod::BlendedAiUserFeedback)]
    fn threshold_boundary_selects_the_method(
        #[case] submitters: u64,
        #[case] method: ScoringMethod,
    ) {
        let score = blend_scores(6.5, summary_with(submitters, 7), BlendWeights::default());
        assert_eq!(score.scoring_method, method);
    }

    #[rstest]
    fn insufficient_feedback_passes_the_baseline_through() {
        let score = blend_scores(4.2, summary_with(3, 9), BlendWeights::default());
        assert_eq!(score.value, 4.2);
        assert_eq!(score.ai_weight, 1.0);
        assert_eq!(score.feedback_weight, 0.0);
        assert!(score.summary.is_none());
    }

    #[rstest]
    fn missing_feedback_score_forces_ai_only(mut sufficient: AggregationSummary) {
        sufficient.feedback_safety_score = None;
        let score = blend_scores(6.0, sufficient, BlendWeights::default());
        assert_eq!(score.scoring_method, ScoringMethod::AiOnly);
    }

    #[rstest]
    #[case(25.0, 10.0)]
    #[case(-8.0, 1.0)]
    fn blended_value_is_clamped(
        mut sufficient: AggregationSummary,
        #[case] baseline: f64,
        #[case] expected: f64,
    ) {
        sufficient.feedback_safety_score = Some(0.5);
        let score = blend_scores(baseline, sufficient, BlendWeights::default());
        assert_eq!(score.value, expected);
    }
}
