//! End-to-end command execution against temporary feedback databases.

use super::helpers::{Workspace, run_query};
use super::*;
use crate::args::Tuning;
use rstest::{fixture, rstest};
use safespot_core::{
    GeoPoint,
    test_support::{RecordBuilder, distinct_submitters, reference_point},
};
use safespot_scorer::NeedOrder;

fn settings(workspace: &Workspace, threshold: Option<u32>) -> EngineSettings {
    EngineSettings {
        feedback_db: workspace.database_path(),
        config: Tuning {
            threshold,
            ..Tuning::default()
        }
        .into_engine_config(),
    }
}

fn location(workspace: &Workspace) -> LocationConfig {
    LocationConfig {
        settings: settings(workspace, None),
        point: reference_point(),
        radius: None,
    }
}

/// Fifty submitters rating the reference point 8, plus one pending record.
#[fixture]
fn populated() -> Workspace {
    let workspace = Workspace::new();
    let mut records = distinct_submitters(50, reference_point(), 8);
    records.push(RecordBuilder::new(500, "late").rating(1).pending().build());
    workspace.write_database(&records);
    workspace
}

#[rstest]
fn summarize_reports_the_cohort(populated: Workspace) {
    let json = run_query(Query::Summarize(location(&populated))).expect("summary");
    assert_eq!(json["feedback_count"], 50);
    assert_eq!(json["unique_user_count"], 50);
    assert_eq!(json["has_sufficient_feedback"], true);
    assert_eq!(json["rating_distribution"]["8"], 50);
}

#[rstest]
fn progress_reports_completion(populated: Workspace) {
    let json = run_query(Query::Progress(location(&populated))).expect("progress");
    assert_eq!(json["progress"]["state"], "complete");
    assert_eq!(json["progress"]["remaining_needed"], 0);
}

#[rstest]
fn score_blends_sufficient_feedback(populated: Workspace) {
    let query = Query::Score(ScoreConfig {
        settings: settings(&populated, None),
        point: reference_point(),
        baseline: 6.5,
    });
    let json = run_query(query).expect("score");
    assert_eq!(json["scoring_method"], "blended_ai_user_feedback");
    let value = json["value"].as_f64().expect("numeric score");
    assert!((value - 7.1).abs() < 1e-9, "value {value}");
}

#[rstest]
fn needs_feedback_lists_sparse_cells() {
    let workspace = Workspace::new();
    let sparse = GeoPoint::new(13.2, 80.2).expect("valid point");
    let records = vec![
        RecordBuilder::new(1, "a").at(sparse).named("Market").build(),
        RecordBuilder::new(2, "b").at(reference_point()).build(),
        RecordBuilder::new(3, "c").at(reference_point()).build(),
    ];
    workspace.write_database(&records);
    let query = Query::NeedsFeedback(NeedsConfig {
        settings: settings(&workspace, Some(3)),
        limit: 10,
        order: NeedOrder::MostRemaining,
    });
    let json = run_query(query).expect("needs");
    let needs = json.as_array().expect("array of needs");
    let [sparsest, nearest] = needs.as_slice() else {
        panic!("expected two cells, found {needs:?}");
    };
    assert_eq!(sparsest["progress"]["remaining_needed"], 2);
    assert_eq!(sparsest["sample_location_name"], "Market");
    assert_eq!(nearest["progress"]["remaining_needed"], 1);
}

#[rstest]
fn analytics_summarises_the_database(populated: Workspace) {
    let query = Query::Analytics(settings(&populated, None));
    let json = run_query(query).expect("analytics");
    assert_eq!(json["total_feedback"], 50);
    assert_eq!(json["unique_users"], 50);
    assert_eq!(json["locations_with_sufficient_feedback"], 1);
}

#[rstest]
fn missing_database_is_reported() {
    let workspace = Workspace::new();
    let err = run_query(Query::Summarize(location(&workspace))).expect_err("no database");
    match err {
        CliError::MissingFeedbackDatabase { path } => {
            assert_eq!(path, workspace.database_path());
        }
        other => panic!("expected MissingFeedbackDatabase, found {other:?}"),
    }
}
