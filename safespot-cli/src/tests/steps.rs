//! Behaviour-driven scenarios for the `score` command.

use super::helpers::{Workspace, run_query};
use super::*;
use crate::args::Tuning;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use safespot_core::test_support::{distinct_submitters, reference_point};
use std::cell::RefCell;

pub(super) struct CliContext {
    workspace: Workspace,
    outcome: RefCell<Option<Result<serde_json::Value, CliError>>>,
}

#[fixture]
fn cli_context() -> CliContext {
    CliContext {
        workspace: Workspace::new(),
        outcome: RefCell::new(None),
    }
}

#[given("a feedback database where {count} submitters rated the point {rating}")]
fn given_database(#[from(cli_context)] context: &CliContext, count: u64, rating: u8) {
    context
        .workspace
        .write_database(&distinct_submitters(count, reference_point(), rating));
}

#[given("no feedback database")]
fn given_no_database(#[from(cli_context)] context: &CliContext) {
    assert!(!context.workspace.database_path().exists());
}

#[when("I score the point with a baseline of {baseline}")]
fn when_score(#[from(cli_context)] context: &CliContext, baseline: f64) {
    let query = Query::Score(ScoreConfig {
        settings: EngineSettings {
            feedback_db: context.workspace.database_path(),
            config: Tuning::default().into_engine_config(),
        },
        point: reference_point(),
        baseline,
    });
    *context.outcome.borrow_mut() = Some(run_query(query));
}

fn reported(context: &CliContext) -> serde_json::Value {
    context
        .outcome
        .borrow()
        .as_ref()
        .expect("command ran")
        .as_ref()
        .expect("command succeeded")
        .clone()
}

#[then("the command reports the {method} method")]
fn then_method(#[from(cli_context)] context: &CliContext, method: String) {
    assert_eq!(reported(context)["scoring_method"], method.as_str());
}

#[then("the reported score is {value}")]
#[expect(
    clippy::float_arithmetic,
    reason = "assertions compare floating point values"
)]
fn then_score(#[from(cli_context)] context: &CliContext, value: f64) {
    let score = reported(context)["value"]
        .as_f64()
        .expect("numeric score");
    assert!((score - value).abs() < 1e-9, "score {score}");
}

#[then("the command fails because the database is missing")]
fn then_missing(#[from(cli_context)] context: &CliContext) {
    let borrowed = context.outcome.borrow();
    let outcome = borrowed.as_ref().expect("command ran");
    assert!(matches!(
        outcome,
        Err(CliError::MissingFeedbackDatabase { .. })
    ));
}

#[scenario(path = "tests/features/cli.feature", index = 0)]
fn well_reviewed_point_is_blended(cli_context: CliContext) {
    let _ = cli_context;
}

#[scenario(path = "tests/features/cli.feature", index = 1)]
fn sparse_point_keeps_the_baseline(cli_context: CliContext) {
    let _ = cli_context;
}

#[scenario(path = "tests/features/cli.feature", index = 2)]
fn missing_database_fails(cli_context: CliContext) {
    let _ = cli_context;
}
