//! Command-line interface for the Safespot feedback engine.
//!
//! Each subcommand opens a SQLite feedback database read-only, runs one
//! engine query and writes the result to stdout as pretty-printed JSON.
#![forbid(unsafe_code)]

use std::{io::Write, sync::Arc};

use clap::{Parser, Subcommand};
use safespot_core::{
    BaselineError, BaselineScorer, Clock, FixedBaseline, GeoPoint, SqliteFeedbackStore,
    SystemClock,
};
use safespot_scorer::FeedbackEngine;
use serde::Serialize;

mod args;
mod error;

pub use error::CliError;

use args::{
    AnalyticsArgs, EngineSettings, LocationArgs, LocationConfig, NeedsArgs, NeedsConfig,
    ScoreArgs, ScoreConfig,
};

type SqliteEngine<B, C> =
    FeedbackEngine<Arc<SqliteFeedbackStore>, Arc<SqliteFeedbackStore>, B, C>;

/// Run the Safespot CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when arguments are invalid, the database cannot be
/// read or the engine rejects the query.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    run_command(cli.command, SystemClock, &mut stdout)
}

#[derive(Debug, Parser)]
#[command(
    name = "safespot",
    about = "Crowd feedback aggregation and blended safety scoring",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Summarise the feedback around a point.
    Summarize(LocationArgs),
    /// Report progress toward the feedback threshold around a point.
    Progress(LocationArgs),
    /// Blend an AI baseline with the feedback around a point.
    Score(ScoreArgs),
    /// List locations still short of the feedback threshold.
    NeedsFeedback(NeedsArgs),
    /// Summarise the whole feedback database.
    Analytics(AnalyticsArgs),
}

fn run_command<C: Clock>(
    command: Command,
    clock: C,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let query = Query::resolve(command)?;
    query.settings().validate_sources()?;
    execute(query, clock, writer)
}

/// A fully resolved subcommand.
#[derive(Debug, Clone, PartialEq)]
enum Query {
    Summarize(LocationConfig),
    Progress(LocationConfig),
    Score(ScoreConfig),
    NeedsFeedback(NeedsConfig),
    Analytics(EngineSettings),
}

impl Query {
    fn resolve(command: Command) -> Result<Self, CliError> {
        Ok(match command {
            Command::Summarize(args) => Self::Summarize(args.into_config()?),
            Command::Progress(args) => Self::Progress(args.into_config()?),
            Command::Score(args) => Self::Score(args.into_config()?),
            Command::NeedsFeedback(args) => Self::NeedsFeedback(args.into_config()?),
            Command::Analytics(args) => Self::Analytics(args.into_config()?),
        })
    }

    const fn settings(&self) -> &EngineSettings {
        match self {
            Self::Summarize(query) | Self::Progress(query) => &query.settings,
            Self::Score(query) => &query.settings,
            Self::NeedsFeedback(query) => &query.settings,
            Self::Analytics(settings) => settings,
        }
    }
}

fn execute<C: Clock>(query: Query, clock: C, writer: &mut dyn Write) -> Result<(), CliError> {
    match query {
        Query::Summarize(location) => {
            let engine = open_engine(&location.settings, NoBaseline, clock)?;
            write_json(writer, &engine.summarize(location.point, location.radius)?)
        }
        Query::Progress(location) => {
            let engine = open_engine(&location.settings, NoBaseline, clock)?;
            write_json(writer, &engine.progress(location.point, location.radius)?)
        }
        Query::Score(score) => {
            let engine = open_engine(&score.settings, FixedBaseline(score.baseline), clock)?;
            write_json(writer, &engine.score(score.point)?)
        }
        Query::NeedsFeedback(needs) => {
            let engine = open_engine(&needs.settings, NoBaseline, clock)?;
            write_json(
                writer,
                &engine.locations_needing_feedback(needs.limit, needs.order)?,
            )
        }
        Query::Analytics(settings) => {
            let engine = open_engine(&settings, NoBaseline, clock)?;
            write_json(writer, &engine.analytics()?)
        }
    }
}

/// Baseline for commands that never blend.
#[derive(Debug, Clone, Copy)]
struct NoBaseline;

impl BaselineScorer for NoBaseline {
    fn baseline_score(&self, _point: GeoPoint) -> Result<f64, BaselineError> {
        Err(BaselineError::Unavailable {
            reason: "no baseline was supplied".to_owned(),
        })
    }
}

fn open_engine<B: BaselineScorer, C: Clock>(
    settings: &EngineSettings,
    baseline: B,
    clock: C,
) -> Result<SqliteEngine<B, C>, CliError> {
    let store = Arc::new(
        SqliteFeedbackStore::open(settings.feedback_db.as_std_path())?
            .with_trust_threshold(settings.config.trusted_history_threshold),
    );
    let engine = FeedbackEngine::new(
        Arc::clone(&store),
        store,
        baseline,
        clock,
        settings.config,
    )?;
    Ok(engine)
}

fn write_json<T: Serialize + ?Sized>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
