//! Error types emitted by the Safespot CLI.
//!
//! Keep this error type reasonably small, as every command returns
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use safespot_core::SqliteFeedbackStoreError;
use safespot_scorer::EngineError;
use thiserror::Error;

/// Errors emitted by the Safespot CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name without dashes.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },
    /// A required query value was not supplied.
    #[error("missing --{field}")]
    MissingQueryValue {
        /// Flag name without dashes.
        field: &'static str,
    },
    /// The supplied baseline lies outside the rating scale.
    #[error("baseline {value} must lie between 1 and 10")]
    BaselineOutOfRange {
        /// Rejected baseline.
        value: f64,
    },
    /// The feedback database path does not exist or is not a file.
    #[error("feedback database {path:?} does not exist or is not a file")]
    MissingFeedbackDatabase {
        /// Path that was checked.
        path: Utf8PathBuf,
    },
    /// Opening the feedback database failed.
    #[error(transparent)]
    OpenStore(#[from] SqliteFeedbackStoreError),
    /// The engine rejected the query or a collaborator failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
