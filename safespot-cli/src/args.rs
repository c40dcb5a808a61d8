//! Subcommand arguments and their resolved configurations.
//!
//! Every argument struct derives [`OrthoConfig`], so values may come from
//! flags, `SAFESPOT_*` environment variables or configuration files. The
//! merged arguments are then converted into a resolved configuration that
//! holds only validated, required values.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use safespot_core::{EngineConfig, GeoPoint, MAX_RATING, MIN_RATING};
use safespot_scorer::{EngineError, NeedOrder};
use serde::{Deserialize, Serialize};

use crate::CliError;

pub(crate) const ARG_FEEDBACK_DB: &str = "feedback-db";
pub(crate) const ENV_FEEDBACK_DB: &str = "SAFESPOT_FEEDBACK_DB";
pub(crate) const ARG_LAT: &str = "lat";
pub(crate) const ARG_LON: &str = "lon";
pub(crate) const ARG_BASELINE: &str = "baseline";
pub(crate) const DEFAULT_NEEDS_LIMIT: usize = 10;

/// Engine overrides shared by every subcommand.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Tuning {
    pub(crate) threshold: Option<u32>,
    pub(crate) max_age_days: Option<u32>,
    pub(crate) outlier_sigma: Option<f64>,
}

impl Tuning {
    /// Apply the overrides on top of the engine defaults.
    pub(crate) fn into_engine_config(self) -> EngineConfig {
        let defaults = EngineConfig::default();
        EngineConfig {
            min_feedback_threshold: self.threshold.unwrap_or(defaults.min_feedback_threshold),
            max_feedback_age_days: self.max_age_days.unwrap_or(defaults.max_feedback_age_days),
            outlier_std_dev_threshold: self
                .outlier_sigma
                .unwrap_or(defaults.outlier_std_dev_threshold),
            ..defaults
        }
    }
}

/// Database path and engine configuration common to every command.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EngineSettings {
    pub(crate) feedback_db: Utf8PathBuf,
    pub(crate) config: EngineConfig,
}

impl EngineSettings {
    fn resolve(feedback_db: Option<Utf8PathBuf>, tuning: Tuning) -> Result<Self, CliError> {
        let path = feedback_db.ok_or(CliError::MissingArgument {
            field: ARG_FEEDBACK_DB,
            env: ENV_FEEDBACK_DB,
        })?;
        Ok(Self {
            feedback_db: path,
            config: tuning.into_engine_config(),
        })
    }

    /// Fail early when the database file is absent.
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_file(&self.feedback_db)
    }
}

fn require_file(path: &Utf8Path) -> Result<(), CliError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(CliError::MissingFeedbackDatabase {
            path: path.to_path_buf(),
        })
    }
}

fn require_point(lat: Option<f64>, lon: Option<f64>) -> Result<GeoPoint, CliError> {
    let latitude = lat.ok_or(CliError::MissingQueryValue { field: ARG_LAT })?;
    let longitude = lon.ok_or(CliError::MissingQueryValue { field: ARG_LON })?;
    GeoPoint::new(latitude, longitude).map_err(|err| CliError::Engine(EngineError::from(err)))
}

/// CLI arguments for the `summarize` and `progress` subcommands.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Query the feedback around a point")]
#[ortho_config(prefix = "SAFESPOT")]
pub(crate) struct LocationArgs {
    /// Path to the SQLite feedback database.
    #[arg(long = ARG_FEEDBACK_DB, value_name = "path", env = ENV_FEEDBACK_DB)]
    #[serde(default)]
    pub(crate) feedback_db: Option<Utf8PathBuf>,
    /// Latitude of the query point in degrees.
    #[arg(long = ARG_LAT, value_name = "degrees", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude of the query point in degrees.
    #[arg(long = ARG_LON, value_name = "degrees", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// Cohort radius in metres (default 100).
    #[arg(long, value_name = "metres")]
    #[serde(default)]
    pub(crate) radius: Option<f64>,
    /// Unique submitters required for sufficiency (default 50).
    #[arg(long, value_name = "count")]
    #[serde(default)]
    pub(crate) threshold: Option<u32>,
    /// Freshness window in days (default 365).
    #[arg(long, value_name = "days")]
    #[serde(default)]
    pub(crate) max_age_days: Option<u32>,
    /// Outlier threshold in standard deviations (default 2.0).
    #[arg(long, value_name = "sigma")]
    #[serde(default)]
    pub(crate) outlier_sigma: Option<f64>,
}

impl LocationArgs {
    pub(crate) fn into_config(self) -> Result<LocationConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        LocationConfig::try_from(merged)
    }
}

/// Resolved point query.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LocationConfig {
    pub(crate) settings: EngineSettings,
    pub(crate) point: GeoPoint,
    pub(crate) radius: Option<f64>,
}

impl TryFrom<LocationArgs> for LocationConfig {
    type Error = CliError;

    fn try_from(args: LocationArgs) -> Result<Self, Self::Error> {
        let tuning = Tuning {
            threshold: args.threshold,
            max_age_days: args.max_age_days,
            outlier_sigma: args.outlier_sigma,
        };
        Ok(Self {
            settings: EngineSettings::resolve(args.feedback_db, tuning)?,
            point: require_point(args.lat, args.lon)?,
            radius: args.radius,
        })
    }
}

/// CLI arguments for the `score` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Blend an AI baseline with the crowd feedback around a \
                 point. The baseline comes from an external model and is \
                 supplied on the command line.",
    about = "Score a point"
)]
#[ortho_config(prefix = "SAFESPOT")]
pub(crate) struct ScoreArgs {
    /// Path to the SQLite feedback database.
    #[arg(long = ARG_FEEDBACK_DB, value_name = "path", env = ENV_FEEDBACK_DB)]
    #[serde(default)]
    pub(crate) feedback_db: Option<Utf8PathBuf>,
    /// Latitude of the query point in degrees.
    #[arg(long = ARG_LAT, value_name = "degrees", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude of the query point in degrees.
    #[arg(long = ARG_LON, value_name = "degrees", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// AI baseline score on the 1-10 scale.
    #[arg(long = ARG_BASELINE, value_name = "score")]
    #[serde(default)]
    pub(crate) baseline: Option<f64>,
    /// Unique submitters required for sufficiency (default 50).
    #[arg(long, value_name = "count")]
    #[serde(default)]
    pub(crate) threshold: Option<u32>,
    /// Freshness window in days (default 365).
    #[arg(long, value_name = "days")]
    #[serde(default)]
    pub(crate) max_age_days: Option<u32>,
    /// Outlier threshold in standard deviations (default 2.0).
    #[arg(long, value_name = "sigma")]
    #[serde(default)]
    pub(crate) outlier_sigma: Option<f64>,
}

impl ScoreArgs {
    pub(crate) fn into_config(self) -> Result<ScoreConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ScoreConfig::try_from(merged)
    }
}

/// Resolved `score` query.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScoreConfig {
    pub(crate) settings: EngineSettings,
    pub(crate) point: GeoPoint,
    pub(crate) baseline: f64,
}

impl TryFrom<ScoreArgs> for ScoreConfig {
    type Error = CliError;

    fn try_from(args: ScoreArgs) -> Result<Self, Self::Error> {
        let tuning = Tuning {
            threshold: args.threshold,
            max_age_days: args.max_age_days,
            outlier_sigma: args.outlier_sigma,
        };
        let baseline = args.baseline.ok_or(CliError::MissingQueryValue {
            field: ARG_BASELINE,
        })?;
        if !(f64::from(MIN_RATING)..=f64::from(MAX_RATING)).contains(&baseline) {
            return Err(CliError::BaselineOutOfRange { value: baseline });
        }
        Ok(Self {
            settings: EngineSettings::resolve(args.feedback_db, tuning)?,
            point: require_point(args.lat, args.lon)?,
            baseline,
        })
    }
}

/// CLI arguments for the `needs-feedback` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "List locations still short of the feedback threshold")]
#[ortho_config(prefix = "SAFESPOT")]
pub(crate) struct NeedsArgs {
    /// Path to the SQLite feedback database.
    #[arg(long = ARG_FEEDBACK_DB, value_name = "path", env = ENV_FEEDBACK_DB)]
    #[serde(default)]
    pub(crate) feedback_db: Option<Utf8PathBuf>,
    /// Maximum number of locations to list (default 10).
    #[arg(long, value_name = "count")]
    #[serde(default)]
    pub(crate) limit: Option<usize>,
    /// `fewest-remaining` (default) or `most-remaining`.
    #[arg(long, value_name = "order")]
    #[serde(default)]
    pub(crate) order: Option<NeedOrder>,
    /// Unique submitters required for sufficiency (default 50).
    #[arg(long, value_name = "count")]
    #[serde(default)]
    pub(crate) threshold: Option<u32>,
    /// Freshness window in days (default 365).
    #[arg(long, value_name = "days")]
    #[serde(default)]
    pub(crate) max_age_days: Option<u32>,
    /// Outlier threshold in standard deviations (default 2.0).
    #[arg(long, value_name = "sigma")]
    #[serde(default)]
    pub(crate) outlier_sigma: Option<f64>,
}

impl NeedsArgs {
    pub(crate) fn into_config(self) -> Result<NeedsConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        NeedsConfig::try_from(merged)
    }
}

/// Resolved `needs-feedback` query.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NeedsConfig {
    pub(crate) settings: EngineSettings,
    pub(crate) limit: usize,
    pub(crate) order: NeedOrder,
}

impl TryFrom<NeedsArgs> for NeedsConfig {
    type Error = CliError;

    fn try_from(args: NeedsArgs) -> Result<Self, Self::Error> {
        let tuning = Tuning {
            threshold: args.threshold,
            max_age_days: args.max_age_days,
            outlier_sigma: args.outlier_sigma,
        };
        Ok(Self {
            settings: EngineSettings::resolve(args.feedback_db, tuning)?,
            limit: args.limit.unwrap_or(DEFAULT_NEEDS_LIMIT),
            order: args.order.unwrap_or_default(),
        })
    }
}

/// CLI arguments for the `analytics` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Summarise the whole feedback database")]
#[ortho_config(prefix = "SAFESPOT")]
pub(crate) struct AnalyticsArgs {
    /// Path to the SQLite feedback database.
    #[arg(long = ARG_FEEDBACK_DB, value_name = "path", env = ENV_FEEDBACK_DB)]
    #[serde(default)]
    pub(crate) feedback_db: Option<Utf8PathBuf>,
    /// Unique submitters required for sufficiency (default 50).
    #[arg(long, value_name = "count")]
    #[serde(default)]
    pub(crate) threshold: Option<u32>,
    /// Freshness window in days (default 365).
    #[arg(long, value_name = "days")]
    #[serde(default)]
    pub(crate) max_age_days: Option<u32>,
    /// Outlier threshold in standard deviations (default 2.0).
    #[arg(long, value_name = "sigma")]
    #[serde(default)]
    pub(crate) outlier_sigma: Option<f64>,
}

impl AnalyticsArgs {
    pub(crate) fn into_config(self) -> Result<EngineSettings, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        EngineSettings::try_from(merged)
    }
}

impl TryFrom<AnalyticsArgs> for EngineSettings {
    type Error = CliError;

    fn try_from(args: AnalyticsArgs) -> Result<Self, Self::Error> {
        let tuning = Tuning {
            threshold: args.threshold,
            max_age_days: args.max_age_days,
            outlier_sigma: args.outlier_sigma,
        };
        Self::resolve(args.feedback_db, tuning)
    }
}
