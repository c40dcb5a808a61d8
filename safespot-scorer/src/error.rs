//! Error types raised by the feedback engine.

use std::{error::Error as StdError, fmt};

use safespot_core::{BaselineError, ConfigError, GeoPointError, StoreError};
use thiserror::Error;

/// External dependency an engine call relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Upstream {
    /// The feedback record store.
    RecordStore,
    /// The submitter trust oracle.
    TrustOracle,
    /// The AI baseline scorer.
    BaselineScorer,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RecordStore => "record store",
            Self::TrustOracle => "trust oracle",
            Self::BaselineScorer => "baseline scorer",
        })
    }
}

/// Errors raised while answering an engine query.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The query point was outside the valid coordinate range.
    #[error(transparent)]
    InvalidCoordinate(#[from] GeoPointError),
    /// The query radius was not a positive finite number.
    #[error("radius {radius} must be a positive number of metres")]
    InvalidRadius {
        /// Rejected radius.
        radius: f64,
    },
    /// The baseline scorer returned a non-finite score.
    #[error("baseline score {score} is not a finite number")]
    InvalidBaseline {
        /// Rejected score.
        score: f64,
    },
    /// The engine configuration was rejected.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    /// An upstream dependency failed; the query was not answered.
    #[error("{upstream} unavailable")]
    UpstreamUnavailable {
        /// Failing dependency.
        upstream: Upstream,
        /// Error reported by the dependency.
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },
}

impl EngineError {
    pub(crate) fn store(source: StoreError) -> Self {
        Self::UpstreamUnavailable {
            upstream: Upstream::RecordStore,
            source: Box::new(source),
        }
    }

    pub(crate) fn trust(source: StoreError) -> Self {
        Self::UpstreamUnavailable {
            upstream: Upstream::TrustOracle,
            source: Box::new(source),
        }
    }

    pub(crate) fn baseline(source: BaselineError) -> Self {
        Self::UpstreamUnavailable {
            upstream: Upstream::BaselineScorer,
            source: Box::new(source),
        }
    }

    /// Dependency that failed, when the error came from upstream.
    #[must_use]
    pub const fn upstream(&self) -> Option<Upstream> {
        match self {
            Self::UpstreamUnavailable { upstream, .. } => Some(*upstream),
            _ => None,
        }
    }
}
