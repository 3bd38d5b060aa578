//! Error types for promise-rs.
//!
//! Two layers: [`Failure`] is data carried inside an
//! [`Outcome`](crate::model::Outcome) and never aborts a combinator;
//! [`Error`] covers crate plumbing (configuration, telemetry setup).

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Why a workload did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    /// The command itself reported an error.
    #[error("{message}")]
    Rejected { message: String },

    /// `some` was asked for more successes than there are workloads.
    #[error(
        "range error: count {count} should be less than or equal to the number of workloads ({len})"
    )]
    Range { count: usize, len: usize },

    /// The timeout fired and the workload had no fallback value.
    #[error("workload timed out after {after:?} with no fallback value")]
    TimedOut { after: Duration },

    /// The command panicked before producing a value.
    #[error("workload panicked: {message}")]
    Panicked { message: String },
}

impl Failure {
    /// Build a [`Failure::Rejected`] from anything printable.
    pub fn rejected(message: impl std::fmt::Display) -> Self {
        Self::Rejected {
            message: message.to_string(),
        }
    }

    /// Short label used for metrics and log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Rejected { .. } => "rejected",
            Self::Range { .. } => "range",
            Self::TimedOut { .. } => "timed_out",
            Self::Panicked { .. } => "panicked",
        }
    }
}

impl From<tokio::task::JoinError> for Failure {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            Self::Panicked {
                message: err.to_string(),
            }
        } else {
            Self::rejected(err)
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
