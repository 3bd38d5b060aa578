//! Core data model.
//!
//! A workload is something to run. Running it yields an [`Outcome`], and the
//! engine tags each outcome with the workload's position in the batch to form
//! a [`Completion`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;

use crate::error::Failure;

/// Boxed, sendable future as stored inside a [`Command`].
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// A zero-argument async command. Each call starts a fresh run.
pub type Command<T> = Arc<dyn Fn() -> BoxFuture<Outcome<T>> + Send + Sync>;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What a single run of a workload produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Outcome<T> {
    Success(T),
    Failure(Failure),
}

impl<T> Outcome<T> {
    /// Map any `Result` onto an outcome, keeping only the error's message.
    pub fn from_result<E: fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(e) => Self::Failure(Failure::rejected(e)),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(f) => Some(f),
        }
    }

    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(f) => Err(f),
        }
    }
}

impl<T> From<Result<T, Failure>> for Outcome<T> {
    fn from(result: Result<T, Failure>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(f) => Self::Failure(f),
        }
    }
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// An outcome tagged with the submission position of its workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion<T> {
    /// Position of the workload in the input batch.
    pub idx: usize,
    pub outcome: Outcome<T>,
}

impl<T> Completion<T> {
    pub fn new(idx: usize, outcome: Outcome<T>) -> Self {
        Self { idx, outcome }
    }

    pub fn success(idx: usize, value: T) -> Self {
        Self::new(idx, Outcome::Success(value))
    }

    pub fn failure(idx: usize, failure: Failure) -> Self {
        Self::new(idx, Outcome::Failure(failure))
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

// ---------------------------------------------------------------------------
// Workload
// ---------------------------------------------------------------------------

/// A unit of work: a command plus an optional fallback value.
///
/// The fallback is only consulted when the workload is wrapped with
/// [`with_timeout`](crate::engine::timeout::with_timeout) and the deadline
/// passes first. Cloning shares the command.
pub struct Workload<T> {
    command: Command<T>,
    fallback: Option<T>,
}

impl<T: Send + 'static> Workload<T> {
    /// Build a workload from an async closure producing an [`Outcome`].
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome<T>> + Send + 'static,
    {
        let command: Command<T> = Arc::new(move || -> BoxFuture<Outcome<T>> { Box::pin(f()) });
        Self {
            command,
            fallback: None,
        }
    }

    /// Build a workload from an async closure producing a `Result`.
    ///
    /// `Err` values become [`Failure::Rejected`] carrying the error's message.
    pub fn try_new<F, Fut, E>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: fmt::Display + 'static,
    {
        Self::new(move || {
            let run = f();
            async move { Outcome::from_result(run.await) }
        })
    }

    /// Build a workload from a synchronous closure that may block.
    ///
    /// Each run goes to tokio's blocking pool.
    pub fn blocking<F>(f: F) -> Self
    where
        F: Fn() -> Outcome<T> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Self::new(move || {
            let f = Arc::clone(&f);
            async move {
                match tokio::task::spawn_blocking(move || f()).await {
                    Ok(outcome) => outcome,
                    Err(e) => Outcome::Failure(Failure::from(e)),
                }
            }
        })
    }

    /// A workload that always fails with `failure`.
    pub fn failing(failure: Failure) -> Self {
        Self::new(move || std::future::ready(Outcome::Failure(failure.clone())))
    }

    /// Attach the value substituted when a timeout wins.
    pub fn with_fallback(mut self, fallback: T) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn fallback(&self) -> Option<&T> {
        self.fallback.as_ref()
    }

    /// Start one run of the command.
    pub(crate) fn run(&self) -> BoxFuture<Outcome<T>> {
        (self.command)()
    }
}

impl<T: Clone + Send + Sync + 'static> Workload<T> {
    /// A workload that immediately yields `outcome` on every run.
    pub fn from_outcome(outcome: Outcome<T>) -> Self {
        Self::new(move || std::future::ready(outcome.clone()))
    }

    /// A workload that immediately succeeds with `value`.
    pub fn value(value: T) -> Self {
        Self::from_outcome(Outcome::Success(value))
    }
}

impl<T: Clone> Clone for Workload<T> {
    fn clone(&self) -> Self {
        Self {
            command: Arc::clone(&self.command),
            fallback: self.fallback.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Workload<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workload")
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}
