//! The combinator engine.
//!
//! Every combinator follows the same pattern: spawn one task per workload,
//! collect completions over a fan-in channel, and stop according to its own
//! rule. Workload tasks are fire-and-forget with no cancellation token. When
//! a combinator returns early, the remaining tasks keep running in the
//! background and their completions are dropped. A command that never
//! finishes holds its task forever.
//!
//! All methods must be awaited inside a tokio runtime.

mod fanout;
mod quorum;
mod race;
mod settle;
pub mod timeout;

use std::future::Future;
use std::time::Instant;

use tracing::Instrument;

use crate::config::Options;
use self::fanout::Tally;
use crate::model::{Completion, Workload};
use crate::telemetry::combinator::{record_settlement, start_combinator_span};

pub use timeout::with_timeout;

/// Runs batches of workloads under one of the combinator policies.
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    options: Options,
}

impl Engine {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Wait for every workload. Never short-circuits and never fails.
    ///
    /// Returns one completion per workload in submission order. Recorded as
    /// `rejected` when any of them failed.
    pub async fn all_settled<T: Send + 'static>(
        &self,
        workloads: Vec<Workload<T>>,
    ) -> Vec<Completion<T>> {
        let len = workloads.len();
        observe(
            "all_settled",
            len,
            settle::all_settled(workloads, Tally::Counted),
            |c| verdict(c),
        )
        .await
    }

    /// Wait for every success, or stop at the first failure.
    ///
    /// All succeed: every completion in submission order. Otherwise a
    /// single-element vector holding the first failure to arrive, which is
    /// not necessarily the lowest index.
    pub async fn all<T: Send + 'static>(&self, workloads: Vec<Workload<T>>) -> Vec<Completion<T>> {
        let len = workloads.len();
        observe("all", len, settle::all(workloads, Tally::Counted), |c| {
            verdict(c)
        })
        .await
    }

    /// The first workload to finish, success or failure.
    ///
    /// The returned `idx` is always 0 whichever workload won; use
    /// [`race_indexed`](Self::race_indexed) to learn the winner's position.
    /// `None` for an empty batch.
    pub async fn race<T: Send + 'static>(
        &self,
        workloads: Vec<Workload<T>>,
    ) -> Option<Completion<T>> {
        self.race_indexed(workloads)
            .await
            .map(|winner| Completion::new(0, winner.outcome))
    }

    /// Like [`race`](Self::race), but `idx` is the winner's submission position.
    pub async fn race_indexed<T: Send + 'static>(
        &self,
        workloads: Vec<Workload<T>>,
    ) -> Option<Completion<T>> {
        let len = workloads.len();
        observe(
            "race",
            len,
            race::first(workloads, Tally::Counted),
            |winner| match winner {
                None => "empty",
                Some(c) if c.is_success() => "fulfilled",
                Some(_) => "rejected",
            },
        )
        .await
    }

    /// Race each workload against its configured timeout, then [`all`](Self::all)
    /// over the winners.
    ///
    /// Workloads slower than the timeout contribute their fallback value (or
    /// a [`TimedOut`](crate::error::Failure::TimedOut) failure when they have
    /// none) at their own index. A zero timeout makes this exactly `all`.
    ///
    /// With a non-zero timeout each command runs twice: once directly and
    /// once inside the timeout wrapper. Commands should be idempotent.
    pub async fn race_all<T>(&self, workloads: Vec<Workload<T>>) -> Vec<Completion<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let len = workloads.len();
        observe(
            "race_all",
            len,
            race::race_all(self.options.timeout, workloads),
            |c| verdict(c),
        )
        .await
    }

    /// The first success as a single-element vector.
    ///
    /// When every workload fails, all failures in submission order.
    pub async fn any<T: Send + 'static>(&self, workloads: Vec<Workload<T>>) -> Vec<Completion<T>> {
        let len = workloads.len();
        observe("any", len, quorum::any(workloads), |c| verdict(c)).await
    }

    /// The first `count` successes, in submission order.
    ///
    /// `count` larger than the batch yields a single
    /// [`Range`](crate::error::Failure::Range) failure and launches nothing;
    /// `count == 0` yields an empty vector. If the batch finishes with fewer
    /// than `count` successes, every failure is returned in submission order.
    pub async fn some<T: Send + 'static>(
        &self,
        workloads: Vec<Workload<T>>,
        count: usize,
    ) -> Vec<Completion<T>> {
        let len = workloads.len();
        observe("some", len, quorum::some(workloads, count), |c| {
            verdict(c)
        })
        .await
    }
}

/// Run one combinator inside its span and record how it ended.
async fn observe<R, F>(
    combinator: &'static str,
    workloads: usize,
    body: F,
    label: impl FnOnce(&R) -> &'static str,
) -> R
where
    F: Future<Output = R>,
{
    let span = start_combinator_span(combinator, workloads);
    let started = Instant::now();
    let result = body.instrument(span.clone()).await;
    record_settlement(&span, combinator, label(&result), started);
    result
}

fn verdict<T>(completions: &[Completion<T>]) -> &'static str {
    if completions.is_empty() {
        "empty"
    } else if completions.iter().all(Completion::is_success) {
        "fulfilled"
    } else {
        "rejected"
    }
}
