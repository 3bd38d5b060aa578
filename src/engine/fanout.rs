//! Fan-out/fan-in primitive shared by every combinator.
//!
//! One task per workload, one unbounded channel back. Tasks are never
//! cancelled: each runs to completion and publishes exactly one
//! [`Completion`], whether or not anyone is still receiving.

use opentelemetry::KeyValue;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, warn};

use crate::error::Failure;
use crate::model::{Completion, Outcome, Workload};
use crate::telemetry::combinator::start_workload_span;
use crate::telemetry::metrics;

/// Whether failed runs count toward `promise.workload.failures`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tally {
    Counted,
    /// The caller counts failures itself.
    Silent,
}

/// Spawn every workload and return the receiving end of their completions.
pub(crate) fn fan_out<T: Send + 'static>(
    workloads: Vec<Workload<T>>,
    tally: Tally,
) -> mpsc::UnboundedReceiver<Completion<T>> {
    let (tx, rx) = mpsc::unbounded_channel();
    for (idx, workload) in workloads.into_iter().enumerate() {
        let tx = tx.clone();
        let span = start_workload_span(idx);
        tokio::spawn(
            async move {
                let outcome = settle(workload).await;
                match outcome.failure() {
                    None => debug!("workload fulfilled"),
                    Some(failure) => {
                        if tally == Tally::Counted {
                            count_failure(failure);
                        }
                        debug!(reason = failure.reason(), error = %failure, "workload failed");
                    }
                }
                // Receiver is gone once the combinator has returned.
                let _ = tx.send(Completion::new(idx, outcome));
            }
            .instrument(span),
        );
    }
    rx
}

/// Run the workload once on its own task so a panic still yields an outcome.
///
/// The command is invoked inside that task, so a panic while building the
/// future is caught the same way as one while polling it.
pub(crate) async fn settle<T: Send + 'static>(workload: Workload<T>) -> Outcome<T> {
    match tokio::spawn(async move { workload.run().await }).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, "workload task did not finish");
            Outcome::Failure(Failure::from(e))
        }
    }
}

pub(crate) fn count_failure(failure: &Failure) {
    metrics::workload_failures().add(1, &[KeyValue::new("reason", failure.reason())]);
}

/// Restore submission order.
pub(crate) fn in_submission_order<T>(mut completions: Vec<Completion<T>>) -> Vec<Completion<T>> {
    completions.sort_by_key(|c| c.idx);
    completions
}
