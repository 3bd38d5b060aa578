//! First-to-finish combinators: `race` and `race_all`.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{Instrument, debug};

use super::fanout::{Tally, count_failure, fan_out, in_submission_order};
use super::settle;
use super::timeout::with_timeout;
use crate::model::{Completion, Workload};

/// The first completion of any kind, tagged with the winner's position.
pub(super) async fn first<T: Send + 'static>(
    workloads: Vec<Workload<T>>,
    tally: Tally,
) -> Option<Completion<T>> {
    if workloads.is_empty() {
        return None;
    }
    let winner = fan_out(workloads, tally).recv().await;
    if let Some(ref w) = winner {
        debug!(idx = w.idx, "race won");
    }
    winner
}

/// Race each workload against a timeout-wrapped copy of itself, then apply
/// `all` to the winners.
///
/// A failed workload is counted once, from its winning outcome.
pub(super) async fn race_all<T>(
    timeout: Duration,
    workloads: Vec<Workload<T>>,
) -> Vec<Completion<T>>
where
    T: Clone + Send + Sync + 'static,
{
    if workloads.is_empty() {
        return Vec::new();
    }
    if timeout.is_zero() {
        return settle::all(workloads, Tally::Counted).await;
    }

    let total = workloads.len();
    let (tx, mut rx) = mpsc::unbounded_channel();
    for (idx, workload) in workloads.into_iter().enumerate() {
        let tx = tx.clone();
        let contenders = vec![with_timeout(&workload, timeout), workload];
        tokio::spawn(
            async move {
                if let Some(winner) = first(contenders, Tally::Silent).await {
                    let _ = tx.send(Completion::new(idx, winner.outcome));
                }
            }
            .in_current_span(),
        );
    }
    drop(tx);

    let mut winners = Vec::with_capacity(total);
    while let Some(winner) = rx.recv().await {
        winners.push(winner);
        if winners.len() == total {
            break;
        }
    }

    let constants = in_submission_order(winners)
        .into_iter()
        .map(|w| {
            if let Some(failure) = w.outcome.failure() {
                count_failure(failure);
            }
            Workload::from_outcome(w.outcome)
        })
        .collect();
    settle::all(constants, Tally::Silent).await
}
