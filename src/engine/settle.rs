//! Wait-for-everything combinators: `all_settled` and `all`.

use tracing::info;

use super::fanout::{Tally, fan_out, in_submission_order};
use crate::model::{Completion, Workload};

/// Every completion, success or failure, in submission order.
pub(super) async fn all_settled<T: Send + 'static>(
    workloads: Vec<Workload<T>>,
    tally: Tally,
) -> Vec<Completion<T>> {
    let total = workloads.len();
    if total == 0 {
        return Vec::new();
    }

    let mut rx = fan_out(workloads, tally);
    let mut settled = Vec::with_capacity(total);
    while let Some(completion) = rx.recv().await {
        settled.push(completion);
        if settled.len() == total {
            break;
        }
    }
    in_submission_order(settled)
}

/// All successes in submission order, or the first failure to arrive alone.
pub(super) async fn all<T: Send + 'static>(
    workloads: Vec<Workload<T>>,
    tally: Tally,
) -> Vec<Completion<T>> {
    let total = workloads.len();
    if total == 0 {
        return Vec::new();
    }

    let mut rx = fan_out(workloads, tally);
    let mut fulfilled = Vec::with_capacity(total);
    while let Some(completion) = rx.recv().await {
        if completion.outcome.is_failure() {
            info!(
                idx = completion.idx,
                pending = total - fulfilled.len() - 1,
                "rejecting on first failure"
            );
            return vec![completion];
        }
        fulfilled.push(completion);
        if fulfilled.len() == total {
            break;
        }
    }
    in_submission_order(fulfilled)
}
