//! First-N-successes combinators: `any` and `some`.

use tracing::{info, warn};

use super::fanout::{Tally, fan_out, in_submission_order};
use crate::error::Failure;
use crate::model::{Completion, Workload};

/// The first success alone, or every failure when nothing succeeds.
pub(super) async fn any<T: Send + 'static>(workloads: Vec<Workload<T>>) -> Vec<Completion<T>> {
    if workloads.is_empty() {
        return Vec::new();
    }
    some(workloads, 1).await
}

/// The first `count` successes in submission order.
///
/// Once every workload has completed without reaching `count` successes,
/// returns all failures in submission order instead.
pub(super) async fn some<T: Send + 'static>(
    workloads: Vec<Workload<T>>,
    count: usize,
) -> Vec<Completion<T>> {
    let total = workloads.len();
    if count > total {
        warn!(count, total, "count exceeds the number of workloads");
        return vec![Completion::failure(0, Failure::Range { count, len: total })];
    }
    if count == 0 {
        return Vec::new();
    }

    let mut rx = fan_out(workloads, Tally::Counted);
    let mut fulfilled = Vec::with_capacity(count);
    let mut rejected = Vec::new();
    while let Some(completion) = rx.recv().await {
        if completion.is_success() {
            fulfilled.push(completion);
            if fulfilled.len() == count {
                return in_submission_order(fulfilled);
            }
        } else {
            rejected.push(completion);
        }

        if fulfilled.len() + rejected.len() == total {
            info!(
                fulfilled = fulfilled.len(),
                rejected = rejected.len(),
                count,
                "too few successes, rejecting"
            );
            break;
        }
    }
    in_submission_order(rejected)
}
