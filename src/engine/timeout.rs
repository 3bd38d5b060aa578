//! Timeout-with-fallback adapter.

use std::time::Duration;

use tracing::warn;

use super::fanout::settle;
use crate::error::Failure;
use crate::model::{Outcome, Workload};
use crate::telemetry::metrics;

/// Wrap `workload` so each run gives up after `timeout`.
///
/// The wrapped command runs on a background task raced against a timer.
/// If the timer wins, the run yields the workload's fallback value, or
/// [`Failure::TimedOut`] when it has none. The background task is not
/// cancelled; its eventual outcome is dropped.
///
/// The returned workload carries no fallback of its own.
pub fn with_timeout<T>(workload: &Workload<T>, timeout: Duration) -> Workload<T>
where
    T: Clone + Send + Sync + 'static,
{
    let inner = workload.clone();
    Workload::new(move || {
        let inner = inner.clone();
        async move {
            let fallback = inner.fallback().cloned();
            let mut task = tokio::spawn(settle(inner));
            tokio::select! {
                joined = &mut task => match joined {
                    Ok(outcome) => outcome,
                    Err(e) => Outcome::Failure(Failure::from(e)),
                },
                _ = tokio::time::sleep(timeout) => {
                    match fallback {
                        Some(fallback) => {
                            metrics::timeout_fallbacks().add(1, &[]);
                            warn!(?timeout, "workload timed out, using fallback");
                            Outcome::Success(fallback)
                        }
                        None => {
                            warn!(?timeout, "workload timed out with no fallback");
                            Outcome::Failure(Failure::TimedOut { after: timeout })
                        }
                    }
                }
            }
        }
    })
}
