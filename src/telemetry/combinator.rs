//! Combinator and workload span helpers.

use std::time::Instant;

use opentelemetry::KeyValue;
use tracing::Span;
use uuid::Uuid;

use super::metrics;

/// Start a span for one combinator call.
///
/// Each call gets a fresh `promise.call_id` so background workload logs can
/// be tied back to the call that spawned them. `promise.result` is declared
/// empty and filled in by [`record_settlement`].
pub fn start_combinator_span(combinator: &'static str, workloads: usize) -> Span {
    tracing::info_span!(
        "promise.combinator",
        "promise.combinator" = combinator,
        "promise.call_id" = %Uuid::new_v4(),
        "promise.workloads" = workloads,
        "promise.result" = tracing::field::Empty,
    )
}

/// Start a span for a single workload task. Parented to the current span.
pub fn start_workload_span(idx: usize) -> Span {
    tracing::debug_span!("promise.workload", "promise.idx" = idx)
}

/// Record how a combinator call ended: span field, metrics, and an `info` event.
pub fn record_settlement(
    span: &Span,
    combinator: &'static str,
    result: &'static str,
    started: Instant,
) {
    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
    span.record("promise.result", result);

    metrics::combinator_calls().add(
        1,
        &[
            KeyValue::new("combinator", combinator),
            KeyValue::new("result", result),
        ],
    );
    metrics::combinator_duration_ms()
        .record(duration_ms, &[KeyValue::new("combinator", combinator)]);

    span.in_scope(|| {
        tracing::info!(result, duration_ms, "combinator returned");
    });
}
