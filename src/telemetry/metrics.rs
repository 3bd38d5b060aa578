//! Metric instrument factories for promise-rs.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"promise-rs"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("promise-rs")
}

/// Counter: combinator calls that returned.
/// Labels: `combinator`, `result` ("fulfilled" | "rejected" | "empty").
pub fn combinator_calls() -> Counter<u64> {
    meter()
        .u64_counter("promise.combinator.calls")
        .with_description("Number of combinator calls that returned")
        .build()
}

/// Counter: workload runs that ended in a failure.
/// Labels: `reason` ("rejected" | "timed_out" | "panicked").
pub fn workload_failures() -> Counter<u64> {
    meter()
        .u64_counter("promise.workload.failures")
        .with_description("Number of workload runs that failed")
        .build()
}

/// Counter: timeouts that fired and substituted the workload's fallback.
/// A timeout with no fallback is a `timed_out` workload failure instead.
pub fn timeout_fallbacks() -> Counter<u64> {
    meter()
        .u64_counter("promise.timeout.fallbacks")
        .with_description("Number of timeouts that substituted a fallback")
        .build()
}

/// Histogram: time from call to return, in milliseconds.
/// Labels: `combinator`.
pub fn combinator_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("promise.combinator.duration_ms")
        .with_description("Combinator call duration in milliseconds")
        .with_unit("ms")
        .build()
}
