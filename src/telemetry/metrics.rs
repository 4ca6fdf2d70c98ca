//! Metric instrument factories for checkdesk.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"checkdesk"` meter.

use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Returns the shared meter for checkdesk instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("checkdesk")
}

/// Counter: assignment requests.
/// Labels: `result` ("new" | "resumed" | "empty").
pub fn assignments() -> Counter<u64> {
    meter()
        .u64_counter("checkdesk.assignments")
        .with_description("Number of assignment requests by outcome")
        .build()
}

/// Counter: sub-record validations written.
/// Labels: `kind` ("address" | "phone" | "new_address" | "new_phone").
pub fn validations() -> Counter<u64> {
    meter()
        .u64_counter("checkdesk.validations")
        .with_description("Number of address/phone validations recorded")
        .build()
}

/// Counter: call attempts.
/// Labels: `attempt` ("1" | "2"), `result` ("ok" | error label).
pub fn call_attempts() -> Counter<u64> {
    meter()
        .u64_counter("checkdesk.call_attempts")
        .with_description("Number of call attempts recorded or rejected")
        .build()
}

/// Counter: session status transitions.
/// Labels: `from`, `to`.
pub fn session_transitions() -> Counter<u64> {
    meter()
        .u64_counter("checkdesk.session.transitions")
        .with_description("Number of session status transitions")
        .build()
}

/// Counter: failed desk operations.
/// Labels: `operation`, `error`.
pub fn operation_failures() -> Counter<u64> {
    meter()
        .u64_counter("checkdesk.operation.failures")
        .with_description("Number of desk operations that returned an error")
        .build()
}

/// Histogram: quality score assigned at completion.
pub fn quality_score() -> Histogram<f64> {
    meter()
        .f64_histogram("checkdesk.session.quality_score")
        .with_description("Quality score of completed sessions")
        .build()
}

/// Histogram: operation duration in milliseconds.
/// Labels: `operation`.
pub fn operation_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("checkdesk.operation.duration_ms")
        .with_description("Operation duration in milliseconds")
        .with_unit("ms")
        .build()
}
