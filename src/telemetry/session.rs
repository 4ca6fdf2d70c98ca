//! Desk operation span helpers.
//!
//! Every engine operation runs inside a span carrying the operator and, once
//! known, the session it touched.

use tracing::Span;

use crate::model::OperatorId;
use crate::model::session::{SessionId, SessionStatus};

/// Start a span for one desk operation.
///
/// The `session.id` field is declared empty and filled by [`record_session`]
/// once the operation has resolved which session it acts on.
pub fn start_desk_span(operation: &'static str, operator: OperatorId) -> Span {
    tracing::info_span!(
        "desk.operation",
        "desk.operation" = operation,
        "operator.id" = operator.0,
        "session.id" = tracing::field::Empty,
    )
}

pub fn record_session(span: &Span, session: SessionId) {
    span.record("session.id", session.0);
}

/// Record a session status transition event on the given span.
pub fn record_status_transition(span: &Span, from: SessionStatus, to: SessionStatus) {
    span.in_scope(|| {
        tracing::info!(from = from.as_str(), to = to.as_str(), "status_transition");
    });
}
