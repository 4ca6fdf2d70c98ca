//! The verification desk: assignment, validation, call tracking, completion.
//!
//! [`Desk`] is the only entry point. Each operation opens one transaction on
//! the injected [`Db`], takes whatever row locks it needs, and either commits
//! every effect together or drops the transaction and rolls everything back.

mod assign;
pub mod calendar;
mod calls;
mod complete;
pub mod linkage;
pub mod scoring;
mod stats;
mod validate;

pub use assign::MAX_CLAIM_ROUNDS;
pub use linkage::LinkedPair;

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use opentelemetry::KeyValue;
use serde::Serialize;
use sqlx::PgConnection;
use tracing::Span;

use crate::clock::{Clock, SystemClock};
use crate::config::ScoringConfig;
use crate::db::{self, Db};
use crate::error::{Error, Result};
use crate::ids::{IdGenerator, RandomIds};
use crate::model::OperatorId;
use crate::model::provider::{Address, Phone, Provider};
use crate::model::session::{Session, SessionId};
use crate::telemetry::metrics;

/// Engine handle. Cheap to clone; clones share the pool and collaborators.
#[derive(Debug, Clone)]
pub struct Desk {
    db: Arc<Db>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    scoring: ScoringConfig,
}

impl Desk {
    /// Desk on the wall clock with random UUIDs and default scoring.
    pub fn new(db: Arc<Db>) -> Self {
        Self {
            db,
            clock: Arc::new(SystemClock),
            ids: Arc::new(RandomIds),
            scoring: ScoringConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringConfig) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn db(&self) -> &Db {
        &self.db
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// What an operator receives from [`Desk::assign`].
#[derive(Debug, Clone, Serialize)]
pub struct Assignment {
    pub provider: Provider,
    pub session: Session,
    pub addresses: Vec<Address>,
    pub phones: Vec<Phone>,
    /// Addresses with the phone captured alongside each, if any.
    pub pairs: Vec<LinkedPair>,
    /// True when the operator already held this session.
    pub resumed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Completion {
    pub session_id: SessionId,
    pub quality_score: f64,
    pub completed_at: DateTime<Utc>,
    pub items_validated: i64,
}

/// Read-only view of what still blocks completion.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionPreview {
    pub can_complete: bool,
    pub total_required: usize,
    pub total_validated: usize,
    pub unvalidated_addresses: Vec<Address>,
    pub unvalidated_phones: Vec<Phone>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeskStats {
    /// Providers an assignment could hand out right now.
    pub pending_providers: i64,
    /// The operator's sessions completed since UTC midnight.
    pub completed_today: i64,
    /// The operator's open sessions (0 or 1).
    pub in_progress: i64,
}

// ---------------------------------------------------------------------------
// Shared checks
// ---------------------------------------------------------------------------

/// Lock a session row and verify the operator may still act on it.
///
/// Closed sessions are reported before ownership, so a completed session is
/// `SessionClosed` to everyone.
async fn lock_owned_session(
    conn: &mut PgConnection,
    id: SessionId,
    operator: OperatorId,
) -> Result<Session> {
    let session = db::session::lock(conn, id)
        .await?
        .ok_or(Error::SessionNotFound(id))?;
    ensure_open_and_owned(&session, operator)?;
    Ok(session)
}

fn ensure_open_and_owned(session: &Session, operator: OperatorId) -> Result<()> {
    if !session.is_open() {
        return Err(Error::SessionClosed(session.id));
    }
    if session.operator_id != operator {
        return Err(Error::SessionNotOwned {
            session: session.id,
            owner: session.operator_id,
        });
    }
    Ok(())
}

/// Record duration and failure metrics for one operation, logging any error
/// at a level matching its kind.
fn finish<T>(
    operation: &'static str,
    span: &Span,
    started: Instant,
    result: Result<T>,
) -> Result<T> {
    let labels = [KeyValue::new("operation", operation)];
    metrics::operation_duration_ms().record(started.elapsed().as_secs_f64() * 1000.0, &labels);

    if let Err(ref e) = result {
        metrics::operation_failures().add(
            1,
            &[
                KeyValue::new("operation", operation),
                KeyValue::new("error", e.label()),
            ],
        );
        span.in_scope(|| {
            if e.is_expected() {
                tracing::debug!(error = %e, "{operation} rejected");
            } else {
                tracing::error!(error = %e, "{operation} failed");
            }
        });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::provider::ProviderId;
    use crate::model::session::SessionStatus;
    use uuid::Uuid;

    fn session(operator: i64, status: SessionStatus) -> Session {
        Session {
            id: SessionId(10),
            uuid: Uuid::nil(),
            provider_id: ProviderId(1),
            operator_id: OperatorId(operator),
            status,
            locked_at: Utc::now(),
            call_attempt_1_at: None,
            call_attempt_2_at: None,
            completed_at: None,
            quality_score: None,
        }
    }

    #[test]
    fn owner_of_open_session_passes() {
        assert!(ensure_open_and_owned(&session(1, SessionStatus::InProgress), OperatorId(1)).is_ok());
    }

    #[test]
    fn other_operator_is_not_owner() {
        let err = ensure_open_and_owned(&session(1, SessionStatus::InProgress), OperatorId(2))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::SessionNotOwned { owner: OperatorId(1), .. }
        ));
    }

    #[test]
    fn closed_is_reported_before_ownership() {
        let err = ensure_open_and_owned(&session(1, SessionStatus::Completed), OperatorId(2))
            .unwrap_err();
        assert!(matches!(err, Error::SessionClosed(SessionId(10))));
    }
}
