//! Contact attempts and the business-day spacing rule.

use std::time::Instant;

use opentelemetry::KeyValue;
use tracing::{Instrument, info};

use super::{Desk, calendar, finish, lock_owned_session};
use crate::db;
use crate::error::{Error, Result};
use crate::event::EventKind;
use crate::model::OperatorId;
use crate::model::session::{CallAttempt, SessionId};
use crate::telemetry::metrics;
use crate::telemetry::session::{record_session, start_desk_span};

impl Desk {
    /// Stamp call attempt 1 or 2 with the current time.
    ///
    /// Attempt 2 must come at least one business day after attempt 1.
    /// Re-recording an attempt overwrites its timestamp, except that attempt 1
    /// cannot move once attempt 2 is stamped.
    pub async fn record_call_attempt(
        &self,
        session: SessionId,
        operator: OperatorId,
        attempt_number: i64,
    ) -> Result<()> {
        let span = start_desk_span("record_call_attempt", operator);
        record_session(&span, session);
        let started = Instant::now();
        let result = self
            .try_record_call_attempt(session, operator, attempt_number)
            .instrument(span.clone())
            .await;

        let outcome = match &result {
            Ok(()) => "ok",
            Err(e) => e.label(),
        };
        metrics::call_attempts().add(
            1,
            &[
                KeyValue::new("attempt", attempt_number.to_string()),
                KeyValue::new("result", outcome),
            ],
        );
        finish("record_call_attempt", &span, started, result)
    }

    async fn try_record_call_attempt(
        &self,
        id: SessionId,
        operator: OperatorId,
        attempt_number: i64,
    ) -> Result<()> {
        let attempt = CallAttempt::try_from(attempt_number)?;

        let mut tx = self.db.begin().await?;
        let session = lock_owned_session(&mut *tx, id, operator).await?;
        let now = self.clock.now();

        match attempt {
            CallAttempt::First => {
                if session.call_attempt_at(CallAttempt::Second).is_some() {
                    return Err(Error::AttemptOutOfOrder);
                }
            }
            CallAttempt::Second => {
                if let Some(first) = session.call_attempt_at(CallAttempt::First) {
                    if !calendar::has_elapsed_business_day(first, now) {
                        return Err(Error::AttemptTooSoon {
                            first_attempt_at: first,
                            requested_at: now,
                        });
                    }
                }
            }
        }

        db::session::stamp_call_attempt(&mut *tx, id, attempt, now).await?;
        db::event::record(
            &mut *tx,
            id,
            operator,
            now,
            &EventKind::CallAttemptRecorded { attempt },
        )
        .await?;
        tx.commit().await?;

        info!(session_id = id.0, attempt = attempt.number(), at = %now, "call attempt recorded");
        Ok(())
    }
}
