//! Completion gate and its read-only preview.

use std::time::Instant;

use opentelemetry::KeyValue;
use tracing::{Instrument, Span, info};

use super::{
    Completion, CompletionPreview, Desk, ensure_open_and_owned, finish, lock_owned_session, scoring,
};
use crate::db;
use crate::error::{Error, Result};
use crate::event::EventKind;
use crate::model::OperatorId;
use crate::model::session::{SessionId, SessionStatus};
use crate::telemetry::metrics;
use crate::telemetry::session::{record_session, record_status_transition, start_desk_span};

impl Desk {
    /// Close the session once every address and phone has a verdict.
    ///
    /// Scores the session from its item count and time since the claim.
    /// Completed is terminal.
    pub async fn complete(&self, session: SessionId, operator: OperatorId) -> Result<Completion> {
        let span = start_desk_span("complete", operator);
        record_session(&span, session);
        let started = Instant::now();
        let result = self
            .try_complete(session, operator, &span)
            .instrument(span.clone())
            .await;
        finish("complete", &span, started, result)
    }

    async fn try_complete(
        &self,
        id: SessionId,
        operator: OperatorId,
        span: &Span,
    ) -> Result<Completion> {
        let mut tx = self.db.begin().await?;
        let session = lock_owned_session(&mut *tx, id, operator).await?;

        let counts = db::provider::counts(&mut *tx, session.provider_id).await?;
        if counts.unvalidated() > 0 {
            return Err(Error::IncompleteValidation {
                remaining: counts.unvalidated(),
            });
        }

        let now = self.clock.now();
        let elapsed = now - session.locked_at;
        let items = counts.total();
        let quality_score = scoring::score(&self.scoring, items, elapsed);

        if !db::session::mark_completed(&mut *tx, id, now, quality_score).await? {
            return Err(Error::SessionClosed(id));
        }
        db::event::record(
            &mut *tx,
            id,
            operator,
            now,
            &EventKind::SessionCompleted {
                quality_score,
                elapsed_secs: elapsed.num_seconds(),
                items_validated: items,
            },
        )
        .await?;
        tx.commit().await?;

        record_status_transition(span, SessionStatus::InProgress, SessionStatus::Completed);
        metrics::session_transitions().add(
            1,
            &[
                KeyValue::new("from", SessionStatus::InProgress.as_str()),
                KeyValue::new("to", SessionStatus::Completed.as_str()),
            ],
        );
        metrics::quality_score().record(quality_score, &[]);
        info!(
            session_id = id.0,
            provider_id = session.provider_id.0,
            items,
            quality_score,
            elapsed_secs = elapsed.num_seconds(),
            "session completed"
        );

        Ok(Completion {
            session_id: id,
            quality_score,
            completed_at: now,
            items_validated: items,
        })
    }

    /// What still blocks [`Desk::complete`], without taking any lock.
    pub async fn preview(
        &self,
        session: SessionId,
        operator: OperatorId,
    ) -> Result<CompletionPreview> {
        let span = start_desk_span("preview", operator);
        record_session(&span, session);
        let started = Instant::now();
        let result = self
            .try_preview(session, operator)
            .instrument(span.clone())
            .await;
        finish("preview", &span, started, result)
    }

    async fn try_preview(&self, id: SessionId, operator: OperatorId) -> Result<CompletionPreview> {
        let mut tx = self.db.begin().await?;
        let session = db::session::get(&mut *tx, id)
            .await?
            .ok_or(Error::SessionNotFound(id))?;
        ensure_open_and_owned(&session, operator)?;

        let addresses = db::provider::list_addresses(&mut *tx, session.provider_id).await?;
        let phones = db::provider::list_phones(&mut *tx, session.provider_id).await?;
        tx.commit().await?;

        let total_required = addresses.len() + phones.len();
        let unvalidated_addresses: Vec<_> = addresses
            .into_iter()
            .filter(|a| !a.validation.is_validated())
            .collect();
        let unvalidated_phones: Vec<_> = phones
            .into_iter()
            .filter(|p| !p.validation.is_validated())
            .collect();
        let remaining = unvalidated_addresses.len() + unvalidated_phones.len();

        Ok(CompletionPreview {
            can_complete: remaining == 0,
            total_required,
            total_validated: total_required - remaining,
            unvalidated_addresses,
            unvalidated_phones,
        })
    }
}
