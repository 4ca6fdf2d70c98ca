//! Desk counters and session history.

use std::time::Instant;

use chrono::NaiveTime;
use tracing::Instrument;

use super::{Desk, DeskStats, finish};
use crate::db;
use crate::error::{Error, Result};
use crate::event::SessionEvent;
use crate::model::OperatorId;
use crate::model::session::SessionId;
use crate::telemetry::session::start_desk_span;

impl Desk {
    pub async fn stats(&self, operator: OperatorId) -> Result<DeskStats> {
        let span = start_desk_span("stats", operator);
        let started = Instant::now();
        let result = self.try_stats(operator).instrument(span.clone()).await;
        finish("stats", &span, started, result)
    }

    async fn try_stats(&self, operator: OperatorId) -> Result<DeskStats> {
        let midnight = self
            .clock
            .now()
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc();

        let mut tx = self.db.begin().await?;
        let pending_providers = db::provider::count_assignable(&mut *tx).await?;
        let completed_today = db::session::count_completed_since(&mut *tx, operator, midnight).await?;
        let in_progress = db::session::count_open_for_operator(&mut *tx, operator).await?;
        tx.commit().await?;

        Ok(DeskStats {
            pending_providers,
            completed_today,
            in_progress,
        })
    }

    /// Every recorded change to a session, oldest first.
    pub async fn history(&self, session: SessionId) -> Result<Vec<SessionEvent>> {
        let span = tracing::info_span!(
            "desk.operation",
            "desk.operation" = "history",
            "session.id" = session.0,
        );
        let started = Instant::now();
        let result = self.try_history(session).instrument(span.clone()).await;
        finish("history", &span, started, result)
    }

    async fn try_history(&self, id: SessionId) -> Result<Vec<SessionEvent>> {
        let mut tx = self.db.begin().await?;
        if db::session::get(&mut *tx, id).await?.is_none() {
            return Err(Error::SessionNotFound(id));
        }
        let events = db::event::list_for_session(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(events)
    }
}
