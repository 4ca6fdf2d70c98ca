//! Session history persistence.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::error::{Error, Result};
use crate::event::{EventKind, SessionEvent};
use crate::model::OperatorId;
use crate::model::session::SessionId;

/// Append an event inside the caller's transaction.
pub async fn record(
    conn: &mut PgConnection,
    session: SessionId,
    operator: OperatorId,
    at: DateTime<Utc>,
    kind: &EventKind,
) -> Result<SessionEvent> {
    let payload = serde_json::to_value(kind)
        .map_err(|e| Error::Other(format!("cannot encode {} event: {e}", kind.name())))?;

    let (seq,): (i64,) = sqlx::query_as(
        "INSERT INTO session_events (session_id, operator_id, occurred_at, kind)
         VALUES ($1, $2, $3, $4)
         RETURNING seq",
    )
    .bind(session.0)
    .bind(operator.0)
    .bind(at)
    .bind(&payload)
    .fetch_one(&mut *conn)
    .await?;

    Ok(SessionEvent {
        seq,
        session_id: session,
        operator_id: operator,
        occurred_at: at,
        kind: kind.clone(),
    })
}

/// All events for a session, oldest first.
pub async fn list_for_session(
    conn: &mut PgConnection,
    session: SessionId,
) -> Result<Vec<SessionEvent>> {
    let rows: Vec<EventRow> = sqlx::query_as(
        "SELECT seq, session_id, operator_id, occurred_at, kind
         FROM session_events
         WHERE session_id = $1
         ORDER BY seq",
    )
    .bind(session.0)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(SessionEvent::from).collect())
}

#[derive(sqlx::FromRow)]
struct EventRow {
    seq: i64,
    session_id: i64,
    operator_id: i64,
    occurred_at: DateTime<Utc>,
    kind: serde_json::Value,
}

impl From<EventRow> for SessionEvent {
    fn from(row: EventRow) -> Self {
        Self {
            seq: row.seq,
            session_id: SessionId(row.session_id),
            operator_id: OperatorId(row.operator_id),
            occurred_at: row.occurred_at,
            kind: EventKind::decode(row.kind),
        }
    }
}
