//! Validation session queries.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::Result;
use crate::model::OperatorId;
use crate::model::provider::ProviderId;
use crate::model::session::{CallAttempt, Session, SessionId};

const SESSION_COLUMNS: &str = "id, uuid, provider_id, operator_id, status, locked_at, \
     call_attempt_1_at, call_attempt_2_at, completed_at, quality_score";

/// The operator's most recently claimed open session, if any.
pub async fn find_open_for_operator(
    conn: &mut PgConnection,
    operator: OperatorId,
) -> Result<Option<Session>> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM validation_sessions
         WHERE operator_id = $1 AND status = 'in_progress'
         ORDER BY locked_at DESC
         LIMIT 1"
    );
    let row: Option<SessionRow> = sqlx::query_as(&sql)
        .bind(operator.0)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(SessionRow::try_into_session).transpose()
}

/// Open a session unless the provider or operator already has one.
///
/// Returns `None` when either partial unique index absorbed the insert.
pub async fn insert_if_free(
    conn: &mut PgConnection,
    uuid: Uuid,
    provider: ProviderId,
    operator: OperatorId,
    now: DateTime<Utc>,
) -> Result<Option<Session>> {
    let sql = format!(
        "INSERT INTO validation_sessions
            (uuid, provider_id, operator_id, status, locked_at, created_at, updated_at)
         VALUES ($1, $2, $3, 'in_progress', $4, $4, $4)
         ON CONFLICT DO NOTHING
         RETURNING {SESSION_COLUMNS}"
    );
    let row: Option<SessionRow> = sqlx::query_as(&sql)
        .bind(uuid)
        .bind(provider.0)
        .bind(operator.0)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(SessionRow::try_into_session).transpose()
}

/// Read a session and hold its row lock until the transaction ends.
pub async fn lock(conn: &mut PgConnection, id: SessionId) -> Result<Option<Session>> {
    let sql = format!("SELECT {SESSION_COLUMNS} FROM validation_sessions WHERE id = $1 FOR UPDATE");
    let row: Option<SessionRow> = sqlx::query_as(&sql)
        .bind(id.0)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(SessionRow::try_into_session).transpose()
}

pub async fn get(conn: &mut PgConnection, id: SessionId) -> Result<Option<Session>> {
    let sql = format!("SELECT {SESSION_COLUMNS} FROM validation_sessions WHERE id = $1");
    let row: Option<SessionRow> = sqlx::query_as(&sql)
        .bind(id.0)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(SessionRow::try_into_session).transpose()
}

/// Stamp a call attempt, overwriting any earlier stamp for the same attempt.
pub async fn stamp_call_attempt(
    conn: &mut PgConnection,
    id: SessionId,
    attempt: CallAttempt,
    at: DateTime<Utc>,
) -> Result<()> {
    let sql = match attempt {
        CallAttempt::First => {
            "UPDATE validation_sessions SET call_attempt_1_at = $1, updated_at = $1 WHERE id = $2"
        }
        CallAttempt::Second => {
            "UPDATE validation_sessions SET call_attempt_2_at = $1, updated_at = $1 WHERE id = $2"
        }
    };
    sqlx::query(sql)
        .bind(at)
        .bind(id.0)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Move an open session to completed. Returns `false` if it was not open.
pub async fn mark_completed(
    conn: &mut PgConnection,
    id: SessionId,
    at: DateTime<Utc>,
    quality_score: f64,
) -> Result<bool> {
    let rows_affected = sqlx::query(
        "UPDATE validation_sessions
         SET status = 'completed', completed_at = $1, quality_score = $2, updated_at = $1
         WHERE id = $3 AND status = 'in_progress'",
    )
    .bind(at)
    .bind(quality_score)
    .bind(id.0)
    .execute(&mut *conn)
    .await?
    .rows_affected();
    Ok(rows_affected > 0)
}

/// Sessions the operator completed at or after `since`.
pub async fn count_completed_since(
    conn: &mut PgConnection,
    operator: OperatorId,
    since: DateTime<Utc>,
) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM validation_sessions
         WHERE operator_id = $1 AND status = 'completed' AND completed_at >= $2",
    )
    .bind(operator.0)
    .bind(since)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count)
}

pub async fn count_open_for_operator(conn: &mut PgConnection, operator: OperatorId) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM validation_sessions
         WHERE operator_id = $1 AND status = 'in_progress'",
    )
    .bind(operator.0)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count)
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: i64,
    uuid: Uuid,
    provider_id: i64,
    operator_id: i64,
    status: String,
    locked_at: DateTime<Utc>,
    call_attempt_1_at: Option<DateTime<Utc>>,
    call_attempt_2_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    quality_score: Option<f64>,
}

impl SessionRow {
    fn try_into_session(self) -> Result<Session> {
        Ok(Session {
            id: SessionId(self.id),
            uuid: self.uuid,
            provider_id: ProviderId(self.provider_id),
            operator_id: OperatorId(self.operator_id),
            status: self.status.parse()?,
            locked_at: self.locked_at,
            call_attempt_1_at: self.call_attempt_1_at,
            call_attempt_2_at: self.call_attempt_2_at,
            completed_at: self.completed_at,
            quality_score: self.quality_score,
        })
    }
}
