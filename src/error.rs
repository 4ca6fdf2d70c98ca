//! Error types for checkdesk.
//!
//! Business-rule outcomes (no work, ownership conflicts, timing rules) are
//! ordinary variants returned to the caller. Storage faults arrive as
//! [`Error::Store`], except lock and statement timeouts which are split out
//! as [`Error::Timeout`] so the request layer can offer a retry.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::OperatorId;
use crate::model::provider::SubRecordRef;
use crate::model::session::SessionId;

/// Postgres SQLSTATE for `statement_timeout` cancellation.
const QUERY_CANCELED: &str = "57014";
/// Postgres SQLSTATE for `lock_timeout` expiry.
const LOCK_NOT_AVAILABLE: &str = "55P03";

#[derive(Debug, Error)]
pub enum Error {
    #[error("no providers available for validation")]
    NoWorkAvailable,

    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    #[error("session {0} is already completed")]
    SessionClosed(SessionId),

    #[error("session {session} is held by operator {owner}")]
    SessionNotOwned {
        session: SessionId,
        owner: OperatorId,
    },

    #[error("invalid call attempt number {0} (expected 1 or 2)")]
    InvalidAttemptNumber(i64),

    #[error(
        "call attempt 2 must be at least one business day after attempt 1 \
         (attempt 1 at {first_attempt_at}, requested at {requested_at})"
    )]
    AttemptTooSoon {
        first_attempt_at: DateTime<Utc>,
        requested_at: DateTime<Utc>,
    },

    #[error("call attempt 1 cannot be re-recorded after attempt 2")]
    AttemptOutOfOrder,

    #[error("{remaining} address/phone record(s) must be validated before completing")]
    IncompleteValidation { remaining: i64 },

    #[error("{0} does not belong to this session's provider")]
    SubRecordNotFound(SubRecordRef),

    #[error("transaction timed out waiting on the store")]
    Timeout,

    #[error("store error: {0}")]
    Store(#[source] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for outcomes that are part of normal operation rather than faults.
    ///
    /// Callers use this to pick a log level; `NoWorkAvailable` in particular is
    /// the steady state once the backlog drains.
    pub fn is_expected(&self) -> bool {
        !matches!(
            self,
            Error::Store(_)
                | Error::Timeout
                | Error::Migration(_)
                | Error::Config(_)
                | Error::Other(_)
        )
    }

    /// Short stable label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Error::NoWorkAvailable => "no_work_available",
            Error::SessionNotFound(_) => "session_not_found",
            Error::SessionClosed(_) => "session_closed",
            Error::SessionNotOwned { .. } => "session_not_owned",
            Error::InvalidAttemptNumber(_) => "invalid_attempt_number",
            Error::AttemptTooSoon { .. } => "attempt_too_soon",
            Error::AttemptOutOfOrder => "attempt_out_of_order",
            Error::IncompleteValidation { .. } => "incomplete_validation",
            Error::SubRecordNotFound(_) => "sub_record_not_found",
            Error::Timeout => "timeout",
            Error::Store(_) => "store",
            Error::Migration(_) => "migration",
            Error::Config(_) => "config",
            Error::Other(_) => "other",
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        let timed_out = match &err {
            sqlx::Error::PoolTimedOut => true,
            sqlx::Error::Database(db) => matches!(
                db.code().as_deref(),
                Some(QUERY_CANCELED | LOCK_NOT_AVAILABLE)
            ),
            _ => false,
        };
        if timed_out {
            Error::Timeout
        } else {
            Error::Store(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
