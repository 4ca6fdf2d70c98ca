//! Validation sessions: one operator's exclusive claim on one provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OperatorId;
use super::provider::ProviderId;
use crate::error::{Error, Result};

/// Newtype for session ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub i64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,

    /// Externally visible identifier.
    pub uuid: Uuid,

    pub provider_id: ProviderId,
    pub operator_id: OperatorId,
    pub status: SessionStatus,

    /// When the operator claimed the provider.
    pub locked_at: DateTime<Utc>,

    pub call_attempt_1_at: Option<DateTime<Utc>>,
    pub call_attempt_2_at: Option<DateTime<Utc>>,

    pub completed_at: Option<DateTime<Utc>>,

    /// Set once, at completion.
    pub quality_score: Option<f64>,
}

impl Session {
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn call_attempt_at(&self, attempt: CallAttempt) -> Option<DateTime<Utc>> {
        match attempt {
            CallAttempt::First => self.call_attempt_1_at,
            CallAttempt::Second => self.call_attempt_2_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Claimed and being worked.
    InProgress,
    /// All sub-records validated and scored. Terminal.
    Completed,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        self == SessionStatus::Completed
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "in_progress" => Ok(SessionStatus::InProgress),
            "completed" => Ok(SessionStatus::Completed),
            _ => Err(Error::Other(format!("unknown session status: {s}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Call attempts
// ---------------------------------------------------------------------------

/// Which of the two permitted contact attempts is being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallAttempt {
    First,
    Second,
}

impl CallAttempt {
    pub fn number(self) -> u8 {
        match self {
            CallAttempt::First => 1,
            CallAttempt::Second => 2,
        }
    }
}

impl TryFrom<i64> for CallAttempt {
    type Error = Error;

    fn try_from(n: i64) -> Result<Self> {
        match n {
            1 => Ok(CallAttempt::First),
            2 => Ok(CallAttempt::Second),
            other => Err(Error::InvalidAttemptNumber(other)),
        }
    }
}

impl std::fmt::Display for CallAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}
