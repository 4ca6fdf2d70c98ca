//! Durable session history.
//!
//! Every state change the desk makes writes one event in the same
//! transaction, so the history never disagrees with the rows it describes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::OperatorId;
use crate::model::provider::ProviderId;
use crate::model::session::{CallAttempt, SessionId};

/// One recorded change to a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Store-assigned, increasing.
    pub seq: i64,
    pub session_id: SessionId,
    /// Operator who caused the change.
    pub operator_id: OperatorId,
    pub occurred_at: DateTime<Utc>,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    SessionOpened {
        provider_id: ProviderId,
    },
    ValidationRecorded {
        addresses: usize,
        phones: usize,
        new_addresses: usize,
        new_phones: usize,
    },
    CallAttemptRecorded {
        attempt: CallAttempt,
    },
    SessionCompleted {
        quality_score: f64,
        elapsed_secs: i64,
        items_validated: i64,
    },
    /// A stored kind this build does not recognize. Never written.
    #[serde(skip)]
    Unknown { raw: String },
}

impl EventKind {
    /// Decode a stored kind, keeping unrecognized payloads instead of failing.
    pub fn decode(value: serde_json::Value) -> Self {
        match serde_json::from_value(value.clone()) {
            Ok(kind) => kind,
            Err(_) => EventKind::Unknown {
                raw: value.to_string(),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::SessionOpened { .. } => "session_opened",
            EventKind::ValidationRecorded { .. } => "validation_recorded",
            EventKind::CallAttemptRecorded { .. } => "call_attempt_recorded",
            EventKind::SessionCompleted { .. } => "session_completed",
            EventKind::Unknown { .. } => "unknown",
        }
    }
}
