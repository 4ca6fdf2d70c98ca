//! Core data model.
//!
//! A provider is a unit of verification work. It owns address and phone
//! sub-records, each validated independently. A session is one operator's
//! exclusive claim on one provider while that validation happens.

pub mod provider;
pub mod session;
pub mod validation;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

/// Verified principal id handed in by the request layer.
///
/// The core never authenticates; it only compares and records this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorId(pub i64);

impl std::fmt::Display for OperatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for OperatorId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}
