//! Providers and their address/phone sub-records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OperatorId;
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneId(pub i64);

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for AddressId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for PhoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Names one sub-record of either kind, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SubRecordRef {
    Address(AddressId),
    Phone(PhoneId),
}

impl std::fmt::Display for SubRecordRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubRecordRef::Address(id) => write!(f, "address {id}"),
            SubRecordRef::Phone(id) => write!(f, "phone {id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// A provider record awaiting manual verification. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub uuid: Uuid,

    /// National Provider Identifier, the stable natural key.
    pub npi: String,
    pub gnpi: Option<String>,
    pub name: String,
    pub specialty: Option<String>,
    pub group: Option<String>,

    /// Administrative metadata from the bulk load. Opaque to the engine.
    pub metadata: serde_json::Value,

    /// Inactive providers are never assigned.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Validation state
// ---------------------------------------------------------------------------

/// Who validated a sub-record, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub by: OperatorId,
    pub at: DateTime<Utc>,
}

/// Validation state of one sub-record.
///
/// Corrections exist only on `Incorrect`, and an attestation exists exactly
/// when the record has been validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Validation<C> {
    Unvalidated,
    Correct {
        attestation: Attestation,
    },
    Incorrect {
        attestation: Attestation,
        corrections: C,
    },
}

impl<C> Validation<C> {
    /// Rebuild the enum from the nullable column quadruple stored in Postgres.
    ///
    /// `corrections` is only consulted when `is_correct` is `Some(false)`.
    pub fn from_columns(
        is_correct: Option<bool>,
        validated_by: Option<i64>,
        validated_at: Option<DateTime<Utc>>,
        corrections: C,
    ) -> Result<Self> {
        match (is_correct, validated_by, validated_at) {
            (None, None, None) => Ok(Validation::Unvalidated),
            (Some(correct), Some(by), Some(at)) => {
                let attestation = Attestation {
                    by: OperatorId(by),
                    at,
                };
                Ok(if correct {
                    Validation::Correct { attestation }
                } else {
                    Validation::Incorrect {
                        attestation,
                        corrections,
                    }
                })
            }
            (is_correct, by, at) => Err(Error::Other(format!(
                "inconsistent validation columns: is_correct={is_correct:?} validated_by={by:?} validated_at={at:?}"
            ))),
        }
    }

    pub fn is_validated(&self) -> bool {
        !matches!(self, Validation::Unvalidated)
    }

    /// `None` while unvalidated, otherwise whether the record was confirmed.
    pub fn is_correct(&self) -> Option<bool> {
        match self {
            Validation::Unvalidated => None,
            Validation::Correct { .. } => Some(true),
            Validation::Incorrect { .. } => Some(false),
        }
    }

    pub fn attestation(&self) -> Option<&Attestation> {
        match self {
            Validation::Unvalidated => None,
            Validation::Correct { attestation } | Validation::Incorrect { attestation, .. } => {
                Some(attestation)
            }
        }
    }

    pub fn corrections(&self) -> Option<&C> {
        match self {
            Validation::Incorrect { corrections, .. } => Some(corrections),
            _ => None,
        }
    }
}

/// Replacement values an operator supplied for an incorrect address.
///
/// Omitted fields stay empty; they are never filled from the original.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressCorrection {
    #[serde(default)]
    pub address1: Option<String>,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
}

impl AddressCorrection {
    /// Treat blank strings from the request layer as "not supplied".
    pub fn normalized(self) -> Self {
        Self {
            address1: non_blank(self.address1),
            address2: non_blank(self.address2),
            city: non_blank(self.city),
            state: non_blank(self.state),
            zip: non_blank(self.zip),
        }
    }
}

/// Replacement value an operator supplied for an incorrect phone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneCorrection {
    #[serde(default)]
    pub number: Option<String>,
}

impl PhoneCorrection {
    pub fn normalized(self) -> Self {
        Self {
            number: non_blank(self.number),
        }
    }
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Sub-records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub uuid: Uuid,
    pub provider_id: ProviderId,

    /// e.g. "Primary", "Billing".
    pub category: String,
    pub address1: String,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: String,

    /// Groups this address with the phone captured alongside it at load time.
    pub link_key: Option<String>,

    pub validation: Validation<AddressCorrection>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phone {
    pub id: PhoneId,
    pub uuid: Uuid,
    pub provider_id: ProviderId,
    pub number: String,
    pub phone_type: String,
    pub extension: Option<String>,
    pub link_key: Option<String>,
    pub validation: Validation<PhoneCorrection>,
    pub created_at: DateTime<Utc>,
}
