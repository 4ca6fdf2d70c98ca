//! Validation payloads submitted by operators.

use serde::{Deserialize, Serialize};

use super::provider::{AddressCorrection, AddressId, PhoneCorrection, PhoneId, non_blank};

/// An operator's verdict on one sub-record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "corrections", rename_all = "snake_case")]
pub enum Decision<C> {
    Correct,
    Incorrect(C),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDecision {
    pub id: AddressId,
    pub decision: Decision<AddressCorrection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneDecision {
    pub id: PhoneId,
    pub decision: Decision<PhoneCorrection>,
}

/// Address the bulk load missed, added during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAddress {
    pub category: String,
    pub address1: String,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
}

/// Phone the bulk load missed, added during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPhone {
    pub number: String,
    #[serde(default = "default_phone_type")]
    pub phone_type: String,
    #[serde(default)]
    pub extension: Option<String>,
}

fn default_phone_type() -> String {
    "office".to_string()
}

/// A batch of validation edits applied atomically to one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationUpdate {
    #[serde(default)]
    pub addresses: Vec<AddressDecision>,
    #[serde(default)]
    pub phones: Vec<PhoneDecision>,
    #[serde(default)]
    pub new_addresses: Vec<NewAddress>,
    #[serde(default)]
    pub new_phones: Vec<NewPhone>,
}

impl ValidationUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(mut self, id: AddressId, decision: Decision<AddressCorrection>) -> Self {
        self.addresses.push(AddressDecision { id, decision });
        self
    }

    pub fn phone(mut self, id: PhoneId, decision: Decision<PhoneCorrection>) -> Self {
        self.phones.push(PhoneDecision { id, decision });
        self
    }

    pub fn add_address(mut self, address: NewAddress) -> Self {
        self.new_addresses.push(address);
        self
    }

    pub fn add_phone(mut self, phone: NewPhone) -> Self {
        self.new_phones.push(phone);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
            && self.phones.is_empty()
            && self.new_addresses.is_empty()
            && self.new_phones.is_empty()
    }

    /// Blank strings from the request layer become `None` throughout.
    pub fn normalized(self) -> Self {
        Self {
            addresses: self
                .addresses
                .into_iter()
                .map(|d| AddressDecision {
                    id: d.id,
                    decision: match d.decision {
                        Decision::Correct => Decision::Correct,
                        Decision::Incorrect(c) => Decision::Incorrect(c.normalized()),
                    },
                })
                .collect(),
            phones: self
                .phones
                .into_iter()
                .map(|d| PhoneDecision {
                    id: d.id,
                    decision: match d.decision {
                        Decision::Correct => Decision::Correct,
                        Decision::Incorrect(c) => Decision::Incorrect(c.normalized()),
                    },
                })
                .collect(),
            new_addresses: self
                .new_addresses
                .into_iter()
                .map(|a| NewAddress {
                    address2: non_blank(a.address2),
                    city: non_blank(a.city),
                    state: non_blank(a.state),
                    zip: non_blank(a.zip),
                    ..a
                })
                .collect(),
            new_phones: self
                .new_phones
                .into_iter()
                .map(|p| NewPhone {
                    extension: non_blank(p.extension),
                    ..p
                })
                .collect(),
        }
    }
}
