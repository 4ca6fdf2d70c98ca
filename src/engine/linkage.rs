//! Address/phone pairing by load-time link key.

use serde::Serialize;

use crate::model::provider::{Address, Phone};

/// An address and the phone that was captured alongside it, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedPair {
    pub address: Address,
    pub phone: Option<Phone>,
}

/// Pair each address with the first phone sharing its link key.
///
/// One pair per address, in address order. Addresses without a key, or whose
/// key no phone carries, get `None`. Phones that pair with nothing are left
/// out; there is no positional fallback.
pub fn pair(addresses: &[Address], phones: &[Phone]) -> Vec<LinkedPair> {
    addresses
        .iter()
        .map(|address| {
            let phone = address.link_key.as_deref().and_then(|key| {
                phones
                    .iter()
                    .find(|p| p.link_key.as_deref() == Some(key))
                    .cloned()
            });
            LinkedPair {
                address: address.clone(),
                phone,
            }
        })
        .collect()
}
