use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AbiFunctionDescriptor, ChainId, normalize_address};

/// A saved contract binding: address, chain and the ABI functions to drive it with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub address: String,
    pub chain_id: ChainId,
    pub abi: Vec<AbiFunctionDescriptor>,
    #[serde(rename = "created_at")]
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Whether this project is bound to `address` on `chain_id`. Address comparison ignores case.
    pub fn is_for(&self, address: &str, chain_id: ChainId) -> bool {
        self.chain_id == chain_id && normalize_address(&self.address) == normalize_address(address)
    }
}
