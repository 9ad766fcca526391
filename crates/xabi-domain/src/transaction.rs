use alloy::primitives::{Address, Bytes, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ChainId;

/// A broadcast transaction. Written once after the signing agent returns a hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub hash: String,
    pub chain_id: ChainId,
    pub to: Address,
    pub from: Address,
    pub data: Bytes,
    pub value_wei: U256,
    pub gas_limit: u64,
    pub function_signature: String,
    pub submitted_at: DateTime<Utc>,
}
