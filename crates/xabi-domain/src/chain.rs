use serde::{Deserialize, Serialize};

use crate::ChainId;

/// Immutable description of a chain as supplied by the chain directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ChainDescriptor {
    pub id: ChainId,
    pub name: String,
    pub native_token_symbol: String,
    /// Endpoints in the order the directory advertises them. Order is precedence.
    pub default_rpc_endpoints: Vec<String>,
    #[serde(default)]
    pub block_explorer_url: Option<String>,
}

impl ChainDescriptor {
    /// Explorer page for an account or contract, if the chain has an explorer.
    pub fn address_url(&self, address: &str) -> Option<String> {
        self.explorer_link("address", address)
    }

    /// Explorer page for a transaction hash, if the chain has an explorer.
    pub fn tx_url(&self, hash: &str) -> Option<String> {
        self.explorer_link("tx", hash)
    }

    fn explorer_link(&self, kind: &str, value: &str) -> Option<String> {
        let base = self.block_explorer_url.as_deref()?.trim_end_matches('/');
        if base.is_empty() {
            return None;
        }
        Some(format!("{base}/{kind}/{value}"))
    }
}
