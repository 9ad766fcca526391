use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ChainId;

/// A user-created endpoint, persisted in the custom endpoint store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CustomRpcEndpoint {
    pub id: String,
    pub name: String,
    pub url: String,
    pub chain_id: ChainId,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl CustomRpcEndpoint {
    pub fn has_url(&self, url: &str) -> bool {
        self.url.eq_ignore_ascii_case(url.trim())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    Default,
    Custom,
}

/// A candidate endpoint for a chain.
///
/// Default endpoints come from the chain descriptor and are identified by URL only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcEndpoint {
    Default { chain_id: ChainId, url: String },
    Custom(CustomRpcEndpoint),
}

impl RpcEndpoint {
    pub fn url(&self) -> &str {
        match self {
            RpcEndpoint::Default { url, .. } => url,
            RpcEndpoint::Custom(custom) => &custom.url,
        }
    }

    pub fn chain_id(&self) -> ChainId {
        match self {
            RpcEndpoint::Default { chain_id, .. } => *chain_id,
            RpcEndpoint::Custom(custom) => custom.chain_id,
        }
    }

    pub fn kind(&self) -> EndpointKind {
        match self {
            RpcEndpoint::Default { .. } => EndpointKind::Default,
            RpcEndpoint::Custom(_) => EndpointKind::Custom,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RpcEndpoint::Default { .. } => "default",
            RpcEndpoint::Custom(custom) => &custom.name,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, RpcEndpoint::Custom(custom) if custom.is_active)
    }
}
