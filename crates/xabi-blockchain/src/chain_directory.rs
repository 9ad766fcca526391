use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use xabi_domain::{ChainDescriptor, ChainId};

#[derive(Debug, Error)]
pub enum ChainDirectoryError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("Chain list request failed: {0}")]
    Request(String),

    #[error("Chain list returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Failed to parse chain list: {0}")]
    ParseResponse(String),
}

/// Source of chain descriptors.
#[async_trait]
pub trait ChainDirectory: Send + Sync {
    async fn get_chains(&self) -> Result<Vec<ChainDescriptor>, ChainDirectoryError>;
}

/// Chains supplied up front, typically from configuration.
pub struct StaticChainDirectory {
    chains: Vec<ChainDescriptor>,
}

impl StaticChainDirectory {
    pub fn new(chains: Vec<ChainDescriptor>) -> Self {
        Self { chains }
    }
}

#[async_trait]
impl ChainDirectory for StaticChainDirectory {
    async fn get_chains(&self) -> Result<Vec<ChainDescriptor>, ChainDirectoryError> {
        Ok(self.chains.clone())
    }
}

#[derive(Debug, Deserialize)]
struct RemoteChainList {
    chains: Vec<RemoteChain>,
}

#[derive(Debug, Deserialize)]
struct RemoteChain {
    id: u64,
    name: String,
    coin: String,
    metamask: RemoteWalletParams,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteWalletParams {
    #[serde(default)]
    rpc_urls: Vec<String>,
    #[serde(default)]
    block_explorer_urls: Vec<String>,
}

impl From<RemoteChain> for ChainDescriptor {
    fn from(chain: RemoteChain) -> Self {
        ChainDescriptor {
            id: ChainId::new(chain.id),
            name: chain.name,
            native_token_symbol: chain.coin,
            default_rpc_endpoints: chain.metamask.rpc_urls,
            block_explorer_url: chain.metamask.block_explorer_urls.into_iter().next(),
        }
    }
}

/// Remote EVM chain list in the `{ "chains": [{ id, name, coin, metamask }] }` format.
pub struct HttpChainDirectory {
    client: reqwest::Client,
    url: String,
}

impl HttpChainDirectory {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ChainDirectoryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainDirectoryError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ChainDirectory for HttpChainDirectory {
    async fn get_chains(&self) -> Result<Vec<ChainDescriptor>, ChainDirectoryError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ChainDirectoryError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ChainDirectoryError::HttpStatus(response.status().as_u16()));
        }

        let list: RemoteChainList = response
            .json()
            .await
            .map_err(|e| ChainDirectoryError::ParseResponse(e.to_string()))?;

        Ok(list.chains.into_iter().map(ChainDescriptor::from).collect())
    }
}

/// Known chains in the order they were first seen.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: Vec<ChainDescriptor>,
}

impl ChainRegistry {
    pub fn new(chains: Vec<ChainDescriptor>) -> Self {
        let mut registry = Self::default();
        registry.merge(chains);
        registry
    }

    /// Add chains whose id is not known yet. Known chains are never overwritten.
    /// Returns how many chains were added.
    pub fn merge(&mut self, chains: Vec<ChainDescriptor>) -> usize {
        let before = self.chains.len();
        for chain in chains {
            if self.get(chain.id).is_none() {
                self.chains.push(chain);
            }
        }
        self.chains.len() - before
    }

    /// Merge every directory in order. A failing directory is logged and skipped.
    pub async fn load(directories: &[&dyn ChainDirectory]) -> Self {
        let mut registry = Self::default();
        for directory in directories {
            match directory.get_chains().await {
                Ok(chains) => {
                    let added = registry.merge(chains);
                    tracing::debug!(added, total = registry.len(), "Merged chain directory");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to fetch chains; continuing with known chains");
                }
            }
        }
        registry
    }

    pub fn get(&self, chain_id: ChainId) -> Option<&ChainDescriptor> {
        self.chains.iter().find(|chain| chain.id == chain_id)
    }

    pub fn all(&self) -> &[ChainDescriptor] {
        &self.chains
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
