use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use xabi_domain::{AbiFunctionDescriptor, ChainId};
use xabi_key_value_store::{KeyValueStoreError, ProjectStore};

use crate::{AbiError, parse_abi};

#[derive(Debug, Error)]
pub enum ContractSourceError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("Contract source request failed: {0}")]
    Request(String),

    #[error("Contract source API returned HTTP {0}")]
    HttpStatus(u16),

    #[error("No verified source for {address} on chain {chain_id}")]
    NotVerified { address: String, chain_id: ChainId },

    #[error("Failed to parse contract source response: {0}")]
    ParseResponse(String),

    #[error("Verified ABI is malformed: {0}")]
    Abi(#[from] AbiError),

    #[error("Project store error: {0}")]
    Store(#[from] KeyValueStoreError),
}

/// Looks up verified ABIs through the contract source API.
pub struct ContractSourceClient {
    client: reqwest::Client,
    api_base_url: String,
}

impl ContractSourceClient {
    pub fn new(api_base_url: impl Into<String>, timeout: Duration) -> Result<Self, ContractSourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ContractSourceError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Fetch and parse the verified ABI for `address` on `chain_id`.
    pub async fn fetch_abi(
        &self,
        chain_id: ChainId,
        address: &str,
    ) -> Result<Vec<AbiFunctionDescriptor>, ContractSourceError> {
        let url = format!("{}/contracts/source_code", self.api_base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("chainId", chain_id.to_string()),
                ("address", address.to_string()),
            ])
            .send()
            .await
            .map_err(|e| ContractSourceError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ContractSourceError::HttpStatus(response.status().as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ContractSourceError::ParseResponse(e.to_string()))?;

        let not_verified = || ContractSourceError::NotVerified {
            address: address.to_string(),
            chain_id,
        };
        let abi = body
            .get("result")
            .and_then(|result| result.get(0))
            .and_then(|source| source.get("ABI"))
            .ok_or_else(not_verified)?;

        // The API returns the ABI as a JSON-encoded string; accept a raw array too.
        let functions = match abi {
            Value::String(raw) if raw.trim().is_empty() => return Err(not_verified()),
            Value::String(raw) => parse_abi(raw)?,
            Value::Array(_) => parse_abi(&abi.to_string())?,
            _ => return Err(not_verified()),
        };

        tracing::debug!(
            chain_id = %chain_id,
            address = %address,
            functions = functions.len(),
            "Fetched verified ABI"
        );
        Ok(functions)
    }

    /// ABI for a contract: a saved project's ABI when one exists, otherwise the verified source.
    pub async fn resolve_abi(
        &self,
        projects: &ProjectStore,
        chain_id: ChainId,
        address: &str,
    ) -> Result<Vec<AbiFunctionDescriptor>, ContractSourceError> {
        if let Some(project) = projects.find(address, chain_id).await? {
            tracing::debug!(project_id = %project.id, "Using ABI from saved project");
            return Ok(project.abi);
        }
        self.fetch_abi(chain_id, address).await
    }
}
