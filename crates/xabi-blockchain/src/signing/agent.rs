use std::sync::atomic::{AtomicU64, Ordering};

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use xabi_domain::ChainId;

const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    #[error("Signing agent not found")]
    NotFound,

    #[error("Signing agent rejected the request: {message}")]
    Rejected { code: Option<i64>, message: String },

    #[error("Signing agent request failed: {0}")]
    Request(String),

    #[error("Signing agent returned an invalid response: {0}")]
    InvalidResponse(String),

    #[error("Signing agent returned no accounts")]
    NoAccounts,
}

/// `eth_sendTransaction` parameters. Value and gas are hex quantities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentTransaction {
    pub from: Address,
    pub to: Address,
    pub value: String,
    pub data: Bytes,
    pub gas: String,
}

/// External holder of keys and user consent.
#[async_trait]
pub trait SigningAgent: Send + Sync {
    async fn request_accounts(&self) -> Result<Vec<Address>, AgentError>;

    async fn chain_id(&self) -> Result<ChainId, AgentError>;

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), AgentError>;

    /// Ask the agent to sign and broadcast. `Ok(None)` means the agent
    /// answered without a transaction identifier.
    async fn send_transaction(&self, tx: &AgentTransaction) -> Result<Option<String>, AgentError>;
}

/// Signing agent reached over JSON-RPC, e.g. a wallet bridge or a dev node
/// with unlocked accounts. Requests carry no timeout: the agent may wait on
/// the user for as long as it needs.
pub struct JsonRpcSigningAgent {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl JsonRpcSigningAgent {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, AgentError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let response = self
            .client
            .post(&self.url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            }))
            .send()
            .await
            .map_err(|e| AgentError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AgentError::Request(format!(
                "{method} returned HTTP {}",
                response.status()
            )));
        }

        let mut body: Value = response
            .json()
            .await
            .map_err(|e| AgentError::InvalidResponse(e.to_string()))?;

        if let Some(error) = body.get("error") {
            return Err(AgentError::Rejected {
                code: error.get("code").and_then(Value::as_i64),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }

        Ok(body.get_mut("result").map(Value::take).unwrap_or(Value::Null))
    }
}

#[async_trait]
impl SigningAgent for JsonRpcSigningAgent {
    async fn request_accounts(&self) -> Result<Vec<Address>, AgentError> {
        let result = match self.request("eth_requestAccounts", json!([])).await {
            Err(AgentError::Rejected {
                code: Some(METHOD_NOT_FOUND),
                ..
            }) => self.request("eth_accounts", json!([])).await?,
            other => other?,
        };

        serde_json::from_value(result).map_err(|e| AgentError::InvalidResponse(e.to_string()))
    }

    async fn chain_id(&self) -> Result<ChainId, AgentError> {
        let result = self.request("eth_chainId", json!([])).await?;
        let raw = result
            .as_str()
            .ok_or_else(|| AgentError::InvalidResponse(format!("eth_chainId returned {result}")))?;
        raw.parse()
            .map_err(|_| AgentError::InvalidResponse(format!("eth_chainId returned {raw}")))
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), AgentError> {
        self.request(
            "wallet_switchEthereumChain",
            json!([{ "chainId": chain_id.to_hex() }]),
        )
        .await?;
        Ok(())
    }

    async fn send_transaction(&self, tx: &AgentTransaction) -> Result<Option<String>, AgentError> {
        let result = self.request("eth_sendTransaction", json!([tx])).await?;

        // Agents answer with the hash, or with a receipt-like object carrying it.
        let hash = match result {
            Value::String(hash) => Some(hash),
            Value::Object(object) => object
                .get("transactionHash")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        };

        Ok(hash.filter(|hash| !hash.is_empty()))
    }
}
