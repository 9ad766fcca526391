use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

/// Liveness check for a JSON-RPC endpoint. Failures are data, never errors.
#[async_trait]
pub trait EndpointProber: Send + Sync {
    async fn probe(&self, url: &str) -> bool;
}

/// Result of the explicit "test endpoint" action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub url: String,
    pub reachable: bool,
    pub latency: Duration,
}

/// Probes with `eth_blockNumber` over HTTP under a fixed timeout.
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn block_number(&self, url: &str) -> Result<bool, reqwest::Error> {
        let response = self
            .client
            .post(url)
            .json(&json!({
                "jsonrpc": "2.0",
                "method": "eth_blockNumber",
                "params": [],
                "id": 1,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::debug!(url = %url, status = %response.status(), "Probe returned non-success status");
            return Ok(false);
        }

        let body: Value = response.json().await?;
        Ok(has_result(&body))
    }
}

#[async_trait]
impl EndpointProber for HttpProber {
    async fn probe(&self, url: &str) -> bool {
        match self.block_number(url).await {
            Ok(reachable) => reachable,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Probe failed");
                false
            }
        }
    }
}

/// A JSON-RPC body counts as live only with a non-empty `result`.
fn has_result(body: &Value) -> bool {
    match body.get("result") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}
