use std::time::Instant;

use alloy::{
    network::{Ethereum, TransactionBuilder},
    primitives::{Address, Bytes, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    transports::{RpcError, TransportErrorKind, http::reqwest::Url},
};
use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use xabi_observability::{record_rpc_call, record_rpc_retry};

use crate::{
    endpoints::SelectedEndpoint,
    error_classification::rpc_error_message,
    error_decode::{describe_revert, extract_revert_data_lossy},
    rpc_executor::{RetryPolicy, execute_with_retry},
    rpc_rate_limiter::RpcRateLimiter,
};

/// Parameters of a call or transaction against one contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallParams {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

impl CallParams {
    fn to_request(&self) -> TransactionRequest {
        let request = TransactionRequest::default()
            .with_to(self.to)
            .with_input(self.data.clone())
            .with_value(self.value);
        match self.from {
            Some(from) => request.with_from(from),
            None => request,
        }
    }
}

#[derive(Debug, Error)]
pub enum ChainRpcError {
    #[error("Invalid RPC URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Execution reverted: {reason}")]
    Reverted { reason: String },

    #[error("RPC request failed: {message}")]
    Request {
        message: String,
        #[source]
        source: Option<RpcError<TransportErrorKind>>,
    },
}

impl ChainRpcError {
    pub(crate) fn from_rpc(err: RpcError<TransportErrorKind>) -> Self {
        if let Some(data) = extract_revert_data_lossy(&err) {
            return ChainRpcError::Reverted {
                reason: describe_revert(&data),
            };
        }

        let message = rpc_error_message(&err);
        if message.to_ascii_lowercase().contains("revert") {
            return ChainRpcError::Reverted { reason: message };
        }

        ChainRpcError::Request {
            message,
            source: Some(err),
        }
    }
}

/// Read-side JSON-RPC operations against an explicitly chosen endpoint.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn call(
        &self,
        endpoint: &SelectedEndpoint,
        params: &CallParams,
    ) -> Result<Bytes, ChainRpcError>;

    async fn estimate_gas(
        &self,
        endpoint: &SelectedEndpoint,
        params: &CallParams,
    ) -> Result<u64, ChainRpcError>;

    async fn get_balance(
        &self,
        endpoint: &SelectedEndpoint,
        address: Address,
    ) -> Result<U256, ChainRpcError>;
}

/// [`ChainRpc`] over alloy HTTP providers, one cached provider per endpoint URL.
///
/// Reads retry transient transport failures; gas estimation is attempted once.
pub struct AlloyRpcClient {
    providers: DashMap<String, DynProvider<Ethereum>>,
    rate_limiter: RpcRateLimiter,
    retry_policy: RetryPolicy,
}

impl AlloyRpcClient {
    pub fn new(max_rpc_requests_per_second: Option<u32>) -> Self {
        Self {
            providers: DashMap::new(),
            rate_limiter: RpcRateLimiter::new(max_rpc_requests_per_second),
            retry_policy: RetryPolicy::read_default(),
        }
    }

    fn provider(&self, url: &str) -> Result<DynProvider<Ethereum>, ChainRpcError> {
        if let Some(provider) = self.providers.get(url) {
            return Ok(provider.clone());
        }

        let parsed = Url::parse(url).map_err(|e| ChainRpcError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(parsed)
            .erased();
        self.providers.insert(url.to_string(), provider.clone());
        tracing::debug!(url = %url, "Created RPC provider");

        Ok(provider)
    }
}

#[async_trait]
impl ChainRpc for AlloyRpcClient {
    async fn call(
        &self,
        endpoint: &SelectedEndpoint,
        params: &CallParams,
    ) -> Result<Bytes, ChainRpcError> {
        let provider = self.provider(endpoint.url())?;
        let request = params.to_request();
        let chain_id = endpoint.chain_id().as_u64();
        let rate_limiter = &self.rate_limiter;
        let url = endpoint.url();
        let started = Instant::now();

        let result = execute_with_retry(
            &self.retry_policy,
            "eth_call",
            || {
                let provider = provider.clone();
                let request = request.clone();
                async move {
                    rate_limiter.acquire(url).await;
                    provider.call(request).await
                }
            },
            || record_rpc_retry(chain_id, "eth_call"),
        )
        .await;

        let status = if result.is_ok() { "success" } else { "error" };
        record_rpc_call(chain_id, "eth_call", status, started.elapsed());
        result.map_err(ChainRpcError::from_rpc)
    }

    async fn estimate_gas(
        &self,
        endpoint: &SelectedEndpoint,
        params: &CallParams,
    ) -> Result<u64, ChainRpcError> {
        let provider = self.provider(endpoint.url())?;
        let chain_id = endpoint.chain_id().as_u64();
        let started = Instant::now();

        self.rate_limiter.acquire(endpoint.url()).await;
        let result = provider.estimate_gas(params.to_request()).await;

        let status = if result.is_ok() { "success" } else { "error" };
        record_rpc_call(chain_id, "eth_estimateGas", status, started.elapsed());
        result.map_err(ChainRpcError::from_rpc)
    }

    async fn get_balance(
        &self,
        endpoint: &SelectedEndpoint,
        address: Address,
    ) -> Result<U256, ChainRpcError> {
        let provider = self.provider(endpoint.url())?;
        let chain_id = endpoint.chain_id().as_u64();
        let rate_limiter = &self.rate_limiter;
        let url = endpoint.url();
        let started = Instant::now();

        let result = execute_with_retry(
            &self.retry_policy,
            "eth_getBalance",
            || {
                let provider = provider.clone();
                async move {
                    rate_limiter.acquire(url).await;
                    provider.get_balance(address).await
                }
            },
            || record_rpc_retry(chain_id, "eth_getBalance"),
        )
        .await;

        let status = if result.is_ok() { "success" } else { "error" };
        record_rpc_call(chain_id, "eth_getBalance", status, started.elapsed());
        result.map_err(ChainRpcError::from_rpc)
    }
}
