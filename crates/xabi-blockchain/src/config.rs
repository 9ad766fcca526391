use std::time::Duration;

use serde::{Deserialize, Serialize};
use xabi_domain::ChainDescriptor;

use crate::ConfigError;

/// Endpoint probing and RPC transport settings, as read from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointsConfigRaw {
    /// Timeout for a single liveness probe in milliseconds.
    pub probe_timeout_ms: u64,

    /// Request budget per RPC endpoint URL, per second. `None` means unlimited.
    pub max_rpc_requests_per_second: Option<u32>,
}

impl EndpointsConfigRaw {
    pub fn ensure_probe_timeout(&self) -> Result<(), ConfigError> {
        if self.probe_timeout_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "endpoints.probe_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Ensures the RPC rate limit, if configured, is greater than zero.
    pub fn ensure_max_rpc_requests_per_second(&self) -> Result<(), ConfigError> {
        if self.max_rpc_requests_per_second == Some(0) {
            return Err(ConfigError::InvalidConfig(
                "endpoints.max_rpc_requests_per_second must be greater than 0 when set"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn resolve(self) -> Result<EndpointsConfig, ConfigError> {
        self.ensure_probe_timeout()?;
        self.ensure_max_rpc_requests_per_second()?;

        Ok(EndpointsConfig {
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            max_rpc_requests_per_second: self.max_rpc_requests_per_second,
        })
    }
}

#[derive(Debug, Clone)]
pub struct EndpointsConfig {
    pub probe_timeout: Duration,
    pub max_rpc_requests_per_second: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainDirectoryConfig {
    /// Chains known without any network access. These take precedence over
    /// remote entries with the same id.
    #[serde(default)]
    pub chains: Vec<ChainDescriptor>,

    /// Remote EVM chain list merged in at startup.
    #[serde(default)]
    pub remote_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractSourceConfig {
    pub api_base_url: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SigningAgentConfig {
    /// JSON-RPC endpoint of the signing agent. The agent is absent when unset.
    #[serde(default)]
    pub rpc_url: Option<String>,
}
