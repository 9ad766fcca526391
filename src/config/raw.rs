use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use xabi_blockchain::{
    ChainDirectoryConfig, ContractSourceConfig, EndpointsConfig, EndpointsConfigRaw,
    SigningAgentConfig,
};
use xabi_key_value_store::KeyValueStoreManagerConfig;

use crate::{
    config::ConfigError,
    logger::{LoggerConfig, TelemetryConfig},
};

/// Filesystem paths derived from the root data directory.
///
/// ```text
/// {root}/
/// └── key-value-store/
///     └── xabi.redb   <- custom endpoints, projects, transaction history
/// ```
#[derive(Debug, Clone)]
pub(crate) struct AppPaths {
    pub key_value_store: PathBuf,
}

impl AppPaths {
    pub(crate) fn from_root(root: PathBuf) -> Self {
        Self {
            key_value_store: root.join("key-value-store/xabi.redb"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigRaw {
    pub environment: String,
    pub app_data_path: PathBuf,
    pub logger: LoggerConfig,
    pub telemetry: TelemetryConfig,
    pub endpoints: EndpointsConfigRaw,
    pub key_value_store: KeyValueStoreManagerConfig,
    pub chain_directory: ChainDirectoryConfig,
    pub contract_source: ContractSourceConfig,
    #[serde(default)]
    pub signing_agent: SigningAgentConfig,
}

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub environment: String,
    pub app_data_path: PathBuf,
    pub logger: LoggerConfig,
    pub telemetry: TelemetryConfig,
    pub endpoints: EndpointsConfig,
    pub key_value_store: KeyValueStoreManagerConfig,
    pub chain_directory: ChainDirectoryConfig,
    pub contract_source: ContractSourceConfig,
    pub signing_agent: SigningAgentConfig,
}

impl ConfigRaw {
    pub(crate) fn resolve(self) -> Result<Config, ConfigError> {
        if self.contract_source.timeout_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "contract_source.timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.key_value_store.max_concurrent_operations == 0 {
            return Err(ConfigError::InvalidConfig(
                "key_value_store.max_concurrent_operations must be greater than 0".to_string(),
            ));
        }

        Ok(Config {
            environment: self.environment,
            app_data_path: self.app_data_path,
            logger: self.logger,
            telemetry: self.telemetry,
            endpoints: self.endpoints.resolve()?,
            key_value_store: self.key_value_store,
            chain_directory: self.chain_directory,
            contract_source: self.contract_source,
            signing_agent: self.signing_agent,
        })
    }
}
