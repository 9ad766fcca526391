//! Typed default configurations for each environment.
//!
//! Each environment (development, mainnet) gets a fully constructed
//! [`ConfigRaw`] via [`config_for`]. Shared defaults live in helper
//! functions so the differences between environments stay visible.

use std::path::PathBuf;

use xabi_blockchain::{
    ChainDirectoryConfig, ContractSourceConfig, EndpointsConfigRaw, SigningAgentConfig,
};
use xabi_domain::{ChainDescriptor, ChainId};
use xabi_key_value_store::KeyValueStoreManagerConfig;

use super::{ConfigError, ConfigRaw};
use crate::logger::{LogFormat, LoggerConfig, TelemetryConfig, TelemetryMetricsConfig};

pub(crate) const ENVIRONMENTS: [&str; 2] = ["development", "mainnet"];

/// Returns the default [`ConfigRaw`] for the given environment name.
pub(crate) fn config_for(environment: &str) -> Result<ConfigRaw, ConfigError> {
    match environment {
        "development" => Ok(development()),
        "mainnet" => Ok(mainnet()),
        _ => Err(ConfigError::UnknownEnvironment(environment.to_string())),
    }
}

// ── Shared defaults ─────────────────────────────────────────────

fn key_value_store() -> KeyValueStoreManagerConfig {
    KeyValueStoreManagerConfig {
        max_concurrent_operations: 16,
    }
}

fn contract_source() -> ContractSourceConfig {
    ContractSourceConfig {
        api_base_url: "https://api.openscan.app".to_string(),
        timeout_ms: 10_000,
    }
}

fn telemetry(metrics_enabled: bool) -> TelemetryConfig {
    TelemetryConfig {
        metrics: TelemetryMetricsConfig {
            enabled: metrics_enabled,
            bind_address: "127.0.0.1:9464".to_string(),
        },
    }
}

fn ethereum() -> ChainDescriptor {
    ChainDescriptor {
        id: ChainId::new(1),
        name: "Ethereum".to_string(),
        native_token_symbol: "ETH".to_string(),
        default_rpc_endpoints: vec![
            "https://ethereum-rpc.publicnode.com".to_string(),
            "https://eth.drpc.org".to_string(),
        ],
        block_explorer_url: Some("https://etherscan.io/".to_string()),
    }
}

// ── Per-environment constructors ────────────────────────────────

fn development() -> ConfigRaw {
    ConfigRaw {
        environment: "development".to_string(),
        app_data_path: PathBuf::from("data"),
        logger: LoggerConfig {
            level: "xabi_engine=debug,xabi_blockchain=debug,xabi_key_value_store=info".to_string(),
            format: LogFormat::Pretty,
        },
        telemetry: telemetry(false),
        endpoints: EndpointsConfigRaw {
            probe_timeout_ms: 2_000,
            max_rpc_requests_per_second: None,
        },
        key_value_store: key_value_store(),
        chain_directory: ChainDirectoryConfig {
            chains: vec![
                ChainDescriptor {
                    id: ChainId::new(31337),
                    name: "Anvil".to_string(),
                    native_token_symbol: "ETH".to_string(),
                    default_rpc_endpoints: vec!["http://127.0.0.1:8545".to_string()],
                    block_explorer_url: None,
                },
                ethereum(),
            ],
            remote_url: None,
        },
        contract_source: contract_source(),
        // Anvil serves unlocked dev accounts over its own JSON-RPC.
        signing_agent: SigningAgentConfig {
            rpc_url: Some("http://127.0.0.1:8545".to_string()),
        },
    }
}

fn mainnet() -> ConfigRaw {
    ConfigRaw {
        environment: "mainnet".to_string(),
        app_data_path: PathBuf::from("data"),
        logger: LoggerConfig {
            level: "xabi_engine=info,xabi_blockchain=info".to_string(),
            format: LogFormat::Pretty,
        },
        telemetry: telemetry(false),
        endpoints: EndpointsConfigRaw {
            probe_timeout_ms: 5_000,
            max_rpc_requests_per_second: Some(25),
        },
        key_value_store: key_value_store(),
        chain_directory: ChainDirectoryConfig {
            chains: vec![ethereum()],
            remote_url: Some("https://li.quest/v1/chains?chainTypes=EVM".to_string()),
        },
        contract_source: contract_source(),
        signing_agent: SigningAgentConfig::default(),
    }
}
