use std::{sync::Arc, time::Duration};

use xabi_blockchain::{
    AlloyRpcClient, CallDispatcher, ChainDirectory, ChainRegistry, ContractSourceClient,
    EndpointManager, HttpChainDirectory, HttpProber, JsonRpcSigningAgent, SigningAgent,
    SigningPipeline, StaticChainDirectory,
};
use xabi_key_value_store::KeyValueStoreManager;

use crate::config::{AppPaths, Config};

const CHAIN_DIRECTORY_TIMEOUT: Duration = Duration::from_secs(10);

/// Container for all initialized managers.
pub(crate) struct Managers {
    pub key_value_store: Arc<KeyValueStoreManager>,
    pub chains: Arc<ChainRegistry>,
    pub endpoints: Arc<EndpointManager>,
    pub rpc: Arc<AlloyRpcClient>,
    pub agent: Option<Arc<dyn SigningAgent>>,
    pub dispatcher: Arc<CallDispatcher>,
    pub contract_source: ContractSourceClient,
}

/// Initialize all managers.
///
/// The chain directory is loaded once here; a remote directory that fails
/// only leaves the configured chains.
pub(crate) async fn initialize(config: &Config, paths: &AppPaths) -> Managers {
    let key_value_store = Arc::new(
        KeyValueStoreManager::connect(&paths.key_value_store, &config.key_value_store)
            .await
            .expect("Failed to initialize key-value store manager"),
    );

    let chains = Arc::new(load_chains(config).await);

    let prober = HttpProber::new(config.endpoints.probe_timeout)
        .expect("Failed to build endpoint prober HTTP client");
    let endpoints = Arc::new(EndpointManager::new(
        Arc::clone(&chains),
        key_value_store.custom_endpoint_store(),
        Arc::new(prober),
    ));

    let rpc = Arc::new(AlloyRpcClient::new(
        config.endpoints.max_rpc_requests_per_second,
    ));

    let agent: Option<Arc<dyn SigningAgent>> = config
        .signing_agent
        .rpc_url
        .as_deref()
        .map(|url| Arc::new(JsonRpcSigningAgent::new(url)) as Arc<dyn SigningAgent>);
    if agent.is_none() {
        tracing::info!("No signing agent configured; writes are disabled");
    }

    let pipeline = SigningPipeline::new(rpc.clone(), agent.clone())
        .with_history(key_value_store.transaction_store());
    let dispatcher = Arc::new(CallDispatcher::new(rpc.clone(), pipeline));

    let contract_source = ContractSourceClient::new(
        &config.contract_source.api_base_url,
        Duration::from_millis(config.contract_source.timeout_ms),
    )
    .expect("Failed to build contract source HTTP client");

    Managers {
        key_value_store,
        chains,
        endpoints,
        rpc,
        agent,
        dispatcher,
        contract_source,
    }
}

async fn load_chains(config: &Config) -> ChainRegistry {
    let local = StaticChainDirectory::new(config.chain_directory.chains.clone());

    let remote = config
        .chain_directory
        .remote_url
        .as_deref()
        .and_then(|url| match HttpChainDirectory::new(url, CHAIN_DIRECTORY_TIMEOUT) {
            Ok(directory) => Some(directory),
            Err(error) => {
                tracing::warn!(url = %url, error = %error, "Remote chain directory disabled");
                None
            }
        });

    let mut directories: Vec<&dyn ChainDirectory> = vec![&local];
    if let Some(remote) = &remote {
        directories.push(remote);
    }

    let registry = ChainRegistry::load(&directories).await;
    tracing::info!(chains = registry.len(), "Chain directory loaded");
    registry
}
