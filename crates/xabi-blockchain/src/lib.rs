//! Contract interaction engine: endpoint selection, ABI-driven call dispatch
//! and the transaction signing pipeline.

mod abi;
mod chain_directory;
mod config;
mod config_error;
mod contract_source;
mod dispatcher;
mod endpoints;
mod error;
mod error_classification;
mod error_decode;
mod rpc;
mod rpc_executor;
mod rpc_rate_limiter;
mod session;
mod signing;
mod wallet;

#[cfg(test)]
mod test_support;

pub use abi::{
    AbiError, CallArguments, Classification, CompiledFunction, FunctionRegistry, OperationClass,
    classify, parse_abi,
};
pub use chain_directory::{
    ChainDirectory, ChainDirectoryError, ChainRegistry, HttpChainDirectory, StaticChainDirectory,
};
pub use config::{
    ChainDirectoryConfig, ContractSourceConfig, EndpointsConfig, EndpointsConfigRaw,
    SigningAgentConfig,
};
pub use config_error::ConfigError;
pub use contract_source::{ContractSourceClient, ContractSourceError};
pub use dispatcher::{CallDispatcher, CallRequest};
pub use endpoints::{
    CustomEndpointUpdate, EndpointManager, EndpointProber, HttpProber, NewCustomEndpoint,
    ProbeReport, SelectedEndpoint,
};
pub use error::{CallFailure, CallResult, EndpointError, ErrorKind};
pub use rpc::{AlloyRpcClient, CallParams, ChainRpc, ChainRpcError};
pub use session::{ContractSession, SlotResult};
pub use signing::{
    AgentError, AgentTransaction, JsonRpcSigningAgent, PipelineStage, SigningAgent,
    SigningPipeline,
};
pub use wallet::{WalletConnection, connect_wallet, native_balance};
