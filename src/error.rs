use std::path::PathBuf;

use thiserror::Error;
use xabi_blockchain::{AbiError, AgentError, CallFailure, ContractSourceError, EndpointError};
use xabi_domain::{AddressError, ChainId};
use xabi_key_value_store::KeyValueStoreError;

/// Failure of one CLI command, composed from the subsystem errors.
#[derive(Error, Debug)]
pub(crate) enum CommandError {
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error(transparent)]
    Abi(#[from] AbiError),

    #[error(transparent)]
    ContractSource(#[from] ContractSourceError),

    #[error(transparent)]
    Store(#[from] KeyValueStoreError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Call(#[from] CallFailure),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("Failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Unknown chain {0}")]
    UnknownChain(ChainId),

    #[error("No chains configured")]
    NoChains,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
