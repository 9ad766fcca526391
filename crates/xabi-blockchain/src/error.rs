use serde::Serialize;
use thiserror::Error;
use xabi_domain::ChainId;
use xabi_key_value_store::KeyValueStoreError;

/// Failure categories surfaced to callers. Every failure carries one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed address, URL, ABI or argument, rejected before any network call.
    Validation,
    UnreachableEndpoint,
    /// Read call reverted or its result could not be decoded.
    CallExecution,
    /// The write would revert; nothing was submitted.
    GasEstimation,
    /// The signing agent rejected or failed the request.
    Signing,
    /// No signing agent is configured. Reported before any network call.
    AgentNotFound,
    /// The agent returned no transaction identifier.
    TransactionFailed,
    /// Local persistence failed.
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::UnreachableEndpoint => "unreachable_endpoint",
            ErrorKind::CallExecution => "call_execution",
            ErrorKind::GasEstimation => "gas_estimation",
            ErrorKind::Signing => "signing",
            ErrorKind::AgentNotFound => "agent_not_found",
            ErrorKind::TransactionFailed => "transaction_failed",
            ErrorKind::Storage => "storage",
        }
    }

    /// `AgentNotFound` is a signing failure with its own tag.
    pub fn is_signing(&self) -> bool {
        matches!(self, ErrorKind::Signing | ErrorKind::AgentNotFound)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed failure with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct CallFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl CallFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of a single function invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallResult {
    Success { decoded_value: String },
    Failure { kind: ErrorKind, message: String },
}

impl CallResult {
    pub fn success(decoded_value: impl Into<String>) -> Self {
        CallResult::Success {
            decoded_value: decoded_value.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallResult::Success { .. })
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            CallResult::Success { .. } => None,
            CallResult::Failure { kind, .. } => Some(*kind),
        }
    }
}

impl From<CallFailure> for CallResult {
    fn from(failure: CallFailure) -> Self {
        CallResult::Failure {
            kind: failure.kind,
            message: failure.message,
        }
    }
}

impl std::fmt::Display for CallResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallResult::Success { decoded_value } => f.write_str(decoded_value),
            CallResult::Failure { kind, message } => write!(f, "{kind}: {message}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid RPC URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("RPC URL '{url}' already exists for chain {chain_id}")]
    Duplicate { url: String, chain_id: ChainId },

    #[error("RPC endpoint '{url}' is not reachable")]
    Unreachable { url: String },

    #[error("Custom endpoint '{id}' not found")]
    NotFound { id: String },

    #[error("No RPC endpoints known for chain {chain_id}")]
    NoCandidates { chain_id: ChainId },

    #[error("Endpoint store error: {0}")]
    Store(#[from] KeyValueStoreError),
}

impl EndpointError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EndpointError::MissingField { .. }
            | EndpointError::InvalidUrl { .. }
            | EndpointError::Duplicate { .. }
            | EndpointError::NotFound { .. } => ErrorKind::Validation,
            EndpointError::Unreachable { .. } | EndpointError::NoCandidates { .. } => {
                ErrorKind::UnreachableEndpoint
            }
            EndpointError::Store(_) => ErrorKind::Storage,
        }
    }
}

impl From<EndpointError> for CallFailure {
    fn from(error: EndpointError) -> Self {
        CallFailure::new(error.kind(), error.to_string())
    }
}
