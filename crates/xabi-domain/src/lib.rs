mod abi;
mod address;
mod chain;
mod chain_id;
mod endpoint;
mod project;
mod transaction;

pub use abi::{AbiFunctionDescriptor, AbiParam, StateMutability};
pub use address::{AddressError, normalize_address, parse_address};
pub use chain::ChainDescriptor;
pub use chain_id::ChainId;
pub use endpoint::{CustomRpcEndpoint, EndpointKind, RpcEndpoint};
pub use project::Project;
pub use transaction::TransactionRecord;
