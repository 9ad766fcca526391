mod endpoint;
mod rpc;
mod signing;

pub use endpoint::*;
pub use rpc::*;
pub use signing::*;
