mod custom_endpoint_store;
mod project_store;
mod transaction_store;

pub use custom_endpoint_store::{CUSTOM_ENDPOINTS_KEY, CustomEndpointStore, activate_exclusively};
pub use project_store::{PROJECTS_KEY, ProjectStore};
pub use transaction_store::{TRANSACTIONS_KEY, TransactionStore};

/// Table holding the fixed-key JSON documents. Each key maps to one array.
pub(crate) const LOCAL_STORAGE_TABLE: &str = "local_storage";
