mod config;
mod error;
mod manager;
mod stores;
mod table;

pub use config::KeyValueStoreManagerConfig;
pub use error::KeyValueStoreError;
pub use manager::KeyValueStoreManager;
pub use stores::{
    CUSTOM_ENDPOINTS_KEY, CustomEndpointStore, PROJECTS_KEY, ProjectStore, TRANSACTIONS_KEY,
    TransactionStore, activate_exclusively,
};
pub use table::Table;
