use std::{path::Path, sync::Arc};

use redb::{Database, TableDefinition};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Semaphore;

use super::{
    KeyValueStoreError, KeyValueStoreManagerConfig,
    stores::{CustomEndpointStore, LOCAL_STORAGE_TABLE, ProjectStore, TransactionStore},
    table::{Table, TableDef},
};

/// Key-Value Store Manager
///
/// Provides access to typed tables backed by redb, and to the fixed-key
/// stores the engine persists its local state in.
pub struct KeyValueStoreManager {
    db: Arc<Database>,
    concurrency_limiter: Arc<Semaphore>,
    custom_endpoint_store: CustomEndpointStore,
    project_store: ProjectStore,
    transaction_store: TransactionStore,
}

impl KeyValueStoreManager {
    pub async fn connect(
        path: impl AsRef<Path>,
        config: &KeyValueStoreManagerConfig,
    ) -> Result<Self, KeyValueStoreError> {
        let path = path.as_ref().to_path_buf();
        let config = config.clone();
        tokio::task::spawn_blocking(move || {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let db = Database::create(&path)?;
            let max_concurrent = config.max_concurrent_operations.max(1);
            if max_concurrent != config.max_concurrent_operations {
                tracing::warn!(
                    configured = config.max_concurrent_operations,
                    effective = max_concurrent,
                    "Key-value store max_concurrent_operations too low; clamped"
                );
            }
            tracing::info!(
                path = %path.display(),
                max_concurrent = max_concurrent,
                "Key-value store opened"
            );

            // Fixed-key stores share one table; create it before handing out handles.
            let write_txn = db.begin_write()?;
            {
                let local_storage_def: TableDef = TableDefinition::new(LOCAL_STORAGE_TABLE);
                let _local_storage = write_txn.open_table(local_storage_def)?;
            }
            write_txn.commit()?;

            let db = Arc::new(db);
            let concurrency_limiter = Arc::new(Semaphore::new(max_concurrent));
            let local_storage: TableDef = TableDefinition::new(LOCAL_STORAGE_TABLE);

            let custom_endpoint_store = CustomEndpointStore::from_table(Table::new(
                Arc::clone(&db),
                local_storage,
                Arc::clone(&concurrency_limiter),
            ));
            let project_store = ProjectStore::from_table(Table::new(
                Arc::clone(&db),
                local_storage,
                Arc::clone(&concurrency_limiter),
            ));
            let transaction_store = TransactionStore::from_table(Table::new(
                Arc::clone(&db),
                local_storage,
                Arc::clone(&concurrency_limiter),
            ));

            Ok(Self {
                db,
                concurrency_limiter,
                custom_endpoint_store,
                project_store,
                transaction_store,
            })
        })
        .await?
    }

    /// Get a typed table handle. The table is created if it doesn't exist.
    pub fn table<V: Serialize + DeserializeOwned>(
        &self,
        name: &'static str,
    ) -> Result<Table<V>, KeyValueStoreError> {
        let table_def: TableDef = TableDefinition::new(name);

        let write_txn = self.db.begin_write()?;
        {
            let _table = write_txn.open_table(table_def)?;
        }
        write_txn.commit()?;

        Ok(Table::new(
            Arc::clone(&self.db),
            table_def,
            Arc::clone(&self.concurrency_limiter),
        ))
    }

    pub fn custom_endpoint_store(&self) -> CustomEndpointStore {
        self.custom_endpoint_store.clone()
    }

    pub fn project_store(&self) -> ProjectStore {
        self.project_store.clone()
    }

    pub fn transaction_store(&self) -> TransactionStore {
        self.transaction_store.clone()
    }
}
