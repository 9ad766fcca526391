use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::KeyValueStoreError;

pub type TableDef = TableDefinition<'static, &'static [u8], &'static [u8]>;

/// A table handle with byte keys and JSON-serialized values.
///
/// Every operation runs on the blocking pool behind a shared concurrency limiter.
pub struct Table<V> {
    db: Arc<Database>,
    table_def: TableDef,
    concurrency_limiter: Arc<Semaphore>,
    _marker: std::marker::PhantomData<V>,
}

impl<V> Clone for Table<V> {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
            table_def: self.table_def,
            concurrency_limiter: Arc::clone(&self.concurrency_limiter),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<V: Serialize + DeserializeOwned> Table<V> {
    pub(super) fn new(
        db: Arc<Database>,
        table_def: TableDef,
        concurrency_limiter: Arc<Semaphore>,
    ) -> Self {
        Self {
            db,
            table_def,
            concurrency_limiter,
            _marker: std::marker::PhantomData,
        }
    }

    async fn acquire_permit(&self) -> Result<OwnedSemaphorePermit, KeyValueStoreError> {
        self.concurrency_limiter
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| KeyValueStoreError::SemaphoreClosed)
    }

    async fn run_blocking<F, T>(&self, f: F) -> Result<T, KeyValueStoreError>
    where
        F: FnOnce(&Table<V>) -> Result<T, KeyValueStoreError> + Send + 'static,
        T: Send + 'static,
        V: Send + Sync + 'static,
    {
        let table = (*self).clone();
        let permit = self.acquire_permit().await?;
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            f(&table)
        })
        .await?
    }

    fn get_blocking(&self, key: &[u8]) -> Result<Option<V>, KeyValueStoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(self.table_def)?;

        match table.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub async fn get(&self, key: Vec<u8>) -> Result<Option<V>, KeyValueStoreError>
    where
        V: Send + Sync + 'static,
    {
        self.run_blocking(move |table| table.get_blocking(&key))
            .await
    }

    /// Read-modify-write under a single write transaction.
    ///
    /// A missing key starts from `default`. When `mutate_fn` returns `Err`, the
    /// transaction is dropped uncommitted and the stored value is left as it was.
    fn mutate_blocking<F, T, E>(
        &self,
        key: &[u8],
        default: V,
        mutate_fn: F,
    ) -> Result<Result<T, E>, KeyValueStoreError>
    where
        F: FnOnce(&mut V) -> Result<T, E>,
    {
        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut table = write_txn.open_table(self.table_def)?;

            let mut value: V = match table.get(key)? {
                Some(existing) => serde_json::from_slice(existing.value())?,
                None => default,
            };

            match mutate_fn(&mut value) {
                Ok(output) => {
                    let value_bytes = serde_json::to_vec(&value)?;
                    table.insert(key, value_bytes.as_slice())?;
                    Ok(output)
                }
                Err(error) => Err(error),
            }
        };

        match outcome {
            Ok(output) => {
                write_txn.commit()?;
                Ok(Ok(output))
            }
            Err(error) => {
                write_txn.abort()?;
                Ok(Err(error))
            }
        }
    }

    pub async fn mutate<F, T, E>(
        &self,
        key: Vec<u8>,
        default: V,
        mutate_fn: F,
    ) -> Result<Result<T, E>, KeyValueStoreError>
    where
        F: FnOnce(&mut V) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
        V: Send + Sync + 'static,
    {
        self.run_blocking(move |table| table.mutate_blocking(&key, default, mutate_fn))
            .await
    }

}
