use xabi_domain::{ChainId, TransactionRecord};

use crate::{KeyValueStoreError, Table};

pub const TRANSACTIONS_KEY: &str = "xabi-transaction-history";

/// Append-only history of broadcast transactions.
#[derive(Clone)]
pub struct TransactionStore {
    table: Table<Vec<TransactionRecord>>,
}

impl TransactionStore {
    pub(crate) fn from_table(table: Table<Vec<TransactionRecord>>) -> Self {
        Self { table }
    }

    fn key() -> Vec<u8> {
        TRANSACTIONS_KEY.as_bytes().to_vec()
    }

    pub async fn append(&self, record: TransactionRecord) -> Result<(), KeyValueStoreError> {
        self.table
            .mutate(Self::key(), Vec::new(), move |records: &mut Vec<TransactionRecord>| {
                records.push(record);
                Ok::<_, KeyValueStoreError>(())
            })
            .await?
    }

    /// Records in broadcast order, optionally restricted to one chain.
    pub async fn list(
        &self,
        chain_id: Option<ChainId>,
    ) -> Result<Vec<TransactionRecord>, KeyValueStoreError> {
        let mut records = self.table.get(Self::key()).await?.unwrap_or_default();
        if let Some(chain_id) = chain_id {
            records.retain(|record| record.chain_id == chain_id);
        }
        Ok(records)
    }
}
