use xabi_domain::{ChainId, CustomRpcEndpoint};

use crate::{KeyValueStoreError, Table};

pub const CUSTOM_ENDPOINTS_KEY: &str = "custom-rpc-nodes";

/// Persistent list of user-added RPC endpoints across all chains.
///
/// Uniqueness of URLs is enforced by the caller inside [`CustomEndpointStore::mutate`];
/// the store only keeps the active flag exclusive per chain.
#[derive(Clone)]
pub struct CustomEndpointStore {
    table: Table<Vec<CustomRpcEndpoint>>,
}

impl CustomEndpointStore {
    pub(crate) fn from_table(table: Table<Vec<CustomRpcEndpoint>>) -> Self {
        Self { table }
    }

    fn key() -> Vec<u8> {
        CUSTOM_ENDPOINTS_KEY.as_bytes().to_vec()
    }

    pub async fn list_all(&self) -> Result<Vec<CustomRpcEndpoint>, KeyValueStoreError> {
        Ok(self.table.get(Self::key()).await?.unwrap_or_default())
    }

    /// Custom endpoints for `chain_id`, in insertion order.
    pub async fn list_for_chain(
        &self,
        chain_id: ChainId,
    ) -> Result<Vec<CustomRpcEndpoint>, KeyValueStoreError> {
        let mut endpoints = self.list_all().await?;
        endpoints.retain(|endpoint| endpoint.chain_id == chain_id);
        Ok(endpoints)
    }

    pub async fn get(&self, id: &str) -> Result<Option<CustomRpcEndpoint>, KeyValueStoreError> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .find(|endpoint| endpoint.id == id))
    }

    /// Atomic read-modify-write over the whole list. Nothing is written when `f` fails.
    pub async fn mutate<F, T, E>(&self, f: F) -> Result<Result<T, E>, KeyValueStoreError>
    where
        F: FnOnce(&mut Vec<CustomRpcEndpoint>) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.table.mutate(Self::key(), Vec::new(), f).await
    }

    /// Remove the endpoint with `id`. Returns false when it did not exist.
    pub async fn remove(&self, id: &str) -> Result<bool, KeyValueStoreError> {
        let id = id.to_string();
        self.mutate(move |endpoints| {
            let before = endpoints.len();
            endpoints.retain(|endpoint| endpoint.id != id);
            Ok::<_, KeyValueStoreError>(endpoints.len() != before)
        })
        .await?
    }
}

/// Mark the endpoint with `id` active and clear the flag on every other
/// endpoint of the same chain. Endpoints of other chains are untouched.
pub fn activate_exclusively(endpoints: &mut [CustomRpcEndpoint], id: &str) {
    let Some(chain_id) = endpoints
        .iter()
        .find(|endpoint| endpoint.id == id)
        .map(|endpoint| endpoint.chain_id)
    else {
        return;
    };

    for endpoint in endpoints.iter_mut().filter(|e| e.chain_id == chain_id) {
        endpoint.is_active = endpoint.id == id;
    }
}
