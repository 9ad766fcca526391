mod prober;

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Instant,
};

use chrono::Utc;
use reqwest::Url;
use tokio::sync::RwLock;
use xabi_domain::{ChainId, CustomRpcEndpoint, RpcEndpoint};
use xabi_key_value_store::{CustomEndpointStore, activate_exclusively};
use xabi_observability::{
    record_custom_endpoint_change, record_endpoint_probe, record_endpoint_selection,
};

pub use prober::{EndpointProber, HttpProber, ProbeReport};

use crate::{ChainRegistry, EndpointError};

/// The endpoint calls are currently routed to, and the chain it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedEndpoint {
    chain_id: ChainId,
    url: String,
}

impl SelectedEndpoint {
    pub fn new(chain_id: ChainId, url: impl Into<String>) -> Self {
        Self {
            chain_id,
            url: url.into(),
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Display for SelectedEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (chain {})", self.url, self.chain_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewCustomEndpoint {
    pub name: String,
    pub url: String,
    pub chain_id: ChainId,
    pub make_active: bool,
}

#[derive(Debug, Clone)]
pub struct CustomEndpointUpdate {
    pub name: String,
    pub url: String,
    pub make_active: bool,
}

#[derive(Debug, Default)]
struct SelectionState {
    selected: Option<SelectedEndpoint>,
    /// Ticket of the operation that wrote `selected`.
    generation: u64,
}

/// Owns the candidate endpoints per chain and the single selected endpoint.
///
/// Only [`EndpointManager::set_active`] and [`EndpointManager::select_best_available`]
/// change the selection. Each of them takes a ticket when it starts; a result
/// whose ticket is older than the last written one is discarded, so a slow
/// selection never overwrites a newer one.
pub struct EndpointManager {
    chains: Arc<ChainRegistry>,
    store: CustomEndpointStore,
    prober: Arc<dyn EndpointProber>,
    state: RwLock<SelectionState>,
    tickets: AtomicU64,
}

impl EndpointManager {
    pub fn new(
        chains: Arc<ChainRegistry>,
        store: CustomEndpointStore,
        prober: Arc<dyn EndpointProber>,
    ) -> Self {
        Self {
            chains,
            store,
            prober,
            state: RwLock::new(SelectionState::default()),
            tickets: AtomicU64::new(0),
        }
    }

    pub fn chains(&self) -> &ChainRegistry {
        &self.chains
    }

    pub async fn selected(&self) -> Option<SelectedEndpoint> {
        self.state.read().await.selected.clone()
    }

    /// The selected endpoint if it belongs to `chain_id`.
    ///
    /// When the selection belongs to another chain (the wallet switched
    /// network underneath us), the first listed endpoint of `chain_id` is
    /// returned instead. The stored selection is not changed.
    pub async fn selected_for(&self, chain_id: ChainId) -> Result<SelectedEndpoint, EndpointError> {
        if let Some(selected) = self.selected().await {
            if selected.chain_id() == chain_id {
                return Ok(selected);
            }
            tracing::warn!(
                selected = %selected,
                chain_id = %chain_id,
                "Selected endpoint belongs to another chain; using first listed endpoint"
            );
        }

        let candidates = self.list_endpoints(chain_id).await?;
        fallback_candidate(&candidates)
            .map(|endpoint| SelectedEndpoint::new(chain_id, endpoint.url()))
            .ok_or(EndpointError::NoCandidates { chain_id })
    }

    /// Default endpoints in directory order, then custom endpoints in insertion order.
    pub async fn list_endpoints(&self, chain_id: ChainId) -> Result<Vec<RpcEndpoint>, EndpointError> {
        let mut endpoints: Vec<RpcEndpoint> = self
            .default_urls(chain_id)
            .into_iter()
            .map(|url| RpcEndpoint::Default { chain_id, url })
            .collect();

        endpoints.extend(
            self.store
                .list_for_chain(chain_id)
                .await?
                .into_iter()
                .map(RpcEndpoint::Custom),
        );

        Ok(endpoints)
    }

    pub async fn list_custom_endpoints(
        &self,
        chain_id: Option<ChainId>,
    ) -> Result<Vec<CustomRpcEndpoint>, EndpointError> {
        Ok(match chain_id {
            Some(chain_id) => self.store.list_for_chain(chain_id).await?,
            None => self.store.list_all().await?,
        })
    }

    pub async fn probe(&self, url: &str) -> bool {
        let started = Instant::now();
        let reachable = self.prober.probe(url).await;
        record_endpoint_probe(reachable, started.elapsed());
        reachable
    }

    pub async fn test_endpoint(&self, url: &str) -> ProbeReport {
        let started = Instant::now();
        let reachable = self.probe(url).await;
        ProbeReport {
            url: url.to_string(),
            reachable,
            latency: started.elapsed(),
        }
    }

    /// Probe candidates strictly in list order and select the first live one.
    ///
    /// A single candidate is selected without probing. When nothing answers,
    /// the first default endpoint (or the first candidate when the chain has
    /// no defaults) is selected anyway.
    pub async fn select_best_available(
        &self,
        chain_id: ChainId,
    ) -> Result<SelectedEndpoint, EndpointError> {
        let ticket = self.next_ticket();
        let candidates = self.list_endpoints(chain_id).await?;

        let (url, outcome, probes) = match candidates.as_slice() {
            [] => return Err(EndpointError::NoCandidates { chain_id }),
            [only] => (only.url().to_string(), "single", 0),
            _ => {
                let mut probes = 0;
                let mut live = None;
                for candidate in &candidates {
                    probes += 1;
                    if self.probe(candidate.url()).await {
                        live = Some(candidate.url().to_string());
                        break;
                    }
                    tracing::debug!(chain_id = %chain_id, url = %candidate.url(), "Endpoint unreachable");
                }

                match live {
                    Some(url) => (url, "probed", probes),
                    None => {
                        let fallback = fallback_candidate(&candidates)
                            .map(|endpoint| endpoint.url().to_string())
                            .ok_or(EndpointError::NoCandidates { chain_id })?;
                        tracing::warn!(
                            chain_id = %chain_id,
                            url = %fallback,
                            probes,
                            "No endpoint reachable; falling back to first default"
                        );
                        (fallback, "fallback", probes)
                    }
                }
            }
        };

        record_endpoint_selection(chain_id.as_u64(), outcome, probes);
        let selected = SelectedEndpoint::new(chain_id, url);
        self.commit(ticket, selected.clone()).await;
        Ok(selected)
    }

    /// Select `url` for `chain_id` without probing.
    pub async fn set_active(&self, chain_id: ChainId, url: &str) -> SelectedEndpoint {
        let ticket = self.next_ticket();
        let selected = SelectedEndpoint::new(chain_id, url.trim());
        record_endpoint_selection(chain_id.as_u64(), "override", 0);
        self.commit(ticket, selected.clone()).await;
        selected
    }

    /// Make `chain_id` the active chain.
    ///
    /// A custom endpoint marked active for the chain is selected as is;
    /// otherwise the best available endpoint is selected.
    pub async fn switch_chain(&self, chain_id: ChainId) -> Result<SelectedEndpoint, EndpointError> {
        let active_custom = self
            .store
            .list_for_chain(chain_id)
            .await?
            .into_iter()
            .find(|endpoint| endpoint.is_active);

        let selected = match active_custom {
            Some(endpoint) => self.set_active(chain_id, &endpoint.url).await,
            None => self.select_best_available(chain_id).await?,
        };

        tracing::info!(chain_id = %chain_id, endpoint = %selected.url(), "Switched chain");
        Ok(selected)
    }

    pub async fn add_custom_endpoint(
        &self,
        request: NewCustomEndpoint,
    ) -> Result<CustomRpcEndpoint, EndpointError> {
        let result = self.add_custom_endpoint_inner(request.clone()).await;
        record_custom_endpoint_change(request.chain_id.as_u64(), "add", status_label(&result));
        result
    }

    async fn add_custom_endpoint_inner(
        &self,
        request: NewCustomEndpoint,
    ) -> Result<CustomRpcEndpoint, EndpointError> {
        let name = require_field("name", &request.name)?;
        let url = require_field("url", &request.url)?;
        validate_url(&url)?;

        let chain_id = request.chain_id;
        let defaults = self.default_urls(chain_id);
        let existing = self.store.list_for_chain(chain_id).await?;
        ensure_unique(&defaults, &existing, chain_id, &url, None)?;

        if !self.probe(&url).await {
            return Err(EndpointError::Unreachable { url });
        }

        let endpoint = CustomRpcEndpoint {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            url: url.clone(),
            chain_id,
            is_active: request.make_active,
            created_at: Utc::now(),
        };

        let inserted = endpoint.clone();
        self.store
            .mutate(move |endpoints| {
                ensure_unique(&defaults, endpoints, chain_id, &inserted.url, None)?;
                let id = inserted.id.clone();
                let make_active = inserted.is_active;
                endpoints.push(inserted);
                if make_active {
                    activate_exclusively(endpoints, &id);
                }
                Ok::<_, EndpointError>(())
            })
            .await??;

        tracing::info!(
            chain_id = %chain_id,
            url = %endpoint.url,
            active = endpoint.is_active,
            "Added custom RPC endpoint"
        );

        if endpoint.is_active {
            self.set_active(chain_id, &endpoint.url).await;
        }

        Ok(endpoint)
    }

    /// Rename, re-point or (de)activate a custom endpoint.
    ///
    /// A changed URL is validated, deduplicated and probed like a new one.
    pub async fn update_custom_endpoint(
        &self,
        id: &str,
        update: CustomEndpointUpdate,
    ) -> Result<CustomRpcEndpoint, EndpointError> {
        let result = self.update_custom_endpoint_inner(id, update).await;
        let chain_id = result.as_ref().map(|e| e.chain_id.as_u64()).unwrap_or_default();
        record_custom_endpoint_change(chain_id, "update", status_label(&result));
        result
    }

    async fn update_custom_endpoint_inner(
        &self,
        id: &str,
        update: CustomEndpointUpdate,
    ) -> Result<CustomRpcEndpoint, EndpointError> {
        let name = require_field("name", &update.name)?;
        let url = require_field("url", &update.url)?;
        validate_url(&url)?;

        let current = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| EndpointError::NotFound { id: id.to_string() })?;
        let chain_id = current.chain_id;
        let defaults = self.default_urls(chain_id);

        if !current.has_url(&url) {
            let existing = self.store.list_for_chain(chain_id).await?;
            ensure_unique(&defaults, &existing, chain_id, &url, Some(id))?;
            if !self.probe(&url).await {
                return Err(EndpointError::Unreachable { url });
            }
        }

        let id = id.to_string();
        let make_active = update.make_active;
        let updated = self
            .store
            .mutate(move |endpoints| {
                ensure_unique(&defaults, endpoints, chain_id, &url, Some(&id))?;
                let endpoint = endpoints
                    .iter_mut()
                    .find(|endpoint| endpoint.id == id)
                    .ok_or_else(|| EndpointError::NotFound { id: id.clone() })?;
                endpoint.name = name;
                endpoint.url = url;
                endpoint.is_active = make_active;
                let updated = endpoint.clone();
                if make_active {
                    activate_exclusively(endpoints, &id);
                }
                Ok::<_, EndpointError>(updated)
            })
            .await??;

        tracing::info!(
            chain_id = %chain_id,
            id = %updated.id,
            url = %updated.url,
            active = updated.is_active,
            "Updated custom RPC endpoint"
        );

        if updated.is_active {
            self.set_active(chain_id, &updated.url).await;
        }

        Ok(updated)
    }

    /// Remove a custom endpoint. The current selection is left untouched.
    pub async fn remove_custom_endpoint(&self, id: &str) -> Result<(), EndpointError> {
        let existing = self.store.get(id).await?;
        let removed = self.store.remove(id).await?;
        let chain_id = existing.map(|e| e.chain_id.as_u64()).unwrap_or_default();

        if !removed {
            record_custom_endpoint_change(chain_id, "remove", "error");
            return Err(EndpointError::NotFound { id: id.to_string() });
        }

        record_custom_endpoint_change(chain_id, "remove", "success");
        tracing::info!(id = %id, "Removed custom RPC endpoint");
        Ok(())
    }

    fn default_urls(&self, chain_id: ChainId) -> Vec<String> {
        self.chains
            .get(chain_id)
            .map(|chain| chain.default_rpc_endpoints.clone())
            .unwrap_or_default()
    }

    fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn commit(&self, ticket: u64, selected: SelectedEndpoint) {
        let mut state = self.state.write().await;
        if ticket < state.generation {
            tracing::debug!(
                ticket,
                current = state.generation,
                endpoint = %selected,
                "Discarding stale endpoint selection"
            );
            return;
        }

        state.generation = ticket;
        state.selected = Some(selected);
    }
}

fn fallback_candidate(candidates: &[RpcEndpoint]) -> Option<&RpcEndpoint> {
    candidates
        .iter()
        .find(|endpoint| matches!(endpoint, RpcEndpoint::Default { .. }))
        .or_else(|| candidates.first())
}

fn require_field(field: &'static str, value: &str) -> Result<String, EndpointError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(EndpointError::MissingField { field });
    }
    Ok(value.to_string())
}

fn validate_url(url: &str) -> Result<(), EndpointError> {
    let invalid = |reason: String| EndpointError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "scheme '{}' is not http or https",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}

/// URLs are unique per chain across default and custom endpoints, ignoring case.
fn ensure_unique(
    defaults: &[String],
    customs: &[CustomRpcEndpoint],
    chain_id: ChainId,
    url: &str,
    except_id: Option<&str>,
) -> Result<(), EndpointError> {
    let clashes_default = defaults.iter().any(|d| d.trim().eq_ignore_ascii_case(url));
    let clashes_custom = customs.iter().any(|custom| {
        custom.chain_id == chain_id && Some(custom.id.as_str()) != except_id && custom.has_url(url)
    });

    if clashes_default || clashes_custom {
        return Err(EndpointError::Duplicate {
            url: url.to_string(),
            chain_id,
        });
    }
    Ok(())
}

fn status_label<T>(result: &Result<T, EndpointError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(e) => e.kind().as_str(),
    }
}
