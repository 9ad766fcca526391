use std::{sync::Arc, time::Instant};

use alloy::primitives::{Address, U256};
use chrono::Utc;
use xabi_domain::{ChainId, TransactionRecord};
use xabi_key_value_store::TransactionStore;
use xabi_observability::record_signing_stage;

use super::{AgentTransaction, SigningAgent};
use crate::{
    CallArguments, CallFailure, CallParams, ChainRpc, CompiledFunction, ErrorKind,
    OperationClass, endpoints::SelectedEndpoint,
};

/// Stages a write passes through: `Built → GasEstimated → Submitted → Confirmed | Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Built,
    GasEstimated,
    Submitted,
    Confirmed,
    Rejected,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Built => "built",
            PipelineStage::GasEstimated => "gas_estimated",
            PipelineStage::Submitted => "submitted",
            PipelineStage::Confirmed => "confirmed",
            PipelineStage::Rejected => "rejected",
        }
    }
}

/// Call-data encoded, nothing sent yet.
#[derive(Debug, Clone)]
struct Built {
    signature: String,
    from: Address,
    params: CallParams,
}

#[derive(Debug, Clone)]
struct GasEstimated {
    built: Built,
    gas_limit: u64,
}

/// Turns a write request into a broadcast transaction via the signing agent.
///
/// Each invocation runs once. Nothing is retried, and nothing reaches the
/// agent without a successful gas estimate.
pub struct SigningPipeline {
    rpc: Arc<dyn ChainRpc>,
    agent: Option<Arc<dyn SigningAgent>>,
    history: Option<TransactionStore>,
}

impl SigningPipeline {
    pub fn new(rpc: Arc<dyn ChainRpc>, agent: Option<Arc<dyn SigningAgent>>) -> Self {
        Self {
            rpc,
            agent,
            history: None,
        }
    }

    /// Append confirmed transactions to `store`.
    pub fn with_history(mut self, store: TransactionStore) -> Self {
        self.history = Some(store);
        self
    }

    pub fn agent(&self) -> Option<&Arc<dyn SigningAgent>> {
        self.agent.as_ref()
    }

    pub async fn execute(
        &self,
        function: &CompiledFunction,
        arguments: &CallArguments,
        payable_value_wei: Option<U256>,
        contract: Address,
        from: Address,
        endpoint: &SelectedEndpoint,
    ) -> Result<TransactionRecord, CallFailure> {
        let chain_id = endpoint.chain_id();

        let Some(agent) = self.agent.as_ref() else {
            record_stage(chain_id, PipelineStage::Rejected, "agent_not_found", Instant::now());
            return Err(CallFailure::new(
                ErrorKind::AgentNotFound,
                "Signing agent not found",
            ));
        };

        let built = self.build(function, arguments, payable_value_wei, contract, from, chain_id)?;
        let estimated = self.estimate_gas(built, endpoint).await?;
        let response = self.submit(agent.as_ref(), &estimated, chain_id).await?;
        let record = self.confirm(estimated, response, chain_id)?;

        if let Some(history) = &self.history {
            if let Err(e) = history.append(record.clone()).await {
                tracing::warn!(hash = %record.hash, error = %e, "Failed to record transaction history");
            }
        }

        Ok(record)
    }

    fn build(
        &self,
        function: &CompiledFunction,
        arguments: &CallArguments,
        payable_value_wei: Option<U256>,
        contract: Address,
        from: Address,
        chain_id: ChainId,
    ) -> Result<Built, CallFailure> {
        let started = Instant::now();

        if function.class() != OperationClass::Write {
            record_stage(chain_id, PipelineStage::Built, "error", started);
            return Err(CallFailure::new(
                ErrorKind::Validation,
                format!(
                    "{} is {} and cannot be sent as a transaction",
                    function.signature(),
                    function.descriptor().state_mutability
                ),
            ));
        }

        let value = if function.descriptor().state_mutability.is_payable() {
            payable_value_wei.unwrap_or(U256::ZERO)
        } else {
            if payable_value_wei.is_some_and(|value| !value.is_zero()) {
                tracing::debug!(
                    function = %function.signature(),
                    "Ignoring value for non-payable function"
                );
            }
            U256::ZERO
        };

        let data = function.encode_call(arguments).map_err(|e| {
            record_stage(chain_id, PipelineStage::Built, "error", started);
            CallFailure::new(e.kind(), e.to_string())
        })?;

        record_stage(chain_id, PipelineStage::Built, "success", started);
        Ok(Built {
            signature: function.signature().to_string(),
            from,
            params: CallParams {
                from: Some(from),
                to: contract,
                data,
                value,
            },
        })
    }

    async fn estimate_gas(
        &self,
        built: Built,
        endpoint: &SelectedEndpoint,
    ) -> Result<GasEstimated, CallFailure> {
        let started = Instant::now();
        match self.rpc.estimate_gas(endpoint, &built.params).await {
            Ok(gas_limit) => {
                record_stage(endpoint.chain_id(), PipelineStage::GasEstimated, "success", started);
                tracing::debug!(function = %built.signature, gas_limit, "Gas estimated");
                Ok(GasEstimated { built, gas_limit })
            }
            Err(e) => {
                record_stage(endpoint.chain_id(), PipelineStage::GasEstimated, "error", started);
                tracing::warn!(function = %built.signature, error = %e, "Gas estimation failed");
                Err(CallFailure::new(ErrorKind::GasEstimation, e.to_string()))
            }
        }
    }

    async fn submit(
        &self,
        agent: &dyn SigningAgent,
        estimated: &GasEstimated,
        chain_id: ChainId,
    ) -> Result<Option<String>, CallFailure> {
        let started = Instant::now();
        let params = &estimated.built.params;
        let tx = AgentTransaction {
            from: estimated.built.from,
            to: params.to,
            value: format!("{:#x}", params.value),
            data: params.data.clone(),
            gas: format!("{:#x}", estimated.gas_limit),
        };

        match agent.send_transaction(&tx).await {
            Ok(response) => {
                record_stage(chain_id, PipelineStage::Submitted, "success", started);
                Ok(response)
            }
            Err(e) => {
                record_stage(chain_id, PipelineStage::Rejected, "error", started);
                tracing::warn!(function = %estimated.built.signature, error = %e, "Signing agent rejected transaction");
                Err(CallFailure::new(ErrorKind::Signing, e.to_string()))
            }
        }
    }

    fn confirm(
        &self,
        estimated: GasEstimated,
        response: Option<String>,
        chain_id: ChainId,
    ) -> Result<TransactionRecord, CallFailure> {
        let started = Instant::now();
        let Some(hash) = response else {
            record_stage(chain_id, PipelineStage::Rejected, "no_identifier", started);
            return Err(CallFailure::new(
                ErrorKind::TransactionFailed,
                "Transaction Failed: signing agent returned no transaction hash",
            ));
        };

        record_stage(chain_id, PipelineStage::Confirmed, "success", started);
        tracing::info!(
            chain_id = %chain_id,
            function = %estimated.built.signature,
            hash = %hash,
            gas_limit = estimated.gas_limit,
            "Transaction submitted"
        );

        let GasEstimated { built, gas_limit } = estimated;
        Ok(TransactionRecord {
            hash,
            chain_id,
            to: built.params.to,
            from: built.from,
            data: built.params.data,
            value_wei: built.params.value,
            gas_limit,
            function_signature: built.signature,
            submitted_at: Utc::now(),
        })
    }
}

fn record_stage(chain_id: ChainId, stage: PipelineStage, status: &str, started: Instant) {
    record_signing_stage(chain_id.as_u64(), stage.as_str(), status, started.elapsed());
}

#[cfg(test)]
mod tests;
