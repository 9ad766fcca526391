use std::{sync::Arc, time::Instant};

use alloy::primitives::{Address, U256};
use xabi_domain::TransactionRecord;
use xabi_observability::record_contract_read;

use crate::{
    CallArguments, CallFailure, CallParams, CallResult, ChainRpc, CompiledFunction, ErrorKind,
    OperationClass, SigningPipeline, endpoints::SelectedEndpoint,
};

/// One invocation of one function.
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub function: Arc<CompiledFunction>,
    pub arguments: CallArguments,
    /// Only honoured for payable functions.
    pub payable_value_wei: Option<U256>,
}

impl CallRequest {
    pub fn new(function: Arc<CompiledFunction>, arguments: CallArguments) -> Self {
        Self {
            function,
            arguments,
            payable_value_wei: None,
        }
    }

    pub fn with_value(mut self, value_wei: U256) -> Self {
        self.payable_value_wei = Some(value_wei);
        self
    }
}

/// Executes compiled functions against an explicitly passed endpoint.
///
/// Never changes endpoint selection. Failures are confined to the invocation
/// that produced them.
pub struct CallDispatcher {
    rpc: Arc<dyn ChainRpc>,
    pipeline: SigningPipeline,
}

impl CallDispatcher {
    pub fn new(rpc: Arc<dyn ChainRpc>, pipeline: SigningPipeline) -> Self {
        Self { rpc, pipeline }
    }

    pub fn rpc(&self) -> &Arc<dyn ChainRpc> {
        &self.rpc
    }

    pub fn pipeline(&self) -> &SigningPipeline {
        &self.pipeline
    }

    /// `eth_call` a read-only function and render its return value.
    pub async fn invoke_read(
        &self,
        contract: Address,
        request: &CallRequest,
        endpoint: &SelectedEndpoint,
        from: Option<Address>,
    ) -> CallResult {
        let started = Instant::now();
        let result = self.read(contract, request, endpoint, from).await;
        let status = match &result {
            Ok(_) => "success",
            Err(failure) => failure.kind.as_str(),
        };
        record_contract_read(endpoint.chain_id().as_u64(), status, started.elapsed());

        match result {
            Ok(decoded_value) => CallResult::success(decoded_value),
            Err(failure) => {
                tracing::debug!(
                    function = %request.function.signature(),
                    error = %failure,
                    "Read call failed"
                );
                failure.into()
            }
        }
    }

    async fn read(
        &self,
        contract: Address,
        request: &CallRequest,
        endpoint: &SelectedEndpoint,
        from: Option<Address>,
    ) -> Result<String, CallFailure> {
        let function = &request.function;
        if function.class() == OperationClass::Write {
            return Err(CallFailure::new(
                ErrorKind::Validation,
                format!("{} is not a read-only function", function.signature()),
            ));
        }

        let call_failure = |message: String| CallFailure::new(ErrorKind::CallExecution, message);

        let data = function
            .encode_call(&request.arguments)
            .map_err(|e| call_failure(e.to_string()))?;
        let params = CallParams {
            from,
            to: contract,
            data,
            value: U256::ZERO,
        };

        let output = self
            .rpc
            .call(endpoint, &params)
            .await
            .map_err(|e| call_failure(e.to_string()))?;

        function
            .decode_output(&output)
            .map_err(|e| call_failure(e.to_string()))
    }

    /// Hand a state-changing function to the signing pipeline.
    pub async fn invoke_write(
        &self,
        contract: Address,
        request: &CallRequest,
        endpoint: &SelectedEndpoint,
        from: Address,
    ) -> Result<TransactionRecord, CallFailure> {
        self.pipeline
            .execute(
                &request.function,
                &request.arguments,
                request.payable_value_wei,
                contract,
                from,
                endpoint,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Arc;

    use alloy::primitives::{Bytes, U256};
    use xabi_domain::ChainId;

    use super::*;
    use crate::{
        ChainRpcError, FunctionRegistry,
        test_support::{FakeChainRpc, token_abi, uint_word},
    };

    const CONTRACT: Address = Address::repeat_byte(0xc0);

    fn dispatcher(rpc: Arc<FakeChainRpc>) -> CallDispatcher {
        CallDispatcher::new(rpc.clone(), SigningPipeline::new(rpc, None))
    }

    fn endpoint() -> SelectedEndpoint {
        SelectedEndpoint::new(ChainId::new(1), "http://node.local")
    }

    #[tokio::test]
    async fn test_total_supply_beyond_f64_precision_is_exact() {
        let registry = FunctionRegistry::from_json(token_abi()).unwrap();
        let total_supply = registry.resolve("totalSupply").unwrap();
        let huge = U256::from(2u64).pow(U256::from(53u64)) + U256::from(1u64);

        let rpc = Arc::new(FakeChainRpc::default());
        rpc.push_call(Ok(uint_word(huge)));

        let result = dispatcher(rpc.clone())
            .invoke_read(CONTRACT, &CallRequest::new(total_supply, CallArguments::new()), &endpoint(), None)
            .await;

        assert_eq!(result, CallResult::success("9007199254740993"));
        let calls = rpc.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.to, CONTRACT);
        assert_eq!(&calls[0].1.data[..], &[0x18, 0x16, 0x0d, 0xdd]);
    }

    #[tokio::test]
    async fn test_read_failures_are_call_execution_errors() {
        let registry = FunctionRegistry::from_json(token_abi()).unwrap();
        let balance_of = registry.resolve("balanceOf").unwrap();
        let rpc = Arc::new(FakeChainRpc::default());
        let dispatcher = dispatcher(rpc.clone());

        // Missing argument never reaches the network.
        let result = dispatcher
            .invoke_read(CONTRACT, &CallRequest::new(balance_of.clone(), CallArguments::new()), &endpoint(), None)
            .await;
        assert_eq!(result.kind(), Some(ErrorKind::CallExecution));
        assert!(rpc.calls().is_empty());

        rpc.push_call(Err(ChainRpcError::Reverted {
            reason: "revert: paused".to_string(),
        }));
        let arguments: CallArguments = [("owner", "0x1111111111111111111111111111111111111111")]
            .into_iter()
            .collect();
        let result = dispatcher
            .invoke_read(CONTRACT, &CallRequest::new(balance_of.clone(), arguments.clone()), &endpoint(), None)
            .await;
        match result {
            CallResult::Failure { kind, message } => {
                assert_eq!(kind, ErrorKind::CallExecution);
                assert!(message.contains("paused"));
            }
            other => panic!("expected failure, got {other:?}"),
        }

        rpc.push_call(Ok(Bytes::from_static(&[0x01])));
        let result = dispatcher
            .invoke_read(CONTRACT, &CallRequest::new(balance_of, arguments), &endpoint(), None)
            .await;
        assert_eq!(result.kind(), Some(ErrorKind::CallExecution));
    }

    #[tokio::test]
    async fn test_write_functions_are_not_read() {
        let registry = FunctionRegistry::from_json(token_abi()).unwrap();
        let transfer = registry.resolve("transfer").unwrap();
        let rpc = Arc::new(FakeChainRpc::default());

        let result = dispatcher(rpc.clone())
            .invoke_read(CONTRACT, &CallRequest::new(transfer, CallArguments::new()), &endpoint(), None)
            .await;
        assert_eq!(result.kind(), Some(ErrorKind::Validation));
        assert!(rpc.calls().is_empty());
    }
}
