use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use alloy::primitives::{Address, U256};
use dashmap::DashMap;
use futures::future::join_all;
use xabi_domain::{ChainId, TransactionRecord};

use crate::{
    CallArguments, CallDispatcher, CallFailure, CallRequest, CallResult, Classification,
    CompiledFunction, EndpointManager, ErrorKind, FunctionRegistry, OperationClass,
};

/// Latest result of one function slot and the version of the invocation
/// that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotResult {
    pub version: u64,
    pub result: CallResult,
}

/// A loaded contract: its classified functions and the latest read result
/// per function.
///
/// Every invocation takes a version when it starts. A result only replaces
/// the stored one when its version is newer, so a slow read never hides a
/// later one for the same function.
pub struct ContractSession {
    address: Address,
    chain_id: ChainId,
    registry: FunctionRegistry,
    classification: Classification,
    dispatcher: Arc<CallDispatcher>,
    endpoints: Arc<EndpointManager>,
    account: Option<Address>,
    results: DashMap<String, SlotResult>,
    versions: AtomicU64,
}

impl ContractSession {
    /// Classify the contract and auto-invoke its eligible reads.
    pub async fn load(
        address: Address,
        chain_id: ChainId,
        registry: FunctionRegistry,
        dispatcher: Arc<CallDispatcher>,
        endpoints: Arc<EndpointManager>,
        account: Option<Address>,
    ) -> Self {
        let classification = registry.classification();
        let session = Self {
            address,
            chain_id,
            registry,
            classification,
            dispatcher,
            endpoints,
            account,
            results: DashMap::new(),
            versions: AtomicU64::new(0),
        };

        let invocations = session.auto_invocations();
        tracing::info!(
            contract = %address,
            chain_id = %chain_id,
            functions = session.classification.total(),
            auto_invoked = invocations.len(),
            "Contract loaded"
        );
        session.invoke_all(invocations).await;
        session
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    /// Re-run every zero-input read.
    pub async fn refresh(&self) {
        let invocations = self
            .registry
            .functions()
            .iter()
            .filter(|function| function.class() == OperationClass::ReadNoInput)
            .map(|function| (Arc::clone(function), CallArguments::new()))
            .collect();
        self.invoke_all(invocations).await;
    }

    /// Read `name_or_signature` with explicit arguments.
    pub async fn read(&self, name_or_signature: &str, arguments: CallArguments) -> CallResult {
        match self.registry.resolve(name_or_signature) {
            Ok(function) => self.invoke(function, arguments).await,
            Err(e) => CallFailure::new(e.kind(), e.to_string()).into(),
        }
    }

    /// Send `name_or_signature` as a transaction from the connected account.
    pub async fn write(
        &self,
        name_or_signature: &str,
        arguments: CallArguments,
        payable_value_wei: Option<U256>,
    ) -> Result<TransactionRecord, CallFailure> {
        let function = self
            .registry
            .resolve(name_or_signature)
            .map_err(|e| CallFailure::new(e.kind(), e.to_string()))?;

        let Some(from) = self.account else {
            return Err(CallFailure::new(
                ErrorKind::AgentNotFound,
                "No wallet account connected",
            ));
        };

        let endpoint = self.endpoints.selected_for(self.chain_id).await?;
        let mut request = CallRequest::new(function, arguments);
        request.payable_value_wei = payable_value_wei;

        self.dispatcher
            .invoke_write(self.address, &request, &endpoint, from)
            .await
    }

    /// Latest result for the function with `signature`.
    pub fn result(&self, signature: &str) -> Option<SlotResult> {
        self.results.get(signature).map(|slot| slot.clone())
    }

    /// Latest results in ABI order.
    pub fn results(&self) -> Vec<(String, SlotResult)> {
        self.registry
            .functions()
            .iter()
            .filter_map(|function| {
                self.result(function.signature())
                    .map(|slot| (function.signature().to_string(), slot))
            })
            .collect()
    }

    /// Zero-input reads, plus reads taking only one address when an account
    /// is connected. The account fills that single parameter whatever its
    /// name.
    fn auto_invocations(&self) -> Vec<(Arc<CompiledFunction>, CallArguments)> {
        self.registry
            .functions()
            .iter()
            .filter_map(|function| {
                let descriptor = function.descriptor();
                let arguments = match function.class() {
                    OperationClass::ReadNoInput => Some(CallArguments::new()),
                    OperationClass::ReadWithInput => {
                        let account = self.account?;
                        match descriptor.inputs.as_slice() {
                            [only] if only.ty == "address" => {
                                let mut arguments = CallArguments::new();
                                arguments.insert(descriptor.argument_key(0), account.to_checksum(None));
                                Some(arguments)
                            }
                            _ => None,
                        }
                    }
                    OperationClass::Write => None,
                };
                arguments.map(|arguments| (Arc::clone(function), arguments))
            })
            .collect()
    }

    async fn invoke_all(&self, invocations: Vec<(Arc<CompiledFunction>, CallArguments)>) {
        join_all(
            invocations
                .into_iter()
                .map(|(function, arguments)| self.invoke(function, arguments)),
        )
        .await;
    }

    async fn invoke(&self, function: Arc<CompiledFunction>, arguments: CallArguments) -> CallResult {
        let version = self.versions.fetch_add(1, Ordering::SeqCst) + 1;
        let signature = function.signature().to_string();

        let result = match self.endpoints.selected_for(self.chain_id).await {
            Ok(endpoint) => {
                let request = CallRequest::new(function, arguments);
                self.dispatcher
                    .invoke_read(self.address, &request, &endpoint, self.account)
                    .await
            }
            Err(e) => CallFailure::from(e).into(),
        };

        self.commit(signature, version, result.clone());
        result
    }

    fn commit(&self, signature: String, version: u64, result: CallResult) {
        let mut slot = self.results.entry(signature).or_insert(SlotResult {
            version: 0,
            result: result.clone(),
        });
        if version < slot.version {
            tracing::debug!(
                signature = %slot.key(),
                version,
                current = slot.version,
                "Discarding stale read result"
            );
            return;
        }
        *slot = SlotResult { version, result };
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use alloy::{
        dyn_abi::DynSolValue,
        primitives::{Bytes, U256},
    };
    use tempfile::TempDir;
    use xabi_domain::ChainDescriptor;
    use xabi_key_value_store::{KeyValueStoreManager, KeyValueStoreManagerConfig};

    use super::*;
    use crate::{
        ChainRegistry, ChainRpcError, SigningPipeline,
        test_support::{FakeChainRpc, RecordingProber, token_abi, uint_word},
    };

    const CONTRACT: Address = Address::repeat_byte(0xc0);
    const ACCOUNT: Address = Address::repeat_byte(0x11);
    const CHAIN: ChainId = ChainId::new(1);

    const TOTAL_SUPPLY: [u8; 4] = [0x18, 0x16, 0x0d, 0xdd];
    const NAME: [u8; 4] = [0x06, 0xfd, 0xde, 0x03];
    const BALANCE_OF: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

    fn huge_supply() -> U256 {
        U256::from(2u64).pow(U256::from(60u64)) + U256::from(7u64)
    }

    fn token_node() -> FakeChainRpc {
        FakeChainRpc::with_call_handler(|params| {
            let selector: [u8; 4] = params.data[..4].try_into().unwrap();
            match selector {
                TOTAL_SUPPLY => Ok(uint_word(huge_supply())),
                NAME => Ok(Bytes::from(
                    DynSolValue::Tuple(vec![DynSolValue::String("Token".to_string())])
                        .abi_encode_params(),
                )),
                BALANCE_OF => Ok(uint_word(U256::from(42u64))),
                _ => Err(ChainRpcError::Reverted {
                    reason: "unexpected call".to_string(),
                }),
            }
        })
    }

    struct Fixture {
        _temp_dir: TempDir,
        rpc: Arc<FakeChainRpc>,
        dispatcher: Arc<CallDispatcher>,
        endpoints: Arc<EndpointManager>,
    }

    async fn fixture(rpc: FakeChainRpc) -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let kv = KeyValueStoreManager::connect(
            temp_dir.path().join("test.redb"),
            &KeyValueStoreManagerConfig::default(),
        )
        .await
        .unwrap();
        let chains = Arc::new(ChainRegistry::new(vec![ChainDescriptor {
            id: CHAIN,
            name: "Ethereum".to_string(),
            native_token_symbol: "ETH".to_string(),
            default_rpc_endpoints: vec!["https://rpc.example".to_string()],
            block_explorer_url: None,
        }]));
        let endpoints = Arc::new(EndpointManager::new(
            chains,
            kv.custom_endpoint_store(),
            Arc::new(RecordingProber::default()),
        ));

        let rpc = Arc::new(rpc);
        let dispatcher = Arc::new(CallDispatcher::new(
            rpc.clone(),
            SigningPipeline::new(rpc.clone(), None),
        ));

        Fixture {
            _temp_dir: temp_dir,
            rpc,
            dispatcher,
            endpoints,
        }
    }

    async fn load(f: &Fixture, account: Option<Address>) -> ContractSession {
        ContractSession::load(
            CONTRACT,
            CHAIN,
            FunctionRegistry::from_json(token_abi()).unwrap(),
            f.dispatcher.clone(),
            f.endpoints.clone(),
            account,
        )
        .await
    }

    #[tokio::test]
    async fn test_load_auto_invokes_zero_input_reads() {
        let f = fixture(token_node()).await;
        let session = load(&f, None).await;

        assert_eq!(
            session.result("totalSupply()").unwrap().result,
            CallResult::success("1152921504606846983")
        );
        assert_eq!(
            session.result("name()").unwrap().result,
            CallResult::success("Token")
        );
        // Parameterised reads wait for the user without an account.
        assert!(session.result("balanceOf(address)").is_none());
        assert!(session.result("transfer(address,uint256)").is_none());
        assert_eq!(f.rpc.calls().len(), 2);
        assert!(f.rpc.calls().iter().all(|(endpoint, _)| endpoint.url() == "https://rpc.example"));
    }

    #[tokio::test]
    async fn test_load_queries_own_balance_when_account_connected() {
        let f = fixture(token_node()).await;
        let session = load(&f, Some(ACCOUNT)).await;

        assert_eq!(
            session.result("balanceOf(address)").unwrap().result,
            CallResult::success("42")
        );
        // Two address parameters are never guessed.
        assert!(session.result("allowance(address,address)").is_none());

        let balance_call = f
            .rpc
            .calls()
            .into_iter()
            .find(|(_, params)| params.data[..4] == BALANCE_OF)
            .unwrap();
        assert_eq!(&balance_call.1.data[16..36], ACCOUNT.as_slice());
        assert_eq!(balance_call.1.from, Some(ACCOUNT));
    }

    #[tokio::test]
    async fn test_failed_read_is_confined_to_its_slot() {
        let f = fixture(FakeChainRpc::with_call_handler(|params| {
            if params.data[..4] == NAME {
                Err(ChainRpcError::Reverted {
                    reason: "no name".to_string(),
                })
            } else {
                Ok(uint_word(U256::from(1u64)))
            }
        }))
        .await;
        let session = load(&f, None).await;

        assert_eq!(
            session.result("name()").unwrap().result.kind(),
            Some(ErrorKind::CallExecution)
        );
        assert!(session.result("totalSupply()").unwrap().result.is_success());
        assert_eq!(session.classification().total(), 6);
    }

    #[tokio::test]
    async fn test_refresh_and_explicit_reads_bump_versions() {
        let f = fixture(token_node()).await;
        let session = load(&f, None).await;
        let before = session.result("totalSupply()").unwrap().version;

        session.refresh().await;
        assert!(session.result("totalSupply()").unwrap().version > before);

        let arguments: CallArguments = [("owner", "0x1111111111111111111111111111111111111111")]
            .into_iter()
            .collect();
        assert_eq!(session.read("balanceOf", arguments).await, CallResult::success("42"));
        assert_eq!(
            session.read("burn", CallArguments::new()).await.kind(),
            Some(ErrorKind::Validation)
        );

        let names: Vec<String> = session.results().into_iter().map(|(sig, _)| sig).collect();
        assert_eq!(names, vec!["name()", "totalSupply()", "balanceOf(address)"]);
    }

    #[tokio::test]
    async fn test_stale_result_never_replaces_newer_one() {
        let f = fixture(token_node()).await;
        let session = load(&f, None).await;

        session.commit("name()".to_string(), 100, CallResult::success("new"));
        session.commit("name()".to_string(), 99, CallResult::success("old"));

        let slot = session.result("name()").unwrap();
        assert_eq!(slot.version, 100);
        assert_eq!(slot.result, CallResult::success("new"));
    }

    #[tokio::test]
    async fn test_write_without_account_or_agent() {
        let f = fixture(token_node()).await;
        let arguments: CallArguments = [
            ("to", "0x2222222222222222222222222222222222222222"),
            ("amount", "1"),
        ]
        .into_iter()
        .collect();

        let session = load(&f, None).await;
        let err = session.write("transfer", arguments.clone(), None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AgentNotFound);

        let session = load(&f, Some(ACCOUNT)).await;
        let err = session.write("transfer", arguments, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::AgentNotFound);
        assert!(f.rpc.estimates().is_empty());
    }
}
