#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use tempfile::TempDir;
use xabi_domain::ChainId;
use xabi_key_value_store::{KeyValueStoreManager, KeyValueStoreManagerConfig};

use super::*;
use crate::{
    ChainRpcError, FunctionRegistry,
    test_support::{FakeAgent, FakeChainRpc, token_abi},
};

const CONTRACT: Address = Address::repeat_byte(0xc0);
const ACCOUNT: Address = Address::repeat_byte(0x11);

fn endpoint() -> SelectedEndpoint {
    SelectedEndpoint::new(ChainId::new(31337), "http://127.0.0.1:8545")
}

fn transfer_arguments() -> CallArguments {
    [
        ("to", "0x2222222222222222222222222222222222222222"),
        ("amount", "1000"),
    ]
    .into_iter()
    .collect()
}

fn pipeline(rpc: &Arc<FakeChainRpc>, agent: &Arc<FakeAgent>) -> SigningPipeline {
    SigningPipeline::new(rpc.clone(), Some(agent.clone()))
}

#[tokio::test]
async fn test_missing_agent_fails_before_gas_estimation() {
    let registry = FunctionRegistry::from_json(token_abi()).unwrap();
    let transfer = registry.resolve("transfer").unwrap();
    let rpc = Arc::new(FakeChainRpc::default());
    let pipeline = SigningPipeline::new(rpc.clone(), None);

    let err = pipeline
        .execute(&transfer, &transfer_arguments(), None, CONTRACT, ACCOUNT, &endpoint())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::AgentNotFound);
    assert!(rpc.estimates().is_empty());
}

#[tokio::test]
async fn test_revert_during_estimation_never_reaches_agent() {
    let registry = FunctionRegistry::from_json(token_abi()).unwrap();
    let transfer = registry.resolve("transfer").unwrap();
    let rpc = Arc::new(FakeChainRpc::default());
    rpc.push_estimate(Err(ChainRpcError::Reverted {
        reason: "revert: ERC20: transfer amount exceeds balance".to_string(),
    }));
    let agent = Arc::new(FakeAgent::new(ACCOUNT, ChainId::new(31337)));

    let err = pipeline(&rpc, &agent)
        .execute(&transfer, &transfer_arguments(), None, CONTRACT, ACCOUNT, &endpoint())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::GasEstimation);
    assert!(err.message.contains("exceeds balance"));
    assert!(agent.sent().is_empty());
}

#[tokio::test]
async fn test_submits_hex_quantities_with_estimated_gas() {
    let registry = FunctionRegistry::from_json(token_abi()).unwrap();
    let transfer = registry.resolve("transfer").unwrap();
    let rpc = Arc::new(FakeChainRpc::default());
    rpc.push_estimate(Ok(51_234));
    let agent = Arc::new(FakeAgent::new(ACCOUNT, ChainId::new(31337)));
    agent.respond_with(Ok(Some("0xfeed".to_string())));

    let record = pipeline(&rpc, &agent)
        .execute(
            &transfer,
            &transfer_arguments(),
            Some(U256::from(5u64)),
            CONTRACT,
            ACCOUNT,
            &endpoint(),
        )
        .await
        .unwrap();

    assert_eq!(record.hash, "0xfeed");
    assert_eq!(record.gas_limit, 51_234);
    assert_eq!(record.function_signature, "transfer(address,uint256)");

    let sent = agent.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].gas, "0xc822");
    // Value is dropped for non-payable functions.
    assert_eq!(sent[0].value, "0x0");
    assert_eq!(sent[0].from, ACCOUNT);
    assert_eq!(sent[0].to, CONTRACT);
    assert_eq!(&sent[0].data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);

    let estimates = rpc.estimates();
    assert_eq!(estimates[0].1.from, Some(ACCOUNT));
    assert_eq!(estimates[0].1.data, sent[0].data);
}

#[tokio::test]
async fn test_payable_value_is_forwarded() {
    let registry = FunctionRegistry::from_json(token_abi()).unwrap();
    let deposit = registry.resolve("deposit").unwrap();
    let rpc = Arc::new(FakeChainRpc::default());
    let agent = Arc::new(FakeAgent::new(ACCOUNT, ChainId::new(31337)));

    let record = pipeline(&rpc, &agent)
        .execute(
            &deposit,
            &CallArguments::new(),
            Some(U256::from(1_000_000_000_000_000_000u128)),
            CONTRACT,
            ACCOUNT,
            &endpoint(),
        )
        .await
        .unwrap();

    assert_eq!(agent.sent()[0].value, "0xde0b6b3a7640000");
    assert_eq!(agent.sent()[0].gas, "0x5208");
    assert_eq!(record.value_wei, U256::from(1_000_000_000_000_000_000u128));
}

#[tokio::test]
async fn test_missing_transaction_hash_is_transaction_failed() {
    let registry = FunctionRegistry::from_json(token_abi()).unwrap();
    let transfer = registry.resolve("transfer").unwrap();
    let rpc = Arc::new(FakeChainRpc::default());
    let agent = Arc::new(FakeAgent::new(ACCOUNT, ChainId::new(31337)));
    agent.respond_with(Ok(None));

    let err = pipeline(&rpc, &agent)
        .execute(&transfer, &transfer_arguments(), None, CONTRACT, ACCOUNT, &endpoint())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::TransactionFailed);
    assert!(err.message.starts_with("Transaction Failed"));
}

#[tokio::test]
async fn test_agent_rejection_is_signing_error() {
    let registry = FunctionRegistry::from_json(token_abi()).unwrap();
    let transfer = registry.resolve("transfer").unwrap();
    let rpc = Arc::new(FakeChainRpc::default());
    let agent = Arc::new(FakeAgent::new(ACCOUNT, ChainId::new(31337)));
    agent.respond_with(Err(crate::AgentError::Rejected {
        code: Some(4001),
        message: "User rejected the request.".to_string(),
    }));

    let err = pipeline(&rpc, &agent)
        .execute(&transfer, &transfer_arguments(), None, CONTRACT, ACCOUNT, &endpoint())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Signing);
    assert!(err.kind.is_signing());
    assert!(err.message.contains("User rejected"));
}

#[tokio::test]
async fn test_read_only_functions_are_rejected() {
    let registry = FunctionRegistry::from_json(token_abi()).unwrap();
    let total_supply = registry.resolve("totalSupply").unwrap();
    let rpc = Arc::new(FakeChainRpc::default());
    let agent = Arc::new(FakeAgent::new(ACCOUNT, ChainId::new(31337)));

    let err = pipeline(&rpc, &agent)
        .execute(&total_supply, &CallArguments::new(), None, CONTRACT, ACCOUNT, &endpoint())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(rpc.estimates().is_empty());
}

#[tokio::test]
async fn test_confirmed_transactions_are_recorded() {
    let temp_dir = TempDir::new().unwrap();
    let kv = KeyValueStoreManager::connect(
        temp_dir.path().join("test.redb"),
        &KeyValueStoreManagerConfig::default(),
    )
    .await
    .unwrap();

    let registry = FunctionRegistry::from_json(token_abi()).unwrap();
    let transfer = registry.resolve("transfer").unwrap();
    let rpc = Arc::new(FakeChainRpc::default());
    let agent = Arc::new(FakeAgent::new(ACCOUNT, ChainId::new(31337)));
    let pipeline = pipeline(&rpc, &agent).with_history(kv.transaction_store());

    let record = pipeline
        .execute(&transfer, &transfer_arguments(), None, CONTRACT, ACCOUNT, &endpoint())
        .await
        .unwrap();

    let history = kv
        .transaction_store()
        .list(Some(ChainId::new(31337)))
        .await
        .unwrap();
    assert_eq!(history, vec![record]);
}
