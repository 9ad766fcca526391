use std::sync::Arc;

use alloy::primitives::{Address, U256};
use xabi_blockchain::{
    CallArguments, CallFailure, CallRequest, CallResult, CompiledFunction, ContractSession,
    FunctionRegistry, SelectedEndpoint, connect_wallet,
};
use xabi_domain::{AbiFunctionDescriptor, ChainId, parse_address};

use super::{read_file, resolve_chain};
use crate::{
    cli::{ContractCommand, ContractTarget},
    error::CommandError,
    managers::Managers,
};

/// A contract resolved from the command line: where it is, its functions
/// and the endpoint calls go to.
struct Target {
    address: Address,
    chain_id: ChainId,
    registry: FunctionRegistry,
    endpoint: SelectedEndpoint,
}

pub(super) async fn run(command: ContractCommand, managers: &Managers) -> Result<(), CommandError> {
    match command {
        ContractCommand::Load { target, account } => load(managers, target, account).await,
        ContractCommand::Read {
            target,
            function,
            arguments,
        } => read(managers, target, &function, &arguments).await,
        ContractCommand::Write {
            target,
            function,
            arguments,
            value,
        } => write(managers, target, &function, &arguments, value.as_deref()).await,
    }
}

async fn load(
    managers: &Managers,
    target: ContractTarget,
    account: Option<String>,
) -> Result<(), CommandError> {
    let target = resolve_target(managers, target).await?;

    let account = match account {
        Some(account) => Some(parse_address(&account)?),
        None => match connect_wallet(managers.agent.as_deref(), target.chain_id).await {
            Ok(connection) => Some(connection.account),
            Err(e) => {
                tracing::warn!(error = %e, "Loading without a connected account");
                None
            }
        },
    };

    let session = ContractSession::load(
        target.address,
        target.chain_id,
        target.registry,
        Arc::clone(&managers.dispatcher),
        Arc::clone(&managers.endpoints),
        account,
    )
    .await;

    println!("Contract {} on chain {}", session.address(), session.chain_id());
    if let Some(link) = managers
        .chains
        .get(session.chain_id())
        .and_then(|chain| chain.address_url(&session.address().to_string()))
    {
        println!("Explorer {link}");
    }

    let classification = session.classification();
    println!(
        "{} functions: {} read without input, {} read with input, {} write",
        classification.total(),
        classification.read_no_input.len(),
        classification.read_with_input.len(),
        classification.write.len()
    );

    for (signature, slot) in session.results() {
        println!("  {signature} = {}", slot.result);
    }
    for descriptor in classification
        .read_with_input
        .iter()
        .chain(&classification.write)
    {
        if session.result(&descriptor.signature()).is_none() {
            println!("  {} [{}]", descriptor.signature(), descriptor.state_mutability);
        }
    }

    Ok(())
}

async fn read(
    managers: &Managers,
    target: ContractTarget,
    function: &str,
    raw_arguments: &[String],
) -> Result<(), CommandError> {
    let target = resolve_target(managers, target).await?;
    let function = target.registry.resolve(function)?;
    let arguments = parse_arguments(&function, raw_arguments)?;

    let request = CallRequest::new(function, arguments);
    match managers
        .dispatcher
        .invoke_read(target.address, &request, &target.endpoint, None)
        .await
    {
        CallResult::Success { decoded_value } => {
            println!("{decoded_value}");
            Ok(())
        }
        CallResult::Failure { kind, message } => Err(CallFailure::new(kind, message).into()),
    }
}

async fn write(
    managers: &Managers,
    target: ContractTarget,
    function: &str,
    raw_arguments: &[String],
    value: Option<&str>,
) -> Result<(), CommandError> {
    let target = resolve_target(managers, target).await?;
    let function = target.registry.resolve(function)?;
    let arguments = parse_arguments(&function, raw_arguments)?;

    let mut request = CallRequest::new(function, arguments);
    if let Some(value) = value {
        let wei: U256 = value
            .trim()
            .parse()
            .map_err(|_| CommandError::InvalidArgument(format!("invalid wei amount {value}")))?;
        request = request.with_value(wei);
    }

    let connection = connect_wallet(managers.agent.as_deref(), target.chain_id).await?;
    let record = managers
        .dispatcher
        .invoke_write(target.address, &request, &target.endpoint, connection.account)
        .await?;

    println!("Transaction {}", record.hash);
    if let Some(link) = managers
        .chains
        .get(record.chain_id)
        .and_then(|chain| chain.tx_url(&record.hash))
    {
        println!("Explorer {link}");
    }
    Ok(())
}

async fn resolve_target(managers: &Managers, target: ContractTarget) -> Result<Target, CommandError> {
    let address = parse_address(&target.address)?;
    let chain_id = resolve_chain(managers, target.chain)?;

    let descriptors: Vec<AbiFunctionDescriptor> = match &target.abi {
        Some(path) => xabi_blockchain::parse_abi(&read_file(path)?)?,
        None => {
            managers
                .contract_source
                .resolve_abi(
                    &managers.key_value_store.project_store(),
                    chain_id,
                    &target.address,
                )
                .await?
        }
    };

    let endpoint = match target.rpc.as_deref() {
        Some(url) => managers.endpoints.set_active(chain_id, url).await,
        None => managers.endpoints.switch_chain(chain_id).await?,
    };
    tracing::debug!(endpoint = %endpoint, "Using endpoint");

    Ok(Target {
        address,
        chain_id,
        registry: FunctionRegistry::new(descriptors),
        endpoint,
    })
}

/// Map command-line values onto the function's inputs.
///
/// `name=value` fills the input with that key; anything else fills the next
/// input in declared order.
fn parse_arguments(
    function: &CompiledFunction,
    raw_arguments: &[String],
) -> Result<CallArguments, CommandError> {
    let descriptor = function.descriptor();
    let keys: Vec<String> = (0..descriptor.inputs.len())
        .map(|index| descriptor.argument_key(index))
        .collect();

    let mut arguments = CallArguments::new();
    let mut position = 0;
    for raw in raw_arguments {
        let named = raw
            .split_once('=')
            .filter(|(name, _)| keys.iter().any(|key| key.as_str() == *name));
        match named {
            Some((name, value)) => arguments.insert(name, value),
            None => {
                while position < keys.len() && arguments.get(&keys[position]).is_some() {
                    position += 1;
                }
                let key = keys.get(position).ok_or_else(|| {
                    CommandError::InvalidArgument(format!(
                        "{} takes {} argument(s)",
                        function.signature(),
                        keys.len()
                    ))
                })?;
                arguments.insert(key.clone(), raw.clone());
                position += 1;
            }
        }
    }

    Ok(arguments)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use xabi_domain::{AbiParam, StateMutability};

    use super::*;

    fn allowance() -> CompiledFunction {
        CompiledFunction::compile(AbiFunctionDescriptor {
            name: "allowance".to_string(),
            inputs: vec![
                AbiParam::new("owner", "address"),
                AbiParam::new("spender", "address"),
            ],
            outputs: vec![AbiParam::new("", "uint256")],
            state_mutability: StateMutability::View,
        })
    }

    #[test]
    fn test_named_and_positional_arguments_mix() {
        let function = allowance();
        let arguments = parse_arguments(
            &function,
            &["owner=0x11".to_string(), "0x22".to_string()],
        )
        .unwrap();

        assert_eq!(arguments.get("owner"), Some("0x11"));
        assert_eq!(arguments.get("spender"), Some("0x22"));
    }

    #[test]
    fn test_too_many_arguments_are_rejected() {
        let function = allowance();
        let raw = ["0x11".to_string(), "0x22".to_string(), "0x33".to_string()];
        let err = parse_arguments(&function, &raw).unwrap_err();
        assert!(matches!(err, CommandError::InvalidArgument(_)));
    }

    #[test]
    fn test_unknown_name_is_taken_as_a_value() {
        let function = allowance();
        let arguments = parse_arguments(&function, &["memo=x".to_string()]).unwrap();
        assert_eq!(arguments.get("owner"), Some("memo=x"));
    }
}
