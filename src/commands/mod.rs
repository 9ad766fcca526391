mod abi;
mod chains;
mod contract;
mod endpoints;
mod projects;
mod transactions;
mod wallet;

use std::path::Path;

use serde::Serialize;
use xabi_domain::ChainId;

use crate::{cli::Command, error::CommandError, managers::Managers};

pub(crate) async fn run(command: Command, managers: &Managers) -> Result<(), CommandError> {
    match command {
        Command::Chains => chains::run(managers),
        Command::Endpoints { command } => endpoints::run(command, managers).await,
        Command::Abi { command } => abi::run(command),
        Command::Contract { command } => contract::run(command, managers).await,
        Command::Wallet { command } => wallet::run(command, managers).await,
        Command::Projects { command } => projects::run(command, managers).await,
        Command::Transactions { command } => transactions::run(command, managers).await,
    }
}

/// `chain` when it is known, otherwise the first configured chain.
fn resolve_chain(managers: &Managers, chain: Option<ChainId>) -> Result<ChainId, CommandError> {
    match chain {
        Some(chain_id) if managers.chains.get(chain_id).is_some() => Ok(chain_id),
        Some(chain_id) => Err(CommandError::UnknownChain(chain_id)),
        None => managers
            .chains
            .all()
            .first()
            .map(|chain| chain.id)
            .ok_or(CommandError::NoChains),
    }
}

fn read_file(path: &Path) -> Result<String, CommandError> {
    std::fs::read_to_string(path).map_err(|source| CommandError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
