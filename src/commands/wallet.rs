use alloy::primitives::utils::format_ether;
use xabi_blockchain::{connect_wallet, native_balance};
use xabi_domain::parse_address;

use super::resolve_chain;
use crate::{cli::WalletCommand, error::CommandError, managers::Managers};

pub(super) async fn run(command: WalletCommand, managers: &Managers) -> Result<(), CommandError> {
    match command {
        WalletCommand::Connect { chain } => {
            let chain_id = resolve_chain(managers, chain)?;
            let connection = connect_wallet(managers.agent.as_deref(), chain_id).await?;
            if connection.switched {
                println!("Switched signing agent to chain {chain_id}");
            }
            println!("{}", connection.account);
        }
        WalletCommand::Balance { address, chain } => {
            let account = parse_address(&address)?;
            let chain_id = resolve_chain(managers, chain)?;
            let endpoint = managers.endpoints.switch_chain(chain_id).await?;

            let balance = native_balance(managers.rpc.as_ref(), &endpoint, account).await;
            let symbol = managers
                .chains
                .get(chain_id)
                .map(|chain| chain.native_token_symbol.as_str())
                .unwrap_or("ETH");
            println!("{} {symbol}", format_ether(balance));
        }
    }
    Ok(())
}
