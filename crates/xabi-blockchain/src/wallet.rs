use alloy::primitives::{Address, U256};
use xabi_domain::ChainId;

use crate::{AgentError, ChainRpc, SigningAgent, endpoints::SelectedEndpoint};

/// Account and chain the signing agent is on after connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConnection {
    pub account: Address,
    pub chain_id: ChainId,
    /// Whether the agent had to be switched to the requested chain.
    pub switched: bool,
}

/// Request accounts from the agent and make sure it is on `chain_id`.
pub async fn connect_wallet(
    agent: Option<&dyn SigningAgent>,
    chain_id: ChainId,
) -> Result<WalletConnection, AgentError> {
    let agent = agent.ok_or(AgentError::NotFound)?;

    let account = agent
        .request_accounts()
        .await?
        .into_iter()
        .next()
        .ok_or(AgentError::NoAccounts)?;

    let current = agent.chain_id().await?;
    let switched = current != chain_id;
    if switched {
        tracing::info!(from = %current, to = %chain_id, "Switching signing agent chain");
        agent.switch_chain(chain_id).await?;
    }

    tracing::info!(account = %account, chain_id = %chain_id, "Wallet connected");
    Ok(WalletConnection {
        account,
        chain_id,
        switched,
    })
}

/// Native balance of `account` in wei. Lookup failures read as zero.
pub async fn native_balance(
    rpc: &dyn ChainRpc,
    endpoint: &SelectedEndpoint,
    account: Address,
) -> U256 {
    match rpc.get_balance(endpoint, account).await {
        Ok(balance) => balance,
        Err(e) => {
            tracing::warn!(account = %account, endpoint = %endpoint, error = %e, "Balance lookup failed");
            U256::ZERO
        }
    }
}
