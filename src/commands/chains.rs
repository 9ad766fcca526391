use crate::{error::CommandError, managers::Managers};

pub(super) fn run(managers: &Managers) -> Result<(), CommandError> {
    for chain in managers.chains.all() {
        println!(
            "{:>8}  {:<24} {:<6} {} endpoint(s){}",
            chain.id,
            chain.name,
            chain.native_token_symbol,
            chain.default_rpc_endpoints.len(),
            chain
                .block_explorer_url
                .as_deref()
                .map(|url| format!("  {url}"))
                .unwrap_or_default()
        );
    }
    Ok(())
}
