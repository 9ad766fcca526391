use super::print_json;
use crate::{cli::TransactionsCommand, error::CommandError, managers::Managers};

pub(super) async fn run(
    command: TransactionsCommand,
    managers: &Managers,
) -> Result<(), CommandError> {
    match command {
        TransactionsCommand::List { chain } => {
            let records = managers
                .key_value_store
                .transaction_store()
                .list(chain)
                .await?;
            for record in &records {
                let link = managers
                    .chains
                    .get(record.chain_id)
                    .and_then(|chain| chain.tx_url(&record.hash));
                tracing::debug!(hash = %record.hash, explorer = ?link, "Transaction");
            }
            print_json(&records)
        }
    }
}
