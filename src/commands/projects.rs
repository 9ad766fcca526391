use chrono::Utc;
use uuid::Uuid;
use xabi_domain::{Project, normalize_address, parse_address};

use super::{print_json, read_file, resolve_chain};
use crate::{cli::ProjectsCommand, error::CommandError, managers::Managers};

pub(super) async fn run(command: ProjectsCommand, managers: &Managers) -> Result<(), CommandError> {
    let projects = managers.key_value_store.project_store();

    match command {
        ProjectsCommand::List => print_json(&projects.list().await?),
        ProjectsCommand::Save {
            address,
            chain,
            abi,
            name,
        } => {
            parse_address(&address)?;
            let chain_id = resolve_chain(managers, chain)?;
            let abi = match abi {
                Some(path) => xabi_blockchain::parse_abi(&read_file(&path)?)?,
                None => managers.contract_source.fetch_abi(chain_id, &address).await?,
            };

            let project = projects
                .save(Project {
                    id: Uuid::new_v4().to_string(),
                    name: name.unwrap_or_default(),
                    address: normalize_address(&address),
                    chain_id,
                    abi,
                    created_at: Utc::now(),
                })
                .await?;
            print_json(&project)
        }
        ProjectsCommand::Delete { id } => {
            if projects.delete(&id).await? {
                println!("Deleted {id}");
                Ok(())
            } else {
                Err(CommandError::InvalidArgument(format!("no project {id}")))
            }
        }
    }
}
