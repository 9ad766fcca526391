use xabi_blockchain::{CustomEndpointUpdate, NewCustomEndpoint};
use xabi_domain::{EndpointKind, RpcEndpoint};

use super::{print_json, resolve_chain};
use crate::{cli::EndpointsCommand, error::CommandError, managers::Managers};

pub(super) async fn run(command: EndpointsCommand, managers: &Managers) -> Result<(), CommandError> {
    let endpoints = &managers.endpoints;

    match command {
        EndpointsCommand::List { chain } => {
            let chain_id = resolve_chain(managers, chain)?;
            for endpoint in endpoints.list_endpoints(chain_id).await? {
                println!("{}", describe(&endpoint));
            }
        }
        EndpointsCommand::Select { chain } => {
            let chain_id = resolve_chain(managers, chain)?;
            let selected = endpoints.select_best_available(chain_id).await?;
            println!("{selected}");
        }
        EndpointsCommand::Test { url } => {
            let report = endpoints.test_endpoint(&url).await;
            if report.reachable {
                println!("{} reachable in {} ms", report.url, report.latency.as_millis());
            } else {
                println!("{} unreachable after {} ms", report.url, report.latency.as_millis());
            }
        }
        EndpointsCommand::Add {
            url,
            name,
            chain,
            active,
        } => {
            let chain_id = resolve_chain(managers, chain)?;
            let endpoint = endpoints
                .add_custom_endpoint(NewCustomEndpoint {
                    name,
                    url,
                    chain_id,
                    make_active: active,
                })
                .await?;
            print_json(&endpoint)?;
        }
        EndpointsCommand::Update {
            id,
            name,
            url,
            active,
        } => {
            let endpoint = endpoints
                .update_custom_endpoint(
                    &id,
                    CustomEndpointUpdate {
                        name,
                        url,
                        make_active: active,
                    },
                )
                .await?;
            print_json(&endpoint)?;
        }
        EndpointsCommand::Remove { id } => {
            endpoints.remove_custom_endpoint(&id).await?;
            println!("Removed {id}");
        }
        EndpointsCommand::Use { id } => {
            let existing = managers
                .key_value_store
                .custom_endpoint_store()
                .get(&id)
                .await?
                .ok_or_else(|| CommandError::InvalidArgument(format!("no custom endpoint {id}")))?;
            let endpoint = endpoints
                .update_custom_endpoint(
                    &id,
                    CustomEndpointUpdate {
                        name: existing.name,
                        url: existing.url,
                        make_active: true,
                    },
                )
                .await?;
            println!("Using {} for chain {}", endpoint.url, endpoint.chain_id);
        }
    }

    Ok(())
}

fn describe(endpoint: &RpcEndpoint) -> String {
    let kind = match endpoint.kind() {
        EndpointKind::Default => "default",
        EndpointKind::Custom => "custom",
    };
    let marker = if endpoint.is_active() { "*" } else { " " };
    match endpoint {
        RpcEndpoint::Default { url, .. } => format!("{marker} {kind:<7} {url}"),
        RpcEndpoint::Custom(custom) => format!(
            "{marker} {kind:<7} {} {} ({})",
            custom.url, custom.name, custom.id
        ),
    }
}
