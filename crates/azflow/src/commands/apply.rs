use crate::utils;
use azflow_cloud::{
    CloudError, CreateOptions, GlobalState, ReadOutcome, Resource, ResourceState, ResourceStatus,
    StateManager,
};
use azflow_cloud_azure::{AnalysisServicesServerResource, ArmServerClient, ServerConfig};
use colored::Colorize;
use std::path::Path;

pub async fn handle(project_root: &Path, file: &Path) -> anyhow::Result<()> {
    let desired = utils::load_server_file(file)?;
    println!(
        "{}",
        format!("Applying {} from {}...", desired.name, file.display()).blue()
    );

    let state_manager = StateManager::new(project_root);
    let lock = state_manager.acquire_lock().await?;
    let mut state = state_manager.load().await?;

    if let Some(record) = state.get_resource(&utils::state_key(&desired.name)) {
        check_pending_create(record, &desired)?;
    }

    let provider_config = azflow_config::load_provider_config(project_root)?;
    let provider = utils::build_provider(&provider_config)?;
    let servers = provider.server_resource();

    let outcome = apply(
        &servers,
        &mut state,
        desired,
        *provider.create_options(),
        provider_config.features.adopt_interrupted,
    )
    .await;

    state_manager.save(&state).await?;
    lock.release().await?;

    let config = outcome?;
    println!();
    println!("{}", "✓ Apply complete".green().bold());
    if let Some(record) = state.get_resource(&utils::state_key(&config.name)) {
        utils::print_server(record, &config);
    }
    Ok(())
}

/// A create that was never confirmed may have left a server under the
/// recorded key; moving the definition elsewhere would lose track of it
fn check_pending_create(record: &ResourceState, desired: &ServerConfig) -> anyhow::Result<()> {
    if record.status != ResourceStatus::Creating {
        return Ok(());
    }

    let pending = utils::recorded_server(record)?;
    if pending.requires_replacement(desired) {
        anyhow::bail!(
            "an unconfirmed create of {} is recorded in resource group {} ({}); \
             destroy it before changing the name, resource group or location",
            desired.name,
            pending.resource_group_name,
            pending.location
        );
    }
    Ok(())
}

/// Reconcile one server and record the result in `state`, also on failure
async fn apply(
    servers: &AnalysisServicesServerResource<ArmServerClient>,
    state: &mut GlobalState,
    mut desired: ServerConfig,
    create_options: CreateOptions,
    adopt_interrupted: bool,
) -> anyhow::Result<ServerConfig> {
    let key = utils::state_key(&desired.name);
    let existing = state.get_resource(&key).cloned();

    let create_options = match &existing {
        Some(record) if record.status == ResourceStatus::Creating => {
            println!(
                "  {} an earlier create of {} was not confirmed",
                "⚠".yellow(),
                desired.name.cyan()
            );
            create_options.with_adopt_interrupted(adopt_interrupted)
        }
        Some(record) => {
            let mut current = utils::recorded_server(record)?;
            match servers.read(&mut current).await? {
                ReadOutcome::Present => {
                    if current.requires_replacement(&desired) {
                        anyhow::bail!(
                            "changing the name, resource group or location of {} requires \
                             replacement; destroy it first",
                            desired.name
                        );
                    }

                    println!("  Updating {}...", desired.name.cyan());
                    desired.inherit_computed(&current);
                    return match servers.update(&mut desired).await {
                        Ok(()) => {
                            let id = desired.id.clone().unwrap_or_default();
                            utils::record_server(state, &desired, &id, ResourceStatus::Running)?;
                            Ok(desired)
                        }
                        Err(e) => {
                            let id = current.id.clone().unwrap_or_default();
                            utils::record_server(state, &current, &id, ResourceStatus::Error)?;
                            Err(e.into())
                        }
                    };
                }
                ReadOutcome::Absent => {
                    println!(
                        "  {} {} no longer exists and will be created again",
                        "⚠".yellow(),
                        desired.name.cyan()
                    );
                    state.remove_resource(&key);
                    create_options
                }
            }
        }
        None => create_options,
    };

    println!("  Creating {}...", desired.name.cyan());
    match servers.create(&mut desired, &create_options).await {
        Ok(()) => {
            let id = desired.id.clone().unwrap_or_default();
            utils::record_server(state, &desired, &id, ResourceStatus::Running)?;
            Ok(desired)
        }
        Err(CloudError::CreateInterrupted { id, reason }) => {
            // The server may still appear; remember where to look for it
            utils::record_server(state, &desired, &id, ResourceStatus::Creating)?;
            Err(CloudError::CreateInterrupted { id, reason }.into())
        }
        Err(e) => Err(e.into()),
    }
}
