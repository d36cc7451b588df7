use crate::utils;
use azflow_cloud::{ReadOutcome, Resource, ResourceStatus, StateManager};
use colored::Colorize;
use std::path::Path;

pub async fn handle(project_root: &Path, name: &str) -> anyhow::Result<()> {
    let state_manager = StateManager::new(project_root);
    let lock = state_manager.acquire_lock().await?;
    let mut state = state_manager.load().await?;

    let key = utils::state_key(name);
    let record = state
        .get_resource(&key)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("server '{}' not found in state", name))?;

    println!("{}", format!("Refreshing {}...", name).blue());

    let provider_config = azflow_config::load_provider_config(project_root)?;
    let provider = utils::build_provider(&provider_config)?;
    let servers = provider.server_resource();

    let mut config = utils::recorded_server(&record)?;
    match servers.read(&mut config).await? {
        ReadOutcome::Present => {
            let id = config.id.clone().unwrap_or_default();
            let status = status_after_read(record.status);
            utils::record_server(&mut state, &config, &id, status)?;
            state_manager.save(&state).await?;
            lock.release().await?;

            println!("{}", "✓ Refreshed".green().bold());
            if let Some(record) = state.get_resource(&key) {
                utils::print_server(record, &config);
            }
        }
        ReadOutcome::Absent => {
            state.remove_resource(&key);
            state_manager.save(&state).await?;
            lock.release().await?;

            println!(
                "{} {} no longer exists in Azure and was removed from state",
                "⚠".yellow(),
                name.cyan()
            );
        }
    }

    Ok(())
}

/// Status of a record whose server was read back
fn status_after_read(previous: ResourceStatus) -> ResourceStatus {
    match previous {
        // The server outlived an unfinished destroy
        ResourceStatus::Deleting => ResourceStatus::Deleting,
        // A pending create that can be read back has finished
        _ => ResourceStatus::Running,
    }
}
