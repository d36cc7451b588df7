use crate::utils;
use azflow_cloud::{Resource, ResourceStatus, StateManager};
use colored::Colorize;
use std::path::Path;

pub async fn handle(project_root: &Path, name: &str, yes: bool) -> anyhow::Result<()> {
    let state_manager = StateManager::new(project_root);
    let lock = state_manager.acquire_lock().await?;
    let mut state = state_manager.load().await?;

    let key = utils::state_key(name);
    let record = state
        .get_resource(&key)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("server '{}' not found in state", name))?;
    let config = utils::recorded_server(&record)?;

    println!("{}", format!("Destroying {}...", name).yellow());
    println!("  id: {}", config.id.as_deref().unwrap_or("(none)").cyan());

    if !yes {
        println!();
        println!(
            "{}",
            "Warning: the server and all of its models will be deleted.".yellow()
        );
        println!("Re-run with --yes to proceed");
        return Ok(());
    }

    let provider_config = azflow_config::load_provider_config(project_root)?;
    let provider = utils::build_provider(&provider_config)?;
    let servers = provider.server_resource();

    let id = config.id.clone().unwrap_or_default();
    utils::record_server(&mut state, &config, &id, ResourceStatus::Deleting)?;
    state_manager.save(&state).await?;

    let result = servers.delete(&config).await;
    match &result {
        Ok(()) => {
            state.remove_resource(&key);
        }
        Err(azflow_cloud::CloudError::Timeout(_)) => {
            // Still deleting remotely; the next refresh settles it
        }
        Err(_) => {
            utils::record_server(&mut state, &config, &id, ResourceStatus::Error)?;
        }
    }
    state_manager.save(&state).await?;
    lock.release().await?;

    result?;
    println!("{}", format!("✓ {} destroyed", name).green().bold());
    Ok(())
}
