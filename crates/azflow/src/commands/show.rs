use crate::utils;
use azflow_cloud::StateManager;
use azflow_cloud_azure::RESOURCE_TYPE;
use colored::Colorize;
use std::path::Path;

pub async fn handle(project_root: &Path, name: Option<&str>) -> anyhow::Result<()> {
    let state = StateManager::new(project_root).load().await?;

    let mut records = state.resources_of_type(RESOURCE_TYPE);
    if let Some(name) = name {
        let key = utils::state_key(name);
        records.retain(|(k, _)| **k == key);
        if records.is_empty() {
            anyhow::bail!("server '{}' not found in state", name);
        }
    }

    if records.is_empty() {
        println!("{}", "No servers recorded".dimmed());
        return Ok(());
    }

    for (i, (_, record)) in records.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let config = utils::recorded_server(record)?;
        utils::print_server(record, &config);
    }
    Ok(())
}
