use anyhow::Context;
use azflow_cloud::{GlobalState, ResourceState, ResourceStatus};
use azflow_cloud_azure::{ArmConfig, AzureProvider, RESOURCE_TYPE, ServerConfig};
use azflow_config::ProviderConfig;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Directory whose `.azflow/` holds the state file
pub fn project_root(project_dir: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match project_dir {
        Some(dir) => Ok(dir),
        None => Ok(std::env::current_dir()?),
    }
}

/// Load a server definition. Computed fields in the file are ignored.
pub fn load_server_file(path: &Path) -> anyhow::Result<ServerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut config: ServerConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    config.id = None;
    config.server_full_name = None;
    config.validate()?;
    Ok(config)
}

/// Build the Azure provider from `AZURE_*` env vars and `azflow.yaml`
pub fn build_provider(provider_config: &ProviderConfig) -> anyhow::Result<AzureProvider> {
    let mut arm = ArmConfig::from_env()?;
    if let Some(interval) = provider_config.poll_interval() {
        arm = arm.with_poll_interval(interval);
    }
    tracing::debug!(
        subscription = %arm.subscription_id,
        endpoint = %arm.endpoint,
        "Using Azure Resource Manager"
    );

    Ok(AzureProvider::new(arm)
        .with_timeouts(provider_config.timeouts())
        .with_create_options(provider_config.create_options()))
}

pub fn state_key(name: &str) -> String {
    GlobalState::key(RESOURCE_TYPE, name)
}

/// Decode a recorded server. A record still waiting on its create carries
/// the expected id outside the attributes.
pub fn recorded_server(record: &ResourceState) -> anyhow::Result<ServerConfig> {
    let mut config: ServerConfig = record.attributes()?;
    if config.id.is_none() && !record.id.is_empty() {
        config.id = Some(record.id.clone());
    }
    Ok(config)
}

/// Store `config` under its name with `status`
pub fn record_server(
    state: &mut GlobalState,
    config: &ServerConfig,
    id: &str,
    status: ResourceStatus,
) -> anyhow::Result<()> {
    let key = state_key(&config.name);
    let mut record = state
        .get_resource(&key)
        .cloned()
        .unwrap_or_else(|| ResourceState::new(id, RESOURCE_TYPE));
    record.set_attributes(id, config)?;
    record.set_status(status);
    state.set_resource(key, record);
    Ok(())
}

/// Print one recorded server
pub fn print_server(record: &ResourceState, config: &ServerConfig) {
    let status = match record.status {
        ResourceStatus::Running => record.status.to_string().green(),
        ResourceStatus::Error => record.status.to_string().red(),
        _ => record.status.to_string().yellow(),
    };

    println!("{} [{}]", config.name.cyan().bold(), status);
    println!("  id:             {}", or_none(&record.id));
    println!("  resource group: {}", config.resource_group_name);
    println!("  location:       {}", config.location);
    println!("  sku:            {}", config.sku);
    if let Some(full_name) = &config.server_full_name {
        println!("  full name:      {}", full_name);
    }
    if !config.admin_users.is_empty() {
        let admins: Vec<&str> = config.admin_users.iter().map(String::as_str).collect();
        println!("  admins:         {}", admins.join(", "));
    }
    println!(
        "  power BI:       {}",
        if config.enable_power_bi_service {
            "enabled"
        } else {
            "disabled"
        }
    );
    for rule in &config.ipv4_firewall_rule {
        println!(
            "  firewall:       {} {} - {}",
            rule.name, rule.range_start, rule.range_end
        );
    }
    if let Some(mode) = config.querypool_connection_mode {
        println!("  query pool:     {}", mode);
    }
    if config.backup_blob_container_uri.is_some() {
        println!("  backup uri:     {}", "(sensitive)".dimmed());
    }
    for (key, value) in &config.tags {
        println!("  tag:            {} = {}", key, value);
    }
    println!("  updated:        {}", record.updated_at.to_rfc3339());
}

fn or_none(value: &str) -> &str {
    if value.is_empty() { "(none)" } else { value }
}
