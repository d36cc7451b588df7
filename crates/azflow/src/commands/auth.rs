use crate::utils;
use azflow_cloud::CloudProvider;
use colored::Colorize;
use std::path::Path;

pub async fn handle(project_root: &Path) -> anyhow::Result<()> {
    let provider_config = azflow_config::load_provider_config(project_root)?;
    let provider = utils::build_provider(&provider_config)?;

    println!(
        "{}",
        format!("Checking {} credentials...", provider.display_name()).blue()
    );
    let status = provider.check_auth().await?;

    if status.authenticated {
        println!(
            "{} {}",
            "✓ Authenticated:".green().bold(),
            status.account_info.unwrap_or_else(|| provider.subscription_id().to_string())
        );
        Ok(())
    } else {
        anyhow::bail!(
            "not authenticated: {}",
            status.error.unwrap_or_else(|| "unknown error".to_string())
        )
    }
}
