//! Azure provider for azflow
//!
//! This crate implements the reconciler for Azure Analysis Services
//! servers on top of the Azure Resource Manager (ARM) REST API.
//!
//! # Requirements
//!
//! - `AZURE_SUBSCRIPTION_ID` and `AZURE_ACCESS_TOKEN` env vars
//! - Optionally `AZURE_RESOURCE_MANAGER_ENDPOINT` for sovereign clouds
//!
//! # Example
//!
//! ```ignore
//! use azflow_cloud::{CreateOptions, Resource};
//! use azflow_cloud_azure::{AzureProvider, ServerConfig, Sku};
//!
//! let provider = AzureProvider::from_env()?;
//! let servers = provider.server_resource();
//!
//! let mut config = ServerConfig::new("reporting01", "analytics-rg", "West Europe", Sku::S0);
//! servers.create(&mut config, &CreateOptions::default()).await?;
//! println!("created {}", config.id.unwrap());
//! ```

pub mod analysis_services;
pub mod client;
pub mod error;
pub mod id;
pub mod location;
pub mod models;
pub mod provider;
pub mod tags;
pub mod validate;

pub use analysis_services::{
    AnalysisServicesServerResource, FirewallRule, RESOURCE_TYPE, ServerConfig,
};
pub use client::{
    ArmConfig, ArmServerClient, LongRunningOperation, PendingOperation, ServerClient,
};
pub use error::{AzureError, Result};
pub use id::{AnalysisServicesServerId, ResourceId};
pub use models::{ConnectionMode, Sku};
pub use provider::AzureProvider;

/// Human-readable name of a server used in logs and errors
pub(crate) fn describe_server(resource_group: &str, name: &str) -> String {
    format!(
        "Analysis Services Server {:?} (Resource Group {:?})",
        name, resource_group
    )
}
