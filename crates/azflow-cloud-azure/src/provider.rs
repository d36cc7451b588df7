//! Azure Resource Manager provider implementation

use crate::analysis_services::AnalysisServicesServerResource;
use crate::client::{ArmConfig, ArmServerClient};
use crate::error::Result;
use async_trait::async_trait;
use azflow_cloud::{AuthStatus, CloudProvider, CreateOptions, Timeouts};
use std::sync::Arc;

/// Azure provider
pub struct AzureProvider {
    client: Arc<ArmServerClient>,
    timeouts: Timeouts,
    create_options: CreateOptions,
}

impl AzureProvider {
    pub fn new(config: ArmConfig) -> Self {
        Self {
            client: Arc::new(ArmServerClient::new(config)),
            timeouts: Timeouts::default(),
            create_options: CreateOptions::default(),
        }
    }

    /// Build a provider from `AZURE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ArmConfig::from_env()?))
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_create_options(mut self, options: CreateOptions) -> Self {
        self.create_options = options;
        self
    }

    pub fn subscription_id(&self) -> &str {
        &self.client.config().subscription_id
    }

    /// Options every Create issued through this provider starts from
    pub fn create_options(&self) -> &CreateOptions {
        &self.create_options
    }

    /// Reconciler for `azurerm_analysis_services_server`
    pub fn server_resource(&self) -> AnalysisServicesServerResource<ArmServerClient> {
        AnalysisServicesServerResource::new(Arc::clone(&self.client)).with_timeouts(self.timeouts)
    }
}

#[async_trait]
impl CloudProvider for AzureProvider {
    fn name(&self) -> &str {
        "azurerm"
    }

    fn display_name(&self) -> &str {
        "Azure Resource Manager"
    }

    async fn check_auth(&self) -> azflow_cloud::Result<AuthStatus> {
        match self.client.get_subscription().await {
            Ok(subscription) => {
                let account_info = match subscription.display_name {
                    Some(name) => format!("{} ({})", name, subscription.subscription_id),
                    None => subscription.subscription_id,
                };
                Ok(AuthStatus::ok(account_info))
            }
            Err(e) => Ok(AuthStatus::failed(e.to_string())),
        }
    }
}
