//! In-memory ARM stand-in shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use azflow_cloud_azure::client::{LongRunningOperation, PendingOperation, ServerClient};
use azflow_cloud_azure::models::{Server, ServerProperties, ServerUpdateParameters};
use azflow_cloud_azure::{AnalysisServicesServerId, AzureError, Result, ServerConfig, Sku};
use std::collections::BTreeMap;
use std::sync::Mutex;

pub const SUBSCRIPTION_ID: &str = "00000000-0000-0000-0000-000000000000";
pub const RESOURCE_GROUP: &str = "analytics-rg";
pub const SERVER_NAME: &str = "reporting01";

pub fn server_id(resource_group: &str, name: &str) -> String {
    AnalysisServicesServerId::new(SUBSCRIPTION_ID, resource_group, name).to_string()
}

pub fn basic_config() -> ServerConfig {
    ServerConfig::new(SERVER_NAME, RESOURCE_GROUP, "West Europe", Sku::S0)
}

/// How an accepted long-running operation finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Succeed,
    /// Never reports back; the remote change has still been applied
    Hang,
    /// Terminal failure reported by the service
    Fail,
    /// The poll itself breaks
    PollError,
}

struct FakeOperation {
    completion: Completion,
}

#[async_trait]
impl LongRunningOperation for FakeOperation {
    async fn wait_for_completion(&mut self) -> Result<()> {
        match self.completion {
            Completion::Succeed => Ok(()),
            Completion::Hang => std::future::pending().await,
            Completion::Fail => Err(AzureError::OperationFailed {
                status: "Failed".to_string(),
                message: "InternalError: provisioning failed".to_string(),
            }),
            Completion::PollError => Err(AzureError::InvalidPollingResponse(
                "connection reset".to_string(),
            )),
        }
    }
}

#[derive(Default)]
struct Inner {
    servers: BTreeMap<(String, String), Server>,
    calls: Vec<String>,
    last_create: Option<Server>,
    last_update: Option<ServerUpdateParameters>,
}

/// Remote side of the Analysis Services API kept in memory
pub struct FakeArm {
    inner: Mutex<Inner>,
    create_completion: Mutex<Completion>,
    update_completion: Mutex<Completion>,
    delete_completion: Mutex<Completion>,
    /// Reads hang forever while set
    hang_reads: Mutex<bool>,
    /// GET answers with a server whose `id` is missing
    omit_ids: Mutex<bool>,
    /// GET fails with a 500 while set
    fail_reads: Mutex<bool>,
}

impl Default for FakeArm {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            create_completion: Mutex::new(Completion::Succeed),
            update_completion: Mutex::new(Completion::Succeed),
            delete_completion: Mutex::new(Completion::Succeed),
            hang_reads: Mutex::new(false),
            omit_ids: Mutex::new(false),
            fail_reads: Mutex::new(false),
        }
    }
}

impl FakeArm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_create_completion(&self, completion: Completion) {
        *self.create_completion.lock().unwrap() = completion;
    }

    pub fn set_update_completion(&self, completion: Completion) {
        *self.update_completion.lock().unwrap() = completion;
    }

    pub fn set_delete_completion(&self, completion: Completion) {
        *self.delete_completion.lock().unwrap() = completion;
    }

    pub fn set_hang_reads(&self, hang: bool) {
        *self.hang_reads.lock().unwrap() = hang;
    }

    pub fn set_omit_ids(&self, omit: bool) {
        *self.omit_ids.lock().unwrap() = omit;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        *self.fail_reads.lock().unwrap() = fail;
    }

    /// Put a server in place as if someone created it out of band
    pub fn insert(&self, resource_group: &str, name: &str, mut server: Server) {
        server.id = Some(server_id(resource_group, name));
        server.name = Some(name.to_string());
        self.inner
            .lock()
            .unwrap()
            .servers
            .insert((resource_group.to_string(), name.to_string()), server);
    }

    pub fn get(&self, resource_group: &str, name: &str) -> Option<Server> {
        self.inner
            .lock()
            .unwrap()
            .servers
            .get(&(resource_group.to_string(), name.to_string()))
            .cloned()
    }

    pub fn remove(&self, resource_group: &str, name: &str) {
        self.inner
            .lock()
            .unwrap()
            .servers
            .remove(&(resource_group.to_string(), name.to_string()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn count(&self, verb: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(verb)).count()
    }

    pub fn last_create(&self) -> Option<Server> {
        self.inner.lock().unwrap().last_create.clone()
    }

    pub fn last_update(&self) -> Option<ServerUpdateParameters> {
        self.inner.lock().unwrap().last_update.clone()
    }

    fn record(&self, verb: &str, resource_group: &str, name: &str) {
        self.inner
            .lock()
            .unwrap()
            .calls
            .push(format!("{} {}/{}", verb, resource_group, name));
    }
}

fn not_found(resource_group: &str, name: &str) -> AzureError {
    AzureError::NotFound(format!("{}/{}", resource_group, name))
}

#[async_trait]
impl ServerClient for FakeArm {
    fn subscription_id(&self) -> &str {
        SUBSCRIPTION_ID
    }

    async fn get_details(&self, resource_group: &str, name: &str) -> Result<Server> {
        self.record("GET", resource_group, name);

        let hang = *self.hang_reads.lock().unwrap();
        if hang {
            std::future::pending::<()>().await;
        }
        if *self.fail_reads.lock().unwrap() {
            return Err(AzureError::Api {
                status: 500,
                code: "InternalServerError".to_string(),
                message: "try again later".to_string(),
            });
        }

        let mut server = self
            .get(resource_group, name)
            .ok_or_else(|| not_found(resource_group, name))?;
        if *self.omit_ids.lock().unwrap() {
            server.id = None;
        }
        Ok(server)
    }

    async fn create(
        &self,
        resource_group: &str,
        name: &str,
        server: &Server,
    ) -> Result<PendingOperation> {
        self.record("PUT", resource_group, name);

        let mut stored = server.clone();
        stored.id = Some(server_id(resource_group, name));
        stored.resource_type = Some("Microsoft.AnalysisServices/servers".to_string());
        if let Some(sku) = stored.sku.as_mut() {
            sku.tier = Some(
                sku.name
                    .parse::<Sku>()
                    .map(|s| s.tier().to_string())
                    .unwrap_or_default(),
            );
        }
        let location = stored.location.clone().unwrap_or_default();
        let properties = stored.properties.get_or_insert_with(ServerProperties::default);
        // Write-only
        properties.backup_blob_container_uri = None;
        properties.provisioning_state = Some("Succeeded".to_string());
        properties.server_full_name =
            Some(format!("asazure://{}.asazure.windows.net/{}", location, name));

        {
            let mut inner = self.inner.lock().unwrap();
            inner.last_create = Some(server.clone());
            inner
                .servers
                .insert((resource_group.to_string(), name.to_string()), stored);
        }

        Ok(Box::new(FakeOperation {
            completion: *self.create_completion.lock().unwrap(),
        }))
    }

    async fn update(
        &self,
        resource_group: &str,
        name: &str,
        parameters: &ServerUpdateParameters,
    ) -> Result<PendingOperation> {
        self.record("PATCH", resource_group, name);

        let mut inner = self.inner.lock().unwrap();
        inner.last_update = Some(parameters.clone());

        let server = inner
            .servers
            .get_mut(&(resource_group.to_string(), name.to_string()))
            .ok_or_else(|| not_found(resource_group, name))?;
        if let Some(sku) = &parameters.sku {
            server.sku = Some(sku.clone());
        }
        if let Some(tags) = &parameters.tags {
            server.tags = Some(tags.clone());
        }
        if let Some(changes) = &parameters.properties {
            let properties = server.properties.get_or_insert_with(ServerProperties::default);
            if let Some(admins) = &changes.as_administrators {
                properties.as_administrators = Some(admins.clone());
            }
            if let Some(mode) = changes.querypool_connection_mode {
                properties.querypool_connection_mode = Some(mode);
            }
            if let Some(firewall) = &changes.ipv4_firewall_settings {
                properties.ipv4_firewall_settings = Some(firewall.clone());
            }
        }

        Ok(Box::new(FakeOperation {
            completion: *self.update_completion.lock().unwrap(),
        }))
    }

    async fn delete(&self, resource_group: &str, name: &str) -> Result<PendingOperation> {
        self.record("DELETE", resource_group, name);

        let removed = self
            .inner
            .lock()
            .unwrap()
            .servers
            .remove(&(resource_group.to_string(), name.to_string()));
        if removed.is_none() {
            return Err(not_found(resource_group, name));
        }

        Ok(Box::new(FakeOperation {
            completion: *self.delete_completion.lock().unwrap(),
        }))
    }
}
