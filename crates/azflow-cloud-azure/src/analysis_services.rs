//! Analysis Services server resource
//!
//! Reconciles a [`ServerConfig`] against the ARM representation of the
//! server. Writes always send a complete firewall settings object; reads
//! collapse a missing one to "power BI disabled, no rules". The backup
//! container URI is write-only, so reads keep whatever the record holds.

use crate::client::ServerClient;
use crate::error::AzureError;
use crate::id::AnalysisServicesServerId;
use crate::location::normalize_location;
use crate::models::{
    ConnectionMode, Ipv4FirewallRule, Ipv4FirewallSettings, ResourceSku, Server,
    ServerAdministrators, ServerMutableProperties, ServerProperties, ServerUpdateParameters, Sku,
};
use crate::{describe_server, tags, validate};
use async_trait::async_trait;
use azflow_cloud::{
    CloudError, CreateOptions, Deadline, Operation, ReadOutcome, Resource, Result, Timeouts,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;

pub const RESOURCE_TYPE: &str = "azurerm_analysis_services_server";

/// An IPv4 range allowed through the server firewall
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FirewallRule {
    pub name: String,
    pub range_start: Ipv4Addr,
    pub range_end: Ipv4Addr,
}

impl FirewallRule {
    pub fn new(name: impl Into<String>, range_start: Ipv4Addr, range_end: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            range_start,
            range_end,
        }
    }
}

/// Configuration record for one server: desired fields plus the values
/// computed by the remote side
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub resource_group_name: String,
    pub location: String,
    pub sku: Sku,

    #[serde(default)]
    pub admin_users: BTreeSet<String>,

    #[serde(default)]
    pub enable_power_bi_service: bool,

    #[serde(default)]
    pub ipv4_firewall_rule: BTreeSet<FirewallRule>,

    /// Left to the service default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub querypool_connection_mode: Option<ConnectionMode>,

    /// Sensitive and never returned by the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_blob_container_uri: Option<String>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_full_name: Option<String>,

    /// ARM ID, assigned once Create succeeds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("name", &self.name)
            .field("resource_group_name", &self.resource_group_name)
            .field("location", &self.location)
            .field("sku", &self.sku)
            .field("admin_users", &self.admin_users)
            .field("enable_power_bi_service", &self.enable_power_bi_service)
            .field("ipv4_firewall_rule", &self.ipv4_firewall_rule)
            .field("querypool_connection_mode", &self.querypool_connection_mode)
            .field(
                "backup_blob_container_uri",
                &self.backup_blob_container_uri.as_ref().map(|_| "<sensitive>"),
            )
            .field("tags", &self.tags)
            .field("server_full_name", &self.server_full_name)
            .field("id", &self.id)
            .finish()
    }
}

impl ServerConfig {
    pub fn new(
        name: impl Into<String>,
        resource_group_name: impl Into<String>,
        location: impl Into<String>,
        sku: Sku,
    ) -> Self {
        Self {
            name: name.into(),
            resource_group_name: resource_group_name.into(),
            location: location.into(),
            sku,
            admin_users: BTreeSet::new(),
            enable_power_bi_service: false,
            ipv4_firewall_rule: BTreeSet::new(),
            querypool_connection_mode: None,
            backup_blob_container_uri: None,
            tags: BTreeMap::new(),
            server_full_name: None,
            id: None,
        }
    }

    /// Check the fields the types alone cannot enforce
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if let Err(e) = validate::server_name(&self.name) {
            problems.push(format!("name: {}", e));
        }
        if let Err(e) = validate::resource_group_name(&self.resource_group_name) {
            problems.push(e);
        }
        if let Err(e) = validate::not_empty("location", &self.location) {
            problems.push(e);
        }
        if let Some(uri) = &self.backup_blob_container_uri {
            if let Err(e) = validate::not_empty("backup_blob_container_uri", uri) {
                problems.push(e);
            }
        }
        for rule in &self.ipv4_firewall_rule {
            if let Err(e) = validate::not_empty("ipv4_firewall_rule.name", &rule.name) {
                problems.push(e);
            }
        }
        if let Err(e) = tags::validate(&self.tags) {
            problems.push(format!("tags: {}", e));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(CloudError::InvalidConfig(problems.join("; ")))
        }
    }

    /// Whether moving from `self` to `desired` needs destroy-and-recreate
    pub fn requires_replacement(&self, desired: &ServerConfig) -> bool {
        self.name != desired.name
            || self.resource_group_name != desired.resource_group_name
            || normalize_location(&self.location) != normalize_location(&desired.location)
    }

    /// Copy the computed fields of a previously applied record
    pub fn inherit_computed(&mut self, previous: &ServerConfig) {
        self.id = previous.id.clone();
        self.server_full_name = previous.server_full_name.clone();
    }

    fn server_id(&self) -> Result<AnalysisServicesServerId> {
        match &self.id {
            Some(id) if !id.is_empty() => AnalysisServicesServerId::parse(id),
            _ => Err(CloudError::MissingId(format!(
                "{} has no resource ID",
                describe_server(&self.resource_group_name, &self.name)
            ))),
        }
    }
}

// ============ Expand / flatten ============

fn expand_admin_users(admin_users: &BTreeSet<String>) -> ServerAdministrators {
    ServerAdministrators {
        members: Some(admin_users.iter().cloned().collect()),
    }
}

/// Local firewall fields -> request object. Never `None`: the service
/// distinguishes "no firewall settings" from "settings with no rules".
pub fn expand_firewall_settings(
    enable_power_bi_service: bool,
    rules: &BTreeSet<FirewallRule>,
) -> Ipv4FirewallSettings {
    Ipv4FirewallSettings {
        firewall_rules: Some(
            rules
                .iter()
                .map(|rule| Ipv4FirewallRule {
                    firewall_rule_name: Some(rule.name.clone()),
                    range_start: Some(rule.range_start.to_string()),
                    range_end: Some(rule.range_end.to_string()),
                })
                .collect(),
        ),
        enable_power_bi_service: Some(enable_power_bi_service),
    }
}

/// Remote firewall settings -> local fields. Missing settings read back as
/// power BI disabled with no rules.
pub fn flatten_firewall_settings(
    settings: Option<&Ipv4FirewallSettings>,
) -> Result<(bool, BTreeSet<FirewallRule>)> {
    let Some(settings) = settings else {
        return Ok((false, BTreeSet::new()));
    };

    let mut rules = BTreeSet::new();
    for rule in settings.firewall_rules.iter().flatten() {
        let name = rule.firewall_rule_name.clone().unwrap_or_default();
        rules.insert(FirewallRule {
            range_start: parse_address(&name, "range_start", rule.range_start.as_deref())?,
            range_end: parse_address(&name, "range_end", rule.range_end.as_deref())?,
            name,
        });
    }

    Ok((settings.enable_power_bi_service.unwrap_or(false), rules))
}

fn parse_address(rule: &str, field: &str, value: Option<&str>) -> Result<Ipv4Addr> {
    let value = value.unwrap_or_default();
    value.parse().map_err(|_| {
        CloudError::ApiError(format!(
            "firewall rule {:?} has an invalid {} {:?}",
            rule, field, value
        ))
    })
}

fn expand_sku(sku: Sku) -> ResourceSku {
    ResourceSku {
        name: sku.to_string(),
        ..Default::default()
    }
}

/// Request body for creating the server
pub fn expand_server(config: &ServerConfig) -> Server {
    Server {
        name: Some(config.name.clone()),
        location: Some(normalize_location(&config.location)),
        sku: Some(expand_sku(config.sku)),
        tags: Some(tags::expand(&config.tags)),
        properties: Some(ServerProperties {
            as_administrators: Some(expand_admin_users(&config.admin_users)),
            backup_blob_container_uri: config.backup_blob_container_uri.clone(),
            querypool_connection_mode: config.querypool_connection_mode,
            ipv4_firewall_settings: Some(expand_firewall_settings(
                config.enable_power_bi_service,
                &config.ipv4_firewall_rule,
            )),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Request body for updating the server. Name, resource group and location
/// are never part of it.
pub fn expand_update_parameters(config: &ServerConfig) -> ServerUpdateParameters {
    ServerUpdateParameters {
        sku: Some(expand_sku(config.sku)),
        tags: Some(tags::expand(&config.tags)),
        properties: Some(ServerMutableProperties {
            as_administrators: Some(expand_admin_users(&config.admin_users)),
            backup_blob_container_uri: config.backup_blob_container_uri.clone(),
            querypool_connection_mode: config.querypool_connection_mode,
            ipv4_firewall_settings: Some(expand_firewall_settings(
                config.enable_power_bi_service,
                &config.ipv4_firewall_rule,
            )),
        }),
    }
}

/// Write the remote representation into `config`. Nothing is written unless
/// every field translated.
fn flatten_server(
    config: &mut ServerConfig,
    id: &AnalysisServicesServerId,
    server: &Server,
) -> Result<()> {
    let sku = match &server.sku {
        Some(sku) => sku.name.parse::<Sku>().map_err(|e| {
            CloudError::ApiError(format!(
                "{}: {}",
                describe_server(&id.resource_group, &id.name),
                e
            ))
        })?,
        None => config.sku,
    };

    let properties = server.properties.as_ref();
    let admin_users = properties
        .and_then(|p| p.as_administrators.as_ref())
        .and_then(|a| a.members.clone())
        .unwrap_or_default()
        .into_iter()
        .collect();
    let (enable_power_bi_service, ipv4_firewall_rule) =
        flatten_firewall_settings(properties.and_then(|p| p.ipv4_firewall_settings.as_ref()))?;

    config.name = id.name.clone();
    config.resource_group_name = id.resource_group.clone();
    if let Some(location) = &server.location {
        config.location = normalize_location(location);
    }
    config.sku = sku;
    config.admin_users = admin_users;
    config.enable_power_bi_service = enable_power_bi_service;
    config.ipv4_firewall_rule = ipv4_firewall_rule;
    config.querypool_connection_mode = properties.and_then(|p| p.querypool_connection_mode);
    config.server_full_name = properties.and_then(|p| p.server_full_name.clone());
    config.tags = tags::flatten(server.tags.as_ref());

    Ok(())
}

fn remote_error(action: &str, subject: &str, err: AzureError) -> CloudError {
    CloudError::ApiError(format!("{} {}: {}", action, subject, err))
}

// ============ Reconciler ============

/// Reconciler for `azurerm_analysis_services_server`
pub struct AnalysisServicesServerResource<C: ?Sized> {
    client: Arc<C>,
    timeouts: Timeouts,
}

impl<C: ServerClient + ?Sized> AnalysisServicesServerResource<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Look up a server by key; absence is `None`
    async fn lookup(&self, resource_group: &str, name: &str) -> Result<Option<Server>> {
        match self.client.get_details(resource_group, name).await {
            Ok(server) => Ok(Some(server)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(remote_error(
                "checking for presence of existing",
                &describe_server(resource_group, name),
                e,
            )),
        }
    }

    async fn create_within(
        &self,
        config: &mut ServerConfig,
        options: &CreateOptions,
        deadline: &Deadline,
    ) -> Result<()> {
        let resource_group = config.resource_group_name.clone();
        let name = config.name.clone();
        let subject = describe_server(&resource_group, &name);

        tracing::info!("Preparing arguments for {} creation", subject);

        if config.id.is_none() && (options.prevent_import || options.adopt_interrupted) {
            let existing = deadline
                .run(&subject, self.lookup(&resource_group, &name))
                .await?;

            if let Some(id) = existing.and_then(|s| s.id).filter(|id| !id.is_empty()) {
                if !options.adopt_interrupted {
                    return Err(CloudError::ImportRequired {
                        resource_type: RESOURCE_TYPE.to_string(),
                        id,
                    });
                }

                tracing::info!("Adopting {} left by an interrupted create", subject);
                let mut adopted = config.clone();
                adopted.id = Some(id);
                self.update_within(&mut adopted, deadline).await?;
                *config = adopted;
                return Ok(());
            }
        }

        let server = expand_server(config);
        let mut operation = deadline
            .run(&subject, async {
                self.client
                    .create(&resource_group, &name, &server)
                    .await
                    .map_err(|e| remote_error("creating", &subject, e))
            })
            .await?;

        // From here on the server may exist even if we fail
        let expected_id =
            AnalysisServicesServerId::new(self.client.subscription_id(), &resource_group, &name)
                .to_string();
        match deadline.within(operation.wait_for_completion()).await {
            Some(Ok(())) => {}
            Some(Err(e @ AzureError::OperationFailed { .. })) => {
                return Err(remote_error("waiting for creation of", &subject, e));
            }
            Some(Err(e)) => {
                return Err(CloudError::CreateInterrupted {
                    id: expected_id,
                    reason: format!("waiting for creation of {}: {}", subject, e),
                });
            }
            None => {
                return Err(CloudError::CreateInterrupted {
                    id: expected_id,
                    reason: format!(
                        "creation of {} did not complete within {:?}",
                        subject,
                        deadline.budget()
                    ),
                });
            }
        }

        let created = deadline
            .run(&subject, async {
                self.client
                    .get_details(&resource_group, &name)
                    .await
                    .map_err(|e| remote_error("retrieving", &subject, e))
            })
            .await?;

        let id = created
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CloudError::MissingId(format!("cannot read ID for {}", subject)))?;
        config.id = Some(id);

        match self.read_within(config, deadline).await? {
            ReadOutcome::Present => Ok(()),
            ReadOutcome::Absent => Err(CloudError::ApiError(format!(
                "{} was not found immediately after creation",
                subject
            ))),
        }
    }

    async fn read_within(
        &self,
        config: &mut ServerConfig,
        deadline: &Deadline,
    ) -> Result<ReadOutcome> {
        let id = config.server_id()?;
        let subject = describe_server(&id.resource_group, &id.name);

        let server = deadline
            .run(&subject, async {
                match self.client.get_details(&id.resource_group, &id.name).await {
                    Ok(server) => Ok(Some(server)),
                    Err(e) if e.is_not_found() => Ok(None),
                    Err(e) => Err(remote_error("retrieving", &subject, e)),
                }
            })
            .await?;

        let Some(server) = server else {
            tracing::info!("{} was not found - removing from state", subject);
            config.id = None;
            return Ok(ReadOutcome::Absent);
        };

        flatten_server(config, &id, &server)?;
        Ok(ReadOutcome::Present)
    }

    async fn update_within(&self, config: &mut ServerConfig, deadline: &Deadline) -> Result<()> {
        let id = config.server_id()?;
        let subject = describe_server(&id.resource_group, &id.name);

        tracing::info!("Preparing arguments for {} update", subject);

        let parameters = expand_update_parameters(config);
        let mut operation = deadline
            .run(&subject, async {
                self.client
                    .update(&id.resource_group, &id.name, &parameters)
                    .await
                    .map_err(|e| remote_error("updating", &subject, e))
            })
            .await?;

        deadline
            .run(&subject, async {
                operation
                    .wait_for_completion()
                    .await
                    .map_err(|e| remote_error("waiting for update of", &subject, e))
            })
            .await?;

        match self.read_within(config, deadline).await? {
            ReadOutcome::Present => Ok(()),
            ReadOutcome::Absent => Err(CloudError::ResourceNotFound(format!(
                "{} disappeared while being updated",
                subject
            ))),
        }
    }
}

#[async_trait]
impl<C: ServerClient + ?Sized> Resource for AnalysisServicesServerResource<C> {
    type Config = ServerConfig;

    fn type_name(&self) -> &str {
        RESOURCE_TYPE
    }

    async fn create(&self, config: &mut ServerConfig, options: &CreateOptions) -> Result<()> {
        config.validate()?;
        let deadline = self.timeouts.start(Operation::Create);
        self.create_within(config, options, &deadline).await
    }

    async fn read(&self, config: &mut ServerConfig) -> Result<ReadOutcome> {
        let deadline = self.timeouts.start(Operation::Read);
        self.read_within(config, &deadline).await
    }

    async fn update(&self, config: &mut ServerConfig) -> Result<()> {
        config.validate()?;
        let deadline = self.timeouts.start(Operation::Update);
        self.update_within(config, &deadline).await
    }

    async fn delete(&self, config: &ServerConfig) -> Result<()> {
        let id = config.server_id()?;
        let subject = describe_server(&id.resource_group, &id.name);
        let deadline = self.timeouts.start(Operation::Delete);

        let operation = deadline
            .run(&subject, async {
                match self.client.delete(&id.resource_group, &id.name).await {
                    Ok(operation) => Ok(Some(operation)),
                    Err(e) if e.is_not_found() => Ok(None),
                    Err(e) => Err(remote_error("deleting", &subject, e)),
                }
            })
            .await?;

        let Some(mut operation) = operation else {
            tracing::info!("{} is already gone", subject);
            return Ok(());
        };

        deadline
            .run(&subject, async {
                operation
                    .wait_for_completion()
                    .await
                    .map_err(|e| remote_error("waiting for deletion of", &subject, e))
            })
            .await
    }
}
