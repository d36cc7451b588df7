//! Azure Resource Manager client for Analysis Services servers
//!
//! Direct ARM REST implementation. Mutating calls return a
//! [`LongRunningOperation`] which polls the operation until it reaches a
//! terminal state; the caller bounds that wait with its own deadline.

use crate::describe_server;
use crate::error::{AzureError, Result};
use crate::models::{Server, ServerUpdateParameters};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{Method, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const DEFAULT_ENDPOINT: &str = "https://management.azure.com";
const API_VERSION: &str = "2017-08-01";
const SUBSCRIPTION_API_VERSION: &str = "2020-01-01";
const PROVIDER_NAMESPACE: &str = "Microsoft.AnalysisServices";
const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Handle on an accepted mutating call
#[async_trait]
pub trait LongRunningOperation: Send {
    /// Block until the operation succeeds or fails remotely
    async fn wait_for_completion(&mut self) -> Result<()>;
}

pub type PendingOperation = Box<dyn LongRunningOperation>;

/// Remote API for Analysis Services servers
#[async_trait]
pub trait ServerClient: Send + Sync {
    /// Subscription the client operates in
    fn subscription_id(&self) -> &str;

    /// Fetch a server. Absence is reported as [`AzureError::NotFound`].
    async fn get_details(&self, resource_group: &str, name: &str) -> Result<Server>;

    async fn create(
        &self,
        resource_group: &str,
        name: &str,
        server: &Server,
    ) -> Result<PendingOperation>;

    async fn update(
        &self,
        resource_group: &str,
        name: &str,
        parameters: &ServerUpdateParameters,
    ) -> Result<PendingOperation>;

    async fn delete(&self, resource_group: &str, name: &str) -> Result<PendingOperation>;
}

/// Configuration for the ARM client
#[derive(Debug, Clone)]
pub struct ArmConfig {
    pub endpoint: String,
    pub subscription_id: String,
    pub access_token: String,
    /// Polling delay used when the service sends no `Retry-After`
    pub poll_interval: Duration,
}

impl ArmConfig {
    pub fn new(subscription_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            subscription_id: subscription_id.into(),
            access_token: access_token.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Create ArmConfig from environment variables
    pub fn from_env() -> Result<Self> {
        let subscription_id = std::env::var("AZURE_SUBSCRIPTION_ID")
            .map_err(|_| AzureError::MissingEnvVar("AZURE_SUBSCRIPTION_ID".to_string()))?;
        let access_token = std::env::var("AZURE_ACCESS_TOKEN")
            .map_err(|_| AzureError::MissingEnvVar("AZURE_ACCESS_TOKEN".to_string()))?;

        let mut config = Self::new(subscription_id, access_token);
        if let Ok(endpoint) = std::env::var("AZURE_RESOURCE_MANAGER_ENDPOINT") {
            config.endpoint = endpoint;
        }
        Ok(config)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Subscription details, used to verify credentials
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInfo {
    pub subscription_id: String,
    pub display_name: Option<String>,
    pub state: Option<String>,
}

/// ARM REST client
#[derive(Clone)]
pub struct ArmServerClient {
    client: reqwest::Client,
    config: ArmConfig,
}

impl ArmServerClient {
    pub fn new(config: ArmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ArmConfig {
        &self.config
    }

    fn url(&self, segments: &[&str], api_version: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.endpoint)?;
        url.path_segments_mut()
            .map_err(|_| {
                AzureError::InvalidConfig(format!(
                    "endpoint {:?} cannot be used as a base URL",
                    self.config.endpoint
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    fn server_url(&self, resource_group: &str, name: &str) -> Result<Url> {
        self.url(
            &[
                "subscriptions",
                &self.config.subscription_id,
                "resourceGroups",
                resource_group,
                "providers",
                PROVIDER_NAMESPACE,
                "servers",
                name,
            ],
            API_VERSION,
        )
    }

    async fn send<B: serde::Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Response> {
        tracing::debug!("ARM {} {}", method, url);

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&self.config.access_token);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Start a mutating call and wrap its response in a poller
    async fn begin<B: serde::Serialize + ?Sized>(
        &self,
        method: Method,
        resource_group: &str,
        name: &str,
        body: Option<&B>,
    ) -> Result<PendingOperation> {
        let url = self.server_url(resource_group, name)?;
        let response = self.send(method.clone(), url.clone(), body).await?;

        // Only a DELETE 404 means "already gone"; elsewhere the body names the cause
        if method == Method::DELETE && response.status() == StatusCode::NOT_FOUND {
            return Err(AzureError::NotFound(describe_server(resource_group, name)));
        }
        let response = error_for_status(response).await?;

        let target = PollTarget::from_response(&method, &url, &response)?;
        Ok(Box::new(ArmPoller {
            client: self.client.clone(),
            access_token: self.config.access_token.clone(),
            target,
            retry_after: retry_after(response.headers()),
            poll_interval: self.config.poll_interval,
        }))
    }

    /// Fetch the subscription the client is configured for
    pub async fn get_subscription(&self) -> Result<SubscriptionInfo> {
        let url = self.url(
            &["subscriptions", &self.config.subscription_id],
            SUBSCRIPTION_API_VERSION,
        )?;
        let response = self.send::<()>(Method::GET, url, None).await?;
        let response = error_for_status(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ServerClient for ArmServerClient {
    fn subscription_id(&self) -> &str {
        &self.config.subscription_id
    }

    async fn get_details(&self, resource_group: &str, name: &str) -> Result<Server> {
        let url = self.server_url(resource_group, name)?;
        let response = self.send::<()>(Method::GET, url, None).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(AzureError::NotFound(describe_server(resource_group, name)));
        }
        let response = error_for_status(response).await?;
        Ok(response.json().await?)
    }

    async fn create(
        &self,
        resource_group: &str,
        name: &str,
        server: &Server,
    ) -> Result<PendingOperation> {
        self.begin(Method::PUT, resource_group, name, Some(server))
            .await
    }

    async fn update(
        &self,
        resource_group: &str,
        name: &str,
        parameters: &ServerUpdateParameters,
    ) -> Result<PendingOperation> {
        self.begin(Method::PATCH, resource_group, name, Some(parameters))
            .await
    }

    async fn delete(&self, resource_group: &str, name: &str) -> Result<PendingOperation> {
        self.begin::<()>(Method::DELETE, resource_group, name, None)
            .await
    }
}

// ============ Long-running operations ============

/// Where the poller looks for the operation's outcome
#[derive(Debug, Clone, PartialEq, Eq)]
enum PollTarget {
    /// `Azure-AsyncOperation` status monitor
    AsyncOperation(Url),
    /// `Location` header; 202 while running, 2xx when done
    Location(Url),
    /// No monitor headers; watch the resource's own provisioning state
    ProvisioningState(Url),
    Done,
}

impl PollTarget {
    fn from_response(method: &Method, resource_url: &Url, response: &Response) -> Result<Self> {
        let headers = response.headers();

        if let Some(url) = header_url(headers, AZURE_ASYNC_OPERATION)? {
            return Ok(PollTarget::AsyncOperation(url));
        }
        if let Some(url) = header_url(headers, LOCATION.as_str())? {
            return Ok(PollTarget::Location(url));
        }

        // A synchronous PUT/PATCH answer may still carry a non-terminal
        // provisioning state
        let status = response.status();
        if *method != Method::DELETE
            && (status == StatusCode::CREATED || status == StatusCode::ACCEPTED)
        {
            return Ok(PollTarget::ProvisioningState(resource_url.clone()));
        }

        Ok(PollTarget::Done)
    }
}

/// Poller for ARM long-running operations
pub struct ArmPoller {
    client: reqwest::Client,
    access_token: String,
    target: PollTarget,
    retry_after: Option<Duration>,
    poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
struct OperationStatus {
    status: String,
    #[serde(default)]
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ProvisioningEnvelope {
    #[serde(default)]
    properties: Option<ProvisioningProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProvisioningProperties {
    #[serde(default)]
    provisioning_state: Option<String>,
}

enum Progress {
    Running,
    Finished,
}

impl ArmPoller {
    async fn poll_once(&mut self) -> Result<Progress> {
        let url = match &self.target {
            PollTarget::Done => return Ok(Progress::Finished),
            PollTarget::AsyncOperation(url)
            | PollTarget::Location(url)
            | PollTarget::ProvisioningState(url) => url.clone(),
        };

        tracing::debug!("Polling long-running operation: {}", url);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        self.retry_after = retry_after(response.headers());

        match &self.target {
            PollTarget::AsyncOperation(_) => {
                let response = error_for_status(response).await?;
                let status: OperationStatus = response.json().await?;
                terminal_state(&status.status, status.error)
            }
            PollTarget::Location(_) => {
                if response.status() == StatusCode::ACCEPTED {
                    return Ok(Progress::Running);
                }
                error_for_status(response).await?;
                Ok(Progress::Finished)
            }
            PollTarget::ProvisioningState(_) => {
                let response = error_for_status(response).await?;
                let envelope: ProvisioningEnvelope = response.json().await?;
                match envelope.properties.and_then(|p| p.provisioning_state) {
                    Some(state) => terminal_state(&state, None),
                    None => Ok(Progress::Finished),
                }
            }
            PollTarget::Done => Ok(Progress::Finished),
        }
    }
}

#[async_trait]
impl LongRunningOperation for ArmPoller {
    async fn wait_for_completion(&mut self) -> Result<()> {
        loop {
            if self.target == PollTarget::Done {
                return Ok(());
            }

            let delay = self.retry_after.unwrap_or(self.poll_interval);
            tokio::time::sleep(delay).await;

            if let Progress::Finished = self.poll_once().await? {
                self.target = PollTarget::Done;
                return Ok(());
            }
        }
    }
}

fn terminal_state(state: &str, error: Option<ApiErrorDetail>) -> Result<Progress> {
    if state.eq_ignore_ascii_case("Succeeded") {
        Ok(Progress::Finished)
    } else if state.eq_ignore_ascii_case("Failed") || state.eq_ignore_ascii_case("Canceled") {
        Err(AzureError::OperationFailed {
            status: state.to_string(),
            message: error
                .map(|e| format!("{}: {}", e.code, e.message))
                .unwrap_or_else(|| "no error details returned".to_string()),
        })
    } else {
        Ok(Progress::Running)
    }
}

fn header_url(headers: &HeaderMap, name: &str) -> Result<Option<Url>> {
    match headers.get(name).and_then(|v| v.to_str().ok()) {
        Some(value) => Url::parse(value).map(Some).map_err(|e| {
            AzureError::InvalidPollingResponse(format!("{} header {:?}: {}", name, value, e))
        }),
        None => Ok(None),
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

// ============ Error bodies ============

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

async fn error_for_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ApiErrorResponse>(&body) {
        Ok(parsed) => (parsed.error.code, parsed.error.message),
        Err(_) => (
            status.canonical_reason().unwrap_or("Unknown").to_string(),
            body,
        ),
    };

    Err(AzureError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}
