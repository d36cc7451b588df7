//! Azure Resource Manager resource IDs
//!
//! An ARM ID is a path of alternating key/value segments:
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/{namespace}/{type}/{name}`.

use azflow_cloud::{CloudError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const ANALYSIS_SERVICES_PROVIDER: &str = "Microsoft.AnalysisServices";

/// A parsed ARM resource ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub provider: String,
    /// Remaining `type/name` pairs below the provider
    pub path: BTreeMap<String, String>,
    raw: String,
}

impl ResourceId {
    pub fn parse(id: &str) -> Result<Self> {
        let invalid = |reason: String| CloudError::InvalidResourceId {
            id: id.to_string(),
            reason,
        };

        let trimmed = id.trim_matches('/');
        if trimmed.is_empty() {
            return Err(invalid("cannot parse an empty ID".to_string()));
        }

        let components: Vec<&str> = trimmed.split('/').collect();
        if components.len() % 2 != 0 {
            return Err(invalid(format!(
                "the number of path segments is not divisible by 2 ({})",
                components.len()
            )));
        }

        let mut subscription_id = None;
        let mut resource_group = None;
        let mut provider = None;
        let mut path = BTreeMap::new();

        for pair in components.chunks(2) {
            let (key, value) = (pair[0], pair[1]);
            if key.is_empty() || value.is_empty() {
                return Err(invalid(format!(
                    "key/value cannot be empty strings (key: {:?}, value: {:?})",
                    key, value
                )));
            }

            match key {
                "subscriptions" if subscription_id.is_none() => {
                    subscription_id = Some(value.to_string())
                }
                // Some ARM APIs return the lower-cased form
                "resourceGroups" | "resourcegroups" if resource_group.is_none() => {
                    resource_group = Some(value.to_string())
                }
                "providers" if provider.is_none() => provider = Some(value.to_string()),
                _ => {
                    path.insert(key.to_string(), value.to_string());
                }
            }
        }

        let subscription_id =
            subscription_id.ok_or_else(|| invalid("no subscription ID found".to_string()))?;
        let resource_group =
            resource_group.ok_or_else(|| invalid("no resource group name found".to_string()))?;

        Ok(Self {
            subscription_id,
            resource_group,
            provider: provider.unwrap_or_default(),
            path,
            raw: id.to_string(),
        })
    }

    /// Remove and return the value stored under `key`
    pub fn pop_segment(&mut self, key: &str) -> Result<String> {
        self.path
            .remove(key)
            .ok_or_else(|| CloudError::InvalidResourceId {
                id: self.raw.clone(),
                reason: format!("ID was missing the `{}` element", key),
            })
    }

    /// Fail if segments remain after the expected ones were popped
    pub fn validate_no_empty_segments(&self) -> Result<()> {
        if self.path.is_empty() {
            return Ok(());
        }
        Err(CloudError::InvalidResourceId {
            id: self.raw.clone(),
            reason: format!(
                "ID contained more segments than required: {:?}",
                self.path.keys().collect::<Vec<_>>()
            ),
        })
    }
}

/// ID of an Analysis Services server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisServicesServerId {
    pub subscription_id: String,
    pub resource_group: String,
    pub name: String,
}

impl AnalysisServicesServerId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            name: name.into(),
        }
    }

    pub fn parse(id: &str) -> Result<Self> {
        let mut parsed = ResourceId::parse(id)?;

        if !parsed.provider.eq_ignore_ascii_case(ANALYSIS_SERVICES_PROVIDER) {
            return Err(CloudError::InvalidResourceId {
                id: id.to_string(),
                reason: format!(
                    "expected provider {:?}, got {:?}",
                    ANALYSIS_SERVICES_PROVIDER, parsed.provider
                ),
            });
        }

        let name = parsed.pop_segment("servers")?;
        parsed.validate_no_empty_segments()?;

        Ok(Self {
            subscription_id: parsed.subscription_id,
            resource_group: parsed.resource_group,
            name,
        })
    }
}

impl fmt::Display for AnalysisServicesServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/{}/servers/{}",
            self.subscription_id, self.resource_group, ANALYSIS_SERVICES_PROVIDER, self.name
        )
    }
}

impl FromStr for AnalysisServicesServerId {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
