//! Analysis Services wire types (api-version 2017-08-01)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Pricing tier of a server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sku {
    D1,
    B1,
    B2,
    S0,
    S1,
    S2,
    S4,
    S8,
    S9,
}

impl Sku {
    pub const ALL: [Sku; 9] = [
        Sku::D1,
        Sku::B1,
        Sku::B2,
        Sku::S0,
        Sku::S1,
        Sku::S2,
        Sku::S4,
        Sku::S8,
        Sku::S9,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sku::D1 => "D1",
            Sku::B1 => "B1",
            Sku::B2 => "B2",
            Sku::S0 => "S0",
            Sku::S1 => "S1",
            Sku::S2 => "S2",
            Sku::S4 => "S4",
            Sku::S8 => "S8",
            Sku::S9 => "S9",
        }
    }

    /// Tier family the SKU belongs to
    pub fn tier(&self) -> &'static str {
        match self {
            Sku::D1 => "Development",
            Sku::B1 | Sku::B2 => "Basic",
            _ => "Standard",
        }
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sku {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sku::ALL
            .iter()
            .copied()
            .find(|sku| sku.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "expected sku to be one of {:?}, got {:?}",
                    Sku::ALL.map(|sku| sku.as_str()),
                    s
                )
            })
    }
}

/// How the query pool serves connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionMode {
    All,
    ReadOnly,
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionMode::All => write!(f, "All"),
            ConnectionMode::ReadOnly => write!(f, "ReadOnly"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSku {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAdministrators {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ipv4FirewallRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firewall_rule_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_end: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ipv4FirewallSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firewall_rules: Option<Vec<Ipv4FirewallRule>>,
    #[serde(rename = "enablePowerBIService", skip_serializing_if = "Option::is_none")]
    pub enable_power_bi_service: Option<bool>,
}

/// Server properties as returned by the API and sent on create
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_administrators: Option<ServerAdministrators>,
    /// Write-only; the API never echoes it back
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_blob_container_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub querypool_connection_mode: Option<ConnectionMode>,
    #[serde(rename = "ipV4FirewallSettings", skip_serializing_if = "Option::is_none")]
    pub ipv4_firewall_settings: Option<Ipv4FirewallSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_full_name: Option<String>,
}

/// Remote server representation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Server {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<ResourceSku>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<ServerProperties>,
}

/// Properties that may change after creation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMutableProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_administrators: Option<ServerAdministrators>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_blob_container_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub querypool_connection_mode: Option<ConnectionMode>,
    #[serde(rename = "ipV4FirewallSettings", skip_serializing_if = "Option::is_none")]
    pub ipv4_firewall_settings: Option<Ipv4FirewallSettings>,
}

/// PATCH body for an existing server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerUpdateParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<ResourceSku>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<ServerMutableProperties>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sku_from_str() {
        assert_eq!("S0".parse::<Sku>().unwrap(), Sku::S0);
        assert_eq!(Sku::B2.tier(), "Basic");
        assert!("s0".parse::<Sku>().is_err());
        assert!("S3".parse::<Sku>().is_err());
    }

    #[test]
    fn test_server_wire_format() {
        let body = serde_json::json!({
            "id": "/subscriptions/sub/resourceGroups/rg/providers/Microsoft.AnalysisServices/servers/srv",
            "name": "srv",
            "type": "Microsoft.AnalysisServices/servers",
            "location": "West Europe",
            "sku": { "name": "S0", "tier": "Standard", "capacity": 1 },
            "tags": { "env": "prod" },
            "properties": {
                "asAdministrators": { "members": ["alice@example.com"] },
                "querypoolConnectionMode": "ReadOnly",
                "ipV4FirewallSettings": {
                    "firewallRules": [
                        { "firewallRuleName": "office", "rangeStart": "10.0.0.1", "rangeEnd": "10.0.0.9" }
                    ],
                    "enablePowerBIService": true
                },
                "state": "Succeeded",
                "provisioningState": "Succeeded",
                "serverFullName": "asazure://westeurope.asazure.windows.net/srv"
            }
        });

        let server: Server = serde_json::from_value(body).unwrap();
        let props = server.properties.unwrap();
        assert_eq!(props.querypool_connection_mode, Some(ConnectionMode::ReadOnly));
        let firewall = props.ipv4_firewall_settings.unwrap();
        assert_eq!(firewall.enable_power_bi_service, Some(true));
        assert_eq!(
            firewall.firewall_rules.unwrap()[0].firewall_rule_name.as_deref(),
            Some("office")
        );
    }

    #[test]
    fn test_update_parameters_omit_unset_fields() {
        let params = ServerUpdateParameters {
            sku: Some(ResourceSku {
                name: "S1".to_string(),
                ..Default::default()
            }),
            tags: None,
            properties: Some(ServerMutableProperties::default()),
        };

        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value, serde_json::json!({ "sku": { "name": "S1" }, "properties": {} }));
    }
}
