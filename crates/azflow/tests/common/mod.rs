#![allow(deprecated)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const SERVER_ID: &str = "/subscriptions/00000000-0000-0000-0000-000000000000/resourceGroups/analytics-rg/providers/Microsoft.AnalysisServices/servers/reporting01";

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Write `.azflow/state.json` holding one server record
    #[allow(dead_code)]
    pub fn write_state_with_server(&self, status: &str) {
        let dir = self.root.path().join(".azflow");
        fs::create_dir_all(&dir).unwrap();

        let state = serde_json_state(status);
        fs::write(dir.join("state.json"), state).unwrap();
    }

    #[allow(dead_code)]
    pub fn state_path(&self) -> PathBuf {
        self.root.path().join(".azflow").join("state.json")
    }

    /// `azflow` running in the project without Azure credentials
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("azflow").unwrap();
        cmd.current_dir(self.root.path())
            .env_remove("AZURE_SUBSCRIPTION_ID")
            .env_remove("AZURE_ACCESS_TOKEN")
            .env_remove("AZFLOW_PROJECT_DIR")
            .env("AZFLOW_CONFIG_PATH", missing_path(self.root.path()))
            .env("NO_COLOR", "1");
        cmd
    }
}

fn missing_path(root: &Path) -> PathBuf {
    root.join("does-not-exist.yaml")
}

fn serde_json_state(status: &str) -> String {
    format!(
        r#"{{
  "version": 1,
  "updated_at": "2026-01-01T00:00:00Z",
  "resources": {{
    "azurerm_analysis_services_server:reporting01": {{
      "id": "{id}",
      "resource_type": "azurerm_analysis_services_server",
      "status": "{status}",
      "attributes": {{
        "name": "reporting01",
        "resource_group_name": "analytics-rg",
        "location": "westeurope",
        "sku": "S0",
        "admin_users": ["alice@example.com"],
        "enable_power_bi_service": true,
        "ipv4_firewall_rule": [
          {{ "name": "office", "range_start": "10.0.0.1", "range_end": "10.0.0.9" }}
        ],
        "backup_blob_container_uri": "https://backups.blob.core.windows.net/as?sig=secret",
        "tags": {{ "env": "prod" }},
        "id": "{id}"
      }},
      "created_at": "2026-01-01T00:00:00Z",
      "updated_at": "2026-01-01T00:00:00Z"
    }}
  }}
}}"#,
        id = SERVER_ID,
        status = status
    )
}
