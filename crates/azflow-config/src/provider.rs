//! Provider-wide settings
//!
//! ```yaml
//! features:
//!   prevent_import: true
//!   adopt_interrupted: true
//! timeouts:
//!   create_minutes: 60
//!   read_minutes: 5
//! poll_interval_secs: 15
//! ```

use crate::error::{ConfigError, Result};
use azflow_cloud::{CreateOptions, Timeouts};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    pub features: FeaturesConfig,
    pub timeouts: TimeoutsConfig,

    /// Delay between polls of a long-running operation when the service
    /// does not send `Retry-After`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeaturesConfig {
    /// Refuse to create over an existing server
    pub prevent_import: bool,

    /// Take over a server whose create was started but never confirmed
    pub adopt_interrupted: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            prevent_import: true,
            adopt_interrupted: true,
        }
    }
}

/// Per-verb deadlines in whole minutes; unset fields keep the defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_minutes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_minutes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_minutes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_minutes: Option<u64>,
}

/// Longest accepted deadline (one week)
pub const MAX_TIMEOUT_MINUTES: u64 = 7 * 24 * 60;

fn minutes(value: Option<u64>, default: Duration) -> Duration {
    value.map_or(default, |m| Duration::from_secs(m.saturating_mul(60)))
}

impl TimeoutsConfig {
    pub fn to_timeouts(&self) -> Timeouts {
        let defaults = Timeouts::default();
        Timeouts {
            create: minutes(self.create_minutes, defaults.create),
            read: minutes(self.read_minutes, defaults.read),
            update: minutes(self.update_minutes, defaults.update),
            delete: minutes(self.delete_minutes, defaults.delete),
        }
    }

    fn fields(&self) -> [(&'static str, Option<u64>); 4] {
        [
            ("create_minutes", self.create_minutes),
            ("read_minutes", self.read_minutes),
            ("update_minutes", self.update_minutes),
            ("delete_minutes", self.delete_minutes),
        ]
    }

    /// Fields set to zero or beyond [`MAX_TIMEOUT_MINUTES`]
    fn out_of_range(&self) -> Vec<&'static str> {
        self.fields()
            .into_iter()
            .filter(|(_, value)| matches!(value, Some(m) if *m == 0 || *m > MAX_TIMEOUT_MINUTES))
            .map(|(name, _)| name)
            .collect()
    }
}

impl ProviderConfig {
    /// Read and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(path, &content)
    }

    /// Parse YAML content; `path` is only used in error messages
    pub fn from_yaml(path: &Path, content: &str) -> Result<Self> {
        // An empty file means "all defaults"
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;

        let out_of_range = config.timeouts.out_of_range();
        if !out_of_range.is_empty() {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                message: format!(
                    "timeouts must be between 1 and {} minutes: {}",
                    MAX_TIMEOUT_MINUTES,
                    out_of_range.join(", ")
                ),
            });
        }
        if config.poll_interval_secs == Some(0) {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                message: "poll_interval_secs must be at least 1".to_string(),
            });
        }

        Ok(config)
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts.to_timeouts()
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_secs.map(Duration::from_secs)
    }

    /// Options for a Create of a server with no pending create recorded
    pub fn create_options(&self) -> CreateOptions {
        CreateOptions::default().with_prevent_import(self.features.prevent_import)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(content: &str) -> Result<ProviderConfig> {
        ProviderConfig::from_yaml(&PathBuf::from("azflow.yaml"), content)
    }

    #[test]
    fn test_defaults() {
        let config = parse("").unwrap();
        assert!(config.features.prevent_import);
        assert!(config.features.adopt_interrupted);
        assert_eq!(config.timeouts(), Timeouts::default());
        assert_eq!(config.poll_interval(), None);
        assert!(config.create_options().prevent_import);
        assert!(!config.create_options().adopt_interrupted);
    }

    #[test]
    fn test_partial_timeouts_keep_defaults() {
        let config = parse(
            r#"
timeouts:
  create_minutes: 90
poll_interval_secs: 5
"#,
        )
        .unwrap();

        let timeouts = config.timeouts();
        assert_eq!(timeouts.create, Duration::from_secs(90 * 60));
        assert_eq!(timeouts.read, Duration::from_secs(5 * 60));
        assert_eq!(timeouts.delete, Duration::from_secs(30 * 60));
        assert_eq!(config.poll_interval(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_features() {
        let config = parse(
            r#"
features:
  prevent_import: false
  adopt_interrupted: false
"#,
        )
        .unwrap();

        assert!(!config.features.prevent_import);
        assert!(!config.features.adopt_interrupted);
        assert!(!config.create_options().prevent_import);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = parse("timeouts:\n  read_minutes: 0\n").unwrap_err();
        match err {
            ConfigError::Invalid { message, .. } => assert!(message.contains("read_minutes")),
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_timeout_rejected() {
        let err = parse("timeouts:\n  read_minutes: 18446744073709551615\n").unwrap_err();
        match err {
            ConfigError::Invalid { message, .. } => assert!(message.contains("read_minutes")),
            other => panic!("Expected Invalid, got {:?}", other),
        }

        let err = parse("timeouts:\n  create_minutes: 200000000000000000\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let config = parse(&format!("timeouts:\n  delete_minutes: {}\n", MAX_TIMEOUT_MINUTES))
            .unwrap();
        assert_eq!(
            config.timeouts().delete,
            Duration::from_secs(MAX_TIMEOUT_MINUTES * 60)
        );
    }

    #[test]
    fn test_unchecked_timeouts_saturate() {
        let timeouts = TimeoutsConfig {
            read_minutes: Some(u64::MAX),
            ..Default::default()
        }
        .to_timeouts();
        assert_eq!(timeouts.read, Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = parse("timeouts:\n  create: 10\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }
}
