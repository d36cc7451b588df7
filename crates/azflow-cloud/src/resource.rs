//! Resource reconciler trait definition

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Four-verb reconciler between a local configuration record and the remote
/// object it describes.
///
/// Implementations own the translation between `Config` and the remote
/// representation. The record is only written once the step producing the
/// new values succeeded, so a failed call leaves it as it was (a Create that
/// already adopted its id before the final refresh is the one exception).
#[async_trait]
pub trait Resource: Send + Sync {
    /// Local configuration record (desired state plus computed fields)
    type Config: Send;

    /// Returns the resource type name (e.g., "azurerm_analysis_services_server")
    fn type_name(&self) -> &str;

    /// Create the remote object and populate the record's computed fields
    async fn create(&self, config: &mut Self::Config, options: &CreateOptions) -> Result<()>;

    /// Refresh the record from the remote object.
    ///
    /// Returns [`ReadOutcome::Absent`] and clears the record's id when the
    /// remote object no longer exists.
    async fn read(&self, config: &mut Self::Config) -> Result<ReadOutcome>;

    /// Apply the record's mutable fields to the remote object
    async fn update(&self, config: &mut Self::Config) -> Result<()>;

    /// Delete the remote object
    async fn delete(&self, config: &Self::Config) -> Result<()>;
}

/// Result of a Read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadOutcome {
    /// The record was refreshed from the remote object
    Present,
    /// The remote object is gone; the record's id has been cleared
    Absent,
}

/// Options controlling Create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOptions {
    /// Fail with `ImportRequired` when an object with the same key exists
    pub prevent_import: bool,

    /// Take over an existing object left behind by an earlier create whose
    /// completion was not observed, instead of failing with `ImportRequired`
    pub adopt_interrupted: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            prevent_import: true,
            adopt_interrupted: false,
        }
    }
}

impl CreateOptions {
    pub fn with_prevent_import(mut self, prevent_import: bool) -> Self {
        self.prevent_import = prevent_import;
        self
    }

    pub fn with_adopt_interrupted(mut self, adopt_interrupted: bool) -> Self {
        self.adopt_interrupted = adopt_interrupted;
        self
    }
}
