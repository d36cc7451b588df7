//! Cloud resource error types

use thiserror::Error;

/// Errors surfaced by resource reconcilers
#[derive(Error, Debug)]
pub enum CloudError {
    /// The remote object does not exist. Read turns this into
    /// [`ReadOutcome::Absent`](crate::ReadOutcome::Absent).
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error(
        "A resource with the ID {id:?} already exists - to be managed via azflow this resource \
         needs to be imported into the state. Please see the documentation for {resource_type:?} \
         for more information"
    )]
    ImportRequired { resource_type: String, id: String },

    #[error("Invalid resource ID {id:?}: {reason}")]
    InvalidResourceId { id: String, reason: String },

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Missing ID: {0}")]
    MissingId(String),

    /// The mutating call was accepted but its completion was never observed.
    /// The remote object may or may not exist under `id`.
    #[error("Creation of {id:?} was interrupted: {reason}")]
    CreateInterrupted { id: String, reason: String },

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::ResourceNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
