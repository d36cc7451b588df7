//! Per-operation deadlines
//!
//! Every reconciler verb runs under a single deadline covering all of its
//! remote calls. When the deadline elapses the local future is dropped; the
//! remote operation keeps running unobserved and the next Read reconciles it.

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

const DEFAULT_CREATE: Duration = Duration::from_secs(30 * 60);
const DEFAULT_READ: Duration = Duration::from_secs(5 * 60);
const DEFAULT_UPDATE: Duration = Duration::from_secs(30 * 60);
const DEFAULT_DELETE: Duration = Duration::from_secs(30 * 60);

// Stand-in for a budget too large to add to the clock
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Reconciler verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Deadlines for each verb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: DEFAULT_CREATE,
            read: DEFAULT_READ,
            update: DEFAULT_UPDATE,
            delete: DEFAULT_DELETE,
        }
    }
}

impl Timeouts {
    pub fn for_operation(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }

    /// Start the clock for one invocation of `operation`
    pub fn start(&self, operation: Operation) -> Deadline {
        Deadline::after(operation, self.for_operation(operation))
    }
}

/// A fixed point in time shared by every remote call of one invocation
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    operation: Operation,
    budget: Duration,
    at: Instant,
}

impl Deadline {
    pub fn after(operation: Operation, budget: Duration) -> Self {
        let now = Instant::now();
        let at = now.checked_add(budget).unwrap_or_else(|| now + FAR_FUTURE);
        Self {
            operation,
            budget,
            at,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Await `fut`, or `None` once the deadline has passed
    pub async fn within<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::time::timeout_at(self.at, fut).await.ok()
    }

    /// Await `fut`, failing with [`CloudError::Timeout`] once the deadline
    /// has passed
    pub async fn run<T, F>(&self, subject: impl Display, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.within(fut).await {
            Some(result) => result,
            None => {
                tracing::warn!(
                    operation = %self.operation,
                    budget = ?self.budget,
                    "deadline elapsed for {}",
                    subject
                );
                Err(CloudError::Timeout(format!(
                    "{} of {} did not complete within {:?}",
                    self.operation, subject, self.budget
                )))
            }
        }
    }
}
