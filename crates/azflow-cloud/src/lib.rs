//! azflow Cloud Infrastructure
//!
//! This crate provides the resource reconciliation abstraction for azflow:
//! a four-verb (Create/Read/Update/Delete) reconciler between a local
//! configuration record and an asynchronous, eventually-consistent remote API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   azflow CLI                     │
//! │          (apply / refresh / destroy)             │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 azflow-cloud                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          Resource Abstraction            │   │
//! │  │  trait Resource { create, read, ... }    │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │   Timeouts   │  │  State Mgmt  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//!           ┌───────▼───────┐
//!           │     azure     │
//!           │   provider    │
//!           └───────────────┘
//! ```

pub mod error;
pub mod provider;
pub mod resource;
pub mod state;
pub mod timeouts;

// Re-exports
pub use error::{CloudError, Result};
pub use provider::{AuthStatus, CloudProvider};
pub use resource::{CreateOptions, ReadOutcome, Resource};
pub use state::{GlobalState, ResourceState, ResourceStatus, StateLock, StateManager};
pub use timeouts::{Deadline, Operation, Timeouts};
