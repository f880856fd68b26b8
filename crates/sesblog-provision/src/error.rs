use std::time::Duration;
use thiserror::Error;

use crate::dashboard::DashboardStatus;

/// Provisioning failure. Flows abort on the first error; nothing already
/// created is rolled back.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{operation} failed: {message}")]
    Remote {
        operation: &'static str,
        message: String,
    },

    #[error("no users found in namespace '{namespace}'")]
    NoUsers { namespace: String },

    #[error("invalid dashboard definition: {0}")]
    InvalidDefinition(String),

    #[error("dashboard '{dashboard_id}' reached terminal status {status}")]
    TerminalState {
        dashboard_id: String,
        status: DashboardStatus,
    },

    #[error("timed out after {waited:?} waiting for dashboard '{dashboard_id}'")]
    PollTimeout {
        dashboard_id: String,
        waited: Duration,
    },
}

impl ProvisionError {
    /// Wrap an SDK or transport error from a remote call
    pub fn remote(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Remote {
            operation,
            message: err.to_string(),
        }
    }
}
