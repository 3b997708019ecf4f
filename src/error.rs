//! Crate-level error type.

use crate::config::ConfigError;
use crate::servicenow::ServiceNowError;

/// Error returned while building a [`ServiceNowMcp`](crate::ServiceNowMcp).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    ServiceNow(#[from] ServiceNowError),
}
