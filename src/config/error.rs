//! Configuration errors.

/// Error returned when the server configuration cannot be built.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The auth type tag is not one of `basic`, `oauth` or `api_key`.
    #[error("unsupported auth type: {0}")]
    UnsupportedAuthType(String),
    /// A parameter required by the selected auth type was not provided.
    #[error("missing {name} for {auth_type} authentication")]
    MissingParameter {
        auth_type: &'static str,
        name: &'static str,
    },
    /// No ServiceNow instance URL was configured.
    #[error("missing ServiceNow instance URL (set SERVICENOW_INSTANCE_URL)")]
    MissingInstanceUrl,
}
