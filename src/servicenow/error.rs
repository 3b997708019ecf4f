//! ServiceNow client errors.

/// Error returned by [`ServiceNowClient`](super::ServiceNowClient) calls.
#[derive(Debug, thiserror::Error)]
pub enum ServiceNowError {
    /// The instance answered with a non-success status.
    #[error("ServiceNow request failed: {status} - {body}")]
    Status { status: u16, body: String },
    /// The request could not be sent or the response body not read.
    #[error("ServiceNow request error: {0}")]
    Http(#[from] reqwest::Error),
    /// The OAuth token endpoint did not return an access token.
    #[error("OAuth token request failed: {0}")]
    Token(String),
    /// No record matched a lookup by number.
    #[error("no {table} record found with number {number}")]
    NotFound { table: &'static str, number: String },
    /// The table name contains characters outside `[A-Za-z0-9_]`.
    #[error("invalid table name: {0:?}")]
    InvalidTable(String),
    /// A filter value contains the `^` term separator.
    #[error("invalid value for {field}: {value:?}")]
    InvalidQueryValue { field: &'static str, value: String },
    /// A configured header name or value cannot be sent.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
}
