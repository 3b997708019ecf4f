//! ServiceNow Table API access.
//!
//! Records are fetched from `/api/now/table/<table>` and the `result` array of
//! the response is returned as-is, apart from incidents which are parsed into
//! [`Incident`] summaries.

mod client;
mod error;
mod incident;
mod query;

pub use client::ServiceNowClient;
pub use error::ServiceNowError;
pub use incident::Incident;
pub use query::{IncidentFilter, TableQuery, DEFAULT_LIMIT};
