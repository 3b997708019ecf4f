//! ServiceNow MCP - Model Context Protocol server for ServiceNow over SSE.
//!
//! This crate wires a ServiceNow instance to MCP clients:
//!
//! - **config**: Upstream authentication (basic, OAuth, API key) and server settings
//! - **servicenow**: Table API client and incident queries
//! - **server**: MCP server handler and its tools
//! - **session**: Session identifier and the middleware that sends it as headers
//! - **transport**: SSE transport and web app assembly
//! - **bootstrap**: Tracing initialization utilities
//!
//! # Features
//!
//! - `bootstrap` - Tracing setup (enabled by default)
//! - `cli` - The `servicenow-mcp-sse` binary (enabled by default)
//!
//! # Example
//!
//! ```rust,ignore
//! use servicenow_mcp::{init_tracing, transport, ServerConfig, ServiceNowMcp};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     init_tracing("servicenow_mcp=debug");
//!     let server = ServiceNowMcp::new(ServerConfig::from_env()?)?;
//!     transport::serve(server, "0.0.0.0:8080".parse()?).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
mod error;
pub mod server;
pub mod servicenow;
pub mod session;
pub mod transport;

#[cfg(feature = "bootstrap")]
pub mod bootstrap;

// Re-exports for convenience
pub use config::{AuthConfig, AuthKind, AuthParams, ConfigError, ServerConfig};
pub use error::Error;
pub use server::{create_servicenow_mcp, ServiceNowMcp};
pub use servicenow::{Incident, IncidentFilter, ServiceNowClient, ServiceNowError, TableQuery};
pub use session::{generate_session_id, SessionHeaderLayer};
pub use transport::{create_app, SseServer, SseTransport};

#[cfg(feature = "bootstrap")]
pub use bootstrap::init_tracing;
