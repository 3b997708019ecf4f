//! MCP server exposing ServiceNow tools.

mod handler;
pub mod tools;

pub use handler::{create_servicenow_mcp, ServiceNowMcp};
