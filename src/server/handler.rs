//! MCP server handler backed by a ServiceNow instance.

use std::{future::Future, sync::Arc};

use rmcp::{
    model::{
        CallToolRequestParam, CallToolResult, Content, ErrorData as McpError, Implementation,
        JsonObject, ListToolsResult, PaginatedRequestParam, ProtocolVersion, ServerCapabilities,
        ServerInfo,
    },
    service::RequestContext,
    RoleServer, ServerHandler,
};

use super::tools::{self, ToolCall};
use crate::{
    config::{AuthConfig, AuthParams, ServerConfig},
    servicenow::ServiceNowClient,
    session::generate_session_id,
    Error,
};

/// ServiceNow MCP server.
///
/// Holds the configuration, the upstream client and the session identifier
/// generated at construction. Clones share all three, so one value can serve
/// any number of SSE connections.
#[derive(Clone)]
pub struct ServiceNowMcp {
    config: Arc<ServerConfig>,
    client: ServiceNowClient,
    session_id: Arc<str>,
}

impl ServiceNowMcp {
    /// Create a server for `config` with a fresh session identifier.
    pub fn new(config: ServerConfig) -> Result<Self, Error> {
        let client = ServiceNowClient::new(&config)?;
        let session_id = generate_session_id();
        tracing::debug!(%session_id, instance_url = %config.instance_url, "created ServiceNow MCP server");

        Ok(Self {
            config: Arc::new(config),
            client,
            session_id,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn client(&self) -> &ServiceNowClient {
        &self.client
    }

    /// Identifier advertised in the session response headers.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Invoke a tool by name.
    ///
    /// Unknown tools and malformed arguments are protocol errors. Failures
    /// talking to ServiceNow are logged and returned as an error result.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let call = ToolCall::parse(name, arguments)?;
        tracing::debug!(tool = name, ?call, "calling tool");

        match call.execute(&self.client).await {
            Ok(value) => {
                let text = serde_json::to_string_pretty(&value)
                    .map_err(|e| McpError::internal_error(e.to_string(), None))?;
                Ok(CallToolResult::success(vec![Content::text(text)]))
            }
            Err(e) => {
                tracing::error!(tool = name, error = %e, "tool call failed");
                Ok(CallToolResult::error(vec![Content::text(format!(
                    "Error calling tool '{name}': {e}"
                ))]))
            }
        }
    }
}

impl ServerHandler for ServiceNowMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(format!(
                "Tools for reading incidents and table records from the ServiceNow instance at {}",
                self.client.instance_url()
            )),
        }
    }

    fn list_tools(
        &self,
        _request: PaginatedRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult {
            tools: tools::catalog(),
            next_cursor: None,
        }))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move { self.call(&request.name, request.arguments).await }
    }
}

/// Build a server from an auth type tag and its parameters.
///
/// # Example
///
/// ```rust,no_run
/// use servicenow_mcp::{config::AuthParams, create_servicenow_mcp};
///
/// let params = AuthParams {
///     api_key: Some("secret".into()),
///     ..Default::default()
/// };
/// let server = create_servicenow_mcp("https://dev1234.service-now.com", "api_key", params)?;
/// # Ok::<(), servicenow_mcp::Error>(())
/// ```
pub fn create_servicenow_mcp(
    instance_url: &str,
    auth_type: &str,
    params: AuthParams,
) -> Result<ServiceNowMcp, Error> {
    let auth = AuthConfig::resolve(auth_type, params)?;
    ServiceNowMcp::new(ServerConfig::new(instance_url, auth))
}
