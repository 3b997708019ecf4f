//! Run the ServiceNow MCP server with the SSE transport.

use std::net::{IpAddr, SocketAddr};

use anyhow::Context;
use clap::Parser;
use servicenow_mcp::{
    bootstrap::{default_filter, init_tracing},
    transport, ServerConfig, ServiceNowMcp,
};

/// Run ServiceNow MCP SSE-based server
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
}

impl Args {
    fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let config = ServerConfig::from_env().context("invalid ServiceNow configuration")?;
    init_tracing(default_filter(config.debug));
    tracing::debug!(?config, "loaded configuration");

    let server = ServiceNowMcp::new(config).context("failed to create ServiceNow MCP server")?;
    transport::serve(server, args.socket_addr())
        .await
        .context("server error")?;

    Ok(())
}
