//! Web app assembly: SSE routes, session headers and the MCP run loop.

use std::{future::Future, io, net::SocketAddr};

use axum::Router;
use rmcp::ServiceExt;
use tokio::net::TcpListener;

use super::sse::{SseServer, SseTransport};
use crate::{server::ServiceNowMcp, session::SessionHeaderLayer};

/// Build the SSE server and its router for `mcp`.
///
/// Every response from the router, including the `/sse` stream's response
/// head, carries the server's session headers.
pub fn create_app(mcp: &ServiceNowMcp) -> (SseServer, Router) {
    let (sse_server, router) = SseServer::new();
    let router = router.layer(SessionHeaderLayer::new(Some(mcp.session_id())));
    (sse_server, router)
}

/// Serve `mcp` on `addr` until Ctrl-C.
///
/// Each SSE connection gets its own MCP run loop over a clone of `mcp`.
pub async fn serve(mcp: ServiceNowMcp, addr: SocketAddr) -> io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_with_shutdown(mcp, listener, shutdown_signal()).await
}

/// Serve `mcp` on `listener` until `signal` completes.
///
/// When `signal` fires, open SSE streams are closed, their run loops end and
/// the HTTP server drains before this returns.
pub async fn serve_with_shutdown<F>(
    mcp: ServiceNowMcp,
    listener: TcpListener,
    signal: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (mut sse_server, router) = create_app(&mcp);
    let shutdown = sse_server.shutdown_token();

    tracing::info!(
        addr = %listener.local_addr()?,
        session_id = mcp.session_id(),
        instance_url = %mcp.config().instance_url,
        "ServiceNow MCP server listening"
    );

    let http = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                signal.await;
                shutdown.cancel();
            })
            .await
    });

    while let Some(transport) = sse_server.next_transport().await {
        tokio::spawn(run_connection(mcp.clone(), transport));
    }

    http.await.map_err(io::Error::other)?
}

async fn run_connection(mcp: ServiceNowMcp, transport: SseTransport) {
    let connection_id = transport.connection_id().to_string();

    match mcp.serve(transport).await {
        Ok(running) => match running.waiting().await {
            Ok(reason) => tracing::info!(%connection_id, ?reason, "MCP session ended"),
            Err(e) => tracing::error!(%connection_id, error = %e, "MCP session task failed"),
        },
        Err(e) => tracing::error!(%connection_id, error = %e, "MCP initialization failed"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{AuthConfig, ServerConfig},
        session::{SESSION_HEADER, SESSION_HEADER_ALT},
        transport::{MESSAGES_PATH, SSE_PATH},
    };
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use futures::StreamExt;
    use std::time::Duration;
    use tower::util::ServiceExt as _;

    const WAIT: Duration = Duration::from_secs(5);

    fn test_server() -> ServiceNowMcp {
        let config = ServerConfig::new(
            "https://x.service-now.com",
            AuthConfig::Basic {
                username: "u".to_string(),
                password: "p".to_string(),
            },
        );
        ServiceNowMcp::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_sse_response_carries_session_headers() {
        let mcp = test_server();
        let (mut sse_server, router) = create_app(&mcp);

        let request = Request::builder().uri(SSE_PATH).body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let primary = response.headers().get(SESSION_HEADER).unwrap();
        let alternate = response.headers().get(SESSION_HEADER_ALT).unwrap();
        assert_eq!(primary, alternate);
        assert_eq!(primary, mcp.session_id());

        let _transport = sse_server.next_transport().await.unwrap();
        let mut body = response.into_body().into_data_stream();
        let first = body.next().await.unwrap().unwrap();
        assert!(String::from_utf8_lossy(&first).starts_with("event: endpoint"));
    }

    #[tokio::test]
    async fn test_message_rejection_carries_session_headers() {
        let mcp = test_server();
        let (_sse_server, router) = create_app(&mcp);

        let request = Request::builder()
            .method("POST")
            .uri(MESSAGES_PATH)
            .header("content-type", "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(SESSION_HEADER).unwrap(),
            mcp.session_id()
        );
        assert_eq!(
            response.headers().get(SESSION_HEADER_ALT).unwrap(),
            mcp.session_id()
        );
    }

    #[tokio::test]
    async fn test_next_transport_ends_when_router_dropped() {
        let mcp = test_server();
        let (mut sse_server, router) = create_app(&mcp);
        drop(router);
        assert!(sse_server.next_transport().await.is_none());
    }

    #[tokio::test]
    async fn test_client_disconnect_ends_run_loop() {
        let mcp = test_server();
        let (mut sse_server, router) = create_app(&mcp);

        let request = Request::builder().uri(SSE_PATH).body(Body::empty()).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let transport = sse_server.next_transport().await.unwrap();
        let session = tokio::spawn(run_connection(mcp.clone(), transport));

        let mut body = response.into_body().into_data_stream();
        let first = body.next().await.unwrap().unwrap();
        let endpoint = String::from_utf8_lossy(&first)
            .lines()
            .find_map(|line| line.strip_prefix("data: "))
            .unwrap()
            .to_string();
        drop(body);

        tokio::time::timeout(WAIT, session)
            .await
            .expect("MCP run loop kept running after disconnect")
            .unwrap();

        tokio::time::timeout(WAIT, async {
            while sse_server.connection_count().await > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("connection was not forgotten");

        let request = Request::builder()
            .method("POST")
            .uri(endpoint)
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            ))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_shutdown_with_open_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let server = tokio::spawn(serve_with_shutdown(test_server(), listener, async move {
            let _ = stop_rx.await;
        }));

        let mut response = reqwest::get(format!("http://{addr}{SSE_PATH}"))
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let first = response.chunk().await.unwrap().unwrap();
        assert!(first.starts_with(b"event: endpoint"));

        stop_tx.send(()).unwrap();

        tokio::time::timeout(WAIT, server)
            .await
            .expect("server did not stop with a client connected")
            .unwrap()
            .unwrap();

        let rest = tokio::time::timeout(WAIT, response.chunk())
            .await
            .expect("event stream was left open");
        assert!(!matches!(rest, Ok(Some(_))));
    }
}
