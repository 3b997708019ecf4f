//! SSE transport for MCP over HTTP.
//!
//! `GET /sse` opens an event stream per client. Its first event, `endpoint`,
//! tells the client where to post messages; every later `message` event
//! carries one server JSON-RPC message. Clients post their messages to
//! `POST /messages/?session_id=<id>`.
//!
//! Each connection owns a cancellation token, a child of the server's
//! shutdown token. It is cancelled when the client drops the event stream,
//! when the MCP side drops its transport, or on shutdown. Cancellation ends
//! both directions and forgets the connection.

use std::{
    collections::HashMap,
    future::Future,
    io,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::{stream::BoxStream, Sink, SinkExt, Stream, StreamExt};
use rmcp::{
    model::ClientJsonRpcMessage,
    service::{RxJsonRpcMessage, TxJsonRpcMessage},
    RoleServer,
};
use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard, PollSender};

use crate::session::generate_session_id;

/// Path of the event stream endpoint.
pub const SSE_PATH: &str = "/sse";
/// Path clients post their messages to.
pub const MESSAGES_PATH: &str = "/messages/";

const CHANNEL_CAPACITY: usize = 64;

type ConnectionId = Arc<str>;

/// Inbound senders of the open connections.
#[derive(Clone, Default)]
struct Connections {
    senders: Arc<RwLock<HashMap<ConnectionId, mpsc::Sender<ClientJsonRpcMessage>>>>,
}

impl Connections {
    async fn open(&self, id: ConnectionId, tx: mpsc::Sender<ClientJsonRpcMessage>) {
        self.senders.write().await.insert(id, tx);
    }

    async fn close(&self, id: &str) -> bool {
        self.senders.write().await.remove(id).is_some()
    }

    async fn sender(&self, id: &str) -> Option<mpsc::Sender<ClientJsonRpcMessage>> {
        self.senders.read().await.get(id).cloned()
    }

    async fn len(&self) -> usize {
        self.senders.read().await.len()
    }

    /// Forget `id` once `closed` is cancelled.
    async fn close_when_cancelled(self, id: ConnectionId, closed: CancellationToken) {
        closed.cancelled().await;
        if self.close(&id).await {
            tracing::info!(connection_id = %id, "SSE connection closed");
        }
    }
}

#[derive(Clone)]
struct SseApp {
    connections: Connections,
    transport_tx: mpsc::UnboundedSender<SseTransport>,
    shutdown: CancellationToken,
}

/// Transport for a single SSE connection.
///
/// Implements both `Sink` and `Stream` so it can be handed to
/// `rmcp::ServiceExt::serve` directly. The `Stream` half ends when the
/// connection is cancelled; dropping the transport cancels it.
pub struct SseTransport {
    inbound: BoxStream<'static, RxJsonRpcMessage<RoleServer>>,
    outbound: PollSender<TxJsonRpcMessage<RoleServer>>,
    connection_id: ConnectionId,
    closed: CancellationToken,
}

impl SseTransport {
    /// Identifier clients pass as `session_id` when posting messages.
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Whether the connection has been closed from either side.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

impl Drop for SseTransport {
    fn drop(&mut self) {
        self.closed.cancel();
    }
}

impl Sink<TxJsonRpcMessage<RoleServer>> for SseTransport {
    type Error = io::Error;

    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.outbound.poll_ready_unpin(cx).map_err(io::Error::other)
    }

    fn start_send(
        mut self: Pin<&mut Self>,
        item: TxJsonRpcMessage<RoleServer>,
    ) -> Result<(), Self::Error> {
        self.outbound.start_send_unpin(item).map_err(io::Error::other)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.outbound.poll_flush_unpin(cx).map_err(io::Error::other)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        let result = self.outbound.poll_close_unpin(cx).map_err(io::Error::other);
        if result.is_ready() {
            self.closed.cancel();
        }
        result
    }
}

impl Stream for SseTransport {
    type Item = RxJsonRpcMessage<RoleServer>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inbound.poll_next_unpin(cx)
    }
}

/// Event stream of one connection; dropping it cancels the connection.
pub struct EventStream {
    events: BoxStream<'static, Result<Event, io::Error>>,
    _closed: DropGuard,
}

impl Stream for EventStream {
    type Item = Result<Event, io::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_next_unpin(cx)
    }
}

fn cancelled(token: CancellationToken) -> impl Future<Output = ()> + Send + 'static {
    async move { token.cancelled().await }
}

fn message_event(message: TxJsonRpcMessage<RoleServer>) -> Result<Event, io::Error> {
    let json = serde_json::to_string(&message)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Event::default().event("message").data(json))
}

#[derive(Debug, serde::Deserialize)]
struct PostMessageQuery {
    #[serde(alias = "sessionId")]
    session_id: String,
}

async fn post_message_handler(
    State(app): State<SseApp>,
    Query(PostMessageQuery { session_id }): Query<PostMessageQuery>,
    Json(message): Json<ClientJsonRpcMessage>,
) -> StatusCode {
    tracing::debug!(session_id, ?message, "received client message");

    let Some(tx) = app.connections.sender(&session_id).await else {
        return StatusCode::NOT_FOUND;
    };

    if tx.send(message).await.is_err() {
        tracing::warn!(session_id, "message for a connection that is shutting down");
        return StatusCode::GONE;
    }

    StatusCode::ACCEPTED
}

async fn sse_handler(State(app): State<SseApp>) -> Result<Sse<EventStream>, Response<String>> {
    let connection_id = generate_session_id();
    let closed = app.shutdown.child_token();
    tracing::info!(%connection_id, "new SSE connection");

    let (from_client_tx, from_client_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (to_client_tx, to_client_rx) = mpsc::channel(CHANNEL_CAPACITY);

    app.connections
        .open(connection_id.clone(), from_client_tx)
        .await;

    let transport = SseTransport {
        inbound: ReceiverStream::new(from_client_rx)
            .take_until(cancelled(closed.clone()))
            .boxed(),
        outbound: PollSender::new(to_client_tx),
        connection_id: connection_id.clone(),
        closed: closed.clone(),
    };

    if app.transport_tx.send(transport).is_err() {
        tracing::warn!(%connection_id, "server is closing, rejecting SSE connection");
        app.connections.close(&connection_id).await;
        let mut response = Response::new("server is closing".to_string());
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        return Err(response);
    }

    tokio::spawn(
        app.connections
            .clone()
            .close_when_cancelled(connection_id.clone(), closed.clone()),
    );

    let endpoint_event = Event::default()
        .event("endpoint")
        .data(format!("{MESSAGES_PATH}?session_id={connection_id}"));

    let messages = ReceiverStream::new(to_client_rx)
        .take_until(cancelled(closed.clone()))
        .map(message_event);

    let events = EventStream {
        events: futures::stream::once(futures::future::ok(endpoint_event))
            .chain(messages)
            .boxed(),
        _closed: closed.drop_guard(),
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// SSE server handing out one [`SseTransport`] per connection.
///
/// # Example
///
/// ```rust,ignore
/// use servicenow_mcp::transport::SseServer;
///
/// let (mut sse_server, sse_router) = SseServer::new();
///
/// // Accept connections until shutdown
/// while let Some(transport) = sse_server.next_transport().await {
///     // Handle the transport...
/// }
/// ```
pub struct SseServer {
    transport_rx: mpsc::UnboundedReceiver<SseTransport>,
    connections: Connections,
    shutdown: CancellationToken,
}

impl SseServer {
    /// Create a new SSE server and the router serving its endpoints.
    ///
    /// The router can be layered with middleware before it is served.
    pub fn new() -> (Self, Router) {
        Self::with_shutdown(CancellationToken::new())
    }

    /// Like [`new`](Self::new), closing every connection when `shutdown` is
    /// cancelled.
    pub fn with_shutdown(shutdown: CancellationToken) -> (Self, Router) {
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let connections = Connections::default();

        let app = SseApp {
            connections: connections.clone(),
            transport_tx,
            shutdown: shutdown.clone(),
        };

        let router = Router::new()
            .route(SSE_PATH, get(sse_handler))
            .route(MESSAGES_PATH, post(post_message_handler))
            .with_state(app);

        let server = Self {
            transport_rx,
            connections,
            shutdown,
        };
        (server, router)
    }

    /// Wait for the next transport (new SSE connection).
    ///
    /// Returns `None` after shutdown or when all router clones have been
    /// dropped.
    pub async fn next_transport(&mut self) -> Option<SseTransport> {
        tokio::select! {
            transport = self.transport_rx.recv() => transport,
            _ = self.shutdown.cancelled() => None,
        }
    }

    /// Token whose cancellation closes every connection.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Close every connection and stop handing out transports.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Number of connections that can still receive posted messages.
    pub async fn connection_count(&self) -> usize {
        self.connections.len().await
    }
}
