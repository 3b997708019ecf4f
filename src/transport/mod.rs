//! SSE transport and web app assembly.
//!
//! `GET /sse` opens an event stream and `POST /messages/` delivers client
//! messages; both are wrapped in the session header middleware.

mod app;
mod sse;

pub use app::{create_app, serve, serve_with_shutdown};
pub use sse::{EventStream, SseServer, SseTransport, MESSAGES_PATH, SSE_PATH};
