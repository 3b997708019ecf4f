//! Session identifiers and the middleware that publishes them.
//!
//! The server generates one identifier at construction and advertises it in
//! the `x-mcp-session-id` and `mcp-session-id` response headers.

mod id;
mod middleware;

pub use id::generate_session_id;
pub use middleware::{SessionHeaderLayer, SessionHeaderService, SESSION_HEADER, SESSION_HEADER_ALT};
