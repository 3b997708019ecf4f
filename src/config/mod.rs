//! Configuration management with environment variable support.

mod auth;
mod error;
mod server;

pub use auth::{AuthConfig, AuthKind, AuthParams, DEFAULT_API_KEY_HEADER};
pub use error::ConfigError;
pub use server::ServerConfig;
