//! Session identifier generation.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Generate a random 32-character hex session identifier.
///
/// Combines the current timestamp with 64 random bits, so identifiers
/// generated in the same nanosecond still differ.
///
/// # Example
///
/// ```rust
/// use servicenow_mcp::session::generate_session_id;
///
/// let id = generate_session_id();
/// assert_eq!(id.len(), 32);
/// assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
pub fn generate_session_id() -> Arc<str> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let random: u64 = rand::random();
    Arc::from(format!("{timestamp:016x}{random:016x}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_length() {
        assert_eq!(generate_session_id().len(), 32);
    }

    #[test]
    fn test_id_is_hex() {
        let id = generate_session_id();
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_ids_are_unique() {
        let id1 = generate_session_id();
        let id2 = generate_session_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_id_is_valid_header_value() {
        let id = generate_session_id();
        assert!(axum::http::HeaderValue::from_str(&id).is_ok());
    }
}
