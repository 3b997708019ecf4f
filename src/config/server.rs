//! Server configuration for the ServiceNow MCP server.

use super::auth::{AuthConfig, AuthParams};
use super::error::ConfigError;

/// Configuration consumed once when the MCP server is constructed.
///
/// Reads from environment variables with sensible defaults:
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `SERVICENOW_INSTANCE_URL` | (required) | Instance base URL |
/// | `SERVICENOW_AUTH_TYPE` | `basic` | `basic`, `oauth` or `api_key` |
/// | `SERVICENOW_DEBUG` | `false` | Verbose logging |
///
/// Credentials are read by [`AuthParams::from_env`].
///
/// # Example
///
/// ```rust
/// use servicenow_mcp::config::{AuthConfig, ServerConfig};
///
/// let config = ServerConfig::new(
///     "dev1234.service-now.com",
///     AuthConfig::Basic { username: "u".into(), password: "p".into() },
/// );
/// assert_eq!(config.instance_url, "https://dev1234.service-now.com");
/// ```
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Instance base URL, always with a scheme and without trailing slash
    pub instance_url: String,
    /// Upstream credentials
    pub auth: AuthConfig,
    /// Verbose logging (default: false)
    pub debug: bool,
}

impl ServerConfig {
    /// Create a config with `debug` disabled.
    pub fn new(instance_url: &str, auth: AuthConfig) -> Self {
        Self {
            instance_url: normalize_instance_url(instance_url),
            auth,
            debug: false,
        }
    }

    /// Enable or disable debug mode.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Create a new config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let instance_url = std::env::var("SERVICENOW_INSTANCE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingInstanceUrl)?;
        let auth_type =
            std::env::var("SERVICENOW_AUTH_TYPE").unwrap_or_else(|_| "basic".to_string());
        let auth = AuthConfig::resolve(&auth_type, AuthParams::from_env())?;
        let debug = std::env::var("SERVICENOW_DEBUG")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Ok(Self::new(&instance_url, auth).with_debug(debug))
    }

    /// OAuth token endpoint for this instance.
    ///
    /// Returns the configured `token_url`, or `<instance>/oauth_token.do`.
    /// `None` unless OAuth is configured.
    pub fn token_url(&self) -> Option<String> {
        match &self.auth {
            AuthConfig::OAuth { token_url, .. } => Some(
                token_url
                    .clone()
                    .unwrap_or_else(|| format!("{}/oauth_token.do", self.instance_url)),
            ),
            _ => None,
        }
    }
}

fn normalize_instance_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic() -> AuthConfig {
        AuthConfig::Basic {
            username: "u".to_string(),
            password: "p".to_string(),
        }
    }

    #[test]
    fn test_new_keeps_full_url() {
        let config = ServerConfig::new("https://x.service-now.com", basic());
        assert_eq!(config.instance_url, "https://x.service-now.com");
        assert!(!config.debug);
    }

    #[test]
    fn test_new_normalizes_url() {
        let config = ServerConfig::new(" x.service-now.com/ ", basic());
        assert_eq!(config.instance_url, "https://x.service-now.com");

        let config = ServerConfig::new("http://localhost:1234//", basic());
        assert_eq!(config.instance_url, "http://localhost:1234");
    }

    #[test]
    fn test_with_debug() {
        let config = ServerConfig::new("https://x.service-now.com", basic()).with_debug(true);
        assert!(config.debug);
    }

    #[test]
    fn test_token_url_default_and_override() {
        let oauth = |token_url: Option<&str>| AuthConfig::OAuth {
            client_id: "c".to_string(),
            client_secret: "s".to_string(),
            username: "u".to_string(),
            password: "p".to_string(),
            token_url: token_url.map(str::to_string),
        };

        let config = ServerConfig::new("https://x.service-now.com", oauth(None));
        assert_eq!(
            config.token_url().as_deref(),
            Some("https://x.service-now.com/oauth_token.do")
        );

        let config = ServerConfig::new("https://x.service-now.com", oauth(Some("https://idp/t")));
        assert_eq!(config.token_url().as_deref(), Some("https://idp/t"));

        let config = ServerConfig::new("https://x.service-now.com", basic());
        assert!(config.token_url().is_none());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(parse_flag(" YES "));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }

    // All environment manipulation lives in one test, since tests run in parallel.
    #[test]
    fn test_from_env() {
        for name in [
            "SERVICENOW_INSTANCE_URL",
            "SERVICENOW_AUTH_TYPE",
            "SERVICENOW_DEBUG",
            "SERVICENOW_USERNAME",
            "SERVICENOW_PASSWORD",
            "SERVICENOW_API_KEY",
            "SERVICENOW_API_KEY_HEADER",
        ] {
            std::env::remove_var(name);
        }
        assert!(matches!(
            ServerConfig::from_env(),
            Err(ConfigError::MissingInstanceUrl)
        ));

        std::env::set_var("SERVICENOW_INSTANCE_URL", "x.service-now.com");
        std::env::set_var("SERVICENOW_USERNAME", "admin");
        std::env::set_var("SERVICENOW_PASSWORD", "secret");
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.instance_url, "https://x.service-now.com");
        assert_eq!(
            config.auth,
            AuthConfig::Basic {
                username: "admin".to_string(),
                password: "secret".to_string(),
            }
        );
        assert!(!config.debug);

        std::env::set_var("SERVICENOW_AUTH_TYPE", "api_key");
        std::env::set_var("SERVICENOW_API_KEY", "k");
        std::env::set_var("SERVICENOW_DEBUG", "true");
        let config = ServerConfig::from_env().unwrap();
        assert!(matches!(config.auth, AuthConfig::ApiKey { ref api_key, .. } if api_key == "k"));
        assert!(config.debug);

        std::env::set_var("SERVICENOW_AUTH_TYPE", "saml");
        assert!(matches!(
            ServerConfig::from_env(),
            Err(ConfigError::UnsupportedAuthType(tag)) if tag == "saml"
        ));

        for name in [
            "SERVICENOW_INSTANCE_URL",
            "SERVICENOW_AUTH_TYPE",
            "SERVICENOW_DEBUG",
            "SERVICENOW_USERNAME",
            "SERVICENOW_PASSWORD",
            "SERVICENOW_API_KEY",
        ] {
            std::env::remove_var(name);
        }
    }
}
