//! Upstream authentication settings.

use super::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Header used for API-key authentication when none is configured.
pub const DEFAULT_API_KEY_HEADER: &str = "X-ServiceNow-API-Key";

/// Authentication mode used against the ServiceNow instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthKind {
    Basic,
    OAuth,
    ApiKey,
}

impl AuthKind {
    /// The tag as it appears in `SERVICENOW_AUTH_TYPE`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::OAuth => "oauth",
            Self::ApiKey => "api_key",
        }
    }
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "oauth" => Ok(Self::OAuth),
            "api_key" => Ok(Self::ApiKey),
            other => Err(ConfigError::UnsupportedAuthType(other.to_string())),
        }
    }
}

/// Loose bag of credential parameters, before they are checked against an
/// [`AuthKind`].
///
/// Reads from environment variables:
///
/// | Variable | Used by |
/// |----------|---------|
/// | `SERVICENOW_USERNAME` | basic, oauth |
/// | `SERVICENOW_PASSWORD` | basic, oauth |
/// | `SERVICENOW_CLIENT_ID` | oauth |
/// | `SERVICENOW_CLIENT_SECRET` | oauth |
/// | `SERVICENOW_TOKEN_URL` | oauth (optional) |
/// | `SERVICENOW_API_KEY` | api_key |
/// | `SERVICENOW_API_KEY_HEADER` | api_key (optional) |
#[derive(Clone, Default)]
pub struct AuthParams {
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_url: Option<String>,
    pub api_key: Option<String>,
    pub header_name: Option<String>,
}

impl AuthParams {
    /// Collect parameters from the process environment.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            username: var("SERVICENOW_USERNAME"),
            password: var("SERVICENOW_PASSWORD"),
            client_id: var("SERVICENOW_CLIENT_ID"),
            client_secret: var("SERVICENOW_CLIENT_SECRET"),
            token_url: var("SERVICENOW_TOKEN_URL"),
            api_key: var("SERVICENOW_API_KEY"),
            header_name: var("SERVICENOW_API_KEY_HEADER"),
        }
    }
}

/// Credentials for exactly one authentication mode.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthConfig {
    Basic {
        username: String,
        password: String,
    },
    OAuth {
        client_id: String,
        client_secret: String,
        username: String,
        password: String,
        /// Token endpoint; `<instance>/oauth_token.do` when unset.
        token_url: Option<String>,
    },
    ApiKey {
        api_key: String,
        header_name: String,
    },
}

impl AuthConfig {
    /// Build the credentials for the auth type named by `kind`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use servicenow_mcp::config::{AuthConfig, AuthKind, AuthParams};
    ///
    /// let params = AuthParams {
    ///     username: Some("admin".into()),
    ///     password: Some("secret".into()),
    ///     ..Default::default()
    /// };
    /// let auth = AuthConfig::resolve("basic", params).unwrap();
    /// assert_eq!(auth.kind(), AuthKind::Basic);
    /// ```
    pub fn resolve(kind: &str, params: AuthParams) -> Result<Self, ConfigError> {
        Self::from_kind(kind.parse()?, params)
    }

    /// Same as [`resolve`](Self::resolve) with an already parsed kind.
    pub fn from_kind(kind: AuthKind, params: AuthParams) -> Result<Self, ConfigError> {
        let tag = kind.as_str();
        let require = |value: Option<String>, name: &'static str| {
            value.ok_or(ConfigError::MissingParameter {
                auth_type: tag,
                name,
            })
        };

        Ok(match kind {
            AuthKind::Basic => Self::Basic {
                username: require(params.username, "username")?,
                password: require(params.password, "password")?,
            },
            AuthKind::OAuth => Self::OAuth {
                client_id: require(params.client_id, "client_id")?,
                client_secret: require(params.client_secret, "client_secret")?,
                username: require(params.username, "username")?,
                password: require(params.password, "password")?,
                token_url: params.token_url,
            },
            AuthKind::ApiKey => Self::ApiKey {
                api_key: require(params.api_key, "api_key")?,
                header_name: params
                    .header_name
                    .unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string()),
            },
        })
    }

    /// The kind of the active variant.
    pub fn kind(&self) -> AuthKind {
        match self {
            Self::Basic { .. } => AuthKind::Basic,
            Self::OAuth { .. } => AuthKind::OAuth,
            Self::ApiKey { .. } => AuthKind::ApiKey,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::OAuth {
                client_id,
                username,
                token_url,
                ..
            } => f
                .debug_struct("OAuth")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .field("username", username)
                .field("password", &"<redacted>")
                .field("token_url", token_url)
                .finish(),
            Self::ApiKey { header_name, .. } => f
                .debug_struct("ApiKey")
                .field("api_key", &"<redacted>")
                .field("header_name", header_name)
                .finish(),
        }
    }
}
