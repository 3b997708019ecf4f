//! HTTP client for the ServiceNow Table API.

use std::sync::Arc;

use reqwest::{
    header::{HeaderName, HeaderValue, ACCEPT},
    RequestBuilder, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{
    error::ServiceNowError,
    incident::Incident,
    query::{term_value, IncidentFilter, TableQuery},
};
use crate::config::{AuthConfig, ServerConfig};

type Result<T> = std::result::Result<T, ServiceNowError>;

#[derive(Deserialize)]
struct TableResponse<T> {
    #[serde(default = "Vec::new")]
    result: Vec<T>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for one ServiceNow instance.
///
/// Cheap to clone; clones share the HTTP connection pool and the cached
/// OAuth access token.
#[derive(Clone)]
pub struct ServiceNowClient {
    http: reqwest::Client,
    instance_url: Arc<str>,
    auth: Arc<AuthConfig>,
    token_url: Option<Arc<str>>,
    token: Arc<RwLock<Option<String>>>,
}

impl ServiceNowClient {
    /// Create a client for the instance and credentials in `config`.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("servicenow-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            instance_url: Arc::from(config.instance_url.as_str()),
            auth: Arc::new(config.auth.clone()),
            token_url: config.token_url().map(Arc::from),
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// The instance base URL requests are sent to.
    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// Fetch raw records from `table`.
    pub async fn query_table(&self, table: &str, query: &TableQuery) -> Result<Vec<Value>> {
        self.query_records(table, query).await
    }

    /// Fetch incidents matching `filter`.
    pub async fn list_incidents(&self, filter: &IncidentFilter) -> Result<Vec<Incident>> {
        self.query_records("incident", &filter.to_table_query()?)
            .await
    }

    /// Fetch the full incident record with the given number.
    pub async fn get_incident(&self, number: &str) -> Result<Option<Value>> {
        let query = TableQuery {
            query: Some(format!("number={}", term_value("number", number)?)),
            limit: 1,
            fields: Vec::new(),
        };
        let records = self.query_records::<Value>("incident", &query).await?;
        Ok(records.into_iter().next())
    }

    async fn query_records<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &TableQuery,
    ) -> Result<Vec<T>> {
        validate_table(table)?;
        let url = format!("{}/api/now/table/{}", self.instance_url, table);
        tracing::debug!(table, query = ?query.query, limit = query.limit, "querying table");

        let request = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .query(&query.to_params());
        let response = self.authorize(request).await?.send().await?;

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                self.token.write().await.take();
            }
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(table, status = status.as_u16(), "table request failed");
            return Err(ServiceNowError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: TableResponse<T> = response.json().await?;
        tracing::debug!(table, count = body.result.len(), "table query returned");
        Ok(body.result)
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match self.auth.as_ref() {
            AuthConfig::Basic { username, password } => {
                Ok(request.basic_auth(username, Some(password)))
            }
            AuthConfig::OAuth { .. } => {
                let token = self.access_token().await?;
                Ok(request.bearer_auth(token))
            }
            AuthConfig::ApiKey {
                api_key,
                header_name,
            } => {
                let name = HeaderName::from_bytes(header_name.as_bytes())
                    .map_err(|e| ServiceNowError::InvalidHeader(format!("{header_name}: {e}")))?;
                let value = HeaderValue::from_str(api_key)
                    .map_err(|e| ServiceNowError::InvalidHeader(format!("{header_name}: {e}")))?;
                Ok(request.header(name, value))
            }
        }
    }

    /// Cached OAuth access token, fetched with the password grant on first use.
    async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(token.clone());
        }

        let mut cached = self.token.write().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let AuthConfig::OAuth {
            client_id,
            client_secret,
            username,
            password,
            ..
        } = self.auth.as_ref()
        else {
            return Err(ServiceNowError::Token("OAuth is not configured".to_string()));
        };
        let token_url = self
            .token_url
            .as_deref()
            .ok_or_else(|| ServiceNowError::Token("no token URL".to_string()))?;

        tracing::debug!(token_url, "requesting OAuth access token");
        let response = self
            .http
            .post(token_url)
            .header(ACCEPT, "application/json")
            .form(&[
                ("grant_type", "password"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("username", username.as_str()),
                ("password", password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceNowError::Token(format!("{} - {}", status.as_u16(), body)));
        }

        let token: TokenResponse = response.json().await?;
        *cached = Some(token.access_token.clone());
        tracing::info!("obtained OAuth access token");
        Ok(token.access_token)
    }
}

fn validate_table(table: &str) -> Result<()> {
    if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ServiceNowError::InvalidTable(table.to_string()));
    }
    Ok(())
}
