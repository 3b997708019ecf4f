//! Table API query parameters.
//!
//! ServiceNow filters are encoded queries: `field=value` terms joined by `^`
//! (logical AND), e.g. `priority=P01^opened_at>=2024-01-01`.

use chrono::{Duration, NaiveDate, Utc};

use super::error::ServiceNowError;

/// Default `sysparm_limit` when none is given.
pub const DEFAULT_LIMIT: u32 = 10;

/// Parameters for one `GET /api/now/table/<table>` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableQuery {
    /// Encoded query (`sysparm_query`)
    pub query: Option<String>,
    /// Maximum number of records (`sysparm_limit`)
    pub limit: u32,
    /// Fields to return (`sysparm_fields`); all fields when empty
    pub fields: Vec<String>,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            query: None,
            limit: DEFAULT_LIMIT,
            fields: Vec::new(),
        }
    }
}

impl TableQuery {
    /// Query string pairs in the order ServiceNow documents them.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(3);
        if let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) {
            params.push(("sysparm_query", query.to_string()));
        }
        params.push(("sysparm_limit", self.limit.to_string()));
        if !self.fields.is_empty() {
            params.push(("sysparm_fields", self.fields.join(",")));
        }
        params
    }
}

/// Filter over the `incident` table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IncidentFilter {
    /// Exact priority, e.g. `P01` or `1`
    pub priority: Option<String>,
    /// Exact state value
    pub state: Option<String>,
    /// Only incidents opened on or after this date
    pub opened_since: Option<NaiveDate>,
    /// `sysparm_limit`; [`DEFAULT_LIMIT`] when unset
    pub limit: Option<u32>,
}

impl IncidentFilter {
    /// Restrict to incidents opened within the last `days` days (UTC).
    pub fn opened_within_days(mut self, days: u32) -> Self {
        let today = Utc::now().date_naive();
        self.opened_since = Some(today - Duration::days(i64::from(days)));
        self
    }

    /// The filter as an encoded query, `None` when no term is set.
    ///
    /// Fails when a value would add terms of its own.
    pub fn encoded_query(&self) -> Result<Option<String>, ServiceNowError> {
        let mut terms = Vec::new();
        if let Some(priority) = &self.priority {
            terms.push(format!("priority={}", term_value("priority", priority)?));
        }
        if let Some(state) = &self.state {
            terms.push(format!("state={}", term_value("state", state)?));
        }
        if let Some(since) = self.opened_since {
            terms.push(format!("opened_at>={}", since.format("%Y-%m-%d")));
        }
        Ok((!terms.is_empty()).then(|| terms.join("^")))
    }

    pub fn to_table_query(&self) -> Result<TableQuery, ServiceNowError> {
        Ok(TableQuery {
            query: self.encoded_query()?,
            limit: self.limit.unwrap_or(DEFAULT_LIMIT),
            fields: Vec::new(),
        })
    }
}

/// `value` checked for use as the right-hand side of a `field=value` term.
pub fn term_value<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ServiceNowError> {
    if value.contains('^') {
        return Err(ServiceNowError::InvalidQueryValue {
            field,
            value: value.to_string(),
        });
    }
    Ok(value)
}
