//! Tool catalog and argument handling.

use std::{borrow::Cow, sync::Arc};

use rmcp::model::{ErrorData as McpError, JsonObject, Tool};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::servicenow::{IncidentFilter, ServiceNowClient, ServiceNowError, TableQuery, DEFAULT_LIMIT};

pub const LIST_INCIDENTS: &str = "list_incidents";
pub const GET_INCIDENT: &str = "get_incident";
pub const QUERY_TABLE: &str = "query_table";

/// Tools advertised in `tools/list`.
pub fn catalog() -> Vec<Tool> {
    vec![
        tool(
            LIST_INCIDENTS,
            "List incidents, optionally filtered by priority, state and how recently they were opened.",
            json!({
                "type": "object",
                "properties": {
                    "priority": {
                        "type": "string",
                        "description": "Exact priority value, e.g. \"P01\" or \"1\""
                    },
                    "state": {
                        "type": "string",
                        "description": "Exact state value"
                    },
                    "opened_within_days": {
                        "type": "integer",
                        "minimum": 0,
                        "description": "Only incidents opened in the last N days"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "default": DEFAULT_LIMIT
                    }
                }
            }),
        ),
        tool(
            GET_INCIDENT,
            "Get the full incident record for an incident number.",
            json!({
                "type": "object",
                "properties": {
                    "number": {
                        "type": "string",
                        "description": "Incident number, e.g. \"INC0010001\""
                    }
                },
                "required": ["number"]
            }),
        ),
        tool(
            QUERY_TABLE,
            "Query any ServiceNow table with an encoded query and return the raw records.",
            json!({
                "type": "object",
                "properties": {
                    "table": {
                        "type": "string",
                        "description": "Table name, e.g. \"incident\" or \"sys_user\""
                    },
                    "query": {
                        "type": "string",
                        "description": "Encoded query, e.g. \"active=true^priority=1\""
                    },
                    "fields": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Fields to return; all fields when omitted"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "default": DEFAULT_LIMIT
                    }
                },
                "required": ["table"]
            }),
        ),
    ]
}

fn tool(name: &'static str, description: &'static str, schema: Value) -> Tool {
    let input_schema = match schema {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    };
    Tool {
        name: Cow::Borrowed(name),
        description: Cow::Borrowed(description),
        input_schema: Arc::new(input_schema),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListIncidentsArgs {
    pub priority: Option<String>,
    pub state: Option<String>,
    pub opened_within_days: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct GetIncidentArgs {
    pub number: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryTableArgs {
    pub table: String,
    pub query: Option<String>,
    #[serde(default)]
    pub fields: Vec<String>,
    pub limit: Option<u32>,
}

/// A validated tool invocation.
#[derive(Debug)]
pub enum ToolCall {
    ListIncidents(ListIncidentsArgs),
    GetIncident(GetIncidentArgs),
    QueryTable(QueryTableArgs),
}

impl ToolCall {
    /// Match `name` against the catalog and decode its arguments.
    pub fn parse(name: &str, arguments: Option<JsonObject>) -> Result<Self, McpError> {
        let arguments = Value::Object(arguments.unwrap_or_default());
        let invalid = |e: serde_json::Error| {
            McpError::invalid_params(format!("invalid arguments for '{name}': {e}"), None)
        };

        match name {
            LIST_INCIDENTS => serde_json::from_value(arguments)
                .map(Self::ListIncidents)
                .map_err(invalid),
            GET_INCIDENT => serde_json::from_value(arguments)
                .map(Self::GetIncident)
                .map_err(invalid),
            QUERY_TABLE => serde_json::from_value(arguments)
                .map(Self::QueryTable)
                .map_err(invalid),
            other => Err(McpError::invalid_params(
                format!("unknown tool '{other}'"),
                None,
            )),
        }
    }

    /// Run the call against the instance and return the JSON payload.
    pub async fn execute(self, client: &ServiceNowClient) -> Result<Value, ServiceNowError> {
        match self {
            Self::ListIncidents(args) => {
                let mut filter = IncidentFilter {
                    priority: args.priority,
                    state: args.state,
                    opened_since: None,
                    limit: args.limit,
                };
                if let Some(days) = args.opened_within_days {
                    filter = filter.opened_within_days(days);
                }
                let incidents = client.list_incidents(&filter).await?;
                Ok(json!({ "count": incidents.len(), "incidents": incidents }))
            }
            Self::GetIncident(args) => client
                .get_incident(&args.number)
                .await?
                .ok_or(ServiceNowError::NotFound {
                    table: "incident",
                    number: args.number,
                }),
            Self::QueryTable(args) => {
                let query = TableQuery {
                    query: args.query,
                    limit: args.limit.unwrap_or(DEFAULT_LIMIT),
                    fields: args.fields,
                };
                let records = client.query_table(&args.table, &query).await?;
                Ok(json!({ "count": records.len(), "records": records }))
            }
        }
    }
}
