//! Incident records.

use serde::{Deserialize, Serialize};

/// Summary of an `incident` table record.
///
/// Only the fields the tools report are modeled; missing fields deserialize
/// as empty values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub opened_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sys_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_ignores_unknown_fields() {
        let incident: Incident = serde_json::from_value(serde_json::json!({
            "number": "INC001",
            "short_description": "Email down",
            "opened_at": "2024-01-01 10:00:00",
            "priority": "1",
            "caller_id": {"link": "https://x", "value": "abc"}
        }))
        .unwrap();
        assert_eq!(incident.number, "INC001");
        assert_eq!(incident.priority.as_deref(), Some("1"));
        assert!(incident.state.is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let incident: Incident = serde_json::from_str(r#"{"number":"INC002"}"#).unwrap();
        assert_eq!(incident.short_description, "");
        assert_eq!(incident.opened_at, "");
    }
}
