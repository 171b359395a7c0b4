//! Wire types shared across the relay service boundary.
//!
//! Everything here crosses the HTTP surface as JSON. Field names follow the
//! remote platform's camelCase convention so payloads round-trip unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Run lifecycle
// ============================================================================

/// Terminal and non-terminal states of one actor run.
///
/// The first five are reported by the platform. `Timeout` is synthesized
/// locally when the poll budget runs out (distinct from the platform's own
/// `TIMED-OUT`), and `SubmitError` when submission itself is rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RunStatus {
    #[serde(rename = "RUNNING")]
    Running,
    #[serde(rename = "SUCCEEDED")]
    Succeeded,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "ABORTED")]
    Aborted,
    #[serde(rename = "TIMED-OUT")]
    TimedOut,
    #[serde(rename = "TIMEOUT")]
    Timeout,
    #[serde(rename = "SUBMIT_ERROR")]
    SubmitError,
}

impl RunStatus {
    /// Parse a platform-reported status string.
    ///
    /// Transitional statuses the relay does not model (`READY`, `ABORTING`,
    /// ...) degrade to `Running` so the poll loop keeps watching them.
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "ABORTED" => Self::Aborted,
            "TIMED-OUT" | "TIMED_OUT" => Self::TimedOut,
            "TIMEOUT" => Self::Timeout,
            "SUBMIT_ERROR" => Self::SubmitError,
            _ => Self::Running,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Aborted => "ABORTED",
            Self::TimedOut => "TIMED-OUT",
            Self::Timeout => "TIMEOUT",
            Self::SubmitError => "SUBMIT_ERROR",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }

    /// Failure-class statuses carry an `errorMessage`, never `data`.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::Failed | Self::Aborted | Self::TimedOut | Self::Timeout | Self::SubmitError
        )
    }
}

/// Terminal result of driving one execution request to completion.
///
/// `data` is only populated on `SUCCEEDED`; `errorMessage` only on
/// failure-class statuses. Both may be absent on a bare success whose
/// dataset was empty or unretrievable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub id: String,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Value>>,
    #[serde(rename = "errorMessage", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Body of `POST /actors/{id}/execute`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

// ============================================================================
// Actor catalog
// ============================================================================

/// One catalog row, as returned by `GET /actors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorSummary {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Value>,
    /// Which catalog strategy produced this row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Full actor record, as returned by `GET /actors/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorDetail {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

// ============================================================================
// Input resolution
// ============================================================================

/// Rendering category of one schema field, a pure function of its name and
/// spec. Exact-name URL matches beat everything; enumerated beats the
/// remaining kind-based classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    Url,
    UrlList,
    Boolean,
    Numeric,
    Enumerated,
    FreeText,
}

/// One renderable form field derived from the input schema (or from the
/// fallback heuristics when no schema exists).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    pub category: FieldCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// Resolver output: a fully populated default input plus the ordered field
/// list, as returned by `GET /actors/{id}/input-template`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputTemplate {
    pub input: serde_json::Map<String, Value>,
    pub fields: Vec<FieldDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_run_status_wire_spelling() {
        assert_eq!(serde_json::to_value(RunStatus::TimedOut).unwrap(), "TIMED-OUT");
        assert_eq!(serde_json::to_value(RunStatus::Timeout).unwrap(), "TIMEOUT");
        assert_eq!(
            serde_json::to_value(RunStatus::SubmitError).unwrap(),
            "SUBMIT_ERROR"
        );
    }

    #[test]
    fn test_run_status_from_wire_degrades_unknown_to_running() {
        assert_eq!(RunStatus::from_wire("READY"), RunStatus::Running);
        assert_eq!(RunStatus::from_wire("ABORTING"), RunStatus::Running);
        assert_eq!(RunStatus::from_wire(""), RunStatus::Running);
        assert_eq!(RunStatus::from_wire("TIMED-OUT"), RunStatus::TimedOut);
        assert_eq!(RunStatus::from_wire("TIMED_OUT"), RunStatus::TimedOut);
    }

    #[test]
    fn test_run_status_round_trip() {
        for status in [
            RunStatus::Running,
            RunStatus::Succeeded,
            RunStatus::Failed,
            RunStatus::Aborted,
            RunStatus::TimedOut,
            RunStatus::Timeout,
            RunStatus::SubmitError,
        ] {
            assert_eq!(RunStatus::from_wire(status.as_str()), status);
            let encoded = serde_json::to_value(status).unwrap();
            assert_eq!(encoded, status.as_str());
        }
    }

    #[test]
    fn test_outcome_omits_absent_fields() {
        let outcome = ExecutionOutcome {
            id: "run_1".to_string(),
            status: RunStatus::Succeeded,
            data: None,
            error_message: None,
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value, json!({"id": "run_1", "status": "SUCCEEDED"}));
    }

    #[test]
    fn test_outcome_error_message_uses_camel_case() {
        let outcome = ExecutionOutcome {
            id: "run_2".to_string(),
            status: RunStatus::Failed,
            data: None,
            error_message: Some("bad input".to_string()),
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["errorMessage"], "bad input");
        assert!(value.get("error_message").is_none());
    }

    #[test]
    fn test_actor_summary_is_camel_case() {
        let summary = ActorSummary {
            id: "abc".to_string(),
            name: "web-scraper".to_string(),
            title: "Web Scraper".to_string(),
            description: "No description available".to_string(),
            is_public: true,
            username: None,
            stats: None,
            source: Some("my-actors".to_string()),
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["isPublic"], true);
        assert!(value.get("username").is_none());
        assert_eq!(value["source"], "my-actors");
    }

    #[test]
    fn test_execute_request_input_is_optional() {
        let missing: ExecuteRequest = serde_json::from_value(json!({})).unwrap();
        assert!(missing.input.is_none());
        let present: ExecuteRequest =
            serde_json::from_value(json!({"input": {"inputurl": ""}})).unwrap();
        assert_eq!(present.input, Some(json!({"inputurl": ""})));
    }

    #[test]
    fn test_field_descriptor_enum_values_key() {
        let descriptor = FieldDescriptor {
            name: "mode".to_string(),
            category: FieldCategory::Enumerated,
            title: None,
            description: None,
            enum_values: Some(vec!["fast".to_string(), "deep".to_string()]),
            example: None,
        };
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["category"], "enumerated");
        assert_eq!(value["enumValues"], json!(["fast", "deep"]));
    }
}
