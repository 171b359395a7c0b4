//! Reqwest-backed implementation of the [`Platform`] trait.
//!
//! The platform exposes a JSON REST API; most responses wrap their payload
//! in a `data` envelope. The caller's bearer token authenticates every call.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use shared_types::RunStatus;

use super::{
    ActorListQuery, ActorPage, ActorRecord, JobHandle, Platform, PlatformError, PlatformFactory,
    RunSnapshot, UserInfo,
};

pub struct HttpPlatformFactory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPlatformFactory {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

impl PlatformFactory for HttpPlatformFactory {
    fn for_token(&self, token: &str) -> Arc<dyn Platform> {
        Arc::new(HttpPlatform {
            client: self.client.clone(),
            base_url: self.base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }
}

pub struct HttpPlatform {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

/// Actor ids may be `username/name` pairs; the REST API expects the slash
/// replaced with a tilde in path segments.
fn actor_path_segment(actor_id: &str) -> String {
    actor_id.replace('/', "~")
}

/// Pull a human-readable message out of a platform error body, falling back
/// to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

impl HttpPlatform {
    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, PlatformError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);
        match status.as_u16() {
            401 | 403 => Err(PlatformError::Auth(message)),
            404 => Err(PlatformError::NotFound(message)),
            code => Err(PlatformError::Api(code, message)),
        }
    }

    async fn get_json(&self, op: &'static str, url: String) -> Result<Value, PlatformError> {
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| PlatformError::Request(op, e.to_string()))?;
        let response = self.check(response).await?;
        response
            .json()
            .await
            .map_err(|e| PlatformError::Parse(op, e.to_string()))
    }

    /// Most endpoints wrap their payload in a `data` envelope.
    fn unwrap_data(op: &'static str, payload: Value) -> Result<Value, PlatformError> {
        payload
            .get("data")
            .cloned()
            .ok_or_else(|| PlatformError::Parse(op, "missing data envelope".to_string()))
    }
}

#[async_trait]
impl Platform for HttpPlatform {
    async fn verify_token(&self) -> Result<UserInfo, PlatformError> {
        let op = "verify_token";
        let payload = self.get_json(op, format!("{}/users/me", self.base_url)).await?;
        let data = Self::unwrap_data(op, payload)?;
        serde_json::from_value(data).map_err(|e| PlatformError::Parse(op, e.to_string()))
    }

    async fn list_actors(&self, query: ActorListQuery) -> Result<ActorPage, PlatformError> {
        let op = "list_actors";
        let url = format!(
            "{}/acts?my={}&limit={}&offset={}",
            self.base_url, query.only_mine, query.limit, query.offset
        );
        let payload = self.get_json(op, url).await?;
        let data = Self::unwrap_data(op, payload)?;
        let total = data.get("total").and_then(|v| v.as_u64()).unwrap_or(0);
        let items = data
            .get("items")
            .and_then(|v| v.as_array())
            .ok_or_else(|| PlatformError::Parse(op, "missing items array".to_string()))?
            .iter()
            .map(|item| {
                serde_json::from_value(item.clone())
                    .map_err(|e| PlatformError::Parse(op, e.to_string()))
            })
            .collect::<Result<Vec<ActorRecord>, _>>()?;
        Ok(ActorPage { total, items })
    }

    async fn get_actor(&self, actor_id: &str) -> Result<ActorRecord, PlatformError> {
        let op = "get_actor";
        let url = format!("{}/acts/{}", self.base_url, actor_path_segment(actor_id));
        let payload = self.get_json(op, url).await?;
        let data = Self::unwrap_data(op, payload)?;
        serde_json::from_value(data).map_err(|e| PlatformError::Parse(op, e.to_string()))
    }

    async fn submit_run(&self, actor_id: &str, input: &Value) -> Result<JobHandle, PlatformError> {
        let op = "submit_run";
        let url = format!(
            "{}/acts/{}/runs",
            self.base_url,
            actor_path_segment(actor_id)
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await
            .map_err(|e| PlatformError::Request(op, e.to_string()))?;
        let response = self.check(response).await?;
        let payload: Value = response
            .json()
            .await
            .map_err(|e| PlatformError::Parse(op, e.to_string()))?;
        let data = Self::unwrap_data(op, payload)?;
        let job_id = data
            .get("id")
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| PlatformError::Parse(op, "run response has no id".to_string()))?;
        Ok(JobHandle {
            job_id: job_id.to_string(),
        })
    }

    async fn get_run(&self, job_id: &str) -> Result<RunSnapshot, PlatformError> {
        let op = "get_run";
        let payload = self
            .get_json(op, format!("{}/actor-runs/{job_id}", self.base_url))
            .await?;
        let data = Self::unwrap_data(op, payload)?;
        let status = data
            .get("status")
            .and_then(|v| v.as_str())
            .map(RunStatus::from_wire)
            .unwrap_or(RunStatus::Running);
        let dataset_id = data
            .get("defaultDatasetId")
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty())
            .map(ToString::to_string);
        let error_message = data
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
            .or_else(|| data.get("statusMessage").and_then(|m| m.as_str()))
            .map(ToString::to_string);
        Ok(RunSnapshot {
            status,
            dataset_id,
            error_message,
        })
    }

    async fn list_dataset_items(&self, dataset_id: &str) -> Result<Vec<Value>, PlatformError> {
        let op = "list_dataset_items";
        let url = format!("{}/datasets/{dataset_id}/items?format=json", self.base_url);
        let payload = self.get_json(op, url).await?;
        // Dataset items come back as a bare array, not a data envelope.
        payload
            .as_array()
            .cloned()
            .ok_or_else(|| PlatformError::Parse(op, "expected items array".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{actor_path_segment, error_message};

    #[test]
    fn test_actor_path_segment_replaces_slash() {
        assert_eq!(actor_path_segment("apify/web-scraper"), "apify~web-scraper");
        assert_eq!(actor_path_segment("plain-id"), "plain-id");
    }

    #[test]
    fn test_error_message_prefers_platform_envelope() {
        let body = r#"{"error":{"type":"record-not-found","message":"Actor was not found"}}"#;
        assert_eq!(error_message(body), "Actor was not found");
    }

    #[test]
    fn test_error_message_falls_back_to_raw_text() {
        assert_eq!(error_message("upstream exploded"), "upstream exploded");
    }
}
