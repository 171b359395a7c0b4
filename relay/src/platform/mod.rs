//! Remote actor platform adapter.
//!
//! Narrow call-through interface to the external job system: verify the
//! caller's key, list actors, submit a run, snapshot its status, fetch
//! dataset items. Everything above this module depends on the [`Platform`]
//! trait only; `http.rs` is the reqwest-backed implementation.

mod http;

pub use http::{HttpPlatform, HttpPlatformFactory};

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use shared_types::RunStatus;

#[derive(Debug, thiserror::Error, Clone)]
pub enum PlatformError {
    #[error("authentication rejected: {0}")]
    Auth(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("platform request failed ({0}): {1}")]
    Request(&'static str, String),
    #[error("platform response parse failed ({0}): {1}")]
    Parse(&'static str, String),
    #[error("platform returned status {0}: {1}")]
    Api(u16, String),
}

/// Account behind the caller's API key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
}

/// Full actor record as stored by the platform. Only the fields the relay
/// reads are modeled; unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActorRecord {
    pub id: String,
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_public: bool,
    pub username: Option<String>,
    pub stats: Option<Value>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    /// Some actors carry their input schema directly on the record.
    pub input_schema: Option<Value>,
    /// Versions carry packaged source files; the schema may be embedded there.
    pub versions: Vec<ActorVersion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActorVersion {
    pub version_number: Option<String>,
    pub source_files: Vec<SourceFile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceFile {
    pub name: String,
    pub content: Option<String>,
}

/// Handle to a freshly submitted run. Owned by the orchestrator that created
/// it for the duration of its poll loop; never persisted.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub job_id: String,
}

/// One status observation. Every poll is a fresh snapshot of remote state,
/// never merged with prior snapshots.
#[derive(Debug, Clone)]
pub struct RunSnapshot {
    pub status: RunStatus,
    pub dataset_id: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ActorListQuery {
    pub only_mine: bool,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ActorPage {
    pub total: u64,
    pub items: Vec<ActorRecord>,
}

#[async_trait]
pub trait Platform: Send + Sync {
    /// Validate the caller's API key by fetching the account behind it.
    async fn verify_token(&self) -> Result<UserInfo, PlatformError>;

    async fn list_actors(&self, query: ActorListQuery) -> Result<ActorPage, PlatformError>;

    async fn get_actor(&self, actor_id: &str) -> Result<ActorRecord, PlatformError>;

    /// Start a run. Submission failures are terminal; the orchestrator never
    /// retries them.
    async fn submit_run(&self, actor_id: &str, input: &Value) -> Result<JobHandle, PlatformError>;

    async fn get_run(&self, job_id: &str) -> Result<RunSnapshot, PlatformError>;

    async fn list_dataset_items(&self, dataset_id: &str) -> Result<Vec<Value>, PlatformError>;
}

/// Builds a per-request [`Platform`] bound to the caller's bearer token.
/// The HTTP implementation shares one connection pool across all tokens.
pub trait PlatformFactory: Send + Sync {
    fn for_token(&self, token: &str) -> Arc<dyn Platform>;
}
