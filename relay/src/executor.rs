//! Actor execution orchestration.
//!
//! Drives one execution request through submit → poll-until-terminal →
//! fetch-results and normalizes every terminal outcome into an
//! [`ExecutionOutcome`]. Instances share nothing but the platform transport,
//! so any number of executions can run concurrently.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use shared_types::{ExecutionOutcome, RunStatus};

use crate::platform::Platform;

pub struct Orchestrator {
    platform: Arc<dyn Platform>,
    max_attempts: u32,
    poll_interval: Duration,
}

impl Orchestrator {
    pub fn new(platform: Arc<dyn Platform>, max_attempts: u32, poll_interval: Duration) -> Self {
        Self {
            platform,
            max_attempts,
            poll_interval,
        }
    }

    /// Submit the input and drive the run to a terminal outcome. Every call
    /// starts a fresh run; there is no dedup of in-flight executions.
    pub async fn execute(&self, actor_id: &str, input: &Value) -> ExecutionOutcome {
        let handle = match self.platform.submit_run(actor_id, input).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(actor_id, error = %e, "run submission rejected");
                return ExecutionOutcome {
                    id: String::new(),
                    status: RunStatus::SubmitError,
                    data: None,
                    error_message: Some(format!("Failed to execute actor: {e}")),
                };
            }
        };
        let job_id = handle.job_id;
        tracing::info!(actor_id, job_id = %job_id, "run submitted");

        let mut status = RunStatus::Running;
        let mut dataset_id: Option<String> = None;
        let mut error_message: Option<String> = None;
        let mut attempts = 0;
        while status == RunStatus::Running && attempts < self.max_attempts {
            attempts += 1;
            // The delay precedes every check: a run cannot be terminal faster
            // than one interval after submission.
            tokio::time::sleep(self.poll_interval).await;

            let snapshot = match self.platform.get_run(&job_id).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    // Fail-soft: one bad poll keeps the last observed status;
                    // repeated failures exhaust the budget and time out.
                    tracing::warn!(
                        job_id = %job_id,
                        attempt = attempts,
                        error = %e,
                        "status check failed; keeping last observed status"
                    );
                    continue;
                }
            };
            status = snapshot.status;
            dataset_id = snapshot.dataset_id;
            error_message = snapshot.error_message;
            tracing::debug!(
                job_id = %job_id,
                attempt = attempts,
                status = status.as_str(),
                "run status observed"
            );
        }

        match status {
            RunStatus::Succeeded => {
                let data = match dataset_id {
                    Some(id) => self.fetch_results(&id).await,
                    None => None,
                };
                ExecutionOutcome {
                    id: job_id,
                    status,
                    data,
                    error_message: None,
                }
            }
            RunStatus::Failed | RunStatus::Aborted | RunStatus::TimedOut => {
                let message = error_message
                    .unwrap_or_else(|| format!("Actor run {}", status.as_str().to_lowercase()));
                ExecutionOutcome {
                    id: job_id,
                    status,
                    data: None,
                    error_message: Some(message),
                }
            }
            // Budget exhausted while the run was still going.
            _ => {
                tracing::warn!(job_id = %job_id, attempts, "poll budget exhausted");
                ExecutionOutcome {
                    id: job_id,
                    status: RunStatus::Timeout,
                    data: None,
                    error_message: Some("execution timed out locally".to_string()),
                }
            }
        }
    }

    /// A successful computation with unretrievable output is still a success;
    /// fetch failures are logged and absorbed.
    async fn fetch_results(&self, dataset_id: &str) -> Option<Vec<Value>> {
        match self.platform.list_dataset_items(dataset_id).await {
            Ok(items) => {
                tracing::debug!(dataset_id, count = items.len(), "dataset items retrieved");
                Some(items)
            }
            Err(e) => {
                tracing::warn!(
                    dataset_id,
                    error = %e,
                    "dataset fetch failed after successful run"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::platform::{
        ActorListQuery, ActorPage, ActorRecord, JobHandle, PlatformError, RunSnapshot, UserInfo,
    };

    use super::*;

    fn running() -> RunSnapshot {
        RunSnapshot {
            status: RunStatus::Running,
            dataset_id: None,
            error_message: None,
        }
    }

    fn succeeded(dataset_id: Option<&str>) -> RunSnapshot {
        RunSnapshot {
            status: RunStatus::Succeeded,
            dataset_id: dataset_id.map(ToString::to_string),
            error_message: None,
        }
    }

    /// Platform stub driven by a scripted queue of status snapshots. When the
    /// script runs dry the last entry repeats.
    struct ScriptedPlatform {
        submit: Result<String, PlatformError>,
        snapshots: Mutex<VecDeque<Result<RunSnapshot, PlatformError>>>,
        dataset: Result<Vec<serde_json::Value>, PlatformError>,
        status_calls: AtomicUsize,
        dataset_calls: AtomicUsize,
    }

    impl ScriptedPlatform {
        fn new(script: Vec<Result<RunSnapshot, PlatformError>>) -> Self {
            Self {
                submit: Ok("run_1".to_string()),
                snapshots: Mutex::new(script.into()),
                dataset: Ok(Vec::new()),
                status_calls: AtomicUsize::new(0),
                dataset_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Platform for ScriptedPlatform {
        async fn verify_token(&self) -> Result<UserInfo, PlatformError> {
            Ok(UserInfo::default())
        }

        async fn list_actors(&self, _query: ActorListQuery) -> Result<ActorPage, PlatformError> {
            Ok(ActorPage::default())
        }

        async fn get_actor(&self, actor_id: &str) -> Result<ActorRecord, PlatformError> {
            Ok(ActorRecord {
                id: actor_id.to_string(),
                ..ActorRecord::default()
            })
        }

        async fn submit_run(
            &self,
            _actor_id: &str,
            _input: &serde_json::Value,
        ) -> Result<JobHandle, PlatformError> {
            self.submit.clone().map(|job_id| JobHandle { job_id })
        }

        async fn get_run(&self, _job_id: &str) -> Result<RunSnapshot, PlatformError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            let mut snapshots = self.snapshots.lock().unwrap();
            if snapshots.len() > 1 {
                snapshots.pop_front().unwrap()
            } else {
                snapshots
                    .front()
                    .cloned()
                    .unwrap_or_else(|| Ok(running()))
            }
        }

        async fn list_dataset_items(
            &self,
            _dataset_id: &str,
        ) -> Result<Vec<serde_json::Value>, PlatformError> {
            self.dataset_calls.fetch_add(1, Ordering::SeqCst);
            self.dataset.clone()
        }
    }

    fn orchestrator(platform: Arc<ScriptedPlatform>) -> Orchestrator {
        Orchestrator::new(platform, 60, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_success_after_two_running_polls_queries_status_three_times() {
        let platform = Arc::new(ScriptedPlatform {
            dataset: Ok(vec![json!({"n": 1}), json!({"n": 2}), json!({"n": 3})]),
            ..ScriptedPlatform::new(vec![
                Ok(running()),
                Ok(running()),
                Ok(succeeded(Some("ds_1"))),
            ])
        });
        let outcome = orchestrator(Arc::clone(&platform))
            .execute("acme/searcher", &json!({}))
            .await;

        assert_eq!(outcome.status, RunStatus::Succeeded);
        assert_eq!(outcome.data.as_ref().map(Vec::len), Some(3));
        assert!(outcome.error_message.is_none());
        assert_eq!(platform.status_calls.load(Ordering::SeqCst), 3);
        assert_eq!(platform.dataset_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_always_running_exhausts_budget_into_local_timeout() {
        let platform = Arc::new(ScriptedPlatform::new(vec![Ok(running())]));
        let outcome = orchestrator(Arc::clone(&platform))
            .execute("acme/searcher", &json!({}))
            .await;

        assert_eq!(outcome.status, RunStatus::Timeout);
        assert_eq!(
            outcome.error_message.as_deref(),
            Some("execution timed out locally")
        );
        assert_eq!(platform.status_calls.load(Ordering::SeqCst), 60);
    }

    #[tokio::test]
    async fn test_failed_on_first_poll_stops_immediately_with_message() {
        let platform = Arc::new(ScriptedPlatform::new(vec![Ok(RunSnapshot {
            status: RunStatus::Failed,
            dataset_id: None,
            error_message: Some("bad input".to_string()),
        })]));
        let outcome = orchestrator(Arc::clone(&platform))
            .execute("acme/searcher", &json!({}))
            .await;

        assert_eq!(outcome.status, RunStatus::Failed);
        assert_eq!(outcome.error_message.as_deref(), Some("bad input"));
        assert!(outcome.data.is_none());
        assert_eq!(platform.status_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_terminal_failure_without_message_synthesizes_one() {
        let platform = Arc::new(ScriptedPlatform::new(vec![Ok(RunSnapshot {
            status: RunStatus::TimedOut,
            dataset_id: None,
            error_message: None,
        })]));
        let outcome = orchestrator(platform).execute("acme/searcher", &json!({})).await;

        assert_eq!(outcome.status, RunStatus::TimedOut);
        assert_eq!(outcome.error_message.as_deref(), Some("Actor run timed-out"));
    }

    #[tokio::test]
    async fn test_transport_failure_mid_poll_is_absorbed() {
        let platform = Arc::new(ScriptedPlatform::new(vec![
            Ok(running()),
            Err(PlatformError::Request("get_run", "connection reset".to_string())),
            Ok(succeeded(None)),
        ]));
        let outcome = orchestrator(Arc::clone(&platform))
            .execute("acme/searcher", &json!({}))
            .await;

        assert_eq!(outcome.status, RunStatus::Succeeded);
        assert_eq!(platform.status_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_repeated_transport_failures_fall_through_to_timeout() {
        let platform = Arc::new(ScriptedPlatform::new(vec![Err(PlatformError::Request(
            "get_run",
            "connection reset".to_string(),
        ))]));
        let outcome = orchestrator(Arc::clone(&platform))
            .execute("acme/searcher", &json!({}))
            .await;

        assert_eq!(outcome.status, RunStatus::Timeout);
        assert_eq!(platform.status_calls.load(Ordering::SeqCst), 60);
    }

    #[tokio::test]
    async fn test_submission_error_is_terminal_without_polling() {
        let platform = Arc::new(ScriptedPlatform {
            submit: Err(PlatformError::Api(400, "invalid input".to_string())),
            ..ScriptedPlatform::new(vec![])
        });
        let outcome = orchestrator(Arc::clone(&platform))
            .execute("acme/searcher", &json!({}))
            .await;

        assert_eq!(outcome.status, RunStatus::SubmitError);
        assert!(outcome
            .error_message
            .as_deref()
            .unwrap()
            .contains("invalid input"));
        assert_eq!(platform.status_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_without_dataset_id_skips_result_fetch() {
        let platform = Arc::new(ScriptedPlatform::new(vec![Ok(succeeded(None))]));
        let outcome = orchestrator(Arc::clone(&platform))
            .execute("acme/searcher", &json!({}))
            .await;

        assert_eq!(outcome.status, RunStatus::Succeeded);
        assert!(outcome.data.is_none());
        assert_eq!(platform.dataset_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dataset_fetch_failure_keeps_success() {
        let platform = Arc::new(ScriptedPlatform {
            dataset: Err(PlatformError::Request(
                "list_dataset_items",
                "timeout".to_string(),
            )),
            ..ScriptedPlatform::new(vec![Ok(succeeded(Some("ds_1")))])
        });
        let outcome = orchestrator(Arc::clone(&platform))
            .execute("acme/searcher", &json!({}))
            .await;

        assert_eq!(outcome.status, RunStatus::Succeeded);
        assert!(outcome.data.is_none());
        assert!(outcome.error_message.is_none());
    }
}
