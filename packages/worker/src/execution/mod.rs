//! Remote execution client.
//!
//! A test case is handed to the backend as an [`ExecutionUnit`], which
//! answers with a token right away. The outcome is then retrieved by polling
//! the token until the backend reports a final status.

mod judge0;

pub use judge0::Judge0Backend;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::config::ExecutionConfig;
use common::retry::{RetryConfig, retry_transient};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::ExecutionError;

/// One program run against one input.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionUnit<'a> {
    pub source_code: &'a str,
    pub language_id: u32,
    pub stdin: &'a str,
    /// Compared against stdout by the backend.
    pub expected_output: &'a str,
}

/// Backend status of an execution unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStatus {
    pub id: u32,
    #[serde(default)]
    pub description: Option<String>,
}

impl ExecutionStatus {
    pub const IN_QUEUE: u32 = 1;
    pub const PROCESSING: u32 = 2;
    pub const ACCEPTED: u32 = 3;
    pub const WRONG_ANSWER: u32 = 4;
    pub const TIME_LIMIT_EXCEEDED: u32 = 5;
    pub const COMPILATION_ERROR: u32 = 6;
    pub const RUNTIME_ERROR_SIGSEGV: u32 = 7;
    pub const RUNTIME_ERROR_SIGXFSZ: u32 = 8;
    pub const RUNTIME_ERROR_SIGFPE: u32 = 9;
    pub const RUNTIME_ERROR_SIGABRT: u32 = 10;
    pub const RUNTIME_ERROR_NZEC: u32 = 11;
    pub const RUNTIME_ERROR_OTHER: u32 = 12;
    pub const INTERNAL_ERROR: u32 = 13;
    pub const EXEC_FORMAT_ERROR: u32 = 14;

    pub fn new(id: u32, description: impl Into<String>) -> Self {
        Self {
            id,
            description: Some(description.into()),
        }
    }

    /// Anything other than queued or processing.
    pub fn is_terminal(&self) -> bool {
        !matches!(self.id, Self::IN_QUEUE | Self::PROCESSING)
    }

    pub fn is_accepted(&self) -> bool {
        self.id == Self::ACCEPTED
    }
}

/// State of an execution unit as reported by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    /// Elapsed time in seconds.
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub time: Option<f64>,
    /// Memory usage in kilobytes.
    #[serde(default)]
    pub memory: Option<u64>,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ExecutionResult {
    /// Result with the given status and nothing else reported.
    pub fn with_status(status: ExecutionStatus) -> Self {
        Self {
            status,
            time: None,
            memory: None,
            stdout: None,
            stderr: None,
            compile_output: None,
            message: None,
        }
    }

    pub fn elapsed_ms(&self) -> Option<f64> {
        self.time.map(|secs| secs * 1000.0)
    }

    /// First non-empty of compiler output, stderr and backend message.
    pub fn diagnostic(&self) -> Option<String> {
        [&self.compile_output, &self.stderr, &self.message]
            .into_iter()
            .flatten()
            .find(|text| !text.is_empty())
            .cloned()
    }
}

/// Accepts `"0.5"`, `0.5` or `null`.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(f64),
        Text(String),
    }

    match Option::<Seconds>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Seconds::Number(n)) => Ok(Some(n)),
        Some(Seconds::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// A service that runs code asynchronously.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Submit a unit for execution without waiting for it to finish.
    async fn dispatch(&self, unit: &ExecutionUnit<'_>) -> Result<String, ExecutionError>;

    /// Current state of a previously dispatched unit.
    async fn fetch_status(&self, token: &str) -> Result<ExecutionResult, ExecutionError>;
}

/// Polling budget for one execution unit.
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl From<&ExecutionConfig> for PollSettings {
    fn from(config: &ExecutionConfig) -> Self {
        Self {
            max_attempts: config.poll_max_attempts,
            interval: Duration::from_millis(config.poll_interval_ms),
        }
    }
}

/// Backend access with bounded retries on transient failures and polling.
#[derive(Clone)]
pub struct ExecutionClient {
    backend: Arc<dyn ExecutionBackend>,
    retry: RetryConfig,
    poll: PollSettings,
}

impl ExecutionClient {
    pub fn new(backend: Arc<dyn ExecutionBackend>, retry: RetryConfig, poll: PollSettings) -> Self {
        Self {
            backend,
            retry,
            poll,
        }
    }

    pub async fn dispatch(&self, unit: &ExecutionUnit<'_>) -> Result<String, ExecutionError> {
        retry_transient(
            &self.retry,
            "dispatch",
            ExecutionError::is_transient,
            move || self.backend.dispatch(unit),
        )
        .await
    }

    pub async fn fetch_status(&self, token: &str) -> Result<ExecutionResult, ExecutionError> {
        retry_transient(
            &self.retry,
            "fetch_status",
            ExecutionError::is_transient,
            move || self.backend.fetch_status(token),
        )
        .await
    }

    /// Poll with the configured budget.
    pub async fn poll(&self, token: &str) -> Result<ExecutionResult, ExecutionError> {
        self.poll_with(token, self.poll.max_attempts, self.poll.interval)
            .await
    }

    /// Query `token` until its status is final, sleeping `interval` between
    /// queries. Fails after `max_attempts` non-final observations.
    pub async fn poll_with(
        &self,
        token: &str,
        max_attempts: u32,
        interval: Duration,
    ) -> Result<ExecutionResult, ExecutionError> {
        for attempt in 1..=max_attempts {
            let result = self.fetch_status(token).await?;
            if result.status.is_terminal() {
                return Ok(result);
            }

            debug!(
                token,
                attempt,
                status_id = result.status.id,
                "Execution not finished yet"
            );

            if attempt < max_attempts {
                tokio::time::sleep(interval).await;
            }
        }

        Err(ExecutionError::PollingTimeout {
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Script, ScriptedBackend, result};

    fn client(backend: Arc<ScriptedBackend>, retry: RetryConfig) -> ExecutionClient {
        ExecutionClient::new(
            backend,
            retry,
            PollSettings {
                max_attempts: 5,
                interval: Duration::from_millis(1),
            },
        )
    }

    fn fast_retry(max_retries: u8) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay_ms: 1,
            max_delay_ms: 2,
        }
    }

    fn unit(stdin: &str) -> ExecutionUnit<'_> {
        ExecutionUnit {
            source_code: "print(input())",
            language_id: 71,
            stdin,
            expected_output: "1",
        }
    }

    #[test]
    fn test_decode_backend_response() {
        let json = r#"{
            "stdout": "1\n",
            "time": "0.012",
            "memory": 3456,
            "stderr": null,
            "token": "d85cd024-1548-4165-96c7-7bc88673f194",
            "compile_output": null,
            "message": null,
            "status": { "id": 3, "description": "Accepted" }
        }"#;
        let r: ExecutionResult = serde_json::from_str(json).unwrap();
        assert!(r.status.is_accepted());
        assert_eq!(r.time, Some(0.012));
        assert_eq!(r.memory, Some(3456));
        assert_eq!(r.elapsed_ms(), Some(12.0));
    }

    #[test]
    fn test_decode_queued_response_without_metrics() {
        let json = r#"{ "status": { "id": 1, "description": "In Queue" }, "time": null }"#;
        let r: ExecutionResult = serde_json::from_str(json).unwrap();
        assert!(!r.status.is_terminal());
        assert_eq!(r.time, None);
        assert_eq!(r.memory, None);
    }

    #[test]
    fn test_decode_numeric_time() {
        let json = r#"{ "status": { "id": 4 }, "time": 0.5 }"#;
        let r: ExecutionResult = serde_json::from_str(json).unwrap();
        assert_eq!(r.elapsed_ms(), Some(500.0));
        assert_eq!(r.status.description, None);
    }

    #[test]
    fn test_diagnostic_priority() {
        let mut r = ExecutionResult::with_status(ExecutionStatus::new(6, "Compilation Error"));
        r.compile_output = Some(String::new());
        r.stderr = Some("segfault".into());
        r.message = Some("Exited with error status 139".into());
        assert_eq!(r.diagnostic().as_deref(), Some("segfault"));

        r.compile_output = Some("main.cpp:1: error".into());
        assert_eq!(r.diagnostic().as_deref(), Some("main.cpp:1: error"));

        let bare = ExecutionResult::with_status(ExecutionStatus::new(4, "Wrong Answer"));
        assert_eq!(bare.diagnostic(), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!ExecutionStatus::new(1, "In Queue").is_terminal());
        assert!(!ExecutionStatus::new(2, "Processing").is_terminal());
        for id in 3..=14 {
            assert!(ExecutionStatus::new(id, "").is_terminal());
        }
    }

    #[tokio::test]
    async fn poll_waits_for_final_status() {
        let backend = Arc::new(ScriptedBackend::new().on_input(
            "1",
            Script::polls(vec![
                Ok(result(ExecutionStatus::IN_QUEUE)),
                Ok(result(ExecutionStatus::PROCESSING)),
                Ok(result(ExecutionStatus::ACCEPTED)),
            ]),
        ));
        let client = client(backend.clone(), RetryConfig::disabled());

        let token = client.dispatch(&unit("1")).await.unwrap();
        let r = client.poll(&token).await.unwrap();

        assert!(r.status.is_accepted());
        assert_eq!(backend.status_queries(), 3);
    }

    #[tokio::test]
    async fn poll_times_out_after_budget() {
        let backend = Arc::new(ScriptedBackend::new().on_input(
            "1",
            Script::polls(vec![Ok(result(ExecutionStatus::PROCESSING))]),
        ));
        let client = client(backend.clone(), RetryConfig::disabled());

        let token = client.dispatch(&unit("1")).await.unwrap();
        let err = client
            .poll_with(&token, 3, Duration::from_millis(1))
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::PollingTimeout { attempts: 3 }));
        assert!(err.to_string().contains("Polling timeout"));
        assert_eq!(backend.status_queries(), 3);
    }

    #[tokio::test]
    async fn transient_status_failure_is_retried() {
        let backend = Arc::new(ScriptedBackend::new().on_input(
            "1",
            Script::polls(vec![
                Err(ExecutionError::StatusFetch {
                    message: "connection reset".into(),
                    transient: true,
                }),
                Ok(result(ExecutionStatus::ACCEPTED)),
            ]),
        ));
        let client = client(backend.clone(), fast_retry(2));

        let token = client.dispatch(&unit("1")).await.unwrap();
        assert!(client.poll(&token).await.unwrap().status.is_accepted());
        assert_eq!(backend.status_queries(), 2);
    }

    #[tokio::test]
    async fn rejected_dispatch_is_not_retried() {
        let backend = Arc::new(ScriptedBackend::new().on_input(
            "1",
            Script::accepted(0.1, 100).fail_dispatch(ExecutionError::Dispatch {
                message: "422 language not supported".into(),
                transient: false,
            }),
        ));
        let client = client(backend.clone(), fast_retry(3));

        let err = client.dispatch(&unit("1")).await.unwrap_err();
        assert!(matches!(err, ExecutionError::Dispatch { .. }));
        assert_eq!(backend.dispatch_attempts(), 1);
    }

    #[tokio::test]
    async fn transient_dispatch_failure_is_retried() {
        let backend = Arc::new(ScriptedBackend::new().on_input(
            "1",
            Script::accepted(0.1, 100).fail_dispatch(ExecutionError::Dispatch {
                message: "connection refused".into(),
                transient: true,
            }),
        ));
        let client = client(backend.clone(), fast_retry(1));

        assert!(client.dispatch(&unit("1")).await.is_ok());
        assert_eq!(backend.dispatch_attempts(), 2);
    }
}
