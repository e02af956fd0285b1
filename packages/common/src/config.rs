use serde::Deserialize;

/// Remote execution backend settings.
#[derive(Debug, Deserialize, Clone)]
pub struct ExecutionConfig {
    /// Base URL of the execution backend. Default: "http://judge0:2358".
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Value for the `X-Auth-Token` header, if the backend requires one.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Timeout for a single HTTP request in seconds. Default: 10.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Status queries per test case before giving up. Default: 30.
    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,
    /// Wait between status queries in milliseconds. Default: 1000.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_base_url() -> String {
    "http://judge0:2358".into()
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_poll_max_attempts() -> u32 {
    30
}
fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            poll_max_attempts: default_poll_max_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Evaluation pool sizing.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct PoolConfig {
    /// Evaluation runs allowed in flight at once. Default: 4.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Accepted submissions waiting for a free slot before new ones are
    /// rejected. Default: 64.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_concurrency() -> usize {
    4
}
fn default_queue_capacity() -> usize {
    64
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            queue_capacity: default_queue_capacity(),
        }
    }
}
