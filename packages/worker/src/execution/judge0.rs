use std::time::Duration;

use async_trait::async_trait;
use common::config::ExecutionConfig;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{ExecutionBackend, ExecutionResult, ExecutionUnit};
use crate::error::ExecutionError;

const AUTH_HEADER: &str = "X-Auth-Token";

#[derive(Deserialize)]
struct CreatedSubmission {
    token: String,
}

/// [`ExecutionBackend`] speaking the Judge0 HTTP API.
///
/// Submissions are created with `wait=false` and plain-text (non base64)
/// payloads; results are fetched per token.
#[derive(Clone)]
pub struct Judge0Backend {
    http: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl Judge0Backend {
    pub fn new(config: &ExecutionConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.header(AUTH_HEADER, token),
            None => request,
        }
    }
}

/// Connection problems, timeouts, throttling and server errors may clear up
/// on their own; other rejections will not.
fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn is_transient_transport(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_request()
}

/// A dispatch that timed out may already have created a submission on the
/// backend, so only a failed connection is worth sending again.
fn is_transient_dispatch(e: &reqwest::Error) -> bool {
    e.is_connect()
}

#[async_trait]
impl ExecutionBackend for Judge0Backend {
    async fn dispatch(&self, unit: &ExecutionUnit<'_>) -> Result<String, ExecutionError> {
        let url = format!("{}/submissions", self.base_url);

        let response = self
            .authorized(self.http.post(&url))
            .query(&[("base64_encoded", "false"), ("wait", "false")])
            .json(unit)
            .send()
            .await
            .map_err(|e| ExecutionError::Dispatch {
                message: e.to_string(),
                transient: is_transient_dispatch(&e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExecutionError::Dispatch {
                message: format!("backend responded {status}: {body}"),
                transient: is_transient_status(status),
            });
        }

        let created: CreatedSubmission =
            response
                .json()
                .await
                .map_err(|e| ExecutionError::Dispatch {
                    message: format!("unreadable response: {e}"),
                    transient: false,
                })?;

        debug!(token = %created.token, language_id = unit.language_id, "Dispatched execution unit");
        Ok(created.token)
    }

    async fn fetch_status(&self, token: &str) -> Result<ExecutionResult, ExecutionError> {
        let url = format!("{}/submissions/{}", self.base_url, token);

        let response = self
            .authorized(self.http.get(&url))
            .query(&[("base64_encoded", "false")])
            .send()
            .await
            .map_err(|e| ExecutionError::StatusFetch {
                message: e.to_string(),
                transient: is_transient_transport(&e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExecutionError::StatusFetch {
                message: format!("backend responded {status}: {body}"),
                transient: is_transient_status(status),
            });
        }

        response
            .json::<ExecutionResult>()
            .await
            .map_err(|e| ExecutionError::StatusFetch {
                message: format!("unreadable response: {e}"),
                transient: false,
            })
    }
}
