//! Scripted [`ExecutionBackend`] for tests.
//!
//! Behaviour is keyed by the stdin of the dispatched unit, so a test case is
//! scripted by its input. Inputs without a script are accepted on the first
//! status query.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ExecutionError;
use crate::execution::{ExecutionBackend, ExecutionResult, ExecutionStatus, ExecutionUnit};

/// Result carrying only a status id.
pub fn result(status_id: u32) -> ExecutionResult {
    ExecutionResult::with_status(ExecutionStatus {
        id: status_id,
        description: None,
    })
}

/// Accepted result with metrics.
pub fn accepted(time_secs: f64, memory_kb: u64) -> ExecutionResult {
    let mut r = result(ExecutionStatus::ACCEPTED);
    r.status.description = Some("Accepted".into());
    r.time = Some(time_secs);
    r.memory = Some(memory_kb);
    r
}

/// What the backend does for one input.
#[derive(Clone)]
pub struct Script {
    dispatch_errors: VecDeque<ExecutionError>,
    polls: VecDeque<Result<ExecutionResult, ExecutionError>>,
}

impl Script {
    /// Status queries answer these in order; the last one repeats forever.
    pub fn polls(polls: Vec<Result<ExecutionResult, ExecutionError>>) -> Self {
        Self {
            dispatch_errors: VecDeque::new(),
            polls: polls.into(),
        }
    }

    pub fn finished(result: ExecutionResult) -> Self {
        Self::polls(vec![Ok(result)])
    }

    pub fn accepted(time_secs: f64, memory_kb: u64) -> Self {
        Self::finished(accepted(time_secs, memory_kb))
    }

    /// Fail the next dispatch of this input with `error` before succeeding.
    pub fn fail_dispatch(mut self, error: ExecutionError) -> Self {
        self.dispatch_errors.push_back(error);
        self
    }
}

#[derive(Default)]
struct State {
    scripts: HashMap<String, Script>,
    by_token: HashMap<String, VecDeque<Result<ExecutionResult, ExecutionError>>>,
    dispatched: Vec<String>,
    dispatch_attempts: usize,
    status_queries: usize,
}

#[derive(Default)]
pub struct ScriptedBackend {
    state: Mutex<State>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_input(self, input: &str, script: Script) -> Self {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(input.to_string(), script);
        self
    }

    /// Inputs of successfully dispatched units, in dispatch order.
    pub fn dispatched_inputs(&self) -> Vec<String> {
        self.state.lock().unwrap().dispatched.clone()
    }

    /// Dispatch calls, failed ones included.
    pub fn dispatch_attempts(&self) -> usize {
        self.state.lock().unwrap().dispatch_attempts
    }

    pub fn status_queries(&self) -> usize {
        self.state.lock().unwrap().status_queries
    }
}

#[async_trait]
impl ExecutionBackend for ScriptedBackend {
    async fn dispatch(&self, unit: &ExecutionUnit<'_>) -> Result<String, ExecutionError> {
        let mut state = self.state.lock().unwrap();
        state.dispatch_attempts += 1;

        let script = state
            .scripts
            .entry(unit.stdin.to_string())
            .or_insert_with(|| Script::accepted(0.0, 0));
        if let Some(error) = script.dispatch_errors.pop_front() {
            return Err(error);
        }
        let polls = script.polls.clone();

        state.dispatched.push(unit.stdin.to_string());
        let token = format!("tok-{}", state.dispatched.len());
        state.by_token.insert(token.clone(), polls);
        Ok(token)
    }

    async fn fetch_status(&self, token: &str) -> Result<ExecutionResult, ExecutionError> {
        let mut state = self.state.lock().unwrap();
        state.status_queries += 1;

        let polls = state
            .by_token
            .get_mut(token)
            .ok_or_else(|| ExecutionError::StatusFetch {
                message: format!("unknown token {token}"),
                transient: false,
            })?;
        let next = if polls.len() > 1 {
            polls.pop_front()
        } else {
            polls.front().cloned()
        };
        next.unwrap_or_else(|| Ok(result(ExecutionStatus::PROCESSING)))
    }
}
