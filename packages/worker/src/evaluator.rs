//! Evaluation of one submission against its problem's test cases.
//!
//! A run dispatches the test cases one at a time in ascending id order,
//! polls each to a final result and stops at the first failure. Whatever
//! happens, the run ends with exactly one terminal write to the submission
//! store; nothing is reported back to the caller that started it.

use std::sync::Arc;

use common::problem::TestCase;
use common::store::{StoreError, SubmissionStore, TestCaseSource};
use common::submission::SubmissionOutcome;
use common::{Language, Verdict};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::error::ExecutionError;
use crate::execution::{ExecutionClient, ExecutionResult, ExecutionUnit};
use crate::verdict::map_verdict;

/// Work item for one evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluationJob {
    /// Identifies this run in logs.
    pub run_id: Uuid,
    pub submission_id: i32,
    pub problem_id: i32,
    pub language: Language,
    pub code: String,
}

impl EvaluationJob {
    pub fn new(submission_id: i32, problem_id: i32, language: Language, code: String) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            submission_id,
            problem_id,
            language,
            code,
        }
    }
}

/// Failure while running a single test case.
#[derive(Debug, Error)]
enum TestCaseError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Running totals for one evaluation run.
#[derive(Debug)]
struct RunTally {
    /// Test cases that produced a final result.
    evaluated: u32,
    total_runtime_ms: f64,
    total_memory_kb: u64,
    verdict: Verdict,
    message: Option<String>,
}

impl Default for RunTally {
    fn default() -> Self {
        Self {
            evaluated: 0,
            total_runtime_ms: 0.0,
            total_memory_kb: 0,
            verdict: Verdict::Accepted,
            message: None,
        }
    }
}

impl RunTally {
    /// Count a final result, passing or not.
    fn record(&mut self, result: &ExecutionResult) {
        self.evaluated += 1;
        if let Some(ms) = result.elapsed_ms() {
            self.total_runtime_ms += ms;
        }
        if let Some(kb) = result.memory {
            self.total_memory_kb += kb;
        }
    }

    fn fail(&mut self, verdict: Verdict, message: Option<String>) {
        self.verdict = verdict;
        self.message = message;
    }

    /// Averages are taken over the evaluated test cases only.
    fn finish(self) -> SubmissionOutcome {
        let average = |total: f64| {
            (self.evaluated > 0).then(|| (total / f64::from(self.evaluated)).round() as i32)
        };

        SubmissionOutcome {
            runtime_ms: average(self.total_runtime_ms),
            memory_kb: average(self.total_memory_kb as f64),
            verdict: self.verdict,
            error_message: self.message,
        }
    }
}

/// Drives evaluation runs against the execution backend.
pub struct Evaluator {
    client: ExecutionClient,
    test_cases: Arc<dyn TestCaseSource>,
    submissions: Arc<dyn SubmissionStore>,
}

impl Evaluator {
    pub fn new(
        client: ExecutionClient,
        test_cases: Arc<dyn TestCaseSource>,
        submissions: Arc<dyn SubmissionStore>,
    ) -> Self {
        Self {
            client,
            test_cases,
            submissions,
        }
    }

    /// Evaluate a submission and persist its outcome.
    ///
    /// Never fails: faults outside test case execution become a
    /// `System Error` verdict.
    #[instrument(skip(self, job), fields(submission_id = job.submission_id, run_id = %job.run_id))]
    pub async fn run(&self, job: &EvaluationJob) -> SubmissionOutcome {
        info!(problem_id = job.problem_id, language = %job.language, "Evaluation started");

        let outcome = match self.evaluate(job).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Evaluation failed outside test case execution");
                SubmissionOutcome::system_error(e.to_string())
            }
        };

        self.finalize(job.submission_id, outcome).await
    }

    async fn evaluate(&self, job: &EvaluationJob) -> Result<SubmissionOutcome, StoreError> {
        let test_cases = self.test_cases.list_all(job.problem_id).await?;
        if test_cases.is_empty() {
            info!("Problem has no test cases");
            return Ok(SubmissionOutcome::bare(Verdict::NoTestCases, None));
        }

        let mut tally = RunTally::default();

        for (index, test_case) in test_cases.iter().enumerate() {
            match self.run_test_case(job, test_case, index == 0).await {
                Ok(result) => {
                    tally.record(&result);

                    if !result.status.is_accepted() {
                        let verdict = map_verdict(&result.status);
                        info!(
                            test_case_id = test_case.id,
                            verdict = %verdict,
                            "Test case failed, skipping remaining test cases"
                        );
                        tally.fail(verdict, result.diagnostic());
                        break;
                    }

                    debug!(test_case_id = test_case.id, "Test case passed");
                }
                Err(e) => {
                    warn!(test_case_id = test_case.id, error = %e, "Test case execution error");
                    tally.fail(Verdict::RuntimeError(None), Some(e.to_string()));
                    break;
                }
            }
        }

        debug!(
            evaluated = tally.evaluated,
            total = test_cases.len(),
            "Aggregating results"
        );
        Ok(tally.finish())
    }

    /// Dispatch and poll one test case.
    ///
    /// Only the first test case's token is stored on the submission; later
    /// tokens are needed just until their unit is polled to completion.
    async fn run_test_case(
        &self,
        job: &EvaluationJob,
        test_case: &TestCase,
        is_first: bool,
    ) -> Result<ExecutionResult, TestCaseError> {
        let unit = ExecutionUnit {
            source_code: &job.code,
            language_id: job.language.judge0_id(),
            stdin: &test_case.input,
            expected_output: &test_case.expected_output,
        };

        let token = self.client.dispatch(&unit).await?;
        if is_first {
            self.submissions
                .set_token(job.submission_id, &token)
                .await?;
        }
        debug!(test_case_id = test_case.id, token = %token, "Dispatched, polling");

        Ok(self.client.poll(&token).await?)
    }

    /// Terminal write. If it fails, a `System Error` write is attempted
    /// instead so the submission does not stay pending.
    pub async fn finalize(&self, submission_id: i32, outcome: SubmissionOutcome) -> SubmissionOutcome {
        match self.submissions.set_outcome(submission_id, &outcome).await {
            Ok(()) => {
                info!(
                    submission_id,
                    verdict = %outcome.verdict,
                    runtime_ms = ?outcome.runtime_ms,
                    memory_kb = ?outcome.memory_kb,
                    "Evaluation finalized"
                );
                outcome
            }
            Err(e) => {
                error!(submission_id, error = %e, "Failed to store outcome");
                let fallback = SubmissionOutcome::system_error(e.to_string());
                if let Err(e) = self.submissions.set_outcome(submission_id, &fallback).await {
                    error!(submission_id, error = %e, "Failed to store system error outcome");
                }
                fallback
            }
        }
    }
}
