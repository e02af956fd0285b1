use std::sync::Arc;

use common::Language;
use common::store::{ProblemSource, SubmissionStore};
use common::submission::NewSubmission;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::error::IntakeError;
use crate::evaluator::EvaluationJob;
use crate::pool::{EvaluationPool, PoolError};

/// A submission as received from a client.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    pub user_id: i32,
    #[serde(default)]
    pub problem_slug: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub language: String,
}

impl SubmitRequest {
    fn validate(&self) -> Result<Language, IntakeError> {
        let missing = [&self.problem_slug, &self.code, &self.language]
            .iter()
            .any(|field| field.trim().is_empty());
        if missing {
            return Err(IntakeError::Validation(
                "Problem, code, and language are required".into(),
            ));
        }

        self.language
            .parse()
            .map_err(|_| IntakeError::Validation("Unsupported language".into()))
    }
}

/// Accepts submissions and hands them to the evaluation pool.
pub struct SubmissionService {
    problems: Arc<dyn ProblemSource>,
    submissions: Arc<dyn SubmissionStore>,
    pool: Arc<EvaluationPool>,
}

impl SubmissionService {
    pub fn new(
        problems: Arc<dyn ProblemSource>,
        submissions: Arc<dyn SubmissionStore>,
        pool: Arc<EvaluationPool>,
    ) -> Self {
        Self {
            problems,
            submissions,
            pool,
        }
    }

    /// Create a pending submission and queue its evaluation.
    ///
    /// Returns as soon as the job is queued. Queue space is reserved before
    /// the record is written, so a refused submission leaves nothing behind.
    #[instrument(skip(self, request), fields(user_id = request.user_id, problem = %request.problem_slug))]
    pub async fn submit(&self, request: SubmitRequest) -> Result<i32, IntakeError> {
        let language = request.validate()?;

        let problem = self
            .problems
            .find_by_slug(request.problem_slug.trim())
            .await?
            .ok_or_else(|| IntakeError::NotFound("Problem not found".into()))?;

        let slot = self.pool.try_reserve().map_err(|e| match e {
            PoolError::Saturated => IntakeError::Saturated,
            PoolError::Closed => IntakeError::ShuttingDown,
        })?;

        let submission_id = self
            .submissions
            .create(NewSubmission {
                user_id: request.user_id,
                problem_id: problem.id,
                language,
                code: request.code.clone(),
            })
            .await?;

        slot.submit(EvaluationJob::new(
            submission_id,
            problem.id,
            language,
            request.code,
        ));

        info!(submission_id, language = %language, "Submission accepted");
        Ok(submission_id)
    }
}
