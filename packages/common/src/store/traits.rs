use async_trait::async_trait;

use super::error::StoreError;
use crate::problem::{Problem, TestCase};
use crate::submission::{NewSubmission, Submission, SubmissionOutcome};

/// Read access to problems.
#[async_trait]
pub trait ProblemSource: Send + Sync {
    /// All problems in ascending id order.
    async fn list(&self) -> Result<Vec<Problem>, StoreError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Problem>, StoreError>;
}

/// Read access to the test cases of a problem.
#[async_trait]
pub trait TestCaseSource: Send + Sync {
    /// Every test case of the problem, hidden ones included, ordered by ascending id.
    async fn list_all(&self, problem_id: i32) -> Result<Vec<TestCase>, StoreError>;

    /// Only the test cases clients may see, ordered by ascending id.
    async fn list_visible(&self, problem_id: i32) -> Result<Vec<TestCase>, StoreError>;
}

/// Persistence for submission records.
///
/// The evaluator writes only through [`set_token`](Self::set_token) and
/// [`set_outcome`](Self::set_outcome); each evaluation run touches a single
/// submission id.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Create a `Pending` submission and return its id.
    async fn create(&self, submission: NewSubmission) -> Result<i32, StoreError>;

    async fn find(&self, id: i32) -> Result<Option<Submission>, StoreError>;

    /// Newest first, at most `limit` entries.
    async fn list_by_user(&self, user_id: i32, limit: u64) -> Result<Vec<Submission>, StoreError>;

    /// Newest first, at most `limit` entries.
    async fn list_by_user_and_problem(
        &self,
        user_id: i32,
        problem_id: i32,
        limit: u64,
    ) -> Result<Vec<Submission>, StoreError>;

    /// Record the backend correlation token.
    async fn set_token(&self, id: i32, token: &str) -> Result<(), StoreError>;

    /// Terminal write: verdict, averaged metrics and diagnostic message.
    async fn set_outcome(&self, id: i32, outcome: &SubmissionOutcome) -> Result<(), StoreError>;
}
