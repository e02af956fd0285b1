use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::error::StoreError;
use super::traits::{ProblemSource, SubmissionStore, TestCaseSource};
use crate::problem::{Problem, TestCase};
use crate::submission::{NewSubmission, Submission, SubmissionOutcome};

#[derive(Default)]
struct Tables {
    problems: BTreeMap<i32, Problem>,
    test_cases: BTreeMap<i32, TestCase>,
    submissions: BTreeMap<i32, Submission>,
    next_problem_id: i32,
    next_test_case_id: i32,
    next_submission_id: i32,
}

/// Process-local store for problems, test cases and submissions.
///
/// Ids are assigned sequentially from 1, so ascending id order is insertion
/// order. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_problem(&self, title: &str, slug: &str, difficulty: &str) -> Problem {
        self.add_described_problem(title, slug, difficulty, "").await
    }

    pub async fn add_described_problem(
        &self,
        title: &str,
        slug: &str,
        difficulty: &str,
        description: &str,
    ) -> Problem {
        let mut tables = self.tables.write().await;
        tables.next_problem_id += 1;
        let problem = Problem {
            id: tables.next_problem_id,
            title: title.to_string(),
            slug: slug.to_string(),
            description: description.to_string(),
            difficulty: difficulty.to_string(),
            created_at: Utc::now(),
        };
        tables.problems.insert(problem.id, problem.clone());
        problem
    }

    pub async fn add_test_case(
        &self,
        problem_id: i32,
        input: &str,
        expected_output: &str,
        is_hidden: bool,
    ) -> TestCase {
        let mut tables = self.tables.write().await;
        tables.next_test_case_id += 1;
        let test_case = TestCase {
            id: tables.next_test_case_id,
            problem_id,
            input: input.to_string(),
            expected_output: expected_output.to_string(),
            is_hidden,
        };
        tables.test_cases.insert(test_case.id, test_case.clone());
        test_case
    }

    async fn test_cases_where(&self, problem_id: i32, include_hidden: bool) -> Vec<TestCase> {
        self.tables
            .read()
            .await
            .test_cases
            .values()
            .filter(|tc| tc.problem_id == problem_id && (include_hidden || !tc.is_hidden))
            .cloned()
            .collect()
    }

    async fn submissions_where(
        &self,
        limit: u64,
        pred: impl Fn(&Submission) -> bool,
    ) -> Vec<Submission> {
        self.tables
            .read()
            .await
            .submissions
            .values()
            .rev()
            .filter(|s| pred(s))
            .take(limit as usize)
            .cloned()
            .collect()
    }

    async fn update_submission(
        &self,
        id: i32,
        f: impl FnOnce(&mut Submission),
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let submission = tables
            .submissions
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("submission {id}")))?;
        f(submission);
        Ok(())
    }
}

#[async_trait]
impl ProblemSource for MemoryStore {
    async fn list(&self) -> Result<Vec<Problem>, StoreError> {
        Ok(self.tables.read().await.problems.values().cloned().collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Problem>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .problems
            .values()
            .find(|p| p.slug == slug)
            .cloned())
    }
}

#[async_trait]
impl TestCaseSource for MemoryStore {
    async fn list_all(&self, problem_id: i32) -> Result<Vec<TestCase>, StoreError> {
        Ok(self.test_cases_where(problem_id, true).await)
    }

    async fn list_visible(&self, problem_id: i32) -> Result<Vec<TestCase>, StoreError> {
        Ok(self.test_cases_where(problem_id, false).await)
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn create(&self, submission: NewSubmission) -> Result<i32, StoreError> {
        let mut tables = self.tables.write().await;
        tables.next_submission_id += 1;
        let id = tables.next_submission_id;
        tables
            .submissions
            .insert(id, Submission::pending(id, submission, Utc::now()));
        Ok(id)
    }

    async fn find(&self, id: i32) -> Result<Option<Submission>, StoreError> {
        Ok(self.tables.read().await.submissions.get(&id).cloned())
    }

    async fn list_by_user(&self, user_id: i32, limit: u64) -> Result<Vec<Submission>, StoreError> {
        Ok(self
            .submissions_where(limit, |s| s.user_id == user_id)
            .await)
    }

    async fn list_by_user_and_problem(
        &self,
        user_id: i32,
        problem_id: i32,
        limit: u64,
    ) -> Result<Vec<Submission>, StoreError> {
        Ok(self
            .submissions_where(limit, |s| {
                s.user_id == user_id && s.problem_id == problem_id
            })
            .await)
    }

    async fn set_token(&self, id: i32, token: &str) -> Result<(), StoreError> {
        self.update_submission(id, |s| s.judge_token = Some(token.to_string()))
            .await
    }

    async fn set_outcome(&self, id: i32, outcome: &SubmissionOutcome) -> Result<(), StoreError> {
        self.update_submission(id, |s| s.apply(outcome.clone()))
            .await
    }
}
