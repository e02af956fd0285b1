//! sea-orm implementation of the problem, test case and submission stores.

use async_trait::async_trait;
use chrono::Utc;
use common::Language;
use common::problem::{Problem, TestCase};
use common::store::{ProblemSource, StoreError, SubmissionStore, TestCaseSource};
use common::submission::{NewSubmission, Submission, SubmissionOutcome};
use sea_orm::prelude::Expr;
use sea_orm::*;

use crate::entity::{problem, submission, test_case};

#[derive(Clone)]
pub struct DbStore {
    db: DatabaseConnection,
}

impl DbStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn backend(err: DbErr) -> StoreError {
    StoreError::Backend(err.to_string())
}

impl From<problem::Model> for Problem {
    fn from(m: problem::Model) -> Self {
        Problem {
            id: m.id,
            title: m.title,
            slug: m.slug,
            description: m.description,
            difficulty: m.difficulty,
            created_at: m.created_at,
        }
    }
}

impl From<test_case::Model> for TestCase {
    fn from(m: test_case::Model) -> Self {
        TestCase {
            id: m.id,
            problem_id: m.problem_id,
            input: m.input,
            expected_output: m.expected_output,
            is_hidden: m.is_hidden,
        }
    }
}

fn to_submission(m: submission::Model) -> Result<Submission, StoreError> {
    let language: Language = m
        .language
        .parse()
        .map_err(|e| StoreError::Backend(format!("submission {}: {e}", m.id)))?;

    Ok(Submission {
        id: m.id,
        user_id: m.user_id,
        problem_id: m.problem_id,
        language,
        code: m.code,
        judge_token: m.judge_token,
        verdict: m.verdict.into(),
        runtime_ms: m.runtime_ms,
        memory_kb: m.memory_kb,
        error_message: m.error_message,
        created_at: m.created_at,
    })
}

fn to_submissions(models: Vec<submission::Model>) -> Result<Vec<Submission>, StoreError> {
    models.into_iter().map(to_submission).collect()
}

impl DbStore {
    /// Apply column updates to one submission, failing if it does not exist.
    async fn update_submission(
        &self,
        id: i32,
        columns: Vec<(submission::Column, Expr)>,
    ) -> Result<(), StoreError> {
        let mut update = submission::Entity::update_many().filter(submission::Column::Id.eq(id));
        for (column, value) in columns {
            update = update.col_expr(column, value);
        }

        let result = update.exec(&self.db).await.map_err(backend)?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(format!("submission {id}")));
        }
        Ok(())
    }

    fn submissions_by_user(user_id: i32) -> Select<submission::Entity> {
        submission::Entity::find()
            .filter(submission::Column::UserId.eq(user_id))
            .order_by_desc(submission::Column::CreatedAt)
            .order_by_desc(submission::Column::Id)
    }
}

#[async_trait]
impl ProblemSource for DbStore {
    async fn list(&self) -> Result<Vec<Problem>, StoreError> {
        let models = problem::Entity::find()
            .order_by_asc(problem::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(models.into_iter().map(Problem::from).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Problem>, StoreError> {
        let model = problem::Entity::find()
            .filter(problem::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(model.map(Problem::from))
    }
}

#[async_trait]
impl TestCaseSource for DbStore {
    async fn list_all(&self, problem_id: i32) -> Result<Vec<TestCase>, StoreError> {
        let models = test_case::Entity::find()
            .filter(test_case::Column::ProblemId.eq(problem_id))
            .order_by_asc(test_case::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(models.into_iter().map(TestCase::from).collect())
    }

    async fn list_visible(&self, problem_id: i32) -> Result<Vec<TestCase>, StoreError> {
        let models = test_case::Entity::find()
            .filter(test_case::Column::ProblemId.eq(problem_id))
            .filter(test_case::Column::IsHidden.eq(false))
            .order_by_asc(test_case::Column::Id)
            .all(&self.db)
            .await
            .map_err(backend)?;
        Ok(models.into_iter().map(TestCase::from).collect())
    }
}

#[async_trait]
impl SubmissionStore for DbStore {
    async fn create(&self, new: NewSubmission) -> Result<i32, StoreError> {
        let model = submission::ActiveModel {
            user_id: Set(new.user_id),
            problem_id: Set(new.problem_id),
            language: Set(new.language.to_string()),
            code: Set(new.code),
            judge_token: Set(None),
            verdict: Set(common::Verdict::Pending.to_string()),
            runtime_ms: Set(None),
            memory_kb: Set(None),
            error_message: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(backend)?;

        Ok(model.id)
    }

    async fn find(&self, id: i32) -> Result<Option<Submission>, StoreError> {
        submission::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(to_submission)
            .transpose()
    }

    async fn list_by_user(&self, user_id: i32, limit: u64) -> Result<Vec<Submission>, StoreError> {
        let models = Self::submissions_by_user(user_id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(backend)?;
        to_submissions(models)
    }

    async fn list_by_user_and_problem(
        &self,
        user_id: i32,
        problem_id: i32,
        limit: u64,
    ) -> Result<Vec<Submission>, StoreError> {
        let models = Self::submissions_by_user(user_id)
            .filter(submission::Column::ProblemId.eq(problem_id))
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(backend)?;
        to_submissions(models)
    }

    async fn set_token(&self, id: i32, token: &str) -> Result<(), StoreError> {
        self.update_submission(
            id,
            vec![(submission::Column::JudgeToken, Expr::value(token))],
        )
        .await
    }

    async fn set_outcome(&self, id: i32, outcome: &SubmissionOutcome) -> Result<(), StoreError> {
        self.update_submission(
            id,
            vec![
                (
                    submission::Column::Verdict,
                    Expr::value(outcome.verdict.to_string()),
                ),
                (submission::Column::RuntimeMs, Expr::value(outcome.runtime_ms)),
                (submission::Column::MemoryKb, Expr::value(outcome.memory_kb)),
                (
                    submission::Column::ErrorMessage,
                    Expr::value(outcome.error_message.clone()),
                ),
            ],
        )
        .await
    }
}
