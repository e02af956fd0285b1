use axum::Json;
use axum::extract::{Path, State};
use common::problem::{Problem, VisibleTestCase};
use tracing::instrument;

use crate::error::AppError;
use crate::models::problem::*;
use crate::state::AppState;

/// Find a problem by slug or return 404.
pub(crate) async fn find_problem(state: &AppState, slug: &str) -> Result<Problem, AppError> {
    state
        .problems
        .find_by_slug(slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Problem not found".into()))
}

#[instrument(skip(state))]
pub async fn list_problems(
    State(state): State<AppState>,
) -> Result<Json<ProblemListResponse>, AppError> {
    let problems = state.problems.list().await?;
    Ok(Json(ProblemListResponse { problems }))
}

/// Problem details with its visible test cases. Hidden cases never leave the server.
#[instrument(skip(state))]
pub async fn get_problem(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProblemDetailResponse>, AppError> {
    let problem = find_problem(&state, &slug).await?;
    let test_cases = state
        .test_cases
        .list_visible(problem.id)
        .await?
        .into_iter()
        .map(VisibleTestCase::from)
        .collect();

    Ok(Json(ProblemDetailResponse {
        problem,
        test_cases,
    }))
}
