use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;
use worker::SubmitRequest;

use crate::error::AppError;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::handlers::problem::find_problem;
use crate::models::submission::*;
use crate::state::AppState;

const USER_LIST_LIMIT: u64 = 50;
const PROBLEM_LIST_LIMIT: u64 = 20;

/// Accept a submission and queue it for evaluation.
///
/// Responds before evaluation starts; the verdict is read back through
/// `GET /api/submissions/{id}`.
#[instrument(skip(state, payload), fields(user_id = payload.user_id))]
pub async fn create_submission(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SubmitRequest>,
) -> Result<impl IntoResponse, AppError> {
    let submission_id = state.intake.submit(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSubmissionResponse {
            message: "Submission created",
            submission_id,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SubmissionResponse>, AppError> {
    let submission = state
        .submissions
        .find(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Submission not found".into()))?;

    Ok(Json(SubmissionResponse { submission }))
}

#[instrument(skip(state))]
pub async fn list_submissions(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListSubmissionsQuery>,
) -> Result<Json<SubmissionListResponse>, AppError> {
    let submissions = state
        .submissions
        .list_by_user(query.user_id, query.limit_or(USER_LIST_LIMIT))
        .await?;

    Ok(Json(SubmissionListResponse { submissions }))
}

#[instrument(skip(state))]
pub async fn list_problem_submissions(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    AppQuery(query): AppQuery<ListSubmissionsQuery>,
) -> Result<Json<SubmissionListResponse>, AppError> {
    let problem = find_problem(&state, &slug).await?;
    let submissions = state
        .submissions
        .list_by_user_and_problem(
            query.user_id,
            problem.id,
            query.limit_or(PROBLEM_LIST_LIMIT),
        )
        .await?;

    Ok(Json(SubmissionListResponse { submissions }))
}
