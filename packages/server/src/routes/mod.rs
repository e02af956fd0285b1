use axum::{Router, routing::get};

use crate::handlers;
use crate::state::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/problems", problem_routes())
        .nest("/submissions", submission_routes())
}

fn problem_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::problem::list_problems))
        .route("/{slug}", get(handlers::problem::get_problem))
}

fn submission_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::submission::list_submissions)
                .post(handlers::submission::create_submission),
        )
        .route("/{id}", get(handlers::submission::get_submission))
        .route(
            "/problem/{slug}",
            get(handlers::submission::list_problem_submissions),
        )
}
